use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

/// An error that can occur during authentication.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid username or password")]
	InvalidUsernameOrPassword,
	#[error("password hashing error: {0}")]
	Argon(#[from] argon2::Error),
	#[error("no session cookie")]
	NoSessionCookie,
	#[error("invalid session cookie")]
	InvalidSessionCookie,
	#[error("username already taken")]
	UsernameTaken,
	#[error("email already taken")]
	EmailTaken,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/login", post_with(login, login_docs))
		.api_route("/logout", get_with(logout, logout_docs))
		.api_route("/register", post_with(register, register_docs))
		.api_route("/me", get_with(get_me, get_me_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidUsernameOrPassword | Self::NoSessionCookie | Self::InvalidSessionCookie => {
				StatusCode::UNAUTHORIZED
			}
			Self::Argon(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::UsernameTaken | Self::EmailTaken => StatusCode::CONFLICT,
		}
	}

	fn into_errors(self) -> Vec<error::Message> {
		let message = match self {
			Self::InvalidUsernameOrPassword => error::Message::new("invalid_username_or_password"),
			Self::Argon(..) => return Vec::new(),
			Self::NoSessionCookie => error::Message::new("no_session_cookie"),
			Self::InvalidSessionCookie => error::Message::new("invalid_session_cookie"),
			Self::UsernameTaken => error::Message::new("username_taken").field("username"),
			Self::EmailTaken => error::Message::new("email_taken").field("email"),
		};

		message.into_vec()
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	fn session_cookie(response: &TestResponse) -> HeaderValue {
		let set_cookie = response.header(header::SET_COOKIE);
		let pair = set_cookie
			.to_str()
			.unwrap()
			.split(';')
			.next()
			.unwrap()
			.to_owned();

		HeaderValue::from_str(&pair).unwrap()
	}

	#[tokio::test]
	async fn test_signup_flow() {
		let app = app();

		let response = app
			.server
			.post("/auth/register")
			.json(&json!({
				"email": "john@smith.com",
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 200);
		assert!(session_cookie(&response).to_str().unwrap().starts_with("session="));

		let response = app
			.server
			.post("/auth/login")
			.json(&json!({
				"email": "john@smith.com",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		let cookie = session_cookie(&response);
		let response = app
			.server
			.get("/auth/me")
			.add_header(header::COOKIE, cookie.clone())
			.await;

		assert_eq!(response.status_code(), 200);

		let profile = response.json::<Value>();
		assert_eq!(profile["username"], "john");
		assert_eq!(profile["groups"], json!([]));
		assert!(profile.get("email").is_none());

		let response = app
			.server
			.get("/auth/logout")
			.add_header(header::COOKIE, cookie.clone())
			.await;

		assert_eq!(response.status_code(), 204);

		let response = app
			.server
			.get("/auth/me")
			.add_header(header::COOKIE, cookie)
			.await;

		assert_eq!(response.status_code(), 401);
	}

	#[tokio::test]
	async fn test_wrong_password() {
		let app = app();

		app.server
			.post("/auth/register")
			.json(&json!({
				"email": "jane@smith.com",
				"username": "jane",
				"password": "correct horse",
			}))
			.await;

		let response = app
			.server
			.post("/auth/login")
			.json(&json!({
				"email": "jane@smith.com",
				"password": "battery staple",
			}))
			.await;

		assert_eq!(response.status_code(), 401);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"invalid_username_or_password"
		);
	}

	#[tokio::test]
	async fn test_duplicate_username() {
		let app = app();
		let register = |email: &str| {
			app.server.post("/auth/register").json(&json!({
				"email": email,
				"username": "taken",
				"password": "hunter2hunter",
			}))
		};

		assert_eq!(register("first@example.com").await.status_code(), 200);

		let response = register("second@example.com").await;

		assert_eq!(response.status_code(), 409);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "username");
	}

	#[tokio::test]
	async fn test_missing_session() {
		let app = app();

		let response = app.server.get("/auth/me").await;

		assert_eq!(response.status_code(), 401);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"no_session_cookie"
		);
	}
}
