use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};
use uuid::Uuid;

use crate::{
	error::RouteError, model, openapi::SECURITY_SCHEME_SESSION, route::auth, session, store::Store,
};

/// Extracts the session and related user from the request.
///
/// If there is no session cookie, a [`auth::Error::NoSessionCookie`] is returned.
/// If the session does not exist, a [`auth::Error::InvalidSessionCookie`] is returned.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub id: Uuid,
	pub user: model::User,
}

/// The session of the reader, if they are logged in.
///
/// Unlike [`Session`], a missing or stale cookie is not an error.
#[derive(Debug)]
pub struct Viewer(pub Option<Session>);

fn cookie_headers(parts: &request::Parts) -> impl Iterator<Item = &str> {
	parts
		.headers
		.get_all(header::COOKIE)
		.into_iter()
		.filter_map(|value| value.to_str().ok())
}

async fn lookup(store: &Store, id: Uuid) -> Result<Option<Session>, RouteError<auth::Error>> {
	let user = store.find_session_user(id).await?;

	Ok(user.map(|user| Session { id, user }))
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Store: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let id = session::find_session_id(cookie_headers(parts))
			.ok_or(auth::Error::NoSessionCookie)?
			.ok_or(auth::Error::InvalidSessionCookie)?;

		let store = Store::from_ref(state);

		lookup(&store, id)
			.await?
			.ok_or_else(|| auth::Error::InvalidSessionCookie.into())
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Viewer
where
	Store: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let Some(Some(id)) = session::find_session_id(cookie_headers(parts)) else {
			return Ok(Self(None));
		};

		let store = Store::from_ref(state);

		Ok(Self(lookup(&store, id).await?))
	}
}

/// Adds the session cookie requirement to the `OpenAPI` operation.
pub(super) fn require_session(operation: &mut aide::openapi::Operation) {
	operation.security.push(
		[(SECURITY_SCHEME_SESSION.to_string(), Vec::new())]
			.into_iter()
			.collect(),
	);
}

impl OperationInput for Session {
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		require_session(operation);
	}
}

impl OperationInput for Viewer {}
