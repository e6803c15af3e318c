use cookie::{Cookie, SameSite};
use uuid::Uuid;

pub const COOKIE_NAME: &str = "session";

/// Creates a session cookie that lasts until the browser is closed.
pub fn create_cookie(session_id: Uuid) -> Cookie<'static> {
	Cookie::build((COOKIE_NAME, session_id.to_string()))
		.secure(!cfg!(debug_assertions))
		.http_only(true)
		.same_site(SameSite::Lax)
		.path("/")
		.into()
}

/// Creates an expired session cookie that replaces the current one.
pub fn clear_cookie() -> Cookie<'static> {
	Cookie::build(COOKIE_NAME)
		.http_only(true)
		.same_site(SameSite::Lax)
		.path("/")
		.max_age(cookie::time::Duration::ZERO)
		.into()
}

/// Finds the session id among the values of `Cookie` headers.
///
/// Returns `None` when there is no session cookie, and `Some(None)` when there
/// is one but it is not a valid id.
pub fn find_session_id<'a>(headers: impl Iterator<Item = &'a str>) -> Option<Option<Uuid>> {
	headers
		.flat_map(Cookie::split_parse)
		.filter_map(Result::ok)
		.find(|cookie| cookie.name() == COOKIE_NAME)
		.map(|cookie| Uuid::parse_str(cookie.value()).ok())
}
