use std::{borrow::Cow, marker::PhantomData};

use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{request, StatusCode},
};
use serde::Serialize;

use super::{session::require_session, Session};
use crate::{
	error::{self, ErrorShape, RouteError},
	model::AUTHORS_GROUP,
	route::auth,
	store::Store,
};

/// Something a user may be allowed to do through group membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
	AddPost,
	ChangePost,
}

impl Permission {
	/// The groups whose members hold this permission.
	pub fn granted_to(self) -> &'static [&'static str] {
		match self {
			Self::AddPost | Self::ChangePost => &[AUTHORS_GROUP],
		}
	}

	pub fn is_granted(self, groups: &[String]) -> bool {
		self.granted_to()
			.iter()
			.any(|granted| groups.iter().any(|group| group == granted))
	}
}

/// A permission checked before the handler runs, see [`Can`].
pub trait Capability {
	const PERMISSION: Permission;
}

pub struct AddPost;

impl Capability for AddPost {
	const PERMISSION: Permission = Permission::AddPost;
}

pub struct ChangePost;

impl Capability for ChangePost {
	const PERMISSION: Permission = Permission::ChangePost;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Auth(#[from] auth::Error),
	#[error("missing permission {0:?}")]
	Missing(Permission),
}

impl ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::Auth(error) => error.status(),
			Self::Missing(..) => StatusCode::FORBIDDEN,
		}
	}

	fn into_errors(self) -> Vec<error::Message> {
		match self {
			Self::Auth(error) => error.into_errors(),
			Self::Missing(permission) => error::Message::new(Cow::Borrowed("missing_permission"))
				.detail("permission", permission)
				.into_vec(),
		}
	}
}

/// Extracts the session of a user holding the permission of `C`.
///
/// Rejects with 401 when there is no valid session and with 403 when the
/// user's groups do not grant the permission.
///
/// ```rust
/// async fn route(can: Can<AddPost>) {
///   println!("{} may post", can.session.user.username);
/// }
/// ```
pub struct Can<C> {
	pub session: Session,
	capability: PhantomData<fn() -> C>,
}

#[axum::async_trait]
impl<S, C> FromRequestParts<S> for Can<C>
where
	C: Capability,
	Store: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let session = Session::from_request_parts(parts, state)
			.await
			.map_err(|e| e.map(Error::Auth))?;

		let groups = Store::from_ref(state).groups(session.user.id).await?;

		if !C::PERMISSION.is_granted(&groups) {
			tracing::debug!(user = %session.user.id, permission = ?C::PERMISSION, "permission denied");

			return Err(Error::Missing(C::PERMISSION).into());
		}

		Ok(Self {
			session,
			capability: PhantomData,
		})
	}
}

impl<C> OperationInput for Can<C> {
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		require_session(operation);
	}
}
