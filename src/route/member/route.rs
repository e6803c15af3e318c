use axum::extract::State;
use macros::route;

use crate::{
	extract::{Json, Session},
	model::AUTHORS_GROUP,
	openapi::tag,
	response::SeeOther,
	route::auth::RouteError,
	store::Store,
};

use super::model;

/// Member index
/// Returns your username and whether you may publish posts.
#[route(tag = tag::MEMBER)]
pub async fn index(
	State(store): State<Store>,
	session: Session,
) -> Result<Json<model::Index>, RouteError> {
	let groups = store.groups(session.user.id).await?;

	Ok(Json(model::Index {
		is_not_author: !groups.iter().any(|group| group == AUTHORS_GROUP),
		username: session.user.username,
	}))
}

/// Become an author
/// Adds you to the authors, then redirects to your profile.
#[route(tag = tag::MEMBER)]
pub async fn upgrade(
	State(store): State<Store>,
	session: Session,
) -> Result<SeeOther, RouteError> {
	if store.add_to_group(session.user.id, AUTHORS_GROUP).await? {
		tracing::info!(user = %session.user.id, "joined the authors");
	}

	Ok(SeeOther::to("/auth/me"))
}
