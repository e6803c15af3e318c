use axum::extract::State;
use chrono::Utc;
use macros::route;

use crate::{
	extract::{Json, Path, Query, Session, Viewer},
	openapi::tag,
	store::{PostQuery, Store},
};

use super::{model, Error, RouteError};

/// List categories
/// Returns every category, ordered by name.
#[route(tag = tag::CATEGORY)]
pub async fn get_categories(
	State(store): State<Store>,
) -> Result<Json<Vec<model::Category>>, RouteError> {
	Ok(Json(store.list_categories().await?))
}

/// Get category
/// Returns a category with a page of its posts, newest first, and whether you
/// are subscribed to it.
#[route(tag = tag::CATEGORY)]
pub async fn get_category(
	State(store): State<Store>,
	Viewer(viewer): Viewer,
	Path(model::IdInput { id }): Path<model::IdInput>,
	Query(page): Query<model::PageInput>,
) -> Result<Json<model::CategoryPage>, RouteError> {
	let category = store
		.get_category(id)
		.await?
		.ok_or(Error::UnknownCategory(id))?;

	let query = PostQuery {
		category: Some(category.id),
		..Default::default()
	};
	let posts = store
		.list_posts(&query, page.limit(), page.offset())
		.await?;
	let (news, has_next) = page.split(posts);

	let is_subscriber = match viewer {
		Some(session) => store.is_subscriber(category.id, session.user.id).await?,
		None => false,
	};

	Ok(Json(model::CategoryPage {
		category,
		news,
		page: page.page,
		has_next,
		time_now: Utc::now(),
		is_not_subscriber: !is_subscriber,
	}))
}

/// Subscribe
/// Subscribes you to new posts in a category. Subscribing again changes nothing.
#[route(tag = tag::CATEGORY)]
pub async fn subscribe(
	State(store): State<Store>,
	session: Session,
	Path(model::IdInput { id }): Path<model::IdInput>,
) -> Result<Json<model::Subscription>, RouteError> {
	let category = store
		.get_category(id)
		.await?
		.ok_or(Error::UnknownCategory(id))?;

	if store.add_subscriber(category.id, session.user.id).await? {
		tracing::info!(category = %category.id, user = %session.user.id, "subscribed");
	}

	Ok(Json(model::Subscription {
		message: format!("You are subscribed to {}.", category.name),
		category,
	}))
}
