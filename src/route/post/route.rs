use axum::{extract::State, Extension};
use chrono::Utc;
use macros::route;

use crate::{
	cache::{self, Cache},
	extract::{AddPost, Can, ChangePost, Json, Path, Query},
	filter::FilterSet,
	notify::Dispatcher,
	openapi::tag,
	quota,
	response::SeeOther,
	store::{NewPost, PostQuery, Store},
};

use super::{category_error, model, Error, RouteError};

/// List posts
/// Returns a page of posts, newest first.
#[route(tag = tag::NEWS)]
pub async fn list(
	State(store): State<Store>,
	Query(page): Query<model::PageInput>,
) -> Result<Json<model::PostList>, RouteError> {
	let posts = store
		.list_posts(&PostQuery::default(), page.limit(), page.offset())
		.await?;
	let (news, has_next) = page.split(posts);

	Ok(Json(model::PostList {
		news,
		page: page.page,
		has_next,
		time_now: Utc::now(),
	}))
}

/// Get single post
/// Returns a single post by its unique id. Posts are cached for a while after
/// the first read, so recent edits may not show up right away.
#[route(tag = tag::NEWS)]
pub async fn detail(
	State(store): State<Store>,
	State(cache): State<Cache>,
	Path(model::IdInput { id }): Path<model::IdInput>,
) -> Result<Json<model::Post>, RouteError> {
	let post = cache::read_through(&*cache, &cache::post_key(id), || store.get_post(id)).await?;

	Ok(Json(post.ok_or(Error::UnknownPost(id))?))
}

/// Search posts
/// Returns a page of the posts matching the filter, newest first.
#[route(tag = tag::NEWS)]
pub async fn search(
	State(store): State<Store>,
	Query(page): Query<model::PageInput>,
	Query(filter): Query<model::PostFilter>,
) -> Result<Json<model::SearchPage>, RouteError> {
	let filterset = FilterSet::new(filter, PostQuery::default());
	let posts = store
		.list_posts(&filterset.query, page.limit(), page.offset())
		.await?;
	let (news, has_next) = page.split(posts);

	Ok(Json(model::SearchPage {
		news,
		filterset: filterset.state,
		page: page.page,
		has_next,
	}))
}

/// Create form
/// Returns the kind of post this endpoint creates and how many posts you may
/// still create today.
#[route(tag = tag::NEWS)]
pub async fn create_form(
	Extension(kind): Extension<model::PostKind>,
	State(store): State<Store>,
	can: Can<AddPost>,
) -> Result<Json<model::CreateForm>, RouteError> {
	let written = quota::posts_today(&*store, can.session.user.id, Utc::now()).await?;

	Ok(Json(model::CreateForm {
		kind,
		remaining_today: quota::remaining(written),
		limit: quota::DAILY_LIMIT,
	}))
}

/// Create post
/// Creates a new post and notifies the subscribers of its categories, then
/// redirects to it. Once you have created 3 posts today, nothing is created and
/// the limit is returned instead.
#[route(tag = tag::NEWS)]
pub async fn create(
	Extension(kind): Extension<model::PostKind>,
	State(store): State<Store>,
	State(notifier): State<Dispatcher>,
	can: Can<AddPost>,
	Json(input): Json<model::CreatePostInput>,
) -> Result<model::CreateOutcome, RouteError> {
	let author = can.session.user;
	let written = quota::posts_today(&*store, author.id, Utc::now()).await?;

	if quota::exceeded(written) {
		tracing::info!(author = %author.id, written, "daily post limit reached");

		return Ok(model::CreateOutcome::LimitExceeded(Json(model::PostLimit {
			limit_exceeded: true,
			author: author.username,
			limit: quota::DAILY_LIMIT,
		})));
	}

	let post = store
		.create_post(NewPost {
			author_id: author.id,
			kind,
			title: input.title,
			body: input.body,
			categories: input.categories,
		})
		.await
		.map_err(category_error)?;

	tracing::info!(post = %post.id, %kind, "post created");
	notifier.enqueue(post.id);

	Ok(model::CreateOutcome::Created(SeeOther::to(post.url())))
}

/// Update form
/// Returns the post as it is now, to prefill the update form.
#[route(tag = tag::NEWS)]
pub async fn update_form(
	State(store): State<Store>,
	_can: Can<ChangePost>,
	Path(model::IdInput { id }): Path<model::IdInput>,
) -> Result<Json<model::Post>, RouteError> {
	let post = store.get_post(id).await?;

	Ok(Json(post.ok_or(Error::UnknownPost(id))?))
}

/// Update post
/// Changes the given fields of a post, then redirects to it.
#[route(tag = tag::NEWS)]
pub async fn update(
	State(store): State<Store>,
	_can: Can<ChangePost>,
	Path(model::IdInput { id }): Path<model::IdInput>,
	Json(input): Json<model::UpdatePostInput>,
) -> Result<SeeOther, RouteError> {
	let post = store
		.update_post(id, input.into())
		.await
		.map_err(category_error)?
		.ok_or(Error::UnknownPost(id))?;

	Ok(SeeOther::to(post.url()))
}

/// Delete form
/// Returns the post that is about to be deleted.
#[route(tag = tag::NEWS)]
pub async fn delete_form(
	State(store): State<Store>,
	Path(model::IdInput { id }): Path<model::IdInput>,
) -> Result<Json<model::Post>, RouteError> {
	let post = store.get_post(id).await?;

	Ok(Json(post.ok_or(Error::UnknownPost(id))?))
}

/// Delete post
/// Deletes a post by its unique id, then redirects to the list of posts.
#[route(tag = tag::NEWS)]
pub async fn delete(
	State(store): State<Store>,
	Path(model::IdInput { id }): Path<model::IdInput>,
) -> Result<SeeOther, RouteError> {
	if !store.delete_post(id).await? {
		return Err(Error::UnknownPost(id).into());
	}

	tracing::info!(post = %id, "post deleted");

	Ok(SeeOther::to("/news"))
}
