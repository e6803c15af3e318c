use aide::axum::{routing::get_with, ApiRouter};
use axum::{http::StatusCode, Extension};
use uuid::Uuid;

use crate::{error, model::PostKind, store, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(Uuid),
	#[error("post refers to an unknown category")]
	UnknownCategory,
}

pub type RouteError = error::RouteError<Error>;

/// Reading routes, mounted under `/news`.
pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/", get_with(list, list_docs))
		.api_route("/search", get_with(search, search_docs))
		.api_route("/:id", get_with(detail, detail_docs))
}

/// Editing routes for posts of `kind`, mounted under `/news` and `/articles`.
pub fn editor_routes(kind: PostKind) -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/create",
			get_with(create_form, create_form_docs).post_with(create, create_docs),
		)
		.api_route(
			"/:id/update",
			get_with(update_form, update_form_docs).post_with(update, update_docs),
		)
		.api_route(
			"/:id/delete",
			get_with(delete_form, delete_form_docs).post_with(delete, delete_docs),
		)
		.layer(Extension(kind))
}

/// Reports references to missing categories as a client error.
fn category_error(error: store::Error) -> RouteError {
	match error {
		store::Error::MissingReference(..) => Error::UnknownCategory.into(),
		error => error.into(),
	}
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) => StatusCode::NOT_FOUND,
			Self::UnknownCategory => StatusCode::BAD_REQUEST,
		}
	}

	fn into_errors(self) -> Vec<error::Message> {
		match self {
			Self::UnknownPost(post) => error::Message::new("unknown_post")
				.detail("post", post)
				.into_vec(),
			Self::UnknownCategory => error::Message::new("unknown_category")
				.field("categories")
				.into_vec(),
		}
	}
}

#[cfg(test)]
mod test {
	use chrono::{Duration, Utc};
	use uuid::Uuid;

	use crate::{
		model::{Post, PostKind},
		quota,
		test::*,
	};

	fn post(author_id: Uuid, title: &str, minutes_ago: i64) -> Post {
		Post {
			id: Uuid::new_v4(),
			author_id,
			kind: PostKind::News,
			title: title.into(),
			body: "Lorem ipsum dolor sit amet.".into(),
			categories: Vec::new(),
			rating: 0,
			created_at: Utc::now() - Duration::minutes(minutes_ago),
		}
	}

	fn created_id(response: &TestResponse) -> Uuid {
		let location = response.header(header::LOCATION);

		location
			.to_str()
			.unwrap()
			.trim_start_matches("/news/")
			.parse()
			.unwrap()
	}

	#[tokio::test]
	async fn test_list_is_paginated_newest_first() {
		let app = app();
		let author = Uuid::new_v4();

		for i in 0..12 {
			app.store
				.insert_post(post(author, &format!("post {i}"), i))
				.await;
		}

		let page = app.server.get("/news").await.json::<Value>();

		assert_eq!(page["news"].as_array().unwrap().len(), 10);
		assert_eq!(page["news"][0]["title"], "post 0");
		assert_eq!(page["news"][9]["title"], "post 9");
		assert_eq!(page["has_next"], true);
		assert!(page["time_now"].is_string());

		let page = app
			.server
			.get("/news")
			.add_query_param("page", 2)
			.await
			.json::<Value>();

		assert_eq!(page["news"].as_array().unwrap().len(), 2);
		assert_eq!(page["news"][1]["title"], "post 11");
		assert_eq!(page["has_next"], false);
	}

	#[tokio::test]
	async fn test_invalid_page() {
		let app = app();

		let response = app.server.get("/news").add_query_param("page", 0).await;

		assert_eq!(response.status_code(), 400);
	}

	#[tokio::test]
	async fn test_detail_is_served_from_cache() {
		let app = app();
		let post = post(Uuid::new_v4(), "Cached", 0);
		let id = post.id;

		app.store.insert_post(post).await;

		let response = app.server.get(&format!("/news/{id}")).await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["title"], "Cached");

		app.store.delete_post(id).await.unwrap();

		let response = app.server.get(&format!("/news/{id}")).await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["title"], "Cached");
	}

	#[tokio::test]
	async fn test_update_keeps_cached_detail() {
		let app = app();
		let author = app.author("editor").await;
		let post = post(author.id, "First draft", 0);
		let id = post.id;

		app.store.insert_post(post).await;

		let response = app.server.get(&format!("/news/{id}")).await;

		assert_eq!(response.json::<Value>()["title"], "First draft");

		let response = app
			.server
			.post(&format!("/news/{id}/update"))
			.add_header(header::COOKIE, author.cookie)
			.json(&json!({ "title": "Final draft" }))
			.await;

		assert_eq!(response.status_code(), 303);

		let stored = app.store.get_post(id).await.unwrap().unwrap();
		assert_eq!(stored.title, "Final draft");

		let response = app.server.get(&format!("/news/{id}")).await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["title"], "First draft");
	}

	#[tokio::test]
	async fn test_unknown_post() {
		let app = app();
		let id = Uuid::new_v4();

		let response = app.server.get(&format!("/news/{id}")).await;

		assert_eq!(response.status_code(), 404);

		let body = response.json::<Value>();
		assert_eq!(body["success"], false);
		assert_eq!(body["errors"][0]["content"], "unknown_post");
		assert_eq!(body["errors"][0]["details"]["post"], id.to_string());
	}

	#[tokio::test]
	async fn test_search() {
		let app = app();
		let alice = app.member("alice").await;
		let sport = app.store.ensure_category("Sport").await.unwrap();

		let mut storm = post(alice.id, "Storm hits the coast", 5);
		storm.categories = vec![sport.id];
		app.store.insert_post(storm).await;
		app.store
			.insert_post(post(alice.id, "Storm passes", 60 * 24 * 10))
			.await;
		app.store
			.insert_post(post(Uuid::new_v4(), "Storm warning", 1))
			.await;

		let page = app
			.server
			.get("/news/search")
			.add_query_param("title", "STORM")
			.add_query_param("author", "Alice")
			.add_query_param("category", "")
			.add_query_param("after", "")
			.await
			.json::<Value>();

		assert_eq!(page["news"].as_array().unwrap().len(), 2);
		assert_eq!(page["filterset"]["author"], "Alice");
		assert_eq!(page["filterset"]["category"], Value::Null);

		let page = app
			.server
			.get("/news/search")
			.add_query_param("title", "storm")
			.add_query_param("category", sport.id)
			.await
			.json::<Value>();

		assert_eq!(page["news"].as_array().unwrap().len(), 1);
		assert_eq!(page["news"][0]["title"], "Storm hits the coast");
	}

	#[tokio::test]
	async fn test_create_requires_permission() {
		let app = app();
		let reader = app.member("reader").await;

		let response = app.server.get("/news/create").await;

		assert_eq!(response.status_code(), 401);

		let response = app
			.server
			.get("/news/create")
			.add_header(header::COOKIE, reader.cookie.clone())
			.await;

		assert_eq!(response.status_code(), 403);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"missing_permission"
		);

		let response = app
			.server
			.post("/news/create")
			.add_header(header::COOKIE, reader.cookie)
			.json(&json!({ "title": "Not allowed", "body": "text" }))
			.await;

		assert_eq!(response.status_code(), 403);
		assert_eq!(app.store.count_posts(&Default::default()).await.unwrap(), 0);
	}

	#[tokio::test]
	async fn test_create_form() {
		let app = app();
		let author = app.author("writer").await;

		let form = app
			.server
			.get("/articles/create")
			.add_header(header::COOKIE, author.cookie)
			.await
			.json::<Value>();

		assert_eq!(form["kind"], "article");
		assert_eq!(form["remaining_today"], 3);
	}

	#[tokio::test]
	async fn test_endpoint_decides_kind() {
		let app = app();
		let author = app.author("writer").await;
		let culture = app.store.ensure_category("Culture").await.unwrap();

		let response = app
			.server
			.post("/articles/create")
			.add_header(header::COOKIE, author.cookie.clone())
			.json(&json!({
				"title": "A long read",
				"body": "Once upon a time.",
				"categories": [culture.id],
			}))
			.await;

		assert_eq!(response.status_code(), 303);

		let article = app
			.store
			.get_post(created_id(&response))
			.await
			.unwrap()
			.unwrap();

		assert_eq!(article.kind, PostKind::Article);
		assert_eq!(article.author_id, author.id);
		assert_eq!(article.categories, [culture.id]);

		let response = app
			.server
			.post("/news/create")
			.add_header(header::COOKIE, author.cookie)
			.json(&json!({ "title": "Breaking", "body": "Something happened." }))
			.await;

		let news = app
			.store
			.get_post(created_id(&response))
			.await
			.unwrap()
			.unwrap();

		assert_eq!(news.kind, PostKind::News);
		assert_eq!(app.outbox.jobs(), [article.id, news.id]);
	}

	#[tokio::test]
	async fn test_daily_limit() {
		let app = app();
		let author = app.author("prolific").await;
		let (today, tomorrow) = quota::day_bounds(Utc::now());

		// Both days are full, so the request hits the limit even across midnight.
		for created_at in [today, tomorrow] {
			for i in 0..3 {
				let mut post = post(author.id, &format!("Post number {i}"), 0);
				post.created_at = created_at;
				app.store.insert_post(post).await;
			}
		}

		let response = app
			.server
			.post("/news/create")
			.add_header(header::COOKIE, author.cookie)
			.json(&json!({ "title": "One too many", "body": "text" }))
			.await;

		assert_eq!(response.status_code(), 200);

		let body = response.json::<Value>();
		assert_eq!(body["limit_exceeded"], true);
		assert_eq!(body["author"], "prolific");
		assert_eq!(body["limit"], 3);

		assert_eq!(app.store.count_posts(&Default::default()).await.unwrap(), 6);
		assert!(app.outbox.jobs().is_empty());
	}

	#[tokio::test]
	async fn test_unknown_category() {
		let app = app();
		let author = app.author("writer").await;

		let response = app
			.server
			.post("/news/create")
			.add_header(header::COOKIE, author.cookie)
			.json(&json!({
				"title": "Lost",
				"body": "text",
				"categories": [Uuid::new_v4()],
			}))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"unknown_category"
		);
		assert!(app.outbox.jobs().is_empty());
	}

	#[tokio::test]
	async fn test_invalid_title() {
		let app = app();
		let author = app.author("writer").await;

		let response = app
			.server
			.post("/news/create")
			.add_header(header::COOKIE, author.cookie)
			.json(&json!({ "title": "no", "body": "text" }))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(app.store.count_posts(&Default::default()).await.unwrap(), 0);
	}

	#[tokio::test]
	async fn test_update() {
		let app = app();
		let author = app.author("editor").await;
		let reader = app.member("reader").await;
		let original = post(author.id, "Original title", 0);
		let id = original.id;

		app.store.insert_post(original).await;

		let response = app
			.server
			.post(&format!("/news/{id}/update"))
			.add_header(header::COOKIE, reader.cookie)
			.json(&json!({ "title": "Vandalised" }))
			.await;

		assert_eq!(response.status_code(), 403);

		let form = app
			.server
			.get(&format!("/articles/{id}/update"))
			.add_header(header::COOKIE, author.cookie.clone())
			.await
			.json::<Value>();

		assert_eq!(form["title"], "Original title");

		let response = app
			.server
			.post(&format!("/news/{id}/update"))
			.add_header(header::COOKIE, author.cookie.clone())
			.json(&json!({ "title": "Corrected title" }))
			.await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header(header::LOCATION), format!("/news/{id}"));

		let post = app.store.get_post(id).await.unwrap().unwrap();
		assert_eq!(post.title, "Corrected title");
		assert_eq!(post.body, "Lorem ipsum dolor sit amet.");

		let response = app
			.server
			.post(&format!("/news/{}/update", Uuid::new_v4()))
			.add_header(header::COOKIE, author.cookie)
			.json(&json!({ "title": "Nobody home" }))
			.await;

		assert_eq!(response.status_code(), 404);
	}

	#[tokio::test]
	async fn test_update_of_unknown_post_with_categories() {
		let app = app();
		let author = app.author("editor").await;
		let id = Uuid::new_v4();

		let response = app
			.server
			.post(&format!("/news/{id}/update"))
			.add_header(header::COOKIE, author.cookie)
			.json(&json!({ "categories": [Uuid::new_v4()] }))
			.await;

		assert_eq!(response.status_code(), 404);

		let body = response.json::<Value>();
		assert_eq!(body["errors"][0]["content"], "unknown_post");
		assert_eq!(body["errors"][0]["details"]["post"], id.to_string());
	}

	#[tokio::test]
	async fn test_delete() {
		let app = app();
		let doomed = post(Uuid::new_v4(), "Doomed", 0);
		let id = doomed.id;

		app.store.insert_post(doomed).await;

		let confirm = app
			.server
			.get(&format!("/articles/{id}/delete"))
			.await
			.json::<Value>();

		assert_eq!(confirm["title"], "Doomed");

		let response = app.server.post(&format!("/articles/{id}/delete")).await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header(header::LOCATION), "/news");
		assert!(app.store.get_post(id).await.unwrap().is_none());

		let response = app.server.post(&format!("/news/{id}/delete")).await;

		assert_eq!(response.status_code(), 404);
	}
}
