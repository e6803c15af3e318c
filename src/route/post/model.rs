pub use crate::{
	filter::PostFilter,
	model::{CreatePostInput, Post, PostKind, UpdatePostInput},
	route::model::{IdInput, PageInput},
};

use aide::{
	gen::GenContext,
	openapi::{Operation, Response as ApiResponse},
	OperationOutput,
};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::Serialize;

use crate::{extract::Json, response::SeeOther, store::PostChanges};

/// A page of posts.
#[derive(Debug, Serialize, JsonSchema)]
pub struct PostList {
	/// The posts on this page, newest first.
	pub news: Vec<Post>,
	pub page: i64,
	/// Whether there is another page after this one.
	pub has_next: bool,
	pub time_now: DateTime<Utc>,
}

/// A page of search results.
#[derive(Debug, Serialize, JsonSchema)]
pub struct SearchPage {
	pub news: Vec<Post>,
	/// The filter that was applied, with blank values removed.
	pub filterset: PostFilter,
	pub page: i64,
	pub has_next: bool,
}

/// What the author needs to fill in the create form.
#[derive(Debug, Serialize, JsonSchema)]
pub struct CreateForm {
	/// The kind of post this endpoint creates.
	pub kind: PostKind,
	/// How many more posts the author may create today.
	pub remaining_today: i64,
	pub limit: i64,
}

/// Sent instead of creating the post once the author reached the daily limit.
#[derive(Debug, Serialize, JsonSchema)]
pub struct PostLimit {
	/// Always `true`.
	pub limit_exceeded: bool,
	/// The author's username.
	pub author: String,
	pub limit: i64,
}

pub enum CreateOutcome {
	Created(SeeOther),
	LimitExceeded(Json<PostLimit>),
}

impl IntoResponse for CreateOutcome {
	fn into_response(self) -> Response {
		match self {
			Self::Created(redirect) => redirect.into_response(),
			Self::LimitExceeded(limit) => limit.into_response(),
		}
	}
}

impl OperationOutput for CreateOutcome {
	type Inner = PostLimit;

	fn inferred_responses(
		ctx: &mut GenContext,
		operation: &mut Operation,
	) -> Vec<(Option<u16>, ApiResponse)> {
		let mut responses = SeeOther::inferred_responses(ctx, operation);

		responses.extend(
			Json::<PostLimit>::inferred_responses(ctx, operation)
				.into_iter()
				.map(|(_, response)| (Some(200), response)),
		);
		responses
	}
}

impl From<UpdatePostInput> for PostChanges {
	fn from(input: UpdatePostInput) -> Self {
		Self {
			title: input.title,
			body: input.body,
			categories: input.categories,
		}
	}
}
