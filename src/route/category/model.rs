pub use crate::{
	model::{Category, Post},
	route::model::{IdInput, PageInput},
};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::Serialize;

/// A page of the posts filed under one category.
#[derive(Debug, Serialize, JsonSchema)]
pub struct CategoryPage {
	pub category: Category,
	/// The posts on this page, newest first.
	pub news: Vec<Post>,
	pub page: i64,
	pub has_next: bool,
	pub time_now: DateTime<Utc>,
	/// Whether the reader may still subscribe. Always `true` when not logged in.
	pub is_not_subscriber: bool,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct Subscription {
	pub category: Category,
	pub message: String,
}
