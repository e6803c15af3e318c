use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Members of this group may publish and edit posts.
pub const AUTHORS_GROUP: &str = "authors";

/// Whether a post is a short news item or a longer article.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
	#[default]
	News,
	Article,
}

impl PostKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::News => "news",
			Self::Article => "article",
		}
	}
}

impl fmt::Display for PostKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, thiserror::Error)]
#[error("unknown post kind `{0}`")]
pub struct UnknownKind(pub String);

impl FromStr for PostKind {
	type Err = UnknownKind;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"news" => Ok(Self::News),
			"article" => Ok(Self::Article),
			other => Err(UnknownKind(other.to_owned())),
		}
	}
}

/// A single news item or article, written by an author.
#[model]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
pub struct Post {
	/// The unique identifier of the post.
	#[serde(skip_deserializing)]
	pub id: Uuid,
	/// The user that wrote the post.
	#[serde(skip_deserializing)]
	pub author_id: Uuid,
	/// Decided by the endpoint the post was created through.
	#[serde(skip_deserializing)]
	pub kind: PostKind,
	/// The title of the post.
	#[validate(length(min = 3, max = 128))]
	pub title: String,
	/// The text of the post.
	#[validate(length(min = 1))]
	pub body: String,
	/// The categories the post is filed under.
	#[serde(default)]
	pub categories: Vec<Uuid>,
	/// The rating of the post.
	#[serde(skip_deserializing)]
	pub rating: i32,
	/// The creation time of the post.
	#[serde(skip_deserializing)]
	pub created_at: DateTime<Utc>,
}

impl Post {
	/// Path of the post's detail page.
	pub fn url(&self) -> String {
		format!("/news/{}", self.id)
	}
}

/// A category that posts are filed under and readers subscribe to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Category {
	pub id: Uuid,
	pub name: String,
}

/// A single user.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct User {
	/// The unique identifier of the user.
	pub id: Uuid,
	/// Used for logging in and for notifications.
	#[serde(skip)]
	pub email: String,
	/// Argon2 hash, salted with `id`.
	#[serde(skip)]
	pub password: Vec<u8>,
	/// The username that is displayed to the public.
	pub username: String,
	/// The creation time of the user.
	pub created_at: DateTime<Utc>,
}

/// A login session, referenced by the session cookie.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Session {
	/// The session id.
	#[serde(rename = "session_id")]
	pub id: Uuid,
	/// The user that owns the session.
	#[serde(skip)]
	pub user_id: Uuid,
	/// The creation time of the session.
	pub created_at: DateTime<Utc>,
}
