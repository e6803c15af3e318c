//! Persistence traits and their backends.
//!
//! Handlers only see [`Store`], a shared handle to something implementing all
//! of [`PostStore`], [`CategoryStore`] and [`AccountStore`].

mod memory;
mod postgres;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::{Category, Post, PostKind, Session, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type Store = Arc<dyn DataStore>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
	#[error("duplicate record violates unique constraint `{0}`")]
	Duplicate(String),
	#[error("record references a missing row (`{0}`)")]
	MissingReference(String),
	#[error("corrupt record: {0}")]
	Corrupt(String),
}

/// Attributes to select posts by. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQuery {
	pub author: Option<Uuid>,
	/// Case-insensitive match on the author's username.
	pub author_name: Option<String>,
	pub category: Option<Uuid>,
	/// Case-insensitive substring of the title.
	pub title: Option<String>,
	/// Inclusive lower bound on `created_at`.
	pub created_from: Option<DateTime<Utc>>,
	/// Exclusive upper bound on `created_at`.
	pub created_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
	pub author_id: Uuid,
	pub kind: PostKind,
	pub title: String,
	pub body: String,
	pub categories: Vec<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct PostChanges {
	pub title: Option<String>,
	pub body: Option<String>,
	pub categories: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
	pub id: Uuid,
	pub email: String,
	pub username: String,
	pub password: Vec<u8>,
}

#[axum::async_trait]
pub trait PostStore: Send + Sync {
	/// Posts matching `query`, newest first.
	async fn list_posts(&self, query: &PostQuery, limit: i64, offset: i64)
		-> Result<Vec<Post>, Error>;

	async fn count_posts(&self, query: &PostQuery) -> Result<i64, Error>;

	async fn get_post(&self, id: Uuid) -> Result<Option<Post>, Error>;

	async fn create_post(&self, post: NewPost) -> Result<Post, Error>;

	/// Returns `None` if the post does not exist.
	async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>, Error>;

	/// Returns `false` if the post does not exist.
	async fn delete_post(&self, id: Uuid) -> Result<bool, Error>;
}

#[axum::async_trait]
pub trait CategoryStore: Send + Sync {
	/// All categories, ordered by name.
	async fn list_categories(&self) -> Result<Vec<Category>, Error>;

	async fn get_category(&self, id: Uuid) -> Result<Option<Category>, Error>;

	/// Returns the category named `name`, creating it if needed.
	async fn ensure_category(&self, name: &str) -> Result<Category, Error>;

	async fn is_subscriber(&self, category: Uuid, user: Uuid) -> Result<bool, Error>;

	/// Returns `true` if the user was not subscribed before.
	async fn add_subscriber(&self, category: Uuid, user: Uuid) -> Result<bool, Error>;

	async fn subscribers(&self, category: Uuid) -> Result<Vec<User>, Error>;
}

#[axum::async_trait]
pub trait AccountStore: Send + Sync {
	/// Fails with [`Error::Duplicate`] naming `user_email_key` or
	/// `user_username_key` when either is taken.
	async fn create_user(&self, user: NewUser) -> Result<User, Error>;

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Error>;

	async fn create_session(&self, user: Uuid) -> Result<Session, Error>;

	async fn find_session_user(&self, session: Uuid) -> Result<Option<User>, Error>;

	async fn delete_session(&self, session: Uuid) -> Result<(), Error>;

	/// Names of the groups the user belongs to, sorted.
	async fn groups(&self, user: Uuid) -> Result<Vec<String>, Error>;

	/// Returns `true` if the user was not a member before.
	async fn add_to_group(&self, user: Uuid, group: &str) -> Result<bool, Error>;
}

pub trait DataStore: PostStore + CategoryStore + AccountStore {}

impl<T> DataStore for T where T: PostStore + CategoryStore + AccountStore {}
