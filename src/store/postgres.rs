use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
	AccountStore, CategoryStore, Error, NewPost, NewUser, PostChanges, PostQuery, PostStore,
};
use crate::{
	model::{Category, Post, Session, User},
	Database,
};

/// Selects posts along with their category ids. Must be followed by filters
/// and `GROUP BY p.id`.
const SELECT_POSTS: &str = r#"
	SELECT
		p.id, p.author_id, p.kind, p.title, p.body, p.rating, p.created_at,
		COALESCE(
			array_agg(pc.category_id) FILTER (WHERE pc.category_id IS NOT NULL),
			'{}'
		) AS categories
	FROM post p
	LEFT JOIN post_category pc ON pc.post_id = p.id
"#;

#[derive(sqlx::FromRow)]
struct PostRow {
	id: Uuid,
	author_id: Uuid,
	kind: String,
	title: String,
	body: String,
	rating: i32,
	created_at: DateTime<Utc>,
	categories: Vec<Uuid>,
}

impl TryFrom<PostRow> for Post {
	type Error = Error;

	fn try_from(row: PostRow) -> Result<Self, Self::Error> {
		Ok(Self {
			id: row.id,
			author_id: row.author_id,
			kind: row
				.kind
				.parse()
				.map_err(|e: crate::model::UnknownKind| Error::Corrupt(e.to_string()))?,
			title: row.title,
			body: row.body,
			categories: row.categories,
			rating: row.rating,
			created_at: row.created_at,
		})
	}
}

/// Escapes `LIKE` wildcards and wraps the text for a substring match.
fn contains_pattern(text: &str) -> String {
	let escaped = text
		.replace('\\', "\\\\")
		.replace('%', "\\%")
		.replace('_', "\\_");

	format!("%{escaped}%")
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &PostQuery) {
	builder.push(" WHERE TRUE");

	if let Some(author) = query.author {
		builder.push(" AND p.author_id = ").push_bind(author);
	}

	if let Some(name) = &query.author_name {
		builder
			.push(r#" AND p.author_id IN (SELECT id FROM "user" WHERE lower(username) = lower("#)
			.push_bind(name.clone())
			.push("))");
	}

	if let Some(category) = query.category {
		builder
			.push(" AND EXISTS (SELECT 1 FROM post_category f WHERE f.post_id = p.id AND f.category_id = ")
			.push_bind(category)
			.push(")");
	}

	if let Some(title) = &query.title {
		builder
			.push(" AND p.title ILIKE ")
			.push_bind(contains_pattern(title));
	}

	if let Some(from) = query.created_from {
		builder.push(" AND p.created_at >= ").push_bind(from);
	}

	if let Some(until) = query.created_until {
		builder.push(" AND p.created_at < ").push_bind(until);
	}
}

/// Maps constraint violations onto the store's own error kinds.
fn constraint_error(error: sqlx::Error) -> Error {
	if let sqlx::Error::Database(ref database) = error {
		if let Some(constraint) = database.constraint() {
			if database.is_unique_violation() {
				return Error::Duplicate(constraint.to_owned());
			}

			if database.is_foreign_key_violation() {
				return Error::MissingReference(constraint.to_owned());
			}
		}
	}

	Error::Database(error)
}

/// A store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgStore {
	database: Database,
}

impl PgStore {
	pub fn new(database: Database) -> Self {
		Self { database }
	}

	/// Applies the embedded migrations.
	pub async fn migrate(&self) -> Result<(), Error> {
		sqlx::migrate!("./migrations").run(&self.database).await?;

		Ok(())
	}

	async fn replace_categories(
		tx: &mut sqlx::PgConnection,
		post: Uuid,
		categories: &[Uuid],
	) -> Result<(), Error> {
		sqlx::query("DELETE FROM post_category WHERE post_id = $1")
			.bind(post)
			.execute(&mut *tx)
			.await?;

		sqlx::query(
			r#"
				INSERT INTO post_category (post_id, category_id)
				SELECT $1, UNNEST($2::uuid[])
				ON CONFLICT DO NOTHING
			"#,
		)
		.bind(post)
		.bind(categories)
		.execute(&mut *tx)
		.await
		.map_err(constraint_error)?;

		Ok(())
	}
}

#[axum::async_trait]
impl PostStore for PgStore {
	async fn list_posts(
		&self,
		query: &PostQuery,
		limit: i64,
		offset: i64,
	) -> Result<Vec<Post>, Error> {
		let mut builder = QueryBuilder::new(SELECT_POSTS);

		push_filters(&mut builder, query);
		builder
			.push(" GROUP BY p.id ORDER BY p.created_at DESC, p.id DESC LIMIT ")
			.push_bind(limit)
			.push(" OFFSET ")
			.push_bind(offset);

		builder
			.build_query_as::<PostRow>()
			.fetch_all(&self.database)
			.await?
			.into_iter()
			.map(Post::try_from)
			.collect()
	}

	async fn count_posts(&self, query: &PostQuery) -> Result<i64, Error> {
		let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM post p");

		push_filters(&mut builder, query);

		Ok(builder
			.build_query_scalar::<i64>()
			.fetch_one(&self.database)
			.await?)
	}

	async fn get_post(&self, id: Uuid) -> Result<Option<Post>, Error> {
		let mut builder = QueryBuilder::new(SELECT_POSTS);

		builder
			.push(" WHERE p.id = ")
			.push_bind(id)
			.push(" GROUP BY p.id");

		builder
			.build_query_as::<PostRow>()
			.fetch_optional(&self.database)
			.await?
			.map(Post::try_from)
			.transpose()
	}

	async fn create_post(&self, post: NewPost) -> Result<Post, Error> {
		let mut tx = self.database.begin().await?;

		let id = sqlx::query_scalar::<_, Uuid>(
			r#"
				INSERT INTO post (author_id, kind, title, body)
				VALUES ($1, $2, $3, $4)
				RETURNING id
			"#,
		)
		.bind(post.author_id)
		.bind(post.kind.as_str())
		.bind(&post.title)
		.bind(&post.body)
		.fetch_one(&mut *tx)
		.await
		.map_err(constraint_error)?;

		Self::replace_categories(&mut *tx, id, &post.categories).await?;
		tx.commit().await?;

		self.get_post(id)
			.await?
			.ok_or_else(|| Error::Corrupt(format!("post {id} vanished after insert")))
	}

	async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>, Error> {
		let mut tx = self.database.begin().await?;

		let updated = sqlx::query_scalar::<_, Uuid>(
			r#"
				UPDATE post
				SET title = COALESCE($1, title), body = COALESCE($2, body)
				WHERE id = $3
				RETURNING id
			"#,
		)
		.bind(changes.title)
		.bind(changes.body)
		.bind(id)
		.fetch_optional(&mut *tx)
		.await?;

		if updated.is_none() {
			return Ok(None);
		}

		if let Some(categories) = changes.categories {
			Self::replace_categories(&mut *tx, id, &categories).await?;
		}

		tx.commit().await?;

		self.get_post(id).await
	}

	async fn delete_post(&self, id: Uuid) -> Result<bool, Error> {
		let result = sqlx::query("DELETE FROM post WHERE id = $1")
			.bind(id)
			.execute(&self.database)
			.await?;

		Ok(result.rows_affected() > 0)
	}
}

#[axum::async_trait]
impl CategoryStore for PgStore {
	async fn list_categories(&self) -> Result<Vec<Category>, Error> {
		Ok(
			sqlx::query_as::<_, Category>("SELECT id, name FROM category ORDER BY name")
				.fetch_all(&self.database)
				.await?,
		)
	}

	async fn get_category(&self, id: Uuid) -> Result<Option<Category>, Error> {
		Ok(
			sqlx::query_as::<_, Category>("SELECT id, name FROM category WHERE id = $1")
				.bind(id)
				.fetch_optional(&self.database)
				.await?,
		)
	}

	async fn ensure_category(&self, name: &str) -> Result<Category, Error> {
		Ok(sqlx::query_as::<_, Category>(
			r#"
				INSERT INTO category (name) VALUES ($1)
				ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
				RETURNING id, name
			"#,
		)
		.bind(name)
		.fetch_one(&self.database)
		.await?)
	}

	async fn is_subscriber(&self, category: Uuid, user: Uuid) -> Result<bool, Error> {
		Ok(sqlx::query_scalar::<_, bool>(
			r#"
				SELECT EXISTS (
					SELECT 1 FROM category_subscriber
					WHERE category_id = $1 AND user_id = $2
				)
			"#,
		)
		.bind(category)
		.bind(user)
		.fetch_one(&self.database)
		.await?)
	}

	async fn add_subscriber(&self, category: Uuid, user: Uuid) -> Result<bool, Error> {
		let result = sqlx::query(
			r#"
				INSERT INTO category_subscriber (category_id, user_id)
				VALUES ($1, $2)
				ON CONFLICT DO NOTHING
			"#,
		)
		.bind(category)
		.bind(user)
		.execute(&self.database)
		.await
		.map_err(constraint_error)?;

		Ok(result.rows_affected() == 1)
	}

	async fn subscribers(&self, category: Uuid) -> Result<Vec<User>, Error> {
		Ok(sqlx::query_as::<_, User>(
			r#"
				SELECT u.* FROM "user" u
				JOIN category_subscriber s ON s.user_id = u.id
				WHERE s.category_id = $1
			"#,
		)
		.bind(category)
		.fetch_all(&self.database)
		.await?)
	}
}

#[axum::async_trait]
impl AccountStore for PgStore {
	async fn create_user(&self, user: NewUser) -> Result<User, Error> {
		sqlx::query_as::<_, User>(
			r#"
				INSERT INTO "user" (id, email, username, password)
				VALUES ($1, $2, $3, $4)
				RETURNING *
			"#,
		)
		.bind(user.id)
		.bind(user.email)
		.bind(user.username)
		.bind(user.password)
		.fetch_one(&self.database)
		.await
		.map_err(constraint_error)
	}

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
		Ok(
			sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE email = $1"#)
				.bind(email)
				.fetch_optional(&self.database)
				.await?,
		)
	}

	async fn create_session(&self, user: Uuid) -> Result<Session, Error> {
		sqlx::query_as::<_, Session>("INSERT INTO session (user_id) VALUES ($1) RETURNING *")
			.bind(user)
			.fetch_one(&self.database)
			.await
			.map_err(constraint_error)
	}

	async fn find_session_user(&self, session: Uuid) -> Result<Option<User>, Error> {
		Ok(sqlx::query_as::<_, User>(
			r#"
				SELECT * FROM "user" WHERE id = (
					SELECT user_id FROM session WHERE id = $1
				)
			"#,
		)
		.bind(session)
		.fetch_optional(&self.database)
		.await?)
	}

	async fn delete_session(&self, session: Uuid) -> Result<(), Error> {
		sqlx::query("DELETE FROM session WHERE id = $1")
			.bind(session)
			.execute(&self.database)
			.await?;

		Ok(())
	}

	async fn groups(&self, user: Uuid) -> Result<Vec<String>, Error> {
		Ok(sqlx::query_scalar::<_, String>(
			"SELECT group_name FROM user_group WHERE user_id = $1 ORDER BY group_name",
		)
		.bind(user)
		.fetch_all(&self.database)
		.await?)
	}

	async fn add_to_group(&self, user: Uuid, group: &str) -> Result<bool, Error> {
		let result = sqlx::query(
			r#"
				INSERT INTO user_group (user_id, group_name)
				VALUES ($1, $2)
				ON CONFLICT DO NOTHING
			"#,
		)
		.bind(user)
		.bind(group)
		.execute(&self.database)
		.await
		.map_err(constraint_error)?;

		Ok(result.rows_affected() == 1)
	}
}
