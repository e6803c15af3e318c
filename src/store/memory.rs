use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
	AccountStore, CategoryStore, Error, NewPost, NewUser, PostChanges, PostQuery, PostStore,
};
use crate::model::{Category, Post, Session, User};

/// A store that keeps everything in process memory.
///
/// Used when no database is configured, and by the tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
	inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
	/// In insertion order.
	posts: Vec<Post>,
	categories: HashMap<Uuid, Category>,
	subscribers: HashMap<Uuid, HashSet<Uuid>>,
	users: HashMap<Uuid, User>,
	sessions: HashMap<Uuid, Session>,
	groups: HashMap<Uuid, BTreeSet<String>>,
}

impl Inner {
	fn matches(&self, query: &PostQuery, post: &Post) -> bool {
		if query.author.is_some_and(|author| author != post.author_id) {
			return false;
		}

		if let Some(name) = &query.author_name {
			let username = self.users.get(&post.author_id).map(|user| &user.username);

			if !username.is_some_and(|username| username.to_lowercase() == name.to_lowercase()) {
				return false;
			}
		}

		if query
			.category
			.is_some_and(|category| !post.categories.contains(&category))
		{
			return false;
		}

		if let Some(title) = &query.title {
			if !post.title.to_lowercase().contains(&title.to_lowercase()) {
				return false;
			}
		}

		query.created_from.map_or(true, |from| post.created_at >= from)
			&& query.created_until.map_or(true, |until| post.created_at < until)
	}

	fn check_categories(&self, categories: &[Uuid]) -> Result<(), Error> {
		match categories
			.iter()
			.find(|id| !self.categories.contains_key(id))
		{
			Some(_) => Err(Error::MissingReference("post_category_category_id_fkey".into())),
			None => Ok(()),
		}
	}
}

fn dedup(categories: Vec<Uuid>) -> Vec<Uuid> {
	let mut seen = HashSet::new();

	categories
		.into_iter()
		.filter(|id| seen.insert(*id))
		.collect()
}

#[cfg(test)]
impl MemoryStore {
	/// Inserts a post as-is, keeping its id and creation time.
	pub async fn insert_post(&self, post: Post) {
		self.inner.write().await.posts.push(post);
	}
}

#[axum::async_trait]
impl PostStore for MemoryStore {
	async fn list_posts(
		&self,
		query: &PostQuery,
		limit: i64,
		offset: i64,
	) -> Result<Vec<Post>, Error> {
		let inner = self.inner.read().await;
		let mut posts = inner
			.posts
			.iter()
			.rev()
			.filter(|post| inner.matches(query, post))
			.cloned()
			.collect::<Vec<_>>();

		// stable, so equal timestamps stay newest-inserted first
		posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

		Ok(posts
			.into_iter()
			.skip(usize::try_from(offset).unwrap_or(0))
			.take(usize::try_from(limit).unwrap_or(0))
			.collect())
	}

	async fn count_posts(&self, query: &PostQuery) -> Result<i64, Error> {
		let inner = self.inner.read().await;
		let count = inner
			.posts
			.iter()
			.filter(|post| inner.matches(query, post))
			.count();

		i64::try_from(count).map_err(|e| Error::Corrupt(e.to_string()))
	}

	async fn get_post(&self, id: Uuid) -> Result<Option<Post>, Error> {
		let inner = self.inner.read().await;

		Ok(inner.posts.iter().find(|post| post.id == id).cloned())
	}

	async fn create_post(&self, post: NewPost) -> Result<Post, Error> {
		let mut inner = self.inner.write().await;
		inner.check_categories(&post.categories)?;

		let post = Post {
			id: Uuid::new_v4(),
			author_id: post.author_id,
			kind: post.kind,
			title: post.title,
			body: post.body,
			categories: dedup(post.categories),
			rating: 0,
			created_at: Utc::now(),
		};

		inner.posts.push(post.clone());

		Ok(post)
	}

	async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>, Error> {
		let mut inner = self.inner.write().await;

		let Some(index) = inner.posts.iter().position(|post| post.id == id) else {
			return Ok(None);
		};

		if let Some(categories) = &changes.categories {
			inner.check_categories(categories)?;
		}

		let post = &mut inner.posts[index];

		if let Some(title) = changes.title {
			post.title = title;
		}

		if let Some(body) = changes.body {
			post.body = body;
		}

		if let Some(categories) = changes.categories {
			post.categories = dedup(categories);
		}

		Ok(Some(post.clone()))
	}

	async fn delete_post(&self, id: Uuid) -> Result<bool, Error> {
		let mut inner = self.inner.write().await;
		let before = inner.posts.len();

		inner.posts.retain(|post| post.id != id);

		Ok(inner.posts.len() != before)
	}
}

#[axum::async_trait]
impl CategoryStore for MemoryStore {
	async fn list_categories(&self) -> Result<Vec<Category>, Error> {
		let mut categories = self
			.inner
			.read()
			.await
			.categories
			.values()
			.cloned()
			.collect::<Vec<_>>();

		categories.sort_by(|a, b| a.name.cmp(&b.name));

		Ok(categories)
	}

	async fn get_category(&self, id: Uuid) -> Result<Option<Category>, Error> {
		Ok(self.inner.read().await.categories.get(&id).cloned())
	}

	async fn ensure_category(&self, name: &str) -> Result<Category, Error> {
		let mut inner = self.inner.write().await;

		if let Some(category) = inner.categories.values().find(|c| c.name == name) {
			return Ok(category.clone());
		}

		let category = Category {
			id: Uuid::new_v4(),
			name: name.to_owned(),
		};

		inner.categories.insert(category.id, category.clone());

		Ok(category)
	}

	async fn is_subscriber(&self, category: Uuid, user: Uuid) -> Result<bool, Error> {
		Ok(self
			.inner
			.read()
			.await
			.subscribers
			.get(&category)
			.is_some_and(|users| users.contains(&user)))
	}

	async fn add_subscriber(&self, category: Uuid, user: Uuid) -> Result<bool, Error> {
		let mut inner = self.inner.write().await;

		if !inner.categories.contains_key(&category) {
			return Err(Error::MissingReference(
				"category_subscriber_category_id_fkey".into(),
			));
		}

		Ok(inner.subscribers.entry(category).or_default().insert(user))
	}

	async fn subscribers(&self, category: Uuid) -> Result<Vec<User>, Error> {
		let inner = self.inner.read().await;
		let Some(ids) = inner.subscribers.get(&category) else {
			return Ok(Vec::new());
		};

		Ok(ids
			.iter()
			.filter_map(|id| inner.users.get(id))
			.cloned()
			.collect())
	}
}

#[axum::async_trait]
impl AccountStore for MemoryStore {
	async fn create_user(&self, user: NewUser) -> Result<User, Error> {
		let mut inner = self.inner.write().await;

		if inner.users.values().any(|u| u.email == user.email) {
			return Err(Error::Duplicate("user_email_key".into()));
		}

		if inner.users.values().any(|u| u.username == user.username) {
			return Err(Error::Duplicate("user_username_key".into()));
		}

		let user = User {
			id: user.id,
			email: user.email,
			password: user.password,
			username: user.username,
			created_at: Utc::now(),
		};

		inner.users.insert(user.id, user.clone());

		Ok(user)
	}

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
		Ok(self
			.inner
			.read()
			.await
			.users
			.values()
			.find(|user| user.email == email)
			.cloned())
	}

	async fn create_session(&self, user: Uuid) -> Result<Session, Error> {
		let mut inner = self.inner.write().await;

		if !inner.users.contains_key(&user) {
			return Err(Error::MissingReference("session_user_id_fkey".into()));
		}

		let session = Session {
			id: Uuid::new_v4(),
			user_id: user,
			created_at: Utc::now(),
		};

		inner.sessions.insert(session.id, session.clone());

		Ok(session)
	}

	async fn find_session_user(&self, session: Uuid) -> Result<Option<User>, Error> {
		let inner = self.inner.read().await;

		Ok(inner
			.sessions
			.get(&session)
			.and_then(|session| inner.users.get(&session.user_id))
			.cloned())
	}

	async fn delete_session(&self, session: Uuid) -> Result<(), Error> {
		self.inner.write().await.sessions.remove(&session);

		Ok(())
	}

	async fn groups(&self, user: Uuid) -> Result<Vec<String>, Error> {
		Ok(self
			.inner
			.read()
			.await
			.groups
			.get(&user)
			.map(|groups| groups.iter().cloned().collect())
			.unwrap_or_default())
	}

	async fn add_to_group(&self, user: Uuid, group: &str) -> Result<bool, Error> {
		Ok(self
			.inner
			.write()
			.await
			.groups
			.entry(user)
			.or_default()
			.insert(group.to_owned()))
	}
}

#[cfg(test)]
mod test {
	use chrono::Duration;

	use super::*;
	use crate::model::PostKind;

	fn new_post(author_id: Uuid, title: &str, categories: Vec<Uuid>) -> NewPost {
		NewPost {
			author_id,
			kind: PostKind::News,
			title: title.into(),
			body: "body".into(),
			categories,
		}
	}

	#[tokio::test]
	async fn test_list_is_newest_first_and_windowed() {
		let store = MemoryStore::default();
		let author = Uuid::new_v4();

		for i in 0..5 {
			store
				.create_post(new_post(author, &format!("post {i}"), Vec::new()))
				.await
				.unwrap();
		}

		let posts = store
			.list_posts(&PostQuery::default(), 2, 1)
			.await
			.unwrap();

		let titles = posts.iter().map(|p| p.title.as_str()).collect::<Vec<_>>();
		assert_eq!(titles, ["post 3", "post 2"]);
	}

	#[tokio::test]
	async fn test_query_filters() {
		let store = MemoryStore::default();
		let sport = store.ensure_category("Sport").await.unwrap();
		let author = Uuid::new_v4();

		store
			.create_post(new_post(author, "Football final", vec![sport.id]))
			.await
			.unwrap();
		store
			.create_post(new_post(author, "Election night", Vec::new()))
			.await
			.unwrap();
		store
			.insert_post(Post {
				id: Uuid::new_v4(),
				author_id: author,
				kind: PostKind::Article,
				title: "Old football story".into(),
				body: "body".into(),
				categories: vec![sport.id],
				rating: 0,
				created_at: Utc::now() - Duration::days(3),
			})
			.await;

		let by_category = PostQuery {
			category: Some(sport.id),
			..Default::default()
		};
		assert_eq!(store.count_posts(&by_category).await.unwrap(), 2);

		let recent_football = PostQuery {
			title: Some("FOOTBALL".into()),
			created_from: Some(Utc::now() - Duration::days(1)),
			..Default::default()
		};
		let posts = store.list_posts(&recent_football, 10, 0).await.unwrap();
		assert_eq!(posts.len(), 1);
		assert_eq!(posts[0].title, "Football final");
	}

	#[tokio::test]
	async fn test_unknown_category_is_rejected() {
		let store = MemoryStore::default();
		let result = store
			.create_post(new_post(Uuid::new_v4(), "title", vec![Uuid::new_v4()]))
			.await;

		assert!(matches!(result, Err(Error::MissingReference(..))));
	}

	#[tokio::test]
	async fn test_duplicate_user() {
		let store = MemoryStore::default();
		let user = NewUser {
			id: Uuid::new_v4(),
			email: "john@smith.com".into(),
			username: "john".into(),
			password: Vec::new(),
		};

		store.create_user(user.clone()).await.unwrap();

		let result = store
			.create_user(NewUser {
				id: Uuid::new_v4(),
				..user
			})
			.await;

		assert!(matches!(result, Err(Error::Duplicate(c)) if c == "user_email_key"));
	}

	#[tokio::test]
	async fn test_ensure_category_is_idempotent() {
		let store = MemoryStore::default();

		let first = store.ensure_category("Sport").await.unwrap();
		let second = store.ensure_category("Sport").await.unwrap();

		assert_eq!(first, second);
		assert_eq!(store.list_categories().await.unwrap(), [first]);
	}

	#[tokio::test]
	async fn test_update_of_missing_post_ignores_categories() {
		let store = MemoryStore::default();

		let result = store
			.update_post(
				Uuid::new_v4(),
				PostChanges {
					categories: Some(vec![Uuid::new_v4()]),
					..Default::default()
				},
			)
			.await;

		assert!(matches!(result, Ok(None)));
	}
}
