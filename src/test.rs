//! Helpers for driving the whole router in tests.

use std::{
	num::NonZeroUsize,
	sync::{Arc, Mutex},
	time::Duration,
};

use argon2::Argon2;
use uuid::Uuid;

pub use axum::http::{header, HeaderValue};
pub use axum_test::{TestResponse, TestServer};
pub use serde_json::{json, Value};

pub use crate::store::{AccountStore, CategoryStore, PostStore};
use crate::{
	cache::MemoryCache,
	model::AUTHORS_GROUP,
	notify::Dispatch,
	store::{MemoryStore, NewUser},
	State,
};

/// Records enqueued notification jobs instead of running them.
#[derive(Default)]
pub struct Outbox(Mutex<Vec<Uuid>>);

impl Outbox {
	pub fn jobs(&self) -> Vec<Uuid> {
		self.0.lock().unwrap().clone()
	}
}

impl Dispatch for Outbox {
	fn enqueue(&self, post_id: Uuid) {
		self.0.lock().unwrap().push(post_id);
	}
}

pub struct TestApp {
	pub server: TestServer,
	pub store: Arc<MemoryStore>,
	pub outbox: Arc<Outbox>,
}

pub fn app() -> TestApp {
	let store = Arc::new(MemoryStore::default());
	let outbox = Arc::new(Outbox::default());

	let state = State {
		store: store.clone(),
		cache: Arc::new(MemoryCache::new(
			NonZeroUsize::new(16).unwrap(),
			Duration::from_secs(60),
		)),
		notifier: outbox.clone(),
		hasher: Argon2::default(),
	};

	TestApp {
		server: TestServer::new(crate::app(state)).unwrap(),
		store,
		outbox,
	}
}

/// A logged-in user, with the value to send in the `Cookie` header.
pub struct Member {
	pub id: Uuid,
	pub cookie: HeaderValue,
}

impl TestApp {
	pub async fn member(&self, username: &str) -> Member {
		let user = self
			.store
			.create_user(NewUser {
				id: Uuid::new_v4(),
				email: format!("{username}@example.com"),
				username: username.into(),
				password: Vec::new(),
			})
			.await
			.unwrap();
		let session = self.store.create_session(user.id).await.unwrap();

		Member {
			id: user.id,
			cookie: HeaderValue::from_str(&format!("session={}", session.id)).unwrap(),
		}
	}

	pub async fn author(&self, username: &str) -> Member {
		let member = self.member(username).await;

		self.store
			.add_to_group(member.id, AUTHORS_GROUP)
			.await
			.unwrap();
		member
	}
}
