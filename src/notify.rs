//! Notifies category subscribers about new posts.
//!
//! Handlers only enqueue the id of the new post through a [`Dispatch`]; a
//! background worker resolves the subscribers and hands the messages to a
//! [`Mailer`].

use std::{collections::HashSet, sync::Arc};

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::store::{self, DataStore, Store};

/// How much of the post's body goes into the notification.
const PREVIEW_CHARS: usize = 50;

pub type Dispatcher = Arc<dyn Dispatch>;

/// Accepts notification jobs without waiting for them to run.
pub trait Dispatch: Send + Sync {
	fn enqueue(&self, post_id: Uuid);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
	pub to: String,
	pub subject: String,
	pub body: String,
}

#[derive(Debug, thiserror::Error)]
#[error("mail delivery failed: {0}")]
pub struct MailError(pub String);

#[axum::async_trait]
pub trait Mailer: Send + Sync {
	async fn send(&self, mail: Mail) -> Result<(), MailError>;
}

/// A mailer that only logs the messages it is given.
#[derive(Debug, Default)]
pub struct LogMailer;

#[axum::async_trait]
impl Mailer for LogMailer {
	async fn send(&self, mail: Mail) -> Result<(), MailError> {
		tracing::info!(to = %mail.to, subject = %mail.subject, "sending notification");

		Ok(())
	}
}

/// Runs notification jobs on a background task, one at a time.
pub struct Queue {
	sender: mpsc::UnboundedSender<Uuid>,
}

impl Queue {
	/// Spawns the worker. Must be called from within a Tokio runtime.
	pub fn spawn(store: Store, mailer: Arc<dyn Mailer>) -> Self {
		let (sender, mut receiver) = mpsc::unbounded_channel::<Uuid>();

		tokio::spawn(async move {
			while let Some(post_id) = receiver.recv().await {
				match notify_subscribers(&*store, &*mailer, post_id).await {
					Ok(sent) => tracing::debug!(%post_id, sent, "notified subscribers"),
					Err(error) => tracing::error!(%post_id, %error, "notification job failed"),
				}
			}
		});

		Self { sender }
	}
}

impl Dispatch for Queue {
	fn enqueue(&self, post_id: Uuid) {
		if self.sender.send(post_id).is_err() {
			tracing::warn!(%post_id, "notification worker is gone, dropping job");
		}
	}
}

fn preview(body: &str) -> String {
	let mut chars = body.chars();
	let preview = chars.by_ref().take(PREVIEW_CHARS).collect::<String>();

	if chars.next().is_some() {
		format!("{preview}...")
	} else {
		preview
	}
}

/// Mails every subscriber of the post's categories once, returning how many
/// messages were handed to the mailer.
///
/// A failed delivery is logged and does not stop the others.
pub async fn notify_subscribers<S>(
	store: &S,
	mailer: &dyn Mailer,
	post_id: Uuid,
) -> Result<usize, store::Error>
where
	S: DataStore + ?Sized,
{
	let Some(post) = store.get_post(post_id).await? else {
		tracing::warn!(%post_id, "post disappeared before notification");
		return Ok(0);
	};

	let mut seen = HashSet::new();
	let mut sent = 0;

	for category in &post.categories {
		for user in store.subscribers(*category).await? {
			if !seen.insert(user.id) {
				continue;
			}

			let mail = Mail {
				to: user.email,
				subject: post.title.clone(),
				body: format!(
					"Hello, {}! A new post is out in your favourite category.\n\n{}\n\nRead it at {}",
					user.username,
					preview(&post.body),
					post.url(),
				),
			};

			match mailer.send(mail).await {
				Ok(()) => sent += 1,
				Err(error) => tracing::warn!(user = %user.id, %error, "could not notify subscriber"),
			}
		}
	}

	Ok(sent)
}
