//! Daily limit on how many posts an author may create.

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use crate::store::{self, PostQuery, PostStore};

/// Posts an author may create per calendar day (UTC).
pub const DAILY_LIMIT: i64 = 3;

/// Start (inclusive) and end (exclusive) of the UTC day containing `now`.
pub fn day_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
	let midnight = now
		.date_naive()
		.and_hms_opt(0, 0, 0)
		.map_or(now, |midnight| Utc.from_utc_datetime(&midnight));

	(midnight, midnight + Duration::days(1))
}

/// How many posts `author` has created on the day of `now`.
pub async fn posts_today<S>(store: &S, author: Uuid, now: DateTime<Utc>) -> Result<i64, store::Error>
where
	S: PostStore + ?Sized,
{
	let (from, until) = day_bounds(now);

	store
		.count_posts(&PostQuery {
			author: Some(author),
			created_from: Some(from),
			created_until: Some(until),
			..Default::default()
		})
		.await
}

pub fn exceeded(written_today: i64) -> bool {
	written_today >= DAILY_LIMIT
}

pub fn remaining(written_today: i64) -> i64 {
	(DAILY_LIMIT - written_today).max(0)
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::{
		model::{Post, PostKind},
		store::MemoryStore,
	};

	#[test]
	fn test_day_bounds() {
		let now = Utc.with_ymd_and_hms(2024, 5, 17, 23, 59, 59).unwrap();
		let (from, until) = day_bounds(now);

		assert_eq!(from, Utc.with_ymd_and_hms(2024, 5, 17, 0, 0, 0).unwrap());
		assert_eq!(until, Utc.with_ymd_and_hms(2024, 5, 18, 0, 0, 0).unwrap());
	}

	#[test]
	fn test_limit() {
		assert!(!exceeded(2));
		assert!(exceeded(3));
		assert_eq!(remaining(1), 2);
		assert_eq!(remaining(5), 0);
	}

	#[tokio::test]
	async fn test_only_todays_posts_by_the_author_count() {
		let store = MemoryStore::default();
		let author = Uuid::new_v4();
		let now = Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap();

		let post = |author_id, created_at| Post {
			id: Uuid::new_v4(),
			author_id,
			kind: PostKind::News,
			title: "title".into(),
			body: "body".into(),
			categories: Vec::new(),
			rating: 0,
			created_at,
		};

		store.insert_post(post(author, now - Duration::hours(3))).await;
		store.insert_post(post(author, now - Duration::hours(13))).await;
		store.insert_post(post(Uuid::new_v4(), now)).await;

		assert_eq!(posts_today(&store, author, now).await.unwrap(), 1);
	}
}
