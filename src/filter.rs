//! Turns search parameters into a post query.

use std::{fmt::Display, str::FromStr};

use chrono::{NaiveDate, TimeZone, Utc};
use schemars::JsonSchema;
use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::store::PostQuery;

/// Search parameters for posts. Blank values are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, Validate, JsonSchema)]
pub struct PostFilter {
	/// Part of the title, matched case-insensitively.
	#[validate(length(max = 128))]
	pub title: Option<String>,
	/// The author's username, matched case-insensitively.
	#[validate(length(max = 16))]
	pub author: Option<String>,
	/// Only posts filed under this category.
	#[serde(default, deserialize_with = "blank_as_none")]
	pub category: Option<Uuid>,
	/// Only posts created on or after this day.
	#[serde(default, deserialize_with = "blank_as_none")]
	pub after: Option<NaiveDate>,
}

/// Forms send empty fields as `name=`, which would not parse.
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
	D: Deserializer<'de>,
	T: FromStr,
	T::Err: Display,
{
	match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
		None | Some("") => Ok(None),
		Some(value) => value.parse().map(Some).map_err(de::Error::custom),
	}
}

/// The query built from a [`PostFilter`], along with the filter itself so it
/// can be shown back to the reader.
#[derive(Debug, Clone)]
pub struct FilterSet {
	pub query: PostQuery,
	pub state: PostFilter,
}

fn non_blank(value: Option<String>) -> Option<String> {
	value
		.map(|value| value.trim().to_owned())
		.filter(|value| !value.is_empty())
}

impl FilterSet {
	/// Narrows `base` by the given parameters. Conditions already set on
	/// `base` are replaced by the parameters that are present.
	pub fn new(params: PostFilter, base: PostQuery) -> Self {
		let state = PostFilter {
			title: non_blank(params.title),
			author: non_blank(params.author),
			..params
		};

		let query = PostQuery {
			title: state.title.clone().or(base.title),
			author_name: state.author.clone().or(base.author_name),
			category: state.category.or(base.category),
			created_from: state
				.after
				.and_then(|day| day.and_hms_opt(0, 0, 0))
				.map(|midnight| Utc.from_utc_datetime(&midnight))
				.or(base.created_from),
			..base
		};

		Self { query, state }
	}
}
