use schemars::JsonSchema;
use serde::Serialize;

#[derive(Debug, Serialize, JsonSchema)]
pub struct Index {
	pub username: String,
	/// Whether the user still has to become an author to publish.
	pub is_not_author: bool,
}
