use schemars::JsonSchema;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Items shown per page of a listing.
pub const PAGE_SIZE: i64 = 10;

/// Can be removed when [`serde`] supports literal defaults:
/// <https://github.com/serde-rs/serde/issues/368>
#[inline]
fn one() -> i64 {
	1
}

#[derive(Debug, Clone, Copy, Deserialize, Validate, JsonSchema)]
pub struct PageInput {
	/// The page number to return (1-indexed).
	#[validate(range(min = 1, max = 10000))]
	#[serde(default = "one")]
	pub page: i64,
}

impl Default for PageInput {
	fn default() -> Self {
		Self { page: one() }
	}
}

impl PageInput {
	pub fn offset(&self) -> i64 {
		(self.page - 1) * PAGE_SIZE
	}

	/// One more than a page, so [`PageInput::split`] can tell whether
	/// another page follows.
	pub fn limit(&self) -> i64 {
		PAGE_SIZE + 1
	}

	/// Cuts a result fetched with [`PageInput::limit`] down to one page,
	/// returning whether there are more items after it.
	pub fn split<T>(&self, mut items: Vec<T>) -> (Vec<T>, bool) {
		let page_size = usize::try_from(PAGE_SIZE).unwrap_or(usize::MAX);
		let has_next = items.len() > page_size;

		items.truncate(page_size);
		(items, has_next)
	}
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct IdInput {
	pub id: Uuid,
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_page_offset() {
		let mut paginate = PageInput { page: 1 };

		assert_eq!(paginate.offset(), 0);

		paginate.page = 2;

		assert_eq!(paginate.offset(), 10);

		paginate.page = 5;

		assert_eq!(paginate.offset(), 40);
	}

	#[test]
	fn test_page_split() {
		let paginate = PageInput::default();

		let (items, has_next) = paginate.split((0..11).collect::<Vec<_>>());
		assert_eq!(items.len(), 10);
		assert!(has_next);

		let (items, has_next) = paginate.split((0..10).collect::<Vec<_>>());
		assert_eq!(items.len(), 10);
		assert!(!has_next);

		let (items, has_next) = paginate.split(Vec::<i32>::new());
		assert!(items.is_empty());
		assert!(!has_next);
	}
}
