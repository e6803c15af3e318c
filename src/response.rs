use aide::{
	gen::GenContext,
	openapi::{Operation, Response as ApiResponse},
	OperationOutput,
};
use axum::response::{IntoResponse, Redirect, Response};

/// A `303 See Other` redirect, sent after a form-style action succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeeOther(pub String);

impl SeeOther {
	pub fn to(location: impl Into<String>) -> Self {
		Self(location.into())
	}
}

impl IntoResponse for SeeOther {
	fn into_response(self) -> Response {
		Redirect::to(&self.0).into_response()
	}
}

impl OperationOutput for SeeOther {
	type Inner = Self;

	fn inferred_responses(
		_ctx: &mut GenContext,
		_operation: &mut Operation,
	) -> Vec<(Option<u16>, ApiResponse)> {
		vec![(
			Some(303),
			ApiResponse {
				description: "Redirects to the page showing the result.".into(),
				..Default::default()
			},
		)]
	}
}
