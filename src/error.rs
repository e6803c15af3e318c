use std::borrow::Cow;

use aide::OperationOutput;
use axum::{
	body::Body,
	extract::rejection,
	http::{Response, StatusCode},
	response::IntoResponse,
	Json,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::store;

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single error message sent to the client.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message {
	/// A machine-readable error code.
	pub content: Cow<'static, str>,
	/// The input field the error refers to, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'static, str>>,
	/// Additional structured information about the error.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Map>,
}

impl Message {
	pub fn new(content: impl Into<Cow<'static, str>>) -> Self {
		Self {
			content: content.into(),
			field: None,
			details: None,
		}
	}

	pub fn field(mut self, field: impl Into<Cow<'static, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	pub fn detail(mut self, key: &str, value: impl Serialize) -> Self {
		let value = serde_json::to_value(value).unwrap_or_default();

		self.details
			.get_or_insert_with(Map::new)
			.insert(key.to_owned(), value);
		self
	}

	pub fn into_vec(self) -> Vec<Self> {
		vec![self]
	}
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorResponse {
	pub success: bool,
	pub errors: Vec<Message>,
}

impl ErrorResponse {
	pub fn new(errors: Vec<Message>) -> Self {
		Self {
			success: false,
			errors,
		}
	}
}

/// Describes how a route-specific error is presented to the client.
///
/// The [`std::fmt::Display`] output is only logged, so it may contain details
/// the client should not see.
pub trait ErrorShape: std::error::Error + Send + Sync + 'static {
	fn status(&self) -> StatusCode;

	fn into_errors(self) -> Vec<Message>;
}

/// Errors raised by the extractors, shared by all routes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("invalid json body")]
	Json(axum_jsonschema::JsonSchemaRejection),
	#[error("query error: {0}")]
	Query(#[from] rejection::QueryRejection),
	#[error("path error: {0}")]
	Path(#[from] rejection::PathRejection),
	#[error("rate limited")]
	RateLimit(tower_governor::GovernorError),
}

impl From<axum_jsonschema::JsonSchemaRejection> for AppError {
	fn from(rejection: axum_jsonschema::JsonSchemaRejection) -> Self {
		Self::Json(rejection)
	}
}

impl From<tower_governor::GovernorError> for AppError {
	fn from(error: tower_governor::GovernorError) -> Self {
		Self::RateLimit(error)
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		let (status, errors) = match self {
			Self::Validation(errors) => (
				StatusCode::BAD_REQUEST,
				errors
					.field_errors()
					.into_iter()
					.flat_map(|(field, errors)| {
						errors.iter().map(move |error| {
							Message::new(error.code.clone()).field(field.to_string())
						})
					})
					.collect(),
			),
			// keeps the schema violation details
			Self::Json(rejection) => return rejection.into_response(),
			Self::Query(rejection) => (
				StatusCode::BAD_REQUEST,
				Message::new("invalid_query")
					.detail("reason", rejection.body_text())
					.into_vec(),
			),
			Self::Path(rejection) => (
				StatusCode::BAD_REQUEST,
				Message::new("invalid_path")
					.detail("reason", rejection.body_text())
					.into_vec(),
			),
			Self::RateLimit(..) => (
				StatusCode::TOO_MANY_REQUESTS,
				Message::new("rate_limited").into_vec(),
			),
		};

		(status, Json(ErrorResponse::new(errors))).into_response()
	}
}

/// The error type returned by handlers of a route module with errors `E`.
#[derive(Debug, thiserror::Error)]
pub enum RouteError<E: ErrorShape> {
	#[error(transparent)]
	Route(E),
	#[error(transparent)]
	App(#[from] AppError),
	#[error("store error: {0}")]
	Store(#[from] store::Error),
}

impl<E: ErrorShape> From<E> for RouteError<E> {
	fn from(error: E) -> Self {
		Self::Route(error)
	}
}

impl<E: ErrorShape> RouteError<E> {
	/// Converts the route-specific part of the error, keeping the rest.
	pub fn map<F: ErrorShape>(self, f: impl FnOnce(E) -> F) -> RouteError<F> {
		match self {
			Self::Route(error) => RouteError::Route(f(error)),
			Self::App(error) => RouteError::App(error),
			Self::Store(error) => RouteError::Store(error),
		}
	}
}

impl<E: ErrorShape> IntoResponse for RouteError<E> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::Route(error) => {
				let status = error.status();

				if status.is_server_error() {
					tracing::error!(%error, "route error");
				}

				(status, Json(ErrorResponse::new(error.into_errors()))).into_response()
			}
			Self::App(error) => error.into_response(),
			Self::Store(error) => {
				tracing::error!(%error, "store error");

				(
					StatusCode::INTERNAL_SERVER_ERROR,
					Json(ErrorResponse::new(Vec::new())),
				)
					.into_response()
			}
		}
	}
}

impl<E: ErrorShape> OperationOutput for RouteError<E> {
	type Inner = ErrorResponse;
}
