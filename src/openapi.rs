use aide::{
	openapi::{ApiKeyLocation, SecurityScheme, Tag},
	transform::TransformOpenApi,
};

use crate::{error, extract::Json, session};

/// Name of the session cookie security scheme.
pub const SECURITY_SCHEME_SESSION: &str = "Session";

pub mod tag {
	pub const AUTH: &str = "Auth";
	pub const NEWS: &str = "News";
	pub const CATEGORY: &str = "Category";
	pub const MEMBER: &str = "Member";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("News Portal")
		.summary("Publish, browse and subscribe to news and articles")
		.description(include_str!("../README.md"))
		.tag(Tag {
			name: tag::AUTH.into(),
			description: Some("Accounts and sessions".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::NEWS.into(),
			description: Some("News items and articles".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::CATEGORY.into(),
			description: Some("Categories and subscriptions".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::MEMBER.into(),
			description: Some("The member area".into()),
			..Default::default()
		})
		.security_scheme(
			SECURITY_SCHEME_SESSION,
			SecurityScheme::ApiKey {
				location: ApiKeyLocation::Cookie,
				name: session::COOKIE_NAME.into(),
				description: Some("A user session cookie".into()),
				extensions: Default::default(),
			},
		)
		.default_response_with::<Json<error::ErrorResponse>, _>(|res| {
			res.example(error::ErrorResponse::new(
				error::Message::new("unknown_post")
					.detail("post", "00000000-0000-0000-0000-000000000000")
					.into_vec(),
			))
		})
}
