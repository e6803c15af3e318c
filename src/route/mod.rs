use aide::axum::ApiRouter;

use crate::{model::PostKind, AppState};

pub mod auth;
pub mod category;
pub mod docs;
pub mod member;
pub mod model;
pub mod post;

pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new()
		.merge(member::routes())
		.nest("/auth", auth::routes())
		.nest(
			"/news",
			post::routes().merge(post::editor_routes(PostKind::News)),
		)
		.nest("/articles", post::editor_routes(PostKind::Article))
		.nest("/category", category::routes())
		.nest("/docs", docs::routes())
}
