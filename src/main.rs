#![warn(clippy::pedantic)]

mod cache;
mod config;
mod error;
mod extract;
mod filter;
mod model;
mod notify;
mod openapi;
mod quota;
mod ratelimit;
mod response;
mod route;
mod session;
mod store;
mod trace;

#[cfg(test)]
mod test;

use std::{net::SocketAddr, sync::Arc};

use aide::openapi::OpenApi;
use argon2::Argon2;
use axum::{http::Method, Extension, Router, ServiceExt};
use tower::Layer;
use tower_governor::GovernorLayer;
use tower_http::{
	compression::CompressionLayer,
	cors::{self, CorsLayer},
	normalize_path::NormalizePathLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use crate::{
	cache::{Cache, MemoryCache},
	config::Config,
	notify::{Dispatcher, LogMailer, Queue},
	store::{CategoryStore, MemoryStore, PgStore, Store},
};

pub type Database = sqlx::Pool<sqlx::Postgres>;
pub type AppState = State;

/// The shared application state.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub store: Store,
	pub cache: Cache,
	pub notifier: Dispatcher,
	pub hasher: Argon2<'static>,
}

/// Builds the router with its documentation, without rate limiting.
pub fn app(state: State) -> Router {
	let mut api = OpenApi::default();

	route::routes()
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.layer(CompressionLayer::new())
		.layer(
			CorsLayer::new()
				.allow_methods([Method::GET, Method::POST])
				.allow_origin(cors::Any),
		)
		.layer(PropagateRequestIdLayer::x_request_id())
		.layer(TraceLayer::new_for_http())
		.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
		.with_state(state)
}

#[derive(Debug, thiserror::Error)]
enum Error {
	#[error(transparent)]
	Config(#[from] config::Error),
	#[error(transparent)]
	Trace(#[from] trace::Error),
	#[error(transparent)]
	Store(#[from] store::Error),
	#[error("invalid rate limit settings")]
	RateLimit,
	#[error("server error: {0}")]
	Io(#[from] std::io::Error),
}

async fn open_store(config: &Config) -> Result<Store, Error> {
	let Some(url) = &config.database_url else {
		tracing::warn!("DATABASE_URL is not set, keeping everything in memory");
		return Ok(Arc::new(MemoryStore::default()));
	};

	let store = PgStore::new(Database::connect(url).await.map_err(store::Error::from)?);

	store.migrate().await?;

	Ok(Arc::new(store))
}

async fn seed_categories(store: &Store, names: &[String]) -> Result<(), Error> {
	for name in names {
		let category = store.ensure_category(name).await?;

		tracing::debug!(id = %category.id, name = %category.name, "category ready");
	}

	Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
	let config = Config::from_env()?;
	let _guard = trace::init(&config)?;

	let store = open_store(&config).await?;
	seed_categories(&store, &config.categories).await?;

	let state = State {
		notifier: Arc::new(Queue::spawn(store.clone(), Arc::new(LogMailer))),
		cache: Arc::new(MemoryCache::new(config.cache_capacity, config.cache_ttl)),
		store,
		hasher: Argon2::default(),
	};

	let governor = ratelimit::per_peer(&config).ok_or(Error::RateLimit)?;
	ratelimit::cleanup_old_limits(&[&governor]);

	let app = app(state).layer(GovernorLayer { config: governor });
	let app = NormalizePathLayer::trim_trailing_slash().layer(app);

	let listener = tokio::net::TcpListener::bind((config.host, config.port)).await?;

	tracing::info!(host = %config.host, port = config.port, "listening");

	axum::serve(
		listener,
		ServiceExt::<axum::extract::Request>::into_make_service_with_connect_info::<SocketAddr>(
			app,
		),
	)
	.await?;

	Ok(())
}
