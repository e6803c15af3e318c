use std::{sync::Arc, time::Duration};

use axum::{
	body::Body,
	response::{IntoResponse, Response},
};
use governor::{
	clock::QuantaInstant,
	middleware::{RateLimitingMiddleware, StateInformationMiddleware},
};
use tower_governor::{
	governor::{GovernorConfig, GovernorConfigBuilder},
	key_extractor::{KeyExtractor, PeerIpKeyExtractor},
	GovernorError,
};

use crate::{config::Config, error::AppError};

pub type PeerConfig = GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Per-IP limits for the whole router.
///
/// Returns `None` when the configured replenish interval or burst is zero, which the
/// governor does not accept.
pub fn per_peer(config: &Config) -> Option<Arc<PeerConfig>> {
	GovernorConfigBuilder::default()
		.per_millisecond(config.rate_limit_replenish_ms)
		.burst_size(config.rate_limit_burst)
		.use_headers()
		.error_handler(error_handler)
		.finish()
		.map(Arc::new)
}

fn error_handler(error: GovernorError) -> Response<Body> {
	AppError::from(error).into_response()
}

/// Drops the state of peers that have not been seen for a while, once a minute.
pub fn cleanup_old_limits<T, M>(configs: &[&Arc<GovernorConfig<T, M>>])
where
	T: KeyExtractor,
	<T as KeyExtractor>::Key: Send + Sync + 'static,
	M: RateLimitingMiddleware<QuantaInstant> + Send + Sync + 'static,
{
	let limiters = configs
		.iter()
		.map(|config| config.limiter().clone())
		.collect::<Vec<_>>();
	let interval = Duration::from_secs(60);

	std::thread::spawn(move || loop {
		std::thread::sleep(interval);

		for limiter in &limiters {
			tracing::debug!(peers = limiter.len(), "pruning rate limiter state");

			limiter.retain_recent();
		}
	});
}
