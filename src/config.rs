use std::{net::IpAddr, num::NonZeroUsize, str::FromStr, time::Duration};

use tracing::Level;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{name} must be {expected}, got `{value}`")]
	Invalid {
		name: &'static str,
		expected: &'static str,
		value: String,
	},
}

/// Settings read from the environment at start-up.
#[derive(Debug, Clone)]
pub struct Config {
	pub host: IpAddr,
	pub port: u16,
	/// Without a database, everything is kept in memory and lost on exit.
	pub database_url: Option<String>,
	pub cache_capacity: NonZeroUsize,
	pub cache_ttl: Duration,
	/// Milliseconds for a client to regain one request of its burst.
	pub rate_limit_replenish_ms: u64,
	pub rate_limit_burst: u32,
	/// Categories created at start-up if they do not exist yet.
	pub categories: Vec<String>,
	pub log_level: Level,
	/// Export traces and metrics over OTLP.
	pub telemetry: bool,
}

fn parse<T>(
	lookup: &impl Fn(&str) -> Option<String>,
	name: &'static str,
	expected: &'static str,
	default: T,
) -> Result<T, Error>
where
	T: FromStr,
{
	match lookup(name) {
		None => Ok(default),
		Some(value) => value.trim().parse().map_err(|_| Error::Invalid {
			name,
			expected,
			value,
		}),
	}
}

impl Config {
	/// Reads the configuration from the process environment, after loading a
	/// `.env` file if there is one.
	pub fn from_env() -> Result<Self, Error> {
		dotenvy::dotenv().ok();

		Self::from_lookup(|name| std::env::var(name).ok())
	}

	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
		let cache_capacity = parse(&lookup, "CACHE_CAPACITY", "a positive integer", 300_usize)?;

		Ok(Self {
			host: parse(&lookup, "HOST", "an IP address", IpAddr::from([127, 0, 0, 1]))?,
			port: parse(&lookup, "PORT", "a port number", 3000)?,
			database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
			cache_capacity: NonZeroUsize::new(cache_capacity).ok_or(Error::Invalid {
				name: "CACHE_CAPACITY",
				expected: "a positive integer",
				value: cache_capacity.to_string(),
			})?,
			cache_ttl: Duration::from_secs(parse(
				&lookup,
				"CACHE_TTL_SECS",
				"a number of seconds",
				300,
			)?),
			rate_limit_replenish_ms: parse(
				&lookup,
				"RATE_LIMIT_REPLENISH_MS",
				"a number of milliseconds",
				100,
			)?,
			rate_limit_burst: parse(&lookup, "RATE_LIMIT_BURST", "an integer", 50)?,
			categories: lookup("CATEGORIES")
				.map(|names| {
					names
						.split(',')
						.map(str::trim)
						.filter(|name| !name.is_empty())
						.map(str::to_owned)
						.collect()
				})
				.unwrap_or_default(),
			log_level: parse(&lookup, "LOG_LEVEL", "a log level", Level::INFO)?,
			telemetry: lookup("OTEL_ENABLED")
				.is_some_and(|value| matches!(value.trim(), "1" | "true")),
		})
	}
}

#[cfg(test)]
mod test {
	use std::collections::HashMap;

	use super::*;

	fn config(vars: &[(&str, &str)]) -> Result<Config, Error> {
		let vars = vars
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect::<HashMap<_, _>>();

		Config::from_lookup(|name| vars.get(name).cloned())
	}

	#[test]
	fn test_defaults() {
		let config = config(&[]).unwrap();

		assert_eq!(config.port, 3000);
		assert_eq!(config.database_url, None);
		assert_eq!(config.cache_capacity.get(), 300);
		assert_eq!(config.cache_ttl, Duration::from_secs(300));
		assert_eq!(config.log_level, Level::INFO);
		assert_eq!(config.rate_limit_replenish_ms, 100);
		assert!(config.categories.is_empty());
		assert!(!config.telemetry);
	}

	#[test]
	fn test_categories_list() {
		let config = config(&[("CATEGORIES", "World, Sport,,Culture ")]).unwrap();

		assert_eq!(config.categories, ["World", "Sport", "Culture"]);
	}

	#[test]
	fn test_overrides() {
		let config = config(&[
			("PORT", "8080"),
			("DATABASE_URL", "postgres://localhost/news"),
			("LOG_LEVEL", "debug"),
			("OTEL_ENABLED", "true"),
		])
		.unwrap();

		assert_eq!(config.port, 8080);
		assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/news"));
		assert_eq!(config.log_level, Level::DEBUG);
		assert!(config.telemetry);
	}

	#[test]
	fn test_invalid_values() {
		assert!(matches!(
			config(&[("PORT", "eighty")]),
			Err(Error::Invalid { name: "PORT", .. })
		));
		assert!(matches!(
			config(&[("CACHE_CAPACITY", "0")]),
			Err(Error::Invalid { name: "CACHE_CAPACITY", .. })
		));
	}
}
