//! MongoDB connection settings
//!
//! Settings come from a `[mongodb]` TOML table, from `CONDOR_MONGODB_*`
//! environment variables, or from the defaults.

use serde::{Deserialize, Serialize};

use crate::error::{OdmError, OdmResult};

/// Prefix of the environment variables read by [`MongoSettings::from_env`].
pub const ENV_PREFIX: &str = "CONDOR_MONGODB_";

/// MongoDB connection settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoSettings {
	/// Connection string
	pub url: String,

	/// Database name
	pub database: String,

	/// Maximum connection pool size
	pub max_pool_size: Option<u32>,

	/// Minimum connection pool size
	pub min_pool_size: Option<u32>,

	/// Maximum idle time of a pooled connection, in seconds
	pub max_idle_time_secs: Option<u64>,

	/// Limit applied to reads that do not set one
	pub default_limit: Option<i64>,
}

impl Default for MongoSettings {
	fn default() -> Self {
		Self {
			url: "mongodb://localhost:27017".to_string(),
			database: "test".to_string(),
			max_pool_size: None,
			min_pool_size: None,
			max_idle_time_secs: None,
			default_limit: None,
		}
	}
}

#[derive(Deserialize)]
struct SettingsFile {
	#[serde(default)]
	mongodb: MongoSettings,
}

impl MongoSettings {
	/// Parse the `[mongodb]` table of a TOML document.
	///
	/// A missing table or missing keys fall back to the defaults.
	///
	/// # Examples
	///
	/// ```
	/// use condor_odm::MongoSettings;
	///
	/// let settings = MongoSettings::from_toml_str(r#"
	/// [mongodb]
	/// url = "mongodb://db.internal:27017"
	/// database = "shop"
	/// max_pool_size = 50
	/// "#).unwrap();
	///
	/// assert_eq!(settings.database, "shop");
	/// assert_eq!(settings.max_pool_size, Some(50));
	/// assert_eq!(settings.min_pool_size, None);
	/// ```
	pub fn from_toml_str(source: &str) -> OdmResult<Self> {
		let file: SettingsFile = toml::from_str(source)?;
		file.mongodb.validate()?;
		Ok(file.mongodb)
	}

	/// Read settings from `CONDOR_MONGODB_*` environment variables.
	///
	/// Recognized suffixes: `URL`, `DATABASE`, `MAX_POOL_SIZE`,
	/// `MIN_POOL_SIZE`, `MAX_IDLE_TIME_SECS`, `DEFAULT_LIMIT`.
	pub fn from_env() -> OdmResult<Self> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Build settings from an arbitrary key lookup, using the same keys as
	/// [`MongoSettings::from_env`].
	pub fn from_lookup<F>(lookup: F) -> OdmResult<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |suffix: &str| lookup(&format!("{}{}", ENV_PREFIX, suffix));
		let mut settings = Self::default();

		if let Some(url) = get("URL") {
			settings.url = url;
		}
		if let Some(database) = get("DATABASE") {
			settings.database = database;
		}
		settings.max_pool_size = parse_number("MAX_POOL_SIZE", get("MAX_POOL_SIZE"))?;
		settings.min_pool_size = parse_number("MIN_POOL_SIZE", get("MIN_POOL_SIZE"))?;
		settings.max_idle_time_secs =
			parse_number("MAX_IDLE_TIME_SECS", get("MAX_IDLE_TIME_SECS"))?;
		settings.default_limit = parse_number("DEFAULT_LIMIT", get("DEFAULT_LIMIT"))?;

		settings.validate()?;
		Ok(settings)
	}

	/// Check that the settings are usable.
	pub fn validate(&self) -> OdmResult<()> {
		if self.url.trim().is_empty() {
			return Err(OdmError::Config("url must not be empty".to_string()));
		}
		if self.database.trim().is_empty() {
			return Err(OdmError::Config("database must not be empty".to_string()));
		}
		if let (Some(min), Some(max)) = (self.min_pool_size, self.max_pool_size)
			&& min > max
		{
			return Err(OdmError::Config(format!(
				"min_pool_size ({}) exceeds max_pool_size ({})",
				min, max
			)));
		}
		Ok(())
	}
}

fn parse_number<T: std::str::FromStr>(suffix: &str, raw: Option<String>) -> OdmResult<Option<T>> {
	match raw {
		None => Ok(None),
		Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
			OdmError::Config(format!(
				"{}{} is not a valid number: {}",
				ENV_PREFIX, suffix, raw
			))
		}),
	}
}
