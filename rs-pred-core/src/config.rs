use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// How a malformed input token is reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
	/// Faults degrade to an empty suggestion list.
	#[default]
	Lenient,
	/// Faults are returned as `PredictError::Fault`.
	Strict,
}

/// Layout of the corpus content handed to the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorpusFormat {
	/// Plain prose, counted into a word graph.
	#[default]
	Prose,
	/// A prebuilt successor table (`word n s1 .. sn` per line).
	SuccessorTable,
}

/// Engine settings, fixed at initialization.
///
/// Every field has a default, so an empty TOML table is a valid config.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
	#[serde(default)]
	pub strictness: Strictness,
	#[serde(default = "default_top_k")]
	pub top_k: usize,
	#[serde(default)]
	pub completion_limit: Option<usize>,
	#[serde(default)]
	pub corpus_format: CorpusFormat,
	#[serde(default)]
	pub binary_cache: bool,
	#[serde(default = "default_parallel_threshold")]
	pub parallel_threshold: usize,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			strictness: Strictness::default(),
			top_k: default_top_k(),
			completion_limit: None,
			corpus_format: CorpusFormat::default(),
			binary_cache: false,
			parallel_threshold: default_parallel_threshold(),
		}
	}
}

fn default_top_k() -> usize {
	3
}

fn default_parallel_threshold() -> usize {
	100_000
}

impl EngineConfig {
	/// Same defaults, strict fault reporting.
	pub fn strict() -> Self {
		Self { strictness: Strictness::Strict, ..Self::default() }
	}

	/// Parses a config from TOML text and validates it.
	pub fn from_toml_str(raw: &str, origin: &Path) -> Result<Self, ConfigError> {
		let config: EngineConfig = toml::from_str(raw).map_err(|source| ConfigError::Parse {
			path: origin.to_path_buf(),
			source,
		})?;
		config.validate()?;
		Ok(config)
	}

	/// Loads a config file, falling back to defaults when it does not exist.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		if !path.exists() {
			return Ok(Self::default());
		}
		let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&raw, path)
	}

	/// Rejects values the engine cannot work with.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.top_k == 0 {
			return Err(ConfigError::Invalid("top_k must be >= 1".to_owned()));
		}
		if self.completion_limit == Some(0) {
			return Err(ConfigError::Invalid("completion_limit must be >= 1 when set".to_owned()));
		}
		Ok(())
	}
}
