use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure while loading the corpus or the vocabulary.
///
/// Fatal to `PredictionEngine::initialize`: no partial engine is produced.
#[derive(Debug, Error)]
pub enum LoadError {
	/// The source does not exist or cannot be opened.
	#[error("source unavailable: {path}")]
	SourceUnavailable {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	/// The source was opened but reading it failed.
	#[error("failed to read {what}")]
	IoFailure {
		what: String,
		#[source]
		source: io::Error,
	},

	/// The content is not valid UTF-8, or a structured format is malformed.
	#[error("failed to decode {what}: {reason}")]
	DecodeFailure { what: String, reason: String },

	/// The engine configuration was rejected before anything was loaded.
	#[error(transparent)]
	Config(#[from] ConfigError),
}

/// Malformed input token.
///
/// Never caused by a valid single word, never caused by engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueryFault {
	#[error("input contains more than one word")]
	MultipleWords,

	#[error("input has no alphabetic content")]
	EmptyAfterNormalization,
}

/// Error returned by a prediction call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PredictError {
	/// Only surfaced when the engine runs in strict mode.
	#[error(transparent)]
	Fault(#[from] QueryFault),

	/// The engine was shut down.
	#[error("prediction engine is closed")]
	Closed,
}

/// Invalid `EngineConfig` value.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read config {path}")]
	Read {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("failed to parse config {path}")]
	Parse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("invalid config: {0}")]
	Invalid(String),
}
