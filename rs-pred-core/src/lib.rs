//! Word prediction library.
//!
//! This crate provides the prediction core of a text-entry surface:
//! - Prefix completion over a fixed vocabulary (trie)
//! - Next-word suggestion learned from word adjacency in a corpus
//! - An engine that decides, from the caller's buffer, which one to ask
//!
//! Both structures are built once and are read-only afterwards, so one
//! engine can serve concurrent callers without locking.

/// Engine configuration (strictness, top-K size, corpus format, ...).
pub mod config;

/// Typed load, query and configuration errors.
pub mod error;

/// Content sources and path helpers.
pub mod io;

/// Trie, word graph, successor cache and the prediction engine.
pub mod model;

pub use config::{CorpusFormat, EngineConfig, Strictness};
pub use error::{ConfigError, LoadError, PredictError, QueryFault};
pub use io::ContentSource;
pub use model::engine::{EngineStats, PredictionEngine, Route};
