//! Prediction models and the engine that routes between them.
//!
//! - Vocabulary prefix tree for word completion (`VocabularyTrie`)
//! - Word-adjacency graph learned from a corpus (`WordGraph`, `WordState`)
//! - Top-K next-word cache on top of the graph (`SuccessorModel`)
//! - Input classification, validation and routing (`PredictionEngine`)

/// Engine entry point: buffer classification, token validation, routing,
/// strictness handling and lifecycle.
pub mod engine;

/// Top-K successor cache built from a `WordGraph`.
///
/// Also reads and writes the successor table and binary snapshot formats.
pub mod successor_model;

/// Normalization helpers shared by every component.
pub mod text;

/// Prefix tree over the vocabulary, with lexically ordered completion.
pub mod trie;

/// Directed word-adjacency graph with parallel corpus counting.
pub mod word_graph;

/// Outgoing edges of a single word in first-observed order.
pub mod word_state;
