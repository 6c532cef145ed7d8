use std::collections::{HashMap, HashSet};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::io::{self, Write};
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::text::normalize_word;
use super::word_graph::WordGraph;
use crate::error::LoadError;
use crate::io::build_output_path;

/// Default number of successors kept per word.
pub const DEFAULT_TOP_K: usize = 3;

/// Next-word model: the word graph plus a precomputed top-K cache.
///
/// # Responsibilities
/// - Learn adjacency counts from a corpus (`WordGraph`)
/// - Precompute, per word, its most frequent followers
/// - Answer `query` from the cache, without sorting at query time
/// - Read and write the successor table and binary snapshot formats
///
/// # Invariants
/// - Every cached list has at most `k` entries, ordered by descending
///   count, ties in first-observed order
/// - Only words with at least one follower have a cache entry
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SuccessorModel {
	graph: WordGraph,
	cache: HashMap<String, Vec<String>>,
	k: usize,
}

/// On-disk snapshot: the model plus a fingerprint of the corpus it was
/// built from.
#[derive(Serialize, Deserialize)]
struct Snapshot {
	fingerprint: u64,
	model: SuccessorModel,
}

impl Default for SuccessorModel {
	fn default() -> Self {
		Self { graph: WordGraph::new(), cache: HashMap::new(), k: DEFAULT_TOP_K }
	}
}

impl SuccessorModel {
	/// Builds the graph from corpus text and computes the top-`k` cache.
	pub fn build(text: &str, k: usize, parallel_threshold: usize) -> Self {
		Self::from_graph(WordGraph::from_text(text, parallel_threshold), k)
	}

	/// Wraps an existing graph and computes its top-`k` cache.
	pub fn from_graph(graph: WordGraph, k: usize) -> Self {
		let mut model = Self { graph, cache: HashMap::new(), k };
		model.compute_top_k(k);
		model
	}

	/// Rebuilds the cache keeping the `k` most frequent followers per word.
	///
	/// Deterministic: the same corpus always yields the same lists.
	pub fn compute_top_k(&mut self, k: usize) {
		self.k = k;
		self.cache = self
			.graph
			.states()
			.map(|state| (state.key().to_owned(), state.top_k(k)))
			.collect();
		debug!("Top-{} cache computed for {} words", k, self.cache.len());
	}

	/// Cached followers of `word`, most frequent first. Empty when `word`
	/// was never followed by anything.
	pub fn query(&self, word: &str) -> Vec<String> {
		self.cache.get(word).cloned().unwrap_or_default()
	}

	/// Underlying adjacency counts. Empty for a model read from a table.
	pub fn graph(&self) -> &WordGraph {
		&self.graph
	}

	/// Number of words with a cached follower list.
	pub fn len(&self) -> usize {
		self.cache.len()
	}

	pub fn is_empty(&self) -> bool {
		self.cache.is_empty()
	}

	pub fn k(&self) -> usize {
		self.k
	}

	/// Number of distinct words the model knows, predecessors and
	/// successors alike.
	///
	/// Counted from the graph when there is one, from the cached lists for a
	/// model read from a table.
	pub fn word_count(&self) -> usize {
		if !self.graph.is_empty() {
			return self.graph.node_count();
		}
		let mut words: HashSet<&str> = self.cache.keys().map(String::as_str).collect();
		for list in self.cache.values() {
			words.extend(list.iter().map(String::as_str));
		}
		words.len()
	}

	/// Builds from a corpus file, reusing the `<stem>.bin` snapshot next to it
	/// when it was produced from identical text.
	///
	/// Snapshot problems are logged and never fail the load: the model is
	/// simply rebuilt from `text`. A corpus that is itself named `<stem>.bin`
	/// gets no snapshot, it would be overwritten.
	pub fn build_cached(corpus_path: &Path, text: &str, k: usize, parallel_threshold: usize) -> Self {
		let fingerprint = fingerprint(text);
		let snapshot_path = match build_output_path(corpus_path, "bin") {
			Ok(path) if path == corpus_path => {
				warn!("Corpus {} would be its own snapshot, not caching", corpus_path.display());
				return Self::build(text, k, parallel_threshold);
			}
			Ok(path) => path,
			Err(e) => {
				warn!("No snapshot path for {}: {e}", corpus_path.display());
				return Self::build(text, k, parallel_threshold);
			}
		};

		if snapshot_path.exists() {
			match std::fs::read(&snapshot_path)
				.map_err(|e| e.to_string())
				.and_then(|bytes| postcard::from_bytes::<Snapshot>(&bytes).map_err(|e| e.to_string()))
			{
				Ok(snapshot) if snapshot.fingerprint == fingerprint => {
					info!("Successor model loaded from {}", snapshot_path.display());
					let mut model = snapshot.model;
					if model.k != k {
						model.compute_top_k(k);
					}
					return model;
				}
				Ok(_) => info!("Snapshot {} is stale, rebuilding", snapshot_path.display()),
				Err(e) => warn!("Unreadable snapshot {}: {e}", snapshot_path.display()),
			}
		}

		let model = Self::build(text, k, parallel_threshold);
		let snapshot = Snapshot { fingerprint, model };
		match postcard::to_stdvec(&snapshot) {
			Ok(bytes) => {
				if let Err(e) = std::fs::write(&snapshot_path, bytes) {
					warn!("Failed to write snapshot {}: {e}", snapshot_path.display());
				}
			}
			Err(e) => warn!("Failed to encode snapshot: {e}"),
		}
		snapshot.model
	}

	/// Reads a successor table: one line per word, `word n s1 .. sn`.
	///
	/// Lists longer than `k` are truncated. Blank lines are ignored.
	///
	/// # Errors
	/// `DecodeFailure` naming the line for a missing or non-numeric count,
	/// a count that does not match the number of successors, an entry with
	/// no letters, a word listed twice, or a successor listed twice on the
	/// same line.
	pub fn from_table(text: &str, k: usize) -> Result<Self, LoadError> {
		let mut cache = HashMap::new();

		for (number, line) in text.lines().enumerate() {
			let parts: Vec<&str> = line.split_whitespace().collect();
			if parts.is_empty() {
				continue;
			}
			let malformed = |reason: String| LoadError::DecodeFailure {
				what: format!("successor table line {}", number + 1),
				reason,
			};

			let word = normalize_word(parts[0]);
			if word.is_empty() {
				return Err(malformed(format!("'{}' is not a word", parts[0])));
			}
			let declared: usize = parts
				.get(1)
				.ok_or_else(|| malformed("missing successor count".to_owned()))?
				.parse()
				.map_err(|_| malformed(format!("'{}' is not a count", parts[1])))?;
			let successors = &parts[2..];
			if successors.len() != declared {
				return Err(malformed(format!(
					"declares {declared} successors, lists {}",
					successors.len()
				)));
			}

			let mut list = Vec::with_capacity(declared.min(k));
			for raw in successors.iter().take(k) {
				let successor = normalize_word(raw);
				if successor.is_empty() {
					return Err(malformed(format!("'{raw}' is not a word")));
				}
				if list.contains(&successor) {
					return Err(malformed(format!("successor '{successor}' listed twice")));
				}
				list.push(successor);
			}

			if cache.insert(word.clone(), list).is_some() {
				return Err(malformed(format!("'{word}' listed twice")));
			}
		}

		Ok(Self { graph: WordGraph::new(), cache, k })
	}

	/// Writes the cache as a successor table, sorted by word.
	pub fn write_table<W: Write>(&self, mut writer: W) -> io::Result<()> {
		let mut words: Vec<&String> = self.cache.keys().collect();
		words.sort();

		for word in words {
			let list = &self.cache[word];
			write!(writer, "{} {}", word, list.len())?;
			for successor in list {
				write!(writer, " {successor}")?;
			}
			writeln!(writer)?;
		}
		writer.flush()
	}
}

/// Hash of the corpus text stored in the snapshot.
///
/// `DefaultHasher` is not guaranteed stable across Rust releases: after a
/// toolchain upgrade the fingerprint may differ and the snapshot is rebuilt
/// once, which is safe.
fn fingerprint(text: &str) -> u64 {
	let mut hasher = DefaultHasher::new();
	text.hash(&mut hasher);
	hasher.finish()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn model(text: &str) -> SuccessorModel {
		SuccessorModel::build(text, DEFAULT_TOP_K, usize::MAX)
	}

	#[test]
	fn single_follower() {
		let model = model("how are you today how are we");
		assert_eq!(model.query("how"), vec!["are"]);
		assert_eq!(model.query("are"), vec!["you", "we"]);
	}

	#[test]
	fn ranks_by_count() {
		assert_eq!(model("a b a c a b").query("a"), vec!["b", "c"]);
	}

	#[test]
	fn keeps_at_most_k() {
		let model = model("x a x b x c x d x a x b x a");
		assert_eq!(model.query("x"), vec!["a", "b", "c"]);
	}

	#[test]
	fn unknown_and_sink_words_are_empty() {
		let model = model("how are you");
		assert!(model.query("you").is_empty());
		assert!(model.query("never").is_empty());
		assert!(model.query("").is_empty());
	}

	#[test]
	fn empty_corpus_answers_nothing() {
		let model = model("");
		assert!(model.is_empty());
		assert!(model.query("a").is_empty());
	}

	#[test]
	fn recompute_with_other_k() {
		let mut model = model("x a x b x c x d");
		model.compute_top_k(1);
		assert_eq!(model.query("x"), vec!["a"]);
		assert_eq!(model.k(), 1);
	}

	#[test]
	fn table_round_trips_through_text() {
		let model = model("a b a c a b c");
		let mut out = Vec::new();
		model.write_table(&mut out).unwrap();
		let text = String::from_utf8(out).unwrap();
		assert_eq!(text, "a 2 b c\nb 2 a c\nc 1 a\n");

		let read = SuccessorModel::from_table(&text, DEFAULT_TOP_K).unwrap();
		assert_eq!(read.query("a"), vec!["b", "c"]);
		assert_eq!(read.query("c"), vec!["a"]);
		assert!(read.graph().is_empty());
	}

	#[test]
	fn table_lists_are_truncated_to_k() {
		let read = SuccessorModel::from_table("why 4 not so do me\n\n", 2).unwrap();
		assert_eq!(read.query("why"), vec!["not", "so"]);
	}

	#[test]
	fn malformed_tables_are_rejected() {
		for bad in ["why", "why x a", "why 2 a", "42 1 a", "a 1 b\na 1 c", "a 2 b B"] {
			let err = SuccessorModel::from_table(bad, DEFAULT_TOP_K).unwrap_err();
			assert!(matches!(err, LoadError::DecodeFailure { .. }), "accepted {bad:?}");
		}
	}

	#[test]
	fn snapshot_is_written_and_reused() {
		let dir = tempfile::tempdir().unwrap();
		let corpus = dir.path().join("corpus.txt");
		let text = "a b a c a b";

		let built = SuccessorModel::build_cached(&corpus, text, DEFAULT_TOP_K, usize::MAX);
		let snapshot = dir.path().join("corpus.bin");
		assert!(snapshot.exists());

		let loaded = SuccessorModel::build_cached(&corpus, text, DEFAULT_TOP_K, usize::MAX);
		assert_eq!(built.query("a"), loaded.query("a"));
		assert_eq!(loaded.graph().edge_count("a", "b"), 2);
	}

	#[test]
	fn stale_snapshot_is_rebuilt() {
		let dir = tempfile::tempdir().unwrap();
		let corpus = dir.path().join("corpus.txt");

		SuccessorModel::build_cached(&corpus, "a b", DEFAULT_TOP_K, usize::MAX);
		let rebuilt = SuccessorModel::build_cached(&corpus, "a c", DEFAULT_TOP_K, usize::MAX);
		assert_eq!(rebuilt.query("a"), vec!["c"]);
	}

	#[test]
	fn corpus_named_like_its_snapshot_is_left_alone() {
		let dir = tempfile::tempdir().unwrap();
		let corpus = dir.path().join("corpus.bin");
		let text = "a b a c a b";
		std::fs::write(&corpus, text).unwrap();

		for _ in 0..2 {
			let model = SuccessorModel::build_cached(&corpus, text, DEFAULT_TOP_K, usize::MAX);
			assert_eq!(model.query("a"), vec!["b", "c"]);
		}
		assert_eq!(std::fs::read_to_string(&corpus).unwrap(), text);
	}

	#[test]
	fn word_count_covers_graph_and_table_models() {
		assert_eq!(model("a b a c").word_count(), 3);
		let read = SuccessorModel::from_table("how 2 are is\nare 1 you\n", DEFAULT_TOP_K).unwrap();
		assert_eq!(read.word_count(), 4);
	}

	#[test]
	fn garbage_snapshot_is_ignored() {
		let dir = tempfile::tempdir().unwrap();
		let corpus = dir.path().join("corpus.txt");
		std::fs::write(dir.path().join("corpus.bin"), b"\xff\xff\xff").unwrap();

		let model = SuccessorModel::build_cached(&corpus, "a b", DEFAULT_TOP_K, usize::MAX);
		assert_eq!(model.query("a"), vec!["b"]);
	}
}
