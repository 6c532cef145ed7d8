use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::sync::mpsc;
use std::thread;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::text::normalized_words;
use super::word_state::WordState;

/// Directed word-adjacency graph learned from a corpus.
///
/// Nodes are distinct normalized corpus words; the edge `u → v` counts how
/// many times `v` immediately followed `u`.
///
/// # Responsibilities
/// - Count adjacent word pairs from raw text
/// - Split large corpora across threads and merge the partial graphs
/// - Dump the adjacency list in a plain text format
///
/// # Invariants
/// - Each entry of `states` is keyed by its own `WordState::key`
/// - Only words with at least one outgoing edge have a state
/// - Counts only grow while building and are never touched afterwards
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct WordGraph {
	states: HashMap<String, WordState>,
}

impl WordGraph {
	/// Creates an empty graph.
	pub fn new() -> Self {
		Self::default()
	}

	/// Counts every consecutive word pair of `text`.
	///
	/// Tokens are split on whitespace, lowercased and stripped of
	/// non-letters; tokens left empty are dropped before pairing, so
	/// `"a 42 b"` yields the pair `(a, b)`.
	///
	/// When the token count exceeds `parallel_threshold` the work is spread
	/// over several threads.
	pub fn from_text(text: &str, parallel_threshold: usize) -> Self {
		let tokens: Vec<String> = normalized_words(text).collect();
		debug!("Corpus tokenized into {} words", tokens.len());

		if tokens.len() > parallel_threshold {
			match Self::count_parallel(&tokens) {
				Ok(graph) => return graph,
				Err(e) => warn!("Parallel counting failed ({e}), counting sequentially"),
			}
		}

		let mut graph = Self::new();
		graph.add_sequence(&tokens);
		graph
	}

	/// Records one occurrence of `next` directly after `word`.
	pub fn add_pair(&mut self, word: &str, next: &str) {
		self.states
			.entry(word.to_owned())
			.or_insert_with(|| WordState::new(word))
			.add_transition(next);
	}

	/// Records every consecutive pair of `words`.
	pub fn add_sequence<S: AsRef<str>>(&mut self, words: &[S]) {
		for pair in words.windows(2) {
			self.add_pair(pair[0].as_ref(), pair[1].as_ref());
		}
	}

	/// Splits the tokens into chunks, counts each chunk on its own thread and
	/// merges the partial graphs.
	///
	/// Each chunk carries the first token of the next chunk so the pair
	/// crossing the boundary is counted exactly once. Partial graphs are
	/// merged in chunk order, which keeps first-observed order identical to
	/// a sequential count.
	fn count_parallel(tokens: &[String]) -> Result<Self, String> {
		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		let chunk_size = tokens.len().div_ceil(chunks).max(1);

		let (tx, rx) = mpsc::channel();
		let mut spawned = 0;
		for (index, start) in (0..tokens.len()).step_by(chunk_size).enumerate() {
			let end = (start + chunk_size + 1).min(tokens.len());
			let chunk: Vec<String> = tokens[start..end].to_vec();
			let tx = tx.clone();

			thread::spawn(move || {
				let mut partial = WordGraph::new();
				partial.add_sequence(&chunk);
				// The receiver only disappears if the caller already gave up.
				let _ = tx.send((index, partial));
			});
			spawned += 1;
		}
		drop(tx);

		let mut partials: Vec<(usize, WordGraph)> = rx.iter().collect();
		if partials.len() != spawned {
			return Err(format!("{} of {} workers returned", partials.len(), spawned));
		}
		partials.sort_by_key(|(index, _)| *index);
		debug!("Merging {} partial graphs", partials.len());

		let mut graph = WordGraph::new();
		for (_, partial) in &partials {
			graph.merge(partial)?;
		}
		Ok(graph)
	}

	/// Merges `other` into this graph, summing counts.
	///
	/// `other` is treated as text that came after this graph's text.
	///
	/// # Errors
	/// Returns an error if a state is stored under a foreign key.
	pub fn merge(&mut self, other: &Self) -> Result<(), String> {
		for (key, state) in &other.states {
			if let Some(existing) = self.states.get_mut(key) {
				existing.merge(state)?;
			} else {
				self.states.insert(key.clone(), state.clone());
			}
		}
		Ok(())
	}

	/// Outgoing edges of `word`, if it was ever followed by another word.
	pub fn state(&self, word: &str) -> Option<&WordState> {
		self.states.get(word)
	}

	/// All predecessor states, in no particular order.
	pub fn states(&self) -> impl Iterator<Item = &WordState> {
		self.states.values()
	}

	/// Weight of the edge `word → next`.
	pub fn edge_count(&self, word: &str, next: &str) -> u32 {
		self.states.get(word).map_or(0, |state| state.count(next))
	}

	/// Number of words with at least one outgoing edge.
	pub fn predecessor_count(&self) -> usize {
		self.states.len()
	}

	/// Number of distinct words in the graph, sinks included.
	pub fn node_count(&self) -> usize {
		let mut nodes: HashSet<&str> = self.states.keys().map(String::as_str).collect();
		for state in self.states.values() {
			nodes.extend(state.successors().iter().map(|s| s.word.as_str()));
		}
		nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Writes the adjacency list, one predecessor per line:
	/// `word succ1 count1 succ2 count2 ...`
	///
	/// Lines are sorted by predecessor; successors stay in first-observed
	/// order.
	pub fn write_adjacency<W: Write>(&self, mut writer: W) -> io::Result<()> {
		let mut keys: Vec<&String> = self.states.keys().collect();
		keys.sort();

		for key in keys {
			let state = &self.states[key];
			write!(writer, "{key}")?;
			for successor in state.successors() {
				write!(writer, " {} {}", successor.word, successor.count)?;
			}
			writeln!(writer)?;
		}
		writer.flush()
	}
}
