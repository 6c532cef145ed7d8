use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One outgoing edge of a word: how many times `word` directly followed
/// the owning predecessor.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Successor {
	pub word: String,
	pub count: u32,
}

/// The outgoing edges of a single predecessor word.
///
/// Conceptually a node of the word graph: edges are weighted by their
/// number of observations, and kept in the order they were first seen.
///
/// ## Invariants
/// - All successors belong to the same `key`
/// - Each successor appears once, with a strictly positive count
/// - `successors` is in first-observed order; `positions` indexes it
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WordState {
	/// The predecessor word.
	key: String,
	/// Outgoing edges in first-observed order.
	successors: Vec<Successor>,
	/// Word → index into `successors`.
	positions: HashMap<String, usize>,
}

impl WordState {
	/// Creates a state with no outgoing edges.
	pub fn new(key: &str) -> Self {
		Self {
			key: key.to_owned(),
			successors: Vec::new(),
			positions: HashMap::new(),
		}
	}

	pub fn key(&self) -> &str {
		&self.key
	}

	/// Records one occurrence of `next` following this word.
	pub fn add_transition(&mut self, next: &str) {
		self.add_occurrences(next, 1);
	}

	/// Adds `count` occurrences of `next`. A successor seen for the first
	/// time is appended, which is what keeps first-observed order.
	fn add_occurrences(&mut self, next: &str, count: u32) {
		match self.positions.get(next) {
			Some(&index) => self.successors[index].count += count,
			None => {
				self.positions.insert(next.to_owned(), self.successors.len());
				self.successors.push(Successor { word: next.to_owned(), count });
			}
		}
	}

	/// Outgoing edges in first-observed order.
	pub fn successors(&self) -> &[Successor] {
		&self.successors
	}

	/// Observed count for `next`, 0 if never seen.
	pub fn count(&self, next: &str) -> u32 {
		self.positions.get(next).map_or(0, |&i| self.successors[i].count)
	}

	/// The `k` most frequent successors.
	///
	/// Sorted by descending count; the sort is stable, so equal counts keep
	/// first-observed order.
	pub fn top_k(&self, k: usize) -> Vec<String> {
		let mut ranked: Vec<&Successor> = self.successors.iter().collect();
		ranked.sort_by(|a, b| b.count.cmp(&a.count));
		ranked.into_iter().take(k).map(|s| s.word.clone()).collect()
	}

	/// Merges another state for the same word into this one.
	///
	/// `other` must describe occurrences observed *after* the ones already
	/// recorded here: successors new to `self` are appended in `other`'s
	/// order.
	///
	/// # Errors
	/// Returns an error if the keys do not match.
	pub fn merge(&mut self, other: &Self) -> Result<(), String> {
		if self.key != other.key {
			return Err(format!("Key mismatch: {} vs {}", self.key, other.key));
		}

		for successor in &other.successors {
			self.add_occurrences(&successor.word, successor.count);
		}

		Ok(())
	}
}
