use std::collections::BTreeMap;

use super::text::normalized_words;

/// A node of the vocabulary trie.
///
/// Children are kept in a `BTreeMap` so that a depth-first walk visits
/// words in lexical order without an extra sort.
#[derive(Debug, Default, Clone)]
struct TrieNode {
	children: BTreeMap<char, TrieNode>,
	/// A vocabulary word ends on this node.
	is_word: bool,
}

/// Prefix tree over a fixed vocabulary.
///
/// # Invariants
/// - Every root-to-word path spells exactly one vocabulary word
/// - A word inserted twice is stored once
/// - Words are lowercase and alphabetic only
#[derive(Debug, Default, Clone)]
pub struct VocabularyTrie {
	root: TrieNode,
	word_count: usize,
}

impl VocabularyTrie {
	/// Creates an empty trie. Every completion on it is empty.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a trie from vocabulary text (one word per line or whitespace
	/// separated).
	///
	/// Entries are normalized the same way user input is; entries with no
	/// letters at all are skipped.
	pub fn from_text(text: &str) -> Self {
		let mut trie = Self::new();
		trie.build(normalized_words(text));
		trie
	}

	/// Inserts every word of `words`.
	pub fn build<I, S>(&mut self, words: I)
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		for word in words {
			self.insert(word.as_ref());
		}
	}

	/// Inserts a single word. Returns `false` if it was already present or
	/// is empty.
	pub fn insert(&mut self, word: &str) -> bool {
		if word.is_empty() {
			return false;
		}

		let mut node = &mut self.root;
		for c in word.chars() {
			node = node.children.entry(c).or_default();
		}
		if node.is_word {
			return false;
		}
		node.is_word = true;
		self.word_count += 1;
		true
	}

	/// Number of distinct words.
	pub fn len(&self) -> usize {
		self.word_count
	}

	pub fn is_empty(&self) -> bool {
		self.word_count == 0
	}

	/// Whether `word` is a full vocabulary word.
	pub fn contains(&self, word: &str) -> bool {
		self.find(word).is_some_and(|node| node.is_word)
	}

	/// Returns every vocabulary word starting with `prefix`, in lexical order.
	///
	/// - An empty prefix yields nothing (never the whole vocabulary)
	/// - An unknown prefix yields nothing
	/// - `prefix` itself is included when it is a word
	/// - `limit` truncates the ordered result
	pub fn complete(&self, prefix: &str, limit: Option<usize>) -> Vec<String> {
		if prefix.is_empty() || limit == Some(0) {
			return Vec::new();
		}
		let Some(start) = self.find(prefix) else {
			return Vec::new();
		};

		let limit = limit.unwrap_or(usize::MAX);
		let mut output = Vec::new();

		// Explicit stack walk; children are pushed in reverse so the
		// smallest character is popped first.
		let mut stack: Vec<(&TrieNode, String)> = vec![(start, prefix.to_owned())];
		while let Some((node, word)) = stack.pop() {
			if node.is_word {
				output.push(word.clone());
				if output.len() >= limit {
					break;
				}
			}
			for (c, child) in node.children.iter().rev() {
				let mut next = word.clone();
				next.push(*c);
				stack.push((child, next));
			}
		}

		output
	}

	/// Follows `path` from the root.
	fn find(&self, path: &str) -> Option<&TrieNode> {
		let mut node = &self.root;
		for c in path.chars() {
			node = node.children.get(&c)?;
		}
		Some(node)
	}
}
