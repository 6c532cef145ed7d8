//! Randomized checks of the ordering and membership invariants.
//!
//! Inputs come from a seeded generator so failures are reproducible.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use rs_pred_core::model::successor_model::SuccessorModel;
use rs_pred_core::model::trie::VocabularyTrie;
use rs_pred_core::model::word_graph::WordGraph;

const LETTERS: &[char] = &['a', 'b', 'c', 'd', 'e'];

fn random_word(rng: &mut StdRng) -> String {
	let len = rng.random_range(1..=6);
	(0..len).map(|_| *LETTERS.choose(rng).unwrap()).collect()
}

fn random_corpus(rng: &mut StdRng, words: usize) -> String {
	let pool: Vec<String> = (0..30).map(|_| random_word(rng)).collect();
	let mut corpus = String::new();
	for _ in 0..words {
		corpus.push_str(pool.choose(rng).unwrap());
		corpus.push_str(if rng.random_bool(0.1) { ",\n" } else { " " });
	}
	corpus
}

#[test]
fn completions_are_prefixed_sorted_members() {
	let mut rng = StdRng::seed_from_u64(7);
	let words: Vec<String> = (0..500).map(|_| random_word(&mut rng)).collect();
	let vocabulary: HashSet<&str> = words.iter().map(String::as_str).collect();

	let mut trie = VocabularyTrie::new();
	trie.build(&words);
	assert_eq!(trie.len(), vocabulary.len());

	for _ in 0..200 {
		let prefix = random_word(&mut rng);
		let completions = trie.complete(&prefix, None);

		for word in &completions {
			assert!(word.starts_with(&prefix), "{word} does not start with {prefix}");
			assert!(vocabulary.contains(word.as_str()), "{word} is not in the vocabulary");
		}
		assert!(completions.windows(2).all(|pair| pair[0] < pair[1]), "unsorted for {prefix}");

		let expected = vocabulary.iter().filter(|w| w.starts_with(&prefix)).count();
		assert_eq!(completions.len(), expected, "missing completions for {prefix}");
	}

	assert!(trie.complete("", None).is_empty());
}

#[test]
fn top_k_lists_are_capped_and_non_increasing() {
	let mut rng = StdRng::seed_from_u64(11);
	let corpus = random_corpus(&mut rng, 5_000);
	let model = SuccessorModel::build(&corpus, 3, usize::MAX);
	let graph = model.graph();

	for state in graph.states() {
		let list = model.query(state.key());
		assert!(!list.is_empty() && list.len() <= 3);

		let counts: Vec<u32> = list.iter().map(|next| graph.edge_count(state.key(), next)).collect();
		assert!(counts.windows(2).all(|pair| pair[0] >= pair[1]), "{}: {counts:?}", state.key());

		// Nothing left out beats the last kept successor.
		let last = *counts.last().unwrap();
		for successor in state.successors() {
			if !list.contains(&successor.word) {
				assert!(successor.count <= last);
			}
		}
	}
}

#[test]
fn repeated_builds_are_identical() {
	let mut rng = StdRng::seed_from_u64(23);
	let corpus = random_corpus(&mut rng, 3_000);

	let first = SuccessorModel::build(&corpus, 3, usize::MAX);
	let second = SuccessorModel::build(&corpus, 3, usize::MAX);
	let parallel = SuccessorModel::build(&corpus, 3, 0);

	let mut first_table = Vec::new();
	let mut second_table = Vec::new();
	let mut parallel_table = Vec::new();
	first.write_table(&mut first_table).unwrap();
	second.write_table(&mut second_table).unwrap();
	parallel.write_table(&mut parallel_table).unwrap();

	assert_eq!(first_table, second_table);
	assert_eq!(first_table, parallel_table);
}

#[test]
fn sinks_query_empty() {
	let mut rng = StdRng::seed_from_u64(31);
	let corpus = random_corpus(&mut rng, 1_000);
	let graph = WordGraph::from_text(&corpus, usize::MAX);
	let model = SuccessorModel::from_graph(graph, 3);

	let last = corpus.split_whitespace().last().unwrap().trim_matches(',');
	if model.graph().state(last).is_none() {
		assert!(model.query(last).is_empty());
	}
	for _ in 0..100 {
		let word = random_word(&mut rng);
		if model.graph().state(&word).is_none() {
			assert!(model.query(&word).is_empty());
		}
	}
}
