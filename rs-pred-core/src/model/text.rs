//! Word normalization shared by the vocabulary, the corpus and user input.

/// Lowercases a word and drops every character that is not a letter.
///
/// The result may be empty (digits or punctuation only).
pub fn normalize_word(raw: &str) -> String {
	// Lowercasing may expand a letter into a letter plus a combining mark,
	// so filtering has to come last.
	raw.chars()
		.flat_map(char::to_lowercase)
		.filter(|c| c.is_alphabetic())
		.collect()
}

/// Splits text on whitespace and normalizes each piece, skipping the ones
/// that end up empty.
pub fn normalized_words(text: &str) -> impl Iterator<Item = String> + '_ {
	text.split_whitespace()
		.map(normalize_word)
		.filter(|word| !word.is_empty())
}
