use std::thread::{self, JoinHandle};

use log::{debug, info};
use serde::Serialize;

use super::successor_model::SuccessorModel;
use super::text::normalize_word;
use super::trie::VocabularyTrie;
use crate::config::{CorpusFormat, EngineConfig, Strictness};
use crate::error::{LoadError, PredictError, QueryFault};
use crate::io::ContentSource;

/// What the caller is doing, judged from the end of its input buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route<'a> {
	/// Nothing but whitespace: no suggestions.
	Idle,
	/// The buffer ends mid-word: complete this partial token.
	Complete(&'a str),
	/// The buffer ends with whitespace: suggest what follows this token.
	NextWord(&'a str),
}

impl<'a> Route<'a> {
	/// Classifies a full input buffer.
	///
	/// - Empty or whitespace-only → `Idle`
	/// - Trailing whitespace → `NextWord` with the last word before it
	/// - Otherwise → `Complete` with the last whitespace-delimited segment
	pub fn classify(buffer: &'a str) -> Self {
		let Some(last) = buffer.chars().next_back() else {
			return Route::Idle;
		};
		match buffer.split_whitespace().next_back() {
			None => Route::Idle,
			Some(token) if last.is_whitespace() => Route::NextWord(token),
			Some(token) => Route::Complete(token),
		}
	}
}

/// Turns a raw token into a normalized single word.
///
/// # Errors
/// - `MultipleWords` if the raw token has whitespace between two parts
/// - `EmptyAfterNormalization` if nothing alphabetic is left
pub fn validate_token(raw: &str) -> Result<String, QueryFault> {
	if raw.split_whitespace().nth(1).is_some() {
		return Err(QueryFault::MultipleWords);
	}
	let token = normalize_word(raw);
	if token.is_empty() {
		return Err(QueryFault::EmptyAfterNormalization);
	}
	Ok(token)
}

/// Size figures of a loaded engine.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct EngineStats {
	pub vocabulary_words: usize,
	/// Distinct words the successor model knows, as predecessor or successor.
	pub corpus_words: usize,
	pub predecessors: usize,
	pub top_k: usize,
	pub strict: bool,
}

/// The two read-only structures, released together on shutdown.
#[derive(Debug)]
struct Models {
	trie: VocabularyTrie,
	successors: SuccessorModel,
}

/// Word prediction engine.
///
/// Built once by `initialize`, immutable afterwards: `predict` takes
/// `&self` and can be called from any number of threads at the same time
/// (share it through an `Arc`).
///
/// # Lifecycle
/// - `initialize` either returns a fully loaded engine or a `LoadError`
/// - `shutdown` releases both structures; every later call returns
///   `PredictError::Closed`
/// - Dropping the engine releases everything as well
#[derive(Debug)]
pub struct PredictionEngine {
	models: Option<Models>,
	config: EngineConfig,
}

impl PredictionEngine {
	/// Loads the vocabulary and the corpus and builds both structures.
	///
	/// # Errors
	/// - `LoadError::Config` for an invalid `config`
	/// - `SourceUnavailable`, `IoFailure` or `DecodeFailure` when a source
	///   cannot be read, or the successor table is malformed
	pub fn initialize(
		corpus: ContentSource,
		vocabulary: ContentSource,
		config: EngineConfig,
	) -> Result<Self, LoadError> {
		config.validate()?;

		let vocabulary_text = vocabulary.read_text()?;
		let trie = VocabularyTrie::from_text(&vocabulary_text);
		debug!("Vocabulary {} loaded: {} words", vocabulary, trie.len());

		let corpus_text = corpus.read_text()?;
		let successors = match config.corpus_format {
			CorpusFormat::SuccessorTable => SuccessorModel::from_table(&corpus_text, config.top_k)?,
			CorpusFormat::Prose => match corpus.path() {
				Some(path) if config.binary_cache => {
					SuccessorModel::build_cached(path, &corpus_text, config.top_k, config.parallel_threshold)
				}
				_ => SuccessorModel::build(&corpus_text, config.top_k, config.parallel_threshold),
			},
		};

		info!(
			"Prediction engine ready: {} vocabulary words, {} predecessor words (top {}), {:?} mode",
			trie.len(),
			successors.len(),
			config.top_k,
			config.strictness
		);

		Ok(Self { models: Some(Models { trie, successors }), config })
	}

	/// Runs `initialize` on a dedicated thread.
	///
	/// The engine only exists once the handle is joined, so no prediction
	/// can reach a half-built engine.
	pub fn spawn_initialize(
		corpus: ContentSource,
		vocabulary: ContentSource,
		config: EngineConfig,
	) -> JoinHandle<Result<Self, LoadError>> {
		thread::spawn(move || Self::initialize(corpus, vocabulary, config))
	}

	/// Suggestions for the caller's full input buffer.
	///
	/// Mid-word buffers get completions from the vocabulary, buffers ending
	/// in whitespace get the most frequent followers of the last word.
	///
	/// # Errors
	/// - `Closed` after `shutdown`
	/// - `Fault` for a malformed token, in strict mode only
	pub fn predict(&self, buffer: &str) -> Result<Vec<String>, PredictError> {
		let models = self.models()?;
		let result = match Route::classify(buffer) {
			Route::Idle => Ok(Vec::new()),
			Route::Complete(raw) => validate_token(raw).map(|token| self.complete_with(models, &token)),
			Route::NextWord(raw) => validate_token(raw).map(|token| models.successors.query(&token)),
		};
		self.resolve(result)
	}

	/// Completions for a single caller-supplied token, without buffer
	/// classification.
	pub fn complete_token(&self, raw: &str) -> Result<Vec<String>, PredictError> {
		let models = self.models()?;
		let result = validate_token(raw).map(|token| self.complete_with(models, &token));
		self.resolve(result)
	}

	/// Next-word suggestions for a single caller-supplied token.
	pub fn next_words(&self, raw: &str) -> Result<Vec<String>, PredictError> {
		let models = self.models()?;
		let result = validate_token(raw).map(|token| models.successors.query(&token));
		self.resolve(result)
	}

	/// Releases the vocabulary trie and the successor model.
	///
	/// # Errors
	/// `Closed` if the engine was already shut down.
	pub fn shutdown(&mut self) -> Result<(), PredictError> {
		match self.models.take() {
			Some(_) => {
				info!("Prediction engine shut down");
				Ok(())
			}
			None => Err(PredictError::Closed),
		}
	}

	pub fn is_closed(&self) -> bool {
		self.models.is_none()
	}

	pub fn config(&self) -> &EngineConfig {
		&self.config
	}

	pub fn trie(&self) -> Result<&VocabularyTrie, PredictError> {
		Ok(&self.models()?.trie)
	}

	pub fn successor_model(&self) -> Result<&SuccessorModel, PredictError> {
		Ok(&self.models()?.successors)
	}

	pub fn stats(&self) -> Result<EngineStats, PredictError> {
		let models = self.models()?;
		Ok(EngineStats {
			vocabulary_words: models.trie.len(),
			corpus_words: models.successors.word_count(),
			predecessors: models.successors.len(),
			top_k: models.successors.k(),
			strict: self.config.strictness == Strictness::Strict,
		})
	}

	fn models(&self) -> Result<&Models, PredictError> {
		self.models.as_ref().ok_or(PredictError::Closed)
	}

	fn complete_with(&self, models: &Models, prefix: &str) -> Vec<String> {
		models.trie.complete(prefix, self.config.completion_limit)
	}

	/// Applies the configured strictness to a query fault.
	fn resolve(&self, result: Result<Vec<String>, QueryFault>) -> Result<Vec<String>, PredictError> {
		match (result, self.config.strictness) {
			(Ok(words), _) => Ok(words),
			(Err(fault), Strictness::Strict) => Err(PredictError::Fault(fault)),
			(Err(fault), Strictness::Lenient) => {
				debug!("Query fault ignored: {fault}");
				Ok(Vec::new())
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn engine(config: EngineConfig) -> PredictionEngine {
		PredictionEngine::initialize(
			ContentSource::Text("how are you today how are we".to_owned()),
			ContentSource::Text("hell hello help helped helps how".to_owned()),
			config,
		)
		.unwrap()
	}

	#[test]
	fn classifies_buffers() {
		assert_eq!(Route::classify(""), Route::Idle);
		assert_eq!(Route::classify("  \t\n"), Route::Idle);
		assert_eq!(Route::classify("hel"), Route::Complete("hel"));
		assert_eq!(Route::classify("say hel"), Route::Complete("hel"));
		assert_eq!(Route::classify("how "), Route::NextWord("how"));
		assert_eq!(Route::classify("so how  \n"), Route::NextWord("how"));
	}

	#[test]
	fn validates_tokens() {
		assert_eq!(validate_token("Hello!"), Ok("hello".to_owned()));
		assert_eq!(validate_token(" how "), Ok("how".to_owned()));
		assert_eq!(validate_token("hello world"), Err(QueryFault::MultipleWords));
		assert_eq!(validate_token("123"), Err(QueryFault::EmptyAfterNormalization));
		assert_eq!(validate_token(""), Err(QueryFault::EmptyAfterNormalization));
	}

	#[test]
	fn routes_to_trie_and_successors() {
		let engine = engine(EngineConfig::default());
		assert_eq!(engine.predict("i said hel").unwrap(), vec!["hell", "hello", "help", "helped", "helps"]);
		assert_eq!(engine.predict("How ").unwrap(), vec!["are"]);
		assert_eq!(engine.predict("").unwrap(), Vec::<String>::new());
	}

	#[test]
	fn lenient_mode_swallows_faults() {
		let engine = engine(EngineConfig::default());
		assert!(engine.predict("hello 42").unwrap().is_empty());
		assert!(engine.complete_token("hello world").unwrap().is_empty());
	}

	#[test]
	fn strict_mode_reports_faults() {
		let engine = engine(EngineConfig::strict());
		assert_eq!(engine.predict("hello 42"), Err(PredictError::Fault(QueryFault::EmptyAfterNormalization)));
		assert_eq!(engine.predict("?! "), Err(PredictError::Fault(QueryFault::EmptyAfterNormalization)));
		assert_eq!(engine.complete_token("hello world"), Err(PredictError::Fault(QueryFault::MultipleWords)));
		assert_eq!(engine.next_words("how are"), Err(PredictError::Fault(QueryFault::MultipleWords)));
		assert_eq!(engine.predict("   "), Ok(Vec::new()));
	}

	#[test]
	fn completion_limit_applies() {
		let config = EngineConfig { completion_limit: Some(2), ..EngineConfig::default() };
		let engine = engine(config);
		assert_eq!(engine.predict("hel").unwrap(), vec!["hell", "hello"]);
	}

	#[test]
	fn shutdown_closes_the_engine() {
		let mut engine = engine(EngineConfig::default());
		assert!(!engine.is_closed());
		engine.shutdown().unwrap();
		assert!(engine.is_closed());
		assert_eq!(engine.predict("hel"), Err(PredictError::Closed));
		assert_eq!(engine.next_words("how"), Err(PredictError::Closed));
		assert_eq!(engine.stats(), Err(PredictError::Closed));
		assert_eq!(engine.shutdown(), Err(PredictError::Closed));
	}

	#[test]
	fn invalid_config_fails_initialization() {
		let config = EngineConfig { top_k: 0, ..EngineConfig::default() };
		let result = PredictionEngine::initialize(
			ContentSource::Text(String::new()),
			ContentSource::Text(String::new()),
			config,
		);
		assert!(matches!(result, Err(LoadError::Config(_))));
	}

	#[test]
	fn stats_describe_the_models() {
		let stats = engine(EngineConfig::default()).stats().unwrap();
		assert_eq!(stats.vocabulary_words, 6);
		assert_eq!(stats.corpus_words, 5);
		assert_eq!(stats.predecessors, 4);
		assert_eq!(stats.top_k, 3);
		assert!(!stats.strict);
	}
}
