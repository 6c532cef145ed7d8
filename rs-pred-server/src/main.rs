use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use actix_cors::Cors;
use actix_web::{get, middleware, web, App, HttpResponse, HttpServer, Responder};
use log::{error, info};
use serde::Deserialize;

use rs_pred_core::{ConfigError, ContentSource, EngineConfig, PredictError, PredictionEngine};

/// Server settings, read from the TOML file named by `RS_PRED_CONFIG`
/// (`./rs-pred.toml` by default). A missing file means defaults.
#[derive(Deserialize, Debug)]
struct ServerConfig {
	#[serde(default = "default_host")]
	host: String,
	#[serde(default = "default_port")]
	port: u16,
	#[serde(default = "default_corpus")]
	corpus: PathBuf,
	#[serde(default = "default_vocabulary")]
	vocabulary: PathBuf,
	#[serde(default)]
	engine: EngineConfig,
}

fn default_host() -> String {
	"127.0.0.1".to_owned()
}

fn default_port() -> u16 {
	5000
}

fn default_corpus() -> PathBuf {
	PathBuf::from("./data/corpus.txt")
}

fn default_vocabulary() -> PathBuf {
	PathBuf::from("./data/vocab.txt")
}

impl ServerConfig {
	fn load() -> Result<Self, ConfigError> {
		let path = env::var("RS_PRED_CONFIG").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("./rs-pred.toml"));
		let raw = if path.exists() {
			fs::read_to_string(&path).map_err(|source| ConfigError::Read { path: path.clone(), source })?
		} else {
			String::new()
		};
		Self::parse(&raw, &path)
	}

	fn parse(raw: &str, origin: &Path) -> Result<Self, ConfigError> {
		let config: ServerConfig = toml::from_str(raw).map_err(|source| ConfigError::Parse {
			path: origin.to_path_buf(),
			source,
		})?;
		config.engine.validate()?;
		Ok(config)
	}
}

/// Query parameters of `/v1/predict`
#[derive(Deserialize)]
struct PredictParams {
	buffer: Option<String>,
}

/// Query parameters of `/v1/complete`
#[derive(Deserialize)]
struct CompleteParams {
	prefix: Option<String>,
	limit: Option<usize>,
}

/// Query parameters of `/v1/next`
#[derive(Deserialize)]
struct NextParams {
	word: Option<String>,
}

/// Maps an engine result to a response: suggestions as a JSON array, faults
/// as `400`, a closed engine as `503`.
fn suggestions(result: Result<Vec<String>, PredictError>) -> HttpResponse {
	match result {
		Ok(words) => HttpResponse::Ok().json(words),
		Err(PredictError::Fault(fault)) => HttpResponse::BadRequest().body(fault.to_string()),
		Err(PredictError::Closed) => HttpResponse::ServiceUnavailable().body("Prediction engine is closed"),
	}
}

/// HTTP GET endpoint `/v1/predict`
///
/// Takes the caller's whole input buffer and returns completions or
/// next-word suggestions depending on whether it ends mid-word.
#[get("/v1/predict")]
async fn get_predict(engine: web::Data<PredictionEngine>, query: web::Query<PredictParams>) -> impl Responder {
	// An absent buffer is the same as an empty text field.
	let buffer = query.buffer.as_deref().unwrap_or("");
	suggestions(engine.predict(buffer))
}

#[get("/v1/complete")]
async fn get_complete(engine: web::Data<PredictionEngine>, query: web::Query<CompleteParams>) -> impl Responder {
	let prefix = match &query.prefix {
		Some(s) => s,
		None => return HttpResponse::BadRequest().body("Missing prefix"),
	};

	match (engine.complete_token(prefix), query.limit) {
		(Ok(mut words), Some(limit)) => {
			words.truncate(limit);
			HttpResponse::Ok().json(words)
		}
		(result, _) => suggestions(result),
	}
}

#[get("/v1/next")]
async fn get_next(engine: web::Data<PredictionEngine>, query: web::Query<NextParams>) -> impl Responder {
	match &query.word {
		Some(word) => suggestions(engine.next_words(word)),
		None => HttpResponse::BadRequest().body("Missing word"),
	}
}

#[get("/v1/info")]
async fn get_info(engine: web::Data<PredictionEngine>) -> impl Responder {
	match engine.stats() {
		Ok(stats) => HttpResponse::Ok().json(stats),
		Err(e) => HttpResponse::ServiceUnavailable().body(e.to_string()),
	}
}

/// Main entry point for the server.
///
/// Loads the engine once, before binding, and shares it with every worker.
/// The engine is read-only, so no lock wraps it.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = ServerConfig::load().map_err(|e| {
		error!("Invalid configuration: {e}");
		std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
	})?;
	info!("Loading corpus {} and vocabulary {}", config.corpus.display(), config.vocabulary.display());

	let engine = PredictionEngine::initialize(
		ContentSource::file(&config.corpus),
		ContentSource::file(&config.vocabulary),
		config.engine.clone(),
	)
	.map_err(|e| {
		error!("Failed to load prediction engine: {e}");
		std::io::Error::other(e)
	})?;
	let shared_engine = web::Data::new(engine);

	info!("Listening on {}:{}", config.host, config.port);
	HttpServer::new(move || {
		App::new()
			.wrap(middleware::Logger::default())
			.wrap(Cors::default().allow_any_origin().allowed_methods(vec!["GET"]))
			.app_data(shared_engine.clone())
			.service(get_predict)
			.service(get_complete)
			.service(get_next)
			.service(get_info)
	})
		.bind((config.host.as_str(), config.port))?
		.run()
		.await
}
