use std::error::Error;
use std::path::Path;
use std::sync::RwLock;

use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware, put, web};
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use chatter_core::ChatterResult;
use chatter_core::io::{corpus_name, list_corpora, normalize_folder, open_corpus};
use chatter_core::model::frequency_table::{FrequencyTable, context_window};
use chatter_core::model::generator::SentenceGenerator;
use chatter_core::model::tokenizer::normalize;
use chatter_core::model::trainer::{Corpus, TrainedModel, Trainer, TrainingSummary};

mod config;

use config::{CONFIG_ENV, CONFIG_FILE, ServerConfig, load_config};

/// Query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	count: Option<usize>,
	max_tokens: Option<usize>,
	seed: Option<u64>,
}

#[derive(Deserialize)]
struct CorpusQuery {
	names: Option<String>,
	order: Option<usize>,
}

#[derive(Deserialize)]
struct ContextQuery {
	context: Option<String>,
}

#[derive(Serialize)]
struct Stats<'a> {
	order: usize,
	contexts: usize,
	observations: usize,
	training: &'a TrainingSummary,
}

struct SharedData {
	model: TrainedModel,
	config: ServerConfig,
}

/// A model trained on nothing; every generation fails with a missing context.
fn empty_model(order: usize) -> ChatterResult<TrainedModel> {
	Ok(TrainedModel {
		table: FrequencyTable::new(order)?,
		summary: TrainingSummary::default(),
	})
}

type TrainingError = Box<dyn Error + Send + Sync>;

/// Names of the `.txt` corpora found in `data_dir`.
///
/// Only the last `.txt` is removed, so `notes.txt.txt` is listed as `notes.txt`.
fn available_corpora(data_dir: &Path) -> std::io::Result<Vec<String>> {
	Ok(list_corpora(data_dir, "txt")?
		.into_iter()
		.map(|file| match file.strip_suffix(".txt") {
			Some(name) => name.to_owned(),
			None => file,
		})
		.collect())
}

/// Trains a model on the named corpora of `data_dir`.
fn train_corpora(data_dir: &Path, names: &[String], order: usize) -> Result<TrainedModel, TrainingError> {
	let mut corpora = Vec::with_capacity(names.len());
	for name in names {
		let path = data_dir.join(format!("{name}.txt"));
		corpora.push(Corpus::new(corpus_name(&path)?, open_corpus(&path)?));
	}
	Ok(Trainer::new(order)?.train_corpora_parallel(corpora)?)
}

/// Trains on every corpus of the configured data directory.
///
/// A missing directory or unreadable corpus leaves the server running with
/// an empty model, so corpora can still be loaded later.
fn initial_model(config: &ServerConfig) -> ChatterResult<TrainedModel> {
	let data_dir = normalize_folder(&config.data_dir);
	let trained = available_corpora(&data_dir)
		.map_err(TrainingError::from)
		.and_then(|names| train_corpora(&data_dir, &names, config.order));

	match trained {
		Ok(model) => {
			info!(
				"Trained on {} corpora ({} tokens)",
				model.summary.corpora.len(),
				model.summary.total_tokens
			);
			Ok(model)
		}
		Err(e) => {
			warn!("Failed to train on {}: {e}", data_dir.display());
			empty_model(config.order)
		}
	}
}

/// Corpus names must stay inside the data directory.
fn is_valid_corpus_name(name: &str) -> bool {
	!name.contains(['/', '\\']) && name != "." && name != ".."
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates `count` sentences, one per line.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<RwLock<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let shared_data = match data.read() {
		Ok(d) => d,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let max_count = shared_data.config.max_count;
	let count = query.count.unwrap_or(1);
	if count == 0 || count > max_count {
		return HttpResponse::BadRequest().body(format!("count must be between 1 and {max_count}"));
	}

	let max_tokens = query.max_tokens.unwrap_or(shared_data.config.max_tokens);
	if max_tokens == 0 {
		return HttpResponse::BadRequest().body("max_tokens must be at least 1");
	}

	let mut rng = match query.seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_os_rng(),
	};

	let generator = SentenceGenerator::new(&shared_data.model.table).with_max_tokens(max_tokens);
	match generator.generate_many(count, &mut rng) {
		Ok(sentences) => HttpResponse::Ok().body(sentences.join("\n")),
		Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
	}
}

/// HTTP GET endpoint `/v1/corpora`
///
/// Lists the corpora available in the data directory.
#[get("/v1/corpora")]
async fn get_corpora(data: web::Data<RwLock<SharedData>>) -> impl Responder {
	let data_dir = match data.read() {
		Ok(d) => normalize_folder(&d.config.data_dir),
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	match available_corpora(&data_dir) {
		Ok(names) => HttpResponse::Ok().body(names.join("\n")),
		Err(_) => HttpResponse::InternalServerError().body("Failed to list corpora"),
	}
}

#[get("/v1/loaded_corpora")]
async fn get_loaded_corpora(data: web::Data<RwLock<SharedData>>) -> impl Responder {
	let shared_data = match data.read() {
		Ok(d) => d,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	HttpResponse::Ok().body(shared_data.model.summary.corpus_names().join("\n"))
}

#[get("/v1/stats")]
async fn get_stats(data: web::Data<RwLock<SharedData>>) -> impl Responder {
	let shared_data = match data.read() {
		Ok(d) => d,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let table = &shared_data.model.table;
	HttpResponse::Ok().json(Stats {
		order: table.order(),
		contexts: table.len(),
		observations: table.total_observations(),
		training: &shared_data.model.summary,
	})
}

/// HTTP GET endpoint `/v1/distribution`
///
/// Returns the token counts observed after a context, as JSON. The context
/// is normalized like training text and cut to the model's window.
#[get("/v1/distribution")]
async fn get_distribution(data: web::Data<RwLock<SharedData>>, query: web::Query<ContextQuery>) -> impl Responder {
	let shared_data = match data.read() {
		Ok(d) => d,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let table = &shared_data.model.table;
	let context = normalize(query.context.as_deref().unwrap_or(""));
	match table.distribution_for(context_window(&context, table.order())) {
		Ok(distribution) => HttpResponse::Ok().json(distribution),
		Err(e) => HttpResponse::NotFound().body(e.to_string()),
	}
}

/// HTTP PUT endpoint `/v1/load_corpora`
///
/// Retrains the model from a comma-separated list of corpora. The current
/// model keeps serving requests until the new one is ready.
#[put("/v1/load_corpora")]
async fn put_corpora(data: web::Data<RwLock<SharedData>>, query: web::Query<CorpusQuery>) -> impl Responder {
	let query_names = match &query.names {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty corpus name"),
	};

	let names: Vec<String> = query_names
		.split(',')
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(str::to_owned)
		.collect();
	if let Some(name) = names.iter().find(|name| !is_valid_corpus_name(name)) {
		return HttpResponse::BadRequest().body(format!("Invalid corpus name: {name}"));
	}

	let (data_dir, order) = match data.read() {
		Ok(d) => (normalize_folder(&d.config.data_dir), query.order.unwrap_or(d.config.order)),
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	if order == 0 {
		return HttpResponse::BadRequest().body("order must be at least 1");
	}

	// Training runs on the blocking pool so the worker keeps serving requests.
	let training_names = names.clone();
	let model = match web::block(move || train_corpora(&data_dir, &training_names, order)).await {
		Ok(Ok(m)) => m,
		Ok(Err(e)) => return HttpResponse::InternalServerError().body(format!("Failed to load corpora: {e}")),
		Err(_) => return HttpResponse::InternalServerError().body("Training task failed"),
	};

	let mut shared_data = match data.write() {
		Ok(d) => d,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	shared_data.model = model;
	info!("Loaded corpora {} (n = {order})", names.join(", "));

	HttpResponse::Ok().body("Corpora loaded successfully")
}

fn routes(cfg: &mut web::ServiceConfig) {
	cfg.service(get_generated)
		.service(get_corpora)
		.service(get_loaded_corpora)
		.service(get_stats)
		.service(get_distribution)
		.service(put_corpora);
}

/// Main entry point for the server.
///
/// Loads the configuration, trains on the corpora of the data directory,
/// and serves generation requests. Generations only take the read lock, so
/// they run concurrently.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| CONFIG_FILE.to_owned());
	let config = load_config(&config_path);
	let model = initial_model(&config).map_err(std::io::Error::other)?;

	let address = (config.bind_address.clone(), config.port);
	let shared_data = web::Data::new(RwLock::new(SharedData { model, config }));

	HttpServer::new(move || {
		App::new()
			.wrap(middleware::Logger::default())
			.app_data(shared_data.clone())
			.configure(routes)
	})
	.bind(address)?
	.run()
	.await
}
