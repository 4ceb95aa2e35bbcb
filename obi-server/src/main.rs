use std::path::Path;
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, post, put, web};
use anyhow::Context;
use log::{info, warn};
use serde::Deserialize;

use obi_core::config::ObiConfig;
use obi_core::estimate::Estimator;
use obi_core::io::{Encoding, FileSource, MemorySource};
use obi_core::model::Model;
use obi_core::model::table::scale_of;
use obi_core::text::{NGramExtractor, OperativeChars};

#[derive(Deserialize)]
struct LoadQuery {
	name: Option<String>,
	required_frequency: Option<u64>,
}

struct LoadedModel {
	name: String,
	required_frequency: u64,
	model: Model,
}

struct SharedData {
	config: ObiConfig,
	operative: OperativeChars,
	estimator: Estimator,
	loaded: Option<LoadedModel>,
}

/// Loads a named model through its binary cache.
fn open_model(
	config: &ObiConfig,
	name: &str,
	required_frequency: u64,
) -> obi_core::Result<LoadedModel> {
	let model = Model::open_cached(Model::named_path(name, &config.model_dir), required_frequency)?
		.with_scale(scale_of(name));
	info!("loaded model {name}: {} tokens, {} grades", model.len(), model.grades());
	Ok(LoadedModel { name: name.to_owned(), required_frequency, model })
}

/// HTTP GET endpoint `/v1/models`
///
/// Lists the named models available in the model directory, one per line.
#[get("/v1/models")]
async fn get_models(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let model_dir = match data.lock() {
		Ok(shared) => shared.config.model_dir.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	match Model::list_named(&model_dir) {
		Ok(names) => HttpResponse::Ok().body(names.join("\n")),
		Err(e) => HttpResponse::InternalServerError().body(format!("Failed to list models: {e}")),
	}
}

#[get("/v1/loaded_model")]
async fn get_loaded_model(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	match &shared.loaded {
		Some(loaded) => {
			HttpResponse::Ok().body(format!("{}\t{}", loaded.name, loaded.required_frequency))
		}
		None => HttpResponse::NotFound().body("No model loaded"),
	}
}

/// HTTP PUT endpoint `/v1/load_model?name=T13&required_frequency=1`
///
/// Replaces the loaded model. The required frequency defaults to the
/// configured one.
#[put("/v1/load_model")]
async fn put_model(
	data: web::Data<Mutex<SharedData>>,
	query: web::Query<LoadQuery>,
) -> impl Responder {
	let mut shared = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let name = match &query.name {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty model name"),
	};
	let required_frequency = query.required_frequency.unwrap_or(shared.config.required_frequency);

	match open_model(&shared.config, name, required_frequency) {
		Ok(loaded) => {
			shared.loaded = Some(loaded);
			HttpResponse::Ok().body("Model loaded successfully")
		}
		Err(e) => HttpResponse::InternalServerError().body(format!("Failed to load model: {e}")),
	}
}

/// HTTP POST endpoint `/v1/readability`
///
/// Scores the UTF-8 request body with the loaded model and returns the
/// estimate as JSON.
#[post("/v1/readability")]
async fn post_readability(data: web::Data<Mutex<SharedData>>, body: String) -> impl Responder {
	let shared = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let Some(loaded) = &shared.loaded else {
		return HttpResponse::ServiceUnavailable().body("No model loaded");
	};

	let extractor = NGramExtractor::new(shared.config.order, &shared.operative);
	let text = match extractor.count_source(&mut MemorySource::from(body.as_str())) {
		Ok(text) => text,
		Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
	};
	HttpResponse::Ok().json(shared.estimator.readability(&loaded.model, &text))
}

fn load_config() -> anyhow::Result<ObiConfig> {
	match std::env::var("OBI_CONFIG") {
		Ok(path) => ObiConfig::from_toml_file(&path)
			.with_context(|| format!("cannot load configuration {path}")),
		Err(_) if Path::new("obi.toml").exists() => Ok(ObiConfig::from_toml_file("obi.toml")?),
		Err(_) => Ok(ObiConfig::default()),
	}
}

/// Main entry point for the server.
///
/// Reads the configuration from `OBI_CONFIG` (or `./obi.toml`), loads the
/// operative characters and the default model, and serves on 127.0.0.1:5000.
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = load_config()?;
	let mut source = FileSource::new(&config.operative_chars, Encoding::Utf8);
	let operative = OperativeChars::load(&mut source).with_context(|| {
		format!("cannot load operative characters {}", config.operative_chars.display())
	})?;
	let estimator = Estimator::from_config(&config)?;

	let loaded = match open_model(&config, &config.model_name, config.required_frequency) {
		Ok(loaded) => Some(loaded),
		Err(e) => {
			warn!("default model {} not loaded: {e}", config.model_name);
			None
		}
	};

	let shared = SharedData { config, operative, estimator, loaded };
	let shared_data = web::Data::new(Mutex::new(shared));

	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_data.clone())
			.service(get_models)
			.service(get_loaded_model)
			.service(put_model)
			.service(post_readability)
	})
	.bind(("127.0.0.1", 5000))?
	.run()
	.await?;
	Ok(())
}
