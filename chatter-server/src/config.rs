//! Server configuration, loaded from JSON.

use std::fs;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

/// Default configuration file, relative to the working directory.
pub const CONFIG_FILE: &str = "chatter.json";

/// Environment variable overriding `CONFIG_FILE`.
pub const CONFIG_ENV: &str = "CHATTER_CONFIG";

/// chatter-server settings. Every field may be omitted from the file.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ServerConfig {
	#[serde(default = "default_bind_address")]
	pub bind_address: String,
	#[serde(default = "default_port")]
	pub port: u16,
	/// Directory holding the `.txt` corpora.
	#[serde(default = "default_data_dir")]
	pub data_dir: String,
	/// N-gram order used at startup and when none is requested.
	#[serde(default = "default_order")]
	pub order: usize,
	/// Token limit of a generated sentence.
	#[serde(default = "default_max_tokens")]
	pub max_tokens: usize,
	/// Maximum number of sentences per request.
	#[serde(default = "default_max_count")]
	pub max_count: usize,
}

fn default_bind_address() -> String {
	"127.0.0.1".to_owned()
}

fn default_port() -> u16 {
	5000
}

fn default_data_dir() -> String {
	"./data".to_owned()
}

fn default_order() -> usize {
	3
}

fn default_max_tokens() -> usize {
	1000
}

fn default_max_count() -> usize {
	100
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			bind_address: default_bind_address(),
			port: default_port(),
			data_dir: default_data_dir(),
			order: default_order(),
			max_tokens: default_max_tokens(),
			max_count: default_max_count(),
		}
	}
}

/// Loads the configuration (defaults if the file is missing or invalid).
pub fn load_config<P: AsRef<Path>>(path: P) -> ServerConfig {
	let path = path.as_ref();
	match fs::read_to_string(path) {
		Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
			warn!("Invalid config {}: {e}, using defaults", path.display());
			ServerConfig::default()
		}),
		Err(_) => ServerConfig::default(),
	}
}
