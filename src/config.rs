use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_OLLAMA_API_URL: &str = "http://localhost:11434/api/generate";
pub const DEFAULT_MODEL: &str = "gemma3:4b";
pub const DEFAULT_PORT: u16 = 5000;
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(90);

pub const IMAGES_DIR_NAME: &str = "saved_images";
pub const CAPTIONS_DIR_NAME: &str = "saved_captions";
pub const HISTORY_FILE_NAME: &str = "caption_history.txt";

/// Runtime settings, built once at startup and shared read-only with the handlers.
#[derive(Debug, Clone)]
pub struct Config {
    pub ollama_api_url: String,
    pub model: String,
    pub images_dir: PathBuf,
    pub captions_dir: PathBuf,
    pub static_dir: PathBuf,
    pub listen_addr: SocketAddr,
    pub upstream_timeout: Duration,
}

impl Config {
    /// Default settings with all saved data placed under `data_dir`.
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            ollama_api_url: DEFAULT_OLLAMA_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            images_dir: data_dir.join(IMAGES_DIR_NAME),
            captions_dir: data_dir.join(CAPTIONS_DIR_NAME),
            static_dir: install_dir().join("static"),
            listen_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            upstream_timeout: UPSTREAM_TIMEOUT,
        }
    }

    /// Defaults, overridden by `OLLAMA_API_URL`, `OLLAMA_MODEL`,
    /// `CAPTIONER_DATA_DIR`, `CAPTIONER_STATIC_DIR` and `PORT` when set.
    pub fn from_env() -> Result<Self> {
        let data_dir = env::var("CAPTIONER_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| install_dir());
        let mut config = Self::with_data_dir(data_dir);

        if let Ok(url) = env::var("OLLAMA_API_URL") {
            config.ollama_api_url = url;
        }
        if let Ok(model) = env::var("OLLAMA_MODEL") {
            config.model = model;
        }
        if let Ok(dir) = env::var("CAPTIONER_STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }
        if let Ok(port) = env::var("PORT") {
            let port = port
                .parse::<u16>()
                .with_context(|| format!("PORT must be a valid port number, got {port:?}"))?;
            config.listen_addr.set_port(port);
        }

        Ok(config)
    }

    pub fn history_file(&self) -> PathBuf {
        self.captions_dir.join(HISTORY_FILE_NAME)
    }
}

fn install_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}
