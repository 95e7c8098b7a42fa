use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use chrono::Local;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("invalid base64 image data: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Standard alphabet, tolerant of non-zero trailing bits as browsers and
/// Ollama are.
const FRAME_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Decodes frame data, skipping ASCII whitespace such as MIME line breaks.
pub fn decode_frame(image_base64: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = image_base64
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    FRAME_ENGINE.decode(compact)
}

/// Creates `path` (and parents) if it does not exist yet.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(path)?;
    info!("Created directory: {}", path.display());
    Ok(())
}

/// `frame_<YYYYMMDD_HHMMSS_mmm>.jpg` for the current local time.
pub fn frame_filename() -> String {
    format!("frame_{}.jpg", Local::now().format("%Y%m%d_%H%M%S_%3f"))
}

/// Writes captured frames into the images directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Decodes `image_base64` and writes it to a fresh timestamped file,
    /// returning the file name on success.
    pub async fn save(&self, image_base64: &str) -> Result<String, PersistError> {
        let bytes = decode_frame(image_base64)?;

        let filename = frame_filename();
        let path = self.dir.join(&filename);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| PersistError::Write {
                path: path.clone(),
                source,
            })?;

        info!("Saved image to {}", path.display());
        Ok(filename)
    }
}
