//! Webcam frame captioning relay.
//!
//! Accepts a base64 frame and a prompt on `POST /api/caption`, forwards both
//! to a local Ollama vision model, keeps a copy of the frame and a running
//! question/answer history on disk, and answers with the caption.

pub mod caption;
pub mod config;
pub mod error;
pub mod history;
pub mod inference;
pub mod routes;
pub mod storage;
pub mod validate;

pub use config::Config;
pub use error::ApiError;
pub use routes::{create_app, AppState};
