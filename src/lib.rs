//! mediscan - medical image analysis using a multimodal LLM (Grok xAI)
//!
//! An uploaded image is base64-encoded into a chat completion request and
//! the returned markdown is rendered in the terminal. A second request can
//! re-explain the findings in terms a five-year-old would follow. The
//! interactive front end lives in `src/bin/mediscan.rs`.

pub mod client;
pub mod config;
pub mod error;
pub mod prompts;
pub mod session;
pub mod upload;

pub use client::GrokClient;
pub use config::Config;
pub use error::{Error, Result};
pub use session::Session;
pub use upload::{ImageFormat, ImageUpload};
