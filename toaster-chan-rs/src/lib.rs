//! toaster-chan: voice-controlled toaster switch with a talking persona.
//!
//! A recorded command is transcribed, classified as on/off/unknown together
//! with an in-character reply, forwarded to a network relay and spoken back.
//!
//! - `transcriber`: speech-to-text adapter
//! - `intent`: reply + command generation
//! - `appliance`: relay control
//! - `synthesis`: text-to-speech and voice shaping
//! - `pipeline`: per-request orchestration
//! - `api`: axum HTTP surface
//! - `dataset`: fine-tuning rows for the persona

pub mod api;
pub mod appliance;
pub mod config;
pub mod dataset;
pub mod error;
pub mod intent;
pub mod persona;
pub mod pipeline;
pub mod synthesis;
pub mod transcriber;
pub mod upload;

pub use error::{Error, Result};
