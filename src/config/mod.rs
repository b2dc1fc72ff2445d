//! Configuration module for the converters.
//!
//! Provides CLI argument parsing, device selection and the voice catalogue.

#[allow(clippy::module_inception)]
mod config;
mod device;
pub mod voices;

pub use config::{
    DEFAULT_OUTPUT, DEFAULT_SPEED, DEFAULT_VOICE, EngineArgs, EngineConfig, MODEL_NAME, OneShotArgs, PersistentArgs, SPEED_ENV, resolve_output,
    resolve_speed, usage_exit_code,
};
pub use device::{Provider, select_device};
