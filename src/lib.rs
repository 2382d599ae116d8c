//! CAM Autogen: incremental source generation for CAM builds
//!
//! Decides, for the registry, CCPP physics-suite, and init-routine stages, whether
//! previously generated source is stale, calls the external generators when it is,
//! and records fingerprints so repeated builds skip unchanged stages.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod generators;
pub mod logging;
pub mod pipeline;
pub mod schemes;
pub mod search;
pub mod types;
