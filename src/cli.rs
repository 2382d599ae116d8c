//! CLI domain: parse, route, and output only.
//! The pipeline itself lives in `crate::pipeline`.

mod output;
mod parse;
mod route;

pub use output::{format_cache_json, format_cache_text, format_config, format_report, map_error};
pub use parse::{CacheCommands, Cli, Commands, ConfigCommands};
pub use route::RunContext;
