//! CLI output: report formatting and error mapping.

use crate::cache::FingerprintRecord;
use crate::config::AutogenConfig;
use crate::error::AutogenError;
use crate::types::{PipelineReport, Stage};
use comfy_table::{presets::UTF8_FULL, Table};
use serde_json::json;
use std::collections::BTreeMap;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &AutogenError) -> String {
    if e.is_configuration() {
        format!("ERROR: {}", e)
    } else {
        e.to_string()
    }
}

/// One line per stage: name, staleness, output directory
pub fn format_report(report: &PipelineReport) -> String {
    let mut lines = vec![
        format!(
            "{:<11} {:<15} {}",
            Stage::Registry.as_str(),
            report.registry.staleness.as_str(),
            report.registry.output_dir.display()
        ),
        format!(
            "{:<11} {:<15} {}",
            Stage::Ccpp.as_str(),
            report.physics.staleness.as_str(),
            report
                .physics
                .output_dirs
                .iter()
                .map(|d| d.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
        format!(
            "{:<11} {:<15} {}",
            Stage::InitWrite.as_str(),
            report.init.staleness.as_str(),
            report.init.output_dir.display()
        ),
    ];
    lines.push(format!("{} of 3 stages regenerated", report.regenerated_count()));
    lines.join("\n")
}

/// Merged configuration as TOML
pub fn format_config(config: &AutogenConfig) -> Result<String, AutogenError> {
    toml::to_string_pretty(config)
        .map_err(|e| AutogenError::ConfigError(format!("Failed to serialize config: {}", e)))
}

/// Recorded fingerprints as a table
pub fn format_cache_text(records: &BTreeMap<Stage, FingerprintRecord>) -> String {
    if records.is_empty() {
        return "Build cache is empty".to_string();
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Stage", "Generated", "Input", "Fingerprint"]);
    for (stage, record) in records {
        let generated = record.generated_at.to_rfc3339();
        for file in &record.files {
            table.add_row(vec![
                stage.to_string(),
                generated.clone(),
                file.path.display().to_string(),
                file.hash
                    .as_deref()
                    .map(|h| h.chars().take(16).collect::<String>())
                    .unwrap_or_else(|| "(unreadable)".to_string()),
            ]);
        }
        for (key, value) in &record.params {
            table.add_row(vec![
                stage.to_string(),
                generated.clone(),
                key.clone(),
                value.clone(),
            ]);
        }
    }
    table.to_string()
}

/// Recorded fingerprints as JSON
pub fn format_cache_json(
    records: &BTreeMap<Stage, FingerprintRecord>,
) -> Result<String, AutogenError> {
    let stages: serde_json::Map<String, serde_json::Value> = records
        .iter()
        .map(|(stage, record)| {
            (
                stage.to_string(),
                json!({
                    "generated_at": record.generated_at.to_rfc3339(),
                    "files": record.files,
                    "params": record.params,
                    "registered_files": record.registered_files,
                }),
            )
        })
        .collect();
    serde_json::to_string_pretty(&serde_json::Value::Object(stages))
        .map_err(|e| AutogenError::ConfigError(format!("Failed to serialize build cache: {}", e)))
}
