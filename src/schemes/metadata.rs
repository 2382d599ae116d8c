//! Scheme names declared in CCPP metadata files.

use crate::error::AutogenError;
use std::fs;
use std::path::Path;

const TABLE_PROPERTIES: &str = "[ccpp-table-properties]";

/// Lists the scheme names a metadata file declares
pub trait SchemeNameFinder {
    fn find_scheme_names(&self, metadata_path: &Path) -> Result<Vec<String>, AutogenError>;
}

/// Reads `[ccpp-table-properties]` sections whose `type` is `scheme`
#[derive(Debug, Clone, Copy, Default)]
pub struct CcppMetadataFinder;

impl SchemeNameFinder for CcppMetadataFinder {
    fn find_scheme_names(&self, metadata_path: &Path) -> Result<Vec<String>, AutogenError> {
        let contents =
            fs::read_to_string(metadata_path).map_err(|e| AutogenError::InvalidMetadata {
                path: metadata_path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Ok(parse_scheme_names(&contents))
    }
}

#[derive(Default)]
struct Table {
    name: Option<String>,
    kind: Option<String>,
}

fn close(table: Option<Table>, names: &mut Vec<String>) {
    if let Some(Table {
        name: Some(name),
        kind: Some(kind),
    }) = table
    {
        if kind.eq_ignore_ascii_case("scheme") && !names.contains(&name) {
            names.push(name);
        }
    }
}

/// Scheme names from metadata text, in declaration order, without duplicates
pub fn parse_scheme_names(contents: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut current: Option<Table> = None;

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') {
            close(current.take(), &mut names);
            if line.eq_ignore_ascii_case(TABLE_PROPERTIES) {
                current = Some(Table::default());
            }
            continue;
        }
        if let Some(table) = current.as_mut() {
            if let Some((key, value)) = line.split_once('=') {
                let value = value.trim().to_string();
                match key.trim().to_ascii_lowercase().as_str() {
                    "name" => table.name = Some(value),
                    "type" => table.kind = Some(value),
                    _ => {}
                }
            }
        }
    }
    close(current, &mut names);

    names
}
