//! Suite definition files (SDFs).

use crate::error::AutogenError;
use std::fs;
use std::path::Path;

/// One element of a suite definition tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteNode {
    pub tag: String,
    pub text: Option<String>,
    pub children: Vec<SuiteNode>,
}

impl SuiteNode {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn scheme(name: &str) -> Self {
        Self {
            tag: "scheme".to_string(),
            text: Some(name.to_string()),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: SuiteNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn is_scheme(&self) -> bool {
        self.tag.eq_ignore_ascii_case("scheme")
    }
}

/// Scheme names called by a suite, in first-appearance order, without duplicates.
///
/// `scheme` elements are leaves at any depth; every other element (group,
/// subcycle, ...) is descended into.
pub fn find_schemes_in_suite(suite: &SuiteNode) -> Vec<String> {
    let mut schemes = Vec::new();
    collect_schemes(suite, &mut schemes);
    schemes
}

fn collect_schemes(node: &SuiteNode, schemes: &mut Vec<String>) {
    for child in &node.children {
        if child.is_scheme() {
            let name = child.text.as_deref().map(str::trim).unwrap_or_default();
            if !name.is_empty() && !schemes.iter().any(|s| s == name) {
                schemes.push(name.to_string());
            }
        } else {
            collect_schemes(child, schemes);
        }
    }
}

/// Parses a suite definition file into a tree
pub trait SuiteReader {
    fn read_suite(&self, path: &Path) -> Result<SuiteNode, AutogenError>;
}

/// XML suite definition reader
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlSuiteReader;

impl SuiteReader for XmlSuiteReader {
    fn read_suite(&self, path: &Path) -> Result<SuiteNode, AutogenError> {
        let text = fs::read_to_string(path)?;
        let doc = roxmltree::Document::parse(&text).map_err(|e| AutogenError::InvalidSuite {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(convert(doc.root_element()))
    }
}

fn convert(node: roxmltree::Node<'_, '_>) -> SuiteNode {
    SuiteNode {
        tag: node.tag_name().name().to_string(),
        text: node.text().map(str::to_string),
        children: node
            .children()
            .filter(|c| c.is_element())
            .map(convert)
            .collect(),
    }
}
