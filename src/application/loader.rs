//! Parsing of formula documents into [`Node`] trees.
//!
//! JSON is the native format. TOML documents are converted to the same JSON
//! value model first, so both formats share one node conversion.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::Node;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SourceFormat {
    #[default]
    Json,
    Toml,
}

impl SourceFormat {
    /// `.toml` files are TOML, everything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => SourceFormat::Toml,
            _ => SourceFormat::Json,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SourceFormat::Json => "JSON",
            SourceFormat::Toml => "TOML",
        }
    }
}

/// Parse `source` into a node tree; `origin` names the source in diagnostics.
pub fn parse_source(source: &str, format: SourceFormat, origin: &str) -> ApplicationResult<Node> {
    debug!("parse_source: origin={}, format={}", origin, format.label());
    let parse_err = |message: String| ApplicationError::Parse {
        format: format.label(),
        origin: origin.to_string(),
        message,
    };

    let value: Value = match format {
        SourceFormat::Json => serde_json::from_str(source).map_err(|e| parse_err(e.to_string()))?,
        SourceFormat::Toml => {
            let table: toml::Table =
                toml::from_str(source).map_err(|e| parse_err(e.message().to_string()))?;
            serde_json::to_value(table).map_err(|e| parse_err(e.to_string()))?
        }
    };

    if !value.is_object() {
        return Err(ApplicationError::InvalidSource(origin.to_string()));
    }
    Ok(Node::from_value(&value)?)
}
