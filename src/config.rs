//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/prog2math/prog2math.toml`
//! 3. Local config: `<dir>/.prog2math.toml`
//! 4. Environment variables: `PROG2MATH_*` prefix

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{EvalOptions, DEFAULT_MAX_DEPTH};

/// Math delimiters placed around the rendered formula.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Delimiters {
    #[default]
    None,
    /// `$...$`
    Inline,
    /// `\[...\]`
    Display,
}

impl Delimiters {
    pub fn wrap(self, latex: &str) -> String {
        match self {
            Delimiters::None => latex.to_string(),
            Delimiters::Inline => ["$", latex, "$"].concat(),
            Delimiters::Display => [r"\[", latex, r"\]"].concat(),
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "none" => Some(Delimiters::None),
            "inline" => Some(Delimiters::Inline),
            "display" => Some(Delimiters::Display),
            _ => None,
        }
    }
}

/// Evaluator settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Maximum nesting of operation nodes (0 disables the limit)
    pub max_depth: usize,
    /// Fail on identifier leaves that are neither bound nor external
    pub strict: bool,
    /// Require the root node to be `compose`
    pub require_labeled_root: bool,
    /// Formula parameters that count as bound in strict mode
    pub external_symbols: Vec<String>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            strict: false,
            require_labeled_root: false,
            external_symbols: vec![],
        }
    }
}

impl EvaluationConfig {
    pub fn to_options(&self) -> EvalOptions {
        EvalOptions {
            max_depth: (self.max_depth > 0).then_some(self.max_depth),
            strict: self.strict,
            external_symbols: self.external_symbols.iter().cloned().collect::<BTreeSet<_>>(),
            require_labeled_root: self.require_labeled_root,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    pub delimiters: Delimiters,
}

/// Raw evaluation config for intermediate parsing (fields are Option to detect "not specified").
///
/// Used during layered config merging to distinguish between:
/// - `None` → field not specified, inherit from base
/// - `Some([])` → explicit empty array
/// - `Some([...])` → explicit values to merge
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawEvaluationConfig {
    pub max_depth: Option<usize>,
    pub strict: Option<bool>,
    pub require_labeled_root: Option<bool>,
    pub external_symbols: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawOutputConfig {
    pub delimiters: Option<Delimiters>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub evaluation: RawEvaluationConfig,
    pub output: RawOutputConfig,
}

impl EvaluationConfig {
    /// Merge arrays with union semantics and negation support.
    ///
    /// - Items from overlay are added to base
    /// - Items prefixed with `!` remove the corresponding item from the result
    /// - Duplicates are de-duplicated
    ///
    /// # Examples
    /// ```ignore
    /// merge_array(&["n", "m"], &["x"])       // → ["m", "n", "x"]
    /// merge_array(&["n", "m"], &["!n", "x"]) // → ["m", "x"]
    /// ```
    pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
        let mut result: HashSet<String> = base.iter().cloned().collect();

        for item in overlay {
            if let Some(negated) = item.strip_prefix('!') {
                result.remove(negated);
            } else {
                result.insert(item.clone());
            }
        }

        result.into_iter().sorted().collect()
    }

    /// Merge overlay config onto self (base).
    ///
    /// - Scalars: overlay wins if Some, otherwise keep base
    /// - `external_symbols`: union merge with negation support
    pub fn merge(&self, overlay: &RawEvaluationConfig) -> Self {
        Self {
            max_depth: overlay.max_depth.unwrap_or(self.max_depth),
            strict: overlay.strict.unwrap_or(self.strict),
            require_labeled_root: overlay
                .require_labeled_root
                .unwrap_or(self.require_labeled_root),
            external_symbols: overlay
                .external_symbols
                .as_ref()
                .map(|o| Self::merge_array(&self.external_symbols, o))
                .unwrap_or_else(|| self.external_symbols.clone()),
        }
    }

    /// Apply global config onto defaults.
    ///
    /// Unlike `merge()`, a specified `external_symbols` array REPLACES the base.
    pub fn apply_global(&self, global: &RawEvaluationConfig) -> Self {
        Self {
            max_depth: global.max_depth.unwrap_or(self.max_depth),
            strict: global.strict.unwrap_or(self.strict),
            require_labeled_root: global
                .require_labeled_root
                .unwrap_or(self.require_labeled_root),
            external_symbols: global
                .external_symbols
                .clone()
                .unwrap_or_else(|| self.external_symbols.clone()),
        }
    }
}

/// Unified configuration for prog2math.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub evaluation: EvaluationConfig,
    pub output: OutputConfig,
}

/// Get the XDG config directory for prog2math.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "prog2math").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("prog2math.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".prog2math.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            evaluation: self.evaluation.merge(&overlay.evaluation),
            output: OutputConfig {
                delimiters: overlay.output.delimiters.unwrap_or(self.output.delimiters),
            },
        }
    }

    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            evaluation: self.evaluation.apply_global(&global.evaluation),
            output: OutputConfig {
                delimiters: global.output.delimiters.unwrap_or(self.output.delimiters),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.prog2math.toml`
    ///
    /// # Array Merge Semantics
    /// - Defaults → Global: REPLACE
    /// - Global → Local: UNION with negation support
    /// - Any → Env vars: REPLACE
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.apply_global(&raw);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        Self::apply_env_overrides(current)
    }

    /// Apply PROG2MATH_* environment variables as explicit overrides.
    ///
    /// Sections are separated by `__`, e.g. `PROG2MATH_EVALUATION__STRICT=true`.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("PROG2MATH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("evaluation.external_symbols"),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get::<usize>("evaluation.max_depth") {
            settings.evaluation.max_depth = val;
        }
        if let Ok(val) = config.get_bool("evaluation.strict") {
            settings.evaluation.strict = val;
        }
        if let Ok(val) = config.get_bool("evaluation.require_labeled_root") {
            settings.evaluation.require_labeled_root = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("evaluation.external_symbols") {
            settings.evaluation.external_symbols = val;
        }
        if let Ok(val) = config.get_string("output.delimiters") {
            settings.output.delimiters =
                Delimiters::parse(&val).ok_or_else(|| ApplicationError::Config {
                    message: format!("PROG2MATH_OUTPUT__DELIMITERS: unknown value `{val}`"),
                })?;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# prog2math configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/prog2math/prog2math.toml  (defines your baseline)
#   Local:  <dir>/.prog2math.toml               (project-specific additions)
#   Env:    PROG2MATH_* environment variables   (explicit overrides)
#
# Array Merge Semantics:
#   Global config REPLACES compiled defaults.
#   Local config UNIONS with global.
#   Use "!name" in local config to REMOVE an inherited item:
#     external_symbols = ["m", "!n"]  # adds m, removes n from global

[evaluation]
# Maximum nesting of operations (0 disables the limit)
# max_depth = 256

# Reject variables that no sum/product binds and that are not external
# strict = false

# Require the formula to start with `compose`
# require_labeled_root = false

# Formula parameters accepted as free variables in strict mode
# external_symbols = ["n"]

[output]
# Math delimiters around the formula: "none", "inline" ($...$) or "display" (\[...\])
# delimiters = "none"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
