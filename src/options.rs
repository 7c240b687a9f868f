//! Language options shared by the scanner and interpreter

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Default maximum CALL nesting depth
pub const DEFAULT_CALL_DEPTH_LIMIT: usize = 1024;

/// Options controlling scanning and execution
///
/// Missing fields in a configuration file fall back to their defaults:
///
/// ```
/// use pati::LanguageOptions;
///
/// let options = LanguageOptions::from_json_str(r#"{ "input_prompts": false }"#).unwrap();
/// assert!(!options.input_prompts);
/// assert!(options.comments_enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageOptions {
    /// Treat `REM` as the start of a comment
    pub comments_enabled: bool,
    /// Maximum depth of the call stack before the run aborts
    pub call_depth_limit: usize,
    /// Write `Enter value for variable X: ` before each INPUT read
    pub input_prompts: bool,
}

impl Default for LanguageOptions {
    fn default() -> Self {
        LanguageOptions {
            comments_enabled: true,
            call_depth_limit: DEFAULT_CALL_DEPTH_LIMIT,
            input_prompts: true,
        }
    }
}

impl LanguageOptions {
    /// Parses options from JSON text
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Loads options from a JSON file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read options file {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("invalid options file {}", path.display()))
    }
}
