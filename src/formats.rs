//! Pluggable decoders turning raw source bytes into a configuration table.
//!
//! The store is format-agnostic: anything implementing [`Decoder`] (including a
//! plain closure) can feed it. JSON is always available, YAML and TOML sit behind
//! the `yaml` and `toml` features.

use crate::core::{Table, Value};
use crate::error::{ConfigError, Result};
use std::path::Path;
use std::sync::Arc;

/// Decodes raw configuration bytes into a nested table.
///
/// # Examples
///
/// ```rust
/// use hotswap_store::formats::Decoder;
/// use hotswap_store::core::Table;
///
/// // Any closure with the right shape is a decoder.
/// let empty = |_: &[u8]| -> hotswap_store::error::Result<Table> { Ok(Table::new()) };
/// assert!(empty.decode(b"ignored").unwrap().is_empty());
/// ```
pub trait Decoder: Send + Sync {
    /// Decode `bytes` into a table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DecodeError`] if the bytes are malformed or the
    /// document root is not a table.
    fn decode(&self, bytes: &[u8]) -> Result<Table>;
}

impl<F> Decoder for F
where
    F: Fn(&[u8]) -> Result<Table> + Send + Sync,
{
    fn decode(&self, bytes: &[u8]) -> Result<Table> {
        self(bytes)
    }
}

/// JSON decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl Decoder for Json {
    fn decode(&self, bytes: &[u8]) -> Result<Table> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Table::new());
        }
        let value: Value = serde_json::from_slice(bytes).map_err(ConfigError::decode)?;
        into_table(value)
    }
}

/// YAML decoder.
#[cfg(feature = "yaml")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Yaml;

#[cfg(feature = "yaml")]
impl Decoder for Yaml {
    fn decode(&self, bytes: &[u8]) -> Result<Table> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Table::new());
        }
        let value: Value = serde_yaml::from_slice(bytes).map_err(ConfigError::decode)?;
        into_table(value)
    }
}

/// TOML decoder.
#[cfg(feature = "toml")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Toml;

#[cfg(feature = "toml")]
impl Decoder for Toml {
    fn decode(&self, bytes: &[u8]) -> Result<Table> {
        let text = std::str::from_utf8(bytes).map_err(ConfigError::decode)?;
        let value: Value = toml::from_str(text).map_err(ConfigError::decode)?;
        into_table(value)
    }
}

/// Pick a decoder from a file extension.
///
/// - `.yaml`, `.yml` -> YAML (feature `yaml`)
/// - `.toml` -> TOML (feature `toml`)
/// - `.json` -> JSON
///
/// # Errors
///
/// Returns an error when the extension is missing or no decoder is compiled in for it.
pub fn for_path(path: impl AsRef<Path>) -> Result<Arc<dyn Decoder>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| {
            ConfigError::Other(format!(
                "Unable to determine file format for: {}",
                path.display()
            ))
        })?;

    match extension {
        "json" => Ok(Arc::new(Json)),
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => Ok(Arc::new(Yaml)),
        #[cfg(feature = "toml")]
        "toml" => Ok(Arc::new(Toml)),
        other => Err(ConfigError::Other(format!(
            "Unsupported file extension: {}",
            other
        ))),
    }
}

fn into_table(value: Value) -> Result<Table> {
    match value {
        Value::Object(table) => Ok(table),
        Value::Null => Ok(Table::new()),
        other => Err(ConfigError::DecodeError(format!(
            "expected a table at the document root, found {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a table",
    }
}
