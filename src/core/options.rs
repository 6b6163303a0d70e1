//! Options controlling structured decoding with `unmarshal_key_with`.

use crate::core::tree::{Table, Value};

/// How map keys are rewritten before they are matched against struct fields.
///
/// Field names themselves come from serde (`#[serde(rename = "...")]`); this only
/// normalises the keys found in the configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyCase {
    /// Keys are matched exactly as written.
    #[default]
    AsIs,
    /// Keys are lowercased, so `MaxIdle` matches a `maxidle` field.
    Lower,
    /// `camelCase`, `PascalCase` and `kebab-case` keys become `snake_case`.
    Snake,
}

/// Options for [`Store::unmarshal_key_with`](crate::core::Store::unmarshal_key_with).
///
/// # Examples
///
/// ```rust
/// use hotswap_store::core::{KeyCase, UnmarshalOptions};
///
/// let options = UnmarshalOptions::default().key_case(KeyCase::Snake);
/// assert_eq!(options.case(), KeyCase::Snake);
/// ```
#[derive(Debug, Clone, Default)]
pub struct UnmarshalOptions {
    key_case: KeyCase,
}

impl UnmarshalOptions {
    /// Set how document keys are normalised before decoding.
    pub fn key_case(mut self, key_case: KeyCase) -> Self {
        self.key_case = key_case;
        self
    }

    /// The configured key normalisation.
    pub fn case(&self) -> KeyCase {
        self.key_case
    }

    pub(crate) fn prepare(&self, value: Value) -> Value {
        match self.key_case {
            KeyCase::AsIs => value,
            KeyCase::Lower => rewrite_keys(value, &|key| key.to_lowercase()),
            KeyCase::Snake => rewrite_keys(value, &to_snake_case),
        }
    }
}

fn rewrite_keys(value: Value, rewrite: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (rewrite(&key), rewrite_keys(value, rewrite)))
                .collect::<Table>(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| rewrite_keys(item, rewrite))
                .collect(),
        ),
        leaf => leaf,
    }
}

fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev_lower = false;
    for c in key.chars() {
        if c == '-' || c == ' ' {
            out.push('_');
            prev_lower = false;
        } else if c.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    out
}
