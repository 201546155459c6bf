//! Typed schema mapping `[options]` keys to command-line tokens.
//!
//! A suite file carries options as plain TOML values. Each key the harness understands is
//! declared here once, together with its type and its effect on the target's argument list:
//!
//! | kind    | TOML type                  | contributes           |
//! |---------|----------------------------|-----------------------|
//! | `Flag`  | boolean                    | `token` when `true`   |
//! | `Param` | string, integer or float   | `token`, `value`      |
//!
//! Keys absent from the schema are ignored so that newer suite files keep working with older
//! harnesses.

use crate::error::{ConfigError, type_name};

/// Effect a single option key has on the target program's arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionKind {
    /// Boolean switch; `true` emits `token`, `false` emits nothing.
    Flag { token: String },
    /// Named parameter; emits `token` followed by the value.
    Param { token: String },
}

/// One declared option key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionField {
    pub key: String,
    pub kind: OptionKind,
}

impl OptionField {
    pub fn flag(key: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: OptionKind::Flag { token: token.into() },
        }
    }

    pub fn param(key: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: OptionKind::Param { token: token.into() },
        }
    }
}

/// Ordered set of option fields. Tokens are emitted in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSchema {
    fields: Vec<OptionField>,
}

impl Default for OptionSchema {
    /// `option` → `--option`, `parameter` → `--parameter <value>`.
    fn default() -> Self {
        Self::empty()
            .with_field(OptionField::flag("option", "--option"))
            .with_field(OptionField::param("parameter", "--parameter"))
    }
}

impl OptionSchema {
    /// A schema that recognizes no keys.
    pub fn empty() -> Self {
        Self { fields: Vec::new() }
    }

    /// Add a field, replacing any earlier field with the same key.
    pub fn with_field(mut self, field: OptionField) -> Self {
        self.fields.retain(|f| f.key != field.key);
        self.fields.push(field);
        self
    }

    pub fn fields(&self) -> &[OptionField] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&OptionField> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Check every known key in `table` has the type its field declares.
    ///
    /// `location` names the table in error messages, e.g. `[options]`.
    pub fn validate(&self, suite: &str, location: &str, table: &toml::Table) -> Result<(), ConfigError> {
        for field in &self.fields {
            let Some(value) = table.get(&field.key) else {
                continue;
            };
            let ok = match field.kind {
                OptionKind::Flag { .. } => value.is_bool(),
                OptionKind::Param { .. } => value.is_str() || value.is_integer() || value.is_float(),
            };
            if !ok {
                return Err(ConfigError::InvalidField {
                    suite: suite.to_string(),
                    location: location.to_string(),
                    key: field.key.clone(),
                    expected: match field.kind {
                        OptionKind::Flag { .. } => "a boolean",
                        OptionKind::Param { .. } => "a string or number",
                    },
                    found: type_name(value),
                });
            }
        }
        Ok(())
    }

    /// Turn a validated options table into argument tokens.
    ///
    /// Call [`OptionSchema::validate`] first; values of the wrong type are skipped here.
    pub fn tokens(&self, table: &toml::Table) -> Vec<String> {
        let mut tokens = Vec::new();
        for field in &self.fields {
            let Some(value) = table.get(&field.key) else {
                continue;
            };
            match &field.kind {
                OptionKind::Flag { token } => {
                    if value.as_bool() == Some(true) {
                        tokens.push(token.clone());
                    }
                }
                OptionKind::Param { token } => {
                    if let Some(value) = param_value(value) {
                        tokens.push(token.clone());
                        tokens.push(value);
                    }
                }
            }
        }
        tokens
    }
}

fn param_value(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        _ => None,
    }
}
