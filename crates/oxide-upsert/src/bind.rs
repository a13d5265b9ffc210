//! Named bind parameters and per-statement filtering.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Result, UpsertError};
use crate::options::LobColumnMap;
use crate::value::{BindValue, ToBindValue};

/// Named bind parameters, keyed by name without the leading colon.
pub type NamedParams = BTreeMap<String, BindValue>;

/// Bind parameters as supplied by a caller.
///
/// Only the named form is usable. The positional form exists so that an
/// array input can be represented and rejected before any I/O.
#[derive(Debug, Clone, PartialEq)]
pub enum BindParams {
    /// Parameters addressed by `:name`.
    Named(NamedParams),
    /// Parameters addressed by position. Rejected by the upsert.
    Positional(Vec<BindValue>),
}

impl Default for BindParams {
    fn default() -> Self {
        Self::Named(NamedParams::new())
    }
}

impl BindParams {
    /// Creates an empty named parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named parameter.
    ///
    /// A positional set is left as is; it is rejected later anyway.
    #[must_use]
    pub fn bind(mut self, name: impl Into<String>, value: impl ToBindValue) -> Self {
        if let Self::Named(params) = &mut self {
            params.insert(name.into(), value.to_bind_value());
        }
        self
    }

    /// Converts a JSON value into bind parameters.
    ///
    /// An object becomes named parameters, `null` becomes an empty set and an
    /// array becomes the (unsupported) positional form. Any other value, or a
    /// nested object or array inside an object, is invalid input.
    ///
    /// # Errors
    ///
    /// Returns [`UpsertError::InvalidInput`] for a JSON scalar at the top
    /// level or a nested object or array as a parameter value.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Null => Ok(Self::default()),
            serde_json::Value::Object(map) => map
                .into_iter()
                .map(|(name, value)| {
                    scalar_from_json(value)
                        .map(|value| (name.clone(), value))
                        .ok_or_else(|| {
                            UpsertError::InvalidInput(format!(
                                "Bind param '{name}' is not a scalar value."
                            ))
                        })
                })
                .collect::<Result<NamedParams>>()
                .map(Self::Named),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|value| {
                    scalar_from_json(value).ok_or_else(|| {
                        UpsertError::InvalidInput(
                            "Bind param array holds a non-scalar value.".to_string(),
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::Positional),
            other => Err(UpsertError::InvalidInput(format!(
                "Bind params must be an object, got {other}."
            ))),
        }
    }

    /// Returns the named parameters, or `None` for the positional form.
    #[must_use]
    pub const fn as_named(&self) -> Option<&NamedParams> {
        match self {
            Self::Named(params) => Some(params),
            Self::Positional(_) => None,
        }
    }

    /// Returns whether no parameters are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Named(params) => params.is_empty(),
            Self::Positional(values) => values.is_empty(),
        }
    }
}

impl From<NamedParams> for BindParams {
    fn from(params: NamedParams) -> Self {
        Self::Named(params)
    }
}

impl From<Vec<BindValue>> for BindParams {
    fn from(values: Vec<BindValue>) -> Self {
        Self::Positional(values)
    }
}

impl<K: Into<String>, V: ToBindValue> FromIterator<(K, V)> for BindParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::Named(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.to_bind_value()))
                .collect(),
        )
    }
}

fn scalar_from_json(value: serde_json::Value) -> Option<BindValue> {
    match value {
        serde_json::Value::Null => Some(BindValue::Null),
        serde_json::Value::Bool(b) => Some(BindValue::Bool(b)),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(BindValue::Int)
            .or_else(|| n.as_f64().map(BindValue::Float)),
        serde_json::Value::String(s) => Some(BindValue::Text(s)),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
    }
}

/// Returns the bind parameters a single statement needs.
///
/// A parameter is kept when `sql` contains the literal text `:<name>`, or when
/// its name is registered as a LOB parameter in `lob_meta_info` (LOB values
/// are written outside named substitution, so their names need not appear in
/// the text). The match is a plain substring test: `:id` also matches inside
/// `:identity`.
///
/// # Example
///
/// ```rust
/// use oxide_upsert::{filter_bind_params, BindParams};
///
/// let params = BindParams::new().bind("a", 1).bind("b", 2).bind("c", 3);
/// let filtered = filter_bind_params(
///     "UPDATE t SET b = :b WHERE a = :a",
///     params.as_named().unwrap(),
///     None,
/// );
/// assert_eq!(filtered.keys().collect::<Vec<_>>(), ["a", "b"]);
/// ```
#[must_use]
pub fn filter_bind_params(
    sql: &str,
    params: &NamedParams,
    lob_meta_info: Option<&LobColumnMap>,
) -> NamedParams {
    let lob_params: BTreeSet<&str> = lob_meta_info
        .into_iter()
        .flat_map(|lobs| lobs.values().map(String::as_str))
        .collect();

    params
        .iter()
        .filter(|(name, _)| {
            lob_params.contains(name.as_str()) || sql.contains(&format!(":{name}"))
        })
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}
