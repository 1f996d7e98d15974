//! ResourceData - Read access to desired attributes alongside prior state
//!
//! Handlers read configuration through this type. Paths are dotted and may
//! index into lists, e.g. `storage.0.size_gb`.

use std::collections::HashMap;

use crate::resource::Value;

static EMPTY: std::sync::LazyLock<HashMap<String, Value>> = std::sync::LazyLock::new(HashMap::new);

/// Desired attributes plus the prior state they are compared against
#[derive(Debug, Clone, Copy)]
pub struct ResourceData<'a> {
    desired: &'a HashMap<String, Value>,
    prior: Option<&'a HashMap<String, Value>>,
}

impl<'a> ResourceData<'a> {
    pub fn new(desired: &'a HashMap<String, Value>) -> Self {
        Self {
            desired,
            prior: None,
        }
    }

    pub fn with_prior(mut self, prior: &'a HashMap<String, Value>) -> Self {
        self.prior = Some(prior);
        self
    }

    /// Data with only prior state (e.g. a refresh after import)
    pub fn from_prior(prior: &'a HashMap<String, Value>) -> Self {
        Self {
            desired: prior,
            prior: Some(prior),
        }
    }

    pub fn empty() -> ResourceData<'static> {
        ResourceData {
            desired: &*EMPTY,
            prior: None,
        }
    }

    pub fn attributes(&self) -> &'a HashMap<String, Value> {
        self.desired
    }

    pub fn prior(&self) -> Option<&'a HashMap<String, Value>> {
        self.prior
    }

    pub fn get(&self, path: &str) -> Option<&'a Value> {
        lookup(self.desired, path)
    }

    /// Non-empty string at `path`
    pub fn get_str(&self, path: &str) -> Option<&'a str> {
        self.get(path)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// String at `path`, empty when unset
    pub fn string(&self, path: &str) -> String {
        self.get_str(path).unwrap_or_default().to_string()
    }

    pub fn get_int(&self, path: &str) -> Option<i64> {
        self.get(path).and_then(Value::as_int)
    }

    pub fn get_float(&self, path: &str) -> Option<f64> {
        self.get(path).and_then(Value::as_float)
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }

    pub fn bool(&self, path: &str) -> bool {
        self.get_bool(path).unwrap_or(false)
    }

    pub fn get_list(&self, path: &str) -> &'a [Value] {
        self.get(path).and_then(Value::as_list).unwrap_or(&[])
    }

    /// First element of a nested block, if any
    pub fn get_block(&self, path: &str) -> Option<&'a HashMap<String, Value>> {
        self.get_list(path).first().and_then(Value::as_map)
    }

    pub fn get_map(&self, path: &str) -> Option<&'a HashMap<String, Value>> {
        self.get(path).and_then(Value::as_map)
    }

    /// Value at `path` in prior state
    pub fn get_prior(&self, path: &str) -> Option<&'a Value> {
        self.prior.and_then(|prior| lookup(prior, path))
    }

    /// Whether `path` differs between prior state and desired attributes
    ///
    /// Without prior state any non-zero desired value counts as a change.
    /// A missing value equals the zero value of the other side's kind.
    pub fn has_change(&self, path: &str) -> bool {
        let (old, new) = self.get_change(path);
        !values_equal(old, new)
    }

    pub fn get_change(&self, path: &str) -> (Option<&'a Value>, Option<&'a Value>) {
        (self.get_prior(path), self.get(path))
    }
}

fn values_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(v), None) | (None, Some(v)) => v.is_zero(),
        (Some(a), Some(b)) => same_value(a, b),
    }
}

/// Structural equality where an integer equals the float of the same value
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => *i as f64 == *f,
        (Value::List(x), Value::List(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| same_value(a, b))
        }
        (Value::Map(x), Value::Map(y)) => x
            .keys()
            .chain(y.keys())
            .all(|key| values_equal(x.get(key), y.get(key))),
        _ => a == b,
    }
}

fn lookup<'a>(attributes: &'a HashMap<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = attributes.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Value::List(items) => items.get(part.parse::<usize>().ok()?)?,
            Value::Map(map) => map.get(part)?,
            _ => return None,
        };
    }
    Some(current)
}
