//! Attribute schemas of resources and data sources
//!
//! Handlers define a schema for each resource type and data source,
//! enabling validation of configuration before any API call is made.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::resource::Value;

/// Validation function attached to a custom type
pub type ValidateFn = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Attribute type
#[derive(Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Floating point (integers are accepted)
    Float,
    /// Boolean
    Bool,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: ValidateFn,
    },
    /// List
    List(Box<AttributeType>),
    /// Map
    Map(Box<AttributeType>),
    /// Nested block, stored as a list of maps
    Block(Box<BlockSchema>),
}

impl AttributeType {
    /// Check a configured value against the type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Float, Value::Float(_) | Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Custom { base, validate, .. }, v) => {
                base.validate(v)?;
                validate(v).map_err(|msg| TypeError::ValidationFailed { message: msg })
            }

            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner.validate(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Block(block), Value::List(items)) => {
                if let Some(max) = block.max_items
                    && items.len() > max
                {
                    return Err(TypeError::TooManyItems {
                        max,
                        got: items.len(),
                    });
                }
                for (i, item) in items.iter().enumerate() {
                    let Value::Map(map) = item else {
                        return Err(TypeError::ListItemError {
                            index: i,
                            inner: Box::new(TypeError::TypeMismatch {
                                expected: "Block".to_string(),
                                got: item.type_name(),
                            }),
                        });
                    };
                    let errors = validate_attributes(&block.attributes, map);
                    if let Some(first) = errors.into_iter().next() {
                        return Err(TypeError::ListItemError {
                            index: i,
                            inner: Box::new(first),
                        });
                    }
                }
                Ok(())
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Float => "Float".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Block(_) => "Block".to_string(),
        }
    }

    pub fn enum_of(variants: &[&str]) -> Self {
        AttributeType::Enum(variants.iter().map(|v| v.to_string()).collect())
    }

    pub fn list_of(inner: AttributeType) -> Self {
        AttributeType::List(Box::new(inner))
    }

    pub fn map_of(inner: AttributeType) -> Self {
        AttributeType::Map(Box::new(inner))
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

impl fmt::Debug for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeType::Block(block) => f.debug_tuple("Block").field(block).finish(),
            other => write!(f, "{}", other.type_name()),
        }
    }
}

/// Type error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Attribute '{name}' conflicts with '{other}'")]
    ConflictingAttributes { name: String, other: String },

    #[error("Expected at most {max} items, got {got}")]
    TooManyItems { max: usize, got: usize },

    #[error("Attribute '{name}': {inner}")]
    AttributeError { name: String, inner: Box<TypeError> },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },
}

impl Value {
    fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Float(_) => "Float".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Filled in from the API when not configured
    pub computed: bool,
    /// A change requires replacing the resource
    pub force_new: bool,
    /// Masked by the API; carried over from prior state on read
    pub sensitive: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
    pub conflicts_with: Vec<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            computed: false,
            force_new: false,
            sensitive: false,
            default: None,
            description: None,
            conflicts_with: Vec::new(),
        }
    }

    /// Nested block attribute
    pub fn block(name: impl Into<String>, block: BlockSchema) -> Self {
        Self::new(name, AttributeType::Block(Box::new(block)))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn conflicts_with(mut self, other: impl Into<String>) -> Self {
        self.conflicts_with.push(other.into());
        self
    }
}

/// Schema of a nested block
#[derive(Debug, Clone, Default)]
pub struct BlockSchema {
    pub attributes: HashMap<String, AttributeSchema>,
    pub max_items: Option<usize>,
}

impl BlockSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block that may appear at most once
    pub fn single() -> Self {
        Self {
            attributes: HashMap::new(),
            max_items: Some(1),
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Attributes whose change requires replacement
    pub fn force_new_attributes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .attributes
            .values()
            .filter(|a| a.force_new)
            .map(|a| a.name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Validate resource attributes
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let errors = validate_attributes(&self.attributes, attributes);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Insert defaults for unset attributes, including inside configured blocks
    pub fn apply_defaults(&self, attributes: &mut HashMap<String, Value>) {
        apply_defaults(&self.attributes, attributes);
    }

    /// Copy computed attributes the configuration leaves unset from prior state
    ///
    /// Blocks present on both sides are merged item by item.
    pub fn merge_computed(&self, desired: &mut HashMap<String, Value>, prior: &HashMap<String, Value>) {
        merge_computed(&self.attributes, desired, prior);
    }
}

fn validate_attributes(
    schemas: &HashMap<String, AttributeSchema>,
    attributes: &HashMap<String, Value>,
) -> Vec<TypeError> {
    let mut errors = Vec::new();

    for (name, schema) in schemas {
        if schema.required && !attributes.contains_key(name) && schema.default.is_none() {
            errors.push(TypeError::MissingRequired { name: name.clone() });
        }
    }

    for (name, value) in attributes {
        let Some(schema) = schemas.get(name) else {
            // computed-only keys from prior state
            continue;
        };
        if let Err(e) = schema.attr_type.validate(value) {
            errors.push(TypeError::AttributeError {
                name: name.clone(),
                inner: Box::new(e),
            });
        }
        for other in &schema.conflicts_with {
            let other_set = attributes.get(other).is_some_and(|v| !v.is_zero());
            if !value.is_zero() && other_set && name < other {
                errors.push(TypeError::ConflictingAttributes {
                    name: name.clone(),
                    other: other.clone(),
                });
            }
        }
    }

    errors.sort_by_key(|e| e.to_string());
    errors
}

fn apply_defaults(
    schemas: &HashMap<String, AttributeSchema>,
    attributes: &mut HashMap<String, Value>,
) {
    for (name, schema) in schemas {
        if let Some(default) = &schema.default {
            attributes
                .entry(name.clone())
                .or_insert_with(|| default.clone());
        }
        if let AttributeType::Block(block) = &schema.attr_type
            && let Some(Value::List(items)) = attributes.get_mut(name)
        {
            for item in items {
                if let Value::Map(map) = item {
                    apply_defaults(&block.attributes, map);
                }
            }
        }
    }
}

fn merge_computed(
    schemas: &HashMap<String, AttributeSchema>,
    desired: &mut HashMap<String, Value>,
    prior: &HashMap<String, Value>,
) {
    for (name, schema) in schemas {
        let Some(old) = prior.get(name) else {
            continue;
        };
        if schema.computed && !desired.contains_key(name) {
            desired.insert(name.clone(), old.clone());
            continue;
        }
        if let AttributeType::Block(block) = &schema.attr_type
            && let (Some(Value::List(new_items)), Value::List(old_items)) = (desired.get_mut(name), old)
        {
            for (new_item, old_item) in new_items.iter_mut().zip(old_items) {
                if let (Value::Map(new_map), Value::Map(old_map)) = (new_item, old_item) {
                    merge_computed(&block.attributes, new_map, old_map);
                }
            }
        }
    }
}

/// Constructors for the constrained types handlers share
pub mod types {
    use super::*;

    fn custom(
        name: impl Into<String>,
        base: AttributeType,
        validate: impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    ) -> AttributeType {
        AttributeType::Custom {
            name: name.into(),
            base: Box::new(base),
            validate: Arc::new(validate),
        }
    }

    /// Integer within an inclusive range
    pub fn int_between(min: i64, max: i64) -> AttributeType {
        custom(format!("Int({}..={})", min, max), AttributeType::Int, move |value| {
            match value.as_int() {
                Some(n) if (min..=max).contains(&n) => Ok(()),
                Some(n) => Err(format!("expected to be in the range ({} - {}), got {}", min, max, n)),
                None => Err("Expected integer".to_string()),
            }
        })
    }

    /// Integer of at least `min`
    pub fn int_at_least(min: i64) -> AttributeType {
        custom(format!("Int({}..)", min), AttributeType::Int, move |value| {
            match value.as_int() {
                Some(n) if n >= min => Ok(()),
                Some(n) => Err(format!("expected to be at least ({}), got {}", min, n)),
                None => Err("Expected integer".to_string()),
            }
        })
    }

    /// Number within an inclusive range
    pub fn float_between(min: f64, max: f64) -> AttributeType {
        custom(format!("Float({}..={})", min, max), AttributeType::Float, move |value| {
            match value.as_float() {
                Some(n) if n >= min && n <= max => Ok(()),
                Some(n) => Err(format!("expected to be in the range ({} - {}), got {}", min, max, n)),
                None => Err("Expected number".to_string()),
            }
        })
    }

    /// Non-empty string
    pub fn non_empty_string() -> AttributeType {
        custom("NonEmptyString", AttributeType::String, |value| match value.as_str() {
            Some(s) if !s.trim().is_empty() => Ok(()),
            _ => Err("must not be empty".to_string()),
        })
    }

    /// String checked by a plain function
    pub fn string_with(
        name: &str,
        check: impl Fn(&str) -> Result<(), String> + Send + Sync + 'static,
    ) -> AttributeType {
        custom(name, AttributeType::String, move |value| match value.as_str() {
            Some(s) => check(s),
            None => Err("Expected string".to_string()),
        })
    }

    /// RFC 3339 timestamp (e.g., "2024-01-02T03:04:05Z")
    pub fn rfc3339_time() -> AttributeType {
        string_with("Rfc3339Time", |s| {
            chrono::DateTime::parse_from_rfc3339(s)
                .map(|_| ())
                .map_err(|e| format!("{:?} is not a valid RFC 3339 time: {}", s, e))
        })
    }

    /// Typed ARM resource ID
    pub fn resource_id<T: crate::resourceids::ResourceIdentifier + 'static>() -> AttributeType {
        string_with(T::ID_TYPE, |s| T::validate(s).map_err(|e| e.to_string()))
    }

    /// Any ARM resource ID
    pub fn arm_resource_id() -> AttributeType {
        string_with("ResourceId", |s| {
            let parts: Vec<&str> = s.trim_start_matches('/').split('/').collect();
            if !s.starts_with('/') || parts.len() < 2 || parts[0] != "subscriptions" || parts[1].is_empty() {
                return Err(format!("{:?} is not a valid Azure resource ID", s));
            }
            if parts.len() % 2 != 0 {
                return Err(format!("{:?} has an odd number of segments", s));
            }
            Ok(())
        })
    }

    /// List of strings with at least `min` items
    pub fn string_list_min(min: usize) -> AttributeType {
        custom(
            format!("List<String>({}..)", min),
            AttributeType::list_of(AttributeType::String),
            move |value| match value.as_list() {
                Some(items) if items.len() >= min => Ok(()),
                Some(items) => Err(format!("expected at least {} items, got {}", min, items.len())),
                None => Err("Expected list".to_string()),
            },
        )
    }

    /// Map of string tags
    pub fn tags() -> AttributeType {
        AttributeType::map_of(AttributeType::String)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_rejects_other_kinds() {
        assert!(AttributeType::String.validate(&Value::from("westeurope")).is_ok());
        assert!(AttributeType::String.validate(&Value::Bool(true)).is_err());
        assert!(AttributeType::String.validate(&Value::empty_list()).is_err());
    }

    #[test]
    fn test_validate_enum_type() {
        let t = AttributeType::enum_of(&["SameZone", "ZoneRedundant"]);
        assert!(t.validate(&Value::from("SameZone")).is_ok());
        assert!(t.validate(&Value::from("samezone")).is_err());
        assert!(t.validate(&Value::from("Disabled")).is_err());
    }

    #[test]
    fn test_validate_int_between() {
        let t = types::int_between(1, 35);
        assert!(t.validate(&Value::Int(1)).is_ok());
        assert!(t.validate(&Value::Int(35)).is_ok());
        assert!(t.validate(&Value::Int(0)).is_err());
        assert!(t.validate(&Value::Int(36)).is_err());
        assert!(t.validate(&Value::from("7")).is_err());
    }

    #[test]
    fn test_validate_float_accepts_int() {
        let t = types::float_between(0.0, 100.0);
        assert!(t.validate(&Value::Float(12.5)).is_ok());
        assert!(t.validate(&Value::Int(10)).is_ok());
        assert!(t.validate(&Value::Float(100.5)).is_err());
    }

    #[test]
    fn test_validate_rfc3339_time() {
        let t = types::rfc3339_time();
        assert!(t.validate(&Value::from("2024-01-02T03:04:05Z")).is_ok());
        assert!(t.validate(&Value::from("2024-01-02T03:04:05+09:00")).is_ok());
        assert!(t.validate(&Value::from("2024-01-02 03:04")).is_err());
    }

    #[test]
    fn test_validate_arm_resource_id() {
        let t = types::arm_resource_id();
        assert!(
            t.validate(&Value::from(
                "/subscriptions/0000/resourceGroups/rg/providers/Microsoft.App/managedEnvironments/env"
            ))
            .is_ok()
        );
        assert!(t.validate(&Value::from("subscriptions/0000")).is_err());
        assert!(t.validate(&Value::from("/subscriptions/0000/resourceGroups")).is_err());
    }

    #[test]
    fn test_valid_configuration_passes() {
        let schema = ResourceSchema::new("azurerm_mysql_flexible_server")
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("backup_retention_days", types::int_between(1, 35)))
            .attribute(AttributeSchema::new("geo_redundant_backup_enabled", AttributeType::Bool));

        let config = HashMap::from([
            ("name".to_string(), Value::from("example-server")),
            ("backup_retention_days".to_string(), Value::Int(7)),
            ("geo_redundant_backup_enabled".to_string(), Value::Bool(false)),
            ("fqdn".to_string(), Value::from("example-server.mysql.database.azure.com")),
        ]);
        assert!(schema.validate(&config).is_ok());
    }

    #[test]
    fn test_missing_required_attribute() {
        let schema = ResourceSchema::new("azurerm_mysql_flexible_server_configuration")
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("value", AttributeType::String).required().with_default("ON"));

        let errors = schema.validate(&HashMap::new()).unwrap_err();
        assert_eq!(
            errors,
            vec![TypeError::MissingRequired {
                name: "name".to_string()
            }]
        );
    }

    #[test]
    fn test_block_max_items_and_nested_required() {
        let schema = ResourceSchema::new("server").attribute(AttributeSchema::block(
            "high_availability",
            BlockSchema::single()
                .attribute(AttributeSchema::new("mode", AttributeType::String).required()),
        ));

        let mut attrs = HashMap::new();
        attrs.insert(
            "high_availability".to_string(),
            Value::List(vec![
                Value::map([("mode", Value::from("SameZone"))]),
                Value::map([("mode", Value::from("ZoneRedundant"))]),
            ]),
        );
        assert!(schema.validate(&attrs).is_err());

        attrs.insert(
            "high_availability".to_string(),
            Value::block([("standby_availability_zone", Value::from("2"))]),
        );
        let errors = schema.validate(&attrs).unwrap_err();
        assert!(errors[0].to_string().contains("'mode' is missing"));
    }

    #[test]
    fn test_conflicting_attributes() {
        let schema = ResourceSchema::new("auth")
            .attribute(AttributeSchema::new("http_basic_auth", AttributeType::String).conflicts_with("ssh_auth"))
            .attribute(AttributeSchema::new("ssh_auth", AttributeType::String).conflicts_with("http_basic_auth"));

        let mut attrs = HashMap::new();
        attrs.insert("http_basic_auth".to_string(), Value::from("a"));
        attrs.insert("ssh_auth".to_string(), Value::from("b"));
        let errors = schema.validate(&attrs).unwrap_err();
        assert_eq!(errors.len(), 1);

        attrs.insert("ssh_auth".to_string(), Value::from(""));
        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn test_apply_defaults_fills_nested_blocks() {
        let schema = ResourceSchema::new("server")
            .attribute(AttributeSchema::new("backup_retention_days", AttributeType::Int).with_default(7i64))
            .attribute(AttributeSchema::block(
                "maintenance_window",
                BlockSchema::single()
                    .attribute(AttributeSchema::new("day_of_week", AttributeType::Int).with_default(0i64))
                    .attribute(AttributeSchema::new("start_hour", AttributeType::Int).with_default(0i64)),
            ));

        let mut attrs = HashMap::new();
        attrs.insert(
            "maintenance_window".to_string(),
            Value::block([("start_hour", Value::Int(3))]),
        );
        schema.apply_defaults(&mut attrs);

        assert_eq!(attrs["backup_retention_days"], Value::Int(7));
        let window = attrs["maintenance_window"].as_list().unwrap()[0].as_map().unwrap();
        assert_eq!(window["day_of_week"], Value::Int(0));
        assert_eq!(window["start_hour"], Value::Int(3));
    }

    #[test]
    fn test_merge_computed_keeps_prior_values() {
        let schema = ResourceSchema::new("server")
            .attribute(AttributeSchema::new("zone", AttributeType::String).computed())
            .attribute(AttributeSchema::new("sku_name", AttributeType::String))
            .attribute(AttributeSchema::block(
                "high_availability",
                BlockSchema::single()
                    .attribute(AttributeSchema::new("mode", AttributeType::String).required())
                    .attribute(AttributeSchema::new("standby_availability_zone", AttributeType::String).computed()),
            ));

        let mut prior = HashMap::new();
        prior.insert("zone".to_string(), Value::from("1"));
        prior.insert("sku_name".to_string(), Value::from("B_Standard_B1s"));
        prior.insert(
            "high_availability".to_string(),
            Value::block([
                ("mode", Value::from("ZoneRedundant")),
                ("standby_availability_zone", Value::from("2")),
            ]),
        );

        let mut desired = HashMap::new();
        desired.insert(
            "high_availability".to_string(),
            Value::block([("mode", Value::from("ZoneRedundant"))]),
        );
        schema.merge_computed(&mut desired, &prior);

        assert_eq!(desired["zone"], Value::from("1"));
        assert!(!desired.contains_key("sku_name"));
        assert_eq!(desired["high_availability"], prior["high_availability"]);
    }
}
