//! Schema - Attribute type schemas for declared resource types
//!
//! Each resource type carries a schema so a manifest can be type-checked
//! before it is handed to the engine.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::resource::Value;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    String,
    Int,
    Bool,
    /// One of a fixed set of string values
    Enum(Vec<String>),
    /// Named type with a validation function over a base type
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    List(Box<AttributeType>),
    Map(Box<AttributeType>),
}

impl AttributeType {
    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        // References and concatenations resolve to strings at apply time,
        // so they satisfy any string-based type.
        if matches!(value, Value::Ref(_, _) | Value::Concat(_)) {
            return if self.string_based() {
                Ok(())
            } else {
                Err(TypeError::Mismatch {
                    expected: self.type_name(),
                    got: value.type_name(),
                })
            };
        }

        match (self, value) {
            (AttributeType::String, Value::String(_))
            | (AttributeType::Int, Value::Int(_))
            | (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.contains(s) {
                    Ok(())
                } else {
                    Err(TypeError::UnknownVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Custom { validate, .. }, v) => {
                validate(v).map_err(|message| TypeError::Invalid { message })
            }

            (AttributeType::List(inner), Value::List(items)) => {
                items.iter().enumerate().try_for_each(|(i, item)| {
                    inner.validate(item).map_err(|e| e.nested(format!("index {i}")))
                })
            }

            (AttributeType::Map(inner), Value::Map(map)) => map.iter().try_for_each(|(k, v)| {
                inner.validate(v).map_err(|e| e.nested(format!("key '{k}'")))
            }),

            _ => Err(TypeError::Mismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn string_based(&self) -> bool {
        match self {
            AttributeType::String | AttributeType::Enum(_) => true,
            AttributeType::Custom { base, .. } => base.string_based(),
            _ => false,
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".into(),
            AttributeType::Int => "Int".into(),
            AttributeType::Bool => "Bool".into(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("type mismatch: expected {expected}, got {got}")]
    Mismatch { expected: String, got: String },

    #[error("unknown variant '{value}', expected one of: {}", expected.join(", "))]
    UnknownVariant { value: String, expected: Vec<String> },

    #[error("{message}")]
    Invalid { message: String },

    #[error("required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("{context}: {inner}")]
    Nested {
        context: String,
        inner: Box<TypeError>,
    },
}

impl TypeError {
    fn nested(self, context: String) -> TypeError {
        TypeError::Nested {
            context,
            inner: Box::new(self),
        }
    }
}

impl Value {
    fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".into(),
            Value::Int(_) => "Int".into(),
            Value::Bool(_) => "Bool".into(),
            Value::List(_) => "List".into(),
            Value::Map(_) => "Map".into(),
            Value::Ref(name, attr) => format!("Ref({}.{})", name, attr),
            Value::Concat(_) => "Concat".into(),
        }
    }
}

/// Schema of one attribute
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    pub description: Option<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }
}

/// Schema of one resource type
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

    /// Validate resource attributes. Unknown attributes pass; attributes the
    /// schema knows are type-checked and required ones must be present.
    pub fn validate(&self, attributes: &BTreeMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let mut errors: Vec<TypeError> = self
            .attributes
            .values()
            .filter(|s| s.required && !attributes.contains_key(&s.name))
            .map(|s| TypeError::MissingRequired {
                name: s.name.clone(),
            })
            .collect();

        errors.extend(attributes.iter().filter_map(|(name, value)| {
            let schema = self.attributes.get(name)?;
            schema.attr_type.validate(value).err()
        }));

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    pub fn positive_int() -> AttributeType {
        AttributeType::Custom {
            name: "PositiveInt".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| match value {
                Value::Int(n) if *n > 0 => Ok(()),
                Value::Int(_) => Err("value must be positive".to_string()),
                _ => Err("expected integer".to_string()),
            },
        }
    }

    /// CIDR block type (e.g., "10.0.0.0/16")
    pub fn cidr() -> AttributeType {
        AttributeType::Custom {
            name: "Cidr".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) => validate_cidr(s),
                _ => Err("expected string".to_string()),
            },
        }
    }

    pub fn port_number() -> AttributeType {
        AttributeType::Custom {
            name: "PortNumber".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| match value {
                Value::Int(n) if (0..=65535).contains(n) => Ok(()),
                Value::Int(_) => Err("port number must be between 0 and 65535".to_string()),
                _ => Err("expected integer".to_string()),
            },
        }
    }

    /// Protocol type for traffic rules; "-1" is all traffic
    pub fn protocol() -> AttributeType {
        AttributeType::Enum(vec![
            "tcp".to_string(),
            "udp".to_string(),
            "icmp".to_string(),
            "-1".to_string(),
        ])
    }
}

/// Validate CIDR block format (e.g., "10.0.0.0/16")
pub fn validate_cidr(cidr: &str) -> Result<(), String> {
    cidr.parse::<crate::cidr::Ipv4Cidr>()
        .map(|_| ())
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_types_reject_other_scalars() {
        assert!(AttributeType::String.validate(&Value::string("hello")).is_ok());
        assert!(AttributeType::String.validate(&Value::Int(42)).is_err());
        assert!(AttributeType::Bool.validate(&Value::Bool(true)).is_ok());
        assert!(AttributeType::Bool.validate(&Value::string("true")).is_err());
    }

    #[test]
    fn reference_satisfies_string_types() {
        assert!(
            AttributeType::String
                .validate(&Value::reference("vpc", "id"))
                .is_ok()
        );
        assert!(types::cidr().validate(&Value::reference("vpc", "cidr_block")).is_ok());
        assert!(AttributeType::Int.validate(&Value::reference("vpc", "id")).is_err());
    }

    #[test]
    fn protocol_is_a_closed_enum() {
        let t = types::protocol();
        assert!(t.validate(&Value::string("tcp")).is_ok());
        assert!(t.validate(&Value::string("-1")).is_ok());
        assert!(t.validate(&Value::string("gre")).is_err());
    }

    #[test]
    fn port_numbers_have_bounds() {
        let t = types::port_number();
        assert!(t.validate(&Value::Int(0)).is_ok());
        assert!(t.validate(&Value::Int(16443)).is_ok());
        assert!(t.validate(&Value::Int(65535)).is_ok());
        assert!(t.validate(&Value::Int(65536)).is_err());
        assert!(t.validate(&Value::Int(-1)).is_err());
    }

    #[test]
    fn list_errors_carry_the_index() {
        let t = AttributeType::List(Box::new(types::port_number()));
        let err = t
            .validate(&Value::List(vec![Value::Int(80), Value::Int(99999)]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "index 1: port number must be between 0 and 65535"
        );
    }

    #[test]
    fn schema_checks_required_and_typed_attributes() {
        let schema = ResourceSchema::new("subnet")
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("cidr_block", types::cidr()).required());

        let mut attrs = BTreeMap::new();
        attrs.insert("name".to_string(), Value::string("subnet-dev"));
        attrs.insert("cidr_block".to_string(), Value::string("10.90.1.0/24"));
        assert!(schema.validate(&attrs).is_ok());

        attrs.remove("name");
        attrs.insert("cidr_block".to_string(), Value::string("10.90.1.0"));
        let errors = schema.validate(&attrs).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn validate_cidr_format() {
        assert!(validate_cidr("10.90.0.0/16").is_ok());
        assert!(validate_cidr("0.0.0.0/0").is_ok());
        assert!(validate_cidr("255.255.255.255/32").is_ok());

        assert!(validate_cidr("10.90.0.0").is_err()); // no prefix
        assert!(validate_cidr("10.90.0.0/33").is_err()); // prefix too large
        assert!(validate_cidr("10.90.0.256/16").is_err()); // octet > 255
        assert!(validate_cidr("10.90.0/16").is_err()); // only 3 octets
    }
}
