//! Resource - Declarative resource records and their attribute values

use std::collections::BTreeMap;

/// Unique identifier for a declared resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    /// Resource type (e.g., "subnet", "security_group")
    pub resource_type: String,
    /// Logical name the resource is declared under (referenced by other resources)
    pub name: String,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

/// Attribute value of a resource
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Bool(bool),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// Reference to another resource's attribute (logical_name, attribute_name).
    /// The attribute may only exist after apply (e.g., "id", "arn", "public_ip");
    /// the engine resolves it and orders creation accordingly.
    Ref(String, String),
    /// Concatenation of fragments, used where a referenced output is embedded
    /// in a larger string (e.g., a bucket ARN followed by "/*")
    Concat(Vec<Value>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn reference(name: impl Into<String>, attribute: impl Into<String>) -> Self {
        Value::Ref(name.into(), attribute.into())
    }

    pub fn concat(parts: Vec<Value>) -> Self {
        Value::Concat(parts)
    }

    /// Convert to JSON for the engine-facing manifest. References become
    /// `${name.attribute}` placeholder strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Int(n) => serde_json::Value::Number((*n).into()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => {
                let obj: serde_json::Map<_, _> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect();
                serde_json::Value::Object(obj)
            }
            Value::Ref(name, attr) => serde_json::Value::String(format!("${{{}.{}}}", name, attr)),
            Value::Concat(parts) => {
                serde_json::Value::String(parts.iter().map(Value::fragment).collect())
            }
        }
    }

    fn fragment(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Int(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Ref(name, attr) => format!("${{{}.{}}}", name, attr),
            Value::Concat(parts) => parts.iter().map(Value::fragment).collect(),
            other => other.to_json().to_string(),
        }
    }

    /// Build a Value from plain JSON (used for policy documents authored with
    /// `serde_json::json!`). Null becomes an empty string; policy documents
    /// never carry nulls.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Number(n) => Value::Int(n.as_i64().unwrap_or(0)),
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                let m: BTreeMap<_, _> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect();
                Value::Map(m)
            }
            serde_json::Value::Null => Value::String(String::new()),
        }
    }
}

/// A single declared resource: the desired state handed to the engine
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub attributes: BTreeMap<String, Value>,
    /// Explicit ordering dependencies (logical names), in addition to the
    /// implicit ones carried by `Value::Ref` attributes
    pub depends_on: Vec<String>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(resource_type, name),
            attributes: BTreeMap::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn with_dependency(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Engine-facing JSON for this declaration
    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        obj.insert(
            "type".to_string(),
            serde_json::Value::String(self.id.resource_type.clone()),
        );
        obj.insert(
            "name".to_string(),
            serde_json::Value::String(self.id.name.clone()),
        );
        if !self.depends_on.is_empty() {
            obj.insert(
                "depends_on".to_string(),
                serde_json::Value::Array(
                    self.depends_on
                        .iter()
                        .map(|d| serde_json::Value::String(d.clone()))
                        .collect(),
                ),
            );
        }
        let attrs: serde_json::Map<_, _> = self
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        obj.insert("attributes".to_string(), serde_json::Value::Object(attrs));
        serde_json::Value::Object(obj)
    }
}
