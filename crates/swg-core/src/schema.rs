//! Language-agnostic schema nodes produced by the type resolver.
//!
//! Property names are kept exactly as declared; emitted names are decided by
//! the assembler so one resolution can serve every naming strategy.

use serde_json::Value;

/// Primitive schema types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    String,
    Integer,
    Number,
    Boolean,
    File,
}

impl Primitive {
    pub fn as_str(&self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Integer => "integer",
            Primitive::Number => "number",
            Primitive::Boolean => "boolean",
            Primitive::File => "file",
        }
    }

    /// Convert an annotation literal into a JSON value of this type.
    ///
    /// Falls back to a string when the text does not parse as the type.
    pub fn literal(&self, text: &str) -> Value {
        let text = text.trim();
        let parsed = match self {
            Primitive::Integer => text.parse::<i64>().ok().map(Value::from),
            Primitive::Number => text.parse::<f64>().ok().map(Value::from),
            Primitive::Boolean => text.parse::<bool>().ok().map(Value::from),
            Primitive::String | Primitive::File => None,
        };
        parsed.unwrap_or_else(|| Value::String(text.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    Primitive(Primitive),
    Object,
    Array(Box<SchemaNode>),
    /// Object whose values all share one schema (`additionalProperties`).
    Map(Box<SchemaNode>),
    Enum(Primitive),
    /// Reference to a named entry of the definitions table.
    Reference(String),
}

/// A property of an object schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Name as declared in source.
    pub declared: String,
    /// Explicit serialized name; emitted verbatim regardless of naming strategy.
    pub rename: Option<String>,
    pub description: Option<String>,
    pub schema: SchemaNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    /// Set for entries of the definitions table, `None` for inline schemas.
    pub name: Option<String>,
    pub kind: SchemaKind,
    pub format: Option<String>,
    pub description: Option<String>,
    pub properties: Vec<Property>,
    /// Declared names of required properties.
    pub required: Vec<String>,
    pub enum_values: Vec<Value>,
    pub example: Option<Value>,
}

impl SchemaNode {
    fn with_kind(kind: SchemaKind) -> Self {
        Self {
            name: None,
            kind,
            format: None,
            description: None,
            properties: Vec::new(),
            required: Vec::new(),
            enum_values: Vec::new(),
            example: None,
        }
    }

    pub fn primitive(primitive: Primitive, format: Option<&str>) -> Self {
        let mut node = Self::with_kind(SchemaKind::Primitive(primitive));
        node.format = format.map(str::to_string);
        node
    }

    pub fn object() -> Self {
        Self::with_kind(SchemaKind::Object)
    }

    pub fn array(items: SchemaNode) -> Self {
        Self::with_kind(SchemaKind::Array(Box::new(items)))
    }

    pub fn map(values: SchemaNode) -> Self {
        Self::with_kind(SchemaKind::Map(Box::new(values)))
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self::with_kind(SchemaKind::Reference(name.into()))
    }

    pub fn enumeration(primitive: Primitive, values: Vec<Value>) -> Self {
        let mut node = Self::with_kind(SchemaKind::Enum(primitive));
        node.enum_values = values;
        node
    }

    pub fn reference_name(&self) -> Option<&str> {
        match &self.kind {
            SchemaKind::Reference(name) => Some(name),
            _ => None,
        }
    }

    /// The primitive type carried by primitive and enum nodes.
    pub fn primitive_type(&self) -> Option<Primitive> {
        match self.kind {
            SchemaKind::Primitive(p) | SchemaKind::Enum(p) => Some(p),
            _ => None,
        }
    }

    pub fn property(&self, declared: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.declared == declared)
    }

    /// A short label used when synthesizing names of generic instantiations.
    pub fn label(&self) -> String {
        match &self.kind {
            SchemaKind::Reference(name) => name.clone(),
            SchemaKind::Primitive(p) | SchemaKind::Enum(p) => p.as_str().to_string(),
            SchemaKind::Object => "object".to_string(),
            SchemaKind::Array(items) => format!("array_{}", items.label()),
            SchemaKind::Map(values) => format!("map_{}", values.label()),
        }
    }

    /// Names of every definition this node references, directly or nested.
    pub fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match &self.kind {
            SchemaKind::Reference(name) => out.push(name),
            SchemaKind::Array(inner) | SchemaKind::Map(inner) => inner.collect_references(out),
            _ => {}
        }
        for property in &self.properties {
            property.schema.collect_references(out);
        }
    }
}
