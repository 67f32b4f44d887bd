//! Operation records built from handler doc blocks.

mod builder;

use indexmap::IndexMap;

use crate::fault::SourceLocation;
use crate::schema::{Primitive, SchemaNode};
use crate::source::TypeExpr;

pub use builder::{build_operation, path_placeholders};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
}

impl HttpMethod {
    pub fn parse(text: &str) -> Option<HttpMethod> {
        match text.trim().to_ascii_lowercase().as_str() {
            "get" => Some(HttpMethod::Get),
            "put" => Some(HttpMethod::Put),
            "post" => Some(HttpMethod::Post),
            "delete" => Some(HttpMethod::Delete),
            "options" => Some(HttpMethod::Options),
            "head" => Some(HttpMethod::Head),
            "patch" => Some(HttpMethod::Patch),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
        }
    }
}

/// One `@Router path [method]` registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub method: HttpMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    Query,
    Path,
    Header,
    Body,
    FormData,
}

impl ParamLocation {
    pub fn parse(text: &str) -> Option<ParamLocation> {
        match text.to_ascii_lowercase().as_str() {
            "query" => Some(ParamLocation::Query),
            "path" => Some(ParamLocation::Path),
            "header" => Some(ParamLocation::Header),
            "body" => Some(ParamLocation::Body),
            "formdata" | "form" => Some(ParamLocation::FormData),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamLocation::Query => "query",
            ParamLocation::Path => "path",
            ParamLocation::Header => "header",
            ParamLocation::Body => "body",
            ParamLocation::FormData => "formData",
        }
    }
}

/// Optional `key(value)` attributes trailing a `@Param`.
///
/// Values stay as written; they are typed against the parameter schema at
/// assembly time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamAttributes {
    pub default: Option<String>,
    pub enums: Vec<String>,
    pub minimum: Option<String>,
    pub maximum: Option<String>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub location: ParamLocation,
    pub ty: TypeExpr,
    pub required: bool,
    pub description: Option<String>,
    pub attributes: ParamAttributes,
    /// Filled in by the resolver.
    pub schema: Option<SchemaNode>,
    pub line: usize,
}

/// The `{kind}` written in a response directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Object,
    Array,
    String,
    Integer,
    Number,
    Boolean,
    File,
}

impl BodyKind {
    pub fn parse(text: &str) -> Option<BodyKind> {
        let inner = text.strip_prefix('{')?.strip_suffix('}')?;
        match inner.trim().to_ascii_lowercase().as_str() {
            "object" => Some(BodyKind::Object),
            "array" => Some(BodyKind::Array),
            "string" => Some(BodyKind::String),
            "integer" | "int" => Some(BodyKind::Integer),
            "number" => Some(BodyKind::Number),
            "boolean" | "bool" => Some(BodyKind::Boolean),
            "file" => Some(BodyKind::File),
            _ => None,
        }
    }

    pub fn primitive(&self) -> Option<Primitive> {
        match self {
            BodyKind::String => Some(Primitive::String),
            BodyKind::Integer => Some(Primitive::Integer),
            BodyKind::Number => Some(Primitive::Number),
            BodyKind::Boolean => Some(Primitive::Boolean),
            BodyKind::File => Some(Primitive::File),
            BodyKind::Object | BodyKind::Array => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseBody {
    pub kind: BodyKind,
    pub ty: Option<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderSpec {
    pub name: String,
    pub kind: Primitive,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSpec {
    pub description: Option<String>,
    pub body: Option<ResponseBody>,
    pub headers: Vec<HeaderSpec>,
    /// Filled in by the resolver.
    pub schema: Option<SchemaNode>,
    pub line: usize,
}

/// Scheme name to required scopes. All entries of one requirement apply together.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// The documented contract of one handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub id: String,
    pub routes: Vec<Route>,
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    pub parameters: Vec<ParameterSpec>,
    /// Keyed by status code or `default`, in first-declared order.
    pub responses: IndexMap<String, ResponseSpec>,
    pub security: Vec<SecurityRequirement>,
    pub deprecated: bool,
    /// Module the handler was declared in; type references resolve from here.
    pub module_path: Vec<String>,
    pub location: SourceLocation,
}

impl Operation {
    pub fn parameter(&self, name: &str, location: ParamLocation) -> Option<&ParameterSpec> {
        self.parameters
            .iter()
            .find(|p| p.name == name && p.location == location)
    }

    /// Location of a line inside this handler's doc block.
    pub fn location_at(&self, line: usize) -> SourceLocation {
        SourceLocation::new(self.location.file.clone(), line)
    }
}
