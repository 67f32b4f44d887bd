use crate::fault::SourceLocation;

use super::docs::DocLine;
use super::serde_attrs::SerdeField;
use super::types::TypeExpr;

/// A type declaration discovered in a module.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: String,
    pub module_path: Vec<String>,
    pub generics: Vec<String>,
    pub docs: Vec<DocLine>,
    pub body: TypeBody,
    pub location: SourceLocation,
}

impl TypeDecl {
    /// `module::path::Name`, or just `Name` at the crate root.
    pub fn qualified_name(&self) -> String {
        qualify(&self.module_path, &self.name)
    }
}

pub fn qualify(module_path: &[String], name: &str) -> String {
    if module_path.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", module_path.join("::"), name)
    }
}

/// The shape of a declared type.
#[derive(Debug, Clone)]
pub enum TypeBody {
    /// Struct with named fields.
    Record(Vec<FieldDecl>),
    /// Tuple struct with exactly one field; serializes as the inner value.
    Newtype(TypeExpr),
    /// Unit structs and multi-field tuple structs.
    Opaque,
    Enum(EnumDecl),
    /// `type Name = Target;`
    Alias(TypeExpr),
}

/// A named struct field.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeExpr,
    pub docs: Vec<DocLine>,
    pub serde: SerdeField,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub variants: Vec<VariantDecl>,
    pub integer_repr: bool,
}

impl EnumDecl {
    /// Every variant is a unit variant.
    pub fn is_fieldless(&self) -> bool {
        self.variants.iter().all(|v| v.unit)
    }
}

#[derive(Debug, Clone)]
pub struct VariantDecl {
    pub name: String,
    /// Serialized name after `rename` / `rename_all`.
    pub serialized: String,
    pub discriminant: Option<i64>,
    pub unit: bool,
    pub skip: bool,
}

/// An annotated handler candidate: any `fn` carrying doc comments.
#[derive(Debug, Clone)]
pub struct HandlerDecl {
    pub name: String,
    pub module_path: Vec<String>,
    pub docs: Vec<DocLine>,
    pub location: SourceLocation,
}

/// One `use` binding: `alias` refers to `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportDecl {
    Name { alias: String, target: Vec<String> },
    Glob { prefix: Vec<String> },
}
