//! Parsed Rust modules and the declarations the generator cares about.

pub mod decl;
pub mod docs;
pub mod serde_attrs;
pub mod types;

use std::path::{Component, Path, PathBuf};

use syn::ext::IdentExt;
use syn::{Expr, Fields, ImplItem, Item, Lit, UnOp, UseTree};

use crate::fault::{FaultKind, Faults, SourceLocation};

pub use decl::{
    EnumDecl, FieldDecl, HandlerDecl, ImportDecl, TypeBody, TypeDecl, VariantDecl, qualify,
};
pub use docs::DocLine;
pub use types::TypeExpr;

use serde_attrs::{apply_rename_all, container_attrs, field_attrs, has_integer_repr};

/// One parsed `.rs` file and everything extracted from it.
#[derive(Debug, Clone)]
pub struct SourceModule {
    pub file: PathBuf,
    pub module_path: Vec<String>,
    /// `//!` lines at the top of the file.
    pub inner_docs: Vec<DocLine>,
    pub types: Vec<TypeDecl>,
    pub handlers: Vec<HandlerDecl>,
    /// `use` bindings keyed by the module they appear in (inline modules included).
    pub imports: Vec<(Vec<String>, ImportDecl)>,
    /// Attributes that were present but could not be read.
    pub faults: Faults,
}

impl SourceModule {
    /// Parse source text; `module_path` is the crate-relative path of the file's module.
    pub fn parse(
        file: impl Into<PathBuf>,
        module_path: Vec<String>,
        text: &str,
    ) -> Result<Self, syn::Error> {
        let file = file.into();
        let syntax = syn::parse_file(text)?;
        let mut module = SourceModule {
            inner_docs: docs::inner_doc_lines(&syntax.attrs),
            file,
            module_path,
            types: Vec::new(),
            handlers: Vec::new(),
            imports: Vec::new(),
            faults: Faults::new(),
        };
        let root = module.module_path.clone();
        module.visit_items(&syntax.items, &root);
        log::debug!(
            "parsed {}: {} types, {} documented fns",
            module.file.display(),
            module.types.len(),
            module.handlers.len()
        );
        Ok(module)
    }

    /// Derive a module path from a file's location under a crate root.
    ///
    /// `src/handlers/pets.rs` becomes `handlers::pets`; `main.rs`, `lib.rs`
    /// and `mod.rs` name their parent directory.
    pub fn module_path_for(root: &Path, file: &Path) -> Vec<String> {
        let relative = file.strip_prefix(root).unwrap_or(file);
        let mut segments: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => part.to_str().map(str::to_string),
                _ => None,
            })
            .collect();
        if segments.first().map(String::as_str) == Some("src") {
            segments.remove(0);
        }
        if let Some(last) = segments.pop() {
            let stem = last.strip_suffix(".rs").unwrap_or(&last);
            if !matches!(stem, "main" | "lib" | "mod") {
                segments.push(stem.to_string());
            }
        }
        segments
    }

    /// Doc lines of the crate-root `fn main`, if documented.
    pub fn main_docs(&self) -> Option<&[DocLine]> {
        self.handlers
            .iter()
            .find(|h| h.name == "main" && h.module_path == self.module_path)
            .map(|h| h.docs.as_slice())
    }

    fn location(&self, line: usize) -> SourceLocation {
        SourceLocation::new(self.file.clone(), line)
    }

    fn visit_items(&mut self, items: &[Item], module_path: &[String]) {
        for item in items {
            match item {
                Item::Struct(s) => {
                    let decl = self.struct_decl(s, module_path);
                    self.types.push(decl);
                }
                Item::Enum(e) => {
                    let decl = self.enum_decl(e, module_path);
                    self.types.push(decl);
                }
                Item::Type(t) => {
                    self.types.push(TypeDecl {
                        name: t.ident.unraw().to_string(),
                        module_path: module_path.to_vec(),
                        generics: type_params(&t.generics),
                        docs: docs::outer_doc_lines(&t.attrs),
                        body: TypeBody::Alias(TypeExpr::from_syn(&t.ty)),
                        location: self.location(t.ident.span().start().line),
                    });
                }
                Item::Fn(f) => {
                    self.push_handler(&f.sig.ident, &f.attrs, module_path);
                }
                Item::Impl(block) => {
                    for impl_item in &block.items {
                        if let ImplItem::Fn(method) = impl_item {
                            self.push_handler(&method.sig.ident, &method.attrs, module_path);
                        }
                    }
                }
                Item::Mod(m) => {
                    if let Some((_, content)) = &m.content {
                        let mut nested = module_path.to_vec();
                        nested.push(m.ident.unraw().to_string());
                        self.visit_items(content, &nested);
                    }
                }
                Item::Use(u) => {
                    let mut found = Vec::new();
                    collect_use(&u.tree, &mut Vec::new(), &mut found);
                    for import in found {
                        let import = absolutize_import(import, module_path);
                        self.imports.push((module_path.to_vec(), import));
                    }
                }
                _ => {}
            }
        }
    }

    fn push_handler(&mut self, ident: &syn::Ident, attrs: &[syn::Attribute], module_path: &[String]) {
        let docs = docs::outer_doc_lines(attrs);
        if docs.is_empty() {
            return;
        }
        let line = docs.first().map(|d| d.line).unwrap_or_else(|| ident.span().start().line);
        self.handlers.push(HandlerDecl {
            name: ident.unraw().to_string(),
            module_path: module_path.to_vec(),
            docs,
            location: self.location(line),
        });
    }

    fn attribute_faults(&mut self, errors: Vec<syn::Error>) {
        for e in errors {
            let location = self.location(error_line(&e));
            self.faults.push(
                FaultKind::Source,
                Some(&location),
                format!("unreadable attribute: {e}"),
            );
        }
    }

    fn struct_decl(&mut self, s: &syn::ItemStruct, module_path: &[String]) -> TypeDecl {
        let mut errors = Vec::new();
        let container = container_attrs(&s.attrs, &mut errors);
        let body = match &s.fields {
            Fields::Named(named) => TypeBody::Record(
                named
                    .named
                    .iter()
                    .filter_map(|field| {
                        let name = field.ident.as_ref()?.unraw().to_string();
                        let mut serde = field_attrs(&field.attrs, &mut errors);
                        if serde.rename.is_none() {
                            if let Some(rule) = &container.rename_all {
                                serde.rename = Some(apply_rename_all(rule, &name));
                            }
                        }
                        Some(FieldDecl {
                            ty: TypeExpr::from_syn(&field.ty),
                            docs: docs::outer_doc_lines(&field.attrs),
                            name,
                            serde,
                        })
                    })
                    .collect(),
            ),
            Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
                TypeBody::Newtype(TypeExpr::from_syn(&unnamed.unnamed[0].ty))
            }
            _ => TypeBody::Opaque,
        };
        self.attribute_faults(errors);
        TypeDecl {
            name: s.ident.unraw().to_string(),
            module_path: module_path.to_vec(),
            generics: type_params(&s.generics),
            docs: docs::outer_doc_lines(&s.attrs),
            body,
            location: self.location(s.ident.span().start().line),
        }
    }

    fn enum_decl(&mut self, e: &syn::ItemEnum, module_path: &[String]) -> TypeDecl {
        let mut errors = Vec::new();
        let container = container_attrs(&e.attrs, &mut errors);
        let variants = e
            .variants
            .iter()
            .map(|v| {
                let name = v.ident.unraw().to_string();
                let serde = field_attrs(&v.attrs, &mut errors);
                let serialized = serde.rename.clone().unwrap_or_else(|| match &container.rename_all {
                    Some(rule) => apply_rename_all(rule, &name),
                    None => name.clone(),
                });
                VariantDecl {
                    serialized,
                    discriminant: v.discriminant.as_ref().and_then(|(_, expr)| discriminant(expr)),
                    unit: matches!(v.fields, Fields::Unit),
                    skip: serde.skip,
                    name,
                }
            })
            .collect();
        let integer_repr = has_integer_repr(&e.attrs, &mut errors);
        self.attribute_faults(errors);
        TypeDecl {
            name: e.ident.unraw().to_string(),
            module_path: module_path.to_vec(),
            generics: type_params(&e.generics),
            docs: docs::outer_doc_lines(&e.attrs),
            body: TypeBody::Enum(EnumDecl {
                variants,
                integer_repr,
            }),
            location: self.location(e.ident.span().start().line),
        }
    }
}

fn type_params(generics: &syn::Generics) -> Vec<String> {
    generics.type_params().map(|p| p.ident.to_string()).collect()
}

fn discriminant(expr: &Expr) -> Option<i64> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Int(int) => int.base10_parse().ok(),
            _ => None,
        },
        Expr::Unary(unary) if matches!(unary.op, UnOp::Neg(_)) => discriminant(&unary.expr).map(|v| -v),
        Expr::Paren(p) => discriminant(&p.expr),
        Expr::Group(g) => discriminant(&g.expr),
        _ => None,
    }
}

fn collect_use(tree: &UseTree, prefix: &mut Vec<String>, out: &mut Vec<ImportDecl>) {
    match tree {
        UseTree::Path(path) => {
            prefix.push(path.ident.to_string());
            collect_use(&path.tree, prefix, out);
            prefix.pop();
        }
        UseTree::Name(name) if name.ident == "self" => {
            if let Some(last) = prefix.last() {
                out.push(ImportDecl::Name {
                    alias: last.clone(),
                    target: prefix.clone(),
                });
            }
        }
        UseTree::Name(name) => {
            let mut target = prefix.clone();
            target.push(name.ident.to_string());
            out.push(ImportDecl::Name {
                alias: name.ident.to_string(),
                target,
            });
        }
        UseTree::Rename(rename) => {
            let mut target = prefix.clone();
            target.push(rename.ident.to_string());
            out.push(ImportDecl::Name {
                alias: rename.rename.to_string(),
                target,
            });
        }
        UseTree::Glob(_) => out.push(ImportDecl::Glob {
            prefix: prefix.clone(),
        }),
        UseTree::Group(group) => {
            for item in &group.items {
                collect_use(item, prefix, out);
            }
        }
    }
}

fn absolutize_import(import: ImportDecl, module_path: &[String]) -> ImportDecl {
    match import {
        ImportDecl::Name { alias, target } => ImportDecl::Name {
            alias,
            target: absolutize(&target, module_path),
        },
        ImportDecl::Glob { prefix } => ImportDecl::Glob {
            prefix: absolutize(&prefix, module_path),
        },
    }
}

/// Line a parse error points at.
pub fn error_line(error: &syn::Error) -> usize {
    error.span().start().line
}

/// Rewrite `crate::`, `self::` and `super::` prefixes into a crate-relative path.
pub fn absolutize(path: &[String], module_path: &[String]) -> Vec<String> {
    let Some(first) = path.first() else {
        return Vec::new();
    };
    let (mut out, mut rest) = match first.as_str() {
        "crate" => (Vec::new(), &path[1..]),
        "self" => (module_path.to_vec(), &path[1..]),
        "super" => (module_path.to_vec(), path),
        _ => return path.to_vec(),
    };
    while rest.first().map(String::as_str) == Some("super") {
        out.pop();
        rest = &rest[1..];
    }
    out.extend(rest.iter().cloned());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_module_path_for() {
        let root = Path::new("/proj");
        assert_eq!(
            SourceModule::module_path_for(root, Path::new("/proj/src/handlers/pets.rs")),
            strings(&["handlers", "pets"])
        );
        assert_eq!(
            SourceModule::module_path_for(root, Path::new("/proj/src/models/mod.rs")),
            strings(&["models"])
        );
        assert!(SourceModule::module_path_for(root, Path::new("/proj/src/main.rs")).is_empty());
    }

    #[test]
    fn test_unreadable_serde_attribute_is_a_fault() {
        let src = "pub struct Pet {\n    #[serde(rename = )]\n    pub id: u64,\n}\n";
        let module = SourceModule::parse("src/models.rs", strings(&["models"]), src).unwrap();
        assert_eq!(module.types.len(), 1);
        let faults: Vec<_> = module.faults.of_kind(FaultKind::Source).collect();
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].location.as_ref().map(|l| l.line), Some(2));
    }

    #[test]
    fn test_absolutize() {
        let here = strings(&["handlers", "pets"]);
        assert_eq!(
            absolutize(&strings(&["crate", "models", "Pet"]), &here),
            strings(&["models", "Pet"])
        );
        assert_eq!(
            absolutize(&strings(&["super", "super", "models", "Pet"]), &here),
            strings(&["models", "Pet"])
        );
        assert_eq!(
            absolutize(&strings(&["chrono", "DateTime"]), &here),
            strings(&["chrono", "DateTime"])
        );
    }

    #[test]
    fn test_parse_collects_declarations() {
        let src = r#"
use crate::models::{Pet, Owner as PetOwner};
use super::shared::*;

/// A tag.
#[serde(rename_all = "camelCase")]
pub struct Tag<T> {
    pub tag_name: String,
    #[serde(rename = "v")]
    pub value: T,
}

pub struct Id(u64);

#[repr(u8)]
pub enum Level { Low = 1, High = 5 }

pub type Tags = Vec<Tag<String>>;

/// @Router /pets [get]
pub async fn list_pets() {}

pub struct Api;
impl Api {
    /// @Router /pets/{id} [get]
    pub fn get_pet(&self) {}
}

mod nested {
    pub struct Inner;
}
"#;
        let module = SourceModule::parse("src/handlers.rs", strings(&["handlers"]), src).unwrap();
        let names: Vec<_> = module.types.iter().map(|t| t.qualified_name()).collect();
        assert_eq!(
            names,
            vec![
                "handlers::Tag",
                "handlers::Id",
                "handlers::Level",
                "handlers::Tags",
                "handlers::nested::Inner"
            ]
        );
        let TypeBody::Record(fields) = &module.types[0].body else {
            panic!("expected record");
        };
        assert_eq!(fields[0].serde.rename.as_deref(), Some("tagName"));
        assert_eq!(fields[1].serde.rename.as_deref(), Some("v"));
        assert_eq!(module.types[0].generics, strings(&["T"]));
        assert!(matches!(module.types[1].body, TypeBody::Newtype(_)));
        let TypeBody::Enum(level) = &module.types[2].body else {
            panic!("expected enum");
        };
        assert!(level.integer_repr);
        assert_eq!(level.variants[1].discriminant, Some(5));

        let handlers: Vec<_> = module.handlers.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(handlers, vec!["list_pets", "get_pet"]);
        assert_eq!(module.handlers[0].location.line, 20);

        assert!(module.imports.contains(&(
            strings(&["handlers"]),
            ImportDecl::Name {
                alias: "PetOwner".to_string(),
                target: strings(&["models", "Owner"]),
            }
        )));
        assert!(module.imports.contains(&(
            strings(&["handlers"]),
            ImportDecl::Glob {
                prefix: strings(&["shared"]),
            }
        )));
    }
}
