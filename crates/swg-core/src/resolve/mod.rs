//! Type resolution: turns type expressions into schema nodes.
//!
//! Every declared type that resolves to a named schema is placed in the
//! definitions table exactly once and referenced everywhere else. A type is
//! marked in progress before its body is resolved, so self- and
//! mutually-referential declarations produce references instead of unbounded
//! recursion.

pub(crate) mod primitives;

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::Value;

use crate::catalog::{Catalog, Lookup, TypeId};
use crate::directive::{self, Directive, DocBlock, Tag, split_list};
use crate::fault::{FaultKind, Faults, SourceLocation};
use crate::operation::{BodyKind, Operation, ResponseBody};
use crate::schema::{Primitive, Property, SchemaNode};
use crate::source::{EnumDecl, FieldDecl, TypeBody, TypeDecl, TypeExpr};

pub use primitives::builtin;

/// Where a type expression is being resolved from.
struct Scope<'s> {
    module: &'s [String],
    /// Generic parameters bound to already-resolved arguments.
    bindings: &'s HashMap<String, SchemaNode>,
    location: Option<&'s SourceLocation>,
}

/// Resolver for one generation run.
///
/// The catalog must be fully populated before the resolver is created.
pub struct Resolver<'c> {
    catalog: &'c Catalog,
    definitions: BTreeMap<String, SchemaNode>,
    in_progress: HashSet<String>,
    /// Synthesized names of generic instantiations, keyed by template and argument labels.
    instantiations: HashMap<(TypeId, Vec<String>), String>,
    faults: Faults,
}

impl<'c> Resolver<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            definitions: BTreeMap::new(),
            in_progress: HashSet::new(),
            instantiations: HashMap::new(),
            faults: Faults::new(),
        }
    }

    /// Resolve a type written in `module`.
    pub fn resolve_type(
        &mut self,
        ty: &TypeExpr,
        module: &[String],
        location: Option<&SourceLocation>,
    ) -> SchemaNode {
        let bindings = HashMap::new();
        let scope = Scope {
            module,
            bindings: &bindings,
            location,
        };
        self.resolve(ty, &scope)
    }

    /// Fill in the schemas of an operation's parameters and responses.
    pub fn resolve_operation(&mut self, op: &mut Operation) {
        let file = op.location.file.clone();
        for param in &mut op.parameters {
            let location = SourceLocation::new(file.clone(), param.line);
            param.schema = Some(self.resolve_type(&param.ty, &op.module_path, Some(&location)));
        }
        for response in op.responses.values_mut() {
            if let Some(body) = &response.body {
                let location = SourceLocation::new(file.clone(), response.line);
                response.schema = Some(self.body_schema(body, &op.module_path, &location));
            }
        }
    }

    fn body_schema(
        &mut self,
        body: &ResponseBody,
        module: &[String],
        location: &SourceLocation,
    ) -> SchemaNode {
        let inner = body
            .ty
            .as_ref()
            .map(|ty| self.resolve_type(ty, module, Some(location)));
        match body.kind {
            BodyKind::Array => SchemaNode::array(inner.unwrap_or_else(SchemaNode::object)),
            BodyKind::Object => inner.unwrap_or_else(SchemaNode::object),
            kind => inner.unwrap_or_else(|| match kind.primitive() {
                Some(primitive) => SchemaNode::primitive(primitive, None),
                None => SchemaNode::object(),
            }),
        }
    }

    pub fn definitions(&self) -> &BTreeMap<String, SchemaNode> {
        &self.definitions
    }

    pub fn faults(&self) -> &Faults {
        &self.faults
    }

    pub fn into_parts(self) -> (BTreeMap<String, SchemaNode>, Faults) {
        (self.definitions, self.faults)
    }

    fn resolve(&mut self, ty: &TypeExpr, scope: &Scope<'_>) -> SchemaNode {
        match ty {
            TypeExpr::Path { segments, args } => self.resolve_path(segments, args, scope),
            TypeExpr::Array(inner) => SchemaNode::array(self.resolve(inner, scope)),
            TypeExpr::Tuple(items) if items.is_empty() => SchemaNode::object(),
            TypeExpr::Tuple(_) => SchemaNode::array(SchemaNode::object()),
            TypeExpr::Opaque(text) => {
                log::debug!("`{text}` has no schema counterpart, using object");
                SchemaNode::object()
            }
        }
    }

    fn resolve_path(
        &mut self,
        segments: &[String],
        args: &[TypeExpr],
        scope: &Scope<'_>,
    ) -> SchemaNode {
        let Some(name) = segments.last() else {
            return SchemaNode::object();
        };
        if segments.len() == 1 {
            if let Some(bound) = scope.bindings.get(name) {
                return bound.clone();
            }
        }
        if let Some(node) = primitives::primitive(name) {
            return node;
        }
        match args {
            [inner] if primitives::is_transparent(name) => return self.resolve(inner, scope),
            [item] if primitives::is_sequence(name) => {
                return SchemaNode::array(self.resolve(item, scope));
            }
            [_, value] if primitives::is_map(name) => {
                return SchemaNode::map(self.resolve(value, scope));
            }
            _ => {}
        }

        let written = segments.join("::");
        match self.catalog.lookup(segments, scope.module) {
            Lookup::Found(id) => self.resolve_declared(id, args, scope),
            Lookup::Ambiguous { chosen, candidates } => {
                self.faults.push(
                    FaultKind::Resolution,
                    scope.location,
                    format!(
                        "`{written}` is ambiguous between {}; using {}",
                        candidates.join(", "),
                        candidates[0]
                    ),
                );
                self.resolve_declared(chosen, args, scope)
            }
            Lookup::NotFound => {
                if let Some(node) = primitives::well_known(name) {
                    return node;
                }
                self.faults.push(
                    FaultKind::Resolution,
                    scope.location,
                    format!("cannot resolve type `{written}`, emitted as object"),
                );
                SchemaNode::object()
            }
        }
    }

    fn resolve_declared(&mut self, id: TypeId, args: &[TypeExpr], scope: &Scope<'_>) -> SchemaNode {
        let catalog = self.catalog;
        let decl = catalog.get(id);
        let arg_nodes: Vec<SchemaNode> = args.iter().map(|a| self.resolve(a, scope)).collect();
        let bindings: HashMap<String, SchemaNode> = decl
            .generics
            .iter()
            .enumerate()
            .map(|(i, param)| {
                let bound = arg_nodes.get(i).cloned().unwrap_or_else(SchemaNode::object);
                (param.clone(), bound)
            })
            .collect();
        let block = directive::tokenize(&decl.docs);

        if let TypeBody::Alias(target) = &decl.body {
            if !block.has(Tag::Enum) {
                return self.resolve_alias(decl, target, &bindings);
            }
        }

        let name = self.instance_name(id, &arg_nodes);
        if self.definitions.contains_key(&name) || self.in_progress.contains(&name) {
            return SchemaNode::reference(name);
        }

        self.in_progress.insert(name.clone());
        let mut node = self.build(decl, &block, &bindings);
        node.name = Some(name.clone());
        self.in_progress.remove(&name);
        self.definitions.insert(name.clone(), node);
        SchemaNode::reference(name)
    }

    /// Plain aliases resolve to their target and get no definition of their own.
    fn resolve_alias(
        &mut self,
        decl: &TypeDecl,
        target: &TypeExpr,
        bindings: &HashMap<String, SchemaNode>,
    ) -> SchemaNode {
        let key = format!("type {}", decl.qualified_name());
        if !self.in_progress.insert(key.clone()) {
            self.faults.push(
                FaultKind::Resolution,
                Some(&decl.location),
                format!("type alias `{}` refers to itself", decl.name),
            );
            return SchemaNode::object();
        }
        let scope = Scope {
            module: &decl.module_path,
            bindings,
            location: Some(&decl.location),
        };
        let node = self.resolve(target, &scope);
        self.in_progress.remove(&key);
        node
    }

    /// Definition name of a declaration, with argument labels for generic instantiations.
    fn instance_name(&mut self, id: TypeId, arg_nodes: &[SchemaNode]) -> String {
        let generics = self.catalog.get(id).generics.len();
        let base = self.catalog.definition_name(id);
        if generics == 0 {
            return base;
        }
        let labels: Vec<String> = (0..generics)
            .map(|i| {
                arg_nodes
                    .get(i)
                    .map(SchemaNode::label)
                    .unwrap_or_else(|| "object".to_string())
            })
            .collect();
        self.instantiations
            .entry((id, labels))
            .or_insert_with_key(|(_, labels)| format!("{base}-{}", labels.join("-")))
            .clone()
    }

    fn build(
        &mut self,
        decl: &TypeDecl,
        block: &DocBlock,
        bindings: &HashMap<String, SchemaNode>,
    ) -> SchemaNode {
        let scope = Scope {
            module: &decl.module_path,
            bindings,
            location: Some(&decl.location),
        };
        let enum_directive = block.directives().find(|d| d.tag == Tag::Enum);
        let mut node = match (enum_directive, &decl.body) {
            (Some(d), TypeBody::Newtype(target) | TypeBody::Alias(target)) => {
                let target = self.resolve(target, &scope);
                enum_values(d, Some(&target))
            }
            (Some(d), _) => enum_values(d, None),
            (None, TypeBody::Record(fields)) => self.record(decl, fields, &scope),
            (None, TypeBody::Newtype(inner) | TypeBody::Alias(inner)) => self.resolve(inner, &scope),
            (None, TypeBody::Opaque) => SchemaNode::object(),
            (None, TypeBody::Enum(e)) => enum_schema(e),
        };
        if node.description.is_none() {
            node.description = block.text();
        }
        if let Some(d) = block.directives().find(|d| d.tag == Tag::Example) {
            node.example = Some(example_value(&d.flat_args(), node.primitive_type()));
        }
        node
    }

    fn record(&mut self, decl: &TypeDecl, fields: &[FieldDecl], scope: &Scope<'_>) -> SchemaNode {
        let mut node = SchemaNode::object();
        for field in fields {
            let block = directive::tokenize(&field.docs);
            if field.serde.skip || block.has(Tag::Ignore) {
                continue;
            }
            if field.serde.flatten {
                self.flatten_into(&mut node, decl, field, scope);
                continue;
            }

            let mut schema = self.resolve(&field.ty, scope);
            for d in block.directives() {
                match d.tag {
                    Tag::Format => schema.format = Some(d.flat_args()).filter(|f| !f.is_empty()),
                    Tag::Example => {
                        schema.example = Some(example_value(&d.flat_args(), schema.primitive_type()));
                    }
                    Tag::Enum => {
                        let format = schema.format.take();
                        schema = enum_values(d, Some(&schema));
                        schema.format = format;
                    }
                    _ => {}
                }
            }

            let rename = block
                .directives()
                .find(|d| d.tag == Tag::Rename)
                .and_then(|d| d.args().next_token())
                .map(|t| t.text)
                .or_else(|| field.serde.rename.clone());
            let required =
                block.has(Tag::Required) || (!field.ty.is_option() && !field.serde.optional);
            if required && !node.required.contains(&field.name) {
                node.required.push(field.name.clone());
            }
            upsert_property(
                &mut node,
                Property {
                    declared: field.name.clone(),
                    rename,
                    description: block.text(),
                    schema,
                },
            );
        }
        node
    }

    /// Merge the properties of a `#[serde(flatten)]` field into its parent.
    fn flatten_into(
        &mut self,
        node: &mut SchemaNode,
        decl: &TypeDecl,
        field: &FieldDecl,
        scope: &Scope<'_>,
    ) {
        let optional = field.ty.is_option();
        let flattened = self.resolve(&field.ty, scope);
        let source = match flattened.reference_name() {
            Some(name) => match self.definitions.get(name) {
                Some(definition) => definition.clone(),
                None => {
                    self.faults.push(
                        FaultKind::Resolution,
                        Some(&decl.location),
                        format!(
                            "cannot flatten `{name}` into `{}` while `{name}` is still being resolved",
                            decl.name
                        ),
                    );
                    return;
                }
            },
            None => flattened,
        };
        for property in source.properties {
            if !optional
                && source.required.contains(&property.declared)
                && !node.required.contains(&property.declared)
            {
                node.required.push(property.declared.clone());
            }
            upsert_property(node, property);
        }
    }
}

fn upsert_property(node: &mut SchemaNode, property: Property) {
    match node
        .properties
        .iter_mut()
        .find(|p| p.declared == property.declared)
    {
        Some(existing) => *existing = property,
        None => node.properties.push(property),
    }
}

/// `@enum a,b,c`, typed after the primitive of `target` (string by default).
fn enum_values(d: &Directive, target: Option<&SchemaNode>) -> SchemaNode {
    let primitive = target
        .and_then(SchemaNode::primitive_type)
        .unwrap_or(Primitive::String);
    let values = split_list(&d.flat_args())
        .iter()
        .map(|v| primitive.literal(v))
        .collect();
    let mut node = SchemaNode::enumeration(primitive, values);
    node.format = target.and_then(|t| t.format.clone());
    node
}

fn enum_schema(decl: &EnumDecl) -> SchemaNode {
    if !decl.is_fieldless() {
        return SchemaNode::object();
    }
    if decl.integer_repr {
        let mut next = 0i64;
        let mut values = Vec::new();
        for variant in &decl.variants {
            let value = variant.discriminant.unwrap_or(next);
            next = value.saturating_add(1);
            if !variant.skip {
                values.push(Value::from(value));
            }
        }
        return SchemaNode::enumeration(Primitive::Integer, values);
    }
    let values = decl
        .variants
        .iter()
        .filter(|v| !v.skip)
        .map(|v| Value::String(v.serialized.clone()))
        .collect();
    SchemaNode::enumeration(Primitive::String, values)
}

fn example_value(text: &str, primitive: Option<Primitive>) -> Value {
    let text = text.trim();
    match primitive {
        Some(Primitive::String) => {
            let unquoted = text
                .strip_prefix('"')
                .and_then(|t| t.strip_suffix('"'))
                .unwrap_or(text);
            Value::String(unquoted.to_string())
        }
        Some(primitive) => primitive.literal(text),
        None => serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaKind;
    use crate::source::SourceModule;

    const MODELS: &str = r#"
/// A pet.
pub struct Pet {
    pub id: u64,
    /// Display name.
    pub name: String,
    pub owner: Option<Box<Owner>>,
    pub tags: Vec<Tag>,
    #[serde(skip)]
    pub secret: String,
    /// @ignore
    pub internal: u8,
    #[serde(default)]
    pub nickname: String,
    /// @rename kind
    /// @example 3
    pub category: i32,
}

pub struct Owner {
    pub pets: Vec<Pet>,
    pub best_friend: Option<Box<Owner>>,
}

pub struct Tag {
    #[serde(rename = "label")]
    pub name: String,
}

pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[serde(rename_all = "snake_case")]
pub enum Status {
    Available,
    OnHold,
    #[serde(skip)]
    Hidden,
}

#[repr(u8)]
pub enum Level {
    Low = 1,
    Mid,
    High = 10,
}

/// @enum red,green
pub type Color = String;

/// @enum 1,2,3
pub struct Rank(u8);

pub enum Shape {
    Circle { r: f64 },
    Square(f64),
}

pub type PetList = Vec<Pet>;

pub struct Audit {
    pub created_by: String,
    pub note: Option<String>,
}

pub struct Entry {
    pub id: u64,
    #[serde(flatten)]
    pub audit: Audit,
}

pub struct Node {
    #[serde(flatten)]
    pub inner: Box<Node>,
}
"#;

    fn catalog() -> Catalog {
        let module =
            SourceModule::parse("src/models.rs", vec!["models".to_string()], MODELS).unwrap();
        let mut catalog = Catalog::new();
        catalog.add_module(&module);
        catalog
    }

    fn resolve(resolver: &mut Resolver<'_>, text: &str) -> SchemaNode {
        let ty = TypeExpr::parse(text).unwrap();
        resolver.resolve_type(&ty, &["models".to_string()], None)
    }

    fn declared(node: &SchemaNode) -> Vec<&str> {
        node.properties.iter().map(|p| p.declared.as_str()).collect()
    }

    #[test]
    fn test_record_fields_and_overrides() {
        let catalog = catalog();
        let mut resolver = Resolver::new(&catalog);
        assert_eq!(resolve(&mut resolver, "Pet"), SchemaNode::reference("Pet"));

        let pet = &resolver.definitions()["Pet"];
        assert_eq!(pet.description.as_deref(), Some("A pet."));
        assert_eq!(
            declared(pet),
            vec!["id", "name", "owner", "tags", "nickname", "category"]
        );
        assert_eq!(pet.required, vec!["id", "name", "tags", "category"]);

        let name = pet.property("name").unwrap();
        assert_eq!(name.description.as_deref(), Some("Display name."));
        let category = pet.property("category").unwrap();
        assert_eq!(category.rename.as_deref(), Some("kind"));
        assert_eq!(category.schema.example, Some(Value::from(3)));
        assert_eq!(
            pet.property("owner").unwrap().schema,
            SchemaNode::reference("Owner")
        );

        let tag = &resolver.definitions()["Tag"];
        assert_eq!(tag.property("name").unwrap().rename.as_deref(), Some("label"));
        assert!(resolver.faults().is_empty());
    }

    #[test]
    fn test_cycles_resolve_to_references() {
        let catalog = catalog();
        let mut resolver = Resolver::new(&catalog);
        resolve(&mut resolver, "Owner");

        let names: Vec<&str> = resolver.definitions().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Owner", "Pet", "Tag"]);

        let owner = &resolver.definitions()["Owner"];
        assert_eq!(
            owner.property("pets").unwrap().schema,
            SchemaNode::array(SchemaNode::reference("Pet"))
        );
        assert_eq!(
            owner.property("best_friend").unwrap().schema,
            SchemaNode::reference("Owner")
        );
    }

    #[test]
    fn test_generic_instantiations_are_memoized() {
        let catalog = catalog();
        let mut resolver = Resolver::new(&catalog);
        let first = resolve(&mut resolver, "Page<Pet>");
        let count = resolver.definitions().len();
        let second = resolve(&mut resolver, "Page<Pet>");
        assert_eq!(first, second);
        assert_eq!(first, SchemaNode::reference("Page-Pet"));
        assert_eq!(resolver.definitions().len(), count);

        assert_eq!(
            resolve(&mut resolver, "Page<String>"),
            SchemaNode::reference("Page-string")
        );
        let page = &resolver.definitions()["Page-Pet"];
        assert_eq!(
            page.property("items").unwrap().schema,
            SchemaNode::array(SchemaNode::reference("Pet"))
        );
    }

    #[test]
    fn test_containers() {
        let catalog = catalog();
        let mut resolver = Resolver::new(&catalog);
        assert_eq!(
            resolve(&mut resolver, "HashMap<String, Vec<i32>>"),
            SchemaNode::map(SchemaNode::array(SchemaNode::primitive(
                Primitive::Integer,
                Some("int32")
            )))
        );
        assert_eq!(
            resolve(&mut resolver, "PetList"),
            SchemaNode::array(SchemaNode::reference("Pet"))
        );
        assert!(!resolver.definitions().contains_key("PetList"));
    }

    #[test]
    fn test_enums() {
        let catalog = catalog();
        let mut resolver = Resolver::new(&catalog);
        for ty in ["Status", "Level", "Color", "Rank", "Shape"] {
            resolve(&mut resolver, ty);
        }
        let defs = resolver.definitions();

        assert_eq!(defs["Status"].kind, SchemaKind::Enum(Primitive::String));
        assert_eq!(
            defs["Status"].enum_values,
            vec![Value::from("available"), Value::from("on_hold")]
        );
        assert_eq!(defs["Level"].kind, SchemaKind::Enum(Primitive::Integer));
        assert_eq!(
            defs["Level"].enum_values,
            vec![Value::from(1), Value::from(2), Value::from(10)]
        );
        assert_eq!(
            defs["Color"].enum_values,
            vec![Value::from("red"), Value::from("green")]
        );
        assert_eq!(defs["Rank"].kind, SchemaKind::Enum(Primitive::Integer));
        assert_eq!(defs["Rank"].format.as_deref(), Some("int32"));
        assert_eq!(defs["Rank"].enum_values[2], Value::from(3));
        assert_eq!(defs["Shape"].kind, SchemaKind::Object);
    }

    #[test]
    fn test_flatten_merges_properties() {
        let catalog = catalog();
        let mut resolver = Resolver::new(&catalog);
        resolve(&mut resolver, "Entry");
        let entry = &resolver.definitions()["Entry"];
        assert_eq!(declared(entry), vec!["id", "created_by", "note"]);
        assert_eq!(entry.required, vec!["id", "created_by"]);
    }

    #[test]
    fn test_flatten_of_type_in_progress_is_a_fault() {
        let catalog = catalog();
        let mut resolver = Resolver::new(&catalog);
        resolve(&mut resolver, "Node");
        assert_eq!(resolver.faults().of_kind(FaultKind::Resolution).count(), 1);
        assert!(resolver.definitions()["Node"].properties.is_empty());
    }

    #[test]
    fn test_unknown_type_degrades_to_object() {
        let catalog = catalog();
        let mut resolver = Resolver::new(&catalog);
        let location = SourceLocation::new("src/handlers.rs", 7);
        let node = resolver.resolve_type(
            &TypeExpr::named("external::Thing"),
            &[],
            Some(&location),
        );
        assert_eq!(node, SchemaNode::object());
        let (definitions, faults) = resolver.into_parts();
        assert!(definitions.is_empty());
        let fault = faults.iter().next().unwrap();
        assert_eq!(fault.kind, FaultKind::Resolution);
        assert_eq!(fault.location, Some(location));
    }

    fn catalog_of(source: &str) -> Catalog {
        let module =
            SourceModule::parse("src/models.rs", vec!["models".to_string()], source).unwrap();
        let mut catalog = Catalog::new();
        catalog.add_module(&module);
        catalog
    }

    #[test]
    fn test_declared_types_shadow_well_known_names() {
        let catalog = catalog_of(
            "pub struct Value { pub x: u8 }\npub struct Url { pub host: String }\n",
        );
        let mut resolver = Resolver::new(&catalog);
        assert_eq!(resolve(&mut resolver, "Value"), SchemaNode::reference("Value"));
        assert_eq!(resolve(&mut resolver, "models::Url"), SchemaNode::reference("Url"));

        let uuid = resolve(&mut resolver, "uuid::Uuid");
        assert_eq!(uuid.primitive_type(), Some(Primitive::String));
        assert_eq!(uuid.format.as_deref(), Some("uuid"));

        let (definitions, faults) = resolver.into_parts();
        let names: Vec<&str> = definitions.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Url", "Value"]);
        assert!(faults.is_empty(), "{faults:?}");
    }

    #[test]
    fn test_discriminant_at_integer_limit() {
        let catalog = catalog_of(
            "#[repr(i64)]\npub enum Big {\n    A = 9223372036854775806,\n    B,\n}\n\n#[repr(i64)]\npub enum Top {\n    A = 9223372036854775807,\n}\n",
        );
        let mut resolver = Resolver::new(&catalog);
        resolve(&mut resolver, "Big");
        resolve(&mut resolver, "Top");
        let defs = resolver.definitions();
        assert_eq!(
            defs["Big"].enum_values,
            vec![Value::from(i64::MAX - 1), Value::from(i64::MAX)]
        );
        assert_eq!(defs["Top"].enum_values, vec![Value::from(i64::MAX)]);
    }
}
