//! Merges general info, operations and resolved schemas into one document.
//!
//! The naming strategy is applied here and nowhere earlier. Assembly is a
//! pure function of its inputs.

mod naming;

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;

use crate::config::NamingStrategy;
use crate::fault::{FaultKind, Faults};
use crate::general::GeneralInfo;
use crate::operation::{Operation, ParamLocation, ParameterSpec, ResponseSpec};
use crate::schema::{Primitive, Property, SchemaKind, SchemaNode};
use crate::spec::{self, Header, Parameter, PathItem, Response, Schema, Swagger};

/// Build the document.
///
/// Operations are registered in order; when two claim the same (path,
/// method) the later one wins and a duplicate fault is recorded. Only
/// definitions reachable from a registered operation are emitted.
pub fn assemble(
    general: &GeneralInfo,
    operations: &[Operation],
    definitions: &BTreeMap<String, SchemaNode>,
    naming: NamingStrategy,
) -> (Swagger, Faults) {
    let mut assembler = Assembler {
        definitions,
        naming,
        faults: Faults::new(),
    };

    let mut paths: BTreeMap<String, PathItem> = BTreeMap::new();
    for op in operations {
        let converted = assembler.operation(op);
        for route in &op.routes {
            let item = paths.entry(route.path.clone()).or_default();
            if let Some(previous) = item.set(route.method, converted.clone()) {
                assembler.faults.push(
                    FaultKind::Duplicate,
                    Some(&op.location),
                    format!(
                        "{} {} is already registered by `{}`; `{}` replaces it",
                        route.method.as_str().to_ascii_uppercase(),
                        route.path,
                        previous.operation_id,
                        op.id
                    ),
                );
            }
        }
    }

    let definitions = assembler.reachable_definitions(&paths);
    let swagger = Swagger {
        schemes: general.schemes.clone(),
        swagger: spec::SWAGGER_VERSION.to_string(),
        info: general.info.clone(),
        host: general.host.clone(),
        base_path: general.base_path.clone(),
        consumes: general.consumes.clone(),
        produces: general.produces.clone(),
        paths,
        definitions,
        security_definitions: general.security_definitions.clone(),
        tags: general.tags.clone(),
    };
    (swagger, assembler.faults)
}

struct Assembler<'a> {
    definitions: &'a BTreeMap<String, SchemaNode>,
    naming: NamingStrategy,
    faults: Faults,
}

impl Assembler<'_> {
    fn operation(&mut self, op: &Operation) -> spec::Operation {
        let parameters = op
            .parameters
            .iter()
            .map(|param| self.parameter(op, param))
            .collect();
        let responses = op
            .responses
            .iter()
            .map(|(code, response)| (code.clone(), self.response(code, response)))
            .collect();
        spec::Operation {
            description: op.description.clone(),
            consumes: op.consumes.clone(),
            produces: op.produces.clone(),
            tags: op.tags.clone(),
            summary: op.summary.clone(),
            operation_id: op.id.clone(),
            parameters,
            responses,
            security: op.security.clone(),
            deprecated: op.deprecated,
        }
    }

    fn parameter(&mut self, op: &Operation, param: &ParameterSpec) -> Parameter {
        let attributes = &param.attributes;
        let mut out = Parameter {
            param_type: None,
            format: None,
            items: None,
            default: None,
            enum_values: Vec::new(),
            minimum: None,
            maximum: None,
            min_length: attributes.min_length,
            max_length: attributes.max_length,
            description: param.description.clone(),
            name: param.name.clone(),
            location: param.location.as_str().to_string(),
            required: param.required,
            schema: None,
        };
        let node = param.schema.clone().unwrap_or_else(SchemaNode::object);
        if param.location == ParamLocation::Body {
            out.schema = Some(self.schema(&node));
            return out;
        }

        let node = self.inline_simple(&node);
        let value_type = match &node.kind {
            SchemaKind::Primitive(p) | SchemaKind::Enum(p) => {
                out.param_type = Some(p.as_str().to_string());
                out.format = node.format.clone();
                out.enum_values = node.enum_values.clone();
                *p
            }
            SchemaKind::Array(items) => {
                let items = self.inline_simple(items);
                match items.primitive_type() {
                    Some(p) => {
                        out.param_type = Some("array".to_string());
                        out.items = Some(Box::new(self.schema(&items)));
                        p
                    }
                    None => self.non_primitive(op, param, &mut out),
                }
            }
            _ => self.non_primitive(op, param, &mut out),
        };

        if let Some(default) = &attributes.default {
            out.default = Some(value_type.literal(default));
        }
        if !attributes.enums.is_empty() {
            let values = attributes.enums.iter().map(|v| value_type.literal(v)).collect();
            match out.items.as_mut() {
                Some(items) => items.enum_values = values,
                None => out.enum_values = values,
            }
        }
        let numeric = if value_type == Primitive::Integer {
            Primitive::Integer
        } else {
            Primitive::Number
        };
        for (key, raw, slot) in [
            ("minimum", &attributes.minimum, &mut out.minimum),
            ("maximum", &attributes.maximum, &mut out.maximum),
        ] {
            let Some(raw) = raw else { continue };
            let value = numeric.literal(raw);
            if value.is_number() {
                *slot = Some(value);
            } else {
                self.faults.push(
                    FaultKind::Directive,
                    Some(&op.location_at(param.line)),
                    format!("{key}({raw}) on parameter `{}` is not a number", param.name),
                );
            }
        }
        if let Some(format) = &attributes.format {
            out.format = Some(format.clone());
        }
        out
    }

    /// Non-body parameters must be primitives; anything else degrades to a string.
    fn non_primitive(&mut self, op: &Operation, param: &ParameterSpec, out: &mut Parameter) -> Primitive {
        self.faults.push(
            FaultKind::Directive,
            Some(&op.location_at(param.line)),
            format!(
                "{} parameter `{}` of type `{}` is not a primitive; emitted as string",
                param.location.as_str(),
                param.name,
                param.ty
            ),
        );
        out.param_type = Some(Primitive::String.as_str().to_string());
        Primitive::String
    }

    /// Replace a reference to a primitive or enum definition by the definition itself.
    fn inline_simple(&self, node: &SchemaNode) -> SchemaNode {
        if let Some(target) = node.reference_name().and_then(|name| self.definitions.get(name)) {
            if matches!(target.kind, SchemaKind::Primitive(_) | SchemaKind::Enum(_)) {
                return target.clone();
            }
        }
        node.clone()
    }

    fn response(&self, code: &str, response: &ResponseSpec) -> Response {
        let headers: IndexMap<String, Header> = response
            .headers
            .iter()
            .map(|h| {
                let header = Header {
                    header_type: h.kind.as_str().to_string(),
                    description: h.description.clone(),
                };
                (h.name.clone(), header)
            })
            .collect();
        Response {
            description: response
                .description
                .clone()
                .unwrap_or_else(|| reason_phrase(code).to_string()),
            schema: response.schema.as_ref().map(|node| self.schema(node)),
            headers,
        }
    }

    fn schema(&self, node: &SchemaNode) -> Schema {
        let mut schema = match &node.kind {
            SchemaKind::Reference(name) => return Schema::reference(name),
            SchemaKind::Primitive(p) => Schema::of_type(p.as_str()),
            SchemaKind::Enum(p) => Schema {
                enum_values: node.enum_values.clone(),
                ..Schema::of_type(p.as_str())
            },
            SchemaKind::Array(items) => Schema {
                items: Some(Box::new(self.schema(items))),
                ..Schema::of_type("array")
            },
            SchemaKind::Map(values) => Schema {
                additional_properties: Some(Box::new(self.schema(values))),
                ..Schema::of_type("object")
            },
            SchemaKind::Object => {
                let mut schema = Schema::of_type("object");
                for property in &node.properties {
                    schema
                        .properties
                        .insert(self.property_name(property), self.property_schema(property));
                }
                for declared in &node.required {
                    let name = match node.property(declared) {
                        Some(property) => self.property_name(property),
                        None => self.naming.apply(declared),
                    };
                    if !schema.required.contains(&name) {
                        schema.required.push(name);
                    }
                }
                schema
            }
        };
        schema.format = node.format.clone();
        schema.description = node.description.clone();
        schema.example = node.example.clone();
        schema
    }

    /// Explicit renames are emitted verbatim; everything else goes through the strategy.
    fn property_name(&self, property: &Property) -> String {
        match &property.rename {
            Some(rename) => rename.clone(),
            None => self.naming.apply(&property.declared),
        }
    }

    /// Record properties of a definition that serialize under the same name.
    ///
    /// The later property replaces the earlier one in the emitted schema.
    fn check_property_names(&mut self, definition: &str, node: &SchemaNode) {
        let mut claimed: IndexMap<String, &str> = IndexMap::new();
        for property in &node.properties {
            let name = self.property_name(property);
            if let Some(earlier) = claimed.insert(name.clone(), &property.declared) {
                self.faults.push(
                    FaultKind::Validation,
                    None,
                    format!(
                        "`{definition}`: fields `{earlier}` and `{}` both serialize as `{name}`; `{}` replaces it",
                        property.declared, property.declared
                    ),
                );
            }
        }
    }

    fn property_schema(&self, property: &Property) -> Schema {
        let mut schema = self.schema(&property.schema);
        if schema.reference.is_none() && property.description.is_some() {
            schema.description = property.description.clone();
        }
        schema
    }

    /// Convert every definition reachable from the registered operations.
    fn reachable_definitions(&mut self, paths: &BTreeMap<String, PathItem>) -> BTreeMap<String, Schema> {
        let mut pending: Vec<String> = Vec::new();
        for item in paths.values() {
            for (_, op) in item.operations() {
                for param in &op.parameters {
                    if let Some(schema) = &param.schema {
                        collect_refs(schema, &mut pending);
                    }
                    if let Some(items) = &param.items {
                        collect_refs(items, &mut pending);
                    }
                }
                for response in op.responses.values() {
                    if let Some(schema) = &response.schema {
                        collect_refs(schema, &mut pending);
                    }
                }
            }
        }

        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut out = BTreeMap::new();
        while let Some(name) = pending.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            let definitions = self.definitions;
            let Some(node) = definitions.get(&name) else {
                log::debug!("reference to unknown definition {name}");
                continue;
            };
            self.check_property_names(&name, node);
            let schema = self.schema(node);
            collect_refs(&schema, &mut pending);
            out.insert(name, schema);
        }
        let pruned = self.definitions.len().saturating_sub(out.len());
        if pruned > 0 {
            log::debug!("{pruned} definitions not referenced by any operation were dropped");
        }
        out
    }
}

fn collect_refs(schema: &Schema, out: &mut Vec<String>) {
    if let Some(name) = schema.definition_name() {
        out.push(name.to_string());
    }
    if let Some(items) = &schema.items {
        collect_refs(items, out);
    }
    if let Some(values) = &schema.additional_properties {
        collect_refs(values, out);
    }
    for property in schema.properties.values() {
        collect_refs(property, out);
    }
}

/// Default response description for a status code.
fn reason_phrase(code: &str) -> &'static str {
    match code {
        "200" => "OK",
        "201" => "Created",
        "202" => "Accepted",
        "204" => "No Content",
        "301" => "Moved Permanently",
        "302" => "Found",
        "304" => "Not Modified",
        "400" => "Bad Request",
        "401" => "Unauthorized",
        "403" => "Forbidden",
        "404" => "Not Found",
        "405" => "Method Not Allowed",
        "409" => "Conflict",
        "410" => "Gone",
        "415" => "Unsupported Media Type",
        "422" => "Unprocessable Entity",
        "429" => "Too Many Requests",
        "500" => "Internal Server Error",
        "501" => "Not Implemented",
        "502" => "Bad Gateway",
        "503" => "Service Unavailable",
        "504" => "Gateway Timeout",
        _ => "",
    }
}
