use indexmap::IndexMap;

use crate::directive::{self, Args, Directive, DocBlock, Entry, Tag, mime, split_list};
use crate::fault::{FaultKind, Faults, SourceLocation};
use crate::schema::Primitive;
use crate::source::{HandlerDecl, TypeExpr};

use super::{
    BodyKind, HeaderSpec, HttpMethod, Operation, ParamAttributes, ParamLocation, ParameterSpec,
    ResponseBody, ResponseSpec, Route, SecurityRequirement,
};

/// Build the operation documented on a handler.
///
/// Returns `None` when the doc block is not an operation (no `@Router`) or
/// when none of its routes could be parsed. Malformed directives are recorded
/// and dropped; the rest of the block still contributes.
pub fn build_operation(handler: &HandlerDecl, faults: &mut Faults) -> Option<Operation> {
    let block = directive::tokenize(&handler.docs);
    if !block.has(Tag::Router) {
        if block.directives().any(|d| d.tag.is_operation()) {
            faults.push(
                FaultKind::Directive,
                Some(&handler.location),
                format!(
                    "`{}` carries operation annotations but no @Router; skipped",
                    handler.name
                ),
            );
        }
        return None;
    }

    let mut builder = OperationBuilder::new(handler, faults);
    builder.consume(&block);
    builder.finish()
}

/// Names inside `{...}` in a path template, in order.
pub fn path_placeholders(path: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            break;
        };
        let name = after[..end].trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
        rest = &after[end + 1..];
    }
    names
}

/// A `@Header` waiting for the responses it applies to.
struct PendingHeader {
    codes: Vec<String>,
    header: HeaderSpec,
    line: usize,
}

struct OperationBuilder<'a> {
    handler: &'a HandlerDecl,
    faults: &'a mut Faults,
    op: Operation,
    descriptions: Vec<String>,
    headers: Vec<PendingHeader>,
    id_set: bool,
}

impl<'a> OperationBuilder<'a> {
    fn new(handler: &'a HandlerDecl, faults: &'a mut Faults) -> Self {
        let op = Operation {
            id: handler.name.clone(),
            routes: Vec::new(),
            tags: Vec::new(),
            summary: None,
            description: None,
            consumes: Vec::new(),
            produces: Vec::new(),
            parameters: Vec::new(),
            responses: IndexMap::new(),
            security: Vec::new(),
            deprecated: false,
            module_path: handler.module_path.clone(),
            location: handler.location.clone(),
        };
        Self {
            handler,
            faults,
            op,
            descriptions: Vec::new(),
            headers: Vec::new(),
            id_set: false,
        }
    }

    fn location(&self, line: usize) -> SourceLocation {
        SourceLocation::new(self.handler.location.file.clone(), line)
    }

    fn fault(&mut self, kind: FaultKind, line: usize, message: impl Into<String>) {
        let location = self.location(line);
        self.faults.push(kind, Some(&location), message);
    }

    fn consume(&mut self, block: &DocBlock) {
        for entry in &block.entries {
            match entry {
                Entry::Text { text, .. } => self.descriptions.push(text.clone()),
                Entry::Directive(d) => self.directive(d),
            }
        }
    }

    fn directive(&mut self, d: &Directive) {
        match d.tag {
            Tag::Summary => self.op.summary = non_empty(d.flat_args()),
            Tag::Description => {
                if !d.args.trim().is_empty() {
                    self.descriptions.push(d.args.clone());
                }
            }
            Tag::Id => match d.args().next_token() {
                Some(token) => {
                    if self.id_set {
                        log::debug!("{} overrides operation id {}", token.text, self.op.id);
                    }
                    self.op.id = token.text;
                    self.id_set = true;
                }
                None => self.fault(FaultKind::Directive, d.line, "@ID requires a value"),
            },
            Tag::Tags => {
                for tag in split_list(&d.flat_args()) {
                    if !self.op.tags.contains(&tag) {
                        self.op.tags.push(tag);
                    }
                }
            }
            Tag::Accept => {
                let types = self.mime_list(d);
                self.op.consumes.extend(types);
            }
            Tag::Produce => {
                let types = self.mime_list(d);
                self.op.produces.extend(types);
            }
            Tag::Param => self.param(d),
            Tag::Success | Tag::Failure | Tag::Response => self.response(d),
            Tag::Header => self.header(d),
            Tag::Router => self.router(d),
            Tag::Security => self.security(d),
            Tag::Deprecated => self.op.deprecated = true,
            other => log::debug!(
                "{}: {:?} has no meaning on a handler",
                self.location(d.line),
                other
            ),
        }
    }

    fn mime_list(&mut self, d: &Directive) -> Vec<String> {
        let mut out = Vec::new();
        for alias in d.flat_args().split([',', ' ']).filter(|s| !s.is_empty()) {
            match mime::mime_type(alias) {
                Some(mime) => out.push(mime),
                None => self.fault(
                    FaultKind::Directive,
                    d.line,
                    format!("unknown mime type alias `{alias}`"),
                ),
            }
        }
        out
    }

    fn router(&mut self, d: &Directive) {
        let mut args = d.args();
        let path = args.next_token().map(|t| t.text);
        let method = args
            .next_token()
            .and_then(|t| {
                t.text
                    .strip_prefix('[')
                    .and_then(|m| m.strip_suffix(']'))
                    .map(str::to_string)
            })
            .and_then(|m| HttpMethod::parse(&m));
        match (path, method) {
            (Some(path), Some(method)) if path.starts_with('/') => {
                self.op.routes.push(Route { path, method });
            }
            _ => self.fault(
                FaultKind::Directive,
                d.line,
                format!("malformed @Router `{}`, expected `/path [method]`", d.flat_args()),
            ),
        }
    }

    fn param(&mut self, d: &Directive) {
        let mut args = d.args();
        let (Some(name), Some(location), Some(ty), Some(required)) = (
            args.next_token(),
            args.next_token(),
            args.next_token(),
            args.next_token(),
        ) else {
            self.fault(
                FaultKind::Directive,
                d.line,
                format!(
                    "@Param `{}` needs name, location, type and required flag",
                    d.flat_args()
                ),
            );
            return;
        };

        let Some(location) = ParamLocation::parse(&location.text) else {
            self.fault(
                FaultKind::Directive,
                d.line,
                format!("@Param `{}` has unknown location `{}`", name.text, location.text),
            );
            return;
        };
        let Some(ty) = TypeExpr::parse(&ty.text) else {
            self.fault(
                FaultKind::Directive,
                d.line,
                format!("@Param `{}` has unparsable type `{}`", name.text, ty.text),
            );
            return;
        };
        let required = match required.text.to_ascii_lowercase().as_str() {
            "true" => true,
            "false" => false,
            other => {
                self.fault(
                    FaultKind::Directive,
                    d.line,
                    format!("@Param `{}` required flag must be true or false, got `{other}`", name.text),
                );
                return;
            }
        };

        let (description, attributes) = self.param_tail(&mut args, d.line);
        self.op.parameters.push(ParameterSpec {
            name: name.text,
            // Path parameters are always required.
            required: required || location == ParamLocation::Path,
            location,
            ty,
            description,
            attributes,
            schema: None,
            line: d.line,
        });
    }

    fn param_tail(&mut self, args: &mut Args<'_>, line: usize) -> (Option<String>, ParamAttributes) {
        let mut words = Vec::new();
        let mut attributes = ParamAttributes::default();
        while let Some(token) = args.next_token() {
            if token.quoted {
                words.push(token.text);
                continue;
            }
            let Some((key, value)) = attribute(&token.text) else {
                words.push(token.text);
                continue;
            };
            match key.as_str() {
                "default" => attributes.default = Some(value),
                "enums" => attributes.enums = split_list(&value),
                "minimum" => attributes.minimum = Some(value),
                "maximum" => attributes.maximum = Some(value),
                "minlength" | "maxlength" => match value.parse::<u64>() {
                    Ok(n) if key == "minlength" => attributes.min_length = Some(n),
                    Ok(n) => attributes.max_length = Some(n),
                    Err(_) => self.fault(
                        FaultKind::Directive,
                        line,
                        format!("{key}({value}) is not a non-negative integer"),
                    ),
                },
                "format" => attributes.format = Some(value),
                _ => words.push(token.text),
            }
        }
        (non_empty(words.join(" ")), attributes)
    }

    fn response(&mut self, d: &Directive) {
        let mut args = d.args();
        let Some(codes) = args.next_token() else {
            self.fault(FaultKind::Directive, d.line, "response directive without a status code");
            return;
        };
        let codes = split_list(&codes.text);
        if codes.is_empty() || codes.iter().any(|c| !valid_code(c)) {
            self.fault(
                FaultKind::Directive,
                d.line,
                format!("invalid status code in `{}`", d.flat_args()),
            );
            return;
        }

        let mut body = None;
        if let Some(kind) = args.peek().and_then(|t| BodyKind::parse(&t.text)) {
            args.next_token();
            let ty = match args.peek() {
                Some(t) if !t.quoted => {
                    args.next_token();
                    match TypeExpr::parse(&t.text) {
                        Some(ty) => Some(ty),
                        None => {
                            self.fault(
                                FaultKind::Directive,
                                d.line,
                                format!("unparsable response type `{}`", t.text),
                            );
                            None
                        }
                    }
                }
                _ => None,
            };
            body = Some(ResponseBody { kind, ty });
        }
        let description = args.remainder();

        for code in codes {
            let spec = ResponseSpec {
                description: description.clone(),
                body: body.clone(),
                headers: Vec::new(),
                schema: None,
                line: d.line,
            };
            // Later directives for a code replace earlier ones in place.
            if self.op.responses.insert(code.to_ascii_lowercase(), spec).is_some() {
                log::debug!("{}: response {code} redeclared", self.location(d.line));
            }
        }
    }

    fn header(&mut self, d: &Directive) {
        let mut args = d.args();
        let codes = args.next_token().map(|t| split_list(&t.text));
        let kind = match args.peek().and_then(|t| BodyKind::parse(&t.text)) {
            Some(kind) => {
                args.next_token();
                Some(kind)
            }
            None => None,
        };
        let name = args.next_token();
        let (Some(codes), Some(name)) = (codes, name) else {
            self.fault(
                FaultKind::Directive,
                d.line,
                format!("malformed @Header `{}`", d.flat_args()),
            );
            return;
        };
        self.headers.push(PendingHeader {
            codes: codes.into_iter().map(|c| c.to_ascii_lowercase()).collect(),
            header: HeaderSpec {
                name: name.text,
                kind: kind.and_then(|k| k.primitive()).unwrap_or(Primitive::String),
                description: args.remainder(),
            },
            line: d.line,
        });
    }

    fn security(&mut self, d: &Directive) {
        let flat = d.flat_args();
        for alternative in flat.split("||") {
            let mut requirement = SecurityRequirement::new();
            for part in alternative.split("&&") {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                let (name, scopes) = match part.split_once('[') {
                    Some((name, scopes)) => (
                        name.trim(),
                        split_list(scopes.trim_end().trim_end_matches(']')),
                    ),
                    None => (part, Vec::new()),
                };
                requirement.insert(name.to_string(), scopes);
            }
            if requirement.is_empty() {
                self.fault(FaultKind::Directive, d.line, "@Security without a scheme name");
            } else {
                self.op.security.push(requirement);
            }
        }
    }

    fn finish(mut self) -> Option<Operation> {
        if self.op.routes.is_empty() {
            self.fault(
                FaultKind::Directive,
                self.handler.location.line,
                format!("`{}` has no usable @Router; skipped", self.handler.name),
            );
            return None;
        }

        for pending in std::mem::take(&mut self.headers) {
            let mut applied = false;
            for (code, response) in self.op.responses.iter_mut() {
                if pending.codes.iter().any(|c| c == "all" || c == code) {
                    response.headers.push(pending.header.clone());
                    applied = true;
                }
            }
            if !applied {
                self.fault(
                    FaultKind::Directive,
                    pending.line,
                    format!(
                        "@Header {} matches no declared response",
                        pending.header.name
                    ),
                );
            }
        }

        if self.op.tags.is_empty() {
            let tag = self
                .handler
                .module_path
                .last()
                .cloned()
                .unwrap_or_else(|| "default".to_string());
            self.op.tags.push(tag);
        }
        self.op.description = non_empty(self.descriptions.join("\n"));
        self.check_path_parameters();
        Some(self.op)
    }

    /// Placeholders and declared path parameters must match in both directions.
    /// Mismatches are recorded; the operation is kept as declared.
    fn check_path_parameters(&mut self) {
        let mut placeholders: Vec<String> = Vec::new();
        for route in &self.op.routes {
            for name in path_placeholders(&route.path) {
                let declared = self.op.parameter(&name, ParamLocation::Path).is_some();
                if !declared {
                    let message = format!(
                        "`{}` uses {{{name}}} but declares no path parameter `{name}`",
                        route.path
                    );
                    let line = self.handler.location.line;
                    let location = self.location(line);
                    self.faults.push(FaultKind::PathParameter, Some(&location), message);
                }
                placeholders.push(name);
            }
        }
        let stray: Vec<(String, usize)> = self
            .op
            .parameters
            .iter()
            .filter(|p| p.location == ParamLocation::Path && !placeholders.contains(&p.name))
            .map(|p| (p.name.clone(), p.line))
            .collect();
        for (name, line) in stray {
            self.fault(
                FaultKind::PathParameter,
                line,
                format!("path parameter `{name}` does not appear in any route"),
            );
        }
    }
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn valid_code(code: &str) -> bool {
    code.eq_ignore_ascii_case("default")
        || code
            .parse::<u16>()
            .is_ok_and(|n| (100..=599).contains(&n))
}

/// Split `key(value)` into a lowercase key and its value.
fn attribute(token: &str) -> Option<(String, String)> {
    let open = token.find('(')?;
    let value = token[open + 1..].strip_suffix(')')?;
    let key = &token[..open];
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((key.to_ascii_lowercase(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::DocLine;

    fn handler(module: &[&str], docs: &str) -> HandlerDecl {
        HandlerDecl {
            name: "get_pet".to_string(),
            module_path: module.iter().map(|s| s.to_string()).collect(),
            docs: docs
                .lines()
                .enumerate()
                .map(|(i, l)| DocLine::new(l, i + 10))
                .collect(),
            location: SourceLocation::new("src/handlers.rs", 10),
        }
    }

    fn build(module: &[&str], docs: &str) -> (Option<Operation>, Faults) {
        let mut faults = Faults::new();
        let op = build_operation(&handler(module, docs), &mut faults);
        (op, faults)
    }

    #[test]
    fn test_full_operation() {
        let (op, faults) = build(
            &["handlers", "pets"],
            r#"Fetch one pet.
@Summary Get a pet
@Param id path u64 true "Pet id" minimum(1)
@Param expand query Vec<String> false "Relations" enums(owner,tags)
@Success 200 {object} models::Pet "the pet"
@Failure 404,410 {object} ApiError
@Header 200 {string} X-Request-Id "trace id"
@Security ApiKeyAuth && OAuth2[read, write]
@Produce json
@Router /pets/{id} [get]"#,
        );
        assert!(faults.is_empty(), "{faults:?}");
        let op = op.unwrap();
        assert_eq!(op.id, "get_pet");
        assert_eq!(op.tags, vec!["pets"]);
        assert_eq!(op.summary.as_deref(), Some("Get a pet"));
        assert_eq!(op.description.as_deref(), Some("Fetch one pet."));
        assert_eq!(op.produces, vec!["application/json"]);
        assert_eq!(
            op.routes,
            vec![Route {
                path: "/pets/{id}".to_string(),
                method: HttpMethod::Get
            }]
        );

        let names: Vec<&str> = op.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["id", "expand"]);
        assert_eq!(op.parameters[0].attributes.minimum.as_deref(), Some("1"));
        assert_eq!(op.parameters[1].attributes.enums, vec!["owner", "tags"]);
        assert_eq!(op.parameters[1].description.as_deref(), Some("Relations"));

        let codes: Vec<&str> = op.responses.keys().map(String::as_str).collect();
        assert_eq!(codes, vec!["200", "404", "410"]);
        assert_eq!(op.responses["200"].headers[0].name, "X-Request-Id");
        assert!(op.responses["404"].description.is_none());

        assert_eq!(op.security.len(), 1);
        assert_eq!(op.security[0]["OAuth2"], vec!["read", "write"]);
        assert!(op.security[0]["ApiKeyAuth"].is_empty());
    }

    #[test]
    fn test_response_last_wins_in_place() {
        let (op, _) = build(
            &[],
            "@Success 200 {string} string \"first\"\n@Failure 500 {string} string\n@Success 200 {integer} i64 \"second\"\n@Router /x [get]",
        );
        let op = op.unwrap();
        let codes: Vec<&str> = op.responses.keys().map(String::as_str).collect();
        assert_eq!(codes, vec!["200", "500"]);
        assert_eq!(op.responses["200"].description.as_deref(), Some("second"));
        assert_eq!(
            op.responses["200"].body.as_ref().map(|b| b.kind),
            Some(BodyKind::Integer)
        );
        assert_eq!(op.tags, vec!["default"]);
    }

    #[test]
    fn test_missing_path_parameter_is_fault_not_skip() {
        let (op, faults) = build(&[], "@Param q query string false\n@Router /pets/{id} [delete]");
        let op = op.unwrap();
        assert_eq!(op.parameters.len(), 1);
        assert_eq!(faults.of_kind(FaultKind::PathParameter).count(), 1);
    }

    #[test]
    fn test_stray_path_parameter() {
        let (_, faults) = build(&[], "@Param id path u64 true\n@Router /pets [get]");
        let fault = faults.of_kind(FaultKind::PathParameter).next().unwrap();
        assert!(fault.message.contains("`id`"));
        assert_eq!(fault.location.as_ref().map(|l| l.line), Some(10));
    }

    #[test]
    fn test_malformed_param_is_dropped() {
        let (op, faults) = build(&[], "@Param id path\n@Router /pets [get]");
        assert!(op.unwrap().parameters.is_empty());
        let fault = faults.of_kind(FaultKind::Directive).next().unwrap();
        assert_eq!(fault.location.as_ref().map(|l| l.line), Some(10));
    }

    #[test]
    fn test_bad_router_skips_handler() {
        let (op, faults) = build(&[], "@Summary nope\n@Router /pets");
        assert!(op.is_none());
        assert_eq!(faults.of_kind(FaultKind::Directive).count(), 2);
    }

    #[test]
    fn test_operation_tags_without_router() {
        let (op, faults) = build(&[], "@Summary orphan");
        assert!(op.is_none());
        assert_eq!(faults.len(), 1);

        let (op, faults) = build(&[], "Just a helper.");
        assert!(op.is_none());
        assert!(faults.is_empty());
    }

    #[test]
    fn test_multiple_routes_and_explicit_id() {
        let (op, _) = build(
            &[],
            "@ID findPet\n@Tags pets, public\n@Router /pets/{id} [get]\n@Router /animals/{id} [get]\n@Param id path string true",
        );
        let op = op.unwrap();
        assert_eq!(op.id, "findPet");
        assert_eq!(op.tags, vec!["pets", "public"]);
        assert_eq!(op.routes.len(), 2);
    }

    #[test]
    fn test_header_without_matching_response() {
        let (op, faults) = build(
            &[],
            "@Success 200 {string} string\n@Header 201 {string} Location\n@Router /x [post]",
        );
        assert!(op.unwrap().responses["200"].headers.is_empty());
        assert_eq!(faults.of_kind(FaultKind::Directive).count(), 1);
    }

    #[test]
    fn test_invalid_status_code() {
        let (op, faults) = build(&[], "@Success 20x {string} string\n@Router /x [get]");
        assert!(op.unwrap().responses.is_empty());
        assert_eq!(faults.len(), 1);
    }

    #[test]
    fn test_path_placeholders() {
        assert_eq!(
            path_placeholders("/users/{user_id}/pets/{ id }"),
            vec!["user_id", "id"]
        );
        assert!(path_placeholders("/plain").is_empty());
    }
}
