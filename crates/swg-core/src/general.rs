//! API-wide metadata read from the entry-point file.
//!
//! The entry file's `//!` docs and the doc comment on `fn main` are read as
//! one block. `@securityDefinitions.*` opens a security definition; the
//! `@in`, `@name`, `@tokenUrl`, `@authorizationUrl`, `@scope.*` and
//! `@description` lines after it belong to that definition until any other
//! tag closes it.

use std::collections::BTreeMap;
use std::path::Path;

use indexmap::IndexMap;

use crate::directive::{self, Directive, Entry, Tag, mime};
use crate::fault::{FaultKind, Faults, SourceLocation};
use crate::source::DocLine;
use crate::spec::{
    ApiKeyLocation, Contact, Info, License, OAuthFlow, SecurityScheme, SecuritySchemeType,
    Tag as TagInfo,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneralInfo {
    pub info: Info,
    pub host: Option<String>,
    pub base_path: Option<String>,
    pub schemes: Vec<String>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    pub tags: Vec<TagInfo>,
    pub security_definitions: BTreeMap<String, SecurityScheme>,
}

/// A security definition still collecting its attributes.
struct OpenScheme {
    name: String,
    scheme: SecurityScheme,
    line: usize,
}

struct GeneralParser<'a> {
    file: &'a Path,
    faults: &'a mut Faults,
    general: GeneralInfo,
    descriptions: Vec<String>,
    contact: Contact,
    license_name: Option<String>,
    license_url: Option<String>,
    open: Option<OpenScheme>,
}

/// Parse general API info from the entry-point doc lines.
pub fn parse_general_info(lines: &[DocLine], file: &Path, faults: &mut Faults) -> GeneralInfo {
    let block = directive::tokenize(lines);
    let mut parser = GeneralParser {
        file,
        faults,
        general: GeneralInfo::default(),
        descriptions: Vec::new(),
        contact: Contact::default(),
        license_name: None,
        license_url: None,
        open: None,
    };
    for entry in &block.entries {
        if let Entry::Directive(d) = entry {
            parser.directive(d);
        }
    }
    parser.finish()
}

impl GeneralParser<'_> {
    fn fault(&mut self, line: usize, message: impl Into<String>) {
        let location = SourceLocation::new(self.file, line);
        self.faults.push(FaultKind::Directive, Some(&location), message);
    }

    fn directive(&mut self, d: &Directive) {
        if !is_scheme_attribute(d.tag) {
            self.close_scheme();
        }
        let value = d.flat_args();
        let text = || Some(value.clone()).filter(|v| !v.is_empty());
        match d.tag {
            Tag::Title => self.general.info.title = value.clone(),
            Tag::Version => self.general.info.version = value.clone(),
            Tag::Description => match self.open.as_mut() {
                Some(open) => open.scheme.description = text(),
                None => self.descriptions.push(d.args.trim().to_string()),
            },
            Tag::TermsOfService => self.general.info.terms_of_service = text(),
            Tag::ContactName => self.contact.name = text(),
            Tag::ContactUrl => self.contact.url = text(),
            Tag::ContactEmail => self.contact.email = text(),
            Tag::LicenseName => self.license_name = text(),
            Tag::LicenseUrl => self.license_url = text(),
            Tag::Host => self.general.host = text(),
            Tag::BasePath => self.general.base_path = text(),
            Tag::Schemes => {
                self.general.schemes = value
                    .split([',', ' '])
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            Tag::Accept | Tag::Produce => {
                for alias in value.split([',', ' ']).filter(|s| !s.is_empty()) {
                    match mime::mime_type(alias) {
                        Some(mime) if d.tag == Tag::Accept => self.general.consumes.push(mime),
                        Some(mime) => self.general.produces.push(mime),
                        None => self.fault(d.line, format!("unknown mime type alias `{alias}`")),
                    }
                }
            }
            Tag::TagName => self.general.tags.push(TagInfo {
                name: value.clone(),
                description: None,
            }),
            Tag::TagDescription => match self.general.tags.last_mut() {
                Some(tag) => tag.description = text(),
                None => self.fault(d.line, "@tag.description without a preceding @tag.name"),
            },
            Tag::SecurityBasic => self.open_scheme(d, SecuritySchemeType::Basic, None),
            Tag::SecurityApiKey => self.open_scheme(d, SecuritySchemeType::ApiKey, None),
            Tag::SecurityOAuth2Application => {
                self.open_scheme(d, SecuritySchemeType::OAuth2, Some(OAuthFlow::Application))
            }
            Tag::SecurityOAuth2Implicit => {
                self.open_scheme(d, SecuritySchemeType::OAuth2, Some(OAuthFlow::Implicit))
            }
            Tag::SecurityOAuth2Password => {
                self.open_scheme(d, SecuritySchemeType::OAuth2, Some(OAuthFlow::Password))
            }
            Tag::SecurityOAuth2AccessCode => {
                self.open_scheme(d, SecuritySchemeType::OAuth2, Some(OAuthFlow::AccessCode))
            }
            Tag::In | Tag::Name | Tag::TokenUrl | Tag::AuthorizationUrl | Tag::Scope => {
                self.scheme_attribute(d)
            }
            _ => {}
        }
    }

    fn open_scheme(&mut self, d: &Directive, scheme_type: SecuritySchemeType, flow: Option<OAuthFlow>) {
        self.close_scheme();
        let Some(name) = d.args().next_token().map(|t| t.text) else {
            self.fault(d.line, "security definition without a name");
            return;
        };
        let mut scheme = SecurityScheme::new(scheme_type);
        scheme.flow = flow;
        if scheme_type == SecuritySchemeType::OAuth2 {
            scheme.scopes = Some(IndexMap::new());
        }
        self.open = Some(OpenScheme {
            name,
            scheme,
            line: d.line,
        });
    }

    fn scheme_attribute(&mut self, d: &Directive) {
        let Some(open) = self.open.as_mut() else {
            self.fault(d.line, "security attribute outside a security definition");
            return;
        };
        let value = d.flat_args();
        match d.tag {
            Tag::In => match value.to_ascii_lowercase().as_str() {
                "header" => open.scheme.location = Some(ApiKeyLocation::Header),
                "query" => open.scheme.location = Some(ApiKeyLocation::Query),
                other => {
                    let message = format!("@in must be header or query, got `{other}`");
                    self.fault(d.line, message);
                }
            },
            Tag::Name => open.scheme.name = Some(value),
            Tag::TokenUrl => open.scheme.token_url = Some(value),
            Tag::AuthorizationUrl => open.scheme.authorization_url = Some(value),
            Tag::Scope => {
                let mut args = d.args();
                if let Some(scope) = args.next_token() {
                    let description = args.remainder().unwrap_or_default();
                    open.scheme
                        .scopes
                        .get_or_insert_with(IndexMap::new)
                        .insert(scope.text, description);
                }
            }
            _ => {}
        }
    }

    /// Validate and store the open security definition, if any.
    fn close_scheme(&mut self) {
        let Some(open) = self.open.take() else {
            return;
        };
        let scheme = &open.scheme;
        let checks = match (scheme.scheme_type, scheme.flow) {
            (SecuritySchemeType::ApiKey, _) => vec![
                ("@in", scheme.location.is_none()),
                ("@name", scheme.name.is_none()),
            ],
            (SecuritySchemeType::OAuth2, Some(OAuthFlow::Implicit)) => {
                vec![("@authorizationUrl", scheme.authorization_url.is_none())]
            }
            (SecuritySchemeType::OAuth2, Some(OAuthFlow::AccessCode)) => vec![
                ("@authorizationUrl", scheme.authorization_url.is_none()),
                ("@tokenUrl", scheme.token_url.is_none()),
            ],
            (SecuritySchemeType::OAuth2, _) => vec![("@tokenUrl", scheme.token_url.is_none())],
            (SecuritySchemeType::Basic, _) => Vec::new(),
        };
        let missing: Vec<&str> = checks
            .into_iter()
            .filter_map(|(tag, absent)| absent.then_some(tag))
            .collect();
        if missing.is_empty() {
            self.general.security_definitions.insert(open.name, open.scheme);
        } else {
            let message = format!(
                "security definition `{}` is missing {}; dropped",
                open.name,
                missing.join(", ")
            );
            self.fault(open.line, message);
        }
    }

    fn finish(mut self) -> GeneralInfo {
        self.close_scheme();
        let descriptions: Vec<String> = self
            .descriptions
            .into_iter()
            .filter(|d| !d.is_empty())
            .collect();
        if !descriptions.is_empty() {
            self.general.info.description = Some(descriptions.join("\n"));
        }
        if self.contact != Contact::default() {
            self.general.info.contact = Some(self.contact);
        }
        match (self.license_name, self.license_url) {
            (Some(name), url) => self.general.info.license = Some(License { name, url }),
            (None, Some(_)) => log::debug!("@license.url without @license.name ignored"),
            (None, None) => {}
        }
        self.general.schemes = dedup(self.general.schemes);
        self.general
    }
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

fn is_scheme_attribute(tag: Tag) -> bool {
    matches!(
        tag,
        Tag::In
            | Tag::Name
            | Tag::TokenUrl
            | Tag::AuthorizationUrl
            | Tag::Scope
            | Tag::Description
    )
}
