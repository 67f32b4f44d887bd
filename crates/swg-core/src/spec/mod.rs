//! Serde model of the emitted Swagger 2.0 document.

mod operation;
mod schema;
mod security;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use operation::{Header, Operation, Parameter, PathItem, Response};
pub use schema::Schema;
pub use security::{
    ApiKeyLocation, OAuthFlow, SecurityRequirement, SecurityScheme, SecuritySchemeType,
};

pub const SWAGGER_VERSION: &str = "2.0";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Info {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub title: String,

    #[serde(rename = "termsOfService", skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,

    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The assembled document. Maps are ordered so repeated runs serialize
/// identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Swagger {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schemes: Vec<String>,

    pub swagger: String,

    pub info: Info,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(rename = "basePath", skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub produces: Vec<String>,

    pub paths: BTreeMap<String, PathItem>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub definitions: BTreeMap<String, Schema>,

    #[serde(
        rename = "securityDefinitions",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub security_definitions: BTreeMap<String, SecurityScheme>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl Swagger {
    /// Number of (path, method) registrations.
    pub fn operation_count(&self) -> usize {
        self.paths.values().map(|item| item.operations().count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::HttpMethod;

    #[test]
    fn test_security_scheme_names() {
        let mut scheme = SecurityScheme::new(SecuritySchemeType::OAuth2);
        scheme.flow = Some(OAuthFlow::AccessCode);
        let json = serde_json::to_value(&scheme).unwrap();
        assert_eq!(json["type"], "oauth2");
        assert_eq!(json["flow"], "accessCode");

        let key = SecurityScheme {
            location: Some(ApiKeyLocation::Header),
            name: Some("X-Api-Key".to_string()),
            ..SecurityScheme::new(SecuritySchemeType::ApiKey)
        };
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json["type"], "apiKey");
        assert_eq!(json["in"], "header");
        assert!(json.get("scopes").is_none());
    }

    #[test]
    fn test_reference_schema_is_bare() {
        let json = serde_json::to_string(&Schema::reference("Pet")).unwrap();
        assert_eq!(json, r##"{"$ref":"#/definitions/Pet"}"##);
        assert_eq!(Schema::reference("Pet").definition_name(), Some("Pet"));
    }

    #[test]
    fn test_path_item_set_replaces() {
        let op = |id: &str| Operation {
            description: None,
            consumes: Vec::new(),
            produces: Vec::new(),
            tags: Vec::new(),
            summary: None,
            operation_id: id.to_string(),
            parameters: Vec::new(),
            responses: Default::default(),
            security: Vec::new(),
            deprecated: false,
        };
        let mut item = PathItem::default();
        assert!(item.set(HttpMethod::Get, op("first")).is_none());
        let replaced = item.set(HttpMethod::Get, op("second")).unwrap();
        assert_eq!(replaced.operation_id, "first");
        assert_eq!(item.get(HttpMethod::Get).unwrap().operation_id, "second");
        assert_eq!(item.operations().count(), 1);
    }
}
