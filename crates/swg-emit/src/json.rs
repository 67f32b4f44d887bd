use swg_core::spec::Swagger;

use crate::error::EmitError;

/// Pretty-printed JSON encoding of the document.
pub fn to_json(swagger: &Swagger) -> Result<String, EmitError> {
    Ok(serde_json::to_string_pretty(swagger)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use swg_core::spec::{Info, PathItem};

    fn sample() -> Swagger {
        Swagger {
            schemes: Vec::new(),
            swagger: "2.0".to_string(),
            info: Info {
                title: "Petstore".to_string(),
                version: "1.0".to_string(),
                ..Default::default()
            },
            host: None,
            base_path: Some("/v1".to_string()),
            consumes: Vec::new(),
            produces: Vec::new(),
            paths: BTreeMap::from([("/pets".to_string(), PathItem::default())]),
            definitions: BTreeMap::new(),
            security_definitions: BTreeMap::new(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_field_order_and_omissions() {
        let json = to_json(&sample()).unwrap();
        let swagger_at = json.find("\"swagger\"").unwrap();
        let info_at = json.find("\"info\"").unwrap();
        let paths_at = json.find("\"paths\"").unwrap();
        assert!(swagger_at < info_at && info_at < paths_at);
        assert!(json.contains("\"basePath\": \"/v1\""));
        assert!(!json.contains("definitions"));
        assert!(!json.contains("host"));
    }
}
