//! Rendering of the `docs.rs` module that embeds the document.

use chrono::{SecondsFormat, Utc};
use minijinja::{AutoEscape, Environment, UndefinedBehavior, context};
use swg_core::spec::Swagger;

use crate::error::EmitError;

/// Template used when no override text is configured.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/docs.rs.j2");

const TEMPLATE_NAME: &str = "docs.rs";

#[derive(Debug, Clone)]
pub struct StubOptions<'a> {
    /// Package name the generated module describes.
    pub package: &'a str,
    /// Embed a generation timestamp. Off keeps repeated runs byte-identical.
    pub generated_time: bool,
    /// Template text override.
    pub template: Option<&'a str>,
}

impl Default for StubOptions<'_> {
    fn default() -> Self {
        Self {
            package: "docs",
            generated_time: false,
            template: None,
        }
    }
}

/// Render the stub module around the already-encoded JSON document.
pub fn render_stub(
    swagger: &Swagger,
    json: &str,
    options: &StubOptions<'_>,
) -> Result<String, EmitError> {
    let template_error = |source: minijinja::Error| EmitError::Template {
        name: TEMPLATE_NAME.to_string(),
        source,
    };

    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_keep_trailing_newline(true);
    env.add_filter("rust_str", rust_str);
    env.add_template(TEMPLATE_NAME, options.template.unwrap_or(DEFAULT_TEMPLATE))
        .map_err(template_error)?;

    let timestamp = if options.generated_time {
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    } else {
        String::new()
    };

    let tmpl = env.get_template(TEMPLATE_NAME).map_err(template_error)?;
    tmpl.render(context! {
        doc => rust_str(json.to_string()),
        package => options.package,
        generated_time => options.generated_time,
        timestamp => timestamp,
        title => swagger.info.title,
        version => swagger.info.version,
        host => swagger.host.as_deref().unwrap_or_default(),
        base_path => swagger.base_path.as_deref().unwrap_or_default(),
        description => swagger.info.description.as_deref().unwrap_or_default(),
        schemes => swagger.schemes,
    })
    .map_err(template_error)
}

/// Quote a value as a Rust string literal.
fn rust_str(value: String) -> String {
    format!("{value:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use swg_core::spec::Info;

    fn swagger() -> Swagger {
        Swagger {
            schemes: vec!["https".to_string()],
            swagger: "2.0".to_string(),
            info: Info {
                title: "Petstore \"v2\"".to_string(),
                version: "1.0".to_string(),
                description: Some("Pets.\nAll of them.".to_string()),
                ..Default::default()
            },
            host: Some("pets.example.com".to_string()),
            base_path: None,
            consumes: Vec::new(),
            produces: Vec::new(),
            paths: BTreeMap::new(),
            definitions: BTreeMap::new(),
            security_definitions: BTreeMap::new(),
            tags: Vec::new(),
        }
    }

    const JSON: &str = "{\n  \"swagger\": \"2.0\"\n}";

    #[test]
    fn test_default_template() {
        let rendered = render_stub(&swagger(), JSON, &StubOptions::default()).unwrap();
        assert!(rendered.starts_with("// Code generated by swg. DO NOT EDIT.\n\n//!"));
        assert!(rendered.contains(r#"pub const SWAGGER_JSON: &str = "{\n  \"swagger\": \"2.0\"\n}";"#));
        assert!(rendered.contains(r#"title: "Petstore \"v2\"","#));
        assert!(rendered.contains(r#"description: "Pets.\nAll of them.","#));
        assert!(rendered.contains(r#"schemes: &["https"],"#));
        assert!(rendered.contains(r#"base_path: "","#));
        assert!(rendered.contains(r#"instance_name: "docs","#));
        assert!(!rendered.contains("Generated at"));
    }

    #[test]
    fn test_repeated_renders_are_identical() {
        let options = StubOptions {
            package: "api",
            ..Default::default()
        };
        let first = render_stub(&swagger(), JSON, &options).unwrap();
        let second = render_stub(&swagger(), JSON, &options).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_generated_time() {
        let options = StubOptions {
            generated_time: true,
            ..Default::default()
        };
        let rendered = render_stub(&swagger(), JSON, &options).unwrap();
        let line = rendered.lines().nth(1).unwrap();
        assert!(line.starts_with("// Generated at "));
        assert!(line.ends_with("Z."));
    }

    #[test]
    fn test_template_override() {
        let options = StubOptions {
            template: Some("{{ package }}:{{ version }}:{{ host }}"),
            package: "api",
            ..Default::default()
        };
        let rendered = render_stub(&swagger(), JSON, &options).unwrap();
        insta::assert_snapshot!(rendered, @"api:1.0:pets.example.com");
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let options = StubOptions {
            template: Some("{{ license_name }}"),
            ..Default::default()
        };
        let err = render_stub(&swagger(), JSON, &options).unwrap_err();
        assert!(matches!(err, EmitError::Template { .. }));
    }

    #[test]
    fn test_syntax_error_is_an_error() {
        let options = StubOptions {
            template: Some("{% if %}"),
            ..Default::default()
        };
        assert!(render_stub(&swagger(), JSON, &options).is_err());
    }
}
