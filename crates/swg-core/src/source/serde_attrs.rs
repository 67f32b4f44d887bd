//! The subset of `#[serde(...)]` that changes the serialized shape of a type.

use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutyKebabCase, ToShoutySnakeCase, ToSnakeCase,
    ToUpperCamelCase,
};
use syn::meta::ParseNestedMeta;
use syn::{Attribute, LitStr, Token};

/// Container-level serde attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerdeContainer {
    pub rename_all: Option<String>,
}

/// Field- or variant-level serde attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerdeField {
    pub rename: Option<String>,
    pub skip: bool,
    pub flatten: bool,
    /// `default` or `skip_serializing_if`: the field may be absent.
    pub optional: bool,
}

/// Container-level attributes. Attributes that fail to parse are pushed to
/// `errors`; keys parsed before the failure still apply.
pub fn container_attrs(attrs: &[Attribute], errors: &mut Vec<syn::Error>) -> SerdeContainer {
    let mut out = SerdeContainer::default();
    for attr in serde_attrs(attrs) {
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                if meta.input.peek(Token![=]) {
                    let value: LitStr = meta.value()?.parse()?;
                    out.rename_all = Some(value.value());
                } else {
                    meta.parse_nested_meta(|inner| {
                        if inner.path.is_ident("serialize") {
                            let value: LitStr = inner.value()?.parse()?;
                            out.rename_all = Some(value.value());
                        } else {
                            skip_meta(&inner)?;
                        }
                        Ok(())
                    })?;
                }
            } else {
                skip_meta(&meta)?;
            }
            Ok(())
        });
        if let Err(e) = parsed {
            errors.push(e);
        }
    }
    out
}

pub fn field_attrs(attrs: &[Attribute], errors: &mut Vec<syn::Error>) -> SerdeField {
    let mut out = SerdeField::default();
    for attr in serde_attrs(attrs) {
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                if meta.input.peek(Token![=]) {
                    let value: LitStr = meta.value()?.parse()?;
                    out.rename = Some(value.value());
                } else {
                    meta.parse_nested_meta(|inner| {
                        if inner.path.is_ident("serialize") {
                            let value: LitStr = inner.value()?.parse()?;
                            out.rename = Some(value.value());
                        } else {
                            skip_meta(&inner)?;
                        }
                        Ok(())
                    })?;
                }
            } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                out.skip = true;
            } else if meta.path.is_ident("flatten") {
                out.flatten = true;
            } else if meta.path.is_ident("default") || meta.path.is_ident("skip_serializing_if")
            {
                out.optional = true;
                skip_meta(&meta)?;
            } else {
                skip_meta(&meta)?;
            }
            Ok(())
        });
        if let Err(e) = parsed {
            errors.push(e);
        }
    }
    out
}

/// `#[repr(i32)]` and friends.
pub fn has_integer_repr(attrs: &[Attribute], errors: &mut Vec<syn::Error>) -> bool {
    const INTS: [&str; 12] = [
        "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize",
    ];
    let mut found = false;
    for attr in attrs.iter().filter(|a| a.path().is_ident("repr")) {
        let parsed = attr.parse_nested_meta(|meta| {
            if INTS.iter().any(|i| meta.path.is_ident(i)) {
                found = true;
            }
            skip_meta(&meta)
        });
        if let Err(e) = parsed {
            errors.push(e);
        }
    }
    found
}

/// Apply a serde `rename_all` rule to a field or variant name.
pub fn apply_rename_all(rule: &str, name: &str) -> String {
    match rule {
        "lowercase" => name.to_lowercase(),
        "UPPERCASE" => name.to_uppercase(),
        "PascalCase" => name.to_upper_camel_case(),
        "camelCase" => name.to_lower_camel_case(),
        "snake_case" => name.to_snake_case(),
        "SCREAMING_SNAKE_CASE" => name.to_shouty_snake_case(),
        "kebab-case" => name.to_kebab_case(),
        "SCREAMING-KEBAB-CASE" => name.to_shouty_kebab_case(),
        _ => name.to_string(),
    }
}

fn serde_attrs(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs.iter().filter(|a| a.path().is_ident("serde"))
}

/// Consume whatever follows an attribute key we do not interpret.
fn skip_meta(meta: &ParseNestedMeta<'_>) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        let _: syn::Expr = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|inner| skip_meta(&inner))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(src: &str) -> syn::Field {
        let item: syn::ItemStruct = syn::parse_str(src).unwrap();
        item.fields.into_iter().next().unwrap()
    }

    #[test]
    fn test_field_rename_and_default() {
        let f = field(
            r#"struct A { #[serde(with = "ts", rename = "userName", default)] user: String }"#,
        );
        let attrs = field_attrs(&f.attrs, &mut Vec::new());
        assert_eq!(attrs.rename.as_deref(), Some("userName"));
        assert!(attrs.optional);
        assert!(!attrs.skip);
    }

    #[test]
    fn test_field_skip_and_flatten() {
        let f = field("struct A { #[serde(skip)] #[serde(flatten)] inner: B }");
        let attrs = field_attrs(&f.attrs, &mut Vec::new());
        assert!(attrs.skip);
        assert!(attrs.flatten);
    }

    #[test]
    fn test_container_rename_all() {
        let item: syn::ItemStruct =
            syn::parse_str(r#"#[serde(deny_unknown_fields, rename_all = "camelCase")] struct A;"#)
                .unwrap();
        assert_eq!(
            container_attrs(&item.attrs, &mut Vec::new()).rename_all.as_deref(),
            Some("camelCase")
        );
    }

    #[test]
    fn test_malformed_attribute_is_reported() {
        let f = field(r#"struct A { #[serde(rename = "id", rename = )] user: String }"#);
        let mut errors = Vec::new();
        let attrs = field_attrs(&f.attrs, &mut errors);
        assert_eq!(attrs.rename.as_deref(), Some("id"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_integer_repr() {
        let item: syn::ItemEnum = syn::parse_str("#[repr(u8)] enum Level { Low = 1 }").unwrap();
        assert!(has_integer_repr(&item.attrs, &mut Vec::new()));
    }

    #[test]
    fn test_apply_rename_all() {
        assert_eq!(apply_rename_all("snake_case", "createdAt"), "created_at");
        assert_eq!(apply_rename_all("SCREAMING_SNAKE_CASE", "InStock"), "IN_STOCK");
        assert_eq!(apply_rename_all("lowercase", "InStock"), "instock");
    }
}
