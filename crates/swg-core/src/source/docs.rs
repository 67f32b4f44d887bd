use syn::spanned::Spanned;
use syn::{Attribute, Expr, Lit, Meta};

/// One line of a doc comment with its 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocLine {
    pub text: String,
    pub line: usize,
}

impl DocLine {
    pub fn new(text: impl Into<String>, line: usize) -> Self {
        Self {
            text: text.into(),
            line,
        }
    }
}

/// Collect outer (`///`, `/** */`) doc lines from attributes.
pub fn outer_doc_lines(attrs: &[Attribute]) -> Vec<DocLine> {
    doc_lines(attrs, |attr| matches!(attr.style, syn::AttrStyle::Outer))
}

/// Collect inner (`//!`) doc lines from attributes.
pub fn inner_doc_lines(attrs: &[Attribute]) -> Vec<DocLine> {
    doc_lines(attrs, |attr| matches!(attr.style, syn::AttrStyle::Inner(_)))
}

fn doc_lines(attrs: &[Attribute], keep: impl Fn(&Attribute) -> bool) -> Vec<DocLine> {
    let mut lines = Vec::new();
    for attr in attrs.iter().filter(|a| a.path().is_ident("doc") && keep(a)) {
        let Meta::NameValue(nv) = &attr.meta else {
            continue;
        };
        let Expr::Lit(expr) = &nv.value else {
            continue;
        };
        let Lit::Str(text) = &expr.lit else {
            continue;
        };
        let start = attr.span().start().line;
        // Block comments carry several lines in one attribute.
        for (offset, line) in text.value().lines().enumerate() {
            lines.push(DocLine::new(line.trim(), start + offset));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outer_lines_with_numbers() {
        let file: syn::File = syn::parse_str(
            "\n/// @Summary List pets\n///   @Tags pets\nfn list() {}\n",
        )
        .unwrap();
        let syn::Item::Fn(f) = &file.items[0] else {
            panic!("expected fn");
        };
        let lines = outer_doc_lines(&f.attrs);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], DocLine::new("@Summary List pets", 2));
        assert_eq!(lines[1], DocLine::new("@Tags pets", 3));
    }

    #[test]
    fn test_inner_lines() {
        let file: syn::File = syn::parse_str("//! @title Pet API\n//! @version 1.0\n").unwrap();
        let lines = inner_doc_lines(&file.attrs);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].text, "@version 1.0");
        assert!(outer_doc_lines(&file.attrs).is_empty());
    }
}
