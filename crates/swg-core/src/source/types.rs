use std::fmt;

use quote::ToTokens;

use crate::resolve::primitives;

/// A type reference, reduced from Rust syntax to what schema resolution needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// `a::b::Name<Args>`; generic arguments belong to the last segment.
    Path {
        segments: Vec<String>,
        args: Vec<TypeExpr>,
    },
    /// Slices and fixed-size arrays.
    Array(Box<TypeExpr>),
    /// Tuples; the empty tuple is the unit type.
    Tuple(Vec<TypeExpr>),
    /// Anything that has no schema counterpart (trait objects, fn pointers, ...).
    Opaque(String),
}

impl TypeExpr {
    /// Parse a type written in an annotation, e.g. `Vec<models::Pet>`.
    pub fn parse(text: &str) -> Option<TypeExpr> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        syn::parse_str::<syn::Type>(trimmed)
            .ok()
            .map(|ty| TypeExpr::from_syn(&ty))
    }

    pub fn named(name: &str) -> TypeExpr {
        TypeExpr::Path {
            segments: name.split("::").map(str::to_string).collect(),
            args: Vec::new(),
        }
    }

    pub fn from_syn(ty: &syn::Type) -> TypeExpr {
        match ty {
            syn::Type::Path(tp) if tp.qself.is_none() => {
                let segments = tp
                    .path
                    .segments
                    .iter()
                    .map(|s| s.ident.to_string())
                    .collect();
                let args = match tp.path.segments.last().map(|s| &s.arguments) {
                    Some(syn::PathArguments::AngleBracketed(generic)) => generic
                        .args
                        .iter()
                        .filter_map(|arg| match arg {
                            syn::GenericArgument::Type(t) => Some(TypeExpr::from_syn(t)),
                            _ => None,
                        })
                        .collect(),
                    _ => Vec::new(),
                };
                TypeExpr::Path { segments, args }
            }
            syn::Type::Reference(r) => TypeExpr::from_syn(&r.elem),
            syn::Type::Paren(p) => TypeExpr::from_syn(&p.elem),
            syn::Type::Group(g) => TypeExpr::from_syn(&g.elem),
            syn::Type::Slice(s) => TypeExpr::Array(Box::new(TypeExpr::from_syn(&s.elem))),
            syn::Type::Array(a) => TypeExpr::Array(Box::new(TypeExpr::from_syn(&a.elem))),
            syn::Type::Tuple(t) => TypeExpr::Tuple(t.elems.iter().map(TypeExpr::from_syn).collect()),
            other => TypeExpr::Opaque(other.to_token_stream().to_string()),
        }
    }

    /// Last path segment, if this is a path.
    pub fn ident(&self) -> Option<&str> {
        match self {
            TypeExpr::Path { segments, .. } => segments.last().map(String::as_str),
            _ => None,
        }
    }

    /// Generic arguments of a path type.
    pub fn args(&self) -> &[TypeExpr] {
        match self {
            TypeExpr::Path { args, .. } => args,
            _ => &[],
        }
    }

    /// `Option<T>` at the top level.
    pub fn is_option(&self) -> bool {
        self.ident() == Some("Option") && self.args().len() == 1
    }

    /// Strip wrappers that serialize as their single type argument.
    pub fn peel_wrappers(&self) -> &TypeExpr {
        match self {
            TypeExpr::Path { args, .. }
                if args.len() == 1 && self.ident().is_some_and(primitives::is_transparent) =>
            {
                args[0].peel_wrappers()
            }
            other => other,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Path { segments, args } => {
                write!(f, "{}", segments.join("::"))?;
                if !args.is_empty() {
                    let rendered: Vec<String> = args.iter().map(ToString::to_string).collect();
                    write!(f, "<{}>", rendered.join(", "))?;
                }
                Ok(())
            }
            TypeExpr::Array(inner) => write!(f, "[{inner}]"),
            TypeExpr::Tuple(items) => {
                let rendered: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "({})", rendered.join(", "))
            }
            TypeExpr::Opaque(text) => write!(f, "{text}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_generic() {
        let ty = TypeExpr::parse("HashMap<String, Vec<models::Pet>>").unwrap();
        assert_eq!(ty.ident(), Some("HashMap"));
        assert_eq!(ty.args().len(), 2);
        assert_eq!(ty.to_string(), "HashMap<String, Vec<models::Pet>>");
    }

    #[test]
    fn test_parse_reference_and_slice() {
        let ty = TypeExpr::parse("&[u8]").unwrap();
        assert_eq!(ty, TypeExpr::Array(Box::new(TypeExpr::named("u8"))));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(TypeExpr::parse("{object}").is_none());
        assert!(TypeExpr::parse("").is_none());
    }

    #[test]
    fn test_option_peel() {
        let ty = TypeExpr::parse("Option<Box<Node>>").unwrap();
        assert!(ty.is_option());
        assert_eq!(ty.peel_wrappers(), &TypeExpr::named("Node"));
    }

    #[test]
    fn test_cow_peels_like_other_wrappers() {
        let ty = TypeExpr::parse("Option<Cow<'a, str>>").unwrap();
        assert_eq!(ty.peel_wrappers(), &TypeExpr::named("str"));
        let ty = TypeExpr::parse("Arc<RefCell<Node>>").unwrap();
        assert_eq!(ty.peel_wrappers(), &TypeExpr::named("Node"));
    }
}
