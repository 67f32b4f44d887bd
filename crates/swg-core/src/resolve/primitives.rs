use crate::schema::{Primitive, SchemaNode};

/// Schema for a Rust primitive or a lowercase schema name used in
/// annotations (`string`, `integer`, ...). These cannot be shadowed by
/// project types.
pub fn primitive(name: &str) -> Option<SchemaNode> {
    let (primitive, format) = match name {
        "String" | "str" | "char" | "string" => (Primitive::String, None),
        "i8" | "i16" | "i32" | "u8" | "u16" => (Primitive::Integer, Some("int32")),
        "i64" | "u32" | "u64" | "i128" | "u128" | "isize" | "usize" => {
            (Primitive::Integer, Some("int64"))
        }
        "integer" | "int" => (Primitive::Integer, None),
        "f32" => (Primitive::Number, Some("float")),
        "f64" => (Primitive::Number, Some("double")),
        "number" => (Primitive::Number, None),
        "bool" | "boolean" => (Primitive::Boolean, None),
        "file" => (Primitive::File, None),
        "object" => return Some(SchemaNode::object()),
        _ => return None,
    };
    Some(SchemaNode::primitive(primitive, format))
}

/// Schema for a common external crate type that serializes as a string,
/// number or free-form value. Only consulted when the catalog has no
/// declaration of that name.
pub fn well_known(name: &str) -> Option<SchemaNode> {
    let (primitive, format) = match name {
        "Uuid" => (Primitive::String, Some("uuid")),
        "DateTime" | "NaiveDateTime" | "SystemTime" | "OffsetDateTime" => {
            (Primitive::String, Some("date-time"))
        }
        "NaiveDate" => (Primitive::String, Some("date")),
        "PathBuf" | "Url" => (Primitive::String, None),
        "Decimal" => (Primitive::Number, None),
        "Value" => return Some(SchemaNode::object()),
        _ => return None,
    };
    Some(SchemaNode::primitive(primitive, format))
}

/// Either a primitive or a well-known external type.
pub fn builtin(name: &str) -> Option<SchemaNode> {
    primitive(name).or_else(|| well_known(name))
}

/// Types that serialize as their single type argument.
pub fn is_transparent(name: &str) -> bool {
    matches!(name, "Option" | "Box" | "Rc" | "Arc" | "Cow" | "RefCell" | "Cell")
}

pub fn is_sequence(name: &str) -> bool {
    matches!(
        name,
        "Vec" | "VecDeque" | "LinkedList" | "HashSet" | "BTreeSet" | "IndexSet"
    )
}

pub fn is_map(name: &str) -> bool {
    matches!(name, "HashMap" | "BTreeMap" | "IndexMap")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_formats() {
        assert_eq!(builtin("u16").unwrap().format.as_deref(), Some("int32"));
        assert_eq!(builtin("u32").unwrap().format.as_deref(), Some("int64"));
        assert_eq!(builtin("integer").unwrap().format, None);
    }

    #[test]
    fn test_well_known_types() {
        let uuid = builtin("Uuid").unwrap();
        assert_eq!(uuid.primitive_type(), Some(Primitive::String));
        assert_eq!(uuid.format.as_deref(), Some("uuid"));
        assert_eq!(builtin("Value"), Some(SchemaNode::object()));
        assert!(builtin("Pet").is_none());
        assert!(primitive("Uuid").is_none());
        assert_eq!(well_known("Decimal").unwrap().primitive_type(), Some(Primitive::Number));
    }
}
