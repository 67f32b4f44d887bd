use heck::{ToLowerCamelCase, ToSnakeCase};

use crate::config::NamingStrategy;

impl NamingStrategy {
    /// Emitted name of a declared property.
    pub fn apply(&self, declared: &str) -> String {
        match self {
            NamingStrategy::Original => declared.to_string(),
            NamingStrategy::SnakeCase => declared.to_snake_case(),
            NamingStrategy::LowerCamelCase => declared.to_lower_camel_case(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategies() {
        assert_eq!(NamingStrategy::Original.apply("UserName"), "UserName");
        assert_eq!(NamingStrategy::SnakeCase.apply("UserName"), "user_name");
        assert_eq!(NamingStrategy::LowerCamelCase.apply("UserName"), "userName");
        assert_eq!(NamingStrategy::LowerCamelCase.apply("created_at"), "createdAt");
        assert_eq!(NamingStrategy::SnakeCase.apply("HTTPCode"), "http_code");
    }
}
