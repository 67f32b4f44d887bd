use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level generation configuration loaded from `.swg.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    /// Roots that are walked for `.rs` modules. The first one anchors `main_file`.
    pub search_dirs: Vec<PathBuf>,
    /// Entry-point file, relative to the first search dir, carrying the general API info.
    pub main_file: PathBuf,
    pub output_dir: PathBuf,
    pub prop_naming: NamingStrategy,
    /// Also catalog types from `dependency_dirs`.
    pub parse_dependency: bool,
    pub dependency_dirs: Vec<PathBuf>,
    /// Directories skipped while walking.
    pub exclude: Vec<PathBuf>,
    /// Embed a generation timestamp in `docs.rs`.
    pub generated_time: bool,
    /// Module name used in the generated `docs.rs`.
    pub package_name: String,
    pub output_types: Vec<OutputType>,
    /// Template text for `docs.rs`. The bundled template is used when unset.
    pub template: Option<String>,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            search_dirs: vec![PathBuf::from("./")],
            main_file: PathBuf::from("src/main.rs"),
            output_dir: PathBuf::from("./docs"),
            prop_naming: NamingStrategy::default(),
            parse_dependency: false,
            dependency_dirs: Vec::new(),
            exclude: Vec::new(),
            generated_time: false,
            package_name: "docs".to_string(),
            output_types: vec![OutputType::Rust, OutputType::Json, OutputType::Yaml],
            template: None,
        }
    }
}

impl GenConfig {
    /// Absolute-or-relative path of the entry-point file.
    pub fn entry_point(&self) -> Option<PathBuf> {
        self.search_dirs.first().map(|dir| dir.join(&self.main_file))
    }

    /// Check that the search dirs and entry point exist.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search_dirs.is_empty() {
            return Err(ConfigError::NoSearchDir);
        }
        for dir in &self.search_dirs {
            if !dir.is_dir() {
                return Err(ConfigError::SearchDirNotFound(dir.clone()));
            }
        }
        match self.entry_point() {
            Some(entry) if entry.is_file() => Ok(()),
            Some(entry) => Err(ConfigError::EntryPointNotFound(entry)),
            None => Err(ConfigError::NoSearchDir),
        }
    }
}

/// How declared property names are emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
pub enum NamingStrategy {
    #[default]
    #[serde(rename = "original")]
    Original,
    #[serde(rename = "snakecase", alias = "snake_case")]
    SnakeCase,
    #[serde(rename = "camelcase", alias = "lowerCamelCase")]
    LowerCamelCase,
}

impl FromStr for NamingStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "original" | "" => Ok(NamingStrategy::Original),
            "snakecase" | "snake_case" => Ok(NamingStrategy::SnakeCase),
            "camelcase" | "lowerCamelCase" => Ok(NamingStrategy::LowerCamelCase),
            other => Err(ConfigError::UnknownNamingStrategy(other.to_string())),
        }
    }
}

/// Which artifacts are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    Rust,
    Json,
    Yaml,
}

impl OutputType {
    pub fn file_name(&self) -> &'static str {
        match self {
            OutputType::Rust => "docs.rs",
            OutputType::Json => "swagger.json",
            OutputType::Yaml => "swagger.yaml",
        }
    }
}

impl FromStr for OutputType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "rust" | "rs" => Ok(OutputType::Rust),
            "json" => Ok(OutputType::Json),
            "yaml" | "yml" => Ok(OutputType::Yaml),
            other => Err(ConfigError::UnknownOutputType(other.to_string())),
        }
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".swg.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<GenConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: GenConfig =
        serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# swg configuration
search_dirs:
  - ./
main_file: src/main.rs      # relative to the first search dir
output_dir: ./docs
prop_naming: original       # original | snakecase | camelcase
parse_dependency: false
dependency_dirs: []
  # - ../shared-models
exclude: []
generated_time: false
package_name: docs
output_types: [rust, json, yaml]
# template: |
#   custom docs.rs template text
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GenConfig::default();
        assert_eq!(config.search_dirs, vec![PathBuf::from("./")]);
        assert_eq!(config.main_file, PathBuf::from("src/main.rs"));
        assert_eq!(config.prop_naming, NamingStrategy::Original);
        assert!(!config.parse_dependency);
        assert!(!config.generated_time);
        assert_eq!(config.package_name, "docs");
        assert_eq!(config.output_types.len(), 3);
        assert!(config.template.is_none());
    }

    #[test]
    fn test_parse_config_yaml() {
        let yaml = r#"
search_dirs: [api, shared]
main_file: src/lib.rs
output_dir: gen/docs
prop_naming: snakecase
parse_dependency: true
dependency_dirs: [../models]
generated_time: true
package_name: apidocs
output_types: [json]
"#;
        let config: GenConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.search_dirs.len(), 2);
        assert_eq!(config.main_file, PathBuf::from("src/lib.rs"));
        assert_eq!(config.output_dir, PathBuf::from("gen/docs"));
        assert_eq!(config.prop_naming, NamingStrategy::SnakeCase);
        assert!(config.parse_dependency);
        assert_eq!(config.dependency_dirs, vec![PathBuf::from("../models")]);
        assert!(config.generated_time);
        assert_eq!(config.package_name, "apidocs");
        assert_eq!(config.output_types, vec![OutputType::Json]);
    }

    #[test]
    fn test_parse_minimal_config() {
        let yaml = "prop_naming: camelcase\n";
        let config: GenConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.prop_naming, NamingStrategy::LowerCamelCase);
        // Defaults applied
        assert_eq!(config.output_dir, PathBuf::from("./docs"));
        assert_eq!(config.package_name, "docs");
    }

    #[test]
    fn test_default_content_parses() {
        let config: GenConfig = serde_yaml_ng::from_str(default_config_content()).unwrap();
        assert_eq!(config.main_file, PathBuf::from("src/main.rs"));
        assert_eq!(config.output_types.len(), 3);
    }

    #[test]
    fn test_naming_strategy_from_str() {
        assert_eq!("snakecase".parse::<NamingStrategy>().unwrap(), NamingStrategy::SnakeCase);
        assert_eq!(
            "camelcase".parse::<NamingStrategy>().unwrap(),
            NamingStrategy::LowerCamelCase
        );
        assert!("kebab".parse::<NamingStrategy>().is_err());
    }

    #[test]
    fn test_validate_missing_search_dir() {
        let config = GenConfig {
            search_dirs: vec![PathBuf::from("./definitely/not/here")],
            ..GenConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SearchDirNotFound(_))
        ));
    }
}
