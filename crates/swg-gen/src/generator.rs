//! The end-to-end build: walk, parse, catalog, resolve, assemble, emit.

use std::fs;
use std::path::{Path, PathBuf};

use swg_core::GeneratedFile;
use swg_core::assemble::assemble;
use swg_core::catalog::Catalog;
use swg_core::config::{GenConfig, OutputType};
use swg_core::error::ConfigError;
use swg_core::fault::{FaultKind, Faults, SourceLocation};
use swg_core::general::{GeneralInfo, parse_general_info};
use swg_core::operation::{Operation, build_operation};
use swg_core::resolve::Resolver;
use swg_core::source::{SourceModule, error_line};
use swg_core::spec::Swagger;
use swg_emit::{
    EmitError, Rustfmt, SourceFormatter, StubOptions, format_or_original, json_to_yaml,
    render_stub, to_json,
};

use crate::error::{ArtifactError, BuildError};
use crate::sink::{DirSink, OutputSink};
use crate::walk::rust_files;

/// Outcome of a successful build. Faults list everything that degraded the
/// document without aborting it.
#[derive(Debug)]
pub struct BuildReport {
    pub swagger: Swagger,
    pub faults: Faults,
    /// Names of the artifacts handed to the sink, in write order.
    pub written: Vec<String>,
}

/// A configured generator. Each build starts from scratch.
pub struct Gen {
    config: GenConfig,
    formatter: Box<dyn SourceFormatter>,
}

impl Gen {
    pub fn new(config: GenConfig) -> Self {
        Self {
            config,
            formatter: Box::new(Rustfmt::default()),
        }
    }

    /// Replace the formatter applied to `docs.rs`.
    pub fn with_formatter(mut self, formatter: impl SourceFormatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    pub fn config(&self) -> &GenConfig {
        &self.config
    }

    /// Build and write the configured artifacts into the output directory.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        self.config.validate()?;
        let output_dir = &self.config.output_dir;
        fs::create_dir_all(output_dir).map_err(|source| ConfigError::OutputNotWritable {
            path: output_dir.clone(),
            source,
        })?;
        let mut sink = DirSink::new(output_dir);
        self.build_with_sink(&mut sink)
    }

    /// Build and hand the artifacts to `sink`.
    ///
    /// Every artifact is rendered before the first write. Artifacts that
    /// fail to render are reported after the others have been committed.
    pub fn build_with_sink(&self, sink: &mut dyn OutputSink) -> Result<BuildReport, BuildError> {
        let mut report = self.generate()?;
        let (files, failures) = self.render(&report.swagger);

        for file in &files {
            sink.write(&file.path, file.content.as_bytes())?;
        }
        sink.commit()?;
        report.written = files.into_iter().map(|file| file.path).collect();

        if !failures.is_empty() {
            return Err(BuildError::Artifacts {
                failures,
                faults: report.faults,
            });
        }
        log::info!(
            "generated {} operations, {} definitions, {} faults",
            report.swagger.operation_count(),
            report.swagger.definitions.len(),
            report.faults.len()
        );
        Ok(report)
    }

    /// Produce the document without rendering or writing anything.
    pub fn generate(&self) -> Result<BuildReport, BuildError> {
        self.config.validate()?;
        let mut faults = Faults::new();

        let mut modules = Vec::new();
        for dir in &self.config.search_dirs {
            modules.extend(self.parse_tree(dir, &[], &mut faults));
        }
        let local = modules.len();
        if self.config.parse_dependency {
            for dir in &self.config.dependency_dirs {
                let prefix = crate_name(dir).into_iter().collect::<Vec<_>>();
                modules.extend(self.parse_tree(dir, &prefix, &mut faults));
            }
        }

        let mut catalog = Catalog::new();
        for module in &modules {
            catalog.add_module(module);
        }
        log::debug!("cataloged {} types from {} modules", catalog.len(), modules.len());

        let general = self.general_info(&mut faults)?;

        let mut operations: Vec<Operation> = modules[..local]
            .iter()
            .flat_map(|module| module.handlers.iter())
            .filter_map(|handler| build_operation(handler, &mut faults))
            .collect();
        if operations.is_empty() {
            return Err(BuildError::NoOperations { faults });
        }

        let mut resolver = Resolver::new(&catalog);
        for op in &mut operations {
            resolver.resolve_operation(op);
        }
        let (definitions, resolve_faults) = resolver.into_parts();
        faults.extend(resolve_faults);

        let (swagger, assemble_faults) =
            assemble(&general, &operations, &definitions, self.config.prop_naming);
        faults.extend(assemble_faults);

        Ok(BuildReport {
            swagger,
            faults,
            written: Vec::new(),
        })
    }

    /// Parse every `.rs` file under `root`. Unreadable or unparsable files
    /// become source faults.
    fn parse_tree(&self, root: &Path, prefix: &[String], faults: &mut Faults) -> Vec<SourceModule> {
        let mut exclude = self.config.exclude.clone();
        exclude.push(self.config.output_dir.clone());

        let mut modules = Vec::new();
        for file in rust_files(root, &exclude, faults) {
            let text = match fs::read_to_string(&file) {
                Ok(text) => text,
                Err(e) => {
                    let location = SourceLocation::new(&file, 0);
                    faults.push(FaultKind::Source, Some(&location), e.to_string());
                    continue;
                }
            };
            let mut module_path = prefix.to_vec();
            module_path.extend(SourceModule::module_path_for(root, &file));
            match SourceModule::parse(&file, module_path, &text) {
                Ok(mut module) => {
                    faults.extend(std::mem::take(&mut module.faults));
                    modules.push(module);
                }
                Err(e) => {
                    let location = SourceLocation::new(&file, error_line(&e));
                    faults.push(FaultKind::Source, Some(&location), e.to_string());
                }
            }
        }
        modules
    }

    /// General API info from the entry point's `//!` docs and `fn main` docs.
    fn general_info(&self, faults: &mut Faults) -> Result<GeneralInfo, ConfigError> {
        let entry = self.config.entry_point().ok_or(ConfigError::NoSearchDir)?;
        let text = fs::read_to_string(&entry).map_err(|source| {
            ConfigError::EntryPointUnreadable {
                path: entry.clone(),
                source,
            }
        })?;
        let module = match SourceModule::parse(&entry, Vec::new(), &text) {
            Ok(module) => module,
            Err(e) => {
                let location = SourceLocation::new(&entry, error_line(&e));
                faults.push(FaultKind::Source, Some(&location), e.to_string());
                return Ok(GeneralInfo::default());
            }
        };

        let mut lines = module.inner_docs.clone();
        if let Some(docs) = module.main_docs() {
            lines.extend_from_slice(docs);
        }
        Ok(parse_general_info(&lines, &entry, faults))
    }

    /// Render the configured artifacts. YAML and `docs.rs` are derived from
    /// the JSON encoding, never from the document directly.
    fn render(&self, swagger: &Swagger) -> (Vec<GeneratedFile>, Vec<ArtifactError>) {
        let mut files = Vec::new();
        let mut failures = Vec::new();
        let mut seen = Vec::new();

        for output in &self.config.output_types {
            if seen.contains(output) {
                continue;
            }
            seen.push(*output);

            let path = output.file_name().to_string();
            match self.render_one(*output, swagger) {
                Ok(content) => files.push(GeneratedFile { path, content }),
                Err(error) => failures.push(ArtifactError { file: path, error }),
            }
        }
        (files, failures)
    }

    fn render_one(&self, output: OutputType, swagger: &Swagger) -> Result<String, EmitError> {
        let json = to_json(swagger)?;
        match output {
            OutputType::Json => Ok(json),
            OutputType::Yaml => json_to_yaml(&json),
            OutputType::Rust => {
                let options = StubOptions {
                    package: &self.config.package_name,
                    generated_time: self.config.generated_time,
                    template: self.config.template.as_deref(),
                };
                let stub = render_stub(swagger, &json, &options)?;
                Ok(format_or_original(self.formatter.as_ref(), stub))
            }
        }
    }
}

/// Module prefix for a dependency directory: its name with `-` as `_`.
fn crate_name(dir: &Path) -> Option<String> {
    let dir = fs::canonicalize(dir).unwrap_or_else(|_| PathBuf::from(dir));
    dir.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.replace('-', "_"))
}
