use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use swg_core::config::{self, CONFIG_FILE_NAME, GenConfig, NamingStrategy, OutputType};
use swg_core::fault::Faults;
use swg_core::spec::Swagger;
use swg_gen::{BuildError, Gen};

#[derive(Parser)]
#[command(name = "swg", about = "Swagger 2.0 generator for annotated Rust services", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate swagger.json, swagger.yaml and docs.rs
    Generate {
        #[command(flatten)]
        source: SourceArgs,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Embed a generation timestamp in docs.rs
        #[arg(long)]
        generated_time: bool,

        /// Package name used in docs.rs
        #[arg(long)]
        package: Option<String>,

        /// File holding a docs.rs template
        #[arg(long)]
        template: Option<PathBuf>,

        /// Artifacts to produce (rust, json, yaml)
        #[arg(long, value_delimiter = ',')]
        output_types: Option<Vec<OutputType>>,
    },

    /// Print a summary of the operations and definitions that would be generated
    Inspect {
        #[command(flatten)]
        source: SourceArgs,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: InspectFormat,
    },

    /// Initialize a new swg configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Flags that select and interpret the annotated sources.
#[derive(Args)]
struct SourceArgs {
    /// Directories to search, comma separated
    #[arg(short = 'd', long = "dir", value_delimiter = ',')]
    dirs: Option<Vec<PathBuf>>,

    /// Entry-point file relative to the first search dir
    #[arg(short = 'g', long)]
    main_file: Option<PathBuf>,

    /// Property naming: original, snakecase or camelcase
    #[arg(long)]
    prop_naming: Option<NamingStrategy>,

    /// Also catalog types from the configured dependency dirs
    #[arg(long)]
    parse_dependency: bool,

    /// Dependency crate directories, comma separated
    #[arg(long, value_delimiter = ',')]
    dependency_dirs: Option<Vec<PathBuf>>,

    /// Directories to skip, comma separated
    #[arg(long, value_delimiter = ',')]
    exclude: Option<Vec<PathBuf>>,
}

impl SourceArgs {
    fn apply(self, cfg: &mut GenConfig) {
        if let Some(dirs) = self.dirs {
            cfg.search_dirs = dirs;
        }
        if let Some(main_file) = self.main_file {
            cfg.main_file = main_file;
        }
        if let Some(naming) = self.prop_naming {
            cfg.prop_naming = naming;
        }
        if self.parse_dependency {
            cfg.parse_dependency = true;
        }
        if let Some(dirs) = self.dependency_dirs {
            cfg.dependency_dirs = dirs;
        }
        if let Some(exclude) = self.exclude {
            cfg.exclude = exclude;
        }
    }
}

#[derive(Clone, ValueEnum)]
enum InspectFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            source,
            output,
            generated_time,
            package,
            template,
            output_types,
        } => {
            let mut cfg = try_load_config()?.unwrap_or_default();
            source.apply(&mut cfg);
            if let Some(output) = output {
                cfg.output_dir = output;
            }
            if generated_time {
                cfg.generated_time = true;
            }
            if let Some(package) = package {
                cfg.package_name = package;
            }
            if let Some(path) = template {
                let text = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read template {}", path.display()))?;
                cfg.template = Some(text);
            }
            if let Some(types) = output_types {
                cfg.output_types = types;
            }
            cmd_generate(cfg)
        }

        Commands::Inspect { source, format } => {
            let mut cfg = try_load_config()?.unwrap_or_default();
            source.apply(&mut cfg);
            cmd_inspect(cfg, format)
        }

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "swg", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Try to load the project config file from the current directory.
fn try_load_config() -> Result<Option<GenConfig>> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);
    config::load_config(&config_path).map_err(|e| anyhow::anyhow!(e))
}

fn report_faults(faults: &Faults) {
    for fault in faults.iter() {
        eprintln!("  warning: {fault}");
    }
}

/// Print the faults carried by a failed build before surfacing the error.
fn reported<T>(result: Result<T, BuildError>) -> Result<T, BuildError> {
    if let Some(faults) = result.as_ref().err().and_then(BuildError::faults) {
        report_faults(faults);
    }
    result
}

fn cmd_generate(cfg: GenConfig) -> Result<()> {
    log::debug!("effective config: {cfg:?}");
    let output_dir = cfg.output_dir.clone();
    eprintln!("Generating Swagger docs → {}", output_dir.display());

    let report = reported(Gen::new(cfg).build()).context("generation failed")?;
    report_faults(&report.faults);
    for name in &report.written {
        eprintln!("  wrote {}", output_dir.join(name).display());
    }

    eprintln!(
        "Generated {} operations and {} definitions ({} warnings)",
        report.swagger.operation_count(),
        report.swagger.definitions.len(),
        report.faults.len()
    );
    Ok(())
}

fn cmd_inspect(cfg: GenConfig, format: InspectFormat) -> Result<()> {
    let report = reported(Gen::new(cfg).generate()).context("inspection failed")?;
    let summary = build_inspect_summary(&report.swagger, &report.faults);

    match format {
        InspectFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&summary)?;
            print!("{}", yaml);
        }
        InspectFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn build_inspect_summary(swagger: &Swagger, faults: &Faults) -> serde_json::Value {
    let operations: Vec<serde_json::Value> = swagger
        .paths
        .iter()
        .flat_map(|(path, item)| {
            item.operations().map(move |(method, op)| {
                serde_json::json!({
                    "id": op.operation_id,
                    "method": method.as_str(),
                    "path": path,
                    "tags": op.tags,
                    "responses": op.responses.keys().collect::<Vec<_>>(),
                })
            })
        })
        .collect();

    let definitions: Vec<serde_json::Value> = swagger
        .definitions
        .iter()
        .map(|(name, schema)| {
            serde_json::json!({
                "name": name,
                "type": schema.schema_type,
                "properties": schema.properties.len(),
            })
        })
        .collect();

    serde_json::json!({
        "info": {
            "title": swagger.info.title,
            "version": swagger.info.version,
        },
        "operations": operations,
        "definitions": definitions,
        "faults": faults.iter().map(ToString::to_string).collect::<Vec<_>>(),
    })
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
