use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use bridgegen_core::ir::ParsedAPI;
use bridgegen_core::{BridgegenConfig, GenerateOptions, Pipeline, ValidationOptions};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod diagnostic;
use diagnostic::Reporter;

const LOG_ENV: &str = "BRIDGEGEN_LOG";

#[derive(Parser, Debug)]
#[command(
    name = "bridgegen",
    version,
    about = "Generate Unity C# stubs and jslib glue from TypeScript bridge declarations"
)]
struct Cli {
    /// Path to bridgegen.toml (default: ./bridgegen.toml, then ~/.bridgegen.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose debug logging (or set BRIDGEGEN_LOG=debug)
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug, Clone)]
struct TierArgs {
    /// Skip the C# compile tier
    #[arg(long)]
    skip_compile: bool,
    /// Skip the tsc typecheck tier
    #[arg(long)]
    skip_typecheck: bool,
    /// Fail when the C# compiler or tsc cannot be found
    #[arg(long)]
    require_tools: bool,
}

impl TierArgs {
    fn options(&self) -> ValidationOptions {
        ValidationOptions {
            skip_compile: self.skip_compile,
            skip_typecheck: self.skip_typecheck,
            // Absent flag defers to the config file.
            require_tools: self.require_tools.then_some(true),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate stubs and glue from a declaration directory
    Generate {
        /// Directory of .d.ts files
        input: PathBuf,
        /// Output directory
        #[arg(short, long, default_value = "generated")]
        output: PathBuf,
        /// Bridge library version stamped into file headers
        #[arg(long, value_name = "VERSION")]
        tag: Option<String>,
        #[command(flatten)]
        tiers: TierArgs,
        /// List the files that would be written without writing them
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the extracted API surface
    Inspect {
        /// Directory of .d.ts files
        input: PathBuf,
        /// Print the full IR as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the validation tiers over an existing output directory
    Validate {
        /// Directory holding generated .cs and .jslib files
        dir: PathBuf,
        /// Declaration directory the output came from; enables the typecheck tier
        #[arg(long, value_name = "DIR")]
        source: Option<PathBuf>,
        #[command(flatten)]
        tiers: TierArgs,
    },
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn load_config(explicit: Option<&Path>) -> Result<BridgegenConfig> {
    let home = simple_home_dir::home_dir();
    let (config, found) = BridgegenConfig::discover(explicit, home.as_deref())
        .context("failed to load configuration")?;
    match found {
        Some(path) => debug!("using configuration from {}", path.display()),
        None => debug!("no configuration file found; using defaults"),
    }
    Ok(config)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            let _ = Reporter::stderr().error(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(cli.config.as_deref())?;
    let pipeline = Pipeline::new(&config);
    let mut reporter = Reporter::stderr();

    match cli.command {
        Command::Generate {
            input,
            output,
            tag,
            tiers,
            dry_run,
        } => {
            let outcome = pipeline
                .generate(&GenerateOptions {
                    input: input.clone(),
                    output,
                    sdk_tag: tag,
                    dry_run,
                    validation: tiers.options(),
                })
                .with_context(|| format!("failed to generate from {}", input.display()))?;

            reporter.diagnostics(&outcome.diagnostics)?;
            let verb = if outcome.written { "wrote" } else { "would write" };
            for path in &outcome.files {
                println!("{verb} {}", path.display());
            }
            let verb = if outcome.written { "removed" } else { "would remove" };
            for path in &outcome.stale {
                println!("{verb} {}", path.display());
            }
            println!(
                "{} APIs in {} categories",
                outcome.api_count,
                outcome.categories.len()
            );
            reporter.report(&outcome.report)?;
            Ok(exit_code(outcome.succeeded()))
        }
        Command::Inspect { input, json } => {
            let analysis = pipeline
                .analyze(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                for (category, apis) in analysis.grouped() {
                    println!("{category}");
                    for api in &apis {
                        println!("  {}", describe(api));
                    }
                }
                if !analysis.definitions.is_empty() {
                    println!("types");
                    for name in analysis.definitions.keys() {
                        println!("  {name}");
                    }
                }
                reporter.diagnostics(&analysis.diagnostics)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { dir, source, tiers } => {
            let report = pipeline
                .validate_dir(&dir, source.as_deref(), tiers.options())
                .with_context(|| format!("failed to validate {}", dir.display()))?;
            reporter.report(&report)?;
            Ok(exit_code(report.passed()))
        }
    }
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// One-line summary: `DisplayName(params) -> return [shape]`.
fn describe(api: &ParsedAPI) -> String {
    let params = api
        .parameters
        .iter()
        .map(|p| {
            let optional = if p.optional { "?" } else { "" };
            format!("{}{optional}: {}", p.name, p.ty.raw)
        })
        .collect::<Vec<_>>()
        .join(", ");
    let shape = if api.is_event_subscription {
        "event"
    } else if api.is_callback_based {
        "callback"
    } else if api.is_async {
        "async"
    } else {
        "sync"
    };
    format!(
        "{}({params}) -> {} [{shape}]",
        api.display_name, api.return_type.raw
    )
}
