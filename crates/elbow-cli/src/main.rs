//! elbow CLI - schema-driven HTTP API test suites

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use elbow_core::{Config, Options};
use elbow_runner::{SerialRunner, build_suite};

const CONFIG_FILE: &str = ".elbow.toml";

#[derive(Parser)]
#[command(name = "elbow")]
#[command(about = "Test HTTP APIs against JSON Schema contracts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Verbose output (debug logs on stderr)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List schema files and their endpoints
    List {
        /// Schema directory
        #[arg(default_value = "schema")]
        dir: PathBuf,

        /// Extra schema file extensions (default: json)
        #[arg(long = "ext")]
        extensions: Vec<String>,
    },

    /// Run the test suite against a server
    Run(RunArgs),

    /// Initialize config file
    Init,

    /// Export JSON Schema for the report format
    ReportSchema,
}

#[derive(Args)]
struct RunArgs {
    /// Base URL of the server under test (overrides config)
    base_url: Option<String>,

    /// Schema directory (overrides config)
    dir: Option<PathBuf>,

    /// Config file (default: .elbow.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Per-case timeout in milliseconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Seed a variable, KEY=VALUE (repeatable)
    #[arg(long = "var", value_parser = parse_var)]
    vars: Vec<(String, String)>,

    /// Run the setup chain (DIR/setup) before the suite
    #[arg(long)]
    before: bool,

    /// Base URL for the setup chain
    #[arg(long)]
    before_base_url: Option<String>,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn parse_var(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::List { dir, extensions } => {
            let mut options = Options::default();
            options.extensions.extend(extensions);
            list(&dir, &options, cli.output)
        }

        Commands::Run(args) => {
            let cfg = resolve_config(args)?;
            run_suite(cfg, cli.output)
        }

        Commands::Init => {
            if Path::new(CONFIG_FILE).exists() {
                eprintln!("{CONFIG_FILE} already exists");
                return Ok(1);
            }

            std::fs::write(CONFIG_FILE, Config::example())
                .with_context(|| format!("cannot write {CONFIG_FILE}"))?;
            println!("Created {CONFIG_FILE}");
            println!("\nEdit the file to configure:");
            println!("  - base_url: server to test");
            println!("  - schema_dir: where your schema files live");
            println!("  - headers / query / body: defaults for every request");
            println!("  - vars: initial values for ${{name}} placeholders");
            Ok(0)
        }

        Commands::ReportSchema => {
            println!("{}", elbow_core::report::generate_schema());
            Ok(0)
        }
    }
}

/// Config file (or defaults) with command-line flags applied on top.
fn resolve_config(args: RunArgs) -> Result<Config> {
    let mut cfg = if let Some(path) = &args.config {
        tracing::debug!(path = %path.display(), "loading config");
        Config::load(path)?
    } else {
        Config::load_default()?
    };

    if let Some(base_url) = args.base_url {
        cfg.base_url = base_url;
    }
    if let Some(dir) = args.dir {
        cfg.schema_dir = dir;
    }
    if args.timeout.is_some() {
        cfg.options.timeout_ms = args.timeout;
    }
    for (k, v) in args.vars {
        tracing::debug!(variable = %k, "seeded from command line");
        cfg.options.vars.set(k, v);
    }
    cfg.options.before |= args.before;
    if args.before_base_url.is_some() {
        cfg.options.before_base_url = args.before_base_url;
    }

    tracing::debug!(
        base_url = %cfg.base_url,
        schema_dir = %cfg.schema_dir.display(),
        timeout_ms = ?cfg.options.timeout_ms,
        before = cfg.options.before,
        "resolved config"
    );
    Ok(cfg)
}

fn list(dir: &Path, options: &Options, output: OutputFormat) -> Result<i32> {
    let schemas = match elbow_core::list_schemas(dir, options) {
        Ok(schemas) => schemas,
        Err(e) => {
            eprintln!("Error: {e}");
            return Ok(1);
        }
    };

    match output {
        OutputFormat::Terminal => {
            if schemas.is_empty() {
                println!("no schema found");
            }
            for schema in &schemas {
                println!(
                    "  {} {} ({}) -> {}",
                    schema.methods.join(","),
                    schema.endpoint,
                    schema.description,
                    schema.filepath.display()
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&schemas)?),
        OutputFormat::Silent => {}
    }
    Ok(0)
}

fn run_suite(cfg: Config, output: OutputFormat) -> Result<i32> {
    if cfg.base_url.is_empty() {
        bail!("no base URL: pass one or set base_url in {CONFIG_FILE}");
    }

    if cfg.options.before {
        tracing::info!(
            base_url = cfg.options.before_base_url.as_deref().unwrap_or(&cfg.base_url),
            "setup chain enabled"
        );
    }

    let mut runner = SerialRunner::new();
    build_suite(&mut runner, &cfg.base_url, &cfg.schema_dir, cfg.options)
        .with_context(|| format!("cannot build suite from {}", cfg.schema_dir.display()))?;

    let report = runner.run();

    if report.total == 0 && output != OutputFormat::Silent {
        eprintln!("Error: no test cases. Check the schema directory and extensions.");
    }

    match output {
        OutputFormat::Terminal => println!("{}", report.to_terminal()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Silent => {}
    }

    Ok(report.exit_code())
}
