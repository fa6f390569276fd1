//! metaguard command-line tool.
//!
//! Runs the retrieve postconditions against a local project: asks before
//! overwriting components that already exist and refuses to continue when
//! the project has diverged from the tracked baseline.

mod panel;
mod prompt;
mod style;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use tracing::info;
use tracing_subscriber::EnvFilter;

use metaguard_core::conflict::{BaselineConflictDetector, ConflictDetectionChecker, ConflictServices};
use metaguard_core::metadata::{MetadataRegistry, PathStrategy};
use metaguard_core::notify::{Notifier, TracingTelemetry};
use metaguard_core::overwrite::{ExistenceProber, OverwriteComponentPrompt};
use metaguard_core::{
    CompositeChecker, Decision, LocalComponent, MetaguardConfig, Payload, PostconditionChecker,
    Workspace,
};

use panel::TablePanel;
use prompt::DialoguerNotifier;

const DEFAULT_CONFIG: &str = "~/.config/metaguard/config.toml";

/// Source layout below the package directory.
const PACKAGE_SUBDIR: &str = "main/default";

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// metaguard command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "metaguard",
    version,
    about = "Check a metadata retrieve before it overwrites local work"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the retrieve postconditions for a set of components.
    Check {
        /// Component as `Type:Name`, or just `Type` for every component of a type.
        #[arg(long = "component", conflicts_with_all = ["path", "manifest"])]
        components: Vec<String>,

        /// Source file or metadata directory to retrieve into.
        #[arg(long, conflicts_with = "manifest")]
        path: Option<PathBuf>,

        /// Manifest describing the retrieve.
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Command name shown in conflict warnings.
        #[arg(long, default_value = "retrieve")]
        operation: String,

        /// Skip conflict detection.
        #[arg(long)]
        no_conflicts: bool,
    },

    /// List known metadata types.
    Types,

    /// Validate a configuration file.
    Validate,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let path = expand_tilde(&cli.config);
    let is_default = cli.config == DEFAULT_CONFIG;

    match cli.command {
        Commands::Check {
            components,
            path: target_path,
            manifest,
            operation,
            no_conflicts,
        } => {
            let config = load_config(&path, is_default)?;
            init_logging(&config.workspace.log_level);
            let target = Target::from_args(components, target_path, manifest)?;
            cmd_check(config, target, &operation, no_conflicts).await
        }
        Commands::Types => {
            let config = load_config(&path, is_default)?;
            init_logging(&config.workspace.log_level);
            cmd_types(&config);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate => {
            init_logging("warn");
            cmd_validate(&path)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

/// Load and resolve the configuration. A missing file at the default
/// location yields the default configuration.
fn load_config(path: &Path, is_default: bool) -> Result<MetaguardConfig> {
    if is_default && !path.exists() {
        let mut config = MetaguardConfig::default();
        config
            .resolve_env_vars()
            .context("failed to resolve environment variables")?;
        return Ok(config);
    }
    let mut config =
        MetaguardConfig::load_from_file(path).context("failed to load configuration file")?;
    config
        .resolve_env_vars()
        .context("failed to resolve environment variables")?;
    Ok(config)
}

/// Expand `~` to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

/// What the retrieve targets.
#[derive(Debug)]
enum Target {
    Components(Vec<String>),
    Path(PathBuf),
    Manifest(PathBuf),
}

impl Target {
    fn from_args(
        components: Vec<String>,
        path: Option<PathBuf>,
        manifest: Option<PathBuf>,
    ) -> Result<Self> {
        match (components.is_empty(), path, manifest) {
            (_, _, Some(manifest)) => Ok(Self::Manifest(manifest)),
            (_, Some(path), None) => Ok(Self::Path(path)),
            (false, None, None) => Ok(Self::Components(components)),
            (true, None, None) => {
                anyhow::bail!("nothing to check: pass --component, --path or --manifest")
            }
        }
    }
}

/// Parse `Type:Name` (or a bare `Type`) into a component placed under the
/// type's directory in the package.
fn parse_component(
    arg: &str,
    registry: &dyn MetadataRegistry,
    outputdir: &str,
) -> Result<LocalComponent> {
    let (component_type, name) = match arg.split_once(':') {
        Some((t, n)) => (t.trim(), Some(n.trim())),
        None => (arg.trim(), None),
    };
    if component_type.is_empty() {
        anyhow::bail!("invalid component '{}': expected Type:Name", arg);
    }

    let Some(name) = name.filter(|n| !n.is_empty()) else {
        return Ok(LocalComponent::type_only(component_type));
    };

    let dir = match registry.lookup_by_type(component_type) {
        Some(info) => Path::new(outputdir).join(PACKAGE_SUBDIR).join(&info.directory),
        None => Path::new(outputdir).join(PACKAGE_SUBDIR),
    };
    Ok(LocalComponent::new(
        name,
        component_type,
        dir.to_string_lossy().into_owned(),
    ))
}

/// Component for a `--path` target, so the overwrite prompt can probe it.
fn path_payload(
    workspace: &Workspace,
    registry: &dyn MetadataRegistry,
    path: &Path,
) -> Result<Payload> {
    let component = workspace.component_for_path(registry, path);
    if component.component_type.is_empty() {
        anyhow::bail!("no metadata type matches {}", path.display());
    }
    Ok(Payload::Component(component))
}

async fn cmd_check(
    mut config: MetaguardConfig,
    target: Target,
    operation: &str,
    no_conflicts: bool,
) -> Result<ExitCode> {
    if no_conflicts {
        config.conflict.enabled = false;
    }
    config.validate().context("invalid configuration")?;

    let workspace = Workspace::new(&config.workspace.root);
    let registry: Arc<dyn MetadataRegistry> = Arc::new(config.metadata_dictionary());
    let notifier: Arc<dyn Notifier> = Arc::new(DialoguerNotifier);

    let (payload, manifest_mode) = match target {
        Target::Components(args) => {
            let components = args
                .iter()
                .map(|a| parse_component(a, registry.as_ref(), &config.conflict.outputdir))
                .collect::<Result<Vec<_>>>()?;
            (Payload::Components(components), false)
        }
        Target::Path(path) => (path_payload(&workspace, registry.as_ref(), &path)?, false),
        Target::Manifest(path) => (Payload::Path(path), true),
    };

    let mut pipeline = CompositeChecker::default().with(OverwriteComponentPrompt::new(
        ExistenceProber::new(registry.clone(), workspace.clone()),
        notifier.clone(),
        Arc::new(TracingTelemetry),
    ));
    if config.conflict.enabled {
        let detector = BaselineConflictDetector::new(
            registry.clone(),
            workspace.clone(),
            &config.conflict.baseline_dir,
        );
        pipeline = pipeline.with(ConflictDetectionChecker::new(
            operation,
            manifest_mode,
            config.conflict_settings(),
            workspace,
            ConflictServices {
                registry,
                detector: Arc::new(detector),
                view: Arc::new(TablePanel::new()),
                notifier,
            },
        ));
    }
    info!(checkers = pipeline.len(), operation, "running postconditions");

    let decision = pipeline
        .check(Decision::Continue(payload))
        .await
        .context("postcondition check failed")?;

    match decision {
        Decision::Continue(data) => {
            println!();
            println!("{}", style::header(&format!("Ready to {operation}")));
            print_payload(&data);
            println!();
            Ok(ExitCode::SUCCESS)
        }
        Decision::Cancel(reason) => {
            println!("{}", style::warn(&format!("{operation} cancelled: {reason}")));
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_payload(data: &Payload) {
    match data {
        Payload::Component(c) => print_component(c),
        Payload::Components(cs) => cs.iter().for_each(print_component),
        Payload::Path(p) => println!("{}", style::success(&p.display().to_string())),
        Payload::Record(r) => {
            for (key, value) in r {
                println!("  {} {}", style::dim(&format!("{key}:")), value);
            }
        }
    }
}

fn print_component(c: &LocalComponent) {
    let label = if c.is_type_only() {
        style::component(&c.component_type, "*")
    } else {
        style::component(&c.component_type, &c.file_name)
    };
    println!("{}", style::success(&label));
}

// ---------------------------------------------------------------------------
// types
// ---------------------------------------------------------------------------

fn cmd_types(config: &MetaguardConfig) {
    let dict = config.metadata_dictionary();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Type", "Suffix", "Directory", "Extensions", "Layout"]);

    for info in dict.entries() {
        let layout = match info.path_strategy {
            PathStrategy::Default => "default",
            PathStrategy::Bundle => "bundle",
        };
        table.add_row(vec![
            Cell::new(&info.type_name),
            Cell::new(info.suffix.as_deref().unwrap_or("—")),
            Cell::new(&info.directory),
            Cell::new(info.extensions.join(", ")),
            Cell::new(layout),
        ]);
    }

    println!();
    println!("{}", style::header(&format!("Metadata types ({})", dict.entries().len())));
    println!("{}", table);
    println!();
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn cmd_validate(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {}", config_path.display());
    println!();

    let mut config =
        MetaguardConfig::load_from_file(config_path).context("failed to parse configuration")?;
    println!("  [OK] TOML structure is valid");

    config
        .resolve_env_vars()
        .context("failed to resolve environment variables")?;
    println!("  [OK] Environment variable references processed");

    match config.validate() {
        Ok(()) => println!("  [OK] All required fields are valid"),
        Err(e) => {
            println!("  [FAIL] Validation error: {}", e);
            anyhow::bail!("configuration validation failed");
        }
    }

    println!();
    println!("Configuration summary:");
    println!("  Workspace root : {}", config.workspace.root.display());
    println!("  Log level      : {}", config.workspace.log_level);
    println!(
        "  Conflicts      : {}",
        if config.conflict.enabled { "enabled" } else { "disabled" }
    );
    println!("  Principal      : {}", config.conflict.principal);
    println!("  Package dir    : {}", config.conflict.outputdir);
    println!("  Baseline dir   : {}", config.conflict.baseline_dir.display());
    println!("  Extra types    : {}", config.metadata.len());
    println!();
    println!("Configuration is valid.");

    Ok(())
}
