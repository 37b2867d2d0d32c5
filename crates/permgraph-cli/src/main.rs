//! permgraph CLI: query role grants and inheritance from a policy file.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use permgraph_config::{
    CONFIG_FILE_NAME, CliOverrides, PermgraphConfig, PolicyEngine, PolicyFile, PolicySummary,
};
use permgraph_core::{CyclePolicy, Inheritance, RoleLookup};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "permgraph", version, about = "Query role grants and inheritance in a permgraph policy")]
struct Cli {
    /// Policy file to load (overrides [policy] path in config.toml)
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    /// Enable verbose/debug logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Accept subject inheritance edges that close a cycle
    #[arg(long, global = true)]
    allow_subject_cycles: bool,

    /// Accept object inheritance edges that close a cycle
    #[arg(long, global = true)]
    allow_object_cycles: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the roles a subject holds on an object, sorted
    Roles {
        subject: String,
        object: String,

        /// Only roles granted directly, without inheritance
        #[arg(long)]
        direct: bool,

        /// Print a JSON array instead of one role per line
        #[arg(long)]
        json: bool,
    },

    /// Exit 0 if the subject holds every listed role on the object, 1 otherwise
    Check {
        subject: String,
        object: String,

        #[arg(required = true)]
        roles: Vec<String>,

        /// Succeed if at least one listed role is held
        #[arg(long)]
        any: bool,
    },

    /// Exit 0 if `inheritor` transitively inherits from `origin`, 1 otherwise
    Inherits {
        dimension: Dimension,
        inheritor: String,
        origin: String,
    },

    /// Show what the policy file loaded
    Summary,
}

#[derive(Clone, Copy, ValueEnum)]
enum Dimension {
    Subject,
    Object,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let config = PermgraphConfig::load(CliOverrides {
        subject_cycles: cli.allow_subject_cycles.then_some(CyclePolicy::Allow),
        object_cycles: cli.allow_object_cycles.then_some(CyclePolicy::Allow),
        policy_path: cli.policy,
    })
    .context("Failed to load configuration")?;

    let (engine, summary) = load_engine(&config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let ok = run(&cli.command, &engine, &summary, &mut out)?;
    out.flush()?;

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::from(1) })
}

fn load_engine(config: &PermgraphConfig) -> Result<(PolicyEngine, PolicySummary)> {
    let Some(path) = &config.policy_path else {
        bail!(
            "No policy file. Pass --policy <path> or set [policy] path in {}",
            config.config_dir.join(CONFIG_FILE_NAME).display()
        );
    };

    let policy = PolicyFile::from_path(path)?;
    let loaded = policy
        .build(config)
        .with_context(|| format!("Invalid policy {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Loaded policy");
    Ok(loaded)
}

/// Run one command against a loaded engine. Returns false when a check fails.
fn run(
    command: &Command,
    engine: &PolicyEngine,
    summary: &PolicySummary,
    out: &mut impl Write,
) -> Result<bool> {
    match command {
        Command::Roles {
            subject,
            object,
            direct,
            json,
        } => {
            let roles = if *direct {
                engine.direct_roles(subject, object)
            } else {
                engine.roles(subject, object)
            };
            let mut sorted: Vec<&String> = roles.iter().collect();
            sorted.sort();

            if *json {
                writeln!(out, "{}", serde_json::to_string(&sorted)?)?;
            } else {
                for role in sorted {
                    writeln!(out, "{role}")?;
                }
            }
            Ok(true)
        }
        Command::Check {
            subject,
            object,
            roles,
            any,
        } => {
            let held = if *any {
                engine.has_any_role(subject, object, roles)
            } else {
                engine.has_all_roles(subject, object, roles)
            };
            writeln!(out, "{}", if held { "granted" } else { "denied" })?;
            Ok(held)
        }
        Command::Inherits {
            dimension,
            inheritor,
            origin,
        } => {
            let inherits = match dimension {
                Dimension::Subject => engine.is_subject_inherits(inheritor, origin),
                Dimension::Object => engine.is_object_inherits(inheritor, origin),
            };
            writeln!(out, "{}", if inherits { "yes" } else { "no" })?;
            Ok(inherits)
        }
        Command::Summary => {
            let store = engine.store();
            writeln!(out, "Loaded: {summary}")?;
            writeln!(
                out,
                "Store: {} entries across {} subjects",
                store.len(),
                store.subject_count()
            )?;
            writeln!(
                out,
                "Graphs: {} subject edges ({}), {} object edges ({})",
                engine.subject_graph().edge_count(),
                engine.subject_graph().policy(),
                engine.object_graph().edge_count(),
                engine.object_graph().policy()
            )?;
            Ok(true)
        }
    }
}
