use clap::{Parser, Subcommand};
use sandql_core::SandqlConfig;
use sandql_store::SandqlService;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "sandql", version, about = "Per-tenant SQL sandboxes")]
struct Cli {
    /// Configuration file (defaults to $SANDQL_CONFIG, then ./sandql.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one statement for a tenant and print the result as JSON.
    Exec {
        #[arg(long)]
        tenant: String,

        /// SQL text
        sql: String,
    },

    /// Print a tenant's schema as JSON.
    Schema {
        #[arg(long)]
        tenant: String,
    },

    /// Apply a schema file (YAML or JSON), optionally with seed rows.
    Apply {
        #[arg(long)]
        tenant: String,

        file: PathBuf,
    },

    /// Show or clear a tenant's statement history.
    History {
        #[arg(long)]
        tenant: String,

        /// Show at most this many entries
        #[arg(long)]
        limit: Option<u32>,

        /// Remove all entries instead of listing them
        #[arg(long, default_value_t = false)]
        clear: bool,
    },

    /// Manage a tenant's saved queries.
    Saved {
        #[command(subcommand)]
        cmd: SavedCommand,
    },

    /// Start the HTTP server.
    Serve,
}

#[derive(Subcommand, Debug)]
enum SavedCommand {
    /// List saved queries, newest first
    List {
        #[arg(long)]
        tenant: String,
    },

    /// Save a statement under a title
    Add {
        #[arg(long)]
        tenant: String,

        #[arg(long)]
        title: String,

        sql: String,
    },

    /// Remove a saved query by id
    Remove {
        #[arg(long)]
        tenant: String,

        id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = SandqlConfig::load(cli.config.as_deref())?;

    match cli.cmd {
        Command::Serve => {
            sandql_server::init_tracing(&config.observability.log_level);
            commands::serve::run(config).await
        }
        cmd => {
            // logs go to stderr so stdout stays clean JSON
            let filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();

            let service = SandqlService::from_config(&config)?;
            let outcome = run_tenant_command(&service, cmd).await;
            service.shutdown().await;
            outcome
        }
    }
}

async fn run_tenant_command(service: &SandqlService, cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Exec { tenant, sql } => commands::query::exec(service, &tenant, &sql).await,
        Command::Schema { tenant } => commands::query::schema(service, &tenant).await,
        Command::Apply { tenant, file } => commands::apply::run(service, &tenant, &file).await,
        Command::History {
            tenant,
            clear: true,
            ..
        } => commands::journal::clear_history(service, &tenant).await,
        Command::History { tenant, limit, .. } => {
            commands::journal::history(service, &tenant, limit).await
        }
        Command::Saved { cmd } => match cmd {
            SavedCommand::List { tenant } => commands::journal::list_saved(service, &tenant).await,
            SavedCommand::Add { tenant, title, sql } => {
                commands::journal::save(service, &tenant, &title, &sql).await
            }
            SavedCommand::Remove { tenant, id } => {
                commands::journal::remove_saved(service, &tenant, id).await
            }
        },
        Command::Serve => anyhow::bail!("serve does not take a tenant"),
    }
}
