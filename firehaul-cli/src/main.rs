use anyhow::Result;
use clap::{Parser, Subcommand};
use firehaul::ExportMode;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "firehaul")]
#[command(about = "Export a hierarchical document store into a JSON file tree")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export every root collection, recursively
    Export {
        /// Project identifier
        #[arg(short, long, env = "GOOGLE_CLOUD_PROJECT")]
        project: String,

        /// Output root directory; files land under <output>/<mode>
        #[arg(short, long, default_value = "./export")]
        output: PathBuf,

        /// Serialization mode: readable or typed
        #[arg(short, long, default_value = "readable")]
        mode: ExportMode,

        /// OAuth2 bearer token for the hosted store
        #[arg(long, env = "GOOGLE_ACCESS_TOKEN", hide_env_values = true)]
        access_token: Option<String>,

        /// Emulator host (host:port); uses the emulator owner credential
        #[arg(long, env = "FIRESTORE_EMULATOR_HOST")]
        emulator_host: Option<String>,

        /// Disable console progress output
        #[arg(long)]
        no_progress: bool,
    },

    /// List root collections
    Collections {
        /// Project identifier
        #[arg(short, long, env = "GOOGLE_CLOUD_PROJECT")]
        project: String,

        /// OAuth2 bearer token for the hosted store
        #[arg(long, env = "GOOGLE_ACCESS_TOKEN", hide_env_values = true)]
        access_token: Option<String>,

        /// Emulator host (host:port); uses the emulator owner credential
        #[arg(long, env = "FIRESTORE_EMULATOR_HOST")]
        emulator_host: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            project,
            output,
            mode,
            access_token,
            emulator_host,
            no_progress,
        } => {
            commands::export::run(project, output, mode, access_token, emulator_host, no_progress)
                .await
        }
        Commands::Collections {
            project,
            access_token,
            emulator_host,
        } => commands::collections::run(project, access_token, emulator_host).await,
    }
}
