use anyhow::Result;
use clap::{Parser, Subcommand};
use vestnik_backend::api;
use vestnik_backend::config::VestnikConfig;
use vestnik_backend::database::Database;
use vestnik_backend::telemetry;

#[derive(Parser)]
#[command(author, version, about = "Vestnik publishing backend")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (Axum) for REST/API access
    Serve,
    /// Create or migrate the database, then exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let args = Args::parse();
    let config = VestnikConfig::from_env()?;
    let database = Database::connect(&config.paths)?;
    let created = database.ensure_migrations()?;
    tracing::info!(
        db_path = %config.paths.db_path.display(),
        newly_created = created,
        "database ready"
    );

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => api::serve_http(config, database).await,
        Command::Migrate => Ok(()),
    }
}
