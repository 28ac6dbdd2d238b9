use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use rerunner::api::routes::router;
use rerunner::api::state::AppState;
use rerunner::config::Config;
use rerunner::db::case::SqliteCaseRepository;
use rerunner::db::ingest::ingest_case;
use rerunner::db::open::open_db;
use rerunner::remote::credentials::askpass_passphrase;
use rerunner::remote::session::OpenSsh;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "RERUNNER_CONFIG", default_value = "config.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the reanalysis API
    Serve {
        #[arg(short, long, default_value = "0.0.0.0:8080")]
        listen: SocketAddr,
    },
    /// Load case documents (JSON) into the case database
    LoadCase {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // ssh runs this binary as SSH_ASKPASS to read the key passphrase
    if let Some(passphrase) = askpass_passphrase() {
        println!("{passphrase}");
        return Ok(());
    }

    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("terve! starting up :)");

    let args = Args::parse();
    let config = Config::load(&args.config)?;
    let conn = open_db(&config.database.path)
        .with_context(|| format!("Can't open database {}", config.database.path.display()))?;
    conn.busy_timeout(config.database.timeout())?;

    match args.command {
        Commands::LoadCase { files } => {
            for file in files {
                let case_id = ingest_case(&conn, &file)?;
                info!("Loaded case {case_id} from {}", file.display());
            }
        }
        Commands::Serve { listen } => {
            config.require_api_secret()?;
            if config.diagnostic_mode {
                info!("Diagnostic mode: the pipeline is started as a dry run");
            }
            let state = AppState::new(config, SqliteCaseRepository::new(conn), OpenSsh)?;
            let listener = tokio::net::TcpListener::bind(listen)
                .await
                .with_context(|| format!("Can't listen on {listen}"))?;
            info!("Listening on {listen}");
            axum::serve(listener, router(state)).await?;
        }
    }

    Ok(())
}
