use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use local_file_server::{routes, AppState, ServerConfig};

/// Exit status for a missing or malformed command line
const EXIT_USAGE: u8 = 1;
/// Exit status for an unusable configuration
const EXIT_CONFIG: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "local-file-server")]
#[command(about = "Browse, download and upload files over HTTP")]
#[command(version)]
struct Cli {
    /// Config file path
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, env = "LOCAL_FILE_SERVER_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(EXIT_USAGE);
        }
    };

    // Initialize tracing
    let filter = if cli.verbose {
        "local_file_server=debug,tower_http=debug"
    } else {
        "local_file_server=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ServerConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let addr = match config.listen_addr() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    info!("Serving files from: {}", config.base_dir.display());
    info!("Storing uploads in: {}", config.upload_dir.display());
    info!("visit {}/upload/ to upload file.", addr);
    info!("visit {}/local/ to browse local files.", addr);

    let app = routes::app(AppState::new(config));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Starting local-file-server on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
