use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use metro_board::board::{BoardConfig, DepartedPolicy};
use metro_board::config::{API_KEY_ENV, ServerConfig};
use metro_board::controller::CredentialError;
use metro_board::domain::{ApiKey, StopPair};
use metro_board::feeds::{CacheLocation, export_cache};
use metro_board::siri::{FeedError, SiriClient, SiriConfig};
use metro_board::web::{AppState, StartupError, build_board, create_router};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the arrivals board
    Serve(ServeArgs),
    /// Fetch both stops from the API and write a static cache
    ExportCache(ExportArgs),
}

#[derive(Args, Debug)]
struct UpstreamArgs {
    /// StopMonitoring API base URL
    #[arg(long, default_value = "https://api.511.org/transit")]
    base_url: String,

    /// Agency whose stops are queried
    #[arg(long, default_value = "SF")]
    agency: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

impl UpstreamArgs {
    fn siri_config(&self) -> SiriConfig {
        SiriConfig::default()
            .with_base_url(&self.base_url)
            .with_agency(&self.agency)
            .with_timeout(self.timeout_secs)
    }
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: SocketAddr,

    /// Static cache directory, also served under /data
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Read the static cache from this base URL instead of the directory
    #[arg(long)]
    cache_url: Option<String>,

    /// File holding the saved API key and last snapshot
    #[arg(long, default_value = "metro_board_store.json")]
    store: PathBuf,

    #[arg(long, default_value = "static")]
    static_dir: PathBuf,

    /// Seconds between direct fetches while a key is saved
    #[arg(long, default_value_t = 60)]
    poll_secs: u64,

    /// Keep vehicles that have already departed at the top of the board
    #[arg(long)]
    keep_departed: bool,

    #[command(flatten)]
    upstream: UpstreamArgs,
}

impl ServeArgs {
    fn into_config(self) -> ServerConfig {
        let cache = match self.cache_url {
            Some(url) => CacheLocation::Url(url),
            None => CacheLocation::Directory(self.data_dir),
        };
        let departed = if self.keep_departed {
            DepartedPolicy::Keep
        } else {
            DepartedPolicy::DropLeading
        };

        ServerConfig::default()
            .with_addr(self.addr)
            .with_cache(cache)
            .with_store_path(self.store)
            .with_static_dir(self.static_dir)
            .with_poll_interval(Duration::from_secs(self.poll_secs))
            .with_siri(self.upstream.siri_config())
            .with_board(BoardConfig::default().with_departed(departed))
    }
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Directory to write the cache documents into
    #[arg(short, long, default_value = "data")]
    out_dir: PathBuf,

    #[command(flatten)]
    upstream: UpstreamArgs,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Startup(#[from] StartupError),

    #[error("invalid API key in TRANSIT_API_KEY: {0}")]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("TRANSIT_API_KEY must be set to export the cache")]
    MissingKey,

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

fn env_api_key() -> Option<String> {
    std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty())
}

async fn serve(config: ServerConfig) -> Result<(), CliError> {
    let board = build_board(&config)?;

    if let Some(raw) = env_api_key()
        && !board.has_credential().await
    {
        info!(var = API_KEY_ENV, "Seeding API key from environment");
        board.save_credential(&raw).await?;
    }

    board.start().await;

    let app = create_router(AppState::new(board), &config.static_dir, config.data_dir())
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "Metro arrivals board listening on http://{}", config.addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn export(args: ExportArgs) -> Result<(), CliError> {
    let raw = env_api_key().ok_or(CliError::MissingKey)?;
    let key = ApiKey::parse(&raw).map_err(|_| CliError::MissingKey)?;
    let siri = SiriClient::new(args.upstream.siri_config())?;

    let snapshot = export_cache(&siri, &key, &StopPair::default(), &args.out_dir).await?;
    info!(
        dir = %args.out_dir.display(),
        stops = snapshot.stops.len(),
        last_updated = %snapshot.last_updated,
        "Static cache written"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "metro_board=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Serve(args) => serve(args.into_config()).await,
        Command::ExportCache(args) => export(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Exiting");
            ExitCode::FAILURE
        }
    }
}
