use std::fs;
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use lumio::config::ServerConfig;
use lumio::github::GithubClient;
use lumio::server::{AppState, create_router};
use lumio::storage::FsObjectStorage;
use lumio::store::{SqliteStore, Store};
use lumio::sync::PullSync;

#[derive(Parser)]
#[command(name = "lumio")]
#[command(about = "A coaching server that mirrors exercise cards from GitHub", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8080")]
        port: u16,

        /// Data directory for database and mirrored objects
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Public base URL for external access (e.g., "https://cards.example.com").
        /// Used when rewriting image references to hosted URLs.
        #[arg(long)]
        public_base_url: Option<String>,

        /// Shared secret for verifying Docora webhook signatures
        #[arg(long, env = "LUMIO_WEBHOOK_SECRET")]
        webhook_secret: String,

        /// Expected Docora application id; any id is accepted if unset
        #[arg(long, env = "LUMIO_WEBHOOK_APP_ID")]
        webhook_app_id: Option<String>,
    },

    /// Run one pull sync for a registered repository
    Sync {
        /// Repository to sync, as "owner/repo"
        repository: String,

        /// Data directory for database and mirrored objects
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Public base URL used when rewriting image references
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        public_base_url: String,

        /// Re-process every file even if the commit is unchanged
        #[arg(long)]
        force: bool,
    },
}

async fn run_serve(config: ServerConfig) -> anyhow::Result<()> {
    fs::create_dir_all(&config.data_dir)?;

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;

    let state = Arc::new(AppState {
        store: Arc::new(store),
        source: Arc::new(GithubClient::new()),
        objects: Arc::new(FsObjectStorage::new(
            &config.data_dir,
            config.object_base_url(),
        )),
        webhook_secret: config.webhook_secret.clone(),
        webhook_app_id: config.webhook_app_id.clone(),
    });

    let app = create_router(state);
    let addr = config.socket_addr()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_sync(
    repository: &str,
    data_dir: String,
    public_base_url: String,
    force: bool,
) -> anyhow::Result<()> {
    let Some((owner, repo)) = repository.split_once('/') else {
        bail!("Repository must be given as \"owner/repo\"");
    };

    let data_path: std::path::PathBuf = data_dir.into();
    let store = SqliteStore::new(data_path.join("lumio.db"))?;
    store.initialize()?;

    let Some(registered) = store.get_repository_by_source(owner, repo)? else {
        bail!("Repository {owner}/{repo} is not registered");
    };

    let source = GithubClient::new();
    let objects = FsObjectStorage::new(&data_path, public_base_url);

    let sync = PullSync::new(&store, &source, &objects);
    let report = sync.run(&registered.id, force).await?;

    println!(
        "Synced {owner}/{repo} at {}: {} added, {} updated, {} removed, {} unchanged ({} cards)",
        report.commit_sha,
        report.stats.added,
        report.stats.updated,
        report.stats.removed,
        report.stats.unchanged,
        report.cards_count
    );

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("lumio=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            data_dir,
            public_base_url,
            webhook_secret,
            webhook_app_id,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
                public_base_url,
                webhook_secret,
                webhook_app_id,
            };
            run_serve(config).await?;
        }
        Commands::Sync {
            repository,
            data_dir,
            public_base_url,
            force,
        } => {
            run_sync(&repository, data_dir, public_base_url, force).await?;
        }
    }

    Ok(())
}
