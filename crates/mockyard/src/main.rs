use anyhow::Context;
use clap::Parser;
use mockyard::admin_api::{AdminApiServer, AdminState};
use mockyard::alerts::Alerts;
use mockyard::config::Config;
use mockyard::loader::FilesLoader;
use mockyard::mock::Mock;
use mockyard::server::MockServer;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mockyard")]
#[command(author, version, about = "HTTP mock server with route variants and collections")]
struct Args {
    /// Configuration file (YAML or JSON)
    #[arg(short, long, env = "MOCKYARD_CONFIG")]
    config: Option<PathBuf>,

    /// Mock server port
    #[arg(short, long, env = "MOCKYARD_PORT")]
    port: Option<u16>,

    /// Admin API port
    #[arg(long, env = "MOCKYARD_ADMIN_PORT")]
    admin_port: Option<u16>,

    /// Disable the admin API
    #[arg(long, env = "MOCKYARD_NO_ADMIN")]
    no_admin: bool,

    /// Definitions folder
    #[arg(long, env = "MOCKYARD_PATH")]
    path: Option<PathBuf>,

    /// Do not reload definitions when files change
    #[arg(long, env = "MOCKYARD_NO_WATCH")]
    no_watch: bool,

    /// Collection selected on start
    #[arg(long, env = "MOCKYARD_COLLECTION")]
    collection: Option<String>,

    /// Global response delay in milliseconds
    #[arg(long, env = "MOCKYARD_DELAY")]
    delay: Option<u64>,

    /// Reject definition loads containing invalid definitions
    #[arg(long, env = "MOCKYARD_STRICT")]
    strict: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "MOCKYARD_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Args {
    /// Load the config file (or defaults) and apply flags on top.
    fn into_config(self) -> Result<Config, anyhow::Error> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(port) = self.admin_port {
            config.admin.port = port;
        }
        if self.no_admin {
            config.admin.enabled = false;
        }
        if let Some(path) = self.path {
            config.files.path = path;
        }
        if self.no_watch {
            config.files.watch = false;
        }
        if let Some(collection) = self.collection {
            config.mock.collections.selected = Some(collection);
        }
        if let Some(delay) = self.delay {
            config.mock.routes.delay = delay;
        }
        if self.strict {
            config.mock.strict = true;
        }
        if let Some(level) = self.log_level {
            config.log.level = level;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Args::parse().into_config()?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting mockyard v{}", env!("CARGO_PKG_VERSION"));

    let alerts = Alerts::default();
    let mock = Arc::new(Mock::new(config.mock.options(), alerts.collection("mock"))?);

    let loader = if config.files.enabled {
        let loader = Arc::new(FilesLoader::new(
            &config.files.path,
            Arc::clone(&mock),
            alerts.collection("files"),
        ));
        let initial = Arc::clone(&loader);
        match tokio::task::spawn_blocking(move || initial.load()).await? {
            Ok(summary) => info!(
                routes = summary.routes,
                collections = summary.collections,
                "Definitions loaded from {}",
                config.files.path.display()
            ),
            Err(e) => warn!("Initial definitions load rejected: {}", e),
        }
        Some(loader)
    } else {
        None
    };

    // dropping the watcher stops it, so it lives until shutdown
    let _watcher = match &loader {
        Some(loader) if config.files.watch => match loader.watch() {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!("Could not watch {}: {}", config.files.path.display(), e);
                None
            }
        },
        _ => None,
    };

    let server = MockServer::bind(config.server.addr()?, Arc::clone(&mock))
        .await
        .context("Failed to bind mock server")?;
    let server_task = tokio::spawn(server.run());

    let admin_task = if config.admin.enabled {
        let state = AdminState {
            mock: Arc::clone(&mock),
            alerts: alerts.clone(),
            loader: loader.clone(),
        };
        let admin = AdminApiServer::bind(config.admin.addr()?, state)
            .await
            .context("Failed to bind admin API")?;
        Some(tokio::spawn(admin.run()))
    } else {
        None
    };

    tokio::select! {
        result = server_task => match result {
            Ok(Err(e)) => error!("Mock server stopped: {}", e),
            Err(e) => error!("Mock server task failed: {}", e),
            Ok(Ok(())) => {}
        },
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    if let Some(task) = admin_task {
        task.abort();
    }
    Ok(())
}
