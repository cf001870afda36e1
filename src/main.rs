//! blog-api - A small blog posts JSON API

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use blog_api::{
    api::{self, AppState},
    config::Config,
    db::{self, migrations},
    db::repositories::SqlxBlogRepository,
    logging,
    services::BlogService,
};

#[derive(Parser)]
#[command(name = "blog-api", version, about = "Blog posts JSON API")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Override server.host
        #[arg(long)]
        host: Option<String>,

        /// Override server.port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Apply pending database migrations
    Migrate {
        /// Show applied and pending migrations without applying
        #[arg(long)]
        status: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load_with_env(&cli.config)?;

    let command = cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
    });
    if let Commands::Serve { host, port } = &command {
        config.apply_server_overrides(host.clone(), *port);
    }
    config.validate()?;

    logging::init_logging(&config.logging)?;

    match command {
        Commands::Serve { .. } => serve(config).await,
        Commands::Migrate { status } => migrate(&config, status).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    tracing::info!("Starting blog-api...");

    let pool = db::create_pool(&config.database).await?;
    pool.ping().await?;
    tracing::info!("Database connected: {}", config.database.driver);

    let applied = migrations::run_migrations(&pool).await?;
    tracing::info!(applied, "Database migrations completed");

    let repo = SqlxBlogRepository::boxed(pool.clone());
    let state = AppState::new(BlogService::new(repo));
    let app = api::build_router(state, &config.server);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn migrate(config: &Config, status: bool) -> Result<()> {
    let pool = db::create_pool(&config.database).await?;

    if status {
        let applied = migrations::applied_migrations(&pool).await?;
        for record in &applied {
            println!("applied  {:>4}  {}", record.version, record.name);
        }
        for migration in migrations::MIGRATIONS
            .iter()
            .filter(|m| !applied.iter().any(|r| r.version == m.version))
        {
            println!("pending  {:>4}  {}", migration.version, migration.name);
        }
    } else {
        let count = migrations::run_migrations(&pool).await?;
        println!("Applied {} migration(s)", count);
    }

    pool.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
