use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::info;

use clap::{Parser, Subcommand};
use http::{
    Method,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use anyhow::anyhow;

use flow_connectors::{
    ConnectorConfig, ConnectorContext, ConversationState, Emission, Invocation, Secret,
    registry::ActionRegistry, routes, state::AppState,
};

/// Flow Connectors - action adapters for conversation flows
#[derive(Parser, Debug)]
#[command(name = "flow-connectors")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Subcommand to run (defaults to `serve`)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server
    Serve,

    /// List every registered action
    List,

    /// Run one action against a JSON invocation file
    Run {
        /// Action id or legacy alias (e.g. "tvmaze.search_single_show")
        action: String,

        /// JSON file with `{state, args, secret}`
        #[arg(short = 'f', long = "file", value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(Debug, Default, serde::Deserialize)]
struct RunFile {
    #[serde(default)]
    state: ConversationState,
    #[serde(default)]
    args: serde_json::Value,
    #[serde(default)]
    secret: Option<Secret>,
}

#[derive(Debug, serde::Serialize)]
struct RunOutput {
    state: ConversationState,
    emissions: Vec<Emission>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration from file or environment
    let config = if let Some(config_path) = cli.config {
        info!("Loading configuration from {}", config_path.display());
        ConnectorConfig::from_file(&config_path).map_err(|e| anyhow!(e.to_string()))?
    } else {
        ConnectorConfig::from_env().map_err(|e| anyhow!(e.to_string()))?
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::List => {
            let ctx = ConnectorContext::from_config(&config).map_err(|e| anyhow!(e))?;
            let registry = ActionRegistry::with_builtin(&ctx);
            for meta in registry.list() {
                println!("{:<48} {}", meta.id, meta.display_name);
            }
            Ok(())
        }
        Commands::Run { action, file } => {
            let raw = fs::read_to_string(&file)
                .map_err(|e| anyhow!("Failed to read {}: {}", file.display(), e))?;
            let RunFile {
                mut state,
                args,
                secret,
            } = serde_json::from_str(&raw)
                .map_err(|e| anyhow!("Invalid invocation file {}: {}", file.display(), e))?;

            let ctx = ConnectorContext::from_config(&config).map_err(|e| anyhow!(e))?;
            let registry = ActionRegistry::with_builtin(&ctx);
            registry
                .execute(&action, &mut state, Invocation { args, secret })
                .await
                .map_err(|e| anyhow!("{action} failed: {e}"))?;

            let emissions = std::mem::take(&mut state.emissions);
            println!(
                "{}",
                serde_json::to_string_pretty(&RunOutput { state, emissions })?
            );
            Ok(())
        }
    }
}

async fn serve(config: ConnectorConfig) -> anyhow::Result<()> {
    let address = config.address();
    let cors_origins = config.cors_allowed_origins.clone();
    info!("Starting server on {address}");

    // Create application state
    let app_state = AppState::new(config).map_err(|e| anyhow!(e))?;
    info!(actions = app_state.registry.len(), "Action registry ready");

    // Configure CORS
    let cors_layer = if let Some(ref origins) = cors_origins {
        if origins == "*" {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_credentials(false)
        } else {
            // Parse comma-separated origins
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_credentials(true)
        }
    } else {
        // No allow_origin = same-origin only (browsers block cross-origin requests)
        info!(
            "CORS not configured, defaulting to same-origin only. \
             Set CORS_ALLOWED_ORIGINS to enable cross-origin access."
        );
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .allow_credentials(false)
    };

    // Security headers
    let security_headers = tower::ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            http::header::X_CONTENT_TYPE_OPTIONS,
            http::HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            http::header::X_FRAME_OPTIONS,
            http::HeaderValue::from_static("DENY"),
        ));

    let app = routes::create_app(app_state)
        .layer(cors_layer)
        .layer(security_headers);

    // Parse socket address
    let socket_addr: SocketAddr = address
        .parse()
        .map_err(|e| anyhow!("Invalid server address '{}': {}", address, e))?;

    info!("Server listening on http://{}", socket_addr);
    let listener = TcpListener::bind(&socket_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
