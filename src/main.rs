use actix_web::{web, App, HttpServer};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};
mod api;
use crate::api::{
    health::health_config,
    session::{session_config, SessionService},
    validation,
};
mod config;
mod intake;
mod shutdown;
mod sinks;
use crate::shutdown::ShutdownCoordinator;
use crate::sinks::Sinks;

/// Job request intake service
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Bind host (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Log directory (overrides LOG_DIR)
    #[arg(long)]
    log_dir: Option<String>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    // Load configuration from environment, command line wins
    let mut config = config::Config::from_env().expect("Failed to load configuration");
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(log_dir) = cli.log_dir {
        config.log_dir = log_dir;
    }

    // Create logs directory if it doesn't exist
    std::fs::create_dir_all(&config.log_dir).expect("Failed to create logs directory");

    // Log files will be created as: logs/info.log.2026-10-16, logs/error.log.2026-10-16, etc.
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let info_file = tracing_appender::rolling::daily(&config.log_dir, "info.log");
    let warn_file = tracing_appender::rolling::daily(&config.log_dir, "warn.log");
    let error_file = tracing_appender::rolling::daily(&config.log_dir, "error.log");
    let debug_file = tracing_appender::rolling::daily(&config.log_dir, "debug.log");

    let info_layer = tracing_subscriber::fmt::layer()
        .with_writer(info_file)
        .with_ansi(false)
        .with_filter(LevelFilter::INFO);

    let warn_layer = tracing_subscriber::fmt::layer()
        .with_writer(warn_file)
        .with_ansi(false)
        .with_filter(LevelFilter::WARN);

    let error_layer = tracing_subscriber::fmt::layer()
        .with_writer(error_file)
        .with_ansi(false)
        .with_filter(LevelFilter::ERROR);

    let debug_layer = tracing_subscriber::fmt::layer()
        .with_writer(debug_file)
        .with_ansi(false)
        .with_filter(LevelFilter::DEBUG);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(info_layer)
        .with(warn_layer)
        .with(error_layer)
        .with(debug_layer)
        .init();

    info!("Starting recruit-intake application");
    info!("Configuration loaded successfully:");
    info!("  - Max payload size: {} bytes", config.max_payload_size);
    info!("  - Default form variant: {:?}", config.default_variant);
    info!("  - Session idle timeout: {:?}", config.session_idle_timeout);
    info!(
        "  - Supabase sink: {}",
        if config.data_store.is_some() { "enabled" } else { "disabled" }
    );
    info!(
        "  - Telegram sink: {}",
        if config.notification.is_some() { "enabled" } else { "disabled" }
    );

    let sinks = Sinks::from_config(&config);
    let session_service = web::Data::new(
        SessionService::new(sinks, config.default_variant)
            .with_idle_timeout(config.session_idle_timeout),
    );
    let max_payload_size = config.max_payload_size;

    let server_service = session_service.clone();
    let server = HttpServer::new(move || {
        // Configure payload size limits globally
        let payload_config = web::PayloadConfig::default().limit(max_payload_size);

        App::new()
            .app_data(server_service.clone())
            .app_data(payload_config)
            .app_data(validation::json_config(max_payload_size))
            .configure(health_config)
            .configure(session_config)
    });

    info!("Server starting on http://{}:{}", config.host, config.port);

    let server = server.bind((config.host.as_str(), config.port))?.run();

    // Get server handle for graceful shutdown
    let server_handle = server.handle();

    // Spawn server in background
    let server_task = tokio::spawn(server);

    let coordinator =
        ShutdownCoordinator::new(server_handle, server_task, session_service.into_inner());

    coordinator.wait_for_shutdown().await
}
