use axum::Router;
use discovery_directory::config::AppConfig;
use discovery_directory::domain::Directory;
use discovery_directory::metrics::Metrics;
use discovery_directory::router::build_router;
use discovery_directory::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{
    io::{self, AsyncBufReadExt, BufReader},
    sync::oneshot,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type LogReloadHandle =
    tracing_subscriber::reload::Handle<tracing_subscriber::EnvFilter, tracing_subscriber::Registry>;

struct CommandResult {
    message: String,
    shutdown: bool,
}

#[derive(Clone)]
struct CliContext {
    state: AppState,
    log_handle: Option<LogReloadHandle>,
}

fn parse_command(input: &str) -> (&str, Vec<&str>) {
    let trimmed = input.trim();
    let mut parts = trimmed.split_whitespace();
    let cmd = parts.next().unwrap_or("");
    let args: Vec<&str> = parts.collect();
    (cmd, args)
}

fn command_help(args: &[&str]) -> CommandResult {
    let verbose = args.first().is_some_and(|v| *v == "verbose");
    let message = if verbose {
        serde_json::json!({
            "commands": [
                "/help [verbose]",
                "/status",
                "/stats",
                "/logs level <trace|debug|info|warn|error>",
                "/reload",
                "/quit"
            ]
        })
        .to_string()
    } else {
        "/help - show commands\n/status - show service status\n/stats - show directory and request counters\n/logs level <level> - change log level\n/reload - validate config reload (dry-run)\n/quit - stop the service"
            .to_string()
    };

    CommandResult {
        message,
        shutdown: false,
    }
}

fn command_status(ctx: &CliContext) -> CommandResult {
    CommandResult {
        message: format!(
            "Service status:\n- Address: {}:{}\n- Δ (delta_secs): {}\n- P_inc: {}\n- C (max_contacts): {}",
            ctx.state.config.server.host,
            ctx.state.config.server.port,
            ctx.state.config.directory.delta_secs,
            ctx.state.config.directory.p_inc_secs,
            ctx.state.config.directory.max_contacts,
        ),
        shutdown: false,
    }
}

async fn command_stats(ctx: &CliContext) -> CommandResult {
    let snapshot = ctx.state.directory.snapshot();
    let stats = ctx.state.metrics.get_stats().await;
    CommandResult {
        message: format!(
            "Directory: registered_users={}, pending_added={}, pending_removed={}, full_sync_buckets={}, incremental_sync_buckets={}\nRequests: total={}, failed={}, success_rate={:.2}%, avg_latency_ms={:.2}",
            snapshot.registered_users,
            snapshot.pending_added,
            snapshot.pending_removed,
            snapshot.full_sync_buckets,
            snapshot.incremental_sync_buckets,
            stats.total_requests,
            stats.failed_requests,
            stats.success_rate,
            stats.avg_latency_ms,
        ),
        shutdown: false,
    }
}

fn command_logs(args: &[&str], ctx: &CliContext) -> CommandResult {
    if args.len() == 2 && args[0] == "level" {
        let level = args[1].to_lowercase();
        if let Some(handle) = &ctx.log_handle {
            let filter_str = format!("{level},tower_http=debug");
            return match EnvFilter::try_new(filter_str) {
                Ok(filter) => {
                    if handle.reload(filter).is_ok() {
                        CommandResult {
                            message: format!("Log level set to {level}"),
                            shutdown: false,
                        }
                    } else {
                        CommandResult {
                            message: "Failed to update log level".to_string(),
                            shutdown: false,
                        }
                    }
                }
                Err(e) => CommandResult {
                    message: format!("Invalid log level: {e}"),
                    shutdown: false,
                },
            };
        }

        return CommandResult {
            message: "Log level reload not available in this build".to_string(),
            shutdown: false,
        };
    }

    CommandResult {
        message: "Usage: /logs level <trace|debug|info|warn|error>".to_string(),
        shutdown: false,
    }
}

fn command_reload() -> CommandResult {
    match AppConfig::new() {
        Ok(new_config) => CommandResult {
            message: format!(
                "Config reload validated (not applied): host {}:{}, delta_secs={}, p_inc_secs={}, max_contacts={}",
                new_config.server.host,
                new_config.server.port,
                new_config.directory.delta_secs,
                new_config.directory.p_inc_secs,
                new_config.directory.max_contacts,
            ),
            shutdown: false,
        },
        Err(e) => CommandResult {
            message: format!("Config reload failed: {e}"),
            shutdown: false,
        },
    }
}

fn command_quit() -> CommandResult {
    CommandResult {
        message: "Shutting down service...".to_string(),
        shutdown: true,
    }
}

fn command_unknown() -> CommandResult {
    CommandResult {
        message: "Unknown command. Type /help for a list of commands.".to_string(),
        shutdown: false,
    }
}

async fn process_command(input: &str, ctx: &CliContext) -> CommandResult {
    let (cmd, args) = parse_command(input);

    match cmd {
        "/help" | "help" => command_help(&args),
        "/status" | "status" => command_status(ctx),
        "/stats" | "stats" => command_stats(ctx).await,
        "/logs" | "logs" => command_logs(&args, ctx),
        "/reload" | "reload" => command_reload(),
        "/quit" | "/exit" | "quit" | "exit" => command_quit(),
        _ => command_unknown(),
    }
}

async fn setup_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("Failed to register SIGTERM handler: {}", e);
                None
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, initiating graceful shutdown");
            }
            () = async {
                if let Some(ref mut sigterm) = sigterm {
                    if sigterm.recv().await.is_none() {
                        warn!("SIGTERM signal stream closed unexpectedly");
                    }
                }
            } => {
                info!("Received SIGTERM, initiating graceful shutdown");
            }
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            return;
        }
        info!("Received Ctrl+C, initiating graceful shutdown");
    }
}

fn setup_logging(config: &AppConfig) -> LogReloadHandle {
    let log_format = config.log.format.as_str();
    let filter = EnvFilter::try_new(format!(
        "{level},tower_http=debug",
        level = config.log.level
    ))
    .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    let (filter_layer, reload_handle) = tracing_subscriber::reload::Layer::new(filter);

    match log_format {
        "json" => {
            tracing_subscriber::registry()
                .with(filter_layer)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(false)
                        .with_file(true)
                        .with_line_number(true)
                        .with_current_span(true)
                        .with_span_list(true),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter_layer)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .init();
        }
    }

    reload_handle
}

async fn run_server(
    app: Router,
    host: &str,
    port: u16,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server address {host}:{port}: {e}"))?;

    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let shutdown = async move {
        tokio::select! {
            () = setup_shutdown_signal() => {},
            _ = &mut shutdown_rx => {},
        }
    };

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown);

    if let Err(e) = server.await {
        error!("Server error: {e}");
        return Err(anyhow::anyhow!("Server failed: {e}"));
    }

    info!("Server shutdown complete");
    Ok(())
}

async fn run_command_loop(ctx: CliContext, shutdown_tx: oneshot::Sender<()>) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let reader = BufReader::new(stdin);
    let mut lines = reader.lines();
    let mut shutdown_tx = Some(shutdown_tx);

    println!("Interactive CLI ready. Type /help for available commands.");

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let result = process_command(&line, &ctx).await;
        println!("{}", result.message);

        if result.shutdown {
            if let Some(tx) = shutdown_tx.take() {
                let _ = tx.send(());
            }
            break;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::new().map_err(|e| {
        anyhow::anyhow!(
            "Failed to load configuration: {e}. Please check your environment variables and configuration."
        )
    })?;

    let log_handle = Some(setup_logging(&config));

    info!(
        "Starting discovery-directoryd v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!(
        "Config loaded: Host={}, Port={}, delta_secs={}, p_inc_secs={}, max_contacts={}",
        config.server.host,
        config.server.port,
        config.directory.delta_secs,
        config.directory.p_inc_secs,
        config.directory.max_contacts,
    );

    let directory = Arc::new(Directory::new(
        config.directory.delta_secs,
        config.directory.p_inc_secs,
        config.directory.max_contacts,
    ));
    let metrics = Arc::new(Metrics::new());

    let state = AppState {
        config: Arc::new(config.clone()),
        directory,
        metrics,
    };

    let app: Router = build_router(&config, state.clone());

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let cli_context = CliContext {
        state: state.clone(),
        log_handle,
    };
    tokio::spawn(async move {
        if let Err(e) = run_command_loop(cli_context, shutdown_tx).await {
            warn!("CLI loop terminated with error: {e}");
        }
    });

    run_server(app, &config.server.host, config.server.port, shutdown_rx).await
}
