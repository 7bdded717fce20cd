use crate::{
    Config,
    handlers::{AppState, create_router},
    index::SequenceIndex,
    storage::LocalSequenceStore,
};
use anyhow::Context;
use axum::Router;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

/// Open the index and sequence file and assemble the router.
///
/// Index errors are returned as-is so that startup aborts before any
/// listener is bound.
pub fn build_app(config: &Config) -> anyhow::Result<Router> {
    let index_path = config.index_path();
    let index = SequenceIndex::open(&config.fasta, &index_path, config.rebuild_index)
        .with_context(|| format!("failed to index {:?}", config.fasta))?;
    let store = LocalSequenceStore::open(&config.fasta, index)
        .with_context(|| format!("failed to open {:?}", config.fasta))?;

    let state = AppState {
        store: Arc::new(store),
        homepage: config.homepage.clone(),
        max_subsequence_length: config.max_subsequence_length,
    };

    let app = create_router(state);
    Ok(if config.cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    })
}

/// Bind the first usable address from [`Config::bind_addresses`].
pub async fn bind(config: &Config) -> anyhow::Result<TcpListener> {
    let mut last_error = None;
    for addr in config.bind_addresses() {
        match TcpListener::bind(&addr).await {
            Ok(listener) => return Ok(listener),
            Err(e) => {
                tracing::debug!("could not bind {}: {}", addr, e);
                last_error = Some(e);
            }
        }
    }

    let message = if config.port == 0 {
        "unable to find any open port".to_string()
    } else {
        format!("attempted to bind to port {}, but it was already in use", config.port)
    };
    tracing::error!("{}", message);
    match last_error {
        Some(e) => Err(anyhow::Error::new(e).context(message)),
        None => Err(anyhow::anyhow!(message)),
    }
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let app = build_app(&config)?;
    let listener = bind(&config).await?;
    let addr = listener.local_addr()?;

    tracing::info!("serving {:?}", config.fasta);
    tracing::info!(
        "started server at http://{}:{} (press CTRL+C to quit)",
        display_host(&config, addr),
        addr.port()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Host shown in the startup URL. Listening on every interface is reported
/// under the machine's hostname, since `0.0.0.0` is not a usable address.
fn display_host(config: &Config, addr: SocketAddr) -> String {
    if !config.host.is_empty() {
        return match config.host.parse::<Ipv6Addr>() {
            Ok(_) => format!("[{}]", config.host),
            Err(_) => config.host.clone(),
        };
    }
    hostname().unwrap_or_else(|| match addr.ip() {
        IpAddr::V6(ip) => format!("[{}]", ip),
        ip => ip.to_string(),
    })
}

fn hostname() -> Option<String> {
    ["HOSTNAME", "COMPUTERNAME"]
        .into_iter()
        .filter_map(|var| std::env::var(var).ok())
        .chain(
            ["/proc/sys/kernel/hostname", "/etc/hostname"]
                .into_iter()
                .filter_map(|path| std::fs::read_to_string(path).ok()),
        )
        .map(|name| name.trim().to_string())
        .find(|name| !name.is_empty())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
