//! Vitalis API server binary.
//!
//! Usage:
//!   vitalis-api --config config.toml
//!   vitalis-api --port 9000
//!
//! Logging is controlled through `RUST_LOG`.

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vitalis_api::{serve, AppState};
use vitalis_coordinator::{build_registry, CoordinatorConfig, Dispatcher, Orchestrator};
use vitalis_llm::build_gateway;
use vitalis_store::{seed_demo_data, ConversationLog, HealthStore, MemoryStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,vitalis_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;
    let mut port_override: Option<u16> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--port" | "-p" => {
                if i + 1 < args.len() {
                    port_override = Some(args[i + 1].parse()?);
                    i += 1;
                }
            }
            other => {
                warn!(argument = other, "Ignoring unknown argument");
            }
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => CoordinatorConfig::from_file(&path)?,
        None => CoordinatorConfig::default(),
    };

    let store = Arc::new(MemoryStore::new());
    seed_demo_data(&store).await;
    info!("Seeded demo health data");

    let registry = build_registry(store.clone() as Arc<dyn HealthStore>);
    let startup = registry.startup_report().clone();
    if !startup.all_ready() {
        for (domain, error) in &startup.degraded {
            warn!(domain = %domain, error = %error, "Capability domain degraded");
        }
    }

    let gateway = build_gateway(&config.llm);
    let dispatcher = Dispatcher::new(Arc::new(registry), store, config.demo_policy());
    let orchestrator = Arc::new(Orchestrator::new(
        dispatcher,
        gateway.clone(),
        Arc::new(ConversationLog::new()),
    ));

    let state = Arc::new(AppState::new(orchestrator, gateway, startup));

    let port = port_override.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", config.server.host, port).parse()?;
    serve(state, addr).await
}
