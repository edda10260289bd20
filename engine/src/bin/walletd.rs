use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};

use database::Database;
use engine::{Config, Engine, TaskQueue, TaskServer};
use rpc_client::{FailoverPool, HttpNodeClient, NodeApi};

/// Wallet index write engine daemon
#[derive(Parser)]
#[command(name = "walletd")]
struct Args {
    /// Data directory for the wallet index store
    #[arg(short, long, default_value = "walletd_data")]
    data_dir: PathBuf,

    /// Listen address for the task socket
    #[arg(short, long, default_value = "127.0.0.1:3380")]
    listen: String,

    /// Node JSON-RPC endpoint; repeat the flag to build a failover pool
    #[arg(short, long = "node", required = true)]
    nodes: Vec<String>,

    /// Delay between RPC failover attempts, in milliseconds
    #[arg(long, default_value = "2000")]
    retry_delay_ms: u64,

    /// Maximum queued tasks before submissions are rejected
    #[arg(long, default_value = "1000")]
    queue_bound: usize,

    /// Retained block records for reorg rollback
    #[arg(long, default_value = "288")]
    prune_depth: u32,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(&args);

    let db = match Database::open(&args.data_dir) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!(path = %args.data_dir.display(), error = %e, "failed to open database");
            process::exit(1);
        }
    };

    let clients: Vec<Arc<dyn NodeApi>> = args
        .nodes
        .iter()
        .map(|url| Arc::new(HttpNodeClient::new(url)) as Arc<dyn NodeApi>)
        .collect();
    let pool = Arc::new(FailoverPool::new(clients, Duration::from_millis(args.retry_delay_ms)));

    let config = Config {
        prune_depth: args.prune_depth,
        queue_bound: args.queue_bound,
        ..Config::default()
    };

    let engine = match Engine::open(db.clone(), pool, config) {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            error!(error = %e, "failed to initialize engine");
            process::exit(1);
        }
    };

    if let Err(e) = engine.recover().await {
        error!(error = %e, "startup recovery failed");
        process::exit(1);
    }

    let listener = match TcpListener::bind(&args.listen).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %args.listen, error = %e, "failed to bind task socket");
            process::exit(1);
        }
    };
    info!(addr = %args.listen, "walletd listening");

    let queue = Arc::new(TaskQueue::new(args.queue_bound));
    let worker = {
        let queue = queue.clone();
        let engine = engine.clone();
        tokio::spawn(async move { queue.run_worker(engine).await })
    };

    let server = TaskServer::new(queue);
    tokio::select! {
        _ = server.run(listener) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            engine.stop();
        }
    }

    let _ = worker.await;
    db.close();
    info!("walletd stopped");
}

fn init_logging(args: &Args) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt().with_env_filter(filter).init();
}
