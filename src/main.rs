use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use treeserve::config::{Config, ServeContext};
use treeserve::server::{self, signal};
use treeserve::{logger, transfer};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;
    logger::init(&cfg.logging)?;

    // Half of the hardware threads, at least one
    let workers = server::default_worker_count();
    let runtime = server::build_runtime(workers)?;

    runtime.block_on(async_main(cfg, workers))
}

async fn async_main(cfg: Config, workers: usize) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let ctx = Arc::new(ServeContext::new(&cfg));

    let root_meta = tokio::fs::metadata(&ctx.root)
        .await
        .map_err(|e| format!("Cannot serve '{}': {e}", ctx.root.display()))?;
    if !root_meta.is_dir() {
        return Err(format!("Cannot serve '{}': not a directory", ctx.root.display()).into());
    }

    let listener = server::create_listener(addr)?;

    logger::log_server_start(&addr, &ctx.root, workers);
    tracing::info!("Body transfer strategy: {}", transfer::STRATEGY);

    let shutdown = Arc::new(Notify::new());
    signal::start_signal_handler(Arc::clone(&shutdown));

    let grace = Duration::from_secs(cfg.server.shutdown_grace_secs);
    server::run_acceptor(listener, ctx, shutdown, grace).await?;

    Ok(())
}
