//! Serve command - run the HTTP endpoint

use super::build_evaluator;
use crate::config::Config;
use crate::error::AppResult;
use crate::server::HttpServer;
use crate::web::App;
use std::sync::Arc;
use tracing::info;

/// Execute the serve command
pub async fn execute(config: &Config) -> AppResult<()> {
    let app = Arc::new(App::new(build_evaluator(config)?));

    let server = HttpServer::bind(&listen_addr(&config.server.bind, config.server.port))?;
    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down");
            shutdown.shutdown();
        }
    });

    server.run(app, config.server.workers).await
}

/// `host:port`, bracketing IPv6 hosts
fn listen_addr(bind: &str, port: u16) -> String {
    if bind.contains(':') && !bind.starts_with('[') {
        format!("[{}]:{}", bind, port)
    } else {
        format!("{}:{}", bind, port)
    }
}
