//! Server wiring and lifecycle.

use std::sync::Arc;

use hubstream_report::{ReportConfig, ReportServer, ScanReporter};
use hubstream_server::{ServerConfig, StreamServer};

use crate::config::Config;

/// Runs both listeners until a shutdown signal arrives.
pub async fn run(config: Config) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&config.cache_root).await?;

    let stream_server = StreamServer::new(ServerConfig {
        port: config.stream_port,
        cache_root: config.cache_root.clone(),
    });

    let reporter = ScanReporter::new(&config.cache_root);
    let report_server = ReportServer::new(
        ReportConfig {
            port: config.report_port,
            asset_dir: config.asset_dir.clone(),
        },
        reporter,
    );

    let stream_handle = {
        let server = Arc::clone(&stream_server);
        tokio::spawn(async move { server.run().await })
    };
    let report_handle = {
        let server = Arc::clone(&report_server);
        tokio::spawn(async move { server.run().await })
    };

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");

    stream_server.shutdown();
    report_server.shutdown();
    stream_handle.await??;
    report_handle.await??;

    Ok(())
}
