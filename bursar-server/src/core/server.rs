//! 服务器启动与关停

use crate::core::{Config, ServerState};

/// 绑定端口前的最后一站，持有装配完成的 state
pub struct Server {
    config: Config,
    state: ServerState,
}

impl Server {
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self { config, state }
    }

    /// 运行 HTTP 服务直到收到 Ctrl-C
    pub async fn run(&self) -> anyhow::Result<()> {
        crate::api::health::mark_started();

        tracing::info!(port = self.config.http_port, "Bursar Server starting");

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        };

        self.state.http.start_server(shutdown).await?;

        Ok(())
    }
}
