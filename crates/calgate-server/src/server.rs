//! Gateway assembly and the HTTP accept loop.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::GatewayConfig;
use crate::error::ServerResult;
use crate::routes::{AppState, router};
use crate::shutdown::ShutdownSignal;
use crate::upstream::UpstreamClient;

/// A configured gateway, ready to bind.
pub struct Gateway {
    listen: SocketAddr,
    router: Router,
}

impl Gateway {
    /// Builds the upstream client and the router from a loaded configuration.
    pub fn new(config: GatewayConfig) -> ServerResult<Self> {
        let upstream =
            UpstreamClient::new(config.server.upstream_timeout(), &config.server.user_agent)?;

        for calendar in &config.calendars {
            info!(
                calendar = %calendar.name,
                public = calendar.public,
                free_busy = calendar.chain.is_free_busy(),
                filters = calendar.chain.filters().len(),
                "Serving calendar at /calendars/{}/feed",
                calendar.name
            );
        }

        Ok(Self {
            listen: config.server.listen,
            router: router(AppState::new(config.calendars, upstream)),
        })
    }

    /// Address the gateway binds to.
    pub fn listen_addr(&self) -> SocketAddr {
        self.listen
    }

    /// Returns the application router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Binds the configured address and serves until shutdown.
    pub async fn run(self, shutdown: ShutdownSignal) -> ServerResult<()> {
        let listener = TcpListener::bind(self.listen).await?;
        self.run_on(listener, shutdown).await
    }

    /// Serves on an already bound listener until shutdown.
    ///
    /// In-flight requests are allowed to finish once shutdown is signaled.
    pub async fn run_on(self, listener: TcpListener, shutdown: ShutdownSignal) -> ServerResult<()> {
        info!(addr = %listener.local_addr()?, "Listening");
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;
        info!("Server stopped");
        Ok(())
    }
}
