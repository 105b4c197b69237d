//! HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::db::Database;
use crate::file::AttachmentStorage;
use crate::{MailroomError, Result};

use super::handlers::AppState;
use super::middleware::RateLimitState;
use super::router::{create_health_router, create_router};

/// The Mailroom web server.
pub struct WebServer {
    addr: SocketAddr,
    app_state: Arc<AppState>,
    rate_limit: Arc<RateLimitState>,
    cors_origins: Vec<String>,
}

impl WebServer {
    /// Create a server from configuration.
    ///
    /// Fails if `web.host` and `web.port` do not form a socket address.
    pub fn new(config: &Config, db: Arc<Database>, storage: AttachmentStorage) -> Result<Self> {
        let web = &config.web;
        let addr: SocketAddr = format!("{}:{}", web.host, web.port)
            .parse()
            .map_err(|e| {
                MailroomError::Config(format!(
                    "invalid web address {}:{}: {}",
                    web.host, web.port, e
                ))
            })?;

        let tokens = Arc::new(TokenIssuer::new(
            &web.jwt_secret,
            web.jwt_access_token_expiry_secs,
        ));
        let app_state = AppState::new(db, tokens, storage, config.files.max_upload_size_bytes());

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            rate_limit: Arc::new(RateLimitState::new(web.login_rate_limit)),
            cors_origins: web.cors_origins.clone(),
        })
    }

    /// Configured listen address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    async fn bind(self) -> Result<(TcpListener, axum::Router)> {
        let router = create_router(
            self.app_state.clone(),
            &self.cors_origins,
            Some(self.rate_limit.clone()),
        )
        .merge(create_health_router(self.app_state))
        .layer(CompressionLayer::new());

        let listener = TcpListener::bind(self.addr).await?;
        self.rate_limit.start_cleanup_task();

        tracing::info!("Web server listening on http://{}", listener.local_addr()?);
        Ok((listener, router))
    }

    /// Serve until Ctrl-C.
    pub async fn run(self) -> Result<()> {
        let (listener, router) = self.bind().await?;

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        tracing::info!("Web server stopped");
        Ok(())
    }

    /// Serve in the background and return the bound address.
    ///
    /// Bind to port 0 to get an ephemeral port.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let (listener, router) = self.bind().await?;
        let local_addr = listener.local_addr()?;

        tokio::spawn(async move {
            let service = router.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, service).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.web.host = "127.0.0.1".to_string();
        config.web.port = 0;
        config.web.jwt_secret = "server-test-secret".to_string();
        config
    }

    #[tokio::test]
    async fn test_rejects_bad_address() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config();
        config.web.host = "not an address".to_string();

        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let storage = AttachmentStorage::new(dir.path()).unwrap();
        let result = WebServer::new(&config, db, storage);
        assert!(matches!(result, Err(MailroomError::Config(_))));
    }

    #[tokio::test]
    async fn test_run_with_addr_serves_health() {
        let dir = TempDir::new().unwrap();
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let storage = AttachmentStorage::new(dir.path()).unwrap();

        let server = WebServer::new(&test_config(), db, storage).unwrap();
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");

        let addr = server.run_with_addr().await.unwrap();
        assert_ne!(addr.port(), 0);

        let stream = tokio::net::TcpStream::connect(addr).await;
        assert!(stream.is_ok());
    }
}
