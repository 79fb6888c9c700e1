mod api;
mod certs;
pub mod cli;
pub mod config;
pub mod logging;

use anyhow::Result;
use axum::Router;
use axum_server::{Handle, tls_rustls::RustlsConfig};
use injector_admission::admitter::PodAdmitter;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tracing::{info, warn};

use crate::api::state::ApiServerState;
use crate::certs::create_tls_config_and_watch_certificate_changes;
use crate::config::Config;

pub struct InjectorServer {
    router: Router,
    addr: SocketAddr,
    tls_config: Option<RustlsConfig>,
}

impl InjectorServer {
    pub async fn new_from_config(config: Config) -> Result<Self> {
        let admitter = PodAdmitter::new(config.injection);
        info!(
            init_container_image = admitter.config().init_container_image.as_str(),
            injected_binary = admitter.config().injected_binary_path().as_str(),
            "pod admitter ready"
        );

        let state = Arc::new(ApiServerState {
            admitter: Box::new(admitter),
        });

        let tls_config = match config.tls_config {
            Some(tls_config) => {
                Some(create_tls_config_and_watch_certificate_changes(tls_config).await?)
            }
            None => None,
        };

        Ok(Self {
            router: api::router(state),
            addr: config.addr,
            tls_config,
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until SIGINT or SIGTERM, then drain the in-flight requests.
    pub async fn run(self) -> Result<()> {
        let handle = Handle::new();
        tokio::spawn(shutdown_on_signal(handle.clone()));

        match self.tls_config {
            Some(tls_config) => {
                info!(address = self.addr.to_string().as_str(), "started HTTPS server");
                axum_server::bind_rustls(self.addr, tls_config)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
            None => {
                info!(address = self.addr.to_string().as_str(), "started HTTP server");
                axum_server::bind(self.addr)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
        }

        info!("server stopped");
        Ok(())
    }
}

const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(10);

async fn shutdown_on_signal(handle: Handle) {
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = e.to_string().as_str(), "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = e.to_string().as_str(), "cannot listen for SIGINT");
                return;
            }
        }
        _ = terminate => {}
    }

    info!("shutdown signal received, draining requests");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE_PERIOD));
}
