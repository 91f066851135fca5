pub mod api;

use crate::cli::Args;
use axum_server::tls_rustls::RustlsConfig;
use log::{ error, info, warn };
use std::error::Error;
use std::net::SocketAddr;
use tokio::net::TcpListener;

pub use api::{ router, AppState, GlobalLimiter };

pub struct Server {
    addr: String,
    state: AppState,
    args: Args,
}

impl Server {
    pub fn new(addr: String, state: AppState, args: Args) -> Self {
        if state.verifier.verifies_signature() {
            info!("Access tokens verified with the configured JWT secret.");
        } else {
            warn!("No JWT secret configured. Access tokens are decoded but signatures are not checked.");
        }
        Self { addr, state, args }
    }

    /// Picks `(cert, key)` when TLS is requested; errors on a half-configured pair.
    fn tls_paths(&self) -> Result<Option<(String, String)>, Box<dyn Error + Send + Sync>> {
        if !self.args.enable_tls {
            info!("TLS not enabled. Running plain HTTP server.");
            return Ok(None);
        }
        match (&self.args.tls_cert_path, &self.args.tls_key_path) {
            (Some(cert_path), Some(key_path)) => Ok(Some((cert_path.clone(), key_path.clone()))),
            (Some(_), None) | (None, Some(_)) => {
                error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                Err("Missing TLS certificate or key path".into())
            }
            (None, None) => {
                error!("--enable-tls was set but no certificate/key paths provided.");
                Err("TLS enabled without cert/key".into())
            }
        }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let app = router(self.state.clone());

        match self.tls_paths()? {
            Some((cert_path, key_path)) => {
                let addr: SocketAddr = self.addr
                    .parse()
                    .map_err(|e| format!("Invalid server address '{}': {}", self.addr, e))?;
                info!(
                    "TLS enabled. Loading certificate from '{}' and key from '{}'",
                    cert_path,
                    key_path
                );
                let tls_config = RustlsConfig::from_pem_file(&cert_path, &key_path).await?;
                info!("HTTPS server listening on: {}", addr);
                axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
            }
            None => {
                let listener = TcpListener::bind(&self.addr).await.map_err(|e| {
                    format!("Failed to bind HTTP server to {}: {}", self.addr, e)
                })?;
                info!("HTTP server listening on: {}", self.addr);
                axum::serve(listener, app).await?;
            }
        }

        Ok(())
    }
}
