//! Sensor collection daemon
//!
//! Accepts plain TCP connections, decodes a small HTTP/1.1 subset, routes
//! requests onto the flat-file collection store and writes one response per
//! connection. Each accepted connection runs on its own task.

pub mod error;
pub mod http;
pub mod router;

pub use error::{DaemonError, Result};

use router::Router;
use sensord_core::actuator::{PlugControl, ScriptPlug};
use sensord_core::config::ServerConfig;
use sensord_core::store::CollectionStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

/// The daemon server: configuration, router and run state.
#[derive(Clone)]
pub struct Daemon {
    config: ServerConfig,
    router: Arc<Router>,
    running: Arc<AtomicBool>,
}

impl Daemon {
    /// Build a daemon whose plug actuator shells out to the configured
    /// control script.
    pub fn new(config: ServerConfig) -> Self {
        let plug = Arc::new(ScriptPlug::new(
            config.actuator.interpreter.clone(),
            config.actuator.script.clone(),
        ));
        Self::with_plug(config, plug)
    }

    /// Build a daemon with an explicit plug actuator.
    pub fn with_plug(config: ServerConfig, plug: Arc<dyn PlugControl>) -> Self {
        let store = Arc::new(CollectionStore::new(config.data_dir.clone()));
        let router = Arc::new(Router::new(
            store,
            plug,
            config.template_path.clone(),
            config.actuator.clone(),
        ));
        Self {
            config,
            router,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Bind the listener and serve until [`Daemon::stop`] is called.
    pub async fn start(&self) -> Result<()> {
        let bind_addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| DaemonError::Server(format!("failed to bind {bind_addr}: {e}")))?;

        self.running.store(true, Ordering::SeqCst);
        info!("Server started on {}", bind_addr);
        info!(
            "Reachable on the local network at http://{}:{}",
            sensord_core::net::local_ip(),
            self.config.port
        );

        self.serve(listener).await
    }

    async fn serve(&self, listener: TcpListener) -> Result<()> {
        while self.running.load(Ordering::SeqCst) {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    debug!(%peer, "accepted connection");
                    let router = self.router.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, router).await {
                            warn!(%peer, "connection failed: {}", e);
                        }
                    });
                }
                Err(e) => {
                    if self.running.load(Ordering::SeqCst) {
                        error!("accept failed: {}", e);
                    }
                }
            }
        }

        info!("Server stopped");
        Ok(())
    }

    /// Signal the accept loop to wind down.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Serve exactly one request on the connection, then close it.
async fn handle_connection(mut stream: TcpStream, router: Arc<Router>) -> Result<()> {
    let request = http::decode_request(&mut stream).await;
    let reply = router.route(&request).await;
    let response = http::encode_response(&reply.body, reply.content_type);

    stream
        .write_all(&response)
        .await
        .map_err(|e| DaemonError::Connection(format!("failed to write response: {e}")))?;
    stream.shutdown().await.ok();
    Ok(())
}
