use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::error::{Error, Result};
use crate::media::MediaProvider;
use crate::transport::tcp;

/// Whether 404/500 conditions are reported back to the client.
///
/// The 200 path always transmits. Error paths are a policy decision:
/// `Transmit` sends `RTSP/1.0 404 NOT FOUND` / `RTSP/1.0 500 CONNECTION
/// ERROR` replies; `Silent` records the condition in the log and sends
/// nothing, leaving the client to time out on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorReplyPolicy {
    /// Send 404/500 replies to the client.
    #[default]
    Transmit,
    /// Log only; the client observes silence.
    Silent,
}

/// Server-level configuration shared by all sessions.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Error-reply transmission policy, see [`ErrorReplyPolicy`].
    pub error_replies: ErrorReplyPolicy,
}

/// High-level server orchestrator.
///
/// Owns the listener lifecycle and hands each accepted control connection
/// to its own [`Session`](crate::session::Session) thread. Media
/// resolution is delegated to the supplied [`MediaProvider`].
pub struct Server {
    provider: Arc<dyn MediaProvider>,
    running: Arc<AtomicBool>,
    bind_addr: String,
    local_addr: Option<SocketAddr>,
    config: Arc<ServerConfig>,
}

impl Server {
    pub fn new(bind_addr: &str, provider: Arc<dyn MediaProvider>) -> Self {
        Self::with_config(bind_addr, provider, ServerConfig::default())
    }

    /// Create a server with custom configuration.
    pub fn with_config(
        bind_addr: &str,
        provider: Arc<dyn MediaProvider>,
        config: ServerConfig,
    ) -> Self {
        Self {
            provider,
            running: Arc::new(AtomicBool::new(false)),
            bind_addr: bind_addr.to_string(),
            local_addr: None,
            config: Arc::new(config),
        }
    }

    /// Bind the control listener and spawn the accept loop.
    pub fn start(&mut self) -> Result<()> {
        if self.running.load(Ordering::SeqCst) {
            return Err(Error::AlreadyRunning);
        }

        let listener = TcpListener::bind(&self.bind_addr)?;
        listener.set_nonblocking(true)?;

        let local_addr = listener.local_addr()?;
        self.local_addr = Some(local_addr);
        self.running.store(true, Ordering::SeqCst);

        let running = self.running.clone();
        let provider = self.provider.clone();
        let config = self.config.clone();

        tracing::info!(addr = %local_addr, "control listener started");

        thread::spawn(move || {
            tcp::accept_loop(listener, provider, config, running);
        });

        Ok(())
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        tracing::info!("server stopping");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The address the control listener actually bound, once started.
    ///
    /// Useful when binding port 0 to get an OS-assigned port.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}
