use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::media::MediaProvider;
use crate::protocol::Request;
use crate::server::ServerConfig;
use crate::session::Session;

/// How often the accept loop re-checks the `running` flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(50);

/// Read buffer size for one control request.
const REQUEST_BUF_LEN: usize = 2048;

/// Non-blocking TCP accept loop.
///
/// Checks the `running` flag between accepts so that
/// [`Server::stop`](crate::Server::stop) can terminate it promptly.
/// Each accepted connection gets its own thread and its own [`Session`].
pub fn accept_loop(
    listener: TcpListener,
    provider: Arc<dyn MediaProvider>,
    config: Arc<ServerConfig>,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, _)) => {
                if stream.set_nonblocking(false).is_err() {
                    continue;
                }
                let p = provider.clone();
                let c = config.clone();
                let r = running.clone();
                thread::spawn(move || {
                    Connection::handle(stream, p, c, r);
                });
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(SHUTDOWN_POLL);
            }
            Err(e) => {
                if running.load(Ordering::SeqCst) {
                    tracing::warn!(error = %e, "TCP accept error");
                }
            }
        }
    }
    tracing::debug!("accept loop exited");
}

/// One client's control connection: read loop, dispatch, reply.
struct Connection {
    stream: TcpStream,
    session: Session,
    peer_addr: SocketAddr,
}

impl Connection {
    /// Entry point: set up the connection's session and run its loop.
    pub fn handle(
        stream: TcpStream,
        provider: Arc<dyn MediaProvider>,
        config: Arc<ServerConfig>,
        running: Arc<AtomicBool>,
    ) {
        let peer_addr = match stream.peer_addr() {
            Ok(addr) => addr,
            Err(_) => return,
        };

        tracing::info!(%peer_addr, "client connected");

        let session = Session::new(peer_addr.ip(), provider, config);

        let mut conn = Connection {
            stream,
            session,
            peer_addr,
        };

        let reason = conn.run(&running);
        conn.session.shutdown();

        tracing::info!(%peer_addr, reason, "client disconnected");
    }

    /// Control request/reply loop. Returns the reason for exiting.
    fn run(&mut self, running: &Arc<AtomicBool>) -> &'static str {
        while running.load(Ordering::SeqCst) {
            let request_text = match self.read_request() {
                Ok(Some(text)) => text,
                Ok(None) => return "connection closed by client",
                Err(_) => return "read error",
            };

            if request_text.trim().is_empty() {
                continue;
            }

            // Malformed requests are fatal to this connection only; the
            // listener and other sessions are unaffected.
            let request = match Request::parse(&request_text) {
                Ok(request) => request,
                Err(e) => {
                    tracing::warn!(peer = %self.peer_addr, error = %e, "malformed request");
                    return "malformed request";
                }
            };

            tracing::debug!(
                peer = %self.peer_addr,
                method = %request.method,
                resource = %request.resource,
                cseq = %request.cseq,
                "request"
            );

            if let Some(reply) = self.session.handle_request(&request) {
                tracing::debug!(peer = %self.peer_addr, status = reply.status_code(), "reply");

                if self
                    .stream
                    .write_all(reply.serialize().as_bytes())
                    .is_err()
                {
                    return "write error";
                }
            }

            if self.session.is_closed() {
                return "session torn down";
            }
        }

        "server shutting down"
    }

    /// Block for the next control request.
    ///
    /// Requests carry no framing terminator, so one blocking read is one
    /// request: clients write each request with a single send, and the
    /// request/reply lockstep keeps successive requests from coalescing.
    /// Returns `Ok(None)` on clean EOF.
    fn read_request(&mut self) -> io::Result<Option<String>> {
        let mut buf = [0u8; REQUEST_BUF_LEN];
        let n = self.stream.read(&mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&buf[..n]).into_owned()))
    }
}
