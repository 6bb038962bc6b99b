use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;

use crate::error::Result;

/// Owning handle to a session's UDP data channel.
///
/// Bound fresh at each PLAY and dropped at TEARDOWN. Cloning shares the
/// same socket, so the session and its streaming loop can both hold it;
/// the socket closes once the last clone is dropped.
///
/// Deliberately address-only: it knows nothing about sessions or frames.
/// The caller resolves the destination before calling
/// [`send_to`](Self::send_to).
#[derive(Clone)]
pub struct RtpSender {
    socket: Arc<UdpSocket>,
}

impl RtpSender {
    /// Bind an ephemeral UDP socket for outbound packets.
    pub fn bind() -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        Ok(Self {
            socket: Arc::new(socket),
        })
    }

    /// Send one datagram to the given address.
    pub fn send_to(&self, payload: &[u8], addr: SocketAddr) -> Result<usize> {
        Ok(self.socket.send_to(payload, addr)?)
    }
}
