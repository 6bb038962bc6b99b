//! Socket plumbing: the TCP control listener and the UDP data channel.
//!
//! [`tcp`] owns the accept loop and the per-connection request/reply loop;
//! [`udp`] is the thin owned handle the streaming loop sends datagrams
//! through. Neither layer knows the protocol rules — that is all in
//! [`session`](crate::session) and [`protocol`](crate::protocol).

pub mod tcp;
pub mod udp;

pub use udp::RtpSender;
