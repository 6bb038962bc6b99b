//! Control protocol: request parsing and reply formatting.
//!
//! The control channel speaks a minimal RTSP dialect — four methods,
//! two or three lines per request, plain-text replies:
//!
//! ```text
//! SETUP movie.mjpeg RTSP/1.0
//! CSeq: 1
//! Transport: RTP/UDP; client_port= 25000
//! ```
//!
//! | Method | Valid in state | Effect |
//! |----------|----------------|-----------------------------------|
//! | SETUP | Init | Bind frame source, assign session |
//! | PLAY | Ready | Open data channel, start streaming |
//! | PAUSE | Playing | Stop streaming |
//! | TEARDOWN | any | Stop streaming, close session |
//!
//! Parsing lives in [`request`], reply construction and serialization in
//! [`response`]. State validity is enforced by
//! [`Session`](crate::session::Session), not here — a parsed request may
//! still be silently ignored by the state machine.

pub mod request;
pub mod response;

pub use request::Request;
pub use response::{Reply, Status};
