//! Media frame sources and RTP packetization.
//!
//! Two seams live here:
//!
//! - [`rtp::encode`] — turns one frame payload plus its frame index into a
//!   single RTP packet (header layout documented in [`rtp`]).
//! - [`FrameSource`] / [`MediaProvider`] — the collaborators that yield
//!   successive frame payloads. The server never looks inside a frame;
//!   payloads are opaque bytes handed straight to the packetizer.
//!
//! The one bundled implementation is [`mjpeg::MjpegLibrary`], which serves
//! length-prefixed MJPEG files from a directory.

pub mod mjpeg;
pub mod rtp;

use crate::error::Result;

/// A source of successive media frames for one session.
///
/// Bound at SETUP and owned by the session until it ends. `Send` because
/// the streaming loop runs on its own thread.
pub trait FrameSource: Send {
    /// The next frame payload, or `None` when the media is exhausted.
    ///
    /// End of media is not an error: the streaming loop keeps polling and
    /// simply has nothing to send.
    fn next_frame(&mut self) -> Option<Vec<u8>>;

    /// Index of the most recently returned frame.
    ///
    /// Starts at 0 and increases by one per frame, so the first frame
    /// returned by [`next_frame`](Self::next_frame) has index 1. Used as
    /// the RTP sequence number.
    fn frame_index(&self) -> u64;
}

/// Resolves a media resource identifier to a [`FrameSource`].
///
/// Shared by all sessions; `open` is called once per successful SETUP.
pub trait MediaProvider: Send + Sync {
    /// Open the named resource, or [`Error::StreamNotFound`](crate::Error::StreamNotFound)
    /// when it cannot be resolved.
    fn open(&self, resource: &str) -> Result<Box<dyn FrameSource>>;
}
