//! The cancellable streaming loop and its cancel signal.
//!
//! One loop runs per session while it is Playing. Each iteration waits up
//! to [`POLL_INTERVAL`] on the session's [`CancelSignal`]; if the signal
//! fires, the loop exits without sending. Otherwise it pulls the next
//! frame, packetizes it, and sends one UDP datagram. The poll interval is
//! therefore both the cancellation-latency bound and the frame cadence —
//! there is no independent frame timer.

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::media::{FrameSource, rtp};
use crate::transport::RtpSender;

/// How long each iteration waits on the cancel signal.
///
/// Doubles as the frame-send cadence: with the source supplying data, one
/// packet goes out roughly every interval. Cancellation is observed within
/// one interval.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One-shot stop flag shared between a session's control task and its
/// streaming loop.
///
/// Created fresh for every PLAY. The control task calls
/// [`cancel`](Self::cancel) on PAUSE or TEARDOWN; the loop observes it via
/// [`wait_for`](Self::wait_for). Backed by a condvar so cancellation wakes
/// the loop immediately instead of waiting out the full poll interval.
pub struct CancelSignal {
    cancelled: Mutex<bool>,
    condvar: Condvar,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self {
            cancelled: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Request the streaming loop to stop. Idempotent.
    pub fn cancel(&self) {
        *self.cancelled.lock() = true;
        self.condvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.lock()
    }

    /// Block for up to `timeout` waiting for cancellation.
    ///
    /// Returns `true` if the signal has fired, `false` on timeout.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        let mut cancelled = self.cancelled.lock();
        if !*cancelled {
            let _ = self.condvar.wait_for(&mut cancelled, timeout);
        }
        *cancelled
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn the streaming loop on its own thread.
///
/// The loop shares the frame source with the session (which re-binds it to
/// a fresh loop across PAUSE/PLAY) and owns a clone of the data-channel
/// sender. It exits only on cancellation — end of media and transient send
/// failures both keep it polling.
pub fn spawn(
    sender: RtpSender,
    dest: SocketAddr,
    source: Arc<Mutex<Box<dyn FrameSource>>>,
    cancel: Arc<CancelSignal>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        run(&sender, dest, &source, &cancel);
    })
}

fn run(
    sender: &RtpSender,
    dest: SocketAddr,
    source: &Mutex<Box<dyn FrameSource>>,
    cancel: &CancelSignal,
) {
    tracing::debug!(%dest, "streaming loop started");

    loop {
        if cancel.wait_for(POLL_INTERVAL) {
            break;
        }

        let (frame, index) = {
            let mut source = source.lock();
            match source.next_frame() {
                Some(frame) => (frame, source.frame_index()),
                // End of media: nothing to send this tick, keep polling.
                None => continue,
            }
        };

        let packet = rtp::encode(&frame, index);
        match sender.send_to(&packet, dest) {
            Ok(_) => {
                tracing::trace!(%dest, frame = index, bytes = packet.len(), "RTP packet sent");
            }
            Err(e) => {
                // Transient failures never stop the loop; only cancellation does.
                tracing::warn!(%dest, error = %e, frame = index, "RTP send failed");
            }
        }
    }

    tracing::debug!(%dest, "streaming loop stopped");
}
