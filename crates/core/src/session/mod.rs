//! Per-connection session state machine.
//!
//! A [`Session`] owns one client's whole lifecycle: it parses nothing and
//! sends nothing itself, but given each parsed [`Request`] it validates
//! the method against the current state, performs the side effects, and
//! hands back the reply (if any) for the connection to transmit.
//!
//! ## Lifecycle
//!
//! ```text
//! Init --SETUP--> Ready --PLAY--> Playing
//!                   ^               |
//!                   +----PAUSE------+
//!
//! TEARDOWN (from any state) -> Closed
//! ```
//!
//! A method arriving in a state where it has no defined transition is
//! silently ignored — no reply, no state change. This tolerates duplicate
//! and out-of-order client retries (e.g. a second PAUSE landing after the
//! first already moved the session to Ready).
//!
//! All fields are instance-owned: nothing is shared across sessions, and
//! only the connection's control thread mutates the state. The sole
//! cross-thread handoff is the [`CancelSignal`] and the frame source
//! shared with the streaming loop.

pub mod streamer;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;
use rand::RngExt;

use crate::error::Error;
use crate::media::{FrameSource, MediaProvider};
use crate::protocol::{Reply, Request};
use crate::server::{ErrorReplyPolicy, ServerConfig};
use crate::transport::RtpSender;

pub use streamer::{CancelSignal, POLL_INTERVAL};

/// Session IDs are drawn uniformly from this range at SETUP.
const SESSION_ID_MIN: u32 = 100_000;
const SESSION_ID_MAX: u32 = 999_999;

/// Session lifecycle state. See the module docs for the transition graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Initial state; only SETUP (or TEARDOWN) has any effect.
    Init,
    /// Frame source bound, not streaming.
    Ready,
    /// Streaming loop active.
    Playing,
    /// Terminal; every request is ignored.
    Closed,
}

/// One client's session: state machine plus the resources it owns.
///
/// Created per accepted control connection and driven exclusively by that
/// connection's thread. While Playing, exactly one streaming loop runs on
/// its own thread; PAUSE and TEARDOWN signal its [`CancelSignal`] and join
/// it before replying, so the 200 OK is never followed by a stray packet
/// and at most one loop ever exists per session.
pub struct Session {
    state: SessionState,
    /// Assigned at successful SETUP; 0 is reported if torn down before then.
    id: Option<u32>,
    /// Client IP from the control connection, destination for data packets.
    peer_ip: IpAddr,
    /// Client UDP port, captured from the SETUP transport line.
    data_port: Option<u16>,
    /// Data-channel socket; bound at PLAY, dropped at TEARDOWN.
    sender: Option<RtpSender>,
    /// Frame source bound at SETUP, shared with the streaming loop.
    source: Option<Arc<Mutex<Box<dyn FrameSource>>>>,
    /// Stop flag for the active loop; fresh per PLAY.
    cancel: Option<Arc<CancelSignal>>,
    /// Handle to the running streaming loop, present only while Playing.
    streamer: Option<JoinHandle<()>>,
    provider: Arc<dyn MediaProvider>,
    config: Arc<ServerConfig>,
}

impl Session {
    pub fn new(
        peer_ip: IpAddr,
        provider: Arc<dyn MediaProvider>,
        config: Arc<ServerConfig>,
    ) -> Self {
        Session {
            state: SessionState::Init,
            id: None,
            peer_ip,
            data_port: None,
            sender: None,
            source: None,
            cancel: None,
            streamer: None,
            provider,
            config,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Session identifier, or `None` before SETUP succeeds.
    pub fn id(&self) -> Option<u32> {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    /// Apply one control request to the state machine.
    ///
    /// Returns the reply to transmit, or `None` when the request is
    /// dropped — either an invalid-in-state method, or an error reply
    /// suppressed by [`ErrorReplyPolicy::Silent`].
    pub fn handle_request(&mut self, request: &Request) -> Option<Reply> {
        match (self.state, request.method.as_str()) {
            (SessionState::Init, "SETUP") => self.handle_setup(request),
            (SessionState::Ready, "PLAY") => self.handle_play(request),
            (SessionState::Playing, "PAUSE") => self.handle_pause(request),
            (state, "TEARDOWN") if state != SessionState::Closed => self.handle_teardown(request),
            (state, method) => {
                tracing::debug!(
                    ?state,
                    method,
                    cseq = %request.cseq,
                    "method not valid in current state, ignoring"
                );
                None
            }
        }
    }

    fn handle_setup(&mut self, request: &Request) -> Option<Reply> {
        let source = match self.provider.open(&request.resource) {
            Ok(source) => source,
            Err(Error::StreamNotFound(_)) => {
                tracing::warn!(resource = %request.resource, "SETUP for unknown resource");
                return self.error_reply(Reply::not_found(&request.cseq));
            }
            Err(e) => {
                tracing::error!(resource = %request.resource, error = %e, "failed to open resource");
                return self.error_reply(Reply::internal_error(&request.cseq));
            }
        };

        let id = rand::rng().random_range(SESSION_ID_MIN..=SESSION_ID_MAX);
        self.source = Some(Arc::new(Mutex::new(source)));
        self.data_port = request.client_port;
        self.id = Some(id);
        self.state = SessionState::Ready;

        tracing::info!(
            session_id = id,
            resource = %request.resource,
            data_port = ?self.data_port,
            "session ready"
        );
        Some(Reply::ok(&request.cseq, id))
    }

    fn handle_play(&mut self, request: &Request) -> Option<Reply> {
        // All three are set by SETUP; Ready is unreachable without them.
        let (Some(port), Some(source), Some(id)) =
            (self.data_port, self.source.clone(), self.id)
        else {
            tracing::error!("PLAY in Ready without negotiated transport");
            return self.error_reply(Reply::internal_error(&request.cseq));
        };

        // Fresh data socket per PLAY; the previous loop (if any) was
        // already joined by PAUSE.
        let sender = match RtpSender::bind() {
            Ok(sender) => sender,
            Err(e) => {
                tracing::error!(error = %e, "failed to bind data socket");
                return self.error_reply(Reply::internal_error(&request.cseq));
            }
        };

        let dest = SocketAddr::new(self.peer_ip, port);
        let cancel = Arc::new(CancelSignal::new());
        let handle = streamer::spawn(sender.clone(), dest, source, cancel.clone());

        self.sender = Some(sender);
        self.cancel = Some(cancel);
        self.streamer = Some(handle);
        self.state = SessionState::Playing;

        tracing::info!(session_id = id, %dest, "streaming started");
        Some(Reply::ok(&request.cseq, id))
    }

    fn handle_pause(&mut self, request: &Request) -> Option<Reply> {
        self.stop_streaming();
        self.state = SessionState::Ready;
        tracing::info!(session_id = self.session_id(), "streaming paused");
        Some(Reply::ok(&request.cseq, self.session_id()))
    }

    fn handle_teardown(&mut self, request: &Request) -> Option<Reply> {
        self.stop_streaming();
        self.sender = None; // closes the data channel
        self.source = None;
        self.state = SessionState::Closed;
        tracing::info!(session_id = self.session_id(), "session closed");
        Some(Reply::ok(&request.cseq, self.session_id()))
    }

    /// Release everything without a TEARDOWN, e.g. on client disconnect.
    pub fn shutdown(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.stop_streaming();
        self.sender = None;
        self.source = None;
        self.state = SessionState::Closed;
        tracing::debug!(session_id = self.session_id(), "session shut down");
    }

    /// Signal the active streaming loop (if any) and wait for it to exit.
    ///
    /// The join is bounded by one [`POLL_INTERVAL`] — the loop observes the
    /// signal on its next wait.
    fn stop_streaming(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        if let Some(handle) = self.streamer.take()
            && handle.join().is_err()
        {
            tracing::error!(session_id = self.session_id(), "streaming loop panicked");
        }
    }

    /// Session ID for reply formatting; 0 when none was ever assigned
    /// (TEARDOWN straight from Init).
    fn session_id(&self) -> u32 {
        self.id.unwrap_or(0)
    }

    fn error_reply(&self, reply: Reply) -> Option<Reply> {
        match self.config.error_replies {
            ErrorReplyPolicy::Transmit => Some(reply),
            ErrorReplyPolicy::Silent => {
                tracing::debug!(status = reply.status_code(), "error reply suppressed");
                None
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use std::net::{Ipv4Addr, UdpSocket};
    use std::time::Duration;

    /// Endless source repeating one payload with an incrementing index.
    struct RepeatingSource {
        payload: Vec<u8>,
        frame_index: u64,
    }

    impl FrameSource for RepeatingSource {
        fn next_frame(&mut self) -> Option<Vec<u8>> {
            self.frame_index += 1;
            Some(self.payload.clone())
        }

        fn frame_index(&self) -> u64 {
            self.frame_index
        }
    }

    /// Provider that resolves only the resource named `good`.
    struct TestProvider;

    impl MediaProvider for TestProvider {
        fn open(&self, resource: &str) -> Result<Box<dyn FrameSource>> {
            if resource == "good" {
                Ok(Box::new(RepeatingSource {
                    payload: b"jpegdata".to_vec(),
                    frame_index: 0,
                }))
            } else {
                Err(Error::StreamNotFound(resource.to_string()))
            }
        }
    }

    fn session_with_policy(policy: ErrorReplyPolicy) -> Session {
        Session::new(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            Arc::new(TestProvider),
            Arc::new(ServerConfig {
                error_replies: policy,
            }),
        )
    }

    fn session() -> Session {
        session_with_policy(ErrorReplyPolicy::Transmit)
    }

    fn setup_request(resource: &str, cseq: &str, port: u16) -> Request {
        Request {
            method: "SETUP".to_string(),
            resource: resource.to_string(),
            version: "RTSP/1.0".to_string(),
            cseq: cseq.to_string(),
            client_port: Some(port),
        }
    }

    fn request(method: &str, cseq: &str) -> Request {
        Request {
            method: method.to_string(),
            resource: "good".to_string(),
            version: "RTSP/1.0".to_string(),
            cseq: cseq.to_string(),
            client_port: None,
        }
    }

    /// Receive one packet with a timeout, or `None` if nothing arrives.
    fn recv_packet(socket: &UdpSocket, timeout: Duration) -> Option<Vec<u8>> {
        socket.set_read_timeout(Some(timeout)).unwrap();
        let mut buf = [0u8; 2048];
        match socket.recv(&mut buf) {
            Ok(n) => Some(buf[..n].to_vec()),
            Err(_) => None,
        }
    }

    #[test]
    fn setup_moves_init_to_ready() {
        let mut session = session();
        let reply = session.handle_request(&setup_request("good", "1", 25000)).unwrap();
        assert_eq!(session.state(), SessionState::Ready);

        let id = session.id().unwrap();
        assert!((SESSION_ID_MIN..=SESSION_ID_MAX).contains(&id));
        assert_eq!(
            reply.serialize(),
            format!("RTSP/1.0 200 OK\nCSeq: 1\nSession: {}", id)
        );
    }

    #[test]
    fn setup_unknown_resource_replies_404_and_stays_init() {
        let mut session = session();
        let reply = session.handle_request(&setup_request("missing", "1", 25000)).unwrap();
        assert_eq!(reply.serialize(), "RTSP/1.0 404 NOT FOUND\nCSeq: 1");
        assert_eq!(session.state(), SessionState::Init);
        assert_eq!(session.id(), None);
    }

    #[test]
    fn silent_policy_suppresses_404() {
        let mut session = session_with_policy(ErrorReplyPolicy::Silent);
        let reply = session.handle_request(&setup_request("missing", "1", 25000));
        assert!(reply.is_none());
        assert_eq!(session.state(), SessionState::Init);
    }

    #[test]
    fn play_in_init_is_ignored() {
        let mut session = session();
        assert!(session.handle_request(&request("PLAY", "1")).is_none());
        assert_eq!(session.state(), SessionState::Init);
    }

    #[test]
    fn pause_in_ready_is_ignored() {
        let mut session = session();
        let _ = session.handle_request(&setup_request("good", "1", 25000)).unwrap();
        let id = session.id();

        // Second PAUSE after one already paused would land here too;
        // state and resources are untouched.
        assert!(session.handle_request(&request("PAUSE", "2")).is_none());
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.id(), id);
    }

    #[test]
    fn duplicate_setup_is_ignored() {
        let mut session = session();
        let _ = session.handle_request(&setup_request("good", "1", 25000)).unwrap();
        let id = session.id();

        assert!(session.handle_request(&setup_request("good", "2", 26000)).is_none());
        assert_eq!(session.id(), id);
    }

    #[test]
    fn lowercase_method_is_ignored() {
        let mut session = session();
        assert!(session.handle_request(&request("setup", "1")).is_none());
        assert_eq!(session.state(), SessionState::Init);
    }

    #[test]
    fn play_streams_packets_and_pause_stops_them() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = receiver.local_addr().unwrap().port();

        let mut session = session();
        let _ = session.handle_request(&setup_request("good", "1", port)).unwrap();

        let reply = session.handle_request(&request("PLAY", "2")).unwrap();
        assert_eq!(session.state(), SessionState::Playing);
        assert!(reply.serialize().contains("CSeq: 2"));

        // First packet within a few poll intervals.
        let packet = recv_packet(&receiver, Duration::from_secs(2)).expect("no RTP packet arrived");
        assert_eq!(packet[0], 0x80);
        assert_eq!(packet[1], 26);
        assert_eq!(u16::from_be_bytes([packet[2], packet[3]]), 1);
        assert_eq!(&packet[12..], b"jpegdata");

        let reply = session.handle_request(&request("PAUSE", "3")).unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert!(reply.serialize().contains("CSeq: 3"));

        // The loop is joined before PAUSE replies: drain anything sent
        // beforehand, then the channel must stay silent.
        while recv_packet(&receiver, Duration::from_millis(100)).is_some() {}
        assert!(recv_packet(&receiver, Duration::from_millis(150)).is_none());
    }

    #[test]
    fn play_after_pause_resumes_with_advancing_sequence() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = receiver.local_addr().unwrap().port();

        let mut session = session();
        let _ = session.handle_request(&setup_request("good", "1", port)).unwrap();
        let _ = session.handle_request(&request("PLAY", "2")).unwrap();
        let first = recv_packet(&receiver, Duration::from_secs(2)).unwrap();
        let _ = session.handle_request(&request("PAUSE", "3")).unwrap();
        while recv_packet(&receiver, Duration::from_millis(100)).is_some() {}

        let _ = session.handle_request(&request("PLAY", "4")).unwrap();
        assert_eq!(session.state(), SessionState::Playing);
        let resumed = recv_packet(&receiver, Duration::from_secs(2)).expect("no packet after resume");

        let first_seq = u16::from_be_bytes([first[2], first[3]]);
        let resumed_seq = u16::from_be_bytes([resumed[2], resumed[3]]);
        assert!(resumed_seq > first_seq);

        let _ = session.handle_request(&request("TEARDOWN", "5")).unwrap();
    }

    #[test]
    fn teardown_from_playing_closes_everything() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = receiver.local_addr().unwrap().port();

        let mut session = session();
        let _ = session.handle_request(&setup_request("good", "1", port)).unwrap();
        let _ = session.handle_request(&request("PLAY", "2")).unwrap();

        let reply = session.handle_request(&request("TEARDOWN", "3")).unwrap();
        assert!(session.is_closed());
        assert!(reply.serialize().starts_with("RTSP/1.0 200 OK\nCSeq: 3"));

        // Terminal: everything after TEARDOWN is ignored.
        assert!(session.handle_request(&request("PLAY", "4")).is_none());
        assert!(session.handle_request(&request("TEARDOWN", "5")).is_none());

        while recv_packet(&receiver, Duration::from_millis(100)).is_some() {}
        assert!(recv_packet(&receiver, Duration::from_millis(150)).is_none());
    }

    #[test]
    fn teardown_from_init_replies_ok() {
        let mut session = session();
        let reply = session.handle_request(&request("TEARDOWN", "1")).unwrap();
        assert_eq!(reply.serialize(), "RTSP/1.0 200 OK\nCSeq: 1\nSession: 0");
        assert!(session.is_closed());
    }

    #[test]
    fn session_ids_vary_across_sessions() {
        let ids: Vec<u32> = (0..8)
            .map(|i| {
                let mut session = session();
                session
                    .handle_request(&setup_request("good", &i.to_string(), 25000))
                    .unwrap();
                session.id().unwrap()
            })
            .collect();
        // Random 6-digit IDs; eight draws colliding into one value is
        // astronomically unlikely.
        assert!(ids.iter().any(|id| *id != ids[0]));
    }
}
