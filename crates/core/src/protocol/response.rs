/// Reply status recognized by the control protocol.
///
/// Only three kinds exist. 200 is the success path; 404 and 500 are
/// error diagnostics whose transmission is governed by
/// [`ErrorReplyPolicy`](crate::server::ErrorReplyPolicy).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// 200 OK — the request was applied.
    Ok,
    /// 404 NOT FOUND — SETUP named an unresolvable resource.
    NotFound,
    /// 500 CONNECTION ERROR — a server-side failure (e.g. data socket bind).
    InternalError,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::NotFound => 404,
            Self::InternalError => 500,
        }
    }

    fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::NotFound => "NOT FOUND",
            Self::InternalError => "CONNECTION ERROR",
        }
    }
}

/// A control reply.
///
/// Serializes to newline-joined text with no trailing terminator:
///
/// ```text
/// RTSP/1.0 200 OK
/// CSeq: 1
/// Session: 123456
/// ```
///
/// The CSeq is echoed byte-for-byte from the triggering request. The
/// `Session` line is present only on the 200 path; error replies carry
/// just the status line and CSeq.
#[must_use]
#[derive(Debug)]
pub struct Reply {
    status: Status,
    cseq: String,
    session_id: Option<u32>,
}

impl Reply {
    /// 200 OK with the session identifier.
    pub fn ok(cseq: &str, session_id: u32) -> Self {
        Reply {
            status: Status::Ok,
            cseq: cseq.to_string(),
            session_id: Some(session_id),
        }
    }

    /// 404 NOT FOUND — the SETUP resource could not be opened.
    pub fn not_found(cseq: &str) -> Self {
        Reply {
            status: Status::NotFound,
            cseq: cseq.to_string(),
            session_id: None,
        }
    }

    /// 500 CONNECTION ERROR — a server-side failure.
    pub fn internal_error(cseq: &str) -> Self {
        Reply {
            status: Status::InternalError,
            cseq: cseq.to_string(),
            session_id: None,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn status_code(&self) -> u16 {
        self.status.code()
    }

    /// Serialize to the wire format shown in the type docs.
    pub fn serialize(&self) -> String {
        let mut reply = format!(
            "RTSP/1.0 {} {}\nCSeq: {}",
            self.status.code(),
            self.status.reason(),
            self.cseq
        );
        if let Some(id) = self.session_id {
            reply.push_str(&format!("\nSession: {}", id));
        }
        reply
    }
}
