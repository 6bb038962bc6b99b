use crate::error::{Error, ParseErrorKind};

/// A parsed control request.
///
/// The control protocol is a stripped-down RTSP dialect:
///
/// ```text
/// <METHOD> <resource> RTSP/1.0
/// CSeq: <n>
/// [transport line, SETUP only]
/// ```
///
/// Line 1 names the method and media resource. Line 2 carries the
/// client-assigned sequence number, echoed byte-for-byte in every reply.
/// SETUP requests additionally carry a transport line whose fourth
/// whitespace-separated token is the client's UDP data port, e.g.
///
/// ```text
/// Transport: RTP/UDP; client_port= 25000
/// ```
///
/// Methods are case-sensitive exact matches; anything other than SETUP,
/// PLAY, PAUSE, or TEARDOWN is ignored by the session state machine.
#[derive(Debug)]
pub struct Request {
    /// Control method (SETUP, PLAY, PAUSE, TEARDOWN).
    pub method: String,
    /// Media resource identifier (e.g. `movie.mjpeg`).
    pub resource: String,
    /// Protocol version (expected: `RTSP/1.0`).
    pub version: String,
    /// Client sequence number, kept as received for byte-exact echoing.
    pub cseq: String,
    /// Client UDP data port from the transport line. Present iff SETUP.
    pub client_port: Option<u16>,
}

impl Request {
    /// Parse a control request from its text representation.
    ///
    /// Returns [`Error::Parse`] on malformed input — a missing CSeq line,
    /// a request line that is not three tokens, or a SETUP without a
    /// parseable port.
    pub fn parse(raw: &str) -> crate::error::Result<Self> {
        let mut lines = raw.lines();

        let request_line = lines.next().ok_or(Error::Parse {
            kind: ParseErrorKind::EmptyRequest,
        })?;

        let parts: Vec<&str> = request_line.split_whitespace().collect();

        if parts.len() != 3 {
            return Err(Error::Parse {
                kind: ParseErrorKind::InvalidRequestLine,
            });
        }

        let method = parts[0].to_string();
        let resource = parts[1].to_string();
        let version = parts[2].to_string();

        if version != "RTSP/1.0" {
            tracing::warn!(version, "client sent non-RTSP/1.0 version");
        }

        let cseq_line = lines.next().ok_or(Error::Parse {
            kind: ParseErrorKind::MissingCseq,
        })?;
        let mut cseq_tokens = cseq_line.split_whitespace();
        let cseq = match (cseq_tokens.next(), cseq_tokens.next()) {
            (Some("CSeq:"), Some(seq)) => seq.to_string(),
            _ => {
                return Err(Error::Parse {
                    kind: ParseErrorKind::MissingCseq,
                });
            }
        };

        // Only SETUP carries a transport line. Token 3 is the UDP port.
        let client_port = if method == "SETUP" {
            let transport_line = lines.next().ok_or(Error::Parse {
                kind: ParseErrorKind::InvalidTransport,
            })?;
            let port = transport_line
                .split_whitespace()
                .nth(3)
                .and_then(|token| token.parse::<u16>().ok())
                .ok_or(Error::Parse {
                    kind: ParseErrorKind::InvalidTransport,
                })?;
            Some(port)
        } else {
            None
        };

        Ok(Request {
            method,
            resource,
            version,
            cseq,
            client_port,
        })
    }
}
