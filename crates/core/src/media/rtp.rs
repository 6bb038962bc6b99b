//! RTP packet encoding (RFC 3550 §5.1).
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |V=2|P|X|  CC   |M|     PT      |       Sequence Number         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           Timestamp                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                             SSRC                              |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Fields beyond the version, payload type, and sequence number are fixed:
//! padding, extension, CSRC count, and the marker bit are 0, and the
//! timestamp and SSRC are zero-filled. The sequence number is the frame
//! index supplied by the caller, truncated to 16 bits.

/// RTP protocol version (RFC 3550 §5.1).
pub const RTP_VERSION: u8 = 2;

/// Static RTP payload type for motion JPEG (RFC 3551 §6).
pub const PAYLOAD_TYPE_MJPEG: u8 = 26;

/// Length of the fixed RTP header in bytes.
pub const RTP_HEADER_LEN: usize = 12;

/// Encode one media frame as a single RTP packet.
///
/// Pure and infallible: a 12-byte fixed header followed by `payload`
/// unmodified. The sequence number is the low 16 bits of `frame_index`
/// in network byte order.
///
/// Frames are never fragmented — one frame is always one packet,
/// regardless of size. Frames larger than the path MTU will therefore
/// rely on IP fragmentation; a known limitation of this packetizer.
pub fn encode(payload: &[u8], frame_index: u64) -> Vec<u8> {
    let sequence = frame_index as u16;

    let mut packet = Vec::with_capacity(RTP_HEADER_LEN + payload.len());
    packet.push(RTP_VERSION << 6);
    packet.push(PAYLOAD_TYPE_MJPEG);
    packet.extend_from_slice(&sequence.to_be_bytes());
    packet.extend_from_slice(&0u32.to_be_bytes()); // timestamp
    packet.extend_from_slice(&0u32.to_be_bytes()); // SSRC
    packet.extend_from_slice(payload);
    packet
}
