//! File-backed MJPEG frame source.
//!
//! Reads the simple MJPEG container used by `movie.mjpeg`-style files:
//! each frame is a 5-byte ASCII decimal length prefix followed by that
//! many JPEG bytes, concatenated back to back. No index, no timestamps —
//! frames are consumed strictly in file order.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::media::{FrameSource, MediaProvider};

/// Width of the ASCII frame-length prefix in bytes.
const FRAME_LEN_PREFIX: usize = 5;

/// Sequentially reads frames out of one length-prefixed MJPEG file.
pub struct MjpegFileSource {
    reader: BufReader<File>,
    frame_index: u64,
}

impl MjpegFileSource {
    /// Open the file at `path` for sequential frame reading.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        tracing::debug!(path = %path.display(), "media file opened");
        Ok(Self {
            reader: BufReader::new(file),
            frame_index: 0,
        })
    }
}

impl FrameSource for MjpegFileSource {
    fn next_frame(&mut self) -> Option<Vec<u8>> {
        let mut prefix = [0u8; FRAME_LEN_PREFIX];
        if let Err(e) = self.reader.read_exact(&mut prefix) {
            if e.kind() != ErrorKind::UnexpectedEof {
                tracing::warn!(error = %e, "media read failed, treating as end of stream");
            }
            return None;
        }

        // Corrupt prefixes (non-ASCII, non-numeric) end the stream rather
        // than guessing at a resync point.
        let len = match std::str::from_utf8(&prefix)
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
        {
            Some(len) => len,
            None => {
                tracing::warn!(
                    frame = self.frame_index + 1,
                    "corrupt frame length prefix, treating as end of stream"
                );
                return None;
            }
        };

        let mut frame = vec![0u8; len];
        if let Err(e) = self.reader.read_exact(&mut frame) {
            tracing::warn!(error = %e, frame = self.frame_index + 1, "truncated frame, treating as end of stream");
            return None;
        }

        self.frame_index += 1;
        Some(frame)
    }

    fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

/// [`MediaProvider`] serving MJPEG files from a root directory.
///
/// Resource identifiers from SETUP are joined onto the root, so
/// `movie.mjpeg` resolves to `<root>/movie.mjpeg`.
pub struct MjpegLibrary {
    root: PathBuf,
}

impl MjpegLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl MediaProvider for MjpegLibrary {
    fn open(&self, resource: &str) -> Result<Box<dyn FrameSource>> {
        let path = self.root.join(resource);
        match MjpegFileSource::open(&path) {
            Ok(source) => Ok(Box::new(source)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(Error::StreamNotFound(resource.to_string()))
            }
            Err(e) => Err(Error::Io(e)),
        }
    }
}
