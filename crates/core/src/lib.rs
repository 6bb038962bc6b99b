pub mod error;
pub mod media;
pub mod protocol;
pub mod server;
pub mod session;
pub mod transport;

pub use error::{Error, Result};
pub use media::mjpeg::MjpegLibrary;
pub use media::{FrameSource, MediaProvider};
pub use server::{ErrorReplyPolicy, Server, ServerConfig};
