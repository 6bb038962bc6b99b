use clap::Parser;
use rtsp_mjpeg::{MjpegLibrary, Server};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "rtsp-mjpeg-server",
    about = "Minimal RTSP server streaming MJPEG files over RTP/UDP"
)]
struct Args {
    /// Bind address (host:port)
    #[arg(long, short, default_value = "0.0.0.0:8554")]
    bind: String,

    /// Directory containing .mjpeg media files
    #[arg(long, short, default_value = ".")]
    media_dir: PathBuf,
}

fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let provider = Arc::new(MjpegLibrary::new(args.media_dir));
    let mut server = Server::new(&args.bind, provider);

    if let Err(e) = server.start() {
        eprintln!("Failed to start server: {}", e);
        return;
    }

    println!("RTSP server on {} — press Enter to stop", args.bind);
    let mut input = String::new();
    io::stdin().read_line(&mut input).unwrap();

    server.stop();
}
