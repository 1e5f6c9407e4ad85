use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use video_protect::client::ClientDriver;

/// Upload a video, process it and download the result.
#[derive(Debug, Parser)]
#[command(name = "video-client", version)]
struct Args {
    /// Video to upload (.mp4, .mov or .avi)
    input: PathBuf,

    /// Target preset: 720p, 480p or 360p. Anything else keeps the source size.
    #[arg(short, long, default_value = "480p")]
    resolution: String,

    /// Where to save the processed video. Defaults to the artifact name.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Base URL of the video service
    #[arg(long, env = "API_BASE_URL", default_value = "http://localhost:8000")]
    api: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();

    let mut driver = ClientDriver::new(&args.api)?.on_change(|state| println!("{}", state));
    let saved = driver.run(&args.input, &args.resolution, args.output).await?;

    println!("Saved {}", saved.display());
    Ok(())
}
