use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "av1norm")]
#[command(author, version, about = "Batch convert media libraries to AV1 (NVENC) + Opus in place")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a directory tree and transcode every eligible file
    Run {
        /// Root folder to scan recursively
        #[arg(short, long)]
        input: PathBuf,

        /// Whitelist of file extensions (e.g. mkv mp4); defaults to common
        /// video containers
        #[arg(long, num_args = 0..)]
        ext: Vec<String>,

        /// Target average video bitrate (e.g. 3000k)
        #[arg(long, default_value = "3000k")]
        bitrate: String,

        /// Constant quality mode (overrides --bitrate when set; lower =
        /// higher quality)
        #[arg(long)]
        cq: Option<u32>,

        /// Opus bitrate per audio stream
        #[arg(long, default_value = "128k")]
        audio_bitrate: String,

        /// Only print planned actions
        #[arg(long)]
        dry_run: bool,

        /// Do not replace originals; write the output alongside
        #[arg(long)]
        no_replace: bool,

        /// Re-encode even if already AV1 + Opus
        #[arg(long)]
        force: bool,

        /// Directory for temp files (must share the input's filesystem root
        /// to keep renames atomic; falls back to the input folder otherwise)
        #[arg(long)]
        temp_dir: Option<PathBuf>,

        /// Directory containing the ffmpeg and ffprobe executables
        #[arg(long)]
        ffmpeg_dir: Option<PathBuf>,

        /// Extra arguments passed to ffmpeg after the video options
        #[arg(last = true)]
        extra_video_args: Vec<String>,
    },

    /// Probe a media file and display its normalized description
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Directory containing the ffmpeg and ffprobe executables
        #[arg(long)]
        ffmpeg_dir: Option<PathBuf>,
    },

    /// Check that the external tools are available
    CheckTools {
        /// Directory containing the ffmpeg and ffprobe executables
        #[arg(long)]
        ffmpeg_dir: Option<PathBuf>,
    },
}
