mod cli;
mod runner;

use anyhow::Result;
use av1norm_av::{check_tools, probe, EncodeSettings, Toolset};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};

/// Pre-flight exit codes; per-file outcomes never affect the exit status.
const EXIT_INPUT_MISSING: i32 = 2;
const EXIT_NO_FFPROBE: i32 = 3;
const EXIT_NO_ENCODER: i32 = 4;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise derive a default from --verbose.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "av1norm=trace,av1norm_av=trace".to_string()
        } else {
            "av1norm=info,av1norm_av=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Run {
            input,
            ext,
            bitrate,
            cq,
            audio_bitrate,
            dry_run,
            no_replace,
            force,
            temp_dir,
            ffmpeg_dir,
            extra_video_args,
        } => run_batch(
            input,
            ext,
            bitrate,
            cq,
            audio_bitrate,
            dry_run,
            no_replace,
            force,
            temp_dir,
            ffmpeg_dir,
            extra_video_args,
        ),
        Commands::Probe {
            file,
            json,
            ffmpeg_dir,
        } => probe_file(&file, json, ffmpeg_dir.as_deref()),
        Commands::CheckTools { ffmpeg_dir } => report_tools(ffmpeg_dir.as_deref()),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_batch(
    input: PathBuf,
    ext: Vec<String>,
    bitrate: String,
    cq: Option<u32>,
    audio_bitrate: String,
    dry_run: bool,
    no_replace: bool,
    force: bool,
    temp_dir: Option<PathBuf>,
    ffmpeg_dir: Option<PathBuf>,
    extra_video_args: Vec<String>,
) -> Result<()> {
    if !input.exists() {
        eprintln!("Input not found: {}", input.display());
        std::process::exit(EXIT_INPUT_MISSING);
    }

    let tools = Toolset::resolve(ffmpeg_dir.as_deref());

    if !tools.have_ffprobe() {
        eprintln!(
            "ffprobe not found. Provide --ffmpeg-dir, set {}, or add it to PATH.",
            av1norm_av::FFMPEG_DIR_ENV
        );
        std::process::exit(EXIT_NO_FFPROBE);
    }

    if !dry_run && !tools.have_av1_nvenc() {
        eprintln!(
            "av1_nvenc encoder not available. \
             An FFmpeg build with NVIDIA NVENC AV1 support is required."
        );
        std::process::exit(EXIT_NO_ENCODER);
    }

    // Quality mode overrides the bitrate default when both are given.
    let settings = EncodeSettings {
        quality: cq,
        video_bitrate: if cq.is_some() { None } else { Some(bitrate) },
        audio_bitrate,
        extra_video_args,
    };

    let opts = runner::RunOptions {
        root: input,
        extensions: ext,
        settings,
        dry_run,
        no_replace,
        force,
        temp_dir,
    };

    let summary = runner::run(&tools, &opts);

    for report in &summary.reports {
        let status = if report.ok { "OK" } else { "FAIL" };
        println!("{:4} {} - {}", status, report.path.display(), report.message);
    }
    println!(
        "Done: {} OK, {} failed",
        summary.succeeded(),
        summary.failed()
    );

    Ok(())
}

fn probe_file(file: &Path, json: bool, ffmpeg_dir: Option<&Path>) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let tools = Toolset::resolve(ffmpeg_dir);
    let desc = probe::inspect(&tools, file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&desc)?);
        return Ok(());
    }

    println!("File: {}", desc.path.display());
    println!(
        "Video: {}",
        if !desc.has_video {
            "none"
        } else if desc.all_video_av1 {
            "AV1"
        } else {
            "needs transcode"
        }
    );
    if let Some(ref pix) = desc.pix_fmt {
        println!("Pixel format: {}", pix);
    }
    if let Some(ref primaries) = desc.color_primaries {
        println!("Color primaries: {}", primaries);
    }
    if let Some(ref transfer) = desc.color_transfer {
        println!("Color transfer: {}", transfer);
    }
    if let Some(ref space) = desc.color_space {
        println!("Color space: {}", space);
    }

    println!("\nAudio streams: {}", desc.audio_streams.len());
    for (i, stream) in desc.audio_streams.iter().enumerate() {
        print!("  [{}] {} {}ch", i, stream.codec, stream.channels);
        if !stream.layout.is_empty() {
            print!(" ({})", stream.layout);
        }
        println!();
    }

    println!("Subtitle streams: {}", desc.subtitle_streams);
    println!("Attachment streams: {}", desc.attachment_streams);
    println!(
        "\nCompliant (AV1 + Opus): {}",
        if desc.is_compliant() { "yes" } else { "no" }
    );

    Ok(())
}

fn report_tools(ffmpeg_dir: Option<&Path>) -> Result<()> {
    let tools = Toolset::resolve(ffmpeg_dir);

    println!("Checking external tools...\n");

    let mut all_ok = true;
    for tool in check_tools(&tools) {
        let status = if tool.available {
            "ok"
        } else {
            all_ok = false;
            "MISSING"
        };

        print!("{:8} {}", status, tool.name);
        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }
        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }
        println!();
    }

    print!(
        "{:8} av1_nvenc encoder",
        if tools.have_av1_nvenc() {
            "ok"
        } else {
            all_ok = false;
            "MISSING"
        }
    );
    println!();

    println!();
    if all_ok {
        println!("All required tools are available.");
    } else {
        println!("Some tools are missing; batch runs will refuse to start.");
    }

    Ok(())
}
