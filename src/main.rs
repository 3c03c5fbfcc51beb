use std::path::{Path, PathBuf};

use clap::Parser;
use fingerboard::{
    decode_file, render_timeline_to_video, suggested_output_name, write_timeline_json,
    FingerboardError, VideoConfig,
};

fn main() {
    let result = main_result();
    std::process::exit(match result {
        Ok(()) => 0,
        Err(err) => {
            log::error!("{} failed: {err}", err.stage());
            1
        }
    });
}

fn main_result() -> Result<(), FingerboardError> {
    // setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("fingerboard=info"))
        .init();

    let args = CliArgs::parse();
    let config = args.video_config()?;
    let output = args.output_path();
    log::info!("Rendering {:?} to {:?}", args.input, output);

    let timeline = decode_file(&args.input)?;
    log::info!(
        "Decoded {} notes ({} divisions, {} BPM)",
        timeline.len(),
        timeline.divisions,
        timeline.tempo_bpm
    );

    if let Some(dump_path) = &args.dump_timeline {
        write_timeline_json(&timeline, dump_path)?;
        log::info!("Timeline written to {dump_path:?}");
    }

    let report = render_timeline_to_video(&timeline, &output, &config)?;
    log::info!(
        "Wrote {} frames ({:.2}s @ {} fps) to {output:?}",
        report.frames,
        report.duration,
        report.fps
    );
    Ok(())
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct CliArgs {
    /// MusicXML (.musicxml, .xml) or compressed MXL (.mxl) score.
    input: PathBuf,
    /// Output video; defaults to `<input>_visualization.mp4` next to the input.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Optional JSON config file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Frames per second.
    #[arg(long)]
    fps: Option<u32>,
    /// Frame width in pixels.
    #[arg(long)]
    width: Option<u32>,
    /// Frame height in pixels.
    #[arg(long)]
    height: Option<u32>,
    /// Video length in seconds instead of the score length.
    #[arg(long)]
    duration: Option<f64>,
    /// TrueType/OpenType font for labels.
    #[arg(long)]
    font: Option<PathBuf>,
    /// Number of frame rendering threads.
    #[arg(long)]
    workers: Option<usize>,
    /// ffmpeg executable.
    #[arg(long)]
    ffmpeg: Option<PathBuf>,
    /// Also write the decoded timeline as JSON.
    #[arg(long)]
    dump_timeline: Option<PathBuf>,
}

impl CliArgs {
    fn video_config(&self) -> Result<VideoConfig, FingerboardError> {
        let mut config = match &self.config {
            Some(path) => VideoConfig::from_json_file(path)?,
            None => VideoConfig::default(),
        };
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(duration) = self.duration {
            config.explicit_duration = Some(duration);
        }
        if let Some(font) = &self.font {
            config.font_path = Some(font.clone());
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(ffmpeg) = &self.ffmpeg {
            config.ffmpeg = ffmpeg.clone();
        }
        config.validate()?;
        Ok(config)
    }

    fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let dir = self.input.parent().unwrap_or(Path::new(""));
            dir.join(suggested_output_name(&self.input))
        })
    }
}
