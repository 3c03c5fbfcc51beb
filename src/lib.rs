//! fingerboard: turns a MusicXML score into a violin fingerboard tutorial video.
//!
//! Supports both uncompressed MusicXML (.musicxml) and compressed MXL (.mxl) files.
//! The pipeline decodes the score into a [`Timeline`], renders one fingerboard
//! frame per video sample and streams the frames into `ffmpeg`.
//!
//! # Example
//! ```no_run
//! use fingerboard::{decode_file, render_timeline_to_video, VideoConfig};
//!
//! let timeline = decode_file("path/to/score.musicxml").unwrap();
//! println!("Notes: {}", timeline.len());
//! let report = render_timeline_to_video(&timeline, "score_visualization.mp4", &VideoConfig::default()).unwrap();
//! println!("Frames: {}", report.frames);
//! ```

pub mod assembler;
pub mod config;
pub mod encoder;
pub mod error;
pub mod model;
pub mod mxl;
pub mod parser;
pub mod positions;
pub mod renderer;

use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use log::info;

pub use assembler::{assemble, AssemblyReport};
pub use config::VideoConfig;
pub use encoder::{FfmpegEncoder, FrameSink};
pub use error::{FingerboardError, Result, Stage};
pub use model::*;
pub use mxl::parse_mxl;
pub use parser::parse_musicxml;
pub use positions::{finger_label, Position, PositionTable};
pub use renderer::{FontAsset, Frame, FrameRenderer};

/// Suffix appended to the input's base name for the output video.
pub const OUTPUT_SUFFIX: &str = "_visualization.mp4";

/// Decode a MusicXML file from a file path.
/// Automatically detects format based on file extension:
/// - `.musicxml` or `.xml` → uncompressed MusicXML
/// - `.mxl` → compressed MXL (ZIP archive)
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<Timeline> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => FingerboardError::DocumentNotFound(path.to_path_buf()),
        _ => FingerboardError::Io(e),
    })?;

    decode_bytes(&data, path.extension().and_then(|e| e.to_str()))
}

/// Decode MusicXML from raw bytes with an optional format hint.
/// If `extension` is None, tries to auto-detect the format.
pub fn decode_bytes(data: &[u8], extension: Option<&str>) -> Result<Timeline> {
    match extension {
        Some("mxl") => parse_mxl(data),
        Some("musicxml") | Some("xml") => {
            let xml = std::str::from_utf8(data)
                .map_err(|e| FingerboardError::MalformedXml(format!("invalid UTF-8: {e}")))?;
            parse_musicxml(xml)
        }
        _ => {
            // Auto-detect: try as XML first, then as MXL
            if let Ok(xml) = std::str::from_utf8(data) {
                if xml.trim_start().starts_with('<') {
                    return parse_musicxml(xml);
                }
            }
            parse_mxl(data)
        }
    }
}

/// Convert a timeline to a JSON string for inspection.
pub fn timeline_to_json(timeline: &Timeline) -> Result<String> {
    serde_json::to_string_pretty(timeline)
        .map_err(|e| FingerboardError::Serialization(e.to_string()))
}

/// Write the timeline as JSON to `path`.
pub fn write_timeline_json<P: AsRef<Path>>(timeline: &Timeline, path: P) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, timeline_to_json(timeline)?).map_err(|source| {
        FingerboardError::OutputWrite {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Output file name for an input score: `song.musicxml` → `song_visualization.mp4`.
pub fn suggested_output_name<P: AsRef<Path>>(input: P) -> String {
    let stem = input
        .as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "score".to_string());
    format!("{stem}{OUTPUT_SUFFIX}")
}

/// Render a decoded timeline to an MP4 file through ffmpeg.
pub fn render_timeline_to_video<P: AsRef<Path>>(
    timeline: &Timeline,
    output: P,
    config: &VideoConfig,
) -> Result<AssemblyReport> {
    config.validate()?;
    let renderer = FrameRenderer::from_config(config)?;
    let mut encoder = FfmpegEncoder::new(&config.ffmpeg, output.as_ref());
    assemble(timeline, &renderer, config, &mut encoder)
}

/// Timings and counts of a full file-to-video run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub notes: usize,
    pub assembly: AssemblyReport,
    pub decode_time: Duration,
    pub render_time: Duration,
}

/// Decode a score file and render it to an MP4 file.
pub fn render_file_to_video<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    config: &VideoConfig,
) -> Result<PipelineReport> {
    config.validate()?;

    let started = Instant::now();
    let timeline = decode_file(input.as_ref())?;
    let decode_time = started.elapsed();
    info!(
        "Decoded {} notes from {} in {:.2}s",
        timeline.len(),
        input.as_ref().display(),
        decode_time.as_secs_f64()
    );

    let started = Instant::now();
    let assembly = render_timeline_to_video(&timeline, output.as_ref(), config)?;
    let render_time = started.elapsed();
    info!(
        "Rendered {} frames to {} in {:.2}s",
        assembly.frames,
        output.as_ref().display(),
        render_time.as_secs_f64()
    );

    Ok(PipelineReport {
        notes: timeline.len(),
        assembly,
        decode_time,
        render_time,
    })
}
