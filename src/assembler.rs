//! Sequence assembly: samples the timeline at a fixed frame rate and feeds
//! the rendered frames, in time order, to a `FrameSink`.

use std::thread;

use log::{debug, info};

use crate::config::VideoConfig;
use crate::encoder::FrameSink;
use crate::error::{FingerboardError, Result};
use crate::model::Timeline;
use crate::renderer::{Frame, FrameRenderer};

/// Seconds of video after the last note ends.
pub const TRAILING_SECONDS: f64 = 1.0;

/// Length of the clip produced for a timeline without notes.
pub const EMPTY_CLIP_SECONDS: f64 = 1.0;

/// Frames rendered per worker before the batch is handed to the sink.
const FRAMES_PER_WORKER_BATCH: usize = 8;

/// Summary of an assembled video.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyReport {
    pub frames: usize,
    pub duration: f64,
    pub fps: u32,
}

/// Video length for a timeline: an empty timeline gives a fixed short clip,
/// otherwise the explicit duration or the end of the last note plus trailing time.
pub fn video_duration(timeline: &Timeline, explicit_duration: Option<f64>) -> f64 {
    match timeline.end_time() {
        None => EMPTY_CLIP_SECONDS,
        Some(end) => explicit_duration.unwrap_or(end + TRAILING_SECONDS),
    }
}

/// Number of sample instants `i / fps` that fall in `[0, duration)`.
pub fn frame_count(duration: f64, fps: u32) -> Result<usize> {
    let rate = f64::from(fps);
    let estimate = (duration * rate).ceil();
    if !estimate.is_finite() || estimate < 0.0 || estimate > f64::from(u32::MAX) {
        return Err(FingerboardError::Config(format!(
            "a {duration}s video at {fps} fps has too many frames"
        )));
    }
    // the product may round across an integer; settle on the exact boundary
    let mut count = estimate as u32;
    while count > 0 && frame_time(count - 1, fps) >= duration {
        count -= 1;
    }
    while count < u32::MAX && frame_time(count, fps) < duration {
        count += 1;
    }
    Ok(count as usize)
}

/// Timestamp of frame `index`.
pub fn frame_time(index: u32, fps: u32) -> f64 {
    f64::from(index) / f64::from(fps)
}

/// Render every frame of the video and stream it to `sink`.
pub fn assemble<S: FrameSink + ?Sized>(
    timeline: &Timeline,
    renderer: &FrameRenderer,
    config: &VideoConfig,
    sink: &mut S,
) -> Result<AssemblyReport> {
    config.validate()?;
    if timeline.is_empty() {
        info!("No notes in timeline, producing a {EMPTY_CLIP_SECONDS}s blank clip");
    }
    let duration = video_duration(timeline, config.explicit_duration);
    let frames = frame_count(duration, config.fps)?;
    info!(
        "Assembling {frames} frames ({duration:.2}s @ {} fps) with {} worker(s)",
        config.fps, config.workers
    );

    sink.begin(renderer.width(), renderer.height(), config.fps)?;
    let batch_size = config.workers * FRAMES_PER_WORKER_BATCH;
    let mut times = Vec::with_capacity(batch_size);
    for first in (0..frames).step_by(batch_size) {
        times.clear();
        // frames fits in u32, checked by frame_count
        let last = frames.min(first + batch_size);
        times.extend((first..last).map(|i| frame_time(i as u32, config.fps)));
        for frame in render_batch(timeline, renderer, &times, config.workers)? {
            sink.write_frame(&frame)?;
        }
        debug!("Encoded frames up to {:.2}s", times.last().copied().unwrap_or_default());
    }
    sink.finish()?;

    Ok(AssemblyReport {
        frames,
        duration,
        fps: config.fps,
    })
}

/// Render `times` in order. With several workers each thread takes a
/// contiguous slice; joining the threads in spawn order restores time order.
fn render_batch(
    timeline: &Timeline,
    renderer: &FrameRenderer,
    times: &[f64],
    workers: usize,
) -> Result<Vec<Frame>> {
    if workers <= 1 || times.len() <= 1 {
        return Ok(times.iter().map(|&t| renderer.render(timeline, t)).collect());
    }

    let per_worker = times.len().div_ceil(workers);
    thread::scope(|scope| {
        let handles: Vec<_> = times
            .chunks(per_worker)
            .map(|slice| {
                scope.spawn(move || {
                    slice
                        .iter()
                        .map(|&t| renderer.render(timeline, t))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut frames = Vec::with_capacity(times.len());
        for handle in handles {
            let rendered = handle.join().map_err(|_| {
                FingerboardError::encoding("frame rendering thread panicked", None)
            })?;
            frames.extend(rendered);
        }
        Ok(frames)
    })
}
