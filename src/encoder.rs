//! Video encoding: streams rendered frames into an encoder.
//!
//! MP4 output is produced by a system `ffmpeg` process fed raw RGBA frames
//! on stdin. ffmpeg must be installed; when it is missing or fails, the
//! error carries ffmpeg's own diagnostics.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::{self, JoinHandle};

use log::{debug, info};

use crate::error::{FingerboardError, Result};
use crate::renderer::Frame;

/// Consumer of an ordered frame sequence.
pub trait FrameSink {
    /// Called once before the first frame.
    fn begin(&mut self, width: u32, height: u32, fps: u32) -> Result<()>;

    /// Frames arrive in strictly increasing time order.
    fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    /// Called once after the last frame.
    fn finish(&mut self) -> Result<()>;
}

/// A running ffmpeg. Its stderr is drained on a reader thread while frames are written.
struct Running {
    child: Child,
    stdin: ChildStdin,
    stderr: Option<JoinHandle<String>>,
}

/// H.264 MP4 writer backed by an `ffmpeg` child process.
pub struct FfmpegEncoder {
    ffmpeg: PathBuf,
    output: PathBuf,
    process: Option<Running>,
    frames_written: usize,
}

impl FfmpegEncoder {
    pub fn new(ffmpeg: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            output: output.into(),
            process: None,
            frames_written: 0,
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    fn command(&self, width: u32, height: u32, fps: u32) -> Command {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-hide_banner", "-loglevel", "error", "-y"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgba"])
            .arg("-s")
            .arg(format!("{width}x{height}"))
            .arg("-r")
            .arg(fps.to_string())
            .args(["-i", "-", "-an"])
            .args(["-c:v", "libx264", "-pix_fmt", "yuv420p", "-movflags", "+faststart"])
            .arg(&self.output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }

    /// Close stdin, wait for ffmpeg to exit and turn a failure into an error with its stderr.
    fn wait(running: Running, context: &str) -> Result<()> {
        let Running {
            mut child,
            stdin,
            stderr,
        } = running;
        // closing stdin signals end of stream
        drop(stdin);
        let status = child
            .wait()
            .map_err(|e| FingerboardError::encoding("failed to wait for ffmpeg", Some(e)))?;
        let stderr = stderr
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();
        if status.success() {
            return Ok(());
        }
        Err(FingerboardError::encoding(
            format!("{context}: ffmpeg exited with {status}: {}", stderr.trim()),
            None,
        ))
    }
}

impl FrameSink for FfmpegEncoder {
    fn begin(&mut self, width: u32, height: u32, fps: u32) -> Result<()> {
        if self.process.is_some() {
            return Err(FingerboardError::encoding("encoder already started", None));
        }
        let mut child = self.command(width, height, fps).spawn().map_err(|e| {
            FingerboardError::encoding(
                format!("failed to launch '{}'", self.ffmpeg.display()),
                Some(e),
            )
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| FingerboardError::encoding("ffmpeg stdin unavailable", None))?;
        let stderr = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut text = String::new();
                // best effort: the exit status decides success
                let _ = pipe.read_to_string(&mut text);
                text
            })
        });
        info!(
            "Encoding {width}x{height} @ {fps} fps to {}",
            self.output.display()
        );
        self.process = Some(Running {
            child,
            stdin,
            stderr,
        });
        self.frames_written = 0;
        Ok(())
    }

    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let Some(running) = self.process.as_mut() else {
            return Err(FingerboardError::encoding("encoder not started", None));
        };
        let Err(e) = running.stdin.write_all(&frame.pixels) else {
            self.frames_written += 1;
            return Ok(());
        };
        // ffmpeg has usually exited; its stderr explains why
        let context = format!("failed to write frame {}", self.frames_written);
        if let Some(running) = self.process.take() {
            Self::wait(running, &context)?;
        }
        Err(FingerboardError::encoding(context, Some(e)))
    }

    fn finish(&mut self) -> Result<()> {
        let Some(running) = self.process.take() else {
            return Err(FingerboardError::encoding("encoder not started", None));
        };
        Self::wait(running, "encoding did not complete")?;
        debug!("ffmpeg finished after {} frames", self.frames_written);
        Ok(())
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        if let Some(Running {
            mut child,
            stdin,
            stderr,
        }) = self.process.take()
        {
            drop(stdin);
            let _ = child.kill();
            let _ = child.wait();
            if let Some(reader) = stderr {
                let _ = reader.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;

    #[test]
    fn missing_ffmpeg_binary_is_an_encoding_error() {
        let mut encoder = FfmpegEncoder::new("/nonexistent/bin/ffmpeg", "out.mp4");
        let err = encoder.begin(64, 48, 24).unwrap_err();
        assert_eq!(err.stage(), Stage::Encode);
        assert!(std::error::Error::source(&err).is_some(), "cause should be attached");
        assert!(err.to_string().contains("failed to launch"));
    }

    #[test]
    fn frames_before_begin_are_rejected() {
        let mut encoder = FfmpegEncoder::new("ffmpeg", "out.mp4");
        let frame = Frame::blank(2, 2);
        assert!(matches!(
            encoder.write_frame(&frame),
            Err(FingerboardError::VideoEncoding { .. })
        ));
        assert!(encoder.finish().is_err());
    }

    /// Install a shell script standing in for ffmpeg.
    #[cfg(unix)]
    fn fake_ffmpeg(name: &str, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = std::env::temp_dir().join(format!("fingerboard-{name}-{}", std::process::id()));
        std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn verbose_encoder_does_not_stall() {
        // 256 KiB of diagnostics before reading any input
        let ffmpeg = fake_ffmpeg(
            "verbose",
            "head -c 262144 /dev/zero | tr '\\0' x >&2\ncat > /dev/null",
        );
        let mut encoder = FfmpegEncoder::new(&ffmpeg, "out.mp4");
        encoder.begin(64, 48, 24).unwrap();
        let frame = Frame::blank(64, 48);
        for _ in 0..48 {
            encoder.write_frame(&frame).unwrap();
        }
        encoder.finish().unwrap();
        std::fs::remove_file(ffmpeg).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn encoder_failure_reports_stderr() {
        let ffmpeg = fake_ffmpeg("failing", "cat > /dev/null\necho 'Unknown encoder libx264' >&2\nexit 1");
        let mut encoder = FfmpegEncoder::new(&ffmpeg, "out.mp4");
        encoder.begin(8, 8, 24).unwrap();
        encoder.write_frame(&Frame::blank(8, 8)).unwrap();
        let err = encoder.finish().unwrap_err();
        assert_eq!(err.stage(), Stage::Encode);
        assert!(err.to_string().contains("Unknown encoder libx264"), "{err}");
        std::fs::remove_file(ffmpeg).unwrap();
    }

    #[test]
    fn ffmpeg_command_line() {
        let encoder = FfmpegEncoder::new("ffmpeg", "/tmp/song_visualization.mp4");
        let cmd = encoder.command(1280, 720, 30);
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let joined = args.join(" ");
        assert!(joined.contains("-f rawvideo -pix_fmt rgba -s 1280x720 -r 30 -i -"));
        assert!(joined.contains("-c:v libx264"));
        assert_eq!(args.last().map(String::as_str), Some("/tmp/song_visualization.mp4"));
    }
}
