use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use anyhow::{bail, Context, Result};
use tracing::{debug, error, info, warn};

use super::{FrameSource, OpenError};

/// Video metadata obtained by probing with ffprobe.
#[derive(Debug)]
struct ProbeResult {
    width: u32,
    height: u32,
    /// Declared average frame rate, `None` if the container has no usable one.
    fps: Option<f64>,
}

fn probe(path: &Path) -> Result<ProbeResult, OpenError> {
    info!(?path, "probing video metadata with ffprobe");

    let output = Command::new("ffprobe")
        .args([
            "-v", "error",
            "-select_streams", "v:0",
            "-show_entries", "stream=width,height,avg_frame_rate",
            "-of", "csv=p=0",
        ])
        .arg(path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| OpenError::Launch {
            tool: "ffprobe",
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        error!(%stderr, ?path, "ffprobe failed");
        return Err(OpenError::Probe { stderr });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let info = parse_probe_output(&stdout)?;

    info!(
        width = info.width,
        height = info.height,
        fps = ?info.fps,
        "probe completed"
    );
    Ok(info)
}

/// Parse ffprobe csv output of the form "width,height,num/den".
///
/// Empty output means ffprobe matched no video stream at all.
fn parse_probe_output(stdout: &str) -> Result<ProbeResult, OpenError> {
    let line = stdout.trim();
    if line.is_empty() {
        return Err(OpenError::NoVideoStream);
    }

    let malformed = || OpenError::MalformedProbe {
        output: line.to_string(),
    };

    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < 3 {
        return Err(malformed());
    }

    let width: u32 = parts[0].parse().map_err(|_| malformed())?;
    let height: u32 = parts[1].parse().map_err(|_| malformed())?;
    if width == 0 || height == 0 {
        return Err(OpenError::BadDimensions { width, height });
    }

    let fps = if let Some((num, den)) = parts[2].split_once('/') {
        let num: f64 = num.parse().map_err(|_| malformed())?;
        let den: f64 = den.parse().map_err(|_| malformed())?;
        if den > 0.0 { num / den } else { 0.0 }
    } else {
        parts[2].parse().map_err(|_| malformed())?
    };

    let fps = if fps > 0.0 {
        Some(fps)
    } else {
        warn!(fps, "video declares a non-positive average frame rate");
        None
    };

    Ok(ProbeResult { width, height, fps })
}

fn spawn_ffmpeg(path: &Path) -> Result<Child, OpenError> {
    Command::new("ffmpeg")
        .args(["-i"])
        .arg(path)
        .args([
            // First video stream only; audio and other tracks are dropped
            // inside the decoder.
            "-map", "0:v:0",
            "-f", "rawvideo",
            "-pix_fmt", "rgb24",
            "-sws_flags", "bilinear",
            "-v", "error",
            "pipe:1",
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| OpenError::Launch {
            tool: "ffmpeg",
            source,
        })
}

/// Decodes video frames by piping raw RGB24 data from the ffmpeg CLI.
///
/// Frames come out strictly in order. Rewinding is implemented by killing
/// the decoder process and spawning a fresh one at the start of the file,
/// so it costs a full re-decode of everything up to the target.
pub struct VideoDecoder {
    path: PathBuf,
    child: Child,
    width: u32,
    height: u32,
    fps: Option<f64>,
    frame_count: u32,
    frame_bytes: usize,
}

impl VideoDecoder {
    /// Open a video file for decoding.
    pub fn open(path: &Path) -> Result<Self, OpenError> {
        let info = probe(path)?;

        info!(?path, "spawning ffmpeg decoder process");
        let child = spawn_ffmpeg(path)?;

        let frame_bytes = (info.width as usize) * (info.height as usize) * 3;

        info!(
            width = info.width,
            height = info.height,
            fps = ?info.fps,
            frame_bytes,
            "video decoder opened"
        );

        Ok(Self {
            path: path.to_path_buf(),
            child,
            width: info.width,
            height: info.height,
            fps: info.fps,
            frame_count: 0,
            frame_bytes,
        })
    }
}

impl FrameSource for VideoDecoder {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn fps(&self) -> Option<f64> {
        self.fps
    }

    fn read_frame(&mut self, buf: &mut [u8]) -> Result<bool> {
        assert_eq!(
            buf.len(),
            self.frame_bytes,
            "frame buffer size does not match stream geometry"
        );

        let stdout = self
            .child
            .stdout
            .as_mut()
            .context("ffmpeg stdout not available")?;

        let mut read = 0;
        while read < self.frame_bytes {
            match stdout.read(&mut buf[read..]) {
                Ok(0) => {
                    if read == 0 {
                        info!(total_frames = self.frame_count, "video stream ended");
                        return Ok(false);
                    }
                    error!(
                        read_bytes = read,
                        expected_bytes = self.frame_bytes,
                        frame = self.frame_count,
                        "ffmpeg stream ended mid-frame"
                    );
                    bail!(
                        "ffmpeg stream ended mid-frame (read {read}/{} bytes)",
                        self.frame_bytes,
                    );
                }
                Ok(n) => read += n,
                Err(e) => {
                    error!(frame = self.frame_count, %e, "failed to read from ffmpeg pipe");
                    return Err(e).context("failed to read from ffmpeg pipe");
                }
            }
        }

        debug!(frame_number = self.frame_count, "decoded frame");
        self.frame_count += 1;
        Ok(true)
    }

    fn reset(&mut self) -> Result<()> {
        info!(
            decoded_frames = self.frame_count,
            "rewinding decoder to stream start"
        );
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.child = spawn_ffmpeg(&self.path)?;
        self.frame_count = 0;
        Ok(())
    }
}

impl Drop for VideoDecoder {
    fn drop(&mut self) {
        info!(total_frames = self.frame_count, "closing video decoder");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_probe_full_line() {
        let info = parse_probe_output("1920,1080,30000/1001\n").unwrap();
        assert_eq!(info.width, 1920);
        assert_eq!(info.height, 1080);
        let fps = info.fps.unwrap();
        assert!((fps - 29.97).abs() < 0.01, "fps was {fps}");
    }

    #[test]
    fn parse_probe_integer_rate() {
        let info = parse_probe_output("640,480,25").unwrap();
        assert_eq!(info.fps, Some(25.0));
    }

    #[test]
    fn parse_probe_empty_means_no_video_stream() {
        let err = parse_probe_output("\n").unwrap_err();
        assert!(matches!(err, OpenError::NoVideoStream));
    }

    #[test]
    fn parse_probe_zero_rate_yields_none() {
        let info = parse_probe_output("1280,720,0/0").unwrap();
        assert_eq!(info.fps, None);
    }

    #[test]
    fn parse_probe_rejects_zero_dimensions() {
        let err = parse_probe_output("0,720,25/1").unwrap_err();
        assert!(matches!(err, OpenError::BadDimensions { .. }));
    }

    #[test]
    fn parse_probe_rejects_garbage() {
        let err = parse_probe_output("not,a,video").unwrap_err();
        assert!(matches!(err, OpenError::MalformedProbe { .. }));
    }
}
