use anyhow::{Context, Result};
use bytes::Bytes;
use std::io::{Cursor, ErrorKind};
use std::time::Duration;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Properties of an encoded clip, read from its container
#[derive(Debug, Clone, PartialEq)]
pub struct ClipInfo {
    pub duration: Duration,
    pub sample_rate: u32,
    pub channels: u16,
}

impl ClipInfo {
    /// Probe encoded audio and compute its duration
    ///
    /// Uses the frame count from the container header when present (WAV, MP3
    /// with a Xing/Info tag), otherwise sums packet durations.
    pub fn probe(bytes: Bytes, mime: Option<&str>) -> Result<Self> {
        let size = bytes.len();
        let mss = MediaSourceStream::new(
            Box::new(Cursor::new(bytes)),
            MediaSourceStreamOptions::default(),
        );

        let mut hint = Hint::new();
        if let Some(mime) = mime {
            hint.mime_type(mime);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .context("Unrecognized audio format")?;

        let mut format = probed.format;
        let track = format
            .default_track()
            .context("No audio track found")?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        let sample_rate = params.sample_rate.unwrap_or(0);
        let channels = params.channels.map_or(0, |c| c.count() as u16);

        let n_frames = match params.n_frames {
            Some(n) => n,
            None => {
                let mut total = 0u64;
                loop {
                    match format.next_packet() {
                        Ok(packet) if packet.track_id() == track_id => total += packet.dur,
                        Ok(_) => continue,
                        Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => {
                            break
                        }
                        Err(e) => return Err(e).context("Failed to read audio packets"),
                    }
                }
                total
            }
        };

        let seconds = if let Some(time_base) = params.time_base {
            n_frames as f64 * f64::from(time_base.numer) / f64::from(time_base.denom)
        } else if sample_rate > 0 {
            n_frames as f64 / f64::from(sample_rate)
        } else {
            anyhow::bail!("Cannot determine clip duration: no time base or sample rate")
        };

        debug!(
            "Probed clip: {} bytes, {:.2}s, {}Hz, {} channels",
            size, seconds, sample_rate, channels
        );

        Ok(Self {
            duration: Duration::from_secs_f64(seconds),
            sample_rate,
            channels,
        })
    }
}
