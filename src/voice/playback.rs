//! Audio playback to speakers
//!
//! Each playback runs on its own thread (cpal streams are not `Send`) and can
//! be stopped early through its `PlaybackHandle`.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream};

use crate::{Error, Result};

/// Sample rate for playback (matches OpenAI TTS output)
pub const PLAYBACK_SAMPLE_RATE: u32 = 24000;

/// Poll interval while waiting for playback to finish
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Control for one in-progress playback
#[derive(Debug, Clone, Default)]
pub struct PlaybackHandle {
    stop: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
}

impl PlaybackHandle {
    /// Ask the playback to stop; returns immediately
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Whether the playback has ended (completed or stopped)
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

/// Plays audio on the default output device
pub struct AudioPlayback;

impl AudioPlayback {
    /// Whether the host exposes a default output device
    #[must_use]
    pub fn is_available() -> bool {
        cpal::default_host().default_output_device().is_some()
    }

    /// Start playing mono f32 samples; returns once the stream is running
    ///
    /// # Errors
    ///
    /// Returns error if the output device cannot be opened
    pub fn start(samples: Vec<f32>) -> Result<PlaybackHandle> {
        let handle = PlaybackHandle::default();

        if samples.is_empty() {
            handle.finished.store(true, Ordering::SeqCst);
            return Ok(handle);
        }

        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<()>>();
        let worker = handle.clone();

        std::thread::Builder::new()
            .name("hark-playback".to_string())
            .spawn(move || {
                let sample_count = samples.len();
                match open_stream(samples, &worker) {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        while !worker.is_finished() && !worker.stop_requested() {
                            std::thread::sleep(POLL_INTERVAL);
                        }
                        drop(stream);
                        tracing::debug!(
                            samples = sample_count,
                            stopped = worker.stop_requested(),
                            "playback ended"
                        );
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                }
                worker.finished.store(true, Ordering::SeqCst);
            })?;

        ready_rx
            .recv()
            .map_err(|_| Error::Audio("playback thread exited early".to_string()))??;

        Ok(handle)
    }
}

/// Build and start an output stream that drains `samples`
fn open_stream(samples: Vec<f32>, handle: &PlaybackHandle) -> Result<Stream> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

    let supported_config = device
        .supported_output_configs()
        .map_err(|e| Error::Audio(e.to_string()))?
        .find(|c| {
            c.channels() == 1
                && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
        })
        .or_else(|| {
            // Fallback: try stereo
            device.supported_output_configs().ok()?.find(|c| {
                c.channels() == 2
                    && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
            })
        })
        .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

    let config = supported_config
        .with_sample_rate(SampleRate(PLAYBACK_SAMPLE_RATE))
        .config();
    let channels = usize::from(config.channels);

    let stop = Arc::clone(&handle.stop);
    let finished = Arc::clone(&handle.finished);
    let mut position = 0usize;

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let stopped = stop.load(Ordering::Relaxed);
                for frame in data.chunks_mut(channels) {
                    let sample = if stopped {
                        0.0
                    } else {
                        samples.get(position).copied().unwrap_or(0.0)
                    };
                    frame.fill(sample);
                    position += 1;
                }
                if stopped || position >= samples.len() {
                    finished.store(true, Ordering::Relaxed);
                }
            },
            |err| {
                tracing::error!(error = %err, "audio playback error");
            },
            None,
        )
        .map_err(|e| Error::Audio(e.to_string()))?;

    stream.play().map_err(|e| Error::Audio(e.to_string()))?;
    Ok(stream)
}

/// Decode MP3 bytes to mono f32 samples
///
/// # Errors
///
/// Returns error if the data is not valid MP3
pub fn decode_mp3(mp3_data: &[u8]) -> Result<Vec<f32>> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if frame.channels == 2 {
                    // Stereo: average channels
                    samples.extend(frame.data.chunks(2).map(|chunk| {
                        let left = f32::from(chunk[0]) / 32768.0;
                        let right = f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                        f32::midpoint(left, right)
                    }));
                } else {
                    samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    Ok(samples)
}
