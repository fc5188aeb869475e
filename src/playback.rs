//! Clip playback through the default output device.
//!
//! The recorder hands a fully concatenated clip to the [`Player`] seam; the
//! cpal implementation feeds it into an output stream and blocks until the
//! last sample has been consumed. No queuing, pause or seek.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Playback seam for the recorder state machine.
pub trait Player {
    /// Plays one contiguous block of mono i16 PCM, blocking until done.
    fn play(&mut self, samples: &[i16], sample_rate: u32) -> Result<()>;
}

/// Playback backed by the system's default cpal output device.
pub struct CpalPlayer;

impl CpalPlayer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CpalPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Player for CpalPlayer {
    fn play(&mut self, samples: &[i16], sample_rate: u32) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("No audio output device available"))?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::debug!("Playback device: {}", device_name);

        let channels = device.default_output_config()?.channels();
        let config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let clip: Arc<Vec<i16>> = Arc::new(samples.to_vec());
        let position = Arc::new(Mutex::new(0usize));
        let (done_tx, done_rx) = mpsc::channel::<()>();

        let callback_clip = Arc::clone(&clip);
        let callback_position = Arc::clone(&position);
        let callback_channels = channels as usize;

        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut pos = match callback_position.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };

                for frame in data.chunks_mut(callback_channels) {
                    let value = if *pos < callback_clip.len() {
                        callback_clip[*pos] as f32 / 32768.0
                    } else {
                        0.0
                    };
                    *pos += 1;
                    // The clip is mono; mirror it to every output channel.
                    for sample in frame.iter_mut() {
                        *sample = value;
                    }
                }

                if *pos >= callback_clip.len() {
                    let _ = done_tx.send(());
                }
            },
            |err| {
                tracing::error!("Playback stream error: {}", err);
            },
            None,
        )?;

        stream.play()?;

        let clip_duration =
            Duration::from_secs_f64(samples.len() as f64 / sample_rate as f64);
        // Wait for the callback to drain the clip, with headroom for device
        // buffering. Time out rather than hang on a stalled device.
        let deadline = clip_duration + Duration::from_millis(500);
        if done_rx.recv_timeout(deadline).is_err() {
            tracing::warn!("Playback did not finish within {:?}", deadline);
        }

        tracing::info!("Playback finished ({:.2}s)", clip_duration.as_secs_f64());
        Ok(())
    }
}
