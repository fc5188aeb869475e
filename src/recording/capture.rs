//! Microphone capture.
//!
//! Wraps a cpal input stream behind the [`Capture`] seam used by the
//! recorder state machine. Samples are accumulated as mono i16 PCM while
//! the stream is live; stopping the stream delivers the accumulated
//! fragment exactly once through a channel, asynchronously with respect to
//! whichever transition triggered the stop.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use crate::recording::session::Fragment;

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Capture seam for the recorder state machine.
///
/// `stop` must be idempotent and must deliver at most one fragment per
/// started session, on whatever channel the implementation was built with.
pub trait Capture {
    /// Starts capturing. Fails if the device cannot be opened.
    fn start(&mut self) -> Result<()>;

    /// Stops capturing and delivers the accumulated fragment. No-op when
    /// not capturing.
    fn stop(&mut self);

    /// Sample rate of delivered fragments, in Hz.
    fn sample_rate(&self) -> u32;
}

/// Microphone capture backed by cpal.
///
/// The device and its configuration are resolved eagerly in [`open`], so a
/// denied or missing microphone surfaces before any session starts and no
/// teardown path can ever observe a half-initialized handle.
///
/// [`open`]: CpalCapture::open
pub struct CpalCapture {
    device: cpal::Device,
    device_config: cpal::SupportedStreamConfig,
    /// Actual capture sample rate from the device
    sample_rate: u32,
    /// Samples accumulated by the stream callback (i16 PCM mono)
    samples: Arc<Mutex<Vec<i16>>>,
    /// Active input stream (kept alive while capturing)
    stream: Option<cpal::Stream>,
    /// Delivers the accumulated fragment once per stop
    completion: Sender<Fragment>,
}

impl CpalCapture {
    /// Opens the requested input device and resolves its configuration.
    ///
    /// # Arguments
    /// * `requested_sample_rate` - Desired rate in Hz; the device rate wins
    /// * `device_name` - "default", a device name, or a numeric index
    /// * `completion` - Channel on which fragments are delivered after stop
    ///
    /// # Errors
    /// - If no input device is available or access to it is refused
    /// - If the device configuration cannot be queried
    pub fn open(
        requested_sample_rate: u32,
        device_name: &str,
        completion: Sender<Fragment>,
    ) -> Result<Self> {
        // Resolve the device while suppressing ALSA library warnings
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();

            if device_name == "default" {
                host.default_input_device()
                    .ok_or_else(|| anyhow!("No audio input device available"))
            } else {
                find_device_by_name(&host, device_name)
            }
        })?;

        let resolved_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Capture device: {}", resolved_name);

        let device_config = device.default_input_config()?;
        let device_sample_rate = device_config.sample_rate().0;

        if device_sample_rate != requested_sample_rate {
            tracing::warn!(
                "Requested sample rate {}Hz but device uses {}Hz. Capturing at device rate.",
                requested_sample_rate,
                device_sample_rate
            );
        }

        tracing::debug!(
            "Device configuration: {}Hz, {} channels",
            device_sample_rate,
            device_config.channels()
        );

        Ok(Self {
            device,
            device_config,
            sample_rate: device_sample_rate,
            samples: Arc::new(Mutex::new(Vec::new())),
            stream: None,
            completion,
        })
    }

    /// Folds incoming multi-channel data down to mono and appends it to the
    /// sample buffer.
    fn handle_audio_callback(data: &[i16], samples_arc: &Arc<Mutex<Vec<i16>>>, num_channels: usize) {
        let mut samples = match samples_arc.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        match num_channels {
            1 => {
                samples.extend_from_slice(data);
            }
            2 => {
                for chunk in data.chunks_exact(2) {
                    let left = chunk[0] as i32;
                    let right = chunk[1] as i32;
                    samples.push(((left + right) / 2) as i16);
                }
            }
            _ => {
                for chunk in data.chunks_exact(num_channels) {
                    let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                    samples.push((sum / num_channels as i32) as i16);
                }
            }
        }
    }
}

impl Capture for CpalCapture {
    fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        {
            let mut samples = match self.samples.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            samples.clear();
        }

        let samples_arc = Arc::clone(&self.samples);
        let callback_channels = self.device_config.channels() as usize;

        let stream = self.device.build_input_stream(
            &self.device_config.clone().into(),
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                Self::handle_audio_callback(data, &samples_arc, callback_channels);
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )?;

        stream.play()?;
        self.stream = Some(stream);

        tracing::debug!("Audio stream started");
        Ok(())
    }

    fn stop(&mut self) {
        let Some(stream) = self.stream.take() else {
            return;
        };
        drop(stream);

        let fragment = {
            let mut samples = match self.samples.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            std::mem::take(&mut *samples)
        };

        let duration_secs = fragment.len() as f32 / self.sample_rate as f32;
        tracing::info!(
            "Capture stopped: {:.2}s ({} samples at {}Hz)",
            duration_secs,
            fragment.len(),
            self.sample_rate
        );

        // The session loop drains this channel; if it is already gone the
        // fragment has nowhere to go anyway.
        if self.completion.send(fragment).is_err() {
            tracing::debug!("Completion receiver dropped; fragment discarded");
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Finds an audio input device by name or numeric index.
///
/// # Errors
/// - If no device with the specified name/index is found
fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    // Try to parse as a numeric index first
    if let Ok(index) = device_spec.parse::<usize>() {
        let devices: Vec<_> = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?
            .collect();

        if index < devices.len() {
            return Ok(devices.into_iter().nth(index).unwrap());
        } else {
            return Err(anyhow!(
                "Device index {} is out of range (0-{})",
                index,
                devices.len().saturating_sub(1)
            ));
        }
    }

    let devices = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?;

    for device in devices {
        if let Ok(name) = device.name() {
            if name == device_spec {
                return Ok(device);
            }
        }
    }

    Err(anyhow!(
        "Audio input device '{device_spec}' not found. Use 'vclip list-devices' to see available devices."
    ))
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
/// On non-Linux platforms, this is a no-op since ALSA doesn't exist.
#[cfg(target_os = "linux")]
fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let dev_null_fd = dev_null.as_raw_fd();

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    let redirect_result = unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) };
    if redirect_result == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// On non-Linux platforms, no stderr suppression is needed since ALSA doesn't exist.
#[cfg(not(target_os = "linux"))]
fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}
