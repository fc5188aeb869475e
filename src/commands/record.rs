//! The recorder session command.
//!
//! Wires configuration, microphone capture, the session state machine and
//! the terminal UI into one event loop: key presses drive transitions, time
//! is polled every frame, and capture completions are drained from the
//! channel the capture delivers on.

use crate::config;
use crate::playback::CpalPlayer;
use crate::prompt::{TerminalPrompt, UserPrompt};
use crate::recording::{CpalCapture, Recorder, RecorderCommand, RecorderTui, RecorderView};
use crate::ui::AlertScreen;
use std::sync::mpsc;
use std::time::Instant;

/// Runs the interactive quick-clip recorder.
///
/// # Errors
/// - If the configuration file is malformed
/// - If the microphone cannot be opened (the permission-denial path: a
///   blocking alert is shown and the process exits non-zero, discarding all
///   in-memory state)
/// - If the terminal UI fails
pub async fn handle_record() -> Result<(), anyhow::Error> {
    tracing::info!("=== vclip Recorder Started ===");

    let config_data = match config::VclipConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err}");
            let error_message = format!(
                "Configuration Error:\n\n{err}\n\nPlease check your ~/.config/vclip/vclip.toml file and try again."
            );
            let mut alert = AlertScreen::new()?;
            alert.show(&error_message)?;
            alert.cleanup()?;
            return Err(anyhow::anyhow!("Configuration error: {err}"));
        }
    };

    tracing::info!(
        "Configuration loaded: device={}, sample_rate={}Hz",
        config_data.audio.device,
        config_data.audio.sample_rate
    );

    let (completion_tx, completion_rx) = mpsc::channel();
    let mut prompt = TerminalPrompt::new();

    let capture = match CpalCapture::open(
        config_data.audio.sample_rate,
        &config_data.audio.device,
        completion_tx,
    ) {
        Ok(capture) => capture,
        Err(e) => {
            tracing::error!("Microphone unavailable: {}", e);
            prompt.alert(&format!(
                "Microphone unavailable:\n\n{e}\n\nvclip needs microphone access to record. Press any key to exit."
            ))?;
            return Err(e);
        }
    };

    let mut recorder = Recorder::new(capture);
    let mut player = CpalPlayer::new();

    let mut tui =
        RecorderTui::new().map_err(|e| anyhow::anyhow!("Failed to initialize UI: {e}"))?;

    tracing::debug!("Entering recorder loop. Press 'r' to record, 'q' to quit.");

    loop {
        recorder.poll(Instant::now());

        let command = match tui.handle_input(recorder.is_recording()) {
            Ok(command) => command,
            Err(e) => {
                tracing::error!("Input handling error: {}", e);
                tui.cleanup().ok();
                return Err(anyhow::anyhow!("Input handling error: {e}"));
            }
        };

        match command {
            RecorderCommand::Continue => {}
            RecorderCommand::Start => {
                if let Err(e) = recorder.start(Instant::now()) {
                    // Same policy as a failed open: alert, then hard exit.
                    tracing::error!("Failed to start capture: {}", e);
                    tui.cleanup().ok();
                    prompt.alert(&format!(
                        "Recording failed:\n\n{e}\n\nPress any key to exit."
                    ))?;
                    return Err(e);
                }
            }
            RecorderCommand::Stop => recorder.stop(),
            RecorderCommand::Cancel => recorder.cancel(),
            RecorderCommand::Play => {
                if let Err(e) = recorder.play(&mut player) {
                    // Playback failure is not fatal; the clip stays in memory.
                    tracing::warn!("Playback failed: {}", e);
                }
            }
            RecorderCommand::Quit => break,
        }

        // Drain capture completions. A completion may arrive well after the
        // session already flipped back to idle; when it carries a pending
        // cancel the save prompt needs the normal screen, so the TUI is
        // suspended around it.
        while let Ok(fragment) = completion_rx.try_recv() {
            if recorder.cancel_pending() {
                tui.suspend()
                    .map_err(|e| anyhow::anyhow!("UI suspend failed: {e}"))?;
                let handled = recorder.on_fragment(fragment, &mut prompt);
                tui.resume()
                    .map_err(|e| anyhow::anyhow!("UI resume failed: {e}"))?;
                handled?;
            } else {
                recorder.on_fragment(fragment, &mut prompt)?;
            }
        }

        let view = RecorderView {
            recording: recorder.is_recording(),
            countdown: recorder.countdown_display(),
            has_clip: recorder.has_clip(),
        };
        tui.render(&view)
            .map_err(|e| anyhow::anyhow!("Render failed: {e}"))?;

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    tui.cleanup()
        .map_err(|e| anyhow::anyhow!("Cleanup failed: {e}"))?;

    tracing::info!("=== vclip Recorder Exited Successfully ===");
    Ok(())
}
