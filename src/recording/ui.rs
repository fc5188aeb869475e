//! Terminal user interface for the quick-clip recorder.
//!
//! Renders the countdown while recording and the start/play hints while
//! idle, and translates key presses into recorder commands.

use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    style::{Color, Style},
    widgets::Paragraph,
};
use std::error::Error;
use std::io::{stdout, Stdout};

/// User input command on the recorder screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderCommand {
    /// No actionable key pressed
    Continue,
    /// Start a new recording ('r' or Space, idle only)
    Start,
    /// Stop and keep the clip (Enter or 's', recording only)
    Stop,
    /// Cancel the recording (Escape, 'q' or Ctrl+C, recording only)
    Cancel,
    /// Play the current clip ('p', idle only)
    Play,
    /// Leave the application (Escape or 'q', idle only)
    Quit,
}

/// View state handed to the renderer each frame.
#[derive(Debug, Clone)]
pub struct RecorderView {
    /// Whether a session is currently recording
    pub recording: bool,
    /// Countdown string with two decimals, e.g. "3.97"
    pub countdown: String,
    /// Whether a clip is available for playback
    pub has_clip: bool,
}

/// Recorder screen.
pub struct RecorderTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl RecorderTui {
    /// Creates the TUI and enters alternate screen mode.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode cannot be enabled
    /// - If alternate screen cannot be entered
    pub fn new() -> Result<Self, Box<dyn Error>> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(RecorderTui { terminal })
    }

    /// Renders one frame of the recorder screen.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn render(&mut self, view: &RecorderView) -> Result<(), Box<dyn Error>> {
        self.terminal.draw(|frame| {
            let area = frame.area();

            let footer_height = 1;
            let content_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(footer_height),
            };

            let title = Paragraph::new("vclip")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Rgb(185, 207, 212)));
            let title_area = Rect {
                x: content_area.x,
                y: content_area.y + content_area.height / 4,
                width: content_area.width,
                height: 1,
            };
            frame.render_widget(title, title_area);

            let center_area = Rect {
                x: content_area.x,
                y: content_area.y + content_area.height / 2,
                width: content_area.width,
                height: 1,
            };

            if view.recording {
                let countdown = Paragraph::new(ratatui::text::Line::from(vec![
                    ratatui::text::Span::styled("● ", Style::default().fg(Color::Red)),
                    ratatui::text::Span::styled(
                        view.countdown.clone(),
                        Style::default()
                            .fg(Color::Rgb(255, 255, 255))
                            .add_modifier(Modifier::BOLD),
                    ),
                ]))
                .alignment(Alignment::Center);
                frame.render_widget(countdown, center_area);
            } else {
                let status = if view.has_clip {
                    "clip ready"
                } else {
                    "no clip"
                };
                let idle = Paragraph::new(status)
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(Color::Rgb(206, 224, 220)));
                frame.render_widget(idle, center_area);
            }

            let footer_area = Rect {
                x: area.x,
                y: area.y + area.height.saturating_sub(footer_height),
                width: area.width,
                height: footer_height,
            };

            let help = if view.recording {
                "Enter save / Esc cancel".to_string()
            } else if view.has_clip {
                "r record / p play / q quit".to_string()
            } else {
                "r record / q quit".to_string()
            };

            let footer = Paragraph::new(help).style(
                Style::default()
                    .fg(Color::Rgb(185, 207, 212))
                    .bg(Color::Rgb(0, 0, 0)),
            );
            frame.render_widget(footer, footer_area);
        })?;

        Ok(())
    }

    /// Processes user input and returns the appropriate recorder command.
    ///
    /// Key bindings depend on whether a recording is in flight; unrecognized
    /// keys are ignored.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self, recording: bool) -> Result<RecorderCommand, Box<dyn Error>> {
        if event::poll(std::time::Duration::from_millis(10))? {
            if let Event::Key(key) = event::read()? {
                if recording {
                    return Ok(match key.code {
                        KeyCode::Enter | KeyCode::Char('s') => {
                            tracing::debug!("Stop key pressed");
                            RecorderCommand::Stop
                        }
                        KeyCode::Char('q') | KeyCode::Esc => {
                            tracing::debug!("Cancel key pressed");
                            RecorderCommand::Cancel
                        }
                        KeyCode::Char('c')
                            if key
                                .modifiers
                                .contains(crossterm::event::KeyModifiers::CONTROL) =>
                        {
                            tracing::debug!("Ctrl+C pressed: cancelling recording");
                            RecorderCommand::Cancel
                        }
                        _ => RecorderCommand::Continue,
                    });
                }

                return Ok(match key.code {
                    KeyCode::Char('r') | KeyCode::Char(' ') => {
                        tracing::debug!("Record key pressed");
                        RecorderCommand::Start
                    }
                    KeyCode::Char('p') => {
                        tracing::debug!("Play key pressed");
                        RecorderCommand::Play
                    }
                    KeyCode::Char('q') | KeyCode::Esc => RecorderCommand::Quit,
                    KeyCode::Char('c')
                        if key
                            .modifiers
                            .contains(crossterm::event::KeyModifiers::CONTROL) =>
                    {
                        RecorderCommand::Quit
                    }
                    _ => RecorderCommand::Continue,
                });
            }
        }
        Ok(RecorderCommand::Continue)
    }

    /// Leaves the TUI so a line-based prompt can run on the normal screen.
    ///
    /// # Errors
    /// - If terminal mode cannot be restored
    pub fn suspend(&mut self) -> Result<(), Box<dyn Error>> {
        self.cleanup()
    }

    /// Re-enters the TUI after a prompt.
    ///
    /// # Errors
    /// - If raw mode cannot be re-enabled
    /// - If alternate screen cannot be re-entered
    pub fn resume(&mut self) -> Result<(), Box<dyn Error>> {
        enable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            crossterm::terminal::EnterAlternateScreen
        )?;
        self.terminal.clear()?;
        Ok(())
    }

    /// Cleans up terminal state and exits alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    /// - If cursor cannot be shown
    pub fn cleanup(&mut self) -> Result<(), Box<dyn Error>> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            crossterm::terminal::LeaveAlternateScreen
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}
