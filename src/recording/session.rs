//! Recording session state machine.
//!
//! The [`Recorder`] owns the clip buffer, the cancel flag and both session
//! timers (the 25ms countdown tick and the one-shot auto-stop deadline).
//! It is driven by the UI loop: key handlers call `start`/`stop`/`cancel`,
//! `poll` advances time, and `on_fragment` handles the capture completion
//! that arrives asynchronously after any stop.

use crate::playback::Player;
use crate::prompt::UserPrompt;
use crate::recording::capture::Capture;
use anyhow::Result;
use std::time::{Duration, Instant};

/// One chunk of mono i16 PCM delivered by the capture on stop.
pub type Fragment = Vec<i16>;

/// Hard ceiling on clip length. Recording is forcibly ended at this point.
pub const CLIP_LIMIT: Duration = Duration::from_millis(5000);

/// Countdown tick interval.
pub const TICK: Duration = Duration::from_millis(25);

/// Number of ticks in a full countdown (5000ms / 25ms).
const FULL_TICKS: u32 = (CLIP_LIMIT.as_millis() / TICK.as_millis()) as u32;

/// Recorder session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Recording,
}

/// Quick-clip recorder.
///
/// At most one session is active at a time. Both timers live and die with
/// the session: any exit from `Recording` (manual stop, cancel or the
/// auto-stop deadline) clears the tick schedule and the deadline before the
/// state flips, so no timer can fire against a later session.
pub struct Recorder<C: Capture> {
    capture: C,
    status: Status,
    fragments: Vec<Fragment>,
    /// True when the in-flight stop was a user cancel rather than a natural
    /// stop. Consulted exactly once by `on_fragment`, then reset.
    cancelled: bool,
    /// Remaining countdown, in whole ticks. Integer so the two-decimal
    /// display never suffers float drift.
    ticks_left: u32,
    /// When the next countdown tick is due. `None` while idle.
    next_tick: Option<Instant>,
    /// One-shot auto-stop deadline. `None` while idle.
    auto_stop: Option<Instant>,
}

impl<C: Capture> Recorder<C> {
    pub fn new(capture: C) -> Self {
        Self {
            capture,
            status: Status::Idle,
            fragments: Vec::new(),
            cancelled: false,
            ticks_left: FULL_TICKS,
            next_tick: None,
            auto_stop: None,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_recording(&self) -> bool {
        self.status == Status::Recording
    }

    /// Whether a clip is available for playback.
    pub fn has_clip(&self) -> bool {
        !self.fragments.is_empty()
    }

    /// Whether a cancel is waiting for its capture completion to arrive.
    pub fn cancel_pending(&self) -> bool {
        self.cancelled
    }

    /// Remaining countdown in milliseconds.
    pub fn countdown_ms(&self) -> u64 {
        self.ticks_left as u64 * TICK.as_millis() as u64
    }

    /// Countdown rendered with two decimals, e.g. "5.00" or "3.97".
    pub fn countdown_display(&self) -> String {
        let ms = self.countdown_ms();
        format!("{}.{:02}", ms / 1000, (ms % 1000) / 10)
    }

    /// Starts a new session.
    ///
    /// Clears any leftover clip, starts the capture, resets the countdown to
    /// 5.00 and arms both timers. A no-op when already recording.
    ///
    /// # Errors
    /// - If the capture fails to start (treated as a permission failure by
    ///   the caller; the session never begins and no timers are armed)
    pub fn start(&mut self, now: Instant) -> Result<()> {
        if self.status == Status::Recording {
            return Ok(());
        }

        self.fragments.clear();
        self.capture.start()?;

        self.status = Status::Recording;
        self.ticks_left = FULL_TICKS;
        self.next_tick = Some(now + TICK);
        self.auto_stop = Some(now + CLIP_LIMIT);

        tracing::info!("Recording started ({}s limit)", CLIP_LIMIT.as_secs());
        Ok(())
    }

    /// Stops the session on the natural path (manual stop, keep the clip).
    pub fn stop(&mut self) {
        if self.status != Status::Recording {
            return;
        }
        tracing::info!("Recording stopped by user");
        self.reset();
    }

    /// Cancels the session: flags the in-flight stop as a cancel so the
    /// completion handler asks whether to keep the clip, then tears the
    /// session down like any other stop.
    pub fn cancel(&mut self) {
        if self.status != Status::Recording {
            return;
        }
        tracing::info!("Recording cancelled by user");
        self.cancelled = true;
        self.reset();
    }

    /// Advances session time: applies every elapsed countdown tick and fires
    /// the auto-stop transition once its deadline has passed.
    pub fn poll(&mut self, now: Instant) {
        while self.status == Status::Recording {
            let Some(due) = self.next_tick else { break };
            if now < due {
                break;
            }
            self.ticks_left = self.ticks_left.saturating_sub(1);
            self.next_tick = Some(due + TICK);
        }

        if let Some(deadline) = self.auto_stop {
            if self.status == Status::Recording && now >= deadline {
                tracing::info!("Auto-stop: {}s limit reached", CLIP_LIMIT.as_secs());
                self.reset();
            }
        }
    }

    /// Handles the capture completion, which arrives asynchronously and
    /// possibly after the state has already flipped back to `Idle`.
    ///
    /// Appends the fragment to the clip. If the stop was a cancel, consults
    /// the cancel flag exactly once and asks the user whether to keep the
    /// recording; on decline the whole clip is discarded.
    ///
    /// # Errors
    /// - If the confirmation prompt fails
    pub fn on_fragment(&mut self, fragment: Fragment, prompt: &mut dyn UserPrompt) -> Result<()> {
        tracing::debug!("Capture delivered {} samples", fragment.len());
        self.fragments.push(fragment);

        if self.cancelled {
            self.cancelled = false;
            if !prompt.confirm("Save recording?")? {
                tracing::info!("Clip discarded after cancel");
                self.fragments.clear();
            }
        }

        Ok(())
    }

    /// Plays the clip: concatenates all fragments into one contiguous block
    /// and hands it to the player. A no-op when the clip is empty.
    ///
    /// # Errors
    /// - If playback fails
    pub fn play(&mut self, player: &mut dyn Player) -> Result<()> {
        if self.fragments.is_empty() {
            return Ok(());
        }

        let clip: Vec<i16> = self.fragments.iter().flatten().copied().collect();
        tracing::info!("Playing clip: {} samples", clip.len());
        player.play(&clip, self.capture.sample_rate())
    }

    /// Tears the session down: stops capture, clears both timers, resets the
    /// countdown to 5.00 and flips to `Idle`. Safe to reach repeatedly;
    /// clearing an already-cleared timer is a no-op.
    fn reset(&mut self) {
        self.capture.stop();
        self.next_tick = None;
        self.auto_stop = None;
        self.ticks_left = FULL_TICKS;
        self.status = Status::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct FakeCapture {
        running: bool,
        starts: u32,
        stops: u32,
        fail_start: bool,
    }

    impl FakeCapture {
        fn new() -> Self {
            Self {
                running: false,
                starts: 0,
                stops: 0,
                fail_start: false,
            }
        }
    }

    impl Capture for FakeCapture {
        fn start(&mut self) -> Result<()> {
            if self.fail_start {
                return Err(anyhow::anyhow!("microphone access denied"));
            }
            self.running = true;
            self.starts += 1;
            Ok(())
        }

        fn stop(&mut self) {
            if self.running {
                self.running = false;
                self.stops += 1;
            }
        }

        fn sample_rate(&self) -> u32 {
            16000
        }
    }

    struct ScriptedPrompt {
        answers: VecDeque<bool>,
        asked: Vec<String>,
    }

    impl ScriptedPrompt {
        fn answering(answers: &[bool]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                asked: Vec::new(),
            }
        }
    }

    impl UserPrompt for ScriptedPrompt {
        fn confirm(&mut self, question: &str) -> Result<bool> {
            self.asked.push(question.to_string());
            Ok(self.answers.pop_front().unwrap_or(true))
        }

        fn alert(&mut self, _message: &str) -> Result<()> {
            Ok(())
        }
    }

    struct FakePlayer {
        played: Vec<(Vec<i16>, u32)>,
    }

    impl FakePlayer {
        fn new() -> Self {
            Self { played: Vec::new() }
        }
    }

    impl Player for FakePlayer {
        fn play(&mut self, samples: &[i16], sample_rate: u32) -> Result<()> {
            self.played.push((samples.to_vec(), sample_rate));
            Ok(())
        }
    }

    fn recorder() -> Recorder<FakeCapture> {
        Recorder::new(FakeCapture::new())
    }

    #[test]
    fn countdown_starts_at_five_seconds() {
        let mut rec = recorder();
        assert_eq!(rec.countdown_display(), "5.00");

        let t0 = Instant::now();
        rec.start(t0).unwrap();
        assert_eq!(rec.countdown_display(), "5.00");
    }

    #[test]
    fn countdown_steps_down_by_25ms_ticks() {
        let mut rec = recorder();
        let t0 = Instant::now();
        rec.start(t0).unwrap();

        rec.poll(t0 + Duration::from_millis(25));
        assert_eq!(rec.countdown_display(), "4.97");

        rec.poll(t0 + Duration::from_millis(1000));
        assert_eq!(rec.countdown_display(), "4.00");

        rec.poll(t0 + Duration::from_millis(4999));
        assert_eq!(rec.countdown_display(), "0.02");
    }

    #[test]
    fn countdown_resets_on_every_exit_path() {
        let t0 = Instant::now();

        let mut rec = recorder();
        rec.start(t0).unwrap();
        rec.poll(t0 + Duration::from_millis(1500));
        rec.stop();
        assert_eq!(rec.countdown_display(), "5.00");

        let mut rec = recorder();
        rec.start(t0).unwrap();
        rec.poll(t0 + Duration::from_millis(1000));
        rec.cancel();
        assert_eq!(rec.countdown_display(), "5.00");

        let mut rec = recorder();
        rec.start(t0).unwrap();
        rec.poll(t0 + Duration::from_millis(6000));
        assert_eq!(rec.countdown_display(), "5.00");
    }

    #[test]
    fn at_most_one_tick_and_one_deadline_live() {
        let mut rec = recorder();
        let t0 = Instant::now();

        assert!(rec.next_tick.is_none() && rec.auto_stop.is_none());

        rec.start(t0).unwrap();
        assert!(rec.next_tick.is_some() && rec.auto_stop.is_some());

        // A second start while recording must not rearm anything.
        rec.start(t0 + Duration::from_millis(100)).unwrap();
        assert_eq!(rec.capture.starts, 1);

        rec.stop();
        assert!(rec.next_tick.is_none() && rec.auto_stop.is_none());

        rec.start(t0 + Duration::from_secs(1)).unwrap();
        rec.cancel();
        assert!(rec.next_tick.is_none() && rec.auto_stop.is_none());
    }

    #[test]
    fn stop_is_idempotent() {
        let mut rec = recorder();
        let t0 = Instant::now();
        rec.start(t0).unwrap();

        rec.stop();
        rec.stop();
        rec.cancel();

        assert_eq!(rec.status(), Status::Idle);
        assert_eq!(rec.capture.stops, 1);
        // cancel after the session already ended must not set the flag
        assert!(!rec.cancel_pending());
    }

    #[test]
    fn starting_clears_leftover_clip() {
        let mut rec = recorder();
        let mut prompt = ScriptedPrompt::answering(&[]);
        let t0 = Instant::now();

        rec.start(t0).unwrap();
        rec.stop();
        rec.on_fragment(vec![1, 2, 3], &mut prompt).unwrap();
        assert!(rec.has_clip());

        rec.start(t0 + Duration::from_secs(10)).unwrap();
        assert!(!rec.has_clip());
    }

    #[test]
    fn natural_stop_appends_without_prompting() {
        let mut rec = recorder();
        let mut prompt = ScriptedPrompt::answering(&[]);
        let t0 = Instant::now();

        rec.start(t0).unwrap();
        rec.stop();
        rec.on_fragment(vec![7, 8], &mut prompt).unwrap();

        assert!(rec.has_clip());
        assert!(prompt.asked.is_empty());
    }

    #[test]
    fn auto_stop_fires_at_the_limit() {
        let mut rec = recorder();
        let mut prompt = ScriptedPrompt::answering(&[]);
        let t0 = Instant::now();

        rec.start(t0).unwrap();
        rec.poll(t0 + Duration::from_millis(4999));
        assert_eq!(rec.status(), Status::Recording);

        rec.poll(t0 + Duration::from_millis(5000));
        assert_eq!(rec.status(), Status::Idle);
        assert_eq!(rec.countdown_display(), "5.00");
        assert_eq!(rec.capture.stops, 1);

        // Late completion after the auto-stop, no prompt.
        rec.on_fragment(vec![1], &mut prompt).unwrap();
        assert!(rec.has_clip());
        assert!(prompt.asked.is_empty());
    }

    #[test]
    fn cancelled_deadline_cannot_refire_against_a_new_session() {
        let mut rec = recorder();
        let t0 = Instant::now();

        rec.start(t0).unwrap();
        rec.poll(t0 + Duration::from_millis(1000));
        rec.cancel();

        // New session started before the old deadline would have elapsed.
        let t1 = t0 + Duration::from_millis(2000);
        rec.start(t1).unwrap();
        rec.poll(t0 + Duration::from_millis(5500));
        assert_eq!(rec.status(), Status::Recording);

        // The new session's own deadline still applies.
        rec.poll(t1 + Duration::from_millis(5000));
        assert_eq!(rec.status(), Status::Idle);
    }

    #[test]
    fn cancel_then_decline_discards_the_clip() {
        let mut rec = recorder();
        let mut prompt = ScriptedPrompt::answering(&[false]);
        let t0 = Instant::now();

        rec.start(t0).unwrap();
        rec.poll(t0 + Duration::from_millis(1000));
        rec.cancel();
        assert!(rec.cancel_pending());

        rec.on_fragment(vec![1, 2, 3], &mut prompt).unwrap();

        assert_eq!(prompt.asked, vec!["Save recording?"]);
        assert!(!rec.has_clip());
        assert!(!rec.cancel_pending());
    }

    #[test]
    fn cancel_then_accept_keeps_the_clip() {
        let mut rec = recorder();
        let mut prompt = ScriptedPrompt::answering(&[true]);
        let t0 = Instant::now();

        rec.start(t0).unwrap();
        rec.cancel();
        rec.on_fragment(vec![4, 5], &mut prompt).unwrap();

        assert_eq!(prompt.asked.len(), 1);
        assert!(rec.has_clip());
    }

    #[test]
    fn cancel_flag_is_consulted_exactly_once() {
        let mut rec = recorder();
        let mut prompt = ScriptedPrompt::answering(&[false]);
        let t0 = Instant::now();

        rec.start(t0).unwrap();
        rec.cancel();
        rec.on_fragment(vec![1], &mut prompt).unwrap();
        assert_eq!(prompt.asked.len(), 1);

        // A later fragment must append silently.
        rec.on_fragment(vec![2], &mut prompt).unwrap();
        assert_eq!(prompt.asked.len(), 1);
        assert!(rec.has_clip());
    }

    #[test]
    fn play_concatenates_fragments_in_order() {
        let mut rec = recorder();
        let mut prompt = ScriptedPrompt::answering(&[]);
        let mut player = FakePlayer::new();
        let t0 = Instant::now();

        rec.start(t0).unwrap();
        rec.stop();
        rec.on_fragment(vec![1, 2], &mut prompt).unwrap();
        rec.on_fragment(vec![3], &mut prompt).unwrap();

        rec.play(&mut player).unwrap();

        assert_eq!(player.played.len(), 1);
        assert_eq!(player.played[0].0, vec![1, 2, 3]);
        assert_eq!(player.played[0].1, 16000);
    }

    #[test]
    fn play_with_empty_clip_is_a_noop() {
        let mut rec = recorder();
        let mut player = FakePlayer::new();

        rec.play(&mut player).unwrap();
        assert!(player.played.is_empty());
    }

    #[test]
    fn failed_capture_start_leaves_the_recorder_idle() {
        let mut capture = FakeCapture::new();
        capture.fail_start = true;
        let mut rec = Recorder::new(capture);

        let err = rec.start(Instant::now());
        assert!(err.is_err());
        assert_eq!(rec.status(), Status::Idle);
        assert!(rec.next_tick.is_none() && rec.auto_stop.is_none());
    }
}
