//! Quick-clip recording feature for vclip.
//!
//! Provides the session state machine, microphone capture and the recorder
//! screen.

pub mod capture;
pub mod session;
pub mod ui;

pub use capture::{Capture, CpalCapture};
pub use session::{Fragment, Recorder, Status};
pub use ui::{RecorderCommand, RecorderTui, RecorderView};
