//! Configuration management for vclip.
//!
//! Configuration is stored as TOML in the user's config directory
//! (`~/.config/vclip/vclip.toml`). A missing file means defaults.

pub mod file;

pub use file::{get_config_path, AudioConfig, VclipConfig};
