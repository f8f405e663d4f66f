//! Audio- and gesture-reactive particle formations.
//!
//! [`core`] holds the simulation: formation sampling (including glyph
//! rasterization), the particle buffers, the per-frame integrator and the
//! hand/audio reactivity mapping. [`audio`] turns PCM into the band
//! energies the core reacts to, and [`config`] loads the TOML settings.

pub mod audio;
pub mod config;
pub mod core;

pub use crate::core::formation::Formation;
pub use crate::core::mailbox::{FrameSnapshot, Signal, SignalMailbox, SignalSender};
pub use crate::core::signals::{AudioBands, HandPose, SelectionState};
pub use crate::core::simulation::{FrameView, Simulation, SimulationConfig};
