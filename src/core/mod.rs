//! Particle generation and physics: formations, glyphs, buffers, the
//! integrator and the reactivity mapping.

pub mod color;
pub mod formation;
pub mod glyph;
pub mod integrator;
pub mod mailbox;
pub mod particles;
pub mod reactivity;
pub mod sampler;
pub mod signals;
pub mod simulation;
