//! Particle buffers for the core cloud and the decorative aura.
//!
//! Buffers are flat `f32` arrays indexed by `particle * 3 + axis`, allocated
//! once per [`ParticleCloud::resize`] so the per-frame loop never allocates.

use std::fmt;

use tracing::info;

use crate::core::color::Rgb;
use crate::core::sampler::{Point3, fibonacci_sphere};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleError {
    /// A position buffer did not hold exactly `count` points.
    LengthMismatch { expected: usize, got: usize },
}

impl fmt::Display for ParticleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticleError::LengthMismatch { expected, got } => {
                write!(f, "expected {expected} positions, got {got}")
            }
        }
    }
}

impl std::error::Error for ParticleError {}

#[derive(Debug, Clone)]
pub struct ParticleCloud {
    count: usize,
    pub(crate) current: Box<[f32]>,
    pub(crate) target: Box<[f32]>,
    pub(crate) velocity: Box<[f32]>,
    pub(crate) color: Box<[f32]>,
}

impl ParticleCloud {
    /// Zeroed cloud of `count` particles.
    pub fn new(count: usize) -> Self {
        let zeros = || vec![0.0f32; count * 3].into_boxed_slice();
        Self {
            count,
            current: zeros(),
            target: zeros(),
            velocity: zeros(),
            color: zeros(),
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn current(&self) -> &[f32] {
        &self.current
    }

    pub fn target(&self) -> &[f32] {
        &self.target
    }

    pub fn velocity(&self) -> &[f32] {
        &self.velocity
    }

    pub fn color(&self) -> &[f32] {
        &self.color
    }

    pub fn position(&self, i: usize) -> Point3 {
        let o = i * 3;
        [self.current[o], self.current[o + 1], self.current[o + 2]]
    }

    /// Reallocates every buffer at `count` and zeroes them. Callers follow up
    /// with [`ParticleCloud::reset_to`] to place the particles.
    pub fn resize(&mut self, count: usize) {
        info!("particle cloud resized {} -> {}", self.count, count);
        *self = ParticleCloud::new(count);
    }

    /// Hard reset: `current` and `target` both become `positions`, velocity
    /// drops to zero.
    pub fn reset_to(&mut self, positions: &[Point3]) -> Result<(), ParticleError> {
        self.check_len(positions.len())?;
        let flat = positions.as_flattened();
        self.current.copy_from_slice(flat);
        self.target.copy_from_slice(flat);
        self.velocity.fill(0.0);
        Ok(())
    }

    /// Replaces the target only; the cloud migrates from where it is.
    pub fn retarget(&mut self, positions: &[Point3]) -> Result<(), ParticleError> {
        self.check_len(positions.len())?;
        self.target.copy_from_slice(positions.as_flattened());
        Ok(())
    }

    pub fn fill_color(&mut self, c: Rgb) {
        for px in self.color.chunks_exact_mut(3) {
            px.copy_from_slice(&c.to_array());
        }
    }

    fn check_len(&self, got: usize) -> Result<(), ParticleError> {
        if got != self.count {
            return Err(ParticleError::LengthMismatch {
                expected: self.count,
                got,
            });
        }
        Ok(())
    }
}

/// Secondary always-spherical cloud. Its positions never change; only the
/// transform derived from the core cloud moves it.
#[derive(Debug, Clone)]
pub struct AuraCloud {
    positions: Box<[f32]>,
}

impl AuraCloud {
    pub fn new(count: usize, radius: f32) -> Self {
        let mut positions = vec![0.0f32; count * 3].into_boxed_slice();
        for (i, p) in positions.chunks_exact_mut(3).enumerate() {
            p.copy_from_slice(&fibonacci_sphere(i, count, radius));
        }
        Self { positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }
}
