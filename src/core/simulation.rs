//! Per-frame orchestration of sampling, reactivity and integration.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::color::Rgb;
use crate::core::glyph::GlyphConfig;
use crate::core::integrator::{PhysicsIntegrator, PhysicsParams, StepStats};
use crate::core::mailbox::FrameSnapshot;
use crate::core::particles::{AuraCloud, ParticleCloud};
use crate::core::reactivity::{CloudTransforms, ReactivityMapper, ReactivityParams, Transform};
use crate::core::sampler::{Point3, ShapeSampler};
use crate::core::signals::SelectionState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudParams {
    #[serde(default = "CloudParams::default_radius")]
    pub radius: f32,
    #[serde(default = "CloudParams::default_aura_count")]
    pub aura_count: usize,
    #[serde(default = "CloudParams::default_aura_radius_scale")]
    pub aura_radius_scale: f32,
    #[serde(default = "CloudParams::default_max_count")]
    pub max_count: usize,
    /// Fixed seed for reproducible runs; entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl CloudParams {
    fn default_radius() -> f32 {
        10.0
    }
    fn default_aura_count() -> usize {
        4_000
    }
    fn default_aura_radius_scale() -> f32 {
        1.3
    }
    fn default_max_count() -> usize {
        100_000
    }
}

impl Default for CloudParams {
    fn default() -> Self {
        Self {
            radius: Self::default_radius(),
            aura_count: Self::default_aura_count(),
            aura_radius_scale: Self::default_aura_radius_scale(),
            max_count: Self::default_max_count(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimulationConfig {
    pub cloud: CloudParams,
    pub physics: PhysicsParams,
    pub reactivity: ReactivityParams,
    pub glyph: GlyphConfig,
}

/// Buffers handed to the renderer after a step.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub frame: u64,
    /// Flattened `count * 3` positions.
    pub positions: &'a [f32],
    /// Flattened `count * 3` RGB colors.
    pub colors: &'a [f32],
    pub aura_positions: &'a [f32],
    pub aura_color: Rgb,
    pub core: Transform,
    pub aura: Transform,
    pub stats: StepStats,
}

pub struct Simulation {
    cloud_params: CloudParams,
    sampler: ShapeSampler,
    integrator: PhysicsIntegrator,
    mapper: ReactivityMapper,
    cloud: ParticleCloud,
    aura: AuraCloud,
    transforms: CloudTransforms,
    applied: SelectionState,
    scratch: Vec<Point3>,
    rng: StdRng,
    auto_phase: f32,
    frame: u64,
    stats: StepStats,
}

impl Simulation {
    pub fn new(config: SimulationConfig, selection: &SelectionState) -> Self {
        let rng = match config.cloud.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let applied = selection.sanitized(config.cloud.max_count);
        let aura = AuraCloud::new(
            config.cloud.aura_count,
            config.cloud.radius * config.cloud.aura_radius_scale,
        );
        let mut sim = Self {
            sampler: ShapeSampler::new(config.glyph),
            integrator: PhysicsIntegrator::new(config.physics),
            mapper: ReactivityMapper::new(config.reactivity),
            cloud: ParticleCloud::new(0),
            aura,
            transforms: CloudTransforms::default(),
            applied,
            scratch: Vec::new(),
            rng,
            auto_phase: 0.0,
            frame: 0,
            stats: StepStats::default(),
            cloud_params: config.cloud,
        };
        sim.rebuild();
        sim
    }

    pub fn cloud(&self) -> &ParticleCloud {
        &self.cloud
    }

    pub fn aura(&self) -> &AuraCloud {
        &self.aura
    }

    pub fn transforms(&self) -> &CloudTransforms {
        &self.transforms
    }

    /// Selection currently reflected in the buffers (sanitized).
    pub fn selection(&self) -> &SelectionState {
        &self.applied
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Hard reset at `count` particles (clamped to `[1, max_count]`): fresh
    /// buffers, zero velocity, and the particles placed directly on the
    /// active formation. The applied selection records the new count, so a
    /// later snapshot with a different count resizes again.
    pub fn resize(&mut self, count: usize) {
        let requested = SelectionState {
            particle_count: i64::try_from(count).unwrap_or(i64::MAX),
            ..self.applied.clone()
        };
        self.applied = requested.sanitized(self.cloud_params.max_count);
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let count = self.applied.count();
        self.cloud.resize(count);
        self.scratch.clear();
        self.scratch.resize(count, [0.0; 3]);
        self.sample_target();
        if let Err(err) = self.cloud.reset_to(&self.scratch) {
            warn!("reset after resize failed: {err}");
        }
        self.cloud.fill_color(self.applied.color);
    }

    /// Resamples the active formation and retargets without touching
    /// positions or velocities.
    pub fn reshape(&mut self) {
        self.sample_target();
        if let Err(err) = self.cloud.retarget(&self.scratch) {
            warn!("retarget failed: {err}");
        }
    }

    fn sample_target(&mut self) {
        self.sampler.sample_into(
            self.applied.shape,
            self.applied.glyph(),
            self.cloud_params.radius,
            &mut self.rng,
            &mut self.scratch,
        );
    }

    fn apply_selection(&mut self, requested: &SelectionState) {
        if *requested == self.applied {
            return;
        }
        let next = requested.sanitized(self.cloud_params.max_count);
        if next == self.applied {
            return;
        }
        let prev = std::mem::replace(&mut self.applied, next);
        if self.applied.count() != prev.count() {
            info!(
                "selection: {} particles, {}",
                self.applied.count(),
                self.applied.shape
            );
            self.rebuild();
        } else if self.applied.target_differs(&prev) {
            info!(
                "selection: {} glyph={:?}",
                self.applied.shape,
                self.applied.glyph()
            );
            self.reshape();
        }
    }

    /// Advances one frame: selection changes first, then the transform, then
    /// the particles.
    pub fn step(&mut self, snapshot: &FrameSnapshot, dt: f32) -> FrameView<'_> {
        self.apply_selection(&snapshot.selection);

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.auto_phase += self.mapper.params.auto_rotate_speed * dt;

        let audio = snapshot.audio.as_ref();
        let target = self.mapper.core_target(
            snapshot.hand.as_ref(),
            snapshot.pointer,
            audio,
            self.auto_phase,
        );
        self.transforms.advance(&self.mapper, target, audio);

        self.stats = self
            .integrator
            .step(&mut self.cloud, audio, self.applied.color, &mut self.rng);
        self.frame += 1;
        self.view()
    }

    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            frame: self.frame,
            positions: self.cloud.current(),
            colors: self.cloud.color(),
            aura_positions: self.aura.positions(),
            aura_color: self.applied.color,
            core: self.transforms.core,
            aura: self.transforms.aura,
            stats: self.stats,
        }
    }
}
