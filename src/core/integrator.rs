//! Per-frame spring/damper integration and heat colouring of the cloud.

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::color::Rgb;
use crate::core::particles::ParticleCloud;
use crate::core::signals::AudioBands;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsParams {
    /// Spring constant toward the target.
    #[serde(default = "PhysicsParams::default_attraction")]
    pub attraction: f32,
    /// Per-frame velocity retention.
    #[serde(default = "PhysicsParams::default_damping")]
    pub damping: f32,
    #[serde(default = "PhysicsParams::default_noise_base")]
    pub noise_base: f32,
    #[serde(default = "PhysicsParams::default_noise_treble_gain")]
    pub noise_treble_gain: f32,
    #[serde(default = "PhysicsParams::default_heat_speed_gain")]
    pub heat_speed_gain: f32,
    #[serde(default = "PhysicsParams::default_heat_treble_gain")]
    pub heat_treble_gain: f32,
    #[serde(
        default = "PhysicsParams::default_hot_color",
        deserialize_with = "PhysicsParams::lenient_hot_color"
    )]
    pub hot_color: Rgb,
}

impl PhysicsParams {
    fn default_attraction() -> f32 {
        0.03
    }
    fn default_damping() -> f32 {
        0.92
    }
    fn default_noise_base() -> f32 {
        0.02
    }
    fn default_noise_treble_gain() -> f32 {
        0.1
    }
    fn default_heat_speed_gain() -> f32 {
        3.0
    }
    fn default_heat_treble_gain() -> f32 {
        0.5
    }
    fn default_hot_color() -> Rgb {
        Rgb::WHITE
    }
    fn lenient_hot_color<'de, D: Deserializer<'de>>(d: D) -> Result<Rgb, D::Error> {
        Rgb::deserialize_or(d, Self::default_hot_color())
    }

    /// Jitter amplitude for this frame. Unavailable audio disables jitter.
    pub fn noise_amplitude(&self, audio: Option<&AudioBands>) -> f32 {
        match audio {
            Some(bands) => self.noise_base + bands.treble * self.noise_treble_gain,
            None => 0.0,
        }
    }

    #[inline]
    pub fn heat(&self, speed: f32, treble: f32) -> f32 {
        (speed * self.heat_speed_gain + treble * self.heat_treble_gain).min(1.0)
    }
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            attraction: Self::default_attraction(),
            damping: Self::default_damping(),
            noise_base: Self::default_noise_base(),
            noise_treble_gain: Self::default_noise_treble_gain(),
            heat_speed_gain: Self::default_heat_speed_gain(),
            heat_treble_gain: Self::default_heat_treble_gain(),
            hot_color: Self::default_hot_color(),
        }
    }
}

/// Aggregates gathered during one step, for logging and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepStats {
    pub mean_speed: f32,
    pub mean_heat: f32,
    pub mean_distance: f32,
}

#[derive(Debug, Clone, Default)]
pub struct PhysicsIntegrator {
    pub params: PhysicsParams,
}

impl PhysicsIntegrator {
    pub fn new(params: PhysicsParams) -> Self {
        Self { params }
    }

    /// Advances every particle one frame and recolors it.
    ///
    /// Per axis:
    /// ```text
    /// accel    = (target - current) * attraction
    /// noise    = U(-0.5, 0.5) * amplitude
    /// velocity = (velocity + accel + noise) * damping
    /// current += velocity
    /// ```
    /// then `heat = min(|velocity| * speed_gain + treble * treble_gain, 1)`
    /// and `color = lerp(base, hot, heat)`.
    pub fn step<R: Rng + ?Sized>(
        &self,
        cloud: &mut ParticleCloud,
        audio: Option<&AudioBands>,
        base: Rgb,
        rng: &mut R,
    ) -> StepStats {
        let p = &self.params;
        let amplitude = p.noise_amplitude(audio);
        let treble = audio.map_or(0.0, |a| a.treble);
        let hot = p.hot_color;

        let mut speed_sum = 0.0f64;
        let mut heat_sum = 0.0f64;
        let mut dist_sum = 0.0f64;

        let particles = cloud
            .current
            .chunks_exact_mut(3)
            .zip(cloud.velocity.chunks_exact_mut(3))
            .zip(cloud.target.chunks_exact(3))
            .zip(cloud.color.chunks_exact_mut(3));

        for (((pos, vel), tgt), col) in particles {
            let mut speed_sq = 0.0;
            let mut dist_sq = 0.0;
            for axis in 0..3 {
                let accel = (tgt[axis] - pos[axis]) * p.attraction;
                let noise = if amplitude > 0.0 {
                    (rng.random::<f32>() - 0.5) * amplitude
                } else {
                    0.0
                };
                vel[axis] = (vel[axis] + accel + noise) * p.damping;
                pos[axis] += vel[axis];

                speed_sq += vel[axis] * vel[axis];
                let d = tgt[axis] - pos[axis];
                dist_sq += d * d;
            }
            let speed = speed_sq.sqrt();
            let heat = p.heat(speed, treble);
            col.copy_from_slice(&base.lerp(hot, heat).to_array());

            speed_sum += speed as f64;
            heat_sum += heat as f64;
            dist_sum += dist_sq.sqrt() as f64;
        }

        let n = cloud.len().max(1) as f64;
        StepStats {
            mean_speed: (speed_sum / n) as f32,
            mean_heat: (heat_sum / n) as f32,
            mean_distance: (dist_sum / n) as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn single(pos: [f32; 3], target: [f32; 3]) -> ParticleCloud {
        let mut c = ParticleCloud::new(1);
        c.reset_to(&[pos]).unwrap();
        c.retarget(&[target]).unwrap();
        c
    }

    fn distance(c: &ParticleCloud) -> f32 {
        let cur = c.current();
        let tgt = c.target();
        (0..3)
            .map(|a| (tgt[a] - cur[a]).powi(2))
            .sum::<f32>()
            .sqrt()
    }

    #[test]
    fn first_step_matches_update_order() {
        let mut c = single([0.0, 0.0, 0.0], [10.0, 0.0, -5.0]);
        let integ = PhysicsIntegrator::default();
        let mut rng = StdRng::seed_from_u64(0);
        integ.step(&mut c, None, Rgb::BLACK, &mut rng);
        // v = (0 + 10 * 0.03) * 0.92, x = v
        assert_abs_diff_eq!(c.velocity()[0], 0.276, epsilon = 1e-6);
        assert_abs_diff_eq!(c.current()[0], 0.276, epsilon = 1e-6);
        assert_abs_diff_eq!(c.velocity()[2], -0.138, epsilon = 1e-6);
        assert_eq!(c.velocity()[1], 0.0);
    }

    #[test]
    fn distance_envelope_decays_without_noise() {
        let mut c = single([0.0, 0.0, 0.0], [5.0, -3.0, 4.0]);
        let integ = PhysicsIntegrator::default();
        let mut rng = StdRng::seed_from_u64(0);
        let d0 = distance(&c);
        let mut peak = 0.0f32;
        for _ in 0..200 {
            integ.step(&mut c, None, Rgb::BLACK, &mut rng);
            peak = peak.max(distance(&c));
        }
        assert!(peak <= d0, "overshoot {peak} exceeded start {d0}");
        assert!(distance(&c) < 1e-3 * d0);
    }

    #[test]
    fn at_rest_color_is_base() {
        let mut c = single([1.0, 1.0, 1.0], [1.0, 1.0, 1.0]);
        let integ = PhysicsIntegrator::default();
        let base = Rgb::new(0.1, 0.4, 0.9);
        let mut rng = StdRng::seed_from_u64(0);
        integ.step(&mut c, None, base, &mut rng);
        assert_eq!(c.color(), &[0.1, 0.4, 0.9]);
    }

    #[test]
    fn treble_heats_even_at_rest() {
        let params = PhysicsParams {
            noise_base: 0.0,
            noise_treble_gain: 0.0,
            ..PhysicsParams::default()
        };
        let integ = PhysicsIntegrator::new(params);
        let mut c = single([0.0; 3], [0.0; 3]);
        let bands = AudioBands {
            treble: 1.0,
            ..AudioBands::SILENT
        };
        let mut rng = StdRng::seed_from_u64(0);
        integ.step(&mut c, Some(&bands), Rgb::BLACK, &mut rng);
        // heat = 0.5 -> halfway to white
        assert_abs_diff_eq!(c.color()[0], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn heat_saturates_at_one() {
        let p = PhysicsParams::default();
        assert_eq!(p.heat(10.0, 1.0), 1.0);
        assert_abs_diff_eq!(p.heat(0.1, 0.2), 0.4, epsilon = 1e-6);
    }

    #[test]
    fn live_audio_adds_bounded_jitter() {
        let integ = PhysicsIntegrator::default();
        let mut c = single([0.0; 3], [0.0; 3]);
        let bands = AudioBands {
            treble: 1.0,
            ..AudioBands::SILENT
        };
        let mut rng = StdRng::seed_from_u64(42);
        integ.step(&mut c, Some(&bands), Rgb::BLACK, &mut rng);
        let amp = 0.02 + 0.1;
        assert!(c.velocity().iter().any(|&v| v != 0.0));
        assert!(c.velocity().iter().all(|&v| v.abs() <= 0.5 * amp * 0.92 + 1e-7));
    }
}
