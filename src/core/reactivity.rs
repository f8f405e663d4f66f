//! Maps hand pose and audio bands onto the whole-cloud transform.

use std::f32::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use crate::core::signals::{AudioBands, HandPose, clamp_pointer};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactivityParams {
    #[serde(default = "ReactivityParams::default_hand_rotation_gain")]
    pub hand_rotation_gain: f32,
    #[serde(default = "ReactivityParams::default_pointer_rotation_gain")]
    pub pointer_rotation_gain: f32,
    /// Idle spin around the vertical axis, rad/s.
    #[serde(default = "ReactivityParams::default_auto_rotate_speed")]
    pub auto_rotate_speed: f32,
    #[serde(default = "ReactivityParams::default_rotation_smoothing")]
    pub rotation_smoothing: f32,
    #[serde(default = "ReactivityParams::default_scale_smoothing")]
    pub scale_smoothing: f32,
    #[serde(default = "ReactivityParams::default_hand_scale_base")]
    pub hand_scale_base: f32,
    #[serde(default = "ReactivityParams::default_hand_scale_span")]
    pub hand_scale_span: f32,
    #[serde(default = "ReactivityParams::default_bass_scale_gain")]
    pub bass_scale_gain: f32,
    #[serde(default = "ReactivityParams::default_aura_rotation_follow")]
    pub aura_rotation_follow: f32,
    #[serde(default = "ReactivityParams::default_aura_bass_gain")]
    pub aura_bass_gain: f32,
}

impl ReactivityParams {
    fn default_hand_rotation_gain() -> f32 {
        1.5
    }
    fn default_pointer_rotation_gain() -> f32 {
        0.5
    }
    fn default_auto_rotate_speed() -> f32 {
        0.12
    }
    fn default_rotation_smoothing() -> f32 {
        0.1
    }
    fn default_scale_smoothing() -> f32 {
        0.08
    }
    fn default_hand_scale_base() -> f32 {
        0.3
    }
    fn default_hand_scale_span() -> f32 {
        1.2
    }
    fn default_bass_scale_gain() -> f32 {
        0.4
    }
    fn default_aura_rotation_follow() -> f32 {
        0.8
    }
    fn default_aura_bass_gain() -> f32 {
        0.5
    }
}

impl Default for ReactivityParams {
    fn default() -> Self {
        Self {
            hand_rotation_gain: Self::default_hand_rotation_gain(),
            pointer_rotation_gain: Self::default_pointer_rotation_gain(),
            auto_rotate_speed: Self::default_auto_rotate_speed(),
            rotation_smoothing: Self::default_rotation_smoothing(),
            scale_smoothing: Self::default_scale_smoothing(),
            hand_scale_base: Self::default_hand_scale_base(),
            hand_scale_span: Self::default_hand_scale_span(),
            bass_scale_gain: Self::default_bass_scale_gain(),
            aura_rotation_follow: Self::default_aura_rotation_follow(),
            aura_bass_gain: Self::default_aura_bass_gain(),
        }
    }
}

/// Rotation about x then y (radians) and a uniform scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub rotation: [f32; 2],
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            rotation: [0.0, 0.0],
            scale: 1.0,
        }
    }
}

impl Transform {
    /// Applies rotation and scale to a point, x-axis rotation first.
    #[inline]
    pub fn apply(&self, p: [f32; 3]) -> [f32; 3] {
        let (sx, cx) = self.rotation[0].sin_cos();
        let (sy, cy) = self.rotation[1].sin_cos();
        let [x, y, z] = p;
        let y1 = y * cx - z * sx;
        let z1 = y * sx + z * cx;
        let x2 = x * cy + z1 * sy;
        let z2 = -x * sy + z1 * cy;
        [x2 * self.scale, y1 * self.scale, z2 * self.scale]
    }
}

/// Wraps an angle difference into `(-PI, PI]`.
#[inline]
fn shortest_arc(delta: f32) -> f32 {
    let d = (delta + PI).rem_euclid(TAU) - PI;
    if d == -PI { PI } else { d }
}

/// Stateless signal-to-target mapping.
#[derive(Debug, Clone, Default)]
pub struct ReactivityMapper {
    pub params: ReactivityParams,
}

impl ReactivityMapper {
    pub fn new(params: ReactivityParams) -> Self {
        Self { params }
    }

    /// Target transform for the core cloud.
    ///
    /// With a detected hand the pose drives rotation and spread drives scale;
    /// otherwise the pointer (when present) tilts the cloud on top of the
    /// idle spin `auto_phase`. Bass always inflates the scale. Stale values in
    /// an undetected pose are ignored; detected poses, the pointer and the
    /// bass level are clamped into range first.
    pub fn core_target(
        &self,
        hand: Option<&HandPose>,
        pointer: Option<[f32; 2]>,
        audio: Option<&AudioBands>,
        auto_phase: f32,
    ) -> Transform {
        let p = &self.params;
        let bass = audio.map_or(0.0, |a| a.clamped().bass);
        match hand.filter(|h| h.is_detected).map(|h| h.clamped()) {
            Some(h) => Transform {
                rotation: [-h.y * p.hand_rotation_gain, h.x * p.hand_rotation_gain],
                scale: p.hand_scale_base + h.hand_spread * p.hand_scale_span
                    + bass * p.bass_scale_gain,
            },
            None => {
                let [px, py] = pointer.map_or([0.0, 0.0], clamp_pointer);
                Transform {
                    rotation: [
                        -py * p.pointer_rotation_gain,
                        px * p.pointer_rotation_gain + auto_phase,
                    ],
                    scale: 1.0 + bass * p.bass_scale_gain,
                }
            }
        }
    }

    /// Target transform for the aura, read from the core's smoothed transform.
    pub fn aura_target(&self, core: &Transform, audio: Option<&AudioBands>) -> Transform {
        let p = &self.params;
        let bass = audio.map_or(0.0, |a| a.clamped().bass);
        Transform {
            rotation: [
                core.rotation[0] * p.aura_rotation_follow,
                core.rotation[1] * p.aura_rotation_follow,
            ],
            scale: core.scale * (1.0 + bass * p.aura_bass_gain),
        }
    }
}

/// Smoothed transforms carried across frames.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CloudTransforms {
    pub core: Transform,
    pub aura: Transform,
}

impl CloudTransforms {
    /// One exponential-smoothing step. The core follows the shortest arc to
    /// its target; the aura then follows a target derived from the updated
    /// core.
    pub fn advance(
        &mut self,
        mapper: &ReactivityMapper,
        target: Transform,
        audio: Option<&AudioBands>,
    ) {
        let p = &mapper.params;
        for axis in 0..2 {
            let delta = shortest_arc(target.rotation[axis] - self.core.rotation[axis]);
            self.core.rotation[axis] += delta * p.rotation_smoothing;
        }
        self.core.scale += (target.scale - self.core.scale) * p.scale_smoothing;

        let aura_target = mapper.aura_target(&self.core, audio);
        for axis in 0..2 {
            self.aura.rotation[axis] +=
                (aura_target.rotation[axis] - self.aura.rotation[axis]) * p.rotation_smoothing;
        }
        self.aura.scale += (aura_target.scale - self.aura.scale) * p.scale_smoothing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn detected_hand_drives_rotation_and_scale() {
        let m = ReactivityMapper::default();
        let hand = HandPose::detected(0.5, -0.2, 1.0);
        let audio = AudioBands {
            bass: 0.5,
            ..AudioBands::SILENT
        };
        let t = m.core_target(Some(&hand), None, Some(&audio), 3.0);
        assert_abs_diff_eq!(t.rotation[0], 0.3, epsilon = 1e-6);
        assert_abs_diff_eq!(t.rotation[1], 0.75, epsilon = 1e-6);
        assert_abs_diff_eq!(t.scale, 0.3 + 1.2 + 0.2, epsilon = 1e-6);
    }

    #[test]
    fn undetected_hand_is_ignored() {
        let m = ReactivityMapper::default();
        let stale = HandPose {
            x: 0.9,
            y: 0.9,
            is_detected: false,
            is_clenched: true,
            hand_spread: 1.0,
        };
        let audio = AudioBands {
            bass: 1.0,
            ..AudioBands::SILENT
        };
        let t = m.core_target(Some(&stale), None, Some(&audio), 0.7);
        assert_eq!(t.rotation, [0.0, 0.7]);
        assert_abs_diff_eq!(t.scale, 1.4, epsilon = 1e-6);
        assert_eq!(t, m.core_target(None, None, Some(&audio), 0.7));
    }

    #[test]
    fn pointer_tilts_idle_cloud() {
        let m = ReactivityMapper::default();
        let t = m.core_target(None, Some([1.0, 1.0]), None, 0.0);
        assert_abs_diff_eq!(t.rotation[0], -0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(t.rotation[1], 0.5, epsilon = 1e-6);
        assert_eq!(t.scale, 1.0);
    }

    #[test]
    fn smoothing_moves_a_fraction_toward_target() {
        let m = ReactivityMapper::default();
        let mut xf = CloudTransforms::default();
        let target = Transform {
            rotation: [1.0, -1.0],
            scale: 2.0,
        };
        xf.advance(&m, target, None);
        assert_abs_diff_eq!(xf.core.rotation[0], 0.1, epsilon = 1e-6);
        assert_abs_diff_eq!(xf.core.rotation[1], -0.1, epsilon = 1e-6);
        assert_abs_diff_eq!(xf.core.scale, 1.08, epsilon = 1e-6);
        // aura follows 80% of the new core rotation at the same rate
        assert_abs_diff_eq!(xf.aura.rotation[0], 0.1 * 0.8 * 0.1, epsilon = 1e-6);
        assert_abs_diff_eq!(xf.aura.scale, 1.0 + (1.08 - 1.0) * 0.08, epsilon = 1e-6);
    }

    #[test]
    fn core_takes_the_short_way_round() {
        let m = ReactivityMapper::default();
        let mut xf = CloudTransforms::default();
        xf.core.rotation[1] = 0.1;
        let target = Transform {
            rotation: [0.0, TAU - 0.1],
            scale: 1.0,
        };
        xf.advance(&m, target, None);
        // -0.2 rad away on the short arc, 10% of it
        assert_abs_diff_eq!(xf.core.rotation[1], 0.08, epsilon = 1e-5);
    }

    #[test]
    fn converges_to_steady_target() {
        let m = ReactivityMapper::default();
        let mut xf = CloudTransforms::default();
        let audio = AudioBands {
            bass: 1.0,
            ..AudioBands::SILENT
        };
        let target = m.core_target(None, None, Some(&audio), 0.0);
        for _ in 0..500 {
            xf.advance(&m, target, Some(&audio));
        }
        assert_abs_diff_eq!(xf.core.scale, 1.4, epsilon = 1e-4);
        assert_abs_diff_eq!(xf.aura.scale, 1.4 * 1.5, epsilon = 1e-3);
    }

    #[test]
    fn transform_rotates_and_scales() {
        let t = Transform {
            rotation: [0.0, PI / 2.0],
            scale: 2.0,
        };
        let p = t.apply([1.0, 0.0, 0.0]);
        assert_abs_diff_eq!(p[0], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p[2], -2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(shortest_arc(TAU + 0.5), 0.5, epsilon = 1e-5);
        assert_abs_diff_eq!(shortest_arc(-TAU - 0.5), -0.5, epsilon = 1e-5);
    }
}
