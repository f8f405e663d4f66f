//! Target point clouds for every [`Formation`].
//!
//! Each generator maps `(index, count, radius)` plus an explicit random
//! source to a position. Procedural formations are pure; random ones draw
//! from the caller's rng so seeded runs are reproducible.

use std::f32::consts::{PI, TAU};

use rand::Rng;
use tracing::debug;

use crate::core::formation::Formation;
use crate::core::glyph::{GlyphConfig, GlyphMask, GlyphRasterizer};

pub type Point3 = [f32; 3];

const CUBE_HALF_EXTENT: f32 = 0.75;
const TORUS_TUBE: f32 = 0.3;
const GALAXY_ARMS: usize = 3;
const GALAXY_TURNS: f32 = 3.0;
const GALAXY_LATERAL_JITTER: f32 = 0.05;
const GALAXY_VERTICAL_JITTER: f32 = 0.025;
const HELIX_RADIUS: f32 = 0.3;
const HELIX_TURNS: f32 = 4.0;
const HELIX_JITTER: f32 = 0.5;
const RING_SPHERE_SHARE: f32 = 0.7;
const RING_SPHERE_RADIUS: f32 = 0.6;
const RING_INNER: f32 = 0.8;
const RING_OUTER: f32 = 1.5;
const RING_THICKNESS: f32 = 0.02;
const PYRAMID_SCALE: f32 = 1.5;
const EXPLOSION_REACH: f32 = 2.0;
const GLYPH_SPAN: f32 = 1.5;
const GLYPH_DEPTH: f32 = 0.1;

/// Unit tetrahedron; scaled by `PYRAMID_SCALE * radius`.
const PYRAMID_VERTICES: [Point3; 4] = [
    [0.0, 1.0, 0.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [0.0, -1.0, -1.0],
];

/// Fibonacci-lattice point `i` of `count` on a sphere of `radius`.
#[inline]
pub fn fibonacci_sphere(i: usize, count: usize, radius: f32) -> Point3 {
    if count == 0 {
        return [0.0; 3];
    }
    let n = count as f32;
    let t = (-1.0 + 2.0 * i as f32 / n).clamp(-1.0, 1.0);
    let phi = t.acos();
    let theta = (n * PI).sqrt() * phi;
    [
        radius * theta.cos() * phi.sin(),
        radius * theta.sin() * phi.sin(),
        radius * phi.cos(),
    ]
}

fn cube<R: Rng + ?Sized>(radius: f32, rng: &mut R) -> Point3 {
    let h = CUBE_HALF_EXTENT * radius;
    if h <= 0.0 {
        return [0.0; 3];
    }
    [
        rng.random_range(-h..=h),
        rng.random_range(-h..=h),
        rng.random_range(-h..=h),
    ]
}

fn torus<R: Rng + ?Sized>(radius: f32, rng: &mut R) -> Point3 {
    let u = rng.random_range(0.0..TAU);
    let v = rng.random_range(0.0..TAU);
    let tube = TORUS_TUBE * radius;
    let ring = radius + tube * v.cos();
    [ring * u.cos(), ring * u.sin(), tube * v.sin()]
}

/// Low indices sit at the core, high indices at the arm tips.
fn galaxy<R: Rng + ?Sized>(i: usize, count: usize, radius: f32, rng: &mut R) -> Point3 {
    let t = i as f32 / count as f32;
    let arm = (i % GALAXY_ARMS) as f32 * TAU / GALAXY_ARMS as f32;
    let angle = t * GALAXY_TURNS * TAU + arm;
    let dist = t * radius;
    let lateral = GALAXY_LATERAL_JITTER * radius;
    let vertical = GALAXY_VERTICAL_JITTER * radius;
    [
        angle.cos() * dist + rng.random_range(-1.0..=1.0) * lateral,
        rng.random_range(-1.0..=1.0) * vertical,
        angle.sin() * dist + rng.random_range(-1.0..=1.0) * lateral,
    ]
}

/// Two strands (`i mod 2`) half a turn apart, wound around the z axis.
fn dna_helix<R: Rng + ?Sized>(i: usize, count: usize, radius: f32, rng: &mut R) -> Point3 {
    let t = i as f32 / count as f32;
    let strand = (i % 2) as f32 * PI;
    let angle = t * HELIX_TURNS * TAU + strand;
    let r = HELIX_RADIUS * radius;
    let mut j = || rng.random_range(-HELIX_JITTER..=HELIX_JITTER);
    [
        angle.cos() * r + j(),
        angle.sin() * r + j(),
        (t - 0.5) * 2.0 * radius + j(),
    ]
}

/// Sphere lobe for the first 70% of indices, flat annulus for the rest.
fn ringed_sphere<R: Rng + ?Sized>(i: usize, count: usize, radius: f32, rng: &mut R) -> Point3 {
    let sphere_count = (count as f32 * RING_SPHERE_SHARE) as usize;
    if i < sphere_count {
        return fibonacci_sphere(i, sphere_count, RING_SPHERE_RADIUS * radius);
    }
    let r_min = RING_INNER * radius;
    let r_max = RING_OUTER * radius;
    // sqrt keeps the annulus area-uniform instead of piling up at r_min.
    let r = rng.random::<f32>().sqrt() * (r_max - r_min) + r_min;
    let angle = rng.random_range(0.0..TAU);
    let y = rng.random_range(-0.5..=0.5) * RING_THICKNESS;
    [angle.cos() * r, y, angle.sin() * r]
}

/// Uniform point inside the tetrahedron via barycentric folding.
fn pyramid<R: Rng + ?Sized>(radius: f32, rng: &mut R) -> Point3 {
    let mut s: f32 = rng.random();
    let mut t: f32 = rng.random();
    let mut u: f32 = rng.random();
    if s + t > 1.0 {
        s = 1.0 - s;
        t = 1.0 - t;
    }
    if t + u > 1.0 {
        let tmp = u;
        u = 1.0 - s - t;
        t = 1.0 - tmp;
    } else if s + t + u > 1.0 {
        let tmp = u;
        u = s + t + u - 1.0;
        s = 1.0 - t - tmp;
    }
    let a = 1.0 - s - t - u;
    let w = [a, s, t, u];
    let k = PYRAMID_SCALE * radius;
    let mut p = [0.0; 3];
    for (vertex, weight) in PYRAMID_VERTICES.iter().zip(w) {
        for axis in 0..3 {
            p[axis] += vertex[axis] * weight * k;
        }
    }
    p
}

fn explosion<R: Rng + ?Sized>(radius: f32, rng: &mut R) -> Point3 {
    let r = rng.random::<f32>() * radius * EXPLOSION_REACH;
    let theta = rng.random_range(0.0..TAU);
    let phi = (2.0 * rng.random::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
    [
        r * phi.sin() * theta.cos(),
        r * phi.sin() * theta.sin(),
        r * phi.cos(),
    ]
}

/// Random foreground pixel (with replacement) mapped onto the xy plane,
/// thickened by a little depth jitter.
fn glyph<R: Rng + ?Sized>(mask: &GlyphMask, radius: f32, rng: &mut R) -> Point3 {
    let size = mask.size.max(1) as f32;
    let [px, py] = mask.pixels[rng.random_range(0..mask.pixels.len())];
    let span = radius * GLYPH_SPAN;
    let depth = GLYPH_DEPTH * radius;
    [
        (px as f32 / size - 0.5) * span,
        -(py as f32 / size - 0.5) * span,
        rng.random_range(-1.0..=1.0) * depth,
    ]
}

/// Samples `count` target positions for `formation`.
///
/// Glyph formations need a `mask`; when it is missing or empty the result is
/// `count` points at the origin.
pub fn sample<R: Rng + ?Sized>(
    formation: Formation,
    count: usize,
    radius: f32,
    mask: Option<&GlyphMask>,
    rng: &mut R,
) -> Vec<Point3> {
    let mut out = vec![[0.0; 3]; count];
    sample_into(formation, radius, mask, rng, &mut out);
    out
}

/// In-place variant of [`sample`]; `out.len()` is the particle count.
pub fn sample_into<R: Rng + ?Sized>(
    formation: Formation,
    radius: f32,
    mask: Option<&GlyphMask>,
    rng: &mut R,
    out: &mut [Point3],
) {
    let count = out.len();
    let radius = if radius.is_finite() { radius.max(0.0) } else { 0.0 };
    for (i, p) in out.iter_mut().enumerate() {
        *p = match formation {
            Formation::Sphere => fibonacci_sphere(i, count, radius),
            Formation::Cube => cube(radius, rng),
            Formation::Torus => torus(radius, rng),
            Formation::Galaxy => galaxy(i, count, radius, rng),
            Formation::DnaHelix => dna_helix(i, count, radius, rng),
            Formation::RingedSphere => ringed_sphere(i, count, radius, rng),
            Formation::Pyramid => pyramid(radius, rng),
            Formation::Explosion => explosion(radius, rng),
            Formation::GlyphText | Formation::GlyphDigit => match mask {
                Some(m) if !m.is_empty() => glyph(m, radius, rng),
                _ => [0.0; 3],
            },
        };
    }
}

/// Formation sampler that resolves glyph symbols through a caching rasterizer.
#[derive(Debug, Default)]
pub struct ShapeSampler {
    rasterizer: GlyphRasterizer,
}

impl ShapeSampler {
    pub fn new(glyph: GlyphConfig) -> Self {
        Self {
            rasterizer: GlyphRasterizer::new(glyph),
        }
    }

    /// `symbol` is only consulted for glyph formations.
    pub fn sample_into<R: Rng + ?Sized>(
        &mut self,
        formation: Formation,
        symbol: Option<char>,
        radius: f32,
        rng: &mut R,
        out: &mut [Point3],
    ) {
        let mask = match (formation.is_glyph(), symbol) {
            (true, Some(c)) => Some(self.rasterizer.rasterize(c)),
            _ => None,
        };
        sample_into(formation, radius, mask.as_deref(), rng, out);
        debug!(
            formation = %formation,
            count = out.len(),
            radius,
            glyph_px = mask.as_ref().map(|m| m.len()),
            "sampled formation"
        );
    }

    pub fn sample<R: Rng + ?Sized>(
        &mut self,
        formation: Formation,
        symbol: Option<char>,
        count: usize,
        radius: f32,
        rng: &mut R,
    ) -> Vec<Point3> {
        let mut out = vec![[0.0; 3]; count];
        self.sample_into(formation, symbol, radius, rng, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn norm(p: Point3) -> f32 {
        (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt()
    }

    #[test]
    fn fibonacci_points_lie_on_sphere() {
        for i in 0..500 {
            assert_abs_diff_eq!(norm(fibonacci_sphere(i, 500, 3.0)), 3.0, epsilon = 1e-4);
        }
        // first index sits at the south pole
        assert_abs_diff_eq!(fibonacci_sphere(0, 500, 3.0)[2], -3.0, epsilon = 1e-5);
    }

    #[test]
    fn sphere_is_deterministic_across_rngs() {
        let a = sample(Formation::Sphere, 64, 2.0, None, &mut StdRng::seed_from_u64(1));
        let b = sample(Formation::Sphere, 64, 2.0, None, &mut StdRng::seed_from_u64(2));
        assert_eq!(a, b);
    }

    #[test]
    fn cube_respects_extent_and_regenerates() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = sample(Formation::Cube, 256, 4.0, None, &mut rng);
        let b = sample(Formation::Cube, 256, 4.0, None, &mut rng);
        assert_ne!(a, b);
        assert!(a.iter().flatten().all(|v| v.abs() <= 3.0 + 1e-6));
    }

    #[test]
    fn torus_points_are_within_tube() {
        let mut rng = StdRng::seed_from_u64(3);
        for p in sample(Formation::Torus, 400, 10.0, None, &mut rng) {
            let ring = (p[0] * p[0] + p[1] * p[1]).sqrt();
            let tube_dist = ((ring - 10.0).powi(2) + p[2] * p[2]).sqrt();
            assert!(tube_dist <= 3.0 + 1e-3, "tube_dist={tube_dist}");
        }
    }

    #[test]
    fn galaxy_radius_grows_with_index() {
        let mut rng = StdRng::seed_from_u64(5);
        let pts = sample(Formation::Galaxy, 3000, 10.0, None, &mut rng);
        let planar = |p: Point3| (p[0] * p[0] + p[2] * p[2]).sqrt();
        let inner: f32 = pts[..300].iter().map(|&p| planar(p)).sum::<f32>() / 300.0;
        let outer: f32 = pts[2700..].iter().map(|&p| planar(p)).sum::<f32>() / 300.0;
        assert!(outer > inner + 5.0, "inner={inner} outer={outer}");
        assert!(pts.iter().all(|p| p[1].abs() <= 0.25 + 1e-5));
    }

    #[test]
    fn helix_strands_are_opposite() {
        let mut rng = StdRng::seed_from_u64(11);
        let pts = sample(Formation::DnaHelix, 1000, 10.0, None, &mut rng);
        for pair in pts.chunks_exact(2) {
            // consecutive indices sit on opposite strands, so their planar
            // positions roughly mirror through the axis
            let sum_x = pair[0][0] + pair[1][0];
            let sum_y = pair[0][1] + pair[1][1];
            assert!(sum_x.abs() < 2.2 && sum_y.abs() < 2.2);
        }
        assert!(pts.iter().all(|p| p[2].abs() <= 10.0 + 0.5 + 1e-4));
    }

    #[test]
    fn ringed_sphere_splits_lobe_and_disk() {
        let mut rng = StdRng::seed_from_u64(13);
        let count = 1000;
        let pts = sample(Formation::RingedSphere, count, 10.0, None, &mut rng);
        let lobe = (count as f32 * 0.7) as usize;
        for p in &pts[..lobe] {
            assert!(norm(*p) <= 6.0 * (1.0 + 1e-4));
        }
        for p in &pts[lobe..] {
            let r = (p[0] * p[0] + p[2] * p[2]).sqrt();
            assert!((8.0 - 1e-3..=15.0 + 1e-3).contains(&r), "r={r}");
            assert!(p[1].abs() <= 0.01 + 1e-6);
        }
    }

    #[test]
    fn pyramid_points_are_convex_combinations() {
        let det = |a: Point3, b: Point3, c: Point3| {
            a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
                + a[2] * (b[0] * c[1] - b[1] * c[0])
        };
        let sub = |a: Point3, b: Point3| [a[0] - b[0], a[1] - b[1], a[2] - b[2]];
        let radius = 2.0;
        let k = PYRAMID_SCALE * radius;
        let [v0, v1, v2, v3] = PYRAMID_VERTICES;
        let (e1, e2, e3) = (sub(v1, v0), sub(v2, v0), sub(v3, v0));
        let d = det(e1, e2, e3);
        assert!(d.abs() > 1e-6);

        let mut rng = StdRng::seed_from_u64(17);
        for p in sample(Formation::Pyramid, 2000, radius, None, &mut rng) {
            let q = sub([p[0] / k, p[1] / k, p[2] / k], v0);
            // Cramer's rule for q = w1*e1 + w2*e2 + w3*e3
            let w1 = det(q, e2, e3) / d;
            let w2 = det(e1, q, e3) / d;
            let w3 = det(e1, e2, q) / d;
            let w0 = 1.0 - w1 - w2 - w3;
            for w in [w0, w1, w2, w3] {
                assert!(w >= -1e-5, "weight {w} for {p:?}");
            }
        }
    }

    #[test]
    fn explosion_stays_within_reach() {
        let mut rng = StdRng::seed_from_u64(19);
        for p in sample(Formation::Explosion, 1000, 5.0, None, &mut rng) {
            assert!(norm(p) <= 10.0 + 1e-4);
        }
    }

    #[test]
    fn glyph_without_mask_is_all_zero() {
        let mut rng = StdRng::seed_from_u64(23);
        let empty = GlyphMask {
            size: 100,
            pixels: Vec::new(),
        };
        let pts = sample(Formation::GlyphText, 50, 10.0, Some(&empty), &mut rng);
        assert_eq!(pts.len(), 50);
        assert!(pts.iter().flatten().all(|&v| v == 0.0));
        let pts = sample(Formation::GlyphDigit, 5, 10.0, None, &mut rng);
        assert!(pts.iter().flatten().all(|&v| v == 0.0));
    }

    #[test]
    fn glyph_pixels_map_to_slab() {
        let mut rng = StdRng::seed_from_u64(29);
        let mask = GlyphMask {
            size: 100,
            pixels: vec![[0, 0], [50, 50], [99, 99]],
        };
        for p in sample(Formation::GlyphText, 300, 10.0, Some(&mask), &mut rng) {
            assert!(p[0] >= -7.5 && p[0] <= 7.5);
            assert!(p[1] >= -7.5 && p[1] <= 7.5);
            assert!(p[2].abs() <= 1.0 + 1e-6);
        }
        let top_left = sample(
            Formation::GlyphText,
            1,
            10.0,
            Some(&GlyphMask {
                size: 100,
                pixels: vec![[0, 0]],
            }),
            &mut rng,
        )[0];
        assert_abs_diff_eq!(top_left[0], -7.5, epsilon = 1e-5);
        assert_abs_diff_eq!(top_left[1], 7.5, epsilon = 1e-5);
    }

    #[test]
    fn zero_count_is_empty() {
        let mut rng = StdRng::seed_from_u64(31);
        for f in Formation::ALL {
            assert!(sample(f, 0, 10.0, None, &mut rng).is_empty());
        }
    }
}
