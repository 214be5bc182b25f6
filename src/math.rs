use glam::{Vec2, Vec3};

#[derive(Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn at(self, t: f32) -> Vec3 {
        self.origin + (self.direction * t)
    }
}

pub fn reflect(direction: Vec3, normal: Vec3) -> Vec3 {
    direction - (normal * (2.0 * direction.dot(normal)))
}

pub fn refract(direction: Vec3, normal: Vec3, eta: f32) -> Option<Vec3> {
    let cos_i = (-direction).dot(normal).clamp(-1.0, 1.0);
    let k = 1.0 - (eta * eta * (1.0 - (cos_i * cos_i)));
    if k < 0.0 {
        None
    } else {
        Some((direction * eta) + (normal * ((eta * cos_i) - k.sqrt())))
    }
}

pub fn fresnel_schlick(cosine: f32, f0: f32) -> f32 {
    f0 + ((1.0 - f0) * (1.0 - cosine.clamp(0.0, 1.0)).powf(5.0))
}

/// Polynomial smooth minimum. Non-positive k degenerates to the hard union.
pub fn smooth_min(a: f32, b: f32, k: f32) -> f32 {
    if k <= 0.0 {
        return a.min(b);
    }
    let h = (0.5 + (0.5 * (b - a) / k)).clamp(0.0, 1.0);
    (b + ((a - b) * h)) - (k * h * (1.0 - h))
}

fn fract(v: f32) -> f32 {
    v - v.floor()
}

fn hash21(p: Vec2) -> f32 {
    let n = p.dot(Vec2::new(127.1, 311.7));
    fract(n.sin() * 43758.5453)
}

/// Lattice value noise in [-1, 1], smoothstep-interpolated between cell hashes.
pub fn value_noise(p: Vec2) -> f32 {
    let cell = p.floor();
    let f = p - cell;
    let w = f * f * (Vec2::splat(3.0) - (f * 2.0));

    let a = hash21(cell);
    let b = hash21(cell + Vec2::X);
    let c = hash21(cell + Vec2::Y);
    let d = hash21(cell + Vec2::ONE);

    let bottom = a + ((b - a) * w.x);
    let top = c + ((d - c) * w.x);
    let v = bottom + ((top - bottom) * w.y);
    (v * 2.0) - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smooth_min_stays_at_or_below_hard_min() {
        let pairs = [(0.4, 0.7), (-0.2, 0.1), (1.5, 1.5), (-0.8, -0.3)];
        for (a, b) in pairs {
            let blended = smooth_min(a, b, 1.0);
            assert!(blended <= a.min(b) + 1e-6, "{blended} vs min({a}, {b})");
        }
    }

    #[test]
    fn smooth_min_is_order_insensitive() {
        for (a, b) in [(0.25, 0.9), (-0.4, 0.3), (2.0, -1.0)] {
            let forward = smooth_min(a, b, 0.7);
            let reversed = smooth_min(b, a, 0.7);
            assert!((forward - reversed).abs() < 1e-6);
        }
    }

    #[test]
    fn smooth_min_converges_to_hard_min_as_k_vanishes() {
        let (a, b) = (0.32, 0.55);
        assert!((smooth_min(a, b, 1e-6) - a.min(b)).abs() < 1e-5);
        assert_eq!(smooth_min(a, b, 0.0), a.min(b));
        assert_eq!(smooth_min(a, b, -1.0), a.min(b));
    }

    #[test]
    fn value_noise_is_deterministic_and_bounded() {
        for i in 0..64 {
            let p = Vec2::new(i as f32 * 0.37 - 3.0, i as f32 * 0.91 + 1.5);
            let first = value_noise(p);
            let second = value_noise(p);
            assert_eq!(first, second);
            assert!((-1.0..=1.0).contains(&first), "noise out of range: {first}");
        }
    }

    #[test]
    fn reflect_preserves_length_and_flips_normal_component() {
        let d = Vec3::new(1.0, -1.0, 0.0).normalize();
        let r = reflect(d, Vec3::Y);
        assert!((r.length() - 1.0).abs() < 1e-6);
        assert!((r.y - 1.0 / 2.0_f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn refract_reports_total_internal_reflection() {
        let grazing = Vec3::new(0.999, -0.0447, 0.0).normalize();
        assert!(refract(grazing, Vec3::Y, 1.52).is_none());
        let steep = Vec3::new(0.1, -1.0, 0.0).normalize();
        assert!(refract(steep, Vec3::Y, 1.0 / 1.52).is_some());
    }

    #[test]
    fn fresnel_schlick_hits_f0_at_normal_incidence_and_one_at_grazing() {
        assert!((fresnel_schlick(1.0, 0.04) - 0.04).abs() < 1e-6);
        assert!((fresnel_schlick(0.0, 0.04) - 1.0).abs() < 1e-6);
    }
}
