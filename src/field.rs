use std::f32::consts::TAU;

use glam::{Vec2, Vec3};

use crate::math::{smooth_min, value_noise};
use crate::panel::ParamSnapshot;

#[derive(Clone, Copy, Debug)]
pub struct FieldSample {
    pub distance: f32,
    /// Index of the nearest sphere before blending.
    pub material: u32,
}

/// The implicit scene: a ring of orbiting spheres merged by a polynomial
/// smooth minimum, with an animated value-noise warp applied to the query
/// point. Pure with respect to (point, time, params).
#[derive(Clone, Copy)]
pub struct SceneField<'a> {
    pub params: &'a ParamSnapshot,
    pub time: f32,
}

// Finite stand-in for "no sphere folded in yet": infinity would turn the
// first smooth-min fold into inf * 0 = NaN.
const FAR_SENTINEL: f32 = 1e30;

impl<'a> SceneField<'a> {
    pub fn new(params: &'a ParamSnapshot, time: f32) -> Self {
        Self { params, time }
    }

    /// Center of sphere `index`, orbiting the scene origin in the XZ plane.
    pub fn sphere_center(&self, index: u32) -> Vec3 {
        let count = self.params.sphere_count.max(1);
        let phase = (index % count) as f32 * (TAU / count as f32);
        let angle = phase + (self.params.sphere_speed * self.time);
        Vec3::new(
            angle.cos() * self.params.orbit_distance,
            0.0,
            angle.sin() * self.params.orbit_distance,
        )
    }

    /// Global domain distortion: the same warped point feeds every sphere.
    fn warp(&self, p: Vec3) -> Vec3 {
        let params = self.params;
        if params.noise_amp_a == 0.0 && params.noise_amp_b == 0.0 {
            return p;
        }
        let shift = self.time * params.noise_time_mult;
        let xy = Vec2::new(p.x, p.y);
        let yx = Vec2::new(p.y, p.x);
        let dx = value_noise((xy * params.noise_freq_a) + Vec2::splat(shift));
        let dy = value_noise((yx * params.noise_freq_b) - Vec2::splat(shift));
        Vec3::new(
            p.x + (dx * params.noise_amp_a),
            p.y + (dy * params.noise_amp_b),
            p.z,
        )
    }

    pub fn sample(&self, p: Vec3) -> FieldSample {
        let params = self.params;
        let warped = self.warp(p);

        let mut blended = FAR_SENTINEL;
        let mut nearest = FAR_SENTINEL;
        let mut material = 0u32;
        for index in 0..params.sphere_count {
            let center = self.sphere_center(index);
            let d = (warped - center).length() - params.sphere_radius;
            blended = smooth_min(blended, d, params.smoothing);
            if d < nearest {
                nearest = d;
                material = index;
            }
        }

        FieldSample {
            distance: blended,
            material,
        }
    }

    pub fn distance(&self, p: Vec3) -> f32 {
        self.sample(p).distance
    }
}
