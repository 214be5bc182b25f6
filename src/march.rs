use glam::Vec3;

use crate::field::SceneField;
use crate::math::Ray;

#[derive(Clone, Copy, Debug)]
pub struct Hit {
    pub t: f32,
    pub point: Vec3,
    pub normal: Vec3,
    pub material: u32,
    pub steps: u32,
}

/// Sphere tracing: advance by the field's reported distance until the ray is
/// within eps of the surface, overruns the travel budget, or runs out of
/// steps. A ray that starts inside the surface hits immediately at t = 0.
pub fn march(ray: Ray, field: SceneField<'_>) -> Option<Hit> {
    let params = field.params;
    let mut t = 0.0f32;
    for step in 0..params.max_steps {
        if t > params.max_distance {
            return None;
        }

        let p = ray.at(t);
        let sample = field.sample(p);
        if sample.distance < params.eps {
            return Some(Hit {
                t,
                point: p,
                normal: estimate_normal(field, p),
                material: sample.material,
                steps: step,
            });
        }

        t += sample.distance;
    }
    None
}

/// Central-difference gradient of the field, normalized. Perturbation uses
/// the hit epsilon so the estimate tracks the domain warp without analytic
/// derivatives.
pub fn estimate_normal(field: SceneField<'_>, p: Vec3) -> Vec3 {
    let e = field.params.eps;
    let dx = field.distance(p + (Vec3::X * e)) - field.distance(p - (Vec3::X * e));
    let dy = field.distance(p + (Vec3::Y * e)) - field.distance(p - (Vec3::Y * e));
    let dz = field.distance(p + (Vec3::Z * e)) - field.distance(p - (Vec3::Z * e));
    Vec3::new(dx, dy, dz).normalize_or_zero()
}
