use glam::Vec3;

use crate::env::EnvironmentMap;
use crate::march::Hit;
use crate::math::{fresnel_schlick, reflect, refract};
use crate::panel::ParamSnapshot;

const TRANSMISSION_IOR: f32 = 1.5;

/// Blinn-Phong local term plus an environment blend. With no environment
/// loaded the reflective and transmitted contributions are zero and the
/// purely local-lit color passes through unchanged.
pub fn shade(
    hit: &Hit,
    view_dir: Vec3,
    params: &ParamSnapshot,
    env: Option<&EnvironmentMap>,
) -> Vec3 {
    let normal = hit.normal;
    let light_dir = params.light_dir;

    let diffuse = normal.dot(light_dir).max(0.0) * params.diff_intensity;
    let half = (light_dir - view_dir).normalize_or_zero();
    let specular =
        normal.dot(half).max(0.0).powf(params.shininess) * params.spec_intensity;
    let ambient = params.ambient_intensity;
    let mut color = params.light_color * (diffuse + specular + ambient);

    if let Some(env) = env {
        let cos_view = normal.dot(-view_dir).clamp(0.0, 1.0);

        let f0 = 0.04 + ((1.0 - 0.04) * params.metalness);
        let fresnel = fresnel_schlick(cos_view, f0);
        let weight =
            (fresnel * (1.0 - params.roughness) * params.env_map_intensity).clamp(0.0, 1.0);

        let reflected = env.sample(reflect(view_dir, normal));
        let transmitted = match refract(view_dir, normal, 1.0 / TRANSMISSION_IOR) {
            Some(direction) => env.sample(direction),
            None => reflected,
        };
        let env_term = reflected.lerp(transmitted, params.transmission);
        color = color.lerp(env_term, weight);

        let coat = fresnel_schlick(cos_view, 0.04)
            * params.clearcoat
            * (1.0 - params.clearcoat_roughness);
        color += reflected * coat;
    }

    color
}

/// Rays that never reach the field shade as the flat clear color.
pub fn shade_miss(params: &ParamSnapshot) -> Vec3 {
    params.clear_color
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::ParamPanel;

    fn test_hit(normal: Vec3) -> Hit {
        Hit {
            t: 1.0,
            point: Vec3::new(0.0, 0.5, 0.0),
            normal,
            material: 0,
            steps: 12,
        }
    }

    fn solid_env(color: Vec3) -> EnvironmentMap {
        let mut img = image::Rgb32FImage::new(4, 2);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb([color.x, color.y, color.z]);
        }
        EnvironmentMap::from_image(img)
    }

    fn hemisphere_env(top: Vec3, bottom: Vec3) -> EnvironmentMap {
        let mut img = image::Rgb32FImage::new(4, 2);
        for (_, y, pixel) in img.enumerate_pixels_mut() {
            let c = if y == 0 { top } else { bottom };
            *pixel = image::Rgb([c.x, c.y, c.z]);
        }
        EnvironmentMap::from_image(img)
    }

    #[test]
    fn missing_environment_leaves_the_local_lit_color_untouched() {
        let mut panel = ParamPanel::new();
        panel.set("envMapIntensity", 1.0).unwrap();
        let params = panel.snapshot();
        let hit = test_hit(Vec3::Y);
        let view = Vec3::new(0.0, -0.5, -1.0).normalize();

        let color = shade(&hit, view, &params, None);

        let diffuse = Vec3::Y.dot(params.light_dir).max(0.0) * params.diff_intensity;
        let half = (params.light_dir - view).normalize();
        let specular = Vec3::Y.dot(half).max(0.0).powf(params.shininess) * params.spec_intensity;
        let expected =
            params.light_color * (diffuse + specular + params.ambient_intensity);

        assert!((color - expected).length() < 1e-5);
        assert!(color.is_finite());
    }

    #[test]
    fn environment_reflection_brightens_a_metal_surface() {
        let env = solid_env(Vec3::splat(4.0));
        let mut panel = ParamPanel::new();
        panel.set("metalness", 1.0).unwrap();
        panel.set("roughness", 0.0).unwrap();
        panel.set("diffIntensity", 0.0).unwrap();
        panel.set("specIntensity", 0.0).unwrap();
        panel.set("ambientIntensity", 0.0).unwrap();
        let params = panel.snapshot();
        let hit = test_hit(Vec3::Y);
        let view = Vec3::new(0.0, -1.0, 0.0);

        let without = shade(&hit, view, &params, None);
        let with = shade(&hit, view, &params, Some(&env));
        assert!(with.length() > without.length());
    }

    #[test]
    fn transmission_pulls_the_environment_term_toward_the_refracted_sample() {
        // Top half bright, bottom half dark: reflection and refraction of a
        // downward view then sample different hemispheres.
        let env = hemisphere_env(Vec3::splat(2.0), Vec3::ZERO);
        let mut panel = ParamPanel::new();
        panel.set("metalness", 1.0).unwrap();
        panel.set("roughness", 0.0).unwrap();
        panel.set("diffIntensity", 0.0).unwrap();
        panel.set("specIntensity", 0.0).unwrap();
        panel.set("ambientIntensity", 0.0).unwrap();
        let hit = test_hit(Vec3::Y);
        let view = Vec3::new(0.6, -0.8, 0.0).normalize();

        panel.set("transmission", 0.0).unwrap();
        let reflective = shade(&hit, view, &panel.snapshot(), Some(&env));
        panel.set("transmission", 1.0).unwrap();
        let transmissive = shade(&hit, view, &panel.snapshot(), Some(&env));

        assert!(transmissive.length() < reflective.length());
    }

    #[test]
    fn clearcoat_adds_a_secondary_lobe() {
        let env = solid_env(Vec3::ONE);
        let mut panel = ParamPanel::new();
        panel.set("envMapIntensity", 0.0).unwrap();
        let hit = test_hit(Vec3::Y);
        let view = Vec3::new(0.9, -0.4, 0.0).normalize();

        panel.set("clearcoat", 0.0).unwrap();
        let bare = shade(&hit, view, &panel.snapshot(), Some(&env));
        panel.set("clearcoat", 1.0).unwrap();
        let coated = shade(&hit, view, &panel.snapshot(), Some(&env));

        assert!(coated.length() > bare.length());
    }

    #[test]
    fn miss_shading_is_the_flat_clear_color() {
        let params = ParamPanel::new().snapshot();
        assert_eq!(shade_miss(&params), params.clear_color);
    }
}
