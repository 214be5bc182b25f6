use glam::Vec3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamGroup {
    Noise,
    Lighting,
    Material,
    Spheres,
    March,
}

#[derive(Clone, Copy, Debug)]
pub struct ParamSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub group: ParamGroup,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

pub const PARAM_SPECS: &[ParamSpec] = &[
    ParamSpec {
        name: "sphereCount",
        label: "Sphere count",
        group: ParamGroup::Spheres,
        min: 2.0,
        max: 8.0,
        default: 3.0,
    },
    ParamSpec {
        name: "sphereSpeed",
        label: "Orbit speed",
        group: ParamGroup::Spheres,
        min: 0.0,
        max: 4.0,
        default: 0.6,
    },
    ParamSpec {
        name: "sphereRadius",
        label: "Radius",
        group: ParamGroup::Spheres,
        min: 0.05,
        max: 2.0,
        default: 0.5,
    },
    ParamSpec {
        name: "orbitDistance",
        label: "Orbit distance",
        group: ParamGroup::Spheres,
        min: 0.0,
        max: 4.0,
        default: 0.9,
    },
    ParamSpec {
        name: "smoothing",
        label: "Blend smoothing",
        group: ParamGroup::Spheres,
        min: 0.0001,
        max: 3.0,
        default: 1.0,
    },
    ParamSpec {
        name: "noiseFreqA",
        label: "Frequency A",
        group: ParamGroup::Noise,
        min: 0.0,
        max: 8.0,
        default: 1.6,
    },
    ParamSpec {
        name: "noiseFreqB",
        label: "Frequency B",
        group: ParamGroup::Noise,
        min: 0.0,
        max: 8.0,
        default: 2.3,
    },
    ParamSpec {
        name: "noiseAmpA",
        label: "Amplitude A",
        group: ParamGroup::Noise,
        min: 0.0,
        max: 1.0,
        default: 0.12,
    },
    ParamSpec {
        name: "noiseAmpB",
        label: "Amplitude B",
        group: ParamGroup::Noise,
        min: 0.0,
        max: 1.0,
        default: 0.08,
    },
    ParamSpec {
        name: "noiseTimeMult",
        label: "Time multiplier",
        group: ParamGroup::Noise,
        min: 0.0,
        max: 4.0,
        default: 1.0,
    },
    ParamSpec {
        name: "diffIntensity",
        label: "Diffuse",
        group: ParamGroup::Lighting,
        min: 0.0,
        max: 2.0,
        default: 0.5,
    },
    ParamSpec {
        name: "specIntensity",
        label: "Specular",
        group: ParamGroup::Lighting,
        min: 0.0,
        max: 8.0,
        default: 3.0,
    },
    ParamSpec {
        name: "ambientIntensity",
        label: "Ambient",
        group: ParamGroup::Lighting,
        min: 0.0,
        max: 1.0,
        default: 0.15,
    },
    ParamSpec {
        name: "shininess",
        label: "Shininess",
        group: ParamGroup::Lighting,
        min: 1.0,
        max: 256.0,
        default: 16.0,
    },
    ParamSpec {
        name: "roughness",
        label: "Roughness",
        group: ParamGroup::Material,
        min: 0.0,
        max: 1.0,
        default: 0.35,
    },
    ParamSpec {
        name: "metalness",
        label: "Metalness",
        group: ParamGroup::Material,
        min: 0.0,
        max: 1.0,
        default: 0.1,
    },
    ParamSpec {
        name: "clearcoat",
        label: "Clearcoat",
        group: ParamGroup::Material,
        min: 0.0,
        max: 1.0,
        default: 0.0,
    },
    ParamSpec {
        name: "clearcoatRoughness",
        label: "Clearcoat roughness",
        group: ParamGroup::Material,
        min: 0.0,
        max: 1.0,
        default: 0.2,
    },
    ParamSpec {
        name: "transmission",
        label: "Transmission",
        group: ParamGroup::Material,
        min: 0.0,
        max: 1.0,
        default: 0.0,
    },
    ParamSpec {
        name: "envMapIntensity",
        label: "Environment",
        group: ParamGroup::Material,
        min: 0.0,
        max: 4.0,
        default: 1.0,
    },
    ParamSpec {
        name: "eps",
        label: "Hit epsilon",
        group: ParamGroup::March,
        min: 1e-5,
        max: 0.01,
        default: 0.001,
    },
    ParamSpec {
        name: "maxDistance",
        label: "Max distance",
        group: ParamGroup::March,
        min: 1.0,
        max: 5000.0,
        default: 1000.0,
    },
    ParamSpec {
        name: "maxSteps",
        label: "Max steps",
        group: ParamGroup::March,
        min: 1.0,
        max: 512.0,
        default: 100.0,
    },
];

/// Live panel store. Single writer between frames; the driver reads one
/// snapshot per frame boundary, so no locking is involved.
pub struct ParamPanel {
    values: Vec<f32>,
    pub light_dir: Vec3,
    pub light_color: Vec3,
    pub clear_color: Vec3,
}

impl Default for ParamPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamPanel {
    pub fn new() -> Self {
        Self {
            values: PARAM_SPECS.iter().map(|spec| spec.default).collect(),
            light_dir: Vec3::new(1.0, 1.0, 1.0),
            light_color: Vec3::ONE,
            clear_color: Vec3::new(0.2, 0.6, 0.933),
        }
    }

    pub fn set(&mut self, name: &str, value: f32) -> Result<(), String> {
        if !value.is_finite() {
            return Err(format!("parameter '{name}' must be finite, got {value}"));
        }
        let index = PARAM_SPECS
            .iter()
            .position(|spec| spec.name == name)
            .ok_or_else(|| format!("unknown parameter name: {name}"))?;
        let spec = &PARAM_SPECS[index];
        self.values[index] = value.clamp(spec.min, spec.max);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        PARAM_SPECS
            .iter()
            .position(|spec| spec.name == name)
            .map(|index| self.values[index])
    }

    fn value(&self, name: &str) -> f32 {
        self.get(name).unwrap_or_else(|| {
            unreachable!("parameter '{name}' is declared in PARAM_SPECS");
        })
    }

    /// Copy the live scalars into an immutable per-frame snapshot. Degenerate
    /// values are clamped here so the numerical core never sees them.
    pub fn snapshot(&self) -> ParamSnapshot {
        let light_dir = if self.light_dir.length() < 1e-6 {
            Vec3::ONE.normalize()
        } else {
            self.light_dir.normalize()
        };

        ParamSnapshot {
            sphere_count: (self.value("sphereCount").round() as u32).clamp(2, 8),
            sphere_speed: self.value("sphereSpeed"),
            sphere_radius: self.value("sphereRadius").max(0.001),
            orbit_distance: self.value("orbitDistance"),
            smoothing: self.value("smoothing").max(1e-4),
            noise_freq_a: self.value("noiseFreqA"),
            noise_freq_b: self.value("noiseFreqB"),
            noise_amp_a: self.value("noiseAmpA"),
            noise_amp_b: self.value("noiseAmpB"),
            noise_time_mult: self.value("noiseTimeMult"),
            diff_intensity: self.value("diffIntensity"),
            spec_intensity: self.value("specIntensity"),
            ambient_intensity: self.value("ambientIntensity"),
            shininess: self.value("shininess").max(1.0),
            roughness: self.value("roughness"),
            metalness: self.value("metalness"),
            clearcoat: self.value("clearcoat"),
            clearcoat_roughness: self.value("clearcoatRoughness"),
            transmission: self.value("transmission"),
            env_map_intensity: self.value("envMapIntensity"),
            eps: self.value("eps").max(1e-6),
            max_distance: self.value("maxDistance").max(1e-3),
            max_steps: (self.value("maxSteps").round() as u32).max(1),
            light_dir,
            light_color: self.light_color.max(Vec3::ZERO),
            clear_color: self.clear_color.clamp(Vec3::ZERO, Vec3::ONE),
        }
    }
}

/// Immutable parameter snapshot handed to the field, marcher and shader.
#[derive(Clone, Copy, Debug)]
pub struct ParamSnapshot {
    pub sphere_count: u32,
    pub sphere_speed: f32,
    pub sphere_radius: f32,
    pub orbit_distance: f32,
    pub smoothing: f32,
    pub noise_freq_a: f32,
    pub noise_freq_b: f32,
    pub noise_amp_a: f32,
    pub noise_amp_b: f32,
    pub noise_time_mult: f32,
    pub diff_intensity: f32,
    pub spec_intensity: f32,
    pub ambient_intensity: f32,
    pub shininess: f32,
    pub roughness: f32,
    pub metalness: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    pub transmission: f32,
    pub env_map_intensity: f32,
    pub eps: f32,
    pub max_distance: f32,
    pub max_steps: u32,
    pub light_dir: Vec3,
    pub light_color: Vec3,
    pub clear_color: Vec3,
}

impl ParamSnapshot {
    pub fn defaults() -> Self {
        ParamPanel::new().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_declared_specs() {
        let panel = ParamPanel::new();
        for spec in PARAM_SPECS {
            assert_eq!(panel.get(spec.name), Some(spec.default), "{}", spec.name);
            assert!(spec.min <= spec.default && spec.default <= spec.max);
        }
    }

    #[test]
    fn out_of_range_writes_clamp_to_declared_range() {
        let mut panel = ParamPanel::new();
        panel.set("shininess", 1e6).unwrap();
        assert_eq!(panel.get("shininess"), Some(256.0));
        panel.set("roughness", -3.0).unwrap();
        assert_eq!(panel.get("roughness"), Some(0.0));
    }

    #[test]
    fn unknown_and_non_finite_writes_are_rejected() {
        let mut panel = ParamPanel::new();
        assert!(panel.set("bogus", 1.0).is_err());
        assert!(panel.set("roughness", f32::NAN).is_err());
        assert_eq!(panel.get("roughness"), Some(0.35));
    }

    #[test]
    fn snapshot_clamps_degenerate_values() {
        let mut panel = ParamPanel::new();
        panel.light_dir = Vec3::ZERO;
        let snapshot = panel.snapshot();
        assert!((snapshot.light_dir.length() - 1.0).abs() < 1e-6);
        assert!(snapshot.smoothing > 0.0);
        assert!(snapshot.max_steps >= 1);

        panel.set("sphereCount", 7.6).unwrap();
        assert_eq!(panel.snapshot().sphere_count, 8);
    }

    #[test]
    fn every_group_is_populated() {
        for group in [
            ParamGroup::Noise,
            ParamGroup::Lighting,
            ParamGroup::Material,
            ParamGroup::Spheres,
            ParamGroup::March,
        ] {
            assert!(PARAM_SPECS.iter().any(|spec| spec.group == group));
        }
    }
}
