// src/config.rs
//
// Vehicle tuning. Everything is a flat named constant supplied at construction
// time; `validate()` is the only way to get a `ValidatedConfig`, which is the
// only thing the simulation accepts.

use std::collections::HashSet;
use std::ops::Deref;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::slide_core::curve::ResponseCurve;
use crate::slide_core::types::Vec3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WheelMount {
    pub id: String,          // "FL", "FR", "RL", "RR"
    pub offset: [f32; 3],    // mount point, chassis local space
    /// Suspension axis, pointing away from the ground. The probe is cast
    /// along `-up` and the spring pushes along `+up`.
    #[serde(default = "default_up")]
    pub up: [f32; 3],
}

fn default_up() -> [f32; 3] {
    [0.0, 1.0, 0.0]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    // --- Suspension ---
    pub spring_stiffness: f32,  // N at full compression
    pub damper_stiffness: f32,  // N per m/s
    pub rest_length: f32,       // m
    pub spring_travel: f32,     // m
    pub wheel_radius: f32,      // m

    // --- Drive (ground) ---
    pub acceleration: f32,      // m/s²
    pub deceleration: f32,      // m/s²
    pub max_speed: f32,         // m/s
    pub steer_strength: f32,    // rad/s²
    pub turning_curve: ResponseCurve,
    pub drag_coefficient: f32,  // 1/s, lateral bleed
    pub min_skid_side_velocity: f32, // m/s
    pub ground_linear_drag: f32,

    // --- Drive (hover) ---
    pub hover_steer_strength: f32,
    pub hover_linear_drag: f32,
    pub power_boost_acceleration: f32, // m/s²
    pub boost_realign_charge_threshold: f32, // 0..1

    // --- Power slide energy ---
    pub wheel_static_buildup_speed: f32, // per second, scaled by skid ratio
    pub power_boost_charge_speed: f32,   // buildup -> boost, per second
    pub power_boost_deplete_speed: f32,  // per second while grounded

    // --- Chassis geometry ---
    pub mass: f32,                      // kg
    pub angular_drag: f32,              // rotational damping on the body
    pub chassis_half_extents: [f32; 3], // [hx, hy, hz] meters
    pub acceleration_point: [f32; 3],   // local; deliberately off the COM
    pub wheels: Vec<WheelMount>,

    // --- Visual only ---
    pub max_steering_angle_deg: f32,
}

/// The "skiff": a light four-point hover sled with a loose back end.
pub fn skiff() -> VehicleConfig {
    let wheel = |id: &str, x: f32, z: f32| WheelMount {
        id: id.to_string(),
        offset: [x, -0.2, z],
        up: default_up(),
    };

    VehicleConfig {
        spring_stiffness: 5000.0,
        damper_stiffness: 800.0,    // ≈ 2·sqrt(k·m)·0.2
        rest_length: 0.5,
        spring_travel: 0.3,
        wheel_radius: 0.35,

        acceleration: 25.0,
        deceleration: 10.0,
        max_speed: 100.0,
        steer_strength: 15.0,
        turning_curve: ResponseCurve::from_pairs(&[
            (0.0, 0.0),
            (0.05, 0.5),
            (0.25, 0.9),
            (1.0, 1.0),
        ]),
        drag_coefficient: 1.0,
        min_skid_side_velocity: 10.0,
        ground_linear_drag: 0.1,

        hover_steer_strength: 25.0,
        hover_linear_drag: 0.02,
        power_boost_acceleration: 10.0,
        boost_realign_charge_threshold: 0.15,

        wheel_static_buildup_speed: 2.0,
        power_boost_charge_speed: 0.5,
        power_boost_deplete_speed: 0.5,

        mass: 800.0,
        angular_drag: 1.0,
        chassis_half_extents: [0.9, 0.3, 1.6],
        acceleration_point: [0.0, -0.35, -0.4],
        wheels: vec![
            wheel("FL", -0.8, 1.3),
            wheel("FR", 0.8, 1.3),
            wheel("RL", -0.8, -1.3),
            wheel("RR", 0.8, -1.3),
        ],

        max_steering_angle_deg: 30.0,
    }
}

impl Default for VehicleConfig {
    fn default() -> Self {
        skiff()
    }
}

/// Normalized wheel mount, ready for the suspension stage.
#[derive(Debug, Clone)]
pub struct WheelSpec {
    pub id: String,
    pub offset: Vec3,
    pub up: Vec3,
}

/// A `VehicleConfig` that passed `validate()`.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    raw: VehicleConfig,
    wheels: Vec<WheelSpec>,
    acceleration_point: Vec3,
}

impl Deref for ValidatedConfig {
    type Target = VehicleConfig;

    fn deref(&self) -> &VehicleConfig {
        &self.raw
    }
}

impl ValidatedConfig {
    pub fn wheels(&self) -> &[WheelSpec] {
        &self.wheels
    }

    pub fn wheel_count(&self) -> usize {
        self.wheels.len()
    }

    pub fn acceleration_point(&self) -> Vec3 {
        self.acceleration_point
    }

    /// Probe length: rest + travel + radius.
    pub fn probe_length(&self) -> f32 {
        self.raw.rest_length + self.raw.spring_travel + self.raw.wheel_radius
    }
}

fn finite(field: &'static str, v: f32) -> Result<f32, ConfigError> {
    if v.is_finite() { Ok(v) } else { Err(ConfigError::NotFinite { field }) }
}

fn positive(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if finite(field, v)? > 0.0 { Ok(()) } else { Err(ConfigError::NonPositive { field, value: v }) }
}

fn non_negative(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if finite(field, v)? >= 0.0 { Ok(()) } else { Err(ConfigError::Negative { field, value: v }) }
}

fn unit(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&finite(field, v)?) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { field, value: v })
    }
}

fn vec3(field: &'static str, v: [f32; 3]) -> Result<Vec3, ConfigError> {
    Ok(Vec3::new(finite(field, v[0])?, finite(field, v[1])?, finite(field, v[2])?))
}

impl VehicleConfig {
    /// Read a TOML file; missing fields fall back to the `skiff()` preset.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        positive("max_speed", self.max_speed)?;
        positive("spring_travel", self.spring_travel)?;
        positive("wheel_radius", self.wheel_radius)?;
        positive("mass", self.mass)?;
        non_negative("rest_length", self.rest_length)?;

        non_negative("spring_stiffness", self.spring_stiffness)?;
        non_negative("damper_stiffness", self.damper_stiffness)?;
        non_negative("acceleration", self.acceleration)?;
        non_negative("deceleration", self.deceleration)?;
        non_negative("steer_strength", self.steer_strength)?;
        non_negative("hover_steer_strength", self.hover_steer_strength)?;
        non_negative("drag_coefficient", self.drag_coefficient)?;
        non_negative("min_skid_side_velocity", self.min_skid_side_velocity)?;
        non_negative("ground_linear_drag", self.ground_linear_drag)?;
        non_negative("hover_linear_drag", self.hover_linear_drag)?;
        non_negative("angular_drag", self.angular_drag)?;
        non_negative("power_boost_acceleration", self.power_boost_acceleration)?;
        non_negative("wheel_static_buildup_speed", self.wheel_static_buildup_speed)?;
        non_negative("power_boost_charge_speed", self.power_boost_charge_speed)?;
        non_negative("power_boost_deplete_speed", self.power_boost_deplete_speed)?;
        non_negative("max_steering_angle_deg", self.max_steering_angle_deg)?;
        unit("boost_realign_charge_threshold", self.boost_realign_charge_threshold)?;

        for (i, &h) in self.chassis_half_extents.iter().enumerate() {
            const NAMES: [&str; 3] = ["chassis_half_extents.x", "chassis_half_extents.y", "chassis_half_extents.z"];
            positive(NAMES[i], h)?;
        }

        self.turning_curve.validate()?;

        if self.wheels.is_empty() {
            return Err(ConfigError::NoWheels);
        }

        let mut seen = HashSet::new();
        let mut wheels = Vec::with_capacity(self.wheels.len());
        for mount in &self.wheels {
            if !seen.insert(mount.id.as_str()) {
                return Err(ConfigError::DuplicateWheel { id: mount.id.clone() });
            }

            let offset = vec3("wheels.offset", mount.offset)?;
            let up = vec3("wheels.up", mount.up)?;
            let Some(up) = up.try_normalize(1e-6) else {
                return Err(ConfigError::ZeroLengthAxis { wheel: mount.id.clone() });
            };

            wheels.push(WheelSpec { id: mount.id.clone(), offset, up });
        }

        let acceleration_point = vec3("acceleration_point", self.acceleration_point)?;

        Ok(ValidatedConfig { raw: self, wheels, acceleration_point })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_validates() {
        let cfg = skiff().validate().expect("preset must be valid");
        assert_eq!(cfg.wheel_count(), 4);
        assert!((cfg.probe_length() - 1.15).abs() < 1e-6);
    }

    #[test]
    fn zero_max_speed_fails_fast() {
        let cfg = VehicleConfig { max_speed: 0.0, ..skiff() };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NonPositive { field: "max_speed", .. })
        ));
    }

    #[test]
    fn rejects_bad_wheels() {
        let cfg = VehicleConfig { wheels: vec![], ..skiff() };
        assert!(matches!(cfg.validate(), Err(ConfigError::NoWheels)));

        let mut cfg = skiff();
        cfg.wheels[1].id = "FL".into();
        assert!(matches!(cfg.validate(), Err(ConfigError::DuplicateWheel { .. })));

        let mut cfg = skiff();
        cfg.wheels[2].up = [0.0, 0.0, 0.0];
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroLengthAxis { .. })));
    }

    #[test]
    fn rejects_threshold_outside_unit_range() {
        let cfg = VehicleConfig { boost_realign_charge_threshold: 1.5, ..skiff() };
        assert!(matches!(cfg.validate(), Err(ConfigError::OutOfUnitRange { .. })));

        let cfg = VehicleConfig { damper_stiffness: f32::NAN, ..skiff() };
        assert!(matches!(cfg.validate(), Err(ConfigError::NotFinite { field: "damper_stiffness" })));
    }

    #[test]
    fn toml_overrides_fall_back_to_preset() {
        let cfg: VehicleConfig = toml::from_str(
            r#"
            max_speed = 60.0
            turning_curve = [{ time = 0.0, value = 0.2 }, { time = 1.0, value = 1.0 }]

            [[wheels]]
            id = "L"
            offset = [-0.5, -0.2, 0.0]

            [[wheels]]
            id = "R"
            offset = [0.5, -0.2, 0.0]
            "#,
        )
        .expect("parse");

        assert_eq!(cfg.max_speed, 60.0);
        assert_eq!(cfg.acceleration, skiff().acceleration);
        assert_eq!(cfg.wheels.len(), 2);
        assert_eq!(cfg.wheels[0].up, [0.0, 1.0, 0.0]);

        let cfg = cfg.validate().expect("valid");
        assert_eq!(cfg.turning_curve.evaluate(0.0), 0.2);
    }

    fn temp_toml(name: &str, body: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("hoverslide-{}-{}.toml", std::process::id(), name));
        std::fs::write(&path, body).expect("write temp config");
        path
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("hoverslide-does-not-exist.toml");
        let err = VehicleConfig::load_from_file(&path).expect_err("missing file");

        assert!(matches!(err, ConfigError::Io(ref p, _) if *p == path));
        assert!(err.to_string().starts_with("failed to read"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn load_wrong_type_is_parse_error() {
        let path = temp_toml("bad-type", "max_speed = \"fast\"\n");
        let err = VehicleConfig::load_from_file(&path).expect_err("bad type");
        let _ = std::fs::remove_file(&path);

        assert!(matches!(err, ConfigError::Parse(..)));
        assert!(err.to_string().starts_with("failed to parse"));
    }

    #[test]
    fn load_file_overrides_subset() {
        let path = temp_toml("override", "max_speed = 42.0\nhover_linear_drag = 0.05\n");
        let cfg = VehicleConfig::load_from_file(&path).expect("loads");
        let _ = std::fs::remove_file(&path);

        assert_eq!(cfg.max_speed, 42.0);
        assert_eq!(cfg.hover_linear_drag, 0.05);
        assert_eq!(cfg.spring_stiffness, skiff().spring_stiffness);
        assert_eq!(cfg.wheels.len(), 4);
        assert!(cfg.validate().is_ok());
    }
}
