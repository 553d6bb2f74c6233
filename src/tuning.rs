//! Data-driven game balance
//!
//! Every gameplay constant lives here and is fixed at startup; the sim
//! never reaches for globals mid-round. Serializable so a balance pass
//! can be captured or replayed as JSON.

use serde::{Deserialize, Serialize};

use crate::consts;

/// Gameplay constants, fixed at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tuning {
    // === World ===
    /// Screen width in logical pixels
    pub screen_w: f32,
    /// Screen height in logical pixels; ground level in y-down coords
    pub screen_h: f32,
    /// Gravity in pixels/s², positive = downward
    pub gravity: f32,

    // === Bodies ===
    /// Gorilla collision radius
    pub gorilla_radius: f32,
    /// Bullet half-extent (AABB) and render radius
    pub bullet_radius: f32,

    // === Firing ===
    /// Launch speed = power * this factor (pixels/s per power unit)
    pub bullet_speed_factor: f32,
    /// Bullet spawn distance from the gorilla center along the aim
    pub muzzle_offset: f32,
    /// Seconds after firing during which the bullet ignores the firer
    /// and the firer's building
    pub immunity_secs: f32,

    // === Aiming ===
    /// Power bounds
    pub power_min: f32,
    pub power_max: f32,
    /// Base angle rate while holding, degrees/s
    pub angle_rate: f32,
    /// Base power rate while holding, units/s
    pub power_rate: f32,
    /// Rate multiplier cap for a held key
    pub hold_accel_max: f32,
    /// Seconds of holding to reach the multiplier cap
    pub hold_accel_ramp: f32,
    /// Fresh-round aim angle per player (degrees; left faces right)
    pub default_angles: [f32; 2],
    /// Fresh-round power
    pub default_power: f32,

    // === Destruction ===
    /// Crater radius for building and self-hit explosions
    pub crater_radius: f32,
    /// Crater radius for ground impacts
    pub ground_crater_radius: f32,

    // === Skyline generation ===
    /// Building height bounds (rooftop distance from the ground)
    pub building_height_min: f32,
    pub building_height_max: f32,
    /// Building widths are base + step * roll(0..=steps)
    pub building_width_base: f32,
    pub building_width_step: f32,
    pub building_width_steps: u32,
    /// Gap between adjacent buildings
    pub building_gap: f32,
    /// Chance for a window to start lit
    pub window_lit_chance: f64,

    // === Round flow ===
    /// Seconds between round over and the next round
    pub reset_delay: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            screen_w: consts::SCREEN_W,
            screen_h: consts::SCREEN_H,
            gravity: 400.0,

            gorilla_radius: 14.0,
            bullet_radius: 5.0,

            bullet_speed_factor: 6.5,
            muzzle_offset: 24.0,
            immunity_secs: 0.25,

            power_min: 10.0,
            power_max: 100.0,
            angle_rate: 30.0,
            power_rate: 25.0,
            hold_accel_max: 5.0,
            hold_accel_ramp: 1.2,
            default_angles: [60.0, 120.0],
            default_power: 50.0,

            crater_radius: 22.0,
            ground_crater_radius: 12.0,

            building_height_min: 150.0,
            building_height_max: 420.0,
            building_width_base: 50.0,
            building_width_step: 10.0,
            building_width_steps: 4,
            building_gap: 2.0,
            window_lit_chance: 0.6,

            reset_delay: 3.0,
        }
    }
}

impl Tuning {
    /// Widest building the generator can roll, gap included
    pub fn max_building_span(&self) -> f32 {
        self.building_width_base + self.building_width_step * self.building_width_steps as f32
            + self.building_gap
    }

    /// Launch speed for a power value
    #[inline]
    pub fn launch_speed(&self, power: f32) -> f32 {
        power * self.bullet_speed_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_sane() {
        let t = Tuning::default();
        assert!(t.power_min < t.power_max);
        assert!(t.building_height_min < t.building_height_max);
        assert!(t.building_height_max < t.screen_h);
        assert!(t.hold_accel_max >= 1.0);
        assert!(t.muzzle_offset > t.gorilla_radius);
        assert!(t.crater_radius > t.bullet_radius);
    }

    #[test]
    fn test_launch_speed_scales_with_power() {
        let t = Tuning::default();
        assert!(t.launch_speed(t.power_max) > t.launch_speed(t.power_min));
        assert_eq!(t.launch_speed(10.0), 10.0 * t.bullet_speed_factor);
    }

    #[test]
    fn test_tuning_roundtrip_json() {
        let t = Tuning::default();
        let json = serde_json::to_string(&t).unwrap();
        let back: Tuning = serde_json::from_str(&json).unwrap();
        assert_eq!(back.gravity, t.gravity);
        assert_eq!(back.default_angles, t.default_angles);
    }
}
