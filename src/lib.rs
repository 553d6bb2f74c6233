//! Skyline Siege - a two-player artillery duel over a destructible skyline
//!
//! Core modules:
//! - `sim`: Deterministic simulation (ballistics, terrain, round state)
//! - `renderer`: WebGPU rendering pipeline
//! - `tuning`: Data-driven game balance
//! - `settings`: Presentation toggles with LocalStorage persistence

pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for smooth ballistics)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Frame delta clamp; a suspended tab must not tunnel the bullet
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// World dimensions in logical pixels, y-down, ground at y = SCREEN_H
    pub const SCREEN_W: f32 = 800.0;
    pub const SCREEN_H: f32 = 600.0;

    /// Players per round; the sim is written for exactly two
    pub const PLAYER_COUNT: usize = 2;

    /// Building color palette size (palette itself lives in the shader)
    pub const BUILDING_PALETTE: u32 = 4;
}

/// Wrap an angle in degrees to [0, 360)
#[inline]
pub fn wrap_degrees(angle: f32) -> f32 {
    angle.rem_euclid(360.0)
}

/// Unit vector for an aim angle in degrees, y-down screen coordinates.
/// 0° points right, 90° straight up.
#[inline]
pub fn aim_direction(angle_deg: f32) -> Vec2 {
    let rad = angle_deg.to_radians();
    Vec2::new(rad.cos(), -rad.sin())
}
