//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only, derived from the session seed per round
//! - No rendering or platform dependencies

pub mod collision;
pub mod geometry;
pub mod state;
pub mod terrain;
pub mod tick;

pub use collision::{Impact, resolve_bullet_impact};
pub use geometry::{DIRECT_HIT_DAMAGE, circle_intersection_area, explosion_damage};
pub use state::{Bullet, ExplosionFx, FULL_HEALTH, GameState, Gorilla, Player, RoundPhase};
pub use terrain::{Building, Crater, Terrain};
pub use tick::{TickInput, tick};
