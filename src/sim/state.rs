//! Game state and core simulation types
//!
//! Everything needed for determinism lives here and serializes cleanly;
//! RNG is derived from plain seeds, never stored live.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::terrain::Terrain;
use crate::tuning::Tuning;
use crate::{aim_direction, consts};

/// Current phase of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Active player adjusts angle/power and may fire
    Aiming,
    /// Bullet in flight; aim input is ignored
    Firing,
    /// Somebody died; waiting on the reset timer
    RoundOver { winner: usize },
}

/// One gorilla on a rooftop
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Gorilla {
    pub pos: Vec2,
    pub radius: f32,
    pub health: f32,
}

impl Gorilla {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            radius,
            health: FULL_HEALTH,
        }
    }

    #[inline]
    pub fn alive(&self) -> bool {
        self.health > 0.0
    }

    /// Subtract damage, clamping at zero
    pub fn apply_damage(&mut self, damage: f32) {
        self.health = (self.health - damage).max(0.0);
    }
}

/// The one bullet that may be in flight
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bullet {
    pub pos: Vec2,
    pub vel: Vec2,
    /// AABB half-extent
    pub radius: f32,
    /// Seconds since launch; drives the firing-immunity window
    pub age: f32,
    /// Player index that fired it
    pub owner: usize,
    /// Building under the firer at launch, immune while the bullet is young
    pub immune_building: Option<usize>,
}

impl Bullet {
    /// Spawn at the muzzle, velocity along the aim
    pub fn launch(
        owner: usize,
        gorilla_pos: Vec2,
        angle_deg: f32,
        power: f32,
        tuning: &Tuning,
        immune_building: Option<usize>,
    ) -> Self {
        let dir = aim_direction(angle_deg);
        Self {
            pos: gorilla_pos + dir * tuning.muzzle_offset,
            vel: dir * tuning.launch_speed(power),
            radius: tuning.bullet_radius,
            age: 0.0,
            owner,
            immune_building,
        }
    }

    /// Still inside the launch-immunity window?
    #[inline]
    pub fn is_immune(&self, tuning: &Tuning) -> bool {
        self.age < tuning.immunity_secs
    }
}

/// Per-seat aim and session tallies
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Player {
    /// Aim angle in degrees, wraps over [0, 360)
    pub aim_angle: f32,
    /// Launch power, clamped to the tuning range
    pub power: f32,
    /// Rounds won this session
    pub score: u32,
    /// Shots fired this session
    pub shots: u32,
}

/// Hold durations for the four aim keys; a held key ramps its rate
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HoldRamp {
    pub angle_up: f32,
    pub angle_down: f32,
    pub power_up: f32,
    pub power_down: f32,
}

impl HoldRamp {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Short-lived explosion visual (not gameplay-affecting)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExplosionFx {
    pub pos: Vec2,
    pub radius: f32,
    pub age: f32,
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Session seed; each round derives its own skyline seed from it
    pub seed: u64,
    /// Gameplay constants, fixed at startup
    pub tuning: Tuning,
    /// Rounds started this session (0-based)
    pub round_index: u32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Seconds of live play this session (excludes round-over waits)
    pub elapsed_secs: f32,
    /// Current phase
    pub phase: RoundPhase,
    /// Whose turn it is (index into players/gorillas)
    pub active_player: usize,
    /// Seats: aim + session tallies
    pub players: [Player; consts::PLAYER_COUNT],
    /// Bodies on the rooftops
    pub gorillas: [Gorilla; consts::PLAYER_COUNT],
    /// The destructible skyline
    pub terrain: Terrain,
    /// At most one bullet, ever
    pub bullet: Option<Bullet>,
    /// Aim-key hold durations for rate ramping
    pub hold: HoldRamp,
    /// Seconds until the next round starts; set once per round over
    pub reset_timer: Option<f32>,
    /// Explosion flash for the renderer
    #[serde(skip)]
    pub explosion: Option<ExplosionFx>,
    /// Screen shake magnitude, decays per tick
    #[serde(skip)]
    pub screen_shake: f32,
}

impl GameState {
    /// Create a new session with the given seed
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        let defaults = tuning.default_angles;
        let default_power = tuning.default_power;
        let mut state = Self {
            seed,
            tuning,
            round_index: 0,
            time_ticks: 0,
            elapsed_secs: 0.0,
            phase: RoundPhase::Aiming,
            active_player: 0,
            players: defaults.map(|angle| Player {
                aim_angle: angle,
                power: default_power,
                score: 0,
                shots: 0,
            }),
            gorillas: [Gorilla::new(Vec2::ZERO, 0.0); consts::PLAYER_COUNT],
            terrain: Terrain::default(),
            bullet: None,
            hold: HoldRamp::default(),
            reset_timer: None,
            explosion: None,
            screen_shake: 0.0,
        };
        state.start_round(0);
        state
    }

    /// RNG for the current round's skyline, derived from the session seed
    pub fn round_rng(&self) -> Pcg32 {
        let mixed = (self.round_index as u64)
            .wrapping_mul(2654435761)
            .wrapping_add(self.seed);
        Pcg32::seed_from_u64(mixed)
    }

    /// Begin a round: fresh skyline, fresh bodies, default aim.
    /// Scores, shot counts and elapsed time carry over.
    pub fn start_round(&mut self, starting_player: usize) {
        let mut rng = self.round_rng();
        self.terrain.regenerate(&mut rng, &self.tuning);
        let positions = self.terrain.gorilla_positions(self.tuning.gorilla_radius);
        for (gorilla, pos) in self.gorillas.iter_mut().zip(positions) {
            *gorilla = Gorilla::new(pos, self.tuning.gorilla_radius);
        }
        for (player, angle) in self.players.iter_mut().zip(self.tuning.default_angles) {
            player.aim_angle = angle;
            player.power = self.tuning.default_power;
        }
        self.bullet = None;
        self.hold.reset();
        self.reset_timer = None;
        self.explosion = None;
        self.active_player = starting_player.min(consts::PLAYER_COUNT - 1);
        self.phase = RoundPhase::Aiming;

        log::info!(
            "Round {} started, player {} aims first",
            self.round_index + 1,
            self.active_player + 1
        );
    }

    /// The other seat
    #[inline]
    pub fn opponent_of(&self, player: usize) -> usize {
        (player + 1) % consts::PLAYER_COUNT
    }

    /// The gorilla belonging to the active player
    pub fn active_gorilla(&self) -> &Gorilla {
        &self.gorillas[self.active_player]
    }

    /// HUD status line for the current phase
    pub fn status_line(&self) -> String {
        match self.phase {
            RoundPhase::Aiming => format!("Player {} aiming", self.active_player + 1),
            RoundPhase::Firing => "Bullet away!".to_string(),
            RoundPhase::RoundOver { winner } => {
                if winner < consts::PLAYER_COUNT {
                    format!("Player {} wins the round!", winner + 1)
                } else {
                    "Round over".to_string()
                }
            }
        }
    }
}

/// Starting health for a fresh gorilla
pub const FULL_HEALTH: f32 = 100.0;
/// Explosion flash lifetime in seconds
pub const EXPLOSION_FX_SECS: f32 = 0.45;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_ready_to_aim() {
        let state = GameState::new(12345);
        assert_eq!(state.phase, RoundPhase::Aiming);
        assert_eq!(state.active_player, 0);
        assert!(state.bullet.is_none());
        assert!(state.reset_timer.is_none());
        assert!(!state.terrain.buildings.is_empty());
        for g in &state.gorillas {
            assert_eq!(g.health, FULL_HEALTH);
            assert!(g.alive());
        }
        assert!(state.gorillas[0].pos.x < state.gorillas[1].pos.x);
    }

    #[test]
    fn test_round_rng_differs_per_round() {
        let mut a = GameState::new(9);
        let skyline_a: Vec<f32> = a.terrain.buildings.iter().map(|b| b.top).collect();
        a.round_index += 1;
        a.start_round(0);
        let skyline_b: Vec<f32> = a.terrain.buildings.iter().map(|b| b.top).collect();
        assert_ne!(skyline_a, skyline_b);
    }

    #[test]
    fn test_start_round_keeps_session_tallies() {
        let mut state = GameState::new(5);
        state.players[0].score = 3;
        state.players[1].shots = 7;
        state.elapsed_secs = 42.0;
        state.terrain.add_crater(Vec2::new(100.0, 500.0), 20.0);
        state.round_index += 1;
        state.start_round(1);
        assert_eq!(state.players[0].score, 3);
        assert_eq!(state.players[1].shots, 7);
        assert_eq!(state.elapsed_secs, 42.0);
        assert_eq!(state.active_player, 1);
        assert!(state.terrain.craters.is_empty());
        assert_eq!(state.players[0].aim_angle, state.tuning.default_angles[0]);
    }

    #[test]
    fn test_damage_clamps_at_zero() {
        let mut g = Gorilla::new(Vec2::ZERO, 14.0);
        g.apply_damage(150.0);
        assert_eq!(g.health, 0.0);
        assert!(!g.alive());
    }

    #[test]
    fn test_bullet_launch_muzzle_and_velocity() {
        let tuning = Tuning::default();
        let origin = Vec2::new(100.0, 300.0);
        let b = Bullet::launch(0, origin, 90.0, 50.0, &tuning, Some(2));
        // Straight up: spawn above the gorilla, velocity pure -y
        assert!((b.pos.x - origin.x).abs() < 1e-4);
        assert!((b.pos.y - (origin.y - tuning.muzzle_offset)).abs() < 1e-4);
        assert!(b.vel.x.abs() < 1e-3);
        assert!((b.vel.y + tuning.launch_speed(50.0)).abs() < 1e-3);
        assert_eq!(b.owner, 0);
        assert_eq!(b.immune_building, Some(2));
        assert!(b.is_immune(&tuning));
    }

    #[test]
    fn test_state_snapshot_roundtrip() {
        let state = GameState::new(77);
        let json = serde_json::to_string(&state).unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.seed, state.seed);
        assert_eq!(back.phase, state.phase);
        assert_eq!(back.terrain.buildings, state.terrain.buildings);
        assert_eq!(back.gorillas[0].pos, state.gorillas[0].pos);
    }
}
