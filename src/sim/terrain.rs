//! Skyline terrain: buildings, craters, destruction queries
//!
//! The skyline is regenerated from a seeded RNG every round. Craters
//! are plain circles recorded against the skyline; a world point is
//! destroyed iff it falls inside any crater.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts;
use crate::tuning::Tuning;

/// One building in the skyline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    /// Left edge
    pub x: f32,
    pub width: f32,
    /// Rooftop y (y-down; smaller = taller)
    pub top: f32,
    /// Palette index for the renderer
    pub color: u32,
    /// Lit-window grid, row-major from the top-left corner
    pub window_cols: u32,
    pub window_rows: u32,
    pub windows_lit: u64,
}

impl Building {
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        self.x + self.width * 0.5
    }

    #[inline]
    pub fn contains_x(&self, x: f32) -> bool {
        x >= self.x && x < self.right()
    }

    /// Toggle one window bit; out-of-range indices are ignored
    pub fn toggle_window(&mut self, index: u32) {
        let count = self.window_cols * self.window_rows;
        if index < count && index < MAX_WINDOW_BITS {
            self.windows_lit ^= 1 << index;
        }
    }
}

/// A blast hole punched out of the skyline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Crater {
    pub pos: Vec2,
    pub radius: f32,
}

/// The destructible skyline for the current round
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Terrain {
    pub buildings: Vec<Building>,
    pub craters: Vec<Crater>,
}

impl Terrain {
    /// Build a fresh skyline from a seeded RNG
    pub fn generate(rng: &mut Pcg32, tuning: &Tuning) -> Self {
        let mut terrain = Terrain::default();
        terrain.regenerate(rng, tuning);
        terrain
    }

    /// Replace the skyline and drop all craters
    pub fn regenerate(&mut self, rng: &mut Pcg32, tuning: &Tuning) {
        self.clear_craters();
        self.buildings.clear();

        let mut x = 0.0;
        while x < tuning.screen_w {
            let steps = rng.random_range(0..=tuning.building_width_steps);
            let width = tuning.building_width_base + tuning.building_width_step * steps as f32;
            let height =
                rng.random_range(tuning.building_height_min..tuning.building_height_max);
            let top = tuning.screen_h - height;
            let color = rng.random_range(0..consts::BUILDING_PALETTE);

            let window_cols =
                (((width - 2.0 * WINDOW_MARGIN) / WINDOW_STRIDE) as u32).max(1);
            let window_rows = (((height - WINDOW_MARGIN) / WINDOW_STRIDE) as u32)
                .max(1)
                .min(MAX_WINDOW_BITS / window_cols);
            let mut windows_lit: u64 = 0;
            for bit in 0..(window_cols * window_rows) {
                if rng.random_bool(tuning.window_lit_chance) {
                    windows_lit |= 1 << bit;
                }
            }

            self.buildings.push(Building {
                x,
                width,
                top,
                color,
                window_cols,
                window_rows,
                windows_lit,
            });
            x += width + tuning.building_gap;
        }

        log::info!("Generated skyline with {} buildings", self.buildings.len());
    }

    /// Explicit crater reset; round transitions call this, nothing else
    pub fn clear_craters(&mut self) {
        self.craters.clear();
    }

    pub fn add_crater(&mut self, pos: Vec2, radius: f32) {
        self.craters.push(Crater { pos, radius });
    }

    /// Whether a world point has been blown away by any crater
    pub fn is_destroyed(&self, point: Vec2) -> bool {
        self.craters
            .iter()
            .any(|c| c.pos.distance_squared(point) < c.radius * c.radius)
    }

    /// Index of the building whose x-span contains `x`
    pub fn building_at(&self, x: f32) -> Option<usize> {
        self.buildings.iter().position(|b| b.contains_x(x))
    }

    /// Building a gorilla is standing on: x within the span, center
    /// within `slop` of the rooftop. Used to grant launch immunity.
    pub fn firing_building(&self, pos: Vec2, slop: f32) -> Option<usize> {
        self.buildings
            .iter()
            .position(|b| b.contains_x(pos.x) && (pos.y - b.top).abs() <= slop)
    }

    /// Rooftop positions for both gorillas: second building from each
    /// edge, pulled inward deterministically when the skyline is short.
    pub fn gorilla_positions(&self, gorilla_radius: f32) -> [Vec2; 2] {
        let n = self.buildings.len();
        let (left, right) = match n {
            0 => return [Vec2::ZERO; 2],
            1 => (0, 0),
            2 | 3 => (0, n - 1),
            _ => (1, n - 2),
        };
        let place = |idx: usize| {
            let b = &self.buildings[idx];
            Vec2::new(b.center_x(), b.top - gorilla_radius)
        };
        [place(left), place(right)]
    }
}

/// Window grid cell pitch in pixels, measured from the rooftop
pub const WINDOW_STRIDE: f32 = 16.0;
/// Inset from the building edges before the first window
pub const WINDOW_MARGIN: f32 = 6.0;
/// Windows per building cap; the lit set is a u64 bitmask
pub const MAX_WINDOW_BITS: u32 = 64;
