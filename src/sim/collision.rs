//! Bullet impact resolution
//!
//! Pure queries over bullet, bodies and terrain; the tick decides what
//! an impact means. Checks run in a fixed precedence and the first
//! match wins: ground, then walls, then gorillas, then buildings.

use glam::Vec2;

use super::state::{Bullet, Gorilla};
use super::terrain::{Building, Terrain};
use crate::consts;
use crate::tuning::Tuning;

/// What a bullet ran into this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Impact {
    /// Below the ground line
    Ground { point: Vec2 },
    /// Out the left or right edge; no explosion
    Wall,
    /// AABB overlap with a gorilla
    Direct { target: usize },
    /// Inside a building body at an intact point
    Building { index: usize, point: Vec2 },
}

/// Bullet box vs gorilla box. Strict inequality: exact touching misses.
#[inline]
fn overlaps_gorilla(bullet: &Bullet, gorilla: &Gorilla) -> bool {
    let extent = bullet.radius + gorilla.radius;
    (bullet.pos.x - gorilla.pos.x).abs() < extent
        && (bullet.pos.y - gorilla.pos.y).abs() < extent
}

/// Bullet box vs the building body (everything below the rooftop)
#[inline]
fn overlaps_building(bullet: &Bullet, building: &Building) -> bool {
    bullet.pos.x + bullet.radius > building.x
        && bullet.pos.x - bullet.radius < building.right()
        && bullet.pos.y + bullet.radius > building.top
}

/// First thing the bullet hits this tick, if anything.
///
/// While the bullet is inside its launch-immunity window, the firing
/// gorilla and the building it fired from are skipped entirely.
pub fn resolve_bullet_impact(
    bullet: &Bullet,
    gorillas: &[Gorilla; consts::PLAYER_COUNT],
    terrain: &Terrain,
    tuning: &Tuning,
) -> Option<Impact> {
    // Ground wins over everything; a bullet can be past the ground line
    // and inside a building column in the same tick
    if bullet.pos.y > tuning.screen_h {
        return Some(Impact::Ground {
            point: Vec2::new(bullet.pos.x, tuning.screen_h),
        });
    }

    if bullet.pos.x < 0.0 || bullet.pos.x > tuning.screen_w {
        return Some(Impact::Wall);
    }

    let immune = bullet.is_immune(tuning);
    for (index, gorilla) in gorillas.iter().enumerate() {
        if immune && index == bullet.owner {
            continue;
        }
        if overlaps_gorilla(bullet, gorilla) {
            return Some(Impact::Direct { target: index });
        }
    }

    for (index, building) in terrain.buildings.iter().enumerate() {
        if immune && bullet.immune_building == Some(index) {
            continue;
        }
        if !overlaps_building(bullet, building) {
            continue;
        }
        if terrain.is_destroyed(bullet.pos) {
            // Blown open here; the bullet may still reach something behind
            continue;
        }
        return Some(Impact::Building {
            index,
            point: bullet.pos,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_terrain() -> Terrain {
        let building = |x: f32, width: f32, top: f32| Building {
            x,
            width,
            top,
            color: 0,
            window_cols: 1,
            window_rows: 1,
            windows_lit: 0,
        };
        let mut terrain = Terrain::default();
        terrain.buildings = vec![
            building(0.0, 100.0, 400.0),
            building(102.0, 100.0, 300.0),
            building(204.0, 100.0, 450.0),
        ];
        terrain
    }

    fn bullet_at(pos: Vec2, age: f32) -> Bullet {
        Bullet {
            pos,
            vel: Vec2::ZERO,
            radius: 5.0,
            age,
            owner: 0,
            immune_building: Some(0),
        }
    }

    fn idle_gorillas() -> [Gorilla; 2] {
        [
            Gorilla::new(Vec2::new(50.0, 386.0), 14.0),
            Gorilla::new(Vec2::new(254.0, 436.0), 14.0),
        ]
    }

    #[test]
    fn test_clear_sky_is_no_impact() {
        let tuning = Tuning::default();
        let bullet = bullet_at(Vec2::new(150.0, 100.0), 1.0);
        let hit = resolve_bullet_impact(&bullet, &idle_gorillas(), &flat_terrain(), &tuning);
        assert_eq!(hit, None);
    }

    #[test]
    fn test_ground_impact_point_on_ground_line() {
        let tuning = Tuning::default();
        let bullet = bullet_at(Vec2::new(150.0, tuning.screen_h + 3.0), 1.0);
        let hit = resolve_bullet_impact(&bullet, &idle_gorillas(), &flat_terrain(), &tuning);
        assert_eq!(
            hit,
            Some(Impact::Ground {
                point: Vec2::new(150.0, tuning.screen_h)
            })
        );
    }

    #[test]
    fn test_ground_beats_building() {
        // Past the ground line while still inside a building column
        let tuning = Tuning::default();
        let bullet = bullet_at(Vec2::new(150.0, tuning.screen_h + 0.5), 1.0);
        match resolve_bullet_impact(&bullet, &idle_gorillas(), &flat_terrain(), &tuning) {
            Some(Impact::Ground { .. }) => {}
            other => panic!("expected ground impact, got {other:?}"),
        }
    }

    #[test]
    fn test_wall_impact_is_strict() {
        let tuning = Tuning::default();
        let gorillas = idle_gorillas();
        let terrain = Terrain::default();

        let left = bullet_at(Vec2::new(-0.1, 100.0), 1.0);
        assert_eq!(
            resolve_bullet_impact(&left, &gorillas, &terrain, &tuning),
            Some(Impact::Wall)
        );
        let right = bullet_at(Vec2::new(tuning.screen_w + 0.1, 100.0), 1.0);
        assert_eq!(
            resolve_bullet_impact(&right, &gorillas, &terrain, &tuning),
            Some(Impact::Wall)
        );
        // Exactly on the edge is still in play
        let edge = bullet_at(Vec2::new(0.0, 100.0), 1.0);
        assert_eq!(resolve_bullet_impact(&edge, &gorillas, &terrain, &tuning), None);
    }

    #[test]
    fn test_direct_hit_on_opponent() {
        let tuning = Tuning::default();
        let gorillas = idle_gorillas();
        let bullet = bullet_at(gorillas[1].pos + Vec2::new(10.0, 0.0), 0.0);
        let hit = resolve_bullet_impact(&bullet, &gorillas, &flat_terrain(), &tuning);
        assert_eq!(hit, Some(Impact::Direct { target: 1 }));
    }

    #[test]
    fn test_touching_is_not_a_hit() {
        let tuning = Tuning::default();
        let gorillas = idle_gorillas();
        // dx exactly radius sum, dy zero
        let bullet = bullet_at(gorillas[1].pos + Vec2::new(19.0, 0.0), 1.0);
        let hit = resolve_bullet_impact(&bullet, &gorillas, &Terrain::default(), &tuning);
        assert_eq!(hit, None);
    }

    #[test]
    fn test_immunity_skips_firer() {
        let tuning = Tuning::default();
        let gorillas = idle_gorillas();
        let mut bullet = bullet_at(gorillas[0].pos, 0.0);
        bullet.immune_building = None;
        assert!(bullet.is_immune(&tuning));
        assert_eq!(
            resolve_bullet_impact(&bullet, &gorillas, &Terrain::default(), &tuning),
            None
        );

        // Same overlap after the window: fatal self-hit
        bullet.age = tuning.immunity_secs + 0.01;
        assert_eq!(
            resolve_bullet_impact(&bullet, &gorillas, &Terrain::default(), &tuning),
            Some(Impact::Direct { target: 0 })
        );
    }

    #[test]
    fn test_immunity_skips_firing_building() {
        let tuning = Tuning::default();
        let terrain = flat_terrain();
        let gorillas = [
            Gorilla::new(Vec2::new(500.0, 100.0), 14.0),
            Gorilla::new(Vec2::new(600.0, 100.0), 14.0),
        ];
        // Inside building 0's body, which the bullet launched from
        let inside = Vec2::new(50.0, 420.0);
        let young = bullet_at(inside, 0.0);
        assert_eq!(resolve_bullet_impact(&young, &gorillas, &terrain, &tuning), None);

        let old = bullet_at(inside, tuning.immunity_secs + 0.01);
        assert_eq!(
            resolve_bullet_impact(&old, &gorillas, &terrain, &tuning),
            Some(Impact::Building { index: 0, point: inside })
        );
    }

    #[test]
    fn test_crater_pass_through() {
        let tuning = Tuning::default();
        let mut terrain = flat_terrain();
        let gorillas = [
            Gorilla::new(Vec2::new(500.0, 100.0), 14.0),
            Gorilla::new(Vec2::new(600.0, 100.0), 14.0),
        ];
        let inside = Vec2::new(150.0, 350.0);
        let bullet = bullet_at(inside, 1.0);
        assert!(matches!(
            resolve_bullet_impact(&bullet, &gorillas, &terrain, &tuning),
            Some(Impact::Building { index: 1, .. })
        ));

        terrain.add_crater(inside, 20.0);
        assert_eq!(resolve_bullet_impact(&bullet, &gorillas, &terrain, &tuning), None);
    }

    #[test]
    fn test_gorilla_checked_before_building() {
        let tuning = Tuning::default();
        let terrain = flat_terrain();
        // Gorilla buried at a spot that also overlaps building 1's body
        let gorillas = [
            Gorilla::new(Vec2::new(500.0, 100.0), 14.0),
            Gorilla::new(Vec2::new(150.0, 350.0), 14.0),
        ];
        let bullet = bullet_at(Vec2::new(150.0, 350.0), 1.0);
        assert_eq!(
            resolve_bullet_impact(&bullet, &gorillas, &terrain, &tuning),
            Some(Impact::Direct { target: 1 })
        );
    }
}
