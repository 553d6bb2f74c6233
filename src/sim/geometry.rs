//! Circle geometry and the explosion damage model
//!
//! Pure math, no state. Damage from an explosion scales with the area
//! of the circle-circle intersection between the blast and the target,
//! so a blast that swallows a gorilla hurts more than one that clips
//! an arm.

use std::f32::consts::PI;

use glam::Vec2;

/// Damage for a direct bullet hit; always fatal, bypasses the area model
pub const DIRECT_HIT_DAMAGE: f32 = 100.0;
/// Floor for any non-zero explosion damage
pub const MIN_HIT_DAMAGE: f32 = 20.0;
/// Span from the floor to the area-damage cap
pub const AREA_DAMAGE_RANGE: f32 = 70.0;
/// Area damage never exceeds this
pub const MAX_AREA_DAMAGE: f32 = 90.0;
/// World units past touching that still count as a graze
pub const GRAZE_SLOP: f32 = 1.0;

/// Overlap areas below this are treated as no overlap
const NEGLIGIBLE_OVERLAP: f32 = 1e-6;
/// Distance epsilon for boundary classification fallbacks
const GEOM_EPSILON: f32 = 1e-4;

/// Area of intersection of two circles with radii `r1`, `r2` whose
/// centers are `d` apart.
///
/// Exactly `0` when separated (`d >= r1 + r2`), exactly the smaller
/// circle's area when contained (`d <= |r1 - r2|`), the lens formula
/// in between. Never NaN, never negative.
pub fn circle_intersection_area(r1: f32, r2: f32, d: f32) -> f32 {
    let r1 = r1.max(0.0);
    let r2 = r2.max(0.0);
    let d = d.max(0.0);
    let r_min = r1.min(r2);
    let contained_area = PI * r_min * r_min;

    if d >= r1 + r2 {
        return 0.0;
    }
    if d <= (r1 - r2).abs() {
        return contained_area;
    }

    // Lens formula. Arguments clamped so float noise at the boundaries
    // cannot push acos/sqrt out of domain.
    let cos1 = ((d * d + r1 * r1 - r2 * r2) / (2.0 * d * r1)).clamp(-1.0, 1.0);
    let cos2 = ((d * d + r2 * r2 - r1 * r1) / (2.0 * d * r2)).clamp(-1.0, 1.0);
    let radicand =
        ((-d + r1 + r2) * (d + r1 - r2) * (d - r1 + r2) * (d + r1 + r2)).max(0.0);
    let area = r1 * r1 * cos1.acos() + r2 * r2 * cos2.acos() - 0.5 * radicand.sqrt();

    if !area.is_finite() || area < -GEOM_EPSILON {
        // Numerics collapsed right at a boundary; classify by distance
        if d + GEOM_EPSILON >= r1 + r2 {
            return 0.0;
        }
        if d <= (r1 - r2).abs() + GEOM_EPSILON {
            return contained_area;
        }
        return 0.0;
    }

    area.clamp(0.0, contained_area)
}

/// Damage an explosion deals to a circular target.
///
/// Negligible overlap is either a graze (fixed [`MIN_HIT_DAMAGE`], when
/// the circles come within [`GRAZE_SLOP`] of touching) or a clean miss.
/// Real overlap maps the covered fraction of the target onto
/// `[MIN_HIT_DAMAGE, MAX_AREA_DAMAGE]`.
pub fn explosion_damage(
    explosion_center: Vec2,
    explosion_radius: f32,
    target_center: Vec2,
    target_radius: f32,
) -> f32 {
    let d = explosion_center.distance(target_center);
    let area = circle_intersection_area(explosion_radius, target_radius, d);

    if area < NEGLIGIBLE_OVERLAP {
        if d <= explosion_radius + target_radius + GRAZE_SLOP {
            return MIN_HIT_DAMAGE;
        }
        return 0.0;
    }

    let target_area = PI * target_radius * target_radius;
    let fraction = if target_area > 0.0 {
        (area / target_area).clamp(0.0, 1.0)
    } else {
        1.0
    };
    (MIN_HIT_DAMAGE + fraction * AREA_DAMAGE_RANGE).clamp(0.0, MAX_AREA_DAMAGE)
}
