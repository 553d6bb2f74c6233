//! Core game loop tick
//!
//! `tick` advances the simulation by one fixed timestep from a small
//! input-intents value. Everything here is deterministic: same seed,
//! same input sequence, same state.

use glam::Vec2;

use super::collision::{Impact, resolve_bullet_impact};
use super::geometry::{DIRECT_HIT_DAMAGE, explosion_damage};
use super::state::{Bullet, EXPLOSION_FX_SECS, ExplosionFx, GameState, RoundPhase};
use crate::consts;
use crate::wrap_degrees;

/// Player intents for one tick
///
/// Hold fields stay true for as long as the key is down; `fire` is a
/// one-shot the platform clears after each simulation step.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    pub angle_up: bool,
    pub angle_down: bool,
    pub power_up: bool,
    pub power_down: bool,
    pub fire: bool,
}

/// Advance the game by `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    // A backgrounded tab hands us one huge dt; never let it tunnel
    let dt = dt.min(consts::MAX_FRAME_DT);
    state.time_ticks = state.time_ticks.wrapping_add(1);

    match state.phase {
        RoundPhase::Aiming => {
            state.elapsed_secs += dt;
            update_aim(state, input, dt);
            if input.fire && state.bullet.is_none() {
                fire_bullet(state);
            }
        }
        RoundPhase::Firing => {
            state.elapsed_secs += dt;
            advance_bullet(state, dt);
        }
        RoundPhase::RoundOver { winner } => {
            update_reset_timer(state, winner, dt);
        }
    }

    blink_windows(state);
    decay_presentation(state, dt);
}

/// Apply aim-key holds to the active player's angle and power.
///
/// A held key ramps its rate from 1x toward the tuning cap over the
/// ramp duration; releasing the key drops it back to 1x.
fn update_aim(state: &mut GameState, input: &TickInput, dt: f32) {
    let angle_rate = state.tuning.angle_rate;
    let power_rate = state.tuning.power_rate;
    let accel_max = state.tuning.hold_accel_max;
    let ramp = state.tuning.hold_accel_ramp.max(1e-3);
    let (power_min, power_max) = (state.tuning.power_min, state.tuning.power_max);

    let step = |held: bool, hold_secs: &mut f32, rate: f32| -> f32 {
        if !held {
            *hold_secs = 0.0;
            return 0.0;
        }
        let mult = 1.0 + (accel_max - 1.0) * (*hold_secs / ramp).min(1.0);
        *hold_secs += dt;
        rate * mult * dt
    };

    let d_angle = step(input.angle_up, &mut state.hold.angle_up, angle_rate)
        - step(input.angle_down, &mut state.hold.angle_down, angle_rate);
    let d_power = step(input.power_up, &mut state.hold.power_up, power_rate)
        - step(input.power_down, &mut state.hold.power_down, power_rate);

    let idx = state.active_player;
    let player = &mut state.players[idx];
    player.aim_angle = wrap_degrees(player.aim_angle + d_angle);
    player.power = (player.power + d_power).clamp(power_min, power_max);
}

/// Spawn the bullet and hand the round to the flight phase
fn fire_bullet(state: &mut GameState) {
    let shooter = state.active_player;
    let gorilla = state.gorillas[shooter];
    let player = state.players[shooter];

    // The rooftop under the firer is untouchable while the bullet is young
    let slop = state.tuning.gorilla_radius * 2.0;
    let firing_building = state.terrain.firing_building(gorilla.pos, slop);

    state.bullet = Some(Bullet::launch(
        shooter,
        gorilla.pos,
        player.aim_angle,
        player.power,
        &state.tuning,
        firing_building,
    ));
    state.players[shooter].shots += 1;
    state.hold.reset();
    state.phase = RoundPhase::Firing;

    log::info!(
        "Player {} fires: angle {:.1}, power {:.1}",
        shooter + 1,
        player.aim_angle,
        player.power
    );
}

/// Integrate the bullet one step and resolve whatever it hit
fn advance_bullet(state: &mut GameState, dt: f32) {
    let Some(mut bullet) = state.bullet else {
        log::warn!("Flight phase with no bullet; returning to aiming");
        state.phase = RoundPhase::Aiming;
        return;
    };

    // Position first, then gravity; the classic artillery order
    bullet.pos += bullet.vel * dt;
    bullet.vel.y += state.tuning.gravity * dt;
    bullet.age += dt;
    state.bullet = Some(bullet);

    let impact = resolve_bullet_impact(&bullet, &state.gorillas, &state.terrain, &state.tuning);
    if let Some(impact) = impact {
        resolve_impact(state, impact);
    }
}

/// Consume the bullet and apply what its impact means
fn resolve_impact(state: &mut GameState, impact: Impact) {
    let Some(bullet) = state.bullet.take() else {
        return;
    };
    let shooter = bullet.owner;

    match impact {
        Impact::Wall => {
            log::info!("Bullet left the screen");
        }
        Impact::Ground { point } => {
            let radius = state.tuning.ground_crater_radius;
            state.terrain.add_crater(point, radius);
            explode(state, point, radius);
            log::info!("Bullet hit the ground at x {:.0}", point.x);
        }
        Impact::Building { index, point } => {
            let radius = state.tuning.crater_radius;
            state.terrain.add_crater(point, radius);
            explode(state, point, radius);
            log::info!("Bullet hit building {index}");
        }
        Impact::Direct { target } => {
            state.gorillas[target].apply_damage(DIRECT_HIT_DAMAGE);
            let radius = state.tuning.crater_radius;
            if target == shooter {
                // Own bullet came back around; it still blows a crater
                state.terrain.add_crater(bullet.pos, radius);
                explode(state, bullet.pos, radius);
                log::info!("Player {} shot themselves", shooter + 1);
            } else {
                spawn_fx(state, bullet.pos, radius);
                log::info!("Direct hit on player {}", target + 1);
            }
        }
    }

    finish_shot(state, shooter);
}

/// Omnidirectional blast: area damage to both gorillas
fn explode(state: &mut GameState, center: Vec2, radius: f32) {
    for (index, gorilla) in state.gorillas.iter_mut().enumerate() {
        let damage = explosion_damage(center, radius, gorilla.pos, gorilla.radius);
        if damage > 0.0 {
            gorilla.apply_damage(damage);
            log::debug!("Explosion deals {damage:.0} to player {}", index + 1);
        }
    }
    spawn_fx(state, center, radius);
}

fn spawn_fx(state: &mut GameState, pos: Vec2, radius: f32) {
    state.explosion = Some(ExplosionFx {
        pos,
        radius,
        age: 0.0,
    });
    state.screen_shake = (state.screen_shake + radius * 0.25).min(MAX_SHAKE);
}

/// Decide what the shot meant: pass the turn, or end the round
fn finish_shot(state: &mut GameState, shooter: usize) {
    let dead = [!state.gorillas[0].alive(), !state.gorillas[1].alive()];
    let winner = match dead {
        [false, false] => {
            state.active_player = state.opponent_of(shooter);
            state.hold.reset();
            state.phase = RoundPhase::Aiming;
            return;
        }
        // Mutual kill goes to whoever was not shooting
        [true, true] => state.opponent_of(shooter),
        [true, false] => 1,
        [false, true] => 0,
    };

    state.players[winner].score += 1;
    state.phase = RoundPhase::RoundOver { winner };
    if state.reset_timer.is_none() {
        state.reset_timer = Some(state.tuning.reset_delay);
    }
    log::info!("Player {} wins round {}", winner + 1, state.round_index + 1);
}

/// Count down to the next round; the loser aims first
fn update_reset_timer(state: &mut GameState, winner: usize, dt: f32) {
    let Some(timer) = state.reset_timer.as_mut() else {
        log::warn!("Round over without a reset timer; scheduling one");
        state.reset_timer = Some(state.tuning.reset_delay);
        return;
    };
    *timer -= dt;
    if *timer > 0.0 {
        return;
    }

    let starting = if winner < consts::PLAYER_COUNT {
        state.opponent_of(winner)
    } else {
        log::warn!("Invalid winner index {winner}; keeping turn order");
        state.active_player
    };
    state.round_index += 1;
    state.start_round(starting);
}

/// Toggle one random window on one random building, driven by an
/// integer hash of the tick counter so replays stay identical
fn blink_windows(state: &mut GameState) {
    if state.time_ticks % WINDOW_BLINK_INTERVAL_TICKS != 0 {
        return;
    }
    let count = state.terrain.buildings.len();
    if count == 0 {
        return;
    }
    let hash = state
        .time_ticks
        .wrapping_mul(2654435761)
        .wrapping_add(state.seed);
    let building = &mut state.terrain.buildings[(hash % count as u64) as usize];
    let windows = building.window_cols * building.window_rows;
    if windows > 0 {
        building.toggle_window(((hash >> 32) % windows as u64) as u32);
    }
}

/// Age the explosion flash, bleed off screen shake
fn decay_presentation(state: &mut GameState, dt: f32) {
    if let Some(fx) = state.explosion.as_mut() {
        fx.age += dt;
        if fx.age >= EXPLOSION_FX_SECS {
            state.explosion = None;
        }
    }
    state.screen_shake = (state.screen_shake - SHAKE_FALLOFF * dt).max(0.0);
}

/// Ticks between cosmetic window blinks (0.2 s at 120 Hz)
const WINDOW_BLINK_INTERVAL_TICKS: u64 = 24;
/// Screen shake bled off per second
const SHAKE_FALLOFF: f32 = 12.0;
/// Screen shake cap
const MAX_SHAKE: f32 = 6.0;
