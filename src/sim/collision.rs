//! Collision resolution for one simulation step
//!
//! Projectiles find their victims through the per-step spatial index.
//! Player-side checks (enemy bullets, bodies, pickups) are plain radius
//! overlaps against the player's hitbox.

use glam::Vec2;
use rand::Rng;

use super::effects::LabelStyle;
use super::projectile::HitOutcome;
use super::spatial::Rect;
use super::state::World;
use crate::circles_overlap;
use crate::consts::{CONTACT_DAMAGE, PLAYER_RADIUS, QUERY_MARGIN};

/// Whole-number damage, never below one
#[inline]
pub fn final_damage(raw: f32) -> f32 {
    raw.max(1.0).floor()
}

/// Resolve every overlap for this step
pub fn resolve_collisions(world: &mut World) {
    resolve_projectiles(world);
    resolve_enemy_bullets(world);
    resolve_contact(world);
    resolve_pickups(world);
}

fn resolve_projectiles(world: &mut World) {
    let mut near = Vec::new();

    for i in 0..world.projectiles.len() {
        let (pos, radius, damage, is_orbit, is_zone) = {
            let p = &world.projectiles[i];
            if !p.active {
                continue;
            }
            (p.pos, p.radius(), p.damage, p.is_orbit(), p.is_zone())
        };

        if is_orbit {
            for bullet in world.enemy_bullets.iter_mut().filter(|b| b.active) {
                if circles_overlap(pos, radius, bullet.pos, bullet.size / 2.0) {
                    bullet.active = false;
                }
            }
        }
        if is_zone {
            world
                .poison_zones
                .retain(|zone| !circles_overlap(pos, radius, zone.pos, zone.radius()));
        }

        // Flasks do their work through the zone they leave behind
        if damage <= 0.0 {
            continue;
        }

        near.clear();
        world.index.query_into(&Rect::around(pos, radius + QUERY_MARGIN), &mut near);

        if is_zone {
            let now = world.time;
            for &slot in &near {
                let (id, overlaps) = {
                    let e = &world.enemies[slot];
                    (e.id, e.active && circles_overlap(pos, radius, e.pos, e.radius))
                };
                if overlaps && world.projectiles[i].zone_ready(id, now) {
                    world.projectiles[i].mark_zone_hit(id, now);
                    hit_enemy(world, i, slot);
                }
            }
            continue;
        }

        let victim = near.iter().copied().find(|&slot| {
            let e = &world.enemies[slot];
            e.active
                && e.hit_flash <= 0.0
                && !world.projectiles[i].has_struck(e.id)
                && circles_overlap(pos, radius, e.pos, e.radius)
        });
        let Some(slot) = victim else {
            continue;
        };

        let id = world.enemies[slot].id;
        hit_enemy(world, i, slot);
        match world.projectiles[i].register_hit(id) {
            HitOutcome::Continue => {}
            HitOutcome::Retarget => {
                let next = world.nearest_enemy_to(pos, Some(slot)).map(|e| e.pos);
                world.projectiles[i].redirect(next);
            }
            HitOutcome::Spent => {
                let source = world.projectiles[i].source;
                let at = world.projectiles[i].pos;
                if let Some(effect) = world.projectiles[i].deactivate() {
                    world.spawn_expire_effect(source, at, effect);
                }
            }
        }
    }
}

/// Crit roll, knockback, damage and the death path for one contact
fn hit_enemy(world: &mut World, projectile: usize, slot: usize) {
    let (damage, vel) = {
        let p = &world.projectiles[projectile];
        (p.damage, p.vel)
    };
    let crit = world.rng.random::<f32>() < world.player.stats.crit_rate;
    let raw = if crit {
        damage * world.player.stats.crit_damage
    } else {
        damage
    };
    let amount = final_damage(raw);

    let enemy = &mut world.enemies[slot];
    enemy.apply_knockback(vel);
    let died = enemy.take_damage(amount);
    let label_pos = enemy.pos - Vec2::new(0.0, 10.0);

    if crit {
        world.spawn_label(label_pos, &format!("{amount}!"), LabelStyle::Critical);
    } else {
        world.spawn_label(label_pos, &format!("{amount}"), LabelStyle::Damage);
    }
    if died {
        log::debug!("Enemy #{} killed", world.enemies[slot].id);
        world.on_enemy_killed(slot);
    }
}

fn resolve_enemy_bullets(world: &mut World) {
    let player = world.player.pos;
    let mut hits = Vec::new();
    for bullet in world.enemy_bullets.iter_mut().filter(|b| b.active) {
        if circles_overlap(bullet.pos, bullet.size / 2.0, player, PLAYER_RADIUS) {
            bullet.active = false;
            hits.push(bullet.damage);
        }
    }
    for damage in hits {
        world.hurt_player(damage, false);
    }
}

fn resolve_contact(world: &mut World) {
    let player = world.player.pos;
    let nearby = world.index.query(&Rect::around(player, PLAYER_RADIUS + QUERY_MARGIN));
    let touching = nearby.into_iter().any(|slot| {
        let e = &world.enemies[slot];
        e.active && circles_overlap(player, PLAYER_RADIUS, e.pos, e.radius)
    });
    if touching {
        world.hurt_player(CONTACT_DAMAGE, false);
    }
}

fn resolve_pickups(world: &mut World) {
    let player = world.player.pos;
    // Crates pop new pickups while we iterate; those wait for the next step
    let count = world.pickups.len();
    for i in 0..count {
        let p = &mut world.pickups[i];
        if !p.active || !circles_overlap(p.pos, p.radius(), player, PLAYER_RADIUS) {
            continue;
        }
        p.active = false;
        let (kind, pos, value) = (p.kind, p.pos, p.value);
        world.collect_pickup(kind, pos, value);
    }
}
