//! Collision detection.
//!
//! All checks compare squared distances against fixed radii; entity size
//! plays no part. Iteration follows insertion order so that ties always
//! resolve the same way: bullets in fire order, aliens in spawn order.

use crate::components::{Alien, Bullet, EntityId};
use crate::math::{milli, Fixed, Vec2Fixed};

/// Squared hit radius between a bullet and a regular alien (0.0625).
pub const BULLET_ALIEN_RADIUS_SQ: Fixed = Fixed::from_bits(1 << 28);

/// Squared hit radius between a bullet and the boss (0.16).
pub const BULLET_BOSS_RADIUS_SQ: Fixed = milli(160);

/// Squared contact radius between the player and any alien (0.25).
pub const PLAYER_ALIEN_RADIUS_SQ: Fixed = milli(250);

/// Aliens below this altitude have escaped.
pub const ALIEN_ESCAPE_Y: Fixed = milli(-4_000);

/// Bullets above this altitude are gone.
pub const BULLET_MAX_Y: Fixed = milli(5_000);

/// Bullets further than this from the center line are gone.
pub const BULLET_MAX_X: Fixed = milli(4_000);

/// A bullet damaging an alien.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulletHit {
    /// Bullet that connected.
    pub bullet: EntityId,
    /// Alien that was hit.
    pub alien: EntityId,
    /// Whether this hit took the alien to zero hit points.
    pub destroyed: bool,
}

const fn hit_radius_sq(alien: &Alien) -> Fixed {
    if alien.is_boss {
        BULLET_BOSS_RADIUS_SQ
    } else {
        BULLET_ALIEN_RADIUS_SQ
    }
}

/// Resolve bullet hits for one tick.
///
/// Each bullet damages at most one living alien. Regular bullets are
/// consumed; piercing bullets survive and skip the alien they last hit.
/// Destroyed aliens stay in `aliens` with zero hit points so the caller can
/// score them before removal.
pub fn resolve_bullet_hits(bullets: &mut Vec<Bullet>, aliens: &mut [Alien]) -> Vec<BulletHit> {
    let mut hits = Vec::new();
    let mut consumed = Vec::new();

    for bullet in bullets.iter_mut() {
        let target = aliens.iter_mut().find(|alien| {
            !alien.is_destroyed()
                && bullet.last_hit != Some(alien.id)
                && bullet.position.distance_squared(alien.position) <= hit_radius_sq(alien)
        });
        let Some(alien) = target else {
            continue;
        };

        alien.hp -= 1;
        hits.push(BulletHit {
            bullet: bullet.id,
            alien: alien.id,
            destroyed: alien.is_destroyed(),
        });

        if bullet.piercing {
            bullet.last_hit = Some(alien.id);
        } else {
            consumed.push(bullet.id);
        }
    }

    if !consumed.is_empty() {
        bullets.retain(|b| !consumed.contains(&b.id));
    }
    hits
}

/// Living aliens touching the player, in spawn order.
#[must_use]
pub fn player_contacts(player: Vec2Fixed, aliens: &[Alien]) -> Vec<EntityId> {
    aliens
        .iter()
        .filter(|alien| {
            !alien.is_destroyed()
                && player.distance_squared(alien.position) <= PLAYER_ALIEN_RADIUS_SQ
        })
        .map(|alien| alien.id)
        .collect()
}

/// Remove and return aliens that crossed the lower boundary.
pub fn take_escaped(aliens: &mut Vec<Alien>) -> Vec<Alien> {
    let mut escaped = Vec::new();
    aliens.retain(|alien| {
        if alien.position.y < ALIEN_ESCAPE_Y {
            escaped.push(alien.clone());
            false
        } else {
            true
        }
    });
    escaped
}

/// Drop bullets that left the playfield. Returns how many were removed.
pub fn remove_out_of_bounds(bullets: &mut Vec<Bullet>) -> usize {
    let before = bullets.len();
    bullets.retain(|b| b.position.y <= BULLET_MAX_Y && b.position.x.abs() <= BULLET_MAX_X);
    before - bullets.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::AlienColor;
    use crate::math::units;

    fn alien(id: EntityId, x: Fixed, y: Fixed, hp: u32) -> Alien {
        Alien {
            id,
            position: Vec2Fixed::new(x, y),
            color: AlienColor::Red,
            hp,
            max_hp: hp,
            is_boss: false,
            speed: Fixed::ZERO,
            horizontal_velocity: None,
            behavior: None,
        }
    }

    fn bullet(id: EntityId, x: Fixed, y: Fixed) -> Bullet {
        Bullet {
            id,
            position: Vec2Fixed::new(x, y),
            velocity: Vec2Fixed::ZERO,
            piercing: false,
            last_hit: None,
        }
    }

    #[test]
    fn test_radius_constants() {
        assert_eq!(BULLET_ALIEN_RADIUS_SQ, Fixed::from_num(0.0625));
        assert_eq!(PLAYER_ALIEN_RADIUS_SQ, Fixed::from_num(0.25));
        assert!((BULLET_BOSS_RADIUS_SQ.to_num::<f64>() - 0.16).abs() < 1e-9);
    }

    #[test]
    fn test_bullet_hits_first_alien_in_spawn_order() {
        let mut aliens = vec![alien(1, Fixed::ZERO, Fixed::ZERO, 1), alien(2, Fixed::ZERO, milli(100), 1)];
        let mut bullets = vec![bullet(10, Fixed::ZERO, milli(50))];

        let hits = resolve_bullet_hits(&mut bullets, &mut aliens);
        assert_eq!(
            hits,
            vec![BulletHit {
                bullet: 10,
                alien: 1,
                destroyed: true
            }]
        );
        assert!(bullets.is_empty());
        assert_eq!(aliens[1].hp, 1);
    }

    #[test]
    fn test_hit_radius_boundary() {
        // Exactly 0.25 apart is a hit (0.0625 squared), just beyond is a miss.
        let mut aliens = vec![alien(1, Fixed::ZERO, Fixed::ZERO, 5)];
        let mut bullets = vec![bullet(10, Fixed::ZERO, milli(250)), bullet(11, Fixed::ZERO, milli(251))];
        let hits = resolve_bullet_hits(&mut bullets, &mut aliens);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].bullet, 10);
        assert_eq!(bullets.len(), 1);
        assert_eq!(aliens[0].hp, 4);
    }

    #[test]
    fn test_boss_has_wider_radius() {
        let mut boss = alien(1, Fixed::ZERO, Fixed::ZERO, 40);
        boss.is_boss = true;
        let mut aliens = vec![boss];
        let mut bullets = vec![bullet(10, milli(350), Fixed::ZERO)];
        assert_eq!(resolve_bullet_hits(&mut bullets, &mut aliens).len(), 1);
        assert_eq!(aliens[0].hp, 39);
    }

    #[test]
    fn test_destroyed_aliens_are_skipped() {
        let mut aliens = vec![alien(1, Fixed::ZERO, Fixed::ZERO, 1), alien(2, Fixed::ZERO, Fixed::ZERO, 1)];
        let mut bullets = vec![bullet(10, Fixed::ZERO, Fixed::ZERO), bullet(11, Fixed::ZERO, Fixed::ZERO)];
        let hits = resolve_bullet_hits(&mut bullets, &mut aliens);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].alien, 1);
        assert_eq!(hits[1].alien, 2);
    }

    #[test]
    fn test_piercing_bullet_survives_one_alien_per_tick() {
        let mut aliens = vec![alien(1, Fixed::ZERO, Fixed::ZERO, 3), alien(2, Fixed::ZERO, Fixed::ZERO, 3)];
        let mut pierce = bullet(10, Fixed::ZERO, Fixed::ZERO);
        pierce.piercing = true;
        let mut bullets = vec![pierce];

        let hits = resolve_bullet_hits(&mut bullets, &mut aliens);
        assert_eq!(hits.len(), 1);
        assert_eq!(bullets.len(), 1);
        assert_eq!(bullets[0].last_hit, Some(1));

        // Next tick it moves on to the other alien instead of re-hitting.
        let hits = resolve_bullet_hits(&mut bullets, &mut aliens);
        assert_eq!(hits[0].alien, 2);
    }

    #[test]
    fn test_player_contacts() {
        let player = Vec2Fixed::new(Fixed::ZERO, milli(-2_500));
        let aliens = vec![
            alien(1, Fixed::ZERO, milli(-2_000), 1),
            alien(2, Fixed::ZERO, milli(-1_900), 1),
            alien(3, milli(300), milli(-2_500), 0),
        ];
        assert_eq!(player_contacts(player, &aliens), vec![1]);
    }

    #[test]
    fn test_escapes_and_bullet_bounds() {
        let mut aliens = vec![alien(1, Fixed::ZERO, milli(-4_001), 1), alien(2, Fixed::ZERO, milli(-4_000), 1)];
        let escaped = take_escaped(&mut aliens);
        assert_eq!(escaped.len(), 1);
        assert_eq!(escaped[0].id, 1);
        assert_eq!(aliens.len(), 1);

        let mut bullets = vec![
            bullet(1, Fixed::ZERO, units(5)),
            bullet(2, Fixed::ZERO, milli(5_001)),
            bullet(3, milli(-4_001), Fixed::ZERO),
        ];
        assert_eq!(remove_out_of_bounds(&mut bullets), 2);
        assert_eq!(bullets[0].id, 1);
    }
}
