//! Per-tick entity movement.

use crate::boss::BOSS_BOUNCE_LIMIT;
use crate::components::{Alien, Bullet};
use crate::math::{milli, Fixed, Vec2Fixed};

/// Horizontal limit at which regular aliens turn around.
pub const ALIEN_BOUNCE_LIMIT: Fixed = milli(3_000);

/// Move every bullet by its velocity, scaled by `speed_factor`.
pub fn advance_bullets(bullets: &mut [Bullet], speed_factor: Fixed) {
    for bullet in bullets {
        bullet.position += bullet.velocity.scale(speed_factor);
    }
}

/// Move every living alien down by its speed and sideways by its
/// horizontal velocity, bouncing off the side limits.
pub fn advance_aliens(aliens: &mut [Alien], speed_factor: Fixed) {
    for alien in aliens.iter_mut().filter(|a| !a.is_destroyed()) {
        alien.position.y -= alien.speed * speed_factor;

        let Some(vx) = alien.horizontal_velocity else {
            continue;
        };
        let limit = if alien.is_boss {
            BOSS_BOUNCE_LIMIT
        } else {
            ALIEN_BOUNCE_LIMIT
        };
        let x = alien.position.x + vx * speed_factor;
        if x > limit || x < -limit {
            alien.position.x = x.clamp(-limit, limit);
            alien.horizontal_velocity = Some(-vx);
        } else {
            alien.position.x = x;
        }
    }
}

/// Clamp a requested move delta into `[-max, max]` per axis.
#[must_use]
pub fn clamp_delta(dx: f64, dy: f64, max: Fixed) -> Vec2Fixed {
    Vec2Fixed::from_f64(dx, dy).clamp_symmetric(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::AlienColor;
    use crate::math::units;

    fn drifting(x: Fixed, vx: Fixed, is_boss: bool) -> Alien {
        Alien {
            id: 1,
            position: Vec2Fixed::new(x, units(2)),
            color: AlienColor::Red,
            hp: 1,
            max_hp: 1,
            is_boss,
            speed: milli(100),
            horizontal_velocity: Some(vx),
            behavior: None,
        }
    }

    #[test]
    fn test_bullets_move_by_velocity() {
        let mut bullets = vec![Bullet {
            id: 1,
            position: Vec2Fixed::ZERO,
            velocity: Vec2Fixed::new(Fixed::ZERO, milli(200)),
            piercing: false,
            last_hit: None,
        }];
        advance_bullets(&mut bullets, units(2));
        assert_eq!(bullets[0].position.y, milli(400));
    }

    #[test]
    fn test_aliens_descend_and_slow_time_halves() {
        let mut aliens = vec![drifting(Fixed::ZERO, Fixed::ZERO, false)];
        advance_aliens(&mut aliens, Fixed::ONE);
        assert_eq!(aliens[0].position.y, units(2) - milli(100));
        advance_aliens(&mut aliens, Fixed::from_num(0.5));
        assert_eq!(aliens[0].position.y, units(2) - milli(100) - milli(100) / 2);
    }

    #[test]
    fn test_alien_bounces_at_side_limit() {
        let mut aliens = vec![drifting(milli(2_950), milli(100), false)];
        advance_aliens(&mut aliens, Fixed::ONE);
        assert_eq!(aliens[0].position.x, ALIEN_BOUNCE_LIMIT);
        assert_eq!(aliens[0].horizontal_velocity, Some(-milli(100)));
    }

    #[test]
    fn test_boss_bounces_earlier() {
        let mut aliens = vec![drifting(milli(-2_450), -milli(100), true)];
        advance_aliens(&mut aliens, Fixed::ONE);
        assert_eq!(aliens[0].position.x, -BOSS_BOUNCE_LIMIT);
        assert_eq!(aliens[0].horizontal_velocity, Some(milli(100)));
    }

    #[test]
    fn test_clamp_delta() {
        let d = clamp_delta(2.0, -0.25, milli(500));
        assert_eq!(d, Vec2Fixed::new(milli(500), Fixed::from_num(-0.25)));
        assert_eq!(clamp_delta(f64::NAN, 0.1, milli(500)).x, Fixed::ZERO);
    }
}
