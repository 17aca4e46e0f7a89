//! Balance tables.
//!
//! Plain-text dumps of the progression curve, per-wave parameters and boss
//! roster, for eyeballing difficulty changes in review.

use std::fmt::Write;

use nova_core::boss::{boss_hp, power_cooldown_ms, BOSS_PROFILES};
use nova_core::progression::{required_score, Bracket, MAX_LEVEL, MIN_LEVEL};
use nova_core::scoring::{drop_chance, escape_penalty};
use nova_core::waves::{wave_clear_bonus, WaveParams, WAVES_PER_LEVEL};

/// Score thresholds, sectors, drop chance and escape penalty per level.
#[must_use]
pub fn progression_table(max_level: u32) -> String {
    let max_level = max_level.clamp(MIN_LEVEL, MAX_LEVEL);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>5}  {:<9} {:>10} {:>9} {:>6} {:>8}",
        "level", "sector", "score", "step", "drop", "penalty"
    );
    let mut previous = 0;
    for level in MIN_LEVEL..=max_level {
        let score = required_score(level);
        let _ = writeln!(
            out,
            "{:>5}  {:<9} {:>10} {:>9} {:>5.0}% {:>8}",
            level,
            Bracket::for_level(level).name(),
            score,
            score - previous,
            drop_chance(level) * 100.0,
            escape_penalty(level),
        );
        previous = score;
    }
    out
}

/// Wave parameters for every wave of each listed level.
#[must_use]
pub fn wave_table(levels: &[u32]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>5} {:>4}  {:<10} {:>6} {:>6} {:>3} {:>6} {:>5} {:>7} {:>6}",
        "level", "wave", "special", "eps", "speed", "hp", "gap", "kills", "length", "bonus"
    );
    for &level in levels {
        for wave in 1..=WAVES_PER_LEVEL {
            let p = WaveParams::for_level(level, wave);
            let _ = writeln!(
                out,
                "{:>5} {:>4}  {:<10} {:>6.2} {:>6.2} {:>3} {:>5}ms {:>5} {:>6}s {:>6}",
                level,
                wave,
                format!("{:?}", p.special),
                p.enemies_per_second,
                p.alien_speed,
                p.alien_hp,
                p.spawn_interval_ms,
                p.enemies_required,
                p.duration_ms / 1000,
                wave_clear_bonus(wave, level),
            );
        }
    }
    out
}

/// Every boss with its hit points and power cadence.
#[must_use]
pub fn boss_table() -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>5}  {:<22} {:>4} {:>6} {:>9}  {:<12} {:<12}",
        "level", "name", "hp", "phases", "cooldown", "pattern", "power"
    );
    for profile in &BOSS_PROFILES {
        let _ = writeln!(
            out,
            "{:>5}  {:<22} {:>4} {:>6} {:>7}ms  {:<12} {:<12}",
            profile.level,
            profile.name,
            boss_hp(profile.level),
            profile.phases,
            power_cooldown_ms(profile.level),
            format!("{:?}", profile.pattern),
            format!("{:?}", profile.power),
        );
    }
    out
}

/// First and last level of each sector, the levels where curves change.
#[must_use]
pub fn sector_edges() -> Vec<u32> {
    Bracket::ALL
        .iter()
        .flat_map(|b| [b.first_level(), b.last_level()])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progression_table_rows() {
        let table = progression_table(12);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 13);
        assert!(lines[10].contains("35397"));
        assert!(lines[11].contains("cadet"));
    }

    #[test]
    fn test_progression_table_clamps() {
        assert_eq!(progression_table(1_000).lines().count(), 101);
        assert_eq!(progression_table(0).lines().count(), 2);
    }

    #[test]
    fn test_wave_table_rows() {
        let table = wave_table(&[1, 50]);
        assert_eq!(table.lines().count(), 11);
        assert!(table.contains("Shielded"));
    }

    #[test]
    fn test_boss_table_lists_all() {
        let table = boss_table();
        assert_eq!(table.lines().count(), 11);
        assert!(table.contains("265"));
    }

    #[test]
    fn test_sector_edges() {
        let edges = sector_edges();
        assert_eq!(edges.len(), 12);
        assert_eq!(edges[0], 1);
        assert_eq!(edges[11], 100);
    }
}
