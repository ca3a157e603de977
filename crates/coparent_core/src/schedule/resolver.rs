//! Date to custodian resolution.
//!
//! # Responsibility
//! - Map a calendar date to the parent who has custody that day.
//!
//! # Invariants
//! - Total: every date resolves to exactly one `Label`, with or without config.
//! - With a config, output is periodic in the cycle length relative to
//!   `start_date`, including dates before the anchor.
//! - Without a config, output follows epoch-week parity and ignores any
//!   family data. The two formulas are intentionally distinct.

use crate::model::custody::Label;
use crate::model::schedule::{PatternKey, ScheduleConfig};
use crate::schedule::catalog;
use chrono::{Datelike, NaiveDate};

const DAYS_PER_WEEK: i64 = 7;
/// `num_days_from_ce()` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

/// Resolves the custodian for `date`.
///
/// Never fails: a config whose pattern cannot be resolved falls back to the
/// catalog default sequence.
pub fn resolve(date: NaiveDate, config: Option<&ScheduleConfig>) -> Label {
    match config {
        Some(config) => resolve_configured(date, config),
        None => resolve_unconfigured(date),
    }
}

/// Effective label sequence for a config.
///
/// Custom configs use their own cells; a custom config without cells uses
/// the catalog default.
pub fn sequence_for(config: &ScheduleConfig) -> &[Label] {
    match config.pattern {
        PatternKey::Custom => match config.custom_pattern.as_deref() {
            Some(sequence) if !sequence.is_empty() => sequence,
            _ => catalog::default_entry().sequence,
        },
        key => catalog::entry_for(key)
            .unwrap_or_else(catalog::default_entry)
            .sequence,
    }
}

fn resolve_configured(date: NaiveDate, config: &ScheduleConfig) -> Label {
    let sequence = sequence_for(config);
    let offset_days = (date - config.start_date).num_days();
    // `sequence` is non-empty on every path through `sequence_for`.
    let index = offset_days.rem_euclid(sequence.len() as i64) as usize;
    let base = sequence[index];

    match config.starting_parent {
        Label::A => base,
        Label::B => base.flip(),
    }
}

fn resolve_unconfigured(date: NaiveDate) -> Label {
    let week_number = days_since_unix_epoch(date).div_euclid(DAYS_PER_WEEK);
    if week_number.rem_euclid(2) == 0 {
        Label::A
    } else {
        Label::B
    }
}

/// Whole days from 1970-01-01 to `date` (negative before the epoch).
///
/// Equal to flooring the midnight epoch-millis by one day.
fn days_since_unix_epoch(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) - UNIX_EPOCH_DAYS_FROM_CE
}

#[cfg(test)]
mod tests {
    use super::{resolve, sequence_for};
    use crate::model::custody::Label;
    use crate::model::schedule::{PatternKey, ScheduleConfig};
    use chrono::{Days, NaiveDate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn config(pattern: PatternKey, starting_parent: Label) -> ScheduleConfig {
        ScheduleConfig::new(pattern, date(2024, 1, 1), starting_parent)
    }

    #[test]
    fn alternating_weeks_matches_reference_scenario() {
        let config = config(PatternKey::AlternatingWeeks, Label::A);
        assert_eq!(resolve(date(2024, 1, 1), Some(&config)), Label::A);
        assert_eq!(resolve(date(2024, 1, 8), Some(&config)), Label::B);
        assert_eq!(resolve(date(2023, 12, 31), Some(&config)), Label::B);
    }

    #[test]
    fn two_two_three_resolves_index_two_to_b() {
        let config = config(PatternKey::TwoTwoThree, Label::A);
        assert_eq!(resolve(date(2024, 1, 3), Some(&config)), Label::B);
    }

    #[test]
    fn starting_parent_b_flips_the_anchor_day() {
        let config = config(PatternKey::AlternatingWeeks, Label::B);
        assert_eq!(resolve(date(2024, 1, 1), Some(&config)), Label::B);
    }

    #[test]
    fn starting_parent_flip_holds_for_every_pattern_and_offset() {
        for key in PatternKey::ALL.into_iter().filter(|key| !key.is_custom()) {
            let as_a = config(key, Label::A);
            let as_b = config(key, Label::B);
            for offset in -30_i64..30 {
                let day = date(2024, 1, 1) + chrono::Duration::days(offset);
                assert_eq!(
                    resolve(day, Some(&as_b)),
                    resolve(day, Some(&as_a)).flip(),
                    "{key:?} offset {offset}"
                );
            }
        }
    }

    #[test]
    fn configured_resolution_is_periodic_in_cycle_length() {
        let custom = ScheduleConfig::custom(
            vec![Label::A, Label::B, Label::B, Label::A, Label::A],
            date(2024, 3, 10),
            Label::A,
        );
        let catalog = config(PatternKey::ThreeFourFourThree, Label::B);

        for config in [&custom, &catalog] {
            let period = sequence_for(config).len() as i64;
            for offset in -40_i64..40 {
                let day = date(2024, 3, 10) + chrono::Duration::days(offset);
                let later = day + chrono::Duration::days(period);
                assert_eq!(resolve(day, Some(config)), resolve(later, Some(config)));
            }
        }
    }

    #[test]
    fn day_before_anchor_resolves_to_last_cell() {
        let sequence = vec![Label::A, Label::A, Label::A, Label::B];
        let config = ScheduleConfig::custom(sequence, date(2024, 1, 1), Label::A);
        assert_eq!(resolve(date(2023, 12, 31), Some(&config)), Label::B);

        let flipped = ScheduleConfig {
            starting_parent: Label::B,
            ..config
        };
        assert_eq!(resolve(date(2023, 12, 31), Some(&flipped)), Label::A);
    }

    #[test]
    fn far_past_and_future_dates_resolve() {
        let config = config(PatternKey::EveryOtherWeekend, Label::A);
        let _ = resolve(date(1900, 2, 28), Some(&config));
        let _ = resolve(date(2200, 12, 31), Some(&config));
        let _ = resolve(date(1900, 2, 28), None);
    }

    #[test]
    fn custom_without_cells_falls_back_to_default_sequence() {
        let mut config = ScheduleConfig::custom(Vec::new(), date(2024, 1, 1), Label::A);
        assert_eq!(resolve(date(2024, 1, 8), Some(&config)), Label::B);

        config.custom_pattern = None;
        assert_eq!(resolve(date(2024, 1, 8), Some(&config)), Label::B);
        assert_eq!(sequence_for(&config).len(), 14);
    }

    #[test]
    fn unconfigured_fallback_uses_epoch_week_parity() {
        // 1970-01-01 starts week 0; week 1 starts on 1970-01-08.
        assert_eq!(resolve(date(1970, 1, 1), None), Label::A);
        assert_eq!(resolve(date(1970, 1, 7), None), Label::A);
        assert_eq!(resolve(date(1970, 1, 8), None), Label::B);
        assert_eq!(resolve(date(1970, 1, 15), None), Label::A);
        // Day before the epoch is week -1.
        assert_eq!(resolve(date(1969, 12, 31), None), Label::B);
    }

    #[test]
    fn unconfigured_fallback_ignores_family_anchor() {
        // 2024-01-01 is in epoch week 2817 (odd) while a config anchored
        // there would say parent A.
        let day = date(2024, 1, 1);
        let config = config(PatternKey::AlternatingWeeks, Label::A);
        assert_eq!(resolve(day, Some(&config)), Label::A);
        assert_eq!(resolve(day, None), Label::B);
    }

    #[test]
    fn unconfigured_fallback_flips_every_seven_days() {
        let start = date(2024, 5, 2);
        for step in 0..20_u64 {
            let day = start + Days::new(step * 7);
            let next = day + Days::new(7);
            assert_eq!(resolve(next, None), resolve(day, None).flip());
        }
    }
}
