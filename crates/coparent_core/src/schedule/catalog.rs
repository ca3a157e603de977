//! Static catalog of named repeating custody patterns.
//!
//! Every built-in pattern is a two-week cycle. `custom` is not an entry:
//! its sequence comes from the schedule config itself.

use crate::model::custody::Label;
use crate::model::custody::Label::{A, B};
use crate::model::schedule::{PatternKey, DEFAULT_PATTERN};

/// Bumped whenever an entry's sequence changes.
pub const CATALOG_VERSION: u32 = 1;

/// Canonical cycle length of built-in patterns.
pub const CYCLE_DAYS: usize = 14;

/// One named pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternEntry {
    pub key: PatternKey,
    pub display_name: &'static str,
    pub description: &'static str,
    pub sequence: &'static [Label; CYCLE_DAYS],
}

impl PatternEntry {
    pub fn id(&self) -> &'static str {
        self.key.as_str()
    }
}

const ENTRIES: &[PatternEntry] = &[
    PatternEntry {
        key: PatternKey::AlternatingWeeks,
        display_name: "Alternating Weeks",
        description: "Children spend one full week with each parent.",
        sequence: &[A, A, A, A, A, A, A, B, B, B, B, B, B, B],
    },
    PatternEntry {
        key: PatternKey::TwoTwoThree,
        display_name: "2-2-3",
        description: "Two days, two days, then a three-day weekend, alternating each week.",
        sequence: &[A, A, B, B, A, A, A, B, B, A, A, B, B, B],
    },
    PatternEntry {
        key: PatternKey::TwoTwoFiveFive,
        display_name: "2-2-5-5",
        description: "Two days each, then five days each; weekdays stay with the same parent.",
        sequence: &[A, A, B, B, A, A, A, A, A, B, B, B, B, B],
    },
    PatternEntry {
        key: PatternKey::ThreeFourFourThree,
        display_name: "3-4-4-3",
        description: "Three days then four days, reversed in the second week.",
        sequence: &[A, A, A, B, B, B, B, A, A, A, A, B, B, B],
    },
    PatternEntry {
        key: PatternKey::EveryOtherWeekend,
        display_name: "Every Other Weekend",
        description: "One parent has weekdays; the other has alternating weekends.",
        sequence: &[A, A, A, A, A, B, B, A, A, A, A, A, A, A],
    },
];

/// All catalog entries in display order.
pub fn entries() -> &'static [PatternEntry] {
    ENTRIES
}

/// Exact-match lookup by persisted id. `custom` and unknown ids return `None`.
pub fn lookup(id: &str) -> Option<&'static PatternEntry> {
    ENTRIES.iter().find(|entry| entry.id() == id)
}

/// Lookup by typed key. `PatternKey::Custom` returns `None`.
pub fn entry_for(key: PatternKey) -> Option<&'static PatternEntry> {
    ENTRIES.iter().find(|entry| entry.key == key)
}

/// Entry used whenever a configured pattern cannot be resolved.
pub fn default_entry() -> &'static PatternEntry {
    // ENTRIES[0] is DEFAULT_PATTERN; the catalog test pins this.
    entry_for(DEFAULT_PATTERN).unwrap_or(&ENTRIES[0])
}

#[cfg(test)]
mod tests {
    use super::{default_entry, entries, entry_for, lookup, CYCLE_DAYS};
    use crate::model::custody::Label;
    use crate::model::schedule::PatternKey;

    #[test]
    fn every_non_custom_key_has_an_entry() {
        for key in PatternKey::ALL {
            assert_eq!(entry_for(key).is_some(), !key.is_custom(), "{key:?}");
        }
    }

    #[test]
    fn lookup_is_exact_and_excludes_custom() {
        assert_eq!(
            lookup("2-2-3").map(|entry| entry.key),
            Some(PatternKey::TwoTwoThree)
        );
        assert!(lookup("custom").is_none());
        assert!(lookup("2-2-3 ").is_none());
        assert!(lookup("ALTERNATING-WEEKS").is_none());
    }

    #[test]
    fn default_entry_is_alternating_weeks_and_first() {
        assert_eq!(default_entry().key, PatternKey::AlternatingWeeks);
        assert_eq!(entries()[0].key, PatternKey::AlternatingWeeks);
    }

    #[test]
    fn built_in_patterns_split_the_cycle_between_both_parents() {
        for entry in entries() {
            assert_eq!(entry.sequence.len(), CYCLE_DAYS);
            assert!(entry.sequence.contains(&Label::A), "{}", entry.id());
            assert!(entry.sequence.contains(&Label::B), "{}", entry.id());
        }
    }

    #[test]
    fn ids_are_unique() {
        let mut ids: Vec<&str> = entries().iter().map(|entry| entry.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), entries().len());
    }
}
