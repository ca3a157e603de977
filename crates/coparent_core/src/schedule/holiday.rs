//! Holiday custody descriptions.
//!
//! # Responsibility
//! - Describe how custody should be handled on a date that an external
//!   holiday calendar reports as a named holiday.
//!
//! # Invariants
//! - Output is informational only; it never feeds back into
//!   `resolver::resolve` or the month grid.
//! - A split holiday is `HolidayCustody::Shared`, never a single `Label`.

use crate::model::custody::Label;
use crate::model::schedule::{HolidayRule, HolidayRuleKind, ScheduleConfig};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Who has the children on a holiday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "parent")]
pub enum HolidayCustody {
    Parent(Label),
    /// Morning/evening split between both parents.
    Shared,
}

/// Human-readable custody description for one holiday date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayOverride {
    pub holiday: String,
    pub date: NaiveDate,
    pub custody: HolidayCustody,
    pub summary: String,
}

/// A named holiday falling on a date, as reported by the holiday calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolidayOccurrence {
    pub name: String,
    pub date: NaiveDate,
}

impl HolidayOccurrence {
    pub fn new(name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            date,
        }
    }
}

/// Describes custody on `date` under `rule`.
///
/// The caller is responsible for knowing that `date` is that holiday.
pub fn describe_holiday_override(date: NaiveDate, rule: &HolidayRule) -> HolidayOverride {
    let custody = match rule.rule {
        HolidayRuleKind::Alternate if date.year().rem_euclid(2) == 0 => {
            HolidayCustody::Parent(Label::A)
        }
        HolidayRuleKind::Alternate => HolidayCustody::Parent(Label::B),
        HolidayRuleKind::Split => HolidayCustody::Shared,
        HolidayRuleKind::FixedA => HolidayCustody::Parent(Label::A),
        HolidayRuleKind::FixedB => HolidayCustody::Parent(Label::B),
    };
    let name = rule.name.trim();

    let summary = match (rule.rule, custody) {
        (HolidayRuleKind::Alternate, HolidayCustody::Parent(label)) => format!(
            "{name} {}: {} (alternates yearly)",
            date.year(),
            label.display_name()
        ),
        (_, HolidayCustody::Parent(label)) => {
            format!("{name}: {} every year", label.display_name())
        }
        (_, HolidayCustody::Shared) => {
            format!("{name}: split between both parents (morning and evening)")
        }
    };

    HolidayOverride {
        holiday: name.to_string(),
        date,
        custody,
        summary,
    }
}

/// Describes every occurrence that matches an enabled rule in `config`.
///
/// Occurrences without a matching enabled rule are skipped; input order is
/// preserved.
pub fn holiday_overrides(
    config: &ScheduleConfig,
    occurrences: &[HolidayOccurrence],
) -> Vec<HolidayOverride> {
    occurrences
        .iter()
        .filter_map(|occurrence| {
            config
                .enabled_holiday(&occurrence.name)
                .map(|rule| describe_holiday_override(occurrence.date, rule))
        })
        .collect()
}
