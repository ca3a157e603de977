//! Schedule configuration value object.
//!
//! # Responsibility
//! - Describe a family's chosen pattern, anchor date, starting custodian,
//!   exchange logistics and holiday rules.
//! - Convert to and from the camelCase document shape used by clients.
//!
//! # Invariants
//! - `custom_pattern` is present and non-empty iff `pattern == Custom`.
//! - Holiday rule names are non-blank and unique.
//! - A config is replaced wholesale on edit; it is never patched in place.

use crate::model::custody::Label;
use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Identifier of a schedule pattern: a catalog entry or the custom escape hatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKey {
    #[serde(rename = "alternating-weeks")]
    AlternatingWeeks,
    #[serde(rename = "2-2-3")]
    TwoTwoThree,
    #[serde(rename = "2-2-5-5")]
    TwoTwoFiveFive,
    #[serde(rename = "3-4-4-3")]
    ThreeFourFourThree,
    #[serde(rename = "every-other-weekend")]
    EveryOtherWeekend,
    #[serde(rename = "custom")]
    Custom,
}

impl PatternKey {
    pub const ALL: [PatternKey; 6] = [
        Self::AlternatingWeeks,
        Self::TwoTwoThree,
        Self::TwoTwoFiveFive,
        Self::ThreeFourFourThree,
        Self::EveryOtherWeekend,
        Self::Custom,
    ];

    /// Stable id used in persisted rows and documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AlternatingWeeks => "alternating-weeks",
            Self::TwoTwoThree => "2-2-3",
            Self::TwoTwoFiveFive => "2-2-5-5",
            Self::ThreeFourFourThree => "3-4-4-3",
            Self::EveryOtherWeekend => "every-other-weekend",
            Self::Custom => "custom",
        }
    }

    /// Exact-match lookup of a persisted id.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == value)
    }

    pub fn is_custom(self) -> bool {
        self == Self::Custom
    }
}

/// How custody is handled on a named holiday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HolidayRuleKind {
    /// Parent A in even calendar years, parent B in odd ones.
    Alternate,
    /// Both parents share the day.
    Split,
    FixedA,
    FixedB,
}

impl HolidayRuleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alternate => "alternate",
            Self::Split => "split",
            Self::FixedA => "fixed-a",
            Self::FixedB => "fixed-b",
        }
    }
}

/// One configured holiday rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayRule {
    /// Holiday name as supplied by the external holiday calendar.
    pub name: String,
    pub rule: HolidayRuleKind,
    pub enabled: bool,
}

impl HolidayRule {
    pub fn new(name: impl Into<String>, rule: HolidayRuleKind) -> Self {
        Self {
            name: name.into(),
            rule,
            enabled: true,
        }
    }
}

/// Validation failures for schedule configuration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleValidationError {
    /// Pattern id is not in the catalog and is not `custom`.
    UnknownPattern(String),
    /// `pattern == custom` without a custom sequence.
    MissingCustomPattern,
    /// `pattern == custom` with a zero-length sequence.
    EmptyCustomPattern,
    /// Catalog pattern carries a custom sequence.
    UnexpectedCustomPattern(PatternKey),
    /// Custom pattern cell outside `0|1`.
    InvalidPatternCell(u8),
    /// Starting parent outside `A|B`.
    InvalidStartingParent(String),
    BlankHolidayName,
    DuplicateHolidayName(String),
    /// Date text is not an ISO `YYYY-MM-DD` calendar date.
    InvalidDate(String),
}

impl Display for ScheduleValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownPattern(value) => write!(f, "unknown schedule pattern `{value}`"),
            Self::MissingCustomPattern => {
                write!(f, "custom pattern is required when pattern is `custom`")
            }
            Self::EmptyCustomPattern => write!(f, "custom pattern must not be empty"),
            Self::UnexpectedCustomPattern(key) => write!(
                f,
                "custom pattern is only allowed with `custom`, got `{}`",
                key.as_str()
            ),
            Self::InvalidPatternCell(value) => {
                write!(f, "custom pattern cell must be 0 or 1, got {value}")
            }
            Self::InvalidStartingParent(value) => {
                write!(f, "starting parent must be `A` or `B`, got `{value}`")
            }
            Self::BlankHolidayName => write!(f, "holiday name must not be blank"),
            Self::DuplicateHolidayName(name) => write!(f, "duplicate holiday rule `{name}`"),
            Self::InvalidDate(value) => write!(f, "invalid ISO date `{value}`"),
        }
    }
}

impl Error for ScheduleValidationError {}

/// A family's persisted custody schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub pattern: PatternKey,
    /// Meaningful only when `pattern == PatternKey::Custom`.
    pub custom_pattern: Option<Vec<Label>>,
    /// Anchor date for pattern day offsets.
    pub start_date: NaiveDate,
    /// `B` flips every label of the base sequence.
    pub starting_parent: Label,
    pub exchange_time: String,
    pub exchange_location: String,
    pub alternate_location: String,
    pub holidays: Vec<HolidayRule>,
}

impl ScheduleConfig {
    /// Creates a catalog-pattern config with empty exchange details.
    pub fn new(pattern: PatternKey, start_date: NaiveDate, starting_parent: Label) -> Self {
        Self {
            pattern,
            custom_pattern: None,
            start_date,
            starting_parent,
            exchange_time: String::new(),
            exchange_location: String::new(),
            alternate_location: String::new(),
            holidays: Vec::new(),
        }
    }

    /// Creates a config with a user-authored sequence.
    pub fn custom(sequence: Vec<Label>, start_date: NaiveDate, starting_parent: Label) -> Self {
        Self {
            custom_pattern: Some(sequence),
            ..Self::new(PatternKey::Custom, start_date, starting_parent)
        }
    }

    pub fn with_holidays(mut self, holidays: Vec<HolidayRule>) -> Self {
        self.holidays = holidays;
        self
    }

    /// Validates save-time invariants.
    ///
    /// # Errors
    /// - Custom pattern missing/empty for `custom`, or present for catalog keys.
    /// - Blank or duplicate holiday names.
    pub fn validate(&self) -> Result<(), ScheduleValidationError> {
        match (&self.pattern, &self.custom_pattern) {
            (PatternKey::Custom, None) => return Err(ScheduleValidationError::MissingCustomPattern),
            (PatternKey::Custom, Some(sequence)) if sequence.is_empty() => {
                return Err(ScheduleValidationError::EmptyCustomPattern)
            }
            (key, Some(_)) if !key.is_custom() => {
                return Err(ScheduleValidationError::UnexpectedCustomPattern(*key))
            }
            _ => {}
        }

        let mut seen = HashSet::new();
        for holiday in &self.holidays {
            let name = holiday.name.trim();
            if name.is_empty() {
                return Err(ScheduleValidationError::BlankHolidayName);
            }
            if !seen.insert(name) {
                return Err(ScheduleValidationError::DuplicateHolidayName(
                    name.to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Finds the enabled rule for a holiday name.
    pub fn enabled_holiday(&self, name: &str) -> Option<&HolidayRule> {
        let name = name.trim();
        self.holidays
            .iter()
            .find(|holiday| holiday.enabled && holiday.name.trim() == name)
    }
}

/// Client-facing camelCase document for a schedule config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConfigDocument {
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_pattern: Option<Vec<u8>>,
    pub start_date: String,
    pub starting_parent: String,
    #[serde(default)]
    pub exchange_time: String,
    #[serde(default)]
    pub exchange_location: String,
    #[serde(default)]
    pub alternate_location: String,
    #[serde(default)]
    pub holidays: Vec<HolidayRule>,
}

impl From<&ScheduleConfig> for ScheduleConfigDocument {
    fn from(config: &ScheduleConfig) -> Self {
        Self {
            pattern: config.pattern.as_str().to_string(),
            custom_pattern: config
                .custom_pattern
                .as_ref()
                .map(|sequence| sequence.iter().map(|label| label.to_cell()).collect()),
            start_date: config.start_date.format("%Y-%m-%d").to_string(),
            starting_parent: config.starting_parent.as_str().to_string(),
            exchange_time: config.exchange_time.clone(),
            exchange_location: config.exchange_location.clone(),
            alternate_location: config.alternate_location.clone(),
            holidays: config.holidays.clone(),
        }
    }
}

impl ScheduleConfigDocument {
    /// Strict conversion used before saving: unknown patterns are rejected
    /// and the result must pass `ScheduleConfig::validate()`.
    pub fn to_config(&self) -> Result<ScheduleConfig, ScheduleValidationError> {
        let pattern = PatternKey::parse(self.pattern.trim())
            .ok_or_else(|| ScheduleValidationError::UnknownPattern(self.pattern.clone()))?;
        let config = self.build(pattern, false)?;
        config.validate()?;
        Ok(config)
    }

    /// Lenient conversion used for rendering: an unknown pattern id, or a
    /// custom pattern without cells, becomes the catalog default. Cells left
    /// behind on a catalog pattern are ignored.
    pub fn to_config_for_render(&self) -> Result<ScheduleConfig, ScheduleValidationError> {
        let pattern = match PatternKey::parse(self.pattern.trim()) {
            Some(PatternKey::Custom)
                if self.custom_pattern.as_ref().map_or(true, Vec::is_empty) =>
            {
                warn!("event=schedule_pattern_fallback module=model reason=custom_without_cells");
                DEFAULT_PATTERN
            }
            Some(key) => key,
            None => {
                warn!(
                    "event=schedule_pattern_fallback module=model reason=unknown_pattern pattern_len={}",
                    self.pattern.len()
                );
                DEFAULT_PATTERN
            }
        };
        self.build(pattern, true)
    }

    fn build(
        &self,
        pattern: PatternKey,
        ignore_stale_cells: bool,
    ) -> Result<ScheduleConfig, ScheduleValidationError> {
        let start_date = parse_iso_date(&self.start_date)?;
        let starting_parent = Label::parse(&self.starting_parent).ok_or_else(|| {
            ScheduleValidationError::InvalidStartingParent(self.starting_parent.clone())
        })?;
        let custom_pattern = if pattern.is_custom() {
            match &self.custom_pattern {
                Some(cells) => Some(parse_cells(cells)?),
                None => None,
            }
        } else if self.custom_pattern.as_ref().is_some_and(|cells| !cells.is_empty()) {
            if !ignore_stale_cells {
                return Err(ScheduleValidationError::UnexpectedCustomPattern(pattern));
            }
            warn!(
                "event=schedule_pattern_fallback module=model reason=stale_custom_cells pattern={}",
                pattern.as_str()
            );
            None
        } else {
            None
        };

        Ok(ScheduleConfig {
            pattern,
            custom_pattern,
            start_date,
            starting_parent,
            exchange_time: self.exchange_time.clone(),
            exchange_location: self.exchange_location.clone(),
            alternate_location: self.alternate_location.clone(),
            holidays: self.holidays.clone(),
        })
    }
}

/// Pattern used when a config is absent from the catalog's point of view.
pub const DEFAULT_PATTERN: PatternKey = PatternKey::AlternatingWeeks;

/// Parses an ISO `YYYY-MM-DD` date.
pub fn parse_iso_date(value: &str) -> Result<NaiveDate, ScheduleValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ScheduleValidationError::InvalidDate(value.to_string()))
}

fn parse_cells(cells: &[u8]) -> Result<Vec<Label>, ScheduleValidationError> {
    cells
        .iter()
        .map(|cell| Label::from_cell(*cell).ok_or(ScheduleValidationError::InvalidPatternCell(*cell)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        HolidayRule, HolidayRuleKind, PatternKey, ScheduleConfig, ScheduleConfigDocument,
        ScheduleValidationError,
    };
    use crate::model::custody::Label;
    use chrono::NaiveDate;

    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date")
    }

    #[test]
    fn pattern_keys_round_trip_through_ids() {
        for key in PatternKey::ALL {
            assert_eq!(PatternKey::parse(key.as_str()), Some(key));
        }
        assert_eq!(PatternKey::parse("week-on-week-off"), None);
    }

    #[test]
    fn custom_pattern_must_be_present_and_non_empty() {
        let mut config = ScheduleConfig::custom(Vec::new(), anchor(), Label::A);
        assert_eq!(
            config.validate(),
            Err(ScheduleValidationError::EmptyCustomPattern)
        );

        config.custom_pattern = None;
        assert_eq!(
            config.validate(),
            Err(ScheduleValidationError::MissingCustomPattern)
        );
    }

    #[test]
    fn catalog_pattern_rejects_custom_sequence() {
        let mut config = ScheduleConfig::new(PatternKey::TwoTwoThree, anchor(), Label::A);
        config.custom_pattern = Some(vec![Label::A]);
        assert_eq!(
            config.validate(),
            Err(ScheduleValidationError::UnexpectedCustomPattern(
                PatternKey::TwoTwoThree
            ))
        );
    }

    #[test]
    fn holiday_names_must_be_unique() {
        let config = ScheduleConfig::new(PatternKey::AlternatingWeeks, anchor(), Label::A)
            .with_holidays(vec![
                HolidayRule::new("Thanksgiving", HolidayRuleKind::Alternate),
                HolidayRule::new(" Thanksgiving ", HolidayRuleKind::Split),
            ]);
        assert_eq!(
            config.validate(),
            Err(ScheduleValidationError::DuplicateHolidayName(
                "Thanksgiving".to_string()
            ))
        );
    }

    #[test]
    fn holiday_rule_kinds_use_kebab_case_ids() {
        let json = serde_json::to_string(&HolidayRuleKind::FixedA).expect("serialize");
        assert_eq!(json, "\"fixed-a\"");
        assert_eq!(HolidayRuleKind::FixedB.as_str(), "fixed-b");
    }

    #[test]
    fn document_parses_camel_case_shape() {
        let doc: ScheduleConfigDocument = serde_json::from_str(
            r#"{
                "pattern": "custom",
                "customPattern": [0, 0, 1, 1],
                "startDate": "2024-01-01",
                "startingParent": "B",
                "exchangeTime": "18:00",
                "holidays": [{"name": "Christmas", "rule": "split", "enabled": true}]
            }"#,
        )
        .expect("document should parse");

        let config = doc.to_config().expect("document should convert");
        assert_eq!(config.pattern, PatternKey::Custom);
        assert_eq!(
            config.custom_pattern,
            Some(vec![Label::A, Label::A, Label::B, Label::B])
        );
        assert_eq!(config.starting_parent, Label::B);
        assert_eq!(config.exchange_time, "18:00");
        assert_eq!(config.holidays[0].rule, HolidayRuleKind::Split);
        assert_eq!(ScheduleConfigDocument::from(&config), doc);
    }

    #[test]
    fn strict_conversion_rejects_unknown_pattern_but_render_falls_back() {
        let doc = ScheduleConfigDocument {
            pattern: "nesting".to_string(),
            custom_pattern: None,
            start_date: "2024-01-01".to_string(),
            starting_parent: "A".to_string(),
            exchange_time: String::new(),
            exchange_location: String::new(),
            alternate_location: String::new(),
            holidays: Vec::new(),
        };

        assert_eq!(
            doc.to_config(),
            Err(ScheduleValidationError::UnknownPattern("nesting".to_string()))
        );
        let rendered = doc.to_config_for_render().expect("render conversion");
        assert_eq!(rendered.pattern, PatternKey::AlternatingWeeks);
    }

    #[test]
    fn render_conversion_replaces_empty_custom_pattern_with_default() {
        let doc = ScheduleConfigDocument {
            pattern: "custom".to_string(),
            custom_pattern: Some(Vec::new()),
            start_date: "2024-01-01".to_string(),
            starting_parent: "A".to_string(),
            exchange_time: String::new(),
            exchange_location: String::new(),
            alternate_location: String::new(),
            holidays: Vec::new(),
        };

        assert_eq!(
            doc.to_config(),
            Err(ScheduleValidationError::EmptyCustomPattern)
        );
        let rendered = doc.to_config_for_render().expect("render conversion");
        assert_eq!(rendered.pattern, PatternKey::AlternatingWeeks);
        assert_eq!(rendered.custom_pattern, None);
    }

    #[test]
    fn render_conversion_ignores_cells_left_on_a_catalog_pattern() {
        let mut doc: ScheduleConfigDocument = serde_json::from_str(
            r#"{
                "pattern": "2-2-3",
                "customPattern": [0, 1],
                "startDate": "2024-01-01",
                "startingParent": "A"
            }"#,
        )
        .expect("document should parse");

        assert_eq!(
            doc.to_config(),
            Err(ScheduleValidationError::UnexpectedCustomPattern(
                PatternKey::TwoTwoThree
            ))
        );
        let rendered = doc.to_config_for_render().expect("render conversion");
        assert_eq!(rendered.pattern, PatternKey::TwoTwoThree);
        assert_eq!(rendered.custom_pattern, None);

        doc.pattern = "nesting".to_string();
        let fallback = doc.to_config_for_render().expect("render conversion");
        assert_eq!(fallback.pattern, PatternKey::AlternatingWeeks);
        assert_eq!(fallback.custom_pattern, None);
    }

    #[test]
    fn document_rejects_bad_cells_and_dates() {
        let mut doc = ScheduleConfigDocument {
            pattern: "custom".to_string(),
            custom_pattern: Some(vec![0, 2]),
            start_date: "2024-01-01".to_string(),
            starting_parent: "A".to_string(),
            exchange_time: String::new(),
            exchange_location: String::new(),
            alternate_location: String::new(),
            holidays: Vec::new(),
        };
        assert_eq!(
            doc.to_config(),
            Err(ScheduleValidationError::InvalidPatternCell(2))
        );

        doc.custom_pattern = Some(vec![0, 1]);
        doc.start_date = "01/01/2024".to_string();
        assert!(matches!(
            doc.to_config(),
            Err(ScheduleValidationError::InvalidDate(_))
        ));
    }
}
