//! Schedule use-case service.
//!
//! # Responsibility
//! - Save the family schedule config produced by the setup wizard.
//! - Answer "who has the children" for a profile on a day or over a month.
//!
//! # Invariants
//! - A profile without a visible config resolves through the epoch-week
//!   fallback; it is never an error.
//! - Holiday overrides are returned next to, never merged into, the grid.

use crate::model::custody::Label;
use crate::model::now_epoch_ms;
use crate::model::profile::ProfileId;
use crate::model::schedule::ScheduleConfig;
use crate::repo::schedule_repo::ScheduleRepository;
use crate::repo::RepoError;
use crate::schedule::calendar::{month_grid, CalendarError, DayAssignment};
use crate::schedule::holiday::{holiday_overrides, HolidayOccurrence, HolidayOverride};
use crate::schedule::resolver::resolve;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ScheduleServiceError {
    Repo(RepoError),
    Calendar(CalendarError),
}

impl Display for ScheduleServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Calendar(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ScheduleServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Calendar(err) => Some(err),
        }
    }
}

impl From<RepoError> for ScheduleServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<CalendarError> for ScheduleServiceError {
    fn from(value: CalendarError) -> Self {
        Self::Calendar(value)
    }
}

/// Schedule service facade over a config repository.
pub struct ScheduleService<R: ScheduleRepository> {
    repo: R,
}

impl<R: ScheduleRepository> ScheduleService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates and replaces the owner's config wholesale.
    pub fn save_config(
        &self,
        owner_id: ProfileId,
        config: &ScheduleConfig,
    ) -> Result<(), ScheduleServiceError> {
        self.repo.save_config(owner_id, config, now_epoch_ms())?;
        Ok(())
    }

    /// Config visible to `profile_id`, either its own or its co-parent's.
    pub fn load_for_profile(
        &self,
        profile_id: ProfileId,
    ) -> Result<Option<ScheduleConfig>, ScheduleServiceError> {
        Ok(self.repo.load_for_profile(profile_id)?)
    }

    pub fn resolve_for_profile(
        &self,
        profile_id: ProfileId,
        date: NaiveDate,
    ) -> Result<Label, ScheduleServiceError> {
        let config = self.repo.load_for_profile(profile_id)?;
        Ok(resolve(date, config.as_ref()))
    }

    /// One assignment per day of `year-month` under the profile's config.
    pub fn month_for_profile(
        &self,
        profile_id: ProfileId,
        year: i32,
        month: u32,
    ) -> Result<Vec<DayAssignment>, ScheduleServiceError> {
        let config = self.repo.load_for_profile(profile_id)?;
        Ok(month_grid(year, month, config.as_ref())?)
    }

    /// Describes the enabled holiday rules that apply to `occurrences`.
    ///
    /// Empty when the profile has no config.
    pub fn holiday_overrides_for_profile(
        &self,
        profile_id: ProfileId,
        occurrences: &[HolidayOccurrence],
    ) -> Result<Vec<HolidayOverride>, ScheduleServiceError> {
        Ok(self
            .repo
            .load_for_profile(profile_id)?
            .map(|config| holiday_overrides(&config, occurrences))
            .unwrap_or_default())
    }
}
