use chrono::NaiveDate;
use coparent_core::db::open_db_in_memory;
use coparent_core::{
    HolidayCustody, HolidayOccurrence, HolidayRule, HolidayRuleKind, Label, PatternKey, Profile,
    ProfileRepository, RepoError, ScheduleConfig, ScheduleRepository, ScheduleService,
    ScheduleValidationError, SqliteProfileRepository, SqliteScheduleRepository,
};
use rusqlite::Connection;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn linked_parents(conn: &Connection) -> (Profile, Profile) {
    let profiles = SqliteProfileRepository::try_new(conn).unwrap();
    let first = Profile::new("Jordan");
    let second = Profile::new("Casey");
    profiles.create_profile(&first).unwrap();
    profiles.create_profile(&second).unwrap();
    profiles.link_co_parents(first.id, second.id).unwrap();
    (first, second)
}

#[test]
fn saved_config_round_trips_with_holidays() {
    let conn = open_db_in_memory().unwrap();
    let (owner, _) = linked_parents(&conn);
    let repo = SqliteScheduleRepository::try_new(&conn).unwrap();

    let mut config = ScheduleConfig::new(PatternKey::ThreeFourFourThree, date(2024, 2, 5), Label::B)
        .with_holidays(vec![
            HolidayRule::new("Thanksgiving", HolidayRuleKind::Alternate),
            HolidayRule::new("Christmas", HolidayRuleKind::Split),
        ]);
    config.exchange_time = "18:00".to_string();
    config.exchange_location = "School".to_string();

    repo.save_config(owner.id, &config, 1_000).unwrap();
    assert_eq!(repo.get_config(owner.id).unwrap(), Some(config));
}

#[test]
fn custom_pattern_cells_survive_storage() {
    let conn = open_db_in_memory().unwrap();
    let (owner, _) = linked_parents(&conn);
    let repo = SqliteScheduleRepository::try_new(&conn).unwrap();

    let config = ScheduleConfig::custom(vec![Label::A, Label::B, Label::B], date(2024, 1, 1), Label::A);
    repo.save_config(owner.id, &config, 1).unwrap();

    let stored = repo.get_config(owner.id).unwrap().unwrap();
    assert_eq!(stored.pattern, PatternKey::Custom);
    assert_eq!(stored.custom_pattern, Some(vec![Label::A, Label::B, Label::B]));
}

#[test]
fn save_replaces_the_whole_config() {
    let conn = open_db_in_memory().unwrap();
    let (owner, _) = linked_parents(&conn);
    let repo = SqliteScheduleRepository::try_new(&conn).unwrap();

    let with_holiday = ScheduleConfig::new(PatternKey::TwoTwoThree, date(2024, 1, 1), Label::A)
        .with_holidays(vec![HolidayRule::new("Easter", HolidayRuleKind::FixedA)]);
    repo.save_config(owner.id, &with_holiday, 1).unwrap();

    let replacement = ScheduleConfig::new(PatternKey::AlternatingWeeks, date(2024, 6, 3), Label::B);
    repo.save_config(owner.id, &replacement, 2).unwrap();

    let stored = repo.get_config(owner.id).unwrap().unwrap();
    assert_eq!(stored, replacement);
    assert!(stored.holidays.is_empty());
}

#[test]
fn invalid_config_is_rejected_before_write() {
    let conn = open_db_in_memory().unwrap();
    let (owner, _) = linked_parents(&conn);
    let repo = SqliteScheduleRepository::try_new(&conn).unwrap();

    let duplicate = ScheduleConfig::new(PatternKey::AlternatingWeeks, date(2024, 1, 1), Label::A)
        .with_holidays(vec![
            HolidayRule::new("Christmas", HolidayRuleKind::FixedA),
            HolidayRule::new(" Christmas ", HolidayRuleKind::FixedB),
        ]);
    let err = repo.save_config(owner.id, &duplicate, 1).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ScheduleValidationError::DuplicateHolidayName(_))
    ));

    let empty_custom = ScheduleConfig::custom(Vec::new(), date(2024, 1, 1), Label::A);
    assert!(matches!(
        repo.save_config(owner.id, &empty_custom, 1),
        Err(RepoError::Validation(ScheduleValidationError::EmptyCustomPattern))
    ));
    assert_eq!(repo.get_config(owner.id).unwrap(), None);
}

#[test]
fn co_parent_sees_family_config_and_latest_update_wins() {
    let conn = open_db_in_memory().unwrap();
    let (first, second) = linked_parents(&conn);
    let repo = SqliteScheduleRepository::try_new(&conn).unwrap();

    let older = ScheduleConfig::new(PatternKey::TwoTwoFiveFive, date(2024, 1, 1), Label::A);
    repo.save_config(first.id, &older, 100).unwrap();
    assert_eq!(repo.load_for_profile(second.id).unwrap(), Some(older.clone()));

    let newer = ScheduleConfig::new(PatternKey::EveryOtherWeekend, date(2024, 1, 1), Label::B);
    repo.save_config(second.id, &newer, 200).unwrap();
    assert_eq!(repo.load_for_profile(first.id).unwrap(), Some(newer.clone()));
    assert_eq!(repo.load_for_profile(second.id).unwrap(), Some(newer));
}

#[test]
fn unlinked_profile_does_not_see_former_co_parent_config() {
    let conn = open_db_in_memory().unwrap();
    let (first, second) = linked_parents(&conn);
    let repo = SqliteScheduleRepository::try_new(&conn).unwrap();
    let config = ScheduleConfig::new(PatternKey::AlternatingWeeks, date(2024, 1, 1), Label::A);
    repo.save_config(first.id, &config, 1).unwrap();

    SqliteProfileRepository::try_new(&conn)
        .unwrap()
        .unlink_co_parent(second.id)
        .unwrap();
    assert_eq!(repo.load_for_profile(second.id).unwrap(), None);
}

#[test]
fn unknown_stored_pattern_loads_as_default() {
    let conn = open_db_in_memory().unwrap();
    let (owner, _) = linked_parents(&conn);
    let repo = SqliteScheduleRepository::try_new(&conn).unwrap();
    let config = ScheduleConfig::new(PatternKey::TwoTwoThree, date(2024, 1, 1), Label::A);
    repo.save_config(owner.id, &config, 1).unwrap();

    conn.execute(
        "UPDATE schedule_configs SET pattern = 'five-two' WHERE owner_id = ?1;",
        [owner.id.to_string()],
    )
    .unwrap();

    let loaded = repo.get_config(owner.id).unwrap().unwrap();
    assert_eq!(loaded.pattern, PatternKey::AlternatingWeeks);
    assert_eq!(loaded.start_date, date(2024, 1, 1));
}

#[test]
fn malformed_holiday_column_is_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let (owner, _) = linked_parents(&conn);
    let repo = SqliteScheduleRepository::try_new(&conn).unwrap();
    let config = ScheduleConfig::new(PatternKey::TwoTwoThree, date(2024, 1, 1), Label::A);
    repo.save_config(owner.id, &config, 1).unwrap();

    conn.execute(
        "UPDATE schedule_configs SET holidays = 'not json' WHERE owner_id = ?1;",
        [owner.id.to_string()],
    )
    .unwrap();
    assert!(matches!(
        repo.get_config(owner.id),
        Err(RepoError::InvalidData(_))
    ));
}

#[test]
fn service_resolves_month_and_holidays_for_co_parent() {
    let conn = open_db_in_memory().unwrap();
    let (first, second) = linked_parents(&conn);
    let service = ScheduleService::new(SqliteScheduleRepository::try_new(&conn).unwrap());

    let config = ScheduleConfig::new(PatternKey::AlternatingWeeks, date(2024, 1, 1), Label::A)
        .with_holidays(vec![HolidayRule::new("Christmas", HolidayRuleKind::Split)]);
    service.save_config(first.id, &config).unwrap();

    assert_eq!(
        service.resolve_for_profile(second.id, date(2024, 1, 8)).unwrap(),
        Label::B
    );

    let january = service.month_for_profile(second.id, 2024, 1).unwrap();
    assert_eq!(january.len(), 31);
    assert!(january[..7].iter().all(|day| day.custodian == Label::A));
    assert!(january[7..14].iter().all(|day| day.custodian == Label::B));

    let overrides = service
        .holiday_overrides_for_profile(
            second.id,
            &[HolidayOccurrence::new("Christmas", date(2024, 12, 25))],
        )
        .unwrap();
    assert_eq!(overrides.len(), 1);
    assert_eq!(overrides[0].custody, HolidayCustody::Shared);
}

#[test]
fn service_without_config_uses_epoch_week_fallback() {
    let conn = open_db_in_memory().unwrap();
    let (first, _) = linked_parents(&conn);
    let service = ScheduleService::new(SqliteScheduleRepository::try_new(&conn).unwrap());

    // 2024-01-01 falls in epoch week 2817.
    assert_eq!(
        service.resolve_for_profile(first.id, date(2024, 1, 1)).unwrap(),
        Label::B
    );
    assert!(service
        .holiday_overrides_for_profile(first.id, &[HolidayOccurrence::new("Christmas", date(2024, 12, 25))])
        .unwrap()
        .is_empty());
}
