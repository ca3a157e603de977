//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `coparent_core` linkage.
//! - Print one month of the unconfigured (epoch-week) schedule.
//!
//! Usage: `coparent [YYYY-MM]`; defaults to the current UTC month.

use chrono::{Datelike, NaiveDate, Utc};
use coparent_core::{custody_totals, month_grid, Label};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("coparent_core ping={}", coparent_core::ping());
    println!("coparent_core version={}", coparent_core::core_version());

    let today = Utc::now().date_naive();
    let (year, month) = match std::env::args().nth(1) {
        Some(arg) => match parse_year_month(&arg) {
            Some(parsed) => parsed,
            None => {
                eprintln!("expected YYYY-MM, got `{arg}`");
                return ExitCode::FAILURE;
            }
        },
        None => (today.year(), today.month()),
    };

    let days = match month_grid(year, month, None) {
        Ok(days) => days,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    for day in &days {
        println!("{} {}", day.date, day.custodian.as_str());
    }

    if let (Some(first), Some(last)) = (days.first(), days.last()) {
        if let Ok(totals) = custody_totals(first.date, last.date, None) {
            println!(
                "totals A={} ({:.0}%) B={} ({:.0}%)",
                totals.parent_a_days,
                totals.share_of(Label::A),
                totals.parent_b_days,
                totals.share_of(Label::B)
            );
        }
    }
    ExitCode::SUCCESS
}

fn parse_year_month(value: &str) -> Option<(i32, u32)> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d").ok()?;
    Some((first.year(), first.month()))
}
