/*
Dashboard statistics: overview counters, per-day chart points,
work/study distribution and week-over-week comparison.
*/

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone};
use serde::Serialize;

use crate::aggregate::{in_window, rate};
use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{Category, OwnerId, ScheduleEntry};
use crate::timerange::date_of;

/// Which entries a statistic looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    /// Started within the last N days, up to now
    LastDays(i64),
    /// Started on a calendar date in `from..=to`
    Dates { from: NaiveDate, to: NaiveDate },
}

impl DateWindow {
    /// Explicit range when both ends are given, otherwise the last 7 days.
    pub fn from_query(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        match (from, to) {
            (Some(from), Some(to)) => DateWindow::Dates { from, to },
            _ => DateWindow::LastDays(7),
        }
    }
}

pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

pub fn select<'a, Tz: TimeZone>(
    entries: &'a [ScheduleEntry],
    owner: OwnerId,
    window: DateWindow,
    now: DateTime<FixedOffset>,
    tz: &Tz,
) -> AnalysisResult<Vec<&'a ScheduleEntry>> {
    match window {
        DateWindow::LastDays(days) => in_window(entries, owner, days, now).map(|(_, e)| e),
        DateWindow::Dates { from, to } => {
            if to < from {
                return Err(AnalysisError::InvalidRange(format!("{to} is before {from}")));
            }
            Ok(entries
                .iter()
                .filter(|e| e.owner == owner)
                .filter(|e| {
                    let d = date_of(&e.start, tz);
                    from <= d && d <= to
                })
                .collect())
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Overview {
    pub total: usize,
    pub completed: usize,
    pub completion_rate: i64,
    pub work_hours: i64,
    pub study_hours: i64,
}

pub fn overview<Tz: TimeZone>(
    entries: &[ScheduleEntry],
    owner: OwnerId,
    window: DateWindow,
    now: DateTime<FixedOffset>,
    tz: &Tz,
) -> AnalysisResult<Overview> {
    let selected = select(entries, owner, window, now, tz)?;
    let total = selected.len();
    let completed = selected.iter().filter(|e| e.completed).count();
    let hours = |c: Category| {
        let minutes: i64 = selected
            .iter()
            .filter(|e| e.category == c)
            .map(|e| e.duration_minutes())
            .sum();
        (minutes as f64 / 60.0).round() as i64
    };

    Ok(Overview {
        total,
        completed,
        completion_rate: rate(completed, total).round() as i64,
        work_hours: hours(Category::Work),
        study_hours: hours(Category::Study),
    })
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub category: Category,
    pub count: usize,
    pub hours: f64,
}

/// One point per (date, category), ordered by date then category.
pub fn daily_chart<Tz: TimeZone>(
    entries: &[ScheduleEntry],
    owner: OwnerId,
    window: DateWindow,
    now: DateTime<FixedOffset>,
    tz: &Tz,
) -> AnalysisResult<Vec<DailyPoint>> {
    let selected = select(entries, owner, window, now, tz)?;
    let mut groups: BTreeMap<(NaiveDate, Category), (usize, i64)> = BTreeMap::new();
    for e in selected {
        let g = groups.entry((date_of(&e.start, tz), e.category)).or_insert((0, 0));
        g.0 += 1;
        g.1 += e.duration_minutes();
    }

    Ok(groups
        .into_iter()
        .map(|((date, category), (count, minutes))| DailyPoint {
            date,
            category,
            count,
            hours: round1(minutes as f64 / 60.0),
        })
        .collect())
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TypeShare {
    pub category: Category,
    pub count: usize,
    pub hours: f64,
    pub percentage: i64,
}

pub fn type_distribution<Tz: TimeZone>(
    entries: &[ScheduleEntry],
    owner: OwnerId,
    window: DateWindow,
    now: DateTime<FixedOffset>,
    tz: &Tz,
) -> AnalysisResult<Vec<TypeShare>> {
    let selected = select(entries, owner, window, now, tz)?;
    let total = selected.len();
    let mut groups: BTreeMap<Category, (usize, i64)> = BTreeMap::new();
    for e in selected {
        let g = groups.entry(e.category).or_insert((0, 0));
        g.0 += 1;
        g.1 += e.duration_minutes();
    }

    Ok(groups
        .into_iter()
        .map(|(category, (count, minutes))| TypeShare {
            category,
            count,
            hours: round1(minutes as f64 / 60.0),
            percentage: rate(count, total).round() as i64,
        })
        .collect())
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeeklyComparison {
    pub current_week: usize,
    pub last_week: usize,
    pub change: i64,
    pub trend: Trend,
}

/// Entries in the last 7 days against the 7 days before that.
pub fn weekly_comparison(
    entries: &[ScheduleEntry],
    owner: OwnerId,
    now: DateTime<FixedOffset>,
) -> WeeklyComparison {
    let week_ago = now - Duration::days(7);
    let two_weeks_ago = now - Duration::days(14);
    let mine = entries.iter().filter(|e| e.owner == owner);

    let (mut current_week, mut last_week) = (0, 0);
    for e in mine {
        if e.start >= week_ago && e.start <= now {
            current_week += 1;
        } else if e.start >= two_weeks_ago && e.start < week_ago {
            last_week += 1;
        }
    }

    let change = if last_week > 0 {
        ((current_week as f64 - last_week as f64) / last_week as f64 * 100.0).round() as i64
    } else {
        0
    };
    let trend = match change {
        c if c > 0 => Trend::Up,
        c if c < 0 => Trend::Down,
        _ => Trend::Stable,
    };

    WeeklyComparison {
        current_week,
        last_week,
        change,
        trend,
    }
}
