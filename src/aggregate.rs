/*
Rolling window aggregation over one owner's schedule entries.
Pure: everything is derived from the slice passed in.
*/

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Weekday};
use serde::Serialize;

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{Category, OwnerId, ScheduleEntry};
use crate::timerange::{date_of, hour_of, weekday_of};

/// Share of `part` in `whole` as a percentage; 0 when `whole` is 0.
pub fn rate(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

/// Days above this multiple of the mean daily load are flagged as overloaded.
pub const OVERLOAD_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DurationBucket {
    UpTo60,
    UpTo90,
    UpTo120,
    Over120,
}

impl DurationBucket {
    // Entries shorter than a minute land in the first bucket.
    pub fn for_minutes(minutes: i64) -> Self {
        if minutes <= 60 {
            DurationBucket::UpTo60
        } else if minutes <= 90 {
            DurationBucket::UpTo90
        } else if minutes <= 120 {
            DurationBucket::UpTo120
        } else {
            DurationBucket::Over120
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DurationBucket::UpTo60 => "30-60 minutes",
            DurationBucket::UpTo90 => "60-90 minutes",
            DurationBucket::UpTo120 => "90-120 minutes",
            DurationBucket::Over120 => "over 120 minutes",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RateBucket<K> {
    pub key: K,
    pub total: usize,
    pub completed: usize,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DayLoad {
    pub date: NaiveDate,
    pub count: usize,
    pub minutes: i64,
    pub overloaded: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AggregateStats {
    pub owner: OwnerId,
    pub window_start: DateTime<FixedOffset>,
    pub window_end: DateTime<FixedOffset>,
    pub total: usize,
    pub completed: usize,
    pub completion_rate: f64,
    pub count_by_category: BTreeMap<Category, usize>,
    pub minutes_by_category: BTreeMap<Category, i64>,
    pub by_hour: Vec<RateBucket<u32>>,
    pub by_weekday: Vec<RateBucket<Weekday>>,
    pub by_duration: Vec<RateBucket<DurationBucket>>,
    pub daily: Vec<DayLoad>,
    pub mean_daily_minutes: f64,
}

impl AggregateStats {
    pub fn count_for(&self, category: Category) -> usize {
        self.count_by_category.get(&category).copied().unwrap_or(0)
    }

    pub fn minutes_for(&self, category: Category) -> i64 {
        self.minutes_by_category.get(&category).copied().unwrap_or(0)
    }

    pub fn hours_for(&self, category: Category) -> f64 {
        self.minutes_for(category) as f64 / 60.0
    }

    pub fn total_minutes(&self) -> i64 {
        self.minutes_by_category.values().sum()
    }

    pub fn best_hour(&self) -> Option<&RateBucket<u32>> {
        best(&self.by_hour)
    }

    pub fn best_weekday(&self) -> Option<&RateBucket<Weekday>> {
        best(&self.by_weekday)
    }

    pub fn best_duration_bucket(&self) -> Option<&RateBucket<DurationBucket>> {
        best(&self.by_duration)
    }

    pub fn overloaded_days(&self) -> usize {
        self.daily.iter().filter(|d| d.overloaded).count()
    }
}

// Highest completion rate; ties keep the earliest bucket.
fn best<K>(buckets: &[RateBucket<K>]) -> Option<&RateBucket<K>> {
    buckets.iter().fold(None, |acc: Option<&RateBucket<K>>, b| match acc {
        Some(cur) if cur.completion_rate >= b.completion_rate => Some(cur),
        _ => Some(b),
    })
}

#[derive(Default)]
struct Tally {
    total: usize,
    completed: usize,
}

impl Tally {
    fn add(&mut self, done: bool) {
        self.total += 1;
        if done {
            self.completed += 1;
        }
    }
}

fn into_buckets<K: Clone, M: Ord>(groups: BTreeMap<M, (K, Tally)>) -> Vec<RateBucket<K>> {
    groups
        .into_values()
        .map(|(key, t)| RateBucket {
            key,
            total: t.total,
            completed: t.completed,
            completion_rate: rate(t.completed, t.total),
        })
        .collect()
}

/// Entries of `owner` that started within the last `window_days` days up to `now`.
pub fn in_window<'a>(
    entries: &'a [ScheduleEntry],
    owner: OwnerId,
    window_days: i64,
    now: DateTime<FixedOffset>,
) -> AnalysisResult<(DateTime<FixedOffset>, Vec<&'a ScheduleEntry>)> {
    if window_days <= 0 {
        return Err(AnalysisError::InvalidRange(format!(
            "window must be at least one day, got {window_days}"
        )));
    }
    let window_start = now - Duration::days(window_days);
    let filtered = entries
        .iter()
        .filter(|e| e.owner == owner)
        .filter(|e| e.start >= window_start && e.start <= now)
        .collect();
    Ok((window_start, filtered))
}

/// Compute the rolling-window statistics for one owner.
///
/// Groupings:
/// - by start hour, ascending
/// - by weekday, Monday first
/// - by duration bucket, shortest first
/// - by calendar date, ascending, with overload flags
pub fn aggregate<Tz: TimeZone>(
    entries: &[ScheduleEntry],
    owner: OwnerId,
    window_days: i64,
    now: DateTime<FixedOffset>,
    tz: &Tz,
) -> AnalysisResult<AggregateStats> {
    let (window_start, filtered) = in_window(entries, owner, window_days, now)?;

    let mut overall = Tally::default();
    let categories = [Category::Work, Category::Study, Category::Other];
    let mut count_by_category: BTreeMap<Category, usize> =
        categories.into_iter().map(|c| (c, 0)).collect();
    let mut minutes_by_category: BTreeMap<Category, i64> =
        categories.into_iter().map(|c| (c, 0)).collect();
    let mut hours: BTreeMap<u32, (u32, Tally)> = BTreeMap::new();
    let mut weekdays: BTreeMap<u32, (Weekday, Tally)> = BTreeMap::new();
    let mut durations: BTreeMap<DurationBucket, (DurationBucket, Tally)> = BTreeMap::new();
    let mut days: BTreeMap<NaiveDate, (usize, i64)> = BTreeMap::new();

    for e in &filtered {
        let minutes = e.duration_minutes();
        overall.add(e.completed);
        *count_by_category.entry(e.category).or_insert(0) += 1;
        *minutes_by_category.entry(e.category).or_insert(0) += minutes;

        let hour = hour_of(&e.start, tz);
        hours.entry(hour).or_insert_with(|| (hour, Tally::default())).1.add(e.completed);

        let weekday = weekday_of(&e.start, tz);
        weekdays
            .entry(weekday.num_days_from_monday())
            .or_insert_with(|| (weekday, Tally::default()))
            .1
            .add(e.completed);

        let bucket = DurationBucket::for_minutes(minutes);
        durations.entry(bucket).or_insert_with(|| (bucket, Tally::default())).1.add(e.completed);

        let day = days.entry(date_of(&e.start, tz)).or_insert((0, 0));
        day.0 += 1;
        day.1 += minutes;
    }

    let mean_daily_minutes = if days.is_empty() {
        0.0
    } else {
        days.values().map(|(_, m)| *m as f64).sum::<f64>() / days.len() as f64
    };
    let daily = days
        .into_iter()
        .map(|(date, (count, minutes))| DayLoad {
            date,
            count,
            minutes,
            overloaded: minutes as f64 > mean_daily_minutes * OVERLOAD_FACTOR,
        })
        .collect();

    Ok(AggregateStats {
        owner,
        window_start,
        window_end: now,
        total: overall.total,
        completed: overall.completed,
        completion_rate: rate(overall.completed, overall.total),
        count_by_category,
        minutes_by_category,
        by_hour: into_buckets(hours),
        by_weekday: into_buckets(weekdays),
        by_duration: into_buckets(durations),
        daily,
        mean_daily_minutes,
    })
}
