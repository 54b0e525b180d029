/*
Time range helpers shared by the analysis modules.
All wall-clock questions (hour, weekday, calendar date) take the timezone
as an explicit argument.
*/

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone, Timelike, Weekday};

use crate::error::{AnalysisError, AnalysisResult};

// Half-open interval [start, end)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl TimeRange {
    pub fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> AnalysisResult<Self> {
        if end < start {
            return Err(AnalysisError::InvalidRange(format!(
                "end {} is before start {}",
                end.to_rfc3339(),
                start.to_rfc3339()
            )));
        }
        Ok(TimeRange { start, end })
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        overlaps(self, other)
    }

    pub fn duration_minutes(&self) -> i64 {
        duration_minutes(self)
    }

    pub fn contains(&self, instant: &DateTime<FixedOffset>) -> bool {
        self.start <= *instant && *instant < self.end
    }
}

// Touching endpoints do not overlap.
// A zero-length range only overlaps an identical zero-length range.
pub fn overlaps(a: &TimeRange, b: &TimeRange) -> bool {
    if a.is_empty() || b.is_empty() {
        return a == b;
    }
    a.start < b.end && b.start < a.end
}

pub fn duration_minutes(r: &TimeRange) -> i64 {
    (r.end - r.start).num_minutes().max(0)
}

pub fn hour_of<Tz: TimeZone>(instant: &DateTime<FixedOffset>, tz: &Tz) -> u32 {
    instant.with_timezone(tz).hour()
}

pub fn weekday_of<Tz: TimeZone>(instant: &DateTime<FixedOffset>, tz: &Tz) -> Weekday {
    instant.with_timezone(tz).weekday()
}

pub fn date_of<Tz: TimeZone>(instant: &DateTime<FixedOffset>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// Instant at `hour` o'clock on `day` in `tz`. Hours past 23 roll into the next day.
///
/// Returns `None` when the wall-clock time does not exist (DST gap) or is out
/// of chrono's range.
pub fn at_hour<Tz: TimeZone>(day: NaiveDate, hour: u32, tz: &Tz) -> Option<DateTime<FixedOffset>> {
    let naive = day
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::hours(i64::from(hour)))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
}

/// `[from_hour, to_hour)` on `day`, as absolute instants.
pub fn hour_window<Tz: TimeZone>(
    day: NaiveDate,
    from_hour: u32,
    to_hour: u32,
    tz: &Tz,
) -> AnalysisResult<TimeRange> {
    let start = at_hour(day, from_hour, tz)
        .ok_or_else(|| AnalysisError::InvalidRange(format!("{day} {from_hour}:00 does not exist")))?;
    let end = at_hour(day, to_hour, tz)
        .ok_or_else(|| AnalysisError::InvalidRange(format!("{day} {to_hour}:00 does not exist")))?;
    TimeRange::new(start, end)
}

/// Part of `range` falling on calendar `day` in `tz`, if any.
pub fn clip_to_day<Tz: TimeZone>(range: &TimeRange, day: NaiveDate, tz: &Tz) -> Option<TimeRange> {
    let whole_day = hour_window(day, 0, 24, tz).ok()?;
    let start = range.start.max(whole_day.start);
    let end = range.end.min(whole_day.end);
    if start < end {
        Some(TimeRange { start, end })
    } else {
        None
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Tz;

    fn dt(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn range(a: &str, b: &str) -> TimeRange {
        TimeRange::new(dt(a), dt(b)).unwrap()
    }

    #[test]
    fn rejects_end_before_start() {
        let err = TimeRange::new(dt("2025-03-03T10:00:00+00:00"), dt("2025-03-03T09:00:00+00:00"));
        assert!(matches!(err, Err(AnalysisError::InvalidRange(_))));
    }

    #[test]
    fn overlap_is_symmetric() {
        let a = range("2025-03-03T09:00:00+00:00", "2025-03-03T11:00:00+00:00");
        let b = range("2025-03-03T10:30:00+00:00", "2025-03-03T12:00:00+00:00");
        let c = range("2025-03-03T13:00:00+00:00", "2025-03-03T14:00:00+00:00");
        assert!(overlaps(&a, &b));
        assert!(overlaps(&b, &a));
        assert!(!overlaps(&a, &c));
        assert!(!overlaps(&c, &a));
        assert!(overlaps(&a, &a));
    }

    #[test]
    fn touching_ranges_do_not_overlap() {
        let a = range("2025-03-03T09:00:00+00:00", "2025-03-03T10:00:00+00:00");
        let b = range("2025-03-03T10:00:00+00:00", "2025-03-03T11:00:00+00:00");
        assert!(!overlaps(&a, &b));
    }

    #[test]
    fn overlap_compares_instants_across_offsets() {
        let a = range("2025-03-03T09:00:00+00:00", "2025-03-03T10:00:00+00:00");
        let b = range("2025-03-03T16:30:00+07:00", "2025-03-03T17:30:00+07:00");
        assert!(overlaps(&a, &b));
    }

    #[test]
    fn zero_length_range_only_overlaps_itself() {
        let point = range("2025-03-03T09:30:00+00:00", "2025-03-03T09:30:00+00:00");
        let around = range("2025-03-03T09:00:00+00:00", "2025-03-03T10:00:00+00:00");
        assert!(overlaps(&point, &point));
        assert!(!overlaps(&point, &around));
        assert!(!overlaps(&around, &point));
        assert_eq!(point.duration_minutes(), 0);
    }

    #[test]
    fn hour_depends_on_timezone() {
        let instant = dt("2025-03-03T02:15:00+00:00");
        let saigon: Tz = "Asia/Ho_Chi_Minh".parse().unwrap();
        assert_eq!(hour_of(&instant, &chrono_tz::UTC), 2);
        assert_eq!(hour_of(&instant, &saigon), 9);
        assert_eq!(weekday_of(&dt("2025-03-02T23:00:00+00:00"), &saigon), Weekday::Mon);
    }

    #[test]
    fn clip_keeps_only_the_requested_day() {
        let overnight = range("2025-03-03T22:00:00+00:00", "2025-03-04T02:00:00+00:00");
        let day = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        let clipped = clip_to_day(&overnight, day, &chrono_tz::UTC).unwrap();
        assert_eq!(clipped.start, dt("2025-03-04T00:00:00+00:00"));
        assert_eq!(clipped.duration_minutes(), 120);

        let other_day = NaiveDate::from_ymd_opt(2025, 3, 6).unwrap();
        assert!(clip_to_day(&overnight, other_day, &chrono_tz::UTC).is_none());
    }

    #[test]
    fn hour_window_rolls_past_midnight() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let w = hour_window(day, 20, 26, &chrono_tz::UTC).unwrap();
        assert_eq!(w.end, dt("2025-03-04T02:00:00+00:00"));
        assert_eq!(w.duration_minutes(), 360);
    }

    #[test]
    fn at_hour_out_of_range_is_none() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        assert!(at_hour(day, 4_000_000_000, &chrono_tz::UTC).is_none());
        assert!(hour_window(day, 8, u32::MAX, &chrono_tz::UTC).is_err());
    }
}
