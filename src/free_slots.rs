/*
Free slot finder.
Coarse hour-granularity scan over a working-hours window; partial-hour
bookings block every whole-hour candidate they touch.
*/

use chrono::{NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};
use crate::timerange::{hour_window, TimeRange};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    DeepWork,        // before noon
    MeetingsOrStudy, // noon and later
}

impl SlotKind {
    fn for_start_hour(hour: u32) -> Self {
        if hour < 12 {
            SlotKind::DeepWork
        } else {
            SlotKind::MeetingsOrStudy
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SlotKind::DeepWork => "good for deep work",
            SlotKind::MeetingsOrStudy => "good for meetings/study",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FreeSlot {
    pub title: String,
    pub start_hour: u32,
    pub end_hour: u32,
    pub kind: SlotKind,
    pub suggestion: &'static str,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SlotQuery {
    pub work_start: u32,
    pub work_end: u32,
    pub slot_hours: u32,
    pub max_slots: usize,
}

impl Default for SlotQuery {
    fn default() -> Self {
        SlotQuery {
            work_start: 8,
            work_end: 18,
            slot_hours: 2,
            max_slots: 3,
        }
    }
}

impl SlotQuery {
    /// Working hours must fit in one day and hold at least one slot.
    pub fn validate(&self) -> AnalysisResult<()> {
        if self.work_start >= self.work_end || self.work_end > 24 {
            return Err(AnalysisError::InvalidRange(format!(
                "working hours {}-{} must satisfy start < end <= 24",
                self.work_start, self.work_end
            )));
        }
        if self.slot_hours == 0 || self.slot_hours > self.work_end - self.work_start {
            return Err(AnalysisError::InvalidRange(format!(
                "slot length {}h does not fit in {}-{}",
                self.slot_hours, self.work_start, self.work_end
            )));
        }
        Ok(())
    }
}

/// Find up to `max_slots` free `[h, h + slot_hours)` windows on `day`.
///
/// Process:
/// - Start the cursor at work_start
/// - A free candidate is taken and the cursor jumps to its end
/// - A busy candidate moves the cursor one hour forward
/// - Candidates may end exactly at work_end, never after
pub fn find_free_slots<Tz: TimeZone>(
    busy: &[TimeRange],
    day: NaiveDate,
    tz: &Tz,
    query: &SlotQuery,
) -> Vec<FreeSlot> {
    let mut slots = Vec::new();
    if query.work_end <= query.work_start || query.slot_hours == 0 || query.max_slots == 0 {
        return slots;
    }

    let mut hour = query.work_start;
    while slots.len() < query.max_slots {
        let Some(end_hour) = hour.checked_add(query.slot_hours).filter(|&end| end <= query.work_end) else {
            break;
        };

        // Nonexistent local times (DST gap) are skipped.
        let Ok(candidate) = hour_window(day, hour, end_hour, tz) else {
            hour += 1;
            continue;
        };

        if busy.iter().any(|b| b.overlaps(&candidate)) {
            hour += 1;
            continue;
        }

        let kind = SlotKind::for_start_hour(hour);
        slots.push(FreeSlot {
            title: format!("Free {hour}:00 - {end_hour}:00"),
            start_hour: hour,
            end_hour,
            kind,
            suggestion: kind.label(),
        });
        hour = end_hour;
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};

    fn dt(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
    }

    fn busy(a: &str, b: &str) -> TimeRange {
        TimeRange::new(dt(a), dt(b)).unwrap()
    }

    fn hours(slots: &[FreeSlot]) -> Vec<(u32, u32)> {
        slots.iter().map(|s| (s.start_hour, s.end_hour)).collect()
    }

    #[test]
    fn empty_day_returns_consecutive_slots_from_work_start() {
        let slots = find_free_slots(&[], day(), &chrono_tz::UTC, &SlotQuery::default());
        assert_eq!(hours(&slots), vec![(8, 10), (10, 12), (12, 14)]);
        assert_eq!(slots[0].kind, SlotKind::DeepWork);
        assert_eq!(slots[1].suggestion, "good for deep work");
        assert_eq!(slots[2].kind, SlotKind::MeetingsOrStudy);
        assert_eq!(slots[0].title, "Free 8:00 - 10:00");
    }

    #[test]
    fn busy_range_pushes_candidates_forward() {
        let meeting = busy("2025-03-03T09:00:00+00:00", "2025-03-03T10:00:00+00:00");
        let slots = find_free_slots(&[meeting], day(), &chrono_tz::UTC, &SlotQuery::default());
        assert_eq!(hours(&slots), vec![(10, 12), (12, 14), (14, 16)]);
    }

    #[test]
    fn partial_hour_booking_blocks_whole_candidates() {
        let call = busy("2025-03-03T11:45:00+00:00", "2025-03-03T12:15:00+00:00");
        let query = SlotQuery { max_slots: 10, ..SlotQuery::default() };
        let slots = find_free_slots(&[call], day(), &chrono_tz::UTC, &query);
        assert_eq!(hours(&slots), vec![(8, 10), (13, 15), (15, 17)]);
    }

    #[test]
    fn slots_never_overlap_busy_ranges_and_are_ascending() {
        let ranges = vec![
            busy("2025-03-03T08:30:00+00:00", "2025-03-03T09:00:00+00:00"),
            busy("2025-03-03T13:00:00+00:00", "2025-03-03T15:00:00+00:00"),
        ];
        let query = SlotQuery { slot_hours: 1, max_slots: 20, ..SlotQuery::default() };
        let slots = find_free_slots(&ranges, day(), &chrono_tz::UTC, &query);
        assert!(slots.len() <= query.max_slots);
        for pair in slots.windows(2) {
            assert!(pair[0].end_hour <= pair[1].start_hour);
        }
        for slot in &slots {
            let w = hour_window(day(), slot.start_hour, slot.end_hour, &chrono_tz::UTC).unwrap();
            assert!(ranges.iter().all(|r| !r.overlaps(&w)));
        }
        assert_eq!(hours(&slots), vec![(9, 10), (10, 11), (11, 12), (12, 13), (15, 16), (16, 17), (17, 18)]);
    }

    #[test]
    fn busy_ranges_are_compared_in_the_callers_timezone() {
        // 09:00-10:00 in Saigon is 02:00-03:00 UTC
        let saigon: chrono_tz::Tz = "Asia/Ho_Chi_Minh".parse().unwrap();
        let meeting = busy("2025-03-03T02:00:00+00:00", "2025-03-03T03:00:00+00:00");
        let slots = find_free_slots(&[meeting], day(), &saigon, &SlotQuery::default());
        assert_eq!(hours(&slots), vec![(10, 12), (12, 14), (14, 16)]);
    }

    #[test]
    fn degenerate_windows_return_nothing() {
        let inverted = SlotQuery { work_start: 18, work_end: 8, ..SlotQuery::default() };
        assert!(find_free_slots(&[], day(), &chrono_tz::UTC, &inverted).is_empty());

        let too_long = SlotQuery { slot_hours: 12, ..SlotQuery::default() };
        assert!(find_free_slots(&[], day(), &chrono_tz::UTC, &too_long).is_empty());

        let exact = SlotQuery { slot_hours: 10, ..SlotQuery::default() };
        assert_eq!(hours(&find_free_slots(&[], day(), &chrono_tz::UTC, &exact)), vec![(8, 18)]);
    }

    #[test]
    fn huge_hour_values_do_not_overflow() {
        let long_slot = SlotQuery { slot_hours: u32::MAX, ..SlotQuery::default() };
        assert!(find_free_slots(&[], day(), &chrono_tz::UTC, &long_slot).is_empty());

        let far_hours = SlotQuery {
            work_start: 4_000_000_000,
            work_end: 4_000_000_010,
            ..SlotQuery::default()
        };
        assert!(find_free_slots(&[], day(), &chrono_tz::UTC, &far_hours).is_empty());
    }

    #[test]
    fn validate_rejects_windows_outside_one_day() {
        assert!(SlotQuery::default().validate().is_ok());
        assert!(SlotQuery { slot_hours: 10, ..SlotQuery::default() }.validate().is_ok());

        let bad = [
            SlotQuery { work_start: 18, work_end: 8, ..SlotQuery::default() },
            SlotQuery { work_end: 25, ..SlotQuery::default() },
            SlotQuery { slot_hours: 0, ..SlotQuery::default() },
            SlotQuery { slot_hours: 11, ..SlotQuery::default() },
            SlotQuery { slot_hours: u32::MAX, ..SlotQuery::default() },
            SlotQuery { work_start: 4_000_000_000, work_end: 4_000_000_010, ..SlotQuery::default() },
        ];
        for query in bad {
            assert!(matches!(query.validate(), Err(AnalysisError::InvalidRange(_))), "{query:?}");
        }
    }
}
