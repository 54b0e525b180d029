/*
Habit report: the rolling-window statistics re-ranked for display, plus
personal insight cards derived from them.
*/

use chrono::Weekday;
use serde::Serialize;

use crate::aggregate::{AggregateStats, DayLoad, DurationBucket, RateBucket};
use crate::timerange::weekday_name;

/// Heaviest days shown in the workload table.
pub const WORKLOAD_TOP: usize = 10;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    BestTime,
    OptimalDuration,
    ProductiveDay,
    WorkloadWarning,
    Improvement,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InsightCard {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DurationRow {
    pub bucket: DurationBucket,
    pub label: &'static str,
    pub total: usize,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeekdayRow {
    pub weekday: Weekday,
    pub day_name: &'static str,
    pub total: usize,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HabitReport {
    /// Hours ranked by completion rate, best first
    pub time_analysis: Vec<RateBucket<u32>>,
    /// Duration buckets ranked by completion rate, best first
    pub duration_analysis: Vec<DurationRow>,
    /// Monday first
    pub day_analysis: Vec<WeekdayRow>,
    /// Heaviest days first
    pub workload_analysis: Vec<DayLoad>,
    pub insights: Vec<InsightCard>,
}

// Stable: equal rates keep their natural order.
fn ranked<T: Clone>(items: &[T], rate: impl Fn(&T) -> f64) -> Vec<T> {
    let mut out = items.to_vec();
    out.sort_by(|a, b| rate(b).total_cmp(&rate(a)));
    out
}

pub fn habit_report(stats: &AggregateStats, display_name: &str) -> HabitReport {
    let time_analysis = ranked(&stats.by_hour, |b| b.completion_rate);

    let duration_analysis: Vec<DurationRow> = ranked(&stats.by_duration, |b| b.completion_rate)
        .into_iter()
        .map(|b| DurationRow {
            bucket: b.key,
            label: b.key.label(),
            total: b.total,
            completion_rate: b.completion_rate,
        })
        .collect();

    let day_analysis: Vec<WeekdayRow> = stats
        .by_weekday
        .iter()
        .map(|b| WeekdayRow {
            weekday: b.key,
            day_name: weekday_name(b.key),
            total: b.total,
            completion_rate: b.completion_rate,
        })
        .collect();

    let mut workload_analysis = stats.daily.clone();
    workload_analysis.sort_by(|a, b| b.minutes.cmp(&a.minutes));
    workload_analysis.truncate(WORKLOAD_TOP);

    HabitReport {
        insights: insight_cards(stats, display_name),
        time_analysis,
        duration_analysis,
        day_analysis,
        workload_analysis,
    }
}

/// Cards in display order; the improvement card is always last.
pub fn insight_cards(stats: &AggregateStats, display_name: &str) -> Vec<InsightCard> {
    let mut cards = Vec::new();

    if let Some(best) = stats.best_hour() {
        cards.push(InsightCard {
            kind: InsightKind::BestTime,
            title: "⭐ Your golden hour".to_string(),
            message: format!(
                "{display_name}, you work best around {}:00 with a {:.1}% completion rate. Put your most important work in this slot!",
                best.key, best.completion_rate
            ),
        });
    }

    if let Some(best) = stats.best_duration_bucket() {
        cards.push(InsightCard {
            kind: InsightKind::OptimalDuration,
            title: "⏱️ Your ideal session length".to_string(),
            message: format!(
                "You tend to finish entries of {} best. Split large tasks into pieces of this size!",
                best.key.label()
            ),
        });
    }

    if let Some(best) = stats.best_weekday() {
        cards.push(InsightCard {
            kind: InsightKind::ProductiveDay,
            title: "📅 Your most productive day".to_string(),
            message: format!(
                "{} is your most productive day with a {:.1}% completion rate. Use it for important deadlines!",
                weekday_name(best.key),
                best.completion_rate
            ),
        });
    }

    let overloaded = stats.overloaded_days();
    if overloaded > 0 {
        cards.push(InsightCard {
            kind: InsightKind::WorkloadWarning,
            title: "⚠️ Overload warning".to_string(),
            message: format!(
                "You have {overloaded} day(s) with more than 50% above your average workload. Remember to balance and rest!"
            ),
        });
    }

    cards.push(InsightCard {
        kind: InsightKind::Improvement,
        title: "💡 Suggestions".to_string(),
        message: "Based on the analysis you should: 1) keep important work in your golden hour, 2) split tasks to your ideal session length, 3) put deadlines on your most productive day, 4) avoid packing too much into a single day.".to_string(),
    });

    cards
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::models::{Category, ScheduleEntry};
    use crate::testutil::{dt, entry};
    use uuid::Uuid;

    const NOW: &str = "2025-03-10T20:00:00+00:00";

    fn report(entries: &[ScheduleEntry], owner: Uuid) -> HabitReport {
        let stats = aggregate(entries, owner, 30, dt(NOW), &chrono_tz::UTC).unwrap();
        habit_report(&stats, "An")
    }

    #[test]
    fn empty_history_only_suggests_improvements() {
        let r = report(&[], Uuid::new_v4());
        assert!(r.time_analysis.is_empty());
        assert!(r.workload_analysis.is_empty());
        assert_eq!(r.insights.len(), 1);
        assert_eq!(r.insights[0].kind, InsightKind::Improvement);
    }

    #[test]
    fn rankings_are_best_first_and_stable() {
        let owner = Uuid::new_v4();
        let entries = vec![
            // 9:00 -> 50%, 14:00 -> 100%, 16:00 -> 100%
            entry(owner, "a", "2025-03-03T09:00:00+00:00", 60, Category::Work, true),
            entry(owner, "b", "2025-03-04T09:00:00+00:00", 60, Category::Work, false),
            entry(owner, "c", "2025-03-04T16:00:00+00:00", 150, Category::Study, true),
            entry(owner, "d", "2025-03-05T14:00:00+00:00", 90, Category::Work, true),
        ];
        let r = report(&entries, owner);
        let hours: Vec<u32> = r.time_analysis.iter().map(|b| b.key).collect();
        assert_eq!(hours, vec![14, 16, 9]);

        let buckets: Vec<DurationBucket> = r.duration_analysis.iter().map(|d| d.bucket).collect();
        assert_eq!(
            buckets,
            vec![DurationBucket::UpTo90, DurationBucket::Over120, DurationBucket::UpTo60]
        );
        assert_eq!(r.duration_analysis[2].label, "30-60 minutes");

        let days: Vec<&str> = r.day_analysis.iter().map(|d| d.day_name).collect();
        assert_eq!(days, vec!["Monday", "Tuesday", "Wednesday"]);

        assert_eq!(r.workload_analysis[0].minutes, 210);
    }

    #[test]
    fn cards_name_the_best_slots() {
        let owner = Uuid::new_v4();
        let entries = vec![
            entry(owner, "a", "2025-03-03T09:00:00+00:00", 60, Category::Work, false),
            entry(owner, "b", "2025-03-05T15:00:00+00:00", 60, Category::Work, true),
        ];
        let r = report(&entries, owner);
        let kinds: Vec<InsightKind> = r.insights.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                InsightKind::BestTime,
                InsightKind::OptimalDuration,
                InsightKind::ProductiveDay,
                InsightKind::Improvement,
            ]
        );
        assert!(r.insights[0].message.contains("around 15:00 with a 100.0%"));
        assert!(r.insights[2].message.starts_with("Wednesday"));
    }

    #[test]
    fn workload_table_is_capped_and_warns_on_overload() {
        let owner = Uuid::new_v4();
        let mut entries: Vec<ScheduleEntry> = (1..=12)
            .map(|d| {
                let start = format!("2025-02-{:02}T09:00:00+00:00", d + 10);
                entry(owner, "routine", &start, 60, Category::Work, true)
            })
            .collect();
        entries.push(entry(owner, "crunch", "2025-03-01T08:00:00+00:00", 600, Category::Work, true));

        let r = report(&entries, owner);
        assert_eq!(r.workload_analysis.len(), WORKLOAD_TOP);
        assert_eq!(r.workload_analysis[0].minutes, 600);
        let warning = r.insights.iter().find(|c| c.kind == InsightKind::WorkloadWarning).unwrap();
        assert!(warning.message.contains("1 day(s)"));
    }

    #[test]
    fn cards_serialize_with_type_tag() {
        let card = InsightCard {
            kind: InsightKind::BestTime,
            title: "t".into(),
            message: "m".into(),
        };
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["type"], "best_time");
    }
}
