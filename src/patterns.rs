/*
Recurring activity detection.
An activity recurs when the same title, weekday, start hour and category
show up at least `min_frequency` times in the lookback window.
*/

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, TimeZone, Weekday};
use serde::{Deserialize, Serialize};

use crate::aggregate::in_window;
use crate::error::AnalysisResult;
use crate::models::{Category, OwnerId, ScheduleEntry};
use crate::timerange::{hour_of, weekday_name, weekday_of};

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PatternQuery {
    pub min_frequency: usize,
    pub max_patterns: usize,
}

impl Default for PatternQuery {
    fn default() -> Self {
        PatternQuery {
            min_frequency: 3,
            max_patterns: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Pattern {
    pub title: String,
    pub weekday: Weekday,
    pub hour: u32,
    pub category: Category,
    pub frequency: usize,
}

/// Recurring activities, most frequent first.
///
/// Groups with equal frequency keep the order in which they were first seen.
pub fn detect_patterns<Tz: TimeZone>(
    entries: &[ScheduleEntry],
    owner: OwnerId,
    window_days: i64,
    now: DateTime<FixedOffset>,
    tz: &Tz,
    query: &PatternQuery,
) -> AnalysisResult<Vec<Pattern>> {
    let (_, filtered) = in_window(entries, owner, window_days, now)?;

    let mut index: HashMap<(&str, Weekday, u32, Category), usize> = HashMap::new();
    let mut groups: Vec<Pattern> = Vec::new();
    for e in filtered {
        let weekday = weekday_of(&e.start, tz);
        let hour = hour_of(&e.start, tz);
        let key = (e.title.as_str(), weekday, hour, e.category);
        match index.get(&key) {
            Some(&i) => groups[i].frequency += 1,
            None => {
                index.insert(key, groups.len());
                groups.push(Pattern {
                    title: e.title.clone(),
                    weekday,
                    hour,
                    category: e.category,
                    frequency: 1,
                });
            }
        }
    }

    groups.retain(|p| p.frequency >= query.min_frequency);
    groups.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    groups.truncate(query.max_patterns);
    Ok(groups)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SmartReminder {
    pub activity: String,
    pub suggestion: String,
    pub frequency: usize,
    pub pattern: Pattern,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SmartReminders {
    pub message: String,
    pub reminders: Vec<SmartReminder>,
}

pub fn smart_reminders(patterns: Vec<Pattern>, display_name: &str) -> SmartReminders {
    let reminders = patterns
        .into_iter()
        .map(|p| SmartReminder {
            activity: p.title.clone(),
            suggestion: format!(
                "You usually have \"{}\" on {} at {}:00. Do you want to create this entry automatically?",
                p.title,
                weekday_name(p.weekday),
                p.hour
            ),
            frequency: p.frequency,
            pattern: p,
        })
        .collect();

    SmartReminders {
        message: format!(
            "{display_name}, I noticed some recurring activities in your schedule. Let me help you automate them!"
        ),
        reminders,
    }
}
