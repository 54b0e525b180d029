use chrono::{DateTime, Duration, FixedOffset};
use uuid::Uuid;

use crate::models::{Category, OwnerId, Priority, ScheduleEntry};

pub fn dt(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

pub fn entry(
    owner: OwnerId,
    title: &str,
    start: &str,
    minutes: i64,
    category: Category,
    completed: bool,
) -> ScheduleEntry {
    let start = dt(start);
    ScheduleEntry {
        id: Uuid::new_v4(),
        owner,
        title: title.to_string(),
        description: None,
        location: None,
        start,
        end: start + Duration::minutes(minutes),
        category,
        priority: Priority::Medium,
        color: "#3B82F6".to_string(),
        reminder_min: 15,
        completed,
        duration_min: Some(minutes),
        created_at: start,
    }
}
