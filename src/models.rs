use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every schedule entry, notification and advice record belongs to exactly one owner.
pub type OwnerId = Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Work,
    Study,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::Study => "study",
            Category::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: Uuid,
    pub owner: OwnerId,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub category: Category,
    #[serde(default)]
    pub priority: Priority,
    pub color: String,
    pub reminder_min: i64,
    pub completed: bool,
    // stored copy, may drift from end - start
    #[serde(default)]
    pub duration_min: Option<i64>,
    pub created_at: DateTime<FixedOffset>,
}

impl ScheduleEntry {
    /// Length of the entry in whole minutes, always recomputed from `start`/`end`.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes().max(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: OwnerId,
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<FixedOffset>,
    pub last_login: Option<DateTime<FixedOffset>>,
}

/// User as returned over the API, without credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: OwnerId,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub last_login: Option<DateTime<FixedOffset>>,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        PublicUser {
            id: u.id,
            username: u.username.clone(),
            full_name: u.full_name.clone(),
            email: u.email.clone(),
            phone: u.phone.clone(),
            created_at: u.created_at,
            last_login: u.last_login,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Reminder,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub owner: OwnerId,
    pub schedule_id: Option<Uuid>,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: DateTime<FixedOffset>,
}

/// One line of the append-only assistant log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdviceRecord {
    pub id: Uuid,
    pub owner: OwnerId,
    pub category: String,
    pub text: String,
    pub created_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Db {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub schedules: Vec<ScheduleEntry>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub suggestions: Vec<AdviceRecord>,
}
