/*
Goal-driven advice and weekly plan templates.
Both are fixed templates personalised with the owner's recent numbers.
*/

use std::collections::BTreeMap;

use chrono::{TimeZone, Weekday};
use serde::Serialize;

use crate::aggregate::AggregateStats;
use crate::models::{Category, ScheduleEntry};
use crate::timerange::{hour_of, weekday_name};

pub const DEFAULT_WORK_HOUR: u32 = 9;
pub const DEFAULT_STUDY_HOUR: u32 = 19;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    ImproveProductivity,
    WorkLifeBalance,
    StudyBetter,
}

impl Goal {
    /// Unrecognised goals get no goal-specific recommendations.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "improve_productivity" => Some(Goal::ImproveProductivity),
            "work_life_balance" => Some(Goal::WorkLifeBalance),
            "study_better" => Some(Goal::StudyBetter),
            _ => None,
        }
    }

    fn recommendations(&self) -> &'static [&'static str] {
        match self {
            Goal::ImproveProductivity => &[
                "🎯 Apply the 80/20 rule: focus on the 20% of work that produces 80% of the results",
                "⏰ Use the Pomodoro technique: 25 minutes of focus + 5 minutes of rest",
                "📝 Write tomorrow's to-do list every evening",
                "🚫 Remove distractions during working hours",
            ],
            Goal::WorkLifeBalance => &[
                "⚖️ Set a clear boundary between working hours and personal time",
                "🧘 Spend at least 30 minutes a day on something relaxing",
                "👨‍👩‍👧‍👦 Make time for family and friends",
                "💤 Get 7-8 hours of sleep every night",
            ],
            Goal::StudyBetter => &[
                "📚 Use Active Recall: test yourself instead of re-reading",
                "🔄 Spaced Repetition: review at growing intervals",
                "🗺️ Build mind maps to connect ideas",
                "👥 Study in groups to exchange and reinforce knowledge",
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserSnapshot {
    pub total_schedules: usize,
    pub completion_rate: f64,
    pub avg_duration_minutes: f64,
    pub work_minutes: i64,
    pub study_minutes: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActionStage {
    pub week: &'static str,
    pub focus: &'static str,
    pub tasks: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PersonalAdvice {
    pub greeting: String,
    pub goal: Option<Goal>,
    pub snapshot: UserSnapshot,
    pub analysis: Vec<String>,
    pub recommendations: Vec<String>,
    pub action_plan: Vec<ActionStage>,
}

fn action_plan() -> Vec<ActionStage> {
    vec![
        ActionStage {
            week: "1",
            focus: "Build the habit",
            tasks: vec![
                "Pick your top 3 priority goals",
                "Set fixed slots for important work",
                "Track actual time against your estimates",
            ],
        },
        ActionStage {
            week: "2",
            focus: "Optimise",
            tasks: vec![
                "Adjust the schedule using week 1 data",
                "Apply productivity techniques",
                "Cut unnecessary work",
            ],
        },
        ActionStage {
            week: "3-4",
            focus: "Sustain and improve",
            tasks: vec![
                "Review progress",
                "Adjust goals if needed",
                "Turn routines into lasting habits",
            ],
        },
    ]
}

pub fn personal_advice(goal: Option<Goal>, stats: &AggregateStats, display_name: &str) -> PersonalAdvice {
    let snapshot = UserSnapshot {
        total_schedules: stats.total,
        completion_rate: stats.completion_rate,
        avg_duration_minutes: if stats.total == 0 {
            0.0
        } else {
            stats.total_minutes() as f64 / stats.total as f64
        },
        work_minutes: stats.minutes_for(Category::Work),
        study_minutes: stats.minutes_for(Category::Study),
    };

    let mut analysis = Vec::new();
    if stats.completion_rate < 60.0 {
        analysis.push(
            "📊 Your completion rate is currently low. You may be scheduling too much or setting unrealistic goals."
                .to_string(),
        );
    } else if stats.completion_rate >= 80.0 {
        analysis.push("🎉 Great! You are keeping a very good completion rate. Keep it up!".to_string());
    }

    let recommendations = goal
        .map(|g| g.recommendations().iter().map(|r| r.to_string()).collect())
        .unwrap_or_default();

    PersonalAdvice {
        greeting: format!("Hello {display_name}!"),
        goal,
        snapshot,
        analysis,
        recommendations,
        action_plan: action_plan(),
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    Work,
    Study,
}

impl PlanType {
    /// Anything other than "study" plans work.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("study") {
            PlanType::Study
        } else {
            PlanType::Work
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Session {
    pub time: String,
    pub activity: &'static str,
    pub note: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DayPlan {
    pub weekday: Weekday,
    pub day: &'static str,
    pub sessions: Vec<Session>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PersonalPlan {
    pub title: String,
    pub plan_type: PlanType,
    pub duration: Option<String>,
    pub preferred_hour: u32,
    pub schedule: Vec<DayPlan>,
    pub tips: Vec<&'static str>,
}

/// Most frequent start hour among completed entries of `category`.
/// Ties go to the earlier hour.
pub fn preferred_hour<Tz: TimeZone>(history: &[&ScheduleEntry], category: Category, tz: &Tz) -> Option<u32> {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for e in history.iter().filter(|e| e.completed && e.category == category) {
        *counts.entry(hour_of(&e.start, tz)).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .fold(None, |best: Option<(u32, usize)>, (hour, n)| match best {
            Some((_, top)) if top >= n => best,
            _ => Some((hour, n)),
        })
        .map(|(hour, _)| hour)
}

fn span(from: u32, from_min: u32, to: u32, to_min: u32) -> String {
    format!("{}:{:02} - {}:{:02}", from % 24, from_min, to % 24, to_min)
}

fn weekday_sessions(plan_type: PlanType, hour: u32) -> Vec<Session> {
    match plan_type {
        PlanType::Study => vec![
            Session {
                time: span(hour, 0, hour + 2, 0),
                activity: "Theory / lectures",
                note: "Focus on the hard concepts",
            },
            Session {
                time: span(hour + 2, 30, hour + 3, 30),
                activity: "Practice exercises",
                note: "Apply what you learned",
            },
        ],
        PlanType::Work => vec![
            Session {
                time: span(hour, 0, hour + 2, 0),
                activity: "Deep Work: the most important task",
                note: "Notifications off, full focus",
            },
            Session {
                time: span(hour + 2, 30, hour + 4, 30),
                activity: "Meetings, email, secondary tasks",
                note: "Handle work that needs less focus",
            },
        ],
    }
}

/// Seven-day template built around the owner's preferred hour.
///
/// `history` is the owner's recent entries; only completed ones of the
/// planned category are considered.
pub fn personal_plan<Tz: TimeZone>(
    plan_type: PlanType,
    duration: Option<String>,
    history: &[&ScheduleEntry],
    display_name: &str,
    tz: &Tz,
) -> PersonalPlan {
    let (category, fallback, label) = match plan_type {
        PlanType::Study => (Category::Study, DEFAULT_STUDY_HOUR, "study"),
        PlanType::Work => (Category::Work, DEFAULT_WORK_HOUR, "work"),
    };
    let hour = preferred_hour(history, category, tz).unwrap_or(fallback);

    let week = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];
    let schedule = week
        .into_iter()
        .map(|weekday| {
            let sessions = match weekday {
                Weekday::Sat => vec![Session {
                    time: "09:00 - 12:00".to_string(),
                    activity: "Personal project / weekly review",
                    note: "Wrap up the week and plan the next one",
                }],
                Weekday::Sun => vec![Session {
                    time: "09:00 - 12:00".to_string(),
                    activity: "Rest / personal activities",
                    note: "Recharge",
                }],
                _ => weekday_sessions(plan_type, hour),
            };
            DayPlan {
                weekday,
                day: weekday_name(weekday),
                sessions,
            }
        })
        .collect();

    PersonalPlan {
        title: format!("{display_name}'s personal {label} plan"),
        plan_type,
        duration,
        preferred_hour: hour,
        schedule,
        tips: vec![
            "💪 Start the day with the hardest task (Eat the Frog)",
            "⏰ Set a timer for each session to stay focused",
            "📝 End-of-day review: what got done, what is missing",
            "🎯 Adjust when needed, but keep the routine",
        ],
    }
}
