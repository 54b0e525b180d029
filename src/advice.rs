/*
Rule-based assistant.
Intent classification is an ordered keyword table; advice rendering is an
ordered table of (predicate, template) rules per intent. Both tables are
evaluated first-match-wins, so their order is part of the observable behavior.
*/

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateStats;
use crate::models::{Category, OwnerId};
use crate::statistics::round1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IntentCategory {
    ScheduleOverview,
    Productivity,
    TimeManagement,
    Study,
    Work,
    Optimization,
    Greeting,
    Thanks,
    Unknown,
}

impl IntentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentCategory::ScheduleOverview => "schedule_overview",
            IntentCategory::Productivity => "productivity",
            IntentCategory::TimeManagement => "time_management",
            IntentCategory::Study => "study",
            IntentCategory::Work => "work",
            IntentCategory::Optimization => "optimization",
            IntentCategory::Greeting => "greeting",
            IntentCategory::Thanks => "thanks",
            IntentCategory::Unknown => "unknown",
        }
    }
}

/// Lower-case substrings per intent, tested top to bottom.
pub const KEYWORDS: &[(IntentCategory, &[&str])] = &[
    (
        IntentCategory::ScheduleOverview,
        &["lịch", "kế hoạch", "phân tích", "schedule", "plan", "analy"],
    ),
    (
        IntentCategory::Productivity,
        &["hiệu suất", "năng suất", "performance", "productiv"],
    ),
    (
        IntentCategory::TimeManagement,
        &["thời gian", "quản lý", "time", "manage"],
    ),
    (IntentCategory::Study, &["học", "ôn thi", "study", "exam"]),
    (IntentCategory::Work, &["làm việc", "công việc", "work", "job"]),
    (
        IntentCategory::Optimization,
        &["tối ưu", "cải thiện", "improve", "optimi"],
    ),
    (IntentCategory::Greeting, &["xin chào", "hello", "hi"]),
    (IntentCategory::Thanks, &["cảm ơn", "thanks", "thank"]),
];

pub fn classify_intent(message: &str) -> IntentCategory {
    let lower = message.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(category, _)| *category)
        .unwrap_or(IntentCategory::Unknown)
}

// Completion-rate bands: <50, 50..<80, >=80
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RateBand {
    Low,
    Moderate,
    High,
}

impl RateBand {
    pub fn of(rate: f64) -> Self {
        if rate < 50.0 {
            RateBand::Low
        } else if rate < 80.0 {
            RateBand::Moderate
        } else {
            RateBand::High
        }
    }
}

/// Values interpolated into advice templates.
pub struct AdviceContext<'a> {
    pub name: &'a str,
    pub message: &'a str,
    pub stats: &'a AggregateStats,
}

impl AdviceContext<'_> {
    fn band(&self) -> RateBand {
        RateBand::of(self.stats.completion_rate)
    }

    fn rate(&self) -> String {
        format!("{:.1}", self.stats.completion_rate)
    }

    fn days(&self) -> i64 {
        (self.stats.window_end - self.stats.window_start).num_days().max(1)
    }

    fn work_hours(&self) -> i64 {
        self.stats.hours_for(Category::Work).round() as i64
    }

    fn study_hours(&self) -> i64 {
        self.stats.hours_for(Category::Study).round() as i64
    }

    fn tracked_hours(&self) -> f64 {
        self.stats.hours_for(Category::Work) + self.stats.hours_for(Category::Study)
    }
}

type Predicate = fn(&AdviceContext) -> bool;
type Render = fn(&AdviceContext) -> String;

struct Rule {
    when: Predicate,
    render: Render,
}

struct Template {
    category: IntentCategory,
    header: Render,
    rules: &'static [Rule],
}

fn low(c: &AdviceContext) -> bool {
    c.band() == RateBand::Low
}

fn moderate(c: &AdviceContext) -> bool {
    c.band() == RateBand::Moderate
}

fn high(c: &AdviceContext) -> bool {
    c.band() == RateBand::High
}

const ASK_ME_ABOUT: &str = "You can ask me about:\n- Schedule analysis\n- Improving productivity\n- Time management\n- Studying effectively";

static CATALOG: &[Template] = &[
    Template {
        category: IntentCategory::ScheduleOverview,
        header: |c| {
            format!(
                "📊 **Schedule analysis for {}:**\n\n📈 **Last {} days:**\n• Total entries: {}\n• Completed: {} ({}%)\n• Work time: {} hours\n• Study time: {} hours\n• Total time: {:.1} hours\n\n",
                c.name,
                c.days(),
                c.stats.total,
                c.stats.completed,
                c.rate(),
                c.work_hours(),
                c.study_hours(),
                c.tracked_hours()
            )
        },
        rules: &[
            Rule {
                when: low,
                render: |_| {
                    "⚠️ **Feedback:**\nYour completion rate is low. Some advice:\n• Break work into smaller tasks\n• Prioritise the 2-3 most important things each day\n• Schedule fewer entries and focus on quality\n• Set more realistic deadlines".to_string()
                },
            },
            Rule {
                when: moderate,
                render: |c| {
                    format!(
                        "✅ **Good job!**\nYou are making progress at {}%.\n\n🎯 **To reach 90%+:**\n• Start the day with the hardest task\n• Remove distractions\n• Review what you achieved at the end of the day",
                        c.rate()
                    )
                },
            },
            Rule {
                when: high,
                render: |c| {
                    format!(
                        "🎉 **Excellent!**\nYou are working very effectively! A completion rate of {}% is great.\n\n💡 **To keep it up:**\n• Keep your current pace\n• Challenge yourself with higher goals\n• Share what works with others",
                        c.rate()
                    )
                },
            },
        ],
    },
    Template {
        category: IntentCategory::Productivity,
        header: |c| {
            let per_day = c.tracked_hours() / c.days() as f64;
            let load = if per_day < 4.0 {
                "📈 You have room for more focused hours each day.\n\n"
            } else if per_day > 10.0 {
                "⚠️ You are working a lot! Watch your health and work-life balance.\n\n"
            } else {
                ""
            };
            format!(
                "💪 **Productivity analysis for {}:**\n\n📊 **Current indicators:**\n• Productivity score: {}/100\n• Work time: {}h\n• Study time: {}h\n• Daily average: {:.1}h\n\n{}",
                c.name,
                c.rate(),
                c.work_hours(),
                c.study_hours(),
                per_day,
                load
            )
        },
        rules: &[
            Rule {
                when: low,
                render: |_| {
                    "🚀 **Start with the basics:**\n\n1️⃣ **Pomodoro Technique**\n   • 25 minutes of focus + 5 minutes of rest\n   • A 15-30 minute break after 4 pomodoros\n\n2️⃣ **2-Minute Rule**\n   • If it takes under 2 minutes, do it now\n   • Stop small tasks from piling up\n\n3️⃣ **Fewer, smaller entries**\n   • Plan 5-7 tasks a day at most".to_string()
                },
            },
            Rule {
                when: moderate,
                render: |_| {
                    "🚀 **Ways to go further:**\n\n1️⃣ **80/20 rule**\n   • 20% of the work produces 80% of the results\n   • Focus on the most important work\n\n2️⃣ **Deep Work**\n   • 2-4 hours of uninterrupted focus\n   • Notifications off, phone away\n\n3️⃣ **Time Blocking**\n   • Split the day into fixed blocks\n   • One concrete task per block".to_string()
                },
            },
            Rule {
                when: high,
                render: |_| {
                    "🏆 **You are highly productive. Protect it:**\n• Keep deep work in your best hours\n• Schedule real breaks so the pace lasts\n• Raise the bar with one stretch goal per week".to_string()
                },
            },
        ],
    },
    Template {
        category: IntentCategory::TimeManagement,
        header: |c| {
            format!(
                "⏰ **Effective time management for {}:**\n\n📋 **Eisenhower matrix:**\n1. Urgent + Important → Do now\n2. Important + Not urgent → Schedule\n3. Urgent + Not important → Delegate\n4. Neither → Drop\n\n⚡ **Sample time blocking:**\n• 6-9h: Deep work\n• 9-12h: Meetings & collaboration\n• 13-16h: Administrative tasks\n• 16-18h: Learning & improvement\n• 18h+: Personal time\n\n",
                c.name
            )
        },
        rules: &[
            Rule {
                when: low,
                render: |_| {
                    "🎯 **Plan each day:**\n• The night before: write down the 3 most important tasks\n• Morning: review them and start with the hardest\n• Evening: check what got done and plan tomorrow".to_string()
                },
            },
            Rule {
                when: moderate,
                render: |_| {
                    "💡 **Extra tips:**\n• Learn to say no to unimportant work\n• Batch similar tasks together\n• Keep 10-15% of your time unplanned".to_string()
                },
            },
            Rule {
                when: high,
                render: |c| {
                    format!(
                        "🌟 **Your planning works ({}% done).** Apply the 80/20 rule: find the 20% of tasks that produce 80% of the results and block time for them first.",
                        c.rate()
                    )
                },
            },
        ],
    },
    Template {
        category: IntentCategory::Study,
        header: |c| {
            format!(
                "📚 **Effective study for {}:**\n\n📊 You studied {:.1} hours in the last {} days.\n\n🎓 **Proven techniques:**\n1️⃣ **Active Recall:** test yourself instead of re-reading\n2️⃣ **Spaced Repetition:** review after 1 day → 3 days → 1 week → 1 month\n3️⃣ **Feynman Technique:** explain it as if teaching a child\n4️⃣ **Mind Mapping:** connect ideas visually\n\n",
                c.name,
                c.stats.hours_for(Category::Study),
                c.days()
            )
        },
        rules: &[
            Rule {
                when: low,
                render: |_| {
                    "⏰ **Build a steady routine:**\n• Morning (6-9h): hardest subjects\n• Afternoon (14-17h): exercises and review\n• Evening (19-21h): reading and summaries\n• A 10-15 minute break after every 50 minutes".to_string()
                },
            },
            Rule {
                when: moderate,
                render: |_| {
                    "🔄 **You are on track.** Add one spaced-repetition review per day and turn your notes into flashcards.".to_string()
                },
            },
            Rule {
                when: high,
                render: |_| {
                    "🎉 **Great consistency!** Teach a topic to a friend or join a study group to deepen what you know.".to_string()
                },
            },
        ],
    },
    Template {
        category: IntentCategory::Work,
        header: |c| {
            format!(
                "💼 **Work optimisation for {}:**\n\nYou worked {:.1} hours in the last {} days.\n\n📌 **Principles:**\n• **Eat the Frog:** hardest task first\n• **2-Minute Rule:** under 2 minutes, do it now\n• **Batch Similar Tasks:** group similar work\n• **Time Blocking:** reserve time for each task\n\n",
                c.name,
                c.stats.hours_for(Category::Work),
                c.days()
            )
        },
        rules: &[
            Rule {
                when: low,
                render: |_| {
                    "🚫 **Avoid distractions:**\n• Turn off non-essential notifications\n• Use focus / Do Not Disturb mode\n• Block distracting websites\n• Work somewhere quiet".to_string()
                },
            },
            Rule {
                when: moderate,
                render: |_| {
                    "✅ **Solid progress.** Pick 3 Most Important Tasks each morning and finish them before anything else.".to_string()
                },
            },
            Rule {
                when: high,
                render: |_| {
                    "🏆 **Outstanding follow-through.** Consider a stretch goal or mentoring a colleague.".to_string()
                },
            },
        ],
    },
    Template {
        category: IntentCategory::Optimization,
        header: |c| {
            format!(
                "🎯 **Performance optimisation for {}:**\n\n💪 **Energy & health:**\n• Sleep 7-8 hours a night\n• Exercise 30 minutes a day\n• Eat well and drink enough water\n• Take regular breaks\n\n🧠 **Focus:**\n• Meditate 10 minutes each morning\n• One task at a time\n• Deep work at your peak energy\n• Avoid decision fatigue\n\n📱 **Technology:**\n• Turn off unnecessary notifications\n• Block distracting sites\n• Keep the phone away during important work\n\n",
                c.name
            )
        },
        rules: &[
            Rule {
                when: low,
                render: |_| {
                    "🎯 **First step:** cut today's list to the 3 tasks that matter and finish them.".to_string()
                },
            },
            Rule {
                when: moderate,
                render: |_| {
                    "🎯 **Habits to add:**\n• Wake up at the same time every day\n• Morning exercise\n• Review your work at the end of the day\n• Read 30 minutes before bed".to_string()
                },
            },
            Rule {
                when: high,
                render: |c| {
                    format!(
                        "🎯 **Fine-tuning:** you are at {}%. Track your energy levels and move deep work to your best hour.",
                        c.rate()
                    )
                },
            },
        ],
    },
    Template {
        category: IntentCategory::Greeting,
        header: |c| {
            format!(
                "Hello {}! 👋\n\nI'm your personal assistant. I can help you:\n\n• 📊 Analyse your work and study schedule\n• 💡 Manage your time effectively\n• 🎯 Improve productivity\n• 📚 Study more effectively\n• ⏰ Build an optimal timetable\n\n",
                c.name
            )
        },
        rules: &[
            Rule {
                when: low,
                render: |c| {
                    format!(
                        "Only {}% of your recent entries are done. Want me to look at your schedule?",
                        c.rate()
                    )
                },
            },
            Rule {
                when: moderate,
                render: |c| format!("You're at {}% completion. What should we work on?", c.rate()),
            },
            Rule {
                when: high,
                render: |c| {
                    format!("You're at {}% completion, great work! What can I help with?", c.rate())
                },
            },
        ],
    },
    Template {
        category: IntentCategory::Thanks,
        header: |_| "You're welcome! 😊 I'm always here to help. ".to_string(),
        rules: &[
            Rule {
                when: low,
                render: |_| "Small steps count: finishing one more task tomorrow already moves the needle.".to_string(),
            },
            Rule {
                when: moderate,
                render: |_| "Keep the momentum going!".to_string(),
            },
            Rule {
                when: high,
                render: |_| "Keep up the excellent work!".to_string(),
            },
        ],
    },
    Template {
        category: IntentCategory::Unknown,
        header: |c| {
            let asked = if c.message.trim().is_empty() {
                String::new()
            } else {
                format!("I understand you are asking about \"{}\".\n\n", c.message.trim())
            };
            format!(
                "Hi {}! 👋\n\n{}Based on your data:\n• Total entries: {}\n• Completed: {}\n• Completion rate: {}%\n• Work time: {}h\n• Study time: {}h\n\n",
                c.name,
                asked,
                c.stats.total,
                c.stats.completed,
                c.rate(),
                c.work_hours(),
                c.study_hours()
            )
        },
        rules: &[
            Rule {
                when: low,
                render: |_| format!("⚠️ Your completion rate is on the low side.\n\n{ASK_ME_ABOUT}"),
            },
            Rule {
                when: moderate,
                render: |_| format!("✅ You are doing fine.\n\n{ASK_ME_ABOUT}"),
            },
            Rule {
                when: high,
                render: |_| format!("🎉 You are doing great.\n\n{ASK_ME_ABOUT}"),
            },
        ],
    },
];

fn render(ctx: &AdviceContext, category: IntentCategory) -> String {
    let Some(template) = CATALOG.iter().find(|t| t.category == category) else {
        return String::new();
    };
    let mut text = (template.header)(ctx);
    if let Some(rule) = template.rules.iter().find(|r| (r.when)(ctx)) {
        text.push_str(&(rule.render)(ctx));
    }
    text
}

/// Render the advice text for an already classified intent.
pub fn generate_advice(category: IntentCategory, stats: &AggregateStats, display_name: &str) -> String {
    render(
        &AdviceContext {
            name: display_name,
            message: "",
            stats,
        },
        category,
    )
}

/// Classify `message` and render the matching advice; unknown intents echo the message.
pub fn reply(message: &str, stats: &AggregateStats, display_name: &str) -> (IntentCategory, String) {
    let category = classify_intent(message);
    let text = render(
        &AdviceContext {
            name: display_name,
            message,
            stats,
        },
        category,
    );
    (category, text)
}

/// Append-only log of generated assistant output.
pub trait AdviceSink {
    fn append(&self, owner: OwnerId, category: &str, text: &str, at: DateTime<FixedOffset>);
}

/// Answer a chat message and record the answer in `sink`.
pub fn advise<S: AdviceSink + ?Sized>(
    sink: &S,
    owner: OwnerId,
    message: &str,
    stats: &AggregateStats,
    display_name: &str,
    now: DateTime<FixedOffset>,
) -> (IntentCategory, String) {
    let (category, text) = reply(message, stats, display_name);
    sink.append(owner, category.as_str(), &text, now);
    (category, text)
}

// ---------------------------------------------------------------------------
// Performance report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PerformanceSummary {
    pub total_days: usize,
    pub total_schedules: usize,
    pub total_completed: usize,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryAnalysis {
    pub total_schedules: usize,
    pub total_hours: i64,
    pub avg_per_day: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PerformanceReport {
    pub summary: PerformanceSummary,
    pub work_analysis: CategoryAnalysis,
    pub study_analysis: CategoryAnalysis,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

fn category_analysis(stats: &AggregateStats, category: Category, active_days: usize) -> CategoryAnalysis {
    let hours = stats.hours_for(category);
    CategoryAnalysis {
        total_schedules: stats.count_for(category),
        total_hours: hours.round() as i64,
        avg_per_day: if active_days == 0 { 0.0 } else { round1(hours / active_days as f64) },
    }
}

/// Summarise a (typically 30-day) window into insights and recommendations.
pub fn analyze_performance(stats: &AggregateStats) -> PerformanceReport {
    let active_days = stats.daily.len();
    let rate = round1(stats.completion_rate);

    let mut insights = Vec::new();
    if rate >= 80.0 {
        insights.push("🎉 Your completion rate is very high. Keep it up.".to_string());
    } else if rate >= 60.0 {
        insights.push("✅ Good performance, with room to improve.".to_string());
    } else {
        insights.push("⚠️ Your completion rate is low; review how you plan your days.".to_string());
    }

    let per_day = if active_days == 0 { 0.0 } else { stats.total as f64 / active_days as f64 };
    if per_day > 10.0 {
        insights.push("📊 You schedule a lot each day. Consider fewer entries to raise quality.".to_string());
    } else if per_day < 3.0 {
        insights.push("📈 You could add more activities to make better use of your time.".to_string());
    }

    let mut recommendations = Vec::new();
    if rate < 70.0 {
        recommendations.push("Limit yourself to 5-7 tasks per day".to_string());
        recommendations.push("Prioritise your Most Important Tasks (MIT)".to_string());
    }
    if stats.hours_for(Category::Work) > stats.hours_for(Category::Study) * 3.0 {
        recommendations.push("Balance work and study time better".to_string());
    }
    recommendations.push("Use the Pomodoro technique for work that needs deep focus".to_string());
    recommendations.push("Spend 30-60 minutes each day planning".to_string());

    PerformanceReport {
        summary: PerformanceSummary {
            total_days: active_days,
            total_schedules: stats.total,
            total_completed: stats.completed,
            completion_rate: rate,
        },
        work_analysis: category_analysis(stats, Category::Work, active_days),
        study_analysis: category_analysis(stats, Category::Study, active_days),
        insights,
        recommendations,
    }
}
