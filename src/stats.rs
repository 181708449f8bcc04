use crate::calendar::{date_key, get_week_start, parse_date};
use crate::models::{Activity, ActivityLog, ActivityStatus, Behavior, Goal, GoalStatus, Priority, Severity};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

const WEEK_COUNT: usize = 8;

pub fn count_by<T, K: Ord>(items: &[T], key: impl Fn(&T) -> K) -> BTreeMap<K, usize> {
    let mut counts = BTreeMap::new();
    for item in items {
        *counts.entry(key(item)).or_insert(0) += 1;
    }
    counts
}

pub fn category_count(behaviors: &[Behavior], category: &str) -> usize {
    behaviors
        .iter()
        .filter(|behavior| behavior.category.eq_ignore_ascii_case(category))
        .count()
}

pub fn severity_count(behaviors: &[Behavior], severity: Severity) -> usize {
    behaviors
        .iter()
        .filter(|behavior| behavior.severity == severity)
        .count()
}

pub fn goal_status_count(goals: &[Goal], status: GoalStatus) -> usize {
    goals.iter().filter(|goal| goal.status == status).count()
}

pub fn priority_count(goals: &[Goal], priority: Priority) -> usize {
    goals.iter().filter(|goal| goal.priority == priority).count()
}

pub fn activity_status_count(activities: &[Activity], status: ActivityStatus) -> usize {
    activities
        .iter()
        .filter(|activity| activity.status == status)
        .count()
}

/// Goals past their target date that are not completed. Goals without a
/// parseable target date are never overdue.
pub fn overdue_goals(goals: &[Goal], today: NaiveDate) -> usize {
    goals
        .iter()
        .filter(|goal| goal.status != GoalStatus::Completed)
        .filter_map(|goal| goal.target_date.as_deref().and_then(parse_date))
        .filter(|target| *target < today)
        .count()
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 * 1000.0 / whole as f64).round() / 10.0
    }
}

pub fn goal_completion_rate(goals: &[Goal]) -> f64 {
    percent(goal_status_count(goals, GoalStatus::Completed), goals.len())
}

/// Share of behaviors with a recorded intervention outcome where the
/// intervention worked.
pub fn intervention_effectiveness(behaviors: &[Behavior]) -> f64 {
    let outcomes: Vec<bool> = behaviors
        .iter()
        .filter_map(|behavior| behavior.intervention_effective)
        .collect();
    percent(outcomes.iter().filter(|worked| **worked).count(), outcomes.len())
}

#[derive(Debug, Clone, Serialize)]
pub struct BehaviorStats {
    pub total: usize,
    pub by_severity: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub critical: usize,
    pub this_week: usize,
    pub intervention_effectiveness: f64,
}

pub fn behavior_stats(behaviors: &[Behavior], today: NaiveDate) -> BehaviorStats {
    let week_start = get_week_start(today);
    let this_week = behaviors
        .iter()
        .filter_map(|behavior| behavior.date.as_deref())
        .filter_map(|date| parse_date(date.get(..10).unwrap_or(date)))
        .filter(|date| *date >= week_start && *date <= today)
        .count();

    BehaviorStats {
        total: behaviors.len(),
        by_severity: Severity::ALL
            .iter()
            .map(|severity| (severity.as_str().to_string(), severity_count(behaviors, *severity)))
            .collect(),
        by_category: count_by(behaviors, |behavior| {
            if behavior.category.trim().is_empty() {
                "uncategorised".to_string()
            } else {
                behavior.category.to_lowercase()
            }
        }),
        critical: severity_count(behaviors, Severity::Critical),
        this_week,
        intervention_effectiveness: intervention_effectiveness(behaviors),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_priority: BTreeMap<String, usize>,
    pub overdue: usize,
    pub completion_rate: f64,
    pub average_progress: f64,
}

pub fn goal_stats(goals: &[Goal], today: NaiveDate) -> GoalStats {
    let progress_sum: u64 = goals.iter().map(|goal| u64::from(goal.progress.min(100))).sum();
    GoalStats {
        total: goals.len(),
        by_status: GoalStatus::ALL
            .iter()
            .map(|status| (status.as_str().to_string(), goal_status_count(goals, *status)))
            .collect(),
        by_priority: Priority::ALL
            .iter()
            .map(|priority| (priority.as_str().to_string(), priority_count(goals, *priority)))
            .collect(),
        overdue: overdue_goals(goals, today),
        completion_rate: goal_completion_rate(goals),
        average_progress: if goals.is_empty() {
            0.0
        } else {
            (progress_sum as f64 * 10.0 / goals.len() as f64).round() / 10.0
        },
    }
}

#[derive(Debug, Serialize)]
pub struct DailyPoint {
    pub date: String,
    pub logged: u64,
    pub completed: u64,
}

#[derive(Debug, Serialize)]
pub struct WeeklyPoint {
    pub week: String,
    pub start_date: String,
    pub end_date: String,
    pub logged: u64,
    pub completed: u64,
}

#[derive(Debug, Serialize)]
pub struct ActivityTrend {
    pub last_7_days: Vec<DailyPoint>,
    pub weekly_totals: Vec<WeeklyPoint>,
}

pub fn build_activity_trend_at(today: NaiveDate, logs: &[ActivityLog]) -> ActivityTrend {
    let mut days: HashMap<String, (u64, u64)> = HashMap::new();
    for log in logs {
        let key = log.date.get(..10).unwrap_or(&log.date).to_string();
        let entry = days.entry(key).or_default();
        entry.0 += 1;
        if log.completed {
            entry.1 += 1;
        }
    }
    let counts = |date: NaiveDate| days.get(&date_key(date)).copied().unwrap_or_default();

    let mut last_7_days = Vec::with_capacity(7);
    for offset in (0..7).rev() {
        let date = today - Duration::days(offset);
        let (logged, completed) = counts(date);
        last_7_days.push(DailyPoint {
            date: date_key(date),
            logged,
            completed,
        });
    }

    let current_week_start = get_week_start(today);
    let mut weekly_totals = Vec::with_capacity(WEEK_COUNT);
    for offset in (0..WEEK_COUNT).rev() {
        let start = current_week_start - Duration::weeks(offset as i64);
        let end = start + Duration::days(6);

        let mut logged = 0u64;
        let mut completed = 0u64;
        for day_offset in 0..7 {
            let (day_logged, day_completed) = counts(start + Duration::days(day_offset));
            logged = logged.saturating_add(day_logged);
            completed = completed.saturating_add(day_completed);
        }

        weekly_totals.push(WeeklyPoint {
            week: format!("Week of {}", start.format("%b %-d")),
            start_date: date_key(start),
            end_date: date_key(end),
            logged,
            completed,
        });
    }

    ActivityTrend {
        last_7_days,
        weekly_totals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn behavior(id: i64, category: &str, severity: Severity, effective: Option<bool>) -> Behavior {
        Behavior {
            id,
            client: None,
            client_name: None,
            behavior_type: "incident".into(),
            category: category.into(),
            severity,
            description: String::new(),
            date: Some("2026-01-05".into()),
            intervention: effective.map(|_| "redirect".to_string()),
            intervention_effective: effective,
            extra: Map::new(),
        }
    }

    fn goal(status: GoalStatus, priority: Priority, target: Option<&str>, progress: u8) -> Goal {
        Goal {
            id: 0,
            client: None,
            client_name: None,
            title: "goal".into(),
            description: String::new(),
            category: None,
            status,
            priority,
            target_date: target.map(str::to_string),
            progress,
            extra: Map::new(),
        }
    }

    fn log(date: &str, completed: bool) -> ActivityLog {
        ActivityLog {
            id: 0,
            activity: None,
            client: None,
            date: date.into(),
            completed,
            notes: String::new(),
            extra: Map::new(),
        }
    }

    #[test]
    fn exclusive_counts_sum_to_total() {
        let behaviors = vec![
            behavior(1, "verbal", Severity::Low, None),
            behavior(2, "physical", Severity::Critical, Some(true)),
            behavior(3, "Verbal", Severity::Other, Some(false)),
            behavior(4, "", Severity::High, Some(true)),
        ];
        let stats = behavior_stats(&behaviors, NaiveDate::from_ymd_opt(2026, 1, 6).unwrap());
        assert_eq!(stats.by_severity.values().sum::<usize>(), behaviors.len());
        assert_eq!(stats.by_category.values().sum::<usize>(), behaviors.len());
        assert_eq!(stats.by_category.get("verbal"), Some(&2));
        assert_eq!(category_count(&behaviors, "VERBAL"), 2);
        assert_eq!(stats.critical, 1);
        assert_eq!(stats.this_week, 4);

        let goals = vec![
            goal(GoalStatus::Completed, Priority::High, None, 100),
            goal(GoalStatus::InProgress, Priority::Low, None, 40),
            goal(GoalStatus::Other, Priority::Other, None, 0),
        ];
        let stats = goal_stats(&goals, NaiveDate::from_ymd_opt(2026, 1, 6).unwrap());
        assert_eq!(stats.by_status.values().sum::<usize>(), goals.len());
        assert_eq!(stats.by_priority.values().sum::<usize>(), goals.len());
    }

    #[test]
    fn intervention_effectiveness_ignores_unrecorded_outcomes() {
        let behaviors = vec![
            behavior(1, "verbal", Severity::Low, Some(true)),
            behavior(2, "verbal", Severity::Low, Some(true)),
            behavior(3, "verbal", Severity::Low, Some(false)),
            behavior(4, "verbal", Severity::Low, None),
        ];
        assert_eq!(intervention_effectiveness(&behaviors), 66.7);
        assert_eq!(intervention_effectiveness(&[]), 0.0);
    }

    #[test]
    fn overdue_goals_skip_completed_and_undated() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let goals = vec![
            goal(GoalStatus::InProgress, Priority::High, Some("2024-03-09"), 10),
            goal(GoalStatus::Completed, Priority::High, Some("2024-01-01"), 100),
            goal(GoalStatus::NotStarted, Priority::Low, Some("2024-03-10"), 0),
            goal(GoalStatus::OnHold, Priority::Low, None, 0),
            goal(GoalStatus::OnHold, Priority::Low, Some("soon"), 0),
        ];
        assert_eq!(overdue_goals(&goals, today), 1);
        assert_eq!(goal_completion_rate(&goals), 20.0);
        assert_eq!(goal_stats(&goals, today).average_progress, 22.0);
    }

    #[test]
    fn trend_last_7_days_includes_each_day() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let logs = vec![
            log("2026-01-03", true),
            log("2026-01-03T10:30:00", false),
            log("2025-12-01", true),
        ];
        let trend = build_activity_trend_at(today, &logs);
        assert_eq!(trend.last_7_days.len(), 7);
        let point = trend
            .last_7_days
            .iter()
            .find(|day| day.date == "2026-01-03")
            .expect("missing day");
        assert_eq!(point.logged, 2);
        assert_eq!(point.completed, 1);
    }

    #[test]
    fn trend_weeks_start_on_sunday() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let trend = build_activity_trend_at(today, &[log("2026-01-04", true)]);
        assert_eq!(trend.weekly_totals.len(), 8);
        let current = trend.weekly_totals.last().unwrap();
        assert_eq!(current.start_date, "2026-01-04");
        assert_eq!(current.end_date, "2026-01-10");
        assert_eq!(current.logged, 1);
    }
}
