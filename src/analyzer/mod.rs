//! Rule-based workflow analyzer.
//!
//! Runs a fixed battery of sub-analyses over a flattened task list and
//! produces insights, priority recommendations, a 0-100 health score, a
//! timeline prediction, and a one-line summary. Every rule is a pure
//! function of the task list and the supplied clock; confidence values are
//! fixed per rule, not learned.

pub mod score;
pub mod types;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::model::{Phase, Priority, TaskStatus};

pub use types::{
    AnalyzerTask, Impact, Insight, InsightCategory, InsightKind, PriorityRecommendation,
    RiskLevel, TimelinePrediction, WorkflowAnalysis,
};

use score::{estimate_effort, priority_factors, priority_score, LOWER_THRESHOLD, RAISE_THRESHOLD};

/// One assignee is assumed to close about this many task-days per day.
const TASKS_PER_DAY_PER_PERSON: f64 = 3.0;
/// An earlier phase with completion below this ratio is flagged as behind.
const PHASE_BEHIND_RATIO: f64 = 0.8;
/// The current phase is ready to advance at or above this ratio.
const PHASE_ADVANCE_RATIO: f64 = 0.9;

/// Full analysis pass. Insight order is deterministic: blocked, overdue,
/// prioritization, workload, phase progress, timeline risks, resource gaps,
/// dependencies.
pub fn analyze_workflow(
    tasks: &[AnalyzerTask],
    event_date: Option<DateTime<Utc>>,
    current_phase: Phase,
    now: DateTime<Utc>,
) -> WorkflowAnalysis {
    let mut insights = Vec::new();
    insights.extend(analyze_blocked_tasks(tasks));
    insights.extend(analyze_overdue_tasks(tasks, now));
    insights.extend(analyze_prioritization(tasks, event_date, now));
    insights.extend(analyze_workload_distribution(tasks));
    insights.extend(analyze_phase_progress(tasks, current_phase));
    insights.extend(analyze_timeline_risks(tasks, event_date, now));
    insights.extend(analyze_resource_gaps(tasks));
    insights.extend(analyze_dependencies(tasks));

    let priority_recommendations = generate_priority_recommendations(tasks, event_date, now);
    let health_score = calculate_workflow_health(tasks, now);
    let timeline_prediction = predict_completion(tasks, event_date, now);
    let summary = generate_summary(&insights, health_score);

    debug!(
        insights = insights.len(),
        recommendations = priority_recommendations.len(),
        health_score,
        "workflow analysis complete"
    );

    WorkflowAnalysis {
        insights,
        priority_recommendations,
        health_score,
        timeline_prediction,
        summary,
    }
}

fn analyze_blocked_tasks(tasks: &[AnalyzerTask]) -> Vec<Insight> {
    let mut insights = Vec::new();

    let blocked: Vec<&AnalyzerTask> = tasks.iter().filter(|t| t.is_blocked).collect();
    if blocked.is_empty() {
        return insights;
    }

    // Group by blocking reason, preserving first-seen order
    let mut reasons: Vec<(String, Vec<&AnalyzerTask>)> = Vec::new();
    for task in &blocked {
        let reason = task
            .blocking_reason
            .clone()
            .unwrap_or_else(|| "Unknown reason".to_string());
        match reasons.iter_mut().find(|(r, _)| *r == reason) {
            Some((_, list)) => list.push(task),
            None => reasons.push((reason, vec![task])),
        }
    }

    for (reason, task_list) in &reasons {
        insights.push(Insight {
            kind: InsightKind::Warning,
            category: InsightCategory::Dependencies,
            title: format!(
                "Blocked Tasks: {} task(s) waiting on dependencies",
                task_list.len()
            ),
            description: format!(
                "Tasks blocked due to: '{}'. This is preventing progress on critical path items.",
                reason
            ),
            confidence: 0.95,
            actionable: true,
            related_task_ids: task_list.iter().map(|t| t.id).collect(),
            recommendation: format!("Address the blocking issue: {}", reason),
            impact: Impact::High,
        });
    }

    let critical_blocked: Vec<&&AnalyzerTask> = blocked
        .iter()
        .filter(|t| t.priority == Priority::Critical)
        .collect();
    if !critical_blocked.is_empty() {
        insights.insert(
            0,
            Insight {
                kind: InsightKind::Warning,
                category: InsightCategory::Priority,
                title: "Critical tasks are blocked!".to_string(),
                description: format!(
                    "{} critical task(s) are currently blocked. This poses significant risk to the event.",
                    critical_blocked.len()
                ),
                confidence: 0.98,
                actionable: true,
                related_task_ids: critical_blocked.iter().map(|t| t.id).collect(),
                recommendation:
                    "Immediately resolve blockers on critical tasks or escalate to leadership."
                        .to_string(),
                impact: Impact::Critical,
            },
        );
    }

    insights
}

fn analyze_overdue_tasks(tasks: &[AnalyzerTask], now: DateTime<Utc>) -> Vec<Insight> {
    let mut insights = Vec::new();

    let overdue: Vec<&AnalyzerTask> = tasks
        .iter()
        .filter(|t| {
            t.due_date.is_some_and(|due| due < now)
                && !matches!(t.status, TaskStatus::Done | TaskStatus::Blocked)
        })
        .collect();
    if overdue.is_empty() {
        return insights;
    }

    let days_over = |t: &AnalyzerTask| (now - t.due_date.unwrap_or(now)).num_days();
    let very: Vec<i64> = overdue
        .iter()
        .filter(|t| days_over(t) > 7)
        .map(|t| t.id)
        .collect();
    let moderate: Vec<i64> = overdue
        .iter()
        .filter(|t| {
            let d = days_over(t);
            d > 3 && d <= 7
        })
        .map(|t| t.id)
        .collect();
    let slight: Vec<i64> = overdue
        .iter()
        .filter(|t| days_over(t) <= 3)
        .map(|t| t.id)
        .collect();

    if !very.is_empty() {
        insights.push(Insight {
            kind: InsightKind::Warning,
            category: InsightCategory::Timeline,
            title: format!("Critical: {} task(s) severely overdue", very.len()),
            description:
                "These tasks are more than 7 days past their due date and require immediate attention."
                    .to_string(),
            confidence: 0.95,
            actionable: true,
            related_task_ids: very,
            recommendation:
                "Consider reassigning these tasks or extending scope to fit realistic timeline."
                    .to_string(),
            impact: Impact::Critical,
        });
    }

    if !moderate.is_empty() {
        insights.push(Insight {
            kind: InsightKind::Warning,
            category: InsightCategory::Timeline,
            title: format!("Alert: {} task(s) moderately overdue", moderate.len()),
            description: "These tasks are 4-7 days past due and need prioritization.".to_string(),
            confidence: 0.90,
            actionable: true,
            related_task_ids: moderate,
            recommendation: "Schedule these tasks for completion within the next 48 hours."
                .to_string(),
            impact: Impact::High,
        });
    }

    if !slight.is_empty() {
        insights.push(Insight {
            kind: InsightKind::Suggestion,
            category: InsightCategory::Timeline,
            title: format!("Notice: {} task(s) slightly overdue", slight.len()),
            description: "These tasks are just a few days past due.".to_string(),
            confidence: 0.85,
            actionable: true,
            related_task_ids: slight,
            recommendation: "Complete these tasks to maintain schedule integrity.".to_string(),
            impact: Impact::Medium,
        });
    }

    insights
}

fn analyze_prioritization(
    tasks: &[AnalyzerTask],
    event_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Vec<Insight> {
    let mut insights = Vec::new();

    let incomplete: Vec<&AnalyzerTask> = tasks.iter().filter(|t| t.is_incomplete()).collect();

    let mut scored: Vec<(&AnalyzerTask, f64)> = incomplete
        .iter()
        .map(|t| (*t, priority_score(t, event_date, now)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let todo_count = scored
        .iter()
        .filter(|(t, _)| t.status == TaskStatus::Todo)
        .count();

    if todo_count > 3 {
        let high_value_todos: Vec<&AnalyzerTask> = scored
            .iter()
            .take(5)
            .filter(|(t, _)| t.status == TaskStatus::Todo)
            .map(|(t, _)| *t)
            .collect();

        if !high_value_todos.is_empty() {
            let titles: Vec<&str> = high_value_todos
                .iter()
                .take(2)
                .map(|t| t.title.as_str())
                .collect();
            insights.push(Insight {
                kind: InsightKind::Suggestion,
                category: InsightCategory::Priority,
                title: "High-priority tasks need attention".to_string(),
                description: format!(
                    "Consider starting: {}. These tasks have high urgency based on deadlines and event timeline.",
                    titles.join(", ")
                ),
                confidence: 0.82,
                actionable: true,
                related_task_ids: high_value_todos.iter().map(|t| t.id).collect(),
                recommendation: "Prioritize these tasks in your next work session.".to_string(),
                impact: Impact::High,
            });
        }
    }

    // Low-priority work in flight while higher-priority items wait
    let low_priority_in_progress: Vec<i64> = incomplete
        .iter()
        .filter(|t| {
            t.status == TaskStatus::InProgress
                && matches!(t.priority, Priority::Low | Priority::Medium)
                && t.due_date.is_some_and(|due| (due - now).num_days() > 14)
        })
        .map(|t| t.id)
        .collect();

    if low_priority_in_progress.len() > 2 {
        insights.push(Insight {
            kind: InsightKind::Tip,
            category: InsightCategory::Resources,
            title: "Consider pausing low-priority work".to_string(),
            description: format!(
                "{} lower-priority tasks are in progress while higher-priority items await.",
                low_priority_in_progress.len()
            ),
            confidence: 0.75,
            actionable: true,
            related_task_ids: low_priority_in_progress,
            recommendation:
                "Consider moving these tasks back to todo to focus on higher-priority work."
                    .to_string(),
            impact: Impact::Medium,
        });
    }

    insights
}

fn analyze_workload_distribution(tasks: &[AnalyzerTask]) -> Vec<Insight> {
    let mut insights = Vec::new();

    // Pending count per assignee, first-seen order
    let mut workloads: Vec<(i64, usize)> = Vec::new();
    for task in tasks {
        let Some(assignee) = task.assignee_id else {
            continue;
        };
        if workloads.iter().all(|(a, _)| *a != assignee) {
            workloads.push((assignee, 0));
        }
        if task.status != TaskStatus::Done {
            if let Some(entry) = workloads.iter_mut().find(|(a, _)| *a == assignee) {
                entry.1 += 1;
            }
        }
    }

    if workloads.len() >= 2 {
        workloads.sort_by(|a, b| b.1.cmp(&a.1));
        let (overloaded, max_workload) = workloads[0];
        let min_workload = workloads[workloads.len() - 1].1;

        if max_workload > min_workload * 2 && max_workload > 3 {
            insights.push(Insight {
                kind: InsightKind::Suggestion,
                category: InsightCategory::Resources,
                title: "Workload imbalance detected".to_string(),
                description: format!(
                    "Assignee {} has {} pending tasks while team members have fewer items.",
                    overloaded, max_workload
                ),
                confidence: 0.85,
                actionable: true,
                related_task_ids: Vec::new(),
                recommendation: format!(
                    "Consider reassigning some tasks from assignee {} to team members with capacity.",
                    overloaded
                ),
                impact: Impact::Medium,
            });
        }
    }

    let unassigned: Vec<&AnalyzerTask> = tasks
        .iter()
        .filter(|t| t.assignee_id.is_none() && t.status != TaskStatus::Done)
        .collect();

    if unassigned.len() > 2 {
        insights.push(Insight {
            kind: InsightKind::Tip,
            category: InsightCategory::Resources,
            title: format!("{} tasks are unassigned", unassigned.len()),
            description: "These tasks need team members to take ownership.".to_string(),
            confidence: 0.90,
            actionable: true,
            related_task_ids: unassigned.iter().take(5).map(|t| t.id).collect(),
            recommendation:
                "Assign these tasks to team members based on their skills and current workload."
                    .to_string(),
            impact: Impact::High,
        });
    }

    insights
}

fn analyze_phase_progress(tasks: &[AnalyzerTask], current_phase: Phase) -> Vec<Insight> {
    let mut insights = Vec::new();
    let current_idx = current_phase.index();

    for (i, phase) in Phase::ALL.iter().enumerate() {
        let phase_tasks: Vec<&AnalyzerTask> =
            tasks.iter().filter(|t| t.phase == *phase).collect();
        if phase_tasks.is_empty() {
            continue;
        }

        let completed = phase_tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Done)
            .count();
        let total = phase_tasks.len();
        let progress = completed as f64 / total as f64;

        if i < current_idx && progress < PHASE_BEHIND_RATIO {
            insights.push(Insight {
                kind: InsightKind::Warning,
                category: InsightCategory::Quality,
                title: format!("{} phase is behind", phase.title()),
                description: format!(
                    "Only {}/{} tasks completed in {}. This may impact subsequent phases.",
                    completed,
                    total,
                    phase.title()
                ),
                confidence: 0.88,
                actionable: true,
                related_task_ids: phase_tasks
                    .iter()
                    .filter(|t| t.status != TaskStatus::Done)
                    .map(|t| t.id)
                    .collect(),
                recommendation: format!(
                    "Complete remaining {} tasks before advancing to next phase.",
                    phase
                ),
                impact: Impact::High,
            });
        }

        if i == current_idx && progress >= PHASE_ADVANCE_RATIO {
            insights.push(Insight {
                kind: InsightKind::Suggestion,
                category: InsightCategory::Quality,
                title: format!("Ready to advance from {}", phase.title()),
                description: format!(
                    "90%+ of {} tasks are complete. Consider advancing to next phase.",
                    phase
                ),
                confidence: 0.92,
                actionable: false,
                related_task_ids: Vec::new(),
                recommendation: "Update workflow phase when ready to proceed.".to_string(),
                impact: Impact::Medium,
            });
        }
    }

    insights
}

fn analyze_timeline_risks(
    tasks: &[AnalyzerTask],
    event_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Vec<Insight> {
    let mut insights = Vec::new();

    let Some(event_date) = event_date else {
        return insights;
    };
    let days_until = (event_date - now).num_days();
    if days_until <= 0 {
        return insights;
    }

    // Tasks whose remaining time is shorter than their estimated effort
    let mut at_risk: Vec<(&AnalyzerTask, f64, f64)> = Vec::new();
    for task in tasks {
        if task.status == TaskStatus::Done || task.is_blocked {
            continue;
        }
        let Some(due) = task.due_date else {
            continue;
        };
        // Floor rather than truncate so an overdue task reads negative even
        // when it is less than a day past due.
        let days_until_due = ((due - now).num_seconds() as f64 / 86_400.0).floor();
        let effort_days = estimate_effort(task);
        if days_until_due < effort_days {
            at_risk.push((task, days_until_due, effort_days));
        }
    }

    let critical_at_risk: Vec<&AnalyzerTask> = at_risk
        .iter()
        .filter(|(_, d, e)| *d < e * 0.5)
        .map(|(t, _, _)| *t)
        .collect();

    if !critical_at_risk.is_empty() {
        let titles: Vec<&str> = critical_at_risk
            .iter()
            .take(3)
            .map(|t| t.title.as_str())
            .collect();
        insights.push(Insight {
            kind: InsightKind::Warning,
            category: InsightCategory::Timeline,
            title: "Tasks at critical risk of missing deadlines".to_string(),
            description: format!(
                "Some tasks have insufficient time for completion: {}",
                titles.join(", ")
            ),
            confidence: 0.90,
            actionable: true,
            related_task_ids: critical_at_risk.iter().map(|t| t.id).collect(),
            recommendation: "Either extend deadlines, increase resources, or reduce task scope."
                .to_string(),
            impact: Impact::Critical,
        });
    }

    let incomplete_count = tasks
        .iter()
        .filter(|t| t.status != TaskStatus::Done && !t.is_blocked)
        .count();

    if incomplete_count > 0 {
        let avg_days_per_task = days_until as f64 / incomplete_count as f64;

        if avg_days_per_task < 1.0 {
            insights.push(Insight {
                kind: InsightKind::Warning,
                category: InsightCategory::Timeline,
                title: "Timeline under severe pressure".to_string(),
                description: "Less than 1 day remaining per incomplete task on average."
                    .to_string(),
                confidence: 0.95,
                actionable: true,
                related_task_ids: Vec::new(),
                recommendation:
                    "Consider extending event date, reducing scope, or adding resources."
                        .to_string(),
                impact: Impact::Critical,
            });
        } else if avg_days_per_task < 2.0 {
            insights.push(Insight {
                kind: InsightKind::Warning,
                category: InsightCategory::Timeline,
                title: "Timeline is tight".to_string(),
                description: "Less than 2 days per task on average. Focus on high-priority items."
                    .to_string(),
                confidence: 0.80,
                actionable: true,
                related_task_ids: Vec::new(),
                recommendation: "Prioritize critical and high-priority tasks only.".to_string(),
                impact: Impact::High,
            });
        }
    }

    insights
}

fn analyze_resource_gaps(tasks: &[AnalyzerTask]) -> Vec<Insight> {
    let mut insights = Vec::new();

    let pending_in = |category: &str| {
        tasks
            .iter()
            .filter(|t| t.status != TaskStatus::Done && t.category == category)
            .count()
    };

    if pending_in("speakers") > 5 {
        insights.push(Insight {
            kind: InsightKind::Tip,
            category: InsightCategory::Resources,
            title: "High speaker coordination workload".to_string(),
            description:
                "Managing multiple speaker-related tasks. Consider dedicated speaker coordinator."
                    .to_string(),
            confidence: 0.75,
            actionable: false,
            related_task_ids: Vec::new(),
            recommendation: "Assign a point person for speaker communications.".to_string(),
            impact: Impact::Medium,
        });
    }

    if pending_in("marketing") > 5 {
        insights.push(Insight {
            kind: InsightKind::Suggestion,
            category: InsightCategory::Resources,
            title: "Marketing tasks piling up".to_string(),
            description: "Multiple marketing tasks pending. Marketing efforts may be lagging."
                .to_string(),
            confidence: 0.80,
            actionable: true,
            related_task_ids: Vec::new(),
            recommendation: "Increase marketing focus or hire external support.".to_string(),
            impact: Impact::High,
        });
    }

    insights
}

fn analyze_dependencies(tasks: &[AnalyzerTask]) -> Vec<Insight> {
    let mut insights = Vec::new();

    let blockers: Vec<&AnalyzerTask> = tasks.iter().filter(|t| t.is_blocked).collect();
    if blockers.len() > 3 {
        insights.push(Insight {
            kind: InsightKind::Warning,
            category: InsightCategory::Dependencies,
            title: "Multiple blocking dependencies".to_string(),
            description: format!(
                "{} tasks are currently blocked. This creates significant project risk.",
                blockers.len()
            ),
            confidence: 0.92,
            actionable: true,
            related_task_ids: blockers.iter().map(|t| t.id).collect(),
            recommendation: "Conduct dependency review meeting to unblock critical path items."
                .to_string(),
            impact: Impact::High,
        });
    }

    // Concentration of pending work in a single phase; counts keep the
    // order phases first appear in the task list, and a tie keeps the
    // earlier entry, as with the blocked-reason grouping above.
    let mut phase_counts: Vec<(Phase, usize)> = Vec::new();
    for task in tasks.iter().filter(|t| t.status != TaskStatus::Done) {
        match phase_counts.iter_mut().find(|(p, _)| *p == task.phase) {
            Some((_, count)) => *count += 1,
            None => phase_counts.push((task.phase, 1)),
        }
    }
    let mut busiest: Option<(Phase, usize)> = None;
    for (phase, count) in phase_counts {
        if busiest.map_or(true, |(_, max)| count > max) {
            busiest = Some((phase, count));
        }
    }

    if let Some((phase, count)) = busiest {
        if count > 8 {
            insights.push(Insight {
                kind: InsightKind::Tip,
                category: InsightCategory::Resources,
                title: format!("Heavy workload in {} phase", phase.title()),
                description: format!(
                    "{} tasks pending in {}. Consider breaking into smaller phases.",
                    count, phase
                ),
                confidence: 0.78,
                actionable: true,
                related_task_ids: Vec::new(),
                recommendation: "Decompose complex tasks into smaller, manageable subtasks."
                    .to_string(),
                impact: Impact::Medium,
            });
        }
    }

    insights
}

fn generate_priority_recommendations(
    tasks: &[AnalyzerTask],
    event_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Vec<PriorityRecommendation> {
    let mut recommendations = Vec::new();

    for task in tasks.iter().filter(|t| t.is_incomplete()) {
        let score = priority_score(task, event_date, now);

        if score >= RAISE_THRESHOLD
            && !matches!(task.priority, Priority::Critical | Priority::High)
        {
            recommendations.push(PriorityRecommendation {
                task_id: task.id,
                task_title: task.title.clone(),
                current_priority: task.priority,
                suggested_priority: Priority::High,
                reason:
                    "Analysis indicates this task is more urgent than current priority suggests"
                        .to_string(),
                factors: priority_factors(task, now),
                score,
            });
        } else if score <= LOWER_THRESHOLD
            && matches!(task.priority, Priority::Critical | Priority::High)
        {
            recommendations.push(PriorityRecommendation {
                task_id: task.id,
                task_title: task.title.clone(),
                current_priority: task.priority,
                suggested_priority: Priority::Medium,
                reason:
                    "Analysis indicates this task can be deprioritized based on timeline and dependencies"
                        .to_string(),
                factors: priority_factors(task, now),
                score,
            });
        }
    }

    recommendations
}

fn calculate_workflow_health(tasks: &[AnalyzerTask], now: DateTime<Utc>) -> f64 {
    if tasks.is_empty() {
        return 100.0;
    }

    let mut score = 100.0;

    let blocked = tasks.iter().filter(|t| t.is_blocked).count();
    score -= blocked as f64 * 5.0;

    let overdue = tasks
        .iter()
        .filter(|t| {
            t.due_date.is_some_and(|due| due < now)
                && !matches!(t.status, TaskStatus::Done | TaskStatus::Blocked)
        })
        .count();
    score -= overdue as f64 * 3.0;

    let unassigned = tasks
        .iter()
        .filter(|t| t.assignee_id.is_none() && t.status != TaskStatus::Done)
        .count();
    score -= unassigned as f64 * 2.0;

    let completed = tasks.iter().filter(|t| t.status == TaskStatus::Done).count();
    let progress_ratio = completed as f64 / tasks.len() as f64;
    if progress_ratio > 0.5 {
        score += 5.0;
    }
    if progress_ratio > 0.75 {
        score += 5.0;
    }

    score.clamp(0.0, 100.0)
}

fn predict_completion(
    tasks: &[AnalyzerTask],
    event_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<TimelinePrediction> {
    let incomplete: Vec<&AnalyzerTask> = tasks
        .iter()
        .filter(|t| t.status != TaskStatus::Done && !t.is_blocked)
        .collect();
    if incomplete.is_empty() {
        return None;
    }

    let total_effort: f64 = incomplete.iter().map(|t| estimate_effort(t)).sum();

    let mut assignees: Vec<i64> = incomplete.iter().filter_map(|t| t.assignee_id).collect();
    assignees.sort_unstable();
    assignees.dedup();
    let people_count = assignees.len().max(1);
    let daily_capacity = TASKS_PER_DAY_PER_PERSON * people_count as f64;

    let days_needed = total_effort / daily_capacity;
    let predicted = now + Duration::seconds((days_needed * 86_400.0) as i64);

    if let Some(event_date) = event_date {
        let days_until = (event_date - now).num_days();

        if days_needed > days_until as f64 {
            return Some(TimelinePrediction {
                predicted_completion: predicted,
                risk_level: RiskLevel::High,
                factors: vec![
                    format!(
                        "Estimated effort ({:.1} days) exceeds available time ({} days)",
                        days_needed, days_until
                    ),
                    format!("{} tasks remaining", incomplete.len()),
                ],
                recommendations: vec![
                    "Reduce task scope".to_string(),
                    "Add more resources".to_string(),
                    "Extend event date if possible".to_string(),
                ],
                confidence: 0.70,
            });
        } else if days_needed > days_until as f64 * 0.7 {
            return Some(TimelinePrediction {
                predicted_completion: predicted,
                risk_level: RiskLevel::Medium,
                factors: vec![format!(
                    "Timeline is tight with {:.1} days needed vs {} available",
                    days_needed, days_until
                )],
                recommendations: vec![
                    "Focus on critical path items".to_string(),
                    "Minimize scope creep".to_string(),
                    "Monitor progress daily".to_string(),
                ],
                confidence: 0.80,
            });
        } else {
            return Some(TimelinePrediction {
                predicted_completion: predicted,
                risk_level: RiskLevel::Low,
                factors: vec![format!(
                    "Healthy timeline with {:.1} days buffer",
                    days_until as f64 - days_needed
                )],
                recommendations: vec![
                    "Maintain current pace".to_string(),
                    "Address blockers quickly".to_string(),
                ],
                confidence: 0.85,
            });
        }
    }

    Some(TimelinePrediction {
        predicted_completion: predicted,
        risk_level: RiskLevel::Medium,
        factors: vec![format!(
            "{} tasks remaining, ~{:.1} days of effort",
            incomplete.len(),
            total_effort
        )],
        recommendations: vec!["Continue monitoring progress".to_string()],
        confidence: 0.65,
    })
}

fn generate_summary(insights: &[Insight], health_score: f64) -> String {
    let warnings = insights
        .iter()
        .filter(|i| i.kind == InsightKind::Warning)
        .count();

    if health_score >= 90.0 {
        "Workflow is healthy and on track. Great progress!".to_string()
    } else if health_score >= 70.0 {
        if warnings > 0 {
            format!("Workflow is stable with {} warning(s) to address.", warnings)
        } else {
            "Workflow is progressing well.".to_string()
        }
    } else if health_score >= 50.0 {
        if warnings > 0 {
            format!("Attention needed: {} warning(s) require action.", warnings)
        } else {
            "Workflow has some issues that should be addressed.".to_string()
        }
    } else {
        format!(
            "Critical attention required: {} issue(s) need immediate action.",
            warnings
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    fn task(id: i64, phase: Phase, status: TaskStatus, priority: Priority) -> AnalyzerTask {
        AnalyzerTask {
            id,
            title: format!("task {}", id),
            description: None,
            category: "content".to_string(),
            phase,
            status,
            priority,
            is_blocked: status == TaskStatus::Blocked,
            blocking_reason: None,
            assignee_id: Some(1),
            due_date: None,
            estimated_hours: None,
        }
    }

    // ---------- blocked tasks ----------

    #[test]
    fn test_blocked_tasks_grouped_by_reason() {
        let mut a = task(1, Phase::Logistics, TaskStatus::Blocked, Priority::Medium);
        a.blocking_reason = Some("Waiting on budget".to_string());
        let mut b = task(2, Phase::Logistics, TaskStatus::Blocked, Priority::Medium);
        b.blocking_reason = Some("Waiting on budget".to_string());
        let c = task(3, Phase::Logistics, TaskStatus::Blocked, Priority::Medium);

        let insights = analyze_blocked_tasks(&[a, b, c]);
        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0].related_task_ids, vec![1, 2]);
        assert!(insights[0].description.contains("Waiting on budget"));
        assert!(insights[1].description.contains("Unknown reason"));
    }

    #[test]
    fn test_critical_blocked_insight_comes_first() {
        let a = task(1, Phase::Logistics, TaskStatus::Blocked, Priority::Critical);
        let b = task(2, Phase::Logistics, TaskStatus::Blocked, Priority::Low);

        let insights = analyze_blocked_tasks(&[a, b]);
        assert_eq!(insights[0].title, "Critical tasks are blocked!");
        assert_eq!(insights[0].impact, Impact::Critical);
        assert_eq!(insights[0].related_task_ids, vec![1]);
    }

    #[test]
    fn test_no_blocked_tasks_no_insights() {
        let a = task(1, Phase::Logistics, TaskStatus::Todo, Priority::Critical);
        assert!(analyze_blocked_tasks(&[a]).is_empty());
    }

    // ---------- overdue tasks ----------

    #[test]
    fn test_overdue_buckets() {
        let mut severe = task(1, Phase::Marketing, TaskStatus::Todo, Priority::High);
        severe.due_date = Some(now() - Duration::days(10));
        let mut moderate = task(2, Phase::Marketing, TaskStatus::Todo, Priority::High);
        moderate.due_date = Some(now() - Duration::days(5));
        let mut slight = task(3, Phase::Marketing, TaskStatus::Todo, Priority::High);
        slight.due_date = Some(now() - Duration::days(1));

        let insights = analyze_overdue_tasks(&[severe, moderate, slight], now());
        assert_eq!(insights.len(), 3);
        assert_eq!(insights[0].impact, Impact::Critical);
        assert_eq!(insights[0].related_task_ids, vec![1]);
        assert_eq!(insights[1].impact, Impact::High);
        assert_eq!(insights[1].related_task_ids, vec![2]);
        assert_eq!(insights[2].kind, InsightKind::Suggestion);
        assert_eq!(insights[2].related_task_ids, vec![3]);
    }

    #[test]
    fn test_done_and_blocked_tasks_are_not_overdue() {
        let mut done = task(1, Phase::Marketing, TaskStatus::Done, Priority::High);
        done.due_date = Some(now() - Duration::days(10));
        let mut blocked = task(2, Phase::Marketing, TaskStatus::Blocked, Priority::High);
        blocked.due_date = Some(now() - Duration::days(10));

        assert!(analyze_overdue_tasks(&[done, blocked], now()).is_empty());
    }

    // ---------- phase progress ----------

    #[test]
    fn test_earlier_phase_behind_is_flagged() {
        let mut tasks = Vec::new();
        // Ideation: 1/4 done while current phase is logistics
        tasks.push(task(1, Phase::Ideation, TaskStatus::Done, Priority::Medium));
        for id in 2..=4 {
            tasks.push(task(id, Phase::Ideation, TaskStatus::Todo, Priority::Medium));
        }

        let insights = analyze_phase_progress(&tasks, Phase::Logistics);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].title, "Ideation phase is behind");
        assert_eq!(insights[0].related_task_ids, vec![2, 3, 4]);
    }

    #[test]
    fn test_current_phase_ready_to_advance() {
        let mut tasks = Vec::new();
        for id in 1..=9 {
            tasks.push(task(id, Phase::Logistics, TaskStatus::Done, Priority::Medium));
        }
        tasks.push(task(10, Phase::Logistics, TaskStatus::Todo, Priority::Medium));

        let insights = analyze_phase_progress(&tasks, Phase::Logistics);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].title, "Ready to advance from Logistics");
        assert!(!insights[0].actionable);
    }

    // ---------- timeline risks ----------

    #[test]
    fn test_task_overdue_by_hours_is_critical_timeline_risk() {
        let mut t = task(1, Phase::Preparation, TaskStatus::Todo, Priority::Medium);
        t.due_date = Some(now() - Duration::hours(2));

        let insights = analyze_timeline_risks(&[t], Some(now() + Duration::days(30)), now());
        assert_eq!(
            insights[0].title,
            "Tasks at critical risk of missing deadlines"
        );
        assert_eq!(insights[0].related_task_ids, vec![1]);
    }

    // ---------- dependencies ----------

    #[test]
    fn test_busiest_phase_tie_keeps_first_seen_phase() {
        // Marketing appears first in the task list; ideation ties its count.
        let mut tasks = Vec::new();
        for id in 1..=9 {
            tasks.push(task(id, Phase::Marketing, TaskStatus::Todo, Priority::Medium));
        }
        for id in 10..=18 {
            tasks.push(task(id, Phase::Ideation, TaskStatus::Todo, Priority::Medium));
        }

        let insights = analyze_dependencies(&tasks);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].title, "Heavy workload in Marketing phase");
    }

    // ---------- health score ----------

    #[test]
    fn test_empty_workflow_is_fully_healthy() {
        assert_eq!(calculate_workflow_health(&[], now()), 100.0);
    }

    #[test]
    fn test_health_penalties_and_bonuses() {
        // 3 done of 4 (ratio > 0.75 -> +10), 1 unassigned todo (-2)
        let mut tasks = vec![
            task(1, Phase::Ideation, TaskStatus::Done, Priority::Medium),
            task(2, Phase::Ideation, TaskStatus::Done, Priority::Medium),
            task(3, Phase::Ideation, TaskStatus::Done, Priority::Medium),
        ];
        let mut open = task(4, Phase::Ideation, TaskStatus::Todo, Priority::Medium);
        open.assignee_id = None;
        tasks.push(open);

        // 100 - 2 + 5 + 5, clamped to 100
        assert_eq!(calculate_workflow_health(&tasks, now()), 100.0);
    }

    #[test]
    fn test_health_score_floors_at_zero() {
        let mut tasks = Vec::new();
        for id in 1..=25 {
            let mut t = task(id, Phase::Logistics, TaskStatus::Blocked, Priority::High);
            t.assignee_id = None;
            tasks.push(t);
        }
        // 25 blocked (-125) plus 25 unassigned (-50)
        assert_eq!(calculate_workflow_health(&tasks, now()), 0.0);
    }

    #[test]
    fn test_health_never_rises_as_blockers_accumulate() {
        let mut tasks: Vec<AnalyzerTask> = (1..=10)
            .map(|id| task(id, Phase::Logistics, TaskStatus::Todo, Priority::Medium))
            .collect();

        let mut previous = calculate_workflow_health(&tasks, now());
        for i in 0..5 {
            tasks[i].status = TaskStatus::Blocked;
            tasks[i].is_blocked = true;
            let health = calculate_workflow_health(&tasks, now());
            assert!(health <= previous);
            previous = health;
        }
    }

    #[test]
    fn test_health_never_rises_as_overdue_grows() {
        let mut tasks: Vec<AnalyzerTask> = (1..=10)
            .map(|id| task(id, Phase::Logistics, TaskStatus::Todo, Priority::Medium))
            .collect();

        let mut previous = calculate_workflow_health(&tasks, now());
        for i in 0..5 {
            tasks[i].due_date = Some(now() - Duration::days(2));
            let health = calculate_workflow_health(&tasks, now());
            assert!(health <= previous);
            previous = health;
        }
    }

    // ---------- prediction ----------

    #[test]
    fn test_no_prediction_when_everything_done() {
        let tasks = vec![task(1, Phase::Review, TaskStatus::Done, Priority::Low)];
        assert!(predict_completion(&tasks, None, now()).is_none());
    }

    #[test]
    fn test_prediction_high_risk_when_effort_exceeds_time() {
        let mut tasks = Vec::new();
        for id in 1..=20 {
            tasks.push(task(id, Phase::Logistics, TaskStatus::Todo, Priority::Critical));
        }
        // 20 * 2.0 effort days / 3 capacity > 2 days until event
        let event_date = Some(now() + Duration::days(2));
        let prediction = predict_completion(&tasks, event_date, now()).unwrap();
        assert_eq!(prediction.risk_level, RiskLevel::High);
        assert!((prediction.confidence - 0.70).abs() < 1e-9);
    }

    #[test]
    fn test_prediction_low_risk_with_ample_time() {
        let tasks = vec![task(1, Phase::Logistics, TaskStatus::Todo, Priority::Low)];
        let event_date = Some(now() + Duration::days(60));
        let prediction = predict_completion(&tasks, event_date, now()).unwrap();
        assert_eq!(prediction.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_prediction_without_event_date_is_medium() {
        let tasks = vec![task(1, Phase::Logistics, TaskStatus::Todo, Priority::Low)];
        let prediction = predict_completion(&tasks, None, now()).unwrap();
        assert_eq!(prediction.risk_level, RiskLevel::Medium);
        assert!((prediction.confidence - 0.65).abs() < 1e-9);
    }

    // ---------- summary ----------

    #[test]
    fn test_summary_brackets() {
        assert_eq!(
            generate_summary(&[], 95.0),
            "Workflow is healthy and on track. Great progress!"
        );
        assert_eq!(generate_summary(&[], 75.0), "Workflow is progressing well.");
        assert_eq!(
            generate_summary(&[], 55.0),
            "Workflow has some issues that should be addressed."
        );
        assert_eq!(
            generate_summary(&[], 30.0),
            "Critical attention required: 0 issue(s) need immediate action."
        );
    }

    #[test]
    fn test_summary_counts_warnings() {
        let warning = Insight {
            kind: InsightKind::Warning,
            category: InsightCategory::Timeline,
            title: "t".to_string(),
            description: "d".to_string(),
            confidence: 0.9,
            actionable: true,
            related_task_ids: vec![],
            recommendation: "r".to_string(),
            impact: Impact::High,
        };
        assert_eq!(
            generate_summary(&[warning], 75.0),
            "Workflow is stable with 1 warning(s) to address."
        );
    }

    // ---------- full pass ----------

    #[test]
    fn test_analyze_workflow_is_deterministic() {
        let mut tasks = Vec::new();
        let mut blocked = task(1, Phase::Logistics, TaskStatus::Blocked, Priority::Critical);
        blocked.blocking_reason = Some("Venue contract".to_string());
        tasks.push(blocked);
        let mut overdue = task(2, Phase::Logistics, TaskStatus::Todo, Priority::High);
        overdue.due_date = Some(now() - Duration::days(10));
        tasks.push(overdue);

        let event_date = Some(now() + Duration::days(30));
        let a = analyze_workflow(&tasks, event_date, Phase::Logistics, now());
        let b = analyze_workflow(&tasks, event_date, Phase::Logistics, now());

        assert_eq!(a.insights.len(), b.insights.len());
        assert_eq!(a.summary, b.summary);
        // Blocked analysis precedes overdue analysis
        assert_eq!(a.insights[0].title, "Critical tasks are blocked!");
        assert!(a.insights.iter().any(|i| i.title.contains("severely overdue")));
    }

    #[test]
    fn test_priority_recommendation_raises_urgent_low_task() {
        let mut t = task(1, Phase::Logistics, TaskStatus::InProgress, Priority::Medium);
        t.category = "venue".to_string();
        t.due_date = Some(now() - Duration::days(1));
        let event_date = Some(now() + Duration::days(5));

        let recs = generate_priority_recommendations(&[t], event_date, now());
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].suggested_priority, Priority::High);
        assert!(recs[0].score >= RAISE_THRESHOLD);
        assert!(recs[0].factors.contains(&"Task is overdue".to_string()));
    }

    #[test]
    fn test_priority_recommendation_lowers_idle_high_task() {
        let mut t = task(1, Phase::Review, TaskStatus::Todo, Priority::High);
        t.due_date = None;
        // Far-out event drags the proximity term negative
        let event_date = Some(now() + Duration::days(250));

        let recs = generate_priority_recommendations(&[t], event_date, now());
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].suggested_priority, Priority::Medium);
    }
}
