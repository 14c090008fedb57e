/// Dashboard aggregation
///
/// Every summary here has a fixed shape: all status buckets and all priority
/// buckets are always present, with zero for empty buckets, so clients never
/// have to handle a missing key.
///
/// All functions take an already-scoped [`TaskFilter`] (see
/// [`crate::filter::visible_to`]) and never widen it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filter::TaskFilter;
use crate::models::task::{RecentTask, Task, TaskPriority, TaskStatus};
use crate::store::{StoreResult, TaskStore};

/// Number of tasks listed under `recentTasks`
pub const RECENT_TASKS_LIMIT: i64 = 10;

/// Per-status counts attached to task listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub all: i64,
    pub pending_tasks: i64,
    pub in_progress_tasks: i64,
    pub completed_tasks: i64,
}

impl StatusSummary {
    /// Builds a summary from grouped counts; missing statuses count as zero
    pub fn from_counts(counts: &[(TaskStatus, i64)]) -> Self {
        counts
            .iter()
            .fold(Self::default(), |mut summary, &(status, count)| {
                summary.all += count;
                match status {
                    TaskStatus::Pending => summary.pending_tasks += count,
                    TaskStatus::InProgress => summary.in_progress_tasks += count,
                    TaskStatus::Completed => summary.completed_tasks += count,
                }
                summary
            })
    }

    /// Summarizes an in-memory task set
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let counts: Vec<(TaskStatus, i64)> = tasks.into_iter().map(|t| (t.status, 1)).collect();
        Self::from_counts(&counts)
    }

    /// Counts the tasks matching `filter`, grouped by status
    pub async fn load<S>(store: &S, filter: &TaskFilter) -> StoreResult<Self>
    where
        S: TaskStore + ?Sized,
    {
        let counts = store.count_by_status(filter).await?;
        Ok(Self::from_counts(&counts))
    }
}

/// Status distribution chart
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDistribution {
    #[serde(rename = "Pending")]
    pub pending: i64,

    #[serde(rename = "InProgress")]
    pub in_progress: i64,

    #[serde(rename = "Completed")]
    pub completed: i64,

    #[serde(rename = "All")]
    pub all: i64,
}

impl From<StatusSummary> for StatusDistribution {
    fn from(summary: StatusSummary) -> Self {
        Self {
            pending: summary.pending_tasks,
            in_progress: summary.in_progress_tasks,
            completed: summary.completed_tasks,
            all: summary.all,
        }
    }
}

/// Priority distribution chart
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityLevels {
    #[serde(rename = "Low")]
    pub low: i64,

    #[serde(rename = "Medium")]
    pub medium: i64,

    #[serde(rename = "High")]
    pub high: i64,
}

impl PriorityLevels {
    pub fn from_counts(counts: &[(TaskPriority, i64)]) -> Self {
        counts
            .iter()
            .fold(Self::default(), |mut levels, &(priority, count)| {
                match priority {
                    TaskPriority::Low => levels.low += count,
                    TaskPriority::Medium => levels.medium += count,
                    TaskPriority::High => levels.high += count,
                }
                levels
            })
    }
}

/// Headline numbers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatistics {
    pub total_tasks: i64,
    pub pending_tasks: i64,
    pub in_progress_tasks: i64,
    pub completed_tasks: i64,

    /// Not completed and past due at the time of the request
    pub overdue_tasks: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCharts {
    pub task_distribution: StatusDistribution,
    pub task_priority_levels: PriorityLevels,
}

/// Full dashboard payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub statistics: DashboardStatistics,
    pub charts: DashboardCharts,
    pub recent_tasks: Vec<RecentTask>,
}

/// Aggregates the dashboard for the tasks matching `scope`
///
/// `now` is the reference instant for the overdue count.
pub async fn build_dashboard<S>(
    store: &S,
    scope: &TaskFilter,
    now: DateTime<Utc>,
) -> StoreResult<DashboardData>
where
    S: TaskStore + ?Sized,
{
    let summary = StatusSummary::load(store, scope).await?;
    let priorities = PriorityLevels::from_counts(&store.count_by_priority(scope).await?);
    let overdue = store.count_tasks(&scope.clone().overdue_at(now)).await?;
    let recent_tasks = store.recent_tasks(scope, RECENT_TASKS_LIMIT).await?;

    Ok(DashboardData {
        statistics: DashboardStatistics {
            total_tasks: summary.all,
            pending_tasks: summary.pending_tasks,
            in_progress_tasks: summary.in_progress_tasks,
            completed_tasks: summary.completed_tasks,
            overdue_tasks: overdue,
        },
        charts: DashboardCharts {
            task_distribution: summary.into(),
            task_priority_levels: priorities,
        },
        recent_tasks,
    })
}
