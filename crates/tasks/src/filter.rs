//! Completion-status filtering over the task mirror

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::models::Task;

/// Which tasks a list shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Completed => task.is_completed,
            Self::Pending => !task.is_completed,
        }
    }

    /// Matching tasks, in their original order
    pub fn apply(&self, tasks: &[Task]) -> Vec<Task> {
        tasks.iter().filter(|t| self.matches(t)).cloned().collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Completed => "completed",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown filter '{0}', expected all, completed or pending")]
pub struct UnknownFilter(pub String);

impl FromStr for TaskFilter {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "completed" | "complete" | "done" => Ok(Self::Completed),
            "pending" | "incomplete" => Ok(Self::Pending),
            _ => Err(UnknownFilter(s.to_string())),
        }
    }
}

/// Counts shown on a dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|t| t.is_completed).count();
        Self {
            total: tasks.len(),
            completed,
            pending: tasks.len() - completed,
        }
    }
}

/// A selector paired with the last collection it was applied to.
///
/// Call [`TaskView::refresh`] whenever the mirror changes and
/// [`TaskView::set_filter`] when the selector does; both recompute.
#[derive(Debug, Clone, Default)]
pub struct TaskView {
    filter: TaskFilter,
    source: Vec<Task>,
    visible: Vec<Task>,
}

impl TaskView {
    pub fn new(filter: TaskFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn filter(&self) -> TaskFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: TaskFilter) {
        self.filter = filter;
        self.visible = filter.apply(&self.source);
    }

    pub fn refresh(&mut self, tasks: Vec<Task>) {
        self.visible = self.filter.apply(&tasks);
        self.source = tasks;
    }

    pub fn tasks(&self) -> &[Task] {
        &self.visible
    }

    pub fn stats(&self) -> TaskStats {
        TaskStats::from_tasks(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(id: i64, done: bool) -> Task {
        Task {
            id,
            user_id: 1,
            title: format!("task {}", id),
            description: None,
            is_completed: done,
            created_at: Utc::now(),
            updated_at: None,
            completed_at: done.then(Utc::now),
        }
    }

    #[test]
    fn each_filter_selects_exactly_its_subset() {
        let tasks = vec![task(1, false), task(2, true), task(3, false), task(4, true)];

        assert_eq!(TaskFilter::All.apply(&tasks), tasks);

        let done: Vec<i64> = TaskFilter::Completed.apply(&tasks).iter().map(|t| t.id).collect();
        assert_eq!(done, vec![2, 4]);

        let pending: Vec<i64> = TaskFilter::Pending.apply(&tasks).iter().map(|t| t.id).collect();
        assert_eq!(pending, vec![1, 3]);
    }

    #[test]
    fn parse_filter_names() {
        assert_eq!("all".parse::<TaskFilter>().unwrap(), TaskFilter::All);
        assert_eq!("Completed".parse::<TaskFilter>().unwrap(), TaskFilter::Completed);
        assert_eq!("incomplete".parse::<TaskFilter>().unwrap(), TaskFilter::Pending);
        assert!("someday".parse::<TaskFilter>().is_err());
    }

    #[test]
    fn unknown_filter_names_the_choices() {
        let err = "someday".parse::<TaskFilter>().unwrap_err();
        assert_eq!(err, UnknownFilter("someday".to_string()));
        assert_eq!(
            err.to_string(),
            "unknown filter 'someday', expected all, completed or pending"
        );

        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert!(boxed.source().is_none());
    }

    #[test]
    fn view_recomputes_on_either_change() {
        let mut view = TaskView::new(TaskFilter::Pending);
        view.refresh(vec![task(1, false), task(2, true)]);
        assert_eq!(view.tasks().len(), 1);

        view.set_filter(TaskFilter::Completed);
        assert_eq!(view.tasks()[0].id, 2);

        view.refresh(vec![task(1, true), task(2, true), task(3, false)]);
        assert_eq!(view.tasks().len(), 2);
        assert_eq!(
            view.stats(),
            TaskStats {
                total: 3,
                completed: 2,
                pending: 1
            }
        );
    }
}
