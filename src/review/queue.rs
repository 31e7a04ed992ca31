use std::{
    collections::VecDeque,
    sync::Arc,
};

use tracing::debug;

use crate::core::{
    Dimension,
    ReviewTask,
    Subject,
};

/// Tasks to be answered, used as a stack: the back is the current task and
/// tasks that need retesting go to the front, behind everything still queued.
#[derive(Debug, Default, Clone)]
pub struct ReviewQueue {
    tasks: VecDeque<ReviewTask>,
}

/// Reading is pushed first so meaning ends up on top and gets asked first.
pub fn derive_tasks(subject: &Arc<Subject>) -> Vec<ReviewTask> {
    if subject.subject_type.has_reading() {
        vec![
            ReviewTask::new(subject.clone(), Dimension::Reading),
            ReviewTask::new(subject.clone(), Dimension::Meaning),
        ]
    } else {
        vec![ReviewTask::new(subject.clone(), Dimension::Meaning)]
    }
}

impl ReviewQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialize(subjects: &[Arc<Subject>]) -> Self {
        let tasks: VecDeque<ReviewTask> = subjects.iter().flat_map(derive_tasks).collect();
        debug!("Queued {} tasks for {} subjects", tasks.len(), subjects.len());
        Self { tasks }
    }

    pub fn current(&self) -> Option<&ReviewTask> {
        self.tasks.back()
    }

    pub fn advance(&mut self) -> Option<ReviewTask> {
        self.tasks.pop_back()
    }

    /// Moves the current task to the front so it is retested after every other queued task.
    pub fn requeue(&mut self) -> Option<&ReviewTask> {
        let task = self.tasks.pop_back()?;
        debug!("Requeued {} of subject {}", task.dimension, task.subject_id());
        self.tasks.push_front(task);
        self.tasks.front()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Head first, current task last
    pub fn iter(&self) -> impl Iterator<Item = &ReviewTask> {
        self.tasks.iter()
    }

    pub fn outstanding_for(&self, subject_id: u64) -> usize {
        self.tasks.iter().filter(|t| t.subject_id() == subject_id).count()
    }
}
