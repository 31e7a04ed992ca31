use std::{
    collections::HashMap,
    sync::Arc,
};

use crate::core::Subject;

/// Every subject of the running session by id. Filled once per session.
#[derive(Debug, Default)]
pub struct SubjectCatalog {
    subjects: HashMap<u64, Arc<Subject>>,
}

impl SubjectCatalog {
    /// Builds a catalog and returns the shared subjects in batch order.
    /// A repeated subject id keeps its last record.
    pub fn populate(batch: Vec<Subject>) -> (Self, Vec<Arc<Subject>>) {
        let mut subjects = HashMap::with_capacity(batch.len());
        let mut ordered = Vec::with_capacity(batch.len());

        for subject in batch {
            let subject = Arc::new(subject);
            if subjects.insert(subject.subject_id, subject.clone()).is_some() {
                ordered.retain(|s: &Arc<Subject>| s.subject_id != subject.subject_id);
            }
            ordered.push(subject);
        }

        (Self { subjects }, ordered)
    }

    pub fn get(&self, subject_id: u64) -> Option<&Arc<Subject>> {
        self.subjects.get(&subject_id)
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}
