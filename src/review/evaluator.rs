use crate::core::{
    utils::NormalizeAnswer,
    Dimension,
    ReviewTask,
    ScriptComparator,
    WanipopError,
};

/// Grades a raw attempt against every answer listed for the task's dimension.
/// Meanings must match exactly once case and whitespace are ignored; readings
/// are compared after conversion to the comparator's canonical script.
pub fn evaluate(
    task: &ReviewTask,
    attempt: &str,
    comparator: &dyn ScriptComparator,
) -> Result<bool, WanipopError> {
    let attempt = attempt.normalize_answer();

    match task.dimension {
        Dimension::Meaning => {
            Ok(task.subject.meanings.iter().any(|m| m.meaning.normalize_answer() == attempt))
        }
        Dimension::Reading => {
            let readings = task
                .subject
                .readings
                .as_deref()
                .filter(|r| !r.is_empty())
                .ok_or(WanipopError::MissingReadings { subject_id: task.subject_id() })?;

            Ok(readings.iter().any(|r| comparator.same_reading(&r.reading, &attempt)))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::{
        KanaComparator,
        Meaning,
        Reading,
        Subject,
        SubjectType,
    };

    fn meaning(text: &str, primary: bool) -> Meaning {
        Meaning { meaning: text.to_string(), primary, accepted_answer: true }
    }

    fn vocabulary() -> Arc<Subject> {
        Arc::new(Subject {
            subject_id: 2467,
            assignment_id: 80,
            subject_type: SubjectType::Vocabulary,
            characters: Some("大人".to_string()),
            meanings: vec![meaning("Adult", true), meaning("Grown Up", false)],
            readings: Some(vec![Reading {
                reading: "おとな".to_string(),
                primary: true,
                accepted_answer: true,
                kind: None,
            }]),
            meaning_mnemonic: None,
            reading_mnemonic: None,
        })
    }

    #[test]
    fn test_meaning_ignores_case_and_whitespace() {
        let task = ReviewTask::new(vocabulary(), Dimension::Meaning);
        assert!(evaluate(&task, "adult", &KanaComparator).unwrap());
        assert!(evaluate(&task, " GROWNUP ", &KanaComparator).unwrap());
        assert!(evaluate(&task, "grown   up", &KanaComparator).unwrap());
    }

    #[test]
    fn test_meaning_has_no_fuzzy_matching() {
        let task = ReviewTask::new(vocabulary(), Dimension::Meaning);
        assert!(!evaluate(&task, "adults", &KanaComparator).unwrap());
        assert!(!evaluate(&task, "adlt", &KanaComparator).unwrap());
        assert!(!evaluate(&task, "", &KanaComparator).unwrap());
    }

    #[test]
    fn test_reading_accepts_romaji_and_either_kana() {
        let task = ReviewTask::new(vocabulary(), Dimension::Reading);
        assert!(evaluate(&task, "otona", &KanaComparator).unwrap());
        assert!(evaluate(&task, "おとな", &KanaComparator).unwrap());
        assert!(evaluate(&task, "オトナ", &KanaComparator).unwrap());
        assert!(!evaluate(&task, "おとこ", &KanaComparator).unwrap());
    }

    #[test]
    fn test_reading_does_not_accept_the_meaning() {
        let task = ReviewTask::new(vocabulary(), Dimension::Reading);
        assert!(!evaluate(&task, "adult", &KanaComparator).unwrap());
    }

    #[test]
    fn test_reading_task_without_readings_is_a_fault() {
        let radical = Arc::new(Subject {
            subject_type: SubjectType::Radical,
            readings: None,
            ..(*vocabulary()).clone()
        });
        let task = ReviewTask::new(radical, Dimension::Reading);
        assert!(matches!(
            evaluate(&task, "otona", &KanaComparator),
            Err(WanipopError::MissingReadings { subject_id: 2467 })
        ));
    }
}
