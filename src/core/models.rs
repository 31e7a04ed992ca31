use std::{
    fmt,
    sync::Arc,
};

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use wana_kana::ConvertJapanese;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    Radical,
    Kanji,
    Vocabulary,
    KanaVocabulary,
}

impl SubjectType {
    /// Whether subjects of this kind are tested on their reading as well as their meaning
    pub fn has_reading(&self) -> bool {
        matches!(self, SubjectType::Kanji | SubjectType::Vocabulary)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubjectType::Radical => "Radical",
            SubjectType::Kanji => "Kanji",
            SubjectType::Vocabulary | SubjectType::KanaVocabulary => "Vocabulary",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meaning {
    pub meaning: String,
    pub primary: bool,
    pub accepted_answer: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub reading: String,
    pub primary: bool,
    pub accepted_answer: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>, // onyomi, kunyomi, nanori
}

impl Reading {
    pub fn is_onyomi(&self) -> bool {
        self.kind.as_deref() == Some("onyomi")
    }

    pub fn is_kunyomi(&self) -> bool {
        self.kind.as_deref() == Some("kunyomi")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub subject_id: u64,
    pub assignment_id: u64,
    pub subject_type: SubjectType,
    pub characters: Option<String>,
    pub meanings: Vec<Meaning>,
    pub readings: Option<Vec<Reading>>, // only for kanji and vocabulary
    #[serde(default)]
    pub meaning_mnemonic: Option<String>,
    #[serde(default)]
    pub reading_mnemonic: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Meaning,
    Reading,
}

impl Dimension {
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Meaning => "Meaning",
            Dimension::Reading => "Reading",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Meaning => write!(f, "meaning"),
            Dimension::Reading => write!(f, "reading"),
        }
    }
}

/// Keyboard conversion the answer field should apply while the user types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Romaji,
    Hiragana,
    Katakana,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewTask {
    pub subject: Arc<Subject>,
    pub dimension: Dimension,
}

impl ReviewTask {
    pub fn new(subject: Arc<Subject>, dimension: Dimension) -> Self {
        Self { subject, dimension }
    }

    pub fn subject_id(&self) -> u64 {
        self.subject.subject_id
    }

    /// "Kanji Reading", "Radical Meaning", ...
    pub fn placeholder(&self) -> String {
        format!("{} {}", self.subject.subject_type.label(), self.dimension.label())
    }

    pub fn input_mode(&self) -> InputMode {
        if self.dimension == Dimension::Meaning {
            return InputMode::Romaji;
        }

        match self.subject.subject_type {
            SubjectType::Vocabulary => InputMode::Hiragana,
            SubjectType::Kanji => {
                let first = self.subject.readings.as_ref().and_then(|r| r.first());
                match first {
                    Some(reading) if reading.is_kunyomi() => InputMode::Hiragana,
                    _ => InputMode::Katakana,
                }
            }
            _ => InputMode::Romaji,
        }
    }

    /// Answers shown to the user once the task is graded. Onyomi are written in katakana.
    pub fn expected_answers(&self) -> Vec<String> {
        match self.dimension {
            Dimension::Meaning => self.subject.meanings.iter().map(|m| m.meaning.clone()).collect(),
            Dimension::Reading => self
                .subject
                .readings
                .iter()
                .flatten()
                .map(|r| if r.is_onyomi() { r.reading.to_katakana() } else { r.reading.clone() })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SrsStage {
    Locked = 0,
    Apprentice1,
    Apprentice2,
    Apprentice3,
    Apprentice4,
    Guru1,
    Guru2,
    Master,
    Enlightened,
    Burned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SrsTier {
    Locked,
    Apprentice,
    Guru,
    Master,
    Enlightened,
    Burned,
}

impl SrsStage {
    pub fn tier(&self) -> SrsTier {
        match self {
            SrsStage::Locked => SrsTier::Locked,
            SrsStage::Apprentice1
            | SrsStage::Apprentice2
            | SrsStage::Apprentice3
            | SrsStage::Apprentice4 => SrsTier::Apprentice,
            SrsStage::Guru1 | SrsStage::Guru2 => SrsTier::Guru,
            SrsStage::Master => SrsTier::Master,
            SrsStage::Enlightened => SrsTier::Enlightened,
            SrsStage::Burned => SrsTier::Burned,
        }
    }
}

impl TryFrom<u8> for SrsStage {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => SrsStage::Locked,
            1 => SrsStage::Apprentice1,
            2 => SrsStage::Apprentice2,
            3 => SrsStage::Apprentice3,
            4 => SrsStage::Apprentice4,
            5 => SrsStage::Guru1,
            6 => SrsStage::Guru2,
            7 => SrsStage::Master,
            8 => SrsStage::Enlightened,
            9 => SrsStage::Burned,
            other => return Err(format!("Unknown SRS stage {}", other)),
        })
    }
}

impl From<SrsStage> for u8 {
    fn from(stage: SrsStage) -> Self {
        stage as u8
    }
}

impl fmt::Display for SrsTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SrsTier::Locked => "Locked",
            SrsTier::Apprentice => "Apprentice",
            SrsTier::Guru => "Guru",
            SrsTier::Master => "Master",
            SrsTier::Enlightened => "Enlightened",
            SrsTier::Burned => "Burned",
        };
        f.write_str(text)
    }
}

/// Outcome of one subject as sent to the progress service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSubmission {
    pub assignment_id: u64,
    pub incorrect_meaning_answers: u8,
    pub incorrect_reading_answers: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedReview {
    pub created_at: DateTime<Utc>,
    pub assignment_id: u64,
    pub subject_id: u64,
    pub starting_srs_stage: SrsStage,
    pub ending_srs_stage: SrsStage,
    pub incorrect_meaning_answers: u8,
    pub incorrect_reading_answers: u8,
}

impl SubmittedReview {
    pub fn leveled_up(&self) -> bool {
        self.starting_srs_stage < self.ending_srs_stage
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Success(SubmittedReview),
    Failure { payload: ReviewSubmission, error: String },
}

impl SubmissionOutcome {
    pub fn assignment_id(&self) -> u64 {
        match self {
            SubmissionOutcome::Success(review) => review.assignment_id,
            SubmissionOutcome::Failure { payload, .. } => payload.assignment_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success(_))
    }
}
