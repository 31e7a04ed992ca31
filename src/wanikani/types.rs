use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::core::{
    Meaning,
    Reading,
    ReviewSubmission,
    SubjectType,
};

#[derive(Debug, Deserialize)]
pub struct Resource<T> {
    pub id: u64,
    pub object: String,
    pub url: String,
    pub data_updated_at: Option<DateTime<Utc>>,
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct CollectionResponse<T> {
    pub object: String,
    pub url: String,
    pub pages: CollectionPages,
    pub total_count: i64,
    pub data_updated_at: Option<DateTime<Utc>>,
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct CollectionPages {
    pub next_url: Option<String>,
    pub previous_url: Option<String>,
    pub per_page: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentData {
    pub subject_id: u64,
    pub subject_type: SubjectType,
    pub available_at: Option<DateTime<Utc>>,
    pub srs_stage: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubjectData {
    pub characters: Option<String>,
    pub meanings: Vec<Meaning>,
    #[serde(default)]
    pub readings: Option<Vec<Reading>>, // only for kanji and vocabulary
    pub level: u8,
    pub document_url: String,
    pub meaning_mnemonic: Option<String>,
    pub reading_mnemonic: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Summary {
    pub data: SummaryData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryData {
    pub lessons: Vec<TimeBucket>,
    pub reviews: Vec<TimeBucket>,
    pub next_reviews_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeBucket {
    pub available_at: DateTime<Utc>,
    pub subject_ids: Vec<u64>,
}

#[derive(Debug, Deserialize)]
pub struct UserResponse {
    pub data: UserData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserData {
    pub id: String,
    pub username: String,
    pub level: u32,
    pub profile_url: String,
    pub subscription: Subscription,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subscription {
    pub active: bool,
    pub max_level_granted: u8,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewPayload<'a> {
    pub review: &'a ReviewSubmission,
}
