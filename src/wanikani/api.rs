use std::time::Duration;

use reqwest::{
    header::{
        AUTHORIZATION,
        USER_AGENT,
    },
    Client,
    Method,
    RequestBuilder,
    Response,
};
use serde::Deserialize;
use tracing::debug;

use super::types::{
    AssignmentData,
    CollectionResponse,
    Resource,
    ReviewPayload,
    Summary,
    SummaryData,
    SubjectData,
    UserData,
    UserResponse,
};
use crate::core::{
    ReviewSubmission,
    SubmittedReview,
    WanipopError,
};

const API_REVISION: &str = "20170710";

#[derive(Clone)]
pub struct WaniKaniClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl WaniKaniClient {
    pub fn new(api_key: &str, base_url: &str) -> Result<Self, WanipopError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| WanipopError::Custom(format!("HTTP client build failed: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn make_request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header("Wanikani-Revision", API_REVISION)
            .header(USER_AGENT, "wanipop/0.1 (+reqwest)")
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, WanipopError> {
        debug!("GET {url}");
        let response = self.make_request(Method::GET, url).send().await?;
        Ok(ensure_success(response)?.json().await?)
    }

    /// Follows `pages.next_url` until the whole collection is read.
    async fn get_collection<T: for<'de> Deserialize<'de>>(
        &self,
        url: String,
    ) -> Result<Vec<T>, WanipopError> {
        let mut items = Vec::new();
        let mut next = Some(url);
        while let Some(url) = next {
            let page: CollectionResponse<T> = self.get_json(&url).await?;
            items.extend(page.data);
            next = page.pages.next_url;
        }
        Ok(items)
    }

    pub async fn fetch_user(&self) -> Result<UserData, WanipopError> {
        let response: UserResponse = self.get_json(&self.endpoint("user")).await?;
        Ok(response.data)
    }

    pub async fn fetch_summary(&self) -> Result<SummaryData, WanipopError> {
        let response: Summary = self.get_json(&self.endpoint("summary")).await?;
        Ok(response.data)
    }

    pub async fn fetch_assignments_for_subjects(
        &self,
        subject_ids: &[u64],
    ) -> Result<Vec<Resource<AssignmentData>>, WanipopError> {
        let url = format!("{}?subject_ids={}", self.endpoint("assignments"), join_ids(subject_ids));
        self.get_collection(url).await
    }

    pub async fn fetch_subjects(
        &self,
        subject_ids: &[u64],
    ) -> Result<Vec<Resource<SubjectData>>, WanipopError> {
        let url = format!("{}?ids={}", self.endpoint("subjects"), join_ids(subject_ids));
        self.get_collection(url).await
    }

    pub async fn submit_review(
        &self,
        review: &ReviewSubmission,
    ) -> Result<SubmittedReview, WanipopError> {
        let url = self.endpoint("reviews");
        debug!("POST {url} for assignment {}", review.assignment_id);
        let response = self
            .make_request(Method::POST, &url)
            .json(&ReviewPayload { review })
            .send()
            .await?;
        let created: Resource<SubmittedReview> = ensure_success(response)?.json().await?;
        Ok(created.data)
    }
}

fn join_ids(ids: &[u64]) -> String {
    ids.iter().map(u64::to_string).collect::<Vec<_>>().join(",")
}

fn ensure_success(response: Response) -> Result<Response, WanipopError> {
    if !response.status().is_success() {
        return Err(WanipopError::Api {
            status: response.status().as_u16(),
            url: response.url().to_string(),
        });
    }
    Ok(response)
}
