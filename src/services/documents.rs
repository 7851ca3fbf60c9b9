use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

use crate::models::{Posting, UserProfile};

/// Documents fetched per catalog page
const PAGE_SIZE: usize = 100;

/// Errors that can occur when interacting with the document store
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid API key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Looks up volunteer profiles
#[async_trait]
pub trait ProfileProvider: Send + Sync {
    /// `Ok(None)` when no profile exists for `user_id`
    async fn get_user_profile(&self, user_id: &str) -> Result<Option<UserProfile>, DocumentStoreError>;
}

/// Lists the opportunity catalog
#[async_trait]
pub trait PostingCatalog: Send + Sync {
    async fn list_postings(&self) -> Result<Vec<Posting>, DocumentStoreError>;
}

/// Collection IDs in the document store
#[derive(Debug, Clone)]
pub struct DocumentCollections {
    pub profiles: String,
    pub postings: String,
}

/// REST client for the hosted document database
///
/// Constructed once at startup and shared through `AppState`; implements both
/// `ProfileProvider` and `PostingCatalog`.
pub struct DocumentStoreClient {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    client: Client,
    collections: DocumentCollections,
}

impl DocumentStoreClient {
    /// Create a new document store client
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collections: DocumentCollections,
    ) -> Result<Self, DocumentStoreError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            base_url,
            api_key,
            project_id,
            database_id,
            client,
            collections,
        })
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            collection
        )
    }

    async fn get_json(&self, url: &str) -> Result<Option<Value>, DocumentStoreError> {
        let response = self
            .client
            .get(url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(DocumentStoreError::Unauthorized),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
                tracing::error!("Document store request to {} failed: {} - {}", url, status, body);
                return Err(DocumentStoreError::ApiError(format!("{}", status)));
            }
            _ => {}
        }

        Ok(Some(response.json().await?))
    }
}

/// Deserialize a stored document, taking its ID from `$id` when the body has none
fn parse_document<T: DeserializeOwned>(doc: &Value, kind: &str) -> Result<T, DocumentStoreError> {
    let mut data = doc.get("data").unwrap_or(doc).clone();

    if let (Some(obj), Some(id)) = (data.as_object_mut(), doc.get("$id").cloned()) {
        obj.entry("id").or_insert(id);
    }

    serde_json::from_value(data)
        .map_err(|e| DocumentStoreError::InvalidResponse(format!("Failed to parse {}: {}", kind, e)))
}

#[async_trait]
impl ProfileProvider for DocumentStoreClient {
    async fn get_user_profile(&self, user_id: &str) -> Result<Option<UserProfile>, DocumentStoreError> {
        let url = format!(
            "{}/{}",
            self.documents_url(&self.collections.profiles),
            urlencoding::encode(user_id)
        );

        tracing::debug!("Fetching profile for user: {}", user_id);

        match self.get_json(&url).await? {
            Some(doc) => parse_document(&doc, "profile").map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl PostingCatalog for DocumentStoreClient {
    /// Fetch the whole catalog page by page.
    ///
    /// A document that does not parse as a posting fails the whole listing.
    async fn list_postings(&self) -> Result<Vec<Posting>, DocumentStoreError> {
        let base = self.documents_url(&self.collections.postings);
        let mut postings: Vec<Posting> = Vec::new();
        let mut seen_ids = HashSet::new();

        loop {
            let url = format!(
                "{}?queries[]={}&queries[]={}",
                base,
                urlencoding::encode(&format!("limit({})", PAGE_SIZE)),
                urlencoding::encode(&format!("offset({})", postings.len()))
            );

            let json = self
                .get_json(&url)
                .await?
                .ok_or_else(|| DocumentStoreError::ApiError("Postings collection not found".into()))?;

            let documents = json
                .get("documents")
                .and_then(|d| d.as_array())
                .ok_or_else(|| DocumentStoreError::InvalidResponse("Missing documents array".into()))?;

            let total = json.get("total").and_then(|t| t.as_u64()).map(|t| t as usize);

            let mut added = 0;
            for doc in documents {
                let posting = parse_document::<Posting>(doc, "posting")?;
                if let Some(id) = &posting.id {
                    if !seen_ids.insert(id.clone()) {
                        continue;
                    }
                }
                postings.push(posting);
                added += 1;
            }

            // Stores that ignore the offset keep returning the same page
            if added == 0 && !documents.is_empty() {
                tracing::warn!("Posting page at offset {} added no new documents, stopping", postings.len());
                break;
            }

            let exhausted = documents.len() < PAGE_SIZE || total.is_some_and(|t| postings.len() >= t);
            if exhausted {
                break;
            }
        }

        tracing::debug!("Listed {} postings", postings.len());

        Ok(postings)
    }
}
