use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use schema_refcheck::{DocumentFetcher, FetchedDocument, LoadError};

use super::test_helpers::schema_xml;

/// Canned response for one URL
#[derive(Clone, Debug)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
    pub delay: Option<Duration>,
}

impl MockResponse {
    pub fn schema(references: &[&str]) -> Self {
        Self {
            status: 200,
            content_type: Some("application/xml".to_string()),
            body: schema_xml(references),
            delay: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: Some("text/html".to_string()),
            body: String::new(),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Fetcher serving canned responses and recording every request.
///
/// URLs without a registered response answer 404.
#[derive(Default)]
pub struct MockFetcher {
    responses: Mutex<HashMap<String, MockResponse>>,
    request_log: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_response(&self, url: &str, response: MockResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
    }

    pub fn add_schema(&self, url: &str, references: &[&str]) {
        self.add_response(url, MockResponse::schema(references));
    }

    pub fn requests(&self) -> Vec<String> {
        self.request_log.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.request_log.lock().unwrap().len()
    }

    pub fn requests_for(&self, url: &str) -> usize {
        self.request_log
            .lock()
            .unwrap()
            .iter()
            .filter(|requested| requested.as_str() == url)
            .count()
    }
}

#[async_trait]
impl DocumentFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, LoadError> {
        self.request_log.lock().unwrap().push(url.to_string());

        let response = self
            .responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| MockResponse::status(404));

        if let Some(delay) = response.delay {
            tokio::time::sleep(delay).await;
        }

        Ok(FetchedDocument {
            url: url.to_string(),
            status: response.status,
            content_type: response.content_type,
            body: response.body,
        })
    }
}
