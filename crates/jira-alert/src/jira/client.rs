//! Jira REST API v2 client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::models::{FilterResponse, SearchResponse};
use super::{Filter, Issue, IssueSource};
use crate::error::JiraError;

/// Issues requested per search page.
const PAGE_SIZE: usize = 100;

/// Only the fields the alert text needs.
const SEARCH_FIELDS: &str = "summary,priority";

/// Jira client using basic authentication.
#[derive(Clone)]
pub struct JiraClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl JiraClient {
    /// Create a new client for the Jira instance at `base_url`.
    ///
    /// Every request is bounded by `timeout`.
    pub fn new(
        base_url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, JiraError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
        })
    }

    /// Look up a saved filter by its numeric id.
    pub async fn get_filter(&self, id: u64) -> Result<Filter, JiraError> {
        let filter: FilterResponse = self
            .get(&format!("/rest/api/2/filter/{id}"), &[])
            .await?;
        Ok(filter.into())
    }

    /// Make an authenticated GET request and decode the JSON body.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, JiraError> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "GET request");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&text).map_err(|e| {
                warn!(error = %e, "Failed to parse Jira response");
                JiraError::Decode(e)
            })
        } else {
            Err(JiraError::Api {
                status: status.as_u16(),
                message: text,
            })
        }
    }
}

#[async_trait]
impl IssueSource for JiraClient {
    async fn search(&self, jql: &str) -> Result<Vec<Issue>, JiraError> {
        let mut issues = Vec::new();

        loop {
            let query = [
                ("jql", jql.to_string()),
                ("startAt", issues.len().to_string()),
                ("maxResults", PAGE_SIZE.to_string()),
                ("fields", SEARCH_FIELDS.to_string()),
            ];
            let page: SearchResponse = self.get("/rest/api/2/search", &query).await?;

            let received = page.issues.len();
            issues.extend(page.issues.into_iter().map(Issue::from));

            debug!(
                received,
                collected = issues.len(),
                total = page.total,
                "Fetched search page"
            );

            if received == 0 || issues.len() >= page.total {
                break;
            }
        }

        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> JiraClient {
        JiraClient::new(&server.uri(), "bot", "secret", Duration::from_secs(5)).unwrap()
    }

    fn issue_json(key: &str, priority: &str, summary: &str) -> serde_json::Value {
        json!({
            "id": "1",
            "key": key,
            "fields": { "summary": summary, "priority": { "name": priority } }
        })
    }

    #[tokio::test]
    async fn test_get_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/filter/10200"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "10200",
                "name": "Open incidents",
                "jql": "project = OPS AND status = Open",
                "favourite": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let filter = client_for(&server).get_filter(10200).await.unwrap();
        assert_eq!(filter.id, "10200");
        assert_eq!(filter.name, "Open incidents");
        assert_eq!(filter.jql, "project = OPS AND status = Open");
    }

    #[tokio::test]
    async fn test_missing_filter_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/filter/1"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such filter"))
            .mount(&server)
            .await;

        let err = client_for(&server).get_filter(1).await.unwrap_err();
        assert!(matches!(err, JiraError::Api { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_search_follows_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .and(query_param("jql", "project = OPS"))
            .and(query_param("startAt", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "startAt": 0,
                "maxResults": 2,
                "total": 3,
                "issues": [
                    issue_json("OPS-1", "High", "Disk full"),
                    issue_json("OPS-2", "Low", "Typo"),
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .and(query_param("startAt", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "startAt": 2,
                "maxResults": 2,
                "total": 3,
                "issues": [issue_json("OPS-3", "Medium", "Slow queries")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let issues = client_for(&server).search("project = OPS").await.unwrap();
        let keys: Vec<&str> = issues.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["OPS-1", "OPS-2", "OPS-3"]);
        assert_eq!(issues[0], Issue::new("OPS-1", "High", "Disk full"));
    }

    #[tokio::test]
    async fn test_search_stops_on_empty_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "startAt": 0,
                "total": 5,
                "issues": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let issues = client_for(&server).search("project = OPS").await.unwrap();
        assert!(issues.is_empty());
    }

    #[tokio::test]
    async fn test_search_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).search("project = OPS").await.unwrap_err();
        assert!(matches!(err, JiraError::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_search_bad_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).search("project = OPS").await.unwrap_err();
        assert!(matches!(err, JiraError::Decode(_)));
    }
}
