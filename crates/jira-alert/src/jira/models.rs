//! Jira REST API v2 wire types.

use serde::Deserialize;

use super::{Filter, Issue, NO_PRIORITY};

/// `GET /rest/api/2/filter/{id}`
#[derive(Debug, Deserialize)]
pub(crate) struct FilterResponse {
    pub id: String,
    pub name: String,
    pub jql: String,
}

impl From<FilterResponse> for Filter {
    fn from(filter: FilterResponse) -> Self {
        Self {
            id: filter.id,
            name: filter.name,
            jql: filter.jql,
        }
    }
}

/// `GET /rest/api/2/search`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub issues: Vec<IssueResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IssueResponse {
    pub key: String,
    #[serde(default)]
    pub fields: IssueFields,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct IssueFields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Priority {
    pub name: String,
}

impl From<IssueResponse> for Issue {
    fn from(issue: IssueResponse) -> Self {
        Self {
            key: issue.key,
            priority: issue
                .fields
                .priority
                .map_or_else(|| NO_PRIORITY.to_string(), |p| p.name),
            summary: issue.fields.summary.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_without_priority() {
        let raw = r#"{"key": "OPS-1", "fields": {"summary": "Disk full", "priority": null}}"#;
        let issue: Issue = serde_json::from_str::<IssueResponse>(raw).unwrap().into();
        assert_eq!(issue, Issue::new("OPS-1", NO_PRIORITY, "Disk full"));
    }

    #[test]
    fn test_search_response_ignores_unknown_fields() {
        let raw = r#"{
            "expand": "schema,names",
            "startAt": 0,
            "maxResults": 50,
            "total": 1,
            "issues": [
                {"id": "10001", "key": "OPS-2", "self": "https://jira/rest/api/2/issue/10001",
                 "fields": {"summary": "CPU hot", "priority": {"id": "2", "name": "High"}}}
            ]
        }"#;
        let response: SearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.total, 1);

        let issues: Vec<Issue> = response.issues.into_iter().map(Issue::from).collect();
        assert_eq!(issues, vec![Issue::new("OPS-2", "High", "CPU hot")]);
    }
}
