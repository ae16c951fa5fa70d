//! Alert message formatting.

use crate::jira::Issue;

/// Build the browsable link for an issue key.
pub fn browse_url(jira_url: &str, key: &str) -> String {
    format!("{}/browse/{key}", jira_url.trim_end_matches('/'))
}

/// Format the chat message for a newly seen issue (Mattermost markdown).
pub fn format_alert(priority: &str, key: &str, summary: &str, browse_url: &str) -> String {
    format!(":rotating_light:  **{priority}** {key} {summary} [[Link]({browse_url})]")
}

/// Format the alert for `issue` against the Jira instance at `jira_url`.
pub fn alert_for(issue: &Issue, jira_url: &str) -> String {
    format_alert(
        &issue.priority,
        &issue.key,
        &issue.summary,
        &browse_url(jira_url, &issue.key),
    )
}
