use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::HookConfig;
use crate::model::work_item::{WorkItem, WorkItemAttributes};

pub const PROVIDER: &str = "redmine";

/// Issues are requested in fixed pages of this size; the server may return
/// fewer on the final page.
const PAGE_SIZE: usize = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const API_KEY_HEADER: &str = "X-Redmine-API-Key";

/// A failure anywhere in the fetch. Every variant aborts the whole run:
/// nothing is retried and no partial results survive.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid base URL {url:?}: {detail}")]
    BadBaseUrl { url: String, detail: String },
    #[error("failed to build HTTP client")]
    Client {
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },
    #[error("unexpected response from {url}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// One page of the issue-listing endpoint. Both fields are optional on the
/// wire: a missing `issues` array is an empty page, and a missing
/// `total_count` is treated as "this batch was everything".
#[derive(Debug, Deserialize)]
struct IssuesPage {
    #[serde(default)]
    issues: Vec<Issue>,
    total_count: Option<usize>,
}

/// An issue as the tracker returns it. Only the fields the hook reads are
/// modeled; everything else in the payload is ignored.
#[derive(Debug, Deserialize)]
pub struct Issue {
    pub id: u64,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub updated_on: Option<DateTime<Utc>>,
    pub closed_on: Option<DateTime<Utc>>,
    pub project: Option<NamedRef>,
    pub status: Option<NamedRef>,
    pub assigned_to: Option<NamedRef>,
    pub priority: Option<NamedRef>,
    pub tracker: Option<NamedRef>,
}

/// A nested name-bearing record such as `{"id": 3, "name": "Support"}`.
#[derive(Debug, Deserialize)]
pub struct NamedRef {
    #[serde(default)]
    pub name: String,
}

impl NamedRef {
    /// The name with surrounding whitespace removed; an empty result counts
    /// as absent.
    pub fn trimmed_name(&self) -> Option<&str> {
        let name = self.name.trim();
        (!name.is_empty()).then_some(name)
    }
}

/// Client for the issue-listing endpoint of one Redmine server.
pub struct RedmineClient {
    base_url: String,
    api_key: String,
    project_id: Option<String>,
    query_id: Option<String>,
    client: reqwest::Client,
}

impl RedmineClient {
    pub fn new(config: &HookConfig) -> Result<Self, FetchError> {
        let base_url = rewrite_container_host(&config.base_url)?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| FetchError::Client { source })?;

        Ok(Self {
            base_url,
            api_key: config.api_key.clone(),
            project_id: config.project_id.clone(),
            query_id: config.query_id.clone(),
            client,
        })
    }

    /// The base URL requests actually go to, with the container alias
    /// rewritten and trailing slashes stripped. Deep links use this too.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch every issue visible to the credential under the configured
    /// filters, across all pages. `status_id=*` is sent explicitly so closed
    /// issues are included; filtering them out is the normalizer's job.
    pub async fn fetch_all_issues(&self) -> Result<Vec<Issue>, FetchError> {
        let mut issues = Vec::new();
        let mut offset = 0usize;

        loop {
            let page = self.issues_page(offset).await?;
            let batch_len = page.issues.len();
            if batch_len == 0 {
                break;
            }

            // Advance by what actually arrived, not the requested page
            // size; a short page must still make forward progress.
            offset += batch_len;
            issues.extend(page.issues);

            let total = page.total_count.unwrap_or(batch_len);
            debug!(offset, total, "fetched issue page");
            if offset >= total {
                break;
            }
        }

        Ok(issues)
    }

    async fn issues_page(&self, offset: usize) -> Result<IssuesPage, FetchError> {
        let url = format!("{}/issues.json", self.base_url);

        let mut request = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[
                ("limit", PAGE_SIZE.to_string()),
                ("offset", offset.to_string()),
                ("status_id", "*".to_string()),
            ]);
        // Absent filters are omitted from the query string entirely.
        if let Some(project_id) = &self.project_id {
            request = request.query(&[("project_id", project_id)]);
        }
        if let Some(query_id) = &self.query_id {
            request = request.query(&[("query_id", query_id)]);
        }

        let response = request.send().await.map_err(|source| FetchError::Transport {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url, status });
        }

        response
            .json()
            .await
            .map_err(|source| FetchError::Decode { url, source })
    }
}

/// Container deployments commonly hand this hook `http://redmine:<port>`,
/// a compose-network alias that does not resolve from the host. Substitute
/// `localhost`, preserving any explicit port; every other host is left
/// alone. The result has trailing slashes stripped so paths can be joined
/// with a single `/`.
fn rewrite_container_host(base_url: &str) -> Result<String, FetchError> {
    let mut url = Url::parse(base_url).map_err(|err| FetchError::BadBaseUrl {
        url: base_url.to_string(),
        detail: err.to_string(),
    })?;

    if url.host_str() == Some("redmine") {
        url.set_host(Some("localhost"))
            .map_err(|err| FetchError::BadBaseUrl {
                url: base_url.to_string(),
                detail: err.to_string(),
            })?;
    }

    Ok(url.to_string().trim_end_matches('/').to_string())
}

/// Whether an issue counts as closed: an explicit closed timestamp always
/// wins; otherwise the status name, lowercased as-is (no trimming), must be
/// in the vocabulary. An issue with no status at all is open.
pub fn is_closed(issue: &Issue, closed_status_names: &HashSet<String>) -> bool {
    if issue.closed_on.is_some() {
        return true;
    }
    match &issue.status {
        Some(status) => closed_status_names.contains(&status.name.to_lowercase()),
        None => false,
    }
}

/// Map one issue to its normalized work item. Pure and total: the same
/// issue always yields the same item.
pub fn to_work_item(base_url: &str, issue: &Issue) -> WorkItem {
    let title = match &issue.subject {
        Some(subject) if !subject.is_empty() => subject.clone(),
        _ => format!("Redmine Issue {}", issue.id),
    };

    WorkItem {
        id: format!("{PROVIDER}:{}", issue.id),
        title,
        description: issue.description.clone().unwrap_or_default(),
        url: format!("{}/issues/{}", base_url.trim_end_matches('/'), issue.id),
        kind: "task".to_string(),
        attributes: WorkItemAttributes {
            provider: PROVIDER.to_string(),
            project: name_of(&issue.project),
            status: name_of(&issue.status),
            assignee: name_of(&issue.assigned_to),
            priority: name_of(&issue.priority),
            tracker: name_of(&issue.tracker),
            due_date: issue.due_date,
            updated_at: issue.updated_on,
        },
    }
}

fn name_of(field: &Option<NamedRef>) -> Option<String> {
    field
        .as_ref()
        .and_then(|named| named.trimmed_name().map(str::to_string))
}

/// Drop closed issues and map the rest, preserving fetch order.
pub fn open_work_items(
    base_url: &str,
    issues: &[Issue],
    closed_status_names: &HashSet<String>,
) -> Vec<WorkItem> {
    issues
        .iter()
        .filter(|issue| !is_closed(issue, closed_status_names))
        .map(|issue| to_work_item(base_url, issue))
        .collect()
}
