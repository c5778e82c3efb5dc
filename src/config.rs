use std::collections::HashSet;

pub const DEFAULT_BASE_URL: &str = "http://redmine:3000";
const DEFAULT_PROJECT_ID: &str = "1";
const DEFAULT_CLOSED_STATUS_NAMES: &str = "closed,resolved,done";

/// Connection and filtering options for one hook run, resolved once from the
/// process environment and passed by reference from there on. Resolution
/// never fails: every option has a default or is optional, and malformed
/// values degrade instead of erroring.
#[derive(Debug, Clone)]
pub struct HookConfig {
    pub base_url: String,
    pub api_key: String,
    pub project_id: Option<String>,
    pub query_id: Option<String>,
    /// Lowercased status names treated as closed; never contains the empty
    /// string.
    pub closed_status_names: HashSet<String>,
}

impl HookConfig {
    pub fn from_env() -> Self {
        Self::resolve(|name| std::env::var(name).ok())
    }

    /// Resolve from any environment-shaped lookup.
    ///
    /// Empty values behave the way hook deployments rely on: an empty base
    /// URL variable falls through to the next source, a set-but-empty
    /// `REDMINE_PROJECT_ID` disables the project filter (only an unset one
    /// defaults to `"1"`), and an empty vocabulary disables name-based
    /// closure detection entirely.
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = [lookup("REDMINE_BASE_URL"), lookup("REDMINE_URL")]
            .into_iter()
            .flatten()
            .find(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        // No fallback credential: an unset key stays empty and the server's
        // auth failure surfaces through the envelope.
        let api_key = lookup("REDMINE_API_KEY").unwrap_or_default();

        let project_id = match lookup("REDMINE_PROJECT_ID") {
            None => Some(DEFAULT_PROJECT_ID.to_string()),
            Some(value) if value.is_empty() => None,
            Some(value) => Some(value),
        };

        let query_id = lookup("REDMINE_QUERY_ID").filter(|value| !value.is_empty());

        let closed_status_names = closed_status_set(
            &lookup("REDMINE_CLOSED_STATUS_NAMES")
                .unwrap_or_else(|| DEFAULT_CLOSED_STATUS_NAMES.to_string()),
        );

        Self {
            base_url,
            api_key,
            project_id,
            query_id,
            closed_status_names,
        }
    }
}

/// Split a comma-separated vocabulary into a lowercase membership set.
/// Tokens are trimmed and empty tokens discarded, so an empty or
/// comma-only value yields an empty set.
fn closed_status_set(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}
