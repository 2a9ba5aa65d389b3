use crate::config::StewardConfig;
use crate::errors::StewardError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

pub const API_VERSION: &str = "2022-11-28";
pub const USER_AGENT: &str = "steward";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: String,
    pub html_url: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub body: Option<String>,
    pub state: String,
    pub html_url: String,
    #[serde(default)]
    pub merged_at: Option<String>,
    pub head: PullHead,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullHead {
    #[serde(rename = "ref")]
    pub branch: String,
}

impl PullRequest {
    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
    owner: String,
    repo: String,
}

impl GithubClient {
    pub fn new(config: &StewardConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.github_token.clone(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    fn repo_path(&self, tail: &str) -> String {
        format!("/repos/{}/{}{}", self.owner, self.repo, tail)
    }

    async fn rest<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<T, StewardError> {
        let url = format!("{}{}", self.api_base, endpoint);
        let mut request = self
            .http
            .request(method, &url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", USER_AGENT);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StewardError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(endpoint, status = status.as_u16(), "github api call failed");
            return Err(StewardError::Provider {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| StewardError::Transport(format!("invalid github response json: {e}")))
    }

    pub async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, StewardError> {
        let url = format!("{}/graphql", self.api_base);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header("User-Agent", USER_AGENT)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| StewardError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "github graphql call failed");
            return Err(StewardError::Provider {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: GraphqlResponse<T> = response
            .json()
            .await
            .map_err(|e| StewardError::Transport(format!("invalid graphql response json: {e}")))?;
        if let Some(error) = parsed.errors.first() {
            return Err(StewardError::Query(error.message.clone()));
        }
        parsed
            .data
            .ok_or_else(|| StewardError::Query("graphql response missing data".to_string()))
    }

    pub async fn issue(&self, number: u64) -> Result<Issue, StewardError> {
        self.rest(
            reqwest::Method::GET,
            &self.repo_path(&format!("/issues/{number}")),
            None,
        )
        .await
    }

    pub async fn labeled_issues(&self, label: &str, per_page: u32) -> Result<Vec<Issue>, StewardError> {
        self.rest(
            reqwest::Method::GET,
            &self.repo_path(&format!(
                "/issues?labels={label}&state=all&per_page={per_page}&sort=created&direction=desc"
            )),
            None,
        )
        .await
    }

    pub async fn recent_pulls(&self, per_page: u32) -> Result<Vec<PullRequest>, StewardError> {
        self.rest(
            reqwest::Method::GET,
            &self.repo_path(&format!("/pulls?state=all&per_page={per_page}")),
            None,
        )
        .await
    }

    pub async fn create_issue(
        &self,
        title: &str,
        body: &str,
        labels: &[&str],
    ) -> Result<Issue, StewardError> {
        self.rest(
            reqwest::Method::POST,
            &self.repo_path("/issues"),
            Some(&json!({ "title": title, "body": body, "labels": labels })),
        )
        .await
    }

    // Closing can rewrite the body in the same call, which revise uses to
    // plant the replacement marker without a second round trip.
    pub async fn close_issue(
        &self,
        number: u64,
        replacement_body: Option<&str>,
    ) -> Result<(), StewardError> {
        let mut payload = json!({ "state": "closed" });
        if let Some(body) = replacement_body {
            payload["body"] = json!(body);
        }
        let _: Value = self
            .rest(
                reqwest::Method::PATCH,
                &self.repo_path(&format!("/issues/{number}")),
                Some(&payload),
            )
            .await?;
        Ok(())
    }

    pub async fn close_pull(&self, number: u64) -> Result<(), StewardError> {
        let _: Value = self
            .rest(
                reqwest::Method::PATCH,
                &self.repo_path(&format!("/pulls/{number}")),
                Some(&json!({ "state": "closed" })),
            )
            .await?;
        Ok(())
    }

    pub async fn merge_pull_squash(&self, number: u64) -> Result<(), StewardError> {
        let _: Value = self
            .rest(
                reqwest::Method::PUT,
                &self.repo_path(&format!("/pulls/{number}/merge")),
                Some(&json!({ "merge_method": "squash" })),
            )
            .await?;
        Ok(())
    }
}
