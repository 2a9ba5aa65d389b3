use crate::config::StewardConfig;
use crate::errors::StewardError;
use crate::github::{GithubClient, Issue, PullRequest};
use crate::linker::ChangeSetLinker;
use crate::preview::{preview_url, PreviewProber};
use crate::requests::REPLACEMENT_MARKER;
use crate::types::{ChangeRequest, NarrowStatus, NarrowStatusReport, RequestStatus};
use futures::future;

pub const ISSUE_FETCH_LIMIT: u32 = 20;
pub const PULL_FETCH_LIMIT: u32 = 30;
// The legacy single-item view fetches fewer pulls than list does.
pub const NARROW_PULL_FETCH_LIMIT: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Replaced,
    Discarded,
    Applied,
    NeedsProbe,
    Pending,
}

// Priority chain: an explicit replacement outranks a discarded change set,
// which outranks a merged one, which outranks anything still in flight.
// Reordering these arms changes observable statuses.
pub fn classify(issue: &Issue, linked: Option<&PullRequest>) -> Classification {
    let replaced = issue
        .body
        .as_deref()
        .is_some_and(|body| body.contains(REPLACEMENT_MARKER));
    if replaced && issue.state == "closed" {
        return Classification::Replaced;
    }

    let Some(pull) = linked else {
        return Classification::Pending;
    };
    if pull.state == "closed" && !pull.is_merged() {
        return Classification::Discarded;
    }
    if pull.is_merged() {
        return Classification::Applied;
    }
    if pull.state == "open" {
        return Classification::NeedsProbe;
    }
    Classification::Pending
}

pub fn strip_title_prefixes(title: &str) -> String {
    let stripped = title
        .strip_prefix("[AI]")
        .map(str::trim_start)
        .unwrap_or(title);
    for prefix in ["Revision:", "Revert:"] {
        if let Some(rest) = stripped.strip_prefix(prefix) {
            return rest.trim_start().to_string();
        }
    }
    stripped.to_string()
}

pub async fn list_requests(
    github: &GithubClient,
    linker: &dyn ChangeSetLinker,
    prober: &dyn PreviewProber,
    config: &StewardConfig,
) -> Result<Vec<ChangeRequest>, StewardError> {
    let issues = github.labeled_issues(&config.label, ISSUE_FETCH_LIMIT).await?;
    let pulls = github.recent_pulls(PULL_FETCH_LIMIT).await?;

    // Probes run concurrently; join_all keeps rows in issue fetch order.
    let rows = future::join_all(
        issues
            .iter()
            .map(|issue| reconcile(issue, &pulls, linker, prober)),
    )
    .await;
    Ok(rows)
}

async fn reconcile(
    issue: &Issue,
    pulls: &[PullRequest],
    linker: &dyn ChangeSetLinker,
    prober: &dyn PreviewProber,
) -> ChangeRequest {
    let linked = linker.linked_pull(issue.number, pulls);
    let (status, preview_url) = match classify(issue, linked) {
        Classification::Replaced => (RequestStatus::Replaced, None),
        Classification::Discarded => (RequestStatus::Discarded, None),
        Classification::Applied => (RequestStatus::Applied, None),
        Classification::Pending => (RequestStatus::Pending, None),
        Classification::NeedsProbe => match linked {
            Some(pull) => {
                let probe = prober.probe(&pull.head.branch).await;
                let status = if probe.ready {
                    RequestStatus::PreviewReady
                } else {
                    RequestStatus::Building
                };
                (status, Some(probe.url))
            }
            None => (RequestStatus::Pending, None),
        },
    };

    ChangeRequest {
        issue_number: issue.number,
        issue_url: issue.html_url.clone(),
        issue_state: issue.state.clone(),
        description: strip_title_prefixes(&issue.title),
        created_at: issue.created_at.clone().unwrap_or_default(),
        pr_number: linked.map(|pull| pull.number),
        pr_url: linked.map(|pull| pull.html_url.clone()),
        preview_url,
        status,
    }
}

// Legacy 4-state view. It derives (never probes) the preview URL, so an
// open unmerged change set always reports preview_ready. Kept separate
// from list_requests on purpose; callers depend on both shapes.
pub async fn narrow_status(
    github: &GithubClient,
    linker: &dyn ChangeSetLinker,
    config: &StewardConfig,
    issue_number: u64,
) -> Result<NarrowStatusReport, StewardError> {
    let issue = github.issue(issue_number).await?;
    let pulls = github.recent_pulls(NARROW_PULL_FETCH_LIMIT).await?;
    let linked = linker.linked_pull(issue_number, &pulls);

    let mut pr_state = "not_found".to_string();
    let mut preview = None;
    if let Some(pull) = linked {
        pr_state = if pull.is_merged() {
            "merged".to_string()
        } else {
            pull.state.clone()
        };
        if !pull.is_merged() && pull.state == "open" {
            preview = Some(preview_url(&pull.head.branch, &config.preview_domain));
        }
    }

    let status = match linked {
        None => NarrowStatus::Pending,
        Some(pull) if pull.is_merged() => NarrowStatus::Merged,
        Some(_) if preview.is_some() => NarrowStatus::PreviewReady,
        Some(_) => NarrowStatus::PrCreated,
    };

    Ok(NarrowStatusReport {
        issue_number,
        issue_state: issue.state,
        pr_number: linked.map(|pull| pull.number),
        pr_url: linked.map(|pull| pull.html_url.clone()),
        pr_state,
        preview_url: preview,
        status,
    })
}
