use crate::assign;
use crate::config::StewardConfig;
use crate::errors::StewardError;
use crate::github::GithubClient;
use crate::types::{
    CloseReceipt, CreatedRequest, MergeReceipt, RequestStatus, RevertRequest, RevisedRequest,
};
use thiserror::Error;

// The reconciliation engine keys the `replaced` state off this exact text,
// so it must survive any template edits.
pub const REPLACEMENT_MARKER: &str = "This replaces issue #";
pub const TITLE_PREFIX: &str = "[AI] ";

pub const STEP_CLOSE_PULL: &str = "close_pull";
pub const STEP_CLOSE_ISSUE: &str = "close_issue";
pub const STEP_CREATE_ISSUE: &str = "create_issue";

// Revise is deliberately non-transactional: a failed step leaves the
// earlier closures in place. The error reports how far it got so the
// caller can see the intermediate state instead of guessing.
#[derive(Debug, Error)]
#[error("revise halted at {failed_step}")]
pub struct ReviseError {
    pub failed_step: &'static str,
    pub completed: Vec<&'static str>,
    #[source]
    pub source: StewardError,
}

impl ReviseError {
    fn validation(message: &str) -> Self {
        Self {
            failed_step: "validate",
            completed: Vec::new(),
            source: StewardError::Validation(message.to_string()),
        }
    }
}

fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

pub async fn create_request(
    github: &GithubClient,
    config: &StewardConfig,
    description: &str,
) -> Result<CreatedRequest, StewardError> {
    if description.trim().is_empty() {
        return Err(StewardError::Validation("Description is required".to_string()));
    }

    let title = format!("{TITLE_PREFIX}{}", truncate_with_ellipsis(description, 60));
    let body = format!(
        "## Site Modification Request\n\n{description}\n\n---\n*This issue was created from the admin panel. Copilot will work on this and create a PR.*\n"
    );
    let issue = github.create_issue(&title, &body, &[&config.label]).await?;
    let copilot_assigned =
        assign::assign_best_effort(github, &config.agent_login, issue.number).await;
    tracing::info!(
        issue_number = issue.number,
        copilot_assigned,
        "change request created"
    );

    Ok(CreatedRequest {
        issue_number: issue.number,
        issue_url: issue.html_url,
        status: RequestStatus::Pending,
        copilot_assigned,
    })
}

pub async fn approve(
    github: &GithubClient,
    pr_number: Option<u64>,
) -> Result<MergeReceipt, StewardError> {
    let pr_number =
        pr_number.ok_or_else(|| StewardError::Validation("PR number is required".to_string()))?;
    github.merge_pull_squash(pr_number).await?;
    tracing::info!(pr_number, "change set merged");
    Ok(MergeReceipt {
        pr_number,
        merged: true,
    })
}

pub async fn reject(
    github: &GithubClient,
    pr_number: Option<u64>,
) -> Result<CloseReceipt, StewardError> {
    let pr_number =
        pr_number.ok_or_else(|| StewardError::Validation("PR number is required".to_string()))?;
    github.close_pull(pr_number).await?;
    tracing::info!(pr_number, "change set rejected");
    Ok(CloseReceipt {
        pr_number,
        closed: true,
    })
}

pub async fn revise(
    github: &GithubClient,
    config: &StewardConfig,
    issue_number: Option<u64>,
    pr_number: Option<u64>,
    original_description: &str,
    feedback: &str,
) -> Result<RevisedRequest, ReviseError> {
    let (Some(issue_number), Some(pr_number)) = (issue_number, pr_number) else {
        return Err(ReviseError::validation(
            "Issue number and PR number are required",
        ));
    };
    if feedback.trim().is_empty() {
        return Err(ReviseError::validation("Feedback is required"));
    }

    let mut completed: Vec<&'static str> = Vec::new();

    github.close_pull(pr_number).await.map_err(|source| ReviseError {
        failed_step: STEP_CLOSE_PULL,
        completed: completed.clone(),
        source,
    })?;
    completed.push(STEP_CLOSE_PULL);

    // The marker is planted while closing so a later step failing still
    // leaves the original request classifiable as replaced.
    let replaced_body = format!(
        "## Site Modification Request\n\n{original_description}\n\n---\n*{REPLACEMENT_MARKER}{issue_number}. Closed in favor of a revision.*\n"
    );
    github
        .close_issue(issue_number, Some(&replaced_body))
        .await
        .map_err(|source| ReviseError {
            failed_step: STEP_CLOSE_ISSUE,
            completed: completed.clone(),
            source,
        })?;
    completed.push(STEP_CLOSE_ISSUE);

    let title = format!(
        "{TITLE_PREFIX}Revision: {}",
        truncate_with_ellipsis(original_description, 50)
    );
    let body = format!(
        "## Site Modification Request\n\n{original_description}\n\n### Additional Changes Requested:\n{feedback}\n\n---\n*{REPLACEMENT_MARKER}{issue_number}. Copilot will work on this and create a PR.*\n"
    );
    let issue = github
        .create_issue(&title, &body, &[&config.label])
        .await
        .map_err(|source| ReviseError {
            failed_step: STEP_CREATE_ISSUE,
            completed: completed.clone(),
            source,
        })?;

    let copilot_assigned =
        assign::assign_best_effort(github, &config.agent_login, issue.number).await;
    tracing::info!(
        issue_number = issue.number,
        replaced_issue = issue_number,
        "revision filed"
    );

    Ok(RevisedRequest {
        issue_number: issue.number,
        issue_url: issue.html_url,
        copilot_assigned,
        replaced_issue: issue_number,
    })
}

pub async fn revert(
    github: &GithubClient,
    config: &StewardConfig,
    pr_number: Option<u64>,
    description: &str,
) -> Result<RevertRequest, StewardError> {
    let pr_number =
        pr_number.ok_or_else(|| StewardError::Validation("PR number is required".to_string()))?;

    let context = if description.trim().is_empty() {
        "No description available"
    } else {
        description
    };
    let title_tail = if description.trim().is_empty() {
        format!("PR #{pr_number}")
    } else {
        description.chars().take(50).collect()
    };
    let title = format!("{TITLE_PREFIX}Revert: {title_tail}");
    let body = format!(
        "## Site Modification Request\n\nUndo the changes from PR #{pr_number}.\n\nOriginal change: {context}\n\nPlease revert the code changes made in that PR to restore the previous behavior.\n\n---\n*This is a revert request created from the admin panel. Copilot will work on this and create a PR.*\n"
    );
    let issue = github.create_issue(&title, &body, &[&config.label]).await?;
    let copilot_assigned =
        assign::assign_best_effort(github, &config.agent_login, issue.number).await;
    tracing::info!(issue_number = issue.number, pr_number, "revert request filed");

    Ok(RevertRequest {
        issue_number: issue.number,
        issue_url: issue.html_url,
        copilot_assigned,
    })
}

#[cfg(test)]
mod tests {
    use super::{truncate_with_ellipsis, REPLACEMENT_MARKER, TITLE_PREFIX};

    #[test]
    fn short_descriptions_are_untouched() {
        assert_eq!(truncate_with_ellipsis("Add a footer", 60), "Add a footer");
    }

    #[test]
    fn long_descriptions_gain_an_ellipsis() {
        let description = "x".repeat(70);
        let title = truncate_with_ellipsis(&description, 60);
        assert_eq!(title.chars().count(), 63);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn boundary_length_has_no_ellipsis() {
        let description = "y".repeat(60);
        assert_eq!(truncate_with_ellipsis(&description, 60), description);
    }

    #[test]
    fn replacement_marker_matches_revision_body_template() {
        let issue_number = 42u64;
        let body = format!("*{REPLACEMENT_MARKER}{issue_number}. Copilot will work on this and create a PR.*");
        assert!(body.contains("This replaces issue #42"));
    }

    #[test]
    fn title_prefix_is_stable() {
        assert_eq!(TITLE_PREFIX, "[AI] ");
    }
}
