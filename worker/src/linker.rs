use crate::github::PullRequest;
use regex::Regex;

// Linkage between a change request and a pull request is a textual
// convention, not a foreign key. The trait keeps the heuristic swappable
// without touching the reconciliation rules.
pub trait ChangeSetLinker: Send + Sync {
    fn linked_pull<'a>(
        &self,
        issue_number: u64,
        pulls: &'a [PullRequest],
    ) -> Option<&'a PullRequest>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BranchAndBodyLinker;

impl BranchAndBodyLinker {
    fn branch_matches(issue_number: u64, pull: &PullRequest) -> bool {
        let needle = issue_number.to_string();
        pull.head.branch.contains(&needle) || pull.head.branch.contains(&format!("issue-{needle}"))
    }

    fn body_matches(issue_number: u64, pull: &PullRequest) -> bool {
        let Some(body) = pull.body.as_deref() else {
            return false;
        };
        let pattern = format!(r"(?i)(fixes|closes|resolves)\s+.*#{issue_number}\b");
        match Regex::new(&pattern) {
            Ok(re) => re.is_match(body),
            Err(_) => false,
        }
    }
}

impl ChangeSetLinker for BranchAndBodyLinker {
    // First match in fetched order wins; the underlying data can admit
    // ambiguity and this does not try to resolve it.
    fn linked_pull<'a>(
        &self,
        issue_number: u64,
        pulls: &'a [PullRequest],
    ) -> Option<&'a PullRequest> {
        pulls.iter().find(|pull| {
            Self::branch_matches(issue_number, pull) || Self::body_matches(issue_number, pull)
        })
    }
}
