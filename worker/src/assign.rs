use crate::errors::StewardError;
use crate::github::GithubClient;
use serde::Deserialize;
use serde_json::{json, Value};

const SUGGESTED_ACTORS_QUERY: &str = "\
query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    suggestedActors(capabilities: [CAN_BE_ASSIGNED], first: 20) {
      nodes {
        login
        __typename
        ... on Bot { id }
        ... on User { id }
      }
    }
  }
}";

const ISSUE_ID_QUERY: &str = "\
query($owner: String!, $name: String!, $number: Int!) {
  repository(owner: $owner, name: $name) {
    issue(number: $number) { id }
  }
}";

const ASSIGN_MUTATION: &str = "\
mutation($issueId: ID!, $assigneeIds: [ID!]!) {
  addAssigneesToAssignable(input: {
    assignableId: $issueId,
    assigneeIds: $assigneeIds
  }) {
    assignable { ... on Issue { id } }
  }
}";

#[derive(Debug, Deserialize)]
struct SuggestedActorsData {
    repository: ActorsRepository,
}

#[derive(Debug, Deserialize)]
struct ActorsRepository {
    #[serde(rename = "suggestedActors")]
    suggested_actors: ActorNodes,
}

#[derive(Debug, Deserialize)]
struct ActorNodes {
    nodes: Vec<ActorNode>,
}

#[derive(Debug, Deserialize)]
struct ActorNode {
    login: String,
    #[serde(rename = "__typename")]
    typename: String,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IssueIdData {
    repository: IssueRepository,
}

#[derive(Debug, Deserialize)]
struct IssueRepository {
    issue: IssueNode,
}

#[derive(Debug, Deserialize)]
struct IssueNode {
    id: String,
}

// Ok(None) means the agent is not among the assignable actors, which is
// "agent unavailable" rather than a failure.
pub async fn resolve_agent(
    github: &GithubClient,
    agent_login: &str,
) -> Result<Option<String>, StewardError> {
    let data: SuggestedActorsData = github
        .graphql(
            SUGGESTED_ACTORS_QUERY,
            json!({ "owner": github.owner(), "name": github.repo() }),
        )
        .await?;
    Ok(data
        .repository
        .suggested_actors
        .nodes
        .into_iter()
        .find(|node| node.login == agent_login && node.typename == "Bot")
        .and_then(|node| node.id))
}

pub async fn assign_agent(
    github: &GithubClient,
    agent_login: &str,
    issue_number: u64,
) -> Result<bool, StewardError> {
    let Some(agent_id) = resolve_agent(github, agent_login).await? else {
        return Ok(false);
    };

    let issue: IssueIdData = github
        .graphql(
            ISSUE_ID_QUERY,
            json!({ "owner": github.owner(), "name": github.repo(), "number": issue_number }),
        )
        .await?;

    let _: Value = github
        .graphql(
            ASSIGN_MUTATION,
            json!({ "issueId": issue.repository.issue.id, "assigneeIds": [agent_id] }),
        )
        .await?;
    Ok(true)
}

// Assignment is best-effort: the request was already filed, so any failure
// here is logged and reported as "not assigned".
pub async fn assign_best_effort(
    github: &GithubClient,
    agent_login: &str,
    issue_number: u64,
) -> bool {
    match assign_agent(github, agent_login, issue_number).await {
        Ok(assigned) => assigned,
        Err(error) => {
            tracing::warn!(issue_number, %error, "agent assignment failed");
            false
        }
    }
}
