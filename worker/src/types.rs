use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Building,
    PreviewReady,
    Applied,
    Replaced,
    Discarded,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Building => "building",
            Self::PreviewReady => "preview_ready",
            Self::Applied => "applied",
            Self::Replaced => "replaced",
            Self::Discarded => "discarded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrowStatus {
    Pending,
    Merged,
    PreviewReady,
    PrCreated,
}

impl NarrowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Merged => "merged",
            Self::PreviewReady => "preview_ready",
            Self::PrCreated => "pr_created",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequest {
    pub issue_number: u64,
    pub issue_url: String,
    pub issue_state: String,
    pub description: String,
    pub created_at: String,
    pub pr_number: Option<u64>,
    pub pr_url: Option<String>,
    pub preview_url: Option<String>,
    pub status: RequestStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrowStatusReport {
    pub issue_number: u64,
    pub issue_state: String,
    pub pr_number: Option<u64>,
    pub pr_url: Option<String>,
    pub pr_state: String,
    pub preview_url: Option<String>,
    pub status: NarrowStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRequest {
    pub issue_number: u64,
    pub issue_url: String,
    pub status: RequestStatus,
    pub copilot_assigned: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisedRequest {
    pub issue_number: u64,
    pub issue_url: String,
    pub copilot_assigned: bool,
    pub replaced_issue: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevertRequest {
    pub issue_number: u64,
    pub issue_url: String,
    pub copilot_assigned: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReceipt {
    pub pr_number: u64,
    pub merged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseReceipt {
    pub pr_number: u64,
    pub closed: bool,
}
