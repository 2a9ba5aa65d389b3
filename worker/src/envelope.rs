use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiEnvelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl<T: Serialize> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            details: None,
        }
    }
}

pub fn failure(error: &str, details: Option<String>) -> ApiEnvelope<Value> {
    ApiEnvelope {
        success: false,
        data: None,
        error: Some(error.to_string()),
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::{failure, ApiEnvelope};

    #[test]
    fn success_envelope_omits_error_fields() {
        let envelope = ApiEnvelope::ok(serde_json::json!({ "status": "ok" }));
        let rendered = serde_json::to_string(&envelope).expect("serialize");
        assert_eq!(rendered, r#"{"success":true,"data":{"status":"ok"}}"#);
    }

    #[test]
    fn failure_envelope_omits_data_and_keeps_details() {
        let envelope = failure("Failed to merge PR", Some("status 405: not mergeable".to_string()));
        let rendered = serde_json::to_string(&envelope).expect("serialize");
        assert_eq!(
            rendered,
            r#"{"success":false,"error":"Failed to merge PR","details":"status 405: not mergeable"}"#
        );
    }

    #[test]
    fn failure_without_details_has_two_fields() {
        let envelope = failure("Not found", None);
        let rendered = serde_json::to_string(&envelope).expect("serialize");
        assert_eq!(rendered, r#"{"success":false,"error":"Not found"}"#);
    }
}
