use tracing::{error, warn};

use crate::control::{ControlError, ErrorDetail};

/// Render a control error as the JSON string returned to the MCP client.
pub fn format_error(error: ControlError) -> String {
    format_detail(error.detail())
}

pub fn format_detail(detail: ErrorDetail) -> String {
    if detail.retryable {
        warn!(code = %detail.code, message = %detail.message, "Retryable error occurred");
    } else {
        error!(code = %detail.code, message = %detail.message, "Non-retryable error occurred");
    }
    serde_json::to_string(&detail).unwrap_or(detail.message)
}

pub fn connect_error(error: anyhow::Error) -> String {
    format_error(ControlError::storage(error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::StoreError;

    #[test]
    fn test_format_error_is_json_detail() {
        let rendered = format_error(ControlError::from(StoreError::NotFound("abcd".into())));
        let detail: ErrorDetail = serde_json::from_str(&rendered).unwrap();

        assert_eq!(detail.code, "NOT_FOUND");
        assert!(detail.suggestion.is_some());
    }
}
