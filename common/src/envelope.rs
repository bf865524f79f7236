use crate::error::CoreError;
use crate::ids::RequestId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Success envelope: `{"data": ...}` (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

impl<T> DataEnvelope<T> {
    pub fn new(data: T) -> Self {
        DataEnvelope { data }
    }
}

/// Failure envelope: `{"error": {"code","message","request_id","details"?}}`
/// (§6). `details` carries structured, non-sensitive context; exact
/// signature-failure reasons are logged but never placed here (§9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub request_id: RequestId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

impl ErrorEnvelope {
    pub fn from_core_error(err: &CoreError, request_id: RequestId) -> Self {
        ErrorEnvelope {
            error: ErrorBody {
                code: err.code().to_string(),
                message: public_message(err),
                request_id,
                details: None,
            },
        }
    }
}

/// Renders the message shown to the client. Signature-verification
/// failures are coerced to a single generic message so a client cannot use
/// the error text as an oracle to probe which check failed (§9); the exact
/// reason is still available to `log::warn!` callers via `{err:?}`.
fn public_message(err: &CoreError) -> String {
    match err {
        CoreError::Signature(_) => "wallet verification failed".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignatureError;

    #[test]
    fn signature_errors_render_a_generic_message() {
        let err = CoreError::Signature(SignatureError::AddressMismatch);
        let envelope = ErrorEnvelope::from_core_error(&err, RequestId::new());
        assert_eq!(envelope.error.message, "wallet verification failed");
        assert_eq!(envelope.error.code, "AddressMismatch");
    }
}
