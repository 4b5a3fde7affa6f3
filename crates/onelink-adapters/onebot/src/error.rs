//! Webhook rejection taxonomy.

use onelink_transport::StatusCode;
use thiserror::Error;

use crate::signature::SignatureError;

/// Why an inbound webhook request was not dispatched.
///
/// Rejections are local to one request; they never affect the listener.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookRejection {
    /// `x-self-id` is absent or matches no bot on this path.
    #[error("unknown self id: {}", .0.as_deref().unwrap_or("<missing>"))]
    UnknownIdentity(Option<String>),

    /// The bot has a secret but the request carried no signature.
    #[error("signature required for bot {0}")]
    AuthenticationMissing(String),

    /// The signature does not match the body.
    #[error("invalid signature for bot {0}")]
    AuthenticationInvalid(String),

    /// The authenticated body is not valid JSON.
    #[error("malformed event body: {0}")]
    MalformedBody(String),
}

impl WebhookRejection {
    pub(crate) fn from_signature(err: SignatureError, self_id: &str) -> Self {
        match err {
            SignatureError::Missing => Self::AuthenticationMissing(self_id.to_string()),
            SignatureError::Invalid => Self::AuthenticationInvalid(self_id.to_string()),
        }
    }

    /// The HTTP status returned to the gateway.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownIdentity(_) | Self::AuthenticationInvalid(_) => StatusCode::FORBIDDEN,
            Self::AuthenticationMissing(_) => StatusCode::UNAUTHORIZED,
            Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
        }
    }
}
