//! JSON shapes exchanged with the validation endpoint

use serde::{Deserialize, Serialize};

use crate::domain::{FieldPath, ValidationMessage};
use crate::infrastructure::error::TransportError;

/// Single message as sent by the endpoint; `field` carries a leading separator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub field: String,
    pub message: String,
}

/// Response envelope. A missing or null message list means "no messages".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    #[serde(default)]
    pub validation_messages: Option<Vec<WireMessage>>,
}

impl ValidationResponse {
    pub fn from_json(body: serde_json::Value) -> Result<Self, TransportError> {
        serde_json::from_value(body).map_err(|e| TransportError::InvalidResponse {
            message: e.to_string(),
        })
    }

    /// Domain messages in response order.
    pub fn into_messages(self) -> Result<Vec<ValidationMessage>, TransportError> {
        self.validation_messages
            .unwrap_or_default()
            .into_iter()
            .map(|m| {
                let field = FieldPath::from_wire(&m.field).map_err(|e| {
                    TransportError::InvalidResponse {
                        message: e.to_string(),
                    }
                })?;
                Ok(ValidationMessage::new(field, m.message))
            })
            .collect()
    }
}

impl From<&ValidationMessage> for WireMessage {
    fn from(m: &ValidationMessage) -> Self {
        Self {
            field: format!(".{}", m.field),
            message: m.message.clone(),
        }
    }
}
