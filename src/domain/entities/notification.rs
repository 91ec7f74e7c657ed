use serde::{Deserialize, Serialize};

/// A message owned by exactly one passenger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Option<i64>,
    pub message: String,
    /// Owning passenger. Always set once the row is stored.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub passenger_id: Option<i64>,
}

impl Notification {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            id: None,
            message: message.into(),
            passenger_id: None,
        }
    }

    /// Fresh unsaved copy of this notification for another owner.
    pub fn copy_for(&self, passenger_id: i64) -> Self {
        Self {
            id: None,
            message: self.message.clone(),
            passenger_id: Some(passenger_id),
        }
    }
}

/// Read-only projection: a notification message joined with its owner's email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationDto {
    pub message: String,
    pub email: String,
}
