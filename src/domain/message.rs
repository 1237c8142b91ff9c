use time::OffsetDateTime;

/// A directed message between two identities. Only `is_read` ever changes after insert.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub report_id: Option<i64>,
    pub body: String,
    pub is_read: bool,
    pub sent_at: OffsetDateTime,
}

/// Reasons a message body is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyError {
    Empty,
    TooLong { max: usize },
}

impl std::fmt::Display for BodyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Message body must not be empty"),
            Self::TooLong { max } => write!(f, "Message body must not exceed {max} characters"),
        }
    }
}

/// Trims the body and checks it against the length bound (in characters, not bytes).
///
/// # Errors
/// Returns `BodyError` when the trimmed body is empty or too long.
pub fn validate_body(body: &str, max_chars: usize) -> Result<&str, BodyError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(BodyError::Empty);
    }
    if trimmed.chars().count() > max_chars {
        return Err(BodyError::TooLong { max: max_chars });
    }
    Ok(trimmed)
}
