use serde::Serialize;

/// Success body shared by every endpoint: `{"success": true, "data": ...}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> Envelope<T> {
    pub const fn ok(data: T) -> Self {
        Self { success: true, data }
    }
}

/// `{"success": true}` for endpoints with nothing to return.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    #[must_use]
    pub const fn ok() -> Self {
        Self { success: true }
    }
}
