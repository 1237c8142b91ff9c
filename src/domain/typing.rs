use std::time::Duration;

/// Ordered identity pair: `from` is typing to `to`. (a, b) and (b, a) are distinct signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypingKey {
    pub from: i64,
    pub to: i64,
}

impl TypingKey {
    #[must_use]
    pub const fn new(from: i64, to: i64) -> Self {
        Self { from, to }
    }
}

impl std::fmt::Display for TypingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

/// A signal last set `age` ago is live only while `age < window`.
#[must_use]
pub fn is_live(age: Duration, window: Duration) -> bool {
    age < window
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_matters() {
        assert_ne!(TypingKey::new(1, 2), TypingKey::new(2, 1));
        assert_eq!(TypingKey::new(1, 2).to_string(), "1->2");
    }

    #[test]
    fn test_window_boundary_is_exclusive() {
        let window = Duration::from_millis(3000);
        assert!(is_live(Duration::from_millis(2999), window));
        assert!(!is_live(Duration::from_millis(3000), window));
        assert!(!is_live(Duration::from_millis(3001), window));
    }
}
