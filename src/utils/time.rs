//! Time and timestamp utilities

/// Get current Unix timestamp in seconds
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_is_recent() {
        assert!(current_timestamp() > 1_600_000_000);
    }
}
