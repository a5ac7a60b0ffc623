//! Small shared utilities

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// All persisted timestamps (`created_at`, `updated_at`, queue scheduling)
/// use this representation.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_millis_is_monotonic_enough() {
        let a = now_millis();
        let b = now_millis();
        assert!(b >= a);
        // Sanity: later than 2024-01-01
        assert!(a > 1_704_067_200_000);
    }
}
