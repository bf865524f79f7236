use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub type TimestampMillis = u64;

/// Seconds since the Unix epoch.
pub type TimestampSeconds = u64;

/// Returns the current wall-clock time as a `SystemTime`.
pub fn get_current_time() -> SystemTime {
    SystemTime::now()
}

/// Returns the current time in whole seconds since the Unix epoch.
pub fn get_current_time_in_seconds() -> TimestampSeconds {
    get_current_time()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_secs()
}

/// Returns the current time in milliseconds since the Unix epoch.
pub fn get_current_time_in_millis() -> TimestampMillis {
    get_current_time()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_and_millis_agree() {
        let s = get_current_time_in_seconds();
        let ms = get_current_time_in_millis();
        assert!(ms / 1000 >= s.saturating_sub(1));
    }
}
