//! Utility functions shared across the session server.

/// Returns the current Unix timestamp in seconds.
///
/// All diagnostic events should use this function for timestamp generation
/// so that log correlation stays consistent.
///
/// # Panics
///
/// Panics if the system clock is set to a time before the Unix epoch. This
/// should never happen in practice on modern systems.
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs()
}
