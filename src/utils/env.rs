//! Environment variable utilities

/// Get environment variable as Option
///
/// Returns `Some(value)` if set, `None` if not set or not valid unicode.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get environment variable as integer
///
/// Returns `Some(value)` if set and parseable, `None` otherwise.
pub fn env_int<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    std::env::var(key).ok()?.trim().parse().ok()
}
