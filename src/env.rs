//! Helpers for reading configuration from environment variables.

use std::str::FromStr;

/// Interpret a string value such as "1" or "no" as a boolean.
///
/// Returns `None` for unrecognized values.
pub fn str_as_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" => Some(true),
        "0" | "false" | "f" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Return whether a feature flag controlled by an environment variable is
/// enabled.
pub fn env_flag(name: &str, default: bool) -> bool {
    let Ok(value) = std::env::var(name) else {
        return default;
    };
    str_as_bool(&value).unwrap_or_else(|| {
        tracing::warn!(var = name, value = %value, "unrecognized boolean value");
        default
    })
}

/// Read a numeric setting from an environment variable.
///
/// Returns `None` if the variable is unset or does not parse.
pub fn env_number<T: FromStr>(name: &str) -> Option<T> {
    let value = std::env::var(name).ok()?;
    match value.trim().parse() {
        Ok(number) => Some(number),
        Err(_) => {
            tracing::warn!(var = name, value = %value, "unrecognized numeric value");
            None
        }
    }
}
