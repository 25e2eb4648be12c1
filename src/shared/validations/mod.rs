/// Clamp a caller-supplied history limit to `1..=max`, falling back to `default`.
pub fn validate_limit(limit: Option<u64>, default: u64, max: u64) -> u64 {
    limit.unwrap_or(default).clamp(1, max.max(1))
}

/// Trimmed, non-empty text field or `None`.
pub fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
