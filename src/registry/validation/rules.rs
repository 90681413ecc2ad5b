//! Individual validation rules.
//!
//! Each rule inspects one aspect of its input and records any violation in
//! the supplied collector instead of returning early.

use super::{ValidationErrors, ValidatorLimits};
use crate::registry::domain::{CircuitBreakerConfig, EntityKind, RegistryConfig};

/// Longest offending value echoed back in a violation.
const MAX_ECHOED_VALUE_CHARS: usize = 80;

/// Percent-encoded spellings of a `..` segment.
const ENCODED_PARENT_SEGMENTS: [&str; 3] = ["%2e%2e", "%2e.", ".%2e"];

fn preview(value: &str) -> String {
    if value.chars().count() <= MAX_ECHOED_VALUE_CHARS {
        return value.to_owned();
    }
    let mut shortened: String = value.chars().take(MAX_ECHOED_VALUE_CHARS).collect();
    shortened.push_str("...");
    shortened
}

fn is_tool_identifier_char(character: char) -> bool {
    character.is_ascii_alphanumeric() || matches!(character, '_' | '-' | '.')
}

fn is_name_char(character: char) -> bool {
    character.is_ascii_alphanumeric() || matches!(character, ' ' | '_' | '-' | '.')
}

fn is_version_char(character: char) -> bool {
    character.is_ascii_alphanumeric() || matches!(character, '.' | '-' | '+')
}

/// Records a violation when `value` is blank or longer than `max_chars`.
///
/// Returns whether the value passed both checks.
pub fn check_required_length(
    errors: &mut ValidationErrors,
    field: &str,
    value: &str,
    max_chars: usize,
) -> bool {
    if value.trim().is_empty() {
        errors.push(field, value, "must not be empty");
        return false;
    }
    let length = value.chars().count();
    if length > max_chars {
        errors.push(
            field,
            preview(value),
            format!("must be at most {max_chars} characters (got {length})"),
        );
        return false;
    }
    true
}

/// Validates an identifier for the given entity kind.
///
/// Every identifier must be non-empty and within the length limit. Resource
/// identifiers must be URIs with an allowed scheme and no parent-directory
/// segments; tool identifiers are restricted to `[A-Za-z0-9_.-]`.
pub fn check_identifier(
    errors: &mut ValidationErrors,
    kind: EntityKind,
    identifier: &str,
    limits: &ValidatorLimits,
) {
    if !check_required_length(errors, "identifier", identifier, limits.max_identifier_length) {
        return;
    }

    if kind.uses_uri_identifiers() {
        check_uri(errors, identifier, limits);
    } else if !identifier.chars().all(is_tool_identifier_char) {
        errors.push(
            "identifier",
            preview(identifier),
            "tool names may only contain ASCII letters, digits, '_', '-' and '.'",
        );
    }
}

fn check_uri(errors: &mut ValidationErrors, uri: &str, limits: &ValidatorLimits) {
    let Some((scheme, rest)) = uri.split_once("://") else {
        errors.push(
            "identifier",
            preview(uri),
            "resource URI must have the form 'scheme://path'",
        );
        return;
    };

    let normalized_scheme = scheme.to_ascii_lowercase();
    if !limits
        .allowed_schemes
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(&normalized_scheme))
    {
        errors.push(
            "identifier",
            preview(uri),
            format!(
                "unsupported URI scheme '{scheme}' (allowed: {})",
                limits.allowed_schemes.join(", ")
            ),
        );
    }

    let traverses = rest.split(['/', '\\']).any(|segment| {
        let lowered = segment.to_ascii_lowercase();
        lowered == ".." || ENCODED_PARENT_SEGMENTS.contains(&lowered.as_str())
    });
    if traverses {
        errors.push(
            "identifier",
            preview(uri),
            "resource URI must not contain path traversal segments",
        );
    }
}

/// Validates a display name.
pub fn check_name(errors: &mut ValidationErrors, name: &str, limits: &ValidatorLimits) {
    if !check_required_length(errors, "name", name, limits.max_name_length) {
        return;
    }
    if !name.chars().all(is_name_char) {
        errors.push(
            "name",
            preview(name),
            "may only contain ASCII letters, digits, spaces, '_', '-' and '.'",
        );
    }
}

/// Validates a description.
pub fn check_description(
    errors: &mut ValidationErrors,
    description: &str,
    limits: &ValidatorLimits,
) {
    check_required_length(
        errors,
        "description",
        description,
        limits.max_description_length,
    );
}

/// Validates a version string.
pub fn check_version(errors: &mut ValidationErrors, version: &str, limits: &ValidatorLimits) {
    if !check_required_length(errors, "version", version, limits.max_version_length) {
        return;
    }
    if !version.chars().all(is_version_char) {
        errors.push(
            "version",
            preview(version),
            "may only contain ASCII letters, digits, '.', '-' and '+'",
        );
    }
}

/// Validates that at least one capability is advertised and none is blank.
pub fn check_capabilities(
    errors: &mut ValidationErrors,
    capabilities: &[String],
    limits: &ValidatorLimits,
) {
    if capabilities.is_empty() {
        errors.push("capabilities", "[]", "at least one capability is required");
        return;
    }
    for (index, capability) in capabilities.iter().enumerate() {
        check_required_length(
            errors,
            &format!("capabilities[{index}]"),
            capability,
            limits.max_tag_length,
        );
    }
}

/// Validates tag count and tag lengths.
pub fn check_tags(errors: &mut ValidationErrors, tags: &[String], limits: &ValidatorLimits) {
    if tags.len() > limits.max_tags {
        errors.push(
            "tags",
            tags.len().to_string(),
            format!("at most {} tags are allowed", limits.max_tags),
        );
    }
    for (index, tag) in tags.iter().enumerate() {
        check_required_length(errors, &format!("tags[{index}]"), tag, limits.max_tag_length);
    }
}

/// Records a violation when `value` lies outside `[min, max]`.
pub fn check_bounds(errors: &mut ValidationErrors, field: &str, value: u64, min: u64, max: u64) {
    if value < min || value > max {
        errors.push(
            field,
            value.to_string(),
            format!("must be between {min} and {max}"),
        );
    }
}

/// Validates registry timeouts and cache sizes.
pub fn check_registry_config(errors: &mut ValidationErrors, config: &RegistryConfig) {
    check_bounds(
        errors,
        "creation_timeout_secs",
        config.creation_timeout_secs,
        1,
        3_600,
    );
    check_bounds(errors, "read_timeout_secs", config.read_timeout_secs, 1, 3_600);
    check_bounds(errors, "cache_ttl_secs", config.cache_ttl_secs, 0, 86_400);
    check_bounds(
        errors,
        "max_cache_entries",
        u64::try_from(config.max_cache_entries).unwrap_or(u64::MAX),
        0,
        100_000,
    );
    check_circuit_breaker_config(errors, &config.circuit_breaker);
}

/// Validates breaker thresholds and timeouts.
pub fn check_circuit_breaker_config(errors: &mut ValidationErrors, config: &CircuitBreakerConfig) {
    check_bounds(
        errors,
        "circuit_breaker.max_half_open_requests",
        u64::from(config.max_half_open_requests),
        1,
        100,
    );
    check_bounds(
        errors,
        "circuit_breaker.reset_interval_secs",
        config.reset_interval_secs,
        0,
        3_600,
    );
    check_bounds(
        errors,
        "circuit_breaker.open_timeout_secs",
        config.open_timeout_secs,
        1,
        3_600,
    );
    check_bounds(
        errors,
        "circuit_breaker.min_requests",
        u64::from(config.min_requests),
        1,
        10_000,
    );
    check_bounds(
        errors,
        "circuit_breaker.failure_ratio_percent",
        u64::from(config.failure_ratio_percent),
        1,
        100,
    );
}
