//! Validation helpers for key components.

use std::sync::OnceLock;

use regex_lite::Regex;

use crate::error::{CoreError, CoreResult};

const PROJECT_ID_PATTERN: &str = r"^[a-z0-9][a-z0-9\-.:~]*$";
const NAMESPACE_PATTERN: &str = r"^[0-9A-Za-z._\-]{0,100}$";

/// Maximum length, in bytes, of a kind or a key name.
pub(crate) const MAX_COMPONENT_BYTES: usize = 1500;

static PROJECT_ID_REGEX: OnceLock<Result<Regex, String>> = OnceLock::new();
static NAMESPACE_REGEX: OnceLock<Result<Regex, String>> = OnceLock::new();

/// Match `input` against `pattern`, compiling it once into `cell`.
fn matches(
    cell: &'static OnceLock<Result<Regex, String>>,
    pattern: &str,
    input: &str,
) -> CoreResult<bool> {
    let re = cell
        .get_or_init(|| Regex::new(pattern).map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| CoreError::invalid_key(format!("bad pattern {pattern}: {e}")))?;
    Ok(re.is_match(input))
}

pub(crate) fn validate_project_id(project_id: &str) -> CoreResult<()> {
    if !matches(&PROJECT_ID_REGEX, PROJECT_ID_PATTERN, project_id)? {
        return Err(CoreError::invalid_key(format!(
            "project id {project_id:?} must match {PROJECT_ID_PATTERN}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_namespace(namespace: &str) -> CoreResult<()> {
    if !matches(&NAMESPACE_REGEX, NAMESPACE_PATTERN, namespace)? {
        return Err(CoreError::invalid_key(format!(
            "namespace {namespace:?} must match {NAMESPACE_PATTERN}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_kind(kind: &str) -> CoreResult<()> {
    if kind.is_empty() {
        return Err(CoreError::invalid_key("kind must not be empty"));
    }
    if kind.len() > MAX_COMPONENT_BYTES {
        return Err(CoreError::invalid_key(format!(
            "kind exceeds {MAX_COMPONENT_BYTES} bytes"
        )));
    }
    if is_reserved(kind) {
        return Err(CoreError::invalid_key(format!("kind {kind:?} is reserved")));
    }
    Ok(())
}

pub(crate) fn validate_name(name: &str) -> CoreResult<()> {
    if name.is_empty() {
        return Err(CoreError::invalid_key("name must not be empty"));
    }
    if name.len() > MAX_COMPONENT_BYTES {
        return Err(CoreError::invalid_key(format!(
            "name exceeds {MAX_COMPONENT_BYTES} bytes"
        )));
    }
    if is_reserved(name) {
        return Err(CoreError::invalid_key(format!("name {name:?} is reserved")));
    }
    Ok(())
}

pub(crate) fn validate_id(id: i64) -> CoreResult<()> {
    if id <= 0 {
        return Err(CoreError::invalid_key(format!("id {id} must be positive")));
    }
    Ok(())
}

pub(crate) fn validate_property_name(name: &str) -> CoreResult<()> {
    if name.is_empty() || name.len() > MAX_COMPONENT_BYTES || is_reserved(name) {
        return Err(CoreError::invalid_property_name(name));
    }
    Ok(())
}

/// Names wrapped in double underscores belong to the server.
fn is_reserved(s: &str) -> bool {
    s.len() >= 4 && s.starts_with("__") && s.ends_with("__")
}
