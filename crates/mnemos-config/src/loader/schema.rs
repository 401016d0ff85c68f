//! Shape check for config documents.
//!
//! Rejects unknown keys and wrongly typed values with the dotted path of the
//! offending field. Value ranges are left to `MnemosConfig::validate`.

use crate::ConfigError;
use serde_json::{Map, Value};

pub(super) fn check_shape(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    ensure_allowed_keys(map, &["$schema", "memory", "llm", "extractors"], layer, "")?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("memory") {
        validate_memory(value, layer, "memory")?;
    }
    if let Some(value) = map.get("llm") {
        validate_llm(value, layer, "llm")?;
    }
    if let Some(value) = map.get("extractors") {
        validate_extractors(value, layer, "extractors")?;
    }
    Ok(())
}

/// Validate the "memory" block.
fn validate_memory(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["message_window", "store"], layer, path)?;

    if let Some(value) = map.get("message_window") {
        expect_u64(value, layer, &join_path(path, "message_window"))?;
    }
    if let Some(value) = map.get("store") {
        let store_path = join_path(path, "store");
        let store = expect_object(value, layer, &store_path)?;
        ensure_allowed_keys(store, &["path"], layer, &store_path)?;
        if let Some(value) = store.get("path") {
            expect_string(value, layer, &join_path(&store_path, "path"))?;
        }
    }
    Ok(())
}

/// Validate the "llm" block.
fn validate_llm(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["model", "base_url", "api_key_env", "timeout_secs"],
        layer,
        path,
    )?;

    for key in ["model", "base_url", "api_key_env"] {
        if let Some(value) = map.get(key) {
            expect_string(value, layer, &join_path(path, key))?;
        }
    }
    if let Some(value) = map.get("timeout_secs") {
        expect_u64(value, layer, &join_path(path, "timeout_secs"))?;
    }
    Ok(())
}

/// Validate the "extractors" block.
fn validate_extractors(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["summarizer", "workers", "timeout_secs"], layer, path)?;

    if let Some(value) = map.get("summarizer") {
        validate_summarizer(value, layer, &join_path(path, "summarizer"))?;
    }
    if let Some(value) = map.get("workers") {
        let workers_path = join_path(path, "workers");
        let workers = expect_object(value, layer, &workers_path)?;
        ensure_allowed_keys(
            workers,
            &["max_concurrent", "queue_capacity"],
            layer,
            &workers_path,
        )?;
        for key in ["max_concurrent", "queue_capacity"] {
            if let Some(value) = workers.get(key) {
                expect_u64(value, layer, &join_path(&workers_path, key))?;
            }
        }
    }
    if let Some(value) = map.get("timeout_secs") {
        expect_u64(value, layer, &join_path(path, "timeout_secs"))?;
    }
    Ok(())
}

/// Validate the summary extractor block.
fn validate_summarizer(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["enabled", "prompt_tokens", "prompt_template"],
        layer,
        path,
    )?;

    if let Some(value) = map.get("enabled") {
        expect_bool(value, layer, &join_path(path, "enabled"))?;
    }
    if let Some(value) = map.get("prompt_tokens") {
        expect_u64(value, layer, &join_path(path, "prompt_tokens"))?;
    }
    if let Some(value) = map.get("prompt_template") {
        expect_string(value, layer, &join_path(path, "prompt_template"))?;
    }
    Ok(())
}

fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    value
        .as_object()
        .ok_or_else(|| invalid_field(layer, path, "expected object"))
}

fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_string() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

fn expect_bool(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_boolean() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected bool"))
    }
}

/// Counts and sizes must be non-negative integers.
fn expect_u64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_u64() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected non-negative integer"))
    }
}

fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    match map.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(invalid_field(layer, &join_path(path, key), "unknown key")),
        None => Ok(()),
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{normalized_path}"),
        message: message.to_string(),
    }
}
