use serde_json::{ Map, Value as JsonValue };

use crate::models::course::ContentType;

const REQUIRED_FIELDS: [&str; 6] = ["title", "description", "modules", "level", "duration", "category"];
const STRING_FIELDS: [&str; 5] = ["title", "description", "level", "duration", "category"];

/// Checks that a parsed model reply has the shape of a `CourseStructure`.
///
/// Stops at the first failing check and reports only pass/fail.
pub fn validate_course_structure(data: &JsonValue) -> bool {
    let Some(course) = data.as_object() else {
        return false;
    };

    if !REQUIRED_FIELDS.iter().all(|field| course.contains_key(*field)) {
        return false;
    }
    if !STRING_FIELDS.iter().all(|field| is_string(course, field)) {
        return false;
    }

    match course.get("modules").and_then(JsonValue::as_array) {
        Some(modules) => modules.iter().all(is_valid_module),
        None => false,
    }
}

fn is_valid_module(module: &JsonValue) -> bool {
    let Some(module) = module.as_object() else {
        return false;
    };
    if !is_string(module, "title") || !is_string(module, "description") {
        return false;
    }
    match module.get("content").and_then(JsonValue::as_array) {
        Some(items) => items.iter().all(is_valid_content),
        None => false,
    }
}

fn is_valid_content(item: &JsonValue) -> bool {
    let Some(item) = item.as_object() else {
        return false;
    };
    let known_type = item
        .get("type")
        .and_then(JsonValue::as_str)
        .and_then(ContentType::from_name)
        .is_some();

    known_type && is_string(item, "title") && is_string(item, "description")
}

fn is_string(object: &Map<String, JsonValue>, field: &str) -> bool {
    matches!(object.get(field), Some(JsonValue::String(_)))
}
