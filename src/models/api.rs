use serde::{ Serialize, Deserialize };
use serde_json::Value as JsonValue;

use crate::course::{ ErrorKind, Stage };
use crate::models::course::{ CourseBrief, CourseStructure };

/// Body of `POST /course-generation/generate`.
///
/// `context` stays untyped so a malformed history can be reported as a
/// client error instead of a generic body rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub context: JsonValue,
    #[serde(default)]
    pub access_token: Option<String>,
    /// Stage tracked by the client; skips keyword inference when present.
    #[serde(default)]
    pub stage: Option<Stage>,
    /// Named wizard answers; replaces positional extraction when present.
    #[serde(default)]
    pub brief: Option<CourseBrief>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateReply {
    pub message: String,
    #[serde(rename = "courseData", default, skip_serializing_if = "Option::is_none")]
    pub course_data: Option<CourseStructure>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutlineRequest {
    pub mode: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnhanceRequest {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentReply {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub success: bool,
    pub message: String,
    pub details: Option<Vec<String>>,
}
