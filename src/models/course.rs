use serde::{ Serialize, Deserialize };
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Video,
    Document,
    Quiz,
    Assignment,
}

impl ContentType {
    pub const ALL: [ContentType; 4] = [
        ContentType::Video,
        ContentType::Document,
        ContentType::Quiz,
        ContentType::Assignment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Video => "video",
            ContentType::Document => "document",
            ContentType::Quiz => "quiz",
            ContentType::Assignment => "assignment",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleContent {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub title: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseModule {
    pub title: String,
    pub description: String,
    pub content: Vec<ModuleContent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseStructure {
    pub title: String,
    pub description: String,
    pub modules: Vec<CourseModule>,
    pub level: String,
    pub duration: String,
    pub category: String,
}

/// One-shot generation requests served outside the wizard conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationMode {
    Course,
    Objectives,
    Schedule,
    Assessment,
    Enhance,
}

impl GenerationMode {
    pub const ALL: [GenerationMode; 5] = [
        GenerationMode::Course,
        GenerationMode::Objectives,
        GenerationMode::Schedule,
        GenerationMode::Assessment,
        GenerationMode::Enhance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Course => "course",
            GenerationMode::Objectives => "objectives",
            GenerationMode::Schedule => "schedule",
            GenerationMode::Assessment => "assessment",
            GenerationMode::Enhance => "enhance",
        }
    }

    /// Modes selectable through the `mode` field; `enhance` has its own route.
    pub fn from_request_mode(mode: &str) -> Option<Self> {
        match mode {
            "course" => Some(GenerationMode::Course),
            "objectives" => Some(GenerationMode::Objectives),
            "schedule" => Some(GenerationMode::Schedule),
            "assessment" => Some(GenerationMode::Assessment),
            _ => None,
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named answers to the four wizard questions, filled in by the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseBrief {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub objectives: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
}

impl CourseBrief {
    /// Names of the slots that are absent or blank.
    pub fn missing_slots(&self) -> Vec<&'static str> {
        [
            ("subject", &self.subject),
            ("audience", &self.audience),
            ("objectives", &self.objectives),
            ("duration", &self.duration),
        ]
            .into_iter()
            .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
            .map(|(name, _)| name)
            .collect()
    }
}
