use serde::Deserialize;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use log::info;

use crate::course::extract::CourseInputs;
use crate::course::Stage;
use crate::models::course::GenerationMode;

const BUILTIN_PROMPTS: &str = include_str!("../../json/prompts.json");

/// Stages that are answered by the model; `final` uses `final_reply`.
const PROMPTED_STAGES: [Stage; 4] = [Stage::Subject, Stage::Audience, Stage::Objectives, Stage::Duration];

#[derive(Debug)]
pub enum PromptError {
    TemplateNotFound(String),
    IoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::TemplateNotFound(key) => write!(f, "Prompt template '{}' not found", key),
            PromptError::IoError(e) => write!(f, "Prompt file IO error: {}", e),
            PromptError::JsonError(e) => write!(f, "Prompt JSON parsing error: {}", e),
        }
    }
}

impl Error for PromptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PromptError::IoError(e) => Some(e),
            PromptError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PromptError {
    fn from(err: std::io::Error) -> Self {
        PromptError::IoError(err)
    }
}

impl From<serde_json::Error> for PromptError {
    fn from(err: serde_json::Error) -> Self {
        PromptError::JsonError(err)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct PromptConfig {
    pub stage_templates: HashMap<String, String>,
    pub final_reply: String,
    pub course_ready_reply: String,
    pub course_structure: String,
    pub outline_templates: HashMap<String, String>,
    #[serde(skip)]
    pub last_loaded: Option<SystemTime>,
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        for stage in PROMPTED_STAGES {
            if !self.stage_templates.contains_key(stage.as_str()) {
                return Err(
                    PromptError::TemplateNotFound(format!("stage_templates:{}", stage))
                );
            }
        }
        for mode in GenerationMode::ALL {
            if !self.outline_templates.contains_key(mode.as_str()) {
                return Err(
                    PromptError::TemplateNotFound(format!("outline_templates:{}", mode))
                );
            }
        }
        Ok(())
    }

    fn parse(text: &str) -> Result<Self, PromptError> {
        let mut config: PromptConfig = serde_json::from_str(text)?;
        config.validate()?;
        config.last_loaded = Some(SystemTime::now());
        Ok(config)
    }
}

/// Templates compiled into the binary from `json/prompts.json`.
pub fn builtin_prompts() -> Result<Arc<PromptConfig>, PromptError> {
    Ok(Arc::new(PromptConfig::parse(BUILTIN_PROMPTS)?))
}

pub fn load_prompts(path: &str) -> Result<Arc<PromptConfig>, Box<dyn Error + Send + Sync>> {
    let file_content = fs
        ::read_to_string(path)
        .map_err(|e| format!("Failed to read prompts file '{}': {}", path, e))?;
    let config = PromptConfig
        ::parse(&file_content)
        .map_err(|e| format!("Failed to parse prompts file '{}': {}", path, e))?;
    Ok(Arc::new(config))
}

pub fn reload_prompts_if_changed<P: AsRef<Path>>(
    path: P,
    current_config: &Arc<PromptConfig>
) -> Result<Option<Arc<PromptConfig>>, PromptError> {
    let metadata = fs::metadata(&path)?;
    let modified = metadata.modified()?;

    let stale = match current_config.last_loaded {
        Some(last_loaded) => modified > last_loaded,
        None => true,
    };
    if !stale {
        return Ok(None);
    }

    info!("Prompts file {} changed, reloading...", path.as_ref().display());
    let text = fs::read_to_string(&path)?;
    Ok(Some(Arc::new(PromptConfig::parse(&text)?)))
}

pub fn get_stage_prompt(config: &PromptConfig, stage: Stage, message: &str) -> Result<String, PromptError> {
    let template = config.stage_templates
        .get(stage.as_str())
        .ok_or_else(|| PromptError::TemplateNotFound(format!("stage_templates:{}", stage)))?;
    Ok(fill_template(template, &[("message", message)]))
}

/// Substitutes `{name}` placeholders in one pass, so text coming from a slot
/// is never scanned again. Unknown braces are left as written.
fn fill_template(template: &str, slots: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let filled = after.find('}').and_then(|close| {
            let name = &after[..close];
            slots
                .iter()
                .find(|(slot, _)| *slot == name)
                .map(|(_, value)| (*value, close))
        });
        match filled {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn get_course_structure_prompt(config: &PromptConfig, inputs: &CourseInputs) -> String {
    fill_template(
        &config.course_structure,
        &[
            ("subject", inputs.subject.as_str()),
            ("audience", inputs.audience.as_str()),
            ("objectives", inputs.objectives.as_str()),
            ("duration", inputs.duration.as_str()),
        ]
    )
}

pub fn get_outline_prompt(
    config: &PromptConfig,
    mode: GenerationMode,
    subject: &str,
    level: &str,
    content: &str
) -> Result<String, PromptError> {
    let template = config.outline_templates
        .get(mode.as_str())
        .ok_or_else(|| PromptError::TemplateNotFound(format!("outline_templates:{}", mode)))?;

    Ok(fill_template(template, &[("subject", subject), ("level", level), ("content", content)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn builtin_prompts_cover_every_stage_and_mode() {
        let config = builtin_prompts().expect("bundled prompts are valid");
        assert!(config.last_loaded.is_some());
        for stage in PROMPTED_STAGES {
            let prompt = get_stage_prompt(&config, stage, "guitar for kids").unwrap();
            assert!(prompt.contains("guitar for kids"), "{} template embeds message", stage);
        }
        assert!(get_stage_prompt(&config, Stage::Final, "x").is_err());
    }

    #[test]
    fn subject_prompt_asks_about_audience() {
        let config = builtin_prompts().unwrap();
        let prompt = get_stage_prompt(&config, Stage::Subject, "I want to teach guitar").unwrap();
        assert!(prompt.starts_with("You are a course creation assistant."));
        assert!(prompt.contains("\"I want to teach guitar\""));
        assert!(prompt.contains("target audience"));
    }

    #[test]
    fn course_structure_prompt_interpolates_all_answers() {
        let config = builtin_prompts().unwrap();
        let inputs = CourseInputs {
            subject: "Guitar".into(),
            audience: "Teens".into(),
            objectives: "Chords".into(),
            duration: "undefined".into(),
        };
        let prompt = get_course_structure_prompt(&config, &inputs);
        assert!(prompt.contains("Subject: Guitar"));
        assert!(prompt.contains("Target Audience: Teens"));
        assert!(prompt.contains("Learning Objectives: Chords"));
        assert!(prompt.contains("Duration: undefined"));
        assert!(!prompt.contains("{subject}"));
    }

    #[test]
    fn answers_containing_placeholders_are_not_expanded() {
        let config = builtin_prompts().unwrap();
        let inputs = CourseInputs {
            subject: "Templating with {duration} braces".into(),
            audience: "Designers".into(),
            objectives: "Write {level} templates".into(),
            duration: "SIX WEEKS".into(),
        };
        let prompt = get_course_structure_prompt(&config, &inputs);
        assert!(prompt.contains("Subject: Templating with {duration} braces"));
        assert!(prompt.contains("Duration: SIX WEEKS"));
        assert!(prompt.contains("\"title\": \"string\""));

        let prompt = get_outline_prompt(&config, GenerationMode::Course, "{level}", "beginner", "").unwrap();
        assert!(prompt.contains("course structure for {level} at beginner level"));
    }

    #[test]
    fn template_filling_leaves_unknown_braces() {
        let filled = fill_template("{a} and {b} and {x} {", &[("a", "{b}"), ("b", "2")]);
        assert_eq!(filled, "{b} and 2 and {x} {");
    }

    #[test]
    fn outline_prompt_fills_subject_and_level() {
        let config = builtin_prompts().unwrap();
        let prompt = get_outline_prompt(&config, GenerationMode::Schedule, "Rust", "advanced", "").unwrap();
        assert!(prompt.contains("course schedule for Rust at advanced level"));
        let prompt = get_outline_prompt(&config, GenerationMode::Enhance, "", "", "Ownership basics").unwrap();
        assert!(prompt.ends_with("Content: Ownership basics"));
    }

    #[test]
    fn rejects_files_missing_a_stage() {
        let mut value: serde_json::Value = serde_json::from_str(BUILTIN_PROMPTS).unwrap();
        value["stage_templates"].as_object_mut().unwrap().remove("audience");
        let err = PromptConfig::parse(&value.to_string()).unwrap_err();
        assert_eq!(err.to_string(), "Prompt template 'stage_templates:audience' not found");
    }

    #[test]
    fn load_and_reload_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BUILTIN_PROMPTS.as_bytes()).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let loaded = load_prompts(&path).expect("loads");
        assert_eq!(loaded.final_reply, "Great! I'll now generate a detailed course structure for you.");
        assert!(reload_prompts_if_changed(&path, &loaded).unwrap().is_none());

        let mut stale = (*loaded).clone();
        stale.last_loaded = Some(SystemTime::now() - Duration::from_secs(3600));
        let reloaded = reload_prompts_if_changed(&path, &Arc::new(stale)).unwrap();
        assert!(reloaded.is_some());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = load_prompts("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().starts_with("Failed to read prompts file"));
    }
}
