use log::{ debug, error, info, warn };
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::cache::{ cache_key, ResponseCache };
use crate::config::prompt::{ self, PromptConfig, PromptError };
use crate::course::error::{ CourseError, Operation };
use crate::course::extract::{ clean_model_output, turns_from_context, CourseInputs };
use crate::course::stage::{ determine_stage, Stage };
use crate::course::validate::validate_course_structure;
use crate::llm::chat::ChatClient;
use crate::models::api::GenerateReply;
use crate::models::course::{ CourseBrief, CourseStructure, GenerationMode };

/// Drives the course wizard: picks the stage, talks to the model and turns
/// the final reply into a validated `CourseStructure`.
///
/// Holds no per-conversation state; the caller resends the history each time.
pub struct CourseAssistant {
    chat_client: Arc<dyn ChatClient>,
    prompts: RwLock<Arc<PromptConfig>>,
    cache: Option<ResponseCache>,
}

impl CourseAssistant {
    pub fn new(chat_client: Arc<dyn ChatClient>, prompts: Arc<PromptConfig>) -> Self {
        Self {
            chat_client,
            prompts: RwLock::new(prompts),
            cache: None,
        }
    }

    /// Caches stage replies for `ttl`. A zero duration leaves caching off.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = if ttl.is_zero() { None } else { Some(ResponseCache::new(ttl)) };
        self
    }

    pub async fn prompts(&self) -> Arc<PromptConfig> {
        Arc::clone(&*self.prompts.read().await)
    }

    /// Swaps in newer templates from `path`; `Ok(false)` when unchanged.
    pub async fn reload_prompts_if_changed(&self, path: &str) -> Result<bool, PromptError> {
        let current = self.prompts().await;
        match prompt::reload_prompts_if_changed(path, &current)? {
            Some(new_config) => {
                *self.prompts.write().await = new_config;
                if let Some(cache) = &self.cache {
                    cache.clear();
                }
                info!("Prompt templates reloaded from {}", path);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// One wizard turn. `stage` overrides keyword inference over `context`;
    /// `brief` overrides positional extraction at the final stage.
    pub async fn converse(
        &self,
        message: &str,
        context: &JsonValue,
        stage: Option<Stage>,
        brief: Option<&CourseBrief>
    ) -> Result<GenerateReply, CourseError> {
        let stage = stage.unwrap_or_else(|| determine_stage(context));
        info!("Conversation stage: {}", stage);

        if stage != Stage::Final {
            let message = self.generate_response(message, stage).await?;
            return Ok(GenerateReply { message, course_data: None });
        }

        let course = match brief {
            Some(brief) => self.generate_course_structure_from_brief(brief).await?,
            None => self.generate_course_structure(context).await?,
        };
        Ok(GenerateReply {
            message: self.prompts().await.course_ready_reply.clone(),
            course_data: Some(course),
        })
    }

    pub async fn generate_response(&self, message: &str, stage: Stage) -> Result<String, CourseError> {
        let prompts = self.prompts().await;
        if stage == Stage::Final {
            return Ok(prompts.final_reply.clone());
        }

        let prompt = prompt::get_stage_prompt(&prompts, stage, message).map_err(|e| {
            error!("No template for stage {}: {}", stage, e);
            CourseError::ModelUnavailable { operation: Operation::Response, source: Box::new(e) }
        })?;

        let key = cache_key(&prompt);
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(&key) {
                info!("Cache hit for {} stage reply", stage);
                return Ok(cached);
            }
        }

        let reply = self.complete(&prompt, Operation::Response).await?;
        if let Some(cache) = &self.cache {
            cache.set(&key, &reply);
        }
        Ok(reply)
    }

    /// Builds the course from the first four user turns of `context`.
    pub async fn generate_course_structure(
        &self,
        context: &JsonValue
    ) -> Result<CourseStructure, CourseError> {
        let turns = turns_from_context(context);
        let inputs = CourseInputs::from_turns(&turns);
        self.course_from_inputs(&inputs).await
    }

    pub async fn generate_course_structure_from_brief(
        &self,
        brief: &CourseBrief
    ) -> Result<CourseStructure, CourseError> {
        let inputs = CourseInputs::from_brief(brief).map_err(|missing| {
            warn!("Rejecting incomplete course brief, missing {:?}", missing);
            CourseError::IncompleteBrief { missing }
        })?;
        self.course_from_inputs(&inputs).await
    }

    /// One-shot generation outside the wizard. Returns the model text as is.
    pub async fn generate_content(
        &self,
        mode: GenerationMode,
        subject: &str,
        level: &str,
        content: &str
    ) -> Result<String, CourseError> {
        let prompts = self.prompts().await;
        let prompt = prompt::get_outline_prompt(&prompts, mode, subject, level, content).map_err(|e| {
            error!("No template for mode {}: {}", mode, e);
            CourseError::ModelUnavailable { operation: Operation::CourseContent, source: Box::new(e) }
        })?;
        self.complete(&prompt, Operation::CourseContent).await
    }

    async fn course_from_inputs(&self, inputs: &CourseInputs) -> Result<CourseStructure, CourseError> {
        let operation = Operation::CourseStructure;
        let prompt = prompt::get_course_structure_prompt(&*self.prompts().await, inputs);
        let raw = self.complete(&prompt, operation).await?;
        debug!("Raw course structure reply: {}", raw);

        let cleaned = clean_model_output(&raw);
        let parsed: JsonValue = serde_json::from_str(&cleaned).map_err(|source| {
            error!("Course structure reply is not JSON: {}", source);
            CourseError::UnparsableOutput { operation, raw: raw.clone(), source }
        })?;

        if !validate_course_structure(&parsed) {
            error!("Course structure reply does not match the course schema");
            return Err(CourseError::SchemaMismatch { operation, raw });
        }

        serde_json::from_value(parsed).map_err(|e| {
            error!("Validated course structure failed to deserialize: {}", e);
            CourseError::SchemaMismatch { operation, raw }
        })
    }

    async fn complete(&self, prompt: &str, operation: Operation) -> Result<String, CourseError> {
        match self.chat_client.complete(prompt).await {
            Ok(resp) => Ok(resp.response),
            Err(source) => {
                error!(
                    "Model call failed (model={}): {}",
                    self.chat_client.get_model(),
                    source
                );
                Err(CourseError::ModelUnavailable { operation, source })
            }
        }
    }
}
