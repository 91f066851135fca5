use log::{ debug, warn };
use serde_json::Value as JsonValue;

use crate::models::chat::{ ConversationTurn, Role };
use crate::models::course::CourseBrief;

/// Placeholder written into the prompt for an answer the user never gave.
pub const MISSING_ANSWER: &str = "undefined";

/// The four answers interpolated into the course-structure prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseInputs {
    pub subject: String,
    pub audience: String,
    pub objectives: String,
    pub duration: String,
}

impl CourseInputs {
    /// Reads the first four user turns as subject, audience, objectives and
    /// duration, in that order. Absent turns become `MISSING_ANSWER`.
    pub fn from_turns(turns: &[ConversationTurn]) -> Self {
        let mut answers = turns
            .iter()
            .filter(|turn| turn.role == Role::User)
            .map(|turn| turn.content.clone());

        let mut next = |slot: &str| {
            answers.next().unwrap_or_else(|| {
                warn!("No user turn for '{}', prompting with '{}'", slot, MISSING_ANSWER);
                MISSING_ANSWER.to_string()
            })
        };

        Self {
            subject: next("subject"),
            audience: next("audience"),
            objectives: next("objectives"),
            duration: next("duration"),
        }
    }

    /// Copies a brief whose slots are all filled; returns the blank slot
    /// names otherwise.
    pub fn from_brief(brief: &CourseBrief) -> Result<Self, Vec<&'static str>> {
        let missing = brief.missing_slots();
        if !missing.is_empty() {
            return Err(missing);
        }
        let slot = |value: &Option<String>| value.as_deref().unwrap_or_default().trim().to_string();
        Ok(Self {
            subject: slot(&brief.subject),
            audience: slot(&brief.audience),
            objectives: slot(&brief.objectives),
            duration: slot(&brief.duration),
        })
    }
}

/// Reads the turns out of a raw JSON history, dropping entries that are not
/// well-formed turns. Non-array input yields no turns.
pub fn turns_from_context(context: &JsonValue) -> Vec<ConversationTurn> {
    let Some(entries) = context.as_array() else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| match serde_json::from_value::<ConversationTurn>(entry.clone()) {
            Ok(turn) => Some(turn),
            Err(e) => {
                debug!("Skipping malformed conversation turn: {}", e);
                None
            }
        })
        .collect()
}

/// Strips markdown code fences and typographic double quotes from a model
/// reply so it can be parsed as JSON.
pub fn clean_model_output(raw: &str) -> String {
    let mut unfenced = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(idx) = rest.find("```json") {
        unfenced.push_str(&rest[..idx]);
        rest = rest[idx + "```json".len()..].trim_start();
    }
    unfenced.push_str(rest);

    let trimmed = unfenced.trim();
    let trimmed = trimmed.strip_suffix("```").unwrap_or(trimmed).trim_end();
    let trimmed = trimmed.strip_prefix("```").unwrap_or(trimmed);

    trimmed.replace(['\u{201C}', '\u{201D}'], "\"").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fenced_reply_with_curly_quotes_parses_like_plain_json() {
        let plain = r#"{"title": "Guitar 101", "modules": []}"#;
        let fenced = "```json\n{\u{201C}title\u{201D}: \u{201C}Guitar 101\u{201D}, \u{201C}modules\u{201D}: []}\n```";

        let cleaned = clean_model_output(fenced);
        let parsed: JsonValue = serde_json::from_str(&cleaned).expect("cleaned reply parses");
        let expected: JsonValue = serde_json::from_str(plain).unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn bare_fences_and_whitespace_are_removed() {
        assert_eq!(clean_model_output("  ```\n{\"a\": 1}\n```  \n"), "{\"a\": 1}");
        assert_eq!(clean_model_output("\n{\"a\": 1}\n"), "{\"a\": 1}");
    }

    #[test]
    fn text_around_fences_is_kept() {
        let cleaned = clean_model_output("Here you go:\n```json\n{\"a\": 1}\n```");
        assert_eq!(cleaned, "Here you go:\n{\"a\": 1}");
        assert!(serde_json::from_str::<JsonValue>(&cleaned).is_err());
    }

    #[test]
    fn malformed_turns_are_dropped() {
        let context = json!([
            {"role": "user", "content": "Guitar"},
            {"role": "system", "content": "be nice"},
            {"role": "user"},
            "Teens",
            {"role": "assistant", "content": "Objectives?"}
        ]);
        let turns = turns_from_context(&context);
        assert_eq!(turns, vec![
            ConversationTurn::user("Guitar"),
            ConversationTurn::assistant("Objectives?"),
        ]);
        assert!(turns_from_context(&JsonValue::Null).is_empty());
    }

    #[test]
    fn positional_inputs_skip_assistant_turns() {
        let turns = vec![
            ConversationTurn::user("Guitar"),
            ConversationTurn::assistant("Who is it for?"),
            ConversationTurn::user("Teenagers"),
            ConversationTurn::user("Play three songs"),
            ConversationTurn::user("Six weeks"),
            ConversationTurn::user("Extra detail"),
        ];
        let inputs = CourseInputs::from_turns(&turns);
        assert_eq!(inputs, CourseInputs {
            subject: "Guitar".into(),
            audience: "Teenagers".into(),
            objectives: "Play three songs".into(),
            duration: "Six weeks".into(),
        });
    }

    #[test]
    fn missing_positional_answers_become_undefined() {
        let inputs = CourseInputs::from_turns(&[ConversationTurn::user("Guitar")]);
        assert_eq!(inputs.subject, "Guitar");
        assert_eq!(inputs.audience, MISSING_ANSWER);
        assert_eq!(inputs.objectives, MISSING_ANSWER);
        assert_eq!(inputs.duration, MISSING_ANSWER);
    }

    #[test]
    fn brief_must_be_complete() {
        let brief: CourseBrief = serde_json::from_value(json!({
            "subject": " Guitar ",
            "audience": "Teens",
            "objectives": "Chords",
            "duration": "6 weeks"
        })).unwrap();
        let inputs = CourseInputs::from_brief(&brief).expect("complete brief");
        assert_eq!(inputs.subject, "Guitar");

        let partial = CourseBrief { subject: Some("Guitar".into()), ..CourseBrief::default() };
        assert_eq!(
            CourseInputs::from_brief(&partial).unwrap_err(),
            vec!["audience", "objectives", "duration"]
        );
    }
}
