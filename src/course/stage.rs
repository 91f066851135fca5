use serde::{ Deserialize, Serialize };
use serde_json::Value as JsonValue;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Subject,
    Audience,
    Objectives,
    Duration,
    Final,
}

/// Keyword that marks each stage as answered, in wizard order.
const STAGE_KEYWORDS: [(&str, Stage); 4] = [
    ("subject", Stage::Subject),
    ("audience", Stage::Audience),
    ("objectives", Stage::Objectives),
    ("duration", Stage::Duration),
];

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Subject => "subject",
            Stage::Audience => "audience",
            Stage::Objectives => "objectives",
            Stage::Duration => "duration",
            Stage::Final => "final",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Works out the wizard stage from a raw JSON history.
///
/// Anything that is not an array yields `Stage::Subject`. Entries without a
/// string `content` are skipped.
pub fn determine_stage(context: &JsonValue) -> Stage {
    let Some(turns) = context.as_array() else {
        return Stage::Subject;
    };
    let contents = turns
        .iter()
        .filter_map(|turn| turn.get("content").and_then(JsonValue::as_str));
    stage_from_contents(contents)
}

/// The first keyword no turn mentions picks the stage; all four mentioned
/// means the conversation is complete. Matching is a plain lowercase
/// substring test, so any mention of a keyword counts.
fn stage_from_contents<'a>(contents: impl Iterator<Item = &'a str>) -> Stage {
    let lowered: Vec<String> = contents.map(str::to_lowercase).collect();

    for (keyword, stage) in STAGE_KEYWORDS {
        if !lowered.iter().any(|content| content.contains(keyword)) {
            return stage;
        }
    }
    Stage::Final
}
