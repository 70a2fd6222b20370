//! Testcase definitions and generator commands.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::path::TestcasePath;

/// A generator invocation such as `gen --n 10 {seed:3}`.
///
/// Only `{name}`, `{seed}` and `{seed:N}` placeholders are allowed and braces
/// must be balanced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GenerationCommand(String);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Placeholder {
    Name,
    Seed(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Text(&'a str),
    Placeholder(Placeholder),
}

fn parse_placeholder(command: &str, body: &str) -> Result<Placeholder, ConfigError> {
    if body == "name" {
        return Ok(Placeholder::Name);
    }
    if body == "seed" {
        return Ok(Placeholder::Seed(0));
    }
    if let Some(offset) = body.strip_prefix("seed:") {
        if !offset.is_empty() && offset.chars().all(|c| c.is_ascii_digit()) {
            let offset = offset.parse::<u64>().map_err(|_| ConfigError::InvalidCommand {
                command: command.to_string(),
                reason: format!("seed offset '{offset}' is out of range"),
            })?;
            return Ok(Placeholder::Seed(offset));
        }
    }
    Err(ConfigError::InvalidCommand {
        command: command.to_string(),
        reason: format!("unknown placeholder '{{{body}}}'"),
    })
}

/// Split a command into literal text and placeholders.
fn tokenize(command: &str) -> Result<Vec<Token<'_>>, ConfigError> {
    let mut tokens = Vec::new();
    let mut rest = command;
    while !rest.is_empty() {
        match rest.find(['{', '}']) {
            None => {
                tokens.push(Token::Text(rest));
                break;
            }
            Some(idx) if rest.as_bytes()[idx] == b'}' => {
                return Err(ConfigError::InvalidCommand {
                    command: command.to_string(),
                    reason: "unbalanced '}'".to_string(),
                });
            }
            Some(idx) => {
                if idx > 0 {
                    tokens.push(Token::Text(&rest[..idx]));
                }
                let after = &rest[idx + 1..];
                let close = after.find('}').ok_or_else(|| ConfigError::InvalidCommand {
                    command: command.to_string(),
                    reason: "unbalanced '{'".to_string(),
                })?;
                let body = &after[..close];
                if body.contains('{') {
                    return Err(ConfigError::InvalidCommand {
                        command: command.to_string(),
                        reason: "nested '{'".to_string(),
                    });
                }
                tokens.push(Token::Placeholder(parse_placeholder(command, body)?));
                rest = &after[close + 1..];
            }
        }
    }
    Ok(tokens)
}

impl GenerationCommand {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Err(ConfigError::InvalidCommand {
                command: raw.to_string(),
                reason: "command must not be empty".to_string(),
            });
        }
        tokenize(raw)?;
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitute placeholders; `{seed:N}` becomes `seed + N`.
    pub fn render(&self, name: &str, seed: u64) -> String {
        // Validated at construction.
        let Ok(tokens) = tokenize(&self.0) else {
            return self.0.clone();
        };
        tokens
            .into_iter()
            .map(|token| match token {
                Token::Text(text) => text.to_string(),
                Token::Placeholder(Placeholder::Name) => name.to_string(),
                Token::Placeholder(Placeholder::Seed(offset)) => {
                    seed.wrapping_add(offset).to_string()
                }
            })
            .collect()
    }
}

impl TryFrom<String> for GenerationCommand {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<GenerationCommand> for String {
    fn from(command: GenerationCommand) -> Self {
        command.0
    }
}

/// Where a testcase's input comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TestcaseSource {
    Generate(GenerationCommand),
    Copy(String),
    Inline(String),
}

/// Generation tooling shared by a group and inherited by its testcases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationDefaults {
    pub solution: Option<GenerationCommand>,
    pub visualizer: Option<GenerationCommand>,
    pub random_salt: Option<String>,
}

impl GenerationDefaults {
    pub(crate) fn from_map(map: &Map<String, Value>, at: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            solution: optional_command(map, "solution", at)?,
            visualizer: optional_command(map, "visualizer", at)?,
            random_salt: optional_string(map, "random_salt", at)?,
        })
    }

    pub(crate) fn overlay(&self, other: &GenerationDefaults) -> GenerationDefaults {
        GenerationDefaults {
            solution: other.solution.clone().or_else(|| self.solution.clone()),
            visualizer: other.visualizer.clone().or_else(|| self.visualizer.clone()),
            random_salt: other.random_salt.clone().or_else(|| self.random_salt.clone()),
        }
    }
}

/// Declarative description of a single testcase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestcaseConfig {
    pub source: TestcaseSource,
    pub ans: Option<String>,
    pub desc: Option<String>,
    pub hint: Option<String>,
    pub generation: GenerationDefaults,
}

const TESTCASE_KEYS: [&str; 9] = [
    "generate",
    "copy",
    "in",
    "ans",
    "desc",
    "hint",
    "solution",
    "visualizer",
    "random_salt",
];

impl TestcaseConfig {
    /// Parse a bare command string or a testcase object. `inherited` supplies
    /// generation tooling from the enclosing groups.
    pub fn from_value(
        value: &Value,
        at: &TestcasePath,
        inherited: &GenerationDefaults,
    ) -> Result<Self, ConfigError> {
        let at_str = at.to_string();
        match value {
            Value::String(command) => Ok(Self {
                source: TestcaseSource::Generate(GenerationCommand::parse(command)?),
                ans: None,
                desc: None,
                hint: None,
                generation: inherited.clone(),
            }),
            Value::Object(map) => {
                if let Some(key) = map.keys().find(|k| !TESTCASE_KEYS.contains(&k.as_str())) {
                    return Err(ConfigError::MalformedNode {
                        path: at_str,
                        reason: format!("unknown testcase key '{key}'"),
                    });
                }
                let generate = optional_command(map, "generate", &at_str)?;
                let copy = optional_string(map, "copy", &at_str)?;
                let inline = optional_string(map, "in", &at_str)?;
                let source = match (generate, copy, inline) {
                    (Some(_), Some(_), _) => {
                        return Err(ConfigError::MalformedNode {
                            path: at_str,
                            reason: "'generate' and 'copy' are mutually exclusive".to_string(),
                        })
                    }
                    (Some(command), None, _) => TestcaseSource::Generate(command),
                    (None, Some(path), _) => TestcaseSource::Copy(path),
                    (None, None, Some(content)) => TestcaseSource::Inline(content),
                    (None, None, None) => {
                        return Err(ConfigError::MalformedNode {
                            path: at_str,
                            reason: "testcase needs one of 'generate', 'copy' or 'in'".to_string(),
                        })
                    }
                };
                let own = GenerationDefaults::from_map(map, &at_str)?;
                Ok(Self {
                    source,
                    ans: optional_string(map, "ans", &at_str)?,
                    desc: optional_string(map, "desc", &at_str)?,
                    hint: optional_string(map, "hint", &at_str)?,
                    generation: inherited.overlay(&own),
                })
            }
            other => Err(ConfigError::MalformedNode {
                path: at_str,
                reason: format!("expected a command string or a testcase object, got {other}"),
            }),
        }
    }
}

fn optional_string(
    map: &Map<String, Value>,
    key: &str,
    at: &str,
) -> Result<Option<String>, ConfigError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ConfigError::MalformedNode {
            path: at.to_string(),
            reason: format!("'{key}' must be a string, got {other}"),
        }),
    }
}

fn optional_command(
    map: &Map<String, Value>,
    key: &str,
    at: &str,
) -> Result<Option<GenerationCommand>, ConfigError> {
    optional_string(map, key, at)?
        .map(|raw| GenerationCommand::parse(&raw))
        .transpose()
}
