use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// One scripted cache operation, optionally carrying an expectation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Step {
    Put {
        key: String,
        value: String,
    },
    Get {
        key: String,
        #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
        expect: Option<Expect>,
    },
    Len {
        expect: usize,
    },
}

/// What a `get` step should observe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Expect {
    Hit(String),
    Miss,
}

/// A parsed access pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub capacity: Option<i64>,
    pub steps: Vec<Step>,
}

// Distinguishes an absent `expect` (no expectation) from `"expect": null`
// (expect a miss).
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Expect>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(Some(match value {
        Some(v) => Expect::Hit(v),
        None => Expect::Miss,
    }))
}

impl Script {
    /// Parse the line-oriented `.lru` format.
    pub fn parse(source: &str) -> Result<Self> {
        let mut script = Script::default();

        for (idx, raw) in source.lines().enumerate() {
            let line_no = idx + 1;
            let line = match raw.split_once('#') {
                Some((before, _)) => before,
                None => raw,
            };
            let tokens: Vec<&str> = line.split_whitespace().collect();

            match tokens.as_slice() {
                [] => {}
                ["capacity", n] => {
                    if script.capacity.is_some() {
                        return Err(Error::parse(line_no, "capacity given twice"));
                    }
                    if !script.steps.is_empty() {
                        return Err(Error::parse(line_no, "capacity must precede all operations"));
                    }
                    let n = n
                        .parse::<i64>()
                        .map_err(|_| Error::parse(line_no, format!("bad capacity: {n}")))?;
                    script.capacity = Some(n);
                }
                ["put", key, value] => script.steps.push(Step::Put {
                    key: key.to_string(),
                    value: value.to_string(),
                }),
                ["get", key] => script.steps.push(Step::Get {
                    key: key.to_string(),
                    expect: None,
                }),
                ["get", key, "!"] => script.steps.push(Step::Get {
                    key: key.to_string(),
                    expect: Some(Expect::Miss),
                }),
                ["get", key, "=", value] => script.steps.push(Step::Get {
                    key: key.to_string(),
                    expect: Some(Expect::Hit(value.to_string())),
                }),
                ["len", n] => {
                    let n = n
                        .parse::<usize>()
                        .map_err(|_| Error::parse(line_no, format!("bad length: {n}")))?;
                    script.steps.push(Step::Len { expect: n });
                }
                _ => {
                    return Err(Error::parse(
                        line_no,
                        format!("unrecognized directive: {}", line.trim()),
                    ))
                }
            }
        }

        Ok(script)
    }

    /// Parse the JSON form of a script.
    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Read a script from disk, picking the format from the extension.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json(&source)
        } else {
            Self::parse(&source)
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Put { key, value } => write!(f, "put {key} {value}"),
            Step::Get { key, expect: None } => write!(f, "get {key}"),
            Step::Get {
                key,
                expect: Some(Expect::Miss),
            } => write!(f, "get {key} !"),
            Step::Get {
                key,
                expect: Some(Expect::Hit(v)),
            } => write!(f, "get {key} = {v}"),
            Step::Len { expect } => write!(f, "len {expect}"),
        }
    }
}
