use serde::Serialize;
use std::path::PathBuf;

use crate::cache::CacheStats;
use crate::script::Step;

/// What the cache did for a single step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Observed {
    Hit { value: String },
    Miss,
    /// A new key went in; `evicted` names the key pushed out, if any.
    Stored { evicted: Option<String> },
    Updated,
    Len { len: usize },
}

impl std::fmt::Display for Observed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Observed::Hit { value } => write!(f, "hit {value}"),
            Observed::Miss => write!(f, "miss"),
            Observed::Stored { evicted: Some(key) } => write!(f, "stored, evicted {key}"),
            Observed::Stored { evicted: None } => write!(f, "stored"),
            Observed::Updated => write!(f, "updated"),
            Observed::Len { len } => write!(f, "len {len}"),
        }
    }
}

/// One replayed step and whether its expectation held.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: Step,
    pub observed: Observed,
    /// `false` only when the step carried an expectation that failed.
    pub passed: bool,
}

/// The result of replaying one script against a fresh cache.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub file_path: Option<PathBuf>,
    pub capacity: usize,
    pub outcomes: Vec<StepOutcome>,
    pub failures: usize,
    pub stats: CacheStats,
    /// Final contents, most recently used first.
    pub contents: Vec<(String, String)>,
}

impl ReplayReport {
    pub fn passed(&self) -> bool {
        self.failures == 0
    }
}
