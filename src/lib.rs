pub mod cache;
pub mod error;
mod order;
pub mod output;
pub mod replay;
pub mod report;
pub mod script;

use std::path::Path;

pub use cache::{CacheStats, LruCache};
pub use error::{Error, Result};
pub use order::Iter;

use replay::Replayer;
use report::ReplayReport;
use script::Script;

/// Replay a text script and return a report.
pub fn replay(source: &str, capacity_override: Option<i64>) -> Result<ReplayReport> {
    let script = Script::parse(source)?;
    Replayer::new(capacity_override).run(&script, None)
}

/// Replay a script file (`.lru` text or `.json`) and return a report.
pub fn replay_file(path: &Path, capacity_override: Option<i64>) -> Result<ReplayReport> {
    let script = Script::load(path)?;
    Replayer::new(capacity_override).run(&script, Some(path.to_path_buf()))
}
