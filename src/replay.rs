use std::path::PathBuf;

use crate::cache::LruCache;
use crate::error::{Error, Result};
use crate::report::{Observed, ReplayReport, StepOutcome};
use crate::script::{Expect, Script, Step};

/// Drives a fresh `LruCache<String, String>` through a script.
pub struct Replayer {
    capacity_override: Option<i64>,
}

impl Replayer {
    pub fn new(capacity_override: Option<i64>) -> Self {
        Self { capacity_override }
    }

    pub fn run(&self, script: &Script, file_path: Option<PathBuf>) -> Result<ReplayReport> {
        let capacity = self
            .capacity_override
            .or(script.capacity)
            .ok_or_else(|| Error::InvalidConfiguration("no capacity given".to_string()))?;
        let mut cache = LruCache::with_signed_capacity(capacity)?;

        log::debug!(
            "replaying {} steps at capacity {}{}",
            script.steps.len(),
            cache.capacity(),
            file_path
                .as_ref()
                .map(|p| format!(" from {}", p.display()))
                .unwrap_or_default()
        );

        let outcomes: Vec<StepOutcome> = script
            .steps
            .iter()
            .map(|step| Self::apply(&mut cache, step))
            .collect();
        let failures = outcomes.iter().filter(|o| !o.passed).count();

        log::debug!(
            "replay finished: {failures} failed, {} evictions",
            cache.stats().evictions
        );

        Ok(ReplayReport {
            file_path,
            capacity: cache.capacity(),
            failures,
            stats: cache.stats().clone(),
            contents: cache
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            outcomes,
        })
    }

    fn apply(cache: &mut LruCache<String, String>, step: &Step) -> StepOutcome {
        let (observed, passed) = match step {
            Step::Put { key, value } => {
                let observed = if cache.contains(key.as_str()) {
                    cache.put(key.clone(), value.clone());
                    Observed::Updated
                } else {
                    let evicted = cache.push(key.clone(), value.clone()).map(|(k, _)| k);
                    Observed::Stored { evicted }
                };
                (observed, true)
            }
            Step::Get { key, expect } => {
                let observed = match cache.get(key.as_str()) {
                    Some(value) => Observed::Hit {
                        value: value.clone(),
                    },
                    None => Observed::Miss,
                };
                let passed = match (expect, &observed) {
                    (None, _) => true,
                    (Some(Expect::Miss), Observed::Miss) => true,
                    (Some(Expect::Hit(want)), Observed::Hit { value }) => want == value,
                    _ => false,
                };
                (observed, passed)
            }
            Step::Len { expect } => (Observed::Len { len: cache.len() }, cache.len() == *expect),
        };

        if !passed {
            log::debug!("step `{step}` failed: observed {observed}");
        }

        StepOutcome {
            step: step.clone(),
            observed,
            passed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> ReplayReport {
        let script = Script::parse(source).unwrap();
        Replayer::new(None).run(&script, None).unwrap()
    }

    #[test]
    fn records_evictions_and_updates() {
        let report = run("capacity 2\nput a 1\nput b 2\nput a 3\nput c 4\n");
        let observed: Vec<_> = report.outcomes.iter().map(|o| o.observed.clone()).collect();
        assert_eq!(
            observed,
            vec![
                Observed::Stored { evicted: None },
                Observed::Stored { evicted: None },
                Observed::Updated,
                Observed::Stored {
                    evicted: Some("b".into())
                },
            ]
        );
        assert_eq!(
            report.contents,
            vec![("c".into(), "4".into()), ("a".into(), "3".into())]
        );
        assert_eq!(report.stats.evictions, 1);
        assert!(report.passed());
    }

    #[test]
    fn counts_failed_expectations() {
        let report = run("capacity 1\nput a 1\nget a = 2\nget a !\nget b !\nlen 3\n");
        assert_eq!(report.failures, 3);
        let passed: Vec<bool> = report.outcomes.iter().map(|o| o.passed).collect();
        assert_eq!(passed, vec![true, false, false, true, false]);
    }

    #[test]
    fn override_wins_over_script_capacity() {
        let script = Script::parse("capacity 1\nput a 1\nput b 2\nget a = 1\n").unwrap();
        let report = Replayer::new(Some(2)).run(&script, None).unwrap();
        assert_eq!(report.capacity, 2);
        assert!(report.passed());
    }

    #[test]
    fn missing_or_bad_capacity_is_invalid_configuration() {
        let script = Script::parse("put a 1\n").unwrap();
        assert!(matches!(
            Replayer::new(None).run(&script, None),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(matches!(
            Replayer::new(Some(-1)).run(&script, None),
            Err(Error::InvalidConfiguration(_))
        ));
    }
}
