//! Speech synthesis policy: bounded retry on quota exhaustion and inter-segment throttling.
//!
//! Time is injected through [`Sleeper`] so the backoff schedule can be observed in tests.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use tracing::{info, warn};

use crate::config::NarrationConfig;
use crate::foundation::error::{RecapError, RecapResult};
use crate::providers::{AudioBuffer, NarrationSynthesizer};

/// Blocks the current thread.
pub trait Sleeper {
    /// Sleep for `d`.
    fn sleep(&self, d: Duration);
}

/// [`Sleeper`] backed by [`std::thread::sleep`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, d: Duration) {
        std::thread::sleep(d);
    }
}

/// Spacing applied between consecutive synthesis calls.
pub trait RateLimiter {
    /// Called by the orchestrator after each segment.
    fn pause(&self, sleeper: &dyn Sleeper);
}

/// Waits a fixed delay on every [`RateLimiter::pause`].
#[derive(Clone, Copy, Debug)]
pub struct FixedDelay(pub Duration);

impl RateLimiter for FixedDelay {
    fn pause(&self, sleeper: &dyn Sleeper) {
        if !self.0.is_zero() {
            sleeper.sleep(self.0);
        }
    }
}

/// Never waits.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unthrottled;

impl RateLimiter for Unthrottled {
    fn pause(&self, _sleeper: &dyn Sleeper) {}
}

/// Linear backoff retry, applied to quota exhaustion only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first one included.
    pub max_attempts: u32,
    /// Backoff before retry `k` (1-based) is `k * step`.
    pub step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            step: Duration::from_secs(10),
        }
    }
}

impl From<&NarrationConfig> for RetryPolicy {
    fn from(cfg: &NarrationConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            step: cfg.backoff_step(),
        }
    }
}

impl RetryPolicy {
    /// Delay before the `retry`-th retry (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        self.step * retry
    }

    /// Run `op` until it succeeds, fails with a non-quota error, or the budget runs out.
    pub fn run<T>(
        &self,
        sleeper: &dyn Sleeper,
        mut op: impl FnMut() -> RecapResult<T>,
    ) -> RecapResult<T> {
        let attempts = self.max_attempts.max(1);
        for attempt in 1..=attempts {
            match op() {
                Ok(v) => return Ok(v),
                Err(e) if e.is_quota_exhausted() => {
                    if attempt == attempts {
                        break;
                    }
                    let wait = self.backoff(attempt);
                    warn!(attempt, wait_secs = wait.as_secs_f64(), error = %e, "quota exhausted, retrying");
                    sleeper.sleep(wait);
                }
                Err(e) => return Err(e),
            }
        }
        Err(RecapError::quota(format!("failed after {attempts} attempts")))
    }
}

/// Synthesizes one script to a file, retrying on quota exhaustion.
pub struct Narrator<'a> {
    synth: &'a dyn NarrationSynthesizer,
    retry: RetryPolicy,
    sleeper: &'a dyn Sleeper,
}

impl<'a> Narrator<'a> {
    /// Bind a synthesizer to a retry policy and clock.
    pub fn new(
        synth: &'a dyn NarrationSynthesizer,
        retry: RetryPolicy,
        sleeper: &'a dyn Sleeper,
    ) -> Self {
        Self {
            synth,
            retry,
            sleeper,
        }
    }

    /// Synthesize `script` and write it to `out_path`, wrapped in WAV when needed.
    #[tracing::instrument(skip(self, script, style))]
    pub fn narrate(&self, script: &str, style: &str, out_path: &Path) -> RecapResult<PathBuf> {
        let audio: AudioBuffer = self
            .retry
            .run(self.sleeper, || self.synth.synthesize(script, style))?;
        let bytes = audio.into_file_bytes(out_path)?;
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create audio directory '{}'", parent.display()))?;
        }
        std::fs::write(out_path, &bytes)
            .with_context(|| format!("write narration '{}'", out_path.display()))?;
        info!(path = %out_path.display(), bytes = bytes.len(), "narration saved");
        Ok(out_path.to_path_buf())
    }
}

#[cfg(test)]
#[path = "../tests/unit/narration.rs"]
mod tests;
