//! One model call with a bounded, rate-limit-aware retry.
//!
//! Every remote call of the run (OCR, paragraph detection, translation) goes
//! through [`generate_with_retry`], so all of them share one failure policy:
//!
//! * rate limits (429) and per-call timeouts are retried up to
//!   `max_retries` times, sleeping a fixed `retry_delay_ms` between attempts
//!   (or the server's `Retry-After`, when it sends one, capped at the
//!   per-call timeout);
//! * any other error is returned at once;
//! * a call still rate-limited after the last retry fails the run.

use crate::config::TranslationConfig;
use crate::error::{ModelError, TranslateError};
use crate::model::{GenerateRequest, Generation, GenerativeModel};
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Retry knobs copied out of [`TranslationConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay_ms: u64,
    pub timeout_secs: u64,
}

impl RetryPolicy {
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            delay_ms: config.retry_delay_ms,
            timeout_secs: config.api_timeout_secs,
        }
    }
}

/// A successful call and how many retries it took.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub generation: Generation,
    pub retries: u32,
}

/// Send `request`, retrying rate limits and timeouts per `policy`.
///
/// `context` names the call in logs and errors, e.g. `"OCR of page 3"`.
pub async fn generate_with_retry(
    model: &dyn GenerativeModel,
    request: &GenerateRequest,
    policy: &RetryPolicy,
    context: &str,
) -> Result<CallOutcome, TranslateError> {
    let mut attempt: u32 = 0;
    loop {
        let result = match timeout(
            Duration::from_secs(policy.timeout_secs),
            model.generate(request),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ModelError::Timeout {
                secs: policy.timeout_secs,
            }),
        };

        let err = match result {
            Ok(generation) => {
                debug!(
                    "{}: {} chars back from {}:{} after {} retries",
                    context,
                    generation.text.len(),
                    model.provider(),
                    model.model(),
                    attempt
                );
                return Ok(CallOutcome {
                    generation,
                    retries: attempt,
                });
            }
            Err(e) => e,
        };

        if !err.is_retryable() {
            return Err(TranslateError::Model {
                context: context.to_string(),
                source: err,
            });
        }

        if attempt >= policy.max_retries {
            return Err(match err {
                ModelError::Timeout { .. } => TranslateError::Timeout {
                    context: context.to_string(),
                    attempts: attempt + 1,
                    secs: policy.timeout_secs,
                },
                _ => TranslateError::RateLimitExceeded {
                    context: context.to_string(),
                    attempts: attempt + 1,
                },
            });
        }

        let delay_ms = match err {
            ModelError::RateLimited {
                retry_after_secs: Some(secs),
            } => secs
                .saturating_mul(1000)
                .min(policy.timeout_secs.saturating_mul(1000)),
            _ => policy.delay_ms,
        };
        attempt += 1;
        warn!(
            "{}: {}; retry {}/{} in {}ms",
            context, err, attempt, policy.max_retries, delay_ms
        );
        sleep(Duration::from_millis(delay_ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Part;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays a fixed script of results, one per call.
    struct Scripted {
        script: Mutex<VecDeque<Result<Generation, ModelError>>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(script: Vec<Result<Generation, ModelError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl GenerativeModel for Scripted {
        fn provider(&self) -> &str {
            "scripted"
        }
        fn model(&self) -> &str {
            "test"
        }
        async fn generate(&self, _request: &GenerateRequest) -> Result<Generation, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Generation::text("unscripted")))
        }
    }

    /// Never answers.
    struct Hangs;

    #[async_trait]
    impl GenerativeModel for Hangs {
        fn provider(&self) -> &str {
            "hangs"
        }
        fn model(&self) -> &str {
            "test"
        }
        async fn generate(&self, _request: &GenerateRequest) -> Result<Generation, ModelError> {
            std::future::pending().await
        }
    }

    fn request() -> GenerateRequest {
        GenerateRequest::new(vec![Part::text("hello")], 0.0, 16)
    }

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            delay_ms: 5000,
            timeout_secs: 30,
        }
    }

    fn rate_limited() -> Result<Generation, ModelError> {
        Err(ModelError::RateLimited {
            retry_after_secs: None,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_rate_limit() {
        let model = Scripted::new(vec![rate_limited(), Ok(Generation::text("done"))]);
        let start = tokio::time::Instant::now();
        let out = generate_with_retry(&model, &request(), &policy(2), "OCR of page 1")
            .await
            .unwrap();
        assert_eq!(out.generation.text, "done");
        assert_eq!(out.retries, 1);
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
        assert!(start.elapsed() >= Duration::from_millis(5000));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let model = Scripted::new(vec![rate_limited(), rate_limited(), rate_limited()]);
        let err = generate_with_retry(&model, &request(), &policy(2), "translation of chunk 1")
            .await
            .unwrap_err();
        match err {
            TranslateError::RateLimitExceeded { context, attempts } => {
                assert_eq!(context, "translation of chunk 1");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected RateLimitExceeded, got {other:?}"),
        }
        assert_eq!(model.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn honours_retry_after_hint() {
        let model = Scripted::new(vec![
            Err(ModelError::RateLimited {
                retry_after_secs: Some(20),
            }),
            Ok(Generation::text("ok")),
        ]);
        let start = tokio::time::Instant::now();
        generate_with_retry(&model, &request(), &policy(1), "x")
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn huge_retry_after_is_capped_at_the_call_timeout() {
        let model = Scripted::new(vec![
            Err(ModelError::RateLimited {
                retry_after_secs: Some(u64::MAX),
            }),
            Ok(Generation::text("ok")),
        ]);
        let start = tokio::time::Instant::now();
        let out = generate_with_retry(&model, &request(), &policy(1), "x")
            .await
            .unwrap();
        assert_eq!(out.retries, 1);
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(30), "{waited:?}");
        assert!(waited < Duration::from_secs(31), "{waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_propagates_immediately() {
        let model = Scripted::new(vec![Err(ModelError::Auth {
            detail: "API key not valid".into(),
        })]);
        let err = generate_with_retry(&model, &request(), &policy(5), "OCR of page 2")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TranslateError::Model {
                source: ModelError::Auth { .. },
                ..
            }
        ));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_means_single_attempt() {
        let model = Scripted::new(vec![rate_limited(), Ok(Generation::text("late"))]);
        let err = generate_with_retry(&model, &request(), &policy(0), "x")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TranslateError::RateLimitExceeded { attempts: 1, .. }
        ));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_call_times_out() {
        let err = generate_with_retry(&Hangs, &request(), &policy(1), "OCR of page 9")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TranslateError::Timeout {
                attempts: 2,
                secs: 30,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn provider_side_timeout_reports_the_call_timeout() {
        let model = Scripted::new(vec![
            Err(ModelError::Timeout { secs: 0 }),
            Err(ModelError::Timeout { secs: 0 }),
        ]);
        let err = generate_with_retry(&model, &request(), &policy(1), "x")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TranslateError::Timeout {
                attempts: 2,
                secs: 30,
                ..
            }
        ));
    }
}
