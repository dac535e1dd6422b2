//! Retry logic for idempotent RPC requests.
//!
//! Reads (chain id, receipts, estimates, ...) are retried with exponential backoff on
//! transient failures. Broadcasting a transaction never goes through here.

use std::time::Duration;

use alloy::{
    rpc::json_rpc::ErrorPayload,
    transports::{RpcError, TransportErrorKind},
};
use backoff::{backoff::Backoff, exponential::ExponentialBackoffBuilder, ExponentialBackoff};
use serde::Deserialize;
use serde_json::value::RawValue;
use tracing::warn;

use super::config::RPCRetryConfig;

/// Extension trait to implement retry logic for [`RpcError<TransportErrorKind>`].
///
/// # Attribution
/// Adapted from alloy-transport:
/// https://github.com/alloy-rs/alloy/blob/a3899575fbc0c789275f95661516b99e9a92838d/crates/transport/src/error.rs#L156
/// License: MIT OR Apache-2.0
pub(crate) trait RpcErrorExt {
    /// Returns `true` for transient errors: rate limits, unavailable backends, missing or
    /// null responses and retryable JSON-RPC error codes.
    fn is_retryable(&self) -> bool;

    /// Backoff suggested by the provider under `data.rate.backoff_seconds`, if any.
    fn backoff_hint(&self) -> Option<Duration>;

    /// Classifies the error for [`backoff::future::retry`].
    fn classify_error(self) -> backoff::Error<Self>
    where
        Self: Sized;
}

impl<E: std::borrow::Borrow<RawValue>> RpcErrorExt for RpcError<TransportErrorKind, E> {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(err) => err.is_retry_err(),
            Self::SerError(_) => false,
            Self::DeserError { text, .. } => {
                if let Ok(resp) = serde_json::from_str::<ErrorPayload>(text) {
                    return resp.is_retry_err();
                }

                // some providers answer errors without a proper JSON-RPC envelope
                #[derive(Deserialize)]
                struct Resp {
                    error: ErrorPayload,
                }

                serde_json::from_str::<Resp>(text)
                    .map(|resp| resp.error.is_retry_err())
                    .unwrap_or(false)
            }
            Self::ErrorResp(err) => err.is_retry_err(),
            Self::NullResp => true,
            _ => false,
        }
    }

    fn backoff_hint(&self) -> Option<Duration> {
        let Self::ErrorResp(resp) = self else {
            return None;
        };
        let Some(Ok(data)) = resp.try_data_as::<serde_json::Value>() else {
            return None;
        };
        let backoff_seconds = &data["rate"]["backoff_seconds"];
        if let Some(seconds) = backoff_seconds.as_u64() {
            return Some(Duration::from_secs(seconds));
        }
        backoff_seconds
            .as_f64()
            .map(|seconds| Duration::from_secs(seconds.ceil() as u64))
    }

    fn classify_error(self) -> backoff::Error<Self> {
        if !self.is_retryable() {
            return backoff::Error::permanent(self);
        }
        match self.backoff_hint() {
            Some(hint) => backoff::Error::retry_after(self, hint),
            None => backoff::Error::transient(self),
        }
    }
}

/// Exponential backoff that gives up after a fixed number of retries.
#[derive(Clone, Debug)]
pub(crate) struct BoundedBackoff {
    inner: ExponentialBackoff,
    max_retries: usize,
    retries: usize,
}

impl Backoff for BoundedBackoff {
    fn next_backoff(&mut self) -> Option<Duration> {
        if self.retries >= self.max_retries {
            return None;
        }
        self.retries += 1;
        self.inner.next_backoff()
    }

    fn reset(&mut self) {
        self.retries = 0;
        self.inner.reset();
    }
}

/// Retry policy built from an [`RPCRetryConfig`].
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    backoff: BoundedBackoff,
    config: RPCRetryConfig,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RPCRetryConfig::default().into()
    }
}

impl From<RPCRetryConfig> for RetryPolicy {
    fn from(config: RPCRetryConfig) -> Self {
        let inner = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(config.initial_backoff_ms))
            .with_multiplier(2.0)
            .with_max_interval(Duration::from_millis(config.max_backoff_ms))
            .with_max_elapsed_time(None)
            .build();
        let backoff = BoundedBackoff { inner, max_retries: config.max_retries, retries: 0 };
        Self { backoff, config }
    }
}

impl From<&RetryPolicy> for RPCRetryConfig {
    fn from(policy: &RetryPolicy) -> Self {
        policy.config.clone()
    }
}

impl RetryPolicy {
    /// Runs `operation`, retrying transient failures up to `max_retries` times. Permanent
    /// failures are returned immediately.
    pub(crate) async fn retry_request<F, Fut, T>(
        &self,
        mut operation: F,
    ) -> Result<T, RpcError<TransportErrorKind>>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, RpcError<TransportErrorKind>>>,
    {
        backoff::future::retry_notify(
            self.backoff.clone(),
            || {
                let fut = operation();
                async move { fut.await.map_err(RpcError::classify_error) }
            },
            |err, wait: Duration| warn!(error = %err, ?wait, "Retrying RPC request"),
        )
        .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use alloy::transports::HttpError;
    use rstest::rstest;
    use serde::de::Error;

    use super::*;

    #[test]
    fn test_policy_from_config() {
        let config = RPCRetryConfig::new(2, 50, 80);
        let policy = RetryPolicy::from(config.clone());

        assert_eq!(policy.backoff.inner.initial_interval, Duration::from_millis(50));
        assert_eq!(policy.backoff.inner.max_interval, Duration::from_millis(80));
        assert_eq!(policy.backoff.inner.max_elapsed_time, None);
        assert_eq!(RPCRetryConfig::from(&policy), config);
    }

    #[test]
    fn test_bounded_backoff_stops_after_max_retries() {
        let mut backoff = RetryPolicy::from(RPCRetryConfig::new(2, 1, 5)).backoff;

        assert!(backoff.next_backoff().is_some());
        assert!(backoff.next_backoff().is_some());
        assert_eq!(backoff.next_backoff(), None);

        backoff.reset();
        assert!(backoff.next_backoff().is_some());
    }

    #[rstest]
    #[case::rate_limited(429)]
    #[case::unavailable(503)]
    fn test_http_errors_are_retryable(#[case] status: u16) {
        let err = RpcError::<TransportErrorKind>::Transport(TransportErrorKind::HttpError(
            HttpError { status, body: "".to_string() },
        ));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_permanent_errors() {
        let ser_err =
            RpcError::<TransportErrorKind>::SerError(serde_json::Error::custom("test error"));
        assert!(!ser_err.is_retryable());

        let revert = RpcError::<TransportErrorKind>::ErrorResp(ErrorPayload {
            code: 3,
            message: "execution reverted".into(),
            data: None,
        });
        assert!(!revert.is_retryable());
    }

    #[rstest]
    #[case::integer(10_f64, Duration::from_secs(10))]
    #[case::float(5.7, Duration::from_secs(6))]
    fn test_backoff_hint_extraction(#[case] backoff_value: f64, #[case] duration: Duration) {
        let data = serde_json::value::to_raw_value(&serde_json::json!({
            "rate": { "backoff_seconds": backoff_value }
        }))
        .unwrap();
        let err = RpcError::<TransportErrorKind>::ErrorResp(ErrorPayload {
            code: -32005,
            message: "Rate limited".into(),
            data: Some(data),
        });

        assert_eq!(err.backoff_hint(), Some(duration));
    }

    #[tokio::test]
    async fn test_retry_request_stops_on_permanent_error() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let policy = RetryPolicy::from(RPCRetryConfig::new(3, 1, 5));

        let result: Result<u64, _> = policy
            .retry_request(|| {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(RpcError::SerError(serde_json::Error::custom("bad params")))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_request_gives_up_after_max_retries() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let policy = RetryPolicy::from(RPCRetryConfig::new(2, 1, 5));

        let result: Result<u64, _> = policy
            .retry_request(|| {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(RpcError::NullResp)
                }
            })
            .await;

        assert!(matches!(result, Err(RpcError::NullResp)));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_request_recovers_from_transient_error() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let policy = RetryPolicy::from(RPCRetryConfig::new(3, 1, 5));

        let result = policy
            .retry_request(|| {
                let attempts = attempts.clone();
                async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(RpcError::NullResp)
                    } else {
                        Ok(7u64)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
