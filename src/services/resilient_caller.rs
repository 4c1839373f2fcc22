//! 带重试的后端调用 - 业务能力层
//!
//! 只负责"把一次逻辑调用可靠地做完"：
//! - 限流 (429) 和 5xx 按固定策略指数退避重试
//! - 其他错误立即返回
//! - 整理 JSON 响应、抽取检索来源
//!
//! 调用之间不保存任何状态。

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::clients::{BackendRequest, GenerativeBackend};
use crate::error::AppResult;
use crate::services::json_repair::{extract_urls, normalize_json};

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// 首次调用之后最多重试的次数
    pub max_retries: u32,
    /// 第一次重试前的等待时间
    pub base_delay: Duration,
    /// 每次重试等待时间的倍数
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(2000),
            multiplier: 1.5,
        }
    }
}

impl RetryPolicy {
    /// 第 `retry` 次重试（从 0 开始）前的等待时间：2000ms, 3000ms, 4500ms ...
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay
            .mul_f64(self.multiplier.powi(retry as i32))
    }
}

/// 一次调用的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallOutcome {
    pub text: String,
    /// 本次响应中的检索来源（已去重）
    pub urls: Vec<String>,
}

/// 带重试的调用器
#[derive(Clone)]
pub struct ResilientCaller {
    backend: Arc<dyn GenerativeBackend>,
    policy: RetryPolicy,
}

impl ResilientCaller {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self::with_policy(backend, RetryPolicy::default())
    }

    pub fn with_policy(backend: Arc<dyn GenerativeBackend>, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// 发起调用，瞬时错误按策略重试
    ///
    /// 重试用尽后返回最后一次的瞬时错误；非瞬时错误不重试。
    pub async fn call(&self, request: &BackendRequest) -> AppResult<CallOutcome> {
        let mut retry = 0u32;
        loop {
            match self.backend.generate(request).await {
                Ok(response) => {
                    let urls = extract_urls(&response);
                    if !urls.is_empty() {
                        debug!("本次响应包含 {} 个检索来源", urls.len());
                    }
                    return Ok(CallOutcome {
                        text: response.text,
                        urls,
                    });
                }
                Err(e) if e.is_transient() && retry < self.policy.max_retries => {
                    let delay = self.policy.delay_for(retry);
                    retry += 1;
                    warn!(
                        "⚠️ 后端暂时不可用: {}，{}ms 后进行第 {}/{} 次重试",
                        e,
                        delay.as_millis(),
                        retry,
                        self.policy.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if e.is_transient() {
                        warn!("❌ 已重试 {} 次仍失败: {}", retry, e);
                    }
                    return Err(e.into());
                }
            }
        }
    }

    /// 以 JSON 模式调用，并把响应整理为 JSON 对象
    ///
    /// 响应无法解析时得到空对象，而不是错误。
    pub async fn call_json(&self, request: &BackendRequest) -> AppResult<(Value, Vec<String>)> {
        let outcome = self.call(request).await?;
        Ok((normalize_json(&outcome.text), outcome.urls))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{BackendResponse, Citation};
    use crate::error::{AppError, BackendError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// 依次返回预设结果的后端
    struct FlakyBackend {
        script: Mutex<VecDeque<Result<BackendResponse, BackendError>>>,
        calls: Mutex<usize>,
    }

    impl FlakyBackend {
        fn new(script: Vec<Result<BackendResponse, BackendError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl GenerativeBackend for FlakyBackend {
        async fn generate(
            &self,
            _request: &BackendRequest,
        ) -> Result<BackendResponse, BackendError> {
            *self.calls.lock().unwrap() += 1;
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(BackendResponse::text("default")))
        }
    }

    fn rate_limited() -> Result<BackendResponse, BackendError> {
        Err(BackendError::from_status(429, "RESOURCE_EXHAUSTED"))
    }

    #[test]
    fn test_delay_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(3000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_transient_failures_then_success() {
        let backend = FlakyBackend::new(vec![
            rate_limited(),
            Err(BackendError::from_status(503, "overloaded")),
            Ok(BackendResponse::text("ok")),
        ]);
        let caller = ResilientCaller::new(backend.clone());

        let start = tokio::time::Instant::now();
        let outcome = caller.call(&BackendRequest::new("m", "p")).await.unwrap();

        assert_eq!(outcome.text, "ok");
        assert_eq!(backend.calls(), 3);
        // 两次重试：2000ms + 3000ms
        assert_eq!(start.elapsed(), Duration::from_millis(5000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_error_fails_fast() {
        let backend = FlakyBackend::new(vec![Err(BackendError::from_status(400, "bad request"))]);
        let caller = ResilientCaller::new(backend.clone());

        let start = tokio::time::Instant::now();
        let err = caller
            .call(&BackendRequest::new("m", "p"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Backend(BackendError::Rejected { status: 400, .. })
        ));
        assert_eq!(backend.calls(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_surface_last_transient_error() {
        let backend = FlakyBackend::new(vec![
            rate_limited(),
            rate_limited(),
            rate_limited(),
            Err(BackendError::from_status(500, "last")),
        ]);
        let caller = ResilientCaller::new(backend.clone());

        let start = tokio::time::Instant::now();
        let err = caller
            .call(&BackendRequest::new("m", "p"))
            .await
            .unwrap_err();

        assert!(err.is_transient());
        assert!(err.to_string().contains("last"));
        assert_eq!(backend.calls(), 4);
        assert_eq!(start.elapsed(), Duration::from_millis(2000 + 3000 + 4500));
    }

    #[tokio::test]
    async fn test_call_json_tolerates_garbage() {
        let backend = FlakyBackend::new(vec![Ok(BackendResponse {
            text: "not json at all".to_string(),
            citations: vec![Citation {
                uri: Some("https://a".into()),
                title: None,
            }],
        })]);
        let caller = ResilientCaller::new(backend);

        let (value, urls) = caller
            .call_json(&BackendRequest::new("m", "p").json())
            .await
            .unwrap();
        assert_eq!(value, json!({}));
        assert_eq!(urls, vec!["https://a"]);
    }
}
