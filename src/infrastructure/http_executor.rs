//! HTTP 执行器 - 基础设施层
//!
//! 持有唯一的 reqwest::Client，只暴露"发送请求"的能力

use crate::config::Config;
use crate::error::ApiError;
use crate::infrastructure::transport::{ApiRequest, Transport};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value as JsonValue;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// 限流时后端使用的业务码
const RATE_LIMIT_CODE: i64 = 600;

/// 限流后的基础等待时间
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(2);

/// HTTP 执行器
///
/// 职责：
/// - 持有唯一的 HTTP Client、base_url 和 token
/// - 处理限流重试和响应信封检查
/// - 不认识 Question / Session
pub struct HttpExecutor {
    client: Client,
    base_url: String,
    token: Option<String>,
    max_retries: usize,
}

impl HttpExecutor {
    /// 创建新的 HTTP 执行器
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|source| ApiError::RequestFailed {
                endpoint: config.api_base_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
            max_retries: config.max_retries.max(1),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send_once(&self, request: &ApiRequest) -> Result<(StatusCode, JsonValue), ApiError> {
        let endpoint = request.endpoint();
        let mut builder = self
            .client
            .request(request.method.clone(), self.url(&request.path))
            .header("Accept", "application/json, text/plain, */*");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|source| ApiError::RequestFailed {
                endpoint: endpoint.clone(),
                source,
            })?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| ApiError::RequestFailed {
                endpoint: endpoint.clone(),
                source,
            })?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok((status, JsonValue::Null));
        }
        if !status.is_success() {
            return Err(ApiError::BadStatus {
                endpoint,
                status: status.as_u16(),
                body: crate::utils::truncate_text(&text, 200),
            });
        }
        if text.trim().is_empty() {
            return Ok((status, JsonValue::Null));
        }

        let json = serde_json::from_str(&text)
            .map_err(|source| ApiError::JsonParseFailed { endpoint, source })?;
        Ok((status, json))
    }
}

#[async_trait]
impl Transport for HttpExecutor {
    async fn send(&self, request: ApiRequest) -> Result<JsonValue, ApiError> {
        let endpoint = request.endpoint();
        debug!("请求 {} query={:?}", endpoint, request.query);

        let request = &request;
        let body = retry_rate_limited(&endpoint, self.max_retries, move || {
            self.send_once(request)
        })
        .await?;
        debug!("响应 {}: {}", endpoint, crate::utils::truncate_text(&body.to_string(), 300));
        Ok(body)
    }
}

/// 限流重试：HTTP 429 或业务码 600 时按 2s × 次数 等待后重试
///
/// 最后一次仍被限流时直接返回 `RateLimited`，不再等待
async fn retry_rate_limited<F, Fut>(
    endpoint: &str,
    max_retries: usize,
    mut send_once: F,
) -> Result<JsonValue, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(StatusCode, JsonValue), ApiError>>,
{
    let max_retries = max_retries.max(1);
    for attempt in 1..=max_retries {
        let (status, body) = send_once().await?;

        if status == StatusCode::TOO_MANY_REQUESTS || is_rate_limited(&body) {
            if attempt == max_retries {
                break;
            }
            warn!(
                "API 请求频繁限制 {} (尝试 {}/{}), 等待后重试...",
                endpoint, attempt, max_retries
            );
            sleep(RATE_LIMIT_BACKOFF * attempt as u32).await;
            continue;
        }

        check_envelope(endpoint, &body)?;
        return Ok(body);
    }

    warn!("API 请求频繁限制 {}，已重试 {} 次", endpoint, max_retries);
    Err(ApiError::RateLimited {
        endpoint: endpoint.to_string(),
        attempts: max_retries,
    })
}

/// 检查是否被限流
fn is_rate_limited(body: &JsonValue) -> bool {
    body.get("code").and_then(|v| v.as_i64()) == Some(RATE_LIMIT_CODE)
}

/// 检查响应信封：`code` 不在 {0, 200} 或 `success: false` 视为失败
pub fn check_envelope(endpoint: &str, body: &JsonValue) -> Result<(), ApiError> {
    let code = body.get("code").and_then(|v| v.as_i64());
    let success = body.get("success").and_then(|v| v.as_bool());
    let failed = matches!(code, Some(c) if c != 0 && c != 200) || success == Some(false);

    if failed {
        return Err(ApiError::BadResponse {
            endpoint: endpoint.to_string(),
            code,
            message: body
                .get("message")
                .or_else(|| body.get("msg"))
                .and_then(|v| v.as_str())
                .map(str::to_string),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    /// 前 `limited` 次返回限流响应，之后返回成功
    fn scripted_send(
        calls: &AtomicUsize,
        limited: usize,
        status: StatusCode,
    ) -> impl FnMut() -> std::future::Ready<Result<(StatusCode, JsonValue), ApiError>> + '_ {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            let response = if n < limited {
                if status == StatusCode::TOO_MANY_REQUESTS {
                    (status, JsonValue::Null)
                } else {
                    (status, json!({"code": 600, "message": "too fast"}))
                }
            } else {
                (StatusCode::OK, json!({"code": 200, "data": [n]}))
            };
            std::future::ready(Ok(response))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_code_is_retried_with_backoff() {
        let calls = AtomicUsize::new(0);
        let started = Instant::now();

        let body = retry_rate_limited("GET /x", 3, scripted_send(&calls, 2, StatusCode::OK))
            .await
            .unwrap();

        assert_eq!(body["data"][0], 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 2s + 4s
        assert_eq!(started.elapsed().as_secs(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_http_429_exhausts_without_final_wait() {
        let calls = AtomicUsize::new(0);
        let started = Instant::now();

        let err = retry_rate_limited(
            "GET /x",
            3,
            scripted_send(&calls, usize::MAX, StatusCode::TOO_MANY_REQUESTS),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::RateLimited { attempts: 3, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed().as_secs(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_failures_are_not_retried() {
        let calls = AtomicUsize::new(0);
        let err = retry_rate_limited("POST /y", 3, || {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok((StatusCode::OK, json!({"code": 500}))))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::BadResponse { code: Some(500), .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_envelope_accepts_plain_and_ok_bodies() {
        assert!(check_envelope("GET /x", &json!([1, 2])).is_ok());
        assert!(check_envelope("GET /x", &json!({"code": 200, "data": []})).is_ok());
        assert!(check_envelope("GET /x", &json!({"code": 0})).is_ok());
    }

    #[test]
    fn test_envelope_rejects_error_codes() {
        let err = check_envelope("POST /y", &json!({"code": 500, "message": "bad"})).unwrap_err();
        assert!(matches!(err, ApiError::BadResponse { code: Some(500), .. }));

        let err = check_envelope("POST /y", &json!({"success": false, "msg": "nope"})).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_rate_limit_code() {
        assert!(is_rate_limited(&json!({"code": 600})));
        assert!(!is_rate_limited(&json!({"code": 200})));
    }

    #[test]
    fn test_url_join_trims_slashes() {
        let config = Config {
            api_base_url: "https://exams.example.com/api/".to_string(),
            ..Config::default()
        };
        let executor = HttpExecutor::new(&config).unwrap();
        assert_eq!(
            executor.url("/mock-exams/3/submit"),
            "https://exams.example.com/api/mock-exams/3/submit"
        );
    }
}
