//! 传输抽象 - 基础设施层
//!
//! 上层只认识 `ApiRequest` 和 JSON 响应，不关心底层是 HTTP 还是测试桩

use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value as JsonValue;
use std::fmt;

/// 一次后端调用
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// 相对于 base_url 的路径，以 `/` 开头
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<JsonValue>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn new(method: Method, path: impl Into<String>, body: JsonValue) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// 用于日志和错误信息的接口描述
    pub fn endpoint(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.endpoint())
    }
}

/// 传输能力
///
/// 职责：
/// - 发送一次请求并返回 JSON
/// - 不认识 Question / Session
/// - 不处理业务流程和接口回退
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<JsonValue, ApiError>;
}
