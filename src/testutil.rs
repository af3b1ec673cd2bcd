//! 测试辅助：按脚本返回响应的内存传输层
//!
//! 不访问网络；未登记的接口返回 404

use crate::error::ApiError;
use crate::infrastructure::{ApiRequest, Transport};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value as JsonValue;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Scripted {
    Body(JsonValue),
    Status(u16),
}

/// 脚本化传输层
///
/// 每个 (method, path) 维护一个响应队列；队列只剩最后一个响应时重复返回它
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Scripted>>>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个成功响应
    pub fn respond(self, method: Method, path: &str, body: JsonValue) -> Self {
        self.push(method, path, Scripted::Body(body));
        self
    }

    /// 登记一个失败状态码
    pub fn fail(self, method: Method, path: &str, status: u16) -> Self {
        self.push(method, path, Scripted::Status(status));
        self
    }

    fn push(&self, method: Method, path: &str, response: Scripted) {
        if let Ok(mut routes) = self.routes.lock() {
            routes
                .entry((method, path.to_string()))
                .or_default()
                .push_back(response);
        }
    }

    /// 已发出的全部请求
    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// 已发出请求的 "METHOD path" 列表
    pub fn call_log(&self) -> Vec<String> {
        self.calls().iter().map(ApiRequest::endpoint).collect()
    }

    fn next_response(&self, request: &ApiRequest) -> Option<Scripted> {
        let mut routes = self.routes.lock().ok()?;
        let queue = routes.get_mut(&(request.method.clone(), request.path.clone()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<JsonValue, ApiError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }
        let endpoint = request.endpoint();
        match self.next_response(&request) {
            Some(Scripted::Body(body)) => {
                crate::infrastructure::http_executor::check_envelope(&endpoint, &body)?;
                Ok(body)
            }
            Some(Scripted::Status(status)) => Err(ApiError::BadStatus {
                endpoint,
                status,
                body: String::new(),
            }),
            None => Err(ApiError::BadStatus {
                endpoint,
                status: 404,
                body: "not scripted".to_string(),
            }),
        }
    }
}
