//! 提交接口路由表
//!
//! 后端没有明确的提交契约，模拟考试需要按顺序尝试多个候选接口

use crate::infrastructure::ApiRequest;
use crate::models::SubmissionPayload;
use reqwest::Method;
use std::fmt;

/// 考试ID的放置位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamIdPlacement {
    /// 替换路径中的 `{examId}`，请求体不带 examId
    Path,
    /// 放在请求体的 `examId` 字段
    Body,
    /// 不携带考试ID
    Omitted,
}

/// 一个候选提交接口
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitRoute {
    pub method: Method,
    pub path: &'static str,
    pub exam_id: ExamIdPlacement,
}

impl SubmitRoute {
    fn new(method: Method, path: &'static str, exam_id: ExamIdPlacement) -> Self {
        Self {
            method,
            path,
            exam_id,
        }
    }

    /// 构建请求
    pub fn build_request(
        &self,
        exam_id: Option<&str>,
        payload: &SubmissionPayload,
    ) -> Result<ApiRequest, serde_json::Error> {
        let (path, body) = match self.exam_id {
            ExamIdPlacement::Path => (
                self.path.replace("{examId}", exam_id.unwrap_or_default()),
                payload.without_exam_id(),
            ),
            ExamIdPlacement::Body => (
                self.path.to_string(),
                SubmissionPayload {
                    exam_id: exam_id.map(str::to_string),
                    ..payload.clone()
                },
            ),
            ExamIdPlacement::Omitted => (self.path.to_string(), payload.without_exam_id()),
        };
        Ok(ApiRequest::new(
            self.method.clone(),
            path,
            serde_json::to_value(body)?,
        ))
    }
}

impl fmt::Display for SubmitRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// 练习提交接口
pub fn practice_route() -> SubmitRoute {
    SubmitRoute::new(Method::POST, "/practice/submit", ExamIdPlacement::Omitted)
}

/// 模拟考试候选接口（按尝试顺序）
pub fn mock_exam_routes() -> Vec<SubmitRoute> {
    vec![
        SubmitRoute::new(Method::POST, "/mock-exams/{examId}/submit", ExamIdPlacement::Path),
        SubmitRoute::new(Method::POST, "/mock-exams/{examId}/attempts", ExamIdPlacement::Path),
        SubmitRoute::new(Method::POST, "/mock-exams/submit", ExamIdPlacement::Body),
        SubmitRoute::new(Method::POST, "/exams/{examId}/submit", ExamIdPlacement::Path),
        SubmitRoute::new(Method::POST, "/exams/submit", ExamIdPlacement::Body),
        SubmitRoute::new(Method::PUT, "/mock-exams/{examId}/answers", ExamIdPlacement::Path),
        SubmitRoute::new(Method::POST, "/attempts", ExamIdPlacement::Body),
    ]
}

/// 单一接口模式：后端根据 `sessionType` 分发
pub fn explicit_route() -> SubmitRoute {
    SubmitRoute::new(Method::POST, "/sessions/submit", ExamIdPlacement::Body)
}
