/// 考试 API 客户端
///
/// 封装所有与后端考试接口相关的调用逻辑，并把多种响应形状统一为模型类型
use crate::clients::submit_routes::SubmitRoute;
use crate::config::{Config, Pagination};
use crate::error::ApiError;
use crate::infrastructure::{ApiRequest, Transport};
use crate::models::{MockExam, Question, SessionKind, SubmissionPayload, TopicEntry};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// 分页读取的页数上限
const MAX_PAGES: usize = 200;

/// 列表可能所在的字段
const LIST_KEYS: &[&str] = &["items", "list", "records", "questions", "results"];

/// 考试 API 客户端
#[derive(Clone)]
pub struct ExamClient {
    transport: Arc<dyn Transport>,
    page_size: usize,
    pagination: Pagination,
}

impl ExamClient {
    /// 创建新的考试客户端
    pub fn new(transport: Arc<dyn Transport>, config: &Config) -> Self {
        Self {
            transport,
            page_size: config.page_size.max(1),
            pagination: config.pagination,
        }
    }

    /// 获取知识点列表
    pub async fn list_topics(&self) -> Result<Vec<TopicEntry>, ApiError> {
        let request = ApiRequest::get("/topics");
        let body = self.transport.send(request.clone()).await?;
        parse_list(&request.endpoint(), &body)
    }

    /// 获取模拟考试列表
    pub async fn list_mock_exams(&self) -> Result<Vec<MockExam>, ApiError> {
        let request = ApiRequest::get("/mock-exams");
        let body = self.transport.send(request.clone()).await?;
        parse_list(&request.endpoint(), &body)
    }

    /// 按会话类型获取题目列表（分页读取直到结束）
    pub async fn questions_for(&self, kind: &SessionKind) -> Result<Vec<Question>, ApiError> {
        let request = match kind {
            SessionKind::Practice { topic_id } => {
                ApiRequest::get("/questions").query("topicId", topic_id)
            }
            SessionKind::MockExam { exam_id } => {
                ApiRequest::get(format!("/mock-exams/{}/questions", exam_id))
            }
        };
        self.fetch_all_pages(request).await
    }

    /// 批量选项来源（按尝试顺序）
    pub fn batch_option_sources(kind: &SessionKind) -> Vec<ApiRequest> {
        match kind {
            SessionKind::Practice { topic_id } => vec![ApiRequest::get("/questions")
                .query("topicId", topic_id)
                .query("includeOptions", true)],
            SessionKind::MockExam { exam_id } => vec![
                ApiRequest::get(format!("/mock-exams/{}/questions", exam_id))
                    .query("includeOptions", true),
                ApiRequest::get(format!("/mock-exams/{}", exam_id)),
            ],
        }
    }

    /// 从一个批量来源读取带选项的题目
    pub async fn fetch_question_batch(
        &self,
        request: ApiRequest,
    ) -> Result<Vec<Question>, ApiError> {
        let endpoint = request.endpoint();
        let body = self.transport.send(request).await?;
        parse_list(&endpoint, &body)
    }

    /// 获取单题详情
    pub async fn question_detail(&self, question_id: &str) -> Result<Question, ApiError> {
        let request = ApiRequest::get(format!("/questions/{}", question_id));
        let endpoint = request.endpoint();
        let body = self.transport.send(request).await?;
        parse_object(&endpoint, &body)
    }

    /// 通过指定接口提交答案，返回原始响应
    pub async fn submit(
        &self,
        route: &SubmitRoute,
        exam_id: Option<&str>,
        payload: &SubmissionPayload,
    ) -> Result<JsonValue, ApiError> {
        let request =
            route
                .build_request(exam_id, payload)
                .map_err(|source| ApiError::JsonParseFailed {
                    endpoint: route.to_string(),
                    source,
                })?;
        debug!("提交 Payload ({}): {:?}", route, request.body);
        self.transport.send(request).await
    }

    /// 写入活动日志
    pub async fn post_activity(&self, entry: &JsonValue) -> Result<(), ApiError> {
        let request = ApiRequest::new(Method::POST, "/activity-logs", entry.clone());
        self.transport.send(request).await.map(|_| ())
    }

    /// 分页读取：某页条数不足、为空或没有新题目时停止
    ///
    /// 后端忽略分页参数时每页都返回完整列表，重复的题目按ID跳过
    async fn fetch_all_pages(&self, base: ApiRequest) -> Result<Vec<Question>, ApiError> {
        let mut all = Vec::new();
        let mut seen = HashSet::new();

        for page_index in 0..MAX_PAGES {
            let request = match self.pagination {
                Pagination::Page => base
                    .clone()
                    .query("page", page_index + 1)
                    .query("pageSize", self.page_size),
                Pagination::Offset => base
                    .clone()
                    .query("offset", page_index * self.page_size)
                    .query("limit", self.page_size),
            };
            let endpoint = request.endpoint();
            let body = self.transport.send(request).await?;
            let page: Vec<Question> = parse_list(&endpoint, &body)?;
            let count = page.len();

            let before = all.len();
            all.extend(page.into_iter().filter(|q| seen.insert(q.id.clone())));
            let fresh = all.len() - before;
            debug!(
                "{} 第 {} 页: {} 条 (新增 {})",
                endpoint,
                page_index + 1,
                count,
                fresh
            );

            if count < self.page_size {
                break;
            }
            if fresh == 0 {
                warn!("{} 第 {} 页没有新题目，停止翻页", endpoint, page_index + 1);
                break;
            }
        }

        Ok(all)
    }
}

/// 从响应中找到列表：根数组、`data`、`data.items` 等
pub fn extract_list(body: &JsonValue) -> Option<&Vec<JsonValue>> {
    if let Some(array) = body.as_array() {
        return Some(array);
    }
    let object = body.as_object()?;
    if let Some(data) = object.get("data") {
        if let Some(array) = data.as_array() {
            return Some(array);
        }
        if let Some(found) = LIST_KEYS.iter().find_map(|k| data.get(*k)?.as_array()) {
            return Some(found);
        }
    }
    LIST_KEYS.iter().find_map(|k| object.get(*k)?.as_array())
}

/// 从响应中取出对象：存在 `data` 对象时取 `data`
pub fn extract_object(body: &JsonValue) -> &JsonValue {
    match body.get("data") {
        Some(data) if data.is_object() => data,
        _ => body,
    }
}

/// 解析列表，单条解析失败时跳过并记录警告
fn parse_list<T: DeserializeOwned>(endpoint: &str, body: &JsonValue) -> Result<Vec<T>, ApiError> {
    let items = extract_list(body).ok_or_else(|| ApiError::EmptyResponse {
        endpoint: endpoint.to_string(),
    })?;

    let mut parsed = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value(item.clone()) {
            Ok(value) => parsed.push(value),
            Err(e) => warn!("跳过无法解析的条目 ({}): {}", endpoint, e),
        }
    }
    Ok(parsed)
}

fn parse_object<T: DeserializeOwned>(endpoint: &str, body: &JsonValue) -> Result<T, ApiError> {
    if body.is_null() {
        return Err(ApiError::EmptyResponse {
            endpoint: endpoint.to_string(),
        });
    }
    serde_json::from_value(extract_object(body).clone()).map_err(|source| {
        ApiError::JsonParseFailed {
            endpoint: endpoint.to_string(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::ScriptedTransport;
    use serde_json::json;

    fn client(transport: Arc<ScriptedTransport>, pagination: Pagination) -> ExamClient {
        let config = Config {
            page_size: 2,
            pagination,
            ..Config::default()
        };
        ExamClient::new(transport, &config)
    }

    fn exam() -> SessionKind {
        SessionKind::MockExam {
            exam_id: "e1".to_string(),
        }
    }

    fn page(ids: &[i64]) -> JsonValue {
        let items: Vec<JsonValue> = ids
            .iter()
            .map(|id| json!({"id": id, "text": format!("q{}", id)}))
            .collect();
        json!({"data": items})
    }

    fn query(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_offset_pages_are_joined_until_short_page() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(Method::GET, "/mock-exams/e1/questions", page(&[1, 2]))
                .respond(Method::GET, "/mock-exams/e1/questions", page(&[3, 4]))
                .respond(Method::GET, "/mock-exams/e1/questions", page(&[5])),
        );
        let questions = client(transport.clone(), Pagination::Offset)
            .questions_for(&exam())
            .await
            .unwrap();

        let ids: Vec<&str> = questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);

        let calls = transport.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].query, query(&[("offset", "0"), ("limit", "2")]));
        assert_eq!(calls[1].query, query(&[("offset", "2"), ("limit", "2")]));
        assert_eq!(calls[2].query, query(&[("offset", "4"), ("limit", "2")]));
    }

    #[tokio::test]
    async fn test_page_convention_stops_on_empty_page() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(Method::GET, "/questions", page(&[1, 2]))
                .respond(Method::GET, "/questions", page(&[])),
        );
        let kind = SessionKind::Practice {
            topic_id: "7".to_string(),
        };
        let questions = client(transport.clone(), Pagination::Page)
            .questions_for(&kind)
            .await
            .unwrap();

        assert_eq!(questions.len(), 2);
        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[1].query,
            query(&[("topicId", "7"), ("page", "2"), ("pageSize", "2")])
        );
    }

    #[tokio::test]
    async fn test_backend_ignoring_paging_does_not_duplicate_questions() {
        // 每次都返回同样的整页
        let transport = Arc::new(ScriptedTransport::new().respond(
            Method::GET,
            "/mock-exams/e1/questions",
            page(&[1, 2]),
        ));
        let questions = client(transport.clone(), Pagination::Page)
            .questions_for(&exam())
            .await
            .unwrap();

        assert_eq!(questions.len(), 2);
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_overlapping_pages_skip_repeated_ids() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(Method::GET, "/mock-exams/e1/questions", page(&[1, 2]))
                .respond(Method::GET, "/mock-exams/e1/questions", page(&[2, 3]))
                .respond(Method::GET, "/mock-exams/e1/questions", page(&[])),
        );
        let questions = client(transport, Pagination::Page)
            .questions_for(&exam())
            .await
            .unwrap();

        let ids: Vec<&str> = questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_extract_list_shapes() {
        assert_eq!(extract_list(&json!([1, 2])).unwrap().len(), 2);
        assert_eq!(extract_list(&json!({"data": [1]})).unwrap().len(), 1);
        assert_eq!(extract_list(&json!({"data": {"items": [1, 2, 3]}})).unwrap().len(), 3);
        assert_eq!(extract_list(&json!({"records": []})).unwrap().len(), 0);
        assert_eq!(extract_list(&json!({"questions": [1]})).unwrap().len(), 1);
        assert!(extract_list(&json!({"data": {"id": 1}})).is_none());
    }

    #[test]
    fn test_parse_list_skips_malformed_items() {
        let body = json!({"data": [
            {"id": 1, "text": "ok"},
            {"text": "missing id"}
        ]});
        let questions: Vec<Question> = parse_list("GET /questions", &body).unwrap();
        assert_eq!(questions.len(), 1);
    }

    #[test]
    fn test_parse_object_unwraps_data() {
        let body = json!({"code": 200, "data": {"id": 5, "text": "q", "options": [{"id": 1, "text": "a"}]}});
        let question: Question = parse_object("GET /questions/5", &body).unwrap();
        assert!(question.has_options());
    }
}
