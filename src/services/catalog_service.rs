//! 目录加载服务 - 业务能力层
//!
//! 只负责"拿到可选的题目集合"能力：知识点、模拟考试、题目列表

use crate::clients::ExamClient;
use crate::error::{AppError, AppResult};
use crate::models::{Catalog, Question, SessionKind};
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// 目录加载服务
///
/// 职责：
/// - 并发拉取知识点和模拟考试列表，并按科目分组
/// - 同一时刻多次调用 `load` 共享同一次加载
/// - 失败不缓存，答题者可以直接重试
pub struct CatalogService {
    client: ExamClient,
    cache: Mutex<Arc<OnceCell<Catalog>>>,
}

impl CatalogService {
    pub fn new(client: ExamClient) -> Self {
        Self {
            client,
            cache: Mutex::new(Arc::new(OnceCell::new())),
        }
    }

    /// 加载目录（幂等）
    pub async fn load(&self) -> AppResult<Catalog> {
        let cell = self.current_cell();
        cell.get_or_try_init(|| self.fetch_catalog())
            .await
            .map(Catalog::clone)
    }

    /// 丢弃缓存，下次 `load` 重新拉取
    pub fn refresh(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            *cache = Arc::new(OnceCell::new());
        }
    }

    /// 获取某个目录项的题目列表
    pub async fn load_questions(&self, kind: &SessionKind) -> AppResult<Vec<Question>> {
        info!("{} 📥 正在加载题目列表...", kind);
        let questions = self
            .client
            .questions_for(kind)
            .await
            .map_err(AppError::catalog_unavailable)?;

        if questions.is_empty() {
            warn!("{} ⚠️ 题目列表为空", kind);
            return Err(AppError::EmptyQuestionSet);
        }
        info!("{} ✓ 加载了 {} 道题目", kind, questions.len());
        Ok(questions)
    }

    fn current_cell(&self) -> Arc<OnceCell<Catalog>> {
        match self.cache.lock() {
            Ok(cache) => cache.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    async fn fetch_catalog(&self) -> AppResult<Catalog> {
        info!("📁 正在加载题目目录...");
        let (topics, exams) =
            tokio::join!(self.client.list_topics(), self.client.list_mock_exams());

        let catalog = match (topics, exams) {
            (Err(topic_err), Err(exam_err)) => {
                warn!("知识点加载失败: {}", topic_err);
                warn!("模拟考试加载失败: {}", exam_err);
                return Err(AppError::catalog_unavailable(exam_err));
            }
            (topics, exams) => {
                let topics = topics.unwrap_or_else(|e| {
                    warn!("⚠️ 知识点加载失败，仅显示模拟考试: {}", e);
                    Vec::new()
                });
                let mock_exams = exams.unwrap_or_else(|e| {
                    warn!("⚠️ 模拟考试加载失败，仅显示知识点: {}", e);
                    Vec::new()
                });
                Catalog {
                    subjects: Catalog::group_topics(topics),
                    mock_exams,
                }
            }
        };

        info!(
            "✓ 目录加载完成: {} 个科目, {} 套模拟考试",
            catalog.subjects.len(),
            catalog.mock_exams.len()
        );
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::ErrorKind;
    use crate::testutil::ScriptedTransport;
    use reqwest::Method;
    use serde_json::json;

    fn service(transport: Arc<ScriptedTransport>) -> CatalogService {
        CatalogService::new(ExamClient::new(transport, &Config::default()))
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_fetch() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(
                    Method::GET,
                    "/topics",
                    json!([{"id": 1, "name": "Fractions", "subject": "Math"}]),
                )
                .respond(Method::GET, "/mock-exams", json!({"data": [{"id": 7, "title": "Mock"}]})),
        );
        let service = service(transport.clone());

        let (a, b) = tokio::join!(service.load(), service.load());
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(transport.calls().len(), 2);

        service.load().await.unwrap();
        assert_eq!(transport.calls().len(), 2);

        service.refresh();
        service.load().await.unwrap();
        assert_eq!(transport.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_partial_catalog_when_one_source_fails() {
        let transport = Arc::new(ScriptedTransport::new().respond(
            Method::GET,
            "/mock-exams",
            json!([{"examId": "m1", "name": "Mock"}]),
        ));
        let catalog = service(transport).load().await.unwrap();
        assert!(catalog.subjects.is_empty());
        assert_eq!(catalog.mock_exams.len(), 1);
    }

    #[tokio::test]
    async fn test_catalog_unavailable_is_retryable() {
        let transport = Arc::new(ScriptedTransport::new());
        let service = service(transport.clone());

        let err = service.load().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CatalogUnavailable);

        // 失败不缓存
        let _ = service.load().await;
        assert_eq!(transport.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_empty_question_list_is_an_error() {
        let transport = Arc::new(ScriptedTransport::new().respond(
            Method::GET,
            "/mock-exams/3/questions",
            json!([]),
        ));
        let kind = SessionKind::MockExam {
            exam_id: "3".to_string(),
        };
        let err = service(transport).load_questions(&kind).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyQuestionSet));
    }
}
