//! 活动日志服务 - 业务能力层
//!
//! 只负责"记录答题活动"能力：优先上报后端，失败时写本地文件

use crate::clients::ExamClient;
use crate::models::SessionKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// 活动事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityKind {
    SessionSelected,
    SessionStarted,
    SessionSubmitted,
    SubmissionFailed,
}

/// 一条活动记录
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    pub user_id: String,
    pub kind: ActivityKind,
    pub session_type: &'static str,
    pub catalog_id: String,
    pub at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// 活动日志服务
///
/// 职责：
/// - 上报是 fire-and-forget，不阻塞也不影响答题流程
/// - 上报失败时按答题者追加到本地 JSON Lines 文件
#[derive(Clone)]
pub struct ActivityLogger {
    client: ExamClient,
    user_id: String,
    fallback_dir: PathBuf,
}

impl ActivityLogger {
    pub fn new(
        client: ExamClient,
        user_id: impl Into<String>,
        fallback_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            user_id: user_id.into(),
            fallback_dir: fallback_dir.into(),
        }
    }

    /// 构建事件
    pub fn event(
        &self,
        kind: ActivityKind,
        session: &SessionKind,
        detail: Option<String>,
    ) -> ActivityEvent {
        let catalog_id = match session {
            SessionKind::Practice { topic_id } => topic_id.clone(),
            SessionKind::MockExam { exam_id } => exam_id.clone(),
        };
        ActivityEvent {
            user_id: self.user_id.clone(),
            kind,
            session_type: session.wire_name(),
            catalog_id,
            at: Utc::now(),
            detail,
        }
    }

    /// 后台上报，立即返回
    pub fn record(&self, event: ActivityEvent) -> tokio::task::JoinHandle<()> {
        let logger = self.clone();
        tokio::spawn(async move { logger.deliver(event).await })
    }

    /// 上报一条事件；失败时写本地兜底文件
    pub async fn deliver(&self, event: ActivityEvent) {
        let entry = match serde_json::to_value(&event) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("活动记录序列化失败: {}", e);
                return;
            }
        };

        match self.client.post_activity(&entry).await {
            Ok(()) => debug!("活动记录已上报: {:?}", event.kind),
            Err(e) => {
                debug!("活动记录上报失败，写入本地: {}", e);
                if let Err(io_err) = self.write_fallback(&entry).await {
                    warn!("活动记录本地写入失败: {}", io_err);
                }
            }
        }
    }

    /// 兜底文件路径：`<dir>/activity-<user>.jsonl`
    pub fn fallback_path(&self) -> PathBuf {
        let safe_user: String = self
            .user_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.fallback_dir.join(format!("activity-{}.jsonl", safe_user))
    }

    async fn write_fallback(&self, entry: &serde_json::Value) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.fallback_dir).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.fallback_path())
            .await?;
        file.write_all(format!("{}\n", entry).as_bytes()).await?;
        file.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::testutil::ScriptedTransport;
    use reqwest::Method;
    use std::sync::Arc;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mock-exam-activity-{}-{}", name, std::process::id()))
    }

    fn exam() -> SessionKind {
        SessionKind::MockExam {
            exam_id: "e1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_failed_upload_writes_fallback_line() {
        let dir = temp_dir("fallback");
        let transport =
            Arc::new(ScriptedTransport::new().fail(Method::POST, "/activity-logs", 503));
        let logger = ActivityLogger::new(
            ExamClient::new(transport, &Config::default()),
            "user/42",
            &dir,
        );

        let event = logger.event(ActivityKind::SessionStarted, &exam(), None);
        logger.record(event).await.unwrap();

        let path = logger.fallback_path();
        assert!(path.ends_with("activity-user_42.jsonl"));
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("\"sessionStarted\""));
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_successful_upload_skips_fallback() {
        let dir = temp_dir("uploaded");
        let transport = Arc::new(ScriptedTransport::new().respond(
            Method::POST,
            "/activity-logs",
            serde_json::json!({"code": 200}),
        ));
        let logger = ActivityLogger::new(
            ExamClient::new(transport.clone(), &Config::default()),
            "u1",
            &dir,
        );

        logger
            .deliver(logger.event(ActivityKind::SessionSubmitted, &exam(), Some("8/10".into())))
            .await;

        assert_eq!(transport.call_log(), vec!["POST /activity-logs"]);
        assert!(!logger.fallback_path().exists());
    }
}
