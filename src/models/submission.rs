use chrono::{DateTime, Utc};
use serde::Serialize;

/// 单题提交项；`option_id` 为 `None` 时序列化为 null，表示未作答
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionItem {
    pub question_id: i64,
    pub option_id: Option<i64>,
}

/// 提交请求体
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub items: Vec<SubmissionItem>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_id: Option<String>,
    /// 仅在单一接口模式下携带：`practice` 或 `mockExam`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_type: Option<&'static str>,
}

impl SubmissionPayload {
    pub fn answered_count(&self) -> usize {
        self.items.iter().filter(|i| i.option_id.is_some()).count()
    }

    /// 去掉考试ID，用于回退到练习接口
    pub fn without_exam_id(&self) -> Self {
        Self {
            exam_id: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_wire_shape() {
        let now = Utc::now();
        let payload = SubmissionPayload {
            items: vec![
                SubmissionItem {
                    question_id: 1,
                    option_id: Some(10),
                },
                SubmissionItem {
                    question_id: 2,
                    option_id: None,
                },
            ],
            started_at: now,
            finished_at: now,
            exam_id: Some("e7".to_string()),
            session_type: None,
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["items"][0]["questionId"], 1);
        assert!(json["items"][1]["optionId"].is_null());
        assert_eq!(json["examId"], "e7");
        assert!(json.get("sessionType").is_none());
        assert!(json.get("startedAt").is_some());

        let stripped = serde_json::to_value(payload.without_exam_id()).unwrap();
        assert!(stripped.get("examId").is_none());
        assert_eq!(payload.answered_count(), 1);
    }
}
