//! 答案提交服务 - 业务能力层
//!
//! 只负责"把一次作答变成成绩"能力：构建提交项、按顺序尝试候选接口

use crate::clients::exam_client::extract_object;
use crate::clients::{explicit_route, mock_exam_routes, practice_route, ExamClient, SubmitRoute};
use crate::config::SubmitMode;
use crate::error::{AppError, AppResult};
use crate::models::{
    resolve_answer, AnswerMap, Question, ScoreResult, SessionKind, SubmissionItem,
    SubmissionPayload,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// 一次提交所需的会话快照
#[derive(Debug, Clone)]
pub struct SubmissionDraft {
    pub kind: SessionKind,
    pub questions: Vec<Question>,
    pub answers: AnswerMap,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// 构建提交请求体
///
/// 每道题一项；无法解析为数字ID的题目、无法解析的答案引用会被丢弃并记录警告。
/// 全部被丢弃时返回 `EmptySubmission`，不发起任何请求。
pub fn build_payload(draft: &SubmissionDraft, mode: SubmitMode) -> AppResult<SubmissionPayload> {
    let mut items = Vec::with_capacity(draft.questions.len());

    for question in &draft.questions {
        let Some(question_id) = question.id.as_numeric() else {
            warn!("题目ID {} 不是数字，已从提交中移除", question.id);
            continue;
        };

        let option_id = match draft.answers.get(&question.id) {
            None => None,
            Some(answer) => match resolve_answer(answer, question) {
                Some(resolved) => {
                    debug!("题目 {} 答案 {:?} → {:?}", question.id, answer, resolved);
                    Some(resolved.value())
                }
                None => {
                    let err = AppError::MalformedAnswerReference {
                        question_id: question.id.to_string(),
                    };
                    warn!("{}，已从提交中移除", err);
                    continue;
                }
            },
        };

        items.push(SubmissionItem {
            question_id,
            option_id,
        });
    }

    if items.is_empty() {
        return Err(AppError::EmptySubmission);
    }

    Ok(SubmissionPayload {
        items,
        started_at: draft.started_at,
        finished_at: draft.finished_at,
        exam_id: draft.kind.exam_id().map(str::to_string),
        session_type: match mode {
            SubmitMode::Explicit => Some(draft.kind.wire_name()),
            SubmitMode::Fallback => None,
        },
    })
}

/// 答案提交服务
///
/// 职责：
/// - 练习只尝试一个接口
/// - 模拟考试依次尝试候选接口，第一个成功即停止
/// - 全部失败后回退一次练习接口（去掉 examId）
/// - 单次失败只记录日志，只有整条链耗尽才返回错误
pub struct SubmissionReconciler {
    client: ExamClient,
    mode: SubmitMode,
}

impl SubmissionReconciler {
    pub fn new(client: ExamClient, mode: SubmitMode) -> Self {
        Self { client, mode }
    }

    /// 提交答案并返回成绩
    pub async fn submit(&self, draft: &SubmissionDraft) -> AppResult<ScoreResult> {
        let payload = build_payload(draft, self.mode)?;
        info!(
            "{} 📤 正在提交 {} 道题 (已作答 {})...",
            draft.kind,
            payload.items.len(),
            payload.answered_count()
        );

        let exam_id = draft.kind.exam_id();
        let plan: Vec<(SubmitRoute, Option<&str>, SubmissionPayload)> = match (self.mode, exam_id)
        {
            (SubmitMode::Explicit, _) => vec![(explicit_route(), exam_id, payload)],
            (SubmitMode::Fallback, None) => vec![(practice_route(), None, payload)],
            (SubmitMode::Fallback, Some(id)) => {
                let mut plan: Vec<_> = mock_exam_routes()
                    .into_iter()
                    .map(|route| (route, Some(id), payload.clone()))
                    .collect();
                plan.push((practice_route(), None, payload.without_exam_id()));
                plan
            }
        };

        let total = plan.len();
        let mut last_failure = String::new();

        for (attempt, (route, exam_id, payload)) in plan.iter().enumerate() {
            match self.attempt(route, *exam_id, payload).await {
                Ok(score) => {
                    info!(
                        "{} ✓ 提交成功 ({}, 第 {}/{} 个接口)",
                        draft.kind,
                        route,
                        attempt + 1,
                        total
                    );
                    return Ok(score);
                }
                Err(reason) => {
                    warn!(
                        "{} 接口 {} 提交失败 ({}/{}): {}",
                        draft.kind,
                        route,
                        attempt + 1,
                        total,
                        reason
                    );
                    last_failure = format!("{}: {}", route, reason);
                }
            }
        }

        Err(AppError::SubmissionRejected {
            attempts: total,
            last: last_failure,
        })
    }

    async fn attempt(
        &self,
        route: &SubmitRoute,
        exam_id: Option<&str>,
        payload: &SubmissionPayload,
    ) -> Result<ScoreResult, String> {
        let body = self
            .client
            .submit(route, exam_id, payload)
            .await
            .map_err(|e| e.to_string())?;
        parse_score(&body)
    }
}

/// 校验并解析成绩响应
pub fn parse_score(body: &serde_json::Value) -> Result<ScoreResult, String> {
    if body.is_null() {
        return Err("响应为空".to_string());
    }
    serde_json::from_value(extract_object(body).clone())
        .map_err(|e| format!("响应不是有效的成绩: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnswerRef, QuestionId, QuestionOption};

    fn draft(questions: Vec<Question>, answers: AnswerMap) -> SubmissionDraft {
        SubmissionDraft {
            kind: SessionKind::MockExam {
                exam_id: "e1".to_string(),
            },
            questions,
            answers,
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn test_unanswered_questions_submit_null() {
        let questions = vec![
            Question::new(1, "q1").with_options(vec![QuestionOption::new(Some(10), "a")]),
            Question::new(2, "q2").with_options(vec![QuestionOption::new(Some(20), "a")]),
        ];
        let mut answers = AnswerMap::new();
        answers.choose(QuestionId::from(1), AnswerRef::OptionId(10));

        let payload = build_payload(&draft(questions, answers), SubmitMode::Fallback).unwrap();
        assert_eq!(payload.items.len(), 2);
        assert_eq!(payload.items[0].option_id, Some(10));
        assert_eq!(payload.items[1].option_id, None);
        assert_eq!(payload.exam_id.as_deref(), Some("e1"));
        assert!(payload.session_type.is_none());
    }

    #[test]
    fn test_non_numeric_and_malformed_items_are_dropped() {
        let questions = vec![
            Question::new("abc", "no numeric id"),
            Question::new(2, "q2").with_options(vec![QuestionOption::new(None, "a")]),
            Question::new(3, "q3"),
        ];
        let mut answers = AnswerMap::new();
        answers.choose(QuestionId::from(2), AnswerRef::Position(4));

        let payload = build_payload(&draft(questions, answers), SubmitMode::Explicit).unwrap();
        assert_eq!(payload.items.len(), 1);
        assert_eq!(payload.items[0].question_id, 3);
        assert_eq!(payload.session_type, Some("mockExam"));
    }

    #[test]
    fn test_fully_dropped_submission_fails_early() {
        let questions = vec![Question::new("x", "q")];
        let err =
            build_payload(&draft(questions, AnswerMap::new()), SubmitMode::Fallback).unwrap_err();
        assert!(matches!(err, AppError::EmptySubmission));
    }

    #[test]
    fn test_parse_score_validation() {
        assert!(parse_score(&serde_json::Value::Null).is_err());
        assert!(parse_score(&serde_json::json!({"ok": true})).is_err());
        let score =
            parse_score(&serde_json::json!({"data": {"correct": 1, "wrong": 0, "total": 1}}))
                .unwrap();
        assert_eq!(score.total, 1);
    }
}
