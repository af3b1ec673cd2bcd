//! 答题会话状态机
//!
//! 阶段只能向前推进：选择 → 就绪 → 答题中 → 结果，另有 结果 → 选择 的重置。
//! 非法阶段下的导航、作答、提交都是无操作（返回 `false`/`None`），不是错误。

use crate::error::{AppError, AppResult};
use crate::models::{AnswerMap, AnswerRef, FlaggedSet, Question, ScoreResult, SessionKind};
use crate::services::SubmissionDraft;
use chrono::{DateTime, Utc};
use std::fmt;

/// 会话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Selecting,
    Ready,
    Running,
    Result,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Selecting => "选择题目",
            Phase::Ready => "准备开始",
            Phase::Running => "答题中",
            Phase::Result => "查看结果",
        };
        f.write_str(name)
    }
}

/// 一次答题会话
#[derive(Debug, Clone)]
pub struct Session {
    phase: Phase,
    /// 选择阶段的加载中子状态
    loading: bool,
    kind: Option<SessionKind>,
    title: String,
    questions: Vec<Question>,
    answers: AnswerMap,
    flagged: FlaggedSet,
    cursor: usize,
    started_at: Option<DateTime<Utc>>,
    submitting: bool,
    result: Option<ScoreResult>,
    last_error: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: Phase::Selecting,
            loading: false,
            kind: None,
            title: String::new(),
            questions: Vec::new(),
            answers: AnswerMap::new(),
            flagged: FlaggedSet::new(),
            cursor: 0,
            started_at: None,
            submitting: false,
            result: None,
            last_error: None,
        }
    }

    // ========== 阶段转换 ==========

    /// 进入/离开加载中子状态（仅选择阶段有效）
    pub fn set_loading(&mut self, loading: bool) -> bool {
        if self.phase != Phase::Selecting {
            return false;
        }
        self.loading = loading;
        true
    }

    /// 选择 → 就绪
    ///
    /// 题目为空时返回 `EmptyQuestionSet` 并停留在选择阶段；非选择阶段返回 `Ok(false)`
    pub fn select(
        &mut self,
        kind: SessionKind,
        title: impl Into<String>,
        questions: Vec<Question>,
    ) -> AppResult<bool> {
        if self.phase != Phase::Selecting {
            return Ok(false);
        }
        self.loading = false;
        if questions.is_empty() {
            return Err(AppError::EmptyQuestionSet);
        }

        self.kind = Some(kind);
        self.title = title.into();
        self.questions = questions;
        self.cursor = 0;
        self.last_error = None;
        self.phase = Phase::Ready;
        Ok(true)
    }

    /// 替换题目列表（选项补全后），不影响答案和标记
    pub fn replace_questions(&mut self, questions: Vec<Question>) -> bool {
        if self.phase != Phase::Ready || questions.is_empty() {
            return false;
        }
        self.questions = questions;
        self.cursor = self.cursor.min(self.questions.len() - 1);
        true
    }

    /// 就绪 → 答题中
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if self.phase != Phase::Ready {
            return false;
        }
        self.started_at.get_or_insert(now);
        self.last_error = None;
        self.phase = Phase::Running;
        true
    }

    /// 开始提交：返回会话快照，提交进行中时不会重复返回
    pub fn begin_submit(&mut self, now: DateTime<Utc>) -> Option<SubmissionDraft> {
        if self.phase != Phase::Running || self.submitting {
            return None;
        }
        let kind = self.kind.clone()?;
        self.submitting = true;

        Some(SubmissionDraft {
            kind,
            questions: self.questions.clone(),
            answers: self.answers.clone(),
            started_at: self.started_at.unwrap_or(now),
            finished_at: now,
        })
    }

    /// 提交完成：成功 → 结果；失败 → 就绪（答案保留）
    pub fn finish_submit(&mut self, outcome: &AppResult<ScoreResult>) -> bool {
        if !self.submitting {
            return false;
        }
        self.submitting = false;
        match outcome {
            Ok(result) => {
                self.result = Some(result.clone());
                self.last_error = None;
                self.phase = Phase::Result;
            }
            Err(e) => {
                self.last_error = Some(e.user_message());
                self.phase = Phase::Ready;
            }
        }
        true
    }

    /// 结果 → 选择，清空会话
    pub fn reset(&mut self) -> bool {
        if self.phase != Phase::Result {
            return false;
        }
        self.abandon();
        true
    }

    /// 离开页面：任何阶段都清空会话
    pub fn abandon(&mut self) {
        *self = Self::new();
    }

    // ========== 答题中操作 ==========

    /// 跳转到指定题目
    pub fn go_to(&mut self, index: usize) -> bool {
        if self.phase != Phase::Running || index >= self.questions.len() {
            return false;
        }
        self.cursor = index;
        true
    }

    /// 下一题（到末尾不循环）
    pub fn next(&mut self) -> bool {
        let target = (self.cursor + 1).min(self.questions.len().saturating_sub(1));
        self.go_to(target)
    }

    /// 上一题（到开头不循环）
    pub fn prev(&mut self) -> bool {
        self.go_to(self.cursor.saturating_sub(1))
    }

    /// 为任意题目选择选项（不要求按顺序作答）
    pub fn choose(&mut self, question_index: usize, option_index: usize) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        let Some(question) = self.questions.get(question_index) else {
            return false;
        };
        let Some(option) = question.options.get(option_index) else {
            return false;
        };
        let answer = AnswerRef::for_option(option, option_index);
        self.answers.choose(question.id.clone(), answer);
        true
    }

    /// 清除某题的答案
    pub fn clear_answer(&mut self, question_index: usize) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        match self.questions.get(question_index) {
            Some(question) => self.answers.clear(&question.id).is_some(),
            None => false,
        }
    }

    /// 切换某题的复查标记
    pub fn toggle_flag(&mut self, question_index: usize) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        match self.questions.get(question_index) {
            Some(question) => {
                self.flagged.toggle(question.id.clone());
                true
            }
            None => false,
        }
    }

    // ========== 查询 ==========

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn kind(&self) -> Option<&SessionKind> {
        self.kind.as_ref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn flagged(&self) -> &FlaggedSet {
        &self.flagged
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.cursor)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn result(&self) -> Option<&ScoreResult> {
        self.result.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn answered_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| self.answers.is_answered(&q.id))
            .count()
    }

    /// 某题已选选项的位置
    pub fn chosen_position(&self, question_index: usize) -> Option<usize> {
        let question = self.questions.get(question_index)?;
        self.answers.get(&question.id)?.position_in(question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuestionId, QuestionOption};

    fn questions() -> Vec<Question> {
        (1..=3)
            .map(|i| {
                Question::new(i, format!("q{}", i)).with_options(vec![
                    QuestionOption::new(Some(i as i64 * 10), "A"),
                    QuestionOption::new(None, "B"),
                ])
            })
            .collect()
    }

    fn kind() -> SessionKind {
        SessionKind::MockExam {
            exam_id: "e1".to_string(),
        }
    }

    fn running() -> Session {
        let mut session = Session::new();
        session.select(kind(), "Mock", questions()).unwrap();
        assert!(session.start(Utc::now()));
        session
    }

    #[test]
    fn test_select_requires_questions() {
        let mut session = Session::new();
        session.set_loading(true);
        let err = session.select(kind(), "Empty", Vec::new()).unwrap_err();
        assert!(matches!(err, AppError::EmptyQuestionSet));
        assert_eq!(session.phase(), Phase::Selecting);
        assert!(!session.is_loading());
    }

    #[test]
    fn test_actions_outside_running_are_noops() {
        let mut session = Session::new();
        assert!(!session.next());
        assert!(!session.choose(0, 0));
        assert!(session.begin_submit(Utc::now()).is_none());

        session.select(kind(), "Mock", questions()).unwrap();
        assert!(!session.go_to(1));
        assert!(!session.toggle_flag(0));
        assert!(!session.reset());
        assert_eq!(session.phase(), Phase::Ready);
    }

    #[test]
    fn test_navigation_is_clamped() {
        let mut session = running();
        assert!(session.prev());
        assert_eq!(session.cursor(), 0);
        session.go_to(2);
        session.next();
        assert_eq!(session.cursor(), 2);
        assert!(!session.go_to(3));
        assert_eq!(session.cursor(), 2);
    }

    #[test]
    fn test_navigation_round_trip_keeps_answers_and_flags() {
        let mut session = running();
        session.choose(0, 1);
        session.toggle_flag(2);
        session.go_to(1);
        let answers = session.answers().clone();
        let flagged = session.flagged().clone();

        session.prev();
        session.next();
        assert_eq!(session.cursor(), 1);
        session.next();
        session.prev();
        assert_eq!(session.cursor(), 1);
        assert_eq!(session.answers(), &answers);
        assert_eq!(session.flagged(), &flagged);
    }

    #[test]
    fn test_choose_out_of_order_and_clear() {
        let mut session = running();
        let before = session.answers().clone();

        assert!(session.choose(2, 0));
        assert_eq!(
            session.answers().get(&QuestionId::from(3)),
            Some(&AnswerRef::OptionId(30))
        );
        assert!(session.clear_answer(2));
        assert_eq!(session.answers(), &before);

        assert!(session.choose(1, 1));
        assert_eq!(session.chosen_position(1), Some(1));
        assert!(!session.choose(1, 5));
    }

    #[test]
    fn test_submission_in_flight_blocks_second_finish() {
        let mut session = running();
        assert!(session.begin_submit(Utc::now()).is_some());
        assert!(session.begin_submit(Utc::now()).is_none());
    }

    #[test]
    fn test_failed_submission_returns_to_ready_with_answers() {
        let mut session = running();
        session.choose(0, 0);
        let answers = session.answers().clone();

        session.begin_submit(Utc::now()).unwrap();
        let outcome: AppResult<ScoreResult> = Err(AppError::SubmissionRejected {
            attempts: 8,
            last: "503".to_string(),
        });
        assert!(session.finish_submit(&outcome));

        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(session.answers(), &answers);
        assert!(session.last_error().is_some());
        assert!(session.start(Utc::now()));
    }

    #[test]
    fn test_successful_submission_then_reset() {
        let mut session = running();
        session.choose(0, 0);
        session.begin_submit(Utc::now()).unwrap();
        session.finish_submit(&Ok(ScoreResult::new(1, 0, 3)));

        assert_eq!(session.phase(), Phase::Result);
        assert_eq!(session.answered_count(), 1);
        assert!(session.reset());
        assert_eq!(session.phase(), Phase::Selecting);
        assert!(session.questions().is_empty());
        assert!(session.answers().is_empty());
        assert!(session.result().is_none());
    }
}
