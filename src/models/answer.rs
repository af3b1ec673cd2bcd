use crate::models::ids::QuestionId;
use crate::models::question::{Question, QuestionOption};
use std::collections::{HashMap, HashSet};

/// 答案引用
///
/// 选项带ID时保存真实ID；选项缺少ID时保存其位置，提交时再解析。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnswerRef {
    OptionId(i64),
    Position(usize),
}

impl AnswerRef {
    /// 为第 `position` 个选项生成答案引用
    pub fn for_option(option: &QuestionOption, position: usize) -> Self {
        match option.id {
            Some(id) => AnswerRef::OptionId(id),
            None => AnswerRef::Position(position),
        }
    }

    /// 该引用在题目当前选项列表中的位置（用于界面高亮）
    pub fn position_in(&self, question: &Question) -> Option<usize> {
        match *self {
            AnswerRef::OptionId(id) => question.options.iter().position(|o| o.id == Some(id)),
            AnswerRef::Position(p) if p < question.options.len() => Some(p),
            AnswerRef::Position(_) => None,
        }
    }
}

/// 提交时解析出的选项引用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedOption {
    /// 选项自身的ID
    RealId(i64),
    /// 数据源提供的序号
    OrdinalFallback(i64),
    /// 从 1 开始的位置
    PositionFallback(i64),
}

impl ResolvedOption {
    /// 提交给后端的值
    pub fn value(self) -> i64 {
        match self {
            ResolvedOption::RealId(v)
            | ResolvedOption::OrdinalFallback(v)
            | ResolvedOption::PositionFallback(v) => v,
        }
    }
}

/// 将答案引用解析为后端可接受的选项引用
///
/// 位置引用按 选项ID → 序号 → 位置+1 的顺序取值；位置越界时返回 `None`
pub fn resolve_answer(answer: &AnswerRef, question: &Question) -> Option<ResolvedOption> {
    match *answer {
        AnswerRef::OptionId(id) => Some(ResolvedOption::RealId(id)),
        AnswerRef::Position(position) => {
            let option = question.options.get(position)?;
            Some(match (option.id, option.ordinal) {
                (Some(id), _) => ResolvedOption::RealId(id),
                (None, Some(ordinal)) => ResolvedOption::OrdinalFallback(ordinal),
                (None, None) => ResolvedOption::PositionFallback(position as i64 + 1),
            })
        }
    }
}

/// 题目ID → 答案引用；没有键表示未作答
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerMap {
    entries: HashMap<QuestionId, AnswerRef>,
}

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn choose(&mut self, question_id: QuestionId, answer: AnswerRef) {
        self.entries.insert(question_id, answer);
    }

    pub fn clear(&mut self, question_id: &QuestionId) -> Option<AnswerRef> {
        self.entries.remove(question_id)
    }

    pub fn get(&self, question_id: &QuestionId) -> Option<&AnswerRef> {
        self.entries.get(question_id)
    }

    pub fn is_answered(&self, question_id: &QuestionId) -> bool {
        self.entries.contains_key(question_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 标记待复查的题目集合，不影响计分
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlaggedSet {
    ids: HashSet<QuestionId>,
}

impl FlaggedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 切换标记，返回切换后是否处于标记状态
    pub fn toggle(&mut self, question_id: QuestionId) -> bool {
        if self.ids.remove(&question_id) {
            false
        } else {
            self.ids.insert(question_id);
            true
        }
    }

    pub fn contains(&self, question_id: &QuestionId) -> bool {
        self.ids.contains(question_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
