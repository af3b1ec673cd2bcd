use crate::models::ids::{deserialize_lenient_i64, QuestionId};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// 选项字母（按位置派生，不依赖选项ID）
pub fn option_letter(position: usize) -> String {
    const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    match LETTERS.get(position) {
        Some(letter) => (*letter as char).to_string(),
        None => (position + 1).to_string(),
    }
}

/// 由字母反查选项位置（大小写不敏感）
pub fn letter_position(letter: &str) -> Option<usize> {
    let mut chars = letter.trim().chars();
    let c = chars.next()?.to_ascii_uppercase();
    if chars.next().is_some() || !c.is_ascii_uppercase() {
        return None;
    }
    Some((c as u8 - b'A') as usize)
}

/// 题目的一个选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    /// 选项ID，数据源可能缺失或为 null
    #[serde(
        default,
        alias = "optionId",
        alias = "option_id",
        deserialize_with = "deserialize_lenient_i64"
    )]
    pub id: Option<i64>,

    #[serde(default, alias = "content", alias = "label", alias = "optionText")]
    pub text: String,

    /// 数据源显式给出的序号
    #[serde(
        default,
        alias = "order",
        alias = "sortOrder",
        alias = "sort",
        deserialize_with = "deserialize_lenient_i64"
    )]
    pub ordinal: Option<i64>,
}

impl QuestionOption {
    pub fn new(id: Option<i64>, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            ordinal: None,
        }
    }

    pub fn with_ordinal(mut self, ordinal: i64) -> Self {
        self.ordinal = Some(ordinal);
        self
    }
}

/// 知识点标签
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    #[serde(
        default,
        alias = "topicId",
        deserialize_with = "crate::models::ids::deserialize_lenient_i64"
    )]
    pub id: Option<i64>,
    #[serde(alias = "title")]
    pub name: String,
}

/// 题目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(alias = "questionId", alias = "question_id")]
    pub id: QuestionId,

    #[serde(
        default,
        alias = "content",
        alias = "stem",
        alias = "questionText"
    )]
    pub text: String,

    #[serde(default, alias = "imageUrl", alias = "image_url")]
    pub image: Option<String>,

    /// 有序选项列表，展示顺序即列表顺序
    #[serde(default, alias = "choices", alias = "answers", alias = "questionOptions")]
    pub options: Vec<QuestionOption>,

    #[serde(default, alias = "tags")]
    pub topics: Vec<Topic>,
}

impl Question {
    pub fn new(id: impl Into<QuestionId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            image: None,
            options: Vec::new(),
            topics: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: Vec<QuestionOption>) -> Self {
        self.options = options;
        self
    }

    /// 没有选项的题目无法作答
    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    /// 图片引用：优先使用显式字段，否则从题干 HTML 中提取第一张图片
    pub fn image_ref(&self) -> Option<String> {
        if let Some(image) = self.image.as_ref().filter(|s| !s.trim().is_empty()) {
            return Some(image.clone());
        }
        img_src_regex()?
            .captures(&self.text)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// 去掉 HTML 标签后的题干，用于终端展示
    pub fn plain_text(&self) -> String {
        match tag_regex() {
            Some(re) => re.replace_all(&self.text, "").trim().to_string(),
            None => self.text.trim().to_string(),
        }
    }
}

fn img_src_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<img\s+[^>]*src="([^"]+)""#).ok())
        .as_ref()
}

fn tag_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").ok()).as_ref()
}
