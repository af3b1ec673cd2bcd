use crate::models::ids::{deserialize_id_string, deserialize_lenient_i64};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 后端返回的知识点（扁平结构）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicEntry {
    #[serde(alias = "topicId", deserialize_with = "deserialize_id_string")]
    pub id: String,
    #[serde(alias = "title", alias = "topicName")]
    pub name: String,
    #[serde(default, alias = "subjectName", alias = "subject_name")]
    pub subject: Option<String>,
    #[serde(
        default,
        alias = "questionCount",
        deserialize_with = "deserialize_lenient_i64"
    )]
    pub question_count: Option<i64>,
}

/// 同一科目下的知识点
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectGroup {
    pub name: String,
    pub topics: Vec<TopicEntry>,
}

/// 模拟考试
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockExam {
    #[serde(alias = "examId", alias = "exam_id", deserialize_with = "deserialize_id_string")]
    pub id: String,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(
        default,
        alias = "questionCount",
        deserialize_with = "deserialize_lenient_i64"
    )]
    pub question_count: Option<i64>,
    #[serde(
        default,
        alias = "durationMinutes",
        alias = "duration",
        deserialize_with = "deserialize_lenient_i64"
    )]
    pub duration_minutes: Option<i64>,
}

impl fmt::Display for MockExam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        if let Some(count) = self.question_count {
            write!(f, " ({} 题", count)?;
            if let Some(minutes) = self.duration_minutes {
                write!(f, ", {} 分钟", minutes)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// 可供选择的目录项
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEntry {
    /// 按科目/知识点练习
    Topic { subject: String, topic: TopicEntry },
    /// 完整模拟考试
    MockExam(MockExam),
}

impl CatalogEntry {
    pub fn id(&self) -> &str {
        match self {
            CatalogEntry::Topic { topic, .. } => &topic.id,
            CatalogEntry::MockExam(exam) => &exam.id,
        }
    }
}

impl fmt::Display for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogEntry::Topic { subject, topic } => write!(f, "{} / {}", subject, topic.name),
            CatalogEntry::MockExam(exam) => write!(f, "{}", exam),
        }
    }
}

/// 会话类型：决定题目来源和提交接口
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionKind {
    /// 按知识点的练习
    Practice { topic_id: String },
    /// 模拟考试
    MockExam { exam_id: String },
}

impl SessionKind {
    pub fn exam_id(&self) -> Option<&str> {
        match self {
            SessionKind::MockExam { exam_id } => Some(exam_id),
            SessionKind::Practice { .. } => None,
        }
    }

    /// 单一接口模式下的 `sessionType` 取值
    pub fn wire_name(&self) -> &'static str {
        match self {
            SessionKind::Practice { .. } => "practice",
            SessionKind::MockExam { .. } => "mockExam",
        }
    }
}

impl From<&CatalogEntry> for SessionKind {
    fn from(entry: &CatalogEntry) -> Self {
        match entry {
            CatalogEntry::Topic { topic, .. } => SessionKind::Practice {
                topic_id: topic.id.clone(),
            },
            CatalogEntry::MockExam(exam) => SessionKind::MockExam {
                exam_id: exam.id.clone(),
            },
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionKind::Practice { topic_id } => write!(f, "[练习 知识点#{}]", topic_id),
            SessionKind::MockExam { exam_id } => write!(f, "[模拟考试 #{}]", exam_id),
        }
    }
}

/// 未标注科目时的分组名
pub const UNGROUPED_SUBJECT: &str = "其他";

/// 题目目录
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub subjects: Vec<SubjectGroup>,
    pub mock_exams: Vec<MockExam>,
}

impl Catalog {
    /// 按科目分组知识点（科目按名称排序，组内保持原顺序）
    pub fn group_topics(topics: Vec<TopicEntry>) -> Vec<SubjectGroup> {
        let mut groups: BTreeMap<String, Vec<TopicEntry>> = BTreeMap::new();
        for topic in topics {
            let subject = topic
                .subject
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| UNGROUPED_SUBJECT.to_string());
            groups.entry(subject).or_default().push(topic);
        }
        groups
            .into_iter()
            .map(|(name, topics)| SubjectGroup { name, topics })
            .collect()
    }

    /// 按名称过滤（大小写不敏感）；科目名匹配时保留整个科目
    pub fn filter(&self, query: &str) -> Catalog {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.clone();
        }
        let matches = |s: &str| s.to_lowercase().contains(&needle);

        let subjects = self
            .subjects
            .iter()
            .filter_map(|group| {
                if matches(&group.name) {
                    return Some(group.clone());
                }
                let topics: Vec<TopicEntry> = group
                    .topics
                    .iter()
                    .filter(|t| matches(&t.name))
                    .cloned()
                    .collect();
                (!topics.is_empty()).then(|| SubjectGroup {
                    name: group.name.clone(),
                    topics,
                })
            })
            .collect();

        let mock_exams = self
            .mock_exams
            .iter()
            .filter(|e| matches(&e.title))
            .cloned()
            .collect();

        Catalog {
            subjects,
            mock_exams,
        }
    }

    /// 目录项的扁平列表：先知识点，后模拟考试；序号即 `pick` 命令的编号
    pub fn entries(&self) -> Vec<CatalogEntry> {
        let topics = self.subjects.iter().flat_map(|group| {
            group.topics.iter().map(move |topic| CatalogEntry::Topic {
                subject: group.name.clone(),
                topic: topic.clone(),
            })
        });
        let exams = self.mock_exams.iter().cloned().map(CatalogEntry::MockExam);
        topics.chain(exams).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty() && self.mock_exams.is_empty()
    }
}
