//! 选项补全服务 - 业务能力层
//!
//! 只负责"让每道题都尽量拿到选项"能力，不关心会话阶段

use crate::clients::ExamClient;
use crate::error::AppError;
use crate::models::{Question, QuestionId, SessionKind};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// 选项来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// 题目本来就带选项
    AlreadyEnriched,
    /// 批量来源补全了全部题目
    Batch,
    /// 至少一部分来自逐题查询
    PerItem,
    /// 没有任何来源成功
    Unavailable,
}

/// 补全结果
#[derive(Debug, Clone)]
pub struct Resolution {
    pub questions: Vec<Question>,
    pub source: ResolutionSource,
    /// 仍然没有选项的题目数
    pub unresolved: usize,
}

impl Resolution {
    /// 非致命警告：部分题目无法作答
    pub fn warning(&self) -> Option<AppError> {
        (self.unresolved > 0).then(|| AppError::OptionsUnresolved {
            missing: self.unresolved,
        })
    }
}

/// 选项补全服务
///
/// 职责：
/// - 先尝试以目录项为键的批量来源
/// - 批量来源没有补全的题目再逐题查询（并发，互不影响）
/// - 单题失败时保留原题，不中断整批
pub struct OptionResolver {
    client: ExamClient,
    concurrency: usize,
}

impl OptionResolver {
    pub fn new(client: ExamClient, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
        }
    }

    /// 是否有题目缺少选项（逐题检查）
    pub fn needs_resolution(questions: &[Question]) -> bool {
        questions.iter().any(|q| !q.has_options())
    }

    /// 补全选项；不会失败，最坏情况下原样返回
    pub async fn resolve(&self, kind: &SessionKind, questions: Vec<Question>) -> Resolution {
        if !Self::needs_resolution(&questions) {
            debug!("{} 所有题目已带选项，跳过补全", kind);
            return Resolution {
                questions,
                source: ResolutionSource::AlreadyEnriched,
                unresolved: 0,
            };
        }

        info!("{} 🔍 正在补全题目选项...", kind);
        let mut questions = questions;
        let mut source = ResolutionSource::Unavailable;

        // ========== 步骤 1: 批量来源 ==========
        if self.try_batch_sources(kind, &mut questions).await {
            source = ResolutionSource::Batch;
        }

        // ========== 步骤 2: 逐题查询 ==========
        if Self::needs_resolution(&questions) {
            let filled = self.lookup_each(&mut questions).await;
            if filled > 0 {
                source = ResolutionSource::PerItem;
            }
        }

        let unresolved = questions.iter().filter(|q| !q.has_options()).count();
        if unresolved > 0 {
            warn!(
                "{} ⚠️ 仍有 {}/{} 道题目没有选项，将显示为不可作答",
                kind,
                unresolved,
                questions.len()
            );
        } else {
            info!("{} ✓ 选项补全完成 ({:?})", kind, source);
        }

        Resolution {
            questions,
            source,
            unresolved,
        }
    }

    /// 依次尝试批量来源，返回是否补全了至少一道题
    async fn try_batch_sources(&self, kind: &SessionKind, questions: &mut [Question]) -> bool {
        for request in ExamClient::batch_option_sources(kind) {
            let endpoint = request.endpoint();
            match self.client.fetch_question_batch(request).await {
                Ok(batch) => {
                    let merged = merge_options(questions, batch);
                    if merged > 0 {
                        info!("{} ✓ 批量来源 {} 补全了 {} 道题", kind, endpoint, merged);
                        return true;
                    }
                    debug!("{} 批量来源 {} 没有返回选项", kind, endpoint);
                }
                Err(e) => warn!("{} 批量来源 {} 失败: {}", kind, endpoint, e),
            }
        }
        false
    }

    /// 逐题查询缺少选项的题目，返回补全数量
    async fn lookup_each(&self, questions: &mut [Question]) -> usize {
        let missing: Vec<(usize, QuestionId)> = questions
            .iter()
            .enumerate()
            .filter(|(_, q)| !q.has_options())
            .map(|(i, q)| (i, q.id.clone()))
            .collect();

        let results: Vec<(usize, Option<Question>)> = stream::iter(missing)
            .map(|(index, id)| async move {
                match self.client.question_detail(id.as_str()).await {
                    Ok(detail) => (index, Some(detail)),
                    Err(e) => {
                        warn!("题目 {} 详情查询失败，保留原题: {}", id, e);
                        (index, None)
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut filled = 0;
        for (index, detail) in results {
            let Some(detail) = detail.filter(Question::has_options) else {
                continue;
            };
            let question = &mut questions[index];
            question.options = detail.options;
            if question.text.trim().is_empty() {
                question.text = detail.text;
            }
            if question.image.is_none() {
                question.image = detail.image;
            }
            filled += 1;
        }
        filled
    }
}

/// 将批量结果中的选项按题目ID合并到原列表，保持原顺序，返回合并数量
fn merge_options(questions: &mut [Question], batch: Vec<Question>) -> usize {
    let mut by_id: HashMap<QuestionId, Question> = batch
        .into_iter()
        .filter(Question::has_options)
        .map(|q| (q.id.clone(), q))
        .collect();

    let mut merged = 0;
    for question in questions.iter_mut().filter(|q| !q.has_options()) {
        if let Some(enriched) = by_id.remove(&question.id) {
            question.options = enriched.options;
            if question.topics.is_empty() {
                question.topics = enriched.topics;
            }
            merged += 1;
        }
    }
    merged
}
