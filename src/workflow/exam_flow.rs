//! 答题流程 - 流程层
//!
//! 核心职责：把会话阶段转换和业务能力串起来
//!
//! 流程顺序：
//! 1. 选择目录项 → 加载题目 → 就绪
//! 2. 开始答题 → 必要时补全选项 → 答题中
//! 3. 交卷 → 提交答案 → 结果（失败退回就绪）

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::clients::ExamClient;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::Transport;
use crate::models::{Catalog, CatalogEntry, SessionKind};
use crate::services::{
    summarize, ActivityKind, ActivityLogger, CatalogService, OptionResolver, ResultSummary,
    SubmissionReconciler,
};
use crate::workflow::session::{Phase, Session};

/// 开始答题的结果
#[derive(Debug)]
pub struct StartOutcome {
    /// 是否进入了答题阶段
    pub started: bool,
    /// 选项补全的非致命警告
    pub warning: Option<AppError>,
}

/// 答题流程
///
/// - 决定何时加载、何时补全、何时提交
/// - 不持有会话，会话由调用方独占
/// - 只依赖业务能力（services）
pub struct ExamFlow {
    catalog: CatalogService,
    resolver: OptionResolver,
    reconciler: SubmissionReconciler,
    activity: ActivityLogger,
}

impl ExamFlow {
    pub fn new(config: &Config, transport: Arc<dyn Transport>) -> Self {
        let client = ExamClient::new(transport, config);
        Self {
            catalog: CatalogService::new(client.clone()),
            resolver: OptionResolver::new(client.clone(), config.option_lookup_concurrency),
            reconciler: SubmissionReconciler::new(client.clone(), config.submit_mode),
            activity: ActivityLogger::new(
                client,
                config.user_id.clone(),
                config.activity_fallback_dir.clone(),
            ),
        }
    }

    /// 加载目录（多次调用共享同一次加载）
    pub async fn catalog(&self) -> AppResult<Catalog> {
        self.catalog.load().await
    }

    /// 重新加载目录
    pub async fn reload_catalog(&self) -> AppResult<Catalog> {
        self.catalog.refresh();
        self.catalog.load().await
    }

    /// 选择目录项：选择 → 就绪
    ///
    /// 失败时停留在选择阶段，可以直接重试
    pub async fn choose(&self, session: &mut Session, entry: &CatalogEntry) -> AppResult<bool> {
        if session.phase() != Phase::Selecting {
            return Ok(false);
        }
        let kind = SessionKind::from(entry);
        info!("📌 选择 {} (#{})", entry, entry.id());

        session.set_loading(true);
        let questions = match self.catalog.load_questions(&kind).await {
            Ok(questions) => questions,
            Err(e) => {
                session.set_loading(false);
                return Err(e);
            }
        };

        let selected = session.select(kind.clone(), entry.to_string(), questions)?;
        if selected {
            self.activity.record(self.activity.event(
                ActivityKind::SessionSelected,
                &kind,
                Some(entry.to_string()),
            ));
        }
        Ok(selected)
    }

    /// 开始答题：就绪 → 答题中
    ///
    /// 有题目缺少选项时先补全；补全不会阻止开始
    pub async fn start(&self, session: &mut Session) -> StartOutcome {
        let Some(kind) = session.kind().cloned() else {
            return StartOutcome {
                started: false,
                warning: None,
            };
        };
        if session.phase() != Phase::Ready {
            return StartOutcome {
                started: false,
                warning: None,
            };
        }

        let mut warning = None;
        if OptionResolver::needs_resolution(session.questions()) {
            let resolution = self
                .resolver
                .resolve(&kind, session.questions().to_vec())
                .await;
            warning = resolution.warning();
            session.replace_questions(resolution.questions);
        }

        let started = session.start(Utc::now());
        if started {
            info!("{} ▶️ 开始答题，共 {} 道题", kind, session.questions().len());
            self.activity
                .record(self.activity.event(ActivityKind::SessionStarted, &kind, None));
        }
        StartOutcome { started, warning }
    }

    /// 交卷：答题中 → 结果，失败退回就绪
    ///
    /// 不在答题阶段或已有提交进行中时返回 `Ok(None)`
    pub async fn finish(&self, session: &mut Session) -> AppResult<Option<ResultSummary>> {
        let Some(draft) = session.begin_submit(Utc::now()) else {
            return Ok(None);
        };
        let kind = draft.kind.clone();

        let outcome = self.reconciler.submit(&draft).await;
        session.finish_submit(&outcome);

        match outcome {
            Ok(score) => {
                let summary = summarize(&score);
                self.activity.record(self.activity.event(
                    ActivityKind::SessionSubmitted,
                    &kind,
                    Some(format!("{}/{}", summary.correct, summary.total)),
                ));
                Ok(Some(summary))
            }
            Err(e) => {
                error!("{} ❌ 交卷失败: {}", kind, e);
                self.activity.record(self.activity.event(
                    ActivityKind::SubmissionFailed,
                    &kind,
                    Some(e.to_string()),
                ));
                Err(e)
            }
        }
    }

    /// 查看结果后开始新的一轮
    pub fn reset(&self, session: &mut Session) -> bool {
        let reset = session.reset();
        if !reset {
            warn!("只有在查看结果时才能开始新的一轮");
        }
        reset
    }
}
