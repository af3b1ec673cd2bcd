//! 控制台答题应用 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责读取命令、驱动会话和展示结果。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：打印启动信息、创建 HTTP 执行器和答题流程
//! 2. **命令循环**：逐行读取标准输入，解析为 `Command`
//! 3. **会话所有权**：唯一持有 `Session`，每轮结束后丢弃重建
//! 4. **计时器管理**：进入答题阶段时启动，离开时立即停止
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理加载、补全、提交的细节
//! - **向下委托**：委托 `ExamFlow` 处理阶段转换

use crate::config::Config;
use crate::error::AppError;
use crate::infrastructure::{HttpExecutor, Transport};
use crate::models::{option_letter, Catalog};
use crate::orchestrator::command::{Command, HELP};
use crate::orchestrator::render;
use crate::utils::logging;
use crate::workflow::{ExamFlow, Phase, Session, SessionTimer, TimerGuard};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// 应用主结构
pub struct App {
    flow: ExamFlow,
    session: Session,
    timer: SessionTimer,
    /// 只在答题阶段存在
    timer_guard: Option<TimerGuard>,
    /// 离开答题阶段时定格的用时
    frozen_elapsed: u64,
    catalog: Option<Catalog>,
    filter: String,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config);
        let executor = HttpExecutor::new(&config)?;
        Ok(Self::with_transport(&config, Arc::new(executor)))
    }

    /// 使用指定的传输层创建应用
    pub fn with_transport(config: &Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            flow: ExamFlow::new(config, transport),
            session: Session::new(),
            timer: SessionTimer::new(Duration::from_millis(config.timer_tick_millis)),
            timer_guard: None,
            frozen_elapsed: 0,
            catalog: None,
            filter: String::new(),
        }
    }

    /// 运行命令循环，直到输入 quit 或标准输入结束
    pub async fn run(mut self) -> Result<()> {
        println!("{}", HELP);
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Some(line) = lines.next_line().await? {
            let command = match Command::parse(&line) {
                Ok(command) => command,
                Err(hint) => {
                    println!("{}", hint);
                    continue;
                }
            };
            if command == Command::Quit {
                break;
            }
            let output = self.handle(command).await;
            if !output.is_empty() {
                println!("{}", output);
            }
        }

        self.session.abandon();
        self.sync_timer();
        info!("👋 已退出");
        Ok(())
    }

    /// 执行一条命令并返回要展示的文本
    pub async fn handle(&mut self, command: Command) -> String {
        let output = self.dispatch(command).await;
        self.sync_timer();
        output
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// 当前显示的用时
    pub fn elapsed_secs(&self) -> u64 {
        match &self.timer_guard {
            Some(guard) => guard.elapsed_secs(),
            None => self.frozen_elapsed,
        }
    }

    async fn dispatch(&mut self, command: Command) -> String {
        match command {
            Command::Help => HELP.to_string(),
            Command::Quit => {
                self.session.abandon();
                String::new()
            }
            Command::Topics => match self.catalog_view().await {
                Ok(view) => render::render_topics(&view),
                Err(e) => error_text(&e),
            },
            Command::Exams => match self.catalog_view().await {
                Ok(view) => render::render_exams(&view),
                Err(e) => error_text(&e),
            },
            Command::Reload => match self.flow.reload_catalog().await {
                Ok(catalog) => {
                    self.catalog = Some(catalog);
                    "✓ 目录已重新加载".to_string()
                }
                Err(e) => error_text(&e),
            },
            Command::Filter(text) => {
                self.filter = text;
                match self.catalog_view().await {
                    Ok(view) if view.is_empty() => "（没有匹配的目录项）".to_string(),
                    Ok(view) => format!(
                        "{}\n{}",
                        render::render_topics(&view),
                        render::render_exams(&view)
                    ),
                    Err(e) => error_text(&e),
                }
            }
            Command::Pick(n) => self.pick(n).await,
            Command::Start => {
                let outcome = self.flow.start(&mut self.session).await;
                if !outcome.started {
                    return phase_hint(self.session.phase());
                }
                let mut out = String::new();
                if let Some(warning) = outcome.warning {
                    out.push_str(&format!("⚠️ {}\n", warning.user_message()));
                }
                self.sync_timer();
                out.push_str(&self.current_card());
                out
            }
            Command::Next => self.navigate(|s| s.next()),
            Command::Prev => self.navigate(|s| s.prev()),
            Command::Go(n) => self.navigate(|s| n.checked_sub(1).is_some_and(|i| s.go_to(i))),
            Command::Answer(position) => {
                let cursor = self.session.cursor();
                if self.session.choose(cursor, position) {
                    return self.current_card();
                }
                match self.session.current_question() {
                    _ if self.session.phase() != Phase::Running => phase_hint(self.session.phase()),
                    Some(question) if question.has_options() => {
                        format!("没有选项 {}", option_letter(position))
                    }
                    _ => render::OPTIONS_UNAVAILABLE.to_string(),
                }
            }
            Command::Clear | Command::Flag if self.session.phase() != Phase::Running => {
                phase_hint(self.session.phase())
            }
            Command::Clear => {
                let cursor = self.session.cursor();
                self.session.clear_answer(cursor);
                self.current_card()
            }
            Command::Flag => {
                let cursor = self.session.cursor();
                self.session.toggle_flag(cursor);
                self.current_card()
            }
            Command::Finish => match self.flow.finish(&mut self.session).await {
                Ok(Some(summary)) => {
                    logging::log_session_result(self.session.title(), &summary);
                    render::render_result(&summary)
                }
                Ok(None) => phase_hint(self.session.phase()),
                Err(e) => {
                    warn!("交卷失败，答案已保留: {}", e);
                    render::render_ready(&self.session)
                }
            },
            Command::New => {
                if self.flow.reset(&mut self.session) {
                    self.frozen_elapsed = 0;
                    "✓ 已开始新的一轮，输入 topics 或 exams 选择题目".to_string()
                } else {
                    phase_hint(self.session.phase())
                }
            }
        }
    }

    async fn pick(&mut self, n: usize) -> String {
        if self.session.phase() != Phase::Selecting {
            return phase_hint(self.session.phase());
        }
        let view = match self.catalog_view().await {
            Ok(view) => view,
            Err(e) => return error_text(&e),
        };
        let Some(entry) = n.checked_sub(1).and_then(|i| view.entries().into_iter().nth(i)) else {
            return format!("没有第 {} 项", n);
        };

        match self.flow.choose(&mut self.session, &entry).await {
            Ok(_) => render::render_ready(&self.session),
            Err(e) => error_text(&e),
        }
    }

    fn navigate(&mut self, step: impl FnOnce(&mut Session) -> bool) -> String {
        if step(&mut self.session) {
            self.current_card()
        } else {
            phase_hint(self.session.phase())
        }
    }

    fn current_card(&self) -> String {
        render::render_question(&self.session, self.elapsed_secs())
    }

    /// 当前过滤条件下的目录
    async fn catalog_view(&mut self) -> Result<Catalog, AppError> {
        let catalog = match &self.catalog {
            Some(catalog) => catalog.clone(),
            None => {
                let catalog = self.flow.catalog().await?;
                self.catalog = Some(catalog.clone());
                catalog
            }
        };
        Ok(catalog.filter(&self.filter))
    }

    /// 计时器只在答题阶段运行
    fn sync_timer(&mut self) {
        let running = self.session.phase() == Phase::Running;
        match (running, self.timer_guard.is_some()) {
            (true, false) => {
                self.frozen_elapsed = 0;
                self.timer_guard = Some(self.timer.start());
            }
            (false, true) => {
                if let Some(guard) = self.timer_guard.take() {
                    self.frozen_elapsed = guard.stop();
                }
            }
            _ => {}
        }
    }
}

fn error_text(err: &AppError) -> String {
    warn!("{}", err);
    format!("❌ {}", err.user_message())
}

fn phase_hint(phase: Phase) -> String {
    let hint = match phase {
        Phase::Selecting => "请先用 topics / exams 查看目录，再用 pick <n> 选择",
        Phase::Ready => "输入 start 开始答题",
        Phase::Running => "答题中：next / prev / go <n> / answer <字母> / finish",
        Phase::Result => "输入 new 开始新的一轮",
    };
    format!("当前阶段: {}。{}", phase, hint)
}
