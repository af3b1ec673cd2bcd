//! # Mock Exam Client
//!
//! 一个在终端里刷题、参加模拟考试的 Rust 客户端
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有唯一的 HTTP Client，只暴露"发送请求"能力
//! - `Transport` - 传输层抽象，测试中可替换
//!
//! ### ② 接口层（Clients）
//! - `clients/` - 后端接口路径、分页和响应结构的适配
//!
//! ### ③ 业务能力层（Services）
//! - `CatalogService` - 目录加载（幂等）
//! - `OptionResolver` - 选项补全
//! - `SubmissionReconciler` - 答案提交
//! - `ActivityLogger` - 活动日志
//! - `result_presenter` - 成绩统计
//!
//! ### ④ 流程层（Workflow）
//! - `Session` - 选择 → 就绪 → 答题中 → 结果 的状态机
//! - `SessionTimer` - 只在答题阶段运行的计时器
//! - `ExamFlow` - 阶段转换与业务能力的衔接
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/exam_app` - 控制台命令循环
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
#[cfg(any(test, feature = "testutil"))]
pub mod testutil;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{HttpExecutor, Transport};
pub use models::{Question, SessionKind};
pub use orchestrator::App;
pub use workflow::{ExamFlow, Phase, Session};
