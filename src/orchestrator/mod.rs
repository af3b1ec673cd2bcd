//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责读取答题者的命令并驱动一次次答题会话，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `exam_app` - 控制台答题应用
//! - 管理应用生命周期（初始化、命令循环、退出）
//! - 独占 `Session`，按阶段启动/停止计时器
//!
//! ### `command` - 命令解析
//!
//! ### `render` - 题目卡片、目录和成绩的文本渲染
//!
//! ## 层次关系
//!
//! ```text
//! exam_app (命令循环 + Session + TimerGuard)
//!     ↓
//! workflow::ExamFlow (阶段转换)
//!     ↓
//! services (能力层：catalog / resolver / reconciler / activity)
//!     ↓
//! clients → infrastructure (Transport)
//! ```

pub mod command;
pub mod exam_app;
pub mod render;

// 重新导出主要类型
pub use command::Command;
pub use exam_app::App;
