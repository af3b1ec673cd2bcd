/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use crate::config::Config;
use crate::services::result_presenter::ResultSummary;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// `RUST_LOG` 优先；否则按 `verbose` 选择 `debug` 或 `info`
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 重复初始化（例如测试中）直接忽略
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 模拟考试答题模式");
    info!("🌐 后端地址: {}", config.api_base_url);
    info!("👤 答题者: {}", config.user_id);
    info!("📮 提交方式: {:?}", config.submit_mode);
    info!("{}", "=".repeat(60));
}

/// 记录一次答题的最终结果
pub fn log_session_result(label: &str, summary: &ResultSummary) {
    info!("\n{}", "─".repeat(60));
    info!("📊 {} 答题完成", label);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!(
        "✅ 正确: {} | ❌ 错误: {} | ⬜ 未答: {} | 共 {} 题",
        summary.correct, summary.wrong, summary.blank, summary.total
    );
    info!("净得分: {:.2}", summary.net);
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("下列说法正确的是", 4), "下列说法...");
        assert_eq!(truncate_text("short", 10), "short");
    }
}
