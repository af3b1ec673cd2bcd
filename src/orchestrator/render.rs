//! 终端渲染：只拼接字符串，不读写终端

use crate::models::{option_letter, Catalog};
use crate::services::ResultSummary;
use crate::workflow::{format_elapsed, Session};
use std::fmt::Write;

/// 没有选项的题目的提示
pub const OPTIONS_UNAVAILABLE: &str = "⚠️ 选项不可用，本题暂时无法作答";

/// 知识点目录（按科目分组），序号与 `pick` 命令一致
pub fn render_topics(catalog: &Catalog) -> String {
    if catalog.subjects.is_empty() {
        return "（没有可用的知识点）".to_string();
    }
    let mut out = String::new();
    let mut index = 1;
    for group in &catalog.subjects {
        let _ = writeln!(out, "📚 {}", group.name);
        for topic in &group.topics {
            let _ = write!(out, "  {:>3}. {}", index, topic.name);
            if let Some(count) = topic.question_count {
                let _ = write!(out, " ({} 题)", count);
            }
            out.push('\n');
            index += 1;
        }
    }
    out.trim_end().to_string()
}

/// 模拟考试目录，序号接在知识点之后
pub fn render_exams(catalog: &Catalog) -> String {
    if catalog.mock_exams.is_empty() {
        return "（没有可用的模拟考试）".to_string();
    }
    let offset: usize = catalog.subjects.iter().map(|g| g.topics.len()).sum();
    catalog
        .mock_exams
        .iter()
        .enumerate()
        .map(|(i, exam)| format!("  {:>3}. 📝 {}", offset + i + 1, exam))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 就绪页面
pub fn render_ready(session: &Session) -> String {
    let mut out = format!(
        "📋 {}\n共 {} 道题，输入 start 开始答题",
        session.title(),
        session.questions().len()
    );
    if let Some(err) = session.last_error() {
        let _ = write!(out, "\n❌ {}\n已保存的答案不会丢失，可以重新开始后再次交卷", err);
    }
    out
}

/// 当前题目卡片
pub fn render_question(session: &Session, elapsed_secs: u64) -> String {
    let Some(question) = session.current_question() else {
        return String::new();
    };
    let total = session.questions().len();
    let mut out = String::new();

    let _ = write!(
        out,
        "第 {}/{} 题  ⏱️ {}  已答 {}/{}",
        session.cursor() + 1,
        total,
        format_elapsed(elapsed_secs),
        session.answered_count(),
        total
    );
    if session.flagged().contains(&question.id) {
        out.push_str("  🚩");
    }
    let _ = writeln!(out, "\n{}", question.plain_text());
    if let Some(image) = question.image_ref() {
        let _ = writeln!(out, "🖼️ {}", image);
    }
    if !question.topics.is_empty() {
        let names: Vec<&str> = question.topics.iter().map(|t| t.name.as_str()).collect();
        let _ = writeln!(out, "🏷️ {}", names.join(" / "));
    }

    if !question.has_options() {
        out.push_str(OPTIONS_UNAVAILABLE);
        return out;
    }

    let chosen = session.chosen_position(session.cursor());
    for (position, option) in question.options.iter().enumerate() {
        let marker = if chosen == Some(position) { "●" } else { "○" };
        let _ = writeln!(out, "  {} {}. {}", marker, option_letter(position), option.text);
    }
    out.trim_end().to_string()
}

/// 成绩页面
pub fn render_result(summary: &ResultSummary) -> String {
    let mut out = format!("{}\n📊 成绩\n{}\n", "─".repeat(40), summary);
    if let Some(session_id) = &summary.session_id {
        let _ = writeln!(out, "记录编号: {}", session_id);
    }
    out.push_str("输入 new 开始新的一轮");
    out
}
