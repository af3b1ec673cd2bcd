//! 成绩展示 - 纯计算，不做 I/O

use crate::models::ScoreResult;
use std::fmt;

/// 成绩评价
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// 正确率 ≥ 70%
    Strong,
    /// 正确率 ≥ 40%
    Developing,
    NeedsWork,
    /// 没有题目，无法评价
    Neutral,
}

impl Verdict {
    pub fn message(self) -> &'static str {
        match self {
            Verdict::Strong => "表现优秀，继续保持！",
            Verdict::Developing => "基础不错，仍有提升空间",
            Verdict::NeedsWork => "需要加强练习",
            Verdict::Neutral => "本次没有可统计的题目",
        }
    }
}

/// 展示用的成绩统计
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSummary {
    pub correct: u32,
    pub wrong: u32,
    pub blank: u32,
    pub total: u32,
    /// 正确 − 错误/4，保留两位小数
    pub net: f64,
    /// 正确率，总数为 0 时为 `None`
    pub ratio: Option<f64>,
    pub verdict: Verdict,
    pub score: f64,
    pub session_id: Option<String>,
}

/// 由成绩计算展示统计
pub fn summarize(result: &ScoreResult) -> ResultSummary {
    let blank = result
        .total
        .saturating_sub(result.correct)
        .saturating_sub(result.wrong);
    let net = round2(f64::from(result.correct) - f64::from(result.wrong) / 4.0);

    let ratio = (result.total > 0).then(|| f64::from(result.correct) / f64::from(result.total));
    let verdict = match ratio {
        None => Verdict::Neutral,
        Some(r) if r >= 0.70 => Verdict::Strong,
        Some(r) if r >= 0.40 => Verdict::Developing,
        Some(_) => Verdict::NeedsWork,
    };

    ResultSummary {
        correct: result.correct,
        wrong: result.wrong,
        blank,
        total: result.total,
        net,
        ratio,
        verdict,
        score: result.score,
        session_id: result.session_id.clone(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl fmt::Display for ResultSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "正确: {}  错误: {}  未答: {}  共 {} 题",
            self.correct, self.wrong, self.blank, self.total
        )?;
        writeln!(f, "净得分: {:.2}", self.net)?;
        match self.ratio {
            Some(ratio) => writeln!(f, "正确率: {:.1}%", ratio * 100.0)?,
            None => writeln!(f, "正确率: -")?,
        }
        write!(f, "{}", self.verdict.message())
    }
}
