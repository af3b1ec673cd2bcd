use serde::{Deserialize, Deserializer, Serialize};

/// 后端返回的成绩
///
/// `correct`、`wrong`、`total` 为必填字段，缺失时视为响应不合法。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    #[serde(default, alias = "session_id", deserialize_with = "optional_id")]
    pub session_id: Option<String>,
    #[serde(alias = "correctCount")]
    pub correct: u32,
    #[serde(alias = "wrongCount", alias = "incorrect")]
    pub wrong: u32,
    #[serde(alias = "totalCount")]
    pub total: u32,
    #[serde(default)]
    pub score: f64,
}

impl ScoreResult {
    pub fn new(correct: u32, wrong: u32, total: u32) -> Self {
        Self {
            session_id: None,
            correct,
            wrong,
            total,
            score: 0.0,
        }
    }
}

fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_requires_counts() {
        let ok: Result<ScoreResult, _> = serde_json::from_value(serde_json::json!({
            "sessionId": 99, "correct": 2, "wrong": 1, "total": 3, "score": 1.75
        }));
        let result = ok.unwrap();
        assert_eq!(result.session_id.as_deref(), Some("99"));
        assert_eq!(result.total, 3);

        let missing: Result<ScoreResult, _> =
            serde_json::from_value(serde_json::json!({ "message": "ok" }));
        assert!(missing.is_err());
    }
}
