use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

/// 分页约定
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pagination {
    /// `page` + `pageSize`，页码从 1 开始
    Page,
    /// `offset` + `limit`
    Offset,
}

impl FromStr for Pagination {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "page" => Ok(Pagination::Page),
            "offset" => Ok(Pagination::Offset),
            _ => Err(()),
        }
    }
}

/// 模拟考试答案的提交方式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitMode {
    /// 依次尝试候选接口，直到某个接口成功
    Fallback,
    /// 单一接口，由后端按会话类型分发
    Explicit,
}

impl FromStr for SubmitMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fallback" => Ok(SubmitMode::Fallback),
            "explicit" => Ok(SubmitMode::Explicit),
            _ => Err(()),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 后端 API 配置 ---
    pub api_base_url: String,
    pub api_token: Option<String>,
    /// 当前答题者ID（活动日志使用）
    pub user_id: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 频率限制时的最大重试次数
    pub max_retries: usize,
    // --- 题目加载 ---
    pub page_size: usize,
    pub pagination: Pagination,
    /// 逐题查询选项时的并发数
    pub option_lookup_concurrency: usize,
    // --- 提交 ---
    pub submit_mode: SubmitMode,
    // --- 其他 ---
    /// 活动日志本地兜底目录
    pub activity_fallback_dir: String,
    /// 计时器刷新间隔（毫秒）
    pub timer_tick_millis: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            api_token: None,
            user_id: "anonymous".to_string(),
            request_timeout_secs: 30,
            max_retries: 3,
            page_size: 50,
            pagination: Pagination::Page,
            option_lookup_concurrency: 8,
            submit_mode: SubmitMode::Fallback,
            activity_fallback_dir: "activity_logs".to_string(),
            timer_tick_millis: 1000,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 默认值 → 配置文件（`EXAM_CONFIG`，默认 `exam.toml`）→ 环境变量
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("EXAM_CONFIG").unwrap_or_else(|_| "exam.toml".to_string());
        let base = Self::from_file(Path::new(&path))?.unwrap_or_default();
        Ok(base.with_env())
    }

    /// 读取 TOML 配置文件，文件不存在时返回 `None`
    pub fn from_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: display.clone(),
            source,
        })?;
        Self::from_toml_str(&content, &display).map(Some)
    }

    /// 解析 TOML 文本
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::TomlParse {
            path: origin.to_string(),
            source,
        })
    }

    /// 用环境变量覆盖，无法解析的值沿用原值
    pub fn with_env(self) -> Self {
        Self {
            api_base_url: env_or("EXAM_API_BASE_URL", self.api_base_url),
            api_token: std::env::var("EXAM_API_TOKEN").ok().or(self.api_token),
            user_id: env_or("EXAM_USER_ID", self.user_id),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", self.request_timeout_secs),
            max_retries: env_parse("MAX_RETRIES", self.max_retries),
            page_size: env_parse("PAGE_SIZE", self.page_size),
            pagination: env_parse("PAGINATION", self.pagination),
            option_lookup_concurrency: env_parse(
                "OPTION_LOOKUP_CONCURRENCY",
                self.option_lookup_concurrency,
            ),
            submit_mode: env_parse("SUBMIT_MODE", self.submit_mode),
            activity_fallback_dir: env_or("ACTIVITY_FALLBACK_DIR", self.activity_fallback_dir),
            timer_tick_millis: env_parse("TIMER_TICK_MILLIS", self.timer_tick_millis),
            verbose_logging: env_parse("VERBOSE_LOGGING", self.verbose_logging),
        }
    }
}

fn env_or(name: &str, fallback: String) -> String {
    std::env::var(name).unwrap_or(fallback)
}

fn env_parse<T: FromStr>(name: &str, fallback: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            api_base_url = "https://exams.example.com"
            pagination = "offset"
            submit_mode = "explicit"
            "#,
            "inline",
        )
        .unwrap();

        assert_eq!(config.api_base_url, "https://exams.example.com");
        assert_eq!(config.pagination, Pagination::Offset);
        assert_eq!(config.submit_mode, SubmitMode::Explicit);
        assert_eq!(config.page_size, Config::default().page_size);
    }

    #[test]
    fn test_invalid_toml_reports_origin() {
        let err = Config::from_toml_str("page_size = \"many\"", "exam.toml").unwrap_err();
        assert!(err.to_string().contains("exam.toml"));
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let result = Config::from_file(Path::new("definitely/not/here.toml")).unwrap();
        assert!(result.is_none());
    }
}
