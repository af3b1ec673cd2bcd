use thiserror::Error;

/// 应用程序错误类型
///
/// 前四个变体对应界面上可区分的失败类型；其余变体包装底层错误。
#[derive(Debug, Error)]
pub enum AppError {
    /// 目录或题目列表加载失败
    #[error("目录加载失败: {reason}")]
    CatalogUnavailable { reason: String },

    /// 部分题目没有任何可用的选项来源
    #[error("{missing} 道题目的选项无法获取")]
    OptionsUnresolved { missing: usize },

    /// 所有候选提交接口均失败
    #[error("提交失败 (已尝试 {attempts} 个接口): {last}")]
    SubmissionRejected { attempts: usize, last: String },

    /// 已保存的答案引用无法解析为选项ID
    #[error("题目 {question_id} 的答案引用无法解析")]
    MalformedAnswerReference { question_id: String },

    /// 过滤后没有任何可提交的题目
    #[error("没有可提交的答题记录")]
    EmptySubmission,

    /// 选中的题目集合为空
    #[error("所选题目集合为空")]
    EmptyQuestionSet,

    /// API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 面向界面的错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    CatalogUnavailable,
    OptionsUnresolved,
    SubmissionRejected,
    MalformedAnswerReference,
    Transport,
    Config,
}

impl AppError {
    /// 获取错误分类
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::CatalogUnavailable { .. } | AppError::EmptyQuestionSet => {
                ErrorKind::CatalogUnavailable
            }
            AppError::OptionsUnresolved { .. } => ErrorKind::OptionsUnresolved,
            AppError::SubmissionRejected { .. } | AppError::EmptySubmission => {
                ErrorKind::SubmissionRejected
            }
            AppError::MalformedAnswerReference { .. } => ErrorKind::MalformedAnswerReference,
            AppError::Api(_) => ErrorKind::Transport,
            AppError::Config(_) => ErrorKind::Config,
        }
    }

    /// 展示给答题者的提示文字（每个失败领域一条）
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::CatalogUnavailable => format!("无法加载题目: {}", self),
            ErrorKind::OptionsUnresolved => "部分题目的选项暂不可用".to_string(),
            ErrorKind::SubmissionRejected => format!("答案提交失败，请重试: {}", self),
            ErrorKind::MalformedAnswerReference => format!("答案数据异常: {}", self),
            ErrorKind::Transport => format!("网络请求失败: {}", self),
            ErrorKind::Config => self.to_string(),
        }
    }

    /// 创建目录加载错误
    pub fn catalog_unavailable(reason: impl std::fmt::Display) -> Self {
        AppError::CatalogUnavailable {
            reason: reason.to_string(),
        }
    }
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP 状态码非 2xx
    #[error("API返回状态码 {status} ({endpoint}): {body}")]
    BadStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// 响应信封中的 code/success 表示失败
    #[error("API返回错误响应 ({endpoint}): code={code:?}, message={message:?}")]
    BadResponse {
        endpoint: String,
        code: Option<i64>,
        message: Option<String>,
    },

    /// API 返回空结果
    #[error("API返回空结果: {endpoint}")]
    EmptyResponse { endpoint: String },

    /// 请求频率限制
    #[error("API请求频率限制 ({endpoint}), 已重试 {attempts} 次")]
    RateLimited { endpoint: String, attempts: usize },

    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_groups_submission_failures() {
        let rejected = AppError::SubmissionRejected {
            attempts: 8,
            last: "boom".to_string(),
        };
        assert_eq!(rejected.kind(), ErrorKind::SubmissionRejected);
        assert_eq!(AppError::EmptySubmission.kind(), ErrorKind::SubmissionRejected);
        assert!(rejected.user_message().contains("boom"));
    }

    #[test]
    fn test_api_error_is_transport_kind() {
        let err: AppError = ApiError::EmptyResponse {
            endpoint: "/topics".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
