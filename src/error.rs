use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误（缺少凭据等），不重试
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 生成后端调用错误
    #[error("后端错误: {0}")]
    Backend(#[from] BackendError),
    /// 输入参数校验错误
    #[error("参数错误: {0}")]
    Validation(#[from] ValidationError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 业务逻辑错误
    #[error("业务错误: {0}")]
    Business(#[from] BusinessError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 未提供后端访问凭据
    #[error("缺少后端 API 密钥 (请设置 {var_name})")]
    MissingCredential { var_name: String },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 未知的后端类型
    #[error("未知的后端类型: {value}")]
    UnknownBackend { value: String },
}

/// 生成后端错误
#[derive(Debug, Error)]
pub enum BackendError {
    /// 限流 (429) 或服务端 5xx，可重试
    #[error("后端暂时不可用 (HTTP {status}): {message}")]
    Transient { status: u16, message: String },
    /// 其他非 2xx 响应
    #[error("后端拒绝请求 (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
    /// 网络层失败
    #[error("后端请求失败 ({endpoint}): {source}")]
    Transport {
        endpoint: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 响应中没有候选内容
    #[error("后端返回结果为空 (模型: {model})")]
    EmptyResponse { model: String },
    /// 响应体无法解析
    #[error("后端响应解析失败: {source}")]
    MalformedBody {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl BackendError {
    /// 是否属于可重试的瞬时错误（HTTP 429 或 5xx）
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Transient { .. })
    }

    /// 按 HTTP 状态码分类
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if is_transient_status(status) {
            BackendError::Transient { status, message }
        } else {
            BackendError::Rejected { status, message }
        }
    }
}

/// 429 与 5xx 视为瞬时错误
pub fn is_transient_status(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

/// 参数校验错误，每一项对应一个输入字段
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("主题太短，至少需要 {min} 个字符 (当前 {actual})")]
    TopicTooShort { min: usize, actual: usize },
    #[error("主题太长，最多 {max} 个字符 (当前 {actual})")]
    TopicTooLong { max: usize, actual: usize },
    #[error("必填字段为空: {field}")]
    MissingField { field: &'static str },
    #[error("安全检查: 字段 {field} 中包含不允许的内容")]
    ForbiddenPattern { field: &'static str },
    #[error("页数目标 {value} 超出范围 [{min}, {max}]")]
    PageTargetOutOfRange { value: u32, min: u32, max: u32 },
}

impl ValidationError {
    /// 出错的输入字段名
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::TopicTooShort { .. } | ValidationError::TopicTooLong { .. } => {
                "topic"
            }
            ValidationError::MissingField { field } | ValidationError::ForbiddenPattern { field } => {
                field
            }
            ValidationError::PageTargetOutOfRange { .. } => "page_target",
        }
    }
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        source: toml::de::Error,
    },
    /// JSON 编解码失败
    #[error("JSON处理失败: {0}")]
    Json(#[from] serde_json::Error),
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 业务逻辑错误
#[derive(Debug, Error)]
pub enum BusinessError {
    /// 额度不足，不能开始生成
    #[error("额度不足 (剩余 {balance})")]
    InsufficientCredits { balance: u32 },
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::File(FileError::Json(err))
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建缺少凭据错误
    pub fn missing_credential(var_name: impl Into<String>) -> Self {
        AppError::Config(ConfigError::MissingCredential {
            var_name: var_name.into(),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 是否为可重试的后端错误
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Backend(e) if e.is_transient())
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
