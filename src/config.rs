use crate::error::{AppError, AppResult, ConfigError};

/// API 密钥的环境变量名
pub const API_KEY_VAR: &str = "LLM_API_KEY";

/// 生成后端类型
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// Gemini generateContent 协议（支持联网检索）
    Gemini,
    /// OpenAI 兼容的 chat completions 协议
    OpenAi,
}

impl BackendKind {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(BackendKind::Gemini),
            "openai" | "openai_compatible" => Ok(BackendKind::OpenAi),
            other => Err(ConfigError::UnknownBackend {
                value: other.to_string(),
            }),
        }
    }

    /// 未设置 `LLM_API_BASE_URL` 时使用的地址
    pub fn default_base_url(self) -> &'static str {
        match self {
            BackendKind::Gemini => "https://generativelanguage.googleapis.com",
            BackendKind::OpenAi => "https://api.openai.com/v1",
        }
    }

    /// 未设置 `LLM_MODEL_NAME` 时使用的模型
    pub fn default_model(self) -> &'static str {
        match self {
            BackendKind::Gemini => "gemini-1.5-pro",
            BackendKind::OpenAi => "gpt-4o",
        }
    }
}

/// 程序配置
///
/// 在启动时显式构造，并作为参数传给各个组件；核心流程内部不读取环境变量。
#[derive(Clone, Debug)]
pub struct Config {
    // --- 生成后端配置 ---
    pub backend_kind: BackendKind,
    /// 后端访问凭据，缺失时在构造客户端时报错
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub model_name: String,
    // --- 批量运行配置 ---
    /// 存放文档参数 TOML 的目录
    pub params_folder: String,
    /// 历史记录存放目录
    pub output_dir: String,
    /// 历史记录最多保留的文档数量
    pub history_limit: usize,
    /// 同时生成的文档数量
    pub max_concurrent_runs: usize,
    /// 初始额度
    pub credits: u32,
    /// 生成前是否先润色主题
    pub refine_topic: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::for_backend(BackendKind::Gemini)
    }
}

impl Config {
    /// 指定后端类型的默认配置，地址和模型随后端类型变化
    pub fn for_backend(backend_kind: BackendKind) -> Self {
        Self {
            backend_kind,
            api_key: None,
            api_base_url: backend_kind.default_base_url().to_string(),
            model_name: backend_kind.default_model().to_string(),
            params_folder: "input_toml".to_string(),
            output_dir: "output_docs".to_string(),
            history_limit: 20,
            max_concurrent_runs: 2,
            credits: 10,
            refine_topic: false,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
        }
    }

    pub fn from_env() -> AppResult<Self> {
        let backend_kind = match std::env::var("LLM_BACKEND") {
            Ok(v) => BackendKind::parse(&v)?,
            Err(_) => BackendKind::Gemini,
        };
        let default = Self::for_backend(backend_kind);
        Ok(Self {
            backend_kind,
            api_key: std::env::var(API_KEY_VAR)
                .ok()
                .filter(|v| !v.trim().is_empty()),
            api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.api_base_url),
            model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.model_name),
            params_folder: std::env::var("PARAMS_FOLDER").unwrap_or(default.params_folder),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(default.output_dir),
            history_limit: parse_env("HISTORY_LIMIT", "usize")?.unwrap_or(default.history_limit),
            max_concurrent_runs: parse_env("MAX_CONCURRENT_RUNS", "usize")?
                .unwrap_or(default.max_concurrent_runs),
            credits: parse_env("CREDITS", "u32")?.unwrap_or(default.credits),
            refine_topic: parse_env("REFINE_TOPIC", "bool")?.unwrap_or(default.refine_topic),
            verbose_logging: parse_env("VERBOSE_LOGGING", "bool")?
                .unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        })
    }

    /// 取出 API 密钥，缺失时返回独立的配置错误
    pub fn require_api_key(&self) -> AppResult<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::missing_credential(API_KEY_VAR))
    }
}

fn parse_env<T: std::str::FromStr>(var_name: &str, expected_type: &str) -> AppResult<Option<T>> {
    let Ok(value) = std::env::var(var_name) else {
        return Ok(None);
    };
    let parsed = value.trim().parse::<T>();
    match parsed {
        Ok(parsed) => Ok(Some(parsed)),
        Err(_) => Err(ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value,
            expected_type: expected_type.to_string(),
        }
        .into()),
    }
}
