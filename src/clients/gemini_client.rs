/// Gemini generateContent 客户端
///
/// 封装所有与 Gemini REST API 相关的调用逻辑
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::backend::{BackendRequest, BackendResponse, Citation, GenerativeBackend};
use crate::config::Config;
use crate::error::{AppResult, BackendError};

/// Gemini 客户端
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
}

impl GeminiClient {
    /// 创建新的 Gemini 客户端，缺少密钥时直接报错
    pub fn new(config: &Config) -> AppResult<Self> {
        let api_key = config.require_api_key()?.to_string();
        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base_url, model
        )
    }
}

/// 构建请求体
fn build_body(request: &BackendRequest) -> Value {
    let mut body = json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": request.prompt }]
        }]
    });

    if let Some(system) = &request.system_instruction {
        body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
    }
    if request.json_mode {
        body["generationConfig"] = json!({ "responseMimeType": "application/json" });
    }
    if request.web_grounding {
        body["tools"] = json!([{ "googleSearch": {} }]);
    }

    body
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebChunk>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct WebChunk {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

/// 把原始响应转成统一结构
///
/// 文本取第一个候选的所有 part；引用取所有候选的检索块。
fn into_backend_response(
    raw: GenerateContentResponse,
    model: &str,
) -> Result<BackendResponse, BackendError> {
    if raw.candidates.is_empty() {
        return Err(BackendError::EmptyResponse {
            model: model.to_string(),
        });
    }

    let text = raw
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    let citations = raw
        .candidates
        .iter()
        .filter_map(|c| c.grounding_metadata.as_ref())
        .flat_map(|m| m.grounding_chunks.iter())
        .filter_map(|chunk| chunk.web.as_ref())
        .map(|web| Citation {
            uri: web.uri.clone(),
            title: web.title.clone(),
        })
        .collect();

    Ok(BackendResponse { text, citations })
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate(&self, request: &BackendRequest) -> Result<BackendResponse, BackendError> {
        let endpoint = self.endpoint(&request.model);
        debug!(
            "调用 Gemini API，模型: {}，JSON 模式: {}，联网检索: {}",
            request.model, request.json_mode, request.web_grounding
        );
        debug!("指令长度: {} 字符", request.prompt.chars().count());

        let response = self
            .http
            .post(&endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&build_body(request))
            .send()
            .await
            .map_err(|e| BackendError::Transport {
                endpoint: endpoint.clone(),
                source: Box::new(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::from_status(status.as_u16(), message));
        }

        let raw: GenerateContentResponse =
            response
                .json()
                .await
                .map_err(|e| BackendError::MalformedBody {
                    source: Box::new(e),
                })?;

        debug!("Gemini API 调用成功");

        into_backend_response(raw, &request.model)
    }
}
