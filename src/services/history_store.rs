//! 文档历史 - 业务能力层
//!
//! 只负责"保存生成结果"能力：JSON 文件，新的在前，最多保留固定条数。

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Document;

/// 文档历史
///
/// 同一进程内的读写经由内部锁串行化；不处理跨进程并发。
pub struct HistoryStore {
    path: PathBuf,
    limit: usize,
    lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>, limit: usize) -> Self {
        Self {
            path: path.into(),
            limit,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 保存文档，缺少 ID 和创建时间时补上，返回保存后的文档
    ///
    /// 同 ID 的旧记录会被替换；超出上限时丢弃最早的记录。
    pub async fn save(&self, mut document: Document) -> AppResult<Document> {
        let _guard = self.lock.lock().await;

        let id = document
            .id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();
        document
            .created_at
            .get_or_insert_with(|| Utc::now().to_rfc3339());

        let mut history = self.read_history().await?;
        history.retain(|d| d.id.as_deref() != Some(id.as_str()));
        history.insert(0, document.clone());
        if history.len() > self.limit {
            debug!("历史记录超过 {} 条，丢弃 {} 条", self.limit, history.len() - self.limit);
            history.truncate(self.limit);
        }

        self.write_history(&history).await?;
        Ok(document)
    }

    /// 全部记录，新的在前
    pub async fn all(&self) -> AppResult<Vec<Document>> {
        let _guard = self.lock.lock().await;
        self.read_history().await
    }

    pub async fn get(&self, id: &str) -> AppResult<Option<Document>> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .find(|d| d.id.as_deref() == Some(id)))
    }

    /// 删除记录，返回是否找到
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let _guard = self.lock.lock().await;
        let mut history = self.read_history().await?;
        let before = history.len();
        history.retain(|d| d.id.as_deref() != Some(id));
        if history.len() == before {
            return Ok(false);
        }
        self.write_history(&history).await?;
        Ok(true)
    }

    /// 文件不存在或内容损坏时视为空历史
    async fn read_history(&self) -> AppResult<Vec<Document>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::file_read_failed(self.path.display().to_string(), e)),
        };

        match serde_json::from_str::<Vec<Document>>(&content) {
            Ok(history) => Ok(history),
            Err(e) => {
                warn!("历史文件 {} 无法解析，按空历史处理: {}", self.path.display(), e);
                Ok(Vec::new())
            }
        }
    }

    async fn write_history(&self, history: &[Document]) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::file_write_failed(parent.display().to_string(), e))?;
        }
        let json = serde_json::to_string_pretty(history)?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| AppError::file_write_failed(self.path.display().to_string(), e))
    }
}
