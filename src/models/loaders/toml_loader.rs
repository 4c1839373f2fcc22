use crate::error::{AppError, AppResult, FileError};
use crate::models::params::DocumentParameters;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载的一份生成任务
#[derive(Debug, Clone)]
pub struct ParamsFile {
    pub path: PathBuf,
    pub params: DocumentParameters,
}

/// 解析 TOML 文本为文档参数
pub fn parse_parameters(content: &str, path: &Path) -> AppResult<DocumentParameters> {
    toml::from_str(content).map_err(|source| {
        AppError::File(FileError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    })
}

/// 从 TOML 文件加载文档参数
pub async fn load_parameters(toml_file_path: &Path) -> AppResult<DocumentParameters> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| AppError::file_read_failed(toml_file_path.display().to_string(), e))?;

    parse_parameters(&content, toml_file_path)
}

/// 从文件夹中加载所有 TOML 参数文件（按文件名排序）
///
/// 单个文件解析失败只记录警告，不影响其他文件。
pub async fn load_all_parameters(folder_path: &str) -> AppResult<Vec<ParamsFile>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(AppError::File(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        }));
    }

    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?;

    let mut toml_files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    toml_files.sort();

    let mut loaded = Vec::with_capacity(toml_files.len());
    for path in toml_files {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_parameters(&path).await {
            Ok(params) => {
                tracing::info!("成功加载参数，主题: {}", params.topic);
                loaded.push(ParamsFile { path, params });
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(loaded)
}
