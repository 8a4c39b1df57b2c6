//! 配置模块
//!
//! env 文件只用来填充一个显式的 [`Config`] 对象，任何业务逻辑都不读取
//! 进程环境变量，也不通过 `set_var` 修改它。
//! 已存在的进程环境变量优先于 env 文件中的值。

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{AppError, Result};

/// Vision API 默认地址
pub const DEFAULT_VISION_API_BASE_URL: &str = "https://vision.googleapis.com";
/// Groq API 默认地址（OpenAI 兼容）
pub const DEFAULT_LLM_API_BASE_URL: &str = "https://api.groq.com/openai/v1";
/// 默认模型
pub const DEFAULT_LLM_MODEL_NAME: &str = "llama3-70b-8192";
/// LLM 请求默认超时（秒）
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// Google Vision 凭证文件路径
    pub vision_credentials_path: String,
    /// Vision API 基础 URL
    pub vision_api_base_url: String,
    /// Groq API 密钥
    pub groq_api_key: String,
    /// LLM API 基础 URL
    pub llm_api_base_url: String,
    /// LLM 模型名称
    pub llm_model_name: String,
    /// LLM 请求超时（秒）
    pub llm_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vision_credentials_path: String::new(),
            vision_api_base_url: DEFAULT_VISION_API_BASE_URL.to_string(),
            groq_api_key: String::new(),
            llm_api_base_url: DEFAULT_LLM_API_BASE_URL.to_string(),
            llm_model_name: DEFAULT_LLM_MODEL_NAME.to_string(),
            llm_timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// 从进程环境变量和 env 文件内容构建配置
    ///
    /// 每一项按 进程环境变量 → env 文件 → 默认值 的顺序解析。
    pub fn resolve(env_file: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            env::var(key)
                .ok()
                .filter(|v| !v.is_empty())
                .or_else(|| env_file.get(key).cloned())
        };

        let default = Self::default();
        Self {
            vision_credentials_path: get("GOOGLE_APPLICATION_CREDENTIALS")
                .unwrap_or(default.vision_credentials_path),
            vision_api_base_url: get("VISION_API_BASE_URL").unwrap_or(default.vision_api_base_url),
            groq_api_key: get("GROQ_API_KEY").unwrap_or(default.groq_api_key),
            llm_api_base_url: get("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: get("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_timeout_secs: get("LLM_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.llm_timeout_secs),
        }
    }

    /// 校验两项凭证，在任何网络调用之前执行
    ///
    /// 凭证路径为相对路径时先做解析，之后配置中保存解析后的绝对路径。
    /// 任何一项缺失都会直接中止整次运行。
    pub fn validate(&mut self) -> Result<()> {
        if self.vision_credentials_path.is_empty() {
            return Err(AppError::Config(
                "GOOGLE_APPLICATION_CREDENTIALS 环境变量未设置".to_string(),
            ));
        }

        let resolved = resolve_credentials_path(&self.vision_credentials_path);
        if !resolved.exists() {
            return Err(AppError::Config(format!(
                "凭证文件不存在: {}",
                resolved.display()
            )));
        }
        self.vision_credentials_path = resolved.to_string_lossy().into_owned();

        if self.groq_api_key.is_empty() {
            return Err(AppError::Config("GROQ_API_KEY 环境变量未设置".to_string()));
        }

        Ok(())
    }
}

/// 解析凭证文件的相对路径
///
/// 以可执行文件所在目录的上一级为基准；该候选不存在时退回按工作目录解析。
fn resolve_credentials_path(path: &str) -> PathBuf {
    let p = PathBuf::from(path);
    if p.is_absolute() {
        return p;
    }

    if let Some(root) = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().and_then(Path::parent).map(Path::to_path_buf))
    {
        let candidate = root.join(&p);
        if candidate.exists() {
            return candidate;
        }
    }

    p
}

/// 读取 `KEY=VALUE` 格式的 env 文件
///
/// 跳过空行和 `#` 注释行，去掉值两侧成对的单引号或双引号。
/// 文件缺失或读取失败都只记录日志并返回空表，绝不向外传播。
pub fn load_env_file(path: &Path) -> HashMap<String, String> {
    let mut vars = HashMap::new();

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("env 文件不存在: {}", path.display());
            return vars;
        }
        Err(e) => {
            warn!("读取 env 文件失败 ({}): {}", path.display(), e);
            return vars;
        }
    };

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        vars.insert(key.to_string(), strip_quotes(value.trim()).to_string());
    }

    debug!("从 {} 加载了 {} 个变量", path.display(), vars.len());
    vars
}

/// 去掉值两侧成对的引号
fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_env_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_env_file_basic() {
        let file = write_env_file(
            "# 注释行\n\
             GROQ_API_KEY=gsk_test123\n\
             \n\
             GOOGLE_APPLICATION_CREDENTIALS=\"/tmp/cred.json\"\n\
             LLM_MODEL_NAME='llama3-70b-8192'\n\
             这一行没有等号\n",
        );

        let vars = load_env_file(file.path());
        assert_eq!(vars.get("GROQ_API_KEY").map(String::as_str), Some("gsk_test123"));
        assert_eq!(
            vars.get("GOOGLE_APPLICATION_CREDENTIALS").map(String::as_str),
            Some("/tmp/cred.json")
        );
        assert_eq!(
            vars.get("LLM_MODEL_NAME").map(String::as_str),
            Some("llama3-70b-8192")
        );
        assert_eq!(vars.len(), 3);
    }

    #[test]
    fn test_load_env_file_keeps_unpaired_quotes() {
        let file = write_env_file("A=\"开头有引号\nB=c=d\n");
        let vars = load_env_file(file.path());
        assert_eq!(vars.get("A").map(String::as_str), Some("\"开头有引号"));
        // 只在第一个等号处切分
        assert_eq!(vars.get("B").map(String::as_str), Some("c=d"));
    }

    #[test]
    fn test_load_env_file_missing_is_empty() {
        let vars = load_env_file(Path::new("/nonexistent/.env"));
        assert!(vars.is_empty());
    }

    #[test]
    fn test_resolve_prefers_process_env() {
        // 其他测试不碰 LLM_MODEL_NAME，这里可以安全设置
        env::set_var("LLM_MODEL_NAME", "env-model");
        let mut file_vars = HashMap::new();
        file_vars.insert("LLM_MODEL_NAME".to_string(), "file-model".to_string());
        file_vars.insert("LLM_TIMEOUT_SECS".to_string(), "5".to_string());

        let config = Config::resolve(&file_vars);
        // 进程环境变量优先；LLM_TIMEOUT_SECS 只在文件里，取文件值
        assert_eq!(config.llm_model_name, "env-model");
        assert_eq!(config.llm_timeout_secs, 5);
        env::remove_var("LLM_MODEL_NAME");
    }

    #[test]
    fn test_resolve_defaults() {
        let config = Config::resolve(&HashMap::new());
        assert_eq!(config.vision_api_base_url, DEFAULT_VISION_API_BASE_URL);
        assert_eq!(config.llm_api_base_url, DEFAULT_LLM_API_BASE_URL);
        assert_eq!(config.llm_timeout_secs, DEFAULT_LLM_TIMEOUT_SECS);
    }

    #[test]
    fn test_validate_missing_credentials_path() {
        let mut config = Config {
            groq_api_key: "gsk_test".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("GOOGLE_APPLICATION_CREDENTIALS"));
    }

    #[test]
    fn test_validate_nonexistent_credentials_file() {
        let mut config = Config {
            vision_credentials_path: "/nonexistent/cred.json".to_string(),
            groq_api_key: "gsk_test".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("凭证文件不存在"));
    }

    #[test]
    fn test_validate_missing_api_key() {
        let cred = write_env_file("{\"api_key\": \"vision-key\"}");
        let mut config = Config {
            vision_credentials_path: cred.path().to_string_lossy().into_owned(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[test]
    fn test_validate_ok() {
        let cred = write_env_file("{\"api_key\": \"vision-key\"}");
        let mut config = Config {
            vision_credentials_path: cred.path().to_string_lossy().into_owned(),
            groq_api_key: "gsk_test".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
