use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::pricing::{PlanCatalog, NOMINAL_HORIZON_MONTHS};

/// 설정 파일 기본 경로.
pub const DEFAULT_CONFIG_PATH: &str = "kenit.toml";

fn default_horizon() -> u32 {
    NOMINAL_HORIZON_MONTHS
}

/// 애플리케이션 설정을 표현한다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// 마지막으로 선택한 플랜 ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_plan: Option<String>,
    /// UI 언어 코드 (pt-br / en)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default = "default_horizon")]
    pub horizon_months: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            selected_plan: None,
            language: None,
            horizon_months: NOMINAL_HORIZON_MONTHS,
        }
    }
}

/// 설정 로드/저장 시 발생 가능한 오류를 표현한다.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("파일 입출력 오류: {0}")]
    Io(#[from] std::io::Error),
    #[error("설정 파싱 오류: {0}")]
    Serde(#[from] toml::de::Error),
    #[error("설정 직렬화 오류: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// 설정 파일을 엄격하게 읽는다.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    let cfg: Config = toml::from_str(&content)?;
    Ok(cfg)
}

/// 설정 파일을 읽는다. 없거나 읽을 수 없으면 기본 설정을 사용하며 실패하지 않는다.
pub fn load_or_default(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }
    match load(path) {
        Ok(cfg) => cfg,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "config unreadable, using defaults");
            Config::default()
        }
    }
}

impl Config {
    /// 설정을 TOML 파일로 저장한다.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!(path = %path.display(), "config saved");
        Ok(())
    }

    /// 저장된 플랜이 카탈로그에 있으면 그 ID, 없으면 기본 플랜 ID.
    pub fn resolve_plan<'a>(&'a self, catalog: &'a PlanCatalog) -> &'a str {
        match self.selected_plan.as_deref() {
            Some(id) if catalog.contains(id) => id,
            Some(id) => {
                warn!(plan = id, "saved plan not in catalog");
                catalog.fallback_id()
            }
            None => catalog.fallback_id(),
        }
    }
}
