use anyhow::{anyhow, Result};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct VestnikConfig {
    pub api_port: u16,
    pub paths: VestnikPaths,
    pub auth: AuthConfig,
}

impl VestnikConfig {
    pub fn from_env() -> Result<Self> {
        let paths = match env::var("VESTNIK_DATA_DIR") {
            Ok(dir) if !dir.trim().is_empty() => VestnikPaths::from_base_dir(dir)?,
            _ => VestnikPaths::discover()?,
        };
        let api_port = env::var("VESTNIK_API_PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(8080);
        let auth = AuthConfig::from_env()?;
        Ok(Self {
            api_port,
            paths,
            auth,
        })
    }

    pub fn new(api_port: u16, paths: VestnikPaths, auth: AuthConfig) -> Self {
        Self {
            api_port,
            paths,
            auth,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    /// Optional operator override accepted in place of any account password.
    pub master_password: Option<String>,
}

/// Default token lifetime: 30 days.
const DEFAULT_TOKEN_TTL_SECS: i64 = 60 * 60 * 24 * 30;

impl AuthConfig {
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("VESTNIK_JWT_SECRET")
            .map_err(|_| anyhow!("VESTNIK_JWT_SECRET must be set"))?;
        let token_ttl_secs = env::var("VESTNIK_TOKEN_TTL_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_TOKEN_TTL_SECS);
        let master_password = env::var("VESTNIK_MASTER_PASSWORD")
            .ok()
            .filter(|raw| !raw.trim().is_empty());
        Ok(Self {
            jwt_secret,
            token_ttl_secs,
            master_password,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct VestnikPaths {
    pub base: PathBuf,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub images_dir: PathBuf,
}

impl VestnikPaths {
    pub fn discover() -> Result<Self> {
        let exe_path = std::env::current_exe()
            .map_err(|err| anyhow!("failed to resolve current executable: {err}"))?;
        let base = exe_path
            .parent()
            .ok_or_else(|| anyhow!("executable path missing parent"))?
            .to_path_buf();
        Self::from_base_dir(base)
    }

    pub fn from_base_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let data_dir = base.join("data");
        let db_path = data_dir.join("vestnik.db");
        let images_dir = base.join("images");

        Ok(Self {
            base,
            data_dir,
            db_path,
            images_dir,
        })
    }
}
