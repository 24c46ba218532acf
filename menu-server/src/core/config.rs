use std::path::PathBuf;

use crate::db::memory::DEFAULT_SUBSCRIPTION_BUFFER;

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (本地存储: 购物车、记住的邮箱) |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 (`RUST_LOG` 优先) |
/// | LOG_DIR | - | 日志目录，存在时按天滚动写文件 |
/// | ADMIN_EMAIL | - | 启动时注册的管理员邮箱 |
/// | ADMIN_PASSWORD_HASH | - | 管理员密码 (argon2 PHC 字符串) |
/// | SUBSCRIPTION_BUFFER | 16 | 实时订阅通道容量 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/cardapio HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    /// 管理员账号，两项都设置时才注册
    pub admin_email: Option<String>,
    pub admin_password_hash: Option<String>,
    /// 实时订阅通道容量
    pub subscription_buffer: usize,
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// 从环境变量加载配置，未设置时使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: env_opt("LOG_DIR"),
            admin_email: env_opt("ADMIN_EMAIL"),
            admin_password_hash: env_opt("ADMIN_PASSWORD_HASH"),
            subscription_buffer: std::env::var("SUBSCRIPTION_BUFFER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SUBSCRIPTION_BUFFER),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 本地存储目录
    pub fn storage_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("storage")
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_overrides() {
        let config = Config::with_overrides("/tmp/cardapio", 8080);
        assert_eq!(config.work_dir, "/tmp/cardapio");
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.storage_dir(), PathBuf::from("/tmp/cardapio/storage"));
        assert!(config.subscription_buffer >= 1);
    }
}
