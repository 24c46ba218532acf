//! 认证模块
//!
//! - [`IdentityProvider`] - 外部身份服务抽象 (登录 / 重置密码 / 退出 / 会话变化)
//! - [`MemoryIdentityProvider`] - 进程内实现 (Argon2 密码哈希)
//! - [`AuthService`] - 登录页逻辑 (记住邮箱, 最近访问时间)
//! - [`CurrentUser`] - 从 `Authorization: Bearer` 提取当前用户

pub mod extractor;
pub mod memory;
pub mod provider;
pub mod service;

pub use memory::{MemoryIdentityProvider, hash_password};
pub use provider::{AuthError, CurrentUser, IdentityProvider, Session, SessionEvent};
pub use service::AuthService;
