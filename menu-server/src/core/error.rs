//! 启动期错误
//!
//! 请求处理用 [`AppError`]; 这里只覆盖服务器启动和监听。

use thiserror::Error;

use crate::utils::AppError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("初始化失败: {0}")]
    Init(#[from] AppError),

    #[error("网络错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("内部服务器错误: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
