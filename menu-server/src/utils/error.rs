//! 统一错误处理
//!
//! 错误类型定义在 `shared::error`，这里只做 re-export 和 handler 辅助函数。
//!
//! ```ignore
//! // 返回错误
//! Err(AppError::new(ErrorCode::OrderNotFound))
//!
//! // 返回成功响应
//! Ok(ok(receipt))
//! ```

use axum::Json;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

/// Create a successful response
pub fn ok<T>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}

/// Create a successful response with a user-facing message
pub fn ok_with_message<T>(data: T, message: impl Into<String>) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success_with_message(message, data))
}
