//! Unified error codes for the menu server
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 4xxx: Order errors
//! - 6xxx: Product errors
//! - 7xxx: Cart errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so that the web client can
/// switch on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,
    /// The user declined a confirmation
    Declined = 9,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Session token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1007,
    /// Email address is malformed
    InvalidEmail = 1008,
    /// No account registered for the email
    UserNotFound = 1009,
    /// Password does not match
    WrongPassword = 1010,
    /// Too many failed attempts
    TooManyAttempts = 1011,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has already been finalized
    OrderAlreadyFinalized = 4003,
    /// Order has already been cancelled
    OrderAlreadyCancelled = 4004,
    /// Generated order id already exists
    OrderIdCollision = 4005,
    /// Order submission failed
    OrderSubmitFailed = 4006,
    /// Cancellation reason is required
    CancelReasonRequired = 4007,
    /// No pending orders to finalize
    NoPendingOrders = 4008,
    /// No orders to export
    NothingToExport = 4009,

    // ==================== 6xxx: Product ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Product price is invalid
    ProductInvalidPrice = 6002,
    /// Product is out of stock
    ProductOutOfStock = 6003,
    /// Requested quantity exceeds stock
    ProductInsufficientStock = 6004,
    /// Product image URL is invalid
    ProductInvalidImageUrl = 6005,
    /// Product name is required
    ProductNameRequired = 6006,
    /// Addon product needs at least one category
    AddonCategoryRequired = 6007,

    // ==================== 7xxx: Cart ====================
    /// Cart is empty
    CartEmpty = 7001,
    /// Cart line not found
    CartItemNotFound = 7002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Local storage error
    StorageError = 9006,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::Declined => "Operation declined by the user",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenInvalid => "Session token is invalid",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::InvalidEmail => "Email address is invalid",
            ErrorCode::UserNotFound => "No user registered with this email",
            ErrorCode::WrongPassword => "Wrong password",
            ErrorCode::TooManyAttempts => "Too many attempts, try again later",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderAlreadyFinalized => "Order has already been finalized",
            ErrorCode::OrderAlreadyCancelled => "Order has already been cancelled",
            ErrorCode::OrderIdCollision => "Order id already exists",
            ErrorCode::OrderSubmitFailed => "Order submission failed",
            ErrorCode::CancelReasonRequired => "Cancellation reason is required",
            ErrorCode::NoPendingOrders => "No pending orders",
            ErrorCode::NothingToExport => "No orders to export",

            // Product
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductInvalidPrice => "Product price is invalid",
            ErrorCode::ProductOutOfStock => "Product is out of stock",
            ErrorCode::ProductInsufficientStock => "Insufficient stock",
            ErrorCode::ProductInvalidImageUrl => "Product image URL is invalid",
            ErrorCode::ProductNameRequired => "Product name is required",
            ErrorCode::AddonCategoryRequired => "Addon needs at least one category",

            // Cart
            ErrorCode::CartEmpty => "Cart is empty",
            ErrorCode::CartItemNotFound => "Cart item not found",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::StorageError => "Local storage error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            7 => Ok(ErrorCode::RequiredField),
            9 => Ok(ErrorCode::Declined),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1004 => Ok(ErrorCode::TokenInvalid),
            1007 => Ok(ErrorCode::AccountDisabled),
            1008 => Ok(ErrorCode::InvalidEmail),
            1009 => Ok(ErrorCode::UserNotFound),
            1010 => Ok(ErrorCode::WrongPassword),
            1011 => Ok(ErrorCode::TooManyAttempts),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4003 => Ok(ErrorCode::OrderAlreadyFinalized),
            4004 => Ok(ErrorCode::OrderAlreadyCancelled),
            4005 => Ok(ErrorCode::OrderIdCollision),
            4006 => Ok(ErrorCode::OrderSubmitFailed),
            4007 => Ok(ErrorCode::CancelReasonRequired),
            4008 => Ok(ErrorCode::NoPendingOrders),
            4009 => Ok(ErrorCode::NothingToExport),

            // Product
            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::ProductInvalidPrice),
            6003 => Ok(ErrorCode::ProductOutOfStock),
            6004 => Ok(ErrorCode::ProductInsufficientStock),
            6005 => Ok(ErrorCode::ProductInvalidImageUrl),
            6006 => Ok(ErrorCode::ProductNameRequired),
            6007 => Ok(ErrorCode::AddonCategoryRequired),

            // Cart
            7001 => Ok(ErrorCode::CartEmpty),
            7002 => Ok(ErrorCode::CartItemNotFound),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9006 => Ok(ErrorCode::StorageError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::NotFound.code(), 3);
        assert_eq!(ErrorCode::Declined.code(), 9);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::CancelReasonRequired.code(), 4007);
        assert_eq!(ErrorCode::ProductOutOfStock.code(), 6003);
        assert_eq!(ErrorCode::CartEmpty.code(), 7001);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_try_from_covers_every_variant() {
        let all = [
            ErrorCode::ValidationFailed,
            ErrorCode::NotFound,
            ErrorCode::AlreadyExists,
            ErrorCode::InvalidRequest,
            ErrorCode::RequiredField,
            ErrorCode::Declined,
            ErrorCode::NotAuthenticated,
            ErrorCode::TokenInvalid,
            ErrorCode::AccountDisabled,
            ErrorCode::InvalidEmail,
            ErrorCode::UserNotFound,
            ErrorCode::WrongPassword,
            ErrorCode::TooManyAttempts,
            ErrorCode::OrderNotFound,
            ErrorCode::OrderAlreadyFinalized,
            ErrorCode::OrderAlreadyCancelled,
            ErrorCode::OrderIdCollision,
            ErrorCode::OrderSubmitFailed,
            ErrorCode::CancelReasonRequired,
            ErrorCode::NoPendingOrders,
            ErrorCode::NothingToExport,
            ErrorCode::ProductNotFound,
            ErrorCode::ProductInvalidPrice,
            ErrorCode::ProductOutOfStock,
            ErrorCode::ProductInsufficientStock,
            ErrorCode::ProductInvalidImageUrl,
            ErrorCode::ProductNameRequired,
            ErrorCode::AddonCategoryRequired,
            ErrorCode::CartEmpty,
            ErrorCode::CartItemNotFound,
            ErrorCode::InternalError,
            ErrorCode::DatabaseError,
            ErrorCode::NetworkError,
            ErrorCode::StorageError,
        ];
        for code in all {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(0), Err(InvalidErrorCode(0)));
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(5001), Err(InvalidErrorCode(5001)));
    }

    #[test]
    fn test_serialize() {
        assert_eq!(serde_json::to_string(&ErrorCode::NotFound).unwrap(), "3");
        assert_eq!(
            serde_json::to_string(&ErrorCode::OrderNotFound).unwrap(),
            "4001"
        );
    }

    #[test]
    fn test_deserialize() {
        let code: ErrorCode = serde_json::from_str("6003").unwrap();
        assert_eq!(code, ErrorCode::ProductOutOfStock);

        let result: Result<ErrorCode, _> = serde_json::from_str("10000");
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ErrorCode::Declined), "9");
        assert_eq!(format!("{}", ErrorCode::InternalError), "9001");
    }

    #[test]
    fn test_message() {
        assert_eq!(ErrorCode::NotFound.message(), "Resource not found");
        assert_eq!(ErrorCode::OrderNotFound.message(), "Order not found");
        assert_eq!(ErrorCode::InternalError.message(), "Internal server error");
    }
}
