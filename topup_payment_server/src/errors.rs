use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use thiserror::Error;
use topup_payment_engine::{CallbackError, OrderFlowError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("{0}")]
    OrderError(#[from] OrderFlowError),
    #[error("{0}")]
    CallbackRejected(#[from] CallbackError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::OrderError(e) => match e {
                OrderFlowError::ItemNotFound | OrderFlowError::CategoryNotFound => StatusCode::NOT_FOUND,
                OrderFlowError::Pricing(_) => StatusCode::BAD_REQUEST,
                OrderFlowError::InvalidDepositAmount(_) => StatusCode::BAD_REQUEST,
                OrderFlowError::InsufficientBalance => StatusCode::PAYMENT_REQUIRED,
                OrderFlowError::Unauthorized => StatusCode::FORBIDDEN,
                OrderFlowError::GatewayRejected(_) | OrderFlowError::ProviderFailed(_) => StatusCode::BAD_GATEWAY,
                OrderFlowError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::CallbackRejected(e) => match e {
                CallbackError::MissingFields(_) => StatusCode::BAD_REQUEST,
                CallbackError::MerchantMismatch => StatusCode::BAD_REQUEST,
                CallbackError::InvalidSignature => StatusCode::BAD_REQUEST,
                CallbackError::TransactionNotFound(_) => StatusCode::NOT_FOUND,
                CallbackError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "success": false, "message": self.to_string() }).to_string())
    }
}
