use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum AppError {
    /// 上游返回了非 2xx 状态码
    #[error("Failed to fetch data from external API")]
    Upstream(u16),

    #[error("找不到卡牌: {0}")]
    CardNotFound(String),

    #[error("错误的请求: {0}")]
    BadRequest(String),

    #[error("Server error")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Serde JSON错误: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl AppError {
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Upstream(_) => "upstream_error",
            AppError::CardNotFound(_) => "card_not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::ReqwestError(_) => "request_error",
            AppError::SerdeJsonError(_) => "serialization_error",
            AppError::ConfigError(_) => "configuration_error",
            AppError::InternalError(_) => "internal_error",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Upstream(code) => {
                StatusCode::from_u16(*code).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::CardNotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ReqwestError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // 上游返回了无法解析的 JSON
            AppError::SerdeJsonError(_) => StatusCode::BAD_GATEWAY,
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            log::error!("请求失败 ({}): {:?}", status_code, self);
        } else {
            log::warn!("请求失败 ({}): {}", status_code, self);
        }

        HttpResponse::build(status_code).json(ErrorResponse {
            error: self.error_type().to_string(),
            message: self.to_string(),
        })
    }
}
