use actix_web::{get, HttpResponse, Responder};
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::CONFIG;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// 代理转发的上游地址
    pub upstream: String,
    pub api_key_configured: bool,
}

/// 健康检查端点
///
/// 只反映本服务是否存活，不会探测上游 API。
#[utoipa::path(
    get,
    path = "/health",
    tag = "Status",
    responses(
        (status = 200, description = "服务健康", body = HealthResponse)
    )
)]
#[get("/health")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        upstream: CONFIG.api_base_url.clone(),
        api_key_configured: !CONFIG.api_key.trim().is_empty(),
    })
}
