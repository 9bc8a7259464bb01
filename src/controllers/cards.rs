use actix_web::{get, web, HttpRequest, HttpResponse};

use crate::config::CONFIG;
use crate::models::{CardSearch, CardSearchParams};
use crate::services::catalog::{CatalogService, RawBody};
use crate::utils::error::{AppResult, ErrorResponse};

fn passthrough(raw: RawBody) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(raw.content_type)
        .body(raw.bytes)
}

/// 卡牌检索代理
///
/// 把页码、每页数量和筛选条件转换为上游的 `page`/`pageSize`/`q` 参数，
/// 附带服务端保存的 API Key 转发请求，并原样返回上游 JSON。
#[utoipa::path(
    get,
    path = "/api/pokemonCards",
    tag = "Cards",
    params(CardSearchParams),
    responses(
        (status = 200, description = "上游响应原文", body = serde_json::Value),
        (status = 400, description = "参数无效", body = ErrorResponse),
        (status = 500, description = "服务器错误", body = ErrorResponse)
    )
)]
#[get("/api/pokemonCards")]
pub async fn proxy_cards(
    req: HttpRequest,
    catalog: web::Data<CatalogService>,
) -> AppResult<HttpResponse> {
    let search = CardSearch::from_query_string(req.query_string(), CONFIG.default_page_size)?;
    let raw = catalog.search_cards(&search).await?;
    Ok(passthrough(raw))
}

/// 获取单张卡牌
#[utoipa::path(
    get,
    path = "/api/cards/{id}",
    tag = "Cards",
    params(("id" = String, Path, description = "卡牌 ID，如 xy7-54")),
    responses(
        (status = 200, description = "上游响应原文", body = serde_json::Value),
        (status = 404, description = "卡牌不存在", body = ErrorResponse)
    )
)]
#[get("/api/cards/{id}")]
pub async fn get_card(
    path: web::Path<String>,
    catalog: web::Data<CatalogService>,
) -> AppResult<HttpResponse> {
    let raw = catalog.get_card(&path.into_inner()).await?;
    Ok(passthrough(raw))
}
