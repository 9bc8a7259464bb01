use actix_web::{get, web, HttpResponse};

use crate::models::{ApiResponse, FacetKind, Facets};
use crate::services::catalog::CatalogService;
use crate::utils::error::{AppResult, ErrorResponse};

/// 获取全部筛选维度的可选值
///
/// 四个列表并发向上游请求，结果在内存中缓存。
#[utoipa::path(
    get,
    path = "/api/facets",
    tag = "Facets",
    responses(
        (status = 200, description = "全部筛选项", body = ApiResponse<Facets>),
        (status = 500, description = "服务器错误", body = ErrorResponse)
    )
)]
#[get("/api/facets")]
pub async fn list_facets(catalog: web::Data<CatalogService>) -> AppResult<HttpResponse> {
    let facets = catalog.load_facets().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(facets)))
}

/// 获取单个筛选维度的可选值
#[utoipa::path(
    get,
    path = "/api/facets/{kind}",
    tag = "Facets",
    params(("kind" = FacetKind, Path, description = "supertypes / types / subtypes / rarities")),
    responses(
        (status = 200, description = "筛选项列表", body = ApiResponse<Vec<String>>),
        (status = 400, description = "未知的筛选维度", body = ErrorResponse)
    )
)]
#[get("/api/facets/{kind}")]
pub async fn list_facet(
    path: web::Path<String>,
    catalog: web::Data<CatalogService>,
) -> AppResult<HttpResponse> {
    let kind: FacetKind = path.into_inner().parse()?;
    let values = catalog.list_facet(kind).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(values.as_ref())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use actix_web::{http::StatusCode, test, App};
    use httpmock::prelude::*;
    use serde_json::json;

    #[actix_web::test]
    async fn test_single_facet_and_unknown_kind() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/rarities");
                then.status(200)
                    .json_body(json!({"data": ["Common", "Rare Holo", "Rare Secret"]}));
            })
            .await;

        let config = AppConfig {
            api_base_url: server.base_url(),
            ..AppConfig::default()
        };
        let catalog = web::Data::new(CatalogService::new(&config).unwrap());
        let app = test::init_service(App::new().app_data(catalog).service(list_facet)).await;

        let req = test::TestRequest::get().uri("/api/facets/rarities").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["data"][1], "Rare Holo");

        let req = test::TestRequest::get().uri("/api/facets/colors").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
