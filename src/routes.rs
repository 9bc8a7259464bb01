use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::controllers;
use crate::models::{FacetKind, Facets, Filters};
use crate::utils::error::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    info(title = "Pokemon TCG Market API", description = "卡牌目录代理接口"),
    paths(
        controllers::cards::proxy_cards,
        controllers::cards::get_card,
        controllers::facets::list_facets,
        controllers::facets::list_facet,
        controllers::health::health_check,
    ),
    components(schemas(
        ErrorResponse,
        Facets,
        FacetKind,
        Filters,
        controllers::health::HealthResponse,
    )),
    tags(
        (name = "Cards", description = "卡牌检索与详情，原样透传上游 JSON"),
        (name = "Facets", description = "筛选维度的可选值"),
        (name = "Status", description = "服务状态")
    )
)]
pub struct ApiDoc;

pub fn configure(cfg: &mut web::ServiceConfig) {
    // JSON 接口
    cfg.service(controllers::proxy_cards) // GET /api/pokemonCards
        .service(controllers::get_card) // GET /api/cards/{id}
        .service(controllers::list_facets) // GET /api/facets
        .service(controllers::list_facet) // GET /api/facets/{kind}
        .service(controllers::health_check); // GET /health

    // 页面
    cfg.service(controllers::storefront) // GET /
        .service(controllers::card_detail); // GET /cards/{id}

    // API 文档
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::services::CatalogService;
    use actix_web::{http::StatusCode, test, App};

    #[::core::prelude::v1::test]
    fn test_openapi_lists_proxy_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.as_str() == "/api/pokemonCards"));
        assert!(paths.iter().any(|p| p.as_str() == "/api/facets/{kind}"));
    }

    #[actix_web::test]
    async fn test_openapi_json_is_served() {
        let catalog = web::Data::new(CatalogService::new(&AppConfig::default()).unwrap());
        let app = test::init_service(App::new().app_data(catalog).configure(configure)).await;
        let req = test::TestRequest::get().uri("/api-docs/openapi.json").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
