use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{get, web, HttpRequest, HttpResponse, ResponseError};
use serde::Deserialize;

use crate::config::CONFIG;
use crate::models::{CardPage, CardSearch, Pagination};
use crate::services::catalog::CatalogService;
use crate::utils::error::{AppError, AppResult};
use crate::utils::html_renderer::{
    render_card_detail, render_error_page, render_storefront, sanitize_back_href,
    StorefrontRenderData,
};

fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(body)
}

/// 请求的页码越过末页时改取末页，网格与分页控件的当前页保持一致
async fn fetch_clamped_page(
    catalog: &CatalogService,
    search: &mut CardSearch,
) -> AppResult<CardPage> {
    let page = catalog.search_cards_typed(search).await?;
    let last = Pagination::new(1, search.page_size, page.total_count).total_pages();
    if !page.data.is_empty() || last == 0 || search.page <= last {
        return Ok(page);
    }

    log::info!("页码 {} 超出末页 {}，改取末页", search.page, last);
    search.page = last;
    catalog.search_cards_typed(search).await
}

/// 卡牌列表页
///
/// 筛选项与卡牌并发加载，任一失败都只记录日志并在页面上给出通用提示。
#[get("/")]
pub async fn storefront(req: HttpRequest, catalog: web::Data<CatalogService>) -> HttpResponse {
    let mut search = match CardSearch::from_query_string(req.query_string(), CONFIG.default_page_size) {
        Ok(search) => search,
        Err(e) => {
            log::warn!("列表页参数无效: {}", e);
            return html(e.status_code(), render_error_page("Invalid page or filter parameters."));
        }
    };

    let (facets, page) = futures::join!(
        catalog.load_facets(),
        fetch_clamped_page(&catalog, &mut search)
    );

    let facets = facets
        .map_err(|e| log::error!("加载筛选项失败: {}", e))
        .ok();

    let mut notice = None;
    let (cards, total_count) = match page {
        Ok(page) => (page.data, page.total_count),
        Err(e) => {
            log::error!("加载卡牌失败: {:?}", e);
            notice = Some("Failed to load cards. Please try again later.");
            (Vec::new(), 0)
        }
    };
    if facets.is_none() && notice.is_none() {
        notice = Some("Failed to load filters. Please try again later.");
    }

    let pagination = Pagination::new(search.page, search.page_size, total_count);
    let data = StorefrontRenderData {
        filters: &search.filters,
        facets: facets.as_ref(),
        cards: &cards,
        pagination: &pagination,
        notice,
    };

    match render_storefront(&data) {
        Ok(body) => html(StatusCode::OK, body),
        Err(e) => {
            log::error!("渲染列表页失败: {}", e);
            html(StatusCode::INTERNAL_SERVER_ERROR, render_error_page("Server error"))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    pub back: Option<String>,
}

/// 单卡详情页
#[get("/cards/{id}")]
pub async fn card_detail(
    path: web::Path<String>,
    query: web::Query<DetailQuery>,
    catalog: web::Data<CatalogService>,
) -> HttpResponse {
    let back = sanitize_back_href(query.back.as_deref());

    let card = match catalog.get_card_typed(&path.into_inner()).await {
        Ok(card) => card,
        Err(AppError::CardNotFound(id)) => {
            log::info!("卡牌不存在: {}", id);
            return html(StatusCode::NOT_FOUND, render_error_page("Card not found."));
        }
        Err(e) => {
            log::error!("加载卡牌详情失败: {:?}", e);
            return html(e.status_code(), render_error_page("Server error"));
        }
    };

    match render_card_detail(&card, back) {
        Ok(body) => html(StatusCode::OK, body),
        Err(e) => {
            log::error!("渲染详情页失败: {}", e);
            html(StatusCode::INTERNAL_SERVER_ERROR, render_error_page("Server error"))
        }
    }
}
