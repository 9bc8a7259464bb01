use actix_web::web::Bytes;
use moka::future::Cache;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::models::{CardPage, CardSearch, DataWrapper, FacetKind, Facets, PokemonCard};
use crate::utils::error::{AppError, AppResult};
use crate::utils::query_string::encode_component;

/// 上游返回的响应体原文，代理接口逐字节转发
#[derive(Debug, Clone)]
pub struct RawBody {
    pub content_type: String,
    pub bytes: Bytes,
}

impl RawBody {
    pub fn parse<T: DeserializeOwned>(&self) -> AppResult<T> {
        Ok(serde_json::from_slice(&self.bytes)?)
    }
}

/// 上游卡牌目录 API 的客户端。
///
/// 卡牌检索结果原样透传，不做缓存；四个筛选维度的取值列表属于静态元数据，
/// 在内存中按 TTL 缓存。
pub struct CatalogService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    facet_cache: Cache<FacetKind, Arc<Vec<String>>>,
}

impl CatalogService {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("ptcg-market/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::ConfigError(format!("无法创建 HTTP 客户端: {e}")))?;

        let api_key = Some(config.api_key.trim().to_string()).filter(|k| !k.is_empty());
        if api_key.is_none() {
            log::warn!("未配置 API_KEY，将以匿名方式访问上游 API（速率限制更严格）");
        }

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key,
            facet_cache: Cache::builder()
                .max_capacity(FacetKind::ALL.len() as u64)
                .time_to_live(Duration::from_secs(config.facet_cache_ttl_secs))
                .build(),
        })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let builder = self
            .client
            .get(url)
            .header("Content-Type", "application/json");
        match &self.api_key {
            Some(key) => builder.header("X-Api-Key", key),
            None => builder,
        }
    }

    async fn fetch_raw(&self, request: RequestBuilder) -> AppResult<RawBody> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            log::warn!("上游 API 返回错误状态: {} ({})", status, response.url());
            return Err(AppError::Upstream(status.as_u16()));
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/json")
            .to_string();
        let bytes = response.bytes().await?;
        Ok(RawBody { content_type, bytes })
    }

    /// 转发一次卡牌检索，返回上游 JSON 原文
    pub async fn search_cards(&self, search: &CardSearch) -> AppResult<RawBody> {
        let q = search.query();
        log::info!(
            "检索卡牌: page={}, pageSize={}, q='{}'",
            search.page,
            search.page_size,
            q
        );

        let mut params = vec![
            ("page", search.page.to_string()),
            ("pageSize", search.page_size.to_string()),
        ];
        if !q.is_empty() {
            params.push(("q", q));
        }

        self.fetch_raw(self.get("cards").query(&params)).await
    }

    pub async fn search_cards_typed(&self, search: &CardSearch) -> AppResult<CardPage> {
        self.search_cards(search).await?.parse()
    }

    /// 获取单张卡牌，返回上游 JSON 原文
    pub async fn get_card(&self, id: &str) -> AppResult<RawBody> {
        let id = id.trim();
        if id.is_empty() {
            return Err(AppError::BadRequest("卡牌 ID 不能为空".to_string()));
        }
        log::info!("获取卡牌详情: {}", id);

        let path = format!("cards/{}", encode_component(id));
        match self.fetch_raw(self.get(&path)).await {
            Err(AppError::Upstream(404)) => Err(AppError::CardNotFound(id.to_string())),
            other => other,
        }
    }

    pub async fn get_card_typed(&self, id: &str) -> AppResult<PokemonCard> {
        let wrapper: DataWrapper<PokemonCard> = self.get_card(id).await?.parse()?;
        Ok(wrapper.data)
    }

    /// 获取某个筛选维度的全部取值
    pub async fn list_facet(&self, kind: FacetKind) -> AppResult<Arc<Vec<String>>> {
        if let Some(values) = self.facet_cache.get(&kind).await {
            log::debug!("筛选项缓存命中: {}", kind);
            return Ok(values);
        }

        let wrapper: DataWrapper<Vec<String>> =
            self.fetch_raw(self.get(kind.endpoint())).await?.parse()?;
        let values = Arc::new(wrapper.data);
        log::info!("已加载筛选项 {}: {} 个", kind, values.len());

        self.facet_cache.insert(kind, values.clone()).await;
        Ok(values)
    }

    /// 并发获取全部四个筛选维度
    pub async fn load_facets(&self) -> AppResult<Facets> {
        let (supertypes, types, subtypes, rarities) = futures::try_join!(
            self.list_facet(FacetKind::Supertypes),
            self.list_facet(FacetKind::Types),
            self.list_facet(FacetKind::Subtypes),
            self.list_facet(FacetKind::Rarities),
        )?;

        Ok(Facets {
            supertypes: supertypes.as_ref().clone(),
            types: types.as_ref().clone(),
            subtypes: subtypes.as_ref().clone(),
            rarities: rarities.as_ref().clone(),
        })
    }
}
