use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::card::PokemonCard;
use super::filters::{FacetKind, Filters};
use super::pagination::clamp_page_size;
use crate::utils::error::{AppError, AppResult};
use crate::utils::query_string::parse_pairs;

/// 上游 `/cards` 的分页响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPage {
    #[serde(default)]
    pub data: Vec<PokemonCard>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub total_count: u64,
}

fn default_page() -> u32 {
    1
}

/// 上游单卡响应 `{ "data": {...} }`，以及各类取值列表 `{ "data": [...] }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataWrapper<T> {
    pub data: T,
}

/// 四个筛选维度的全部可选值
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Facets {
    pub supertypes: Vec<String>,
    pub types: Vec<String>,
    pub subtypes: Vec<String>,
    pub rarities: Vec<String>,
}

impl Facets {
    pub fn get(&self, kind: FacetKind) -> &[String] {
        match kind {
            FacetKind::Supertypes => &self.supertypes,
            FacetKind::Types => &self.types,
            FacetKind::Subtypes => &self.subtypes,
            FacetKind::Rarities => &self.rarities,
        }
    }
}

/// 代理接口的查询参数，仅用于生成 API 文档；实际解析见 [`CardSearch::from_query_string`]
#[allow(dead_code)]
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct CardSearchParams {
    /// 页码，默认 1
    pub page: Option<u32>,
    /// 每页数量，默认 12，最大 250
    pub page_size: Option<u32>,
    /// JSON 形式的筛选条件，如 `{"supertypes":["Pokémon"],"cardTypes":["Fire"]}`
    pub filters: Option<String>,
    /// 可重复：超类型
    pub supertype: Option<Vec<String>>,
    /// 可重复：属性
    #[serde(rename = "type")]
    pub card_type: Option<Vec<String>>,
    /// 可重复：子类型
    pub subtype: Option<Vec<String>>,
    /// 可重复：稀有度
    pub rarity: Option<Vec<String>>,
}

/// 一次卡牌检索：页码、每页数量与筛选条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSearch {
    pub page: u32,
    pub page_size: u32,
    pub filters: Filters,
}

impl CardSearch {
    pub fn new(page: u32, page_size: u32, filters: Filters) -> Self {
        Self {
            page: page.max(1),
            page_size: clamp_page_size(page_size),
            filters,
        }
    }

    /// 解析 `page`、`pageSize` 以及筛选条件，缺省值为第 1 页与 `default_page_size`
    pub fn from_query_string(query: &str, default_page_size: u32) -> AppResult<Self> {
        let pairs = parse_pairs(query);

        let mut page = 1;
        let mut page_size = default_page_size;
        for (key, value) in &pairs {
            match key.as_str() {
                "page" => page = parse_positive(key, value)?,
                "pageSize" => page_size = parse_positive(key, value)?,
                _ => {}
            }
        }

        let filters = Filters::from_pairs(&pairs)?;
        Ok(Self::new(page, page_size, filters))
    }

    /// 上游的 `q` 参数
    pub fn query(&self) -> String {
        self.filters.build_query_string()
    }
}

fn parse_positive(key: &str, value: &str) -> AppResult<u32> {
    match value.trim() {
        "" => Err(AppError::BadRequest(format!("{key} 不能为空"))),
        raw => raw
            .parse::<u32>()
            .map_err(|_| AppError::BadRequest(format!("{key} 必须是正整数: {raw}"))),
    }
}
