use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::utils::error::{AppError, AppResult};

/// 可筛选的卡牌分类维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FacetKind {
    Supertypes,
    Types,
    Subtypes,
    Rarities,
}

impl FacetKind {
    /// 查询串中各组的固定顺序
    pub const ALL: [FacetKind; 4] = [
        FacetKind::Supertypes,
        FacetKind::Types,
        FacetKind::Subtypes,
        FacetKind::Rarities,
    ];

    /// 上游列出该维度全部取值的路径，如 `/v2/types`
    pub fn endpoint(&self) -> &'static str {
        match self {
            FacetKind::Supertypes => "supertypes",
            FacetKind::Types => "types",
            FacetKind::Subtypes => "subtypes",
            FacetKind::Rarities => "rarities",
        }
    }

    /// 上游查询语法中的字段名
    pub fn query_field(&self) -> &'static str {
        match self {
            FacetKind::Supertypes => "supertype",
            FacetKind::Types => "types",
            FacetKind::Subtypes => "subtypes",
            FacetKind::Rarities => "rarity",
        }
    }

    /// 筛选表单里复选框的 name
    pub fn form_key(&self) -> &'static str {
        match self {
            FacetKind::Supertypes => "supertype",
            FacetKind::Types => "type",
            FacetKind::Subtypes => "subtype",
            FacetKind::Rarities => "rarity",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FacetKind::Supertypes => "Supertypes",
            FacetKind::Types => "Pokemon Type",
            FacetKind::Subtypes => "Subtypes",
            FacetKind::Rarities => "Rarity",
        }
    }

    fn from_form_key(key: &str) -> Option<Self> {
        FacetKind::ALL.into_iter().find(|k| k.form_key() == key)
    }
}

impl fmt::Display for FacetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

impl FromStr for FacetKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FacetKind::ALL
            .into_iter()
            .find(|k| k.endpoint() == s)
            .ok_or_else(|| AppError::BadRequest(format!("未知的筛选维度: {s}")))
    }
}

/// 当前勾选的筛选值，各维度内保持勾选顺序且不重复
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Filters {
    pub supertypes: Vec<String>,
    pub card_types: Vec<String>,
    pub subtypes: Vec<String>,
    pub rarities: Vec<String>,
}

impl Filters {
    pub fn values(&self, kind: FacetKind) -> &[String] {
        match kind {
            FacetKind::Supertypes => &self.supertypes,
            FacetKind::Types => &self.card_types,
            FacetKind::Subtypes => &self.subtypes,
            FacetKind::Rarities => &self.rarities,
        }
    }

    fn values_mut(&mut self, kind: FacetKind) -> &mut Vec<String> {
        match kind {
            FacetKind::Supertypes => &mut self.supertypes,
            FacetKind::Types => &mut self.card_types,
            FacetKind::Subtypes => &mut self.subtypes,
            FacetKind::Rarities => &mut self.rarities,
        }
    }

    pub fn is_selected(&self, kind: FacetKind, value: &str) -> bool {
        self.values(kind).iter().any(|v| v == value)
    }

    pub fn is_empty(&self) -> bool {
        FacetKind::ALL.iter().all(|k| self.values(*k).is_empty())
    }

    /// 复选框切换：已选则移除，未选则追加到末尾
    pub fn toggle(&mut self, kind: FacetKind, value: &str) {
        let values = self.values_mut(kind);
        match values.iter().position(|v| v == value) {
            Some(idx) => {
                values.remove(idx);
            }
            None => values.push(value.to_string()),
        }
    }

    /// 勾选某个值，已选时不做任何事
    pub fn select(&mut self, kind: FacetKind, value: &str) {
        let value = value.trim();
        if value.is_empty() || self.is_selected(kind, value) {
            return;
        }
        self.values_mut(kind).push(value.to_string());
    }

    /// 按上游查询语法构建 `q` 参数。
    ///
    /// 每个非空维度生成一个括号包裹的 OR 组 `(field:"a" OR field:"b")`，
    /// 各组之间以空格连接（上游视为 AND）。没有任何勾选时返回空串。
    pub fn build_query_string(&self) -> String {
        FacetKind::ALL
            .iter()
            .filter_map(|kind| {
                let clauses: Vec<String> = self
                    .values(*kind)
                    .iter()
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| format!("{}:\"{}\"", kind.query_field(), escape_term(v)))
                    .collect();
                if clauses.is_empty() {
                    None
                } else {
                    Some(format!("({})", clauses.join(" OR ")))
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// 从查询串键值对中读取筛选条件。
    ///
    /// 支持表单的重复键（`rarity=Common&rarity=Rare`）以及 JSON 形式的 `filters` 参数，
    /// 两者可以同时出现并合并。
    pub fn from_pairs(pairs: &[(String, String)]) -> AppResult<Self> {
        let mut filters = Filters::default();
        for (key, value) in pairs {
            if key == "filters" {
                if value.trim().is_empty() {
                    continue;
                }
                let parsed: Filters = serde_json::from_str(value)
                    .map_err(|e| AppError::BadRequest(format!("filters 参数不是有效的 JSON: {e}")))?;
                filters.merge(&parsed);
            } else if let Some(kind) = FacetKind::from_form_key(key) {
                filters.select(kind, value);
            }
        }
        Ok(filters)
    }

    fn merge(&mut self, other: &Filters) {
        for kind in FacetKind::ALL {
            for value in other.values(kind) {
                self.select(kind, value);
            }
        }
    }

    /// 以表单键编码的键值对，用于生成保留筛选条件的链接
    pub fn to_pairs(&self) -> Vec<(&'static str, &str)> {
        FacetKind::ALL
            .iter()
            .flat_map(|kind| {
                self.values(*kind)
                    .iter()
                    .map(move |v| (kind.form_key(), v.as_str()))
            })
            .collect()
    }
}

fn escape_term(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_filters_build_empty_query() {
        assert_eq!(Filters::default().build_query_string(), "");
        assert!(Filters::default().is_empty());
    }

    #[test]
    fn test_single_group() {
        let filters = Filters {
            supertypes: vec!["Pokémon".to_string()],
            ..Default::default()
        };
        assert_eq!(filters.build_query_string(), r#"(supertype:"Pokémon")"#);
    }

    #[test]
    fn test_groups_follow_fixed_order_and_or_join() {
        let filters = Filters {
            rarities: vec!["Rare Holo".to_string(), "Common".to_string()],
            card_types: vec!["Fire".to_string()],
            subtypes: vec!["Stage 1".to_string()],
            supertypes: vec!["Pokémon".to_string(), "Trainer".to_string()],
        };
        assert_eq!(
            filters.build_query_string(),
            r#"(supertype:"Pokémon" OR supertype:"Trainer") (types:"Fire") (subtypes:"Stage 1") (rarity:"Rare Holo" OR rarity:"Common")"#
        );
    }

    #[test]
    fn test_quotes_are_escaped() {
        let filters = Filters {
            subtypes: vec![r#"Team "Rocket""#.to_string()],
            ..Default::default()
        };
        assert_eq!(
            filters.build_query_string(),
            r#"(subtypes:"Team \"Rocket\"")"#
        );
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut filters = Filters::default();
        filters.toggle(FacetKind::Types, "Water");
        filters.toggle(FacetKind::Types, "Fire");
        assert_eq!(filters.card_types, vec!["Water", "Fire"]);

        filters.toggle(FacetKind::Types, "Water");
        assert_eq!(filters.card_types, vec!["Fire"]);
        assert!(!filters.is_selected(FacetKind::Types, "Water"));
    }

    #[test]
    fn test_from_form_pairs_dedupes() {
        let filters = Filters::from_pairs(&pairs(&[
            ("type", "Fire"),
            ("type", "Fire"),
            ("rarity", "Common"),
            ("page", "3"),
            ("subtype", "  "),
        ]))
        .unwrap();
        assert_eq!(filters.card_types, vec!["Fire"]);
        assert_eq!(filters.rarities, vec!["Common"]);
        assert!(filters.subtypes.is_empty());
    }

    #[test]
    fn test_from_json_filters_param() {
        let filters = Filters::from_pairs(&pairs(&[(
            "filters",
            r#"{"supertypes":["Trainer"],"cardTypes":["Grass"]}"#,
        )]))
        .unwrap();
        assert_eq!(filters.supertypes, vec!["Trainer"]);
        assert_eq!(filters.card_types, vec!["Grass"]);
        assert!(filters.rarities.is_empty());
    }

    #[test]
    fn test_invalid_json_filters_is_bad_request() {
        let err = Filters::from_pairs(&pairs(&[("filters", "{oops")])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_to_pairs_round_trips_through_form_keys() {
        let filters = Filters {
            supertypes: vec!["Energy".to_string()],
            rarities: vec!["Promo".to_string()],
            ..Default::default()
        };
        let owned: Vec<(String, String)> = filters
            .to_pairs()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(Filters::from_pairs(&owned).unwrap(), filters);
    }

    #[test]
    fn test_facet_kind_from_str() {
        assert_eq!("rarities".parse::<FacetKind>().unwrap(), FacetKind::Rarities);
        assert!("colors".parse::<FacetKind>().is_err());
    }
}
