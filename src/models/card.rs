use serde::{Deserialize, Serialize};

// 卡牌数据结构直接沿用上游 API 的响应格式，上游可能省略的字段一律允许缺省

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PokemonCard {
    pub id: String,
    pub name: String,
    pub supertype: String,
    pub subtypes: Vec<String>,
    pub rules: Vec<String>,
    pub hp: Option<String>,
    pub types: Vec<String>,
    pub evolves_from: Option<String>,
    pub abilities: Vec<Ability>,
    pub attacks: Vec<Attack>,
    pub weaknesses: Vec<TypeModifier>,
    pub resistances: Vec<TypeModifier>,
    pub retreat_cost: Vec<String>,
    pub converted_retreat_cost: Option<u32>,
    pub set: Option<CardSet>,
    pub number: String,
    pub artist: Option<String>,
    pub rarity: Option<String>,
    pub flavor_text: Option<String>,
    pub national_pokedex_numbers: Vec<u32>,
    pub legalities: Legalities,
    pub images: CardImages,
    pub tcgplayer: Option<TcgPlayer>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Ability {
    pub name: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Attack {
    pub name: String,
    pub cost: Vec<String>,
    pub converted_energy_cost: u32,
    pub damage: String,
    pub text: String,
}

/// 弱点或抗性
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeModifier {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardSet {
    pub id: String,
    pub name: String,
    pub series: String,
    pub printed_total: u32,
    pub total: u32,
    pub legalities: Legalities,
    pub ptcgo_code: Option<String>,
    pub release_date: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Legalities {
    pub unlimited: Option<String>,
    pub standard: Option<String>,
    pub expanded: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CardImages {
    pub small: String,
    pub large: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TcgPlayer {
    pub url: String,
    pub updated_at: String,
    pub prices: TcgPlayerPrices,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TcgPlayerPrices {
    pub holofoil: Option<PriceRange>,
    pub reverse_holofoil: Option<PriceRange>,
    pub normal: Option<PriceRange>,
}

impl TcgPlayerPrices {
    /// 按展示顺序列出存在的价格档位
    pub fn variants(&self) -> Vec<(&'static str, &PriceRange)> {
        [
            ("Holofoil", self.holofoil.as_ref()),
            ("Reverse Holofoil", self.reverse_holofoil.as_ref()),
            ("Normal", self.normal.as_ref()),
        ]
        .into_iter()
        .filter_map(|(label, range)| range.map(|r| (label, r)))
        .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PriceRange {
    pub low: Option<f64>,
    pub mid: Option<f64>,
    pub high: Option<f64>,
    pub market: Option<f64>,
    pub direct_low: Option<f64>,
}

impl PokemonCard {
    /// 市场价：优先 holofoil，其次 normal，都没有时为 0
    pub fn market_price(&self) -> f64 {
        let prices = match &self.tcgplayer {
            Some(tcg) => &tcg.prices,
            None => return 0.0,
        };
        [prices.holofoil.as_ref(), prices.normal.as_ref()]
            .into_iter()
            .flatten()
            .filter_map(|range| range.market)
            .find(|market| *market != 0.0)
            .unwrap_or(0.0)
    }

    pub fn display_rarity(&self) -> &str {
        self.rarity.as_deref().unwrap_or("-")
    }
}

pub fn format_price(price: f64) -> String {
    format!("${price:.2}")
}
