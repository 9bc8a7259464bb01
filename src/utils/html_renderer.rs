use chrono::NaiveDate;
use std::fmt::Write;

use crate::models::{
    format_price, CardSet, FacetKind, Facets, Filters, PageItem, Pagination, PokemonCard,
    TcgPlayer, TypeModifier,
};
use crate::utils::error::AppError;
use crate::utils::query_string::{encode_component, encode_pairs};

pub const SITE_TITLE: &str = "Pokemon TCG Market";

/// 卡牌列表页渲染数据
pub struct StorefrontRenderData<'a> {
    pub filters: &'a Filters,
    /// 加载失败时为 None，侧栏会显示提示而不是复选框
    pub facets: Option<&'a Facets>,
    pub cards: &'a [PokemonCard],
    pub pagination: &'a Pagination,
    /// 页面顶部的通用错误提示
    pub notice: Option<&'a str>,
}

fn fmt_err(e: std::fmt::Error) -> AppError {
    AppError::InternalError(format!("HTML formatting error: {e}"))
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const STYLE: &str = r##"
body { margin: 0; font-family: system-ui, sans-serif; background: #f3f4f6; color: #111827; }
header { background: #1e3a8a; color: #fff; box-shadow: 0 2px 4px rgba(0,0,0,.15); }
header .inner { max-width: 1200px; margin: 0 auto; padding: 16px; }
header h1 { margin: 0; font-size: 24px; }
header a { color: inherit; text-decoration: none; }
main { max-width: 1200px; margin: 0 auto; padding: 32px 16px; display: flex; gap: 32px; align-items: flex-start; }
aside { width: 256px; flex-shrink: 0; background: #fff; padding: 24px; border-radius: 8px; box-shadow: 0 1px 3px rgba(0,0,0,.1); }
aside h2 { margin-top: 0; }
aside fieldset { border: 0; padding: 0; margin: 0 0 24px; }
aside .scroll { max-height: 200px; overflow-y: auto; }
aside label { display: block; margin: 6px 0; }
button { width: 100%; padding: 8px; border: 0; border-radius: 6px; background: #1e3a8a; color: #fff; cursor: pointer; }
.content { flex: 1; }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 24px; }
.card { display: block; background: #fff; border-radius: 8px; padding: 12px; color: inherit; text-decoration: none; box-shadow: 0 1px 3px rgba(0,0,0,.1); }
.card:hover { box-shadow: 0 6px 12px rgba(0,0,0,.15); }
.card img { width: 100%; border-radius: 8px; }
.card .meta { display: flex; justify-content: space-between; }
.muted { color: #6b7280; font-size: 14px; }
.price { font-weight: 600; }
.empty { text-align: center; padding: 40px 0; color: #6b7280; font-size: 18px; }
.notice { background: #fef2f2; color: #991b1b; padding: 12px; border-radius: 6px; margin-bottom: 16px; }
nav.pagination { display: flex; gap: 6px; justify-content: center; margin-top: 32px; flex-wrap: wrap; }
nav.pagination a, nav.pagination span { padding: 6px 12px; border-radius: 6px; background: #fff; color: inherit; text-decoration: none; }
nav.pagination .current { background: #1e3a8a; color: #fff; }
nav.pagination .disabled { color: #9ca3af; }
.detail { display: grid; grid-template-columns: 300px 1fr; gap: 24px; background: #fff; padding: 24px; border-radius: 8px; width: 100%; }
.detail img { width: 100%; border-radius: 8px; }
table { border-collapse: collapse; }
td, th { padding: 4px 12px 4px 0; text-align: left; }
"##;

fn open_document(html: &mut String, title: &str) -> Result<(), AppError> {
    write!(
        html,
        r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1"><title>{}</title><style>{}</style></head><body>"#,
        escape_html(title),
        STYLE
    )
    .map_err(fmt_err)?;
    write!(
        html,
        r#"<header><div class="inner"><h1><a href="/">{SITE_TITLE}</a></h1></div></header>"#
    )
    .map_err(fmt_err)
}

/// 上游日期形如 `2021/08/04`，无法解析时原样返回
pub fn format_upstream_date(raw: &str) -> String {
    let date_part = raw.split_whitespace().next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y/%m/%d")
        .map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn close_document(html: &mut String) {
    html.push_str("</body></html>");
}

/// 保留当前筛选条件的列表页链接
pub fn storefront_href(filters: &Filters, page: u32, page_size: u32) -> String {
    let page = page.to_string();
    let page_size = page_size.to_string();
    let mut pairs = filters.to_pairs();
    pairs.push(("page", page.as_str()));
    pairs.push(("pageSize", page_size.as_str()));
    format!("/?{}", encode_pairs(pairs))
}

/// 切换单个筛选值后的列表页链接，总是回到第一页
pub fn toggle_href(filters: &Filters, kind: FacetKind, value: &str, page_size: u32) -> String {
    let mut toggled = filters.clone();
    toggled.toggle(kind, value);
    storefront_href(&toggled, 1, page_size)
}

/// 详情页链接，`back` 为返回列表页时使用的地址
pub fn card_href(card: &PokemonCard, back: &str) -> String {
    format!(
        "/cards/{}?back={}",
        encode_component(&card.id),
        encode_component(back)
    )
}

/// 只接受站内相对路径，避免被当作开放跳转
pub fn sanitize_back_href(back: Option<&str>) -> &str {
    match back {
        Some(href)
            if href.starts_with('/')
                && !href.starts_with("//")
                && !href.chars().any(|c| c == '\\' || c.is_control()) =>
        {
            href
        }
        _ => "/",
    }
}

fn render_filter_sidebar(
    html: &mut String,
    filters: &Filters,
    facets: Option<&Facets>,
    page_size: u32,
) -> Result<(), AppError> {
    html.push_str(r#"<aside><h2>Filters</h2><form method="get" action="/">"#);
    // 不携带 page：应用新的筛选条件时回到第一页
    write!(html, r#"<input type="hidden" name="pageSize" value="{page_size}">"#)
        .map_err(fmt_err)?;

    match facets {
        Some(facets) => {
            for kind in FacetKind::ALL {
                write!(
                    html,
                    r#"<fieldset><h3>{}</h3><div class="{}">"#,
                    kind.label(),
                    if kind == FacetKind::Supertypes { "list" } else { "scroll" }
                )
                .map_err(fmt_err)?;
                for value in facets.get(kind) {
                    let checked = if filters.is_selected(kind, value) { " checked" } else { "" };
                    let escaped = escape_html(value);
                    write!(
                        html,
                        r#"<label><input type="checkbox" name="{}" value="{}"{}> <a href="{}">{}</a></label>"#,
                        kind.form_key(),
                        escaped,
                        checked,
                        escape_html(&toggle_href(filters, kind, value, page_size)),
                        escaped
                    )
                    .map_err(fmt_err)?;
                }
                html.push_str("</div></fieldset>");
            }
        }
        None => {
            html.push_str(r#"<p class="muted">Filters are unavailable right now.</p>"#);
            // 保留已选条件，翻页或重新提交时不丢失
            for (key, value) in filters.to_pairs() {
                write!(
                    html,
                    r#"<input type="hidden" name="{}" value="{}">"#,
                    key,
                    escape_html(value)
                )
                .map_err(fmt_err)?;
            }
        }
    }

    html.push_str(r#"<button type="submit">Apply Filters</button></form></aside>"#);
    Ok(())
}

fn render_card_grid(
    html: &mut String,
    cards: &[PokemonCard],
    back_href: &str,
) -> Result<(), AppError> {
    if cards.is_empty() {
        html.push_str(r#"<div class="empty"><p>Card not found.</p></div>"#);
        return Ok(());
    }

    html.push_str(r#"<div class="grid">"#);
    for card in cards {
        let name = escape_html(&card.name);
        write!(
            html,
            r#"<a class="card" href="{}"><img src="{}" alt="{}" width="200" height="300" loading="lazy"><strong>{}</strong><p class="meta"><span class="muted">{}</span><span class="price">{}</span></p></a>"#,
            escape_html(&card_href(card, back_href)),
            escape_html(&card.images.small),
            name,
            name,
            escape_html(card.display_rarity()),
            format_price(card.market_price())
        )
        .map_err(fmt_err)?;
    }
    html.push_str("</div>");
    Ok(())
}

fn render_pagination(
    html: &mut String,
    filters: &Filters,
    pagination: &Pagination,
) -> Result<(), AppError> {
    if pagination.total_pages() <= 1 {
        return Ok(());
    }

    let link = |page: u32| escape_html(&storefront_href(filters, page, pagination.page_size));
    let current = pagination.current_page;

    html.push_str(r#"<nav class="pagination">"#);
    if pagination.has_previous() {
        write!(html, r#"<a href="{}" rel="prev">Previous</a>"#, link(current - 1))
            .map_err(fmt_err)?;
    } else {
        html.push_str(r#"<span class="disabled">Previous</span>"#);
    }

    for item in pagination.items() {
        match item {
            PageItem::Page(page) if page == current => {
                write!(html, r#"<span class="current" aria-current="page">{page}</span>"#)
                    .map_err(fmt_err)?;
            }
            PageItem::Page(page) => {
                write!(html, r#"<a href="{}">{}</a>"#, link(page), page).map_err(fmt_err)?;
            }
            PageItem::Ellipsis => html.push_str("<span>…</span>"),
        }
    }

    if pagination.has_next() {
        write!(html, r#"<a href="{}" rel="next">Next</a>"#, link(current + 1))
            .map_err(fmt_err)?;
    } else {
        html.push_str(r#"<span class="disabled">Next</span>"#);
    }
    html.push_str("</nav>");
    Ok(())
}

/// 渲染列表页：头部、筛选侧栏、卡牌网格与分页控件
pub fn render_storefront(data: &StorefrontRenderData<'_>) -> Result<String, AppError> {
    let mut html = String::with_capacity(16 * 1024);
    open_document(&mut html, SITE_TITLE)?;

    html.push_str("<main>");
    render_filter_sidebar(&mut html, data.filters, data.facets, data.pagination.page_size)?;

    html.push_str(r#"<div class="content">"#);
    if let Some(notice) = data.notice {
        write!(html, r#"<div class="notice">{}</div>"#, escape_html(notice)).map_err(fmt_err)?;
    }
    let back_href = storefront_href(
        data.filters,
        data.pagination.current_page,
        data.pagination.page_size,
    );
    render_card_grid(&mut html, data.cards, &back_href)?;
    render_pagination(&mut html, data.filters, data.pagination)?;
    html.push_str("</div></main>");

    close_document(&mut html);
    Ok(html)
}

fn join_or_na(values: &[String]) -> String {
    if values.is_empty() {
        "N/A".to_string()
    } else {
        escape_html(&values.join(", "))
    }
}

fn write_field(html: &mut String, label: &str, value: &str) -> Result<(), AppError> {
    write!(html, "<p><strong>{label}:</strong> {value}</p>").map_err(fmt_err)
}

fn render_modifiers(
    html: &mut String,
    title: &str,
    modifiers: &[TypeModifier],
) -> Result<(), AppError> {
    if modifiers.is_empty() {
        return Ok(());
    }
    let joined = modifiers
        .iter()
        .map(|m| format!("{} {}", m.kind, m.value))
        .collect::<Vec<_>>()
        .join(", ");
    write_field(html, title, &escape_html(&joined))
}

fn render_set(html: &mut String, set: &CardSet, number: &str) -> Result<(), AppError> {
    let mut label = format!("{} ({})", set.name, set.series);
    if !number.is_empty() {
        let _ = write!(label, " #{}/{}", number, set.printed_total);
    }
    write_field(html, "Set", &escape_html(&label))?;
    if !set.release_date.is_empty() {
        write_field(html, "Released", &escape_html(&format_upstream_date(&set.release_date)))?;
    }
    Ok(())
}

fn render_prices(html: &mut String, tcgplayer: &TcgPlayer) -> Result<(), AppError> {
    let variants = tcgplayer.prices.variants();
    if variants.is_empty() {
        return Ok(());
    }

    let cell = |v: Option<f64>| v.map(format_price).unwrap_or_else(|| "-".to_string());
    html.push_str("<h3>TCGplayer Prices</h3><table><tr><th></th><th>Low</th><th>Mid</th><th>High</th><th>Market</th><th>Direct Low</th></tr>");
    for (label, range) in variants {
        write!(
            html,
            "<tr><th>{}</th><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            label,
            cell(range.low),
            cell(range.mid),
            cell(range.high),
            cell(range.market),
            cell(range.direct_low)
        )
        .map_err(fmt_err)?;
    }
    html.push_str("</table>");

    if !tcgplayer.updated_at.is_empty() {
        write!(
            html,
            r#"<p class="muted">Updated {}</p>"#,
            escape_html(&format_upstream_date(&tcgplayer.updated_at))
        )
        .map_err(fmt_err)?;
    }
    if !tcgplayer.url.is_empty() {
        write!(
            html,
            r#"<p><a href="{}" target="_blank" rel="noopener">Buy on TCGplayer</a></p>"#,
            escape_html(&tcgplayer.url)
        )
        .map_err(fmt_err)?;
    }
    Ok(())
}

/// 渲染单卡详情页
pub fn render_card_detail(card: &PokemonCard, back_href: &str) -> Result<String, AppError> {
    let mut html = String::with_capacity(8 * 1024);
    open_document(&mut html, &format!("{} - {}", card.name, SITE_TITLE))?;

    let name = escape_html(&card.name);
    write!(
        html,
        r#"<main><div class="detail"><div><img src="{}" alt="{}" width="300" height="400"><p><a href="{}">&larr; Back to cards</a></p></div><div><h2>{}</h2>"#,
        escape_html(&card.images.large),
        name,
        escape_html(back_href),
        name
    )
    .map_err(fmt_err)?;

    if let Some(flavor) = card.flavor_text.as_deref().filter(|f| !f.is_empty()) {
        write!(html, r#"<p class="muted"><em>{}</em></p>"#, escape_html(flavor))
            .map_err(fmt_err)?;
    }

    write_field(&mut html, "Supertype", &escape_html(&card.supertype))?;
    write_field(&mut html, "Subtypes", &escape_html(&card.subtypes.join(", ")))?;
    write_field(&mut html, "HP", &escape_html(card.hp.as_deref().unwrap_or("")))?;
    write_field(&mut html, "Types", &join_or_na(&card.types))?;
    write_field(&mut html, "Rarity", &escape_html(card.rarity.as_deref().unwrap_or("")))?;
    write_field(&mut html, "Market Price", &format_price(card.market_price()))?;

    if let Some(evolves_from) = &card.evolves_from {
        write_field(&mut html, "Evolves From", &escape_html(evolves_from))?;
    }
    if let Some(set) = &card.set {
        render_set(&mut html, set, &card.number)?;
    }
    if let Some(artist) = &card.artist {
        write_field(&mut html, "Artist", &escape_html(artist))?;
    }

    for rule in &card.rules {
        write!(html, r#"<p class="muted">{}</p>"#, escape_html(rule)).map_err(fmt_err)?;
    }

    if !card.abilities.is_empty() {
        html.push_str("<h3>Abilities</h3>");
        for ability in &card.abilities {
            write!(
                html,
                "<p><strong>{}</strong> <span class=\"muted\">({})</span><br>{}</p>",
                escape_html(&ability.name),
                escape_html(&ability.kind),
                escape_html(&ability.text)
            )
            .map_err(fmt_err)?;
        }
    }

    if !card.attacks.is_empty() {
        html.push_str("<h3>Attacks</h3>");
        for attack in &card.attacks {
            write!(
                html,
                "<p><strong>{}</strong> <span class=\"muted\">[{}]</span> {}<br>{}</p>",
                escape_html(&attack.name),
                escape_html(&attack.cost.join(", ")),
                escape_html(&attack.damage),
                escape_html(&attack.text)
            )
            .map_err(fmt_err)?;
        }
    }

    render_modifiers(&mut html, "Weaknesses", &card.weaknesses)?;
    render_modifiers(&mut html, "Resistances", &card.resistances)?;
    if !card.retreat_cost.is_empty() {
        write_field(&mut html, "Retreat Cost", &escape_html(&card.retreat_cost.join(", ")))?;
    }

    if let Some(tcgplayer) = &card.tcgplayer {
        render_prices(&mut html, tcgplayer)?;
    }

    html.push_str("</div></div></main>");
    close_document(&mut html);
    Ok(html)
}

/// 渲染错误页，只展示通用提示
pub fn render_error_page(message: &str) -> String {
    let mut html = String::new();
    if open_document(&mut html, SITE_TITLE).is_err() {
        return String::from("Server error");
    }
    let _ = write!(
        html,
        r#"<main><div class="content"><div class="notice">{}</div><p><a href="/">Back to cards</a></p></div></main>"#,
        escape_html(message)
    );
    close_document(&mut html);
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str, name: &str) -> PokemonCard {
        PokemonCard {
            id: id.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Mr. Mime" & Co's</b>"#),
            "&lt;b&gt;&quot;Mr. Mime&quot; &amp; Co&#39;s&lt;/b&gt;"
        );
    }

    #[test]
    fn test_empty_grid_shows_not_found() {
        let filters = Filters::default();
        let pagination = Pagination::new(1, 12, 0);
        let html = render_storefront(&StorefrontRenderData {
            filters: &filters,
            facets: None,
            cards: &[],
            pagination: &pagination,
            notice: None,
        })
        .unwrap();
        assert!(html.contains("Card not found."));
        assert!(html.contains(SITE_TITLE));
        assert!(!html.contains(r#"class="pagination""#));
    }

    #[test]
    fn test_grid_escapes_and_prices() {
        let filters = Filters::default();
        let pagination = Pagination::new(1, 12, 1);
        let cards = vec![card("x-1", "<script>")];
        let html = render_storefront(&StorefrontRenderData {
            filters: &filters,
            facets: None,
            cards: &cards,
            pagination: &pagination,
            notice: Some("Failed to load filters"),
        })
        .unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("$0.00"));
        assert!(html.contains(r#"href="/cards/x-1?back=%2F%3Fpage%3D1%26pageSize%3D12""#));
        assert!(html.contains("Failed to load filters"));
    }

    #[test]
    fn test_sidebar_marks_selected_values() {
        let facets = Facets {
            supertypes: vec!["Pokémon".to_string(), "Trainer".to_string()],
            types: vec!["Fire".to_string()],
            subtypes: vec![],
            rarities: vec!["Common".to_string()],
        };
        let filters = Filters {
            supertypes: vec!["Trainer".to_string()],
            ..Default::default()
        };
        let pagination = Pagination::new(1, 12, 0);
        let html = render_storefront(&StorefrontRenderData {
            filters: &filters,
            facets: Some(&facets),
            cards: &[],
            pagination: &pagination,
            notice: None,
        })
        .unwrap();
        assert!(html.contains(r#"name="supertype" value="Trainer" checked>"#));
        assert!(html.contains(r#"name="supertype" value="Pokémon">"#));
        assert!(html.contains(r#"name="type" value="Fire">"#));
        assert!(html.contains("Pokemon Type"));
        assert!(html.contains("Apply Filters"));
        assert!(!html.contains(r#"name="page""#));
    }

    #[test]
    fn test_pagination_links_keep_filters() {
        let filters = Filters {
            rarities: vec!["Rare Holo".to_string()],
            ..Default::default()
        };
        let pagination = Pagination::new(2, 12, 60);
        let html = render_storefront(&StorefrontRenderData {
            filters: &filters,
            facets: None,
            cards: &[card("a-1", "A")],
            pagination: &pagination,
            notice: None,
        })
        .unwrap();
        assert!(html.contains(r#"href="/?rarity=Rare%20Holo&amp;page=1&amp;pageSize=12" rel="prev""#));
        assert!(html.contains(r#"href="/?rarity=Rare%20Holo&amp;page=3&amp;pageSize=12" rel="next""#));
        assert!(html.contains(r#"aria-current="page">2<"#));
    }

    #[test]
    fn test_detail_view_fields() {
        let mut c = card("xy7-54", "Gardevoir");
        c.supertype = "Pokémon".to_string();
        c.subtypes = vec!["Stage 2".to_string()];
        c.hp = Some("130".to_string());
        c.rarity = Some("Rare Holo".to_string());
        c.flavor_text = Some("It can foresee the future.".to_string());

        let html = render_card_detail(&c, "/?page=2").unwrap();
        assert!(html.contains("<strong>Supertype:</strong> Pokémon"));
        assert!(html.contains("<strong>Subtypes:</strong> Stage 2"));
        assert!(html.contains("<strong>HP:</strong> 130"));
        assert!(html.contains("<strong>Types:</strong> N/A"));
        assert!(html.contains("<strong>Market Price:</strong> $0.00"));
        assert!(html.contains("It can foresee the future."));
        assert!(html.contains(r#"href="/?page=2""#));
    }

    #[test]
    fn test_format_upstream_date() {
        assert_eq!(format_upstream_date("2021/08/04"), "Aug 4, 2021");
        assert_eq!(format_upstream_date("2020/08/14 09:35:00"), "Aug 14, 2020");
        assert_eq!(format_upstream_date("soon"), "soon");
    }

    #[test]
    fn test_back_href_must_be_local() {
        assert_eq!(sanitize_back_href(Some("/?page=2")), "/?page=2");
        assert_eq!(sanitize_back_href(Some("//evil.example")), "/");
        assert_eq!(sanitize_back_href(Some("https://evil.example")), "/");
        // 浏览器会把反斜杠当作斜杠，并丢弃制表符与换行
        assert_eq!(sanitize_back_href(Some("/\\evil.example")), "/");
        assert_eq!(sanitize_back_href(Some("/\\evil.example/phish")), "/");
        assert_eq!(sanitize_back_href(Some("/\t/evil.example")), "/");
        assert_eq!(sanitize_back_href(Some("/\n/evil.example")), "/");
        assert_eq!(sanitize_back_href(None), "/");
    }

    #[test]
    fn test_toggle_href_adds_or_removes_value_and_resets_page() {
        let filters = Filters {
            card_types: vec!["Fire".to_string()],
            ..Default::default()
        };
        assert_eq!(
            toggle_href(&filters, FacetKind::Types, "Water", 24),
            "/?type=Fire&type=Water&page=1&pageSize=24"
        );
        assert_eq!(
            toggle_href(&filters, FacetKind::Types, "Fire", 24),
            "/?page=1&pageSize=24"
        );
    }

    #[test]
    fn test_error_page_is_generic() {
        let html = render_error_page("Server error");
        assert!(html.contains("Server error"));
        assert!(html.contains(SITE_TITLE));
    }
}
