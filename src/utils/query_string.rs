use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

// RFC 3986 unreserved 字符保持原样
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// 解析 `application/x-www-form-urlencoded` 查询串，保留重复键与顺序。
///
/// `web::Query` 无法把重复键收集为列表，而筛选表单的每个勾选项都会产生一个同名键。
pub fn parse_pairs(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT).to_string()
}

/// 把键值对编码回查询串
pub fn encode_pairs<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_repeated_keys() {
        let pairs = parse_pairs("rarity=Rare+Holo&rarity=Common&page=2");
        assert_eq!(
            pairs,
            vec![
                ("rarity".to_string(), "Rare Holo".to_string()),
                ("rarity".to_string(), "Common".to_string()),
                ("page".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_decodes_utf8_and_bare_keys() {
        let pairs = parse_pairs("supertype=Pok%C3%A9mon&flag&&x=");
        assert_eq!(pairs[0], ("supertype".to_string(), "Pokémon".to_string()));
        assert_eq!(pairs[1], ("flag".to_string(), String::new()));
        assert_eq!(pairs[2], ("x".to_string(), String::new()));
        assert_eq!(pairs.len(), 3);
    }

    #[test]
    fn test_encode_pairs() {
        let qs = encode_pairs([("subtype", "TAG TEAM"), ("supertype", "Pokémon")]);
        assert_eq!(qs, "subtype=TAG%20TEAM&supertype=Pok%C3%A9mon");
        assert_eq!(parse_pairs(&qs)[0].1, "TAG TEAM");
    }
}
