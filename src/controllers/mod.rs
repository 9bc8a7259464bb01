pub mod cards;
pub mod facets;
pub mod health;
pub mod pages;

pub use cards::{get_card, proxy_cards};
pub use facets::{list_facet, list_facets};
pub use health::health_check;
pub use pages::{card_detail, storefront};
