pub mod error;
pub mod html_renderer;
pub mod query_string;
