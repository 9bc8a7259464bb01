pub mod card;
pub mod catalog;
pub mod filters;
pub mod pagination;
pub mod response;

pub use card::*;
pub use catalog::*;
pub use filters::*;
pub use pagination::*;
pub use response::*;
