pub mod cart;
pub mod language;
pub mod post;
pub mod product;
