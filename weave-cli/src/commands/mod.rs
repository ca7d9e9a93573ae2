pub mod render;
pub mod tokens;
pub mod views;
