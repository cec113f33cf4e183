pub mod animation;
pub mod manager;
pub mod marker;
pub mod style;
pub mod sync;
