pub mod sidebar;

pub use sidebar::{LocationEntry, Sidebar};
