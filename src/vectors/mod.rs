pub mod displacement;
pub mod list;
