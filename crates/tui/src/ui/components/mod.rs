pub mod component;
pub mod file_select;

pub use component::Component;
