//! Summary panel and resource overlay for the selection widget.

mod file_select_component;
mod resource_modal_component;
mod state;

pub use file_select_component::FileSelectComponent;
pub use resource_modal_component::ResourceModalComponent;
pub use state::ResourcePickerState;
