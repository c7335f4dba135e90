pub mod component_filter;
pub mod component_kind;
pub mod component_value;
