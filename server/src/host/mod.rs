pub mod component_usage_tracker;
pub mod hosted_entity_data;
pub mod interest_registry;
pub mod interest_set;
pub mod local_view;
