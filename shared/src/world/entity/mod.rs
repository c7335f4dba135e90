pub mod entity_change;
pub mod entity_components;
pub mod entity_id;
