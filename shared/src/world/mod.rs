pub mod component;
pub mod entity;
pub mod entity_store;
