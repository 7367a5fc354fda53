pub mod dataset;
pub mod entity;
pub mod table;

pub use dataset::Dataset;
pub use entity::EntityType;
pub use table::Table;
