pub mod schema;
pub mod collections;
