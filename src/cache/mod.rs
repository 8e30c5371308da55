pub mod object_store;
pub mod table_cache;
