pub mod layout;
pub mod line_source;
pub mod table_writer;
