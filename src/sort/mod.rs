pub mod spec;
pub mod compare;
pub mod external;
pub mod merge;
pub mod coordinator;
