pub mod log_parser;
pub mod summary;
