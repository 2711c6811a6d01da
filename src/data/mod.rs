//! Data access: connection resolution, dataset IO, and preparation

pub mod connection;
pub mod loader;
pub mod prepare;

pub use connection::{resolve_database_url, ConnectionSettings};
pub use loader::{
    load_dataframe, validate_contract, write_dataframe, CONTRACT_COLUMNS, ENRICHED_COLUMNS,
};
pub use prepare::{
    clean, code_statistics, codes_one_hot, engineer, filter_modeling_rows, DEFAULT_MIN_CODES,
    DEFAULT_MIN_TEXT_CHARS,
};
