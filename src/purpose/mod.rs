//! Purposes: user-defined labels for what a transaction was for.

mod db;
mod domain;
mod query;

pub use db::{
    create_purpose, create_purpose_table, delete_purpose, get_all_purposes, get_purpose,
    rename_purpose,
};
pub use domain::{Purpose, PurposeName, UNRESOLVED_PURPOSE_LABEL};
pub use query::{PurposeQuery, query_purposes};
