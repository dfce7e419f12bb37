pub mod autocomplete;
pub mod catalog;
pub mod config;
pub mod contract;
pub mod core_service;
pub mod due;
pub mod logging;
pub mod model;
pub mod presenter;
pub mod query_dsl;
pub mod runtime;
pub mod search;
pub mod session;
pub mod transport;
