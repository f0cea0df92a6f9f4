pub mod auth;
pub mod cfg;
pub mod constant;
pub mod db;
pub mod error;
pub mod holding;
pub mod logging;
pub mod mdw;
pub mod operation;
pub mod portfolio;
pub mod quote;
pub mod req;
pub mod resp;
pub mod server;
pub mod svc;
pub mod user;
pub mod view;
