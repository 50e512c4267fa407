pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod form;
pub mod pests;
pub mod photos;
pub mod protocol;
pub mod record;
pub mod render;
pub mod session;
pub mod signature;
pub mod store;
