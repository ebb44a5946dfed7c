pub mod conversation;
pub mod core;
pub mod generation;
pub mod market;
pub mod query;
pub mod repl;
pub mod server;
pub mod session;
pub mod tickers;
