pub mod api;
pub mod config;
pub mod session;
pub mod state;
pub mod telemetry;
pub mod terminal;
pub mod tools;
pub mod types;
pub mod ui;
pub mod util;

#[cfg(test)]
mod test_support;
