pub mod app;
pub mod backup;
pub mod config;
pub mod db;
pub mod logging;
pub mod mirror;
pub mod signup;
pub mod state;
