//! Run tracking core: smooths raw position fixes, accumulates distance and
//! pace, and drives a resumable session whose finished runs land in SQLite.

mod app;
pub mod config;
pub mod db;
pub mod display;
pub mod error;
pub mod location;
pub mod models;
pub mod recovery;
pub mod session;
pub mod store;
pub mod tracking;
pub mod utils;

pub use app::run;
pub use db::Database;
pub use error::{PersistenceError, SensorError, SessionError};
pub use store::RunStore;
