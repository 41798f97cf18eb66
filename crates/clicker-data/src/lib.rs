//! Data-driven catalog loading for clicker-core.
//!
//! A catalog directory holds one file per definition kind, each in RON,
//! JSON or TOML (chosen by extension):
//!
//! - `currencies` (required)
//! - `producers` (required)
//! - `upgrades` (required)
//! - `achievements` (optional)
//! - `engine` (optional [`EngineConfig`](clicker_core::engine::EngineConfig))
//!
//! [`load_game_data`] reads them, checks every cross-reference and builds
//! the immutable [`Catalog`](clicker_core::catalog::Catalog).

pub mod condition;
pub mod loader;
pub mod schema;

pub use condition::Condition;
pub use loader::{DataLoadError, GameData, load_game_data};
