// Library interface for karttimer
// The binary and the integration tests both go through these modules

pub mod app;
pub mod config;
pub mod errors;
pub mod history;
pub mod live;
pub mod storage;
pub mod timing;

// Re-export commonly used types
pub use app::KartTimer;
pub use config::AppConfig;
pub use errors::KartTimerError;
pub use storage::{
    Database, Driver, DriverProfileStore, DriverProfiles, MultipleSessionStore, NewSession,
    SessionStore, StorageWorker, WeatherCondition,
};
pub use timing::{MultiTimer, Precision, SingleTimer, Stopwatch, format_lap_time};
