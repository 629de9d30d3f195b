pub mod laps;
pub mod multi;
pub mod single;
pub mod stopwatch;
pub mod ticker;

pub use laps::{
    Precision, average_lap_time, fastest_lap, fastest_lap_index, format_created_at,
    format_lap_time, is_fastest, total_time,
};
pub use multi::{MultiTimer, SLOT_COUNT, TimerSlot};
pub use single::SingleTimer;
pub use stopwatch::Stopwatch;
pub use ticker::Ticker;
