pub mod time;

pub use time::{MockTimeProvider, SongClock, SystemTimeProvider, TimeProvider};
