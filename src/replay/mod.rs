//! Press logs and the fixed-rate tick driver that replays them.

mod replay_data;
mod replay_player;

pub use replay_data::{PressEvent, ReplayData};
pub use replay_player::ReplayPlayer;
