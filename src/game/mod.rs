mod judge;
mod result;
mod score;
mod session;
mod state;

pub use judge::{JudgeOutcome, JudgeSystem, JudgeWindows, Judgement, TimingDirection, TimingStats};
pub use result::PlayResult;
pub use score::ScoreTracker;
pub use session::{
    NoteChange, PressResult, RejectedNote, Session, SessionError, SessionState, TickReport,
};
pub use state::{NoteBoard, NoteId, NoteRecord, NoteStatus};
