use crate::game::{PlayResult, Session, SessionError, SessionState};
use crate::replay::replay_data::{PressEvent, ReplayData};
use crate::traits::{SongClock, TimeProvider};

/// Drives a session at a fixed tick rate from a recorded press log.
///
/// Tick `n` happens at song time `n * 1000 / tps`; each tick receives the
/// presses recorded since the previous tick.
pub struct ReplayPlayer {
    tps: u32,
    events: Vec<PressEvent>,
    cursor: usize,
}

impl ReplayPlayer {
    pub const DEFAULT_TPS: u32 = 60;

    pub fn new(replay: &ReplayData, tps: u32) -> Self {
        Self::from_events(replay.presses.clone(), tps)
    }

    pub fn from_events(mut events: Vec<PressEvent>, tps: u32) -> Self {
        // Stable: simultaneous presses keep their recorded order.
        events.sort_by_key(|e| e.time_ms);
        Self {
            tps: tps.max(1),
            events,
            cursor: 0,
        }
    }

    pub fn tps(&self) -> u32 {
        self.tps
    }

    pub fn tick_time_ms(&self, tick: u64) -> i64 {
        (tick.saturating_mul(1000) / self.tps as u64) as i64
    }

    /// Lanes of all not yet delivered presses at or before `time_ms`.
    pub fn poll_up_to(&mut self, time_ms: i64) -> Vec<usize> {
        let start = self.cursor;
        while self
            .events
            .get(self.cursor)
            .is_some_and(|e| e.time_ms <= time_ms)
        {
            self.cursor += 1;
        }
        self.events[start..self.cursor].iter().map(|e| e.lane).collect()
    }

    /// Whether all presses have been delivered.
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.events.len()
    }

    /// Start `session` if needed and tick it until it finishes.
    pub fn play(&mut self, session: &mut Session) -> Result<PlayResult, SessionError> {
        if session.state() == SessionState::NotStarted {
            session.start()?;
        }

        let mut tick = 0u64;
        while session.is_active() {
            let time_ms = self.tick_time_ms(tick).max(session.song_time_ms());
            let presses = self.poll_up_to(time_ms);
            let report = session.tick(time_ms, &presses)?;
            for press in &report.presses {
                log::trace!("{time_ms}ms lane {} -> {:?}", press.lane, press.outcome);
            }
            tick += 1;
        }

        Ok(session.summary())
    }

    /// Like [`ReplayPlayer::play`], but song time comes from `clock` instead
    /// of the tick counter. `wait` runs between ticks (a sleep for wall-clock
    /// playback, a provider advance in tests).
    pub fn play_realtime<T: TimeProvider>(
        &mut self,
        session: &mut Session,
        clock: &mut SongClock<T>,
        mut wait: impl FnMut(&T),
    ) -> Result<PlayResult, SessionError> {
        if session.state() == SessionState::NotStarted {
            session.start()?;
        }
        if !clock.is_started() {
            clock.start();
        }

        while session.is_active() {
            let time_ms = clock.song_time_ms().max(session.song_time_ms());
            let presses = self.poll_up_to(time_ms);
            session.tick(time_ms, &presses)?;
            if session.is_active() {
                wait(clock.provider());
            }
        }

        Ok(session.summary())
    }
}
