//! Play session: owns the chart and note states, and runs the
//! sweep-then-judge sequence once per tick.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chart::Chart;
use crate::config::{ConfigError, EngineConfig};

use super::{
    JudgeOutcome, JudgeSystem, Judgement, NoteBoard, NoteId, NoteStatus, PlayResult,
    ScoreTracker, TimingStats,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    NotStarted,
    Active,
    Finished,
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("Chart has no playable notes")]
    EmptyChart,

    #[error("Lane {lane} is out of range (lane count {lane_count})")]
    InvalidLane { lane: usize, lane_count: usize },

    #[error("Song time went backwards: {current_ms}ms after {previous_ms}ms")]
    TimeWentBackwards { previous_ms: i64, current_ms: i64 },

    #[error("Session is not active ({0:?})")]
    NotActive(SessionState),

    #[error("Cannot move session from {from:?} to {to:?}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },

    #[error("Invalid engine config: {0}")]
    Config(#[from] ConfigError),
}

/// A chart note dropped at session construction because of its lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RejectedNote {
    /// Position in the chart's note list.
    pub index: usize,
    pub lane: i32,
    pub time_ms: i64,
}

/// A note whose status changed during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteChange {
    pub id: NoteId,
    pub lane: usize,
    pub time_ms: i64,
    pub status: NoteStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PressResult {
    pub lane: usize,
    pub outcome: JudgeOutcome,
    /// Target note, absent for `NoTarget`.
    pub note: Option<NoteId>,
    /// Press time - note time, absent for `NoTarget`.
    pub delta_ms: Option<i64>,
}

/// Everything the presentation layer needs after a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub song_time_ms: i64,
    pub changes: Vec<NoteChange>,
    pub presses: Vec<PressResult>,
    pub rejected_presses: Vec<usize>,
    pub score: f64,
    pub combo: u32,
    pub last_judgement: Option<Judgement>,
    pub state: SessionState,
}

pub struct Session {
    chart: Chart,
    config: EngineConfig,
    judge: JudgeSystem,
    board: NoteBoard,
    score: ScoreTracker,
    timing_stats: TimingStats,
    state: SessionState,
    song_time_ms: i64,
    end_time_ms: i64,
    started_at: Option<DateTime<Utc>>,
    rejected_notes: Vec<RejectedNote>,
}

impl Session {
    /// Build a session for `chart`. Notes on invalid lanes are dropped and
    /// logged; fails with [`SessionError::EmptyChart`] if none remain.
    pub fn new(chart: Chart, config: EngineConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let lane_count = config.lane_count;

        let mut accepted = Vec::with_capacity(chart.notes.len());
        let mut rejected_notes = Vec::new();
        for (index, note) in chart.notes.iter().enumerate() {
            match note.lane_index(lane_count) {
                Some(lane) => accepted.push((lane, note.time_ms)),
                None => {
                    log::warn!(
                        "Rejected note #{index} in {}: lane {} is out of range (lane count {lane_count})",
                        chart.song,
                        note.lane
                    );
                    rejected_notes.push(RejectedNote {
                        index,
                        lane: note.lane,
                        time_ms: note.time_ms,
                    });
                }
            }
        }

        let Some(last_note_ms) = accepted.iter().map(|&(_, t)| t).max() else {
            return Err(SessionError::EmptyChart);
        };

        let board = NoteBoard::new(lane_count, accepted);
        let score = ScoreTracker::new(config.max_score, board.len());

        Ok(Self {
            judge: JudgeSystem::new(config.windows),
            end_time_ms: last_note_ms.saturating_add(config.trailing_grace_ms),
            chart,
            config,
            board,
            score,
            timing_stats: TimingStats::default(),
            state: SessionState::NotStarted,
            song_time_ms: 0,
            started_at: None,
            rejected_notes,
        })
    }

    /// NotStarted → Active.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::NotStarted {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to: SessionState::Active,
            });
        }
        let now = Utc::now();
        self.started_at = Some(now);
        self.state = SessionState::Active;
        log::info!(
            "Session started: {} ({} notes, {:.2} per note) at {now}",
            self.chart.song,
            self.board.len(),
            self.score.score_per_note()
        );
        Ok(())
    }

    /// Run one tick: sweep overdue notes, then judge `presses` in order.
    ///
    /// A tick whose time is earlier than the previous one is rejected and
    /// leaves the session untouched. Presses on invalid lanes are skipped and
    /// listed in the report.
    pub fn tick(&mut self, song_time_ms: i64, presses: &[usize]) -> Result<TickReport, SessionError> {
        self.advance_clock(song_time_ms)?;

        let mut changes = self.sweep_overdue();
        let mut results = Vec::with_capacity(presses.len());
        let mut rejected_presses = Vec::new();

        for &lane in presses {
            match self.press(lane) {
                Ok((result, change)) => {
                    results.push(result);
                    changes.extend(change);
                }
                Err(e) => {
                    log::warn!("Rejected press at {song_time_ms}ms: {e}");
                    rejected_presses.push(lane);
                }
            }
        }

        self.update_state();

        Ok(TickReport {
            song_time_ms,
            changes,
            presses: results,
            rejected_presses,
            score: self.score.score(),
            combo: self.score.combo,
            last_judgement: self.score.last_judgement,
            state: self.state,
        })
    }

    /// Judge a single press on `lane` at `song_time_ms`.
    ///
    /// Does not sweep; callers driving the phases by hand should call
    /// [`Session::sweep`] first.
    pub fn judge(&mut self, lane: usize, song_time_ms: i64) -> Result<JudgeOutcome, SessionError> {
        self.check_lane(lane)?;
        self.advance_clock(song_time_ms)?;
        let (result, _) = self.press(lane)?;
        self.update_state();
        Ok(result.outcome)
    }

    /// Force-miss every pending note that has scrolled past the miss window.
    pub fn sweep(&mut self, song_time_ms: i64) -> Result<Vec<NoteChange>, SessionError> {
        self.advance_clock(song_time_ms)?;
        let changes = self.sweep_overdue();
        self.update_state();
        Ok(changes)
    }

    fn advance_clock(&mut self, song_time_ms: i64) -> Result<(), SessionError> {
        if self.state != SessionState::Active {
            return Err(SessionError::NotActive(self.state));
        }
        if song_time_ms < self.song_time_ms {
            let err = SessionError::TimeWentBackwards {
                previous_ms: self.song_time_ms,
                current_ms: song_time_ms,
            };
            log::warn!("Rejected tick: {err}");
            return Err(err);
        }
        self.song_time_ms = song_time_ms;
        Ok(())
    }

    fn check_lane(&self, lane: usize) -> Result<(), SessionError> {
        if lane >= self.config.lane_count {
            return Err(SessionError::InvalidLane {
                lane,
                lane_count: self.config.lane_count,
            });
        }
        Ok(())
    }

    fn sweep_overdue(&mut self) -> Vec<NoteChange> {
        // Overdue once the offset-adjusted press time is past the miss window.
        let cutoff_ms = self
            .press_time_ms()
            .saturating_sub(self.config.windows.miss_ms);
        let mut changes = Vec::new();

        for lane in 0..self.board.lane_count() {
            for id in self.board.pending_before(lane, cutoff_ms) {
                if !self.board.mark_missed(id) {
                    continue;
                }
                self.score.add_auto_miss();
                if let Some(note) = self.board.get(id) {
                    log::debug!("Auto-miss lane {lane} note at {}ms", note.time_ms);
                    changes.push(NoteChange {
                        id,
                        lane,
                        time_ms: note.time_ms,
                        status: note.status,
                    });
                }
            }
        }
        changes
    }

    fn press(&mut self, lane: usize) -> Result<(PressResult, Option<NoteChange>), SessionError> {
        self.check_lane(lane)?;

        let target = self
            .board
            .first_pending(lane)
            .and_then(|id| self.board.get(id).map(|note| (id, *note)));
        let Some((id, note)) = target else {
            return Ok((
                PressResult {
                    lane,
                    outcome: JudgeOutcome::NoTarget,
                    note: None,
                    delta_ms: None,
                },
                None,
            ));
        };
        let delta_ms = self.press_time_ms().saturating_sub(note.time_ms);

        let Some(judgement) = self.judge.judge(delta_ms) else {
            return Ok((
                PressResult {
                    lane,
                    outcome: JudgeOutcome::NullPress,
                    note: Some(id),
                    delta_ms: Some(delta_ms),
                },
                None,
            ));
        };

        self.board.mark_hit(id, judgement);
        self.score.add_judgement(judgement);
        self.timing_stats.record(judgement, delta_ms);
        log::debug!("{judgement} on lane {lane} ({delta_ms:+}ms), combo {}", self.score.combo);

        Ok((
            PressResult {
                lane,
                outcome: JudgeOutcome::Judged(judgement),
                note: Some(id),
                delta_ms: Some(delta_ms),
            },
            Some(NoteChange {
                id,
                lane,
                time_ms: note.time_ms,
                status: NoteStatus::Hit(judgement),
            }),
        ))
    }

    /// Song time with the judge offset removed.
    fn press_time_ms(&self) -> i64 {
        self.song_time_ms.saturating_sub(self.config.judge_offset_ms)
    }

    fn update_state(&mut self) {
        if self.state == SessionState::Active && self.song_time_ms > self.end_time_ms {
            self.state = SessionState::Finished;
            log::info!(
                "Session finished: {} score {:.0}, max combo {}",
                self.chart.song,
                self.score.score(),
                self.score.max_combo
            );
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn is_finished(&self) -> bool {
        self.state == SessionState::Finished
    }

    pub fn song_time_ms(&self) -> i64 {
        self.song_time_ms
    }

    /// Song time after which the session finishes.
    pub fn end_time_ms(&self) -> i64 {
        self.end_time_ms
    }

    pub fn score(&self) -> f64 {
        self.score.score()
    }

    pub fn score_per_note(&self) -> f64 {
        self.score.score_per_note()
    }

    pub fn combo(&self) -> u32 {
        self.score.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.score.max_combo
    }

    pub fn last_judgement(&self) -> Option<Judgement> {
        self.score.last_judgement
    }

    pub fn tracker(&self) -> &ScoreTracker {
        &self.score
    }

    pub fn timing_stats(&self) -> &TimingStats {
        &self.timing_stats
    }

    pub fn note_status(&self, id: NoteId) -> Option<NoteStatus> {
        self.board.status(id)
    }

    pub fn notes(&self) -> &NoteBoard {
        &self.board
    }

    pub fn note_count(&self) -> usize {
        self.board.len()
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn rejected_notes(&self) -> &[RejectedNote] {
        &self.rejected_notes
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn summary(&self) -> PlayResult {
        PlayResult {
            song: self.chart.song.clone(),
            bpm: self.chart.bpm,
            offset_ms: self.chart.offset_ms,
            total_notes: u32::try_from(self.board.len()).unwrap_or(u32::MAX),
            score: self.score.score(),
            max_score: self.score.max_score(),
            max_combo: self.score.max_combo,
            perfect_count: self.score.perfect_count,
            great_count: self.score.great_count,
            good_count: self.score.good_count,
            miss_count: self.score.miss_count,
            auto_miss_count: self.score.auto_miss_count,
            fast_count: self.timing_stats.fast_count,
            slow_count: self.timing_stats.slow_count,
            started_at: self.started_at,
            state: self.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartNote;

    fn active(notes: Vec<ChartNote>) -> Session {
        let chart = Chart::new("test", 120.0, 0, notes);
        let mut session = Session::new(chart, EngineConfig::default()).unwrap();
        session.start().unwrap();
        session
    }

    #[test]
    fn new_session_is_not_started() {
        let session = Session::new(Chart::demo(), EngineConfig::default()).unwrap();
        assert_eq!(session.state(), SessionState::NotStarted);
        assert!(session.started_at().is_none());
        assert!((session.score_per_note() - 250_000.0).abs() < f64::EPSILON);
        assert_eq!(session.end_time_ms(), 5500);
    }

    #[test]
    fn tick_requires_start() {
        let mut session = Session::new(Chart::demo(), EngineConfig::default()).unwrap();
        assert_eq!(
            session.tick(0, &[]),
            Err(SessionError::NotActive(SessionState::NotStarted))
        );
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut session = active(vec![ChartNote::new(0, 1000)]);
        assert_eq!(
            session.start(),
            Err(SessionError::InvalidTransition {
                from: SessionState::Active,
                to: SessionState::Active,
            })
        );
        assert!(session.started_at().is_some());
    }

    #[test]
    fn invalid_chart_lanes_are_dropped() {
        let chart = Chart::new(
            "lanes",
            120.0,
            0,
            vec![ChartNote::new(0, 1000), ChartNote::new(7, 1200), ChartNote::new(-2, 1300)],
        );
        let session = Session::new(chart, EngineConfig::default()).unwrap();
        assert_eq!(session.note_count(), 1);
        assert_eq!(session.rejected_notes().len(), 2);
        assert_eq!(session.rejected_notes()[0].index, 1);
        assert_eq!(session.rejected_notes()[1].lane, -2);
        assert!((session.score_per_note() - 1_000_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn all_lanes_invalid_is_empty_chart() {
        let chart = Chart::new("none", 120.0, 0, vec![ChartNote::new(9, 1000)]);
        assert!(matches!(
            Session::new(chart, EngineConfig::default()),
            Err(SessionError::EmptyChart)
        ));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EngineConfig {
            lane_count: 0,
            ..Default::default()
        };
        assert!(matches!(
            Session::new(Chart::demo(), config),
            Err(SessionError::Config(ConfigError::NoLanes))
        ));
    }

    #[test]
    fn backwards_tick_leaves_state_unchanged() {
        let mut session = active(vec![ChartNote::new(0, 1000), ChartNote::new(0, 2000)]);
        session.tick(1000, &[0]).unwrap();
        let score = session.score();

        let err = session.tick(999, &[0]).unwrap_err();
        assert_eq!(
            err,
            SessionError::TimeWentBackwards {
                previous_ms: 1000,
                current_ms: 999
            }
        );
        assert_eq!(session.song_time_ms(), 1000);
        assert_eq!(session.combo(), 1);
        assert!((session.score() - score).abs() < f64::EPSILON);
        assert_eq!(session.note_status(NoteId(1)), Some(NoteStatus::Pending));
    }

    #[test]
    fn invalid_press_lane_does_not_abort_tick() {
        let mut session = active(vec![ChartNote::new(1, 1000)]);
        let report = session.tick(1000, &[9, 1]).unwrap();
        assert_eq!(report.rejected_presses, vec![9]);
        assert_eq!(report.presses.len(), 1);
        assert_eq!(report.presses[0].outcome, JudgeOutcome::Judged(Judgement::Perfect));
        assert_eq!(report.combo, 1);
    }

    #[test]
    fn judge_rejects_invalid_lane() {
        let mut session = active(vec![ChartNote::new(1, 1000)]);
        assert_eq!(
            session.judge(4, 1000),
            Err(SessionError::InvalidLane {
                lane: 4,
                lane_count: 4
            })
        );
        assert_eq!(session.song_time_ms(), 0);
    }

    #[test]
    fn sweep_runs_before_presses() {
        let mut session = active(vec![ChartNote::new(0, 1000), ChartNote::new(0, 1200)]);
        // At 1125 the first note is overdue, so the press lands on the second.
        let report = session.tick(1125, &[0]).unwrap();
        assert_eq!(report.changes[0].status, NoteStatus::Missed);
        assert_eq!(report.presses[0].note, Some(NoteId(1)));
        assert_eq!(report.presses[0].outcome, JudgeOutcome::Judged(Judgement::Great));
        assert_eq!(report.combo, 1);
    }

    #[test]
    fn judge_offset_shifts_press_time() {
        let chart = Chart::new("offset", 120.0, 0, vec![ChartNote::new(0, 1000)]);
        let config = EngineConfig {
            judge_offset_ms: 30,
            ..Default::default()
        };
        let mut session = Session::new(chart, config).unwrap();
        session.start().unwrap();
        assert_eq!(
            session.judge(0, 1030),
            Ok(JudgeOutcome::Judged(Judgement::Perfect))
        );
    }

    #[test]
    fn judge_offset_delays_sweep() {
        let chart = Chart::new("offset", 120.0, 0, vec![ChartNote::new(0, 1000)]);
        let config = EngineConfig {
            judge_offset_ms: 50,
            ..Default::default()
        };
        let mut session = Session::new(chart, config).unwrap();
        session.start().unwrap();

        // 1140 - 50 is 90ms late: still Good, not yet overdue.
        let report = session.tick(1140, &[0]).unwrap();
        assert_eq!(report.presses[0].outcome, JudgeOutcome::Judged(Judgement::Good));
        assert_eq!(report.presses[0].delta_ms, Some(90));
        assert_eq!(
            report.changes,
            vec![NoteChange {
                id: NoteId(0),
                lane: 0,
                time_ms: 1000,
                status: NoteStatus::Hit(Judgement::Good),
            }]
        );
    }

    #[test]
    fn judge_offset_sweep_edge() {
        let chart = Chart::new("offset", 120.0, 0, vec![ChartNote::new(0, 1000)]);
        let config = EngineConfig {
            judge_offset_ms: 50,
            ..Default::default()
        };
        let mut session = Session::new(chart, config).unwrap();
        session.start().unwrap();

        assert!(session.sweep(1170).unwrap().is_empty());
        assert_eq!(session.sweep(1171).unwrap().len(), 1);
        assert_eq!(session.note_status(NoteId(0)), Some(NoteStatus::Missed));
    }

    #[test]
    fn extreme_offset_does_not_overflow() {
        let config = EngineConfig {
            judge_offset_ms: i64::MIN,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        let chart = Chart::new("extreme", 120.0, 0, vec![ChartNote::new(0, 1000)]);
        let mut session = Session::new(chart, config).unwrap();
        session.start().unwrap();

        let report = session.tick(1, &[0]).unwrap();
        assert_eq!(report.changes[0].status, NoteStatus::Missed);
        assert_eq!(report.presses[0].outcome, JudgeOutcome::NoTarget);

        let config = EngineConfig {
            judge_offset_ms: i64::MAX,
            ..Default::default()
        };
        let chart = Chart::new("extreme", 120.0, 0, vec![ChartNote::new(0, 1000)]);
        let mut session = Session::new(chart, config).unwrap();
        session.start().unwrap();
        assert_eq!(session.judge(0, 1000), Ok(JudgeOutcome::NullPress));
        assert_eq!(session.note_status(NoteId(0)), Some(NoteStatus::Pending));
    }

    #[test]
    fn extreme_note_times_do_not_overflow() {
        let mut session = active(vec![ChartNote::new(0, i64::MIN), ChartNote::new(1, i64::MAX)]);

        assert_eq!(session.judge(0, 0), Ok(JudgeOutcome::NullPress));
        assert_eq!(session.judge(1, 0), Ok(JudgeOutcome::NullPress));
        assert_eq!(session.end_time_ms(), i64::MAX);
        assert!(session.is_active());
    }

    #[test]
    fn finishes_after_trailing_grace() {
        let mut session = active(vec![ChartNote::new(0, 1000)]);
        let report = session.tick(4000, &[]).unwrap();
        assert_eq!(report.state, SessionState::Active);

        let report = session.tick(4001, &[]).unwrap();
        assert_eq!(report.state, SessionState::Finished);
        assert!(session.is_finished());
        assert_eq!(
            session.tick(4002, &[]),
            Err(SessionError::NotActive(SessionState::Finished))
        );
        assert!(session.start().is_err());
    }

    #[test]
    fn summary_reflects_play() {
        let mut session = active(vec![
            ChartNote::new(0, 1000),
            ChartNote::new(1, 1000),
            ChartNote::new(2, 2000),
        ]);
        session.tick(1070, &[0, 1]).unwrap();
        session.tick(5100, &[]).unwrap();

        let result = session.summary();
        assert_eq!(result.total_notes, 3);
        assert_eq!(result.great_count, 2);
        assert_eq!(result.auto_miss_count, 1);
        assert_eq!(result.slow_count, 2);
        assert_eq!(result.max_combo, 2);
        assert_eq!(result.state, SessionState::Finished);
    }
}
