use serde::{Deserialize, Serialize};

/// Judgement tier assigned to a resolved press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Judgement {
    Perfect,
    Great,
    Good,
    Miss,
}

impl Judgement {
    /// Fraction of the per-note score awarded for this tier.
    pub fn weight(&self) -> f64 {
        match self {
            Self::Perfect => 1.0,
            Self::Great => 0.8,
            Self::Good => 0.5,
            Self::Miss => 0.0,
        }
    }

    pub fn breaks_combo(&self) -> bool {
        matches!(self, Self::Miss)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Perfect => "Perfect",
            Self::Great => "Great",
            Self::Good => "Good",
            Self::Miss => "Miss",
        }
    }
}

impl std::fmt::Display for Judgement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of a single lane press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JudgeOutcome {
    /// The earliest pending note in the lane was resolved with this tier.
    Judged(Judgement),
    /// No pending note in the lane.
    NoTarget,
    /// A pending note exists but the press fell outside every window.
    NullPress,
}

impl JudgeOutcome {
    pub fn judgement(&self) -> Option<Judgement> {
        match self {
            Self::Judged(j) => Some(*j),
            Self::NoTarget | Self::NullPress => None,
        }
    }
}

/// Timing direction for FAST/SLOW display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingDirection {
    Fast,
    Exact,
    Slow,
}

impl TimingDirection {
    /// `delta_ms` = press time - note time (negative = early).
    pub fn from_delta(delta_ms: i64) -> Self {
        match delta_ms.signum() {
            -1 => TimingDirection::Fast,
            1 => TimingDirection::Slow,
            _ => TimingDirection::Exact,
        }
    }
}

/// Cumulative FAST/SLOW statistics during gameplay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimingStats {
    pub fast_count: u32,
    pub slow_count: u32,
}

impl TimingStats {
    pub fn record(&mut self, judgement: Judgement, delta_ms: i64) {
        // Perfect is not split into FAST/SLOW
        if judgement == Judgement::Perfect {
            return;
        }

        match TimingDirection::from_delta(delta_ms) {
            TimingDirection::Fast => self.fast_count += 1,
            TimingDirection::Slow => self.slow_count += 1,
            TimingDirection::Exact => {}
        }
    }
}

/// Inclusive upper bounds on `|delta|` in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeWindows {
    #[serde(default = "default_perfect_ms")]
    pub perfect_ms: i64,
    #[serde(default = "default_great_ms")]
    pub great_ms: i64,
    #[serde(default = "default_good_ms")]
    pub good_ms: i64,
    /// Also the auto-miss threshold.
    #[serde(default = "default_miss_ms")]
    pub miss_ms: i64,
}

fn default_perfect_ms() -> i64 {
    50
}

fn default_great_ms() -> i64 {
    80
}

fn default_good_ms() -> i64 {
    100
}

fn default_miss_ms() -> i64 {
    120
}

impl JudgeWindows {
    pub fn normal() -> Self {
        Self {
            perfect_ms: default_perfect_ms(),
            great_ms: default_great_ms(),
            good_ms: default_good_ms(),
            miss_ms: default_miss_ms(),
        }
    }

    /// Build windows from thresholds given in seconds.
    pub fn from_secs(perfect: f64, great: f64, good: f64, miss: f64) -> Self {
        let ms = |secs: f64| (secs * 1000.0).round() as i64;
        Self {
            perfect_ms: ms(perfect),
            great_ms: ms(great),
            good_ms: ms(good),
            miss_ms: ms(miss),
        }
    }

    pub fn is_ascending(&self) -> bool {
        0 <= self.perfect_ms
            && self.perfect_ms <= self.great_ms
            && self.great_ms <= self.good_ms
            && self.good_ms <= self.miss_ms
    }
}

impl Default for JudgeWindows {
    fn default() -> Self {
        Self::normal()
    }
}

pub struct JudgeSystem {
    windows: JudgeWindows,
}

impl JudgeSystem {
    pub fn new(windows: JudgeWindows) -> Self {
        Self { windows }
    }

    pub fn windows(&self) -> &JudgeWindows {
        &self.windows
    }

    /// Classify a press. `delta_ms` = press time - note time.
    /// `None` means the press is outside every window.
    pub fn judge(&self, delta_ms: i64) -> Option<Judgement> {
        let abs_delta = delta_ms.unsigned_abs();
        let within = |window: i64| abs_delta <= window.max(0) as u64;

        if within(self.windows.perfect_ms) {
            Some(Judgement::Perfect)
        } else if within(self.windows.great_ms) {
            Some(Judgement::Great)
        } else if within(self.windows.good_ms) {
            Some(Judgement::Good)
        } else if within(self.windows.miss_ms) {
            Some(Judgement::Miss)
        } else {
            None
        }
    }

    /// Whether a note scheduled `delta_ms` ago has scrolled past the miss window.
    pub fn is_missed(&self, delta_ms: i64) -> bool {
        delta_ms > self.windows.miss_ms
    }
}

impl Default for JudgeSystem {
    fn default() -> Self {
        Self::new(JudgeWindows::normal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_windows_match_second_thresholds() {
        assert_eq!(
            JudgeWindows::normal(),
            JudgeWindows::from_secs(0.05, 0.08, 0.10, 0.12)
        );
    }

    #[test]
    fn windows_are_inclusive() {
        let judge = JudgeSystem::default();
        assert_eq!(judge.judge(50), Some(Judgement::Perfect));
        assert_eq!(judge.judge(51), Some(Judgement::Great));
        assert_eq!(judge.judge(-80), Some(Judgement::Great));
        assert_eq!(judge.judge(100), Some(Judgement::Good));
        assert_eq!(judge.judge(-120), Some(Judgement::Miss));
        assert_eq!(judge.judge(121), None);
    }

    #[test]
    fn weights_and_combo() {
        assert!((Judgement::Perfect.weight() - 1.0).abs() < f64::EPSILON);
        assert!((Judgement::Great.weight() - 0.8).abs() < f64::EPSILON);
        assert!((Judgement::Good.weight() - 0.5).abs() < f64::EPSILON);
        assert!(Judgement::Miss.weight().abs() < f64::EPSILON);
        assert!(Judgement::Miss.breaks_combo());
        assert!(!Judgement::Good.breaks_combo());
    }

    #[test]
    fn is_missed_is_strict() {
        let judge = JudgeSystem::default();
        assert!(!judge.is_missed(120));
        assert!(judge.is_missed(121));
        assert!(!judge.is_missed(-500));
    }

    #[test]
    fn timing_stats_skip_perfect() {
        let mut stats = TimingStats::default();
        stats.record(Judgement::Perfect, -30);
        stats.record(Judgement::Great, -60);
        stats.record(Judgement::Good, 95);
        stats.record(Judgement::Miss, 110);
        assert_eq!(stats.fast_count, 1);
        assert_eq!(stats.slow_count, 2);
    }

    #[test]
    fn ascending_check() {
        assert!(JudgeWindows::normal().is_ascending());
        let broken = JudgeWindows {
            great_ms: 30,
            ..JudgeWindows::normal()
        };
        assert!(!broken.is_ascending());
    }
}
