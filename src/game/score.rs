use super::Judgement;

/// Running score and combo for one session.
#[derive(Debug, Clone)]
pub struct ScoreTracker {
    max_score: f64,
    score_per_note: f64,
    score: f64,
    pub combo: u32,
    pub max_combo: u32,
    pub perfect_count: u32,
    pub great_count: u32,
    pub good_count: u32,
    /// Presses judged as Miss.
    pub miss_count: u32,
    /// Notes that scrolled past without a press.
    pub auto_miss_count: u32,
    pub last_judgement: Option<Judgement>,
}

impl ScoreTracker {
    /// `note_count` must be non-zero.
    pub fn new(max_score: f64, note_count: usize) -> Self {
        Self {
            max_score,
            score_per_note: max_score / note_count.max(1) as f64,
            score: 0.0,
            combo: 0,
            max_combo: 0,
            perfect_count: 0,
            great_count: 0,
            good_count: 0,
            miss_count: 0,
            auto_miss_count: 0,
            last_judgement: None,
        }
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn score_per_note(&self) -> f64 {
        self.score_per_note
    }

    pub fn max_score(&self) -> f64 {
        self.max_score
    }

    pub fn add_judgement(&mut self, judgement: Judgement) {
        match judgement {
            Judgement::Perfect => self.perfect_count += 1,
            Judgement::Great => self.great_count += 1,
            Judgement::Good => self.good_count += 1,
            Judgement::Miss => self.miss_count += 1,
        }

        if judgement.breaks_combo() {
            self.combo = 0;
        } else {
            self.combo += 1;
        }
        self.max_combo = self.max_combo.max(self.combo);

        // Clamped: summing max_score / n n times may overshoot by an ulp.
        self.score = (self.score + judgement.weight() * self.score_per_note).min(self.max_score);
        self.last_judgement = Some(judgement);
    }

    pub fn add_auto_miss(&mut self) {
        self.auto_miss_count += 1;
        self.combo = 0;
        self.last_judgement = Some(Judgement::Miss);
    }

    /// Notes resolved so far, by press or by sweep.
    pub fn judged_notes(&self) -> u32 {
        self.perfect_count
            + self.great_count
            + self.good_count
            + self.miss_count
            + self.auto_miss_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_score_accumulates() {
        let mut score = ScoreTracker::new(1_000_000.0, 4);
        assert!((score.score_per_note() - 250_000.0).abs() < f64::EPSILON);

        score.add_judgement(Judgement::Perfect);
        score.add_judgement(Judgement::Great);
        score.add_judgement(Judgement::Good);
        score.add_judgement(Judgement::Miss);

        let expected = 250_000.0 * (1.0 + 0.8 + 0.5);
        assert!((score.score() - expected).abs() < 1e-6);
    }

    #[test]
    fn combo_resets_on_miss() {
        let mut score = ScoreTracker::new(1_000_000.0, 10);
        score.add_judgement(Judgement::Perfect);
        score.add_judgement(Judgement::Good);
        assert_eq!(score.combo, 2);

        score.add_judgement(Judgement::Miss);
        assert_eq!(score.combo, 0);
        assert_eq!(score.max_combo, 2);

        score.add_judgement(Judgement::Great);
        score.add_auto_miss();
        assert_eq!(score.combo, 0);
        assert_eq!(score.last_judgement, Some(Judgement::Miss));
    }

    #[test]
    fn score_never_exceeds_max() {
        let mut score = ScoreTracker::new(1_000_000.0, 3);
        for _ in 0..3 {
            score.add_judgement(Judgement::Perfect);
        }
        assert!(score.score() <= 1_000_000.0);
        assert!((score.score() - 1_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn counts_include_auto_misses() {
        let mut score = ScoreTracker::new(100.0, 5);
        score.add_judgement(Judgement::Perfect);
        score.add_judgement(Judgement::Miss);
        score.add_auto_miss();
        assert_eq!(score.miss_count, 1);
        assert_eq!(score.auto_miss_count, 1);
        assert_eq!(score.judged_notes(), 3);
    }
}
