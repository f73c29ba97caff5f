use serde::{Deserialize, Serialize};

use super::Judgement;

/// Per-note judgement status. Leaves `Pending` at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteStatus {
    Pending,
    /// Consumed by a press, including a press judged as Miss.
    Hit(Judgement),
    /// Scrolled past the miss window without a press.
    Missed,
}

impl NoteStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Stable index of a note inside a [`NoteBoard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NoteId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteRecord {
    pub lane: usize,
    pub time_ms: i64,
    pub status: NoteStatus,
}

/// Time-ordered note ids for one lane.
#[derive(Debug, Clone, Default)]
struct LaneQueue {
    ids: Vec<NoteId>,
    /// Every id before the cursor is resolved.
    cursor: usize,
}

/// Arena of note records with a per-lane queue ordered by `(time_ms, chart order)`.
#[derive(Debug, Clone)]
pub struct NoteBoard {
    notes: Vec<NoteRecord>,
    lanes: Vec<LaneQueue>,
}

impl NoteBoard {
    /// `notes` are `(lane, time_ms)` pairs with lanes already validated.
    pub fn new(lane_count: usize, notes: impl IntoIterator<Item = (usize, i64)>) -> Self {
        let notes: Vec<NoteRecord> = notes
            .into_iter()
            .map(|(lane, time_ms)| NoteRecord {
                lane,
                time_ms,
                status: NoteStatus::Pending,
            })
            .collect();

        let mut lanes = vec![LaneQueue::default(); lane_count];
        for (i, note) in notes.iter().enumerate() {
            if let Some(queue) = lanes.get_mut(note.lane) {
                queue.ids.push(NoteId(i));
            }
        }
        // Stable sort keeps chart order for notes sharing a timestamp.
        for queue in &mut lanes {
            queue.ids.sort_by_key(|id| notes[id.0].time_ms);
        }

        Self { notes, lanes }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn get(&self, id: NoteId) -> Option<&NoteRecord> {
        self.notes.get(id.0)
    }

    pub fn status(&self, id: NoteId) -> Option<NoteStatus> {
        self.get(id).map(|n| n.status)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NoteId, &NoteRecord)> {
        self.notes.iter().enumerate().map(|(i, n)| (NoteId(i), n))
    }

    /// Earliest pending note in `lane`.
    pub fn first_pending(&mut self, lane: usize) -> Option<NoteId> {
        let notes = &self.notes;
        let queue = self.lanes.get_mut(lane)?;
        while let Some(&id) = queue.ids.get(queue.cursor) {
            if notes[id.0].status.is_pending() {
                return Some(id);
            }
            queue.cursor += 1;
        }
        None
    }

    /// Pending → Hit. Returns `false` if the note was already resolved.
    pub fn mark_hit(&mut self, id: NoteId, judgement: Judgement) -> bool {
        self.transition(id, NoteStatus::Hit(judgement))
    }

    /// Pending → Missed. Returns `false` if the note was already resolved.
    pub fn mark_missed(&mut self, id: NoteId) -> bool {
        self.transition(id, NoteStatus::Missed)
    }

    fn transition(&mut self, id: NoteId, next: NoteStatus) -> bool {
        match self.notes.get_mut(id.0) {
            Some(note) if note.status.is_pending() => {
                note.status = next;
                true
            }
            _ => false,
        }
    }

    /// Pending notes in `lane` whose time is strictly before `cutoff_ms`, in lane order.
    pub fn pending_before(&mut self, lane: usize, cutoff_ms: i64) -> Vec<NoteId> {
        let mut overdue = Vec::new();
        if self.first_pending(lane).is_none() {
            return overdue;
        }
        let queue = &self.lanes[lane];
        for &id in &queue.ids[queue.cursor..] {
            let note = &self.notes[id.0];
            if note.time_ms >= cutoff_ms {
                break;
            }
            if note.status.is_pending() {
                overdue.push(id);
            }
        }
        overdue
    }

    pub fn pending_count(&self) -> usize {
        self.notes.iter().filter(|n| n.status.is_pending()).count()
    }

    pub fn all_resolved(&self) -> bool {
        self.notes.iter().all(|n| !n.status.is_pending())
    }
}
