//! Box-based damage tracks used for both health and willpower.
//!
//! A track holds `capacity` boxes. Each box is unmarked, superficial or
//! aggravated; the canonical order is aggravated first, then superficial, then
//! unmarked, so only the counts are stored.

use crate::combat::Severity;
use crate::error::{CombatError, ErrorContext, ErrorSeverity};

/// Visual state of a single box, as reported by [`HealthTrack::boxes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoxState {
    Unmarked,
    Superficial,
    Aggravated,
}

/// Which of a combatant's two tracks a packet or cost targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum TrackKind {
    #[default]
    Health,
    Willpower,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HealthTrack {
    capacity: u32,
    superficial: u32,
    aggravated: u32,
}

/// What a single application did to the track.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackOutcome {
    /// Unmarked boxes that received a new mark.
    pub marked: u32,
    /// Superficial marks replaced by aggravated ones.
    pub upconverted: u32,
    /// The hit did not fit and the track collapsed to fully aggravated.
    pub collapsed: bool,
    pub weakened: bool,
    pub destroyed: bool,
}

/// Marks removed when a track shrinks, kept so they can be put back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClearedMarks {
    pub superficial: u32,
    pub aggravated: u32,
}

impl ClearedMarks {
    pub fn is_empty(&self) -> bool {
        self.superficial == 0 && self.aggravated == 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrackError {
    #[error(
        "track holds {superficial} superficial + {aggravated} aggravated marks but only {capacity} boxes"
    )]
    CapacityExceeded {
        capacity: u32,
        superficial: u32,
        aggravated: u32,
        context: ErrorContext,
    },
}

impl CombatError for TrackError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::CapacityExceeded { context, .. } => Some(context),
        }
    }

    fn error_code(&self) -> &'static str {
        "track_capacity_exceeded"
    }
}

impl HealthTrack {
    /// Creates an empty track. A track always has at least one box.
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity: capacity.max(1),
            superficial: 0,
            aggravated: 0,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn superficial(&self) -> u32 {
        self.superficial
    }

    pub fn aggravated(&self) -> u32 {
        self.aggravated
    }

    pub fn marked(&self) -> u32 {
        self.superficial + self.aggravated
    }

    pub fn unmarked(&self) -> u32 {
        self.capacity.saturating_sub(self.marked())
    }

    /// Every box carries a mark.
    pub fn is_weakened(&self) -> bool {
        self.marked() >= self.capacity
    }

    /// Every box is aggravated (destroyed / torpor).
    pub fn is_destroyed(&self) -> bool {
        self.aggravated >= self.capacity
    }

    pub fn boxes(&self) -> Vec<BoxState> {
        let mut boxes = Vec::with_capacity(self.capacity as usize);
        boxes.extend((0..self.aggravated).map(|_| BoxState::Aggravated));
        boxes.extend((0..self.superficial).map(|_| BoxState::Superficial));
        boxes.extend((0..self.unmarked()).map(|_| BoxState::Unmarked));
        boxes
    }

    /// Applies `amount` points of damage of the given severity.
    ///
    /// Superficial points fill unmarked boxes, then replace superficial marks
    /// with aggravated ones. An aggravated hit that does not fit beside the
    /// existing marks collapses the whole track to aggravated, as does a
    /// superficial hit with nothing left to up-convert.
    pub fn apply(&mut self, severity: Severity, amount: u32) -> Result<TrackOutcome, TrackError> {
        let mut outcome = TrackOutcome::default();
        if amount == 0 {
            return self.finish(outcome);
        }

        match severity {
            Severity::Superficial => {
                let fill = amount.min(self.unmarked());
                self.superficial += fill;
                outcome.marked = fill;

                let mut rest = amount - fill;
                let convert = rest.min(self.superficial);
                self.superficial -= convert;
                self.aggravated += convert;
                outcome.upconverted = convert;
                rest -= convert;

                if rest > 0 {
                    self.collapse();
                    outcome.collapsed = true;
                }
            }
            Severity::Aggravated => {
                if self.marked() + amount > self.capacity {
                    self.collapse();
                    outcome.collapsed = true;
                } else {
                    self.aggravated += amount;
                    outcome.marked = amount;
                }
            }
        }

        self.finish(outcome)
    }

    /// Forces the terminal state: every box aggravated, no superficial marks.
    pub fn collapse(&mut self) {
        self.aggravated = self.capacity;
        self.superficial = 0;
    }

    /// Heals up to `amount` superficial marks and returns how many were healed.
    pub fn heal_superficial(&mut self, amount: u32) -> u32 {
        let healed = amount.min(self.superficial);
        self.superficial -= healed;
        healed
    }

    /// Heals up to `amount` aggravated marks and returns how many were healed.
    pub fn heal_aggravated(&mut self, amount: u32) -> u32 {
        let healed = amount.min(self.aggravated);
        self.aggravated -= healed;
        healed
    }

    /// Changes the number of boxes. Shrinking clears superficial marks first,
    /// then aggravated ones, and reports what it cleared.
    pub fn resize(&mut self, capacity: u32) -> ClearedMarks {
        self.capacity = capacity.max(1);
        let mut cleared = ClearedMarks::default();

        let overflow = self.marked().saturating_sub(self.capacity);
        let from_superficial = overflow.min(self.superficial);
        self.superficial -= from_superficial;
        cleared.superficial = from_superficial;

        let from_aggravated = (overflow - from_superficial).min(self.aggravated);
        self.aggravated -= from_aggravated;
        cleared.aggravated = from_aggravated;

        cleared
    }

    /// Puts back marks previously removed by [`resize`](Self::resize), as far
    /// as the current capacity allows.
    pub fn restore(&mut self, marks: ClearedMarks) {
        let aggravated = marks.aggravated.min(self.unmarked());
        self.aggravated += aggravated;
        let superficial = marks.superficial.min(self.unmarked());
        self.superficial += superficial;
    }

    /// Verifies the capacity invariant.
    pub fn check(&self) -> Result<(), TrackError> {
        if self.marked() > self.capacity {
            return Err(TrackError::CapacityExceeded {
                capacity: self.capacity,
                superficial: self.superficial,
                aggravated: self.aggravated,
                context: ErrorContext::new().with_message("marks exceed boxes without collapse"),
            });
        }
        Ok(())
    }

    fn finish(&self, mut outcome: TrackOutcome) -> Result<TrackOutcome, TrackError> {
        self.check()?;
        outcome.weakened = self.is_weakened();
        outcome.destroyed = self.is_destroyed();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track_with(capacity: u32, superficial: u32, aggravated: u32) -> HealthTrack {
        let mut track = HealthTrack::new(capacity);
        track.apply(Severity::Aggravated, aggravated).unwrap();
        track.apply(Severity::Superficial, superficial).unwrap();
        track
    }

    #[test]
    fn superficial_fills_unmarked_boxes() {
        let mut track = HealthTrack::new(5);
        let outcome = track.apply(Severity::Superficial, 3).unwrap();

        assert_eq!(outcome.marked, 3);
        assert_eq!(track.superficial(), 3);
        assert!(!track.is_weakened());
    }

    #[test]
    fn superficial_on_full_track_upconverts_instead_of_adding() {
        let mut track = track_with(4, 4, 0);
        assert!(track.is_weakened());

        let outcome = track.apply(Severity::Superficial, 1).unwrap();

        assert_eq!(outcome.upconverted, 1);
        assert_eq!(track.superficial(), 3);
        assert_eq!(track.aggravated(), 1);
        assert_eq!(track.marked(), 4);
    }

    #[test]
    fn overflowing_aggravated_hit_collapses_track() {
        let mut track = track_with(5, 3, 0);

        let outcome = track.apply(Severity::Aggravated, 3).unwrap();

        assert!(outcome.collapsed);
        assert!(track.is_destroyed());
        assert_eq!(track.aggravated(), 5);
        assert_eq!(track.superficial(), 0);
        assert_eq!(
            track.boxes(),
            vec![BoxState::Aggravated; 5],
        );
    }

    #[test]
    fn aggravated_hit_that_fits_marks_boxes() {
        let mut track = track_with(5, 3, 0);

        track.apply(Severity::Aggravated, 2).unwrap();

        assert_eq!(track.aggravated(), 2);
        assert_eq!(track.superficial(), 3);
        assert!(track.is_weakened());
        assert!(!track.is_destroyed());
    }

    #[test]
    fn shrinking_clears_superficial_first_and_restore_puts_marks_back() {
        let mut track = track_with(6, 3, 2);

        let cleared = track.resize(3);
        assert_eq!(
            cleared,
            ClearedMarks {
                superficial: 2,
                aggravated: 0
            }
        );
        assert_eq!(track.marked(), 3);

        track.resize(6);
        track.restore(cleared);
        assert_eq!(track.superficial(), 3);
        assert_eq!(track.aggravated(), 2);
    }

    #[test]
    fn healing_never_goes_below_zero() {
        let mut track = track_with(5, 1, 1);
        assert_eq!(track.heal_superficial(3), 1);
        assert_eq!(track.heal_aggravated(3), 1);
        assert_eq!(track.marked(), 0);
    }
}
