//! Segment sequencer finite state machine.
//!
//! Pure logic, no hardware dependencies. Decides, once per tick, which table
//! position to play or whether this tick is a boundary. Fully testable on host.
//!
//! # Segmented policy
//!
//! ```text
//! Swoop[0..n) ─▶ (boundary) ─▶ Chirp[0..m) ─▶ (cycle end + rest) ─▶ Swoop ...
//! ```
//!
//! # Concatenated policy
//!
//! ```text
//! Song[0..len) ─▶ (cycle end + rest) ─▶ Song ...
//! ```
//!
//! Boundary ticks emit nothing. Exactly one index step per played sample.

use crate::dds::Program;

/// Region currently being walked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment {
    Swoop,
    Chirp,
    /// Concatenated buffer
    Song,
}

/// Sequencer state: active region and position within it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequencerState {
    pub segment: Segment,
    pub sample_index: usize,
}

/// What the current tick must do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Play table position `index` of `segment`
    Play { segment: Segment, index: usize },
    /// Swoop finished; chirp starts on the next tick
    SegmentEnd { next: Segment },
    /// Cycle finished; the next deadline carries the rest interval
    CycleEnd,
}

impl Step {
    /// True if this tick produces a DAC word
    #[inline]
    pub fn emits(&self) -> bool {
        matches!(self, Step::Play { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Layout {
    Segmented { swoop_len: usize, chirp_len: usize },
    Concatenated { song_len: usize },
}

/// Segment sequencer.
#[derive(Clone, Debug)]
pub struct Sequencer {
    layout: Layout,
    state: SequencerState,
}

impl Sequencer {
    /// Two-segment sequencer starting at swoop sample 0.
    pub fn segmented(swoop_len: usize, chirp_len: usize) -> Self {
        Self {
            layout: Layout::Segmented {
                swoop_len,
                chirp_len,
            },
            state: SequencerState {
                segment: Segment::Swoop,
                sample_index: 0,
            },
        }
    }

    /// Single-buffer sequencer starting at sample 0.
    pub fn concatenated(song_len: usize) -> Self {
        Self {
            layout: Layout::Concatenated { song_len },
            state: SequencerState {
                segment: Segment::Song,
                sample_index: 0,
            },
        }
    }

    /// Sequencer matching a built program's table lengths.
    pub fn for_program(program: &Program<'_>) -> Self {
        match program {
            Program::Segmented { swoop, chirp } => Self::segmented(swoop.len(), chirp.len()),
            Program::Concatenated { song } => Self::concatenated(song.len()),
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Advance by one tick.
    #[inline]
    pub fn advance(&mut self) -> Step {
        let SequencerState {
            segment,
            sample_index,
        } = self.state;

        let len = self.segment_len(segment);
        if sample_index >= len {
            self.state.sample_index = 0;
            return match (self.layout, segment) {
                (Layout::Segmented { .. }, Segment::Swoop) => {
                    self.state.segment = Segment::Chirp;
                    Step::SegmentEnd {
                        next: Segment::Chirp,
                    }
                }
                (Layout::Segmented { .. }, _) => {
                    self.state.segment = Segment::Swoop;
                    Step::CycleEnd
                }
                (Layout::Concatenated { .. }, _) => Step::CycleEnd,
            };
        }

        self.state.sample_index = sample_index + 1;
        Step::Play {
            segment,
            index: sample_index,
        }
    }

    /// Ticks in one full cycle, boundary ticks included.
    pub fn ticks_per_cycle(&self) -> usize {
        match self.layout {
            Layout::Segmented {
                swoop_len,
                chirp_len,
            } => swoop_len + chirp_len + 2,
            Layout::Concatenated { song_len } => song_len + 1,
        }
    }

    #[inline]
    fn segment_len(&self, segment: Segment) -> usize {
        match (self.layout, segment) {
            (Layout::Segmented { swoop_len, .. }, Segment::Swoop) => swoop_len,
            (Layout::Segmented { chirp_len, .. }, _) => chirp_len,
            (Layout::Concatenated { song_len }, _) => song_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segmented_walk() {
        let mut seq = Sequencer::segmented(2, 3);

        assert_eq!(seq.advance(), Step::Play { segment: Segment::Swoop, index: 0 });
        assert_eq!(seq.advance(), Step::Play { segment: Segment::Swoop, index: 1 });
        assert_eq!(seq.advance(), Step::SegmentEnd { next: Segment::Chirp });
        assert_eq!(seq.advance(), Step::Play { segment: Segment::Chirp, index: 0 });
        assert_eq!(seq.advance(), Step::Play { segment: Segment::Chirp, index: 1 });
        assert_eq!(seq.advance(), Step::Play { segment: Segment::Chirp, index: 2 });
        assert_eq!(seq.advance(), Step::CycleEnd);
        assert_eq!(seq.advance(), Step::Play { segment: Segment::Swoop, index: 0 });
    }

    #[test]
    fn test_concatenated_walk_single_step() {
        let mut seq = Sequencer::concatenated(3);

        for expected in 0..3 {
            assert_eq!(seq.advance(), Step::Play { segment: Segment::Song, index: expected });
        }
        assert_eq!(seq.advance(), Step::CycleEnd);
        assert_eq!(seq.state().sample_index, 0);
        assert_eq!(seq.advance(), Step::Play { segment: Segment::Song, index: 0 });
    }

    #[test]
    fn test_ticks_per_cycle() {
        assert_eq!(Sequencer::segmented(5200, 5200).ticks_per_cycle(), 10402);
        assert_eq!(Sequencer::concatenated(13400).ticks_per_cycle(), 13401);
    }
}
