//! Turns a stream of [`PenSample`]s into canvas stroke mutations.
//!
//! Two states, driven only by the [`DrawGate`]:
//!
//! | From | Input | Gate | To | Canvas |
//! |---|---|---|---|---|
//! | Idle | sample | open | Drawing | `start_stroke` |
//! | Idle | sample | closed | Idle | - |
//! | Drawing | sample | open | Drawing | `append_point` |
//! | Drawing | sample | closed | Idle | `finish_stroke` |
//! | Drawing | close | - | Idle | `finish_stroke` |
//! | Idle | close | - | Idle | - |
//!
//! Proximity never drives the gate, and identical consecutive points are appended as-is.

use crate::canvas::Canvas;
use crate::stroke::Point;
use crate::tool::{DrawGate, PenSample};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::AsRefStr)]
pub enum State {
    #[default]
    Idle,
    Drawing,
}

/// What a single input did to the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::AsRefStr)]
pub enum Transition {
    /// Gate closed while idle, sample dropped.
    Ignored,
    Started,
    Appended,
    Finished,
}
impl Transition {
    /// Whether the canvas may look different afterwards.
    #[must_use]
    pub fn mutated(self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// The stroke state machine. Holds no stroke itself, only the state - the in-progress stroke lives on the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Assembler {
    gate: DrawGate,
    state: State,
}
impl Assembler {
    #[must_use]
    pub fn new(gate: DrawGate) -> Self {
        Self {
            gate,
            state: State::Idle,
        }
    }
    #[must_use]
    pub fn gate(&self) -> DrawGate {
        self.gate
    }
    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }
    /// Consume one sample.
    pub fn feed(&mut self, canvas: &mut Canvas, sample: &PenSample) -> Transition {
        let open = self.gate.is_open(sample);
        match (self.state, open) {
            (State::Idle, true) => {
                canvas.start_stroke(Point::from(sample));
                self.state = State::Drawing;
                Transition::Started
            }
            (State::Idle, false) => Transition::Ignored,
            (State::Drawing, true) => {
                canvas.append_point(Point::from(sample));
                Transition::Appended
            }
            (State::Drawing, false) => {
                canvas.finish_stroke();
                self.state = State::Idle;
                Transition::Finished
            }
        }
    }
    /// End of stream. Commits whatever was being drawn.
    pub fn close(&mut self, canvas: &mut Canvas) -> Transition {
        match self.state {
            State::Idle => Transition::Ignored,
            State::Drawing => {
                canvas.finish_stroke();
                self.state = State::Idle;
                Transition::Finished
            }
        }
    }
}
