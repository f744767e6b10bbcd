use super::style::{LayerType, Position};

/// Below this `|cos(angle)|` a line label counts as near-vertical and its
/// second attempt is rotated half a turn instead of moved below the line.
pub const LINE_VERT_THRESHOLD: f64 = 0.17;

/// One concrete placement attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub position: Position,
    /// Degrees.
    pub angle: f64,
}

/// Candidate positions for one label, in the order they must be tried.
///
/// A fixed position yields exactly one candidate. `Auto` on a line layer
/// yields two (above the line, then flipped or below it); `Auto` on any
/// other layer walks the eight outer compass positions.
#[derive(Debug, Clone)]
pub struct Candidates {
    mode: Mode,
    angle: f64,
    step: usize,
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Fixed(Position),
    Line,
    Compass,
}

impl Candidates {
    pub fn new(position: Position, angle: f64, layer_type: LayerType) -> Self {
        let mode = match (position, layer_type) {
            (Position::Auto, LayerType::Line) => Mode::Line,
            (Position::Auto, _) => Mode::Compass,
            (fixed, _) => Mode::Fixed(fixed),
        };
        Self {
            mode,
            angle,
            step: 0,
        }
    }
}

impl Iterator for Candidates {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        let step = self.step;
        let candidate = match self.mode {
            Mode::Fixed(position) if step == 0 => Candidate {
                position,
                angle: self.angle,
            },
            Mode::Line if step == 0 => Candidate {
                position: Position::Uc,
                angle: self.angle,
            },
            Mode::Line if step == 1 => {
                if self.angle.to_radians().cos().abs() < LINE_VERT_THRESHOLD {
                    Candidate {
                        position: Position::Uc,
                        angle: self.angle + 180.0,
                    }
                } else {
                    Candidate {
                        position: Position::Lc,
                        angle: self.angle,
                    }
                }
            }
            Mode::Compass => Candidate {
                position: *Position::AUTO_ORDER.get(step)?,
                angle: self.angle,
            },
            _ => return None,
        };
        self.step += 1;
        Some(candidate)
    }
}
