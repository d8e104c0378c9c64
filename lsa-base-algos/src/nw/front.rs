//! One row of the affine DP, and the frames that define which sub-problem a
//! row belongs to.
//!
//! Notation:
//! - `E`: best score of a path ending in a horizontal step (an insertion).
//! - `F`: best score of a path ending in a vertical step (a deletion).
//! - `G`: best score of a path ending in a diagonal step.
//! - `V`: `max(E, G, F)`, with ties broken as `E`, then `G`, then `F`.
//!
//! A frame addresses its rectangle with local coordinates: row `r` in
//! `0..=rows` and column `c` in `0..=cols`, where row 0 and column 0 lie on
//! the top and left edges. A backward frame runs the same recursion on the
//! reversed rectangle, so its row 0 is the bottom edge.
use crate::context::{AlignContext, Halt};
use lsa_types::*;
use std::fmt;

/// Unreachable states. Far enough from `Score::MIN` that adding two of them
/// and a gap cost does not overflow.
pub const NEG_INF: Score = Score::MIN / 4;

/// A rectangle of the DP grid, covering residues `i1..i1+dim_i` of sequence 1
/// and `j1..j1+dim_j` of sequence 2. Either dimension may be 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub i1: usize,
    pub j1: usize,
    pub dim_i: usize,
    pub dim_j: usize,
}

impl Rect {
    pub fn full(len1: usize, len2: usize) -> Self {
        Rect {
            i1: 0,
            j1: 0,
            dim_i: len1,
            dim_j: len2,
        }
    }

    /// Number of DP cells, including the boundary row and column.
    pub fn cells(&self) -> u64 {
        (self.dim_i as u64 + 1) * (self.dim_j as u64 + 1)
    }

    pub fn area(&self) -> u64 {
        self.dim_i as u64 * self.dim_j as u64
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}+{}]x[{}+{}]",
            self.i1, self.dim_i, self.j1, self.dim_j
        )
    }
}

/// Whether a vertical gap touching a corner of a rectangle continues in the
/// neighbouring rectangle, so that its open cost was already paid there.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Corners {
    pub left_top_free: bool,
    pub right_bottom_free: bool,
}

/// The direction to run in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}
use Direction::*;

/// The step a DP state was entered by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Diagonal,
    Insert,
    Delete,
}

/// Traceback information of one cell: the step into the best state, and for
/// both gap states whether the gap extends a gap of the previous cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trace {
    pub step: Step,
    pub ins_extended: bool,
    pub del_extended: bool,
}

impl Trace {
    const ORIGIN: Trace = Trace {
        step: Step::Diagonal,
        ins_extended: false,
        del_extended: false,
    };
}

/// A rectangle seen from one of its two corners.
pub struct Frame<'a> {
    a: Seq<'a>,
    b: Seq<'a>,
    model: &'a ScoreModel,
    pub rect: Rect,
    pub dir: Direction,
    /// A vertical gap leaving the origin is already open.
    pub origin_free: bool,
}

impl<'a> Frame<'a> {
    pub fn new(ctx: &AlignContext<'a>, rect: Rect, dir: Direction, origin_free: bool) -> Self {
        Frame {
            a: ctx.a,
            b: ctx.b,
            model: ctx.model,
            rect,
            dir,
            origin_free,
        }
    }

    pub fn rows(&self) -> usize {
        self.rect.dim_i
    }

    pub fn cols(&self) -> usize {
        self.rect.dim_j
    }

    /// The residue of sequence 1 consumed when entering row `r >= 1`.
    #[inline]
    fn a(&self, r: usize) -> u8 {
        match self.dir {
            Forward => self.a[self.rect.i1 + r - 1],
            Backward => self.a[self.rect.i1 + self.rect.dim_i - r],
        }
    }

    /// The residue of sequence 2 consumed when entering column `c >= 1`.
    #[inline]
    fn b(&self, c: usize) -> u8 {
        match self.dir {
            Forward => self.b[self.rect.j1 + c - 1],
            Backward => self.b[self.rect.j1 + self.rect.dim_j - c],
        }
    }

    /// Costs of a horizontal gap in local row `r`.
    #[inline]
    pub fn ins_gap(&self, r: usize) -> GapCost {
        let row = match self.dir {
            Forward => self.rect.i1 + r,
            Backward => self.rect.i1 + self.rect.dim_i - r,
        };
        self.model.ins_gap(row, self.a.len())
    }

    /// Costs of a vertical gap in local column `c`.
    #[inline]
    pub fn del_gap(&self, c: usize) -> GapCost {
        let col = match self.dir {
            Forward => self.rect.j1 + c,
            Backward => self.rect.j1 + self.rect.dim_j - c,
        };
        self.model.del_gap(col, self.b.len())
    }

    /// The diagonal op entering cell `(r, c)` of a forward frame.
    pub fn diagonal_op(&self, r: usize, c: usize) -> TranscriptOp {
        TranscriptOp::diagonal(self.a(r), self.b(c))
    }
}

/// Returns the gap score and whether extending beat opening.
/// Extension wins ties.
#[inline]
fn extend_or_open(v: Score, gap: Score, cost: GapCost) -> (Score, bool) {
    let open = v + cost.open;
    if gap >= open {
        (gap + cost.extend, true)
    } else {
        (open + cost.extend, false)
    }
}

/// One DP row, indexed by local column.
#[derive(Clone, Debug, Default)]
pub struct NwFront {
    pub e: Vec<Score>,
    pub f: Vec<Score>,
    pub g: Vec<Score>,
    pub v: Vec<Score>,
    pub trace: Vec<Trace>,
}

impl NwFront {
    fn unreachable(cols: usize) -> Self {
        NwFront {
            e: vec![NEG_INF; cols + 1],
            f: vec![NEG_INF; cols + 1],
            g: vec![NEG_INF; cols + 1],
            v: vec![NEG_INF; cols + 1],
            trace: vec![Trace::ORIGIN; cols + 1],
        }
    }

    /// Row 0: only horizontal gaps from the origin.
    pub fn first_row(frame: &Frame) -> Self {
        let m = frame.cols();
        let mut front = Self::unreachable(m);
        front.v[0] = 0;
        if frame.origin_free {
            front.f[0] = 0;
        }
        let ins = frame.ins_gap(0);
        for c in 1..=m {
            let (e, ext) = extend_or_open(front.v[c - 1], front.e[c - 1], ins);
            front.e[c] = e;
            front.v[c] = e;
            front.trace[c] = Trace {
                step: Step::Insert,
                ins_extended: ext,
                del_extended: false,
            };
        }
        front
    }

    /// Fills `self` with row `r >= 1`, given the previous row.
    pub fn next_row(&mut self, frame: &Frame, r: usize, prev: &NwFront) {
        let m = frame.cols();
        debug_assert_eq!(prev.v.len(), m + 1);
        self.e.resize(m + 1, NEG_INF);
        self.f.resize(m + 1, NEG_INF);
        self.g.resize(m + 1, NEG_INF);
        self.v.resize(m + 1, NEG_INF);
        self.trace.resize(m + 1, Trace::ORIGIN);

        // Column 0 is only reachable from above.
        let (f, ext) = extend_or_open(prev.v[0], prev.f[0], frame.del_gap(0));
        self.e[0] = NEG_INF;
        self.g[0] = NEG_INF;
        self.f[0] = f;
        self.v[0] = f;
        self.trace[0] = Trace {
            step: Step::Delete,
            ins_extended: false,
            del_extended: ext,
        };

        let ins = frame.ins_gap(r);
        let ar = frame.a(r);
        for c in 1..=m {
            let g = prev.v[c - 1] + frame.model.score(ar, frame.b(c));
            let (e, ins_extended) = extend_or_open(self.v[c - 1], self.e[c - 1], ins);
            let (f, del_extended) = extend_or_open(prev.v[c], prev.f[c], frame.del_gap(c));
            let (v, step) = if e >= g && e >= f {
                (e, Step::Insert)
            } else if g >= f {
                (g, Step::Diagonal)
            } else {
                (f, Step::Delete)
            };
            self.e[c] = e;
            self.f[c] = f;
            self.g[c] = g;
            self.v[c] = v;
            self.trace[c] = Trace {
                step,
                ins_extended,
                del_extended,
            };
        }
    }

    /// Mirrors the row, turning backward columns into forward ones.
    pub fn reversed(mut self) -> Self {
        self.e.reverse();
        self.f.reverse();
        self.g.reverse();
        self.v.reverse();
        self.trace.reverse();
        self
    }

    /// Score of the gap state `step`, or `G` for `Step::Diagonal`.
    pub fn state(&self, step: Step, c: usize) -> Score {
        match step {
            Step::Insert => self.e[c],
            Step::Delete => self.f[c],
            Step::Diagonal => self.g[c],
        }
    }

    /// Best score at the end of the last row. When the frame ends in a free
    /// corner, a vertical gap into it gets its open cost back. Returns the score
    /// and whether the path ends in that vertical gap.
    pub fn end_score(&self, frame: &Frame, end_free: bool) -> (Score, bool) {
        let m = frame.cols();
        let v = self.v[m];
        if end_free {
            let credited = self.f[m] - frame.del_gap(m).open;
            if credited >= v {
                return (credited, true);
            }
        }
        (v, false)
    }
}

/// Runs the DP over all rows of `frame`, keeping only the current one.
/// Returns the last row.
pub fn sweep(ctx: &AlignContext, frame: &Frame) -> Result<NwFront, Halt> {
    ctx.check()?;
    let cells = frame.cols() as u64 + 1;
    let mut prev = NwFront::first_row(frame);
    let mut next = NwFront::default();
    ctx.row_done(cells)?;
    for r in 1..=frame.rows() {
        next.next_row(frame, r, &prev);
        std::mem::swap(&mut prev, &mut next);
        ctx.row_done(cells)?;
    }
    Ok(match frame.dir {
        Forward => prev,
        Backward => prev.reversed(),
    })
}
