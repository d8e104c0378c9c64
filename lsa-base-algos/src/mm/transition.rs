//! Where and how the optimal path crosses the split row.
//!
//! The top sweep ends on the split row `h`; the bottom sweep, run backwards,
//! ends on the same row. For every column the path can arrive in one of three
//! states from above and leave in one of three states towards the bottom,
//! giving nine ways to combine the two halves.
use crate::context::Halt;
use crate::nw::front::*;
use lsa_types::*;
use std::collections::VecDeque;

/// How the optimal path crosses the split row: the state it has when the top
/// half ends, and the state its remainder starts with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionType {
    InsIns,
    DelIns,
    DiagIns,
    InsDel,
    DelDel,
    DiagDel,
    InsDiag,
    DelDiag,
    DiagDiag,
}
use TransitionType::*;

impl TransitionType {
    /// Evaluation order. Earlier types win ties.
    pub const ALL: [TransitionType; 9] = [
        InsIns, DelIns, DiagIns, InsDel, DelDel, DiagDel, InsDiag, DelDiag, DiagDiag,
    ];

    pub fn top(self) -> Step {
        match self {
            InsIns | InsDel | InsDiag => Step::Insert,
            DelIns | DelDel | DelDiag => Step::Delete,
            DiagIns | DiagDel | DiagDiag => Step::Diagonal,
        }
    }

    pub fn bottom(self) -> Step {
        match self {
            InsIns | DelIns | DiagIns => Step::Insert,
            InsDel | DelDel | DiagDel => Step::Delete,
            InsDiag | DelDiag | DiagDiag => Step::Diagonal,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub col: usize,
    pub kind: TransitionType,
    pub score: Score,
}

impl Transition {
    /// Finds the best crossing. `top` and `bottom` are the split row as seen from
    /// both halves, in forward column order. `top_frame` supplies the gap
    /// costs of the split row.
    ///
    /// An insertion gap running through the split is counted by both halves, as
    /// is a deletion gap through the split column; their open cost is charged
    /// once.
    pub fn find(top: &NwFront, bottom: &NwFront, top_frame: &Frame) -> Transition {
        let m = top_frame.cols();
        let h = top_frame.rows();
        let ins_open = top_frame.ins_gap(h).open;
        let mut best = Transition {
            col: 0,
            kind: InsIns,
            score: Score::MIN,
        };
        for kind in TransitionType::ALL {
            for c in 0..=m {
                let mut score = top.state(kind.top(), c) + bottom.state(kind.bottom(), c);
                match kind {
                    InsIns => score -= ins_open,
                    DelDel => score -= top_frame.del_gap(c).open,
                    _ => {}
                }
                if score > best.score {
                    best = Transition {
                        col: c,
                        kind,
                        score,
                    };
                }
            }
        }
        best
    }

    /// Makes the traceback of both rows at the crossing column start in the
    /// chosen states.
    pub fn patch(&self, top: &mut NwFront, bottom: &mut NwFront) {
        top.trace[self.col].step = self.kind.top();
        bottom.trace[self.col].step = self.kind.bottom();
    }
}

/// The part of the optimal path that lies on or touches the split row.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Crossing {
    pub ops: VecDeque<TranscriptOp>,
    /// Column where the path leaves the row above the split.
    pub col_end: usize,
    /// A deletion gap runs from the top-left part into the crossing.
    pub top_gap: bool,
    /// Column where the path enters the row below the split.
    pub col_start: usize,
    /// A deletion gap runs from the crossing into the bottom-right part.
    pub bottom_gap: bool,
}

impl Crossing {
    /// Follows the traceback from the crossing column leftwards along the top
    /// row and rightwards along the bottom row.
    pub fn walk(
        transition: &Transition,
        top: &NwFront,
        bottom: &NwFront,
        top_frame: &Frame,
    ) -> Result<Crossing, Halt> {
        let h = top_frame.rows();
        let m = top_frame.cols();
        let mut crossing = Crossing::default();

        // Leftwards along the last row of the top half.
        let mut c = transition.col;
        let mut state = top.trace[c].step;
        loop {
            let t = top.trace[c];
            match state {
                Step::Diagonal => {
                    if c == 0 {
                        return Err(Halt::internal("diagonal step leaves the top row"));
                    }
                    crossing.ops.push_front(top_frame.diagonal_op(h, c));
                    crossing.col_end = c - 1;
                    break;
                }
                Step::Delete => {
                    crossing.ops.push_front(TranscriptOp::Delete);
                    crossing.col_end = c;
                    crossing.top_gap = t.del_extended;
                    break;
                }
                Step::Insert => {
                    if c == 0 {
                        return Err(Halt::internal("insertion leaves the top row"));
                    }
                    crossing.ops.push_front(TranscriptOp::Insert);
                    c -= 1;
                    if !t.ins_extended {
                        state = top.trace[c].step;
                    }
                }
            }
        }

        // Rightwards along the first row of the bottom half. Traces there
        // describe the first step leaving a cell.
        let mut c = transition.col;
        let mut state = bottom.trace[c].step;
        loop {
            let t = bottom.trace[c];
            match state {
                Step::Diagonal => {
                    if c == m {
                        return Err(Halt::internal("diagonal step leaves the bottom row"));
                    }
                    crossing.ops.push_back(top_frame.diagonal_op(h + 1, c + 1));
                    crossing.col_start = c + 1;
                    break;
                }
                Step::Delete => {
                    crossing.ops.push_back(TranscriptOp::Delete);
                    crossing.col_start = c;
                    crossing.bottom_gap = t.del_extended;
                    break;
                }
                Step::Insert => {
                    if c == m {
                        return Err(Halt::internal("insertion leaves the bottom row"));
                    }
                    crossing.ops.push_back(TranscriptOp::Insert);
                    c += 1;
                    if !t.ins_extended {
                        state = bottom.trace[c].step;
                    }
                }
            }
        }
        Ok(crossing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_pairs_top_then_bottom() {
        let pairs = TransitionType::ALL.map(|t| (t.top(), t.bottom()));
        use Step::*;
        assert_eq!(
            pairs,
            [
                (Insert, Insert),
                (Delete, Insert),
                (Diagonal, Insert),
                (Insert, Delete),
                (Delete, Delete),
                (Diagonal, Delete),
                (Insert, Diagonal),
                (Delete, Diagonal),
                (Diagonal, Diagonal),
            ]
        );
    }
}
