//! Linear-space affine alignment, following Myers and Miller.
//!
//! Each rectangle is split at its middle row. A forward sweep over the top
//! half and a backward sweep over the bottom half meet on the split row, where
//! `Transition::find` picks the column and states of the optimal crossing.
//! The crossing is traced along both rows, spliced into the shared transcript,
//! and the remaining top-left and bottom-right rectangles are solved
//! recursively, possibly on separate threads.
pub(crate) mod transition;

use crate::context::{AlignContext, Halt};
use crate::nw::{self, front::*};
use lsa_types::*;
use std::sync::Mutex;
use transition::{Crossing, Transition};

/// Rectangles smaller than this in either dimension go to the quadratic kernel.
const MIN_SPLIT: usize = 3;

/// A sub-problem waiting to be solved.
#[derive(Clone, Copy, Debug)]
struct Task {
    rect: Rect,
    at: Anchor,
    corners: Corners,
}

struct Engine<'c, 'a> {
    ctx: &'c AlignContext<'a>,
    transcript: Mutex<Transcript>,
}

impl<'c, 'a> Engine<'c, 'a> {
    fn splice(&self, at: Anchor, ops: Vec<TranscriptOp>) -> Result<(Anchor, Anchor), Halt> {
        let mut transcript = self
            .transcript
            .lock()
            .map_err(|_| Halt::internal("transcript lock poisoned"))?;
        Ok(transcript.splice(at, ops))
    }

    /// Solves `task.rect` and splices its ops at `task.at`. Returns the
    /// optimal score of the rectangle under its corner flags.
    fn align(&self, task: Task) -> Result<Score, Halt> {
        let ctx = self.ctx;
        ctx.check()?;
        let Task { rect, at, corners } = task;
        if rect.dim_i < MIN_SPLIT || rect.dim_j < MIN_SPLIT {
            let (score, ops) = nw::solve(ctx, rect, corners)?;
            ctx.counters.terminal();
            log::trace!("terminal {rect}: score {score}, {} ops", ops.len());
            self.splice(at, ops)?;
            return Ok(score);
        }
        ctx.counters.split();

        // The split residue of sequence 1 is the last row of the top half.
        let split = rect.i1 + rect.dim_i / 2;
        let top_rect = Rect {
            dim_i: split + 1 - rect.i1,
            ..rect
        };
        let bottom_rect = Rect {
            i1: split + 1,
            dim_i: rect.i1 + rect.dim_i - split - 1,
            ..rect
        };
        let top_frame = Frame::new(ctx, top_rect, Direction::Forward, corners.left_top_free);
        let bottom_frame = Frame::new(
            ctx,
            bottom_rect,
            Direction::Backward,
            corners.right_bottom_free,
        );
        let (top, bottom) = ctx.budget.join(
            || sweep(ctx, &top_frame),
            || sweep(ctx, &bottom_frame),
        );
        let (mut top, mut bottom) = Halt::merge(top, bottom)?;

        let transition = Transition::find(&top, &bottom, &top_frame);
        transition.patch(&mut top, &mut bottom);
        let crossing = Crossing::walk(&transition, &top, &bottom, &top_frame)?;
        log::debug!(
            "split {rect} at residue {split}: {:?} in column {} scores {}",
            transition.kind,
            transition.col,
            transition.score
        );
        drop((top, bottom));

        let Crossing {
            ops: crossing_ops,
            col_end,
            top_gap,
            col_start,
            bottom_gap,
        } = crossing;
        let lt = Rect {
            i1: rect.i1,
            j1: rect.j1,
            dim_i: split - rect.i1,
            dim_j: col_end,
        };
        let rb = Rect {
            i1: split + 2,
            j1: rect.j1 + col_start,
            dim_i: rect.i1 + rect.dim_i - split - 2,
            dim_j: rect.dim_j - col_start,
        };

        // A child without columns or without rows is a single straight gap.
        let mut ops = pad(lt);
        ops.extend(crossing_ops);
        ops.extend(pad(rb));
        let (left_at, right_at) = self.splice(at, ops)?;

        let lt_task = (lt.dim_i > 0 && lt.dim_j > 0).then_some(Task {
            rect: lt,
            at: left_at,
            corners: Corners {
                left_top_free: corners.left_top_free,
                right_bottom_free: top_gap,
            },
        });
        let rb_task = (rb.dim_i > 0 && rb.dim_j > 0).then_some(Task {
            rect: rb,
            at: right_at,
            corners: Corners {
                left_top_free: bottom_gap,
                right_bottom_free: corners.right_bottom_free,
            },
        });
        match (lt_task, rb_task) {
            (Some(lt), Some(rb)) => {
                // The larger child goes to the new thread.
                let (big, small) = if lt.rect.area() >= rb.rect.area() {
                    (lt, rb)
                } else {
                    (rb, lt)
                };
                let (r1, r2) = ctx.budget.join(|| self.align(big), || self.align(small));
                Halt::merge(r1, r2)?;
            }
            (Some(task), None) | (None, Some(task)) => {
                self.align(task)?;
            }
            (None, None) => {}
        }
        Ok(transition.score)
    }
}

/// The ops covering a degenerate child rectangle, which has no columns or no
/// rows. Empty for proper rectangles, which are solved recursively.
fn pad(rect: Rect) -> Vec<TranscriptOp> {
    match (rect.dim_i, rect.dim_j) {
        (n, 0) => vec![TranscriptOp::Delete; n],
        (0, m) => vec![TranscriptOp::Insert; m],
        _ => vec![],
    }
}

/// Aligns all of `rect` in linear memory. Returns the optimal score and the
/// ops in forward order.
pub(crate) fn solve(ctx: &AlignContext, rect: Rect) -> Result<(Score, Vec<TranscriptOp>), Halt> {
    let transcript = Transcript::new();
    let start = transcript.start();
    let engine = Engine {
        ctx,
        transcript: Mutex::new(transcript),
    };
    let score = engine.align(Task {
        rect,
        at: start,
        corners: Corners::default(),
    })?;
    let transcript = engine
        .transcript
        .into_inner()
        .map_err(|_| Halt::internal("transcript lock poisoned"))?;
    Ok((score, transcript.into_ops()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CancelToken, Progress};
    use TranscriptOp::*;

    fn model(end_gaps: EndGaps) -> ScoreModel {
        ScoreModel::new(Alphabet::Nucleotide, 1, -1, -2, -1, end_gaps).unwrap()
    }

    fn both(a: Seq, b: Seq, model: &ScoreModel, threads: usize) -> [(Score, Vec<TranscriptOp>); 2] {
        let cancel = CancelToken::new();
        let rect = Rect::full(a.len(), b.len());
        let ctx = AlignContext::new(a, b, model, threads, &cancel, Progress::new(0, None));
        let linear = solve(&ctx, rect).unwrap();
        let ctx = AlignContext::new(a, b, model, 1, &cancel, Progress::new(0, None));
        let quadratic = nw::solve(&ctx, rect, Corners::default()).unwrap();
        [linear, quadratic]
    }

    #[test]
    fn pad_degenerate_children() {
        let rect = |dim_i, dim_j| Rect {
            i1: 5,
            j1: 7,
            dim_i,
            dim_j,
        };
        assert_eq!(pad(rect(0, 0)), vec![]);
        assert_eq!(pad(rect(2, 0)), vec![Delete, Delete]);
        assert_eq!(pad(rect(0, 3)), vec![Insert; 3]);
        assert_eq!(pad(rect(2, 3)), vec![]);
    }

    #[test]
    fn small_inputs_use_the_kernel() {
        let [(score, ops), _] = both(b"AGT", b"AT", &model(EndGaps::NONE), 1);
        assert_eq!(score, -1);
        assert_eq!(ops, vec![Match, Delete, Match]);
    }

    #[test]
    fn matches_quadratic() {
        let m = model(EndGaps::NONE);
        let cases: [(Seq, Seq); 5] = [
            (b"ACGTACGTAC", b"ACGTTCGAC"),
            (b"AAAAAAAAAA", b"AAAA"),
            (b"GATTACAGATTACA", b"GATACCAGTTAC"),
            (b"ACGT", b"TGCATGCATGCA"),
            (b"CCCCCCCC", b"GGGGGGGG"),
        ];
        for (a, b) in cases {
            let [(ls, lops), (qs, _)] = both(a, b, &m, 1);
            assert_eq!(ls, qs, "{} {}", seq_to_string(a), seq_to_string(b));
            assert_eq!(m.rescore(a, b, &lops), Ok(ls));
            lops.verify(a, b).unwrap();
        }
    }

    #[test]
    fn long_gap_is_one_run() {
        let m = model(EndGaps::NONE);
        let a = b"ACGTACGTTTTTTTTTTACGTACGT";
        let b = b"ACGTACGTACGTACGT";
        let [(score, ops), (qs, _)] = both(a, b, &m, 1);
        assert_eq!(score, qs);
        assert_eq!(score, 16 - 11);
        assert_eq!(ops.runs().len(), 3);
    }

    #[test]
    fn free_end_gaps() {
        let m = model(EndGaps::ALL);
        let a = b"TTTTTTACGTACGT";
        let b = b"ACGTACGTGGGGGGG";
        let [(score, ops), (qs, _)] = both(a, b, &m, 1);
        assert_eq!(score, qs);
        assert_eq!(score, 8);
        assert_eq!(m.rescore(a, b, &ops), Ok(8));
    }

    #[test]
    fn threads_give_the_same_alignment() {
        let m = model(EndGaps::NONE);
        let a = b"ACGGTACCATTGACCAGTTAGCATGACCATTGACGATCGATTACGGAT";
        let b = b"ACGTACCATGACCAGTAGCATGGACCATTGACGTCGATTACGAGAT";
        let [one, _] = both(a, b, &m, 1);
        let [eight, _] = both(a, b, &m, 8);
        assert_eq!(one, eight);
    }
}
