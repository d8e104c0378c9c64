//! Needleman-Wunsch with affine gaps (Gotoh), storing the full traceback
//! matrix. Used directly for small inputs and as the base case of the
//! linear-space recursion.
pub(crate) mod front;

use crate::context::{AlignContext, Halt};
use front::*;
use lsa_types::*;

/// Largest number of DP cells the quadratic kernel addresses.
pub const MAX_CELLS: u64 = u32::MAX as u64;

/// Fails with `TooLarge` when a full traceback matrix for `rect` cannot be addressed.
pub(crate) fn check_size(rect: Rect) -> Result<(), AlignError> {
    if rect.cells() > MAX_CELLS {
        Err(AlignError::TooLarge {
            len1: rect.dim_i,
            len2: rect.dim_j,
        })
    } else {
        Ok(())
    }
}

/// Aligns all of `rect` with a full traceback matrix. Returns the optimal
/// score under the corner flags and the ops in forward order.
pub(crate) fn solve(
    ctx: &AlignContext,
    rect: Rect,
    corners: Corners,
) -> Result<(Score, Vec<TranscriptOp>), Halt> {
    check_size(rect)?;
    ctx.check()?;
    let frame = Frame::new(ctx, rect, Direction::Forward, corners.left_top_free);
    let (n, m) = (frame.rows(), frame.cols());
    let width = m + 1;
    let cells = width as u64;

    let mut traces = Vec::with_capacity(rect.cells() as usize);
    let mut prev = NwFront::first_row(&frame);
    traces.extend_from_slice(&prev.trace);
    ctx.row_done(cells)?;
    let mut next = NwFront::default();
    for r in 1..=n {
        next.next_row(&frame, r, &prev);
        traces.extend_from_slice(&next.trace);
        std::mem::swap(&mut prev, &mut next);
        ctx.row_done(cells)?;
    }
    let (score, ends_in_gap) = prev.end_score(&frame, corners.right_bottom_free);

    // Walk back from the end, tracking which state we are in.
    let mut ops = Vec::with_capacity(n + m);
    let (mut r, mut c) = (n, m);
    let mut state = if ends_in_gap {
        Step::Delete
    } else {
        traces[r * width + c].step
    };
    while r > 0 || c > 0 {
        let t = traces[r * width + c];
        match state {
            Step::Diagonal => {
                if r == 0 || c == 0 {
                    return Err(Halt::internal(format!(
                        "traceback left {rect} at ({r}, {c})"
                    )));
                }
                ops.push(frame.diagonal_op(r, c));
                r -= 1;
                c -= 1;
            }
            Step::Insert => {
                if c == 0 {
                    return Err(Halt::internal(format!(
                        "traceback left {rect} at ({r}, {c})"
                    )));
                }
                ops.push(TranscriptOp::Insert);
                c -= 1;
                if t.ins_extended {
                    continue;
                }
            }
            Step::Delete => {
                if r == 0 {
                    return Err(Halt::internal(format!(
                        "traceback left {rect} at ({r}, {c})"
                    )));
                }
                ops.push(TranscriptOp::Delete);
                r -= 1;
                if t.del_extended {
                    continue;
                }
            }
        }
        state = traces[r * width + c].step;
    }
    ops.reverse();
    Ok((score, ops))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CancelToken, Progress};
    use TranscriptOp::*;

    fn run(a: Seq, b: Seq, model: &ScoreModel, corners: Corners) -> (Score, Vec<TranscriptOp>) {
        let cancel = CancelToken::new();
        let ctx = AlignContext::new(a, b, model, 1, &cancel, Progress::new(0, None));
        solve(&ctx, Rect::full(a.len(), b.len()), corners).unwrap()
    }

    fn model(end_gaps: EndGaps) -> ScoreModel {
        ScoreModel::new(Alphabet::Nucleotide, 1, -1, -2, -1, end_gaps).unwrap()
    }

    #[test]
    fn single_deletion() {
        let (score, ops) = run(b"AGT", b"AT", &model(EndGaps::NONE), Corners::default());
        assert_eq!(score, -1);
        assert_eq!(ops, vec![Match, Delete, Match]);
    }

    #[test]
    fn empty_inputs() {
        let m = model(EndGaps::NONE);
        assert_eq!(run(b"", b"", &m, Corners::default()), (0, vec![]));
        assert_eq!(
            run(b"ACG", b"", &m, Corners::default()),
            (-5, vec![Delete; 3])
        );
        assert_eq!(
            run(b"", b"ACGT", &m, Corners::default()),
            (-6, vec![Insert; 4])
        );
    }

    #[test]
    fn free_end_gaps_cost_nothing() {
        let m = model(EndGaps::ALL);
        let (score, ops) = run(b"", b"ACGT", &m, Corners::default());
        assert_eq!(score, 0);
        assert_eq!(ops, vec![Insert; 4]);
        let (score, ops) = run(b"ACGTT", b"CGT", &m, Corners::default());
        assert_eq!(score, 3);
        assert_eq!(ops, vec![Delete, Match, Match, Match, Delete]);
    }

    #[test]
    fn one_gap_is_cheaper_than_two() {
        let m = model(EndGaps::NONE);
        let (score, ops) = run(b"AACCTT", b"AATT", &m, Corners::default());
        assert_eq!(score, 4 - 4);
        assert_eq!(ops, vec![Match, Match, Delete, Delete, Match, Match]);
    }

    #[test]
    fn corner_flags() {
        let m = model(EndGaps::NONE);
        let start = Corners {
            left_top_free: true,
            right_bottom_free: false,
        };
        let end = Corners {
            left_top_free: false,
            right_bottom_free: true,
        };
        assert_eq!(run(b"GGA", b"A", &m, start), (1 - 2, vec![Delete, Delete, Match]));
        assert_eq!(run(b"AGG", b"A", &m, end), (1 - 2, vec![Match, Delete, Delete]));
        assert_eq!(run(b"GG", b"", &m, start), (-2, vec![Delete, Delete]));
    }

    #[test]
    fn mismatch_beats_two_gaps() {
        let m = model(EndGaps::NONE);
        let (score, ops) = run(b"ACT", b"AGT", &m, Corners::default());
        assert_eq!(score, 1);
        assert_eq!(ops, vec![Match, Replace, Match]);
    }

    #[test]
    fn too_large() {
        let rect = Rect::full(1 << 16, 1 << 16);
        assert_eq!(
            check_size(rect),
            Err(AlignError::TooLarge {
                len1: 1 << 16,
                len2: 1 << 16
            })
        );
        assert!(check_size(Rect::full(1 << 15, 1 << 15)).is_ok());
    }
}
