//! The affine score model: a symmetric substitution matrix, gap open and
//! extend costs, and which sequence ends may carry gaps for free.

use crate::*;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Which sequence ends are free. A gap is free when it runs along the
/// corresponding edge of the DP grid.
///
/// `left1`/`right1` refer to the start and end of sequence 1: an insertion
/// (a run of sequence 2 residues) placed before all of sequence 1 costs nothing
/// when `left1` is set. Likewise `left2`/`right2` for deletions placed before or
/// after all of sequence 2.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndGaps {
    pub left1: bool,
    pub right1: bool,
    pub left2: bool,
    pub right2: bool,
}

impl EndGaps {
    pub const NONE: EndGaps = EndGaps {
        left1: false,
        right1: false,
        left2: false,
        right2: false,
    };
    pub const ALL: EndGaps = EndGaps {
        left1: true,
        right1: true,
        left2: true,
        right2: true,
    };
}

/// Cost of a single gap run: `open + len * extend`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GapCost {
    pub open: Score,
    pub extend: Score,
}

impl GapCost {
    pub const FREE: GapCost = GapCost { open: 0, extend: 0 };

    pub fn cost(&self, len: usize) -> Score {
        if len == 0 {
            0
        } else {
            self.open + len as Score * self.extend
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoreModel {
    alphabet: Alphabet,
    /// Residue byte to alphabet index; `u8::MAX` for bytes outside the alphabet.
    codes: [u8; 256],
    /// Row-major `size x size` substitution scores.
    matrix: Vec<Score>,
    gap: GapCost,
    end_gaps: EndGaps,
}

impl ScoreModel {
    /// Uniform match/mismatch scores.
    pub fn new(
        alphabet: Alphabet,
        match_score: Score,
        mismatch_score: Score,
        gap_open: Score,
        gap_extend: Score,
        end_gaps: EndGaps,
    ) -> Result<Self, AlignError> {
        Self::from_fn(
            alphabet,
            |a, b| if a == b { match_score } else { mismatch_score },
            gap_open,
            gap_extend,
            end_gaps,
        )
    }

    /// Build the substitution matrix from `sub`, which is called on upper-case
    /// residues and must be symmetric.
    pub fn from_fn(
        alphabet: Alphabet,
        sub: impl Fn(u8, u8) -> Score,
        gap_open: Score,
        gap_extend: Score,
        end_gaps: EndGaps,
    ) -> Result<Self, AlignError> {
        if gap_open > 0 || gap_extend > 0 {
            return Err(AlignError::InvalidScoring(format!(
                "gap costs must not be positive, got open {gap_open} and extend {gap_extend}"
            )));
        }
        let symbols = alphabet.symbols();
        let size = symbols.len();
        let mut matrix = vec![0; size * size];
        for ((i, &a), (j, &b)) in symbols
            .iter()
            .enumerate()
            .cartesian_product(symbols.iter().enumerate())
        {
            let s = sub(a, b);
            if s != sub(b, a) {
                return Err(AlignError::InvalidScoring(format!(
                    "substitution scores are not symmetric for {} and {}",
                    a as char, b as char
                )));
            }
            matrix[i * size + j] = s;
        }
        let mut codes = [u8::MAX; 256];
        for (i, &s) in symbols.iter().enumerate() {
            codes[s as usize] = i as u8;
            codes[s.to_ascii_lowercase() as usize] = i as u8;
        }
        Ok(ScoreModel {
            alphabet,
            codes,
            matrix,
            gap: GapCost {
                open: gap_open,
                extend: gap_extend,
            },
            end_gaps,
        })
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    pub fn gap_open(&self) -> Score {
        self.gap.open
    }

    pub fn gap_extend(&self) -> Score {
        self.gap.extend
    }

    pub fn end_gaps(&self) -> EndGaps {
        self.end_gaps
    }

    /// Substitution score. Both residues must be part of the alphabet.
    #[inline]
    pub fn score(&self, a: u8, b: u8) -> Score {
        let size = self.alphabet.size();
        let (a, b) = (self.codes[a as usize], self.codes[b as usize]);
        debug_assert!(a != u8::MAX && b != u8::MAX, "residue outside the alphabet");
        self.matrix[a as usize * size + b as usize]
    }

    /// Cost of an ordinary gap of `len` residues.
    pub fn gap_cost(&self, len: usize) -> Score {
        self.gap.cost(len)
    }

    /// Costs of a horizontal gap (an insertion) in grid row `row`, where
    /// `len1` is the length of sequence 1.
    #[inline]
    pub fn ins_gap(&self, row: usize, len1: usize) -> GapCost {
        if (row == 0 && self.end_gaps.left1) || (row == len1 && self.end_gaps.right1) {
            GapCost::FREE
        } else {
            self.gap
        }
    }

    /// Costs of a vertical gap (a deletion) in grid column `col`, where `len2`
    /// is the length of sequence 2.
    #[inline]
    pub fn del_gap(&self, col: usize, len2: usize) -> GapCost {
        if (col == 0 && self.end_gaps.left2) || (col == len2 && self.end_gaps.right2) {
            GapCost::FREE
        } else {
            self.gap
        }
    }

    /// Score of a complete transcript, independent of how it was found.
    pub fn rescore(&self, a: Seq, b: Seq, ops: &[TranscriptOp]) -> Result<Score, AlignError> {
        let (mut i, mut j) = (0, 0);
        let mut score = 0;
        for (len, op) in ops.iter().dedup_with_count() {
            match op {
                TranscriptOp::Match | TranscriptOp::Replace => {
                    if i + len > a.len() || j + len > b.len() {
                        return Err(overrun(a, b));
                    }
                    for k in 0..len {
                        score += self.score(a[i + k], b[j + k]);
                    }
                    i += len;
                    j += len;
                }
                TranscriptOp::Insert => {
                    if j + len > b.len() {
                        return Err(overrun(a, b));
                    }
                    score += self.ins_gap(i, a.len()).cost(len);
                    j += len;
                }
                TranscriptOp::Delete => {
                    if i + len > a.len() {
                        return Err(overrun(a, b));
                    }
                    score += self.del_gap(j, b.len()).cost(len);
                    i += len;
                }
            }
        }
        if (i, j) != (a.len(), b.len()) {
            return Err(AlignError::Internal(format!(
                "transcript consumes {i} x {j} residues of a {} x {} problem",
                a.len(),
                b.len()
            )));
        }
        Ok(score)
    }
}

fn overrun(a: Seq, b: Seq) -> AlignError {
    AlignError::Internal(format!(
        "transcript runs past the end of a {} x {} problem",
        a.len(),
        b.len()
    ))
}
