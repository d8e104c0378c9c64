//! Alignment transcripts, and the arena-backed `Transcript` that the
//! recursive aligner splices partial results into.

use crate::*;
use itertools::Itertools;
use std::fmt;

/// One column of a global alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TranscriptOp {
    /// Equal residues, ignoring case.
    Match,
    /// Different residues.
    Replace,
    /// A residue of sequence 2 against a gap.
    Insert,
    /// A residue of sequence 1 against a gap.
    Delete,
}

impl TranscriptOp {
    /// The op for aligning `a` against `b`.
    pub fn diagonal(a: u8, b: u8) -> Self {
        if a.eq_ignore_ascii_case(&b) {
            TranscriptOp::Match
        } else {
            TranscriptOp::Replace
        }
    }

    pub fn consumes_seq1(self) -> bool {
        !matches!(self, TranscriptOp::Insert)
    }

    pub fn consumes_seq2(self) -> bool {
        !matches!(self, TranscriptOp::Delete)
    }

    pub fn symbol(self) -> char {
        match self {
            TranscriptOp::Match => 'M',
            TranscriptOp::Replace => 'X',
            TranscriptOp::Insert => 'I',
            TranscriptOp::Delete => 'D',
        }
    }
}

/// Queries on a complete transcript.
pub trait TranscriptOps {
    /// Number of residues of sequence 1 and 2 consumed.
    fn consumed(&self) -> (usize, usize);
    /// Run-length encoding as `(op, count)` pairs.
    fn runs(&self) -> Vec<(TranscriptOp, usize)>;
    /// Compact text form, e.g. `3M1D2M`.
    fn to_cigar_string(&self) -> String;
    /// Checks that the transcript aligns exactly `a` against `b` and that
    /// every diagonal op is classified correctly.
    fn verify(&self, a: Seq, b: Seq) -> Result<(), AlignError>;
}

impl TranscriptOps for [TranscriptOp] {
    fn consumed(&self) -> (usize, usize) {
        self.iter().fold((0, 0), |(i, j), op| {
            (
                i + op.consumes_seq1() as usize,
                j + op.consumes_seq2() as usize,
            )
        })
    }

    fn runs(&self) -> Vec<(TranscriptOp, usize)> {
        self.iter()
            .dedup_with_count()
            .map(|(cnt, &op)| (op, cnt))
            .collect()
    }

    fn to_cigar_string(&self) -> String {
        self.runs()
            .iter()
            .map(|(op, cnt)| format!("{cnt}{}", op.symbol()))
            .join("")
    }

    fn verify(&self, a: Seq, b: Seq) -> Result<(), AlignError> {
        let (mut i, mut j) = (0, 0);
        for (k, &op) in self.iter().enumerate() {
            if (op.consumes_seq1() && i >= a.len()) || (op.consumes_seq2() && j >= b.len()) {
                return Err(AlignError::Internal(format!(
                    "op #{k} runs past the end of a {} x {} problem",
                    a.len(),
                    b.len()
                )));
            }
            if op.consumes_seq1() && op.consumes_seq2() && op != TranscriptOp::diagonal(a[i], b[j])
            {
                return Err(AlignError::Internal(format!(
                    "op #{k} is {op:?} for residues {} and {}",
                    a[i] as char, b[j] as char
                )));
            }
            i += op.consumes_seq1() as usize;
            j += op.consumes_seq2() as usize;
        }
        if (i, j) != (a.len(), b.len()) {
            return Err(AlignError::Internal(format!(
                "transcript consumes {i} x {j} residues of a {} x {} problem",
                a.len(),
                b.len()
            )));
        }
        Ok(())
    }
}

/// A stable position in a `Transcript`, between two runs.
///
/// Anchors stay valid while other runs are spliced elsewhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Anchor(usize);

#[derive(Debug, Default)]
struct Node {
    ops: Vec<TranscriptOp>,
    next: Option<usize>,
}

/// A singly linked list of runs stored in an arena.
///
/// Splicing a run only touches the anchor it is spliced at, so independent
/// parts of the alignment can be filled in any order.
#[derive(Debug)]
pub struct Transcript {
    nodes: Vec<Node>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    /// An empty transcript, consisting of just its start anchor.
    pub fn new() -> Self {
        Transcript {
            nodes: vec![Node::default()],
        }
    }

    pub fn start(&self) -> Anchor {
        Anchor(0)
    }

    /// Inserts `ops` directly after `at`. Returns anchors just before and just
    /// after the inserted run.
    ///
    /// Splicing twice at the same anchor places the second run before the first.
    pub fn splice(&mut self, at: Anchor, ops: Vec<TranscriptOp>) -> (Anchor, Anchor) {
        let run = self.nodes.len();
        let after = run + 1;
        let next = self.nodes[at.0].next;
        self.nodes.push(Node {
            ops,
            next: Some(after),
        });
        self.nodes.push(Node { ops: vec![], next });
        self.nodes[at.0].next = Some(run);
        (at, Anchor(after))
    }

    /// All ops, in alignment order.
    pub fn ops(&self) -> impl Iterator<Item = TranscriptOp> + '_ {
        std::iter::successors(Some(0), |&n| self.nodes[n].next)
            .flat_map(|n| self.nodes[n].ops.iter().copied())
    }

    pub fn into_ops(self) -> Vec<TranscriptOp> {
        self.ops().collect()
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ops = self.ops().collect_vec();
        write!(f, "{}", ops.to_cigar_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TranscriptOp::*;

    #[test]
    fn splice_keeps_anchors_stable() {
        let mut t = Transcript::new();
        let (left, right) = t.splice(t.start(), vec![Replace]);
        // Fill in the right side first.
        let (_, end) = t.splice(right, vec![Delete, Match]);
        t.splice(end, vec![Insert]);
        t.splice(left, vec![Match, Match]);
        assert_eq!(
            t.into_ops(),
            vec![Match, Match, Replace, Delete, Match, Insert]
        );
    }

    #[test]
    fn nested_splices() {
        let mut t = Transcript::new();
        let (l, r) = t.splice(t.start(), vec![Delete]);
        let (ll, lr) = t.splice(l, vec![Match]);
        t.splice(lr, vec![Insert]);
        t.splice(ll, vec![Replace]);
        t.splice(r, vec![Match]);
        assert_eq!(t.to_string(), "1X1M1I1D1M");
    }

    #[test]
    fn runs_and_cigar() {
        let ops = [Match, Match, Match, Delete, Match, Match];
        assert_eq!(ops.runs(), vec![(Match, 3), (Delete, 1), (Match, 2)]);
        assert_eq!(ops.to_cigar_string(), "3M1D2M");
        assert_eq!(ops.consumed(), (6, 5));
    }

    #[test]
    fn verify() {
        assert!([Match, Delete, Match].verify(b"AGT", b"AT").is_ok());
        assert!([Match, Delete, Replace].verify(b"AGT", b"AT").is_err());
        assert!([Match, Match].verify(b"AGT", b"AT").is_err());
        assert!([Replace, Insert].verify(b"A", b"CG").is_ok());
        let empty: [TranscriptOp; 0] = [];
        assert!(empty.verify(b"", b"").is_ok());
    }
}
