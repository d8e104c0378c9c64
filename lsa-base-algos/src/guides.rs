//! Guide hits: ungapped diagonal anchors known to be part of the alignment.
//!
//! Between consecutive anchors the problem splits into independent bands,
//! which are aligned separately and concatenated.
use crate::nw::front::Rect;
use lsa_types::*;
use serde::{Deserialize, Serialize};

/// An ungapped match between `seq1[q_start..=q_end]` and `seq2[s_start..=s_end]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideHit {
    pub q_start: usize,
    pub q_end: usize,
    pub s_start: usize,
    pub s_end: usize,
}

impl GuideHit {
    pub fn new(q_start: usize, s_start: usize, len: usize) -> Self {
        assert!(len > 0, "guide hits span at least one residue");
        GuideHit {
            q_start,
            q_end: q_start + len - 1,
            s_start,
            s_end: s_start + len - 1,
        }
    }

    pub fn len(&self) -> usize {
        self.q_end - self.q_start + 1
    }
}

/// A piece of a guided alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment {
    /// A free sub-problem between anchors.
    Band(Rect),
    /// A diagonal run of `len` residues starting at `(i, j)`.
    Anchor { i: usize, j: usize, len: usize },
}

/// Validated guide hits, sorted and non-overlapping in both sequences.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuideSet {
    hits: Vec<GuideHit>,
    len1: usize,
    len2: usize,
}

impl GuideSet {
    pub fn new(hits: Vec<GuideHit>, len1: usize, len2: usize) -> Result<Self, AlignError> {
        let invalid = |index, fault| AlignError::InvalidGuide { index, fault };
        for (index, hit) in hits.iter().enumerate() {
            if hit.q_start > hit.q_end || hit.s_start > hit.s_end {
                return Err(invalid(index, GuideFault::Reversed));
            }
            if hit.q_end - hit.q_start != hit.s_end - hit.s_start {
                return Err(invalid(index, GuideFault::LengthMismatch));
            }
            if hit.q_end >= len1 || hit.s_end >= len2 {
                return Err(invalid(index, GuideFault::OutOfRange));
            }
            if index > 0 {
                let prev = &hits[index - 1];
                if hit.q_start <= prev.q_start || hit.s_start <= prev.s_start {
                    return Err(invalid(index, GuideFault::Unsorted));
                }
                if hit.q_start <= prev.q_end || hit.s_start <= prev.s_end {
                    return Err(invalid(index, GuideFault::Overlapping));
                }
            }
        }
        Ok(GuideSet { hits, len1, len2 })
    }

    pub fn hits(&self) -> &[GuideHit] {
        &self.hits
    }

    /// The bands and anchors covering the whole problem, in order. Bands
    /// without residues are left out.
    pub fn segments(&self) -> Vec<Segment> {
        let mut segments = Vec::with_capacity(2 * self.hits.len() + 1);
        let (mut i, mut j) = (0, 0);
        for hit in &self.hits {
            push_band(&mut segments, i, j, hit.q_start, hit.s_start);
            segments.push(Segment::Anchor {
                i: hit.q_start,
                j: hit.s_start,
                len: hit.len(),
            });
            i = hit.q_end + 1;
            j = hit.s_end + 1;
        }
        push_band(&mut segments, i, j, self.len1, self.len2);
        segments
    }
}

fn push_band(segments: &mut Vec<Segment>, i: usize, j: usize, i_end: usize, j_end: usize) {
    if i_end > i || j_end > j {
        segments.push(Segment::Band(Rect {
            i1: i,
            j1: j,
            dim_i: i_end - i,
            dim_j: j_end - j,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fault(hits: Vec<GuideHit>) -> Option<(usize, GuideFault)> {
        match GuideSet::new(hits, 100, 100) {
            Err(AlignError::InvalidGuide { index, fault }) => Some((index, fault)),
            _ => None,
        }
    }

    #[test]
    fn rejects_malformed_hits() {
        let reversed = GuideHit {
            q_start: 5,
            q_end: 3,
            s_start: 5,
            s_end: 3,
        };
        assert_eq!(fault(vec![reversed]), Some((0, GuideFault::Reversed)));
        let skewed = GuideHit {
            q_start: 0,
            q_end: 3,
            s_start: 0,
            s_end: 4,
        };
        assert_eq!(fault(vec![skewed]), Some((0, GuideFault::LengthMismatch)));
        assert_eq!(
            fault(vec![GuideHit::new(98, 0, 5)]),
            Some((0, GuideFault::OutOfRange))
        );
        assert_eq!(
            fault(vec![GuideHit::new(10, 10, 5), GuideHit::new(2, 20, 5)]),
            Some((1, GuideFault::Unsorted))
        );
        assert_eq!(
            fault(vec![GuideHit::new(10, 10, 5), GuideHit::new(14, 20, 5)]),
            Some((1, GuideFault::Overlapping))
        );
        assert_eq!(
            fault(vec![GuideHit::new(10, 10, 5), GuideHit::new(15, 15, 5)]),
            None
        );
    }

    #[test]
    fn segments_cover_everything() {
        let set = GuideSet::new(
            vec![GuideHit::new(0, 3, 2), GuideHit::new(4, 5, 3)],
            10,
            8,
        )
        .unwrap();
        assert_eq!(
            set.segments(),
            vec![
                Segment::Band(Rect {
                    i1: 0,
                    j1: 0,
                    dim_i: 0,
                    dim_j: 3
                }),
                Segment::Anchor { i: 0, j: 3, len: 2 },
                Segment::Band(Rect {
                    i1: 2,
                    j1: 5,
                    dim_i: 2,
                    dim_j: 0
                }),
                Segment::Anchor { i: 4, j: 5, len: 3 },
                Segment::Band(Rect {
                    i1: 7,
                    j1: 8,
                    dim_i: 3,
                    dim_j: 0
                }),
            ]
        );
    }

    #[test]
    fn adjacent_anchors_have_no_band() {
        let set = GuideSet::new(
            vec![GuideHit::new(0, 0, 2), GuideHit::new(2, 2, 2)],
            4,
            4,
        )
        .unwrap();
        assert_eq!(
            set.segments(),
            vec![
                Segment::Anchor { i: 0, j: 0, len: 2 },
                Segment::Anchor { i: 2, j: 2, len: 2 },
            ]
        );
    }
}
