//! Types shared by the linear-space aligners: scores, alphabets, the affine
//! score model with optional free end gaps, and the spliceable transcript.
mod alphabet;
mod error;
mod score_model;
mod transcript;

pub use alphabet::*;
pub use error::*;
pub use score_model::*;
pub use transcript::*;

/// Alignment scores are maximized. Gap costs are non-positive.
pub type Score = i32;
pub type Seq<'a> = &'a [u8];
pub type Sequence = Vec<u8>;

pub fn seq_to_string(seq: Seq) -> String {
    String::from_utf8_lossy(seq).into_owned()
}

/// Counters collected while aligning one pair of sequences.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AlignStats {
    pub len1: usize,
    pub len2: usize,
    /// Number of rectangles split by a transition search.
    pub splits: usize,
    /// Number of rectangles solved by the quadratic kernel.
    pub terminals: usize,
    /// Number of tasks that ran on a thread of their own.
    pub spawned: usize,
    /// DP cells evaluated, summed over all sweeps and kernels.
    pub cells: u64,
    /// Number of bands between guide anchors.
    pub bands: usize,
    /// Wall time in seconds.
    pub duration: f64,
}

/// A finished global alignment.
#[derive(Clone, Debug, PartialEq)]
pub struct Alignment {
    pub score: Score,
    pub ops: Vec<TranscriptOp>,
    pub stats: AlignStats,
}

/// Cancellation is an expected outcome, not an error.
#[derive(Clone, Debug, PartialEq)]
pub enum AlignOutcome {
    Done(Alignment),
    Cancelled,
}

impl AlignOutcome {
    pub fn done(self) -> Option<Alignment> {
        match self {
            AlignOutcome::Done(aln) => Some(aln),
            AlignOutcome::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, AlignOutcome::Cancelled)
    }
}

/// A global aligner for two sequences.
pub trait Aligner: std::fmt::Debug + Send + Sync {
    fn align(&self, a: Seq, b: Seq) -> Result<AlignOutcome, AlignError>;
}
