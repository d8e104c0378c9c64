//! Global pairwise alignment with affine gap costs and optional free end gaps.
//!
//! - `QuadraticAligner`: Gotoh's algorithm with a full traceback matrix.
//! - `LinearSpaceAligner`: the divide-and-conquer algorithm of Myers and Miller,
//!   which needs memory linear in the sequence lengths and can split its
//!   recursion over multiple threads.
//! - `PairwiseAligner`: either of the above, configured by an
//!   `AlignmentConfig`, with support for cancellation, progress reporting and
//!   guide hits.
mod config;
mod context;
mod guides;
mod mm;
mod nw;


pub use config::AlignmentConfig;
pub use context::{CancelToken, ProgressFn};
pub use guides::{GuideHit, GuideSet, Segment};
pub use nw::front::Rect;
pub use nw::MAX_CELLS;

use context::{AlignContext, Halt, Progress};
use lsa_types::*;
use nw::front::Corners;

/// Which kernel solves the bands of an alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Method {
    Quadratic,
    LinearSpace,
}

struct Run<'a> {
    model: &'a ScoreModel,
    method: Method,
    max_threads: usize,
    cancel: &'a CancelToken,
    progress: Option<&'a ProgressFn>,
}

impl Run<'_> {
    fn align(&self, a: Seq, b: Seq, guides: Option<&[GuideHit]>) -> Result<AlignOutcome, AlignError> {
        let start = instant::Instant::now();
        self.model.alphabet().validate(a, 1)?;
        self.model.alphabet().validate(b, 2)?;
        let guides = guides
            .map(|hits| GuideSet::new(hits.to_vec(), a.len(), b.len()))
            .transpose()?;
        let segments = match &guides {
            Some(guides) => guides.segments(),
            None => vec![Segment::Band(Rect::full(a.len(), b.len()))],
        };
        let bands = || {
            segments.iter().filter_map(|s| match s {
                Segment::Band(rect) => Some(*rect),
                Segment::Anchor { .. } => None,
            })
        };

        // Fail before doing any work.
        if self.method == Method::Quadratic {
            for rect in bands() {
                nw::check_size(rect)?;
            }
        }
        // Each cell is swept about twice by the linear-space recursion.
        let factor = match self.method {
            Method::Quadratic => 1,
            Method::LinearSpace => 2,
        };
        let work = factor * bands().map(|r| r.cells()).sum::<u64>();
        log::info!(
            "aligning {} x {} residues: {:?} on up to {} threads, {} bands",
            a.len(),
            b.len(),
            self.method,
            self.max_threads,
            bands().count()
        );

        let ctx = AlignContext::new(
            a,
            b,
            self.model,
            self.max_threads,
            self.cancel,
            Progress::new(work, self.progress),
        );
        let mut ops = Vec::with_capacity(a.len() + b.len());
        let mut score = 0;
        for segment in &segments {
            match *segment {
                Segment::Band(rect) => {
                    if guides.is_some() {
                        log::debug!("band {rect}");
                    }
                    let result = match self.method {
                        Method::Quadratic => nw::solve(&ctx, rect, Corners::default()),
                        Method::LinearSpace => mm::solve(&ctx, rect),
                    };
                    match result {
                        Ok((band_score, band_ops)) => {
                            score += band_score;
                            ops.extend(band_ops);
                        }
                        Err(Halt::Cancelled) => {
                            log::warn!("alignment cancelled after {} cells", ctx.progress.done());
                            return Ok(AlignOutcome::Cancelled);
                        }
                        Err(Halt::Failed(e)) => return Err(e),
                    }
                }
                Segment::Anchor { i, j, len } => {
                    ops.extend((0..len).map(|k| TranscriptOp::diagonal(a[i + k], b[j + k])));
                }
            }
        }

        // Anchors are not part of any band, so guided alignments are scored
        // as a whole.
        let score = if guides.is_some() {
            self.model.rescore(a, b, &ops)?
        } else {
            debug_assert_eq!(self.model.rescore(a, b, &ops), Ok(score));
            score
        };
        let mut stats = ctx.stats();
        stats.bands = bands().count();
        stats.duration = start.elapsed().as_secs_f64();
        log::info!(
            "score {score} in {:.3}s: {} splits, {} kernels, {} threads spawned",
            stats.duration,
            stats.splits,
            stats.terminals,
            stats.spawned
        );
        Ok(AlignOutcome::Done(Alignment { score, ops, stats }))
    }
}

/// Gotoh's algorithm with a full traceback matrix. Fails with `TooLarge` when
/// the matrix cannot be addressed.
#[derive(Clone, Debug, PartialEq)]
pub struct QuadraticAligner {
    pub model: ScoreModel,
}

impl QuadraticAligner {
    pub fn new(model: ScoreModel) -> Self {
        QuadraticAligner { model }
    }
}

impl Aligner for QuadraticAligner {
    fn align(&self, a: Seq, b: Seq) -> Result<AlignOutcome, AlignError> {
        Run {
            model: &self.model,
            method: Method::Quadratic,
            max_threads: 1,
            cancel: &CancelToken::new(),
            progress: None,
        }
        .align(a, b, None)
    }
}

/// The divide-and-conquer aligner of Myers and Miller. Memory use is linear in
/// the input lengths.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearSpaceAligner {
    pub model: ScoreModel,
    /// Upper bound on the number of threads, including the calling one.
    pub max_threads: usize,
}

impl LinearSpaceAligner {
    pub fn new(model: ScoreModel, max_threads: usize) -> Self {
        LinearSpaceAligner { model, max_threads }
    }
}

impl Aligner for LinearSpaceAligner {
    fn align(&self, a: Seq, b: Seq) -> Result<AlignOutcome, AlignError> {
        Run {
            model: &self.model,
            method: Method::LinearSpace,
            max_threads: self.max_threads,
            cancel: &CancelToken::new(),
            progress: None,
        }
        .align(a, b, None)
    }
}

/// An aligner built from an `AlignmentConfig`, with cancellation, progress
/// reporting and guide hits.
pub struct PairwiseAligner {
    config: AlignmentConfig,
    model: ScoreModel,
    cancel: CancelToken,
    progress: Option<Box<ProgressFn>>,
}

impl std::fmt::Debug for PairwiseAligner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PairwiseAligner")
            .field("config", &self.config)
            .field("cancel", &self.cancel)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl PairwiseAligner {
    pub fn new(config: AlignmentConfig) -> Result<Self, AlignError> {
        Ok(PairwiseAligner {
            model: config.score_model()?,
            config,
            cancel: CancelToken::new(),
            progress: None,
        })
    }

    /// Reports `(total, done)` work units as rows complete. Returning `true`
    /// from `f` cancels the running alignment.
    pub fn with_progress(mut self, f: impl Fn(u64, u64) -> bool + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// A handle that cancels alignments of this aligner, from any thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    pub fn model(&self) -> &ScoreModel {
        &self.model
    }

    fn run(&self) -> Run<'_> {
        Run {
            model: &self.model,
            method: if self.config.use_linear_space {
                Method::LinearSpace
            } else {
                Method::Quadratic
            },
            max_threads: self.config.max_threads,
            cancel: &self.cancel,
            progress: self.progress.as_deref(),
        }
    }

    /// Aligns `a` and `b` through the given anchors. Only the bands between
    /// anchors are searched; the score covers the whole alignment.
    pub fn align_guided(
        &self,
        a: Seq,
        b: Seq,
        guides: &[GuideHit],
    ) -> Result<AlignOutcome, AlignError> {
        self.run().align(a, b, Some(guides))
    }
}

impl Aligner for PairwiseAligner {
    fn align(&self, a: Seq, b: Seq) -> Result<AlignOutcome, AlignError> {
        self.run().align(a, b, None)
    }
}
