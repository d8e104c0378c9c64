use crate::PairwiseAligner;
use clap::Parser;
use lsa_types::*;
use serde::{Deserialize, Serialize};

fn default_match_score() -> Score {
    1
}
fn default_mismatch_score() -> Score {
    -1
}
fn default_gap_open() -> Score {
    -2
}
fn default_gap_extend() -> Score {
    -1
}
fn default_max_threads() -> usize {
    1
}
fn default_true() -> bool {
    true
}

/// Scoring and execution parameters of a pairwise alignment.
#[derive(Parser, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[clap(next_help_heading = "Alignment")]
#[serde(deny_unknown_fields)]
pub struct AlignmentConfig {
    /// Score of two equal residues
    #[clap(long, default_value_t = 1, allow_negative_numbers = true, display_order = 10)]
    #[serde(default = "default_match_score")]
    pub match_score: Score,

    /// Score of two different residues
    #[clap(long, default_value_t = -1, allow_negative_numbers = true, display_order = 10)]
    #[serde(default = "default_mismatch_score")]
    pub mismatch_score: Score,

    /// Cost of opening a gap. Must not be positive.
    #[clap(long, default_value_t = -2, allow_negative_numbers = true, display_order = 10)]
    #[serde(default = "default_gap_open")]
    pub gap_open: Score,

    /// Cost of each gap residue. Must not be positive.
    #[clap(long, default_value_t = -1, allow_negative_numbers = true, display_order = 10)]
    #[serde(default = "default_gap_extend")]
    pub gap_extend: Score,

    /// Gaps before the start of sequence 1 are free
    #[clap(long, hide_short_help = true)]
    #[serde(default)]
    pub free_left1: bool,

    /// Gaps after the end of sequence 1 are free
    #[clap(long, hide_short_help = true)]
    #[serde(default)]
    pub free_right1: bool,

    /// Gaps before the start of sequence 2 are free
    #[clap(long, hide_short_help = true)]
    #[serde(default)]
    pub free_left2: bool,

    /// Gaps after the end of sequence 2 are free
    #[clap(long, hide_short_help = true)]
    #[serde(default)]
    pub free_right2: bool,

    /// Number of threads, including the calling one
    #[clap(short = 'j', long, default_value_t = 1)]
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,

    /// Use the quadratic-memory aligner instead of the linear-space one
    #[clap(long = "quadratic", action = clap::ArgAction::SetFalse)]
    #[serde(default = "default_true")]
    pub use_linear_space: bool,

    #[clap(long, default_value_t, value_enum)]
    #[serde(default)]
    pub alphabet: Alphabet,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        AlignmentConfig {
            match_score: default_match_score(),
            mismatch_score: default_mismatch_score(),
            gap_open: default_gap_open(),
            gap_extend: default_gap_extend(),
            free_left1: false,
            free_right1: false,
            free_left2: false,
            free_right2: false,
            max_threads: default_max_threads(),
            use_linear_space: true,
            alphabet: Alphabet::default(),
        }
    }
}

impl AlignmentConfig {
    pub fn end_gaps(&self) -> EndGaps {
        EndGaps {
            left1: self.free_left1,
            right1: self.free_right1,
            left2: self.free_left2,
            right2: self.free_right2,
        }
    }

    pub fn set_end_gaps(&mut self, end_gaps: EndGaps) {
        self.free_left1 = end_gaps.left1;
        self.free_right1 = end_gaps.right1;
        self.free_left2 = end_gaps.left2;
        self.free_right2 = end_gaps.right2;
    }

    pub fn score_model(&self) -> Result<ScoreModel, AlignError> {
        ScoreModel::new(
            self.alphabet,
            self.match_score,
            self.mismatch_score,
            self.gap_open,
            self.gap_extend,
            self.end_gaps(),
        )
    }

    pub fn make_aligner(&self) -> Result<PairwiseAligner, AlignError> {
        PairwiseAligner::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_match_default() {
        let parsed = AlignmentConfig::parse_from(["lsa"]);
        assert_eq!(parsed, AlignmentConfig::default());
    }

    #[test]
    fn cli_flags() {
        let parsed = AlignmentConfig::parse_from([
            "lsa",
            "--gap-open",
            "-10",
            "--gap-extend=-2",
            "--free-left1",
            "--quadratic",
            "-j",
            "4",
            "--alphabet",
            "protein",
        ]);
        assert_eq!(parsed.gap_open, -10);
        assert_eq!(parsed.gap_extend, -2);
        assert!(parsed.free_left1 && !parsed.free_right1);
        assert!(!parsed.use_linear_space);
        assert_eq!(parsed.max_threads, 4);
        assert_eq!(parsed.alphabet, Alphabet::Protein);
    }

    #[test]
    fn serde_fills_defaults() {
        let config: AlignmentConfig =
            serde_json::from_str(r#"{"gap_open": -5, "free_right2": true}"#).unwrap();
        assert_eq!(config.gap_open, -5);
        assert_eq!(config.match_score, 1);
        assert!(config.use_linear_space);
        assert_eq!(
            config.end_gaps(),
            EndGaps {
                right2: true,
                ..EndGaps::NONE
            }
        );
        assert!(serde_json::from_str::<AlignmentConfig>(r#"{"gap": 1}"#).is_err());
    }

    #[test]
    fn invalid_scoring() {
        let config = AlignmentConfig {
            gap_extend: 1,
            ..Default::default()
        };
        assert!(matches!(
            config.score_model(),
            Err(AlignError::InvalidScoring(_))
        ));
    }
}
