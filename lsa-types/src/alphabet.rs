use crate::{AlignError, Seq};
use serde::{Deserialize, Serialize};

const NUCLEOTIDES: &[u8] = b"ACGTURYSWKMBDHVN";
const AMINO_ACIDS: &[u8] = b"ACDEFGHIKLMNPQRSTVWYBZXJUO*";

/// The residues a sequence may contain. Lookups are case-insensitive.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum Alphabet {
    /// DNA and RNA, including the IUPAC ambiguity codes.
    #[default]
    Nucleotide,
    /// The 20 amino acids, ambiguity codes, selenocysteine, pyrrolysine and stop.
    Protein,
}

impl Alphabet {
    /// Upper-case symbols, in the order used for score matrix indices.
    pub fn symbols(self) -> &'static [u8] {
        match self {
            Alphabet::Nucleotide => NUCLEOTIDES,
            Alphabet::Protein => AMINO_ACIDS,
        }
    }

    pub fn size(self) -> usize {
        self.symbols().len()
    }

    /// Index of `c` in `symbols()`, if it is part of the alphabet.
    pub fn index(self, c: u8) -> Option<usize> {
        let c = c.to_ascii_uppercase();
        self.symbols().iter().position(|&s| s == c)
    }

    pub fn contains(self, c: u8) -> bool {
        self.index(c).is_some()
    }

    /// Checks every residue of sequence `seq` (1 or 2, for error reporting).
    pub fn validate(self, s: Seq, seq: usize) -> Result<(), AlignError> {
        match s.iter().position(|&c| !self.contains(c)) {
            None => Ok(()),
            Some(pos) => Err(AlignError::InvalidSymbol {
                seq,
                pos,
                symbol: s[pos] as char,
            }),
        }
    }
}
