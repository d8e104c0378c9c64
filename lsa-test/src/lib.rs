use itertools::Itertools;
use rand::{seq::IteratorRandom, thread_rng, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::cmp::max;

use lsa_types::*;

/// Shows log output of the aligners in failing tests. Filter with `RUST_LOG`.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn test_sequences() -> Vec<(Seq<'static>, Seq<'static>)> {
    vec![
        (b"", b""),
        (b"A", b""),
        (b"", b"ACG"),
        (b"A", b"C"),
        (b"AGT", b"AT"),
        (b"TTGGGTCAATCAGCCAGTTTTTA", b"TTTGAGTGGGTCATCACCGATTTTAT"),
        (b"ACTGACCAGT", b"CCGACAGGA"),
        (b"AGTTTTAT", b"ACCGATTTTTA"),
        (b"CTCTCTTCTCTCTCTA", b"CCTCTCTCTCTCCTCTC"),
        (b"AGTGGGTTGCCTTCATTCCG", b"AGTGGTGTCTTCAGGCCTTCATTCCG"),
        (b"GCACGTCGCCCCCCGCCCGCG", b"GCCCGCCCGCCCGCCCCCGCCCCC"),
        (b"acgtacgtACGT", b"ACGTACGTacgt"),
        (b"CGCGTGTATCCGTCCACATCGAGCCGCCCTTGTTGCTTTTCGAGCGCTCATTTCCCGCAAGAGTGGCGTGCGGTCACTTTCGCGCAGCAATTAGAGTACTAACGGGTAGACGTGGCTTTCCTCCTCGTCCTGTCAACGCGCATAGGATGTCCTGCAGCAGGCCGCCGCGATTGCCTAAATCAAGGGGTTCCAATGGAGTTTCCATCTGATATCCGCGCTCCGGTTCTGAGTCTAAAGTGGAAATACTCCGAATGGGCCGGTATGAGGTTGGGTCAATCAGCCAGTTTTTA",
         b"CGCTGGGGATGCCTCCACCTTTCGAGTGCCTGTTGGTTCCGACGCTATCATAGTCCCCATGCAAGGAGATGGCTGCGCGTCCTATCGCGCGGCAAATAGAGTCTACGGGGGCGGCTGTCCTCCTCGTCCTGGTCAACGGCCATAGGATTTCCGCGATGGTCGCCCGGATGTGCCTAAACCAAGGCTCCGATGGAGCTGCCTCTGATATCCGCGCTGCCGGTTTCCTGACGTCTGAAAACGTTGGAAAATACCTCCGAATGGGCCCCGTTTGAGTGGGTCATCACCGATTTTAT"),
    ]
}

/// How the second sequence is derived from the first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorModel {
    /// Substitutions, insertions and deletions at random positions.
    Uniform,
    /// One long random insertion, plus uniform noise.
    NoisyInsert,
    /// One long deletion, plus uniform noise.
    NoisyDelete,
    /// The first sequence is a short unit repeated, so many alignments tie.
    Repeat,
}

const BASES: &[u8] = b"ACGT";

fn random_base(rng: &mut impl Rng) -> u8 {
    BASES[rng.gen_range(0..BASES.len())]
}

fn random_seq(n: usize, rng: &mut impl Rng) -> Sequence {
    (0..n).map(|_| random_base(rng)).collect()
}

/// Applies `edits` random point edits.
fn mutate(a: Seq, edits: usize, rng: &mut impl Rng) -> Sequence {
    let mut b = a.to_vec();
    for _ in 0..edits {
        match rng.gen_range(0..3) {
            0 if !b.is_empty() => {
                let pos = rng.gen_range(0..b.len());
                b[pos] = random_base(rng);
            }
            1 if !b.is_empty() => {
                b.remove(rng.gen_range(0..b.len()));
            }
            _ => {
                let pos = rng.gen_range(0..=b.len());
                b.insert(pos, random_base(rng));
            }
        }
    }
    b
}

/// A pair of sequences of length about `n`, with a fraction `e` of edits.
pub fn generate_model(n: usize, e: f32, model: ErrorModel, seed: u64) -> (Sequence, Sequence) {
    let rng = &mut ChaCha8Rng::seed_from_u64(seed);
    let edits = (e * n as f32).round() as usize;
    match model {
        ErrorModel::Uniform => {
            let a = random_seq(n, rng);
            let b = mutate(&a, edits, rng);
            (a, b)
        }
        ErrorModel::NoisyInsert => {
            let a = random_seq(n, rng);
            let mut b = mutate(&a, edits / 2, rng);
            let pos = rng.gen_range(0..=b.len());
            let block = random_seq(edits - edits / 2, rng);
            b.splice(pos..pos, block);
            (a, b)
        }
        ErrorModel::NoisyDelete => {
            let a = random_seq(n, rng);
            let mut b = mutate(&a, edits / 2, rng);
            let len = (edits - edits / 2).min(b.len());
            let pos = rng.gen_range(0..=b.len() - len);
            b.drain(pos..pos + len);
            (a, b)
        }
        ErrorModel::Repeat => {
            let unit = random_seq(rng.gen_range(1..=4), rng);
            let a = unit.iter().copied().cycle().take(n).collect_vec();
            let b = mutate(&a, edits, rng);
            (a, b)
        }
    }
}

const FIXED: bool = false;

pub fn gen_seqs() -> impl Iterator<Item = ((Sequence, Sequence), (usize, f32, ErrorModel, u64))> {
    let rng = &mut thread_rng();
    let mut ns = vec![
        0usize, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 30, 40, 50,
        60, 70, 80, 90, 100, 110, 120, 130, 140, 150, 200, 250, 300, 500,
    ];
    let mut es = vec![
        0.0f32, 0.01, 0.02, 0.03, 0.05, 0.10, 0.20, 0.30, 0.40, 0.50, 0.60, 0.70, 1.0,
    ];

    // Pick a random subset of the above. CI runs often enough to get good coverage.
    if !FIXED {
        let nl = ns.len();
        ns = ns.into_iter().choose_multiple(rng, nl / 4);
        let el = es.len();
        es = es.into_iter().choose_multiple(rng, el / 4);
    }

    let models = [
        ErrorModel::Uniform,
        ErrorModel::NoisyInsert,
        ErrorModel::NoisyDelete,
        ErrorModel::Repeat,
    ];
    // Run each test on a new random seed for increased coverage over time.
    let seeds = if FIXED {
        [31415]
    } else {
        [rng.gen_range(0..u64::MAX)]
    };
    ns.into_iter()
        .cartesian_product(es)
        .cartesian_product(models)
        .cartesian_product(seeds)
        .map(|(((n, e), error_model), seed)| {
            let (a, b) = generate_model(n, e, error_model, seed);
            ((a, b), (n, e, error_model, seed))
        })
}

/// Optimal score by plain full-matrix DP, without traceback.
pub fn reference_score(a: Seq, b: Seq, model: &ScoreModel) -> Score {
    const NEG: i64 = i64::MIN / 4;
    let (n, m) = (a.len(), b.len());
    let mut best = vec![vec![NEG; m + 1]; n + 1];
    let mut ins = vec![vec![NEG; m + 1]; n + 1];
    let mut del = vec![vec![NEG; m + 1]; n + 1];
    best[0][0] = 0;
    for i in 0..=n {
        for j in 0..=m {
            if i > 0 && j > 0 {
                best[i][j] = best[i - 1][j - 1] + model.score(a[i - 1], b[j - 1]) as i64;
            }
            if j > 0 {
                let gap = model.ins_gap(i, n);
                ins[i][j] = max(ins[i][j - 1], best[i][j - 1] + gap.open as i64) + gap.extend as i64;
            }
            if i > 0 {
                let gap = model.del_gap(j, m);
                del[i][j] = max(del[i - 1][j], best[i - 1][j] + gap.open as i64) + gap.extend as i64;
            }
            best[i][j] = max(best[i][j], max(ins[i][j], del[i][j]));
        }
    }
    best[n][m] as Score
}

pub fn test_aligner_on_input(
    a: Seq,
    b: Seq,
    aligner: &impl Aligner,
    model: &ScoreModel,
    params: &str,
) {
    // useful in case of panics inside the alignment code.
    eprintln!("{params}");
    let score = reference_score(a, b, model);
    let aln = match aligner.align(a, b) {
        Ok(AlignOutcome::Done(aln)) => aln,
        other => panic!("{params}\nunexpected result {other:?}\nAligner\n{aligner:?}"),
    };
    assert_eq!(
        score,
        aln.score,
        "\n{params}\nlet a = \"{}\".as_bytes();\nlet b = \"{}\".as_bytes();\nAligner\n{aligner:?}",
        seq_to_string(a),
        seq_to_string(b),
    );
    if let Err(e) = aln.ops.verify(a, b) {
        panic!(
            "{params}\n{e}\ntranscript: {}",
            aln.ops.to_cigar_string()
        );
    }
    assert_eq!(
        model.rescore(a, b, &aln.ops),
        Ok(score),
        "\n{params}\ntranscript: {}",
        aln.ops.to_cigar_string()
    );
}

/// Test the given aligner on the hardcoded sequences and on a random set of
/// generated ones:
/// - length 0 to 500
/// - error rate 0.0 to 1.0
/// - error models: uniform, noisy insert, noisy delete, repeat
///
/// - The score reported by the aligner must match `reference_score`.
/// - The returned transcript must be valid and rescore to the same score.
pub fn test_aligner(aligner: impl Aligner, model: &ScoreModel) {
    test_aligner_up_to(aligner, model, usize::MAX);
}

/// As test_aligner, but only test sequences with n <= max_n.
pub fn test_aligner_up_to(aligner: impl Aligner, model: &ScoreModel, max_n: usize) {
    init_logger();
    for (a, b) in test_sequences() {
        test_aligner_on_input(
            a,
            b,
            &aligner,
            model,
            &format!(
                "hardcoded test_sequences: a {:?} b {:?}",
                seq_to_string(a),
                seq_to_string(b)
            ),
        );
    }
    for ((a, b), (n, e, error_model, seed)) in gen_seqs() {
        if n > max_n {
            continue;
        }
        test_aligner_on_input(
            &a,
            &b,
            &aligner,
            model,
            &format!("seed {seed:>10} n {n:>5} e {e:>.2} error_model {error_model:?}"),
        );
    }
}
