use lsa_base_algos::*;
use lsa_test::reference_score;
use lsa_types::*;
use proptest::prelude::*;

fn dna(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(b"ACGT".to_vec()), 0..max_len)
}

fn end_gaps() -> impl Strategy<Value = EndGaps> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(left1, right1, left2, right2)| EndGaps {
            left1,
            right1,
            left2,
            right2,
        },
    )
}

fn score_model() -> impl Strategy<Value = ScoreModel> {
    (1..5i32, -5..0i32, -12..=0i32, -4..=0i32, end_gaps()).prop_map(
        |(match_score, mismatch, open, extend, end_gaps)| {
            ScoreModel::new(Alphabet::Nucleotide, match_score, mismatch, open, extend, end_gaps)
                .unwrap()
        },
    )
}

/// Two related sequences: `b` is a copy of `a` with a random stretch replaced.
fn related(max_len: usize) -> impl Strategy<Value = (Vec<u8>, Vec<u8>)> {
    (dna(max_len), dna(max_len / 4), any::<prop::sample::Index>(), 0..8usize).prop_map(
        |(a, patch, at, cut)| {
            let start = if a.is_empty() { 0 } else { at.index(a.len()) };
            let end = (start + cut).min(a.len());
            let mut b = a.clone();
            b.splice(start..end, patch);
            (a, b)
        },
    )
}

fn done(outcome: Result<AlignOutcome, AlignError>) -> Alignment {
    outcome.unwrap().done().unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn linear_space_is_optimal((a, b) in related(120), model in score_model()) {
        let aln = done(LinearSpaceAligner::new(model.clone(), 1).align(&a, &b));
        prop_assert_eq!(aln.score, reference_score(&a, &b, &model));
        prop_assert_eq!(aln.ops.consumed(), (a.len(), b.len()));
        prop_assert!(aln.ops.verify(&a, &b).is_ok());
        prop_assert_eq!(model.rescore(&a, &b, &aln.ops), Ok(aln.score));
    }

    #[test]
    fn engines_agree(a in dna(80), b in dna(80), model in score_model()) {
        let q = done(QuadraticAligner::new(model.clone()).align(&a, &b));
        let l = done(LinearSpaceAligner::new(model.clone(), 2).align(&a, &b));
        prop_assert_eq!(q.score, l.score);
        prop_assert_eq!(model.rescore(&a, &b, &q.ops), Ok(q.score));
    }

    #[test]
    fn threads_do_not_change_the_transcript((a, b) in related(300), model in score_model()) {
        let one = done(LinearSpaceAligner::new(model.clone(), 1).align(&a, &b));
        let many = done(LinearSpaceAligner::new(model, 8).align(&a, &b));
        prop_assert_eq!(one.score, many.score);
        prop_assert_eq!(one.ops, many.ops);
    }

    #[test]
    fn identical_sequences_align_without_gaps(a in dna(200)) {
        let model = ScoreModel::new(Alphabet::Nucleotide, 2, -3, -5, -2, EndGaps::NONE).unwrap();
        let aln = done(LinearSpaceAligner::new(model, 4).align(&a, &a));
        prop_assert_eq!(aln.score, 2 * a.len() as Score);
        prop_assert!(aln.ops.iter().all(|&op| op == TranscriptOp::Match));
    }
}
