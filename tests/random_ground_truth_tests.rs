// Scenario 3 of the seed suite: a large random interval set checked
// against a linearly-scanned ground truth for many random probe keys.

use interval_skiplist::{Interval, IntervalSkipList};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn random_intervals_match_linear_scan() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut list = IntervalSkipList::with_seed(2025);
    let mut ground_truth: Vec<(i32, i32, u32)> = Vec::with_capacity(1000);

    for id in 0..1000u32 {
        let a = rng.gen_range(0..=10_000);
        let b = rng.gen_range(0..=10_000);
        let (left, right) = if a <= b { (a, b) } else { (b, a) };
        list.insert(Interval::new_handle(left, right, id).unwrap()).unwrap();
        ground_truth.push((left, right, id));
    }

    for _ in 0..1000 {
        let probe = rng.gen_range(0..=10_000);
        let mut expected: Vec<u32> = ground_truth
            .iter()
            .filter(|(l, r, _)| *l <= probe && probe <= *r)
            .map(|(_, _, id)| *id)
            .collect();
        expected.sort_unstable();

        let mut out = Vec::new();
        list.find(&probe, &mut out);
        let mut actual: Vec<u32> = out.iter().map(|h| *h.value()).collect();
        actual.sort_unstable();

        assert_eq!(actual, expected, "mismatch at probe key {probe}");
    }
}
