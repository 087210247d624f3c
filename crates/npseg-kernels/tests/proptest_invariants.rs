// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use npseg_core::KernelFamily;
use npseg_kernels::KernelEvaluator;
use proptest::prelude::*;

const MIN_PROPTEST_CASES: u32 = 256;

fn proptest_cases() -> u32 {
    std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .map(|parsed| parsed.max(MIN_PROPTEST_CASES))
        .unwrap_or(MIN_PROPTEST_CASES)
}

fn any_family() -> impl Strategy<Value = KernelFamily> {
    prop_oneof![
        Just(KernelFamily::QuadExp),
        Just(KernelFamily::Gauss),
        Just(KernelFamily::Euclidean),
        Just(KernelFamily::Laplace),
        Just(KernelFamily::Sine),
    ]
}

fn point(len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-50.0..50.0f64, len)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: proptest_cases(),
        ..ProptestConfig::default()
    })]

    #[test]
    fn kernel_is_symmetric(
        family in any_family(),
        scale in 0.01..5.0f64,
        (x, y) in (2usize..8).prop_flat_map(|len| (point(len), point(len))),
    ) {
        let kernel = KernelEvaluator::with_scale(family, scale)
            .expect("positive scale should build");
        prop_assert_eq!(kernel.eval(&x, &y), kernel.eval(&y, &x));
    }

    #[test]
    fn kernel_values_are_finite(
        family in any_family(),
        scale in 0.01..5.0f64,
        (x, y) in (2usize..8).prop_flat_map(|len| (point(len), point(len))),
    ) {
        let kernel = KernelEvaluator::with_scale(family, scale)
            .expect("positive scale should build");
        prop_assert!(kernel.eval(&x, &y).is_finite());
    }

    #[test]
    fn self_evaluation_dominates_bounded_families(
        family in prop_oneof![
            Just(KernelFamily::QuadExp),
            Just(KernelFamily::Gauss),
            Just(KernelFamily::Laplace),
        ],
        scale in 0.01..5.0f64,
        (x, y) in (2usize..8).prop_flat_map(|len| (point(len), point(len))),
    ) {
        let kernel = KernelEvaluator::with_scale(family, scale)
            .expect("positive scale should build");
        let cross = kernel.eval(&x, &y);
        prop_assert!((0.0..=1.0).contains(&cross));
        prop_assert_eq!(kernel.eval(&x, &x), 1.0);
    }

    #[test]
    fn euclidean_is_nonpositive_and_zero_on_the_diagonal(
        scale in 0.1..3.0f64,
        (x, y) in (2usize..8).prop_flat_map(|len| (point(len), point(len))),
    ) {
        let kernel = KernelEvaluator::with_scale(KernelFamily::Euclidean, scale)
            .expect("positive scale should build");
        prop_assert!(kernel.eval(&x, &y) <= 0.0);
        prop_assert_eq!(kernel.eval(&x, &x), 0.0);
    }
}
