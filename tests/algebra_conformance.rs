//! Algebra Conformance Tests
//!
//! Property-based tests verifying the binding laws hold for every algebra.

use an_spa::testing::{allclose, allclose_with};
use an_spa::{
    Algebra, AlgebraKind, Device, ElementSidedness, SemanticPointer, Tensor, VectorProperty,
    Vocabulary, VocabularyConfig,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Strategy for an algebra together with a dimensionality it accepts
fn algebra_strategy() -> impl Strategy<Value = (AlgebraKind, usize)> {
    prop_oneof![
        (1usize..48).prop_map(|d| (AlgebraKind::Hrr, d)),
        (2usize..7).prop_map(|k| (AlgebraKind::Vtb, k * k)),
        (4usize..7).prop_map(|k| (AlgebraKind::Tvtb, k * k)),
    ]
}

fn random_vector(algebra: &dyn Algebra, d: usize, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    algebra.create_vector(d, &[], &mut rng).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_right_identity((kind, d) in algebra_strategy(), seed in any::<u64>()) {
        let algebra = kind.instance();
        let a = random_vector(algebra.as_ref(), d, seed);
        let id = algebra.identity_element(d).unwrap();
        prop_assert!(allclose(&algebra.bind(&a, &id).unwrap(), &a));
    }

    #[test]
    fn test_zero_annihilates((kind, d) in algebra_strategy(), seed in any::<u64>()) {
        let algebra = kind.instance();
        let a = random_vector(algebra.as_ref(), d, seed);
        let zero = algebra.zero_element(d).unwrap();
        prop_assert!(allclose(&algebra.bind(&a, &zero).unwrap(), &zero));
        prop_assert!(allclose(&algebra.superpose(&a, &zero).unwrap(), &a));
    }

    #[test]
    fn test_integer_powers_repeat_binding((kind, d) in algebra_strategy(), seed in any::<u64>()) {
        let algebra = kind.instance();
        let a = random_vector(algebra.as_ref(), d, seed);
        let id = algebra.identity_element(d).unwrap();
        prop_assert!(allclose(&algebra.binding_power(&a, 0.0).unwrap(), &id));

        let two = algebra.binding_power(&a, 2.0).unwrap();
        let three = algebra.binding_power(&a, 3.0).unwrap();
        prop_assert!(allclose_with(&algebra.bind(&two, &a).unwrap(), &three, 1e-6, 1e-10));
    }

    #[test]
    fn test_binding_matrix_agrees_with_bind(
        (kind, d) in algebra_strategy(),
        seed in any::<u64>(),
        swap in any::<bool>(),
    ) {
        let algebra = kind.instance();
        let a = random_vector(algebra.as_ref(), d, seed);
        let b = random_vector(algebra.as_ref(), d, seed.wrapping_add(1));
        let m = algebra.get_binding_matrix(&b, swap).unwrap();
        let column = Tensor::from_slice(&a, (d, 1), &Device::Cpu).unwrap();
        let product: Vec<f64> = m
            .matmul(&column)
            .unwrap()
            .flatten_all()
            .unwrap()
            .to_vec1()
            .unwrap();
        let expected = if swap {
            algebra.bind(&b, &a).unwrap()
        } else {
            algebra.bind(&a, &b).unwrap()
        };
        prop_assert!(allclose(&product, &expected));
    }
}

#[cfg(feature = "linalg")]
proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_unitary_inverse_recovers((kind, d) in algebra_strategy(), seed in any::<u64>()) {
        let algebra = kind.instance();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let a = algebra.create_vector(d, &[], &mut rng).unwrap();
        let u = algebra.create_vector(d, &[VectorProperty::Unitary], &mut rng).unwrap();

        let bound = algebra.bind(&a, &u).unwrap();
        let inverse = algebra.invert(&u, algebra.default_sidedness()).unwrap();
        prop_assert!(allclose(&algebra.bind(&bound, &inverse).unwrap(), &a));
    }

    #[test]
    fn test_exponent_additivity(
        (kind, d) in algebra_strategy(),
        seed in any::<u64>(),
        p in 0.1f64..2.0,
        q in 0.1f64..2.0,
    ) {
        let algebra = kind.instance();
        let x = algebra.make_nondegenerate(&random_vector(algebra.as_ref(), d, seed)).unwrap();

        let xp = algebra.binding_power(&x, p).unwrap();
        let mut xq = algebra.binding_power(&x, q).unwrap();
        if kind == AlgebraKind::Vtb {
            // VTB powers compose through the right inverse of the second factor
            xq = algebra.invert(&xq, ElementSidedness::Right).unwrap();
        }
        let xpq = algebra.binding_power(&x, p + q).unwrap();
        prop_assert!(allclose_with(&algebra.bind(&xp, &xq).unwrap(), &xpq, 1e-6, 1e-8));
    }

    #[test]
    fn test_power_steps_by_binding(
        (kind, d) in algebra_strategy(),
        seed in any::<u64>(),
        p in -1.5f64..2.0,
    ) {
        let algebra = kind.instance();
        let x = algebra.make_nondegenerate(&random_vector(algebra.as_ref(), d, seed)).unwrap();

        let xp = algebra.binding_power(&x, p).unwrap();
        let next = algebra.binding_power(&x, p + 1.0).unwrap();
        prop_assert!(allclose_with(&algebra.bind(&xp, &x).unwrap(), &next, 1e-6, 1e-8));
    }

    #[test]
    fn test_nondegenerate_matrix_forms_are_unitary(
        (kind, d) in algebra_strategy(),
        seed in any::<u64>(),
    ) {
        prop_assume!(kind != AlgebraKind::Hrr);
        let algebra = kind.instance();
        let x = algebra.make_nondegenerate(&random_vector(algebra.as_ref(), d, seed)).unwrap();
        prop_assert!(allclose(&algebra.make_unitary(&x).unwrap(), &x));
    }

    #[test]
    fn test_projections_idempotent((kind, d) in algebra_strategy(), seed in any::<u64>()) {
        let algebra = kind.instance();
        let v = random_vector(algebra.as_ref(), d, seed);

        let u = algebra.make_unitary(&v).unwrap();
        prop_assert!(allclose(&algebra.make_unitary(&u).unwrap(), &u));

        let n = algebra.make_nondegenerate(&v).unwrap();
        prop_assert!(allclose(&algebra.make_nondegenerate(&n).unwrap(), &n));
    }
}

#[test]
fn test_absorbing_element_unavailable() {
    for kind in [AlgebraKind::Hrr, AlgebraKind::Vtb, AlgebraKind::Tvtb] {
        let algebra = kind.instance();
        assert!(matches!(
            SemanticPointer::absorbing_element(16, algebra),
            Err(an_spa::SpaError::NotImplemented(_))
        ));
    }
}

#[test]
fn test_vocabulary_round_trip() {
    let vocab = Vocabulary::with_config(VocabularyConfig {
        dimensions: 256,
        seed: Some(3),
        ..Default::default()
    })
    .unwrap();
    vocab
        .populate("COLOR; RED; SHAPE; CIRCLE; OBJ = COLOR * RED + SHAPE * CIRCLE")
        .unwrap();

    let red = vocab.parse("OBJ * ~COLOR").unwrap();
    let scores = vocab.dot(&red).unwrap();
    let best = scores
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| vocab.keys()[i].clone());
    assert_eq!(best.as_deref(), Some("RED"));
}
