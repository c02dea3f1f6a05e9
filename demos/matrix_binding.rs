//! Binding as a linear map
//!
//! Demonstrates: binding matrices → candle matmul → TVTB sign/abs →
//! constant pointer nodes
//!
//! Run with:
//! ```bash
//! cargo run --example matrix_binding
//! ```

use an_spa::prelude::*;
use an_spa::testing::max_abs_diff;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn main() -> Result<()> {
    let device = Device::Cpu;
    let d = 64;
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    // 1. Binding matrices reproduce bind() as a matrix-vector product
    for algebra in [
        AlgebraKind::Hrr.instance(),
        AlgebraKind::Vtb.instance(),
        AlgebraKind::Tvtb.instance(),
    ] {
        let a = SemanticPointer::random(d, &mut rng)?.with_algebra(algebra.clone());
        let b = SemanticPointer::random(d, &mut rng)?.with_algebra(algebra.clone());

        let m = b.get_binding_matrix(false)?;
        let column = Tensor::from_slice(a.v(), (d, 1), &device)?;
        let product = m.matmul(&column)?.flatten_all()?.to_vec1::<f64>()?;
        let bound = a.bind(&b)?;
        println!(
            "{:<12} max |M·a - bind(a, b)| = {:.2e}",
            algebra.name(),
            max_abs_diff(&product, bound.v())
        );
    }

    // 2. TVTB vectors with a definite matrix form have a sign and an absolute value
    let tvtb = TvtbAlgebra;
    let positive = tvtb.create_vector(d, &[VectorProperty::Positive], &mut rng)?;
    let negative: Vec<f64> = positive.iter().map(|x| -x).collect();
    println!("\nsign(+P) = {:?}", tvtb.sign(&positive)?);
    println!("sign(-P) = {:?}", tvtb.sign(&negative)?);
    println!(
        "max |abs(-P) - P| = {:.2e}",
        max_abs_diff(&tvtb.abs(&negative)?, &positive)
    );

    // 3. Hand a pointer to network-building code
    let p = SemanticPointer::new(positive)?
        .with_algebra(AlgebraKind::Tvtb.instance())
        .with_name("P");
    let node = p.construct(&device)?;
    println!(
        "\nnode {:?}: {} outputs, shape {:?}",
        node.label(),
        node.size_out(),
        node.output().dims()
    );

    Ok(())
}
