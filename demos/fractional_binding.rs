//! Fractional binding: encoding continuous values
//!
//! Demonstrates: nondegenerate projection → fractional powers → similarity
//! decays with distance → shifting an encoded value by binding
//!
//! Run with:
//! ```bash
//! cargo run --example fractional_binding
//! ```

use an_spa::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn main() -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    for algebra in [AlgebraKind::Hrr.instance(), AlgebraKind::Tvtb.instance()] {
        println!("=== {} ===", algebra.name());

        // 1. Base vector whose fractional powers are defined
        let base = SemanticPointer::random(256, &mut rng)?
            .with_algebra(algebra.clone())
            .nondegenerate()?
            .normalized()
            .with_name("X");

        // 2. Encode x = 1.5 and compare against a sweep of encodings
        let target = base.pow(1.5)?;
        for step in 0..=6 {
            let x = step as f64 * 0.5;
            let encoded = base.pow(x)?;
            println!("  sim(X**1.5, X**{:.1}) = {:+.3}", x, target.compare(&encoded)?);
        }

        // 3. Binding with X**0.5 shifts the encoded value by 0.5
        let shifted = target.bind(&base.pow(0.5)?)?;
        let expected = base.pow(2.0)?;
        println!(
            "  sim(X**1.5 * X**0.5, X**2) = {:.6}",
            shifted.compare(&expected)?
        );
    }

    // 4. Degenerate vectors are rejected for non-integer exponents
    let degenerate = SemanticPointer::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;
    match degenerate.pow(0.5) {
        Err(e) => println!("\nExpected failure: {}", e),
        Ok(_) => println!("\nUnexpected success"),
    }
    let root = degenerate.nondegenerate()?.pow(0.5)?;
    println!("After projection: |root| = {:.3}", root.length());

    Ok(())
}
