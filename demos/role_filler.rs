//! Role/filler structures in a vocabulary
//!
//! Demonstrates: config → populate → parse → unbind → clean up against the
//! vocabulary, for commutative (HRR) and non-commutative (VTB) binding
//!
//! Run with:
//! ```bash
//! AN_SPA_SEED=7 cargo run --example role_filler
//! ```

use an_spa::prelude::*;

fn cleanup(vocab: &Vocabulary, pointer: &SemanticPointer) -> Result<(String, f64)> {
    let scores = vocab.dot(pointer)?;
    let keys = vocab.keys();
    let (index, score) = scores
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .ok_or_else(|| SpaError::Value("Empty vocabulary".to_string()))?;
    Ok((keys[index].clone(), score))
}

fn main() -> Result<()> {
    for algebra in [AlgebraKind::Hrr, AlgebraKind::Vtb] {
        let config = VocabularyConfig {
            dimensions: 256,
            algebra,
            ..Default::default()
        }
        .with_env_overrides()?;
        let vocab = Vocabulary::with_config(config)?;
        println!("=== {:?} ===", vocab);

        // 1. Roles are unitary and bound on the right so `~ROLE` unbinds them
        vocab.populate("AGENT.unitary(); ACTION.unitary(); PATIENT.unitary()")?;
        vocab.populate("DOG; CHASE; CAT")?;
        vocab.populate("SENTENCE = DOG * AGENT + CHASE * ACTION + CAT * PATIENT")?;

        // 2. Query each role
        for role in ["AGENT", "ACTION", "PATIENT"] {
            let answer = vocab.parse(&format!("SENTENCE * ~{}", role))?;
            let (key, score) = cleanup(&vocab, &answer)?;
            println!("  {:<8} -> {} ({:.3})", role, key, score);
        }

        // 3. Order matters for matrix binding
        let dog = vocab.get("DOG")?;
        let cat = vocab.get("CAT")?;
        let forward = (&dog * &cat)?;
        let backward = (&cat * &dog)?;
        println!(
            "  sim(DOG*CAT, CAT*DOG) = {:.3}",
            forward.compare(&backward)?
        );
    }

    Ok(())
}
