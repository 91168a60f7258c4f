//! Optimization cycle: seed a Bayesian optimizer with a first screen, then
//! run a few suggest → measure → report rounds against a simulated assay.
//!
//! ```text
//! cargo run --example optimization_cycle
//! ```

use anyhow::{Context, Result};
use scout_doe::config::EngineConfig;
use scout_doe::optimize::{BayesianOptimizer, Parameters};
use scout_doe::roles::FactorRoles;
use scout_doe::session::SessionStore;
use scout_doe::table::{Dataset, Value};
use scout_doe::telemetry;

/// Simulated assay with its optimum near 180 mM NaCl in HEPES.
fn assay(nacl: f64, buffer: &str) -> f64 {
    let buffer_shift = match buffer {
        "HEPES" => 2.0,
        "Tris" => 0.5,
        _ => 0.0,
    };
    55.0 - 0.0002 * (nacl - 180.0).powi(2) + buffer_shift
}

fn measure(parameters: &Parameters) -> Result<f64> {
    let nacl = parameters
        .get("NaCl (mM)")
        .and_then(Value::as_f64)
        .context("suggestion has no NaCl value")?;
    let buffer = parameters
        .get("Buffer")
        .and_then(Value::as_text)
        .context("suggestion has no buffer")?;
    Ok(assay(nacl, buffer))
}

fn first_screen() -> Result<Dataset> {
    let mut rows = Vec::new();
    for buffer in ["Tris", "HEPES", "MES"] {
        for nacl in [50.0, 150.0, 300.0] {
            let tm = assay(nacl, buffer);
            rows.push(vec![Value::from(nacl), Value::from(buffer), Value::from(tm)]);
        }
    }
    Ok(Dataset::from_rows(&["NaCl (mM)", "Buffer", "Tm"], rows)?)
}

fn main() -> Result<()> {
    telemetry::init_tracing("scout_doe=info");

    println!("=== Scout-DoE: optimization cycle ===\n");

    let config = EngineConfig::builder().seed(2024).build()?;
    let store = SessionStore::new();
    let id = store.create(BayesianOptimizer::from_config(&config));
    println!("Opened {id}");

    let roles = FactorRoles::new(&["NaCl (mM)", "Buffer"], &["Buffer"], &[])?;
    let data = first_screen()?;

    store.with_session_mut(id, |optimizer| -> Result<()> {
        optimizer.set_data(&data, roles, "Tm")?;
        println!("Bounds:");
        for (factor, bounds) in optimizer.factor_bounds().context("no data set")? {
            println!("  {factor:<10} {}", serde_json::to_string(bounds)?);
        }
        optimizer.initialize(false)?;
        Ok(())
    })??;

    for round in 1..=4 {
        let batch = store.with_session_mut(id, |optimizer| optimizer.suggest_batch(3))??;
        println!("\nRound {round}:");
        for parameters in &batch {
            let response = measure(parameters)?;
            println!(
                "  NaCl {:>7.1} mM  {:<6} → Tm {response:.2}",
                parameters.get("NaCl (mM)").and_then(Value::as_f64).unwrap_or(f64::NAN),
                parameters.get("Buffer").map(Value::label).unwrap_or_default(),
            );
            store.with_session_mut(id, |optimizer| optimizer.report(parameters, response))??;
        }
    }

    store.with_session(id, |optimizer| {
        println!("\n{} trials recorded", optimizer.trials().len());
        if let Some(best) = optimizer.best_observed() {
            println!(
                "Best: trial {} ({:?}) Tm {:.2} with {:?}",
                best.index(),
                best.source(),
                best.response().unwrap_or(f64::NAN),
                best.parameters()
            );
        }
    })?;

    store.remove(id)?;
    Ok(())
}
