//! Buffer screen: design a plate, simulate a thermal-shift readout and
//! analyze which factors move the melting temperature.
//!
//! ```text
//! cargo run --example buffer_screen
//! RUST_LOG=scout_doe=debug cargo run --example buffer_screen
//! ```

use anyhow::{Context, Result};
use scout_doe::analysis::{ModelType, RegressionEngine};
use scout_doe::design::{ExperimentDesignBuilder, PlateFormat};
use scout_doe::project::{Factor, FactorSet};
use scout_doe::table::{Column, Value};
use scout_doe::{catalog, telemetry};

/// Made-up protein: prefers pH 7.5, salt helps up to a point, glycerol helps.
fn melting_temperature(ph: f64, nacl: f64, glycerol: f64, replicate: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let noise = ((replicate * 7919) % 13) as f64 * 0.02 - 0.12;
    52.0 - 4.0 * (ph - 7.5).powi(2) + 0.015 * nacl - 0.00003 * nacl * nacl + 0.3 * glycerol + noise
}

fn main() -> Result<()> {
    telemetry::init_tracing("scout_doe=info");

    println!("=== Scout-DoE: buffer screen ===\n");

    let mut factors = FactorSet::new();
    factors.add_from_catalog("buffer pH", "7.0, 7.5, 8.0", None)?;
    factors.add_from_catalog("nacl", "50, 150, 300", Some(5000.0))?;
    factors.add(Factor::numeric("glycerol", [0.0, 5.0, 10.0])?.with_stock(50.0)?)?;

    println!("Factors:");
    for factor in factors.iter() {
        println!(
            "  {:<28} {} levels, stock {:?}",
            catalog::label(factor.name()),
            factor.level_count(),
            factor.stock_concentration()
        );
    }

    let design = ExperimentDesignBuilder::new(50.0)?
        .plate_format(PlateFormat::Wells96)
        .build(&factors)?;
    println!("\nDesign: {} wells\n", design.matrix.len());

    println!(
        "{:<5} {:<5} {:>6} {:>6} {:>9} {:>10}",
        "ID", "Well", "pH", "NaCl", "Glycerol", "Diluent"
    );
    for row in design.matrix.rows().iter().take(6) {
        println!(
            "{:<5} {:<5} {:>6} {:>6} {:>9} {:>10.2}",
            row.id,
            row.well.as_ref().map_or("", |w| w.well.as_str()),
            row.levels[0].label(),
            row.levels[1].label(),
            row.levels[2].label(),
            row.diluent_volume
        );
    }
    println!("...\n");

    println!("Stock volumes to prepare (µL):");
    for (name, total) in design.volumes.totals() {
        println!("  {name:<12} {total:>8.1}");
    }

    // Simulated plate reader output
    let mut responses = Vec::with_capacity(design.matrix.len());
    for (i, row) in design.matrix.rows().iter().enumerate() {
        let ph: f64 = row.levels[0].label().parse().context("pH level is not a number")?;
        let nacl = row.levels[1].as_f64().context("NaCl level is not a number")?;
        let glycerol = row.levels[2].as_f64().context("glycerol level is not a number")?;
        responses.push(melting_temperature(ph, nacl, glycerol, i));
    }
    let mut observed = design.matrix.to_dataset()?;
    observed.push_column("Tm", Column::Numeric(responses))?;

    let mut engine = RegressionEngine::new();
    engine.set_data(&observed, factors.roles()?, "Tm")?;

    println!("\nModel comparison:");
    for model_type in ModelType::ALL {
        let model = engine.fit(model_type)?;
        let stats = model.statistics();
        println!(
            "  {:<14} R² {:.3}  adj R² {:.3}  AIC {:>8.2}",
            model_type.as_str(),
            stats.r_squared,
            stats.adj_r_squared,
            stats.aic
        );
    }

    let model = engine.fit(ModelType::Quadratic)?;
    println!("\n{}", model.formula());
    println!("{:<48} {:>10} {:>10}", "Term", "Estimate", "p");
    for coefficient in model.coefficients() {
        println!(
            "{:<48} {:>10.4} {:>10.4}{}",
            coefficient.term,
            coefficient.estimate,
            coefficient.p_value,
            if coefficient.significant { " *" } else { "" }
        );
    }

    println!("\nMain effects (mean Tm per level):");
    for effect in engine.main_effects()? {
        let levels: Vec<String> = effect
            .levels
            .iter()
            .map(|l| format!("{}={:.2}", l.level.label(), l.mean))
            .collect();
        println!("  {:<10} range {:.2}  [{}]", effect.factor, effect.range(), levels.join(", "));
    }

    let candidate = scout_doe::table::Dataset::from_rows(
        &["buffer pH", "nacl", "glycerol"],
        vec![vec![Value::from("7.5"), Value::from(150.0), Value::from(10.0)]],
    )?;
    let predicted = engine.predict(&candidate)?;
    println!("\nPredicted Tm at pH 7.5, 150 mM NaCl, 10 % glycerol: {:.2} °C", predicted[0]);

    Ok(())
}
