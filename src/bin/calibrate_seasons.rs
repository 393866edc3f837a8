//! Season Calibration Pipeline
//!
//! Pairs every harvested measurement with the engine's prediction for the
//! same planting and date, then derives per-(cultivar, region, season)
//! offset records and an aggregate accuracy report.
//!
//! Usage: calibrate_seasons [DATA_DIR] [OUTPUT_DIR]
//!
//! Tuples are independent by construction (no shared mutable state), so the
//! pairing stage fans out across all cores. Output is fully recomputed on
//! every run; persisting it is last-writer-wins per tuple.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use harvest_predictor_rust::calibration::{accuracy_report, calibrate, ObservationPair};
use harvest_predictor_rust::data::{EngineData, Measurement};
use harvest_predictor_rust::gdd::estimate_accumulation;
use harvest_predictor_rust::predictor::{HarvestPredictor, PlantingContext, TimingParams};
use rayon::prelude::*;

fn main() -> anyhow::Result<()> {
    println!("\n{}", "=".repeat(80));
    println!("SEASON CALIBRATION PIPELINE");
    println!("{}", "=".repeat(80));

    let data_dir = std::env::args().nth(1).unwrap_or_else(|| "data".to_string());
    let output_dir = std::env::args().nth(2).unwrap_or_else(|| "output".to_string());

    let total_start = Instant::now();

    let EngineData { registry, catalog, measurements } = EngineData::load(Path::new(&data_dir))?;
    let predictor = HarvestPredictor::new(registry, catalog, TimingParams::default());

    // =========================================================================
    // STAGE 1: PAIR MEASUREMENTS WITH PREDICTIONS
    // =========================================================================
    println!("\n{}", "-".repeat(70));
    println!("Pairing {} measurements with predictions", measurements.len());
    println!("{}", "-".repeat(70));

    let pairing_start = Instant::now();
    let progress = AtomicUsize::new(0);
    let total = measurements.len();

    let (pairs, errors): (Vec<_>, Vec<_>) = measurements
        .par_iter()
        .map(|m| {
            let result = pair_measurement(&predictor, m);
            let count = progress.fetch_add(1, Ordering::Relaxed) + 1;
            if count % 1000 == 0 || count == total {
                print!("\r  Paired: {}/{}", count, total);
                std::io::Write::flush(&mut std::io::stdout()).ok();
            }
            result
        })
        .partition(Result::is_ok);
    let pairs: Vec<ObservationPair> = pairs.into_iter().map(Result::unwrap).collect();
    println!("\r  Paired {} measurements in {:.2}s", pairs.len(), pairing_start.elapsed().as_secs_f64());
    if !errors.is_empty() {
        println!("  Skipped measurements: {}", errors.len());
        println!("  First error: {}", errors[0].as_ref().unwrap_err());
    }

    // =========================================================================
    // STAGE 2: PER-TUPLE OFFSET RECORDS
    // =========================================================================
    println!("\n{}", "-".repeat(70));
    println!("Computing per-season offset records");
    println!("{}", "-".repeat(70));

    let records = calibrate(&pairs);
    println!("  Calibration records: {}", records.len());
    for record in &records {
        println!(
            "  {} / {} / {}: n={} mean={:+.2} stddev={:.2} range=[{:+.2}, {:+.2}]",
            record.cultivar_id,
            record.region_id,
            record.season_year,
            record.sample_count,
            record.offset_mean,
            record.offset_stddev,
            record.offset_min,
            record.offset_max,
        );
    }

    // =========================================================================
    // STAGE 3: AGGREGATE ACCURACY
    // =========================================================================
    let report = accuracy_report(&pairs);
    println!("\n{}", "-".repeat(70));
    println!("Aggregate accuracy ({} pairs)", report.sample_count);
    println!("{}", "-".repeat(70));
    println!("  MAE:  {:.3} Brix", report.mae);
    println!("  RMSE: {:.3} Brix", report.rmse);
    println!("  R²:   {:.3}", report.r_squared);
    println!("  Within 0.5: {:.1}%", report.band_pct(0));
    println!("  Within 1.0: {:.1}%", report.band_pct(1));
    println!("  Within 1.5: {:.1}%", report.band_pct(2));
    println!("  Within 2.0: {:.1}%", report.band_pct(3));

    // =========================================================================
    // WRITE OUTPUTS
    // =========================================================================
    let output_dir = PathBuf::from(output_dir);
    std::fs::create_dir_all(&output_dir)?;

    let records_path = output_dir.join("calibration_records.json");
    std::fs::write(&records_path, serde_json::to_string_pretty(&records)?)?;
    println!("\n✓ Saved: {:?}", records_path);

    let report_path = output_dir.join("accuracy_report.json");
    std::fs::write(&report_path, serde_json::to_string_pretty(&report)?)?;
    println!("✓ Saved: {:?}", report_path);

    println!("\nTotal time: {:.1}s", total_start.elapsed().as_secs_f64());

    Ok(())
}

/// Pair one measurement with the engine's prediction for the same date.
///
/// The batch has no per-planting age or rootstock data, so predictions run
/// with those inputs unknown; their reduced confidence is carried in the
/// pairing rather than hidden.
fn pair_measurement(
    predictor: &HarvestPredictor,
    measurement: &Measurement,
) -> anyhow::Result<ObservationPair> {
    let cultivar = predictor.catalog().cultivar(&measurement.cultivar_id)?;
    let profile = predictor
        .registry()
        .profile(&cultivar.crop_id, &measurement.region_id)?;
    let region = predictor.registry().region(&measurement.region_id)?;

    let season_year = profile.season_for(measurement.date);
    let bloom = profile
        .bloom_date(season_year)
        .ok_or_else(|| anyhow::anyhow!("invalid bloom date in profile {}", profile.crop_id))?;

    let accumulation = estimate_accumulation(profile, region, bloom, measurement.date);

    let ctx = PlantingContext {
        gdd_confidence: Some(accumulation.confidence),
        ..Default::default()
    };
    let prediction = predictor.predict_brix(
        &measurement.cultivar_id,
        accumulation.cumulative_gdd,
        profile.gdd_to_peak,
        &ctx,
    )?;

    Ok(ObservationPair {
        cultivar_id: measurement.cultivar_id.clone(),
        region_id: measurement.region_id.clone(),
        season_year,
        predicted_brix: prediction.predicted_brix,
        actual_brix: measurement.actual_brix,
    })
}
