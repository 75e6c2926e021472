use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use getaround_insights::predict::features::{CATEGORICAL, FLAGS, TARGET};
use getaround_insights::predict::model::{LinearPriceModel, NumericTerm, UnknownCategory};
use getaround_insights::predict::{PriceModel, PricingFeatures};

const MODEL_KEYS: [&str; 11] = [
    "Citroën", "Renault", "BMW", "Peugeot", "Audi", "Nissan", "Mitsubishi", "Mercedes",
    "Volkswagen", "Toyota", "Ferrari",
];
const FUELS: [&str; 4] = ["diesel", "petrol", "hybrid_petrol", "electro"];
const COLORS: [&str; 8] = ["black", "grey", "white", "red", "silver", "blue", "beige", "brown"];
const CAR_TYPES: [&str; 8] = [
    "convertible", "coupe", "estate", "hatchback", "sedan", "subcompact", "suv", "van",
];

/// Box-Muller transform for normal distribution
fn gauss(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-15);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

// ---------------------------------------------------------------------------
// Rentals (delay analysis)
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RentalColumns {
    rental_id: Vec<i64>,
    car_id: Vec<i64>,
    checkin_type: Vec<&'static str>,
    state: Vec<&'static str>,
    delay: Vec<Option<f64>>,
    previous: Vec<Option<f64>>,
    time_delta: Vec<Option<f64>>,
}

fn generate_rentals(rng: &mut StdRng, cars: i64, per_car: usize) -> RentalColumns {
    let mut cols = RentalColumns::default();
    let mut next_id = 505_000i64;

    for car_id in 1..=cars {
        let mut previous: Option<i64> = None;
        for _ in 0..per_car {
            let checkin = if rng.gen_bool(0.2) { "connect" } else { "mobile" };
            let state = if rng.gen_bool(0.15) { "canceled" } else { "ended" };
            let delay = (state == "ended" && rng.gen_bool(0.8))
                .then(|| gauss(rng, 45.0, 180.0).round());

            // roughly one rental in ten starts shortly after the previous one
            let chained = previous.filter(|_| rng.gen_bool(0.1));
            let delta = chained.map(|_| (rng.gen_range(0..=24) * 30) as f64);

            cols.rental_id.push(next_id);
            cols.car_id.push(car_id);
            cols.checkin_type.push(checkin);
            cols.state.push(state);
            cols.delay.push(delay);
            // nullable integer ids come out of pandas as floats
            cols.previous.push(chained.map(|id| id as f64));
            cols.time_delta.push(delta);

            previous = Some(next_id);
            next_id += 1;
        }
    }
    cols
}

fn write_rentals(path: &Path, cols: RentalColumns) -> Result<usize> {
    let n = cols.rental_id.len();
    let schema = Arc::new(Schema::new(vec![
        Field::new("rental_id", DataType::Int64, false),
        Field::new("car_id", DataType::Int64, false),
        Field::new("checkin_type", DataType::Utf8, false),
        Field::new("state", DataType::Utf8, false),
        Field::new("delay_at_checkout_in_minutes", DataType::Float64, true),
        Field::new("previous_ended_rental_id", DataType::Float64, true),
        Field::new("time_delta_with_previous_rental_in_minutes", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(cols.rental_id)),
            Arc::new(Int64Array::from(cols.car_id)),
            Arc::new(StringArray::from(cols.checkin_type)),
            Arc::new(StringArray::from(cols.state)),
            Arc::new(Float64Array::from(cols.delay)),
            Arc::new(Float64Array::from(cols.previous)),
            Arc::new(Float64Array::from(cols.time_delta)),
        ],
    )
    .context("building rentals record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing rentals batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(n)
}

// ---------------------------------------------------------------------------
// Pricing model + dataset
// ---------------------------------------------------------------------------

fn levels(names: &[&str], rng: &mut StdRng, spread: f64) -> BTreeMap<String, f64> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            // first level is the reference category
            let coef = if i == 0 { 0.0 } else { gauss(rng, 0.0, spread).round() };
            (name.to_string(), coef)
        })
        .collect()
}

fn demo_model(rng: &mut StdRng) -> LinearPriceModel {
    let numeric = BTreeMap::from([
        ("mileage".to_string(), NumericTerm { mean: 140_000.0, scale: 60_000.0, coef: -12.0 }),
        ("engine_power".to_string(), NumericTerm { mean: 128.0, scale: 38.0, coef: 17.0 }),
    ]);
    let flags = FLAGS
        .iter()
        .map(|name| (name.to_string(), rng.gen_range(-2.0..9.0f64).round()))
        .collect();
    let categorical = CATEGORICAL
        .iter()
        .zip([&MODEL_KEYS[..], &FUELS[..], &COLORS[..], &CAR_TYPES[..]])
        .map(|(column, names)| (column.to_string(), levels(names, rng, 8.0)))
        .collect();

    LinearPriceModel {
        intercept: 115.0,
        numeric,
        flags,
        categorical,
        unknown_category: UnknownCategory::Error,
    }
}

fn random_car(rng: &mut StdRng) -> PricingFeatures {
    let pick = |rng: &mut StdRng, names: &[&str]| {
        names.choose(rng).copied().unwrap_or_default().to_string()
    };
    PricingFeatures {
        model_key: pick(rng, &MODEL_KEYS),
        mileage: gauss(rng, 140_000.0, 60_000.0).max(0.0).round(),
        engine_power: gauss(rng, 128.0, 38.0).clamp(25.0, 420.0).round(),
        fuel: pick(rng, &FUELS),
        paint_color: pick(rng, &COLORS),
        car_type: pick(rng, &CAR_TYPES),
        private_parking_available: rng.gen_bool(0.55),
        has_gps: rng.gen_bool(0.8),
        has_air_conditioning: rng.gen_bool(0.2),
        automatic_car: rng.gen_bool(0.2),
        has_getaround_connect: rng.gen_bool(0.55),
        has_speed_regulator: rng.gen_bool(0.25),
        winter_tires: rng.gen_bool(0.9),
    }
}

fn write_pricing(path: &Path, model: &LinearPriceModel, rng: &mut StdRng, n: usize) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;

    // leading blank column mirrors the index pandas writes
    let mut header = vec!["".to_string()];
    header.extend(CATEGORICAL.iter().take(1).map(|s| s.to_string()));
    header.extend(["mileage", "engine_power"].iter().map(|s| s.to_string()));
    header.extend(CATEGORICAL.iter().skip(1).map(|s| s.to_string()));
    header.extend(FLAGS.iter().map(|s| s.to_string()));
    header.push(TARGET.to_string());
    writer.write_record(&header)?;

    for i in 0..n {
        let car = random_car(rng);
        let price = (model.predict(&car)? + gauss(rng, 0.0, 6.0)).max(10.0).round();
        let mut record = vec![
            i.to_string(),
            car.model_key.clone(),
            car.mileage.to_string(),
            car.engine_power.to_string(),
            car.fuel.clone(),
            car.paint_color.clone(),
            car.car_type.clone(),
        ];
        record.extend(FLAGS.iter().map(|f| {
            if car.flag(f) == Some(true) { "True" } else { "False" }.to_string()
        }));
        record.push(price.to_string());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = StdRng::seed_from_u64(42);

    let rentals_path = out_dir.join("rentals.parquet");
    let n_rentals = write_rentals(&rentals_path, generate_rentals(&mut rng, 300, 7))?;

    let model = demo_model(&mut rng);
    let model_path = out_dir.join("price_model.json");
    std::fs::write(&model_path, serde_json::to_string_pretty(&model)?)
        .with_context(|| format!("writing {}", model_path.display()))?;

    let pricing_path = out_dir.join("pricing.csv");
    write_pricing(&pricing_path, &model, &mut rng, 1000)?;

    log::info!("Wrote {n_rentals} rentals to {}", rentals_path.display());
    log::info!("Wrote 1000 priced cars to {}", pricing_path.display());
    log::info!("Wrote {} to {}", model.describe(), model_path.display());
    println!(
        "Run with:\n  GETAROUND_DELAY_SOURCE={} GETAROUND_PRICING_SOURCE={} GETAROUND_MODEL_PATH={}",
        rentals_path.display(),
        pricing_path.display(),
        model_path.display()
    );
    Ok(())
}
