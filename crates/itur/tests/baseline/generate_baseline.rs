//! Runs the scenarios in `tests/baseline/scenarios.json` against the reference
//! datasets (located through `ITUR_CONFIG` / `ITUR_DATA_DIR`) and writes the
//! per-contribution attenuations to `tests/baseline/rust_results.json`.

use std::fs;

use itur::versions::P618Version;
use itur::{Config, Contributions, LinkParameters, Predictor, Unit, Versions};
use serde::{Deserialize, Serialize};

const SCENARIOS: &str = "tests/baseline/scenarios.json";
const RESULTS: &str = "tests/baseline/rust_results.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineConfig {
    pub general: GeneralConfig,
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub p618_version: u32,
    pub antenna_diameter: f64,
    pub antenna_efficiency: f64,
    pub polarization_tilt: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub lat: f64,
    pub lon: f64,
    pub frequency: f64,
    pub elevation: f64,
    pub percentages: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub percentages: Vec<f64>,
    pub gas: Vec<f64>,
    pub cloud: Vec<f64>,
    pub rain: Vec<f64>,
    pub scintillation: Vec<f64>,
    pub total: Vec<f64>,
}

pub fn load_baseline_config() -> Result<BaselineConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(SCENARIOS)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn run_scenario(
    pred: &Predictor,
    general: &GeneralConfig,
    scenario: &Scenario,
) -> Result<ScenarioResult, itur::ItuError> {
    let (lat, lon) = (Unit::Degree.of(scenario.lat), Unit::Degree.of(scenario.lon));
    let (f, el) = (Unit::GigaHertz.of(scenario.frequency), Unit::Degree.of(scenario.elevation));
    let p = Unit::Percent.vec(scenario.percentages.clone());
    let d = Unit::Meter.of(general.antenna_diameter);
    let eta = Unit::Dimensionless.of(general.antenna_efficiency);
    let tau = Unit::Degree.of(general.polarization_tilt);

    let link = LinkParameters::new(&lat, &lon, &f, &el, &p)
        .with_diameter(&d)
        .with_efficiency(&eta)
        .with_polarization_tilt(&tau);
    let b = pred.attenuation_breakdown(&link, Contributions::ALL)?;
    let column = |q: &itur::Quantity| q.iter().copied().collect::<Vec<_>>();

    Ok(ScenarioResult {
        name: scenario.name.clone(),
        percentages: scenario.percentages.clone(),
        gas: column(&b.gas),
        cloud: column(&b.cloud),
        rain: column(&b.rain),
        scintillation: column(&b.scintillation),
        total: column(&b.total),
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = load_baseline_config()?;
    let versions = Versions::for_p618(P618Version::try_from(config.general.p618_version)?);
    let pred = Predictor::from_config(&Config::from_env()).with_versions(versions);

    let missing = pred.missing_datasets();
    if !missing.is_empty() {
        for (spec, err) in &missing {
            eprintln!("missing {}: {}", spec.id(), err);
        }
        return Err(format!("{} datasets unavailable", missing.len()).into());
    }

    println!("running {} scenarios", config.scenarios.len());
    let mut results = Vec::new();
    for scenario in &config.scenarios {
        let result = run_scenario(&pred, &config.general, scenario)?;
        println!(
            "{}: A(0.01%)={:.3} dB, A(1%)={:.3} dB",
            result.name,
            result.total.first().copied().unwrap_or(f64::NAN),
            result.total.last().copied().unwrap_or(f64::NAN),
        );
        results.push(result);
    }

    fs::write(RESULTS, serde_json::to_string_pretty(&results)?)?;
    println!("saved to {}", RESULTS);
    Ok(())
}
