use crate::infra::build_services;
use clap::Args;
use relocation_calc::calculations::{CalculationResult, Interview};
use relocation_calc::config::AppConfig;
use relocation_calc::error::AppError;
use relocation_calc::telemetry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub(crate) struct EstimateArgs {
    /// Interview responses as JSON
    #[arg(long)]
    pub(crate) interview: PathBuf,
    /// Also compute accessibility maps and routing (requires a routing service)
    #[arg(long)]
    pub(crate) accessibility: bool,
}

pub(crate) fn read_interview(path: &Path) -> Result<Interview, AppError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub(crate) async fn run_estimate(args: EstimateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let interview = read_interview(&args.interview)?;
    if interview.addresses.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "{} contains no addresses",
            args.interview.display()
        )));
    }

    let (services, _model) = build_services(&config)?;

    let mut costs: BTreeMap<String, CalculationResult> = BTreeMap::new();
    for address in interview.addresses() {
        let result = services.costs.calculate(address, &interview).await;
        costs.insert(address.uuid.clone(), result);
    }

    let output = if args.accessibility {
        let mut accessibility = BTreeMap::new();
        for address in interview.addresses() {
            let outcome = services
                .accessibility
                .calculate(address, &interview, &services.accessibility_config)
                .await;
            accessibility.insert(address.uuid.clone(), outcome);
        }
        serde_json::json!({ "monthlyCost": costs, "accessibility": accessibility })
    } else {
        serde_json::json!({ "monthlyCost": costs })
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
