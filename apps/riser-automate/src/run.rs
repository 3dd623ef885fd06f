//! The automation function: fetch sizing tables, draw each shaft, report
//! exactly one terminal outcome.

use std::path::Path;

use anyhow::Result;
use datafusr_sdk::{DatafusrClient, ShaftDesign};
use riser_plot::{place, render_cross_section, ElementSizes, ShaftDims};
use tracing::{info, warn};

use crate::config::FunctionInputs;
use crate::context::{AutomationContext, HostReporter};

pub const NO_DATA_MESSAGE: &str = "Automation failed: No shaft data could be retrieved!";
pub const SUCCESS_MESSAGE: &str = "Shaft cross-sections successfully generated!";

/// Run the automation end to end. Domain failures fold into one
/// `mark_run_failed` call; only failures of the reporting channel itself
/// escape as errors.
pub async fn automate_function<R: HostReporter>(
    context: &AutomationContext<R>,
    inputs: &FunctionInputs,
    out_dir: &Path,
) -> Result<()> {
    let client = DatafusrClient::new(
        inputs.api_url.expose(),
        &inputs.username,
        inputs.api_token.clone(),
    );

    let source_url = match context.model_version_url() {
        Ok(url) => url,
        Err(err) => {
            context
                .reporter
                .mark_run_failed(&format!("Automation failed: {err:#}"))
                .await?;
            return Ok(());
        }
    };

    // A transport-level failure still gets a terminal report.
    let response = match client
        .fetch_shaft_design(&source_url, &inputs.speckle_token)
        .await
    {
        Ok(response) => response,
        Err(err) => {
            context
                .reporter
                .mark_run_failed(&format!("Automation failed: {err}"))
                .await?;
            return Ok(());
        }
    };

    let design = match response.shaft_design {
        Some(design) if !design.is_empty() => design,
        _ => {
            context.reporter.mark_run_failed(NO_DATA_MESSAGE).await?;
            return Ok(());
        }
    };

    match draw_all(context, inputs, &design, out_dir).await {
        Ok(drawn) => {
            info!(count = drawn, "generated shaft cross-sections");
            context.reporter.mark_run_success(SUCCESS_MESSAGE).await?;
        }
        Err(err) => {
            context
                .reporter
                .mark_run_failed(&format!("Automation failed: {err:#}"))
                .await?;
        }
    }
    Ok(())
}

/// Draw and attach every shaft with a positive planned area. Any failure
/// aborts the remaining shafts; there is no partial success.
async fn draw_all<R: HostReporter>(
    context: &AutomationContext<R>,
    inputs: &FunctionInputs,
    design: &ShaftDesign,
    out_dir: &Path,
) -> Result<usize> {
    let mut drawn = 0;
    for shaft_id in design.shaft_ids() {
        let area = design.planned_area(shaft_id)?;
        if area <= 0.0 {
            warn!(shaft = %shaft_id, "shaft has no area, skipping plot");
            continue;
        }

        let record = design.record(shaft_id)?;
        let dims = ShaftDims::from_area(record.area, inputs.aspect_ratio)?;
        let sizes = ElementSizes {
            supply_width: record.supply_width,
            supply_depth: record.supply_depth,
            return_width: record.return_width,
            return_depth: record.return_depth,
            heating_cooling_area: record.heating_cooling_area,
            electrical_area: record.electrical_area,
            plumbing_area: record.plumbing_area,
        };
        let elements = place(dims, &sizes);
        let path = render_cross_section(shaft_id, dims, &elements, out_dir)?;
        context.reporter.store_file_result(&path).await?;
        drawn += 1;
    }
    Ok(drawn)
}
