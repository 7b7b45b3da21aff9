//! Recommendation and prediction commands

use advisor_lib::models::{AdaptiveReport, StudentFeatures};
use anyhow::{Context, Result};
use colored::Colorize;
use tabled::Tabled;

use super::read_input;
use crate::client::{ApiClient, SessionRequest};
use crate::output::{
    color_confidence, format_percent, print_heading, print_info, print_json, print_list,
    print_success, print_warning, OutputFormat,
};

/// Row for the derived features table
#[derive(Tabled)]
struct FeatureRow {
    #[tabled(rename = "Feature")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

pub fn parse_features(text: &str) -> Result<StudentFeatures> {
    serde_json::from_str(text).context("Features must be a JSON object of metric values")
}

pub fn parse_session(text: &str) -> Result<SessionRequest> {
    serde_json::from_str(text)
        .context("Session must be a JSON object with `outcomes` and optional `history`")
}

/// Ask the service for a recommendation
pub async fn recommend(client: &ApiClient, source: &str, format: OutputFormat) -> Result<()> {
    let features = parse_features(&read_input(source)?)?;
    let report = client.recommend(&features).await?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => print_report(&report),
    }

    Ok(())
}

/// Derive features from raw quiz telemetry and ask for a recommendation
pub async fn analyze(client: &ApiClient, source: &str, format: OutputFormat) -> Result<()> {
    let session = parse_session(&read_input(source)?)?;
    if session.outcomes.is_empty() {
        print_warning("Session has no answered questions");
        return Ok(());
    }
    let response = client.analyze_session(&session).await?;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => {
            let rows: Vec<FeatureRow> = response
                .features
                .iter()
                .map(|(name, value)| FeatureRow {
                    name: name.clone(),
                    value: match value.as_f64() {
                        Some(v) => format!("{:.3}", v),
                        None => value.to_string(),
                    },
                })
                .collect();
            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            print_report(&response.report);
        }
    }

    Ok(())
}

/// Ask the service how likely the learner is to succeed next
pub async fn performance(client: &ApiClient, source: &str, format: OutputFormat) -> Result<()> {
    let features = parse_features(&read_input(source)?)?;
    let estimate = client.predict_performance(&features).await?;

    match format {
        OutputFormat::Json => print_json(&estimate)?,
        OutputFormat::Table => {
            let verdict = if estimate.predicted_success {
                "likely to succeed".green()
            } else {
                "likely to struggle".yellow()
            };
            print_info(&format!(
                "Success probability {} ({})",
                format_percent(estimate.success_probability),
                verdict
            ));
        }
    }

    Ok(())
}

fn print_report(report: &AdaptiveReport) {
    print_success(&format!(
        "Learner type: {} ({})",
        report.learner_type.to_string().bold(),
        color_confidence(report.learner.confidence)
    ));
    print_success(&format!(
        "Engagement: {} ({})",
        report.engagement_level.to_string().bold(),
        color_confidence(report.engagement.confidence)
    ));

    let rec = &report.recommendation;
    print_heading("Difficulty");
    println!("  {}", rec.difficulty_adjustment);
    print_heading("Study plan");
    print_list(&rec.study_plan, "none");
    print_heading("Motivation");
    print_list(&rec.motivation_tips, "keep going at your current pace");
    print_heading("Resources");
    print_list(&rec.resources, "none");
}
