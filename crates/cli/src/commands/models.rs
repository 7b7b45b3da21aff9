//! Model listing command

use anyhow::Result;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{color_status, format_percent, print_json, print_warning, OutputFormat};

/// Row for models table
#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "Model")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Accuracy")]
    accuracy: String,
    #[tabled(rename = "Features")]
    features: String,
    #[tabled(rename = "Classes")]
    classes: String,
    #[tabled(rename = "Error")]
    error: String,
}

/// List the models known to the service
pub async fn list_models(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result = client.models().await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            if result.models.is_empty() {
                print_warning("No models found");
                return Ok(());
            }

            let rows: Vec<ModelRow> = result
                .models
                .iter()
                .map(|m| ModelRow {
                    name: m.name.clone(),
                    status: color_status(if m.loaded { "loaded" } else { "failed" }),
                    accuracy: m.accuracy.map(format_percent).unwrap_or_default(),
                    features: m.feature_count.map(|n| n.to_string()).unwrap_or_default(),
                    classes: m.classes.join(", "),
                    error: m.error.clone().unwrap_or_default(),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!(
                "\nAvailable: {} of {} models",
                result.available.len(),
                result.models.len()
            );
        }
    }

    Ok(())
}
