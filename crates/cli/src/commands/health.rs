//! Service health command

use advisor_lib::health::HealthResponse;
use anyhow::Result;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{color_status, print_json, print_success, print_warning, OutputFormat};

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

/// Show the service's health report
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let (_, health): (u16, HealthResponse) = client.get_with_status("healthz").await?;

    match format {
        OutputFormat::Json => print_json(&health)?,
        OutputFormat::Table => {
            let overall = color_status(health.status.as_str());
            if health.status.is_operational() {
                print_success(&format!("Advisor is {}", overall));
            } else {
                print_warning(&format!("Advisor is {}", overall));
            }

            let mut components: Vec<_> = health.components.into_iter().collect();
            components.sort_by(|a, b| a.0.cmp(&b.0));
            let rows: Vec<ComponentRow> = components
                .into_iter()
                .map(|(name, component)| ComponentRow {
                    name,
                    status: color_status(component.status.as_str()),
                    message: component.message.unwrap_or_default(),
                })
                .collect();

            if !rows.is_empty() {
                let table = tabled::Table::new(rows)
                    .with(tabled::settings::Style::rounded())
                    .to_string();
                println!("{}", table);
            }
        }
    }

    Ok(())
}
