use super::table::Table;
use crate::EngineError;
use crate::doctor::{DoctorReport, Health};

/// Grid of every tool's health followed by a one-line tally.
pub fn render_health(report: &DoctorReport) -> String {
    let mut table = Table::new(&["Tool", "Installed", "Minimum", "Status"]);
    for tool in &report.tools {
        table.push(vec![
            tool.tool.clone(),
            tool.installed.clone().unwrap_or_else(|| "-".to_string()),
            tool.minimum.clone().unwrap_or_else(|| "-".to_string()),
            tool.health.to_string(),
        ]);
    }

    let mut out = table.grid();
    out.push_str(&format!(
        "\n{} ok, {} outdated, {} missing, {} unknown\n",
        report.count(Health::Ok),
        report.count(Health::Outdated),
        report.count(Health::Missing),
        report.count(Health::Unknown),
    ));
    out
}

pub fn render_health_json(report: &DoctorReport) -> Result<String, EngineError> {
    let mut out = serde_json::to_string_pretty(report)
        .map_err(|e| EngineError::internal(format!("Failed to serialize report: {}", e)))?;
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doctor::ToolHealth;

    fn report() -> DoctorReport {
        DoctorReport {
            tools: vec![
                ToolHealth {
                    tool: "ruff".to_string(),
                    installed: Some("0.6.2".to_string()),
                    minimum: Some("0.5".to_string()),
                    health: Health::Ok,
                },
                ToolHealth {
                    tool: "shellcheck".to_string(),
                    installed: None,
                    minimum: None,
                    health: Health::Missing,
                },
            ],
        }
    }

    #[test]
    fn test_render_health() {
        insta::assert_snapshot!(render_health(&report()), @r"
        +------------+-----------+---------+---------+
        | Tool       | Installed | Minimum | Status  |
        +============+===========+=========+=========+
        | ruff       | 0.6.2     | 0.5     | ok      |
        +------------+-----------+---------+---------+
        | shellcheck | -         | -       | missing |
        +------------+-----------+---------+---------+

        1 ok, 0 outdated, 1 missing, 0 unknown
        ");
    }

    #[test]
    fn test_render_health_json() {
        let json = render_health_json(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["tools"][0]["health"], "ok");
        assert_eq!(value["tools"][1]["installed"], serde_json::Value::Null);
        assert_eq!(value["tools"][1]["health"], "missing");
    }
}
