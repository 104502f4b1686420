// src/render/mod.rs
//
// Writes the HTML report: one line chart per symbol plotting the balance
// sheet's "total liabilities and equity" series across filings. All other
// presentation lives on the consumer side of the saved tables.

use std::fs;
use std::path::{Path, PathBuf};

use crate::aggregate::AggregateReport;
use crate::schema::StatementType;
use crate::utils::error::StorageError;

const CHARTED_KEY: &str = "total liabilities and equity";

/// Renders `index.html` into the output directory.
pub fn write_index(
    output_dir: &Path,
    reports: &[(String, AggregateReport)],
) -> Result<PathBuf, StorageError> {
    let mut html = String::from(
        r#"<!DOCTYPE html>
<html>
<head>
<meta http-equiv="X-UA-Compatible" content="IE=edge">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<script src="https://cdnjs.cloudflare.com/ajax/libs/Chart.js/0.2.0/Chart.min.js" type="text/javascript"></script>
</head>
<body>
"#,
    );

    for (symbol, report) in reports {
        let Some(table) = report.tables.get(&StatementType::BalanceSheet) else {
            continue;
        };

        // Column labels prefer the filing's declared period end date.
        let labels: Vec<String> = table
            .columns()
            .iter()
            .map(|document| {
                report
                    .period_ends
                    .get(document)
                    .and_then(Option::as_deref)
                    .unwrap_or(document)
                    .to_string()
            })
            .collect();
        let values: Vec<Option<f64>> = table
            .columns()
            .iter()
            .map(|document| table.value(CHARTED_KEY, document))
            .collect();

        let labels_js = serde_json::to_string(&labels)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        let values_js = serde_json::to_string(&values)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        let dataset_label = serde_json::to_string(&format!("{symbol} {CHARTED_KEY}"))
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        html.push_str(&format!(
            r##"<h2>{symbol}</h2>
<canvas id="chart-{symbol}" width="1600" height="800"></canvas>
<script>
var data = {{
  labels: {labels_js},
  datasets: [
      {{
          label: {dataset_label},
          fillColor: "rgba(151,187,205,0.2)",
          strokeColor: "rgba(151,187,205,1)",
          pointColor: "rgba(151,187,205,1)",
          pointStrokeColor: "#fff",
          pointHighlightFill: "#fff",
          pointHighlightStroke: "rgba(151,187,205,1)",
          data: {values_js}
      }}
  ]
}};
new Chart(document.getElementById("chart-{symbol}").getContext("2d")).Line(data);
</script>
"##,
        ));
    }

    html.push_str("</body>\n</html>\n");

    let output_file = output_dir.join("index.html");
    fs::write(&output_file, html).map_err(StorageError::IoError)?;
    tracing::info!("HTML report generated at {}", output_file.display());

    Ok(output_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{Aggregator, FailurePolicy};
    use crate::schema::SchemaRegistry;
    use crate::source::MemorySource;
    use crate::workbook::{Cell, Sheet, Workbook};
    use std::sync::Arc;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn sheet(full_name: &str, data_rows: Vec<Vec<Cell>>) -> Sheet {
        let mut rows = vec![vec![text(full_name)]];
        rows.extend(data_rows);
        Sheet {
            name: full_name.chars().take(31).collect(),
            rows,
        }
    }

    fn filing(total: f64, period_end: &str) -> Workbook {
        Workbook {
            sheets: vec![
                sheet(
                    "Document and Entity Information",
                    vec![vec![text("Document Period End Date"), text(period_end)]],
                ),
                sheet(
                    "Consolidated Balance Sheets",
                    vec![vec![
                        text("Total liabilities and stockholders' equity"),
                        Cell::Number(total),
                    ]],
                ),
                sheet(
                    "Consolidated Statements of Income",
                    vec![vec![text("Net income"), Cell::Number(1.0)]],
                ),
                sheet(
                    "Consolidated Statements of Cash Flows",
                    vec![vec![
                        text("Net cash provided by operating activities"),
                        Cell::Number(1.0),
                    ]],
                ),
            ],
        }
    }

    #[test]
    fn renders_a_chart_per_symbol() {
        let registry = Arc::new(SchemaRegistry::builtin());
        let mut source = MemorySource::new();
        let docs = vec![
            source.insert("T-2015-4-10K", filing(123456.0, "Dec. 31, 2015")),
            source.insert("T-2016-4-10K", filing(234567.0, "Dec. 31, 2016")),
        ];
        let report = Aggregator::new(registry, FailurePolicy::Abort)
            .aggregate(&source, &docs)
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = write_index(dir.path(), &[("T".to_string(), report)]).unwrap();

        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains(r#"<canvas id="chart-T""#));
        assert!(html.contains("123456"));
        assert!(html.contains("234567"));
        assert!(html.contains("Dec. 31, 2015"));
        assert!(html.contains("Chart.min.js"));
    }
}
