use std::fmt;

use crate::generator::pipeline::{ArtifactContent, GenerationReport};

/// Build a markdown summary of a generation run.
pub fn build_report(report: &GenerationReport) -> String {
    MarkdownReport(report).to_string()
}

struct MarkdownReport<'a>(&'a GenerationReport);

impl fmt::Display for MarkdownReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;

        writeln!(f, "# sql2scaffold Generation Report")?;
        writeln!(f)?;
        writeln!(f, "- Plugin: {}", report.identity.raw_name)?;
        writeln!(f, "- Definition: {}", report.definition)?;
        writeln!(f, "- Class name: {}", report.identity.class_name_stem)?;
        writeln!(f, "- Data type: {}", report.identity.data_type_tag)?;
        writeln!(f)?;

        writeln!(f, "## Queries")?;
        writeln!(f)?;
        writeln!(f, "| Query | Status | Columns | Sampled rows |")?;
        writeln!(f, "|-------|--------|---------|--------------|")?;
        for outcome in &report.queries {
            let result = &outcome.result;
            let status = if result.succeeded { "ok" } else { "failed" };
            let rows = if result.truncated {
                format!("{}+", result.rows.len())
            } else {
                result.rows.len().to_string()
            };
            writeln!(
                f,
                "| {} | {} | {} | {} |",
                escape_cell(&outcome.name),
                status,
                result.columns.len(),
                rows
            )?;
        }

        for query in &report.mapped {
            writeln!(f)?;
            writeln!(f, "### {}", query.name)?;
            writeln!(f)?;
            writeln!(f, "| Attribute | Type | Column | Source |")?;
            writeln!(f, "|-----------|------|--------|--------|")?;
            for attribute in &query.model {
                let source = attribute
                    .source
                    .as_ref()
                    .map(|s| format!("{}.{}", s.table, s.column))
                    .unwrap_or_else(|| "-".to_string());
                writeln!(
                    f,
                    "| {} | {} | {} | {} |",
                    attribute.identifier,
                    attribute.target_type,
                    escape_cell(&attribute.column_name),
                    escape_cell(&source)
                )?;
            }
        }

        if !report.artifacts.is_empty() {
            writeln!(f)?;
            writeln!(f, "## Artifacts")?;
            writeln!(f)?;
            writeln!(f, "| Artifact | Action | Path |")?;
            writeln!(f, "|----------|--------|------|")?;
            for outcome in &report.artifacts {
                let action = match &outcome.result {
                    Ok(artifact) => match artifact.content {
                        ArtifactContent::Create(_) => "create",
                        ArtifactContent::Copy(_) => "copy",
                        ArtifactContent::Append(_) => "append",
                    },
                    Err(_) => "failed",
                };
                writeln!(
                    f,
                    "| {} | {} | {} |",
                    outcome.kind,
                    action,
                    outcome.path.display()
                )?;
            }
        }

        let query_failures: Vec<String> = report
            .failed_queries()
            .map(|q| format!("- query `{}`: {}", q.name, q.result.error_message().unwrap_or_default()))
            .collect();
        let artifact_failures: Vec<String> = report
            .failed_artifacts()
            .filter_map(|a| a.result.as_ref().err().map(|e| format!("- {}: {e}", a.kind)))
            .collect();
        if !query_failures.is_empty() || !artifact_failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "## Failures")?;
            writeln!(f)?;
            for line in query_failures.iter().chain(&artifact_failures) {
                writeln!(f, "{line}")?;
            }
        }
        if report.artifacts.is_empty() {
            writeln!(f)?;
            writeln!(f, "No query could be mapped; nothing was generated.")?;
        }
        Ok(())
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
