//! Health report rendering.
//!
//! Renderers return strings; writing them to `reporting.output_directory`
//! is left to the binary.

use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::health::{bottom_repositories, top_repositories, HealthConfig, HealthSummary, ReportFormat, RepositoryHealth};
use crate::{GovernanceError, TrafficLight};

/// File name of a report for `org`, stamped with the scan date.
pub fn report_file_name(org: &str, format: ReportFormat, summary: &HealthSummary) -> String {
    let date = summary.scan_date.date_stamp();
    match format {
        ReportFormat::Markdown => format!("{org}_summary_{date}.md"),
        ReportFormat::Csv => format!("{org}_repo_health_{date}.csv"),
        ReportFormat::Json => format!("{org}_repo_health_{date}.json"),
    }
}

/// Renders one report in the requested format.
pub fn render(
    format: ReportFormat,
    org: &str,
    config: &HealthConfig,
    summary: &HealthSummary,
    results: &[RepositoryHealth],
) -> Result<String, GovernanceError> {
    match format {
        ReportFormat::Markdown => Ok(render_markdown(org, config, summary, results)),
        ReportFormat::Csv => render_csv(config, results),
        ReportFormat::Json => render_json(org, summary, results),
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

pub fn render_markdown(
    org: &str,
    config: &HealthConfig,
    summary: &HealthSummary,
    results: &[RepositoryHealth],
) -> String {
    let total = summary.total_repos;
    let mut sections = vec![
        format!("# Repository Health Summary: {org}"),
        format!("Scan date: {}", summary.scan_date),
        "## Overview".to_string(),
        markdown_table(
            ["Metric", "Value"],
            [
                ["Repositories scanned".to_string(), total.to_string()],
                ["Archived".to_string(), summary.archived_repos.to_string()],
                ["Private".to_string(), summary.private_repos.to_string()],
                [
                    "Average health score".to_string(),
                    format!("{:.1}", summary.avg_health_score),
                ],
                [
                    "Security scanning enabled".to_string(),
                    format!(
                        "{} ({:.1}%)",
                        summary.security_scanning_enabled,
                        percent(summary.security_scanning_enabled, total)
                    ),
                ],
                [
                    "Dependabot alerts enabled".to_string(),
                    format!(
                        "{} ({:.1}%)",
                        summary.dependabot_enabled,
                        percent(summary.dependabot_enabled, total)
                    ),
                ],
                [
                    "Open critical alerts".to_string(),
                    summary.total_critical_alerts.to_string(),
                ],
                ["Open high alerts".to_string(), summary.total_high_alerts.to_string()],
            ],
        ),
        "## Health Distribution".to_string(),
        markdown_table(
            ["Status", "Repositories", "Share"],
            [TrafficLight::Green, TrafficLight::Amber, TrafficLight::Red].map(|light| {
                let count = summary
                    .traffic_light_distribution
                    .get(&light)
                    .copied()
                    .unwrap_or(0);
                [
                    light.to_string(),
                    count.to_string(),
                    format!("{:.1}%", percent(count, total)),
                ]
            }),
        ),
    ];

    let n = config.reporting.include_top_bottom;
    if n > 0 && !results.is_empty() {
        sections.push(format!("## Top {n} Repositories"));
        sections.push(ranking_table(&top_repositories(results, n)));
        sections.push(format!("## Bottom {n} Repositories"));
        sections.push(ranking_table(&bottom_repositories(results, n)));
    }

    sections.push("## Required File Coverage".to_string());
    sections.push(markdown_table(
        ["File", "Required", "Present in"],
        config.required_files.iter().map(|(name, file)| {
            let present = results
                .iter()
                .filter(|r| r.facts.present_files.contains(name))
                .count();
            [
                name.clone(),
                if file.required { "yes" } else { "no" }.to_string(),
                format!("{present} ({:.1}%)", percent(present, total)),
            ]
        }),
    ));

    let mut out = sections.join("\n\n");
    out.push('\n');
    out
}

fn markdown_table<const N: usize>(
    header: [&str; N],
    rows: impl IntoIterator<Item = [String; N]>,
) -> String {
    let mut builder = Builder::default();
    builder.push_record(header);
    for row in rows {
        builder.push_record(row);
    }
    builder.build().with(Style::markdown()).to_string()
}

fn ranking_table(ranked: &[&RepositoryHealth]) -> String {
    markdown_table(
        ["Repository", "Score", "Status"],
        ranked.iter().map(|r| {
            [
                r.facts.repository.to_string(),
                format!("{:.1}", r.overall_score),
                r.traffic_light.to_string(),
            ]
        }),
    )
}

fn csv_error(err: impl std::fmt::Display) -> GovernanceError {
    GovernanceError::invalid_document("health report", err)
}

/// One row per repository; one `has_<file>` column per configured file and
/// one `<severity>_alerts` column per configured severity.
pub fn render_csv(config: &HealthConfig, results: &[RepositoryHealth]) -> Result<String, GovernanceError> {
    let mut header: Vec<String> = [
        "repository",
        "last_updated",
        "is_archived",
        "is_private",
        "security_scanning",
        "dependabot_enabled",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    header.extend(config.required_files.keys().map(|f| format!("has_{f}")));
    header.extend(
        config
            .alert_severity_weights
            .keys()
            .map(|s| format!("{s}_alerts")),
    );
    header.extend(
        [
            "required_files_score",
            "security_scanning_score",
            "dependabot_score",
            "overall_score",
            "traffic_light",
        ]
        .iter()
        .map(|s| s.to_string()),
    );

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(&header).map_err(csv_error)?;

    for r in results {
        let f = &r.facts;
        let mut row = vec![
            f.repository.to_string(),
            f.last_updated.map(|t| t.to_string()).unwrap_or_default(),
            f.is_archived.to_string(),
            f.is_private.to_string(),
            f.security_scanning.to_string(),
            f.dependabot_enabled.to_string(),
        ];
        row.extend(
            config
                .required_files
                .keys()
                .map(|name| f.present_files.contains(name).to_string()),
        );
        row.extend(
            config
                .alert_severity_weights
                .keys()
                .map(|s| f.alert_counts.get(s).copied().unwrap_or(0).to_string()),
        );
        row.extend([
            format!("{:.1}", r.required_files_score),
            format!("{:.1}", r.security_scanning_score),
            format!("{:.1}", r.dependabot_score),
            format!("{:.1}", r.overall_score),
            r.traffic_light.to_string(),
        ]);
        writer.write_record(&row).map_err(csv_error)?;
    }

    let bytes = writer.into_inner().map_err(|e| csv_error(e.error()))?;
    String::from_utf8(bytes).map_err(csv_error)
}

#[derive(Serialize)]
struct JsonReport<'a> {
    organization: &'a str,
    summary: &'a HealthSummary,
    repositories: &'a [RepositoryHealth],
}

pub fn render_json(
    org: &str,
    summary: &HealthSummary,
    results: &[RepositoryHealth],
) -> Result<String, GovernanceError> {
    let report = JsonReport {
        organization: org,
        summary,
        repositories: results,
    };
    serde_json::to_string_pretty(&report)
        .map_err(|e| GovernanceError::invalid_document("health report", e))
}
