// ==========================================
// 船舶库存合规系统 - HTML 报告渲染
// ==========================================
// 输出: 单船合规报告 / 运行汇总报告
// 红线: 纯函数; 所有来自数据的文本必须经过 escape_html
// ==========================================

use crate::domain::types::IssueType;
use crate::engine::compliance_runner::VesselComplianceResult;
use crate::engine::summary::RunSummary;

const STYLE_COMMON: &[&str] = &[
    "body { font-family: Arial, sans-serif; color: #222; margin: 24px; }",
    "h1, h2 { margin-bottom: 0.3em; }",
    ".meta { margin: 0.2em 0; }",
    "table { border-collapse: collapse; width: 100%; margin-top: 12px; }",
    "th, td { border: 1px solid #ccc; padding: 6px 8px; text-align: left; }",
    "th { background: #f2f2f2; }",
];

const UNKNOWN_VESSEL: &str = "UNKNOWN";

/// HTML 转义: & < > " '
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// 文件名清洗: 只保留字母数字、'-'、'_'; 结果为空时返回 UNKNOWN
pub fn sanitize_filename(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if cleaned.is_empty() {
        UNKNOWN_VESSEL.to_string()
    } else {
        cleaned
    }
}

/// 单船报告文件名: <ship_id>.html
pub fn report_filename(ship_id: &str) -> String {
    format!("{}.html", sanitize_filename(ship_id))
}

/// 渲染单船合规报告
pub fn render_vessel_report(
    result: &VesselComplianceResult,
    run_timestamp: &str,
    source_files: &[String],
) -> String {
    let ship_id = non_empty(Some(result.ship_id.as_str())).unwrap_or(UNKNOWN_VESSEL);
    let label = vessel_label(ship_id, result.ship_name.as_deref());

    let mut lines = page_head(&format!("Vessel Report - {}", escape_html(ship_id)), &[
        ".ok { color: #1b5e20; font-weight: bold; }",
    ]);
    lines.extend([
        "<h1>Inventory Compliance Report</h1>".to_string(),
        format!(
            r#"<p class="meta"><strong>Vessel:</strong> {}</p>"#,
            escape_html(&label)
        ),
        format!(
            r#"<p class="meta"><strong>Run timestamp:</strong> {}</p>"#,
            escape_html(run_timestamp)
        ),
        "<h2>Source Files</h2>".to_string(),
        render_source_files(source_files),
        "<h2>Discrepancies</h2>".to_string(),
    ]);

    if result.issues.is_empty() {
        lines.push(r#"<p class="ok">No issues found for this vessel.</p>"#.to_string());
    } else {
        lines.push(render_issue_table(result));
    }

    lines.extend(["</body>".to_string(), "</html>".to_string()]);
    lines.join("\n")
}

/// 渲染运行汇总报告
pub fn render_run_summary(summary: &RunSummary, run_timestamp: &str) -> String {
    let total = summary.vessels.len();
    let with_issues = summary.vessels_with_issues();

    let mut lines = page_head("Run Summary", &[]);
    lines.extend([
        "<h1>Run Summary</h1>".to_string(),
        format!(
            r#"<p class="meta"><strong>Run timestamp:</strong> {}</p>"#,
            escape_html(run_timestamp)
        ),
        format!(r#"<p class="meta"><strong>Vessels processed:</strong> {}</p>"#, total),
        format!(
            r#"<p class="meta"><strong>Vessels with issues:</strong> {}</p>"#,
            with_issues
        ),
        format!(
            r#"<p class="meta"><strong>Vessels with no issues:</strong> {}</p>"#,
            total - with_issues
        ),
        "<h2>Vessels</h2>".to_string(),
    ]);

    if summary.vessels.is_empty() {
        lines.push("<p>No vessels processed.</p>".to_string());
    } else {
        lines.push(render_vessel_summary_table(summary));
    }

    lines.extend(["</body>".to_string(), "</html>".to_string()]);
    lines.join("\n")
}

fn page_head(title: &str, extra_styles: &[&str]) -> Vec<String> {
    let mut lines = vec![
        "<!doctype html>".to_string(),
        r#"<html lang="en">"#.to_string(),
        "<head>".to_string(),
        r#"<meta charset="utf-8">"#.to_string(),
        format!("<title>{}</title>", title),
        "<style>".to_string(),
    ];
    lines.extend(STYLE_COMMON.iter().map(|s| s.to_string()));
    lines.extend(extra_styles.iter().map(|s| s.to_string()));
    lines.extend([
        "</style>".to_string(),
        "</head>".to_string(),
        "<body>".to_string(),
    ]);
    lines
}

fn render_source_files(source_files: &[String]) -> String {
    if source_files.is_empty() {
        return "<p>No source files provided.</p>".to_string();
    }
    let items = source_files
        .iter()
        .map(|name| format!("<li>{}</li>", escape_html(name)))
        .collect::<Vec<_>>()
        .join("\n");
    format!("<ul>\n{}\n</ul>", items)
}

fn render_issue_table(result: &VesselComplianceResult) -> String {
    let header = "<tr><th>Item</th><th>Onboard Edition</th><th>Current Edition</th><th>Issue Type</th></tr>";
    let rows = result
        .issues
        .iter()
        .map(|issue| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&issue.item),
                escape_html(or_na(issue.onboard_edition.as_deref())),
                escape_html(or_na(issue.current_edition.as_deref())),
                issue_type_label(issue.issue_type),
            )
        })
        .collect::<Vec<_>>();
    format!("<table>\n{}\n{}\n</table>", header, rows.join("\n"))
}

fn render_vessel_summary_table(summary: &RunSummary) -> String {
    let header = "<tr><th>Vessel</th><th>Issue Count</th><th>Report File</th></tr>";
    let rows = summary
        .vessels
        .iter()
        .map(|vessel| {
            let ship_id = non_empty(Some(vessel.ship_id.as_str())).unwrap_or(UNKNOWN_VESSEL);
            let label = vessel_label(ship_id, vessel.ship_name.as_deref());
            let report_cell = match non_empty(vessel.report_filename.as_deref()) {
                Some(name) => {
                    let name = escape_html(name);
                    format!(r#"<a href="{}">{}</a>"#, name, name)
                }
                None => String::new(),
            };
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&label),
                vessel.issue_count,
                report_cell
            )
        })
        .collect::<Vec<_>>();
    format!("<table>\n{}\n{}\n</table>", header, rows.join("\n"))
}

fn vessel_label(ship_id: &str, ship_name: Option<&str>) -> String {
    match non_empty(ship_name) {
        Some(name) => format!("{} - {}", ship_id, name),
        None => ship_id.to_string(),
    }
}

fn issue_type_label(issue_type: IssueType) -> &'static str {
    match issue_type {
        IssueType::Outdated => "Outdated",
        IssueType::MissingOnboard => "Missing onboard edition",
        IssueType::MissingReference => "Missing reference edition",
    }
}

fn or_na(value: Option<&str>) -> &str {
    non_empty(value).unwrap_or("N/A")
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ingestion::IngestionSummary;
    use crate::domain::inventory::IssueRow;

    fn issue(item: &str, onboard: Option<&str>, current: Option<&str>, t: IssueType) -> IssueRow {
        IssueRow {
            ship_id: "S1".to_string(),
            item: item.to_string(),
            onboard_edition: onboard.map(str::to_string),
            current_edition: current.map(str::to_string),
            issue_type: t,
        }
    }

    fn result(ship_name: Option<&str>, issues: Vec<IssueRow>) -> VesselComplianceResult {
        VesselComplianceResult {
            ship_id: "S1".to_string(),
            ship_name: ship_name.map(str::to_string),
            ship_email: None,
            office_email: None,
            issues,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"A&B's"</b>"#),
            "&lt;b&gt;&quot;A&amp;B&#x27;s&quot;&lt;/b&gt;"
        );
        assert_eq!(escape_html("海图 1.0"), "海图 1.0");
    }

    #[test]
    fn test_vessel_report_escapes_issue_values() {
        let html = render_vessel_report(
            &result(
                Some("Alpha & Co"),
                vec![issue("<PUB-1>", Some("A"), None, IssueType::Outdated)],
            ),
            "2024-01-01T00:00:00Z",
            &["ic <1>.xlsx".to_string()],
        );

        assert!(html.contains("<title>Vessel Report - S1</title>"));
        assert!(html.contains("<strong>Vessel:</strong> S1 - Alpha &amp; Co</p>"));
        assert!(html.contains("<li>ic &lt;1&gt;.xlsx</li>"));
        assert!(html.contains(
            "<tr><td>&lt;PUB-1&gt;</td><td>A</td><td>N/A</td><td>Outdated</td></tr>"
        ));
        assert!(!html.contains("<PUB-1>"));
        assert!(!html.contains("No issues found"));
    }

    #[test]
    fn test_vessel_report_without_issues() {
        let html = render_vessel_report(&result(None, vec![]), "ts", &[]);

        assert!(html.contains(r#"<p class="ok">No issues found for this vessel.</p>"#));
        assert!(html.contains("<strong>Vessel:</strong> S1</p>"));
        assert!(html.contains("<p>No source files provided.</p>"));
        assert!(!html.contains("<table>"));
        assert!(html.ends_with("</body>\n</html>"));
    }

    #[test]
    fn test_issue_type_labels() {
        let html = render_vessel_report(
            &result(
                None,
                vec![
                    issue("A", None, Some("1"), IssueType::MissingOnboard),
                    issue("B", Some("2"), None, IssueType::MissingReference),
                ],
            ),
            "ts",
            &[],
        );
        assert!(html.contains("<td>Missing onboard edition</td>"));
        assert!(html.contains("<td>Missing reference edition</td>"));
    }

    #[test]
    fn test_run_summary_counts_vessels_with_and_without_issues() {
        let results = vec![
            result(Some("Alpha"), vec![issue("A", None, None, IssueType::MissingOnboard)]),
            VesselComplianceResult {
                ship_id: "S2".to_string(),
                ..result(None, vec![])
            },
        ];
        let mut summary =
            RunSummary::build("run-1", &IngestionSummary::from_results(vec![]), &results);
        summary.set_report_filename("S1", "S1.html");

        let html = render_run_summary(&summary, "ts");

        assert!(html.contains("<strong>Vessels processed:</strong> 2</p>"));
        assert!(html.contains("<strong>Vessels with issues:</strong> 1</p>"));
        assert!(html.contains("<strong>Vessels with no issues:</strong> 1</p>"));
        assert!(html.contains(
            r#"<tr><td>S1 - Alpha</td><td>1</td><td><a href="S1.html">S1.html</a></td></tr>"#
        ));
        assert!(html.contains("<tr><td>S2</td><td>0</td><td></td></tr>"));
    }

    #[test]
    fn test_run_summary_without_vessels() {
        let summary = RunSummary::build("run-1", &IngestionSummary::from_results(vec![]), &[]);
        let html = render_run_summary(&summary, "ts");
        assert!(html.contains("<p>No vessels processed.</p>"));
    }

    #[test]
    fn test_report_filename_is_sanitized() {
        assert_eq!(report_filename("S-1/../x"), "S-1x.html");
        assert_eq!(report_filename("  "), "UNKNOWN.html");
    }
}
