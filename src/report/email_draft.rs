// ==========================================
// 船舶库存合规系统 - 邮件草稿 (.eml)
// ==========================================
// 职责: 每船一封 multipart/alternative 草稿 (纯文本 + HTML 报告)
// 收件人: 船舶邮箱 + 办公室邮箱（缺省时回退到默认办公室邮箱）
// 红线: 任一收件人缺失/格式错误或报告缺失时不生成草稿, 只记录问题
// 不负责: 发送邮件
// ==========================================

use crate::config::email_config_trait::{EmailConfigReader, DEFAULT_SUBJECT_TEMPLATE};
use crate::config::error::ConfigResult;
use crate::engine::compliance_runner::VesselComplianceResult;
use crate::engine::summary::{RunSummary, SummaryError};
use crate::report::html::sanitize_filename;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

pub const EMAIL_DRAFTING_PHASE: &str = "email_drafting";

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
const TEXT_BODY: &str = "This message contains an HTML report.";
const BASE64_LINE_LEN: usize = 76;
const CRLF: &str = "\r\n";

// ==========================================
// EmailDraftOptions - 草稿选项
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailDraftOptions {
    pub subject_template: String,
    pub default_office_email: Option<String>,
    pub from_address: Option<String>,
}

impl Default for EmailDraftOptions {
    fn default() -> Self {
        Self {
            subject_template: DEFAULT_SUBJECT_TEMPLATE.to_string(),
            default_office_email: None,
            from_address: None,
        }
    }
}

impl EmailDraftOptions {
    pub fn from_config(config: &impl EmailConfigReader) -> ConfigResult<Self> {
        Ok(Self {
            subject_template: config.subject_template()?,
            default_office_email: config.default_office_email()?,
            from_address: config.from_address()?,
        })
    }
}

// ==========================================
// DraftIssue - 草稿阶段问题
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftLevel {
    Error,
    Warning,
}

impl DraftLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftLevel::Error => "error",
            DraftLevel::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftIssue {
    pub vessel_id: Option<String>,
    pub message: String,
    pub level: DraftLevel,
}

impl DraftIssue {
    fn error(vessel_id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            vessel_id: vessel_id.map(str::to_string),
            message: message.into(),
            level: DraftLevel::Error,
        }
    }

    fn warning(vessel_id: &str, message: impl Into<String>) -> Self {
        Self {
            vessel_id: Some(vessel_id.to_string()),
            message: message.into(),
            level: DraftLevel::Warning,
        }
    }
}

/// 已生成的草稿
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftEmail {
    pub ship_id: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftingResult {
    pub drafts: Vec<DraftEmail>,
    pub issues: Vec<DraftIssue>,
}

impl DraftingResult {
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.level == DraftLevel::Error)
            .count()
    }

    /// 将问题追加到 summary.errors (phase = email_drafting, 去重)
    pub fn record_into(&self, summary: &mut RunSummary) {
        for issue in &self.issues {
            summary.push_error(SummaryError::new(
                EMAIL_DRAFTING_PHASE,
                issue.vessel_id.as_deref(),
                issue.message.clone(),
                issue.level.as_str(),
            ));
        }
    }
}

// ==========================================
// EmailDrafter
// ==========================================
pub struct EmailDrafter {
    eml_dir: PathBuf,
    options: EmailDraftOptions,
    run_id: String,
}

impl EmailDrafter {
    pub fn new(eml_dir: impl Into<PathBuf>, options: EmailDraftOptions, run_id: &str) -> Self {
        Self {
            eml_dir: eml_dir.into(),
            options,
            run_id: run_id.to_string(),
        }
    }

    /// 为每艘船生成草稿
    ///
    /// # 参数
    /// - results: 比对结果（携带船名与邮箱）
    /// - reports: ship_id → 单船 HTML 报告路径
    #[instrument(skip(self, results, reports), fields(vessels = results.len()))]
    pub fn draft_all(
        &self,
        results: &[VesselComplianceResult],
        reports: &BTreeMap<String, PathBuf>,
    ) -> DraftingResult {
        let mut outcome = DraftingResult::default();

        for result in results {
            let ship_id = result.ship_id.trim();
            if ship_id.is_empty() {
                outcome.issues.push(DraftIssue::error(
                    None,
                    "Missing required vessel identifier: ship_id.",
                ));
                continue;
            }

            let mut errors = Vec::new();
            let mut warnings = Vec::new();

            let recipients = self.resolve_recipients(result, ship_id, &mut errors);
            let html = read_report(reports.get(ship_id), ship_id, &mut errors);
            let subject = self.format_subject(result, ship_id, &mut warnings);

            if !errors.is_empty() {
                warn!(ship_id = %ship_id, errors = errors.len(), "草稿未生成");
                outcome.issues.extend(errors);
                outcome.issues.extend(warnings);
                continue;
            }

            let message = build_message(
                &recipients,
                &subject,
                &html,
                self.options.from_address.as_deref(),
                ship_id,
            );
            let path = self
                .eml_dir
                .join(eml_filename(ship_id, result.ship_name.as_deref()));

            match write_draft(&self.eml_dir, &path, &message) {
                Ok(()) => outcome.drafts.push(DraftEmail {
                    ship_id: ship_id.to_string(),
                    recipients,
                    subject,
                    path,
                }),
                Err(e) => {
                    warn!(ship_id = %ship_id, error = %e, "草稿写入失败");
                    outcome.issues.push(DraftIssue::error(
                        Some(ship_id),
                        format!("Failed to write email draft {}: {}.", path.display(), e),
                    ));
                }
            }
            outcome.issues.extend(warnings);
        }

        info!(
            drafts = outcome.drafts.len(),
            errors = outcome.error_count(),
            "邮件草稿生成完成"
        );
        outcome
    }

    fn resolve_recipients(
        &self,
        result: &VesselComplianceResult,
        ship_id: &str,
        errors: &mut Vec<DraftIssue>,
    ) -> Vec<String> {
        let ship_email = non_blank(result.ship_email.as_deref());
        let office_email = non_blank(result.office_email.as_deref())
            .or_else(|| non_blank(self.options.default_office_email.as_deref()));

        if ship_email.is_none() {
            errors.push(DraftIssue::error(
                Some(ship_id),
                "Missing required recipient: vessel email address.",
            ));
        }
        if office_email.is_none() {
            errors.push(DraftIssue::error(
                Some(ship_id),
                "Missing required recipient: office email address.",
            ));
        }

        let recipients: Vec<String> = [ship_email, office_email]
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();
        for email in &recipients {
            if !is_valid_email(email) {
                errors.push(DraftIssue::error(
                    Some(ship_id),
                    format!("Invalid email address format: {}.", email),
                ));
            }
        }
        recipients
    }

    fn format_subject(
        &self,
        result: &VesselComplianceResult,
        ship_id: &str,
        warnings: &mut Vec<DraftIssue>,
    ) -> String {
        let ship_name = non_blank(result.ship_name.as_deref());
        if ship_name.is_none() {
            warnings.push(DraftIssue::warning(
                ship_id,
                "Missing optional metadata: ship_name.",
            ));
        }

        let values = HashMap::from([
            ("SHIPID", ship_id),
            ("SHIPNAME", ship_name.unwrap_or(ship_id)),
            ("RUN_ID", self.run_id.as_str()),
        ]);
        let (subject, unknown) = fill_template(&self.options.subject_template, &values);
        for name in unknown {
            warnings.push(DraftIssue::warning(
                ship_id,
                format!("Unknown subject template placeholder: {}.", name),
            ));
        }
        subject
    }
}

/// 地址格式校验（去除首尾空白后整体匹配）
pub fn is_valid_email(address: &str) -> bool {
    Regex::new(EMAIL_PATTERN)
        .map(|re| re.is_match(address.trim()))
        .unwrap_or(false)
}

/// 草稿文件名: <ship_id>_<ship_name>.eml, 无船名时为 <ship_id>.eml
pub fn eml_filename(ship_id: &str, ship_name: Option<&str>) -> String {
    let safe_id = sanitize_filename(ship_id);
    match non_blank(ship_name) {
        Some(name) => format!("{}_{}.eml", safe_id, sanitize_filename(name)),
        None => format!("{}.eml", safe_id),
    }
}

/// 填充 {NAME} 占位符; {{ 与 }} 为字面量花括号
///
/// 返回填充结果与未知占位符名（未知占位符替换为空串）
fn fill_template(template: &str, values: &HashMap<&str, &str>) -> (String, Vec<String>) {
    let mut output = String::with_capacity(template.len());
    let mut unknown = Vec::new();
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                output.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                output.push('}');
            }
            '{' => {
                let mut field = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    field.push(c);
                }
                if !closed {
                    output.push('{');
                    output.push_str(&field);
                    continue;
                }
                // 格式说明 (:fmt / !conv) 不参与取值
                let name = field.split([':', '!']).next().unwrap_or_default();
                match values.get(name) {
                    Some(value) => output.push_str(value),
                    None if name.is_empty() => {}
                    None => unknown.push(name.to_string()),
                }
            }
            _ => output.push(ch),
        }
    }
    (output, unknown)
}

fn read_report(path: Option<&PathBuf>, ship_id: &str, errors: &mut Vec<DraftIssue>) -> String {
    let Some(path) = path else {
        errors.push(DraftIssue::error(
            Some(ship_id),
            "Missing required HTML report for vessel.",
        ));
        return String::new();
    };

    match fs::read_to_string(path) {
        Ok(html) if html.trim().is_empty() => {
            errors.push(DraftIssue::error(
                Some(ship_id),
                "HTML report is empty for vessel.",
            ));
            String::new()
        }
        Ok(html) => html,
        Err(e) => {
            errors.push(DraftIssue::error(
                Some(ship_id),
                format!("HTML report could not be read at {}: {}.", path.display(), e),
            ));
            String::new()
        }
    }
}

// ==========================================
// MIME 组装
// ==========================================

fn build_message(
    recipients: &[String],
    subject: &str,
    html: &str,
    from: Option<&str>,
    ship_id: &str,
) -> String {
    let boundary = format!("=_icr_{}", sanitize_filename(ship_id));

    let mut lines = vec![
        format!("To: {}", header_value(&recipients.join(", "))),
        format!("Subject: {}", encode_header(subject)),
    ];
    if let Some(from) = non_blank(from) {
        lines.push(format!("From: {}", header_value(from)));
    }
    lines.extend([
        "MIME-Version: 1.0".to_string(),
        format!("Content-Type: multipart/alternative; boundary=\"{}\"", boundary),
        String::new(),
        format!("--{}", boundary),
        "Content-Type: text/plain; charset=\"utf-8\"".to_string(),
        "Content-Transfer-Encoding: 7bit".to_string(),
        String::new(),
        TEXT_BODY.to_string(),
        String::new(),
        format!("--{}", boundary),
        "Content-Type: text/html; charset=\"utf-8\"".to_string(),
        "Content-Transfer-Encoding: base64".to_string(),
        String::new(),
    ]);
    lines.extend(wrap_base64(html.as_bytes()));
    lines.extend([String::new(), format!("--{}--", boundary), String::new()]);
    lines.join(CRLF)
}

/// 头部值去掉换行, 防止头部注入
fn header_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .collect()
}

/// 非 ASCII 头部使用 RFC 2047 编码字
fn encode_header(value: &str) -> String {
    let value = header_value(value);
    if value.is_ascii() {
        value
    } else {
        format!("=?utf-8?b?{}?=", STANDARD.encode(value.as_bytes()))
    }
}

fn wrap_base64(bytes: &[u8]) -> Vec<String> {
    let encoded = STANDARD.encode(bytes);
    encoded
        .as_bytes()
        .chunks(BASE64_LINE_LEN)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect()
}

fn write_draft(dir: &Path, path: &Path, message: &str) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(path, message)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
