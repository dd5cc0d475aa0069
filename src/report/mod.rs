// ==========================================
// 船舶库存合规系统 - 报告层
// ==========================================
// 职责: HTML 报告渲染与写出, .eml 邮件草稿
// 输出: output/reports/, output/emails/
// ==========================================

pub mod email_draft;
pub mod error;
pub mod html;
pub mod writer;

pub use email_draft::{
    DraftEmail, DraftIssue, DraftLevel, DraftingResult, EmailDraftOptions, EmailDrafter,
};
pub use error::{ReportError, ReportResult};
pub use html::{escape_html, render_run_summary, render_vessel_report};
pub use writer::{ReportOutput, ReportWriter};
