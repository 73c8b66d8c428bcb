use serde::Serialize;

use super::domain::Language;

/// Collaborator failures that are reported to the user without failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    AdvisorUnavailable,
    RenderFailed,
    DeliveryFailed,
    LogFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, language: Language) -> Self {
        Self {
            kind,
            message: message(kind, language).to_string(),
        }
    }
}

fn message(kind: NoticeKind, language: Language) -> &'static str {
    match (language, kind) {
        (Language::English, NoticeKind::AdvisorUnavailable) => {
            "The advisor is unavailable right now. Please try again later."
        }
        (Language::English, NoticeKind::RenderFailed) => {
            "Your score is ready, but the PDF report could not be generated."
        }
        (Language::English, NoticeKind::DeliveryFailed) => {
            "Your score is ready, but the report e-mail could not be sent."
        }
        (Language::English, NoticeKind::LogFailed) => {
            "Your score is ready, but it could not be recorded in the shared log."
        }
        (Language::Japanese, NoticeKind::AdvisorUnavailable) => {
            "現在アドバイザーを利用できません。しばらくしてから再度お試しください。"
        }
        (Language::Japanese, NoticeKind::RenderFailed) => {
            "スコアは算出されましたが、PDFレポートを作成できませんでした。"
        }
        (Language::Japanese, NoticeKind::DeliveryFailed) => {
            "スコアは算出されましたが、レポートのメールを送信できませんでした。"
        }
        (Language::Japanese, NoticeKind::LogFailed) => {
            "スコアは算出されましたが、共有ログに記録できませんでした。"
        }
    }
}
