use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// 問い合わせの対応状況
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContactStatus {
    #[default]
    New,
    InProgress,
    Completed,
}

#[derive(Debug, thiserror::Error)]
#[error("未知の問い合わせステータス: {0}")]
pub struct UnknownContactStatus(pub String);

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }
}

impl TryFrom<String> for ContactStatus {
    type Error = UnknownContactStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "new" => Ok(Self::New),
            "in-progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(UnknownContactStatus(value)),
        }
    }
}

/// お問い合わせフォームの送信内容
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub phone: String,
    pub service: String,
    pub address: String,
    #[sqlx(try_from = "String")]
    pub status: ContactStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}
