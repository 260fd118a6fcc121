use thiserror::Error;

/// Failure reported by the ERP automation layer
#[derive(Debug, Error)]
pub enum ErpError {
    /// COM call failed; `member` is the Sfera property or method
    #[error("COM call `{member}` failed (HRESULT {hresult:#010x}): {message}")]
    Com {
        member: String,
        hresult: i32,
        message: String,
    },

    #[error("unexpected value for `{member}`: {detail}")]
    Conversion { member: String, detail: String },

    #[error("query returned an unusable row: {0}")]
    Row(#[from] serde_json::Error),

    #[error("Sfera automation is only available on Windows")]
    Unsupported,
}

impl ErpError {
    pub fn conversion(member: &str, detail: impl Into<String>) -> Self {
        Self::Conversion {
            member: member.to_string(),
            detail: detail.into(),
        }
    }
}
