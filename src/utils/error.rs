use thiserror::Error;

#[derive(Error, Debug)]
pub enum LensError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid {field} power: '{value}'")]
    InvalidPowerError { field: String, value: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Repository error: {message}")]
    RepositoryError { message: String },
}

/// 錯誤分類，用於日誌與退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Data,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LensError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LensError::ConfigError { .. }
            | LensError::InvalidConfigValueError { .. }
            | LensError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            LensError::InvalidPowerError { .. } | LensError::ValidationError { .. } => {
                ErrorCategory::Input
            }
            LensError::CsvError(_) | LensError::SerializationError(_) => ErrorCategory::Data,
            LensError::IoError(_) | LensError::RepositoryError { .. } => ErrorCategory::Storage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    /// 給終端使用者看的訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            LensError::InvalidPowerError { field, .. } => {
                format!("Please enter a valid {} value", field)
            }
            LensError::ValidationError { message } => message.clone(),
            LensError::CsvError(e) => format!("The CSV file could not be read: {}", e),
            LensError::IoError(e) => format!("File access failed: {}", e),
            LensError::RepositoryError { .. } => "Lens inventory is unavailable".to_string(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => "檢查 --config 檔案與命令列參數",
            ErrorCategory::Input => "SPH / CYL 請輸入數字，例如 -1.25 或 +0.50",
            ErrorCategory::Data => "確認 CSV 標題列包含 QRCODE、SPH、CYL 欄位",
            ErrorCategory::Storage => "確認資料目錄存在且可寫入",
        }
    }
}

pub type Result<T> = std::result::Result<T, LensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_power_message() {
        let err = LensError::InvalidPowerError {
            field: "SPH".to_string(),
            value: "abc".to_string(),
        };
        assert_eq!(err.user_friendly_message(), "Please enter a valid SPH value");
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_storage_errors_are_critical() {
        let err = LensError::IoError(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }
}
