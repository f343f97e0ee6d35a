use crate::utils::error::{LensError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(LensError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(LensError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(LensError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_file_extensions(
    field_name: &str,
    files: &[String],
    allowed_extensions: &[&str],
) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    for file in files {
        let extension = std::path::Path::new(file)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension {
            Some(ext) if allowed_set.contains(ext.as_str()) => {}
            Some(ext) => {
                return Err(LensError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.clone(),
                    reason: format!(
                        "Unsupported file extension: {}. Allowed extensions: {}",
                        ext,
                        allowed_extensions.join(", ")
                    ),
                });
            }
            None => {
                return Err(LensError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.clone(),
                    reason: "File has no extension or invalid filename".to_string(),
                });
            }
        }
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LensError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    // NaN 比較皆為 false，所以用反向條件
    if !(value >= min && value <= max) {
        return Err(LensError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 驗證選單範圍設定：有限數值、`min <= max`、`step > 0`
pub fn validate_power_bounds(field_name: &str, min: f64, max: f64, step: f64) -> Result<()> {
    if !(min.is_finite() && max.is_finite() && step.is_finite()) {
        return Err(LensError::ConfigValidationError {
            field: field_name.to_string(),
            message: "min, max and step must be finite numbers".to_string(),
        });
    }
    if min > max {
        return Err(LensError::ConfigValidationError {
            field: field_name.to_string(),
            message: format!("min ({}) must not exceed max ({})", min, max),
        });
    }
    if step <= 0.0 {
        return Err(LensError::ConfigValidationError {
            field: field_name.to_string(),
            message: format!("step must be positive, got {}", step),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("data_dir", "./data").is_ok());
        assert!(validate_path("data_dir", "").is_err());
        assert!(validate_path("data_dir", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("batch_size", 500, 1).is_ok());
        assert!(validate_positive_number("batch_size", 0, 1).is_err());
    }

    #[test]
    fn test_validate_file_extensions() {
        let files = vec!["stock.csv".to_string(), "STOCK.CSV".to_string()];
        assert!(validate_file_extensions("file", &files, &["csv"]).is_ok());

        let invalid_files = vec!["stock.xlsx".to_string()];
        assert!(validate_file_extensions("file", &invalid_files, &["csv"]).is_err());

        let no_extension = vec!["stock".to_string()];
        assert!(validate_file_extensions("file", &no_extension, &["csv"]).is_err());
    }

    #[test]
    fn test_validate_range_rejects_nan() {
        assert!(validate_range("discount", 15.0, 0.0, 100.0).is_ok());
        assert!(validate_range("discount", 100.5, 0.0, 100.0).is_err());
        assert!(validate_range("discount", f64::NAN, 0.0, 100.0).is_err());
    }

    #[test]
    fn test_validate_power_bounds() {
        assert!(validate_power_bounds("ranges.sph", -20.0, 20.0, 0.25).is_ok());
        assert!(validate_power_bounds("ranges.sph", 5.0, 1.0, 0.25).is_err());
        assert!(validate_power_bounds("ranges.sph", -1.0, 1.0, 0.0).is_err());
        assert!(validate_power_bounds("ranges.sph", f64::NAN, 1.0, 0.25).is_err());
    }
}
