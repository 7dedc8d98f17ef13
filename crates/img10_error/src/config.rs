//! Configuration error types.

/// Configuration that could not be loaded or that the pipeline cannot run with.
#[derive(Debug, Clone, derive_more::Error)]
pub struct ConfigError {
    /// Offending setting, when a single one is at fault
    pub setting: Option<&'static str>,
    /// What is wrong
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Configuration could not be read or parsed.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            setting: None,
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }

    /// A setting holds a value the pipeline rejects.
    ///
    /// # Examples
    ///
    /// ```
    /// use img10_error::ConfigError;
    ///
    /// let err = ConfigError::invalid("max_upload_bytes", "must be positive");
    /// assert_eq!(err.setting, Some("max_upload_bytes"));
    /// assert!(err.to_string().starts_with("Invalid setting max_upload_bytes: must be positive"));
    /// ```
    #[track_caller]
    pub fn invalid(setting: &'static str, message: impl Into<String>) -> Self {
        Self {
            setting: Some(setting),
            ..Self::new(message)
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.setting {
            Some(setting) => write!(f, "Invalid setting {}: {}", setting, self.message)?,
            None => write!(f, "Configuration Error: {}", self.message)?,
        }
        write!(f, " at line {} in {}", self.line, self.file)
    }
}
