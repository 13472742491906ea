use std::error::Error;
use std::fmt::{Display, Formatter};

pub type NurespResult<T> = Result<T, NurespError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NurespErrorCategory {
    InputValidationError,
    IoSystemError,
    ComputationError,
    InternalError,
}

impl NurespErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::ComputationError => 4,
            Self::InternalError => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::ComputationError => "ComputationError",
            Self::InternalError => "InternalError",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NurespError {
    category: NurespErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl NurespError {
    pub fn new(
        category: NurespErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            NurespErrorCategory::InputValidationError,
            placeholder,
            message,
        )
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(NurespErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn computation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(NurespErrorCategory::ComputationError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(NurespErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> NurespErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}

impl Display for NurespError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.as_str(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for NurespError {}

#[cfg(test)]
mod tests {
    use super::{NurespError, NurespErrorCategory};

    #[test]
    fn exit_mapping_is_stable() {
        let cases = [
            (NurespErrorCategory::InputValidationError, 2),
            (NurespErrorCategory::IoSystemError, 3),
            (NurespErrorCategory::ComputationError, 4),
            (NurespErrorCategory::InternalError, 5),
        ];

        for (category, exit_code) in cases {
            assert_eq!(category.exit_code(), exit_code);
        }
    }

    #[test]
    fn error_renders_diagnostic_lines() {
        let error = NurespError::input_validation(
            "INPUT.CONFIG_DETECTOR",
            "unsupported detector 'antares'",
        );

        assert_eq!(error.exit_code(), 2);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [INPUT.CONFIG_DETECTOR] unsupported detector 'antares'"
        );
        assert_eq!(error.fatal_exit_line(), "FATAL EXIT CODE: 2");
        assert_eq!(
            error.to_string(),
            "InputValidationError [INPUT.CONFIG_DETECTOR] unsupported detector 'antares'"
        );
    }
}
