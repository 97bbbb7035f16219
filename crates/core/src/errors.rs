use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MiningError {
    #[error("malformed input at row {row}: {reason}")]
    MalformedInput { row: usize, reason: String },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("inconsistent itemset table: support for {missing} is missing while expanding {itemset}")]
    InconsistentTable { itemset: String, missing: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Mining(#[from] MiningError),
    #[error("input failure: {0}")]
    Input(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl MiningError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::MalformedInput { .. } => "malformed_input",
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::InconsistentTable { .. } => "inconsistent_table",
        }
    }
}

impl ApplicationError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Mining(error) => error.error_class(),
            Self::Input(_) => "input",
            Self::Configuration(_) => "config_validation",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::Mining(_) | Self::Input(_) => 3,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Mining(MiningError::MalformedInput { .. }) | Self::Input(_) => {
                "The transaction input could not be read. Check the file and try again."
            }
            Self::Mining(MiningError::InvalidParameter(_)) | Self::Configuration(_) => {
                "A mining parameter is out of range. Check the configuration."
            }
            Self::Mining(MiningError::InconsistentTable { .. }) => {
                "An unexpected internal error occurred."
            }
        }
    }
}
