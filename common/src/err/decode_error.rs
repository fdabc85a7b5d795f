use std::fmt::Display;
use std::{fmt, io};
use std::num::ParseIntError;
use std::str::Utf8Error;
use std::string::FromUtf8Error;

/// Wire-level code for an unsupported scan pushdown, rendered verbatim in
/// `Display` so callers can match on message prefix if they must.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanErrorCode {
    FilterFieldUnsupported,
    FilterOperatorUnsupported,
    FilterOperatorOnField,
    OrderByField,
    OrderByOrderField,
    OrderByOrder,
}

impl Display for ScanErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            ScanErrorCode::FilterFieldUnsupported => "filter: field not supported for filtering",
            ScanErrorCode::FilterOperatorUnsupported => "filter: operator not supported for filtering",
            ScanErrorCode::FilterOperatorOnField => "filter: operator not supported on field",
            ScanErrorCode::OrderByField => "order_by: ordering not supported on field",
            ScanErrorCode::OrderByOrderField => "order_by: [asc|desc] not supported on field",
            ScanErrorCode::OrderByOrder => "order_by: [asc|desc] generally unsupported",
        };
        write!(f, "{}", msg)
    }
}

/// A back-end's refusal of a filter or order pushdown (spec §3, §6).
#[derive(Debug, Clone)]
pub struct ScanError {
    pub code: ScanErrorCode,
    pub operator: String,
    pub field_index: usize,
    pub field_name: Option<String>,
}

impl Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let field = self
            .field_name
            .clone()
            .unwrap_or_else(|| format!("${}", self.field_index));
        write!(f, "{}: {} {}", self.code, self.operator, field)
    }
}

#[derive(Debug)]
pub enum EngineError {
    //////////////////////
    // Common
    //////////////////////
    /// 一定不会出现的异常。如果出现，一定是BUG
    BUG(String),
    /// Recoverable, user-facing error with a plain message.
    Error(String),

    //////////////////////
    // SQL compile errors (§7.1)
    //////////////////////
    ParserError(String),
    UnknownTable(String),
    UnknownColumn(String),
    Unsupported(String),
    NotUpdatable(String),
    Assignment { from: String, to: String },

    //////////////////////
    // Pushdown errors (§7.2)
    //////////////////////
    Pushdown(ScanError),

    //////////////////////
    // Execution errors (§7.3)
    //////////////////////
    DuplicateKey(String),
    Codec(String),
    Store(String),

    //////////////////////
    // IO / parsing plumbing
    //////////////////////
    IoError(io::Error),
    Utf8Error(Utf8Error),
    FromUtf8Error(FromUtf8Error),
    ParseIntError(ParseIntError),
    ConfigFileParseErr(String),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> fmt::Result {
        match self {
            EngineError::BUG(s)
            | EngineError::Error(s)
            | EngineError::ParserError(s)
            | EngineError::UnknownTable(s)
            | EngineError::UnknownColumn(s)
            | EngineError::Unsupported(s)
            | EngineError::NotUpdatable(s)
            | EngineError::DuplicateKey(s)
            | EngineError::Codec(s)
            | EngineError::Store(s)
            | EngineError::ConfigFileParseErr(s) => {
                write!(f, "{}", s)
            }
            EngineError::Assignment { from, to } => {
                write!(f, "cannot assign {} into {} cell", from, to)
            }
            EngineError::Pushdown(e) => write!(f, "{}", e),
            EngineError::IoError(err) => write!(f, "{}", err),
            EngineError::Utf8Error(err) => write!(f, "{}", err),
            EngineError::FromUtf8Error(err) => write!(f, "{}", err),
            EngineError::ParseIntError(err) => write!(f, "{}", err),
        }
    }
}

impl From<io::Error> for EngineError {
    fn from(error: io::Error) -> Self {
        EngineError::IoError(error)
    }
}

impl From<Utf8Error> for EngineError {
    fn from(error: Utf8Error) -> Self {
        EngineError::Utf8Error(error)
    }
}

impl From<FromUtf8Error> for EngineError {
    fn from(error: FromUtf8Error) -> Self {
        EngineError::FromUtf8Error(error)
    }
}

impl From<ParseIntError> for EngineError {
    fn from(error: ParseIntError) -> Self {
        EngineError::ParseIntError(error)
    }
}

impl From<ScanError> for EngineError {
    fn from(error: ScanError) -> Self {
        EngineError::Pushdown(error)
    }
}

impl From<sqlparser::parser::ParserError> for EngineError {
    fn from(error: sqlparser::parser::ParserError) -> Self {
        EngineError::ParserError(error.to_string())
    }
}

impl From<sled::Error> for EngineError {
    fn from(error: sled::Error) -> Self {
        EngineError::Store(error.to_string())
    }
}
