use crate::err::decode_error::EngineError;

pub mod decode_error;

pub type CResult<T> = Result<T, EngineError>;
