use thiserror::Error;
use wess_engine::EngineError;

#[derive(Debug, Error)]
pub enum MasterError {
    #[error("config I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialize: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("config field {field} out of range: {value}")]
    OutOfRange { field: &'static str, value: u32 },
    #[error(transparent)]
    Engine(#[from] EngineError),
}
