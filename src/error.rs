use thiserror::Error;

pub type Result<T> = std::result::Result<T, QubError>;

#[derive(Error, Debug)]
pub enum QubError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Short read at offset {offset}: expected {requested} bytes, got {actual}")]
    ShortRead {
        offset: u64,
        requested: usize,
        actual: usize,
    },

    #[error("Malformed volume header: need 52 bytes, got {len}")]
    MalformedHeader { len: usize },

    #[error("Malformed directory record: need 64 bytes, got {len}")]
    MalformedRecord { len: usize },

    #[error("Invalid volume geometry: {0}")]
    InvalidGeometry(String),

    #[error("Failed to find directory (file {file_number}) in this image")]
    DirectoryNotFound { file_number: u16 },

    #[error("File not found: {name}")]
    FileNotFound { name: String },

    #[error("File {file_number} owns no blocks")]
    EmptyChain { file_number: u16 },

    #[error("File {file_number} has no block at chain position {position}")]
    ChainGap { file_number: u16, position: u16 },

    #[error("File {file_number} needs {needed_blocks} blocks but its chain has {chain_blocks}")]
    TruncatedFile {
        file_number: u16,
        needed_blocks: usize,
        chain_blocks: usize,
    },
}

impl QubError {
    /// Lookup failures that are reported to the user rather than treated as I/O faults.
    pub fn is_logic_error(&self) -> bool {
        matches!(
            self,
            QubError::DirectoryNotFound { .. }
                | QubError::FileNotFound { .. }
                | QubError::EmptyChain { .. }
        )
    }
}
