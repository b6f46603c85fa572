use std::any::type_name;

/// Errors produced while fetching or decoding an asset.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("cannot load an asset from an empty path")]
    EmptyPath,
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("request for {url} failed: {message}")]
    Request { url: String, message: String },
    #[error("HTTP {status} when requesting {url}")]
    Http { url: String, status: u16 },
    #[error("glTF parse error in {path}: {message}")]
    GltfParse { path: String, message: String },
    #[error("{path} contains no scene")]
    EmptyScene { path: String },
    #[error("asset {path} not found")]
    NotFound { path: String },
    #[error("load ticket {0} is unknown or was already consumed")]
    UnknownTicket(u64),
    #[error("load ticket {id} does not hold a {expected}")]
    TypeMismatch { id: u64, expected: &'static str },
}

impl AssetError {
    pub(crate) fn type_mismatch<T>(id: u64) -> Self {
        Self::TypeMismatch {
            id,
            expected: type_name::<T>(),
        }
    }
}
