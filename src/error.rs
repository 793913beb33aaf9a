//! Error types returned by the loader and CLI configuration parser.

use std::io;
use std::path::PathBuf;

/// Failure modes while reading a program image into memory.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("could not read image {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("image {} is empty", path.display())]
    Empty { path: PathBuf },
}
