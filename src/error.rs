use std::fmt;
use std::io;
use std::path::PathBuf;

/// Everything that can go wrong outside the CPU loop itself: bad CLI
/// invocation, an image that can't be read or doesn't fit in memory, or a
/// lower-level I/O failure surfacing from the terminal/loader.
#[derive(Debug)]
pub enum VmError {
    /// No image path was given, or clap otherwise rejected the arguments.
    UsageError(String),
    /// An image file couldn't be opened, didn't have an even byte length, or
    /// ran past the end of addressable memory.
    LoadError { path: PathBuf, source: io::Error },
    /// Any other I/O failure (terminal mode, stdin/stdout).
    Io(io::Error),
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmError::UsageError(message) => write!(f, "{}", message),
            VmError::LoadError { path, .. } => {
                write!(f, "failed to load image: {}", path.display())
            }
            VmError::Io(source) => write!(f, "{}", source),
        }
    }
}

impl std::error::Error for VmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VmError::UsageError(_) => None,
            VmError::LoadError { source, .. } => Some(source),
            VmError::Io(source) => Some(source),
        }
    }
}

impl From<io::Error> for VmError {
    fn from(err: io::Error) -> Self {
        VmError::Io(err)
    }
}
