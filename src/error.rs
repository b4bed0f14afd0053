//! Error types shared by the core data model and the assembly machinery.
use crate::mesh::CellType;
use std::fmt;
use std::panic::Location;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// The payload of an [`Error`].
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    InvalidFilename(PathBuf),
    SizeMismatch { expected: usize, got: usize },
    OutOfRange { index: usize, len: usize },
    InvalidCell { id: usize, cell_type: i32, order: usize },
    NegativeJacobian { cell: usize },
    InvalidFace { cell_type: CellType, face: i32 },
    UnsupportedGmshType { code: i32 },
    InvalidRegion { name: String },
    Parse { what: String },
    Partition { reason: String },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFilename(path) => write!(f, "Error opening file: {}", path.display()),
            Self::SizeMismatch { expected, got } => write!(f, "Expected size: {expected} / Got size: {got}"),
            Self::OutOfRange { index, len } => write!(f, "Index: {index} is out of range (length {len})"),
            Self::InvalidCell { id, cell_type, order } => {
                write!(f, "Cell {id} has invalid type ({cell_type}) or order ({order})")
            }
            Self::NegativeJacobian { cell } => write!(f, "Negative jacobian at cell: {cell}"),
            Self::InvalidFace { cell_type, face } => write!(f, "Invalid face index: {face} for {cell_type:?}"),
            Self::UnsupportedGmshType { code } => write!(f, "Unsupported Gmsh cell type: {code}"),
            Self::InvalidRegion { name } => write!(f, "Invalid region name: {name}"),
            Self::Parse { what } => write!(f, "Failed to parse {what}"),
            Self::Partition { reason } => write!(f, "Partitioning failed: {reason}"),
        }
    }
}

/// An error raised by `parfem`, tagged with the source location that raised it.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    location: &'static Location<'static>,
}

impl Error {
    #[track_caller]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            location: Location::caller(),
        }
    }

    #[track_caller]
    pub fn size_mismatch(expected: usize, got: usize) -> Self {
        Self::new(ErrorKind::SizeMismatch { expected, got })
    }

    #[track_caller]
    pub fn out_of_range(index: usize, len: usize) -> Self {
        Self::new(ErrorKind::OutOfRange { index, len })
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}:{}]", self.kind, self.location.file(), self.location.line())
    }
}

impl std::error::Error for Error {}

/// Fails with a size mismatch unless `got == expected`.
#[track_caller]
pub(crate) fn check_size(expected: usize, got: usize) -> Result<()> {
    if expected == got {
        Ok(())
    } else {
        Err(Error::size_mismatch(expected, got))
    }
}
