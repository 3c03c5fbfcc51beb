//! Error types for the fingerboard library.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Pipeline stage an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Decode,
    Encode,
    Output,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Config => "configuration",
            Self::Decode => "decode",
            Self::Encode => "encode",
            Self::Output => "output",
        };
        f.write_str(name)
    }
}

/// Library error type. Every variant is fatal for the pipeline run;
/// recoverable per-note anomalies are logged by the decoder instead.
#[derive(Debug, thiserror::Error)]
pub enum FingerboardError {
    /// The score document does not exist
    #[error("score document not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    /// The document is not well-formed XML
    #[error("malformed XML: {0}")]
    MalformedXml(String),

    /// A compressed .mxl container could not be read
    #[error("invalid MXL archive: {0}")]
    Archive(String),

    /// No `<divisions>` element, or an empty one
    #[error("score has no <divisions> element")]
    MissingDivisions,

    /// `<divisions>` is present but not a positive number
    #[error("invalid <divisions> value '{0}'")]
    InvalidDivisions(String),

    /// `<divisions>` is zero
    #[error("<divisions> must not be zero")]
    ZeroDivisions,

    /// A tempo marking is present but not a positive number
    #[error("invalid tempo '{0}'")]
    InvalidTempo(String),

    /// Invalid rendering or encoding options
    #[error("configuration error: {0}")]
    Config(String),

    /// The video encoder failed
    #[error("video encoding failed: {context}")]
    VideoEncoding {
        context: String,
        #[source]
        source: Option<io::Error>,
    },

    /// The timeline could not be serialized
    #[error("cannot serialize timeline: {0}")]
    Serialization(String),

    /// A side output such as the timeline dump could not be written
    #[error("cannot write {}: {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O error while reading input
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, FingerboardError>;

impl FingerboardError {
    /// The pipeline stage that failed.
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Config(_) => Stage::Config,
            Self::VideoEncoding { .. } => Stage::Encode,
            Self::Serialization(_) | Self::OutputWrite { .. } => Stage::Output,
            Self::DocumentNotFound(_)
            | Self::MalformedXml(_)
            | Self::Archive(_)
            | Self::MissingDivisions
            | Self::InvalidDivisions(_)
            | Self::ZeroDivisions
            | Self::InvalidTempo(_)
            | Self::Io(_) => Stage::Decode,
        }
    }

    pub(crate) fn encoding(context: impl Into<String>, source: Option<io::Error>) -> Self {
        Self::VideoEncoding {
            context: context.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages() {
        assert_eq!(FingerboardError::ZeroDivisions.stage(), Stage::Decode);
        assert_eq!(FingerboardError::Config("fps".into()).stage(), Stage::Config);
        let err = FingerboardError::encoding("ffmpeg exited", None);
        assert_eq!(err.stage(), Stage::Encode);
        assert_eq!(format!("{} failed: {err}", err.stage()), "encode failed: video encoding failed: ffmpeg exited");
        let err = FingerboardError::OutputWrite {
            path: PathBuf::from("/ro/timeline.json"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.stage(), Stage::Output);
        assert!(format!("{} failed: {err}", err.stage()).starts_with("output failed: cannot write /ro/timeline.json"));
    }
}
