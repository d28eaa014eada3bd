//! Output encodings for projected documents.

pub mod cbor;
pub mod toml;

/// Output format selected with `-t`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// Pretty-printed JSON.
    Json,
    /// JSON on a single line.
    Compact,
    Cbor,
    /// CBOR diagnostic notation.
    Diag,
    Toml,
}

impl Format {
    pub fn from_name(name: &str) -> Option<Format> {
        match name {
            "json" => Some(Format::Json),
            "compact" => Some(Format::Compact),
            "cbor" => Some(Format::Cbor),
            "diag" => Some(Format::Diag),
            "toml" => Some(Format::Toml),
            _ => None,
        }
    }

    pub fn is_binary(self) -> bool {
        self == Format::Cbor
    }
}
