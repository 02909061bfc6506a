//! Error types for synthkit.
//!
//! Every failure is detected while configuring or starting the engine.
//! Once `Engine::start` succeeds, sample production cannot fail.

use std::ops::Range;

use ariadne::{Config, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::config::SynthType;
use crate::token::Span;

/// Result type alias for synthkit operations.
pub type Result<T> = std::result::Result<T, SynthError>;

/// Top-level error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The pluck delay line would hold no samples at all.
    #[error("degenerate pluck geometry: {frequency} Hz at {sample_rate} Hz gives an empty delay line")]
    DegenerateGeometry { frequency: f64, sample_rate: f64 },

    #[error("lexer error: {0}")]
    Lex(#[from] LexError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("wav encoding failed: {0}")]
    Wav(String),
}

/// Invalid channel or engine configuration. Always fatal for that configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("parameter `{name}` = {value} is outside [{min}, {max}]")]
    ParameterOutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("can't sweep {0:?}: only tonal types sweep")]
    SweepNotSupported(SynthType),

    #[error("exponential sweep needs non-zero endpoints, got {from} Hz to {to} Hz")]
    ZeroExponentialEndpoint { from: f64, to: f64 },

    #[error("duration must be given when sweeping to a second frequency")]
    SweepWithoutDuration,

    #[error("invalid frequency {0} Hz")]
    InvalidFrequency(f64),

    #[error("pluck frequency {0} Hz is outside [27.5, 4220]")]
    PluckFrequency(f64),

    #[error("sample rate for pluck must be 44100-48000, got {0}; resample first")]
    PluckSampleRate(f64),

    #[error("trapezium needs p1 <= p2 <= p3, got {p1}, {p2}, {p3}")]
    TrapeziumOrder { p1: f64, p2: f64, p3: f64 },

    #[error("invalid sample rate {0}")]
    InvalidSampleRate(f64),

    #[error("channel count must be at least 1")]
    NoChannels,
}

/// Tokenizer failures on a synth argument line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at pos {pos}")]
    UnexpectedChar { ch: char, pos: usize },
}

/// Structural failures on a synth argument line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unknown option `{text}`")]
    UnknownOption { text: String, span: Span },

    #[error("no type given, found `{found}`")]
    NoTypeGiven { found: String, span: Span },

    #[error("parameter error: `{text}` must be within [{min}, {max}]")]
    Parameter {
        text: String,
        min: f64,
        max: f64,
        span: Span,
    },

    #[error("invalid length `{text}`")]
    InvalidLength { text: String, span: Span },

    #[error("invalid frequency `{text}`")]
    InvalidFrequency { text: String, span: Span },

    #[error("frequency: invalid trailing character in `{text}`")]
    TrailingCharacter { text: String, span: Span },

    #[error("duration must be given when using freq2")]
    SweepWithoutDuration { span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnknownOption { span, .. }
            | ParseError::NoTypeGiven { span, .. }
            | ParseError::Parameter { span, .. }
            | ParseError::InvalidLength { span, .. }
            | ParseError::InvalidFrequency { span, .. }
            | ParseError::TrailingCharacter { span, .. }
            | ParseError::SweepWithoutDuration { span } => *span,
        }
    }
}

const SOURCE_ID: &str = "synth";

impl SynthError {
    /// Byte range in the argument line this error points at, if any.
    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            SynthError::Lex(LexError::UnexpectedChar { pos, ch }) => {
                Some(*pos..*pos + ch.len_utf8())
            }
            SynthError::Parse(e) => {
                let span = e.span();
                Some(span.start..span.end)
            }
            SynthError::Config(_) | SynthError::DegenerateGeometry { .. } | SynthError::Wav(_) => {
                None
            }
        }
    }

    /// Render a plain-text diagnostic for this error against the argument
    /// line it came from.
    pub fn report(&self, source: &str) -> String {
        let Some(range) = self.span() else {
            return format!("Error: {self}");
        };
        let mut out = Vec::new();
        let written = Report::build(ReportKind::Error, (SOURCE_ID, range.clone()))
            .with_config(Config::default().with_color(false))
            .with_message(self.to_string())
            .with_label(Label::new((SOURCE_ID, range)).with_message("here"))
            .finish()
            .write((SOURCE_ID, Source::from(source)), &mut out);
        match written {
            Ok(()) => String::from_utf8_lossy(&out).into_owned(),
            Err(_) => format!("Error: {self}"),
        }
    }
}
