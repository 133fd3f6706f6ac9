use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    /// The CSV does not match what the chart expects (missing column,
    /// unparseable date or number, dates out of order).
    #[error("data format error at line {line}: {message}")]
    DataFormat { line: u64, message: String },

    #[error("unknown series: {0}")]
    UnknownSeries(String),

    #[error("unknown variant: {0}")]
    UnknownVariant(String),

    #[error("chart data has not been loaded")]
    NotLoaded,
}

impl ChartError {
    pub fn data_format(line: u64, message: impl Into<String>) -> Self {
        Self::DataFormat {
            line,
            message: message.into(),
        }
    }
}

/// An element the renderer writes to is absent from the host page.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("render target missing: #{0}")]
pub struct TargetMissing(pub String);
