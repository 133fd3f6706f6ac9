//! Configuration-driven time-series charts.
//!
//! Each chart is described by a [`ChartSpec`] (columns, domains, canvas
//! sizes, sentinels) and drawn from a [`Dataset`] by a [`ChartSession`],
//! which owns the per-page state: breakpoint, selection and tooltip cursor.

pub mod data;
pub mod error;
pub mod path;
pub mod render;
pub mod scale;
pub mod selection;
pub mod session;
pub mod spec;
pub mod target;

pub use data::Dataset;
pub use error::{ChartError, TargetMissing};
pub use render::Breakpoint;
pub use selection::Selection;
pub use session::{ChartSession, Phase};
pub use spec::{ChartCatalog, ChartSpec};
pub use target::{PageTarget, RenderTarget};
