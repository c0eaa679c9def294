//! Domain types for ScoreLab

pub mod bar;
pub mod ids;
pub mod instrument;
pub mod series;

pub use bar::{Bar, BarError};
pub use ids::{ConfigHash, FrameDigest};
pub use instrument::Instrument;
pub use series::{BarSeries, SeriesError};
