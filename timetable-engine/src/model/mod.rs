//! The journey pattern model.
//!
//! Static, parse-time entities: stops visited through chains of timing
//! links, grouped into journey patterns, and the vehicle journeys that run
//! along them. Nothing here changes once the document is built.

mod document;
mod error;
mod journey;
mod pattern;
mod resolve;

pub use document::{Document, DocumentError};
pub use error::{JourneyDiagnostic, ModelError};
pub use journey::{JourneySource, LinkOverride, VehicleJourney};
pub use pattern::{Activity, Direction, JourneyPattern, StopUsage, TimingLink, TimingStatus};
pub use resolve::{Resolution, ResolvedJourney, resolve_journeys};
