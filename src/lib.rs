//! nfsstat exporter library
//!
//! This library turns the text output of the `nfsstat` utility into tagged
//! measurements. It is framework-agnostic: the host constructs a collector,
//! supplies an [`Accumulator`], and decides what to do with the results.
//!
//! # Usage
//!
//! ```rust,no_run
//! use nfsstat_exporter::{Collector, MemoryAccumulator, NfsStatCollector};
//!
//! let collector = NfsStatCollector::new("/usr/sbin/nfsstat");
//! let mut acc = MemoryAccumulator::new();
//!
//! let report = collector.gather(&mut acc);
//! println!("emitted {} measurements, skipped {} lines", report.emitted, report.skipped);
//!
//! for m in acc.measurements() {
//!     println!("{} {:?} = {}", m.name, m.tags, m.value);
//! }
//! ```

pub mod accumulator;
pub mod error;
pub mod nfsstat;

// Re-export main types for convenience
pub use accumulator::{Accumulator, Measurement, MemoryAccumulator, MetricValue, Tags};
pub use error::CollectError;
pub use nfsstat::{Collector, GatherReport, NfsStatCollector, ParsedLine, DEFAULT_NFSSTAT_BIN};
