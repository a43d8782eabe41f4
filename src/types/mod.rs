//! Core types for decoded link data.
//!
//! - [`Packet`] is one idle-gap-delimited burst of bytes from the transport
//! - [`LinkMode`] is the classifier's belief about the protocol in use
//! - [`Record`] is a decoded frame: [`CtgRecord`] or [`TemperatureRecord`]
//! - [`CtgStatus`], [`HrMode`] and [`TocoMode`] expose the bit-packed status fields
//! - [`TextLine`] is one line of text telemetry with its `key:value` pairs
//!
//! ## Usage Example
//!
//! ```rust
//! use ctglink::types::{CtgStatus, HrMode, HrSource, ctg_flags};
//!
//! let status = CtgStatus::new(ctg_flags::status::MONITOR_ON | ctg_flags::status::FMP_ENABLED);
//! assert!(status.monitor_on());
//! assert!(status.fmp_enabled());
//! assert!(!status.telemetry_on());
//!
//! let mode = HrMode(0x0821);
//! assert_eq!(mode.hr1_source(), HrSource::Ultrasound);
//! assert_eq!(mode.hr2_source(), HrSource::Decg);
//! assert!(mode.mhr_inop());
//! ```

pub mod ctg_flags;
mod mode;
mod packet;
mod record;
mod status;
mod text;

pub use mode::LinkMode;
pub use packet::Packet;
pub use record::{CtgRecord, FrameKind, Record, SAMPLES_PER_FRAME, TemperatureRecord};
pub use status::{CtgStatus, HrMode, HrSource, StatusReport, TocoMode, TocoSource};
pub use text::{TextLine, parse_fields};
