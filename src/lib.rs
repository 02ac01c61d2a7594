//! Core library for the `sshdfs` remote filesystem wrapper.
//!
//! The crate runs the distributed filesystem's command-line client on a
//! remote host over SSH, parses its fixed-column listing and usage tables
//! into typed records, and streams remote file contents into local files.

pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod label;
pub mod listing;
pub mod remote;
pub mod table;
pub mod test_support;
pub mod usage;

pub use client::{HdfsClient, SSH_FAILURE_STATUS};
pub use config::{ConfigLoadError, SshdfsConfig};
pub use error::HdfsError;
pub use fetch::{CHUNK_SIZE, CopyError, CopyStats, FetchSummary, copy_chunks};
pub use label::{Label, LabelInterner};
pub use listing::{DirectoryEntry, LISTING_SCHEMA, parse_listing};
pub use remote::{
    Channel, ChannelSource, ChannelStatus, CommandRunner, ProcessCommandRunner, RemoteInvocation,
    RemoteTarget, TransferMode,
};
pub use usage::{USAGE_SCHEMA, UsageRecord, parse_usage};
