//! Core library for drive-archiver.
//!
//! Two cancellable, progress-reporting stages over a remote file store:
//! [`scan::ScanTask`] discovers files matching a [`config::RuleSet`], and
//! [`archive::ArchiveTask`] transfers a chosen subset into a deterministic
//! local folder layout, verifying each transfer and optionally trashing the
//! remote original. Both stages talk to the outside world only through the
//! [`contract`] traits, so they run identically against the real Drive API
//! ([`drive::DriveClient`]) and against mocks in tests.

pub mod archive;
pub mod classify;
pub mod cli;
pub mod config;
pub mod contract;
pub mod drive;
pub mod eligibility;
pub mod load_config;
pub mod organize;
pub mod scan;
pub mod store;
pub mod task;
