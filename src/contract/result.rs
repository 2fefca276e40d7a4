// src/contract/result.rs

//! Result vocabulary shared by plugins and the coordinator.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SyncError};

/// Outcome of one sync task, compared by its numeric code.
///
/// The codes are part of the plugin contract and "worst" always means the
/// highest code. `NotSupported` (100) therefore ranks below `Ok` (200): a
/// pass where nothing was supported is reported as such only when nothing
/// else happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum SyncResult {
    NotSupported = 100,
    Ok = 200,
    PortalTemporarilyInaccessible = 300,
    IoException = 350,
    WrongCredentials = 400,
    UnknownPortalFormat = 500,
    /// Synthesized by the coordinator only.
    PluginTimeout = 600,
}

impl SyncResult {
    pub const fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            100 => Ok(SyncResult::NotSupported),
            200 => Ok(SyncResult::Ok),
            300 => Ok(SyncResult::PortalTemporarilyInaccessible),
            350 => Ok(SyncResult::IoException),
            400 => Ok(SyncResult::WrongCredentials),
            500 => Ok(SyncResult::UnknownPortalFormat),
            600 => Ok(SyncResult::PluginTimeout),
            other => Err(SyncError::UnknownResultCode(other)),
        }
    }

    /// Worst result of a set, `NotSupported` for an empty one.
    pub fn worst_of<I: IntoIterator<Item = SyncResult>>(results: I) -> SyncResult {
        results
            .into_iter()
            .fold(SyncResult::NotSupported, SyncResult::max)
    }

    /// The portal could not be reached at all, so local state must not be
    /// reconciled against it.
    pub fn is_connection_failure(self) -> bool {
        matches!(
            self,
            SyncResult::IoException | SyncResult::PortalTemporarilyInaccessible
        )
    }
}

impl PartialOrd for SyncResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SyncResult {
    fn cmp(&self, other: &Self) -> Ordering {
        self.code().cmp(&other.code())
    }
}

impl TryFrom<i32> for SyncResult {
    type Error = SyncError;

    fn try_from(code: i32) -> Result<Self> {
        SyncResult::from_code(code)
    }
}

impl From<SyncResult> for i32 {
    fn from(result: SyncResult) -> i32 {
        result.code()
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SyncResult::NotSupported => "nothing supported",
            SyncResult::Ok => "ok",
            SyncResult::PortalTemporarilyInaccessible => "portal temporarily inaccessible",
            SyncResult::IoException => "I/O error",
            SyncResult::WrongCredentials => "wrong credentials",
            SyncResult::UnknownPortalFormat => "unknown portal format",
            SyncResult::PluginTimeout => "plugin timeout",
        };
        write!(f, "{text} ({})", self.code())
    }
}

/// Answer of the portal-test side channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestResult {
    #[default]
    Ok,
    InvalidData,
}

impl TestResult {
    pub const fn code(self) -> i32 {
        match self {
            TestResult::Ok => 0,
            TestResult::InvalidData => 1,
        }
    }
}
