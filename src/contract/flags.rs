// src/contract/flags.rs

//! Fixed-width bitset of sync task kinds.

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SyncError};

/// Number of task kinds. Widening the set means bumping this constant and
/// adding the new kind below `CREDIT_SYNC`, which always takes the top bit.
pub const TASK_BITS: u32 = 7;

/// Returns `true` if `value` is a valid raw task-flags integer, i.e. it lies
/// in `[0, 2^TASK_BITS)`.
pub fn is_valid_task_int(value: i64) -> bool {
    (0..(1i64 << TASK_BITS)).contains(&value)
}

/// Set of sync tasks, one bit per task kind.
///
/// Values are always within `[0, 2^TASK_BITS)`; raw integers coming from the
/// outside go through [`TaskFlags::new`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct TaskFlags(u32);

impl TaskFlags {
    pub const MENU_SYNC: TaskFlags = TaskFlags(1);
    pub const GROUP_DATA_MENU_SYNC: TaskFlags = TaskFlags(1 << 1);
    pub const REMAINING_TO_TAKE_SYNC: TaskFlags = TaskFlags(1 << 2);
    pub const REMAINING_TO_ORDER_SYNC: TaskFlags = TaskFlags(1 << 3);
    pub const ACTION_PRESENT_SYNC: TaskFlags = TaskFlags(1 << 4);
    pub const ACTION_HISTORY_SYNC: TaskFlags = TaskFlags(1 << 5);
    pub const CREDIT_SYNC: TaskFlags = TaskFlags(1 << (TASK_BITS - 1));

    /// Everything a first-seen portal gets synced.
    pub const FULL_MENU: TaskFlags = TaskFlags(
        Self::MENU_SYNC.0
            | Self::GROUP_DATA_MENU_SYNC.0
            | Self::REMAINING_TO_TAKE_SYNC.0
            | Self::REMAINING_TO_ORDER_SYNC.0,
    );

    /// Per-credential action tasks, owed by every row.
    pub const ACTIONS: TaskFlags =
        TaskFlags(Self::ACTION_PRESENT_SYNC.0 | Self::ACTION_HISTORY_SYNC.0);

    const NAMED: [(&'static str, TaskFlags); 7] = [
        ("menu", Self::MENU_SYNC),
        ("group_menu", Self::GROUP_DATA_MENU_SYNC),
        ("remaining_to_take", Self::REMAINING_TO_TAKE_SYNC),
        ("remaining_to_order", Self::REMAINING_TO_ORDER_SYNC),
        ("action_present", Self::ACTION_PRESENT_SYNC),
        ("action_history", Self::ACTION_HISTORY_SYNC),
        ("credit", Self::CREDIT_SYNC),
    ];

    /// Validate a raw integer coming from a request or the wire.
    pub fn new(raw: i64) -> Result<Self> {
        if is_valid_task_int(raw) {
            Ok(TaskFlags(raw as u32))
        } else {
            Err(SyncError::InvalidTaskFlags(raw))
        }
    }

    pub const fn empty() -> Self {
        TaskFlags(0)
    }

    pub const fn all() -> Self {
        TaskFlags((1 << TASK_BITS) - 1)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// `true` if every bit of `other` is set in `self`.
    pub const fn contains(self, other: TaskFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: TaskFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn difference(self, other: TaskFlags) -> TaskFlags {
        TaskFlags(self.0 & !other.0)
    }

    /// Decompose into single-bit flags, lowest bit first.
    pub fn iter(self) -> impl Iterator<Item = TaskFlags> {
        (0..TASK_BITS)
            .map(|i| TaskFlags(1 << i))
            .filter(move |bit| self.contains(*bit))
    }

    /// Parse a list of task names (`"menu"`, `"credit"`, ...) into one set.
    pub fn parse_names<S: AsRef<str>>(names: &[S]) -> std::result::Result<Self, String> {
        let mut flags = TaskFlags::empty();
        for name in names {
            flags |= name.as_ref().parse::<TaskFlags>()?;
        }
        Ok(flags)
    }

    fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
            .collect()
    }
}

impl TryFrom<i64> for TaskFlags {
    type Error = SyncError;

    fn try_from(raw: i64) -> Result<Self> {
        TaskFlags::new(raw)
    }
}

impl From<TaskFlags> for u32 {
    fn from(flags: TaskFlags) -> u32 {
        flags.0
    }
}

impl FromStr for TaskFlags {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Self::NAMED
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, flag)| *flag)
            .ok_or_else(|| format!("unknown sync task: {key}"))
    }
}

impl BitOr for TaskFlags {
    type Output = TaskFlags;

    fn bitor(self, rhs: TaskFlags) -> TaskFlags {
        TaskFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for TaskFlags {
    fn bitor_assign(&mut self, rhs: TaskFlags) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for TaskFlags {
    type Output = TaskFlags;

    fn bitand(self, rhs: TaskFlags) -> TaskFlags {
        TaskFlags(self.0 & rhs.0)
    }
}

impl BitAndAssign for TaskFlags {
    fn bitand_assign(&mut self, rhs: TaskFlags) {
        self.0 &= rhs.0;
    }
}

/// Complement within the valid width.
impl Not for TaskFlags {
    type Output = TaskFlags;

    fn not(self) -> TaskFlags {
        TaskFlags(!self.0 & TaskFlags::all().0)
    }
}

impl FromIterator<TaskFlags> for TaskFlags {
    fn from_iter<I: IntoIterator<Item = TaskFlags>>(iter: I) -> Self {
        iter.into_iter().fold(TaskFlags::empty(), |acc, f| acc | f)
    }
}

impl fmt::Display for TaskFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        f.write_str(&self.names().join("|"))
    }
}

impl fmt::Debug for TaskFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskFlags({self})")
    }
}
