use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::contract::TaskFlags;

/// Database id of a portal (one canteen web system).
pub type PortalId = i64;
/// Database id of a credential (a portal login).
pub type CredentialId = i64;
/// Database id of the group a credential belongs to.
pub type CredentialGroupId = i64;
/// Database id of an application user.
pub type UserId = i64;
/// Identifier a plugin is registered and addressed under.
pub type PluginId = String;

/// Kind of sync pass requested from the coordinator.
///
/// - `Full`: everything every portal can do (default).
/// - `Changes`: only what changes after the user edits orders
///   (present actions and credit).
/// - `Remaining`: remaining portions and credit of a single user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    #[default]
    Full,
    Changes,
    Remaining,
}

impl SyncAction {
    /// Task filter used when no override is configured.
    pub fn default_filter(self) -> TaskFlags {
        match self {
            SyncAction::Full => TaskFlags::all(),
            SyncAction::Changes => TaskFlags::ACTION_PRESENT_SYNC | TaskFlags::CREDIT_SYNC,
            SyncAction::Remaining => {
                TaskFlags::REMAINING_TO_ORDER_SYNC
                    | TaskFlags::REMAINING_TO_TAKE_SYNC
                    | TaskFlags::CREDIT_SYNC
            }
        }
    }
}

impl FromStr for SyncAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(SyncAction::Full),
            "changes" => Ok(SyncAction::Changes),
            "remaining" => Ok(SyncAction::Remaining),
            other => Err(format!(
                "invalid sync action: {other} (expected \"full\", \"changes\" or \"remaining\")"
            )),
        }
    }
}

/// Which (portal, credential) pairs a pass covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncScope {
    #[default]
    All,
    /// Only credentials owned by this user.
    User(UserId),
}

impl SyncScope {
    pub fn includes(&self, user_id: UserId) -> bool {
        match self {
            SyncScope::All => true,
            SyncScope::User(id) => *id == user_id,
        }
    }
}

/// Feature bits a portal declares about itself.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PortalFeatures(u32);

impl PortalFeatures {
    /// Group data has to be synced for every credential, not only the first
    /// one of the portal.
    pub const GROUP_FULL_SYNC: PortalFeatures = PortalFeatures(1);
    pub const FOOD_STOCK: PortalFeatures = PortalFeatures(1 << 2);
    pub const REMAINING_FOOD: PortalFeatures = PortalFeatures(1 << 3);
    pub const MULTIPLE_ORDERS: PortalFeatures = PortalFeatures(1 << 4);
    pub const RESTRICT_TO_ONE_ORDER_PER_GROUP: PortalFeatures = PortalFeatures(1 << 5);

    const NAMED: [(&'static str, PortalFeatures); 5] = [
        ("group_full_sync", Self::GROUP_FULL_SYNC),
        ("food_stock", Self::FOOD_STOCK),
        ("remaining_food", Self::REMAINING_FOOD),
        ("multiple_orders", Self::MULTIPLE_ORDERS),
        ("restrict_to_one_order_per_group", Self::RESTRICT_TO_ONE_ORDER_PER_GROUP),
    ];

    pub const fn empty() -> Self {
        PortalFeatures(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        PortalFeatures(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: PortalFeatures) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn with(self, other: PortalFeatures) -> Self {
        PortalFeatures(self.0 | other.0)
    }
}

impl FromStr for PortalFeatures {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Self::NAMED
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, feature)| *feature)
            .ok_or_else(|| format!("unknown portal feature: {key}"))
    }
}

impl fmt::Debug for PortalFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::NAMED
            .iter()
            .filter(|(_, feature)| self.contains(*feature))
            .map(|(name, _)| *name)
            .collect();
        write!(f, "PortalFeatures({})", names.join("|"))
    }
}
