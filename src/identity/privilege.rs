use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// One granted capability. The string keys are persisted in role assignments, so new
/// capabilities are added as new variants and existing keys never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Privilege {
    TodoViewAll,
    TodoViewOwn,
    TodoCreateOwn,
    TodoUpdateOwn,
    TodoDeleteOwnDraft,
    TodoDeleteAny,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown privilege key '{0}'")]
pub struct UnknownPrivilege(pub String);

impl Privilege {
    pub const ALL: [Privilege; 6] = [
        Privilege::TodoViewAll,
        Privilege::TodoViewOwn,
        Privilege::TodoCreateOwn,
        Privilege::TodoUpdateOwn,
        Privilege::TodoDeleteOwnDraft,
        Privilege::TodoDeleteAny,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Privilege::TodoViewAll => "todo:view:all",
            Privilege::TodoViewOwn => "todo:view:own",
            Privilege::TodoCreateOwn => "todo:create:own",
            Privilege::TodoUpdateOwn => "todo:update:own",
            Privilege::TodoDeleteOwnDraft => "todo:delete:own:draft",
            Privilege::TodoDeleteAny => "todo:delete:any",
        }
    }
}

impl Display for Privilege {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.key()) }
}

impl FromStr for Privilege {
    type Err = UnknownPrivilege;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Privilege::ALL
            .into_iter()
            .find(|p| p.key() == s)
            .ok_or_else(|| UnknownPrivilege(s.to_string()))
    }
}

impl Serialize for Privilege {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for Privilege {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
