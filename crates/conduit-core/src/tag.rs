//! Entity tag encoding.
//!
//! Tags are the host's only per-entity string metadata, so network
//! membership is written as literal tags:
//!
//! - position tags: `prefix:[x,y,z]` with no spaces (`net:[10,65,-4]`)
//! - substance tags: `fluid{index}Type:{type}` (`fluid0Type:lava`)
//! - the dirty marker: `updateNetwork`
//!
//! The encoding is bit-exact; other tooling reads these strings.

use serde::{Deserialize, Serialize};

use crate::pos::BlockPos;

/// Marks an entity's cached node list as stale.
pub const DIRTY_TAG: &str = "updateNetwork";

/// Substance stored in an empty tank.
pub const EMPTY_FLUID: &str = "empty";

// ---------------------------------------------------------------------------
// Prefixes
// ---------------------------------------------------------------------------

/// The category prefix of a position tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagPrefix {
    /// A position directly adjacent to a generator.
    Pos,
    /// An energy container reachable through cables.
    Net,
    /// A vanilla inventory block.
    Van,
    /// A container entity (or fluid endpoint).
    Ent,
    /// A third-party storage block.
    Dra,
    /// A port input position owned by a multi-block entity.
    Input,
}

impl TagPrefix {
    pub fn as_str(self) -> &'static str {
        match self {
            TagPrefix::Pos => "pos",
            TagPrefix::Net => "net",
            TagPrefix::Van => "van",
            TagPrefix::Ent => "ent",
            TagPrefix::Dra => "dra",
            TagPrefix::Input => "input",
        }
    }

    pub fn from_str_prefix(s: &str) -> Option<Self> {
        match s {
            "pos" => Some(TagPrefix::Pos),
            "net" => Some(TagPrefix::Net),
            "van" => Some(TagPrefix::Van),
            "ent" => Some(TagPrefix::Ent),
            "dra" => Some(TagPrefix::Dra),
            "input" => Some(TagPrefix::Input),
            _ => None,
        }
    }

    /// Whether `tag` starts with `prefix:`.
    pub fn matches(self, tag: &str) -> bool {
        tag.strip_prefix(self.as_str())
            .is_some_and(|rest| rest.starts_with(':'))
    }
}

// ---------------------------------------------------------------------------
// Position tags
// ---------------------------------------------------------------------------

/// A decoded `prefix:[x,y,z]` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionTag {
    pub prefix: TagPrefix,
    #[serde(flatten)]
    pub pos: BlockPos,
}

impl PositionTag {
    pub fn new(prefix: TagPrefix, pos: BlockPos) -> Self {
        Self { prefix, pos }
    }

    /// Encode as `prefix:[x,y,z]`.
    pub fn encode(&self) -> String {
        format!("{}:[{}]", self.prefix.as_str(), self.pos)
    }

    /// Decode a tag. Anything that is not exactly `prefix:[int,int,int]`
    /// with a known prefix yields `None`.
    pub fn parse(tag: &str) -> Option<Self> {
        let (prefix, rest) = tag.split_once(':')?;
        let prefix = TagPrefix::from_str_prefix(prefix)?;
        let inner = rest.strip_prefix('[')?.strip_suffix(']')?;
        let mut parts = inner.split(',');
        let x = parts.next()?.parse().ok()?;
        let y = parts.next()?.parse().ok()?;
        let z = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(prefix, BlockPos::new(x, y, z)))
    }
}

impl std::fmt::Display for PositionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Shorthand for `PositionTag::new(prefix, pos).encode()`.
pub fn position_tag(prefix: TagPrefix, pos: BlockPos) -> String {
    PositionTag::new(prefix, pos).encode()
}

// ---------------------------------------------------------------------------
// Substance tags
// ---------------------------------------------------------------------------

/// `fluid{index}Type:` prefix for one tank.
pub fn fluid_type_prefix(index: u8) -> String {
    format!("fluid{index}Type:")
}

/// `fluid{index}Type:{substance}`.
pub fn fluid_type_tag(index: u8, substance: &str) -> String {
    format!("fluid{index}Type:{substance}")
}

/// Extract the substance from a tag belonging to tank `index`.
pub fn parse_fluid_type_tag(index: u8, tag: &str) -> Option<&str> {
    tag.strip_prefix(&fluid_type_prefix(index))
}
