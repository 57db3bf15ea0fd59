//! The external rescan request.
//!
//! Other add-ons ask for a rescan by sending the event
//! [`RESCAN_EVENT_ID`] with a `"<kind>|[x,y,z]"` payload.

use conduit_core::pos::BlockPos;

use crate::ResourceKind;

pub const RESCAN_EVENT_ID: &str = "dorios:updatePipes";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignalError {
    #[error("payload {0:?} has no '|' separator")]
    MissingSeparator(String),
    #[error("unknown network kind {0:?}")]
    UnknownKind(String),
    #[error("malformed position {0:?}")]
    BadPosition(String),
}

/// A parsed rescan request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RescanSignal {
    pub kind: ResourceKind,
    pub pos: BlockPos,
}

impl RescanSignal {
    pub fn new(kind: ResourceKind, pos: BlockPos) -> Self {
        Self { kind, pos }
    }

    pub fn parse(payload: &str) -> Result<Self, SignalError> {
        let (kind, pos) = payload
            .split_once('|')
            .ok_or_else(|| SignalError::MissingSeparator(payload.to_string()))?;
        let kind = ResourceKind::from_name(kind.trim())
            .ok_or_else(|| SignalError::UnknownKind(kind.to_string()))?;
        let pos = parse_position(pos.trim()).ok_or_else(|| SignalError::BadPosition(pos.to_string()))?;
        Ok(Self { kind, pos })
    }

    pub fn encode(&self) -> String {
        format!("{}|[{}]", self.kind.name(), self.pos)
    }
}

fn parse_position(s: &str) -> Option<BlockPos> {
    let inner = s.strip_prefix('[')?.strip_suffix(']')?;
    let mut parts = inner.split(',').map(|p| p.trim().parse::<i32>());
    let x = parts.next()?.ok()?;
    let y = parts.next()?.ok()?;
    let z = parts.next()?.ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(BlockPos::new(x, y, z))
}

impl std::str::FromStr for RescanSignal {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
