use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{LedgerError, LedgerResult};

// Binary market records: markets, identities, and outcome indices

/// Monotonically assigned market identifier (first id is 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketId(pub u64);

impl MarketId {
    pub const FIRST: MarketId = MarketId(1);

    pub fn next(self) -> MarketId {
        MarketId(self.0 + 1)
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque caller identity, pre-authenticated by the host
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Identity(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Identity(s.to_string())
    }
}

/// One of the two outcomes of a binary market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Outcome {
    Option0,
    Option1,
}

impl Outcome {
    /// Convert a raw option index. Anything but 0 or 1 is `InvalidOption`.
    pub fn from_index(index: u64) -> LedgerResult<Self> {
        match index {
            0 => Ok(Outcome::Option0),
            1 => Ok(Outcome::Option1),
            _ => Err(LedgerError::InvalidOption),
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Outcome::Option0 => 0,
            Outcome::Option1 => 1,
        }
    }
}

impl From<Outcome> for u8 {
    fn from(outcome: Outcome) -> u8 {
        outcome.index() as u8
    }
}

impl TryFrom<u8> for Outcome {
    type Error = LedgerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Outcome::from_index(value as u64)
    }
}

/// Convert a flexible option list into the two labels a binary market takes
pub fn binary_options(options: Vec<String>) -> LedgerResult<[String; 2]> {
    <[String; 2]>::try_from(options).map_err(|_| LedgerError::InvalidOption)
}

/// A binary prediction market
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    /// Unique market identifier
    pub id: MarketId,

    /// Identity allowed to resolve the market
    pub creator: Identity,

    /// Proposition being predicted
    pub description: String,

    /// Outcome labels; index 0 and index 1
    pub options: [String; 2],

    /// Sum of every stake ever placed on this market
    pub total_stake: u64,

    /// Amount ever staked on each outcome; claims never reduce these
    pub outcome_totals: [u64; 2],

    /// Clock value at which staking closes and resolution opens
    pub deadline: u64,

    /// Clock value at creation
    pub created_at: u64,

    pub resolved: bool,

    /// Set exactly once, together with `resolved`
    pub winning_option: Option<Outcome>,
}

impl Market {
    pub fn new(
        id: MarketId,
        creator: Identity,
        description: String,
        options: [String; 2],
        deadline: u64,
        created_at: u64,
    ) -> Self {
        Self {
            id,
            creator,
            description,
            options,
            total_stake: 0,
            outcome_totals: [0, 0],
            deadline,
            created_at,
            resolved: false,
            winning_option: None,
        }
    }

    /// Staking is open while the clock is strictly before the deadline
    pub fn accepts_stakes(&self, now: u64) -> bool {
        now < self.deadline
    }

    /// Resolution opens at the deadline
    pub fn can_resolve_at(&self, now: u64) -> bool {
        now >= self.deadline
    }

    /// Total staked on the given outcome
    pub fn pool(&self, outcome: Outcome) -> u64 {
        self.outcome_totals[outcome.index()]
    }

    /// Total staked on the winning outcome (None until resolved)
    pub fn winning_pool(&self) -> Option<u64> {
        self.winning_option.map(|w| self.pool(w))
    }
}
