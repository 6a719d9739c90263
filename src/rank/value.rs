//! Rank value model
//!
//! Every comparison the scoring core makes between two ranks goes through
//! [`RankInfo::value`]: IRON IV is 0, each division adds 1, each divided tier
//! spans 4, and the apex tiers sit at fixed points above DIAMOND I.

use crate::error::TrackerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ranked tier, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Iron,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Emerald,
    Diamond,
    Master,
    Grandmaster,
    Challenger,
}

impl Tier {
    pub const ALL: [Tier; 10] = [
        Tier::Iron,
        Tier::Bronze,
        Tier::Silver,
        Tier::Gold,
        Tier::Platinum,
        Tier::Emerald,
        Tier::Diamond,
        Tier::Master,
        Tier::Grandmaster,
        Tier::Challenger,
    ];

    /// Whether the tier is split into divisions IV..I
    pub fn has_divisions(self) -> bool {
        !matches!(self, Tier::Master | Tier::Grandmaster | Tier::Challenger)
    }

    /// Position of the tier on the ladder (IRON = 0)
    pub fn index(self) -> i32 {
        self as i32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Iron => "IRON",
            Tier::Bronze => "BRONZE",
            Tier::Silver => "SILVER",
            Tier::Gold => "GOLD",
            Tier::Platinum => "PLATINUM",
            Tier::Emerald => "EMERALD",
            Tier::Diamond => "DIAMOND",
            Tier::Master => "MASTER",
            Tier::Grandmaster => "GRANDMASTER",
            Tier::Challenger => "CHALLENGER",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Tier::ALL
            .into_iter()
            .find(|tier| tier.as_str() == upper)
            .ok_or(TrackerError::InvalidRank {
                label: s.to_string(),
            })
    }
}

/// Division within a divided tier; IV is the lowest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Division {
    IV,
    III,
    II,
    I,
}

impl Division {
    /// Roman numeral as a number (IV = 4, I = 1)
    pub fn number(self) -> i32 {
        match self {
            Division::IV => 4,
            Division::III => 3,
            Division::II => 2,
            Division::I => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Division::IV => "IV",
            Division::III => "III",
            Division::II => "II",
            Division::I => "I",
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Division {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IV" | "4" => Ok(Division::IV),
            "III" | "3" => Ok(Division::III),
            "II" | "2" => Ok(Division::II),
            "I" | "1" => Ok(Division::I),
            _ => Err(TrackerError::InvalidRank {
                label: s.to_string(),
            }),
        }
    }
}

/// A player's position on the ranked ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RankInfo {
    pub tier: Tier,
    /// Absent for MASTER and above
    #[serde(default)]
    pub division: Option<Division>,
    #[serde(default)]
    pub league_points: u32,
}

impl RankInfo {
    pub fn new(tier: Tier, division: Option<Division>, league_points: u32) -> Self {
        Self {
            tier,
            division: if tier.has_divisions() { division } else { None },
            league_points,
        }
    }

    /// Divided tier at zero LP
    pub fn divided(tier: Tier, division: Division) -> Self {
        Self::new(tier, Some(division), 0)
    }

    /// Apex tier (MASTER and above) at zero LP
    pub fn apex(tier: Tier) -> Self {
        Self::new(tier, None, 0)
    }

    /// Build from API labels such as ("GOLD", "III")
    pub fn from_labels(
        tier: &str,
        division: Option<&str>,
        league_points: u32,
    ) -> Result<Self, TrackerError> {
        let tier: Tier = tier.parse()?;
        let division = match division {
            Some(label) if tier.has_divisions() => Some(label.parse()?),
            _ => None,
        };
        Ok(Self::new(tier, division, league_points))
    }

    /// Scalar ladder position used for all rank arithmetic
    pub fn value(&self) -> i32 {
        match self.tier {
            Tier::Master => 28,
            Tier::Grandmaster => 32,
            Tier::Challenger => 36,
            tier => {
                // Missing division on a divided tier counts as the tier floor
                let division = self.division.unwrap_or(Division::IV);
                tier.index() * 4 + (4 - division.number())
            }
        }
    }
}

impl fmt::Display for RankInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.division {
            Some(division) => write!(f, "{} {} {} LP", self.tier, division, self.league_points),
            None => write!(f, "{} {} LP", self.tier, self.league_points),
        }
    }
}
