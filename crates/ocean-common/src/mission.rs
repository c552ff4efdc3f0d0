//! Satellite altimetry mission codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::OceanError;

/// Mission codes present in the along-track archive.
pub const ALL_MISSIONS: [&str; 25] = [
    "al", "alg", "c2", "c2n", "e1g", "e1", "e2", "en", "enn", "g2", "h2a", "h2b", "j1g", "j1",
    "j1n", "j2g", "j2", "j2n", "j3", "j3n", "s3a", "s3b", "s6a", "tp", "tpn",
];

/// A validated mission code (e.g. `"j3"` for Jason-3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Mission(String);

impl Mission {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Every mission in the archive, in catalog order.
    pub fn all() -> Vec<Mission> {
        ALL_MISSIONS.iter().map(|m| Mission(m.to_string())).collect()
    }

    /// Parse a list of codes, failing on the first unknown one.
    pub fn parse_list<I, S>(codes: I) -> Result<Vec<Mission>, OceanError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        codes.into_iter().map(|c| c.as_ref().parse()).collect()
    }
}

impl FromStr for Mission {
    type Err = OceanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        if ALL_MISSIONS.contains(&code.as_str()) {
            Ok(Mission(code))
        } else {
            Err(OceanError::UnknownMission(s.to_string()))
        }
    }
}

impl TryFrom<String> for Mission {
    type Error = OceanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Mission> for String {
    fn from(m: Mission) -> Self {
        m.0
    }
}

impl fmt::Display for Mission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
