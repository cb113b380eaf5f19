use serde::{Deserialize, Serialize};
use std::fmt;

/// Speaker of a conversation line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Enforcement officer asking the question
    Officer,
    /// Truck driver answering
    Driver,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Officer => "officer",
            Role::Driver => "driver",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "officer" => Ok(Role::Officer),
            "driver" => Ok(Role::Driver),
            other => anyhow::bail!("unknown role '{}', expected officer or driver", other),
        }
    }
}

/// One line of dialogue to be rendered as audio
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub question_id: u32,
    pub role: Role,
    /// Spoken text (used by synthesis, ignored by static clips)
    pub text: String,
}

/// An officer/driver exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: u32,
    pub officer: String,
    pub driver: String,
    #[serde(default)]
    pub is_free: bool,
}

impl Conversation {
    /// Segments in playback order: officer first, then driver
    pub fn segments(&self) -> [Segment; 2] {
        [self.segment(Role::Officer), self.segment(Role::Driver)]
    }

    pub fn segment(&self, role: Role) -> Segment {
        let text = match role {
            Role::Officer => self.officer.clone(),
            Role::Driver => self.driver.clone(),
        };

        Segment {
            question_id: self.id,
            role,
            text,
        }
    }
}
