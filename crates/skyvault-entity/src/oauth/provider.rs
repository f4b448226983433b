//! Cloud storage provider enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use skyvault_core::AppError;

/// A third-party cloud storage provider whose resources a user can
/// authorize access to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google Drive.
    GDrive,
    /// Proton Drive.
    Proton,
    /// Terabox. Authenticates with basic credentials rather than OAuth,
    /// so it has no authorization or refresh flow.
    Terabox,
}

impl Provider {
    /// All known providers.
    pub const ALL: [Provider; 3] = [Provider::GDrive, Provider::Proton, Provider::Terabox];

    /// Return the provider name as stored in the user's provider map.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GDrive => "gdrive",
            Self::Proton => "proton",
            Self::Terabox => "terabox",
        }
    }

    /// Human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::GDrive => "Google Drive",
            Self::Proton => "Proton Drive",
            Self::Terabox => "Terabox",
        }
    }

    /// Whether the provider participates in the OAuth code/refresh flows.
    pub fn supports_oauth(&self) -> bool {
        match self {
            Self::GDrive | Self::Proton => true,
            Self::Terabox => false,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Provider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gdrive" => Ok(Self::GDrive),
            "proton" => Ok(Self::Proton),
            "terabox" => Ok(Self::Terabox),
            _ => Err(AppError::unsupported_provider(format!(
                "Unknown provider: '{s}'"
            ))),
        }
    }
}
