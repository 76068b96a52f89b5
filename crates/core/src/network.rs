//! Network and feature detection
//!
//! The detector holds the latest [`NetworkState`] snapshot. Format support is
//! detected once when the detector is built; connection details are replaced
//! on every change event the host reports.

use std::fmt;
use std::str::FromStr;

use parking_lot::RwLock;
use tracing::debug;

/// Physical connection type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionType {
    Wifi,
    Cellular,
    Ethernet,
    Bluetooth,
    Wimax,
    None,
    Other,
    #[default]
    Unknown,
}

impl ConnectionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionType::Wifi => "wifi",
            ConnectionType::Cellular => "cellular",
            ConnectionType::Ethernet => "ethernet",
            ConnectionType::Bluetooth => "bluetooth",
            ConnectionType::Wimax => "wimax",
            ConnectionType::None => "none",
            ConnectionType::Other => "other",
            ConnectionType::Unknown => "unknown",
        }
    }
}

impl FromStr for ConnectionType {
    type Err = std::convert::Infallible;

    /// Unrecognized names parse as [`ConnectionType::Unknown`]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "wifi" => ConnectionType::Wifi,
            "cellular" => ConnectionType::Cellular,
            "ethernet" => ConnectionType::Ethernet,
            "bluetooth" => ConnectionType::Bluetooth,
            "wimax" => ConnectionType::Wimax,
            "none" => ConnectionType::None,
            "other" => ConnectionType::Other,
            _ => ConnectionType::Unknown,
        })
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measured connection quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EffectiveType {
    Slow2g,
    TwoG,
    ThreeG,
    FourG,
    #[default]
    Unknown,
}

impl EffectiveType {
    pub fn as_str(self) -> &'static str {
        match self {
            EffectiveType::Slow2g => "slow-2g",
            EffectiveType::TwoG => "2g",
            EffectiveType::ThreeG => "3g",
            EffectiveType::FourG => "4g",
            EffectiveType::Unknown => "unknown",
        }
    }

    /// Whether this is the slowest class
    pub fn is_slowest(self) -> bool {
        self == EffectiveType::Slow2g
    }
}

impl FromStr for EffectiveType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "slow-2g" => EffectiveType::Slow2g,
            "2g" => EffectiveType::TwoG,
            "3g" => EffectiveType::ThreeG,
            "4g" => EffectiveType::FourG,
            _ => EffectiveType::Unknown,
        })
    }
}

impl fmt::Display for EffectiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection details reported by a change event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkChange {
    pub connection_type: ConnectionType,
    pub effective_type: EffectiveType,
    pub reduced_data: bool,
}

impl NetworkChange {
    /// Build from the host's string values
    pub fn parse(connection_type: &str, effective_type: &str, reduced_data: bool) -> Self {
        Self {
            connection_type: connection_type.parse().unwrap_or_default(),
            effective_type: effective_type.parse().unwrap_or_default(),
            reduced_data,
        }
    }
}

/// Latest detector snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkState {
    /// `None` when the host could not detect format support
    pub supports_optimized_format: Option<bool>,
    pub connection_type: ConnectionType,
    pub effective_type: EffectiveType,
    pub reduced_data: bool,
}

impl NetworkState {
    /// Whether the low-bandwidth alternate should win
    pub fn prefers_low_bandwidth(&self) -> bool {
        self.reduced_data || self.effective_type.is_slowest()
    }
}

/// Holder of the current network snapshot
#[derive(Debug, Default)]
pub struct NetworkDetector {
    state: RwLock<NetworkState>,
}

impl NetworkDetector {
    /// Create a detector with the detected format support
    pub fn new(supports_optimized_format: Option<bool>) -> Self {
        debug!("optimized format support: {:?}", supports_optimized_format);
        Self {
            state: RwLock::new(NetworkState {
                supports_optimized_format,
                ..NetworkState::default()
            }),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> NetworkState {
        *self.state.read()
    }

    /// Apply a change event
    pub fn update(&self, change: NetworkChange) {
        let mut state = self.state.write();
        state.connection_type = change.connection_type;
        state.effective_type = change.effective_type;
        state.reduced_data = change.reduced_data;
        debug!(
            "network changed: type={} effective={} reduced_data={}",
            change.connection_type, change.effective_type, change.reduced_data
        );
    }
}
