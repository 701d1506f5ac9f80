//! Traversal-Konfiguration (STUN/TURN)
//!
//! Das Relay kann eine eigene Konfiguration schicken. Sie wird gegen ein
//! festes Schema geprueft bevor ihr vertraut wird; bei Verstoss bleibt die
//! eingebaute Standard-Konfiguration aktiv.

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};

/// Eingebauter STUN-Server
pub const DEFAULT_STUN_URL: &str = "stun:stun.l.google.com:19302";

/// Ein STUN- oder TURN-Server wie vom Relay geliefert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IceServer {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServer {
    /// Server ohne Zugangsdaten
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            credential: None,
        }
    }
}

/// peerConfig-Nachricht des Relays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PeerConfig {
    #[serde(default)]
    pub force_relay_only: bool,
    #[serde(default)]
    pub stun_servers: Vec<IceServer>,
    #[serde(default)]
    pub turn_servers: Vec<IceServer>,
}

/// Welche ICE-Kandidaten verwendet werden duerfen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IceTransportPolicy {
    #[default]
    All,
    Relay,
}

/// Geprueftes Ergebnis, wird jeder neuen Peer-Verbindung mitgegeben
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceConfig {
    pub transport_policy: IceTransportPolicy,
    pub servers: Vec<IceServer>,
}

impl Default for IceConfig {
    fn default() -> Self {
        Self {
            transport_policy: IceTransportPolicy::All,
            servers: vec![IceServer::stun(DEFAULT_STUN_URL)],
        }
    }
}

impl PeerConfig {
    /// Prueft rohes JSON gegen das Schema und baut die ICE-Konfiguration
    pub fn validieren(roh: &serde_json::Value) -> ProtocolResult<IceConfig> {
        let config: PeerConfig = serde_json::from_value(roh.clone())
            .map_err(|e| ProtocolError::UngueltigePeerConfig(e.to_string()))?;
        config.in_ice_config()
    }

    /// Semantische Pruefung und Umwandlung
    pub fn in_ice_config(self) -> ProtocolResult<IceConfig> {
        for server in &self.stun_servers {
            if !hat_schema(&server.url, &["stun:", "stuns:"]) {
                return Err(ProtocolError::UngueltigePeerConfig(format!(
                    "stunServers: ungueltige URL '{}'",
                    server.url
                )));
            }
        }
        for server in &self.turn_servers {
            if !hat_schema(&server.url, &["turn:", "turns:"]) {
                return Err(ProtocolError::UngueltigePeerConfig(format!(
                    "turnServers: ungueltige URL '{}'",
                    server.url
                )));
            }
            if server.username.is_none() || server.credential.is_none() {
                return Err(ProtocolError::UngueltigePeerConfig(format!(
                    "turnServers: '{}' ohne username/credential",
                    server.url
                )));
            }
        }

        if self.force_relay_only && self.turn_servers.is_empty() {
            return Err(ProtocolError::RelayOhneTurnServer);
        }

        let transport_policy = if self.force_relay_only {
            IceTransportPolicy::Relay
        } else {
            IceTransportPolicy::All
        };
        let servers = self
            .stun_servers
            .into_iter()
            .chain(self.turn_servers)
            .collect();

        Ok(IceConfig {
            transport_policy,
            servers,
        })
    }
}

fn hat_schema(url: &str, erlaubt: &[&str]) -> bool {
    erlaubt.iter().any(|p| url.starts_with(p) && url.len() > p.len())
}
