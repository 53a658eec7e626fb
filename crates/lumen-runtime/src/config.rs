//! Runtime configuration
//!
//! Serde-backed settings for the node and the optional sACN controller,
//! loadable from JSON. Every field has a default matching the protocol
//! constants, so an empty object is a valid configuration.

use serde::Deserialize;

use lumen_artnet::{ArtNetNodeConfig, MergeMode};
use lumen_core::{LumenError, LumenResult, Universe, NETWORK_DATA_LOSS_TIMEOUT_MILLIS};
use lumen_sacn::{E131ControllerConfig, SEQUENCE_REGISTRY_DEFAULT_CAPACITY};

/// Top-level runtime settings
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Scheduler tick interval in milliseconds
    pub tick_interval_millis: u64,
    pub node: NodeSettings,
    /// Present only when this process also acts as an sACN source
    pub controller: Option<ControllerSettings>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            tick_interval_millis: 10,
            node: NodeSettings::default(),
            controller: None,
        }
    }
}

impl RuntimeConfig {
    pub fn from_json(json: &str) -> LumenResult<Self> {
        serde_json::from_str(json).map_err(|e| LumenError::Config(e.to_string()))
    }
}

/// Art-Net node settings
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct NodeSettings {
    pub short_name: String,
    pub long_name: String,
    pub net_switch: u8,
    pub sub_switch: u8,
    /// One entry per enabled output port, in port order
    pub ports: Vec<PortSettings>,
    pub network_data_loss_timeout_millis: u32,
    pub disable_merge_timeout: bool,
}

impl Default for NodeSettings {
    fn default() -> Self {
        NodeSettings {
            short_name: "Lumen".into(),
            long_name: "Lumen Art-Net node".into(),
            net_switch: 0,
            sub_switch: 0,
            ports: vec![PortSettings::default()],
            network_data_loss_timeout_millis: NETWORK_DATA_LOSS_TIMEOUT_MILLIS,
            disable_merge_timeout: false,
        }
    }
}

impl NodeSettings {
    pub fn node_config(&self) -> ArtNetNodeConfig {
        ArtNetNodeConfig {
            short_name: self.short_name.clone(),
            long_name: self.long_name.clone(),
            net_switch: self.net_switch,
            sub_switch: self.sub_switch,
            network_data_loss_timeout_millis: self.network_data_loss_timeout_millis,
            disable_merge_timeout: self.disable_merge_timeout,
            ..Default::default()
        }
    }
}

/// One output port
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PortSettings {
    /// Universe switch: the low nibble of the Port-Address
    pub universe_switch: u8,
    pub merge_mode: MergeModeSetting,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MergeModeSetting {
    #[default]
    Htp,
    Ltp,
}

impl From<MergeModeSetting> for MergeMode {
    fn from(setting: MergeModeSetting) -> Self {
        match setting {
            MergeModeSetting::Htp => MergeMode::Htp,
            MergeModeSetting::Ltp => MergeMode::Ltp,
        }
    }
}

/// sACN controller settings
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    pub source_name: String,
    pub priority: u8,
    /// 0 disables synchronization
    pub synchronization_universe: u16,
    pub registry_capacity: usize,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        ControllerSettings {
            source_name: "Lumen sACN source".into(),
            priority: 100,
            synchronization_universe: 0,
            registry_capacity: SEQUENCE_REGISTRY_DEFAULT_CAPACITY,
        }
    }
}

impl ControllerSettings {
    pub fn controller_config(&self) -> E131ControllerConfig {
        E131ControllerConfig {
            source_name: self.source_name.clone(),
            priority: self.priority,
            cid: None,
            synchronization_universe: match self.synchronization_universe {
                0 => None,
                universe => Some(Universe::new(universe)),
            },
            registry_capacity: self.registry_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_valid() {
        let config = RuntimeConfig::from_json("{}").unwrap();
        assert_eq!(config.tick_interval_millis, 10);
        assert_eq!(config.node.ports.len(), 1);
        assert!(config.controller.is_none());
    }

    #[test]
    fn test_full_config() {
        let json = r#"{
            "tick_interval_millis": 5,
            "node": {
                "short_name": "stage",
                "net_switch": 1,
                "sub_switch": 2,
                "ports": [
                    { "universe_switch": 0, "merge_mode": "ltp" },
                    { "universe_switch": 1 }
                ]
            },
            "controller": {
                "source_name": "stage source",
                "synchronization_universe": 7999
            }
        }"#;
        let config = RuntimeConfig::from_json(json).unwrap();

        assert_eq!(config.tick_interval_millis, 5);
        assert_eq!(config.node.short_name, "stage");
        assert_eq!(config.node.ports.len(), 2);
        assert_eq!(config.node.ports[0].merge_mode, MergeModeSetting::Ltp);
        assert_eq!(config.node.ports[1].merge_mode, MergeModeSetting::Htp);

        let controller = config.controller.unwrap();
        assert_eq!(
            controller.controller_config().synchronization_universe,
            Some(Universe::new(7999))
        );

        let node_config = config.node.node_config();
        assert_eq!(node_config.net_switch, 1);
        assert_eq!(node_config.short_name, "stage");
    }

    #[test]
    fn test_bad_json_is_config_error() {
        let result = RuntimeConfig::from_json("{ nope");
        assert!(matches!(result, Err(LumenError::Config(_))));
    }
}
