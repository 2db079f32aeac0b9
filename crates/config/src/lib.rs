use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serial timing for the diagnostic UART. RX and TX are configured
/// independently, like the original hardware does it.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
#[serde(deny_unknown_fields)]
pub struct UartTiming {
    pub rx_baud: u32,
    pub tx_baud: u32,
}

impl Default for UartTiming {
    fn default() -> Self {
        Self {
            rx_baud: 115_200,
            tx_baud: 115_200,
        }
    }
}

/// Board profile for the host harness: which simulated board to bring up
/// and where its diagnostics go.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct BoardProfile {
    pub schema_version: String,
    pub board: String,
    #[serde(default)]
    pub uart: UartTiming,
    #[serde(default = "default_ports")]
    pub ports: u8,
    #[serde(default)]
    pub print_port: u8,
}

fn default_ports() -> u8 {
    2
}

impl Default for BoardProfile {
    fn default() -> Self {
        Self {
            schema_version: "1.0".to_string(),
            board: "esp-devkit".to_string(),
            uart: UartTiming::default(),
            ports: default_ports(),
            print_port: 0,
        }
    }
}

impl BoardProfile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open board profile at {:?}", path.as_ref()))?;
        let profile: Self =
            serde_yaml::from_reader(f).context("Failed to parse Board Profile YAML")?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != "1.0" {
            anyhow::bail!(
                "Unsupported schema_version '{}'. Supported versions: '1.0'",
                self.schema_version
            );
        }

        if self.board.trim().is_empty() {
            anyhow::bail!("Board name cannot be empty");
        }

        if self.ports == 0 {
            anyhow::bail!("Board must have at least one UART port");
        }

        if self.print_port >= self.ports {
            anyhow::bail!(
                "print_port {} out of range for a board with {} UART port(s)",
                self.print_port,
                self.ports
            );
        }

        if self.uart.rx_baud == 0 || self.uart.tx_baud == 0 {
            anyhow::bail!("Baud rates must be greater than zero");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_profile() {
        let yaml = r#"
schema_version: "1.0"
board: esp-devkit
uart:
  rx_baud: 115200
  tx_baud: 115200
ports: 2
print_port: 0
"#;
        let profile: BoardProfile = serde_yaml::from_str(yaml).unwrap();
        assert!(profile.validate().is_ok());
        assert_eq!(profile.board, "esp-devkit");
        assert_eq!(profile.uart.rx_baud, 115_200);
        assert_eq!(profile.ports, 2);
    }

    #[test]
    fn test_defaults_fill_in() {
        let yaml = r#"
schema_version: "1.0"
board: bare-module
"#;
        let profile: BoardProfile = serde_yaml::from_str(yaml).unwrap();
        assert!(profile.validate().is_ok());
        assert_eq!(profile.uart.tx_baud, 115_200);
        assert_eq!(profile.ports, 2);
        assert_eq!(profile.print_port, 0);
    }

    #[test]
    fn test_invalid_version() {
        let yaml = r#"
schema_version: "2.0"
board: esp-devkit
"#;
        let profile: BoardProfile = serde_yaml::from_str(yaml).unwrap();
        let err = profile.validate().unwrap_err();
        assert!(err.to_string().contains("Unsupported schema_version"));
    }

    #[test]
    fn test_empty_board_name() {
        let yaml = r#"
schema_version: "1.0"
board: "  "
"#;
        let profile: BoardProfile = serde_yaml::from_str(yaml).unwrap();
        let err = profile.validate().unwrap_err();
        assert!(err.to_string().contains("Board name"));
    }

    #[test]
    fn test_print_port_out_of_range() {
        let yaml = r#"
schema_version: "1.0"
board: esp-devkit
ports: 1
print_port: 1
"#;
        let profile: BoardProfile = serde_yaml::from_str(yaml).unwrap();
        let err = profile.validate().unwrap_err();
        assert!(err.to_string().contains("print_port"));
    }

    #[test]
    fn test_zero_ports_rejected() {
        let yaml = r#"
schema_version: "1.0"
board: esp-devkit
ports: 0
"#;
        let profile: BoardProfile = serde_yaml::from_str(yaml).unwrap();
        let err = profile.validate().unwrap_err();
        assert!(err.to_string().contains("at least one"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = r#"
schema_version: "1.0"
board: esp-devkit
wifi: true
"#;
        assert!(serde_yaml::from_str::<BoardProfile>(yaml).is_err());
    }
}
