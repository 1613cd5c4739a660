//! Serialized tunables for the motor and camera.
//!
//! Missing files fall back to defaults with a warning; a present but
//! unreadable file is a wiring error and is surfaced once through the
//! fault cell, never per tick.

use std::fs;
use std::path::Path;

use character_motor::MotorConfig;
use orbit_camera::OrbitCameraConfig;
use serde::{Deserialize, Serialize};
use sim_core::{fault, logging};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    pub motor: MotorConfig,
    pub camera: OrbitCameraConfig,
}

impl ControllerSettings {
    pub fn normalize(&mut self) {
        self.motor.normalize();
        self.camera.normalize();
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        let mut settings: Self = toml::from_str(contents)?;
        settings.normalize();
        Ok(settings)
    }

    pub fn load_or_default(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => {
                logging::warn(format!(
                    "controller settings not found at {}, using defaults",
                    path.display()
                ));
                return Self::default();
            }
        };
        match Self::parse(&contents) {
            Ok(settings) => settings,
            Err(err) => {
                fault::set_fault(format!(
                    "invalid controller settings at {}: {}",
                    path.display(),
                    err
                ));
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let data = toml::to_string_pretty(self)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)
    }
}
