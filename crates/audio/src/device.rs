//! Auswahl der Audio-Geraete
//!
//! Geraete werden ueber einen Teil ihres Namens gesucht; `None` steht fuer
//! den Systemstandard.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::Device;
use tracing::debug;

use crate::error::{AudioError, AudioResult};

/// Namen aller Eingabegeraete (fuer Fehlermeldungen und Diagnose)
pub fn list_input_device_names() -> AudioResult<Vec<String>> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| AudioError::StreamFehler(e.to_string()))?;
    let namen: Vec<String> = devices.filter_map(|d| d.name().ok()).collect();
    debug!("Gefundene Eingabegeraete: {}", namen.len());
    Ok(namen)
}

/// Laedt ein cpal-Device anhand des Namens fuer Eingabe
pub fn load_cpal_input_device(name: Option<&str>) -> AudioResult<Device> {
    let host = cpal::default_host();
    match name {
        None => host
            .default_input_device()
            .ok_or(AudioError::KeinStandardEingabegeraet),
        Some(n) => {
            let devices = host
                .input_devices()
                .map_err(|e| AudioError::StreamFehler(e.to_string()))?;
            find_by_name(devices, n)
        }
    }
}

/// Laedt ein cpal-Device anhand des Namens fuer Ausgabe
pub fn load_cpal_output_device(name: Option<&str>) -> AudioResult<Device> {
    let host = cpal::default_host();
    match name {
        None => host
            .default_output_device()
            .ok_or(AudioError::KeinStandardAusgabegeraet),
        Some(n) => {
            let devices = host
                .output_devices()
                .map_err(|e| AudioError::StreamFehler(e.to_string()))?;
            find_by_name(devices, n)
        }
    }
}

fn find_by_name(devices: impl Iterator<Item = Device>, name: &str) -> AudioResult<Device> {
    devices
        .into_iter()
        .find(|d| d.name().map(|n| n.contains(name)).unwrap_or(false))
        .ok_or_else(|| AudioError::GeraetNichtGefunden(name.to_string()))
}
