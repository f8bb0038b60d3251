use anyhow::anyhow;
use anyhow::Result;
use cpal::traits::DeviceTrait;
use cpal::traits::HostTrait;
use cpal::Device;

/// Picks the named input device, or the system default when `name` is empty.
pub fn get_or_default_input(name: &str) -> Result<Device> {
    let host = cpal::default_host();
    if name.is_empty() {
        return host
            .default_input_device()
            .ok_or_else(|| return anyhow!("No microphone found"));
    }

    return host
        .input_devices()?
        .find(|device| return device.name().is_ok_and(|device_name| device_name == name))
        .ok_or_else(|| return anyhow!("No microphone named '{name}' found"));
}

/// Picks the named output device, or the system default when `name` is empty.
pub fn get_or_default_output(name: &str) -> Result<Device> {
    let host = cpal::default_host();
    if name.is_empty() {
        return host
            .default_output_device()
            .ok_or_else(|| return anyhow!("No speaker found"));
    }

    return host
        .output_devices()?
        .find(|device| return device.name().is_ok_and(|device_name| device_name == name))
        .ok_or_else(|| return anyhow!("No speaker named '{name}' found"));
}

fn describe(device: &Device, config: Result<cpal::SupportedStreamConfig>, default_name: &str) -> String {
    let name = device.name().unwrap_or_else(|_| return "unknown".to_string());
    let mut res = match config {
        Ok(config) => format!(
            " * {name} ({}ch, {}hz)",
            config.channels(),
            config.sample_rate().0
        ),
        Err(_) => format!(" * {name}"),
    };
    if name == default_name {
        res.push_str(" [default]");
    }

    return res;
}

pub fn list_inputs() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let default_name = host
        .default_input_device()
        .and_then(|device| return device.name().ok())
        .unwrap_or_default();

    return Ok(host
        .input_devices()?
        .map(|device| {
            let config = device.default_input_config().map_err(anyhow::Error::from);
            return describe(&device, config, &default_name);
        })
        .collect());
}

pub fn list_outputs() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let default_name = host
        .default_output_device()
        .and_then(|device| return device.name().ok())
        .unwrap_or_default();

    return Ok(host
        .output_devices()?
        .map(|device| {
            let config = device.default_output_config().map_err(anyhow::Error::from);
            return describe(&device, config, &default_name);
        })
        .collect());
}
