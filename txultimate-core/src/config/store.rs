//! Binary configuration persistence
//!
//! A stored configuration is one layout version byte followed by the
//! postcard encoding of [`DeviceConfig`]. Loading validates the result, so
//! a config that was edited or corrupted in flash cannot reach the device.

use super::types::DeviceConfig;
use crate::error::{ConfigError, Error};

/// Current stored layout
pub const CONFIG_VERSION: u8 = 1;

/// Buffer size that fits any configuration
pub const MAX_STORED_SIZE: usize = 512;

/// Serialize `config` into `buf`
///
/// Returns the used part of the buffer.
pub fn store<'a>(config: &DeviceConfig, buf: &'a mut [u8]) -> Result<&'a mut [u8], Error> {
    let (version, body) = buf.split_first_mut().ok_or(ConfigError::Serialize)?;
    *version = CONFIG_VERSION;
    let len = postcard::to_slice(config, body)
        .map_err(|_| ConfigError::Serialize)?
        .len();
    Ok(&mut buf[..1 + len])
}

/// Deserialize and validate a stored configuration
pub fn load(bytes: &[u8]) -> Result<DeviceConfig, Error> {
    let (&version, body) = bytes.split_first().ok_or(ConfigError::Deserialize)?;
    if version != CONFIG_VERSION {
        return Err(ConfigError::VersionMismatch(version).into());
    }

    let config: DeviceConfig = postcard::from_bytes(body).map_err(|_| ConfigError::Deserialize)?;
    config.validate()?;
    Ok(config)
}
