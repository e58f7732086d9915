//! Text configuration loader
//!
//! Minimal parser for the TOML subset used to describe a panel. It does
//! NOT support the full TOML spec.
//!
//! ```toml
//! [sonoff_tx_ultimate]
//! power_pin = "GPIO5"
//! power_pin_inverted = false
//!
//! [uart]
//! baud_rate = 115200
//! tx_pin = 19
//! rx_pin = 22
//!
//! [binary_sensor.left]
//! channels = [1, 2, 3]
//! press_only = true
//! ```
//!
//! Each section has a static table mapping its keys to typed setters, so
//! adding a key means adding one table row.

use heapless::{String, Vec};

use super::types::{
    DeviceConfig, LinkConfig, PinConfig, TouchSensorConfig, MAX_CHANNELS_PER_SENSOR,
    MAX_TOUCH_SENSORS,
};
use crate::error::{ConfigError, Error, ParseErrorKind};

/// Raw value on the right-hand side of `key = value`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Value<'a> {
    Integer(i64),
    Boolean(bool),
    Str(&'a str),
    /// Contents between the brackets of `[a, b, c]`
    List(&'a str),
}

impl<'a> Value<'a> {
    fn parse(raw: &'a str) -> Result<Self, ParseErrorKind> {
        let raw = raw.trim();
        if raw == "true" {
            return Ok(Value::Boolean(true));
        }
        if raw == "false" {
            return Ok(Value::Boolean(false));
        }
        if let Some(inner) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
            return Ok(Value::Str(inner));
        }
        if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            return Ok(Value::List(inner));
        }
        parse_integer(raw).map(Value::Integer)
    }

    fn as_bool(self) -> Result<bool, ParseErrorKind> {
        match self {
            Value::Boolean(b) => Ok(b),
            _ => Err(ParseErrorKind::InvalidValue),
        }
    }

    fn as_u32(self) -> Result<u32, ParseErrorKind> {
        match self {
            Value::Integer(n) => u32::try_from(n).map_err(|_| ParseErrorKind::InvalidValue),
            _ => Err(ParseErrorKind::InvalidValue),
        }
    }

    fn as_u8(self) -> Result<u8, ParseErrorKind> {
        match self {
            Value::Integer(n) => u8::try_from(n).map_err(|_| ParseErrorKind::InvalidValue),
            _ => Err(ParseErrorKind::InvalidValue),
        }
    }

    /// GPIO number, as `18` or `"GPIO18"`
    fn as_pin(self) -> Result<u8, ParseErrorKind> {
        match self {
            Value::Str(s) => {
                let number = s
                    .strip_prefix("GPIO")
                    .or_else(|| s.strip_prefix("gpio"))
                    .ok_or(ParseErrorKind::InvalidValue)?;
                number.parse().map_err(|_| ParseErrorKind::InvalidValue)
            }
            other => other.as_u8(),
        }
    }

    /// Channel list; a single integer is accepted as a one-element list
    fn as_channel_list(self) -> Result<Vec<u8, MAX_CHANNELS_PER_SENSOR>, ParseErrorKind> {
        let mut channels = Vec::new();
        match self {
            Value::Integer(_) => {
                channels
                    .push(self.as_u8()?)
                    .map_err(|_| ParseErrorKind::TooManyItems)?;
            }
            Value::List(inner) => {
                for item in inner.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    let ch = Value::Integer(parse_integer(item)?).as_u8()?;
                    channels.push(ch).map_err(|_| ParseErrorKind::TooManyItems)?;
                }
            }
            _ => return Err(ParseErrorKind::InvalidValue),
        }
        Ok(channels)
    }
}

/// Decimal or `0x` hex, with optional `_` digit separators
fn parse_integer(raw: &str) -> Result<i64, ParseErrorKind> {
    let mut digits: String<24> = String::new();
    for c in raw.chars().filter(|&c| c != '_') {
        digits.push(c).map_err(|_| ParseErrorKind::InvalidValue)?;
    }
    let parsed = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => digits.parse(),
    };
    parsed.map_err(|_| ParseErrorKind::InvalidValue)
}

/// Setter bound to a configuration key
type Setter<T> = fn(&mut T, Value<'_>) -> Result<(), ParseErrorKind>;

struct KeyBinding<T: 'static> {
    key: &'static str,
    set: Setter<T>,
}

/// Values of the `[sonoff_tx_ultimate]` section, before required-key checks
#[derive(Debug, Default)]
struct DeviceDraft {
    power_pin: Option<u8>,
    power_pin_inverted: bool,
}

fn set_power_pin(d: &mut DeviceDraft, v: Value<'_>) -> Result<(), ParseErrorKind> {
    d.power_pin = Some(v.as_pin()?);
    Ok(())
}

fn set_power_pin_inverted(d: &mut DeviceDraft, v: Value<'_>) -> Result<(), ParseErrorKind> {
    d.power_pin_inverted = v.as_bool()?;
    Ok(())
}

fn set_baud_rate(l: &mut LinkConfig, v: Value<'_>) -> Result<(), ParseErrorKind> {
    l.baud_rate = v.as_u32()?;
    Ok(())
}

fn set_tx_pin(l: &mut LinkConfig, v: Value<'_>) -> Result<(), ParseErrorKind> {
    l.tx_pin = Some(v.as_pin()?);
    Ok(())
}

fn set_rx_pin(l: &mut LinkConfig, v: Value<'_>) -> Result<(), ParseErrorKind> {
    l.rx_pin = Some(v.as_pin()?);
    Ok(())
}

fn set_channels(s: &mut TouchSensorConfig, v: Value<'_>) -> Result<(), ParseErrorKind> {
    s.channels = v.as_channel_list()?;
    Ok(())
}

fn set_press_only(s: &mut TouchSensorConfig, v: Value<'_>) -> Result<(), ParseErrorKind> {
    s.press_only = v.as_bool()?;
    Ok(())
}

const DEVICE_KEYS: &[KeyBinding<DeviceDraft>] = &[
    KeyBinding {
        key: "power_pin",
        set: set_power_pin,
    },
    KeyBinding {
        key: "power_pin_inverted",
        set: set_power_pin_inverted,
    },
];

const UART_KEYS: &[KeyBinding<LinkConfig>] = &[
    KeyBinding {
        key: "baud_rate",
        set: set_baud_rate,
    },
    KeyBinding {
        key: "tx_pin",
        set: set_tx_pin,
    },
    KeyBinding {
        key: "rx_pin",
        set: set_rx_pin,
    },
];

const SENSOR_KEYS: &[KeyBinding<TouchSensorConfig>] = &[
    KeyBinding {
        key: "channels",
        set: set_channels,
    },
    KeyBinding {
        key: "press_only",
        set: set_press_only,
    },
];

fn apply<T: 'static>(
    table: &[KeyBinding<T>],
    target: &mut T,
    key: &str,
    value: Value<'_>,
) -> Result<(), ParseErrorKind> {
    let binding = table
        .iter()
        .find(|b| b.key == key)
        .ok_or(ParseErrorKind::UnknownKey)?;
    (binding.set)(target, value)
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Device,
    Uart,
    /// Index into the sensor list
    Sensor(usize),
}

/// Strip a trailing `# comment` that is not inside a string
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Parse configuration text into a validated [`DeviceConfig`]
pub fn parse_config(input: &str) -> Result<DeviceConfig, Error> {
    let mut section = Section::Root;
    let mut device = DeviceDraft::default();
    let mut link = LinkConfig::default();
    let mut sensors: Vec<TouchSensorConfig, MAX_TOUCH_SENSORS> = Vec::new();

    for (index, line) in input.lines().enumerate() {
        let line_no = u16::try_from(index + 1).unwrap_or(u16::MAX);
        let at_line = |kind| ConfigError::Parse {
            line: line_no,
            kind,
        };

        let line = strip_comment(line).trim();
        if line.is_empty() {
            continue;
        }

        // Section header
        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            section = match header.trim() {
                "sonoff_tx_ultimate" => Section::Device,
                "uart" => Section::Uart,
                other => {
                    let name = other
                        .strip_prefix("binary_sensor.")
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .ok_or(at_line(ParseErrorKind::InvalidSection))?;
                    if sensors.iter().any(|s| s.name == name) {
                        return Err(at_line(ParseErrorKind::DuplicateSection).into());
                    }
                    let sensor = TouchSensorConfig::new(name, &[])?;
                    sensors
                        .push(sensor)
                        .map_err(|_| at_line(ParseErrorKind::TooManyItems))?;
                    Section::Sensor(sensors.len() - 1)
                }
            };
            continue;
        }

        let (key, raw) = line
            .split_once('=')
            .ok_or(at_line(ParseErrorKind::Syntax))?;
        let key = key.trim();
        let value = Value::parse(raw).map_err(at_line)?;

        let applied = match section {
            Section::Root => Err(ParseErrorKind::UnknownKey),
            Section::Device => apply(DEVICE_KEYS, &mut device, key, value),
            Section::Uart => apply(UART_KEYS, &mut link, key, value),
            Section::Sensor(i) => apply(SENSOR_KEYS, &mut sensors[i], key, value),
        };
        applied.map_err(at_line)?;
    }

    let pin = device.power_pin.ok_or(ConfigError::MissingKey("power_pin"))?;
    if sensors.iter().any(|s| s.channels.is_empty()) {
        return Err(ConfigError::MissingKey("channels").into());
    }

    let power_pin = if device.power_pin_inverted {
        PinConfig::inverted(pin)
    } else {
        PinConfig::new(pin)
    };

    let config = DeviceConfig {
        power_pin,
        link,
        touch_sensors: sensors,
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
# Living room switch
[sonoff_tx_ultimate]
power_pin = "GPIO5"

[uart]
baud_rate = 115_200
tx_pin = 19
rx_pin = 22   # controller TX

[binary_sensor.left]
channels = [1, 2, 3]

[binary_sensor.swipe_right]
channels = 12
press_only = true
"#;

    #[test]
    fn test_parse_full() {
        let config = parse_config(FULL).unwrap();

        assert_eq!(config.power_pin, PinConfig::new(5));
        assert_eq!(config.link, LinkConfig::new(19, 22));
        assert_eq!(config.touch_sensors.len(), 2);

        let left = &config.touch_sensors[0];
        assert_eq!(left.name.as_str(), "left");
        assert_eq!(&left.channels[..], &[1, 2, 3]);
        assert!(!left.press_only);

        let swipe = &config.touch_sensors[1];
        assert_eq!(swipe.name.as_str(), "swipe_right");
        assert_eq!(&swipe.channels[..], &[12]);
        assert!(swipe.press_only);
    }

    #[test]
    fn test_inverted_power_pin() {
        let text = "[sonoff_tx_ultimate]\npower_pin = 0x12\npower_pin_inverted = true\n[uart]\ntx_pin = 19\nrx_pin = 22\n";
        let config = parse_config(text).unwrap();
        assert_eq!(config.power_pin, PinConfig::inverted(18));
    }

    #[test]
    fn test_missing_power_pin() {
        let text = "[uart]\ntx_pin = 19\nrx_pin = 22\n";
        assert_eq!(
            parse_config(text),
            Err(Error::Configuration(ConfigError::MissingKey("power_pin")))
        );
    }

    #[test]
    fn test_missing_channels() {
        let text = "[sonoff_tx_ultimate]\npower_pin = 5\n[uart]\ntx_pin = 19\nrx_pin = 22\n[binary_sensor.a]\npress_only = true\n";
        assert_eq!(
            parse_config(text),
            Err(Error::Configuration(ConfigError::MissingKey("channels")))
        );
    }

    #[test]
    fn test_unknown_key_reports_line() {
        let text = "[sonoff_tx_ultimate]\npower_pin = 5\nbuttons = true\n";
        assert_eq!(
            parse_config(text),
            Err(Error::Configuration(ConfigError::Parse {
                line: 3,
                kind: ParseErrorKind::UnknownKey,
            }))
        );
    }

    #[test]
    fn test_unknown_section() {
        let text = "[light]\n";
        assert_eq!(
            parse_config(text),
            Err(Error::Configuration(ConfigError::Parse {
                line: 1,
                kind: ParseErrorKind::InvalidSection,
            }))
        );
    }

    #[test]
    fn test_sensor_section_without_name() {
        let text = "[sonoff_tx_ultimate]\npower_pin = 5\n[binary_sensor. ]\nchannels = [1]\n";
        assert_eq!(
            parse_config(text),
            Err(Error::Configuration(ConfigError::Parse {
                line: 3,
                kind: ParseErrorKind::InvalidSection,
            }))
        );
    }

    #[test]
    fn test_sensor_section_repeated() {
        let text = "[binary_sensor.left]\nchannels = [1]\n\n[binary_sensor.left]\nchannels = [2]\n";
        assert_eq!(
            parse_config(text),
            Err(Error::Configuration(ConfigError::Parse {
                line: 4,
                kind: ParseErrorKind::DuplicateSection,
            }))
        );
    }

    #[test]
    fn test_wrong_value_type() {
        let text = "[sonoff_tx_ultimate]\npower_pin = true\n";
        assert_eq!(
            parse_config(text),
            Err(Error::Configuration(ConfigError::Parse {
                line: 2,
                kind: ParseErrorKind::InvalidValue,
            }))
        );
    }

    #[test]
    fn test_syntax_error() {
        let text = "[sonoff_tx_ultimate]\npower_pin 5\n";
        assert_eq!(
            parse_config(text),
            Err(Error::Configuration(ConfigError::Parse {
                line: 2,
                kind: ParseErrorKind::Syntax,
            }))
        );
    }

    #[test]
    fn test_channel_out_of_range_rejected() {
        let text = "[sonoff_tx_ultimate]\npower_pin = 5\n[uart]\ntx_pin = 19\nrx_pin = 22\n[binary_sensor.a]\nchannels = [1, 14]\n";
        assert_eq!(
            parse_config(text),
            Err(Error::Configuration(ConfigError::ChannelOutOfRange(14)))
        );
    }

    #[test]
    fn test_duplicate_channel_across_sensors() {
        let text = "[sonoff_tx_ultimate]\npower_pin = 5\n[uart]\ntx_pin = 19\nrx_pin = 22\n[binary_sensor.a]\nchannels = [1, 2]\n[binary_sensor.b]\nchannels = [2]\n";
        assert_eq!(parse_config(text), Err(Error::DuplicateChannel(2)));
    }

    #[test]
    fn test_wrong_baud_rate() {
        let text = "[sonoff_tx_ultimate]\npower_pin = 5\n[uart]\nbaud_rate = 9600\ntx_pin = 19\nrx_pin = 22\n";
        assert_eq!(
            parse_config(text),
            Err(Error::Configuration(ConfigError::BaudRate(9600)))
        );
    }

    #[test]
    fn test_comment_inside_string_kept() {
        assert_eq!(strip_comment(r#"name = "a#b" # c"#), r#"name = "a#b" "#);
    }

    #[test]
    fn test_value_parsing() {
        assert_eq!(Value::parse("42"), Ok(Value::Integer(42)));
        assert_eq!(Value::parse("0x1A"), Ok(Value::Integer(26)));
        assert_eq!(Value::parse("115_200"), Ok(Value::Integer(115200)));
        assert_eq!(Value::parse("false"), Ok(Value::Boolean(false)));
        assert_eq!(Value::parse("\"GPIO18\"").unwrap().as_pin(), Ok(18));
        assert_eq!(Value::parse("\"D5\"").unwrap().as_pin(), Err(ParseErrorKind::InvalidValue));
        assert_eq!(Value::parse("300").unwrap().as_u8(), Err(ParseErrorKind::InvalidValue));
        assert_eq!(Value::parse("nope"), Err(ParseErrorKind::InvalidValue));
    }
}
