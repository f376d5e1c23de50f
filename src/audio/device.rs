//! Input device discovery on the default cpal host

use super::format::AudioFormat;
use anyhow::{Context, Result};
use cpal::SampleFormat;
use cpal::traits::{DeviceTrait, HostTrait};
use std::fmt;

/// Whether a usable microphone is present
///
/// With a configured device name the named device must exist; otherwise any
/// default input device will do.
pub fn microphone_available(device_name: Option<&str>) -> bool {
    match input_device(device_name) {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!("No microphone: {:#}", e);
            false
        }
    }
}

pub fn input_device(device_name: Option<&str>) -> Result<cpal::Device> {
    let host = cpal::default_host();

    let Some(name) = device_name else {
        return host
            .default_input_device()
            .context("No input audio device available");
    };

    host.input_devices()
        .context("Failed to enumerate input devices")?
        .find(|device| device.name().map(|n| n == name).unwrap_or(false))
        .with_context(|| format!("Input device not found: {}", name))
}

/// Names of all input devices, for diagnostics
pub fn list_input_devices() -> Vec<String> {
    let host = cpal::default_host();
    match host.input_devices() {
        Ok(devices) => devices.filter_map(|device| device.name().ok()).collect(),
        Err(e) => {
            tracing::warn!("Failed to enumerate input devices: {}", e);
            Vec::new()
        }
    }
}

/// One input configuration range a device reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputConfigRange {
    pub channels: u16,
    pub min_rate: u32,
    pub max_rate: u32,
    pub sample_format: SampleFormat,
}

impl From<&cpal::SupportedStreamConfigRange> for InputConfigRange {
    fn from(range: &cpal::SupportedStreamConfigRange) -> Self {
        Self {
            channels: range.channels(),
            min_rate: range.min_sample_rate().0,
            max_rate: range.max_sample_rate().0,
            sample_format: range.sample_format(),
        }
    }
}

impl fmt::Display for InputConfigRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}ch {}-{} Hz {:?}",
            self.channels, self.min_rate, self.max_rate, self.sample_format
        )
    }
}

pub fn supported_input_ranges(device: &cpal::Device) -> Result<Vec<InputConfigRange>> {
    let ranges = device
        .supported_input_configs()
        .context("Failed to query supported input configs")?
        .map(|range| InputConfigRange::from(&range))
        .collect();
    Ok(ranges)
}

/// Pick the f32 capture format closest to `requested`
///
/// Prefers the requested channel count and rate; otherwise keeps the channel
/// count and moves the rate to the nearest supported one; otherwise takes the
/// f32 range with the fewest channels.
pub fn negotiate(requested: AudioFormat, ranges: &[InputConfigRange]) -> Option<AudioFormat> {
    let float_ranges = || {
        ranges
            .iter()
            .filter(|range| range.sample_format == SampleFormat::F32)
            .filter(|range| range.min_rate <= range.max_rate)
    };
    let nearest_rate =
        |range: &InputConfigRange| requested.sample_rate.clamp(range.min_rate, range.max_rate);

    let same_channels = float_ranges()
        .filter(|range| range.channels == requested.channels)
        .min_by_key(|range| nearest_rate(*range).abs_diff(requested.sample_rate));
    if let Some(range) = same_channels {
        return Some(AudioFormat {
            sample_rate: nearest_rate(range),
            channels: range.channels,
        });
    }

    float_ranges()
        .min_by_key(|range| {
            (
                range.channels,
                nearest_rate(*range).abs_diff(requested.sample_rate),
            )
        })
        .map(|range| AudioFormat {
            sample_rate: nearest_rate(range),
            channels: range.channels,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(channels: u16, min_rate: u32, max_rate: u32, format: SampleFormat) -> InputConfigRange {
        InputConfigRange {
            channels,
            min_rate,
            max_rate,
            sample_format: format,
        }
    }

    #[test]
    fn test_requested_format_when_supported() {
        let ranges = [
            range(2, 8000, 48000, SampleFormat::F32),
            range(1, 8000, 48000, SampleFormat::F32),
        ];
        assert_eq!(
            negotiate(AudioFormat::default(), &ranges),
            Some(AudioFormat::default())
        );
    }

    #[test]
    fn test_rate_moves_to_nearest_supported() {
        let ranges = [
            range(1, 44100, 44100, SampleFormat::F32),
            range(1, 16000, 16000, SampleFormat::F32),
        ];
        assert_eq!(
            negotiate(AudioFormat::default(), &ranges),
            Some(AudioFormat::mono(16000))
        );
    }

    #[test]
    fn test_falls_back_to_fewest_channels() {
        let ranges = [
            range(4, 48000, 48000, SampleFormat::F32),
            range(2, 48000, 48000, SampleFormat::F32),
            range(1, 8000, 8000, SampleFormat::I16),
        ];
        assert_eq!(
            negotiate(AudioFormat::default(), &ranges),
            Some(AudioFormat {
                sample_rate: 48000,
                channels: 2,
            })
        );
    }

    #[test]
    fn test_no_float_input() {
        let ranges = [range(1, 8000, 48000, SampleFormat::I16)];
        assert_eq!(negotiate(AudioFormat::default(), &ranges), None);
        assert_eq!(negotiate(AudioFormat::default(), &[]), None);
    }
}
