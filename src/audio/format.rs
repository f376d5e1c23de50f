// Recordings are always mono 16-bit signed PCM. Capture runs in f32 and the
// WAV sink converts on write; only the sample rate is configurable.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioFormat {
    pub const BITS_PER_SAMPLE: u16 = 16;

    /// Narrowband voice: 8kHz mono
    pub const NARROWBAND_RATE: u32 = 8000;

    pub fn mono(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 1,
        }
    }

    /// Calculate number of samples for a given duration in seconds
    pub fn samples_for_duration(&self, seconds: f32) -> usize {
        (self.sample_rate as f32 * seconds) as usize * self.channels as usize
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::mono(Self::NARROWBAND_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_for_duration() {
        let format = AudioFormat::default();
        assert_eq!(format.samples_for_duration(0.5), 4000);
        assert_eq!(format.samples_for_duration(60.0), 480_000);

        let stereo = AudioFormat {
            sample_rate: 16000,
            channels: 2,
        };
        assert_eq!(stereo.samples_for_duration(1.0), 32000);
    }
}
