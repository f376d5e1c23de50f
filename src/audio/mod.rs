pub mod capture;
pub mod device;
pub mod format;
pub mod playback;
pub mod sink;
pub mod wav_sink;

pub use capture::{AudioCapture, CaptureStream};
pub use format::AudioFormat;
pub use playback::AudioPlayback;
pub use sink::AudioSink;
pub use wav_sink::WavSink;
