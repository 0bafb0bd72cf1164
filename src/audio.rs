//! Audio device handling and stream processing

use crate::constants::audio::{DEFAULT_CHANNELS, PREFERRED_SAMPLE_RATE};
use crate::error::{AppError, AppResult};
use crate::state::SharedState;
use cpal::traits::{DeviceTrait, HostTrait};
use tracing::{error, info};

/// Audio configuration and device information
pub struct AudioConfig {
    pub device_name: String,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Names of every input device on the default host
pub fn list_input_devices() -> AppResult<Vec<String>> {
    let host = cpal::default_host();
    Ok(host.input_devices()?.filter_map(|d| d.name().ok()).collect())
}

/// Find and configure an audio input device
pub fn setup_audio_device(device_name: Option<String>) -> AppResult<(cpal::Device, AudioConfig)> {
    let host = cpal::default_host();

    let device = if let Some(name) = device_name {
        host.input_devices()?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| AppError::AudioDevice("Specified device not found".to_string()))?
    } else {
        host.default_input_device()
            .ok_or_else(|| AppError::AudioDevice("No default input device available".to_string()))?
    };

    let device_name = device.name()?;

    let mut supported_configs = device.supported_input_configs()?;
    let config_range = supported_configs
        .next()
        .ok_or_else(|| AppError::AudioDevice("No supported input configs found".to_string()))?;

    let sample_rate = if config_range.min_sample_rate().0 <= PREFERRED_SAMPLE_RATE
        && config_range.max_sample_rate().0 >= PREFERRED_SAMPLE_RATE
    {
        PREFERRED_SAMPLE_RATE
    } else {
        config_range.min_sample_rate().0
    };

    let channels = config_range.channels().min(DEFAULT_CHANNELS);

    info!(device = %device_name, sample_rate, channels, "audio input configured");

    let audio_config = AudioConfig {
        device_name,
        sample_rate,
        channels,
    };

    Ok((device, audio_config))
}

/// Build an audio input stream with the given callback
pub fn build_audio_stream<F>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    data_callback: F,
) -> AppResult<cpal::Stream>
where
    F: FnMut(&[f32], &cpal::InputCallbackInfo) + Send + 'static,
{
    let stream = device.build_input_stream(
        config,
        data_callback,
        |err| error!(%err, "audio stream error"),
        None,
    )?;

    Ok(stream)
}

/// Audio callback that downmixes interleaved frames to mono and fills the ring
pub fn create_audio_callback(
    shared: SharedState,
    channels: u16,
) -> impl FnMut(&[f32], &cpal::InputCallbackInfo) + Send + 'static {
    let mut mono = Vec::new();
    move |data: &[f32], _: &cpal::InputCallbackInfo| {
        downmix(data, channels, &mut mono);
        shared.push_samples(&mono);
    }
}

/// Average interleaved frames into one mono sample each
pub fn downmix(data: &[f32], channels: u16, out: &mut Vec<f32>) {
    let channels = usize::from(channels.max(1));
    out.clear();
    out.extend(
        data.chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_stereo() {
        let mut out = Vec::new();
        downmix(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2, &mut out);
        assert_eq!(out, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_downmix_mono_passthrough() {
        let mut out = vec![7.0];
        downmix(&[0.1, 0.2], 1, &mut out);
        assert_eq!(out, vec![0.1, 0.2]);
        downmix(&[0.3], 0, &mut out);
        assert_eq!(out, vec![0.3]);
    }
}
