//! Real-time audio playback using cpal

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{error, info};

use super::Engine;

/// Real-time audio player
pub struct Player {
    stream: Option<Stream>,
    running: Arc<AtomicBool>,
}

impl Player {
    /// Create a new player
    pub fn new() -> Self {
        Self {
            stream: None,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start playing audio from the engine.
    ///
    /// Opens `device` by name, or the default output device. The device is
    /// asked to run at the engine's sample rate.
    pub fn start(&mut self, engine: Arc<Mutex<Engine>>, device: Option<&str>) -> Result<()> {
        let host = cpal::default_host();
        let device = match device {
            Some(name) => host
                .output_devices()?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| anyhow!("Output device {:?} not found", name))?,
            None => host
                .default_output_device()
                .ok_or_else(|| anyhow!("No output device available"))?,
        };

        let sample_rate = engine
            .lock()
            .map_err(|_| anyhow!("engine lock poisoned"))?
            .config()
            .audio
            .sample_rate;

        let supported = device
            .default_output_config()
            .context("failed to query output config")?;
        let sample_format = supported.sample_format();
        let mut stream_config: StreamConfig = supported.into();
        stream_config.sample_rate = cpal::SampleRate(sample_rate);

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();

        let stream = match sample_format {
            SampleFormat::F32 => self.build_stream::<f32>(&device, &stream_config, engine, running)?,
            SampleFormat::I16 => self.build_stream::<i16>(&device, &stream_config, engine, running)?,
            SampleFormat::U16 => self.build_stream::<u16>(&device, &stream_config, engine, running)?,
            _ => return Err(anyhow!("Unsupported sample format")),
        };

        stream.play()?;
        self.stream = Some(stream);

        info!(
            device = %device.name().unwrap_or_default(),
            sample_rate,
            channels = stream_config.channels,
            "playback started"
        );
        Ok(())
    }

    /// Stop playback
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.stream = None;
    }

    /// Check if currently playing
    pub fn is_playing(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn build_stream<T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>>(
        &self,
        device: &Device,
        config: &StreamConfig,
        engine: Arc<Mutex<Engine>>,
        running: Arc<AtomicBool>,
    ) -> Result<Stream> {
        let channels = config.channels as usize;
        let mut scratch: Vec<f32> = Vec::new();

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                if !running.load(Ordering::SeqCst) {
                    // Fill with silence when stopped
                    for sample in data.iter_mut() {
                        *sample = T::from_sample(0.0f32);
                    }
                    return;
                }

                if let Ok(mut eng) = engine.try_lock() {
                    scratch.resize(data.len(), 0.0);
                    eng.fill_buffer(&mut scratch, channels);
                    for (out, &s) in data.iter_mut().zip(&scratch) {
                        *out = T::from_sample(s);
                    }
                } else {
                    // Mutex locked, fill with silence
                    for sample in data.iter_mut() {
                        *sample = T::from_sample(0.0f32);
                    }
                }
            },
            |err| {
                error!(%err, "audio stream error");
            },
            None,
        )?;

        Ok(stream)
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the default output device name
pub fn default_device_name() -> Option<String> {
    let host = cpal::default_host();
    host.default_output_device()
        .and_then(|d| d.name().ok())
}

/// List all available output devices
pub fn list_output_devices() -> Vec<(String, StreamConfig)> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(output_devices) = host.output_devices() {
        for device in output_devices {
            if let (Ok(name), Ok(config)) = (device.name(), device.default_output_config()) {
                devices.push((name, config.into()));
            }
        }
    }

    devices
}
