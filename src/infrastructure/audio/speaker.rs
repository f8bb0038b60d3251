#[cfg(test)]
#[path = "speaker_test.rs"]
mod tests;

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use cpal::traits::DeviceTrait;
use cpal::traits::StreamTrait;
use cpal::FromSample;
use cpal::Sample;
use cpal::SampleFormat;
use cpal::SizedSample;
use cpal::Stream;
use cpal::StreamConfig;
use tokio::sync::oneshot;

use super::decode::decode;
use super::decode::resample;
use super::decode::DecodedAudio;
use super::device::get_or_default_output;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::AudioPayload;
use crate::domain::models::Player;

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    samples: Vec<f32>,
    playing: Arc<AtomicBool>,
) -> Result<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = usize::from(config.channels);
    let mut position = 0;
    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            for frame in data.chunks_mut(channels) {
                let sample = samples.get(position).copied().unwrap_or(0.0);
                for out in frame.iter_mut() {
                    *out = T::from_sample(sample);
                }
                position += 1;
            }

            if position >= samples.len() {
                playing.store(false, Ordering::SeqCst);
            }
        },
        |err| tracing::error!(error = ?err, "Speaker stream failed"),
        None,
    )?;

    return Ok(stream);
}

fn open_stream(
    device_name: &str,
    audio: DecodedAudio,
    playing: Arc<AtomicBool>,
) -> Result<Stream> {
    let device = get_or_default_output(device_name)?;
    let supported = device.default_output_config()?;
    let sample_format = supported.sample_format();
    let config: StreamConfig = supported.into();
    let samples = resample(&audio.samples, audio.sample_rate, config.sample_rate.0)?;

    let stream = match sample_format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, samples, playing)?,
        SampleFormat::I16 => build_stream::<i16>(&device, &config, samples, playing)?,
        SampleFormat::U16 => build_stream::<u16>(&device, &config, samples, playing)?,
        format => bail!("Unsupported speaker sample format {format}"),
    };
    stream.play()?;

    return Ok(stream);
}

/// Runs on the playback thread, decoding and resampling never block the
/// async runtime.
fn decode_and_open(
    device_name: &str,
    audio: &AudioPayload,
    playing: Arc<AtomicBool>,
) -> Result<Stream> {
    let decoded = decode(audio)?;
    if decoded.samples.is_empty() {
        bail!("Audio is empty");
    }
    tracing::debug!(
        frames = decoded.samples.len(),
        sample_rate = decoded.sample_rate,
        "Playing audio"
    );

    return open_stream(device_name, decoded, playing);
}

struct Playback {
    stop_tx: mpsc::Sender<()>,
    playing: Arc<AtomicBool>,
}

/// Plays decoded audio on a cpal output device from a dedicated thread.
pub struct Speaker {
    device_name: String,
    playback: Option<Playback>,
}

impl Default for Speaker {
    fn default() -> Speaker {
        return Speaker {
            device_name: Config::get(ConfigKey::OutputDevice),
            playback: None,
        };
    }
}

#[async_trait]
impl Player for Speaker {
    async fn play(&mut self, audio: &AudioPayload) -> Result<()> {
        self.stop();

        let playing = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = oneshot::channel::<Result<()>>();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let payload = audio.clone();
        let device_name = self.device_name.to_string();
        let thread_playing = playing.clone();
        thread::spawn(move || {
            let stream = match decode_and_open(&device_name, &payload, thread_playing.clone()) {
                Ok(stream) => stream,
                Err(err) => {
                    thread_playing.store(false, Ordering::SeqCst);
                    if ready_tx.send(Err(err)).is_err() {
                        tracing::debug!("Speaker error dropped, player is gone");
                    }
                    return;
                }
            };
            if ready_tx.send(Ok(())).is_err() {
                return;
            }

            while thread_playing.load(Ordering::SeqCst) {
                match stop_rx.recv_timeout(Duration::from_millis(50)) {
                    Err(mpsc::RecvTimeoutError::Timeout) => continue,
                    _ => break,
                }
            }

            drop(stream);
            thread_playing.store(false, Ordering::SeqCst);
        });

        ready_rx
            .await
            .map_err(|_| return anyhow!("Speaker thread exited unexpectedly"))??;

        self.playback = Some(Playback { stop_tx, playing });

        return Ok(());
    }

    fn stop(&mut self) {
        if let Some(playback) = self.playback.take() {
            playback.playing.store(false, Ordering::SeqCst);
            if playback.stop_tx.send(()).is_err() {
                tracing::debug!("Speaker thread already stopped");
            }
        }
    }

    fn is_playing(&self) -> bool {
        return self
            .playback
            .as_ref()
            .is_some_and(|playback| return playback.playing.load(Ordering::SeqCst));
    }
}
