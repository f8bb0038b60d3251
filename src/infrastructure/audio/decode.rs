#[cfg(test)]
#[path = "decode_test.rs"]
mod tests;

use std::io::Cursor;
use std::io::ErrorKind;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use rubato::FastFixedIn;
use rubato::PolynomialDegree;
use rubato::Resampler;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::wav::downmix;
use crate::domain::models::AudioPayload;

const RESAMPLE_CHUNK_SIZE: usize = 1024;

/// Mono samples in `[-1.0, 1.0]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

pub fn decode(audio: &AudioPayload) -> Result<DecodedAudio> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(audio.bytes.clone())), Default::default());
    let mut hint = Hint::new();
    hint.with_extension(audio.extension());
    hint.mime_type(&audio.mime_type);

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|track| return track.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| return anyhow!("No playable audio track found"))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples = vec![];
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err)) if err.kind() == ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(err) => return Err(err.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = spec.rate;
                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);
                samples.extend(downmix(buffer.samples(), spec.channels.count()));
            }
            Err(SymphoniaError::DecodeError(err)) => {
                tracing::warn!(error = err, "Skipping undecodable audio packet");
            }
            Err(err) => return Err(err.into()),
        }
    }

    if sample_rate == 0 {
        bail!("Audio has no sample rate");
    }

    return Ok(DecodedAudio {
        samples,
        sample_rate,
    });
}

/// Converts mono samples between sample rates.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let mut resampler = FastFixedIn::<f32>::new(
        ratio,
        1.0,
        PolynomialDegree::Cubic,
        RESAMPLE_CHUNK_SIZE,
        1,
    )?;

    let mut res = vec![];
    for chunk in samples.chunks(RESAMPLE_CHUNK_SIZE) {
        let mut chunk = chunk.to_vec();
        chunk.resize(RESAMPLE_CHUNK_SIZE, 0.0);
        let mut out = resampler.process(&[chunk], None)?;
        res.append(&mut out[0]);
    }

    res.truncate((samples.len() as f64 * ratio).ceil() as usize);

    return Ok(res);
}
