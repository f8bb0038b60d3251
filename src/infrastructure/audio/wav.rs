#[cfg(test)]
#[path = "wav_test.rs"]
mod tests;

use std::io::Cursor;

use anyhow::Result;
use hound::SampleFormat;
use hound::WavSpec;
use hound::WavWriter;

/// Averages interleaved frames down to a single channel.
pub fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }

    return data
        .chunks(channels)
        .map(|frame| return frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();
}

/// Encodes mono samples as a 16-bit PCM WAV file.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(vec![]);
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for sample in samples {
            let pcm = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(pcm)?;
        }
        writer.finalize()?;
    }

    return Ok(cursor.into_inner());
}
