//! Audio decoding using Symphonia

use super::signal::Signal;
use crate::error::DetectionError;
use crate::preprocessing::channel_mixer::first_channel;
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

/// Decode an audio file to 16-bit PCM
///
/// Only the first channel is kept. Sample formats other than 16-bit are
/// converted by Symphonia.
///
/// # Arguments
///
/// * `path` - Path to audio file
///
/// # Returns
///
/// First-channel samples with the file's sample rate
///
/// # Errors
///
/// Returns `DetectionError::DecodingError` if the file cannot be opened,
/// probed or decoded, or holds no audio track
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<Signal, DetectionError> {
    let path = path.as_ref();
    log::debug!("Decoding audio file: {}", path.display());

    let decoding = |what: &str, e: &dyn std::fmt::Display| {
        DetectionError::DecodingError(format!("{}: {}: {}", path.display(), what, e))
    };

    let src = File::open(path).map_err(|e| decoding("open failed", &e))?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();

    let probed = get_probe()
        .format(&hint, mss, &fmt_opts, &meta_opts)
        .map_err(|e| decoding("unsupported format", &e))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| decoding("no audio track", &"no supported audio tracks found"))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| decoding("no sample rate", &"track does not declare a sample rate"))?;
    let mut decoder = get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decoding("unsupported codec", &e))?;

    let mut samples: Vec<i16> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(_) => break,
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let channels = spec.channels.count();

                let mut buffer = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);
                samples.extend(first_channel(buffer.samples(), channels)?);
            }
            Err(SymphoniaError::DecodeError(e)) => {
                // Corrupted packets are skipped
                log::warn!("Skipping undecodable packet in {}: {}", path.display(), e);
                continue;
            }
            Err(e) => return Err(decoding("decode failed", &e)),
        }
    }

    log::debug!(
        "Decoded {} samples at {} Hz from {}",
        samples.len(),
        sample_rate,
        path.display()
    );

    Ok(Signal::new(samples, sample_rate))
}
