use std::io::Cursor;

use super::*;

#[test]
fn mime_parsing_reads_rate_and_bits() {
    assert_eq!(
        parse_audio_mime_type("audio/L16;codec=pcm;rate=24000"),
        PcmFormat {
            bits_per_sample: 16,
            sample_rate: 24_000
        }
    );
    assert_eq!(
        parse_audio_mime_type("audio/L24; RATE=44100"),
        PcmFormat {
            bits_per_sample: 24,
            sample_rate: 44_100
        }
    );
}

#[test]
fn mime_parsing_falls_back_to_defaults() {
    assert_eq!(parse_audio_mime_type("audio/wav"), PcmFormat::default());
    assert_eq!(
        parse_audio_mime_type("audio/Lxx;rate=fast"),
        PcmFormat::default()
    );
}

#[test]
fn header_declares_sizes_and_format() {
    let fmt = PcmFormat {
        bits_per_sample: 16,
        sample_rate: 24_000,
    };
    let h = wav_header(1000, fmt, 1).unwrap();
    assert_eq!(&h[0..4], b"RIFF");
    assert_eq!(u32::from_le_bytes(h[4..8].try_into().unwrap()), 1036);
    assert_eq!(&h[8..16], b"WAVEfmt ");
    assert_eq!(u32::from_le_bytes(h[24..28].try_into().unwrap()), 24_000);
    assert_eq!(u32::from_le_bytes(h[28..32].try_into().unwrap()), 48_000);
    assert_eq!(u16::from_le_bytes(h[32..34].try_into().unwrap()), 2);
    assert_eq!(u16::from_le_bytes(h[34..36].try_into().unwrap()), 16);
    assert_eq!(&h[36..40], b"data");
    assert_eq!(u32::from_le_bytes(h[40..44].try_into().unwrap()), 1000);
}

#[test]
fn wrapped_pcm_is_readable_by_hound() {
    let samples: Vec<i16> = vec![0, 1000, -1000, i16::MAX, i16::MIN, 7];
    let pcm: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    let fmt = PcmFormat {
        bits_per_sample: 16,
        sample_rate: 22_050,
    };
    let wav = wrap_pcm_in_wav(&pcm, fmt).unwrap();
    assert_eq!(wav.len(), WAV_HEADER_LEN + pcm.len());

    let reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, 22_050);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.channels, 1);
    let decoded: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(decoded, samples);
}

#[test]
fn wrap_rejects_fractional_byte_depth() {
    let fmt = PcmFormat {
        bits_per_sample: 12,
        sample_rate: 24_000,
    };
    assert!(wrap_pcm_in_wav(&[0, 0], fmt).is_err());
}

#[test]
fn oversized_rates_and_lengths_are_rejected() {
    let fmt = parse_audio_mime_type("audio/L16;rate=4294967295");
    assert_eq!(fmt.sample_rate, u32::MAX);
    assert!(matches!(
        wrap_pcm_in_wav(&[0, 0], fmt),
        Err(RecapError::Validation(_))
    ));

    let buffer = crate::providers::AudioBuffer {
        data: vec![0; 4],
        mime_type: "audio/L16;rate=4294967295".to_string(),
    };
    assert!(buffer.into_file_bytes(Path::new("segment_001.wav")).is_err());

    let fmt = PcmFormat::default();
    assert!(wav_header(u32::MAX, fmt, 1).is_err());
    assert!(wav_header(u32::MAX - 36, fmt, 1).is_ok());
    let wide = PcmFormat {
        bits_per_sample: 65_528,
        sample_rate: 24_000,
    };
    assert!(wav_header(0, wide, 16).is_err());
    assert!(matches!(
        wrap_pcm_in_wav(&[0, 0], PcmFormat { bits_per_sample: 16, sample_rate: 0 }),
        Err(RecapError::Validation(_))
    ));
}

#[test]
fn container_needed_for_l16_or_non_wav_target() {
    assert!(needs_wav_container("audio/L16;rate=24000", Path::new("a.wav")));
    assert!(needs_wav_container("audio/wav", Path::new("a.mp3")));
    assert!(!needs_wav_container("audio/wav", Path::new("a.WAV")));
}
