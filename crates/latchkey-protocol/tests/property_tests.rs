//! Property-based tests for the frame decoder.
//!
//! These tests use proptest to generate random byte streams and verify that
//! the decoder's buffering and matching invariants hold for all of them.

use latchkey_core::constants::{FRAME_END, FRAME_START, MAX_FRAME_BUFFER};
use latchkey_protocol::FrameDecoder;
use proptest::prelude::*;

/// Strategy for arbitrary bytes that never close a frame.
fn bytes_without_cr() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>().prop_filter("no CR", |b| *b != FRAME_END), 0..200)
}

/// Strategy for arbitrary bytes that never open a frame.
fn bytes_without_lf() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>().prop_filter("no LF", |b| *b != FRAME_START), 0..200)
}

/// Strategy for codes the reader can actually emit.
fn reader_code() -> impl Strategy<Value = String> {
    prop::string::string_regex("[0-9A-F]{1,26}").expect("Failed to create code regex strategy")
}

/// Strategy for noise that cannot contain a delimiter.
fn noise() -> impl Strategy<Value = String> {
    prop::string::string_regex("[ -~]{0,10}").expect("Failed to create noise regex strategy")
}

/// Strategy for streams holding both delimiters where every LF is followed
/// directly by another delimiter, so no LF can open a non-empty code.
fn delimiters_without_frame() -> impl Strategy<Value = Vec<u8>> {
    let token = prop_oneof![
        prop::collection::vec(
            any::<u8>().prop_filter("no delimiter", |b| *b != FRAME_START && *b != FRAME_END),
            1..8,
        ),
        Just(vec![FRAME_END]),
        Just(vec![FRAME_START, FRAME_END]),
        Just(vec![FRAME_START, FRAME_START, FRAME_END]),
    ];
    prop::collection::vec(token, 0..40).prop_map(|tokens| tokens.concat())
}

proptest! {
    /// Property: A stream without CR never produces a code.
    #[test]
    fn prop_no_code_without_terminator(input in bytes_without_cr()) {
        let mut decoder = FrameDecoder::new();
        for byte in input {
            prop_assert!(decoder.feed(byte).is_none());
        }
    }

    /// Property: A stream without LF never produces a code.
    #[test]
    fn prop_no_code_without_start(input in bytes_without_lf()) {
        let mut decoder = FrameDecoder::new();
        for byte in input {
            prop_assert!(decoder.feed(byte).is_none());
        }
    }

    /// Property: LF and CR in the stream are not enough; without a code
    /// between them nothing is produced.
    #[test]
    fn prop_no_code_without_code_between_delimiters(input in delimiters_without_frame()) {
        let mut decoder = FrameDecoder::new();
        for byte in input {
            prop_assert!(decoder.feed(byte).is_none());
        }
    }

    /// Property: The buffer never holds more than the limit, whatever arrives.
    #[test]
    fn prop_buffer_is_bounded(input in prop::collection::vec(any::<u8>(), 0..500)) {
        let mut decoder = FrameDecoder::new();
        for byte in input {
            if decoder.feed(byte).is_some() {
                decoder.reset();
            }
            prop_assert!(decoder.len() <= MAX_FRAME_BUFFER);
        }
    }

    /// Property: More than a buffer's worth of frameless input overflows.
    #[test]
    fn prop_long_frameless_input_overflows(
        input in prop::collection::vec(
            any::<u8>().prop_filter("no CR", |b| *b != FRAME_END),
            MAX_FRAME_BUFFER + 1..300,
        )
    ) {
        let mut decoder = FrameDecoder::new();
        for byte in &input {
            prop_assert!(decoder.feed(*byte).is_none());
        }
        prop_assert!(decoder.stats().overflows >= 1);
        prop_assert!(decoder.len() <= MAX_FRAME_BUFFER);
    }

    /// Property: A well-formed frame behind short noise decodes to its code.
    #[test]
    fn prop_framed_code_is_recovered(
        prefix in noise(),
        code in reader_code(),
        suffix in noise(),
    ) {
        let line = format!("{}\n{}\r{}", prefix, code, suffix);
        let mut decoder = FrameDecoder::new();
        let decoded = decoder.feed_slice(line.as_bytes());
        prop_assert_eq!(decoded.map(|c| c.into_inner()), Some(code));
    }
}
