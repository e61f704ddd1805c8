//! WebVTT caption track parser.
//!
//! Flattens a `.vtt` caption file into one plain-text document with a
//! `[start --> end] text` line per cue, preserving cue order. Header and
//! metadata blocks (`WEBVTT`, `NOTE`, `STYLE`, `REGION`) are stripped,
//! embedded markup tags are removed, and the five standard HTML entities
//! are decoded. Cues left empty after decoding are dropped.
//!
//! A track with no recognizable cue blocks yields an empty string; the
//! ingestion pipeline treats that as content-free input rather than an
//! error.

use crate::split::normalize_line_endings;
use regex::Regex;
use std::sync::OnceLock;

fn header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(?:WEBVTT|NOTE|STYLE|REGION).*$").unwrap())
}

fn cue_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Timestamp range plus optional same-line cue settings, followed by
        // one or more non-empty text lines.
        Regex::new(
            r"(\d{2}:\d{2}:\d{2}\.\d{3} --> \d{2}:\d{2}:\d{2}\.\d{3}(?:[ \t][^\n]*)?)\n([^\n]+(?:\n[^\n]+)*)",
        )
        .unwrap()
    })
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").unwrap())
}

/// Decode the five entities WebVTT payload text is allowed to escape.
fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

/// Parse a raw WebVTT caption track into normalized timestamped text.
pub fn parse_vtt(content: &str) -> String {
    let normalized = normalize_line_endings(content);
    let cleaned = header_regex().replace_all(&normalized, "");

    let mut blocks: Vec<String> = Vec::new();
    for caps in cue_regex().captures_iter(&cleaned) {
        let range = caps[1].trim_end();
        let text = decode_entities(&tag_regex().replace_all(&caps[2], ""));
        let text = text.trim();
        if !text.is_empty() {
            blocks.push(format!("[{range}] {text}"));
        }
    }

    blocks.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "WEBVTT\n\n00:00:01.000 --> 00:00:04.000\nHello world\n\n00:00:04.500 --> 00:00:08.000\nSecond line here\n";

    #[test]
    fn test_parses_basic_cues() {
        let parsed = parse_vtt(SAMPLE);
        let lines: Vec<&str> = parsed.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "[00:00:01.000 --> 00:00:04.000] Hello world");
        assert_eq!(lines[1], "[00:00:04.500 --> 00:00:08.000] Second line here");
    }

    #[test]
    fn test_strips_header_and_metadata_blocks() {
        let input = "WEBVTT - with a description\nNOTE this is a comment\nSTYLE\nREGION\n\n00:00:01.000 --> 00:00:02.000\ntext\n";
        let parsed = parse_vtt(input);

        assert_eq!(parsed, "[00:00:01.000 --> 00:00:02.000] text");
    }

    #[test]
    fn test_strips_markup_and_decodes_entities() {
        let input = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\n<v Roger>Ben &amp; Jerry say &quot;hi&quot;</v>\n";
        let parsed = parse_vtt(input);

        assert_eq!(
            parsed,
            "[00:00:01.000 --> 00:00:02.000] Ben & Jerry say \"hi\""
        );
    }

    #[test]
    fn test_drops_cues_empty_after_decoding() {
        // Two cue blocks: one is only a markup tag and must be dropped.
        let input = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\n<b></b>\n\n00:00:03.000 --> 00:00:04.000\nstill here\n";
        let parsed = parse_vtt(input);
        let lines: Vec<&str> = parsed.lines().collect();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0], "[00:00:03.000 --> 00:00:04.000] still here");
    }

    #[test]
    fn test_keeps_cue_settings_in_range_label() {
        let input = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000 align:start position:0%\ncaption\n";
        let parsed = parse_vtt(input);

        assert_eq!(
            parsed,
            "[00:00:01.000 --> 00:00:02.000 align:start position:0%] caption"
        );
    }

    #[test]
    fn test_multi_line_cue_text_is_preserved() {
        let input = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nfirst line\nsecond line\n";
        let parsed = parse_vtt(input);

        assert_eq!(
            parsed,
            "[00:00:01.000 --> 00:00:02.000] first line\nsecond line"
        );
    }

    #[test]
    fn test_no_cues_yields_empty_output() {
        assert_eq!(parse_vtt("WEBVTT\n\nNOTE nothing else\n"), "");
        assert_eq!(parse_vtt(""), "");
    }

    #[test]
    fn test_crlf_input_parses_identically() {
        let crlf = SAMPLE.replace('\n', "\r\n");
        assert_eq!(parse_vtt(&crlf), parse_vtt(SAMPLE));
    }
}
