use crate::field::Utf16Modifier;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use regex::Regex;
use std::sync::LazyLock;

const WINDASH_CHARS: [char; 2] = ['-', '/'];

fn utf16_bytes(input: &str, utf16modifier: &Option<Utf16Modifier>) -> Vec<u8> {
    match utf16modifier {
        Some(Utf16Modifier::Utf16le | Utf16Modifier::Wide) => input
            .encode_utf16()
            .flat_map(|x| x.to_le_bytes())
            .collect(),
        Some(Utf16Modifier::Utf16be) => input
            .encode_utf16()
            .flat_map(|x| x.to_be_bytes())
            .collect(),
        Some(Utf16Modifier::Utf16) => {
            let mut bytes = vec![0xFF, 0xFE];
            bytes.extend(input.encode_utf16().flat_map(|x| x.to_le_bytes()));
            bytes
        }
        None => input.as_bytes().to_vec(),
    }
}

/// Base64 encode a value, dropping the trailing character that still depends
/// on whatever follows the value in the encoded haystack.
pub fn encode_base64(input: &str, utf16modifier: &Option<Utf16Modifier>) -> String {
    let mut encoded = STANDARD_NO_PAD.encode(utf16_bytes(input, utf16modifier));
    if encoded.len() % 4 == 2 || encoded.len() % 4 == 3 {
        encoded.pop();
    }
    encoded
}

/// The three base64 renderings of a value, one per possible alignment of the
/// value inside a larger encoded blob.
pub fn encode_base64_offset(input: &str, utf16modifier: &Option<Utf16Modifier>) -> Vec<String> {
    let mut encoded = vec![];

    let char_width = match utf16modifier {
        Some(_) => 2,
        None => 1,
    };

    let output_0 = encode_base64(input, utf16modifier);
    if !output_0.is_empty() {
        encoded.push(output_0);
    }

    for shift in 1..=2 {
        let padded = format!("{}{}", "\0".repeat(shift * char_width), input);
        let mut output = encode_base64(padded.as_str(), utf16modifier);
        let skip = shift * char_width * (1 + char_width) - (shift - 1);
        if output.len() > skip {
            output.drain(0..skip);
            encoded.push(output)
        }
    }

    encoded
}

// A dash or slash that opens a word: start of value or after whitespace
static WINDASH_FLAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)([-/])\w").expect("windash pattern is valid"));

/// Every combination of `-flag` and `/flag` spellings of the command line flags.
/// The original value comes first; duplicates are dropped.
pub fn windash_variations(input: &str) -> Vec<String> {
    let positions: Vec<usize> = WINDASH_FLAG
        .captures_iter(input)
        .filter_map(|c| c.get(1).map(|m| m.start()))
        .collect();

    let mut result = vec![input.to_string()];
    for position in positions {
        let previous = result.clone();
        for base in previous {
            for windash in WINDASH_CHARS {
                let mut variation = base.clone();
                variation.replace_range(position..position + 1, windash.encode_utf8(&mut [0; 4]));
                if !result.contains(&variation) {
                    result.push(variation);
                }
            }
        }
    }

    result
}
