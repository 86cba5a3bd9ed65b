//! `application/x-www-form-urlencoded` decoding.
//!
//! A `%` that is not followed by two hex digits is kept as a literal byte;
//! decoding never fails and never grows the input.

use percent_encoding::percent_decode;

/// Decode percent escapes and `+`-as-space.
pub fn decode(input: &[u8]) -> Vec<u8> {
    // `+` is substituted first; an encoded plus (`%2B`) is only produced by
    // the percent pass, so it survives as a literal `+`.
    let spaced: Vec<u8> = input
        .iter()
        .map(|&b| if b == b'+' { b' ' } else { b })
        .collect();
    percent_decode(&spaced).collect()
}

/// Find the raw (still encoded) value of the first `name=value` pair.
///
/// Pairs are separated by `&`; the value runs to the next `&` or the end of
/// the body. A trailing line break after the last pair is ignored.
pub fn form_field<'a>(body: &'a [u8], name: &str) -> Option<&'a [u8]> {
    let end = body
        .iter()
        .rposition(|b| *b != b'\r' && *b != b'\n')
        .map_or(0, |i| i + 1);

    body[..end].split(|b| *b == b'&').find_map(|pair| {
        let eq = pair.iter().position(|b| *b == b'=')?;
        (&pair[..eq] == name.as_bytes()).then(|| &pair[eq + 1..])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use percent_encoding::{percent_encode, NON_ALPHANUMERIC};

    fn encode(input: &[u8]) -> String {
        percent_encode(input, NON_ALPHANUMERIC).to_string()
    }

    fn encode_form(input: &[u8]) -> String {
        encode(input).replace("%20", "+")
    }

    #[test]
    fn plus_is_space() {
        assert_eq!(decode(b"a+b"), b"a b");
        assert_eq!(decode(b"echo+42"), b"echo 42");
    }

    #[test]
    fn percent_escapes() {
        assert_eq!(decode(b"100%25"), b"100%");
        assert_eq!(decode(b"a%2Bb"), b"a+b");
        assert_eq!(decode(b"%2f%2F"), b"//");
        assert_eq!(decode(b"%00"), b"\0");
        assert_eq!(decode(b"%E2%9C%93"), "✓".as_bytes());
    }

    #[test]
    fn malformed_escapes_stay_literal() {
        assert_eq!(decode(b"bad%"), b"bad%");
        assert_eq!(decode(b"bad%4"), b"bad%4");
        assert_eq!(decode(b"%zz"), b"%zz");
        assert_eq!(decode(b"%"), b"%");
        assert_eq!(decode(b""), b"");
    }

    #[test]
    fn never_longer_than_input() {
        let inputs: [&[u8]; 5] = [b"%41%42", b"++", b"abc", b"%4", b"%%%"];
        for input in inputs {
            assert!(decode(input).len() <= input.len());
        }
    }

    #[test]
    fn round_trips_encoded_input() {
        let samples: [&[u8]; 5] = [
            b"ls -la /tmp",
            b"echo 'a+b' && echo \"%PATH%\"",
            b"printf '\\x00\\xff' | od",
            "unicode ✓ ünïcödé".as_bytes(),
            &[0, 1, 2, 254, 255, b'+', b'%', b' '],
        ];
        for sample in samples {
            assert_eq!(decode(encode(sample).as_bytes()), sample);
            assert_eq!(decode(encode_form(sample).as_bytes()), sample);
        }
    }

    #[test]
    fn finds_field_among_others() {
        assert_eq!(form_field(b"cmd=ls+-l", "cmd"), Some(&b"ls+-l"[..]));
        assert_eq!(form_field(b"a=1&cmd=uptime&b=2", "cmd"), Some(&b"uptime"[..]));
        assert_eq!(form_field(b"cmd=", "cmd"), Some(&b""[..]));
        assert_eq!(form_field(b"cmd=first&cmd=second", "cmd"), Some(&b"first"[..]));
    }

    #[test]
    fn field_name_must_match_exactly() {
        assert_eq!(form_field(b"xcmd=ls", "cmd"), None);
        assert_eq!(form_field(b"cmdx=ls", "cmd"), None);
        assert_eq!(form_field(b"cmd", "cmd"), None);
        assert_eq!(form_field(b"", "cmd"), None);
    }

    #[test]
    fn trailing_newline_ignored() {
        assert_eq!(form_field(b"cmd=date\r\n", "cmd"), Some(&b"date"[..]));
    }
}
