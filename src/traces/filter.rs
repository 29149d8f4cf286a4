use std::sync::LazyLock;

use anyhow::{bail, Result};
use regex::Regex;

use crate::traces::shape::{GAE_SERVICE_KEY, GAE_SERVICE_VERSION_KEY, HTTP_STATUS_CODE_KEY};

// One whitespace-delimited filter token; double-quoted spans (with \"
// escapes) stay part of a single token.
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:[^\s"]+|"(?:\\"|[^"])*")+"#).unwrap());

/// Friendly filter keys and the native keys they translate to. Anything
/// not listed passes through unchanged, which keeps raw native field
/// names and arbitrary label keys usable.
const KEY_ALIASES: &[(&str, &str)] = &[
    ("RootSpan", "root"),
    ("SpanName", "span"),
    ("HasLabel", "label"),
    ("MinLatency", "latency"),
    ("URL", "url"),
    ("Method", "method"),
    ("Version", GAE_SERVICE_VERSION_KEY),
    ("Service", GAE_SERVICE_KEY),
    ("Status", HTTP_STATUS_CODE_KEY),
];

/// Translate operator-typed query text into the native filter syntax of
/// the trace service. Token order is preserved; the first malformed token
/// fails the whole translation.
pub fn translate(query_text: &str) -> Result<String> {
    let mut filters = Vec::new();
    for token in TOKEN_RE.find_iter(query_text) {
        let (key, value) = translate_token(token.as_str())?;
        filters.push(format!("{key}:{value}"));
    }
    Ok(filters.join(" "))
}

fn translate_token(token: &str) -> Result<(String, String)> {
    let Some((mut key, mut value)) = token.split_once(':') else {
        bail!("bad filter [{token}]. Must be in form [key]:[value]");
    };

    // Generic label filters come in as LABEL:[key]:[value]; the service
    // expects the LABEL: prefix dropped.
    if key.eq_ignore_ascii_case("label") {
        let Some((label_key, label_value)) = value.split_once(':') else {
            bail!("bad filter [{token}]. Must be in form LABEL:[key]:[value]");
        };
        key = label_key;
        value = label_value;
    }

    let key = KEY_ALIASES
        .iter()
        .find(|(friendly, _)| *friendly == key)
        .map(|(_, native)| *native)
        .unwrap_or(key);

    // The service only honors +/^ match modifiers on the key, so move
    // them off the front of the value.
    let bytes = value.as_bytes();
    if bytes.len() < 2 {
        return Ok((key.to_string(), value.to_string()));
    }
    let (first, second) = (bytes[0], bytes[1]);
    if (first == b'+' && second == b'^') || (first == b'^' && second == b'+') {
        Ok((format!("+^{key}"), value[2..].to_string()))
    } else if first == b'+' || first == b'^' {
        Ok((format!("{}{key}", first as char), value[1..].to_string()))
    } else {
        Ok((key.to_string(), value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_maps_friendly_keys_to_native_keys() {
        let cases = [
            ("RootSpan:rootspan1", "root:rootspan1"),
            ("SpanName:span1", "span:span1"),
            ("HasLabel:key1", "label:key1"),
            ("MinLatency:100ms", "latency:100ms"),
            ("URL:http://www.test.com", "url:http://www.test.com"),
            ("Method:GET", "method:GET"),
            ("Version:1.0.0", "g.co/gae/app/version:1.0.0"),
            ("Service:servicename", "g.co/gae/app/module:servicename"),
            ("Status:200", "/http/status_code:200"),
        ];
        for (input, expected) in cases {
            assert_eq!(translate(input).expect(input), expected);
        }
    }

    #[test]
    fn translate_passes_unknown_keys_through() {
        assert_eq!(translate("key1:value1").expect("translate"), "key1:value1");
    }

    #[test]
    fn translate_is_case_sensitive_for_aliases() {
        assert_eq!(
            translate("rootspan:value").expect("translate"),
            "rootspan:value"
        );
    }

    #[test]
    fn translate_drops_label_prefix() {
        assert_eq!(
            translate("LABEL:key1:value1").expect("translate"),
            "key1:value1"
        );
        // LABEL is matched case-insensitively.
        assert_eq!(
            translate("label:key1:value1").expect("translate"),
            "key1:value1"
        );
    }

    #[test]
    fn translate_rejects_tokens_without_colon() {
        let err = translate("badfilter").expect_err("should fail");
        assert_eq!(
            err.to_string(),
            "bad filter [badfilter]. Must be in form [key]:[value]"
        );
    }

    #[test]
    fn translate_rejects_malformed_label_tokens() {
        let err = translate("LABEL:badfilter").expect_err("should fail");
        assert_eq!(
            err.to_string(),
            "bad filter [LABEL:badfilter]. Must be in form LABEL:[key]:[value]"
        );
    }

    #[test]
    fn translate_aborts_on_first_bad_token() {
        let err = translate("LABEL:latency:100ms badfilter").expect_err("should fail");
        assert!(err.to_string().contains("bad filter [badfilter]"));

        let err = translate("LABEL:key1:value1 LABEL:badfilter").expect_err("should fail");
        assert!(err.to_string().contains("bad filter [LABEL:badfilter]"));
    }

    #[test]
    fn translate_moves_match_modifiers_to_key() {
        let cases = [
            ("key1:+value1", "+key1:value1"),
            ("key1:^value1", "^key1:value1"),
            ("key1:^+value1", "+^key1:value1"),
            ("key1:+^value1", "+^key1:value1"),
            ("key1:+v", "+key1:v"),
            ("key1:^v", "^key1:v"),
            ("key1:^+v", "+^key1:v"),
            ("key1:+^v", "+^key1:v"),
        ];
        for (input, expected) in cases {
            assert_eq!(translate(input).expect(input), expected);
        }
    }

    #[test]
    fn translate_leaves_single_char_values_alone() {
        assert_eq!(translate("key1:+").expect("translate"), "key1:+");
        assert_eq!(translate("key1:^").expect("translate"), "key1:^");
    }

    #[test]
    fn translate_accepts_empty_values() {
        assert_eq!(translate("key1:").expect("translate"), "key1:");
    }

    #[test]
    fn translate_handles_empty_and_whitespace_input() {
        assert_eq!(translate("").expect("translate"), "");
        assert_eq!(translate("   \t ").expect("translate"), "");
    }

    #[test]
    fn translate_keeps_quoted_values_atomic() {
        assert_eq!(
            translate(r#"SpanName:"two words""#).expect("translate"),
            r#"span:"two words""#
        );
        assert_eq!(
            translate(r#"key1:"a \"quoted\" value" key2:b"#).expect("translate"),
            r#"key1:"a \"quoted\" value" key2:b"#
        );
    }

    #[test]
    fn translate_preserves_token_order_without_dedup() {
        assert_eq!(
            translate("Service:a Service:a key:v").expect("translate"),
            "g.co/gae/app/module:a g.co/gae/app/module:a key:v"
        );
    }

    #[test]
    fn translate_is_idempotent_on_plain_tokens() {
        let first = translate("RootSpan:x key1:value1 latency:100ms").expect("translate");
        let second = translate(&first).expect("translate twice");
        assert_eq!(first, second);
    }
}
