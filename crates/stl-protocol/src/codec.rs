/// Codec for `application/x-www-form-urlencoded` parameter lists, used for
/// both query strings and write bodies.
pub struct FormCodec;

impl FormCodec {
    /// Encode pairs in order.
    pub fn encode<K: AsRef<str>, V: AsRef<str>>(pairs: &[(K, V)]) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (k, v) in pairs {
            serializer.append_pair(k.as_ref(), v.as_ref());
        }
        serializer.finish()
    }

    /// Decode pairs in order.
    pub fn decode(data: &[u8]) -> Vec<(String, String)> {
        form_urlencoded::parse(data)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_keeps_order() {
        let encoded = FormCodec::encode(&[("format", "number"), ("schema", "s"), ("timeLine", "t")]);
        assert_eq!(encoded, "format=number&schema=s&timeLine=t");
    }

    #[test]
    fn encode_escapes_reserved() {
        let encoded = FormCodec::encode(&[("value", "a&b=c d")]);
        assert_eq!(encoded, "value=a%26b%3Dc+d");
    }

    #[test]
    fn decode_reverses_escapes() {
        let pairs = FormCodec::decode(b"value=a%26b%3Dc+d&time=5");
        assert_eq!(
            pairs,
            vec![
                ("value".to_string(), "a&b=c d".to_string()),
                ("time".to_string(), "5".to_string()),
            ]
        );
    }

    #[test]
    fn empty_pairs() {
        let empty: [(&str, &str); 0] = [];
        assert_eq!(FormCodec::encode(&empty), "");
        assert!(FormCodec::decode(b"").is_empty());
    }
}
