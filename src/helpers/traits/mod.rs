pub mod bytes;
pub mod http_request;
pub mod http_stream;

use std::collections::HashMap;

use percent_encoding::percent_decode_str;

// DecodeForm trait 정의
pub trait DecodeForm {
    /// Decodes `application/x-www-form-urlencoded` data.
    fn decode_form(&self) -> HashMap<String, String>;
}

impl DecodeForm for str {
    fn decode_form(&self) -> HashMap<String, String> {
        let mut fields = HashMap::new();

        // username=a&password=b%21 -> {username: a, password: b!}
        for pair in self.split('&') {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            fields.insert(url_decode(key), url_decode(value));
        }

        fields
    }
}

impl DecodeForm for [u8] {
    fn decode_form(&self) -> HashMap<String, String> {
        String::from_utf8_lossy(self).decode_form()
    }
}

/// Decodes `+` as space and `%XX` escapes. Malformed escapes are kept as is.
pub fn url_decode(input: &str) -> String {
    let spaced = input.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
