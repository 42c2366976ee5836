use std::collections::HashMap;

use http::Request;
use serde::de::DeserializeOwned;

use crate::helpers::traits::DecodeForm;
use crate::Body;

pub trait RequestUtils {
    fn get_json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error>;
    fn get_text(&self) -> String;
    fn get_form(&self) -> HashMap<String, String>;
}

impl RequestUtils for Request<Body> {
    fn get_json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let bytes = self.body().bytes.as_slice();
        match bytes.is_empty() {
            true => serde_json::from_str("{}"),
            false => serde_json::from_slice(bytes),
        }
    }

    fn get_text(&self) -> String {
        String::from_utf8_lossy(self.body().bytes.as_slice()).into()
    }

    /// Parsed form fields, falling back to decoding the raw body when the
    /// parser did not decode it.
    fn get_form(&self) -> HashMap<String, String> {
        let body = self.body();
        if !body.form.is_empty() {
            return body.form.clone();
        }
        body.bytes.decode_form()
    }
}
