// File: core/json.rs
// JSON helpers: response parsing and request body serialization.

use super::error::CoreError;
use serde::Serialize;
use std::io;

/// Parses a response body into `T`.
/// `context` names the call site in the warning emitted on failure.
pub fn parse_json_from_text<T: for<'de> serde::Deserialize<'de>>(
    response_text: &str,
    context: &str,
) -> Result<T, CoreError> {
    serde_json::from_str(response_text).map_err(|e| {
        log::warn!("Failed to parse JSON for {}: {}", context, e);
        CoreError::from(e)
    })
}

/// Compact output with a space after `,` and `:` (`{"k": "v", "n": [1, 2]}`).
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Serializes a request payload the way it goes on the wire.
pub fn to_body_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CoreError> {
    let mut out = Vec::with_capacity(128);
    let mut ser = serde_json::Serializer::with_formatter(&mut out, SpacedFormatter);
    value.serialize(&mut ser)?;
    // serde_json only writes valid UTF-8
    String::from_utf8(out).map_err(|e| CoreError::InvalidBody(e.to_string()))
}
