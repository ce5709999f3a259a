//! Purpose: Provide the internal JSON decode entrypoint for file content.
//! Exports: `from_slice`.
//! Notes: Error mapping is done by callsites so path and default context stay explicit.

use serde_json::Value;

pub(crate) fn from_slice(input: &[u8]) -> Result<Value, serde_json::Error> {
    serde_json::from_slice(input)
}
