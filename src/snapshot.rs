//! # Snapshot Codec
//!
//! Converts between a live [`FsState`] and the [`Snapshot`] document that
//! persists it.
//!
//! ## Document Layout
//!
//! ```text
//! {
//!   "ATTRS":      { "<path>": { "st_mode": .., "st_nlink": .., ... }, ... },
//!   "DATA":       { "<path>": "<utf8 text>" | ["<base64>"], ... },
//!   "EXTRAATTRS": { "<path>": "<utf8 text>" | ["<base64>"], ... },
//!   "FSMETA":     { "DEFAULTUMASK": <integer> },
//!   "LOOKUPMAP":  { "<path>": { "ENTITYTYPE": "FILES" | "FOLDERS" }, ... }
//! }
//! ```
//!
//! The root is the empty-string key.
//!
//! ## Binary Safety
//!
//! Byte blobs in `DATA` and `EXTRAATTRS` that are valid UTF-8 are stored as
//! bare strings. Anything else is stored as a one-element array holding the
//! standard, padded Base64 encoding of the bytes. The shape alone tells the
//! decoder which case it is looking at, so text that happens to look like an
//! array is still a bare string and round-trips unchanged.
//!
//! The reserved export file ([`EXPORT_PATH`]) is left out of every store when
//! encoding, so a snapshot never contains itself.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::store::{EXPORT_PATH, FsState};
use crate::{Attributes, EntityKind, FsError, FsMeta};

/// One byte blob in its binary-safe document form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EncodedBytes {
    /// Bytes that decoded cleanly as UTF-8.
    Text(String),
    /// Single-element sequence holding the Base64 of arbitrary bytes.
    Base64(Vec<String>),
}

impl EncodedBytes {
    /// Encode raw bytes, preferring the bare-text form.
    pub fn encode(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => EncodedBytes::Text(text.to_owned()),
            Err(_) => EncodedBytes::Base64(vec![STANDARD.encode(bytes)]),
        }
    }

    /// Recover the raw bytes.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidSnapshot`] if the sequence form does not hold
    ///   exactly one element or the element is not valid Base64
    pub fn decode(&self) -> Result<Vec<u8>, FsError> {
        match self {
            EncodedBytes::Text(text) => Ok(text.as_bytes().to_vec()),
            EncodedBytes::Base64(parts) => match parts.as_slice() {
                [payload] => Ok(STANDARD.decode(payload)?),
                _ => Err(FsError::InvalidSnapshot(format!(
                    "binary value must hold exactly one element, found {}",
                    parts.len()
                ))),
            },
        }
    }
}

/// Entity-index entry as it appears under `LOOKUPMAP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupEntry {
    /// Kind of the entity. Older documents may carry entries without one.
    #[serde(
        rename = "ENTITYTYPE",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub entity_type: Option<EntityKind>,
}

/// The complete, serializable state of a filesystem.
///
/// Members are declared in key order so serialized documents come out
/// sorted at every level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Attribute store.
    #[serde(rename = "ATTRS")]
    pub attrs: BTreeMap<String, Attributes>,
    /// Content store.
    #[serde(rename = "DATA", default)]
    pub data: BTreeMap<String, EncodedBytes>,
    /// Extended-attribute store.
    #[serde(rename = "EXTRAATTRS", default)]
    pub xattrs: BTreeMap<String, EncodedBytes>,
    /// Filesystem metadata.
    #[serde(rename = "FSMETA")]
    pub meta: FsMeta,
    /// Entity index.
    #[serde(rename = "LOOKUPMAP")]
    pub lookup: BTreeMap<String, LookupEntry>,
}

impl Snapshot {
    /// Capture `state` as a document.
    pub fn encode(state: &FsState) -> Self {
        let keep = |path: &&String| path.as_str() != EXPORT_PATH;
        Self {
            attrs: state
                .attrs
                .iter()
                .filter(|(path, _)| keep(path))
                .map(|(path, attr)| (path.clone(), attr.clone()))
                .collect(),
            data: encode_blobs(&state.data),
            xattrs: encode_blobs(&state.xattrs),
            meta: state.meta,
            lookup: state
                .kinds
                .iter()
                .filter(|(path, _)| keep(path))
                .map(|(path, kind)| {
                    (
                        path.clone(),
                        LookupEntry {
                            entity_type: Some(*kind),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Rebuild the live state this document describes.
    ///
    /// Entries for the reserved export file are ignored. Entity-index
    /// entries with no kind are dropped when no attribute record exists for
    /// the same path.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidSnapshot`] if a blob cannot be decoded or the
    ///   stores break a filesystem invariant
    pub fn decode(&self) -> Result<FsState, FsError> {
        let mut state = FsState::empty(self.meta);

        let stale = self.attrs.contains_key(EXPORT_PATH)
            || self.lookup.contains_key(EXPORT_PATH)
            || self.data.contains_key(EXPORT_PATH)
            || self.xattrs.contains_key(EXPORT_PATH);
        if stale {
            tracing::warn!(path = EXPORT_PATH, "ignoring stored entries for export file");
        }

        for (path, attr) in &self.attrs {
            if path != EXPORT_PATH {
                state.attrs.insert(path.clone(), attr.clone());
            }
        }

        for (path, entry) in &self.lookup {
            if path == EXPORT_PATH {
                continue;
            }
            match entry.entity_type {
                Some(kind) => {
                    state.kinds.insert(path.clone(), kind);
                }
                None if !self.attrs.contains_key(path) => {
                    tracing::warn!(path = %path, "dropping untyped entity index entry");
                }
                None => {
                    return Err(FsError::InvalidSnapshot(format!(
                        "entity {path:?} has no ENTITYTYPE"
                    )));
                }
            }
        }

        state.data = decode_blobs(&self.data)?;
        state.xattrs = decode_blobs(&self.xattrs)?;

        state.validate()?;
        Ok(state)
    }

    /// Compact JSON text of this document.
    pub fn to_json(&self) -> Result<String, FsError> {
        Ok(serde_json::to_string(self)?)
    }

    /// JSON text with two-space indentation.
    pub fn to_json_pretty(&self) -> Result<String, FsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a document from JSON text.
    pub fn from_json(text: &str) -> Result<Self, FsError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse a document from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, FsError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Convert to a generic JSON value.
    pub fn to_value(&self) -> Result<serde_json::Value, FsError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Convert from a generic JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, FsError> {
        Ok(serde_json::from_value(value)?)
    }
}

fn encode_blobs(store: &BTreeMap<String, Vec<u8>>) -> BTreeMap<String, EncodedBytes> {
    store
        .iter()
        .filter(|(path, _)| path.as_str() != EXPORT_PATH)
        .map(|(path, bytes)| (path.clone(), EncodedBytes::encode(bytes)))
        .collect()
}

fn decode_blobs(
    store: &BTreeMap<String, EncodedBytes>,
) -> Result<BTreeMap<String, Vec<u8>>, FsError> {
    store
        .iter()
        .filter(|(path, _)| path.as_str() != EXPORT_PATH)
        .map(|(path, encoded)| encoded.decode().map(|bytes| (path.clone(), bytes)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn state() -> FsState {
        FsState::new(FsMeta { default_umask: 0o755 }, SystemTime::UNIX_EPOCH)
    }

    fn with_file(state: &mut FsState, path: &str, content: &[u8]) {
        state.insert(
            path,
            Attributes::file(0o644, SystemTime::UNIX_EPOCH),
            EntityKind::File,
        );
        state.set_content(path, content.to_vec()).unwrap();
    }

    #[test]
    fn utf8_is_stored_bare() {
        assert_eq!(
            EncodedBytes::encode(b"hi"),
            EncodedBytes::Text("hi".to_owned())
        );
    }

    #[test]
    fn binary_is_wrapped_base64() {
        assert_eq!(
            EncodedBytes::encode(b"\xff\xfe"),
            EncodedBytes::Base64(vec!["//4=".to_owned()])
        );
    }

    #[test]
    fn array_looking_text_stays_bare() {
        let encoded = EncodedBytes::encode(br#"["aGk="]"#);
        assert!(matches!(encoded, EncodedBytes::Text(_)));
        assert_eq!(encoded.decode().unwrap(), br#"["aGk="]"#);
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let err = EncodedBytes::Base64(vec![]).decode().unwrap_err();
        assert!(matches!(err, FsError::InvalidSnapshot(_)));
    }

    #[test]
    fn two_element_sequence_is_rejected() {
        let encoded = EncodedBytes::Base64(vec!["aGk=".into(), "aGk=".into()]);
        assert!(encoded.decode().is_err());
    }

    #[test]
    fn bad_base64_is_rejected() {
        let encoded = EncodedBytes::Base64(vec!["not base64!".into()]);
        assert!(matches!(
            encoded.decode(),
            Err(FsError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn document_shape() {
        let mut s = state();
        with_file(&mut s, "c.txt", b"hi");
        with_file(&mut s, "b.bin", b"\xff\xfe");
        let value = Snapshot::encode(&s).to_value().unwrap();
        assert_eq!(value["DATA"]["c.txt"], "hi");
        assert_eq!(value["DATA"]["b.bin"], serde_json::json!(["//4="]));
        assert_eq!(value["FSMETA"]["DEFAULTUMASK"], 0o755);
        assert_eq!(value["LOOKUPMAP"][""]["ENTITYTYPE"], "FOLDERS");
        assert_eq!(value["LOOKUPMAP"]["c.txt"]["ENTITYTYPE"], "FILES");
        assert_eq!(value["ATTRS"]["c.txt"]["st_size"], 2);
    }

    #[test]
    fn round_trip_restores_state() {
        let mut s = state();
        with_file(&mut s, "text", b"plain");
        with_file(&mut s, "bin", &[0, 159, 146, 150]);
        s.set_xattrs("bin", vec![0xc3, 0x28]).unwrap();
        let restored = Snapshot::encode(&s).decode().unwrap();
        assert_eq!(restored, s);
    }

    #[test]
    fn export_path_is_left_out() {
        let mut s = state();
        s.ensure_export_entry(SystemTime::UNIX_EPOCH);
        s.set_content(EXPORT_PATH, b"old".to_vec()).unwrap();
        let snapshot = Snapshot::encode(&s);
        assert!(!snapshot.attrs.contains_key(EXPORT_PATH));
        assert!(!snapshot.data.contains_key(EXPORT_PATH));
        assert!(!snapshot.lookup.contains_key(EXPORT_PATH));
    }

    #[test]
    fn stored_export_entries_are_ignored() {
        let mut snapshot = Snapshot::encode(&state());
        snapshot.attrs.insert(
            EXPORT_PATH.into(),
            Attributes::file(0o664, SystemTime::UNIX_EPOCH),
        );
        snapshot.data.insert(EXPORT_PATH.into(), EncodedBytes::Text("{}".into()));
        let restored = snapshot.decode().unwrap();
        assert!(!restored.contains(EXPORT_PATH));
    }

    #[test]
    fn untyped_orphan_lookup_entries_are_dropped() {
        let mut snapshot = Snapshot::encode(&state());
        snapshot
            .lookup
            .insert("ghost".into(), LookupEntry { entity_type: None });
        let restored = snapshot.decode().unwrap();
        assert_eq!(restored.kind("ghost"), None);
    }

    #[test]
    fn untyped_live_entry_is_rejected() {
        let mut s = state();
        with_file(&mut s, "a", b"");
        let mut snapshot = Snapshot::encode(&s);
        snapshot
            .lookup
            .insert("a".into(), LookupEntry { entity_type: None });
        assert!(snapshot.decode().is_err());
    }

    #[test]
    fn missing_root_is_rejected() {
        let mut snapshot = Snapshot::encode(&state());
        snapshot.attrs.clear();
        snapshot.lookup.clear();
        assert!(matches!(
            snapshot.decode(),
            Err(FsError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn parses_legacy_document() {
        let text = r#"{
          "ATTRS": {
            "": {"st_atime": 1.5, "st_ctime": 1.5, "st_mode": 16877, "st_mtime": 1.5, "st_nlink": 2},
            "notes.txt": {"st_atime": 2, "st_ctime": 2, "st_mode": 33188, "st_mtime": 2, "st_nlink": 1, "st_size": 5}
          },
          "DATA": {"notes.txt": "hello"},
          "EXTRAATTRS": {},
          "FSMETA": {"DEFAULTUMASK": 18},
          "LOOKUPMAP": {
            "": {"ENTITYTYPE": "FOLDERS"},
            "notes.txt": {"ENTITYTYPE": "FILES"},
            "stray": {}
          }
        }"#;
        let state = Snapshot::from_json(text).unwrap().decode().unwrap();
        assert_eq!(state.content("notes.txt"), b"hello");
        assert_eq!(state.meta().default_umask, 18);
        assert_eq!(state.attr("notes.txt").unwrap().uid, 0);
    }

    #[test]
    fn missing_data_members_default_to_empty() {
        let text = r#"{
          "ATTRS": {"": {"st_mode": 16877, "st_nlink": 2}},
          "FSMETA": {"DEFAULTUMASK": 493},
          "LOOKUPMAP": {"": {"ENTITYTYPE": "FOLDERS"}}
        }"#;
        let snapshot = Snapshot::from_json(text).unwrap();
        assert!(snapshot.data.is_empty());
        assert!(snapshot.decode().is_ok());
    }

    #[test]
    fn malformed_json_is_invalid_snapshot() {
        assert!(matches!(
            Snapshot::from_json("{\"ATTRS\": 3}"),
            Err(FsError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn pretty_output_is_sorted() {
        let text = Snapshot::encode(&state()).to_json_pretty().unwrap();
        let attrs = text.find("\"ATTRS\"").unwrap();
        let meta = text.find("\"FSMETA\"").unwrap();
        let lookup = text.find("\"LOOKUPMAP\"").unwrap();
        assert!(attrs < meta && meta < lookup);
        assert!(text.contains("\n  \"ATTRS\""));
    }
}
