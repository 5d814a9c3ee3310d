//! Tree store: nodes of the simulated filesystem and their JSON form
//!
//! A tree serializes to plain JSON: directories are objects, files are strings
//! (byte arrays when the payload is not UTF-8) and symlinks are one-key objects
//! `{"SYMLINK": "<target>"}`.

use std::fmt;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FsResult;
use crate::types::NodeType;

/// Reserved key marking a symlink record in the JSON form
pub const SYMLINK_KEY: &str = "SYMLINK";

/// Filesystem node
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Directory(Directory),
    File(Vec<u8>),
    Symlink(String),
}

impl Node {
    pub fn dir() -> Self {
        Node::Directory(Directory::new())
    }

    pub fn file(data: impl Into<Vec<u8>>) -> Self {
        Node::File(data.into())
    }

    pub fn symlink(target: impl Into<String>) -> Self {
        Node::Symlink(target.into())
    }

    pub fn kind(&self) -> NodeType {
        match self {
            Node::Directory(_) => NodeType::Directory,
            Node::File(_) => NodeType::File,
            Node::Symlink(_) => NodeType::Symlink,
        }
    }

    pub fn as_dir(&self) -> Option<&Directory> {
        match self {
            Node::Directory(dir) => Some(dir),
            _ => None,
        }
    }

    pub fn as_dir_mut(&mut self) -> Option<&mut Directory> {
        match self {
            Node::Directory(dir) => Some(dir),
            _ => None,
        }
    }

    pub fn from_json_str(json: &str) -> FsResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_value(value: serde_json::Value) -> FsResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json_value(&self) -> FsResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl From<Directory> for Node {
    fn from(dir: Directory) -> Self {
        Node::Directory(dir)
    }
}

/// Directory contents: unique names, kept in insertion order.
///
/// Equality ignores order.
#[derive(Clone, Debug, Default)]
pub struct Directory {
    entries: Vec<(String, Node)>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, node)| node)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert or replace. A replaced entry keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, node: Node) -> Option<Node> {
        let name = name.into();
        match self.get_mut(&name) {
            Some(existing) => Some(std::mem::replace(existing, node)),
            None => {
                self.entries.push((name, node));
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Node> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    /// Builder form of `insert`
    pub fn with(mut self, name: impl Into<String>, node: Node) -> Self {
        self.insert(name, node);
        self
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(n, node)| (n.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for Directory {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(name, node)| other.get(name).is_some_and(|o| o == node))
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Directory(dir) => {
                let mut map = serializer.serialize_map(Some(dir.len()))?;
                for (name, child) in dir.iter() {
                    map.serialize_entry(name, child)?;
                }
                map.end()
            }
            Node::File(data) => match std::str::from_utf8(data) {
                Ok(text) => serializer.serialize_str(text),
                Err(_) => serializer.collect_seq(data),
            },
            Node::Symlink(target) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(SYMLINK_KEY, target)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a directory object, a file payload, or a symlink record")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Node, E> {
        Ok(Node::file(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Node, E> {
        Ok(Node::File(v.into_bytes()))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Node, E> {
        Ok(Node::file(v))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Node, E> {
        Ok(Node::File(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Node, A::Error> {
        let mut data = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(byte) = seq.next_element::<u8>()? {
            data.push(byte);
        }
        Ok(Node::File(data))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Node, A::Error> {
        let mut dir = Directory::new();
        while let Some((name, child)) = map.next_entry::<String, Node>()? {
            dir.insert(name, child);
        }

        let Some(link) = dir.get(SYMLINK_KEY) else {
            return Ok(Node::Directory(dir));
        };
        if dir.len() != 1 {
            return Err(de::Error::custom(format!(
                "a {SYMLINK_KEY} record must not have other keys"
            )));
        }
        match link {
            Node::File(target) => match std::str::from_utf8(target) {
                Ok(target) => Ok(Node::symlink(target)),
                Err(_) => Err(de::Error::custom("symlink target is not UTF-8")),
            },
            _ => Err(de::Error::custom("symlink target must be a string")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_shapes() {
        let node = Node::from_json_value(json!({
            "dir": { "file.txt": "contents" },
            "link": { "SYMLINK": "/dir" },
        }))
        .unwrap();

        let root = node.as_dir().unwrap();
        let dir = root.get("dir").unwrap().as_dir().unwrap();
        assert_eq!(dir.get("file.txt"), Some(&Node::file("contents")));
        assert_eq!(root.get("link"), Some(&Node::symlink("/dir")));
    }

    #[test]
    fn test_symlink_record_with_extra_keys_is_rejected() {
        let err = Node::from_json_value(json!({ "SYMLINK": "/a", "other": "x" }));
        assert!(err.is_err());
        let err = Node::from_json_value(json!({ "SYMLINK": {} }));
        assert!(err.is_err());
    }

    #[test]
    fn test_deserialize_keeps_source_order() {
        let node = Node::from_json_str(r#"{"zeta": {}, "alpha": "a", "mid": {}}"#).unwrap();
        assert_eq!(node.as_dir().unwrap().names(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_binary_payload_serializes_as_bytes() {
        let node = Node::Directory(Directory::new().with("bin", Node::file(vec![0xff, 0x00])));
        assert_eq!(node.to_json_value().unwrap(), json!({ "bin": [255, 0] }));
        assert_eq!(Node::from_json_value(json!({ "bin": [255, 0] })).unwrap(), node);
    }

    #[test]
    fn test_directory_equality_ignores_order() {
        let a = Directory::new().with("x", Node::dir()).with("y", Node::file("1"));
        let b = Directory::new().with("y", Node::file("1")).with("x", Node::dir());
        assert_eq!(a, b);
        assert_ne!(a, b.clone().with("z", Node::dir()));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut dir = Directory::new().with("a", Node::file("1")).with("b", Node::file("2"));
        let old = dir.insert("a", Node::file("3"));
        assert_eq!(old, Some(Node::file("1")));
        assert_eq!(dir.names(), vec!["a", "b"]);
        assert_eq!(dir.remove("a"), Some(Node::file("3")));
        assert!(!dir.contains("a"));
    }
}
