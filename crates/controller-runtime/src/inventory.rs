//! Typed records decoded from the Docker CLI's `--format={{json .}}` listings.

use std::marker::PhantomData;
use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;

use crate::{Result, RuntimeError};

/// A listing entry keyed by its runtime-wide unique name.
pub trait Record: Sized {
    /// Shape of one JSON line as printed by the CLI.
    type Raw: DeserializeOwned;

    /// Used in decode errors, e.g. "image".
    const KIND: &'static str;

    fn from_raw(raw: Self::Raw) -> (String, Self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub id: String,
    pub repository: String,
    pub tag: String,
    /// Human readable size as printed by the CLI (e.g. `7.8MB`).
    pub size: String,
}

#[derive(Deserialize)]
pub struct RawImage {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Repository")]
    repository: String,
    #[serde(rename = "Tag")]
    tag: String,
    #[serde(rename = "Size")]
    size: String,
}

impl Record for Image {
    type Raw = RawImage;
    const KIND: &'static str = "image";

    fn from_raw(raw: RawImage) -> (String, Self) {
        let key = format!("{}:{}", raw.repository, raw.tag);
        (
            key,
            Image {
                id: raw.id,
                repository: raw.repository,
                tag: raw.tag,
                size: raw.size,
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: String,
    pub image: String,
    pub running: bool,
    pub status: String,
    /// Only known once the container has exited.
    pub exit_code: Option<i32>,
}

#[derive(Deserialize)]
pub struct RawContainer {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Image")]
    image: String,
    #[serde(rename = "Names")]
    names: String,
    #[serde(rename = "Status")]
    status: String,
}

impl Container {
    pub fn from_status(id: String, image: String, status: String) -> Self {
        Self {
            running: status.starts_with("Up "),
            exit_code: exit_code(&status),
            id,
            image,
            status,
        }
    }
}

fn exit_code(status: &str) -> Option<i32> {
    static EXITED: OnceLock<Regex> = OnceLock::new();
    let pattern =
        EXITED.get_or_init(|| Regex::new(r"^Exited \(([0-9]+)\)").expect("exit pattern is valid"));

    pattern
        .captures(status)
        .and_then(|caps| caps.get(1))
        .and_then(|code| code.as_str().parse().ok())
}

impl Record for Container {
    type Raw = RawContainer;
    const KIND: &'static str = "container";

    fn from_raw(raw: RawContainer) -> (String, Self) {
        (
            raw.names,
            Container::from_status(raw.id, raw.image, raw.status),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub mount_point: String,
}

#[derive(Deserialize)]
pub struct RawVolume {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Mountpoint")]
    mount_point: String,
}

impl Record for Volume {
    type Raw = RawVolume;
    const KIND: &'static str = "volume";

    fn from_raw(raw: RawVolume) -> (String, Self) {
        (
            raw.name,
            Volume {
                mount_point: raw.mount_point,
            },
        )
    }
}

/// Lazily decoded listing output, one `(name, record)` per line.
///
/// Each listing call re-runs the CLI, so an inventory always reflects the
/// runtime state at the time it was requested.
pub struct Inventory<T> {
    lines: std::vec::IntoIter<String>,
    _record: PhantomData<T>,
}

impl<T: Record> Inventory<T> {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines: lines.into_iter(),
            _record: PhantomData,
        }
    }

    /// Find the record stored under `name`.
    pub fn get(self, name: &str) -> Result<Option<T>> {
        for entry in self {
            let (key, record) = entry?;
            if key == name {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    pub fn contains(self, name: &str) -> Result<bool> {
        Ok(self.get(name)?.is_some())
    }

    /// Decode every remaining entry and return just the names.
    pub fn names(self) -> Result<Vec<String>> {
        self.map(|entry| entry.map(|(key, _)| key)).collect()
    }
}

impl<T: Record> Iterator for Inventory<T> {
    type Item = Result<(String, T)>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        Some(
            serde_json::from_str::<T::Raw>(&line)
                .map(T::from_raw)
                .map_err(|source| {
                    warn!(kind = T::KIND, error = %source, "Undecodable listing line");
                    RuntimeError::Decode {
                        kind: T::KIND,
                        source,
                    }
                }),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.lines.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE_LINE: &str = r#"{"Containers":"N/A","CreatedAt":"2024-01-26 23:17:35 +1100 AEDT","CreatedSince":"8 months ago","Digest":"<none>","ID":"05455a08881e","Repository":"alpine","SharedSize":"N/A","Size":"7.38MB","Tag":"latest","UniqueSize":"N/A","VirtualSize":"7.377MB"}"#;

    #[test]
    fn test_decode_image() {
        let mut inventory = Inventory::<Image>::new(vec![IMAGE_LINE.to_string()]);
        let (key, image) = inventory.next().unwrap().unwrap();
        assert_eq!(key, "alpine:latest");
        assert_eq!(
            image,
            Image {
                id: "05455a08881e".to_string(),
                repository: "alpine".to_string(),
                tag: "latest".to_string(),
                size: "7.38MB".to_string(),
            }
        );
        assert!(inventory.next().is_none());
    }

    #[test]
    fn test_container_status() {
        let running = Container::from_status("a".into(), "img".into(), "Up 3 hours".into());
        assert!(running.running);
        assert_eq!(running.exit_code, None);

        let exited =
            Container::from_status("b".into(), "img".into(), "Exited (137) 2 days ago".into());
        assert!(!exited.running);
        assert_eq!(exited.exit_code, Some(137));

        let created = Container::from_status("c".into(), "img".into(), "Created".into());
        assert!(!created.running);
        assert_eq!(created.exit_code, None);

        // "Up" alone, without the trailing space, is not treated as running
        let odd = Container::from_status("d".into(), "img".into(), "Up".into());
        assert!(!odd.running);
    }

    #[test]
    fn test_decode_container_and_volume() {
        let containers = Inventory::<Container>::new(vec![
            r#"{"ID":"9f1","Image":"alpine:latest","Names":"one","Status":"Exited (0) 5 seconds ago"}"#.to_string(),
            r#"{"ID":"9f2","Image":"alpine:latest","Names":"two","Status":"Up 1 second"}"#.to_string(),
        ]);
        let two = containers.get("two").unwrap().unwrap();
        assert_eq!(two.id, "9f2");
        assert!(two.running);

        let volumes = Inventory::<Volume>::new(vec![
            r#"{"Driver":"local","Mountpoint":"/var/lib/docker/volumes/v1/_data","Name":"v1"}"#
                .to_string(),
        ]);
        assert_eq!(volumes.names().unwrap(), vec!["v1"]);
    }

    #[test]
    fn test_decode_error() {
        let mut inventory = Inventory::<Volume>::new(vec!["not json".to_string()]);
        let err = inventory.next().unwrap().unwrap_err();
        assert!(matches!(err, RuntimeError::Decode { kind: "volume", .. }));
    }

    #[test]
    fn test_decode_error_stops_lookup() {
        let containers = Inventory::<Container>::new(vec![
            r#"{"ID":"9f1","Image":"alpine:latest","Status":"Up 1 second"}"#.to_string(),
            r#"{"ID":"9f2","Image":"alpine:latest","Names":"two","Status":"Up 1 second"}"#
                .to_string(),
        ]);
        assert!(matches!(
            containers.get("two"),
            Err(RuntimeError::Decode {
                kind: "container",
                ..
            })
        ));
    }

    #[test]
    fn test_empty_inventory() {
        assert!(!Inventory::<Container>::new(Vec::new())
            .contains("anything")
            .unwrap());
    }
}
