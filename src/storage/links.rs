//! Bidirectional link graph.
//!
//! Two tables keyed by source id, each holding a bucket of links keyed by
//! `{target}-{TYPE}`:
//! - `links`: forward links an issue declares in its own text
//! - `inverse_links`: links materialized on the target side

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;

use crate::error::Result;
use crate::model::{Link, LinkType};

type Bucket = BTreeMap<String, Link>;

/// Plain-data form of the graph, used by snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkGraphDump {
    #[serde(default)]
    pub links: BTreeMap<String, Bucket>,
    #[serde(default)]
    pub inverse_links: BTreeMap<String, Bucket>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkGraph {
    links: BTreeMap<String, Bucket>,
    inverse_links: BTreeMap<String, Bucket>,
}

impl LinkGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a forward link and, when its type has one, the inverse link.
    ///
    /// Re-adding the same target and type overwrites the previous entry.
    pub fn add_link(&mut self, link: Link) {
        if let Some(inverse_type) = link.link_type.inverse() {
            let inverse = Link::new(link.target_id.clone(), link.source_id.clone(), inverse_type);
            trace!(source = %inverse.source_id, key = %inverse.key(), "Adding inverse link");
            self.inverse_links
                .entry(inverse.source_id.clone())
                .or_default()
                .insert(inverse.key(), inverse);
        }

        trace!(source = %link.source_id, key = %link.key(), "Adding link");
        self.links
            .entry(link.source_id.clone())
            .or_default()
            .insert(link.key(), link);
    }

    /// Add a link whose type arrives as text (dump files, event payloads).
    ///
    /// # Errors
    ///
    /// Returns `BoardError::InvalidLinkType` if `link_type` is not a known type.
    pub fn add(&mut self, source_id: &str, target_id: &str, link_type: &str) -> Result<()> {
        let link_type: LinkType = link_type.parse()?;
        self.add_link(Link::new(source_id, target_id, link_type));
        Ok(())
    }

    /// Forward and inverse links whose source is `source_id`.
    ///
    /// Forward entries win when a key appears in both tables.
    #[must_use]
    pub fn get_by_source(&self, source_id: &str) -> BTreeMap<String, Link> {
        let mut merged = self
            .inverse_links
            .get(source_id)
            .cloned()
            .unwrap_or_default();

        if let Some(forward) = self.links.get(source_id) {
            merged.extend(forward.iter().map(|(key, link)| (key.clone(), link.clone())));
        }

        merged
    }

    /// Forward links declared by `source_id` only.
    #[must_use]
    pub fn get_forward(&self, source_id: &str) -> BTreeMap<String, Link> {
        self.links.get(source_id).cloned().unwrap_or_default()
    }

    /// Drop every forward link of `source_id` together with its inverse.
    ///
    /// Returns the removed forward links.
    pub fn remove_by_source(&mut self, source_id: &str) -> BTreeMap<String, Link> {
        let Some(removed) = self.links.remove(source_id) else {
            return BTreeMap::new();
        };

        for link in removed.values() {
            let Some(inverse_type) = link.link_type.inverse() else {
                continue;
            };
            let inverse_key = Link::new(&link.target_id, &link.source_id, inverse_type).key();

            if let Some(bucket) = self.inverse_links.get_mut(&link.target_id) {
                bucket.remove(&inverse_key);
                if bucket.is_empty() {
                    self.inverse_links.remove(&link.target_id);
                }
            }
        }

        trace!(source = %source_id, count = removed.len(), "Removed links");
        removed
    }

    /// Total number of forward links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    #[must_use]
    pub fn dump(&self) -> LinkGraphDump {
        LinkGraphDump {
            links: self.links.clone(),
            inverse_links: self.inverse_links.clone(),
        }
    }

    #[must_use]
    pub fn load(dump: LinkGraphDump) -> Self {
        Self {
            links: dump.links,
            inverse_links: dump.inverse_links,
        }
    }
}
