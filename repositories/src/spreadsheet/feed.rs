//! The subset of the Atom feed format needed to follow links between spreadsheet feeds.

use error_stack::{Report, ResultExt};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// Relation of a worksheet entry's link to that worksheet's list (row) feed.
pub const LIST_FEED_REL: &str = "http://schemas.google.com/spreadsheets/2006#listfeed";
/// Relation of a list feed's link to its row-insertion endpoint.
pub const POST_REL: &str = "http://schemas.google.com/g/2005#post";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Link {
    /// Empty when the link carries no `rel` attribute.
    #[serde(rename = "@rel", default)]
    pub rel: String,
    #[serde(rename = "@href")]
    pub href: String,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    #[serde(rename = "link", default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename = "feed")]
pub struct Feed {
    #[serde(rename = "link", default)]
    pub links: Vec<Link>,
    #[serde(rename = "entry", default)]
    pub entries: Vec<Entry>,
}

impl Feed {
    pub fn parse(xml: &str) -> Result<Self, Report<DiscoveryError>> {
        quick_xml::de::from_str(xml).change_context(DiscoveryError::MalformedFeed)
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("request to the feed service failed")]
    Request,
    #[error("feed service responded with status {0}")]
    Status(u16),
    #[error("feed could not be parsed")]
    MalformedFeed,
    #[error("no worksheet at index {0}")]
    MissingWorksheet(usize),
    #[error("no link with relation '{0}'")]
    MissingRelation(&'static str),
}

/// The links of one feed or entry, by relation. Later duplicates win.
#[derive(Debug, Clone, Default)]
pub struct LinkRelations(HashMap<String, String>);

impl LinkRelations {
    pub fn resolve(&self, rel: &'static str) -> Result<&str, Report<DiscoveryError>> {
        self.0
            .get(rel)
            .map(String::as_str)
            .ok_or_else(|| Report::new(DiscoveryError::MissingRelation(rel)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> FromIterator<&'a Link> for LinkRelations {
    fn from_iter<I: IntoIterator<Item = &'a Link>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|l| (l.rel.clone(), l.href.clone()))
                .collect(),
        )
    }
}

impl From<&[Link]> for LinkRelations {
    fn from(links: &[Link]) -> Self {
        links.iter().collect()
    }
}

impl Display for LinkRelations {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut rels: Vec<_> = self.0.keys().map(String::as_str).collect();
        rels.sort_unstable();
        write!(f, "[{}]", rels.join(", "))
    }
}
