//! Network representation and builder.
//!
//! # Data layout
//!
//! Links and nodes are dense `Vec`s indexed by `LinkId` / `NodeId`, in the
//! order they were added to the builder.  Adjacency uses **Compressed
//! Sparse Row (CSR)** arrays: the outgoing links of node `n` are
//!
//! ```text
//! out_links[ out_start[n] .. out_start[n+1] ]
//! ```
//!
//! sorted by `LinkId`, and likewise for incoming links.  Iterating a node's
//! inbound links in id order is the engine's default tie-break, so keeping
//! them contiguous and pre-sorted keeps the node phase allocation-free.

use std::collections::HashMap;

use tracing::debug;

use qs_core::{LinkId, NodeId};

use crate::{NetworkChange, NetworkError, NetworkResult};

// ── Link / Node ───────────────────────────────────────────────────────────────

/// A directed link.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Link {
    pub id:   LinkId,
    pub name: String,
    pub from: NodeId,
    pub to:   NodeId,

    /// Length in metres.
    pub length_m: f64,

    /// Free-flow speed in m/s.
    pub free_speed_mps: f64,

    /// Number of lanes (may be fractional, as in network files).
    pub lanes: f64,

    /// Discharge capacity in PCU per hour.
    pub flow_capacity_per_hour: f64,

    /// Explicit storage capacity in PCU; `None` derives it from length,
    /// lanes and the effective cell size.
    pub storage_capacity: Option<f64>,

    /// Whether overtaking may happen on this link when passing is enabled.
    pub allows_passing: bool,
}

impl Link {
    /// Free-flow travel time in seconds for a vehicle capped at
    /// `max_speed_mps`.
    #[inline]
    pub fn free_travel_secs(&self, max_speed_mps: f64) -> f64 {
        self.length_m / self.free_speed_mps.min(max_speed_mps)
    }

    /// Storage capacity in PCU for the given effective cell size.
    pub fn storage_pcu(&self, effective_cell_size_m: f64) -> f64 {
        self.storage_capacity
            .unwrap_or(self.length_m * self.lanes / effective_cell_size_m)
    }
}

/// A network node.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub id:   NodeId,
    pub name: String,
}

/// Physical attributes of a link, passed to [`NetworkBuilder::add_link`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkAttrs {
    pub length_m:               f64,
    pub free_speed_mps:         f64,
    pub lanes:                  f64,
    pub flow_capacity_per_hour: f64,
}

impl LinkAttrs {
    /// One lane, 3600 PCU/h.
    pub fn new(length_m: f64, free_speed_mps: f64) -> Self {
        Self {
            length_m,
            free_speed_mps,
            lanes: 1.0,
            flow_capacity_per_hour: 3_600.0,
        }
    }

    pub fn lanes(mut self, lanes: f64) -> Self {
        self.lanes = lanes;
        self
    }

    pub fn capacity(mut self, flow_capacity_per_hour: f64) -> Self {
        self.flow_capacity_per_hour = flow_capacity_per_hour;
        self
    }
}

// ── Network ───────────────────────────────────────────────────────────────────

/// Directed link/node graph in CSR form.
///
/// Do not construct directly; use [`NetworkBuilder`].
#[derive(Clone, Debug)]
pub struct Network {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,

    out_start: Vec<u32>,
    out_links: Vec<LinkId>,
    in_start:  Vec<u32>,
    in_links:  Vec<LinkId>,

    link_names: HashMap<String, LinkId>,
}

impl Network {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    #[inline]
    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.index()]
    }

    /// Checked lookup for ids coming from collaborators.
    pub fn try_link(&self, id: LinkId) -> NetworkResult<&Link> {
        self.links.get(id.index()).ok_or(NetworkError::UnknownLink(id))
    }

    pub fn link_by_name(&self, name: &str) -> Option<LinkId> {
        self.link_names.get(name).copied()
    }

    /// Links leaving `node`, ascending `LinkId`.
    #[inline]
    pub fn out_links(&self, node: NodeId) -> &[LinkId] {
        let s = self.out_start[node.index()] as usize;
        let e = self.out_start[node.index() + 1] as usize;
        &self.out_links[s..e]
    }

    /// Links entering `node`, ascending `LinkId`.
    #[inline]
    pub fn in_links(&self, node: NodeId) -> &[LinkId] {
        let s = self.in_start[node.index()] as usize;
        let e = self.in_start[node.index() + 1] as usize;
        &self.in_links[s..e]
    }

    /// `true` if `next` leaves the node at which `current` ends.
    #[inline]
    pub fn is_successor(&self, current: LinkId, next: LinkId) -> bool {
        self.link(next).from == self.link(current).to
    }

    /// Sum of all link lengths in metres.
    pub fn total_length_m(&self) -> f64 {
        self.links.iter().map(|l| l.length_m).sum()
    }

    /// Apply a validated [`NetworkChange`].
    pub fn apply_change(&mut self, change: &NetworkChange) -> NetworkResult<()> {
        change.validate(self)?;
        let link = &mut self.links[change.link.index()];
        if let Some(v) = change.free_speed_mps {
            link.free_speed_mps = v;
        }
        if let Some(c) = change.flow_capacity_per_hour {
            link.flow_capacity_per_hour = c;
        }
        debug!(link = %link.name, speed = link.free_speed_mps, capacity = link.flow_capacity_per_hour, "network change applied");
        Ok(())
    }
}

// ── NetworkBuilder ────────────────────────────────────────────────────────────

/// Construct a [`Network`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use qs_network::{LinkAttrs, NetworkBuilder};
///
/// let mut b = NetworkBuilder::new();
/// let a = b.add_node("a");
/// let c = b.add_node("c");
/// b.add_link("a-c", a, c, LinkAttrs::new(100.0, 10.0));
/// let net = b.build().unwrap();
/// assert_eq!(net.link_count(), 1);
/// assert_eq!(net.out_links(a).len(), 1);
/// ```
#[derive(Default)]
pub struct NetworkBuilder {
    nodes: Vec<Node>,
    links: Vec<Link>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(nodes: usize, links: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes),
            links: Vec::with_capacity(links),
        }
    }

    /// Add a node and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { id, name: name.into() });
        id
    }

    /// Add a directed link and return its `LinkId` (sequential from 0).
    ///
    /// Node references and attribute values are checked in
    /// [`build`](Self::build), so links can be added before their nodes.
    pub fn add_link(&mut self, name: impl Into<String>, from: NodeId, to: NodeId, attrs: LinkAttrs) -> LinkId {
        let id = LinkId(self.links.len() as u32);
        self.links.push(Link {
            id,
            name: name.into(),
            from,
            to,
            length_m: attrs.length_m,
            free_speed_mps: attrs.free_speed_mps,
            lanes: attrs.lanes,
            flow_capacity_per_hour: attrs.flow_capacity_per_hour,
            storage_capacity: None,
            allows_passing: true,
        });
        id
    }

    /// Override the derived storage capacity of `link` (PCU).
    pub fn set_storage_capacity(&mut self, link: LinkId, pcu: f64) -> &mut Self {
        if let Some(l) = self.links.get_mut(link.index()) {
            l.storage_capacity = Some(pcu);
        }
        self
    }

    /// Keep `link` strictly FIFO even when passing is enabled.
    pub fn forbid_passing(&mut self, link: LinkId) -> &mut Self {
        if let Some(l) = self.links.get_mut(link.index()) {
            l.allows_passing = false;
        }
        self
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn link_count(&self) -> usize { self.links.len() }

    /// Validate the topology and produce a [`Network`].
    ///
    /// # Errors
    ///
    /// Any [`NetworkError`] topology variant: dangling node references,
    /// non-positive length / speed / lanes / capacity / storage, duplicate
    /// link or node names.
    pub fn build(self) -> NetworkResult<Network> {
        let node_count = self.nodes.len();

        let mut node_names: HashMap<&str, NodeId> = HashMap::with_capacity(node_count);
        for n in &self.nodes {
            if node_names.insert(n.name.as_str(), n.id).is_some() {
                return Err(NetworkError::DuplicateNode(n.name.clone()));
            }
        }

        let mut link_names = HashMap::with_capacity(self.links.len());
        for l in &self.links {
            for node in [l.from, l.to] {
                if node.index() >= node_count {
                    return Err(NetworkError::DanglingNode { link: l.name.clone(), node });
                }
            }
            let attrs = [
                ("length", l.length_m),
                ("free speed", l.free_speed_mps),
                ("lanes", l.lanes),
                ("flow capacity", l.flow_capacity_per_hour),
                ("storage capacity", l.storage_capacity.unwrap_or(1.0)),
            ];
            for (what, value) in attrs {
                if !(value.is_finite() && value > 0.0) {
                    return Err(NetworkError::NonPositive { link: l.name.clone(), what, value });
                }
            }
            if link_names.insert(l.name.clone(), l.id).is_some() {
                return Err(NetworkError::DuplicateLink(l.name.clone()));
            }
        }

        let (out_start, out_links) = csr(node_count, &self.links, |l| l.from);
        let (in_start, in_links) = csr(node_count, &self.links, |l| l.to);

        Ok(Network {
            nodes: self.nodes,
            links: self.links,
            out_start,
            out_links,
            in_start,
            in_links,
            link_names,
        })
    }
}

/// Build a CSR row pointer + column array keyed by `key(link)`.  Links keep
/// ascending id order within each row because they are visited in id order.
fn csr(node_count: usize, links: &[Link], key: impl Fn(&Link) -> NodeId) -> (Vec<u32>, Vec<LinkId>) {
    let mut start = vec![0u32; node_count + 1];
    for l in links {
        start[key(l).index() + 1] += 1;
    }
    for i in 1..=node_count {
        start[i] += start[i - 1];
    }
    let mut fill = start.clone();
    let mut cols = vec![LinkId::INVALID; links.len()];
    for l in links {
        let slot = &mut fill[key(l).index()];
        cols[*slot as usize] = l.id;
        *slot += 1;
    }
    (start, cols)
}
