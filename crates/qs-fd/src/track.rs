//! Triangular test track.
//!
//! ```text
//!                     C
//!                   /   \
//!              top /     \ middle
//!                 /       \
//!   home ──→ A ───────────── B ──→ work
//!                   base
//! ```
//!
//! The ring runs `A → B → C → A`.  Each branch is split into
//! `subdivision` equal links, numbered from `LinkId(0)` at `A` so the
//! first base link is the ring start and the flow cross-section.

use std::sync::Arc;

use qs_agent::Ring;
use qs_core::{CoreError, CoreResult, LinkId};
use qs_network::{LinkAttrs, Network, NetworkBuilder};

use crate::FdResult;

/// Storage of `home` and `work`.  Neither may hold back departures or
/// arrivals.
const BUFFER_STORAGE_PCU: f64 = 10_000.0;

const BRANCHES: [&str; 3] = ["base", "middle", "top"];

/// Track geometry.
///
/// | Field               | Default     |
/// |---------------------|-------------|
/// | `branch_length_m`   | `1000.0`    |
/// | `subdivision`       | `3`         |
/// | `lanes`             | `1.0`       |
/// | `capacity_per_hour` | `2700.0`    |
/// | `free_speed_mps`    | 60 km/h     |
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrackConfig {
    pub branch_length_m:   f64,
    /// Links per branch.
    pub subdivision:       u32,
    pub lanes:             f64,
    /// Flow capacity of every ring link, PCU per hour.
    pub capacity_per_hour: f64,
    pub free_speed_mps:    f64,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            branch_length_m:   1_000.0,
            subdivision:       3,
            lanes:             1.0,
            capacity_per_hour: 2_700.0,
            free_speed_mps:    60.0 / 3.6,
        }
    }
}

impl TrackConfig {
    /// # Errors
    ///
    /// [`CoreError::InconsistentConfiguration`] for a zero subdivision or a
    /// non-positive length, lane count, capacity or speed.
    pub fn validate(&self) -> CoreResult<()> {
        if self.subdivision == 0 {
            return Err(CoreError::InconsistentConfiguration("track subdivision must be >= 1".into()));
        }
        for (what, value) in [
            ("branch_length_m", self.branch_length_m),
            ("lanes", self.lanes),
            ("capacity_per_hour", self.capacity_per_hour),
            ("free_speed_mps", self.free_speed_mps),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(CoreError::InconsistentConfiguration(format!(
                    "track {what} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Road length of the closed ring.
    pub fn ring_length_m(&self) -> f64 {
        3.0 * self.branch_length_m
    }

    /// PCU the ring holds bumper to bumper.
    pub fn network_pcu_capacity(&self, effective_cell_size_m: f64) -> f64 {
        self.ring_length_m() / effective_cell_size_m * self.lanes
    }

    /// PCU per km at jam.
    pub fn jam_density_per_km(&self, effective_cell_size_m: f64) -> f64 {
        self.lanes * 1_000.0 / effective_cell_size_m
    }
}

/// The built track: its network plus the ring every driver circles.
#[derive(Clone, Debug)]
pub struct TriangleTrack {
    pub config:  TrackConfig,
    pub network: Network,
    pub ring:    Arc<Ring>,
}

impl TriangleTrack {
    /// # Errors
    ///
    /// `FdError::Core` for an invalid `config`.
    pub fn build(config: TrackConfig) -> FdResult<Self> {
        config.validate()?;

        let per_branch = config.subdivision as usize;
        let ring_links = 3 * per_branch;
        let link_length = config.branch_length_m / config.subdivision as f64;
        let attrs = LinkAttrs::new(link_length, config.free_speed_mps)
            .lanes(config.lanes)
            .capacity(config.capacity_per_hour);

        let mut b = NetworkBuilder::with_capacity(ring_links + 2, ring_links + 2);
        let ring_nodes: Vec<_> = (0..ring_links).map(|i| b.add_node(format!("r{i}"))).collect();
        let origin = b.add_node("origin");
        let destination = b.add_node("destination");

        let ring: Vec<LinkId> = (0..ring_links)
            .map(|i| {
                let name = format!("{}_{}", BRANCHES[i / per_branch], i % per_branch);
                b.add_link(name, ring_nodes[i], ring_nodes[(i + 1) % ring_links], attrs)
            })
            .collect();

        // B is where the base ends.
        let home = b.add_link("home", origin, ring_nodes[0], attrs);
        let work = b.add_link("work", ring_nodes[per_branch], destination, attrs);
        b.set_storage_capacity(home, BUFFER_STORAGE_PCU);
        b.set_storage_capacity(work, BUFFER_STORAGE_PCU);

        let network = b.build()?;
        let ring = Ring {
            home,
            exit_after: ring[per_branch - 1],
            exit: work,
            ring,
        };
        Ok(Self { config, network, ring: Arc::new(ring) })
    }

    /// First base link: ring start and flow cross-section.
    pub fn reference_link(&self) -> LinkId {
        self.ring.ring[0]
    }
}
