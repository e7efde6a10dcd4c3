//! Node transition logic and the set of all link queues.
//!
//! # Per-interval protocol
//!
//! ```text
//! begin_tick(now)                      refill every accumulator
//! insert(agent, first_link, now) …     departures (sequential)
//! decide(node, now, …)  for all nodes  read-only, parallelisable
//! commit(decision, now, …) in node order  writes + events
//! ```
//!
//! A decision walks the node's inbound links in priority order.  On each
//! link it walks the ready vehicles front to back, asking each one's driver
//! for the next link, until the flow accumulator runs dry or a vehicle is
//! blocked by a full downstream link.  A blocked vehicle blocks everything
//! behind it, except seep modes, which may slip past.

use tracing::warn;

use qs_agent::{AgentState, Population, RouteContext};
use qs_core::{AgentId, LinkId, ModeId, ModeTable, NodeId, Tick};
use qs_events::Event;
use qs_network::Network;

use crate::{InboundOrder, LinkQueue, PCU_EPS, QueueError, QueueResult, Room, TrafficDynamics, Vehicle};

// ── Decisions ─────────────────────────────────────────────────────────────────

/// One vehicle movement decided for a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Move {
    /// Leave `from`, enter `to`.
    Transfer { from: LinkId, agent: AgentId, to: LinkId },
    /// Leave `from` and end the trip.
    Arrive { from: LinkId, agent: AgentId },
    /// Force-remove from `from`.
    Stuck { from: LinkId, agent: AgentId },
}

/// Everything one node does in one interval, in commit order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeDecision {
    pub node:       NodeId,
    pub moves:      Vec<Move>,
    /// Ready vehicles turned away by a full downstream link.
    pub rejections: u32,
    /// Per inbound link, the first vehicle turned away and left in place.
    pub blocked:    Vec<(LinkId, AgentId)>,
}

/// Counters from committing decisions.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitStats {
    pub transferred: u32,
    pub arrived:     u32,
    pub stuck:       u32,
}

impl std::ops::AddAssign for CommitStats {
    fn add_assign(&mut self, rhs: Self) {
        self.transferred += rhs.transferred;
        self.arrived += rhs.arrived;
        self.stuck += rhs.stuck;
    }
}

// ── QueueNetwork ──────────────────────────────────────────────────────────────

/// All link queues of a run plus per-node inbound priority.
#[derive(Clone, Debug)]
pub struct QueueNetwork {
    links:       Vec<LinkQueue>,
    inbound:     Vec<Vec<LinkId>>,
    order:       InboundOrder,
    seep_modes:  Vec<bool>,
    stuck_ticks: Option<u64>,
}

impl QueueNetwork {
    /// # Errors
    ///
    /// [`QueueError::Core`] if `dynamics` does not validate against `modes`.
    pub fn new(
        network:   &Network,
        dynamics:  &TrafficDynamics,
        modes:     &ModeTable,
        tick_secs: u32,
    ) -> QueueResult<Self> {
        dynamics.validate(modes)?;
        let links = network
            .links
            .iter()
            .map(|l| LinkQueue::new(l, dynamics, modes, tick_secs))
            .collect();
        let mut q = Self {
            links,
            inbound: Vec::new(),
            order: dynamics.inbound_order,
            seep_modes: dynamics.seep_modes(modes),
            stuck_ticks: dynamics.stuck_ticks(tick_secs),
        };
        q.rebuild_inbound(network);
        Ok(q)
    }

    fn rebuild_inbound(&mut self, network: &Network) {
        self.inbound = network
            .nodes
            .iter()
            .map(|n| {
                let mut links = network.in_links(n.id).to_vec();
                if self.order == InboundOrder::CapacityDesc {
                    // Stable sort keeps ascending LinkId among equal capacities.
                    links.sort_by(|a, b| {
                        network
                            .link(*b)
                            .flow_capacity_per_hour
                            .total_cmp(&network.link(*a).flow_capacity_per_hour)
                    });
                }
                links
            })
            .collect();
    }

    /// Pick up a [`NetworkChange`](qs_network::NetworkChange) already applied
    /// to `network`.
    pub fn refresh_link(&mut self, link: LinkId, network: &Network, modes: &ModeTable) {
        if let Some(q) = self.links.get_mut(link.index()) {
            q.refresh(network.link(link), modes);
        }
        if self.order == InboundOrder::CapacityDesc {
            self.rebuild_inbound(network);
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn link(&self, id: LinkId) -> &LinkQueue {
        &self.links[id.index()]
    }

    pub fn links(&self) -> &[LinkQueue] {
        &self.links
    }

    /// Inbound links of `node` in priority order.
    pub fn inbound(&self, node: NodeId) -> &[LinkId] {
        &self.inbound[node.index()]
    }

    pub fn stuck_ticks(&self) -> Option<u64> {
        self.stuck_ticks
    }

    #[inline]
    pub fn is_seep_mode(&self, mode: ModeId) -> bool {
        self.seep_modes.get(mode.index()).copied().unwrap_or(false)
    }

    /// Vehicles currently on any link.
    pub fn vehicles_on_network(&self) -> usize {
        self.links.iter().map(LinkQueue::len).sum()
    }

    // ── Interval protocol ─────────────────────────────────────────────────

    pub fn begin_tick(&mut self) {
        for q in &mut self.links {
            q.refill();
        }
    }

    /// Put a departing agent's new vehicle on `link`.
    ///
    /// # Errors
    ///
    /// [`QueueError::CapacityExceeded`] (recoverable: the agent keeps
    /// waiting), or [`QueueError::UnknownLink`].
    pub fn insert(
        &mut self,
        agent: AgentId,
        mode:  ModeId,
        link:  LinkId,
        now:   Tick,
        modes: &ModeTable,
    ) -> QueueResult<Tick> {
        let may_seep = self.is_seep_mode(mode);
        let q = self
            .links
            .get_mut(link.index())
            .ok_or(QueueError::UnknownLink { agent, link })?;
        q.admit(Vehicle::new(agent, mode, modes), now, may_seep)
    }

    /// Decide `node`'s moves for interval `now` from committed state.
    pub fn decide(
        &self,
        node:       NodeId,
        now:        Tick,
        network:    &Network,
        population: &Population,
        ctx:        &RouteContext,
    ) -> QueueResult<NodeDecision> {
        let mut decision = NodeDecision { node, ..NodeDecision::default() };
        let out_links = network.out_links(node);
        let mut rooms: Vec<Room> = out_links.iter().map(|&l| self.link(l).room()).collect();

        for &in_link in self.inbound(node) {
            let q = self.link(in_link);
            let mut acc = q.accumulator();
            let mut blocked = false;

            for v in q.iter() {
                if v.exit_tick > now {
                    break;
                }
                let may_seep = self.is_seep_mode(v.mode);
                if blocked && !may_seep {
                    continue;
                }
                if acc + PCU_EPS < v.pcu {
                    break;
                }

                let agent = population.get(v.agent);
                let step = match agent.state() {
                    AgentState::Moving { step, .. } => step,
                    _ => 0,
                };
                let Some(next) = agent.driver.next_link(v.agent, in_link, step, ctx) else {
                    decision.moves.push(Move::Arrive { from: in_link, agent: v.agent });
                    acc -= v.pcu;
                    continue;
                };

                let slot = out_links.iter().position(|&l| l == next).ok_or_else(|| {
                    match network.try_link(next) {
                        Ok(_) => QueueError::NotOutgoing { agent: v.agent, next, node },
                        Err(_) => QueueError::UnknownLink { agent: v.agent, link: next },
                    }
                })?;

                if rooms[slot].try_take(v.pcu, may_seep).is_some() {
                    decision.moves.push(Move::Transfer { from: in_link, agent: v.agent, to: next });
                    acc -= v.pcu;
                    continue;
                }

                decision.rejections += 1;
                if !blocked {
                    blocked = true;
                    if let Some(limit) = self.stuck_ticks {
                        let since = q.blocked_since(v.agent).unwrap_or(now);
                        if now.since(since) >= limit {
                            decision.moves.push(Move::Stuck { from: in_link, agent: v.agent });
                            break;
                        }
                    }
                    decision.blocked.push((in_link, v.agent));
                }
                if self.seep_modes.iter().all(|s| !s) {
                    break;
                }
            }
        }
        Ok(decision)
    }

    /// Apply `decision`, appending its events to `events` in order.
    pub fn commit(
        &mut self,
        decision:   &NodeDecision,
        now:        Tick,
        population: &mut Population,
        events:     &mut Vec<Event>,
    ) -> QueueResult<CommitStats> {
        let mut stats = CommitStats::default();
        for &m in &decision.moves {
            match m {
                Move::Transfer { from, agent, to } => {
                    let vehicle = self.links[from.index()].take(agent, true)?;
                    events.push(Event::left(now, agent, from));
                    let may_seep = self.is_seep_mode(vehicle.mode);
                    self.links[to.index()].admit(vehicle, now, may_seep)?;
                    population.get_mut(agent).advance(to)?;
                    events.push(Event::entered(now, agent, to));
                    stats.transferred += 1;
                }
                Move::Arrive { from, agent } => {
                    self.links[from.index()].take(agent, true)?;
                    events.push(Event::left(now, agent, from));
                    let a = population.get_mut(agent);
                    a.arrive()?;
                    a.complete()?;
                    events.push(Event::arrived(now, agent, from));
                    stats.arrived += 1;
                }
                Move::Stuck { from, agent } => {
                    self.links[from.index()].take(agent, false)?;
                    population.get_mut(agent).abort()?;
                    events.push(Event::stuck(now, agent, from));
                    warn!(%agent, link = %from, tick = now.0, "vehicle stuck, removed");
                    stats.stuck += 1;
                }
            }
        }
        for &(link, agent) in &decision.blocked {
            self.links[link.index()].mark_blocked(agent, now);
        }
        Ok(stats)
    }

    /// Decide and immediately commit one node.
    ///
    /// Committing node by node lets later nodes see earlier nodes' writes
    /// from the same interval; the stepper decides all nodes first instead.
    pub fn step_node(
        &mut self,
        node:       NodeId,
        now:        Tick,
        network:    &Network,
        population: &mut Population,
        ctx:        &RouteContext,
        events:     &mut Vec<Event>,
    ) -> QueueResult<(NodeDecision, CommitStats)> {
        let decision = self.decide(node, now, network, population, ctx)?;
        let stats = self.commit(&decision, now, population, events)?;
        Ok((decision, stats))
    }
}
