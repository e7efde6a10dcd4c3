//! Unit tests for qs-agent.

#[cfg(test)]
mod driver {
    use std::sync::Arc;

    use qs_core::{AgentId, LinkId, Tick};

    use crate::{Driver, LinkChooser, Ring, RouteContext};

    fn ctx(flow_permanent: bool) -> RouteContext {
        RouteContext { now: Tick(5), flow_permanent }
    }

    fn ring() -> Driver {
        Driver::RoundAndRound(Arc::new(Ring {
            home:       LinkId(0),
            ring:       vec![LinkId(1), LinkId(2), LinkId(3)],
            exit_after: LinkId(2),
            exit:       LinkId(9),
        }))
    }

    #[test]
    fn fixed_route_walks_by_step() {
        let d = Driver::fixed(vec![LinkId(4), LinkId(5), LinkId(4)]);
        let a = AgentId(0);
        assert_eq!(d.first_link(a, &ctx(false)), Some(LinkId(4)));
        assert_eq!(d.next_link(a, LinkId(4), 0, &ctx(false)), Some(LinkId(5)));
        // Revisiting link 4 is resolved by step, not by link id.
        assert_eq!(d.next_link(a, LinkId(5), 1, &ctx(false)), Some(LinkId(4)));
        assert_eq!(d.next_link(a, LinkId(4), 2, &ctx(false)), None);
    }

    #[test]
    fn ring_circles_until_permanent() {
        let d = ring();
        let a = AgentId(3);
        assert_eq!(d.first_link(a, &ctx(false)), Some(LinkId(0)));
        assert_eq!(d.next_link(a, LinkId(0), 0, &ctx(false)), Some(LinkId(1)));
        assert_eq!(d.next_link(a, LinkId(2), 2, &ctx(false)), Some(LinkId(3)));
        assert_eq!(d.next_link(a, LinkId(3), 3, &ctx(false)), Some(LinkId(1)));
        assert_eq!(d.next_link(a, LinkId(2), 5, &ctx(true)), Some(LinkId(9)));
        assert_eq!(d.next_link(a, LinkId(9), 6, &ctx(true)), None);
    }

    #[test]
    fn ring_stays_home_once_permanent() {
        assert!(ring().departs(&ctx(false)));
        assert!(!ring().departs(&ctx(true)));
        assert!(Driver::fixed(vec![LinkId(0)]).departs(&ctx(true)));
    }

    struct Always(LinkId);

    impl LinkChooser for Always {
        fn first_link(&self, _agent: AgentId, _ctx: &RouteContext) -> LinkId {
            self.0
        }

        fn next_link(&self, _agent: AgentId, current: LinkId, _ctx: &RouteContext) -> Option<LinkId> {
            (current != self.0).then_some(self.0)
        }
    }

    #[test]
    fn external_delegates() {
        let d = Driver::External(Arc::new(Always(LinkId(7))));
        assert_eq!(d.first_link(AgentId(0), &ctx(false)), Some(LinkId(7)));
        assert_eq!(d.next_link(AgentId(0), LinkId(1), 0, &ctx(false)), Some(LinkId(7)));
        assert_eq!(d.next_link(AgentId(0), LinkId(7), 1, &ctx(false)), None);
    }
}

#[cfg(test)]
mod state {
    use qs_core::{AgentId, LinkId, ModeId, Tick};

    use crate::{Agent, AgentError, AgentState, Driver, TripOutcome};

    fn agent() -> Agent {
        Agent::new(AgentId(0), ModeId(0), 0, Driver::fixed(vec![LinkId(0)]))
    }

    #[test]
    fn full_trip() {
        let mut a = agent();
        assert_eq!(a.state(), AgentState::Inactive);
        a.begin_waiting(Tick(2)).unwrap();
        a.begin_waiting(Tick(3)).unwrap();
        assert_eq!(a.state(), AgentState::Waiting { since: Tick(2) });
        a.depart(LinkId(0)).unwrap();
        a.advance(LinkId(1)).unwrap();
        assert_eq!(a.state(), AgentState::Moving { link: LinkId(1), step: 1 });
        assert_eq!(a.current_link(), Some(LinkId(1)));
        a.arrive().unwrap();
        assert_eq!(a.state(), AgentState::Arriving { link: LinkId(1) });
        a.complete().unwrap();
        assert_eq!(a.state(), AgentState::Inactive);
        assert_eq!(a.outcome(), Some(TripOutcome::Arrived));
    }

    #[test]
    fn finished_agent_cannot_wait_again() {
        let mut a = agent();
        a.begin_waiting(Tick(0)).unwrap();
        a.abort().unwrap();
        assert_eq!(a.outcome(), Some(TripOutcome::Stuck));
        assert!(matches!(a.begin_waiting(Tick(1)), Err(AgentError::InvalidTransition { .. })));
    }

    #[test]
    fn skip_before_entering() {
        let mut a = agent();
        a.skip().unwrap();
        assert_eq!(a.state(), AgentState::Inactive);
        assert_eq!(a.outcome(), Some(TripOutcome::Skipped));
        assert!(a.skip().is_err());

        let mut b = agent();
        b.begin_waiting(Tick(4)).unwrap();
        b.skip().unwrap();
        assert_eq!(b.outcome(), Some(TripOutcome::Skipped));

        let mut c = agent();
        c.begin_waiting(Tick(4)).unwrap();
        c.depart(LinkId(0)).unwrap();
        assert!(c.skip().is_err());
    }

    #[test]
    fn invalid_transitions() {
        let mut a = agent();
        assert!(a.depart(LinkId(0)).is_err());
        assert!(a.advance(LinkId(0)).is_err());
        assert!(a.arrive().is_err());
        assert!(a.complete().is_err());
        assert!(a.abort().is_err());
    }
}

#[cfg(test)]
mod population {
    use qs_core::{AgentId, LinkId, ModeId, ModeTable};

    use crate::{AgentError, Driver, PopulationBuilder};

    fn modes() -> ModeTable {
        ModeTable::from_presets(&["car", "bike"]).unwrap()
    }

    #[test]
    fn jitter_is_deterministic_and_bounded() {
        let build = || {
            let mut b = PopulationBuilder::new(7);
            for _ in 0..50 {
                b.add_jittered(ModeId(0), 100, 900, Driver::fixed(vec![LinkId(0)]));
            }
            b.build(&modes()).unwrap()
        };
        let (p1, p2) = (build(), build());
        for (a, b) in p1.iter().zip(p2.iter()) {
            assert_eq!(a.departure_secs, b.departure_secs);
            assert!((100..1_000).contains(&a.departure_secs));
        }
    }

    #[test]
    fn unknown_mode_rejected() {
        let mut b = PopulationBuilder::new(0);
        b.add(ModeId(5), 0, Driver::fixed(vec![LinkId(0)]));
        assert!(matches!(b.build(&modes()), Err(AgentError::UnknownMode { agent: AgentId(0), .. })));
    }

    #[test]
    fn empty_route_rejected() {
        let mut b = PopulationBuilder::new(0);
        b.add(ModeId(0), 0, Driver::fixed(Vec::<LinkId>::new()));
        assert!(matches!(b.build(&modes()), Err(AgentError::EmptyRoute(_))));
    }

    #[test]
    fn modes_and_counts() {
        let mut b = PopulationBuilder::new(0);
        b.add(ModeId(1), 0, Driver::fixed(vec![LinkId(0)]));
        b.add(ModeId(0), 0, Driver::fixed(vec![LinkId(0)]));
        b.add(ModeId(1), 0, Driver::fixed(vec![LinkId(0)]));
        let pop = b.build(&modes()).unwrap();
        assert_eq!(pop.modes(), vec![ModeId(1), ModeId(0), ModeId(1)]);
        assert_eq!(pop.count_by_mode(2), vec![1, 2]);
        assert_eq!(pop.finished(), 0);
    }
}

#[cfg(test)]
mod departure {
    use qs_core::{AgentId, LinkId, ModeId, ModeTable, SimClock, Tick};

    use crate::{DepartureQueue, Driver, PopulationBuilder};

    #[test]
    fn scheduled_at_first_tick_at_or_after() {
        let modes = ModeTable::from_presets(&["car"]).unwrap();
        let mut b = PopulationBuilder::new(0);
        for secs in [0, 9, 10, 11] {
            b.add(ModeId(0), secs, Driver::fixed(vec![LinkId(0)]));
        }
        let pop = b.build(&modes).unwrap();
        let mut q = DepartureQueue::from_population(&pop, &SimClock::new(0, 10));
        assert_eq!(q.len(), 4);
        assert_eq!(q.drain_until(Tick(0)), vec![AgentId(0)]);
        assert_eq!(q.drain_until(Tick(1)), vec![AgentId(1), AgentId(2)]);
        assert_eq!(q.next_tick(), Some(Tick(2)));
        assert_eq!(q.drain_until(Tick(5)), vec![AgentId(3)]);
        assert!(q.is_empty());
    }

    #[test]
    fn requeue_goes_first() {
        let mut q = DepartureQueue::new();
        q.push(Tick(4), AgentId(10));
        q.requeue_front(Tick(4), vec![AgentId(1), AgentId(2)]);
        assert_eq!(q.len(), 3);
        assert_eq!(q.drain_until(Tick(4)), vec![AgentId(1), AgentId(2), AgentId(10)]);
    }
}
