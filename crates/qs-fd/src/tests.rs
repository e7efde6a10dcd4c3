//! Unit tests for qs-fd.

#[cfg(test)]
mod helpers {
    use qs_core::SimConfig;

    use crate::{FdConfig, TrackConfig};

    pub const CAR: f64 = 1.0;
    pub const BIKE: f64 = 0.25;
    pub const TRUCK: f64 = 3.0;

    /// Three 30 m links: a 12 PCU ring with 2 s links.
    pub fn tiny_track() -> TrackConfig {
        TrackConfig { branch_length_m: 30.0, subdivision: 1, ..TrackConfig::default() }
    }

    /// Too short for any stability streak: a single bin closes.
    pub fn short_config() -> FdConfig {
        FdConfig {
            track: tiny_track(),
            departure_window_secs: 60,
            sim: SimConfig { end_secs: 100, ..SimConfig::default() },
            ..FdConfig::default()
        }
    }
}

// ── Config ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod config_tests {
    use qs_core::CoreError;

    use crate::{FdConfig, FdError, FdSweep, TrackConfig};

    #[test]
    fn default_validates() {
        let c = FdConfig::default();
        c.validate().unwrap();
        assert!(c.dynamics.passing);
        assert_eq!(c.mode_table().unwrap().len(), 2);
    }

    #[test]
    fn split_length_must_match_modes() {
        let c = FdConfig { modal_split_pcu: vec![1.0], ..FdConfig::default() };
        assert!(matches!(c.validate(), Err(CoreError::InconsistentConfiguration(_))));
    }

    #[test]
    fn rejects_bad_values() {
        let bad = [
            FdConfig { modes: Vec::new(), modal_split_pcu: Vec::new(), ..FdConfig::default() },
            FdConfig { modes: vec!["car".into(), "car".into()], ..FdConfig::default() },
            FdConfig { modal_split_pcu: vec![1.0, 0.0], ..FdConfig::default() },
            FdConfig { reduce_factor: 0, ..FdConfig::default() },
            FdConfig { departure_window_secs: 0, ..FdConfig::default() },
            FdConfig { track: TrackConfig { subdivision: 0, ..TrackConfig::default() }, ..FdConfig::default() },
            FdConfig { track: TrackConfig { lanes: 0.0, ..TrackConfig::default() }, ..FdConfig::default() },
        ];
        for c in bad {
            assert!(matches!(c.validate(), Err(CoreError::InconsistentConfiguration(_))), "{c:?}");
        }
    }

    #[test]
    fn unknown_mode_fails_sweep_setup() {
        let c = FdConfig { modes: vec!["car".into(), "rickshaw".into()], ..FdConfig::default() };
        let err = FdSweep::new(c).err().unwrap();
        assert!(matches!(err, FdError::Core(CoreError::UnknownMode(m)) if m == "rickshaw"));
    }
}

// ── Track ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod track_tests {
    use qs_core::LinkId;

    use crate::{TrackConfig, TriangleTrack};

    #[test]
    fn ring_is_closed_with_entry_and_exit() {
        let t = TriangleTrack::build(TrackConfig::default()).unwrap();
        let net = &t.network;
        assert_eq!(net.link_count(), 11);
        assert_eq!(t.ring.ring.len(), 9);

        for (i, &l) in t.ring.ring.iter().enumerate() {
            let next = t.ring.ring[(i + 1) % 9];
            assert_eq!(net.link(l).to, net.link(next).from);
            assert!((net.link(l).length_m - 1_000.0 / 3.0).abs() < 1e-9);
        }

        let home = net.link(t.ring.home);
        let work = net.link(t.ring.exit);
        assert_eq!(home.to, net.link(LinkId(0)).from);
        assert_eq!(t.ring.exit_after, LinkId(2));
        assert_eq!(work.from, net.link(LinkId(2)).to);
        assert_eq!(home.storage_capacity, Some(10_000.0));
        assert_eq!(work.storage_capacity, Some(10_000.0));
        assert_eq!(t.reference_link(), LinkId(0));
    }

    #[test]
    fn links_named_by_branch() {
        let t = TriangleTrack::build(TrackConfig::default()).unwrap();
        assert_eq!(t.network.link_by_name("base_0"), Some(LinkId(0)));
        assert_eq!(t.network.link_by_name("middle_0"), Some(LinkId(3)));
        assert_eq!(t.network.link_by_name("top_2"), Some(LinkId(8)));
        assert_eq!(t.network.link_by_name("home"), Some(t.ring.home));
        assert_eq!(t.network.link_by_name("work"), Some(t.ring.exit));
    }

    #[test]
    fn capacities_follow_geometry() {
        let c = TrackConfig::default();
        assert!((c.network_pcu_capacity(7.5) - 400.0).abs() < 1e-9);
        assert!((c.jam_density_per_km(7.5) - 1_000.0 / 7.5).abs() < 1e-9);

        let two_lanes = TrackConfig { lanes: 2.0, ..TrackConfig::default() };
        assert!((two_lanes.network_pcu_capacity(7.5) - 800.0).abs() < 1e-9);
    }
}

// ── Points ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod points_tests {
    use super::helpers::{BIKE, CAR, TRUCK};
    use crate::points::{distribution_points, modal_split_points, modal_split_steps};

    #[test]
    fn car_bike_even_split_in_pcu() {
        let steps = modal_split_steps(&[CAR, BIKE], &[1.0, 1.0], 1);
        assert_eq!(steps, [1, 4]);

        let points = modal_split_points(&steps, &[CAR, BIKE], 400.0);
        assert_eq!(points.len(), 204);
        assert_eq!(points[0], [1, 4]);
        assert_eq!(points[203], [204, 816]);
    }

    #[test]
    fn heavy_mode_scales_the_mix() {
        // 1:1 in PCU with 3-PCU trucks needs 3 cars per truck.
        let steps = modal_split_steps(&[CAR, TRUCK], &[1.0, 1.0], 1);
        assert_eq!(steps, [3, 1]);
        assert_eq!(modal_split_points(&steps, &[CAR, TRUCK], 400.0).len(), 71);
    }

    #[test]
    fn uneven_split() {
        assert_eq!(modal_split_steps(&[CAR, BIKE], &[3.0, 1.0], 1), [3, 4]);
    }

    #[test]
    fn reduce_factor_thins_points() {
        let steps = modal_split_steps(&[CAR, BIKE], &[1.0, 1.0], 10);
        assert_eq!(steps, [10, 40]);
        let points = modal_split_points(&steps, &[CAR, BIKE], 400.0);
        assert_eq!(points.len(), 24);
        assert_eq!(points[23], [240, 960]);
    }

    #[test]
    fn single_mode_steps_by_one() {
        assert_eq!(modal_split_steps(&[BIKE], &[1.0], 1), [1]);
        assert_eq!(modal_split_steps(&[CAR], &[1.0], 5), [5]);
        let points = modal_split_points(&[1], &[CAR], 400.0);
        assert_eq!(points.len(), 404);
        assert_eq!(points.last().unwrap(), &[404]);
    }

    #[test]
    fn distribution_walks_grid_last_mode_fastest() {
        let points = distribution_points(&[CAR, TRUCK], 400.0, 100);
        assert_eq!(
            points,
            [vec![1, 1], vec![1, 101], vec![101, 1], vec![101, 101], vec![201, 1], vec![301, 1], vec![401, 1]]
        );
    }

    #[test]
    fn distribution_respects_capacity() {
        let pcu = [CAR, BIKE];
        for p in distribution_points(&pcu, 20.0, 3) {
            let load = p[0] as f64 * CAR + p[1] as f64 * BIKE;
            assert!(load <= 25.0, "{p:?}");
        }
    }
}

// ── Assessment ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod assess_tests {
    use qs_core::{AgentId, LinkId, ModeId, ModeTable, Tick};
    use qs_events::Event;
    use qs_flow::{FlowDynamicsTracker, TrackerConfig};
    use qs_network::{LinkAttrs, NetworkBuilder};

    use crate::assess;

    const CAR: ModeId = ModeId(0);
    const L0: LinkId = LinkId(0);

    fn tracker() -> FlowDynamicsTracker {
        let mut b = NetworkBuilder::new();
        let a = b.add_node("a");
        let c = b.add_node("b");
        b.add_link("l0", a, c, LinkAttrs::new(1_000.0, 100.0));
        b.add_link("l1", c, a, LinkAttrs::new(1_000.0, 100.0));
        let config = TrackerConfig {
            reference_link:    L0,
            bin_ticks:         10,
            window_bins:       2,
            tolerance:         0.01,
            min_stable_bins:   2,
            measured_length_m: Some(1_000.0),
        };
        let modes = ModeTable::from_presets(&["car"]).unwrap();
        FlowDynamicsTracker::new(&b.build().unwrap(), &modes, vec![CAR; 10], config, 1).unwrap()
    }

    /// Ten cars cycling on l0 at constant density 10 PCU/km.
    fn steady(t: &mut FlowDynamicsTracker, ticks: std::ops::Range<u64>) {
        for now in ticks {
            let agent = AgentId((now % 10) as u32);
            if now >= 10 {
                t.record(&Event::left(Tick(now), agent, L0));
            }
            t.record(&Event::entered(Tick(now), agent, L0));
            t.close_interval(Tick(now));
        }
    }

    #[test]
    fn permanent_run_is_valid() {
        let mut t = tracker();
        steady(&mut t, 0..40);
        let a = assess(&t, 100.0);
        assert!(a.flow_unstable.is_empty());
        assert!(a.speed_unstable.is_empty());
        assert!(a.permanent);
        assert_eq!(a.permanent_density, Some(10.0));
        assert!(!a.too_dense);
        assert!(a.is_valid());
    }

    #[test]
    fn overfull_run_rejected() {
        let mut t = tracker();
        steady(&mut t, 0..40);
        let a = assess(&t, 5.0);
        assert!(a.too_dense);
        assert!(!a.is_valid());
    }

    #[test]
    fn idle_run_unstable_everywhere() {
        let t = tracker();
        let a = assess(&t, 100.0);
        assert_eq!(a.flow_unstable, [CAR]);
        assert_eq!(a.speed_unstable, [CAR]);
        assert!(!a.permanent);
        assert_eq!(a.permanent_density, None);
        assert!(!a.is_valid());
    }
}

// ── Sweep ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod sweep_tests {
    use qs_core::{CoreError, SimConfig};

    use super::helpers::short_config;
    use crate::{FdConfig, FdError, FdSweep, PointSource};

    #[test]
    fn points_follow_the_point_source() {
        let sweep = FdSweep::new(short_config()).unwrap();
        assert!((sweep.network_pcu_capacity() - 12.0).abs() < 1e-9);
        let points = sweep.points();
        assert_eq!(points.len(), 10);
        assert_eq!(points[0], [1, 4]);

        let grid = FdSweep::new(FdConfig { points: PointSource::Distribution, reduce_factor: 4, ..short_config() })
            .unwrap()
            .points();
        // car 1, 5, 9, 13 × bike 1, 5, …, 49, within 17 PCU.
        assert!(grid.iter().all(|p| p[0] as f64 + p[1] as f64 * 0.25 <= 17.0));
        assert_eq!(grid[0], [1, 1]);
    }

    #[test]
    fn point_needs_one_count_per_mode() {
        let mut sweep = FdSweep::new(short_config()).unwrap();
        assert!(matches!(sweep.run_point(&[3]), Err(FdError::Core(CoreError::InconsistentConfiguration(_)))));
    }

    #[test]
    fn short_run_is_rejected_and_counted() {
        let mut sweep = FdSweep::new(short_config()).unwrap();
        let point = sweep.run_point(&[2, 4]).unwrap();

        assert_eq!(point.summary.departed, 6);
        assert_eq!(point.summary.arrived, 0);
        assert_eq!(point.summary.final_tick.0, 100);
        assert!(!point.assessment.permanent);
        assert!(!point.is_valid());
        assert!(point.to_row().is_none());
        assert!(point.global.is_none());
        assert!(point.pair_overtakes_per_km.is_some());
        assert_eq!(sweep.flow_unstable_counts(), [1, 1]);
        assert_eq!(sweep.speed_unstable_counts(), [1, 1]);
    }

    #[test]
    fn sweep_writes_only_valid_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt");

        let mut sweep = FdSweep::new(short_config()).unwrap();
        let mut table = sweep.create_table(&path).unwrap();
        let results = sweep.run(Some(&mut table)).unwrap();

        assert_eq!(results.len(), 10);
        assert!(results.iter().all(|p| !p.is_valid()));
        assert_eq!(table.rows(), 0);
        assert_eq!(sweep.flow_unstable_counts(), [10, 10]);

        let text = std::fs::read_to_string(&path).unwrap();
        let header: Vec<&str> = text.lines().next().unwrap().split('\t').collect();
        assert_eq!(header[0], "n");
        assert!(header.contains(&"car_overtakes_bike_per_km"));
    }

    #[test]
    fn steady_cars_reach_a_valid_point() {
        let config = FdConfig {
            modes: vec!["car".into()],
            modal_split_pcu: vec![1.0],
            sim: SimConfig { end_secs: 3 * 3_600, ..SimConfig::default() },
            ..FdConfig::default()
        };
        let mut sweep = FdSweep::new(config).unwrap();
        let point = sweep.run_point(&[10]).unwrap();

        assert!(point.is_valid(), "{:?}", point.assessment);
        assert_eq!(point.summary.arrived, 10);
        assert!(point.summary.terminated_early);
        assert_eq!(point.pair_overtakes_per_km, None);

        let row = point.to_row().unwrap();
        assert_eq!(row.agents, 10);
        assert_eq!(row.mode_agents, [10]);
        assert!(row.density > 0.0 && row.density <= 1_000.0 / 7.5 + 10.0);
        assert!(row.speed_kmh > 40.0 && row.speed_kmh < 65.0, "{}", row.speed_kmh);
        assert_eq!(sweep.flow_unstable_counts(), [0]);
    }
}
