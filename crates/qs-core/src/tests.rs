//! Unit tests for qs-core primitives.

#[cfg(test)]
mod ids {
    use crate::{AgentId, LinkId, ModeId, NodeId, VehicleId};

    #[test]
    fn index_roundtrip() {
        let id = LinkId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(LinkId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(AgentId::INVALID.0, u32::MAX);
        assert_eq!(NodeId::INVALID.0, u32::MAX);
        assert_eq!(ModeId::INVALID.0, u16::MAX);
        assert!(!LinkId::default().is_valid());
    }

    #[test]
    fn vehicle_numbered_like_driver() {
        assert_eq!(VehicleId::from(AgentId(9)), VehicleId(9));
    }

    #[test]
    fn display() {
        assert_eq!(LinkId(7).to_string(), "LinkId(7)");
    }
}

#[cfg(test)]
mod time {
    use crate::{SimClock, SimConfig, Tick};

    #[test]
    fn tick_arithmetic() {
        let t = Tick(10);
        assert_eq!(t + 5, Tick(15));
        assert_eq!(t.offset(3), Tick(13));
        assert_eq!(Tick(15) - Tick(10), 5u64);
        assert_eq!(Tick(3).since(Tick(8)), 0);
    }

    #[test]
    fn clock_secs_and_display() {
        let mut clock = SimClock::new(3_600, 2);
        assert_eq!(clock.current_secs(), 3_600);
        for _ in 0..31 {
            clock.advance();
        }
        assert_eq!(clock.current_secs(), 3_662);
        assert_eq!(clock.hms(), (1, 1, 2));
        assert_eq!(clock.to_string(), "T31 (01:01:02)");
    }

    #[test]
    fn ticks_for_secs_rounds_up() {
        let clock = SimClock::new(0, 1);
        assert_eq!(clock.ticks_for_secs(10.0), 10);
        assert_eq!(clock.ticks_for_secs(10.2), 11);
        let coarse = SimClock::new(0, 5);
        assert_eq!(coarse.ticks_for_secs(11.0), 3);
    }

    #[test]
    fn tick_at_or_after() {
        let clock = SimClock::new(100, 10);
        assert_eq!(clock.tick_at_or_after(0), Tick(0));
        assert_eq!(clock.tick_at_or_after(100), Tick(0));
        assert_eq!(clock.tick_at_or_after(101), Tick(1));
        assert_eq!(clock.tick_at_or_after(130), Tick(3));
    }

    #[test]
    fn end_tick_and_validation() {
        let cfg = SimConfig { start_secs: 0, end_secs: 100, tick_duration_secs: 3, ..SimConfig::default() };
        assert_eq!(cfg.end_tick(), Tick(34));
        assert!(cfg.validate().is_ok());

        let zero_dt = SimConfig { tick_duration_secs: 0, ..SimConfig::default() };
        assert!(zero_dt.validate().is_err());

        let empty = SimConfig { start_secs: 50, end_secs: 50, ..SimConfig::default() };
        assert!(empty.validate().is_err());
    }
}

#[cfg(test)]
mod vehicle {
    use crate::{CoreError, ModeId, ModeTable, VehicleType};

    #[test]
    fn presets_build_table() {
        let table = ModeTable::from_presets(&["car", "bike"]).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.by_name("bike"), Some(ModeId(1)));
        assert_eq!(table.pcu(ModeId(0)), 1.0);
        assert_eq!(table.pcu(ModeId(1)), 0.25);
        assert_eq!(table.max_pcu(), 1.0);
    }

    #[test]
    fn unknown_preset_rejected() {
        let err = ModeTable::from_presets(&["car", "hovercraft"]).unwrap_err();
        assert!(matches!(err, CoreError::UnknownMode(name) if name == "hovercraft"));
    }

    #[test]
    fn duplicate_names_rejected() {
        let result = ModeTable::new(vec![
            VehicleType::new("car", 1.0, 10.0),
            VehicleType::new("car", 2.0, 10.0),
        ]);
        assert!(matches!(result, Err(CoreError::InconsistentConfiguration(_))));
    }

    #[test]
    fn non_positive_pcu_rejected() {
        assert!(ModeTable::new(vec![VehicleType::new("car", 0.0, 10.0)]).is_err());
        assert!(ModeTable::new(vec![VehicleType::new("car", 1.0, -1.0)]).is_err());
        assert!(ModeTable::new(vec![]).is_err());
    }
}

#[cfg(test)]
mod math {
    use crate::math::{gcd, gcd_of, lcm};

    #[test]
    fn gcd_lcm() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(7, 0), 7);
        assert_eq!(lcm(4, 6), 12);
        assert_eq!(lcm(0, 6), 0);
    }

    #[test]
    fn gcd_of_list() {
        assert_eq!(gcd_of(&[100, 400, 250]), Some(50));
        assert_eq!(gcd_of(&[9]), Some(9));
        assert_eq!(gcd_of(&[]), None);
    }
}

#[cfg(test)]
mod rng {
    use crate::{AgentId, AgentRng};

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = AgentRng::new(12345, AgentId(3));
        let mut r2 = AgentRng::new(12345, AgentId(3));
        for _ in 0..100 {
            assert_eq!(r1.secs_within(900), r2.secs_within(900));
        }
    }

    #[test]
    fn secs_within_bounds() {
        let mut rng = AgentRng::new(0, AgentId(0));
        for _ in 0..1000 {
            assert!(rng.secs_within(900) < 900);
        }
        assert_eq!(rng.secs_within(0), 0);
    }
}
