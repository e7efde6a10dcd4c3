//! Integration tests for qs-output.

#[cfg(test)]
mod helpers {
    use tempfile::TempDir;

    use crate::row::{EventRow, FdRow, FlowSampleRow, IntervalRow, LinkStateRow};

    pub fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    pub fn event_row(tick: u64, agent_id: u32) -> EventRow {
        EventRow { tick, time_secs: 3_600 + tick, kind: "linkEntered", agent_id, link_id: 2 }
    }

    pub fn interval_row(tick: u64) -> IntervalRow {
        IntervalRow {
            tick,
            time_secs:           3_600 + tick,
            vehicles_on_network: 12,
            departed:            3,
            arrived:             1,
            stuck:               0,
            rejections:          4,
        }
    }

    pub fn link_row(tick: u64, link_id: u32) -> LinkStateRow {
        LinkStateRow {
            tick,
            link_id,
            vehicles:     2,
            occupied_pcu: 1.25,
            storage_pcu:  133.0,
            discharged:   0.75,
            flow_budget:  0.75,
        }
    }

    pub fn flow_row(mode_id: u16, permanent: bool) -> FlowSampleRow {
        FlowSampleRow {
            tick: 59,
            mode_id,
            number_of_agents: 10,
            density: 10.0,
            flow: 1_800.0,
            speed_kmh: 54.0,
            permanent,
        }
    }

    pub fn fd_row() -> FdRow {
        FdRow {
            agents:                3,
            mode_agents:           vec![1, 2],
            density:               1.5,
            mode_density:          vec![1.0, 0.5],
            flow:                  900.0,
            mode_flow:             vec![600.0, 300.0],
            speed_kmh:             40.0,
            mode_speed_kmh:        vec![60.0, 15.0],
            overtakes_per_km:      2.0,
            pair_overtakes_per_km: Some(2.0),
            avg_overtake_rate:     0.5,
        }
    }
}

// ── CSV tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod csv_tests {
    use super::helpers::*;
    use crate::csv::CsvWriter;
    use crate::row::GLOBAL_MODE;
    use crate::writer::OutputWriter;

    fn headers(path: &std::path::Path) -> Vec<String> {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        rdr.headers().unwrap().iter().map(str::to_owned).collect()
    }

    #[test]
    fn csv_files_created() {
        let dir = tmp();
        let _w = CsvWriter::new(dir.path()).unwrap();
        for f in ["events.csv", "intervals.csv", "link_states.csv", "flow_samples.csv"] {
            assert!(dir.path().join(f).exists(), "{f}");
        }
    }

    #[test]
    fn csv_headers_correct() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        assert_eq!(headers(&dir.path().join("events.csv")), ["tick", "time_secs", "kind", "agent_id", "link_id"]);
        assert_eq!(
            headers(&dir.path().join("intervals.csv")),
            ["tick", "time_secs", "vehicles_on_network", "departed", "arrived", "stuck", "rejections"]
        );
        assert_eq!(
            headers(&dir.path().join("flow_samples.csv")),
            ["tick", "mode_id", "number_of_agents", "density", "flow", "speed_kmh", "permanent"]
        );
    }

    #[test]
    fn csv_events_in_order() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_events(&[event_row(0, 4), event_row(0, 1), event_row(1, 4)]).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("events.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[0][2], "linkEntered");
        assert_eq!(&rows[0][3], "4");
        assert_eq!(&rows[1][3], "1");
        assert_eq!(&rows[2][1], "3601");
    }

    #[test]
    fn csv_interval_row() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_interval(&interval_row(7)).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("intervals.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "7");
        assert_eq!(&rows[0][2], "12"); // vehicles_on_network
        assert_eq!(&rows[0][6], "4");  // rejections
    }

    #[test]
    fn csv_link_states_and_flow() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_link_states(&[link_row(5, 0), link_row(5, 1)]).unwrap();
        w.write_flow_samples(&[flow_row(GLOBAL_MODE, true), flow_row(0, true)]).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("link_states.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][1], "1");
        assert_eq!(&rows[1][3], "1.25");

        let mut rdr = csv::Reader::from_path(dir.path().join("flow_samples.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[0][1], "65535");
        assert_eq!(&rows[0][6], "1");
        assert_eq!(&rows[1][1], "0");
    }

    #[test]
    fn csv_finish_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }

    #[test]
    fn csv_empty_batches_ok() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_events(&[]).unwrap();
        w.write_link_states(&[]).unwrap();
        w.write_flow_samples(&[]).unwrap();
    }
}

// ── FD table tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod fd_tests {
    use super::helpers::*;
    use crate::{FdTableWriter, OutputError};

    fn read(path: &std::path::Path) -> Vec<Vec<String>> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| l.split('\t').map(str::to_owned).collect())
            .collect()
    }

    #[test]
    fn header_and_row_tab_separated() {
        let dir = tmp();
        let path = dir.path().join("fd.txt");
        let mut w = FdTableWriter::create(&path, &["car", "bike"], Some(("car", "bike"))).unwrap();
        w.write_row(&fd_row()).unwrap();
        w.finish().unwrap();
        assert_eq!(w.rows(), 1);

        let lines = read(&path);
        assert_eq!(
            lines[0],
            [
                "n", "n_car", "n_bike", "k", "k_car", "k_bike", "q", "q_car", "q_bike", "v", "v_car", "v_bike",
                "overtakes_per_km", "car_overtakes_bike_per_km", "avg_overtake_rate",
            ]
        );
        assert_eq!(
            lines[1],
            [
                "3", "1", "2", "1.50", "1.00", "0.50", "900.00", "600.00", "300.00", "40.00", "60.00", "15.00",
                "2.00", "2.00", "0.50",
            ]
        );
    }

    #[test]
    fn single_mode_has_no_pair_column() {
        let dir = tmp();
        let path = dir.path().join("fd.txt");
        let mut w = FdTableWriter::create(&path, &["car"], None).unwrap();
        w.finish().unwrap();
        assert_eq!(read(&path)[0], ["n", "n_car", "k", "k_car", "q", "q_car", "v", "v_car", "overtakes_per_km", "avg_overtake_rate"]);
    }

    #[test]
    fn mode_count_mismatch_rejected() {
        let dir = tmp();
        let mut w = FdTableWriter::create(&dir.path().join("fd.txt"), &["car"], None).unwrap();
        let err = w.write_row(&fd_row()).unwrap_err();
        assert!(matches!(err, OutputError::ModeCount { expected: 1, got: 2 }));
        assert_eq!(w.rows(), 0);
    }
}

// ── Observer integration ──────────────────────────────────────────────────────

#[cfg(test)]
mod observer_tests {
    use qs_agent::{Driver, PopulationBuilder};
    use qs_core::{LinkId, ModeId, ModeTable, SimConfig};
    use qs_flow::TrackerConfig;
    use qs_network::{LinkAttrs, NetworkBuilder};
    use qs_sim::SimBuilder;

    use super::helpers::tmp;
    use crate::csv::CsvWriter;
    use crate::observer::SimOutputObserver;

    fn count_rows(path: std::path::PathBuf) -> usize {
        csv::Reader::from_path(path).unwrap().records().count()
    }

    #[test]
    fn integration_csv() {
        let config = SimConfig {
            start_secs:            3_600,
            end_secs:              3_620,
            tick_duration_secs:    1,
            seed:                  1,
            num_threads:           Some(1),
            output_interval_ticks: 5,
        };

        let mut b = NetworkBuilder::new();
        let a = b.add_node("a");
        let c = b.add_node("b");
        b.add_link("l0", a, c, LinkAttrs::new(100.0, 10.0));
        let network = b.build().unwrap();

        let modes = ModeTable::from_presets(&["car"]).unwrap();
        let mut pop = PopulationBuilder::new(1);
        pop.add(ModeId(0), 3_600, Driver::fixed(vec![LinkId(0)]));
        let population = pop.build(&modes).unwrap();

        let mut sim = SimBuilder::new(config.clone(), network, modes, population)
            .tracker(TrackerConfig { bin_ticks: 10, ..TrackerConfig::default() })
            .build()
            .unwrap();

        let dir = tmp();
        let writer = CsvWriter::new(dir.path()).unwrap();
        let mut obs = SimOutputObserver::new(writer, &config);
        sim.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none(), "no write errors expected");

        // departed, linkEntered, linkLeft, arrived
        assert_eq!(count_rows(dir.path().join("events.csv")), 4);
        assert_eq!(count_rows(dir.path().join("intervals.csv")), 20);
        // Snapshots at ticks 0, 5, 10, 15 on one link.
        assert_eq!(count_rows(dir.path().join("link_states.csv")), 4);
        // Two bins, global plus car.
        assert_eq!(count_rows(dir.path().join("flow_samples.csv")), 4);

        let mut rdr = csv::Reader::from_path(dir.path().join("events.csv")).unwrap();
        let last = rdr.records().last().unwrap().unwrap();
        assert_eq!(&last[0], "10");
        assert_eq!(&last[1], "3610");
        assert_eq!(&last[2], "arrived");
    }
}

// ── SQLite tests ──────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "sqlite"))]
mod sqlite_tests {
    use super::helpers::*;
    use crate::row::GLOBAL_MODE;
    use crate::sqlite::SqliteWriter;
    use crate::writer::OutputWriter;

    fn count(dir: &std::path::Path, table: &str) -> i64 {
        let conn = rusqlite::Connection::open(dir.join("output.db")).unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0)).unwrap()
    }

    #[test]
    fn sqlite_db_created() {
        let dir = tmp();
        let _w = SqliteWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("output.db").exists());
    }

    #[test]
    fn sqlite_event_count() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_events(&[event_row(0, 0), event_row(0, 1), event_row(2, 0)]).unwrap();
        w.finish().unwrap();
        assert_eq!(count(dir.path(), "events"), 3);
    }

    #[test]
    fn sqlite_interval_row() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_interval(&interval_row(7)).unwrap();
        w.finish().unwrap();

        let conn = rusqlite::Connection::open(dir.path().join("output.db")).unwrap();
        let (time, vehicles, rejections): (i64, i64, i64) = conn
            .query_row(
                "SELECT time_secs, vehicles_on_network, rejections FROM intervals WHERE tick = 7",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!(time, 3_607);
        assert_eq!(vehicles, 12);
        assert_eq!(rejections, 4);
    }

    #[test]
    fn sqlite_permanent_as_integer() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_flow_samples(&[flow_row(GLOBAL_MODE, true)]).unwrap();
        w.write_link_states(&[link_row(0, 0)]).unwrap();
        w.finish().unwrap();

        let conn = rusqlite::Connection::open(dir.path().join("output.db")).unwrap();
        let (mode, permanent): (i64, i64) = conn
            .query_row("SELECT mode_id, permanent FROM flow_samples", [], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap();
        assert_eq!(mode, u16::MAX as i64);
        assert_eq!(permanent, 1);
        assert_eq!(count(dir.path(), "link_states"), 1);
    }
}
