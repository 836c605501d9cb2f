use std::fs::File;
use std::io::Write;

use rotor_config::{TriggerRow, load_trigger_log_csv, read_trigger_log};
use rstest::rstest;
use tempfile::tempdir;

#[rstest]
fn loads_rows_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("triggers.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "time_us,ordinal").unwrap();
    writeln!(f, "0,0").unwrap();
    writeln!(f, "20000,1").unwrap();
    writeln!(f, "20000,2").unwrap();
    drop(f);

    let rows = load_trigger_log_csv(&path).unwrap();
    assert_eq!(
        rows,
        vec![
            TriggerRow { time_us: 0, ordinal: 0 },
            TriggerRow { time_us: 20_000, ordinal: 1 },
            TriggerRow { time_us: 20_000, ordinal: 2 },
        ]
    );
}

#[rstest]
#[case("time,ordinal\n0,0\n", "headers")]
#[case("ordinal,time_us\n0,0\n", "headers")]
#[case("time_us,ordinal\n", "no rows")]
#[case("time_us,ordinal\n10,0\n5,1\n", "backwards at row 3")]
#[case("time_us,ordinal\n10,x\n", "invalid CSV row 2")]
#[case("time_us,ordinal\n-4,0\n", "invalid CSV row 2")]
fn rejects_malformed_logs(#[case] csv: &str, #[case] needle: &str) {
    let err = read_trigger_log(csv.as_bytes()).expect_err("should be rejected");
    assert!(format!("{err}").contains(needle), "got: {err}");
}

#[rstest]
fn missing_file_names_the_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.csv");
    let err = load_trigger_log_csv(&path).expect_err("missing file");
    assert!(format!("{err}").contains("absent.csv"));
}
