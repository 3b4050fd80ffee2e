use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("scionsim-{prefix}-{}-{nanos}", std::process::id()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(dir: &PathBuf, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

const STAR_TOPOLOGY: &str = r#"
{
    "1-ff00:0:110": {
        "core": true,
        "border_routers": {
            "br1": {
                "interfaces": [
                    { "isd_as": "1-ff00:0:111", "neighbor_router": "br1",
                      "latency_ms": 10.0, "bandwidth_mbps": 100.0 },
                    { "isd_as": "1-ff00:0:112", "neighbor_router": "br1",
                      "latency_ms": 20.0, "bandwidth_mbps": 50.0 }
                ]
            }
        },
        "hosts": {}
    },
    "1-ff00:0:111": {
        "core": false,
        "border_routers": {
            "br1": {
                "interfaces": [
                    { "isd_as": "1-ff00:0:110", "neighbor_router": "br1",
                      "latency_ms": 10.0, "bandwidth_mbps": 100.0 }
                ]
            }
        },
        "hosts": { "h1": { "addr": "10.0.0.1" } }
    },
    "1-ff00:0:112": {
        "core": false,
        "border_routers": {
            "br1": {
                "interfaces": [
                    { "isd_as": "1-ff00:0:110", "neighbor_router": "br1",
                      "latency_ms": 20.0, "bandwidth_mbps": 50.0 }
                ]
            }
        },
        "hosts": { "h1": { "addr": "10.0.0.2" } }
    }
}
"#;

const SINGLE_FLOW_TRAFFIC: &str = r#"
{
    "duration_ms": 10000,
    "flows": [
        {
            "name": "f1",
            "source": "1-ff00:0:111,10.0.0.1",
            "destination": "1-ff00:0:112,10.0.0.2",
            "start_time_ms": 1000,
            "data_size_kb": 5000
        }
    ]
}
"#;

#[test]
fn run_single_flow_prints_a_clean_results_block() {
    let dir = unique_temp_dir("run-single-flow");
    let topology = write_file(&dir, "topology.json", STAR_TOPOLOGY);
    let traffic = write_file(&dir, "traffic.json", SINGLE_FLOW_TRAFFIC);

    let output = Command::new(env!("CARGO_BIN_EXE_scionsim"))
        .args([
            "run",
            "--topology",
            topology.to_str().unwrap(),
            "--traffic",
            traffic.to_str().unwrap(),
        ])
        .output()
        .expect("run scionsim");
    assert!(
        output.status.success(),
        "scionsim failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Total Packets Sent: 5000"), "{stdout}");
    assert!(stdout.contains("Total Packets Received: 5000"), "{stdout}");
    assert!(stdout.contains("Total Packets Lost: 0"), "{stdout}");
    assert!(stdout.contains("Packet Loss Rate: 0.00%"), "{stdout}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn run_with_shortest_path_algorithm_also_completes() {
    let dir = unique_temp_dir("run-shortest");
    let topology = write_file(&dir, "topology.json", STAR_TOPOLOGY);
    let traffic = write_file(&dir, "traffic.json", SINGLE_FLOW_TRAFFIC);

    let output = Command::new(env!("CARGO_BIN_EXE_scionsim"))
        .args([
            "run",
            "--topology",
            topology.to_str().unwrap(),
            "--traffic",
            traffic.to_str().unwrap(),
            "--algorithm",
            "shortest-path",
            "--no-probing",
        ])
        .output()
        .expect("run scionsim");
    assert!(
        output.status.success(),
        "scionsim failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Total Packets Lost: 0"), "{stdout}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn malformed_topology_exits_nonzero_with_a_diagnostic() {
    let dir = unique_temp_dir("run-bad-topology");
    let topology = write_file(&dir, "topology.json", "{ not json");
    let traffic = write_file(&dir, "traffic.json", r#"{ "duration_ms": 100, "flows": [] }"#);

    let output = Command::new(env!("CARGO_BIN_EXE_scionsim"))
        .args([
            "run",
            "--topology",
            topology.to_str().unwrap(),
            "--traffic",
            traffic.to_str().unwrap(),
        ])
        .output()
        .expect("run scionsim");
    assert!(!output.status.success(), "expected non-zero exit");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("parse topology file"), "{stderr}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn unknown_flow_host_exits_nonzero() {
    let dir = unique_temp_dir("run-bad-host");
    let topology = write_file(&dir, "topology.json", STAR_TOPOLOGY);
    let traffic = write_file(
        &dir,
        "traffic.json",
        r#"
{
    "duration_ms": 100,
    "flows": [
        {
            "name": "ghost",
            "source": "1-ff00:0:999,10.0.0.9",
            "destination": "1-ff00:0:112,10.0.0.2",
            "start_time_ms": 0,
            "data_size_kb": 1
        }
    ]
}
"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_scionsim"))
        .args([
            "run",
            "--topology",
            topology.to_str().unwrap(),
            "--traffic",
            traffic.to_str().unwrap(),
        ])
        .output()
        .expect("run scionsim");
    assert!(!output.status.success(), "expected non-zero exit");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown host"), "{stderr}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn unknown_algorithm_is_rejected() {
    let dir = unique_temp_dir("run-bad-algorithm");
    let topology = write_file(&dir, "topology.json", STAR_TOPOLOGY);
    let traffic = write_file(&dir, "traffic.json", r#"{ "duration_ms": 100, "flows": [] }"#);

    let output = Command::new(env!("CARGO_BIN_EXE_scionsim"))
        .args([
            "run",
            "--topology",
            topology.to_str().unwrap(),
            "--traffic",
            traffic.to_str().unwrap(),
            "--algorithm",
            "ospf",
        ])
        .output()
        .expect("run scionsim");
    assert!(!output.status.success(), "expected non-zero exit");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown algorithm"), "{stderr}");

    let _ = fs::remove_dir_all(&dir);
}
