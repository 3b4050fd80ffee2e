use crate::net::{NetWorld, Network, NodeId, Packet, PacketKind};
use crate::path::{PathSelection, ShortestPathAlgorithm};
use crate::sim::{SimTime, Simulator};
use std::sync::Arc;

/// 两个 AS，各一台路由器和一台主机，10ms / 100Mbps 双向链路。
fn two_as_world() -> (NetWorld, NodeId, NodeId, NodeId, NodeId) {
    let mut net = Network::default();
    let a0 = net.add_as("1-ff00:0:110", true);
    let a1 = net.add_as("1-ff00:0:111", false);
    let r1 = net.add_router(a0, "1-ff00:0:110-br1");
    let r2 = net.add_router(a1, "1-ff00:0:111-br1");
    let h1 = net.add_host(a0, "1-ff00:0:110,10.0.0.1", r1);
    let h2 = net.add_host(a1, "1-ff00:0:111,10.0.0.2", r2);
    net.connect(r1, r2, SimTime::from_millis(10), 100_000_000);
    net.connect(r2, r1, SimTime::from_millis(10), 100_000_000);
    let view = Arc::new(net.topo_view());
    let world = NetWorld::new(net, Box::new(ShortestPathAlgorithm::new(view)));
    (world, r1, r2, h1, h2)
}

fn data_pkt(id: u64, size_bytes: u32, src: NodeId, dst: NodeId, path: Vec<NodeId>) -> Packet {
    Packet {
        id,
        size_bytes,
        src,
        dst,
        path,
        sent_at: SimTime::ZERO,
        kind: PacketKind::Data { flow: 0 },
    }
}

#[test]
fn link_delay_is_propagation_plus_transmission() {
    let (mut world, r1, r2, h1, h2) = two_as_world();
    let mut sim = Simulator::default();

    // 1000B * 8 / 100Mbps = 0.08ms 序列化；传播 10ms。
    let pkt = data_pkt(0, 1000, h1, h2, vec![r1, r2]);
    world.deliver(r1, pkt, &mut sim);
    sim.run(&mut world);

    assert_eq!(world.net.results.packets_received, 1);
    assert_eq!(world.net.results.packets_lost, 0);
    let latency = world.net.results.latencies_ms[0];
    assert!((latency - 10.08).abs() < 1e-9, "latency = {latency}");
}

#[test]
fn same_link_delivers_packets_in_enqueue_order() {
    let (mut world, r1, r2, h1, h2) = two_as_world();
    let mut sim = Simulator::default();

    for id in 0..3 {
        let pkt = data_pkt(id, 1000, h1, h2, vec![r1, r2]);
        world.deliver(r1, pkt, &mut sim);
    }
    sim.run(&mut world);

    assert_eq!(world.net.results.packets_received, 3);
    let lat = &world.net.results.latencies_ms;
    // 链路串行化：后继包的到达被前面的序列化时间推后。
    assert!((lat[0] - 10.08).abs() < 1e-9, "lat[0] = {}", lat[0]);
    assert!((lat[1] - 10.16).abs() < 1e-9, "lat[1] = {}", lat[1]);
    assert!((lat[2] - 10.24).abs() < 1e-9, "lat[2] = {}", lat[2]);
    assert!(lat.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn missing_next_hop_counts_as_loss_not_delivery() {
    let (mut world, r1, _r2, h1, h2) = two_as_world();
    let mut sim = Simulator::default();

    // 路径指向一个与 r1 没有链路的节点（主机无入链路）。
    let pkt = data_pkt(0, 1000, h1, h2, vec![r1, h2]);
    world.deliver(r1, pkt, &mut sim);
    sim.run(&mut world);

    assert_eq!(world.net.results.packets_received, 0);
    assert_eq!(world.net.results.packets_lost, 1);
}

#[test]
fn probe_is_reflected_at_terminal_router_and_rtt_recorded() {
    let (mut world, r1, r2, h1, _h2) = two_as_world();
    let mut sim = Simulator::default();

    let path = vec![r1, r2];
    world.selection.record_probe_sent(7, &path);
    let pkt = Packet {
        id: 0,
        size_bytes: 64,
        src: h1,
        dst: r2,
        path: path.clone(),
        sent_at: SimTime::ZERO,
        kind: PacketKind::Probe {
            probe_id: 7,
            reflected: false,
        },
    };
    world.deliver(r1, pkt, &mut sim);
    sim.run(&mut world);

    // 来回传播 20ms + 两次 64B 序列化（各 0.00512ms）。
    let rtt = world
        .selection
        .get_path_latency(&path)
        .expect("probe result recorded");
    assert!((rtt - 20.01024).abs() < 1e-9, "rtt = {rtt}");
}
