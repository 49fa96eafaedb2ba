//! Topology fold and cascade delete benchmarks.
//!
//! Measures the grouping pass over sorted join rows and a building delete
//! that walks rooms, gateways and sensors.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use iotinv_core::topology::{build_infrastructure, InfraRow, Named};
use iotinv_core::{
    Building, EntityKind, Gateway, NetworkType, Room, Sensor, SensorType, Server, Store, Topology,
};

/// Sorted rows for `servers` servers with 4 gateways of 8 sensors each.
fn infra_rows(servers: i64) -> Vec<InfraRow> {
    let mut rows = Vec::new();
    for s in 0..servers {
        for g in 0..4 {
            for c in 0..8 {
                let gateway = s * 4 + g;
                rows.push(InfraRow {
                    server: Named::new(s, format!("10.0.{}.{}", s / 256, s % 256)),
                    gateway: Some(Named::new(gateway, format!("G{}", gateway))),
                    sensor: Some(Named::new(gateway * 8 + c, format!("S{}", c))),
                    network: Some("LoRaWAN".to_string()),
                });
            }
        }
    }
    rows
}

/// A store with one building of `rooms` rooms, each holding a gateway and 8 sensors.
fn site(rooms: usize) -> Store {
    let store = Store::open_in_memory().unwrap();
    let building = store.insert(Building::new("B1")).unwrap();
    let server = store.insert(Server::new("10.0.0.1")).unwrap();
    let sensor_type = store.insert(SensorType::new("Temperature", "C")).unwrap();
    let network = store.insert(NetworkType::new("LoRaWAN", 50)).unwrap();

    for r in 0..rooms {
        let room = store
            .insert(Room::new(building.id, format!("R{}", r)))
            .unwrap();
        let gateway = store
            .insert(Gateway::new(room.id, server.id, format!("G{}", r)))
            .unwrap();
        for c in 0..8 {
            store
                .insert(Sensor::new(
                    room.id,
                    gateway.id,
                    sensor_type.id,
                    network.id,
                    format!("S{}", c),
                ))
                .unwrap();
        }
    }
    store
}

fn bench_infrastructure_fold(c: &mut Criterion) {
    let mut group = c.benchmark_group("topology/fold");

    for servers in [10, 100, 1000] {
        let rows = infra_rows(servers);
        group.bench_with_input(BenchmarkId::new("servers", servers), &rows, |b, rows| {
            b.iter(|| black_box(build_infrastructure(rows)));
        });
    }

    group.finish();
}

fn bench_topology_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("topology/load");

    for rooms in [10, 100] {
        let store = site(rooms);
        group.bench_with_input(BenchmarkId::new("rooms", rooms), &store, |b, store| {
            b.iter(|| black_box(Topology::load(store).unwrap()));
        });
    }

    group.finish();
}

fn bench_cascade_building(c: &mut Criterion) {
    let mut group = c.benchmark_group("cascade/building");
    group.sample_size(20);

    for rooms in [10, 100] {
        group.bench_with_input(BenchmarkId::new("rooms", rooms), &rooms, |b, &rooms| {
            b.iter_batched(
                || site(rooms),
                |store| black_box(store.delete(EntityKind::Building, 1).unwrap()),
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_infrastructure_fold,
    bench_topology_load,
    bench_cascade_building
);
criterion_main!(benches);
