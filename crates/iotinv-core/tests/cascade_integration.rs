//! Integration tests for cascade deletes and id allocation.

use iotinv_core::{
    Application, Building, EntityKind, Gateway, NetworkType, Room, Sensor, SensorType, Server,
    Store, StoreConfig,
};

/// Two buildings with rooms, gateways and sensors, sharing one server,
/// sensor type and network.
struct Site {
    store: Store,
    b1: i64,
    b2: i64,
    r1: i64,
    r2: i64,
    r3: i64,
    g1: i64,
    g2: i64,
    g3: i64,
    server: i64,
    sensor_type: i64,
    network: i64,
}

impl Site {
    fn new() -> Self {
        Self::with_store(Store::open_in_memory().unwrap())
    }

    fn with_store(store: Store) -> Self {
        let b1 = store.insert(Building::new("B1")).unwrap().id;
        let b2 = store.insert(Building::new("B2")).unwrap().id;
        let r1 = store.insert(Room::new(b1, "R1")).unwrap().id;
        let r2 = store.insert(Room::new(b1, "R2")).unwrap().id;
        let r3 = store.insert(Room::new(b2, "R3")).unwrap().id;
        let server = store.insert(Server::new("10.0.0.1")).unwrap().id;
        let g1 = store.insert(Gateway::new(r1, server, "G1")).unwrap().id;
        let g2 = store.insert(Gateway::new(r2, server, "G2")).unwrap().id;
        let g3 = store.insert(Gateway::new(r3, server, "G3")).unwrap().id;
        let sensor_type = store.insert(SensorType::new("Temperature", "C")).unwrap().id;
        let network = store.insert(NetworkType::new("LoRaWAN", 50)).unwrap().id;

        Self {
            store,
            b1,
            b2,
            r1,
            r2,
            r3,
            g1,
            g2,
            g3,
            server,
            sensor_type,
            network,
        }
    }

    fn sensor(&self, room: i64, gateway: i64, name: &str) -> i64 {
        self.store
            .insert(Sensor::new(room, gateway, self.sensor_type, self.network, name))
            .unwrap()
            .id
    }

    fn exists(&self, kind: EntityKind, id: i64) -> bool {
        self.store.exists(kind, id).unwrap()
    }

    fn assert_consistent(&self) {
        let dangling = self.store.dangling_references().unwrap();
        assert!(dangling.is_empty(), "dangling references: {:?}", dangling);
    }
}

#[test]
fn test_delete_building_removes_its_subtree_only() {
    let site = Site::new();
    let s1 = site.sensor(site.r1, site.g1, "S1");
    let s2 = site.sensor(site.r2, site.g2, "S2");
    // In B2's room but behind B1's gateway.
    let s3 = site.sensor(site.r3, site.g1, "S3");
    // In B1's room but behind B2's gateway.
    let s4 = site.sensor(site.r1, site.g3, "S4");
    let s5 = site.sensor(site.r3, site.g3, "S5");

    let result = site.store.delete(EntityKind::Building, site.b1).unwrap();

    assert!(result.found);
    assert!(result.has_dependents());
    for (kind, id) in [
        (EntityKind::Building, site.b1),
        (EntityKind::Room, site.r1),
        (EntityKind::Room, site.r2),
        (EntityKind::Gateway, site.g1),
        (EntityKind::Gateway, site.g2),
        (EntityKind::Sensor, s1),
        (EntityKind::Sensor, s2),
        (EntityKind::Sensor, s3),
        (EntityKind::Sensor, s4),
    ] {
        assert!(!site.exists(kind, id), "{} #{} survived", kind, id);
        assert!(result.contains(kind, id), "{} #{} not reported", kind, id);
    }

    assert!(site.exists(EntityKind::Building, site.b2));
    assert!(site.exists(EntityKind::Room, site.r3));
    assert!(site.exists(EntityKind::Gateway, site.g3));
    assert!(site.exists(EntityKind::Sensor, s5));
    assert!(site.exists(EntityKind::Server, site.server));
    assert!(site.exists(EntityKind::SensorType, site.sensor_type));
    assert!(site.exists(EntityKind::NetworkType, site.network));

    assert_eq!(result.affected_count(), 9);
    assert_eq!(
        result.deleted_entities.last(),
        Some(&(EntityKind::Building, site.b1))
    );
    site.assert_consistent();
}

#[test]
fn test_delete_gateway_removes_exactly_its_sensors() {
    let site = Site::new();
    let mine: Vec<i64> = (0..3)
        .map(|i| site.sensor(site.r1, site.g1, &format!("S{}", i)))
        .collect();
    let other = site.sensor(site.r1, site.g2, "Other");

    let result = site.store.delete(EntityKind::Gateway, site.g1).unwrap();

    assert_eq!(result.count_of(EntityKind::Sensor), mine.len());
    assert_eq!(result.affected_count(), mine.len() + 1);
    for id in mine {
        assert!(!site.exists(EntityKind::Sensor, id));
    }
    assert!(site.exists(EntityKind::Sensor, other));
    assert!(site.exists(EntityKind::Room, site.r1));
    site.assert_consistent();
}

#[test]
fn test_delete_room_scenario() {
    let store = Store::open_in_memory().unwrap();
    let b1 = store.insert(Building::new("B1")).unwrap();
    let r1 = store.insert(Room::new(b1.id, "R1")).unwrap();
    let sv = store.insert(Server::new("10.0.0.1")).unwrap();
    let g1 = store.insert(Gateway::new(r1.id, sv.id, "G1")).unwrap();
    let t = store.insert(SensorType::new("Temperature", "C")).unwrap();
    let n = store.insert(NetworkType::new("WiFi", 100)).unwrap();
    let s1 = store
        .insert(Sensor::new(r1.id, g1.id, t.id, n.id, "S1"))
        .unwrap();
    assert_eq!((b1.id, r1.id, g1.id, s1.id), (1, 1, 1, 1));

    let result = store.delete(EntityKind::Room, 1).unwrap();

    assert_eq!(
        result.deleted_entities,
        vec![
            (EntityKind::Sensor, 1),
            (EntityKind::Gateway, 1),
            (EntityKind::Room, 1)
        ]
    );
    assert!(store.exists(EntityKind::Building, 1).unwrap());
    assert!(store.exists(EntityKind::Server, 1).unwrap());
    assert!(store.exists(EntityKind::SensorType, 1).unwrap());
    assert!(store.exists(EntityKind::NetworkType, 1).unwrap());
    assert!(store.dangling_references().unwrap().is_empty());
}

#[test]
fn test_delete_room_removes_sensors_behind_foreign_gateways() {
    let site = Site::new();
    let stray = site.sensor(site.r1, site.g3, "Stray");

    let result = site.store.delete(EntityKind::Room, site.r1).unwrap();

    assert!(result.contains(EntityKind::Sensor, stray));
    assert!(site.exists(EntityKind::Gateway, site.g3));
    site.assert_consistent();
}

#[test]
fn test_delete_server_removes_gateways_and_links() {
    let site = Site::new();
    let app = site.store.insert(Application::new("Dashboard")).unwrap();
    site.store.link(app.id, site.server).unwrap();
    let s1 = site.sensor(site.r1, site.g1, "S1");

    let result = site.store.delete(EntityKind::Server, site.server).unwrap();

    assert_eq!(result.count_of(EntityKind::Gateway), 3);
    assert_eq!(result.deleted_connections, 1);
    assert!(!site.exists(EntityKind::Sensor, s1));
    assert!(site.exists(EntityKind::Application, app.id));
    assert!(site.exists(EntityKind::Room, site.r1));
    site.assert_consistent();
}

#[test]
fn test_delete_sensor_type_and_network() {
    let site = Site::new();
    site.sensor(site.r1, site.g1, "S1");
    site.sensor(site.r2, site.g2, "S2");

    let result = site
        .store
        .delete(EntityKind::SensorType, site.sensor_type)
        .unwrap();
    assert_eq!(result.count_of(EntityKind::Sensor), 2);
    assert_eq!(site.store.count(EntityKind::Sensor).unwrap(), 0);

    let result = site
        .store
        .delete(EntityKind::NetworkType, site.network)
        .unwrap();
    assert!(!result.has_dependents());
    assert_eq!(site.store.count(EntityKind::Gateway).unwrap(), 3);
    site.assert_consistent();
}

#[test]
fn test_delete_application_keeps_servers() {
    let site = Site::new();
    let app = site.store.insert(Application::new("Dashboard")).unwrap();
    site.store.link(app.id, site.server).unwrap();

    let result = site.store.delete(EntityKind::Application, app.id).unwrap();

    assert_eq!(result.deleted_connections, 1);
    assert_eq!(result.dependent_count(), 1);
    assert!(site.exists(EntityKind::Server, site.server));
    assert!(site.store.connections().unwrap().is_empty());
}

#[test]
fn test_delete_missing_id_writes_nothing() {
    let site = Site::new();
    let before = site.store.count(EntityKind::Room).unwrap();

    let result = site.store.delete(EntityKind::Room, 404).unwrap();

    assert!(!result.found);
    assert_eq!(result.affected_count(), 0);
    assert_eq!(site.store.count(EntityKind::Room).unwrap(), before);
}

#[test]
fn test_next_id_after_deleting_highest() {
    let store = Store::open_in_memory().unwrap();
    for name in ["A", "B", "C"] {
        store.insert(Application::new(name)).unwrap();
    }
    assert_eq!(store.next_id(EntityKind::Application).unwrap(), 4);

    store.delete(EntityKind::Application, 3).unwrap();
    assert_eq!(store.next_id(EntityKind::Application).unwrap(), 3);
    let again = store.insert(Application::new("C2")).unwrap();
    assert_eq!(again.id, 3);

    store.delete(EntityKind::Application, 1).unwrap();
    assert_eq!(store.next_id(EntityKind::Application).unwrap(), 4);

    store.delete(EntityKind::Application, 2).unwrap();
    store.delete(EntityKind::Application, 3).unwrap();
    assert_eq!(store.next_id(EntityKind::Application).unwrap(), 1);
}

#[test]
fn test_next_id_for_every_kind_starts_at_one() {
    let store = Store::open_in_memory().unwrap();
    for kind in EntityKind::KEYED {
        assert_eq!(store.next_id(kind).unwrap(), 1, "{}", kind);
    }
}

#[test]
fn test_cascade_persists_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inventory.db");

    {
        let site = Site::with_store(Store::open(StoreConfig::new(&path)).unwrap());
        site.sensor(site.r1, site.g1, "S1");
        site.store.delete(EntityKind::Building, site.b1).unwrap();
    }

    let store = Store::open(StoreConfig::new(&path).without_schema()).unwrap();
    assert_eq!(store.count(EntityKind::Building).unwrap(), 1);
    assert_eq!(store.count(EntityKind::Room).unwrap(), 1);
    assert_eq!(store.count(EntityKind::Gateway).unwrap(), 1);
    assert_eq!(store.count(EntityKind::Sensor).unwrap(), 0);
    assert!(store.dangling_references().unwrap().is_empty());
}
