//! TypeScript Generation Tests
//!
//! Validates that racedata types can be exported to TypeScript when the tauri
//! feature is enabled.

#[cfg(feature = "tauri")]
#[test]
fn test_core_types_implement_specta_type() {
    use specta::Type;

    // If this compiles, all types are properly configured for TypeScript export.
    fn assert_type<T: Type>() {}

    // Packet types
    assert_type::<racedata::PacketHash>();
    assert_type::<racedata::PacketHeader>();
    assert_type::<racedata::TelemetryPacket>();
    assert_type::<racedata::packet::ParticipantPacket>();

    // Session types
    assert_type::<racedata::SessionDescriptor>();
    assert_type::<racedata::Driver>();
    assert_type::<racedata::SectorTime>();
    assert_type::<racedata::StartingGridEntry>();
    assert_type::<racedata::TrackGeometry>();
    assert_type::<racedata::LogicalSector>();
    assert_type::<racedata::RaceState>();
}

#[cfg(not(feature = "tauri"))]
#[test]
fn test_tauri_feature_disabled() {
    // Types still compile without specta::Type
    let _ = racedata::LogicalSector::S1;
}
