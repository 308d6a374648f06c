//! Name-keyed driver registry with slot reassignment.
//!
//! The simulator reuses roster slots as drivers join and leave, so a slot index
//! only identifies a driver until the roster size next changes. The registry owns
//! every [`Driver`] by name and keeps a separate slot-to-name index that is rebuilt
//! on each reconciliation. Drivers that leave the roster move to a dropped set with
//! their history intact and move back if the same name reappears.

use std::collections::BTreeMap;
use tracing::{debug, info};

use super::driver::Driver;
use crate::packet::Packet;
use crate::{RaceDataError, Result};

/// Names affected by one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterChange {
    pub added: Vec<String>,
    pub dropped: Vec<String>,
    pub restored: Vec<String>,
}

impl RosterChange {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.dropped.is_empty() && self.restored.is_empty()
    }
}

/// Drivers keyed by name, with the roster slot each one currently occupies.
#[derive(Debug, Clone, Default)]
pub struct DriverRegistry {
    drivers: BTreeMap<String, Driver>,
    dropped: BTreeMap<String, Driver>,
    slots: BTreeMap<usize, String>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect names for a roster of `size` slots and reconcile against the
    /// current drivers.
    ///
    /// Telemetry records met during the scan must agree with `size`; garbage
    /// ticks and the `-1` count are ignored. Running out of records before `size`
    /// names are known is a [`RaceDataError::RosterUnderflow`].
    pub fn populate<I>(&mut self, packets: I, size: usize) -> Result<RosterChange>
    where
        I: IntoIterator<Item = Result<Packet>>,
    {
        let mut names: BTreeMap<usize, String> = BTreeMap::new();
        if size == 0 {
            return Ok(self.reconcile(names));
        }

        for packet in packets {
            match packet? {
                Packet::Participant(participant) => {
                    collect(&mut names, participant.slotted_names(), size);
                }
                Packet::AdditionalParticipant(additional) => {
                    collect(&mut names, additional.slotted_names(), size);
                }
                Packet::Telemetry(telemetry) => {
                    let reported = telemetry.num_participants;
                    if reported == -1 || telemetry.is_garbage() {
                        continue;
                    }
                    if usize::try_from(reported).ok() != Some(size) {
                        return Err(RaceDataError::RosterUnderflow {
                            expected: size,
                            collected: names.len(),
                            reported: Some(reported),
                        });
                    }
                }
            }

            if names.len() == size {
                return Ok(self.reconcile(names));
            }
        }

        Err(RaceDataError::RosterUnderflow {
            expected: size,
            collected: names.len(),
            reported: None,
        })
    }

    /// Replace the slot assignment with `names`, keeping history for every
    /// driver whose name survives.
    pub fn reconcile(&mut self, names: BTreeMap<usize, String>) -> RosterChange {
        let mut change = RosterChange::default();

        let departed: Vec<String> = self
            .drivers
            .keys()
            .filter(|name| !names.values().any(|incoming| incoming == *name))
            .cloned()
            .collect();
        for name in departed {
            if let Some(driver) = self.drivers.remove(&name) {
                info!(driver = %name, laps = driver.laps_complete(), "Driver left the roster");
                self.dropped.insert(name.clone(), driver);
                change.dropped.push(name);
            }
        }

        self.slots.clear();
        for (slot, name) in names {
            if let Some(driver) = self.drivers.get_mut(&name) {
                if driver.slot() != slot {
                    debug!(driver = %name, from = driver.slot(), to = slot, "Driver changed slot");
                }
                driver.set_slot(slot);
            } else if let Some(mut driver) = self.dropped.remove(&name) {
                info!(driver = %name, slot, "Driver rejoined the roster");
                driver.set_slot(slot);
                self.drivers.insert(name.clone(), driver);
                change.restored.push(name.clone());
            } else {
                debug!(driver = %name, slot, "Driver joined the roster");
                self.drivers.insert(name.clone(), Driver::new(name.clone(), slot));
                change.added.push(name.clone());
            }
            self.slots.insert(slot, name);
        }

        change
    }

    pub fn driver(&self, name: &str) -> Option<&Driver> {
        self.drivers.get(name)
    }

    pub fn driver_in_slot(&self, slot: usize) -> Option<&Driver> {
        self.slots.get(&slot).and_then(|name| self.drivers.get(name))
    }

    pub fn driver_in_slot_mut(&mut self, slot: usize) -> Option<&mut Driver> {
        let name = self.slots.get(&slot)?;
        self.drivers.get_mut(name)
    }

    /// Drivers currently on the roster, ordered by name.
    pub fn drivers(&self) -> impl Iterator<Item = &Driver> {
        self.drivers.values()
    }

    pub fn dropped_drivers(&self) -> impl Iterator<Item = &Driver> {
        self.dropped.values()
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

fn collect<'a>(
    names: &mut BTreeMap<usize, String>,
    slotted: impl Iterator<Item = (usize, &'a str)>,
    size: usize,
) {
    for (slot, name) in slotted.filter(|(slot, _)| *slot < size) {
        names.insert(slot, name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::timeline::SectorTime;
    use crate::test_utils::{
        TelemetryPacketBuilder, additional_participant_packet, participant_packet,
    };
    use crate::types::{GameState, LogicalSector, RaceState};

    fn decoded(buffers: Vec<Vec<u8>>) -> Vec<Result<Packet>> {
        buffers.iter().map(|b| Packet::decode(b)).collect()
    }

    fn names(pairs: &[(usize, &str)]) -> BTreeMap<usize, String> {
        pairs.iter().map(|(slot, name)| (*slot, name.to_string())).collect()
    }

    #[test]
    fn populate_from_participant_packet() -> anyhow::Result<()> {
        let mut registry = DriverRegistry::new();
        let packets = decoded(vec![
            TelemetryPacketBuilder::new().num_participants(3).build(),
            participant_packet(&["Ayrton", "Bruce", "Alain", "Nigel"]),
        ]);

        let change = registry.populate(packets, 3)?;
        assert_eq!(change.added, vec!["Ayrton", "Bruce", "Alain"]);
        anyhow::ensure!(registry.len() == 3, "slot 3 is outside the roster");
        Ok(())
    }

    #[test]
    fn populate_needs_every_slot() -> anyhow::Result<()> {
        let mut registry = DriverRegistry::new();
        let packets = decoded(vec![
            participant_packet(&["Ayrton", "", "Alain"]),
            additional_participant_packet(16, &["Nigel"]),
        ]);

        let result = registry.populate(packets, 3);
        assert!(matches!(
            result,
            Err(RaceDataError::RosterUnderflow { expected: 3, collected: 2, reported: None })
        ));
        Ok(())
    }

    #[test]
    fn additional_packet_fills_high_slots() -> anyhow::Result<()> {
        let mut registry = DriverRegistry::new();
        let first: Vec<String> = (0..16).map(|i| format!("Driver {i}")).collect();
        let packets = decoded(vec![
            participant_packet(&first),
            additional_participant_packet(16, &["Driver 16", "Driver 17"]),
        ]);

        registry.populate(packets, 18)?;
        let name = registry.driver_in_slot(17).map(Driver::name);
        assert_eq!(name, Some("Driver 17"));
        Ok(())
    }

    #[test]
    fn disagreeing_roster_size_is_fatal() -> anyhow::Result<()> {
        let mut registry = DriverRegistry::new();
        let packets = decoded(vec![
            TelemetryPacketBuilder::new().num_participants(-1).build(),
            TelemetryPacketBuilder::new()
                .game_state(GameState::InGamePlaying)
                .race_state(RaceState::Invalid)
                .num_participants(7)
                .build(),
            TelemetryPacketBuilder::new().num_participants(1).build(),
            participant_packet(&["Ayrton", "Alain"]),
        ]);

        let result = registry.populate(packets, 2);
        assert!(matches!(
            result,
            Err(RaceDataError::RosterUnderflow { expected: 2, reported: Some(1), .. })
        ));
        Ok(())
    }

    #[test]
    fn reconcile_keeps_history_and_restores_dropped() {
        let mut registry = DriverRegistry::new();
        registry.reconcile(names(&[(0, "Ayrton"), (1, "Alain")]));
        if let Some(driver) = registry.driver_in_slot_mut(0) {
            driver.add_sector_time(SectorTime::new(30.0, LogicalSector::S1, false));
        }

        let change = registry.reconcile(names(&[(0, "Alain"), (1, "Nigel")]));
        assert_eq!(change.dropped, vec!["Ayrton".to_string()]);
        assert_eq!(change.added, vec!["Nigel".to_string()]);
        assert_eq!(registry.driver("Alain").map(Driver::slot), Some(0));
        assert_eq!(registry.dropped_drivers().count(), 1);

        let change = registry.reconcile(names(&[(0, "Alain"), (1, "Nigel"), (2, "Ayrton")]));
        assert_eq!(change.restored, vec!["Ayrton".to_string()]);
        assert_eq!(registry.dropped_drivers().count(), 0);
        let history = registry.driver_in_slot(2).map(Driver::sector_times);
        assert_eq!(history, Some(vec![30.0]));
    }

    #[test]
    fn empty_roster_needs_no_packets() -> anyhow::Result<()> {
        let mut registry = DriverRegistry::new();
        let change = registry.populate(Vec::<Result<Packet>>::new(), 0)?;
        assert!(change.is_empty());
        assert!(registry.is_empty());
        Ok(())
    }
}
