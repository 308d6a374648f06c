//! Race boundary detection.
//!
//! A capture usually spans menus, practice and the post-race cool-down around the
//! race itself, and no single packet says "the race starts here". Boundaries are
//! inferred from state transitions in three sequential passes:
//!
//! 1. forward, to find the race end (last tick of the first chequered-flag run);
//! 2. reverse from the race end, to find the last racing tick (race finish) and,
//!    behind the green flag, the earliest tick of the race session;
//! 3. forward from that candidate, to skip warm-up ticks whose participant slots
//!    are not yet filled in.
//!
//! Every pass falls back to the best candidate it has instead of failing, so a
//! truncated capture still yields a descriptor. Only a capture with no telemetry
//! at all is rejected.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::descriptor::SessionDescriptor;
use crate::packet::{Packet, PacketHash, TelemetryPacket};
use crate::stream::{PacketStream, StreamOrder};
use crate::types::{GameState, RaceState, SessionState};
use crate::{RaceDataError, Result};

/// Runs the three detection passes over a capture directory.
#[derive(Debug, Clone)]
pub struct SessionBoundaryDetector {
    directory: PathBuf,
    prefix: String,
}

impl SessionBoundaryDetector {
    pub fn new<P: AsRef<Path>>(directory: P, prefix: &str) -> Self {
        Self { directory: directory.as_ref().to_path_buf(), prefix: prefix.to_string() }
    }

    pub fn detect(&self) -> Result<SessionDescriptor> {
        let forward = self.open(StreamOrder::Forward)?;
        let race_end = find_race_end(forward)?
            .ok_or_else(|| RaceDataError::EmptyCapture { path: self.directory.clone() })?;
        debug!(%race_end, "Found race end");

        let reverse = self.open(StreamOrder::Reverse)?;
        let (race_finish, candidate) = find_race_start(reverse, race_end)?;
        debug!(%race_finish, %candidate, "Found race finish and start candidate");

        let forward = self.open(StreamOrder::Forward)?;
        let race_start = confirm_populated(forward, candidate, race_end)?;

        info!(
            directory = %self.directory.display(),
            %race_start,
            %race_finish,
            %race_end,
            "Detected session boundaries"
        );
        Ok(SessionDescriptor { race_end, race_finish, race_start })
    }

    /// Forward pass checking that every checkpoint of `descriptor` is still in
    /// the capture. Returns the first one missing, if any.
    pub fn missing_checkpoint(
        &self,
        descriptor: &SessionDescriptor,
    ) -> Result<Option<(&'static str, PacketHash)>> {
        missing_checkpoint(self.open(StreamOrder::Forward)?, descriptor)
    }

    fn open(&self, order: StreamOrder) -> Result<PacketStream> {
        PacketStream::open(&self.directory, &self.prefix, order)
    }
}

#[derive(Debug, Clone, Copy)]
enum EndSearch {
    AwaitingRace,
    AwaitingFinish,
    Finished(PacketHash),
}

/// Forward pass: the last tick of the first `Finished` run after racing starts
/// in a race session.
///
/// Falls back to the last `Racing` tick, then to the last telemetry tick. Returns
/// `None` only when the stream holds no telemetry.
pub fn find_race_end<I>(packets: I) -> Result<Option<PacketHash>>
where
    I: IntoIterator<Item = Result<Packet>>,
{
    let mut phase = EndSearch::AwaitingRace;
    let mut last_racing = None;
    let mut last_telemetry = None;

    for packet in packets {
        let packet = packet?;
        let Some(telemetry) = packet.as_telemetry() else {
            continue;
        };
        let hash = packet.hash();
        let race_state = telemetry.race_state();
        last_telemetry = Some(hash);
        if race_state == RaceState::Racing {
            last_racing = Some(hash);
        }

        phase = match phase {
            EndSearch::AwaitingRace
                if telemetry.session_state() == SessionState::Race
                    && race_state == RaceState::Racing =>
            {
                EndSearch::AwaitingFinish
            }
            EndSearch::AwaitingFinish | EndSearch::Finished(_)
                if race_state == RaceState::Finished =>
            {
                EndSearch::Finished(hash)
            }
            EndSearch::Finished(candidate) => return Ok(Some(candidate)),
            other => other,
        };
    }

    Ok(match phase {
        EndSearch::Finished(candidate) => Some(candidate),
        _ => last_racing.or(last_telemetry),
    })
}

#[derive(Debug, Clone, Copy)]
enum StartSearch {
    AwaitingFinish,
    AwaitingGreen,
    InSession,
}

/// Reverse pass anchored on `race_end`. Returns `(race_finish, race_start)`.
///
/// The race start is the earliest tick of the contiguous in-game race session
/// behind the green flag. If the stream runs out first, the earliest telemetry
/// tick seen is used; with no racing tick at all the finish falls back to
/// `race_end`.
pub fn find_race_start<I>(packets: I, race_end: PacketHash) -> Result<(PacketHash, PacketHash)>
where
    I: IntoIterator<Item = Result<Packet>>,
{
    let mut packets = packets.into_iter();

    let mut anchored = false;
    for packet in packets.by_ref() {
        if packet?.hash() == race_end {
            anchored = true;
            break;
        }
    }
    if !anchored {
        return Err(RaceDataError::CheckpointNotFound { checkpoint: "race end", hash: race_end });
    }

    let mut phase = StartSearch::AwaitingFinish;
    let mut race_finish = None;
    let mut earliest = race_end;

    for packet in packets {
        let packet = packet?;
        let Some(telemetry) = packet.as_telemetry() else {
            continue;
        };
        let hash = packet.hash();

        let race_state = telemetry.race_state();
        match phase {
            StartSearch::AwaitingFinish if race_state == RaceState::Racing => {
                race_finish = Some(hash);
                phase = StartSearch::AwaitingGreen;
            }
            StartSearch::AwaitingGreen
                if matches!(race_state, RaceState::NotStarted | RaceState::Invalid) =>
            {
                phase = StartSearch::InSession;
            }
            _ => {}
        }

        if matches!(phase, StartSearch::InSession) && !in_race_session(telemetry) {
            return Ok((race_finish.unwrap_or(race_end), earliest));
        }
        earliest = hash;
    }

    Ok((race_finish.unwrap_or(race_end), earliest))
}

/// Forward pass from `candidate` to the first tick whose roster slots are all
/// populated, stopping at `race_end`. Falls back to `candidate`.
pub fn confirm_populated<I>(
    packets: I,
    candidate: PacketHash,
    race_end: PacketHash,
) -> Result<PacketHash>
where
    I: IntoIterator<Item = Result<Packet>>,
{
    let mut packets = packets.into_iter();

    let mut anchored = false;
    for packet in packets.by_ref() {
        let packet = packet?;
        if packet.hash() == candidate {
            if packet.as_telemetry().is_some_and(is_usable_start) {
                return Ok(candidate);
            }
            anchored = true;
            break;
        }
    }
    if !anchored {
        return Err(RaceDataError::CheckpointNotFound { checkpoint: "race start", hash: candidate });
    }
    if candidate == race_end {
        return Ok(candidate);
    }

    for packet in packets {
        let packet = packet?;
        if packet.as_telemetry().is_some_and(is_usable_start) {
            debug!(skipped_to = %packet.hash(), "Race start candidate was not fully populated");
            return Ok(packet.hash());
        }
        if packet.hash() == race_end {
            break;
        }
    }

    Ok(candidate)
}

/// First checkpoint of `descriptor` (start, finish, end) that never appears in
/// `packets`.
pub fn missing_checkpoint<I>(
    packets: I,
    descriptor: &SessionDescriptor,
) -> Result<Option<(&'static str, PacketHash)>>
where
    I: IntoIterator<Item = Result<Packet>>,
{
    let mut checkpoints = [
        ("race start", descriptor.race_start, false),
        ("race finish", descriptor.race_finish, false),
        ("race end", descriptor.race_end, false),
    ];

    for packet in packets {
        let hash = packet?.hash();
        for (_, checkpoint, seen) in checkpoints.iter_mut() {
            *seen |= *checkpoint == hash;
        }
        if checkpoints.iter().all(|(_, _, seen)| *seen) {
            return Ok(None);
        }
    }

    Ok(checkpoints.iter().find(|(_, _, seen)| !seen).map(|(name, hash, _)| (*name, *hash)))
}

fn in_race_session(telemetry: &TelemetryPacket) -> bool {
    telemetry.session_state() == SessionState::Race
        && telemetry.game_state() == GameState::InGamePlaying
}

fn is_usable_start(telemetry: &TelemetryPacket) -> bool {
    !telemetry.is_garbage() && telemetry.num_participants > 0 && telemetry.is_fully_populated()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ParticipantSlot, TelemetryPacketBuilder, participant_packet};

    fn tick(n: u8) -> TelemetryPacketBuilder {
        TelemetryPacketBuilder::new().sequence(n).current_time(f32::from(n))
    }

    fn decode(builders: Vec<TelemetryPacketBuilder>) -> anyhow::Result<Vec<Packet>> {
        builders.iter().map(|b| Ok(Packet::decode(&b.build())?)).collect()
    }

    fn forward(packets: &[Packet]) -> impl Iterator<Item = Result<Packet>> + '_ {
        packets.iter().cloned().map(Ok)
    }

    fn reverse(packets: &[Packet]) -> impl Iterator<Item = Result<Packet>> + '_ {
        packets.iter().rev().cloned().map(Ok)
    }

    fn grid() -> [ParticipantSlot; 2] {
        [ParticipantSlot::racing(1, 1, -123.0), ParticipantSlot::racing(2, 1, -123.0)]
    }

    /// Menu, two pre-green ticks, racing, two finished ticks, menu.
    fn full_capture() -> anyhow::Result<Vec<Packet>> {
        decode(vec![
            tick(0)
                .game_state(GameState::FrontEnd)
                .session_state(SessionState::Invalid)
                .race_state(RaceState::Invalid),
            tick(1).race_state(RaceState::NotStarted).roster(&grid()),
            tick(2).race_state(RaceState::NotStarted).roster(&grid()),
            tick(3).roster(&grid()),
            tick(4).roster(&grid()),
            tick(5).race_state(RaceState::Finished).roster(&grid()),
            tick(6).race_state(RaceState::Finished).roster(&grid()),
            tick(7).game_state(GameState::FrontEnd).race_state(RaceState::Invalid),
        ])
    }

    #[test]
    fn race_end_is_last_tick_of_finished_run() -> anyhow::Result<()> {
        let packets = decode(vec![
            tick(0),
            tick(1).race_state(RaceState::Finished),
            tick(2).race_state(RaceState::NotStarted),
        ])?;
        assert_eq!(find_race_end(forward(&packets))?, Some(packets[1].hash()));

        let packets = decode(vec![
            tick(0),
            tick(1).race_state(RaceState::Finished),
            tick(2).race_state(RaceState::Finished),
            tick(3).race_state(RaceState::Finished),
            tick(4).race_state(RaceState::NotStarted),
            tick(5).race_state(RaceState::Finished),
        ])?;
        assert_eq!(find_race_end(forward(&packets))?, Some(packets[3].hash()));
        Ok(())
    }

    #[test]
    fn finished_before_race_session_is_ignored() -> anyhow::Result<()> {
        let packets = decode(vec![
            tick(0).session_state(SessionState::Qualify).race_state(RaceState::Finished),
            tick(1).session_state(SessionState::Qualify).race_state(RaceState::NotStarted),
            tick(2),
            tick(3).race_state(RaceState::Finished),
        ])?;
        assert_eq!(find_race_end(forward(&packets))?, Some(packets[3].hash()));
        Ok(())
    }

    #[test]
    fn race_end_fallbacks() -> anyhow::Result<()> {
        let truncated = decode(vec![tick(0), tick(1), tick(2).race_state(RaceState::Invalid)])?;
        assert_eq!(find_race_end(forward(&truncated))?, Some(truncated[1].hash()));

        let menus = decode(vec![
            tick(0).race_state(RaceState::NotStarted),
            tick(1).race_state(RaceState::Invalid),
        ])?;
        assert_eq!(find_race_end(forward(&menus))?, Some(menus[1].hash()));

        let roster_only = vec![Packet::decode(&participant_packet(&["Ayrton"]))?];
        assert_eq!(find_race_end(forward(&roster_only))?, None);
        Ok(())
    }

    #[test]
    fn reverse_pass_finds_finish_and_session_start() -> anyhow::Result<()> {
        let packets = full_capture()?;
        let race_end = find_race_end(forward(&packets))?.ok_or_else(|| anyhow::anyhow!("no end"))?;
        assert_eq!(race_end, packets[6].hash());

        let (race_finish, race_start) = find_race_start(reverse(&packets), race_end)?;
        assert_eq!(race_finish, packets[4].hash());
        assert_eq!(race_start, packets[1].hash());
        Ok(())
    }

    #[test]
    fn reverse_pass_without_session_boundary_uses_earliest() -> anyhow::Result<()> {
        let packets = decode(vec![
            tick(0).race_state(RaceState::NotStarted),
            tick(1),
            tick(2).race_state(RaceState::Finished),
        ])?;
        let (race_finish, race_start) = find_race_start(reverse(&packets), packets[2].hash())?;
        assert_eq!(race_finish, packets[1].hash());
        assert_eq!(race_start, packets[0].hash());
        Ok(())
    }

    #[test]
    fn reverse_pass_requires_race_end() -> anyhow::Result<()> {
        let packets = full_capture()?;
        let result = find_race_start(reverse(&packets), PacketHash(42));
        assert!(matches!(
            result,
            Err(RaceDataError::CheckpointNotFound { checkpoint: "race end", .. })
        ));
        Ok(())
    }

    #[test]
    fn confirm_skips_warm_up_ticks() -> anyhow::Result<()> {
        let warming = [ParticipantSlot::racing(1, 1, -123.0), ParticipantSlot::default()];
        let packets = decode(vec![
            tick(0).race_state(RaceState::NotStarted).roster(&warming),
            tick(1).race_state(RaceState::Invalid).roster(&grid()),
            tick(2).race_state(RaceState::NotStarted).roster(&grid()),
            tick(3).race_state(RaceState::Finished).roster(&grid()),
        ])?;

        let start = confirm_populated(forward(&packets), packets[0].hash(), packets[3].hash())?;
        assert_eq!(start, packets[2].hash());

        let start = confirm_populated(forward(&packets), packets[2].hash(), packets[3].hash())?;
        assert_eq!(start, packets[2].hash());
        Ok(())
    }

    #[test]
    fn confirm_stops_at_race_end() -> anyhow::Result<()> {
        let empty = [ParticipantSlot::default()];
        let packets = decode(vec![
            tick(0).roster(&empty),
            tick(1).race_state(RaceState::Finished).roster(&empty),
            tick(2).roster(&grid()),
        ])?;

        let start = confirm_populated(forward(&packets), packets[0].hash(), packets[1].hash())?;
        assert_eq!(start, packets[0].hash());
        Ok(())
    }

    #[test]
    fn reports_first_missing_checkpoint() -> anyhow::Result<()> {
        let packets = full_capture()?;
        let descriptor = SessionDescriptor {
            race_end: packets[6].hash(),
            race_finish: packets[4].hash(),
            race_start: packets[1].hash(),
        };
        assert_eq!(missing_checkpoint(forward(&packets), &descriptor)?, None);

        let stale_end = SessionDescriptor { race_end: PacketHash(7), ..descriptor };
        assert_eq!(
            missing_checkpoint(forward(&packets), &stale_end)?,
            Some(("race end", PacketHash(7)))
        );

        let stale_finish = SessionDescriptor { race_finish: PacketHash(9), ..stale_end };
        assert_eq!(
            missing_checkpoint(forward(&packets), &stale_finish)?,
            Some(("race finish", PacketHash(9)))
        );
        Ok(())
    }
}
