// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Types that map directly to the YAML trace schema and file contents.
//!
//! The schema is the stand-in for an external trace decoder: it describes
//! slots, matched point-to-point communications and collective operations
//! declaratively, and [`TraceFile::to_trace`] turns a parsed file into the
//! immutable [`Trace`] consumed by the graph builder. Region classification
//! happens here, exactly once.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::rc::Rc;

use serde::{Deserialize, de};
use serde_yaml::Value;

use crate::collective::{CollectiveCommunicationEvent, CollectiveOp, Member};
use crate::communication::{Communication, CommunicationEvent, CommunicationKind};
use crate::region::{Direction, Region, RegionKind, RegionRole, WaitScope};
use crate::slot::Slot;
use crate::trace::Trace;
use crate::trace_error;
use crate::types::{LocationRef, TraceError, TraceResult, TraceTime};

/// Parse a time field that is either a raw nanosecond integer or a string
/// with a unit suffix, for example `"500us"` or `"12ms"`.
pub fn parse_time_str<'de, D>(deserializer: D) -> Result<TraceTime, D::Error>
where
    D: de::Deserializer<'de>,
{
    // We need to first deserialize to a generic `Value` so that we can
    // support the case where it is already a u64.
    let value: Value = Deserialize::deserialize(deserializer)?;

    if let Some(number) = value.as_u64() {
        // It already is a u64, so treat it as nanoseconds
        return Ok(TraceTime::from_nanos(number));
    }

    let s = match value.as_str() {
        Some(s) => s.to_owned(),
        None => {
            return Err(de::Error::custom(format!(
                "'{value:?}': Unsupported type for Deserialize (should be u64 or String)"
            )));
        }
    };

    let lowercase = s.to_lowercase().replace('_', "");
    let (digits, multiplier) = if let Some(stripped) = lowercase.strip_suffix("ns") {
        (stripped, 1)
    } else if let Some(stripped) = lowercase.strip_suffix("us") {
        (stripped, 1_000)
    } else if let Some(stripped) = lowercase.strip_suffix("ms") {
        (stripped, 1_000_000)
    } else if let Some(stripped) = lowercase.strip_suffix('s') {
        (stripped, 1_000_000_000)
    } else {
        (lowercase.as_str(), 1)
    };

    let number: u64 = digits
        .trim()
        .parse()
        .map_err(|e| de::Error::custom(format!("Unable to parse {s} as a time: {e}")))?;
    Ok(TraceTime::from_nanos(number * multiplier))
}

/// Classify a region name into its role and refined kind.
///
/// This is the decoder-side replacement for re-deriving behaviour from
/// region-name substrings during graph building: the ad-hoc name matching
/// lives here and nowhere else. An explicitly recorded role takes precedence
/// over name inference.
#[must_use]
pub fn classify_region(name: &str, recorded_role: Option<RegionRole>) -> Region {
    let lower = name.to_lowercase();
    let call = lower.strip_prefix("mpi_").unwrap_or(&lower);

    let contains_any =
        |needles: &[&str]| needles.iter().any(|needle| call.contains(needle));

    let kind = if contains_any(&["init", "finalize", "comm", "group", "win"]) {
        RegionKind::Administrative
    } else if contains_any(&["wait", "test", "probe"]) {
        let scope = if contains_any(&["all", "some"]) {
            WaitScope::All
        } else {
            WaitScope::Single
        };
        RegionKind::Wait { scope }
    } else if contains_any(&["send", "recv"]) {
        let direction = if call.contains("send") {
            Direction::Send
        } else {
            Direction::Receive
        };
        // Non-blocking initiations are the immediate-mode calls
        // (Isend/Irecv and friends).
        let blocking = !call.starts_with('i');
        RegionKind::PointToPoint {
            direction,
            blocking,
        }
    } else if let Some(bucket) = recorded_role.and_then(RegionRole::bucket) {
        RegionKind::Collective(bucket)
    } else if call.contains("barrier") {
        RegionKind::Collective(crate::collective::CollectiveBucket::Barrier)
    } else if contains_any(&["alltoall", "allgather", "allreduce", "reducescatter", "scan"])
        || contains_any(&["reduce_scatter", "exscan"])
    {
        RegionKind::Collective(crate::collective::CollectiveBucket::All2All)
    } else if contains_any(&["bcast", "broadcast", "scatter"]) {
        RegionKind::Collective(crate::collective::CollectiveBucket::One2All)
    } else if contains_any(&["gather", "reduce"]) {
        RegionKind::Collective(crate::collective::CollectiveBucket::All2One)
    } else {
        RegionKind::Function
    };

    let role = recorded_role.unwrap_or(match kind {
        RegionKind::PointToPoint { .. } => RegionRole::Point2Point,
        RegionKind::Collective(bucket) => match bucket {
            crate::collective::CollectiveBucket::Barrier => RegionRole::Barrier,
            crate::collective::CollectiveBucket::One2All => RegionRole::CollOne2All,
            crate::collective::CollectiveBucket::All2One => RegionRole::CollAll2One,
            crate::collective::CollectiveBucket::All2All => RegionRole::CollAll2All,
            crate::collective::CollectiveBucket::Other
            | crate::collective::CollectiveBucket::Administrative => RegionRole::CollOther,
        },
        RegionKind::Function | RegionKind::Administrative | RegionKind::Wait { .. } => {
            RegionRole::Function
        }
    });

    Region::new(name, role, kind)
}

#[derive(Debug, Deserialize)]
pub struct SlotSection {
    pub location: u64,
    pub region: String,
    pub role: Option<RegionRole>,
    #[serde(deserialize_with = "parse_time_str")]
    pub start: TraceTime,
    #[serde(deserialize_with = "parse_time_str")]
    pub end: TraceTime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKindSection {
    Blocking,
    NonBlocking,
    Synchronizing,
    RequestCancelled,
}

impl EventKindSection {
    #[must_use]
    pub fn kind(&self) -> CommunicationKind {
        match self {
            EventKindSection::Blocking => CommunicationKind::BLOCKING_POINT_TO_POINT,
            EventKindSection::NonBlocking => CommunicationKind::NON_BLOCKING_POINT_TO_POINT,
            EventKindSection::Synchronizing => CommunicationKind::SYNCHRONIZING,
            EventKindSection::RequestCancelled => {
                CommunicationKind::NON_BLOCKING_POINT_TO_POINT
                    | CommunicationKind::REQUEST_CANCELLED
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EventSection {
    pub location: u64,
    #[serde(deserialize_with = "parse_time_str")]
    pub start: TraceTime,
    #[serde(deserialize_with = "parse_time_str")]
    pub end: TraceTime,
    pub kind: EventKindSection,
}

#[derive(Debug, Deserialize)]
pub struct CommunicationSection {
    pub start: EventSection,
    pub end: EventSection,
}

#[derive(Debug, Deserialize)]
pub struct MemberSection {
    pub location: u64,
    #[serde(deserialize_with = "parse_time_str")]
    pub start: TraceTime,
    #[serde(deserialize_with = "parse_time_str")]
    pub end: TraceTime,
}

#[derive(Debug, Deserialize)]
pub struct CollectiveSection {
    pub operation: CollectiveOp,
    pub root: Option<u64>,
    pub members: Vec<MemberSection>,
}

/// A complete declarative trace file.
#[derive(Debug, Deserialize)]
pub struct TraceFile {
    pub slots: Vec<SlotSection>,
    #[serde(default)]
    pub communications: Vec<CommunicationSection>,
    #[serde(default)]
    pub collectives: Vec<CollectiveSection>,
}

impl TraceFile {
    pub fn from_file(trace_path: &Path) -> TraceResult<Self> {
        let s = std::fs::read_to_string(trace_path)
            .map_err(|e| TraceError(format!("Unable to read {}: {e}", trace_path.display())))?;
        Self::from_string(&s)
    }

    pub fn from_string(trace_str: &str) -> TraceResult<Self> {
        serde_yaml::from_str(trace_str)
            .map_err(|e| TraceError(format!("serde_yaml::from_str failed: {e}")))
    }

    /// Check every recorded interval and cross-reference, collecting all
    /// violations into one error.
    pub fn validate(&self) -> TraceResult<()> {
        let mut errors = Vec::new();

        for (i, slot) in self.slots.iter().enumerate() {
            if slot.start > slot.end {
                errors.push(format!(
                    "Slot {i} ({}): start {} after end {}",
                    slot.region, slot.start, slot.end
                ));
            }
        }

        for (i, comm) in self.communications.iter().enumerate() {
            for event in [&comm.start, &comm.end] {
                if event.start > event.end {
                    errors.push(format!(
                        "Communication {i}: event at location {} has start {} after end {}",
                        event.location, event.start, event.end
                    ));
                }
            }
        }

        for (i, collective) in self.collectives.iter().enumerate() {
            if collective.members.is_empty() {
                errors.push(format!("Collective {i}: no members"));
            }

            for member in &collective.members {
                if member.start > member.end {
                    errors.push(format!(
                        "Collective {i}: member at location {} has start {} after end {}",
                        member.location, member.start, member.end
                    ));
                }
            }

            if let Some(root) = collective.root
                && !collective.members.iter().any(|m| m.location == root)
            {
                errors.push(format!("Collective {i}: root {root} is not a member"));
            }
        }

        if !errors.is_empty() {
            return trace_error!("Failed to validate trace:\n{}", errors.join("\n"));
        }
        Ok(())
    }

    /// Validate the file and build the immutable [`Trace`] from it.
    ///
    /// Regions with the same name share one classification; the first
    /// recorded role wins.
    pub fn to_trace(&self) -> TraceResult<Trace> {
        self.validate()?;

        let mut regions: HashMap<String, Rc<Region>> = HashMap::new();
        let mut slots: BTreeMap<LocationRef, Vec<Rc<Slot>>> = BTreeMap::new();

        for section in &self.slots {
            let region = regions
                .entry(section.region.clone())
                .or_insert_with(|| Rc::new(classify_region(&section.region, section.role)));
            let location = LocationRef(section.location);
            slots.entry(location).or_default().push(Rc::new(Slot::new(
                section.start,
                section.end,
                location,
                region,
            )));
        }

        let communications = self
            .communications
            .iter()
            .map(|section| {
                Rc::new(Communication::new(
                    CommunicationEvent::new(
                        LocationRef(section.start.location),
                        section.start.start,
                        section.start.end,
                        section.start.kind.kind(),
                    ),
                    CommunicationEvent::new(
                        LocationRef(section.end.location),
                        section.end.start,
                        section.end.end,
                        section.end.kind.kind(),
                    ),
                ))
            })
            .collect();

        let collectives = self
            .collectives
            .iter()
            .map(|section| {
                let members: Vec<Member> = section
                    .members
                    .iter()
                    .map(|m| Member::new(LocationRef(m.location), m.start, m.end))
                    .collect();
                let root = LocationRef(section.root.unwrap_or_else(|| {
                    section
                        .members
                        .iter()
                        .map(|m| m.location)
                        .min()
                        .unwrap_or(0)
                }));
                Rc::new(CollectiveCommunicationEvent::new(
                    section.operation,
                    root,
                    members,
                ))
            })
            .collect();

        Ok(Trace::new(slots, communications, collectives))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::collective::CollectiveBucket;

    #[test]
    fn classify_point_to_point() {
        let send = classify_region("MPI_Send", None);
        assert_eq!(send.role, RegionRole::Point2Point);
        assert_eq!(
            send.kind,
            RegionKind::PointToPoint {
                direction: Direction::Send,
                blocking: true
            }
        );

        let irecv = classify_region("MPI_Irecv", None);
        assert_eq!(
            irecv.kind,
            RegionKind::PointToPoint {
                direction: Direction::Receive,
                blocking: false
            }
        );
        assert!(irecv.kind.is_non_blocking_point_to_point());
    }

    #[test]
    fn classify_waits() {
        assert_eq!(
            classify_region("MPI_Wait", None).kind,
            RegionKind::Wait {
                scope: WaitScope::Single
            }
        );
        assert_eq!(
            classify_region("MPI_Waitall", None).kind,
            RegionKind::Wait {
                scope: WaitScope::All
            }
        );
    }

    #[test]
    fn classify_administrative_and_collectives() {
        assert_eq!(
            classify_region("MPI_Init", None).kind,
            RegionKind::Administrative
        );
        assert_eq!(
            classify_region("MPI_Comm_size", None).kind,
            RegionKind::Administrative
        );
        assert_eq!(
            classify_region("MPI_Barrier", None).kind,
            RegionKind::Collective(CollectiveBucket::Barrier)
        );
        assert_eq!(
            classify_region("MPI_Allreduce", None).kind,
            RegionKind::Collective(CollectiveBucket::All2All)
        );
        assert_eq!(
            classify_region("MPI_Bcast", None).kind,
            RegionKind::Collective(CollectiveBucket::One2All)
        );
        assert_eq!(
            classify_region("compute_halo", None).kind,
            RegionKind::Function
        );
    }

    #[test]
    fn recorded_role_takes_precedence() {
        let region = classify_region("exchange", Some(RegionRole::CollAll2All));
        assert_eq!(region.role, RegionRole::CollAll2All);
        assert_eq!(
            region.kind,
            RegionKind::Collective(CollectiveBucket::All2All)
        );
    }

    static SIMPLE_TRACE: &str = "
slots:
  - { location: 0, region: MPI_Send, start: 10us, end: 12us }
  - { location: 1, region: MPI_Recv, start: 11us, end: 13us }
communications:
  - start: { location: 0, start: 10us, end: 12us, kind: blocking }
    end:   { location: 1, start: 11us, end: 13us, kind: blocking }
";

    #[test]
    fn parse_simple_trace() {
        let file = TraceFile::from_string(SIMPLE_TRACE).unwrap();
        let trace = file.to_trace().unwrap();
        assert_eq!(trace.num_slots(), 2);
        assert_eq!(trace.communications().len(), 1);
        assert_eq!(trace.duration(), TraceTime::from_micros(13));

        let comm = &trace.communications()[0];
        assert_eq!(comm.start_event().location, LocationRef(0));
        assert_eq!(comm.end_event().location, LocationRef(1));
        assert!(
            comm.start_event()
                .kind
                .intersects(CommunicationKind::BLOCKING_POINT_TO_POINT)
        );
    }

    #[test]
    fn parse_time_units() {
        let file = TraceFile::from_string(
            "
slots:
  - { location: 0, region: f, start: 1500, end: 2ms }
",
        )
        .unwrap();
        assert_eq!(file.slots[0].start, TraceTime::from_nanos(1500));
        assert_eq!(file.slots[0].end, TraceTime::from_millis(2));
    }

    #[test]
    fn validate_collects_all_errors() {
        let file = TraceFile::from_string(
            "
slots:
  - { location: 0, region: f, start: 5us, end: 2us }
collectives:
  - operation: barrier
    root: 7
    members:
      - { location: 0, start: 1us, end: 2us }
",
        )
        .unwrap();
        let err = file.validate().unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("start 5us after end 2us"));
        assert!(msg.contains("root 7 is not a member"));
    }

    #[test]
    fn from_file_reads_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SIMPLE_TRACE.as_bytes()).unwrap();
        let parsed = TraceFile::from_file(file.path()).unwrap();
        assert_eq!(parsed.slots.len(), 2);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(TraceFile::from_file(Path::new("/does/not/exist.yaml")).is_err());
    }
}
