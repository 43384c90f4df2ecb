//! Jersey number resolution.
//!
//! The OCR-derived jersey number on a detection flickers frame to frame.
//! A frequency count over every frame of a track stabilises the label, and
//! a user-confirmed mapping overrides the count outright.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use contracts::{JerseyMapping, PlayerTrack, TrackId};

/// Where a display name came from, highest precedence first
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedName {
    /// User-confirmed mapping
    Manual(u32),
    /// Most frequently observed jersey number
    Voted(u32),
    /// User-assigned display name
    Custom(String),
    /// Nothing known about the track
    Generic(TrackId),
}

impl ResolvedName {
    pub fn jersey_number(&self) -> Option<u32> {
        match self {
            ResolvedName::Manual(n) | ResolvedName::Voted(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for ResolvedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedName::Manual(n) | ResolvedName::Voted(n) => write!(f, "#{n}"),
            ResolvedName::Custom(name) => f.write_str(name),
            ResolvedName::Generic(id) => write!(f, "Player #{id}"),
        }
    }
}

/// Resolves track ids to display names
#[derive(Debug, Clone, Default)]
pub struct JerseyResolver {
    /// Majority-vote winner per track
    voted: HashMap<TrackId, u32>,
    /// Observation tallies per track, jersey-ordered
    tallies: HashMap<TrackId, BTreeMap<u32, usize>>,
    manual: HashMap<TrackId, u32>,
    custom_names: HashMap<TrackId, String>,
}

impl JerseyResolver {
    /// Count observations across every frame of `tracks`
    ///
    /// The tracker reports a detection's own track id in the jersey field
    /// when OCR fails; those observations carry no information and are not
    /// counted.
    pub fn new(
        tracks: &[PlayerTrack],
        mappings: &HashMap<TrackId, JerseyMapping>,
        custom_names: HashMap<TrackId, String>,
    ) -> Self {
        let mut tallies: HashMap<TrackId, BTreeMap<u32, usize>> = HashMap::new();
        for player in tracks.iter().flat_map(|t| &t.players) {
            let Some(jersey) = player.jersey_number else {
                continue;
            };
            if TrackId::from(jersey) == player.id {
                continue;
            }
            *tallies
                .entry(player.id)
                .or_default()
                .entry(jersey)
                .or_default() += 1;
        }

        let voted = tallies
            .iter()
            .filter_map(|(&track_id, counts)| majority(counts).map(|jersey| (track_id, jersey)))
            .collect();

        let manual = mappings
            .iter()
            .map(|(&track_id, mapping)| (track_id, mapping.jersey_number))
            .collect();

        Self {
            voted,
            tallies,
            manual,
            custom_names,
        }
    }

    /// Resolver from observations only
    pub fn from_tracks(tracks: &[PlayerTrack]) -> Self {
        Self::new(tracks, &HashMap::new(), HashMap::new())
    }

    /// Resolve one track id
    pub fn resolve(&self, track_id: TrackId) -> ResolvedName {
        if let Some(&jersey) = self.manual.get(&track_id) {
            return ResolvedName::Manual(jersey);
        }
        if let Some(&jersey) = self.voted.get(&track_id) {
            return ResolvedName::Voted(jersey);
        }
        if let Some(name) = self.custom_names.get(&track_id) {
            return ResolvedName::Custom(name.clone());
        }
        ResolvedName::Generic(track_id)
    }

    /// Display label (`#7`, a custom name, or `Player #3`)
    pub fn label(&self, track_id: TrackId) -> String {
        self.resolve(track_id).to_string()
    }

    pub fn jersey_number(&self, track_id: TrackId) -> Option<u32> {
        self.resolve(track_id).jersey_number()
    }

    /// Observation tallies of a track, jersey-ordered
    pub fn observations(&self, track_id: TrackId) -> Option<&BTreeMap<u32, usize>> {
        self.tallies.get(&track_id)
    }

    /// Record a confirmed mapping
    pub fn set_manual(&mut self, track_id: TrackId, jersey_number: u32) {
        self.manual.insert(track_id, jersey_number);
    }

    /// Drop a confirmed mapping; the vote applies again
    pub fn remove_manual(&mut self, track_id: TrackId) -> Option<u32> {
        self.manual.remove(&track_id)
    }

    pub fn set_custom_name(&mut self, track_id: TrackId, name: impl Into<String>) {
        self.custom_names.insert(track_id, name.into());
    }

    /// Every track id with any resolution source, ascending
    pub fn known_track_ids(&self) -> Vec<TrackId> {
        let mut ids: Vec<TrackId> = self
            .tallies
            .keys()
            .chain(self.manual.keys())
            .chain(self.custom_names.keys())
            .copied()
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Most frequent jersey; ties go to the smaller number
fn majority(counts: &BTreeMap<u32, usize>) -> Option<u32> {
    let mut best: Option<(u32, usize)> = None;
    // Ascending iteration with a strict comparison keeps the smaller jersey on ties
    for (&jersey, &count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((jersey, count)),
        }
    }
    best.map(|(jersey, _)| jersey)
}
