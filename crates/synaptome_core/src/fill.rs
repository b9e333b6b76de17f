//! Regeneration of territorial delimiters.
//!
//! The analyzer leaves the delimiter words of a kind holding scratch
//! counters. [`fill_delimiters`] writes fresh delimiters for every cell of
//! the kind, retags the slots to match and hands the kind back to rounds.

use crate::tissue::{DelimiterMode, DynamicState};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use synaptome_data::{
    Delimiters, TerritorialLists, TerritorialState, TissueCoordinates, NUM_TERRITORIAL_STATES,
};

/// How fresh delimiters are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FillPolicy {
    /// Capacity split evenly across the seven lists; the first
    /// `capacity % 7` lists get one extra slot.
    Regular,
    /// Every slot in the signal-delivery list.
    Settled,
    /// Lists sized by the current tags, slots stably regrouped. Restores a
    /// territory exactly when its tags were consistent before an analysis.
    #[default]
    FromTerritorialStates,
}

impl fmt::Display for FillPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regular => write!(f, "regular"),
            Self::Settled => write!(f, "settled"),
            Self::FromTerritorialStates => write!(f, "from-states"),
        }
    }
}

impl FromStr for FillPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(Self::Regular),
            "settled" => Ok(Self::Settled),
            "from-states" => Ok(Self::FromTerritorialStates),
            other => Err(format!("unknown fill policy '{other}'")),
        }
    }
}

/// Delimiters splitting `capacity` slots as evenly as possible.
pub fn regular_delimiters(capacity: u32) -> Delimiters {
    let base = capacity / NUM_TERRITORIAL_STATES as u32;
    let extra = capacity % NUM_TERRITORIAL_STATES as u32;
    let sizes: [u32; NUM_TERRITORIAL_STATES] =
        std::array::from_fn(|j| base + u32::from((j as u32) < extra));
    TerritorialLists::from_sizes(sizes).delimiters()
}

/// Rewrites the delimiters of every cell of `kind` under `policy`, retags
/// the slots to match and switches the kind back to delimiter mode.
///
/// # Panics
/// When `kind` is not a tissue cell kind.
pub fn fill_delimiters(state: &mut DynamicState, kind: u32, policy: FillPolicy) {
    let config = state.config().clone();
    assert!(
        config.is_tissue_kind(kind),
        "kind {kind} is not a tissue cell kind"
    );
    let range = config.kind_range(kind);
    let capacity = config.territory_capacity(kind);

    {
        let state = &*state;
        (0..config.num_columns()).into_par_iter().for_each(|column| {
            let (x, y) = config.column_coordinates(column);
            for c in range.clone() {
                let coords = TissueCoordinates::new(x, y, c);
                match policy {
                    FillPolicy::Regular => {
                        retag(state, coords, regular_delimiters(capacity), capacity)
                    }
                    FillPolicy::Settled => {
                        retag(state, coords, Delimiters::settled(capacity), capacity)
                    }
                    FillPolicy::FromTerritorialStates => {
                        let delimiters = state.regroup_into_back(coords);
                        state.restore_from_back(coords);
                        state.store_delimiters(coords, &delimiters);
                    }
                }
            }
        });
    }

    state.set_delimiter_mode(kind, DelimiterMode::Delimiters);
    tracing::debug!(kind, %policy, "Delimiters filled");
}

fn retag(state: &DynamicState, coords: TissueCoordinates, delimiters: Delimiters, capacity: u32) {
    let lists = TerritorialLists::new(delimiters, capacity);
    for territorial_state in TerritorialState::ALL {
        for slot in lists.range(territorial_state) {
            state.set_territorial_state(coords, slot, territorial_state);
        }
    }
    state.store_delimiters(coords, &delimiters);
}
