//! Demonstration transition rules.
//!
//! Integer-only and fully deterministic: every decision is derived from the
//! records a context exposes and the time step, so runs with the same seed
//! agree bit for bit regardless of the number of workers.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use synaptome_core::bits::low_mask;
use synaptome_core::{
    CellContext, MuscleSynapseContext, SignallingContext, StaticConfig, SynapseContext,
    SynapseUpdate, TransitionFunctions,
};
use synaptome_data::TerritorialState;

/// Tunables of [`DemoRules`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleParams {
    /// One synapse in `migration_period` starts migrating each round.
    pub migration_period: u64,
    /// Right shift applied to a cell record every round.
    pub decay_shift: u32,
}

impl Default for RuleParams {
    fn default() -> Self {
        Self {
            migration_period: 8,
            decay_shift: 1,
        }
    }
}

/// Rules that keep records bounded, spread signals to neighbours and send a
/// steady trickle of synapses migrating.
#[derive(Debug, Clone)]
pub struct DemoRules {
    params: RuleParams,
    cell_mask: u64,
    synapse_mask: u64,
    muscle_mask: u64,
    signalling_mask: u64,
}

impl DemoRules {
    pub fn new(config: &StaticConfig, params: RuleParams) -> Result<Self> {
        ensure!(params.migration_period > 0, "migration period must be positive");
        ensure!(
            params.decay_shift < u64::BITS,
            "decay shift {} must be below {}",
            params.decay_shift,
            u64::BITS
        );
        let bits = config.bits();
        Ok(Self {
            params,
            cell_mask: low_mask(bits.cell),
            synapse_mask: low_mask(bits.synapse),
            muscle_mask: low_mask(bits.synapse_to_muscle),
            signalling_mask: low_mask(bits.signalling),
        })
    }
}

/// SplitMix64 finalizer.
#[inline]
fn mix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

impl TransitionFunctions for DemoRules {
    fn synapse_to_muscle(&self, ctx: &MuscleSynapseContext<'_>) -> u64 {
        ((ctx.record() >> 1) + (ctx.source_record() >> 1)) & self.muscle_mask
    }

    fn synapse_in_tissue(&self, ctx: &SynapseContext<'_>) -> SynapseUpdate {
        let record = ctx
            .record()
            .wrapping_add(ctx.source_record() >> 2)
            .wrapping_sub(ctx.target_cell() >> 3)
            & self.synapse_mask;

        let coords = ctx.coords();
        let h = mix(
            ctx.time_step()
                ^ (u64::from(coords.x) << 40)
                ^ (u64::from(coords.y) << 20)
                ^ (u64::from(coords.c) << 8)
                ^ u64::from(ctx.slot()),
        );
        if h % self.params.migration_period == 0 {
            let direction = (h >> 32) as usize % TerritorialState::MIGRATIONS.len();
            SynapseUpdate::new(record, TerritorialState::MIGRATIONS[direction])
        } else {
            SynapseUpdate::settled(record)
        }
    }

    fn signalling(&self, ctx: &SignallingContext<'_>) -> u64 {
        let neighbourhood = ctx.neighbourhood();
        let around = neighbourhood
            .shifts()
            .map(|shift| ctx.cell_at(shift))
            .fold(0u64, u64::wrapping_add)
            / neighbourhood.len() as u64;
        let delivered = ctx
            .list(TerritorialState::SignalDelivery)
            .map(|synapse| synapse.record & 0xFF)
            .fold(0u64, u64::wrapping_add);
        (around.wrapping_add(delivered) ^ (ctx.record() >> 4)) & self.signalling_mask
    }

    fn cell(&self, ctx: &CellContext<'_>) -> u64 {
        let decayed = ctx.record() >> self.params.decay_shift;
        decayed.wrapping_add(ctx.signalling() >> 1) & self.cell_mask
    }
}
