pub mod macros;

use std::sync::{Arc, Mutex};
use synaptome_core::{
    CellContext, CellKindConfig, MuscleSynapseContext, SensoryKindConfig, SignallingContext,
    SynapseContext, SynapseUpdate, TorusConfig,
};
use synaptome_data::NeighbourhoodRadii;
use synaptome_lib::{
    seed_tissue, DynamicState, StaticConfig, TerritorialState, TissueConfig, TransitionFunctions,
};

#[allow(dead_code)]
pub struct TissueBuilder {
    config: TissueConfig,
    seed: Option<u64>,
}

#[allow(dead_code)]
impl TissueBuilder {
    /// A single-kind tissue with no sensory cells and no muscles.
    pub fn new(size_x: u32, size_y: u32) -> Self {
        Self {
            config: TissueConfig {
                size_x,
                size_y,
                synapses_to_muscles: 0,
                cell_kinds: Vec::new(),
                sensory_kinds: Vec::new(),
                ..Default::default()
            },
            seed: None,
        }
    }

    pub fn with_kind(mut self, cells_per_column: u32, territory_capacity: u32) -> Self {
        self.config.cell_kinds.push(CellKindConfig {
            cells_per_column,
            territory_capacity,
            cell_radius: NeighbourhoodRadii::uniform(1),
            synapse_radius: NeighbourhoodRadii::uniform(1),
        });
        self
    }

    pub fn with_sensors(mut self, cells_per_column: u32) -> Self {
        self.config
            .sensory_kinds
            .push(SensoryKindConfig { cells_per_column });
        self
    }

    pub fn with_muscles(mut self, synapses: u32) -> Self {
        self.config.synapses_to_muscles = synapses;
        self
    }

    pub fn with_torus(mut self, x: bool, y: bool, columnar: bool) -> Self {
        self.config.torus = TorusConfig { x, y, columnar };
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut TissueConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn config(&self) -> Arc<StaticConfig> {
        Arc::new(StaticConfig::new(self.config.clone()).expect("Test config should be valid"))
    }

    pub fn build(self) -> DynamicState {
        let mut state = DynamicState::new(self.config());
        if let Some(seed) = self.seed {
            seed_tissue(&mut state, seed);
        }
        state
    }
}

/// Keeps every record and tags each synapse with its record's low three
/// bits; 7 settles.
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
pub struct TagByRecord;

impl TransitionFunctions for TagByRecord {
    fn synapse_to_muscle(&self, ctx: &MuscleSynapseContext<'_>) -> u64 {
        ctx.record()
    }

    fn synapse_in_tissue(&self, ctx: &SynapseContext<'_>) -> SynapseUpdate {
        let tag = TerritorialState::try_from_tag(ctx.record() & 7)
            .unwrap_or(TerritorialState::SignalDelivery);
        SynapseUpdate::new(ctx.record(), tag)
    }

    fn signalling(&self, ctx: &SignallingContext<'_>) -> u64 {
        ctx.record()
    }

    fn cell(&self, ctx: &CellContext<'_>) -> u64 {
        ctx.record()
    }
}

/// Which transition function ran, with its time step.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Call {
    Muscle(u64),
    Synapse(u64),
    Signalling(u64),
    Cell(u64),
}

#[allow(dead_code)]
impl Call {
    pub fn time_step(self) -> u64 {
        match self {
            Self::Muscle(t) | Self::Synapse(t) | Self::Signalling(t) | Self::Cell(t) => t,
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            Self::Muscle(_) => 0,
            Self::Synapse(_) => 1,
            Self::Signalling(_) => 2,
            Self::Cell(_) => 3,
        }
    }
}

/// Logs every call; signalling writes the time step so cells can check
/// they see this round's value.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Mutex<Vec<Call>>,
}

#[allow(dead_code)]
impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl TransitionFunctions for Recorder {
    fn synapse_to_muscle(&self, ctx: &MuscleSynapseContext<'_>) -> u64 {
        self.push(Call::Muscle(ctx.time_step()));
        ctx.record()
    }

    fn synapse_in_tissue(&self, ctx: &SynapseContext<'_>) -> SynapseUpdate {
        self.push(Call::Synapse(ctx.time_step()));
        SynapseUpdate::settled(ctx.record())
    }

    fn signalling(&self, ctx: &SignallingContext<'_>) -> u64 {
        self.push(Call::Signalling(ctx.time_step()));
        ctx.time_step() + 1
    }

    fn cell(&self, ctx: &CellContext<'_>) -> u64 {
        self.push(Call::Cell(ctx.time_step()));
        assert_eq!(ctx.signalling(), ctx.time_step() + 1);
        ctx.record()
    }
}
