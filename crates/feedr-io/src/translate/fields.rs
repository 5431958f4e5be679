//! Primary-table column offsets.

pub const NAME: usize = 0;
pub const TYPE_CODE: usize = 1;
pub const PHASE: usize = 2;
pub const X: usize = 5;
pub const Y: usize = 6;
pub const GUID: usize = 49;
pub const PARENT_GUID: usize = 50;

pub mod line {
    /// Conductor names A, B, C follow consecutively.
    pub const CONDUCTOR_A: usize = 8;
    pub const CONDUCTOR_N: usize = 11;
    pub const CONSTRUCTION: usize = 12;
    pub const LENGTH: usize = 13;
    pub const LOAD_MIX: usize = 14;
}

pub mod capacitor {
    pub const KVAR_A: usize = 8;
    pub const RATED_KV: usize = 11;
    pub const CONTROL: usize = 12;
    pub const CONNECTION: usize = 13;
}

pub mod regulator {
    pub const SPEC: usize = 8;
    pub const CONTROL_PHASE: usize = 9;
    pub const BAND_CENTER_A: usize = 10;
    pub const BAND_WIDTH_A: usize = 13;
    pub const COMPENSATOR_R_A: usize = 16;
    pub const COMPENSATOR_X_A: usize = 19;
}

pub mod transformer {
    pub const SPEC: usize = 8;
    pub const KVA_A: usize = 9;
    pub const PRIMARY_KV: usize = 12;
    pub const SECONDARY_KV: usize = 13;
}

pub mod switch {
    pub const STATE: usize = 8;
}

pub mod node {
    pub const KW_A: usize = 8;
    pub const KVAR_A: usize = 11;
    pub const CLASS: usize = 14;
}

pub mod source {
    pub const KV: usize = 8;
}

pub mod overcurrent {
    pub const DEVICE: usize = 8;
    pub const CURRENT_LIMIT: usize = 9;
}

pub mod motor {
    pub const HORSEPOWER: usize = 8;
    pub const RATED_KV: usize = 9;
    pub const POWER_FACTOR: usize = 10;
}

pub mod generator {
    pub const KW: usize = 8;
    pub const KVAR: usize = 9;
    pub const RATED_KV: usize = 10;
    pub const TYPE: usize = 11;
}

pub mod consumer {
    pub const KW: usize = 8;
    pub const KVAR: usize = 9;
    pub const CLASS: usize = 10;
    pub const CUSTOMERS: usize = 11;
}
