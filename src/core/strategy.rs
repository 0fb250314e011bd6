//! Vertical-motion strategies.
//!
//! Each strategy is one historical revision of the cell's control logic. A
//! strategy is a pure function from the occupancy seen around the carriage to
//! the pair of vertical motions that should fire this cycle.

use serde::{Deserialize, Serialize};

use super::errors::CellError;

/// Occupancy facts a strategy decides on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StrategyInputs {
    /// Part on the conveyor tap under the inlet elevator
    pub inlet_bottom: bool,
    /// Part in the inlet slot aligned with the carriage
    pub inlet_top: bool,
    /// Part on the conveyor tap under the outlet elevator
    pub outlet_bottom: bool,
    /// Part in the outlet slot aligned with the carriage
    pub outlet_top: bool,
    /// Outlet elevator floor slot
    pub outlet_floor: bool,
    pub carriage_position: usize,
    pub carriage_max: usize,
    pub downstream_stoppage: bool,
}

/// Which vertical motions fire in one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerticalMoves {
    pub inlet: bool,
    pub outlet: bool,
}

/// Closed set of control revisions, selectable by id 0..=3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Strategy {
    /// 0: lift only to clear the conveyor while downstream is stopped
    #[default]
    EmergencyClear,
    /// 1: lift whenever no collision is imminent
    ContinuousInlet,
    /// 2: as 1, but only when a part waits on the inlet tap
    ConditionalInlet,
    /// 3: as 2, plus a forced lift when the column at the carriage is empty
    StrandedPartFix,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::EmergencyClear,
        Strategy::ContinuousInlet,
        Strategy::ConditionalInlet,
        Strategy::StrandedPartFix,
    ];

    pub fn id(self) -> u8 {
        match self {
            Strategy::EmergencyClear => 0,
            Strategy::ContinuousInlet => 1,
            Strategy::ConditionalInlet => 2,
            Strategy::StrandedPartFix => 3,
        }
    }

    pub fn from_id(id: u8) -> Result<Self, CellError> {
        Strategy::ALL
            .get(id as usize)
            .copied()
            .ok_or(CellError::UnknownStrategy(id))
    }

    /// Lowest position automatic transfer may park the carriage at
    pub fn park_floor(self) -> usize {
        match self {
            Strategy::EmergencyClear => 1,
            _ => 2,
        }
    }

    /// Decide which vertical motions fire for the given occupancy
    pub fn decide(self, s: &StrategyInputs) -> VerticalMoves {
        let clear_to_lift = !s.inlet_top || s.carriage_position < s.carriage_max;

        let inlet = match self {
            Strategy::EmergencyClear => s.inlet_bottom && s.downstream_stoppage,
            Strategy::ContinuousInlet => clear_to_lift,
            Strategy::ConditionalInlet => clear_to_lift && s.inlet_bottom,
            Strategy::StrandedPartFix => {
                let column_empty = !(s.inlet_bottom || s.inlet_top || s.outlet_top);
                (clear_to_lift && s.inlet_bottom) || column_empty
            }
        };

        // unchanged across every revision
        let outlet = !s.downstream_stoppage && !s.outlet_bottom && !s.outlet_floor;

        VerticalMoves { inlet, outlet }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> StrategyInputs {
        StrategyInputs {
            carriage_position: 3,
            carriage_max: 7,
            ..Default::default()
        }
    }

    #[test]
    fn ids_round_trip() {
        for strategy in Strategy::ALL {
            assert_eq!(Strategy::from_id(strategy.id()).unwrap(), strategy);
        }
        assert_eq!(Strategy::from_id(4), Err(CellError::UnknownStrategy(4)));
    }

    #[test]
    fn emergency_clear_lifts_only_when_stopped_with_part_waiting() {
        let mut s = inputs();
        s.inlet_bottom = true;
        assert!(!Strategy::EmergencyClear.decide(&s).inlet);
        s.downstream_stoppage = true;
        assert!(Strategy::EmergencyClear.decide(&s).inlet);
    }

    #[test]
    fn continuous_inlet_blocks_only_at_top_with_part_aligned() {
        let mut s = inputs();
        assert!(Strategy::ContinuousInlet.decide(&s).inlet);
        s.inlet_top = true;
        assert!(Strategy::ContinuousInlet.decide(&s).inlet);
        s.carriage_position = 7;
        assert!(!Strategy::ContinuousInlet.decide(&s).inlet);
    }

    #[test]
    fn conditional_inlet_needs_part_on_tap() {
        let mut s = inputs();
        assert!(!Strategy::ConditionalInlet.decide(&s).inlet);
        s.inlet_bottom = true;
        assert!(Strategy::ConditionalInlet.decide(&s).inlet);
    }

    #[test]
    fn stranded_part_fix_forces_lift_on_empty_column() {
        let mut s = inputs();
        assert!(!Strategy::ConditionalInlet.decide(&s).inlet);
        assert!(Strategy::StrandedPartFix.decide(&s).inlet);
        s.outlet_top = true;
        assert!(!Strategy::StrandedPartFix.decide(&s).inlet);
    }

    #[test]
    fn outlet_rule_is_shared() {
        let mut s = inputs();
        for strategy in Strategy::ALL {
            assert!(strategy.decide(&s).outlet);
        }
        s.downstream_stoppage = true;
        for strategy in Strategy::ALL {
            assert!(!strategy.decide(&s).outlet);
        }
        s.downstream_stoppage = false;
        s.outlet_bottom = true;
        for strategy in Strategy::ALL {
            assert!(!strategy.decide(&s).outlet);
        }
    }

    #[test]
    fn park_floor_depends_on_revision() {
        assert_eq!(Strategy::EmergencyClear.park_floor(), 1);
        assert_eq!(Strategy::StrandedPartFix.park_floor(), 2);
    }
}
