//! Tactical combat encounter engine for tabletop sessions.
//!
//! This crate provides:
//! - A single authoritative combat state model: roster, initiative order,
//!   round count, timed conditions and concentration, death saves, token
//!   positions, and area-effect spell markers
//! - Turn advancement with round-rollover effect decay
//! - Bounded snapshot-based undo
//! - A flat JSON scenario document for save/load, autosave, and a named
//!   scenario library
//!
//! # Quick Start
//!
//! ```
//! use encounter_core::{CombatEngine, CombatantKind, NewCombatant};
//!
//! let mut engine = CombatEngine::new();
//! let hero = engine.add_combatant(
//!     NewCombatant::new("Aria", 24, CombatantKind::Player)
//!         .with_ac(16)
//!         .with_initiative(18),
//! );
//! engine.add_combatant(
//!     NewCombatant::new("Goblin", 7, CombatantKind::Enemy).with_initiative(12),
//! );
//!
//! engine.apply_condition(hero.into(), "Blessed", 3);
//! engine.advance_turn();
//! assert_eq!(engine.round(), 0); // decay happens on round rollover only
//!
//! engine.update_hp(hero, 9);
//! engine.undo(); // back to 24
//! assert_eq!(engine.combatant(hero).unwrap().hp, 24);
//! ```

pub mod engine;
pub mod history;
pub mod model;
pub mod persist;

// Primary public API
pub use engine::{CombatEngine, Target};
pub use history::{HistoryStack, Snapshot, HISTORY_CAPACITY};
pub use model::{
    BackgroundType, Combatant, CombatantId, CombatantKind, Concentration, Condition, DeathSaves,
    GridConfig, MarkerId, MarkerShape, NewCombatant, Position, SpellMarker,
};
pub use persist::{PersistError, ScenarioDocument, ScenarioLibrary};
