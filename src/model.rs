//! Entity model for the combat tracker.
//!
//! Contains the data shapes the engine mutates: combatants, timed status
//! effects, death saves, spell markers, and the battlefield grid
//! configuration. Constructors establish the invariants listed on each
//! type; every later mutation goes through [`crate::engine::CombatEngine`].

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for combatants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatantId(pub Uuid);

impl CombatantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CombatantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for spell markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerId(pub Uuid);

impl MarkerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MarkerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Combatants
// ============================================================================

/// Whether a combatant is a player character or an enemy.
///
/// Affects grouping and display defaults only, never turn logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CombatantKind {
    #[default]
    Player,
    Enemy,
}

impl CombatantKind {
    pub fn name(&self) -> &'static str {
        match self {
            CombatantKind::Player => "player",
            CombatantKind::Enemy => "enemy",
        }
    }
}

impl fmt::Display for CombatantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A battlefield position in pixels, snapped to grid cell boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Snap to the nearest multiple of `square_size`.
    pub fn snapped(x: i32, y: i32, square_size: i32) -> Self {
        Self {
            x: snap(x, square_size),
            y: snap(y, square_size),
        }
    }
}

fn snap(value: i32, step: i32) -> i32 {
    if step <= 0 {
        return value;
    }
    ((value as f64 / step as f64).round() as i32) * step
}

/// A named, round-limited status effect attached to a combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub name: String,
    pub remaining_rounds: u32,
}

impl Condition {
    /// Durations below one round are clamped up to one.
    pub fn new(name: impl Into<String>, remaining_rounds: u32) -> Self {
        Self {
            name: name.into(),
            remaining_rounds: remaining_rounds.max(1),
        }
    }
}

/// The single ongoing effect a combatant is concentrating on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concentration {
    pub spell_name: String,
    pub remaining_rounds: u32,
}

impl Concentration {
    pub fn new(spell_name: impl Into<String>, remaining_rounds: u32) -> Self {
        Self {
            spell_name: spell_name.into(),
            remaining_rounds: remaining_rounds.max(1),
        }
    }
}

/// Death saving throw counters, tracked once a combatant's hp reaches 0.
///
/// Both counters saturate at 3. Three successes stabilize; three failures
/// mean defeat (enforced by the engine, which owns the `defeated` flag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeathSaves {
    pub successes: u8,
    pub failures: u8,
    pub stable: bool,
}

impl DeathSaves {
    /// Record a success. Sets `stable` on the third.
    pub fn record_success(&mut self) {
        self.successes = self.successes.saturating_add(1).min(3);
        if self.successes >= 3 {
            self.stable = true;
        }
    }

    /// Record a failure. Returns true when the third failure is reached.
    pub fn record_failure(&mut self) -> bool {
        self.failures = self.failures.saturating_add(1).min(3);
        self.failures >= 3
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Any entity participating in the encounter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    #[serde(default)]
    pub ac: Option<i32>,
    /// Absent means "not yet in turn order": excluded from rotation.
    #[serde(default)]
    pub initiative: Option<i32>,
    #[serde(default)]
    pub kind: CombatantKind,
    /// Combatants sharing a group name can be status-effect-targeted as a
    /// unit; each still holds its own initiative slot.
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub concentration: Option<Concentration>,
    #[serde(default)]
    pub defeated: bool,
    #[serde(default)]
    pub death_saves: Option<DeathSaves>,
    #[serde(default)]
    pub position: Position,
}

/// Fields supplied by the caller when adding a combatant; everything else
/// (id, position, effects, flags) is defaulted by the engine.
#[derive(Debug, Clone)]
pub struct NewCombatant {
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    pub ac: Option<i32>,
    pub initiative: Option<i32>,
    pub kind: CombatantKind,
    pub group_name: Option<String>,
}

impl NewCombatant {
    pub fn new(name: impl Into<String>, max_hp: i32, kind: CombatantKind) -> Self {
        let max_hp = max_hp.max(0);
        Self {
            name: name.into(),
            hp: max_hp,
            max_hp,
            ac: None,
            initiative: None,
            kind,
            group_name: None,
        }
    }

    pub fn with_hp(mut self, hp: i32) -> Self {
        self.hp = hp;
        self
    }

    pub fn with_ac(mut self, ac: i32) -> Self {
        self.ac = Some(ac.max(0));
        self
    }

    pub fn with_initiative(mut self, initiative: i32) -> Self {
        self.initiative = Some(initiative);
        self
    }

    pub fn with_group(mut self, group_name: impl Into<String>) -> Self {
        self.group_name = Some(group_name.into());
        self
    }
}

impl Combatant {
    /// Build a combatant with a fresh id and defaulted state.
    pub fn create(init: NewCombatant) -> Self {
        let max_hp = init.max_hp.max(0);
        Self {
            id: CombatantId::new(),
            name: init.name,
            hp: init.hp.clamp(0, max_hp),
            max_hp,
            ac: init.ac.map(|ac| ac.max(0)),
            initiative: init.initiative,
            kind: init.kind,
            group_name: init.group_name,
            conditions: Vec::new(),
            concentration: None,
            defeated: false,
            death_saves: None,
            position: Position::default(),
        }
    }

    /// Re-establish construction invariants on externally sourced data.
    ///
    /// Loaded documents bypass the constructors, so a scenario file can
    /// carry an out-of-range hp, a zero-round condition, or death-save
    /// counters past 3. Clamp rather than reject: zero-round effects are
    /// already expired and are dropped.
    pub fn normalize(&mut self) {
        self.max_hp = self.max_hp.max(0);
        self.hp = self.hp.clamp(0, self.max_hp);
        self.ac = self.ac.map(|ac| ac.max(0));
        self.conditions.retain(|c| c.remaining_rounds > 0);
        if self
            .concentration
            .as_ref()
            .is_some_and(|c| c.remaining_rounds == 0)
        {
            self.concentration = None;
        }
        if let Some(saves) = self.death_saves.as_mut() {
            saves.successes = saves.successes.min(3);
            saves.failures = saves.failures.min(3);
        }
    }

    pub fn is_down(&self) -> bool {
        self.hp == 0 && !self.defeated
    }

    pub fn hp_ratio(&self) -> f32 {
        if self.max_hp <= 0 {
            return 0.0;
        }
        (self.hp as f32 / self.max_hp as f32).clamp(0.0, 1.0)
    }
}

/// Roll a d20 for initiative, for entries added with the field left blank.
pub fn roll_initiative() -> i32 {
    rand::thread_rng().gen_range(1..=20)
}

// ============================================================================
// Spell Markers
// ============================================================================

/// Area-of-effect template shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerShape {
    Cube,
    Sphere,
    Cone,
}

impl MarkerShape {
    pub fn name(&self) -> &'static str {
        match self {
            MarkerShape::Cube => "cube",
            MarkerShape::Sphere => "sphere",
            MarkerShape::Cone => "cone",
        }
    }
}

impl fmt::Display for MarkerShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An area-effect spell template placed on the battlefield.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellMarker {
    pub id: MarkerId,
    pub label: String,
    pub shape: MarkerShape,
    pub size_in_feet: u32,
    /// Footprint in grid squares: `ceil(size_in_feet / 5)`.
    pub squares: u32,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub rotation: f32,
}

impl SpellMarker {
    pub fn create(label: impl Into<String>, shape: MarkerShape, size_in_feet: u32) -> Self {
        Self {
            id: MarkerId::new(),
            label: label.into(),
            shape,
            size_in_feet,
            squares: size_in_feet.div_ceil(5),
            position: Position::default(),
            rotation: 0.0,
        }
    }
}

// ============================================================================
// Grid
// ============================================================================

/// Battlefield background styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundType {
    #[default]
    None,
    Grass,
    Desert,
    Dungeon,
    Snow,
    Custom,
}

/// Pure display configuration for the battlefield grid.
///
/// Never touched by turn logic and excluded from undo snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridConfig {
    pub rows: u32,
    pub cols: u32,
    pub square_size: i32,
    #[serde(default)]
    pub background_type: BackgroundType,
    /// Reference to an uploaded custom background, when `background_type`
    /// is `Custom`.
    #[serde(default)]
    pub custom_background: Option<String>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 20,
            cols: 20,
            square_size: 40,
            background_type: BackgroundType::None,
            custom_background: None,
        }
    }
}
