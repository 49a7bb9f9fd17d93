//! Combat engine: canonical owner of all encounter state.
//!
//! The engine holds the roster, round counter, turn pointer, spell
//! markers, grid configuration, and selection, and exposes every mutation
//! as a named operation. Callers only ever read state or invoke
//! operations; nothing outside this module writes a field directly, which
//! is what keeps the HP clamp, death-save saturation, and turn-order
//! invariants intact.
//!
//! Operations are total: bad numeric input is clamped, a missing target id
//! is a silent no-op, and undo on an empty stack does nothing. Destructive
//! operations push a snapshot to the history stack before mutating.

use crate::history::{HistoryStack, Snapshot};
use crate::model::{
    Combatant, CombatantId, CombatantKind, Concentration, Condition, DeathSaves, GridConfig,
    MarkerId, MarkerShape, NewCombatant, Position, SpellMarker,
};
use crate::persist::ScenarioDocument;

/// Who a status-effect operation applies to: a single combatant, or every
/// combatant sharing a group name. Group membership is purely name-based.
#[derive(Debug, Clone)]
pub enum Target {
    Combatant(CombatantId),
    Group(String),
}

impl From<CombatantId> for Target {
    fn from(id: CombatantId) -> Self {
        Target::Combatant(id)
    }
}

/// The authoritative in-memory combat state.
#[derive(Debug, Clone, Default)]
pub struct CombatEngine {
    combatants: Vec<Combatant>,
    round: u32,
    current_turn_id: Option<CombatantId>,
    selected_id: Option<CombatantId>,
    selected_marker_id: Option<MarkerId>,
    spell_markers: Vec<SpellMarker>,
    grid: GridConfig,
    history: HistoryStack,
}

impl CombatEngine {
    /// A blank board: round 0, no combatants, default grid.
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Read surface
    // ========================================================================

    pub fn combatants(&self) -> &[Combatant] {
        &self.combatants
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn current_turn_id(&self) -> Option<CombatantId> {
        self.current_turn_id
    }

    pub fn selected_id(&self) -> Option<CombatantId> {
        self.selected_id
    }

    pub fn selected_marker_id(&self) -> Option<MarkerId> {
        self.selected_marker_id
    }

    pub fn spell_markers(&self) -> &[SpellMarker] {
        &self.spell_markers
    }

    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.id == id)
    }

    pub fn marker(&self, id: MarkerId) -> Option<&SpellMarker> {
        self.spell_markers.iter().find(|m| m.id == id)
    }

    pub fn current_combatant(&self) -> Option<&Combatant> {
        self.current_turn_id.and_then(|id| self.combatant(id))
    }

    /// Number of undo steps currently available.
    pub fn undo_depth(&self) -> usize {
        self.history.len()
    }

    // ========================================================================
    // Roster
    // ========================================================================

    /// Add a combatant with a generated id and defaulted state. If the
    /// roster was empty, the newcomer becomes the current turn holder.
    pub fn add_combatant(&mut self, init: NewCombatant) -> CombatantId {
        let was_empty = self.combatants.is_empty();
        let combatant = Combatant::create(init);
        let id = combatant.id;
        self.combatants.push(combatant);
        if was_empty {
            self.current_turn_id = Some(id);
        }
        id
    }

    /// Remove a combatant, clearing the turn pointer and selection if it
    /// held them.
    pub fn remove_combatant(&mut self, id: CombatantId) {
        if self.combatant(id).is_none() {
            return;
        }
        self.push_history();
        self.combatants.retain(|c| c.id != id);
        if self.current_turn_id == Some(id) {
            self.current_turn_id = None;
        }
        if self.selected_id == Some(id) {
            self.selected_id = None;
        }
    }

    // ========================================================================
    // Stats
    // ========================================================================

    /// Set hit points, clamped to `[0, max_hp]`. Healing above zero clears
    /// death saves and the defeated flag; dropping to zero starts a
    /// death-save record.
    pub fn update_hp(&mut self, id: CombatantId, new_hp: i32) {
        let Some(idx) = self.index_of(id) else { return };
        self.push_history();
        let c = &mut self.combatants[idx];
        c.hp = new_hp.clamp(0, c.max_hp);
        if c.hp > 0 {
            c.death_saves = None;
            c.defeated = false;
        } else {
            c.death_saves.get_or_insert_with(DeathSaves::default);
        }
    }

    /// Set armor class, clamped to zero or above.
    pub fn update_ac(&mut self, id: CombatantId, new_ac: i32) {
        let Some(idx) = self.index_of(id) else { return };
        self.push_history();
        self.combatants[idx].ac = Some(new_ac.max(0));
    }

    /// Set or clear initiative. Not undoable: initiative is re-edited
    /// constantly while rolling at the table.
    pub fn update_initiative(&mut self, id: CombatantId, initiative: Option<i32>) {
        if let Some(idx) = self.index_of(id) {
            self.combatants[idx].initiative = initiative;
        }
    }

    // ========================================================================
    // Conditions and concentration
    // ========================================================================

    /// Append a condition to the target combatant, or to every combatant
    /// sharing the target group name.
    pub fn apply_condition(&mut self, target: Target, name: impl Into<String>, rounds: u32) {
        let indices = self.target_indices(&target);
        if indices.is_empty() {
            return;
        }
        self.push_history();
        let condition = Condition::new(name, rounds);
        for idx in indices {
            self.combatants[idx].conditions.push(condition.clone());
        }
    }

    /// Remove every condition with the given name from one combatant.
    pub fn remove_condition(&mut self, id: CombatantId, name: &str) {
        let Some(idx) = self.index_of(id) else { return };
        if !self.combatants[idx].conditions.iter().any(|c| c.name == name) {
            return;
        }
        self.push_history();
        self.combatants[idx].conditions.retain(|c| c.name != name);
    }

    /// Set concentration on the target(s), replacing any existing one. A
    /// combatant concentrates on at most one effect.
    pub fn set_concentration(&mut self, target: Target, spell: impl Into<String>, rounds: u32) {
        let indices = self.target_indices(&target);
        if indices.is_empty() {
            return;
        }
        self.push_history();
        let concentration = Concentration::new(spell, rounds);
        for idx in indices {
            self.combatants[idx].concentration = Some(concentration.clone());
        }
    }

    pub fn clear_concentration(&mut self, id: CombatantId) {
        let Some(idx) = self.index_of(id) else { return };
        if self.combatants[idx].concentration.is_none() {
            return;
        }
        self.push_history();
        self.combatants[idx].concentration = None;
    }

    // ========================================================================
    // Defeat and death saves
    // ========================================================================

    pub fn mark_defeated(&mut self, id: CombatantId) {
        let Some(idx) = self.index_of(id) else { return };
        if self.combatants[idx].defeated {
            return;
        }
        self.push_history();
        self.combatants[idx].defeated = true;
    }

    /// Record a death-save success, saturating at 3. The third success
    /// stabilizes. No-op once stable or defeated. Death saves are granular
    /// and re-countable by hand, so they are not undoable.
    pub fn record_death_save_success(&mut self, id: CombatantId) {
        let Some(idx) = self.index_of(id) else { return };
        let c = &mut self.combatants[idx];
        if c.defeated {
            return;
        }
        let saves = c.death_saves.get_or_insert_with(DeathSaves::default);
        if saves.stable {
            return;
        }
        saves.record_success();
    }

    /// Record a death-save failure, saturating at 3. The third failure
    /// marks the combatant defeated.
    pub fn record_death_save_failure(&mut self, id: CombatantId) {
        let Some(idx) = self.index_of(id) else { return };
        let c = &mut self.combatants[idx];
        if c.defeated {
            return;
        }
        let saves = c.death_saves.get_or_insert_with(DeathSaves::default);
        if saves.stable {
            return;
        }
        if saves.record_failure() {
            c.defeated = true;
        }
    }

    /// Reset the death-save record to zero.
    pub fn clear_death_saves(&mut self, id: CombatantId) {
        if let Some(idx) = self.index_of(id) {
            if let Some(saves) = self.combatants[idx].death_saves.as_mut() {
                saves.reset();
            }
        }
    }

    // ========================================================================
    // Positions and markers
    // ========================================================================

    /// Move a combatant token, snapping to the nearest grid cell. Defeated
    /// combatants stay where they fell.
    pub fn update_combatant_position(&mut self, id: CombatantId, x: i32, y: i32) {
        let Some(idx) = self.index_of(id) else { return };
        if self.combatants[idx].defeated {
            return;
        }
        self.push_history();
        self.combatants[idx].position = Position::snapped(x, y, self.grid.square_size);
    }

    pub fn add_spell_marker(
        &mut self,
        label: impl Into<String>,
        shape: MarkerShape,
        size_in_feet: u32,
    ) -> MarkerId {
        self.push_history();
        let marker = SpellMarker::create(label, shape, size_in_feet);
        let id = marker.id;
        self.spell_markers.push(marker);
        id
    }

    pub fn remove_spell_marker(&mut self, id: MarkerId) {
        if self.marker(id).is_none() {
            return;
        }
        self.push_history();
        self.spell_markers.retain(|m| m.id != id);
        if self.selected_marker_id == Some(id) {
            self.selected_marker_id = None;
        }
    }

    pub fn update_marker_position(&mut self, id: MarkerId, x: i32, y: i32) {
        let Some(idx) = self.marker_index_of(id) else { return };
        self.push_history();
        self.spell_markers[idx].position = Position::snapped(x, y, self.grid.square_size);
    }

    pub fn update_marker_rotation(&mut self, id: MarkerId, degrees: f32) {
        let Some(idx) = self.marker_index_of(id) else { return };
        self.push_history();
        self.spell_markers[idx].rotation = degrees;
    }

    // ========================================================================
    // Selection and grid
    // ========================================================================

    /// Select a combatant (clearing any marker selection), or clear the
    /// combatant selection with `None`.
    pub fn select_combatant(&mut self, id: Option<CombatantId>) {
        match id {
            Some(id) => {
                if self.combatant(id).is_some() {
                    self.selected_id = Some(id);
                    self.selected_marker_id = None;
                }
            }
            None => self.selected_id = None,
        }
    }

    /// Select a marker (clearing any combatant selection), or clear the
    /// marker selection with `None`.
    pub fn select_marker(&mut self, id: Option<MarkerId>) {
        match id {
            Some(id) => {
                if self.marker(id).is_some() {
                    self.selected_marker_id = Some(id);
                    self.selected_id = None;
                }
            }
            None => self.selected_marker_id = None,
        }
    }

    /// Replace the grid configuration. Display-only: never snapshotted,
    /// dimensions clamped to at least one cell.
    pub fn set_grid_config(&mut self, mut grid: GridConfig) {
        grid.rows = grid.rows.max(1);
        grid.cols = grid.cols.max(1);
        grid.square_size = grid.square_size.max(1);
        self.grid = grid;
    }

    // ========================================================================
    // Turn advancement
    // ========================================================================

    /// Advance to the next eligible combatant.
    ///
    /// Eligible combatants are undefeated and have an initiative value;
    /// they rotate in descending initiative order, with ties broken by
    /// roster insertion order (stable sort, no secondary key). When the
    /// rotation wraps back to the top, the round increments, a snapshot is
    /// pushed, and round-limited effects tick down. Turn advances that do
    /// not wrap never decay effects and never push history: effects are
    /// per round, not per combatant-turn.
    pub fn advance_turn(&mut self) {
        let mut order: Vec<(CombatantId, i32)> = self
            .combatants
            .iter()
            .filter(|c| !c.defeated && c.initiative.is_some())
            .map(|c| (c.id, c.initiative.unwrap_or(0)))
            .collect();
        if order.is_empty() {
            return;
        }
        order.sort_by(|a, b| b.1.cmp(&a.1));

        // A vanished or defeated turn holder restarts the rotation at the top.
        let next = match self
            .current_turn_id
            .and_then(|id| order.iter().position(|(c, _)| *c == id))
        {
            Some(found) => (found + 1) % order.len(),
            None => 0,
        };

        let next_id = order[next].0;
        self.current_turn_id = Some(next_id);
        self.selected_id = Some(next_id);
        self.selected_marker_id = None;

        if next == 0 {
            self.round += 1;
            // Snapshot the moment before decay, so undo rewinds the tick.
            self.push_history();
            self.decay_effects();
        }
    }

    /// Tick round-limited effects on every combatant. Conditions decrement
    /// and drop at zero; concentration is cleared outright rather than
    /// held at a zero-round state.
    fn decay_effects(&mut self) {
        for c in &mut self.combatants {
            for condition in &mut c.conditions {
                condition.remaining_rounds = condition.remaining_rounds.saturating_sub(1);
            }
            c.conditions.retain(|condition| condition.remaining_rounds > 0);
            c.concentration = match c.concentration.take() {
                Some(mut conc) if conc.remaining_rounds > 1 => {
                    conc.remaining_rounds -= 1;
                    Some(conc)
                }
                _ => None,
            };
        }
    }

    // ========================================================================
    // Undo and resets
    // ========================================================================

    /// Restore the most recent snapshot wholesale. Empty stack is a no-op.
    pub fn undo(&mut self) {
        if let Some(snapshot) = self.history.pop() {
            self.combatants = snapshot.combatants;
            self.round = snapshot.round;
            self.current_turn_id = snapshot.current_turn_id;
            self.spell_markers = snapshot.spell_markers;
        }
    }

    /// Wipe the board entirely: combatants, markers, round, turn pointer,
    /// selection, grid back to defaults. Irreversible; the undo history is
    /// discarded with the board.
    pub fn reset_hard(&mut self) {
        self.combatants.clear();
        self.spell_markers.clear();
        self.round = 0;
        self.current_turn_id = None;
        self.selected_id = None;
        self.selected_marker_id = None;
        self.grid = GridConfig::default();
        self.history.clear();
    }

    /// End the encounter but keep the party: removes enemy combatants,
    /// clears every survivor's effects, flags, initiative, and position
    /// (hp, max hp, and ac survive), and clears markers and the round
    /// counter. Irreversible.
    pub fn reset_soft(&mut self) {
        self.combatants.retain(|c| c.kind != CombatantKind::Enemy);
        for c in &mut self.combatants {
            c.conditions.clear();
            c.concentration = None;
            c.defeated = false;
            c.death_saves = None;
            c.initiative = None;
            c.position = Position::default();
        }
        self.spell_markers.clear();
        self.round = 0;
        self.current_turn_id = None;
        self.selected_id = None;
        self.selected_marker_id = None;
        self.history.clear();
    }

    // ========================================================================
    // Documents
    // ========================================================================

    /// Build the flat scenario document from live state.
    pub fn export_document(&self) -> ScenarioDocument {
        ScenarioDocument {
            characters: self.combatants.clone(),
            round: Some(self.round),
            current_turn_id: self.current_turn_id,
            grid_config: Some(self.grid.clone()),
            spell_markers: self.spell_markers.clone(),
        }
    }

    /// Apply a scenario document atomically: combatants, round, turn
    /// pointer, markers, and grid all change together, so there is no
    /// window where they disagree. Selection is cleared and the undo
    /// history starts fresh.
    pub fn load_document(&mut self, document: ScenarioDocument) {
        let ScenarioDocument {
            characters,
            round,
            current_turn_id,
            grid_config,
            spell_markers,
        } = document;

        self.current_turn_id =
            current_turn_id.filter(|id| characters.iter().any(|c| c.id == *id));
        self.combatants = characters;
        // Documents are only minimally validated; re-establish the entity
        // invariants the constructors normally guarantee.
        for c in &mut self.combatants {
            c.normalize();
        }
        self.round = round.unwrap_or(0);
        self.spell_markers = spell_markers;
        self.grid = grid_config.unwrap_or_default();
        self.selected_id = None;
        self.selected_marker_id = None;
        self.history.clear();
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn index_of(&self, id: CombatantId) -> Option<usize> {
        self.combatants.iter().position(|c| c.id == id)
    }

    fn marker_index_of(&self, id: MarkerId) -> Option<usize> {
        self.spell_markers.iter().position(|m| m.id == id)
    }

    fn target_indices(&self, target: &Target) -> Vec<usize> {
        match target {
            Target::Combatant(id) => self.index_of(*id).into_iter().collect(),
            Target::Group(name) => self
                .combatants
                .iter()
                .enumerate()
                .filter(|(_, c)| c.group_name.as_deref() == Some(name.as_str()))
                .map(|(idx, _)| idx)
                .collect(),
        }
    }

    fn push_history(&mut self) {
        self.history.push(Snapshot {
            combatants: self.combatants.clone(),
            round: self.round,
            current_turn_id: self.current_turn_id,
            spell_markers: self.spell_markers.clone(),
        });
    }
}
