//! Integration tests for the combat engine's public API: full-encounter
//! flows that exercise turn rotation, effect decay, death saves, undo
//! bounds, and resets together.

use encounter_core::{
    CombatEngine, CombatantKind, MarkerShape, NewCombatant, Target, HISTORY_CAPACITY,
};

fn player(name: &str, hp: i32, initiative: i32) -> NewCombatant {
    NewCombatant::new(name, hp, CombatantKind::Player).with_initiative(initiative)
}

fn enemy(name: &str, hp: i32, initiative: i32) -> NewCombatant {
    NewCombatant::new(name, hp, CombatantKind::Enemy).with_initiative(initiative)
}

// =============================================================================
// A complete small encounter
// =============================================================================

#[test]
fn test_full_encounter_flow() {
    let mut engine = CombatEngine::new();

    let aria = engine.add_combatant(player("Aria", 24, 18).with_ac(16));
    let brox = engine.add_combatant(player("Brox", 30, 11).with_ac(14));
    let g1 = engine.add_combatant(enemy("Goblin 1", 7, 14).with_group("Goblins"));
    let g2 = engine.add_combatant(enemy("Goblin 2", 7, 14).with_group("Goblins"));

    // Order: Aria (18), Goblin 1 (14), Goblin 2 (14, added later), Brox (11).
    assert_eq!(engine.current_turn_id(), Some(aria));
    engine.advance_turn();
    assert_eq!(engine.current_turn_id(), Some(g1));
    engine.advance_turn();
    assert_eq!(engine.current_turn_id(), Some(g2));
    engine.advance_turn();
    assert_eq!(engine.current_turn_id(), Some(brox));
    assert_eq!(engine.round(), 0);

    // The goblins are frightened as a unit; Aria concentrates on Bless.
    engine.apply_condition(Target::Group("Goblins".into()), "Frightened", 2);
    engine.set_concentration(aria.into(), "Bless", 2);

    // Brox drops Goblin 1; it falls out of the rotation.
    engine.update_hp(g1, 0);
    engine.mark_defeated(g1);

    // Wrap to Aria: round 1 begins and effects tick.
    engine.advance_turn();
    assert_eq!(engine.current_turn_id(), Some(aria));
    assert_eq!(engine.round(), 1);
    assert_eq!(engine.combatant(g2).unwrap().conditions[0].remaining_rounds, 1);
    assert_eq!(
        engine
            .combatant(aria)
            .unwrap()
            .concentration
            .as_ref()
            .unwrap()
            .remaining_rounds,
        1
    );

    // Next full round: the condition and the concentration both expire.
    engine.advance_turn(); // Goblin 2
    engine.advance_turn(); // Brox
    engine.advance_turn(); // Aria, round 2
    assert_eq!(engine.round(), 2);
    assert!(engine.combatant(g2).unwrap().conditions.is_empty());
    assert!(engine.combatant(aria).unwrap().concentration.is_none());
}

#[test]
fn test_rotation_cycle_property() {
    // A(20), B(20), C(10) added in that order: cycles A -> B -> C -> A,
    // round incrementing exactly on the C -> A wrap.
    let mut engine = CombatEngine::new();
    let a = engine.add_combatant(player("A", 10, 20));
    let b = engine.add_combatant(player("B", 10, 20));
    let c = engine.add_combatant(player("C", 10, 10));

    let mut seen = Vec::new();
    for _ in 0..6 {
        engine.advance_turn();
        seen.push(engine.current_turn_id().unwrap());
    }
    assert_eq!(seen, vec![b, c, a, b, c, a]);
    assert_eq!(engine.round(), 2);
}

// =============================================================================
// Hit points and death saves
// =============================================================================

#[test]
fn test_hp_stays_in_range_across_arbitrary_updates() {
    let mut engine = CombatEngine::new();
    let a = engine.add_combatant(player("A", 15, 10));
    for new_hp in [-100, 0, 7, 1000, 15, -1, 3] {
        engine.update_hp(a, new_hp);
        let c = engine.combatant(a).unwrap();
        assert!(c.hp >= 0 && c.hp <= c.max_hp, "hp out of range: {}", c.hp);
    }
}

#[test]
fn test_death_save_interleavings_never_exceed_three() {
    // Any interleaving of success/failure calls keeps both counters in
    // 0..=3 and applies the stabilize/defeat rule.
    let mut engine = CombatEngine::new();
    let a = engine.add_combatant(player("A", 10, 10));
    engine.update_hp(a, 0);

    for step in 0..10 {
        if step % 2 == 0 {
            engine.record_death_save_failure(a);
        } else {
            engine.record_death_save_success(a);
        }
        let c = engine.combatant(a).unwrap();
        let saves = c.death_saves.unwrap();
        assert!(saves.successes <= 3);
        assert!(saves.failures <= 3);
        if saves.failures == 3 {
            assert!(c.defeated);
        }
        if saves.successes == 3 {
            assert!(saves.stable);
        }
    }
}

#[test]
fn test_healing_from_zero_clears_death_state() {
    let mut engine = CombatEngine::new();
    let a = engine.add_combatant(player("A", 10, 10));
    engine.update_hp(a, 0);
    engine.record_death_save_failure(a);
    engine.record_death_save_failure(a);

    engine.update_hp(a, 1);
    let c = engine.combatant(a).unwrap();
    assert!(!c.defeated);
    assert!(c.death_saves.is_none());
}

// =============================================================================
// Undo bounds
// =============================================================================

#[test]
fn test_undo_depth_is_bounded_with_fifo_eviction() {
    let mut engine = CombatEngine::new();
    let a = engine.add_combatant(player("A", 100, 10));

    // 21 destructive updates: hp 1, 2, ..., 21. The push for hp=1 (which
    // captured hp=100) is evicted; the deepest undo lands on the state
    // captured by push #2, where hp was already 1.
    for hp in 1..=(HISTORY_CAPACITY as i32 + 1) {
        engine.update_hp(a, hp);
    }
    assert_eq!(engine.combatant(a).unwrap().hp, 21);

    for _ in 0..100 {
        engine.undo();
    }
    assert_eq!(engine.combatant(a).unwrap().hp, 1);
}

#[test]
fn test_repeated_undo_walks_back_through_states() {
    let mut engine = CombatEngine::new();
    let a = engine.add_combatant(player("A", 50, 10));
    engine.update_hp(a, 40);
    engine.update_hp(a, 30);
    engine.update_hp(a, 20);

    engine.undo();
    assert_eq!(engine.combatant(a).unwrap().hp, 30);
    engine.undo();
    assert_eq!(engine.combatant(a).unwrap().hp, 40);
    engine.undo();
    assert_eq!(engine.combatant(a).unwrap().hp, 50);
    engine.undo(); // exhausted: no-op
    assert_eq!(engine.combatant(a).unwrap().hp, 50);
}

#[test]
fn test_undo_restores_markers_and_round_together() {
    let mut engine = CombatEngine::new();
    engine.add_combatant(player("A", 10, 10));
    let m = engine.add_spell_marker("Web", MarkerShape::Cube, 20);

    engine.remove_spell_marker(m);
    assert!(engine.spell_markers().is_empty());

    engine.undo();
    assert_eq!(engine.spell_markers().len(), 1);
    assert_eq!(engine.spell_markers()[0].id, m);
    assert_eq!(engine.round(), 0);
}

// =============================================================================
// Resets
// =============================================================================

#[test]
fn test_soft_reset_then_new_encounter() {
    let mut engine = CombatEngine::new();
    let hero = engine.add_combatant(player("Hero", 24, 15));
    engine.add_combatant(enemy("Goblin", 7, 12));
    engine.update_hp(hero, 10);
    engine.advance_turn();

    engine.reset_soft();
    assert_eq!(engine.combatants().len(), 1);
    assert_eq!(engine.combatant(hero).unwrap().hp, 10);
    assert!(engine.combatant(hero).unwrap().initiative.is_none());

    // The surviving party rolls into a fresh fight. The reset cleared the
    // turn pointer, so the first advance restarts at the top of the order
    // (hero at 17 beats the ogre's 9) and counts as a rollover.
    engine.update_initiative(hero, Some(17));
    engine.add_combatant(enemy("Ogre", 30, 9));
    engine.advance_turn();
    assert_eq!(engine.current_turn_id(), Some(hero));
    assert_eq!(engine.round(), 1);
}
