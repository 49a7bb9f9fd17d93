//! On-disk persistence tests: scenario save/load round trips, the
//! autosave slot, and the named scenario library.

use encounter_core::persist::{
    self, scenario_export_path, ScenarioDocument, ScenarioLibrary,
};
use encounter_core::{CombatEngine, CombatantKind, MarkerShape, NewCombatant};
use tempfile::TempDir;

fn sample_engine() -> CombatEngine {
    let mut engine = CombatEngine::new();
    let hero = engine.add_combatant(
        NewCombatant::new("Aria", 24, CombatantKind::Player)
            .with_ac(16)
            .with_initiative(18),
    );
    engine.add_combatant(
        NewCombatant::new("Goblin", 7, CombatantKind::Enemy)
            .with_initiative(12)
            .with_group("Goblins"),
    );
    engine.add_spell_marker("Fog Cloud", MarkerShape::Sphere, 20);
    engine.apply_condition(hero.into(), "Blessed", 2);
    engine.update_combatant_position(hero, 83, 118);
    engine.advance_turn();
    engine
}

#[tokio::test]
async fn test_scenario_file_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = scenario_export_path(temp_dir.path(), "Goblin Ambush");

    let engine = sample_engine();
    engine
        .export_document()
        .save_json(&path)
        .await
        .expect("Save should succeed");
    assert!(path.exists());

    let doc = ScenarioDocument::load_json(&path)
        .await
        .expect("Load should succeed");
    let mut restored = CombatEngine::new();
    restored.load_document(doc);

    assert_eq!(restored.round(), engine.round());
    assert_eq!(restored.current_turn_id(), engine.current_turn_id());
    assert_eq!(restored.spell_markers(), engine.spell_markers());
    assert_eq!(restored.combatants().len(), 2);
    let hero = &restored.combatants()[0];
    assert_eq!(hero.name, "Aria");
    assert_eq!(hero.position, engine.combatants()[0].position);
    assert_eq!(hero.conditions, engine.combatants()[0].conditions);
}

#[tokio::test]
async fn test_invalid_file_leaves_engine_untouched() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("broken.json");
    tokio::fs::write(&path, r#"{"round": 3}"#)
        .await
        .expect("Write should succeed");

    let mut engine = sample_engine();
    let before = engine.export_document().to_json().unwrap();

    // The load fails before any document reaches the engine.
    let result = ScenarioDocument::load_json(&path).await;
    assert!(result.is_err());
    if let Ok(doc) = result {
        engine.load_document(doc);
    }
    assert_eq!(engine.export_document().to_json().unwrap(), before);
}

#[tokio::test]
async fn test_autosave_slot() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let dir = temp_dir.path().join("data");

    // Absent slot reads as a blank board.
    let blank = persist::load_autosave(&dir).await.expect("Load should succeed");
    assert!(blank.characters.is_empty());
    assert_eq!(blank.round, Some(0));

    let engine = sample_engine();
    persist::save_autosave(&dir, &engine.export_document())
        .await
        .expect("Save should succeed");

    let doc = persist::load_autosave(&dir).await.expect("Load should succeed");
    assert_eq!(doc.characters.len(), 2);
    assert_eq!(doc.round, Some(engine.round()));
}

#[tokio::test]
async fn test_scenario_library_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("scenarios.json");

    // Missing file is an empty library.
    let library = ScenarioLibrary::load_file(&path)
        .await
        .expect("Load should succeed");
    assert!(library.is_empty());

    let mut library = ScenarioLibrary::new();
    library.add("Goblin Ambush", sample_engine().export_document());
    library.add("Empty Room", ScenarioDocument::blank());
    library.save_file(&path).await.expect("Save should succeed");

    let loaded = ScenarioLibrary::load_file(&path)
        .await
        .expect("Load should succeed");
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.get(0).unwrap().name, "Goblin Ambush");
    assert_eq!(loaded.get(1).unwrap().scenario.characters.len(), 0);

    // Each library entry is itself a loadable scenario.
    let mut engine = CombatEngine::new();
    engine.load_document(loaded.get(0).unwrap().scenario.clone());
    assert_eq!(engine.combatants().len(), 2);
}
