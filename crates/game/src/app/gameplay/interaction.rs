const BASIC_LETTER_COLLECTION_SCORE: i32 = 10_100;
const CORRECT_LETTER_COLLECTION_SCORE: i32 = 100_000;
const HINT_MACHINE_ACTIVATION_SCORE: i32 = 50_000;

const PLAYER_TO_TELEPORTER_OFFSET: Vector = Vector::new(1, 0);
const HINT_MACHINE_GLOBE_OFFSET: Vector = Vector::new(1, -4);
const LETTER_BONUS_X_OFFSETS: [i32; 4] = [-3, 0, 3, 0];
const LETTER_BONUS_NUMBER_COUNT: i32 = 10;

const SCORE_NUMBER_LIFE_TIME: i32 = 60;
const SCORE_NUMBER_FLOAT_SEQUENCE: [PointF; 6] = [
    PointF::new(0.0, -1.0),
    PointF::new(0.0, -1.0),
    PointF::new(0.0, -1.0),
    PointF::new(0.0, -1.0),
    PointF::new(0.0, 0.0),
    PointF::new(0.0, -1.0),
];

const MESSAGE_FOUND_HINT_GLOBE: &str = "You found the special hint globe!";
const MESSAGE_LETTERS_WRONG_ORDER: &str = "You collected all letters, but not in the right order.";
const MESSAGE_LETTERS_IN_ORDER: &str = "Letters collected in the right order: 100000 points!";
const MESSAGE_RADAR_DISHES_REMAIN: &str = "Destroy all radar dishes before leaving the level.";
const MESSAGE_HINT: &str = "Look for hidden passages behind the walls.";

/// Uses the interactable the player stands at. The hint machine activates
/// by itself once the player carries the hint globe.
fn update_player_interaction(session: &mut LevelSession) {
    if session.player.is_dead() {
        return;
    }

    let interaction_wanted = session.input.was_pressed(InputAction::MoveUp);
    let player_bounds = session.player_bounds();
    let player_position = session.player_position();
    let has_hint_globe = session.model.has_item(InventoryItem::SpecialHintGlobe);

    let candidates: Vec<(Entity, InteractableType)> = session
        .components
        .interactables
        .iter(&session.world.registry)
        .map(|(entity, kind)| (entity, *kind))
        .collect();

    for (entity, kind) in candidates {
        let Some(bounds) = session.world.world_bbox(entity) else {
            continue;
        };
        if !interactable_in_range(&bounds, kind, &player_bounds, player_position) {
            continue;
        }

        let is_hint_machine = kind == InteractableType::HintMachine;
        if interaction_wanted || (is_hint_machine && has_hint_globe) {
            match kind {
                InteractableType::Teleporter => activate_teleporter(session, entity),
                InteractableType::HintMachine => {
                    if has_hint_globe {
                        activate_hint_machine(session, entity);
                    }
                }
            }
            break;
        }
    }

    let at_exit = session
        .components
        .exit_triggers
        .iter(&session.world.registry)
        .any(|(entity, _)| {
            session
                .world
                .world_bbox(entity)
                .is_some_and(|bounds| bounds.intersects(&player_bounds))
        });
    if at_exit {
        session.emit(GameEvent::ExitReached {
            check_radar_dishes: true,
        });
    }
}

fn interactable_in_range(
    bounds: &Rect,
    kind: InteractableType,
    player_bounds: &Rect,
    player_position: WorldPosition,
) -> bool {
    if !player_bounds.intersects(bounds) {
        return false;
    }
    match kind {
        InteractableType::Teleporter => {
            bounds.left() <= player_position.x
                && bounds.left() + 3 >= player_position.x
                && bounds.bottom() == player_position.y
        }
        InteractableType::HintMachine => true,
    }
}

/// Sends the player to the other teleporter. A level with a single
/// teleporter uses it as the exit.
fn activate_teleporter(session: &mut LevelSession, source: Entity) {
    session.play_sound(SOUND_TELEPORT);

    let target = session
        .components
        .interactables
        .iter(&session.world.registry)
        .filter(|(entity, kind)| **kind == InteractableType::Teleporter && *entity != source)
        .filter_map(|(entity, _)| session.world.positions.get(entity).copied())
        .last();

    match target {
        Some(position) => session.emit(GameEvent::PlayerTeleported {
            position: position + PLAYER_TO_TELEPORTER_OFFSET,
        }),
        None => session.emit(GameEvent::ExitReached {
            check_radar_dishes: false,
        }),
    }
}

fn activate_hint_machine(session: &mut LevelSession, machine: Entity) {
    let Some(position) = session.world.positions.get(machine).copied() else {
        return;
    };
    session.model.remove_item(InventoryItem::SpecialHintGlobe);
    session.model.give_score(HINT_MACHINE_ACTIVATION_SCORE);
    session.play_sound(SOUND_ITEM_PICKUP);
    spawn_score_numbers(session, position, HINT_MACHINE_ACTIVATION_SCORE);
    session.show_message(MESSAGE_HINT);

    session.components.interactables.remove(machine);
    session.world.bounding_boxes.remove(machine);
    session.spawn_sprite(ActorKind::HintGlobeIcon, position + HINT_MACHINE_GLOBE_OFFSET);
}

/// Picks up every collectable the player overlaps this tick.
fn update_item_collection(session: &mut LevelSession) {
    if session.player.is_dead() {
        return;
    }

    let player_bounds = session.player_bounds();
    let touched: Vec<(Entity, CollectableItem)> = session
        .components
        .collectables
        .iter(&session.world.registry)
        .filter(|(entity, _)| {
            session
                .world
                .world_bbox(*entity)
                .is_some_and(|bounds| bounds.intersects(&player_bounds))
        })
        .map(|(entity, item)| (entity, *item))
        .collect();

    for (entity, item) in touched {
        let Some(position) = session.world.positions.get(entity).copied() else {
            continue;
        };
        collect_item(session, &item, position);
        session.destroy_entity(entity);
    }
}

fn collect_item(session: &mut LevelSession, item: &CollectableItem, position: WorldPosition) {
    let mut sound = None;

    if let Some(score) = item.score_for(session.model.is_at_full_health()) {
        session.model.give_score(score);
        sound = Some(SOUND_ITEM_PICKUP);
        if item.spawn_score_numbers {
            spawn_score_numbers(session, position, score);
        }
    }

    if let Some(health) = item.given_health {
        session.model.give_health(health);
        sound = Some(SOUND_HEALTH_PICKUP);
    }

    if let Some(weapon) = item.given_weapon {
        session.model.switch_to_weapon(weapon);
        sound = Some(SOUND_WEAPON_PICKUP);
    }

    if let Some(inventory_item) = item.given_item {
        session.model.give_item(inventory_item);
        sound = Some(match inventory_item {
            InventoryItem::RapidFire => SOUND_WEAPON_PICKUP,
            InventoryItem::SpecialHintGlobe => SOUND_ITEM_PICKUP,
        });
        if inventory_item == InventoryItem::SpecialHintGlobe {
            session.show_message(MESSAGE_FOUND_HINT_GLOBE);
        }
    }

    if let Some(letter) = item.given_letter {
        collect_letter(session, letter, position);
    }

    if let Some(sound) = sound {
        session.play_sound(sound);
    }
}

/// Every letter but an in-order fifth one is worth 10100 points, while only
/// a floating 100 is shown.
fn collect_letter(session: &mut LevelSession, letter: CollectableLetter, position: WorldPosition) {
    match session.model.add_letter(letter) {
        LetterCollectionState::InOrder => {
            session.play_sound(SOUND_LETTERS_IN_ORDER);
            session.model.give_score(CORRECT_LETTER_COLLECTION_SCORE);
            for i in 0..LETTER_BONUS_NUMBER_COUNT {
                let offset = Vector::new(LETTER_BONUS_X_OFFSETS[(i % 4) as usize], -i);
                spawn_floating_score_number(session, ScoreNumberType::S10000, position + offset);
            }
            session.show_message(MESSAGE_LETTERS_IN_ORDER);
        }
        state => {
            session.play_sound(SOUND_ITEM_PICKUP);
            session.model.give_score(BASIC_LETTER_COLLECTION_SCORE);
            spawn_floating_score_number(session, ScoreNumberType::S100, position);
            if state == LetterCollectionState::WrongOrder {
                session.show_message(MESSAGE_LETTERS_WRONG_ORDER);
            }
        }
    }
}

/// Stacks score numbers for `score` above `position`, the largest on top.
fn spawn_score_numbers(session: &mut LevelSession, position: WorldPosition, score: i32) {
    let numbers = score_number_breakdown(score);
    let mut y_offset = numbers.len() as i32 - 1;
    for number in numbers {
        spawn_floating_score_number(session, number, position - Vector::new(0, y_offset));
        y_offset -= 1;
    }
}

fn spawn_floating_score_number(
    session: &mut LevelSession,
    number: ScoreNumberType,
    position: WorldPosition,
) -> Entity {
    let entity = session.spawn_sprite(ActorKind::ScoreNumber(number), position);
    session.world.movement_sequences.insert(
        entity,
        MovementSequence::new(&SCORE_NUMBER_FLOAT_SEQUENCE, true, false),
    );
    session
        .world
        .bodies
        .insert(entity, MovingBody::new(PointF::ZERO, false).ignoring_collisions());
    session
        .world
        .auto_destroy
        .insert(entity, AutoDestroy::after_timeout(SCORE_NUMBER_LIFE_TIME));
    session
        .world
        .activation
        .insert(entity, ActivationSettings::new(ActivationPolicy::Always));
    session.world.active.insert(entity, Active::default());
    entity
}

fn on_player_teleported(session: &mut LevelSession, event: &GameEvent) {
    let GameEvent::PlayerTeleported { position } = event else {
        return;
    };
    let entity = session.player.entity;
    if let Some(current) = session.world.positions.get_mut(entity) {
        *current = *position;
    }
    let bounds = session.player_bounds();
    session.camera.center_view_on_player(&bounds);
    if session.map.backdrop_switch_condition() == BackdropSwitchCondition::OnTeleportation {
        session.backdrop_switch_pending = true;
    }
}

fn on_exit_reached(session: &mut LevelSession, event: &GameEvent) {
    let GameEvent::ExitReached { check_radar_dishes } = event else {
        return;
    };
    if *check_radar_dishes && session.radar_dish_count() > 0 {
        if !session.radar_warning_shown {
            session.radar_warning_shown = true;
            session.show_message(MESSAGE_RADAR_DISHES_REMAIN);
        }
        return;
    }
    if session.outcome.is_none() {
        info!(
            level = %session.level_name,
            score = session.model.score,
            "level_completed"
        );
        session.outcome = Some(LevelOutcome::Completed);
    }
}

fn on_player_fired_shot(session: &mut LevelSession, _event: &GameEvent) {
    session.camera.receive_player_fired_shot();
}
