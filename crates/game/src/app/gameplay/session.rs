#[derive(Debug, Error)]
pub(crate) enum LevelLoadError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("level {level} has no player start")]
    MissingPlayer { level: String },
}

/// Drawing data per actor sprite, shared by every entity showing it.
#[derive(Debug, Default)]
struct ActorCatalog {
    draw_data: HashMap<&'static str, Rc<SpriteDrawData>>,
}

impl ActorCatalog {
    fn load(renderer: &mut Renderer, assets: &dyn AssetProvider) -> Result<Self, AssetError> {
        let mut catalog = Self::default();
        for id in ActorKind::all_asset_ids() {
            let actor = assets.load_actor(id)?;
            let frames = actor
                .frames
                .iter()
                .map(|frame| SpriteFrame {
                    image: renderer.create_texture(&frame.image),
                    draw_offset: frame.draw_offset,
                })
                .collect();
            catalog.insert(
                id,
                SpriteDrawData {
                    frames,
                    virtual_to_real_frame_map: actor.virtual_to_real_frame_map,
                    orientation_offset: actor.orientation_offset,
                    draw_order: actor.draw_order,
                },
            );
        }
        debug!(actor_count = catalog.draw_data.len(), "actor_catalog_loaded");
        Ok(catalog)
    }

    fn insert(&mut self, id: &'static str, data: SpriteDrawData) {
        self.draw_data.insert(id, Rc::new(data));
    }

    fn get(&self, kind: ActorKind) -> Option<Rc<SpriteDrawData>> {
        self.draw_data.get(kind.asset_id()).cloned()
    }
}

/// Everything one running level owns. Systems and event handlers work on
/// this struct directly.
struct LevelSession {
    level_name: String,
    bus: EventBus<GameEvent, LevelSession>,
    world: EntityWorld,
    components: GameComponents,
    map: Map,
    camera: Camera,
    rng: RandomNumberGenerator,
    physics: PhysicsSystem,
    catalog: ActorCatalog,
    player: Player,
    model: PlayerModel,
    effects: ScreenEffects,
    particles: ParticleSystem,
    input: InputSnapshot,
    is_odd_frame: bool,
    tick_count: u64,
    pending_sounds: Vec<SoundId>,
    pending_container_releases: Vec<(WorldPosition, ActorKind)>,
    messages: Vec<String>,
    radar_warning_shown: bool,
    backdrop_switch_pending: bool,
    outcome: Option<LevelOutcome>,
}

impl EventContext<GameEvent> for LevelSession {
    fn bus(&self) -> &EventBus<GameEvent, Self> {
        &self.bus
    }
}

impl PhysicsHost for LevelSession {
    fn physics_view(&mut self) -> PhysicsView<'_> {
        PhysicsView {
            world: &mut self.world,
            map: &self.map,
        }
    }

    fn on_collided_with_world(&mut self, event: CollidedWithWorld) {
        self.emit(GameEvent::CollidedWithWorld(event));
    }
}

impl LevelSession {
    fn new(
        level: LevelData,
        catalog: ActorCatalog,
        model: PlayerModel,
        seed: u64,
    ) -> Result<Self, LevelLoadError> {
        let LevelData {
            name,
            map,
            actors,
            earthquake,
            ..
        } = level;

        let player_start = actors
            .iter()
            .find(|actor| actor.kind == ActorKind::Player.level_name())
            .map(|actor| actor.position)
            .ok_or_else(|| LevelLoadError::MissingPlayer {
                level: name.clone(),
            })?;

        let mut bus = EventBus::default();
        register_event_handlers(&mut bus);

        let mut world = EntityWorld::default();
        let player_entity = world.spawn_at(player_start);

        let mut session = Self {
            level_name: name,
            bus,
            camera: Camera::new(map.width(), map.height()),
            map,
            world,
            components: GameComponents::default(),
            rng: RandomNumberGenerator::new(seed),
            physics: PhysicsSystem::default(),
            catalog,
            player: Player::new(player_entity),
            model,
            effects: ScreenEffects::new(earthquake),
            particles: ParticleSystem::default(),
            input: InputSnapshot::empty(),
            is_odd_frame: false,
            tick_count: 0,
            pending_sounds: Vec::new(),
            pending_container_releases: Vec::new(),
            messages: Vec::new(),
            radar_warning_shown: false,
            backdrop_switch_pending: false,
            outcome: None,
        };
        session.configure_player();

        for actor in &actors {
            if actor.kind == ActorKind::Player.level_name() {
                continue;
            }
            match ActorKind::from_level_name(&actor.kind) {
                Some(kind) => {
                    session.spawn_actor(kind, actor.position);
                }
                None => warn!(
                    level = %session.level_name,
                    kind = %actor.kind,
                    "unknown_level_actor_skipped"
                ),
            }
        }
        session.spawn_water_areas();

        let player_bounds = session.player_bounds();
        session.camera.center_view_on_player(&player_bounds);
        mark_active_entities(&mut session.world, session.camera.position());

        info!(
            level = %session.level_name,
            entity_count = session.world.entity_count(),
            seed,
            earthquake,
            "level_loaded"
        );
        Ok(session)
    }

    fn emit(&mut self, event: GameEvent) {
        EventBus::emit(self, event);
    }

    fn play_sound(&mut self, sound: SoundId) {
        self.pending_sounds.push(sound);
    }

    fn take_sounds(&mut self) -> Vec<SoundId> {
        std::mem::take(&mut self.pending_sounds)
    }

    fn show_message(&mut self, text: &str) {
        info!(level = %self.level_name, message = text, "player_message");
        self.messages.push(text.to_string());
    }

    fn collision(&self) -> CollisionChecker<'_> {
        CollisionChecker::new(&self.map)
    }

    fn player_position(&self) -> WorldPosition {
        self.world
            .positions
            .get(self.player.entity)
            .copied()
            .unwrap_or_default()
    }

    fn player_bounds(&self) -> Rect {
        world_space(&PLAYER_BOUNDS, self.player_position())
    }

    fn radar_dish_count(&self) -> usize {
        self.components.radar_dishes.len()
    }

    /// Purges game and engine components, then frees the handle.
    fn destroy_entity(&mut self, entity: Entity) -> bool {
        if entity == self.player.entity {
            return false;
        }
        self.components.purge(entity);
        self.world.destroy(entity)
    }

    fn spawn_sprite(&mut self, kind: ActorKind, position: WorldPosition) -> Entity {
        let entity = self.world.spawn_at(position);
        match self.catalog.get(kind).filter(|data| !data.frames.is_empty()) {
            Some(draw_data) => {
                self.world.sprites.insert(entity, Sprite::new(draw_data, vec![0]));
                synchronize_bounding_box_to_sprite(&mut self.world, entity, 0);
            }
            None => {
                self.world
                    .bounding_boxes
                    .insert(entity, BoundingBox::new(0, 0, 1, 1));
            }
        }
        entity
    }

    /// Creates an actor of `kind` with the components its kind implies.
    fn spawn_actor(&mut self, kind: ActorKind, position: WorldPosition) -> Entity {
        let entity = self.spawn_sprite(kind, position);
        self.configure_entity(entity, kind);
        entity
    }

    fn configure_player(&mut self) {
        let entity = self.player.entity;
        let draw_data = self
            .catalog
            .get(ActorKind::Player)
            .filter(|data| !data.frames.is_empty());
        if let Some(draw_data) = draw_data {
            self.world.sprites.insert(entity, Sprite::new(draw_data, vec![0]));
        }
        self.world.bounding_boxes.insert(entity, PLAYER_BOUNDS);
        self.world
            .bodies
            .insert(entity, MovingBody::new(PointF::ZERO, true));
        self.world.orientations.insert(entity, Orientation::Right);
        self.world
            .activation
            .insert(entity, ActivationSettings::new(ActivationPolicy::Always));
        self.world.draw_order_overrides.insert(entity, OverrideDrawOrder(PLAYER_DRAW_ORDER));
    }

    fn add_default_moving_body(&mut self, entity: Entity) {
        self.world
            .bodies
            .insert(entity, MovingBody::new(PointF::ZERO, true));
        self.world.activation.insert(
            entity,
            ActivationSettings::new(ActivationPolicy::AlwaysAfterFirstActivation),
        );
    }

    fn add_collectable(&mut self, entity: Entity, item: CollectableItem) {
        self.components.collectables.insert(entity, item);
        self.add_default_moving_body(entity);
    }

    fn add_item_box(&mut self, entity: Entity, contents: ActorKind) {
        self.components
            .shootables
            .insert(entity, Shootable::new(1, ITEM_BOX_SCORE));
        self.components
            .item_containers
            .insert(entity, ItemContainer { contents });
        self.add_default_moving_body(entity);
    }

    fn add_enemy(&mut self, entity: Entity, shootable: Shootable, behavior: Behavior) {
        self.components.shootables.insert(entity, shootable);
        self.components.behaviors.insert(entity, behavior);
    }

    fn add_player_damaging(&mut self, entity: Entity) {
        self.components.player_damaging.insert(
            entity,
            PlayerDamaging {
                amount: 1,
                destroy_on_contact: false,
            },
        );
    }

    fn configure_entity(&mut self, entity: Entity, kind: ActorKind) {
        match kind {
            ActorKind::LaserTurret => {
                self.add_enemy(
                    entity,
                    Shootable::new(2, 500),
                    Behavior::LaserTurret(LaserTurret::default()),
                );
            }
            ActorKind::Prisoner => {
                self.components
                    .behaviors
                    .insert(entity, Behavior::Prisoner(Prisoner::new(false)));
            }
            ActorKind::AggressivePrisoner => {
                let shootable = Shootable {
                    invincible: true,
                    ..Shootable::new(1, 500)
                };
                self.add_enemy(entity, shootable, Behavior::Prisoner(Prisoner::new(true)));
            }
            ActorKind::RocketTurret => {
                self.add_enemy(
                    entity,
                    Shootable::new(3, 500),
                    Behavior::RocketTurret(RocketTurret::default()),
                );
            }
            ActorKind::Skeleton => {
                self.add_enemy(
                    entity,
                    Shootable::new(2, 100),
                    Behavior::SimpleWalker(SimpleWalker::new(SKELETON_WALKER)),
                );
                self.add_player_damaging(entity);
                self.add_default_moving_body(entity);
                self.world.orientations.insert(entity, Orientation::Left);
            }
            ActorKind::CeilingCrawler => {
                self.add_enemy(
                    entity,
                    Shootable::new(1, 100),
                    Behavior::SimpleWalker(SimpleWalker::new(CEILING_CRAWLER_WALKER)),
                );
                self.add_player_damaging(entity);
                self.world.orientations.insert(entity, Orientation::Left);
            }
            ActorKind::SlidingDoor => {
                self.components
                    .behaviors
                    .insert(entity, Behavior::SlidingDoor(SlidingDoor::default()));
                self.components.solid_bodies.insert(entity, SolidBody);
            }
            ActorKind::SpikeBall => {
                self.add_enemy(
                    entity,
                    Shootable::new(4, 1000),
                    Behavior::SpikeBall(SpikeBall::default()),
                );
                self.add_player_damaging(entity);
                self.add_default_moving_body(entity);
                start_spike_ball_jump(&mut self.world, entity);
            }
            ActorKind::RigelatinSoldier => {
                self.add_enemy(
                    entity,
                    Shootable::new(6, 2000),
                    Behavior::RigelatinSoldier(RigelatinSoldier::default()),
                );
                self.add_player_damaging(entity);
                self.add_default_moving_body(entity);
                self.world.orientations.insert(entity, Orientation::Left);
            }
            ActorKind::Elevator => {
                self.components
                    .behaviors
                    .insert(entity, Behavior::Elevator(Elevator));
                self.world
                    .activation
                    .insert(entity, ActivationSettings::new(ActivationPolicy::Always));
            }
            ActorKind::RadarDish => {
                self.components
                    .shootables
                    .insert(entity, Shootable::new(4, 2000));
                self.components.radar_dishes.insert(entity, RadarDish);
                self.start_animation_loop(entity, 2);
            }
            ActorKind::RadarComputer => {
                self.components
                    .behaviors
                    .insert(entity, Behavior::RadarComputer(RadarComputer::default()));
                self.world
                    .activation
                    .insert(entity, ActivationSettings::new(ActivationPolicy::Always));
            }
            ActorKind::Teleporter => {
                self.components
                    .interactables
                    .insert(entity, InteractableType::Teleporter);
                self.start_animation_loop(entity, 1);
            }
            ActorKind::HintMachine => {
                self.components
                    .interactables
                    .insert(entity, InteractableType::HintMachine);
            }
            ActorKind::LevelExit => {
                self.components.exit_triggers.insert(entity, LevelExitTrigger);
            }
            ActorKind::HealthMolecule => {
                let item = CollectableItem {
                    given_score: Some(100),
                    given_score_at_full_health: Some(500),
                    given_health: Some(1),
                    spawn_score_numbers: true,
                    ..CollectableItem::default()
                };
                self.add_collectable(entity, item);
            }
            ActorKind::BlueGlobe => {
                let item = CollectableItem {
                    given_score: Some(500),
                    spawn_score_numbers: true,
                    ..CollectableItem::default()
                };
                self.add_collectable(entity, item);
                self.start_animation_loop(entity, 1);
            }
            ActorKind::LaserWeapon => {
                let item = CollectableItem {
                    given_score: Some(2000),
                    given_weapon: Some(WeaponType::Laser),
                    spawn_score_numbers: true,
                    ..CollectableItem::default()
                };
                self.add_collectable(entity, item);
            }
            ActorKind::RapidFire => {
                let item = CollectableItem {
                    given_score: Some(500),
                    given_item: Some(InventoryItem::RapidFire),
                    spawn_score_numbers: true,
                    ..CollectableItem::default()
                };
                self.add_collectable(entity, item);
            }
            ActorKind::HintGlobe => {
                let item = CollectableItem {
                    given_score: Some(500),
                    given_item: Some(InventoryItem::SpecialHintGlobe),
                    ..CollectableItem::default()
                };
                self.add_collectable(entity, item);
            }
            ActorKind::Letter(letter) => {
                let item = CollectableItem {
                    given_letter: Some(letter),
                    ..CollectableItem::default()
                };
                self.add_collectable(entity, item);
            }
            ActorKind::WhiteBoxHealthMolecule => {
                self.add_item_box(entity, ActorKind::HealthMolecule);
            }
            ActorKind::WhiteBoxRapidFire => self.add_item_box(entity, ActorKind::RapidFire),
            ActorKind::GreenBoxLaser => self.add_item_box(entity, ActorKind::LaserWeapon),
            ActorKind::BlueBoxGlobe => self.add_item_box(entity, ActorKind::BlueGlobe),
            ActorKind::Player
            | ActorKind::PlayerShot
            | ActorKind::PlayerLaserShot
            | ActorKind::EnemyLaserShot
            | ActorKind::EnemyRocket
            | ActorKind::RigelatinShot
            | ActorKind::MuzzleFlash
            | ActorKind::SmallExplosion
            | ActorKind::HintGlobeIcon
            | ActorKind::ScoreNumber(_) => {}
        }
    }

    fn start_animation_loop(&mut self, entity: Entity, delay_in_frames: i32) {
        let has_frames = self
            .world
            .sprites
            .get(entity)
            .is_some_and(|sprite| sprite.num_frames() > 1);
        if has_frames {
            self.world
                .animation_loops
                .insert(entity, AnimationLoop::new(delay_in_frames));
        }
    }

    /// Projectile fired by an enemy. It dies on walls and off screen.
    fn spawn_enemy_projectile(
        &mut self,
        kind: ActorKind,
        position: WorldPosition,
        velocity: PointF,
    ) -> Entity {
        let entity = self.spawn_sprite(kind, position);
        self.world.bodies.insert(entity, MovingBody::new(velocity, false));
        self.world.active.insert(entity, Active::default());
        self.world.auto_destroy.insert(
            entity,
            AutoDestroy {
                on_timeout: None,
                on_world_collision: true,
                on_leaving_active_region: true,
            },
        );
        self.components.player_damaging.insert(
            entity,
            PlayerDamaging {
                amount: 1,
                destroy_on_contact: true,
            },
        );
        entity
    }

    /// Sprite that plays its frames once and disappears.
    fn spawn_one_shot_sprite(&mut self, kind: ActorKind, position: WorldPosition) -> Entity {
        let entity = self.spawn_sprite(kind, position);
        let frame_count = self
            .world
            .sprites
            .get(entity)
            .map_or(1, |sprite| sprite.num_frames());
        if frame_count > 1 {
            self.world
                .animation_loops
                .insert(entity, AnimationLoop::new(1));
        }
        self.world
            .auto_destroy
            .insert(entity, AutoDestroy::after_timeout(frame_count));
        self.world
            .activation
            .insert(entity, ActivationSettings::new(ActivationPolicy::Always));
        entity
    }

    /// Water tiles become water effect areas, one per horizontal run.
    /// A run with no water above it gets the animated surface.
    fn spawn_water_areas(&mut self) {
        let is_water = |map: &Map, x: i32, y: i32| {
            (0..LAYER_COUNT).any(|layer| map.attributes(layer, x, y).contains(TileAttributes::WATER))
        };

        let mut runs = Vec::new();
        for y in 0..self.map.height() {
            let mut x = 0;
            while x < self.map.width() {
                if !is_water(&self.map, x, y) {
                    x += 1;
                    continue;
                }
                let start = x;
                while x < self.map.width() && is_water(&self.map, x, y) {
                    x += 1;
                }
                let animated_surface = y == 0 || !is_water(&self.map, start, y - 1);
                runs.push((start, y, x - start, animated_surface));
            }
        }

        for (x, y, width, animated_surface) in runs {
            let entity = self.world.spawn_at(Vector::new(x, y));
            self.world
                .bounding_boxes
                .insert(entity, BoundingBox::new(0, 0, width, 1));
            self.world
                .render_strategies
                .insert(entity, RenderStrategy::WaterArea { animated_surface });
        }
    }
}
