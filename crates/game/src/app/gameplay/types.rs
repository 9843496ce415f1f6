/// Every actor the game can place from a level file or spawn at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ActorKind {
    Player,
    LaserTurret,
    Prisoner,
    AggressivePrisoner,
    RocketTurret,
    Skeleton,
    CeilingCrawler,
    SlidingDoor,
    SpikeBall,
    RigelatinSoldier,
    Elevator,
    RadarDish,
    RadarComputer,
    Teleporter,
    HintMachine,
    LevelExit,
    HealthMolecule,
    BlueGlobe,
    LaserWeapon,
    RapidFire,
    HintGlobe,
    Letter(CollectableLetter),
    WhiteBoxHealthMolecule,
    WhiteBoxRapidFire,
    GreenBoxLaser,
    BlueBoxGlobe,
    PlayerShot,
    PlayerLaserShot,
    EnemyLaserShot,
    EnemyRocket,
    RigelatinShot,
    MuzzleFlash,
    SmallExplosion,
    HintGlobeIcon,
    ScoreNumber(ScoreNumberType),
}

impl ActorKind {
    const PLACEABLE: [ActorKind; 30] = [
        ActorKind::Player,
        ActorKind::LaserTurret,
        ActorKind::Prisoner,
        ActorKind::AggressivePrisoner,
        ActorKind::RocketTurret,
        ActorKind::Skeleton,
        ActorKind::CeilingCrawler,
        ActorKind::SlidingDoor,
        ActorKind::SpikeBall,
        ActorKind::RigelatinSoldier,
        ActorKind::Elevator,
        ActorKind::RadarDish,
        ActorKind::RadarComputer,
        ActorKind::Teleporter,
        ActorKind::HintMachine,
        ActorKind::LevelExit,
        ActorKind::HealthMolecule,
        ActorKind::BlueGlobe,
        ActorKind::LaserWeapon,
        ActorKind::RapidFire,
        ActorKind::HintGlobe,
        ActorKind::Letter(CollectableLetter::N),
        ActorKind::Letter(CollectableLetter::U),
        ActorKind::Letter(CollectableLetter::K),
        ActorKind::Letter(CollectableLetter::E),
        ActorKind::Letter(CollectableLetter::M),
        ActorKind::WhiteBoxHealthMolecule,
        ActorKind::WhiteBoxRapidFire,
        ActorKind::GreenBoxLaser,
        ActorKind::BlueBoxGlobe,
    ];

    const RUNTIME_ONLY: [ActorKind; 13] = [
        ActorKind::PlayerShot,
        ActorKind::PlayerLaserShot,
        ActorKind::EnemyLaserShot,
        ActorKind::EnemyRocket,
        ActorKind::RigelatinShot,
        ActorKind::MuzzleFlash,
        ActorKind::SmallExplosion,
        ActorKind::HintGlobeIcon,
        ActorKind::ScoreNumber(ScoreNumberType::S10000),
        ActorKind::ScoreNumber(ScoreNumberType::S5000),
        ActorKind::ScoreNumber(ScoreNumberType::S2000),
        ActorKind::ScoreNumber(ScoreNumberType::S500),
        ActorKind::ScoreNumber(ScoreNumberType::S100),
    ];

    /// Name used for this kind in level files.
    fn level_name(self) -> &'static str {
        match self {
            ActorKind::Player => "duke",
            ActorKind::LaserTurret => "laser_turret",
            ActorKind::Prisoner => "prisoner",
            ActorKind::AggressivePrisoner => "aggressive_prisoner",
            ActorKind::RocketTurret => "rocket_turret",
            ActorKind::Skeleton => "skeleton",
            ActorKind::CeilingCrawler => "ceiling_crawler",
            ActorKind::SlidingDoor => "sliding_door",
            ActorKind::SpikeBall => "spike_ball",
            ActorKind::RigelatinSoldier => "rigelatin_soldier",
            ActorKind::Elevator => "elevator",
            ActorKind::RadarDish => "radar_dish",
            ActorKind::RadarComputer => "radar_computer",
            ActorKind::Teleporter => "teleporter",
            ActorKind::HintMachine => "hint_machine",
            ActorKind::LevelExit => "level_exit",
            ActorKind::HealthMolecule => "health_molecule",
            ActorKind::BlueGlobe => "blue_globe",
            ActorKind::LaserWeapon => "laser_weapon",
            ActorKind::RapidFire => "rapid_fire",
            ActorKind::HintGlobe => "hint_globe",
            ActorKind::Letter(letter) => letter.level_name(),
            ActorKind::WhiteBoxHealthMolecule => "white_box_health_molecule",
            ActorKind::WhiteBoxRapidFire => "white_box_rapid_fire",
            ActorKind::GreenBoxLaser => "green_box_laser",
            ActorKind::BlueBoxGlobe => "blue_box_globe",
            ActorKind::PlayerShot => "player_shot",
            ActorKind::PlayerLaserShot => "player_laser_shot",
            ActorKind::EnemyLaserShot => "enemy_laser_shot",
            ActorKind::EnemyRocket => "enemy_rocket",
            ActorKind::RigelatinShot => "rigelatin_shot",
            ActorKind::MuzzleFlash => "muzzle_flash",
            ActorKind::SmallExplosion => "small_explosion",
            ActorKind::HintGlobeIcon => "hint_globe_icon",
            ActorKind::ScoreNumber(number) => number.asset_id(),
        }
    }

    /// Sprite entry in the actor catalog. Boxes share one sprite per color.
    fn asset_id(self) -> &'static str {
        match self {
            ActorKind::WhiteBoxHealthMolecule | ActorKind::WhiteBoxRapidFire => "white_box",
            ActorKind::GreenBoxLaser => "green_box",
            ActorKind::BlueBoxGlobe => "blue_box",
            ActorKind::HintGlobeIcon => "hint_globe",
            other => other.level_name(),
        }
    }

    fn from_level_name(name: &str) -> Option<ActorKind> {
        ActorKind::PLACEABLE
            .into_iter()
            .find(|kind| kind.level_name() == name)
    }

    fn all_asset_ids() -> Vec<&'static str> {
        let mut ids: Vec<&'static str> = ActorKind::PLACEABLE
            .into_iter()
            .chain(ActorKind::RUNTIME_ONLY)
            .map(ActorKind::asset_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CollectableLetter {
    N,
    U,
    K,
    E,
    M,
}

impl CollectableLetter {
    const IN_ORDER: [CollectableLetter; 5] = [
        CollectableLetter::N,
        CollectableLetter::U,
        CollectableLetter::K,
        CollectableLetter::E,
        CollectableLetter::M,
    ];

    fn level_name(self) -> &'static str {
        match self {
            CollectableLetter::N => "letter_n",
            CollectableLetter::U => "letter_u",
            CollectableLetter::K => "letter_k",
            CollectableLetter::E => "letter_e",
            CollectableLetter::M => "letter_m",
        }
    }
}

/// Floating score number sprites, largest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ScoreNumberType {
    S10000,
    S5000,
    S2000,
    S500,
    S100,
}

impl ScoreNumberType {
    const LARGEST_FIRST: [ScoreNumberType; 5] = [
        ScoreNumberType::S10000,
        ScoreNumberType::S5000,
        ScoreNumberType::S2000,
        ScoreNumberType::S500,
        ScoreNumberType::S100,
    ];

    fn value(self) -> i32 {
        match self {
            ScoreNumberType::S10000 => 10_000,
            ScoreNumberType::S5000 => 5_000,
            ScoreNumberType::S2000 => 2_000,
            ScoreNumberType::S500 => 500,
            ScoreNumberType::S100 => 100,
        }
    }

    fn asset_id(self) -> &'static str {
        match self {
            ScoreNumberType::S10000 => "score_number_10000",
            ScoreNumberType::S5000 => "score_number_5000",
            ScoreNumberType::S2000 => "score_number_2000",
            ScoreNumberType::S500 => "score_number_500",
            ScoreNumberType::S100 => "score_number_100",
        }
    }
}

/// Splits `score` into score number sprites, largest denomination first.
fn score_number_breakdown(mut score: i32) -> Vec<ScoreNumberType> {
    let mut numbers = Vec::new();
    for number in ScoreNumberType::LARGEST_FIRST {
        while score >= number.value() {
            numbers.push(number);
            score -= number.value();
        }
    }
    numbers
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WeaponType {
    Regular,
    Laser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InventoryItem {
    RapidFire,
    SpecialHintGlobe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LetterCollectionState {
    Incomplete,
    InOrder,
    WrongOrder,
}

/// Score, health, weapon and inventory of the player across one level.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PlayerModel {
    score: i32,
    health: i32,
    weapon: WeaponType,
    inventory: Vec<InventoryItem>,
    letters: Vec<CollectableLetter>,
}

impl Default for PlayerModel {
    fn default() -> Self {
        Self {
            score: 0,
            health: PLAYER_MAX_HEALTH,
            weapon: WeaponType::Regular,
            inventory: Vec::new(),
            letters: Vec::new(),
        }
    }
}

impl PlayerModel {
    fn with_score(score: i32) -> Self {
        Self {
            score,
            ..Self::default()
        }
    }

    fn give_score(&mut self, amount: i32) {
        self.score = (self.score + amount).min(PLAYER_MAX_SCORE);
    }

    fn give_health(&mut self, amount: i32) {
        self.health = (self.health + amount).min(PLAYER_MAX_HEALTH);
    }

    fn take_damage(&mut self, amount: i32) {
        self.health = (self.health - amount).max(0);
    }

    fn is_dead(&self) -> bool {
        self.health <= 0
    }

    fn is_at_full_health(&self) -> bool {
        self.health >= PLAYER_MAX_HEALTH
    }

    fn switch_to_weapon(&mut self, weapon: WeaponType) {
        self.weapon = weapon;
    }

    fn give_item(&mut self, item: InventoryItem) {
        if !self.has_item(item) {
            self.inventory.push(item);
        }
    }

    fn has_item(&self, item: InventoryItem) -> bool {
        self.inventory.contains(&item)
    }

    fn remove_item(&mut self, item: InventoryItem) {
        self.inventory.retain(|held| *held != item);
    }

    fn add_letter(&mut self, letter: CollectableLetter) -> LetterCollectionState {
        self.letters.push(letter);
        if self.letters.len() < CollectableLetter::IN_ORDER.len() {
            return LetterCollectionState::Incomplete;
        }
        if self.letters[..] == CollectableLetter::IN_ORDER[..] {
            LetterCollectionState::InOrder
        } else {
            LetterCollectionState::WrongOrder
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Shootable {
    health: i32,
    given_score: i32,
    invincible: bool,
    destroy_when_killed: bool,
}

impl Shootable {
    fn new(health: i32, given_score: i32) -> Self {
        Self {
            health,
            given_score,
            invincible: false,
            destroy_when_killed: true,
        }
    }
}

/// Damages shootables it overlaps. Carried by player projectiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DamageInflicting {
    amount: i32,
    destroy_on_contact: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlayerDamaging {
    amount: i32,
    destroy_on_contact: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CollectableItem {
    given_score: Option<i32>,
    given_score_at_full_health: Option<i32>,
    given_health: Option<i32>,
    given_weapon: Option<WeaponType>,
    given_item: Option<InventoryItem>,
    given_letter: Option<CollectableLetter>,
    spawn_score_numbers: bool,
}

impl CollectableItem {
    fn score_for(&self, player_at_full_health: bool) -> Option<i32> {
        if player_at_full_health {
            if let Some(score) = self.given_score_at_full_health {
                return Some(score);
            }
        }
        self.given_score
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ItemContainer {
    contents: ActorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InteractableType {
    Teleporter,
    HintMachine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProjectileType {
    Regular,
    Laser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlayerProjectile {
    kind: ProjectileType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RadarDish;

/// Blocks the player's horizontal movement while present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SolidBody;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LevelExitTrigger;

/// Gameplay component tables kept next to the engine's [`EntityWorld`].
#[derive(Debug, Default)]
struct GameComponents {
    behaviors: ComponentTable<Behavior>,
    shootables: ComponentTable<Shootable>,
    damage_inflicting: ComponentTable<DamageInflicting>,
    player_damaging: ComponentTable<PlayerDamaging>,
    collectables: ComponentTable<CollectableItem>,
    item_containers: ComponentTable<ItemContainer>,
    interactables: ComponentTable<InteractableType>,
    player_projectiles: ComponentTable<PlayerProjectile>,
    radar_dishes: ComponentTable<RadarDish>,
    solid_bodies: ComponentTable<SolidBody>,
    exit_triggers: ComponentTable<LevelExitTrigger>,
}

impl GameComponents {
    fn purge(&mut self, entity: Entity) {
        self.behaviors.remove(entity);
        self.shootables.remove(entity);
        self.damage_inflicting.remove(entity);
        self.player_damaging.remove(entity);
        self.collectables.remove(entity);
        self.item_containers.remove(entity);
        self.interactables.remove(entity);
        self.player_projectiles.remove(entity);
        self.radar_dishes.remove(entity);
        self.solid_bodies.remove(entity);
        self.exit_triggers.remove(entity);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameEventKind {
    CollidedWithWorld,
    ShootableDamaged,
    ShootableKilled,
    PlayerFiredShot,
    PlayerTeleported,
    ExitReached,
}

#[derive(Debug, Clone, PartialEq)]
enum GameEvent {
    CollidedWithWorld(CollidedWithWorld),
    ShootableDamaged {
        entity: Entity,
        inflictor_velocity: PointF,
    },
    ShootableKilled {
        entity: Entity,
        inflictor_velocity: PointF,
    },
    PlayerFiredShot,
    PlayerTeleported {
        position: WorldPosition,
    },
    ExitReached {
        check_radar_dishes: bool,
    },
}

impl BusEvent for GameEvent {
    type Kind = GameEventKind;

    fn kind(&self) -> GameEventKind {
        match self {
            GameEvent::CollidedWithWorld(_) => GameEventKind::CollidedWithWorld,
            GameEvent::ShootableDamaged { .. } => GameEventKind::ShootableDamaged,
            GameEvent::ShootableKilled { .. } => GameEventKind::ShootableKilled,
            GameEvent::PlayerFiredShot => GameEventKind::PlayerFiredShot,
            GameEvent::PlayerTeleported { .. } => GameEventKind::PlayerTeleported,
            GameEvent::ExitReached { .. } => GameEventKind::ExitReached,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LevelOutcome {
    Completed,
    PlayerDied,
}

const SOUND_DUKE_JUMPING: SoundId = SoundId(1);
const SOUND_DUKE_PAIN: SoundId = SoundId(2);
const SOUND_DUKE_DEATH: SoundId = SoundId(3);
const SOUND_NORMAL_SHOT: SoundId = SoundId(4);
const SOUND_LASER_SHOT: SoundId = SoundId(5);
const SOUND_ITEM_PICKUP: SoundId = SoundId(6);
const SOUND_HEALTH_PICKUP: SoundId = SoundId(7);
const SOUND_WEAPON_PICKUP: SoundId = SoundId(8);
const SOUND_LETTERS_IN_ORDER: SoundId = SoundId(9);
const SOUND_TELEPORT: SoundId = SoundId(10);
const SOUND_EXPLOSION: SoundId = SoundId(11);
const SOUND_ENEMY_HIT: SoundId = SoundId(12);
const SOUND_ENEMY_LASER_SHOT: SoundId = SoundId(13);
const SOUND_ROCKET_LAUNCH: SoundId = SoundId(14);
const SOUND_DOOR_OPEN: SoundId = SoundId(15);
const SOUND_EARTHQUAKE: SoundId = SoundId(16);
const SOUND_WALL_HIT: SoundId = SoundId(17);
const SOUND_PRISONER_GRAB: SoundId = SoundId(18);
