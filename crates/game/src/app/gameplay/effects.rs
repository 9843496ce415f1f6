const SCREEN_FLASH_FRAMES: i32 = 2;
const EARTHQUAKE_MIN_PAUSE: i32 = 80;
const EARTHQUAKE_PAUSE_VARIANCE: i32 = 120;
const EARTHQUAKE_MIN_DURATION: i32 = 10;
const EARTHQUAKE_DURATION_VARIANCE: i32 = 20;

const PARTICLES_PER_GROUP: usize = 16;
const PARTICLE_LIFE_TIME: i32 = 28;
const PARTICLE_GRAVITY: f32 = 0.5;

/// Full-screen effects: the backdrop flash and the earthquake shake.
#[derive(Debug, Clone, PartialEq)]
struct ScreenEffects {
    flash_color: Option<Color>,
    flash_frames_left: i32,
    earthquake_enabled: bool,
    earthquake_pause_left: i32,
    earthquake_frames_left: i32,
    shake_offset_px: i32,
}

impl ScreenEffects {
    fn new(earthquake_enabled: bool) -> Self {
        Self {
            flash_color: None,
            flash_frames_left: 0,
            earthquake_enabled,
            earthquake_pause_left: EARTHQUAKE_MIN_PAUSE,
            earthquake_frames_left: 0,
            shake_offset_px: 0,
        }
    }

    fn flash_screen(&mut self, color: Color) {
        self.flash_color = Some(color);
        self.flash_frames_left = SCREEN_FLASH_FRAMES;
    }

    fn backdrop_flash_color(&self) -> Option<Color> {
        self.flash_color
    }

    fn shake_offset_px(&self) -> i32 {
        self.shake_offset_px
    }
}

fn update_effects(session: &mut LevelSession) {
    let effects = &mut session.effects;
    if effects.flash_frames_left > 0 {
        effects.flash_frames_left -= 1;
        if effects.flash_frames_left == 0 {
            effects.flash_color = None;
        }
    }

    if !effects.earthquake_enabled {
        return;
    }

    if effects.earthquake_frames_left > 0 {
        effects.earthquake_frames_left -= 1;
        if effects.earthquake_frames_left == 0 {
            effects.shake_offset_px = 0;
            effects.earthquake_pause_left =
                EARTHQUAKE_MIN_PAUSE + session.rng.gen_below(EARTHQUAKE_PAUSE_VARIANCE);
        } else {
            effects.shake_offset_px = if session.rng.gen_bool() { TILE_SIZE_PX } else { 0 };
        }
        return;
    }

    effects.earthquake_pause_left -= 1;
    if effects.earthquake_pause_left <= 0 {
        effects.earthquake_frames_left =
            EARTHQUAKE_MIN_DURATION + session.rng.gen_below(EARTHQUAKE_DURATION_VARIANCE);
        session.pending_sounds.push(SOUND_EARTHQUAKE);
        debug!(frames = effects.earthquake_frames_left, "earthquake_started");
    }
}

/// Destroys entities whose `AutoDestroy` condition was met.
fn update_lifetimes(session: &mut LevelSession) {
    for entity in update_life_times(&mut session.world) {
        session.destroy_entity(entity);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Particle {
    offset: PointF,
    velocity: PointF,
}

/// Debris sprayed from an explosion. Positions are game-screen pixels
/// relative to the map origin.
#[derive(Debug, Clone, PartialEq)]
struct ParticleGroup {
    origin_px: Vector,
    color: Color,
    particles: Vec<Particle>,
    frames_elapsed: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct ParticleSystem {
    groups: Vec<ParticleGroup>,
}

impl ParticleSystem {
    fn spawn(&mut self, rng: &mut RandomNumberGenerator, origin_px: Vector, color: Color) {
        let particles = (0..PARTICLES_PER_GROUP)
            .map(|_| Particle {
                offset: PointF::ZERO,
                velocity: PointF::new(
                    rng.gen_range_inclusive(-4, 4) as f32 * 0.5,
                    -(rng.gen_range_inclusive(2, 6) as f32),
                ),
            })
            .collect();
        self.groups.push(ParticleGroup {
            origin_px,
            color,
            particles,
            frames_elapsed: 0,
        });
    }

    fn update(&mut self) {
        for group in &mut self.groups {
            group.frames_elapsed += 1;
            for particle in &mut group.particles {
                particle.offset.x += particle.velocity.x;
                particle.offset.y += particle.velocity.y;
                particle.velocity.y += PARTICLE_GRAVITY;
            }
        }
        self.groups
            .retain(|group| group.frames_elapsed < PARTICLE_LIFE_TIME);
    }

    /// Draws into the in-game viewport; the caller sets the viewport
    /// translation.
    fn render(&self, renderer: &mut Renderer, camera_position: Vector) {
        let camera_px = tile_vector_to_pixel_vector(camera_position);
        for group in &self.groups {
            for particle in &group.particles {
                let position = group.origin_px - camera_px
                    + Vector::new(particle.offset.x as i32, particle.offset.y as i32);
                renderer.draw_point(position, group.color);
            }
        }
    }
}
