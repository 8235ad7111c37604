//! Growing a [`Construction`] from a root part.
//!
//! Growth is a sequence of [`step_construction()`] calls, each of which attaches one
//! room to one open mount. [`generate()`] drives the whole sequence:
//!
//! 1. *Growing*: steps with a decaying positive growth target, until the budget is
//!    spent, no step is possible, or the requirement error stops improving.
//! 2. *Stabilizing*: steps with a growth target of zero.
//! 3. *Closing*: at most `2 × open + 2` steps with a negative growth target.
//! 4. *Relaxed closing*: if mounts are still open, the same again with optional
//!    reserved zones ignored.
//!
//! Every phase is bounded, so generation always terminates. Mounts left open at the
//! end are logged, not an error.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use hashbrown::{HashMap, HashSet};
use rand::seq::SliceRandom as _;

use crate::construction::{Construction, ConstructionError, Room, RoomId, RoomMountId};
use crate::library::PartLibrary;
use crate::math::DiscreteTransform;
use crate::noise::Salt;
use crate::part::{MountKey, Part, PartKey};
use crate::requirement::RequirementSeed;
use crate::weighted::WeightedChoice;

#[cfg(feature = "auto-threads")]
use rayon::iter::{IntoParallelRefIterator as _, ParallelIterator as _};

/// Tuning parameters of [`generate()`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[expect(clippy::exhaustive_structs)]
pub struct GeneratorSettings {
    /// Maximum number of steps in the growing phase.
    pub growth_budget: usize,
    /// Growth target (change in open mounts per step) of the first growing step.
    pub initial_growth: f64,
    /// Factor applied to the growth target after each growing step.
    pub growth_decay: f64,
    /// Number of consecutive steps without improvement of the requirement error which
    /// ends the growing and stabilizing phases.
    pub stall_window: usize,
    /// Maximum number of steps in the stabilizing phase.
    pub stabilize_steps: usize,
    /// Growth target of the closing phases. Should be negative.
    pub closing_growth: f64,
    /// Passed to [`WeightedChoice::choose_by_quantile()`] to choose among candidates.
    pub quantile_fifty: f64,
    /// Magnitude of the random term added to each candidate's score.
    pub jitter: f64,
    /// Weight of the requirement improvement in candidate scores.
    pub requirement_weight: f64,
    /// Weight of the growth term in candidate scores.
    pub growth_weight: f64,
    /// Number of candidates evaluated per step when there are more. They are tried in a
    /// deterministic random order, and evaluation continues past this number only until
    /// a valid candidate is found.
    pub max_candidates: usize,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            growth_budget: 64,
            initial_growth: 4.0,
            growth_decay: 0.9,
            stall_window: 5,
            stabilize_steps: 16,
            closing_growth: -4.0,
            quantile_fifty: 0.9,
            jitter: 0.01,
            requirement_weight: 1.0,
            growth_weight: 1.0,
            max_candidates: 512,
        }
    }
}

/// Lets another thread ask a running [`generate()`] to stop.
///
/// Cancellation takes effect between steps.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

type PartFilter = Arc<dyn Fn(&Part) -> bool + Send + Sync>;

/// Everything generation depends on: the parts, the targets and seed, and the settings.
///
/// Generation reads nothing else, so the same context and root produce the same
/// construction.
#[derive(Clone)]
pub struct GenerationContext {
    library: Arc<PartLibrary>,
    seed: Arc<RequirementSeed>,
    settings: GeneratorSettings,
    part_filter: Option<PartFilter>,
    cancel: CancelHandle,
}

impl GenerationContext {
    /// Constructs a context with default settings.
    pub fn new(library: Arc<PartLibrary>, seed: Arc<RequirementSeed>) -> Self {
        Self {
            library,
            seed,
            settings: GeneratorSettings::default(),
            part_filter: None,
            cancel: CancelHandle::default(),
        }
    }

    /// Replaces the settings.
    #[must_use]
    pub fn with_settings(mut self, settings: GeneratorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Restricts the parts which may be added. The root part is not subject to it.
    #[must_use]
    pub fn with_part_filter(
        mut self,
        filter: impl Fn(&Part) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.part_filter = Some(Arc::new(filter));
        self
    }

    /// Returns a handle which cancels generation using this context or its clones.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// The library.
    pub fn library(&self) -> &Arc<PartLibrary> {
        &self.library
    }

    /// The targets and seed.
    pub fn seed(&self) -> &Arc<RequirementSeed> {
        &self.seed
    }

    /// The settings.
    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    fn accepts(&self, part: &Part) -> bool {
        self.part_filter.as_ref().is_none_or(|filter| filter(part))
    }

    fn check_cancelled(&self) -> Result<(), GenError> {
        if self.cancel.is_cancelled() {
            Err(GenError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for GenerationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationContext")
            .field("library", &self.library)
            .field("seed", &self.seed)
            .field("settings", &self.settings)
            .field("part_filter", &self.part_filter.is_some())
            .field("cancel", &self.cancel)
            .finish()
    }
}

/// Options of one [`step_construction()`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[expect(clippy::exhaustive_structs)]
pub struct StepOptions {
    /// Desired change in the number of open mounts. [`f64::NAN`] for no preference.
    pub target_growth: f64,
    /// Whether optional reserved zones are enforced.
    pub test_optional: bool,
}

impl Default for StepOptions {
    fn default() -> Self {
        Self {
            target_growth: f64::NAN,
            test_optional: true,
        }
    }
}

/// Failure of generation as a whole.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum GenError {
    /// The root part could not be loaded.
    #[error("root part {0:?} is not available")]
    UnknownPart(PartKey),
    /// The construction rejected a room.
    #[error("construction failed")]
    Construction(#[from] ConstructionError),
    /// [`CancelHandle::cancel()`] was called.
    #[error("generation was cancelled")]
    Cancelled,
}

/// Summary of a [`generate()`] run.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub struct GenerationReport {
    /// Steps taken in the growing phase.
    pub growing_steps: usize,
    /// Steps taken in the stabilizing phase.
    pub stabilizing_steps: usize,
    /// Steps taken in the first closing phase.
    pub closing_steps: usize,
    /// Steps taken in the relaxed closing phase.
    pub relaxed_steps: usize,
    /// Number of rooms at the end.
    pub rooms: usize,
    /// Number of open mounts at the end.
    pub open_mounts: usize,
    /// Requirement error at the end.
    pub error: f64,
}

impl GenerationReport {
    /// Whether every mount ended up attached.
    pub fn closed(&self) -> bool {
        self.open_mounts == 0
    }
}

/// A finished construction and how it went.
#[derive(Debug)]
#[non_exhaustive]
pub struct Generated {
    /// The construction.
    pub construction: Construction,
    /// The summary.
    pub report: GenerationReport,
}

/// A possible next room.
#[derive(Clone, Debug)]
struct Candidate {
    part: Arc<Part>,
    mount: MountKey,
    transform: DiscreteTransform,
    host: RoomMountId,
}

const SALT_STEP: u64 = 0x5354_4550;
const SALT_SUBSET: u64 = 0x5355_4253;
const SALT_JITTER: u64 = 0x4a49_5454;
const SALT_CHOICE: u64 = 0x4348_4f49;

/// Attaches one room to one open mount of `construction`, if possible.
///
/// Only parts already loaded into the library are considered. Returns `Ok(false)` if
/// there was no valid candidate, in which case every mount which was searched is
/// recorded as scanned and will not be searched again until the library changes.
pub fn step_construction(
    ctx: &GenerationContext,
    construction: &mut Construction,
    options: StepOptions,
) -> Result<bool, GenError> {
    let library = &*ctx.library;
    let library_generation = library.generation();
    construction.forget_stale_scans(library_generation);

    let free: Vec<RoomMountId> = construction
        .open_mounts()
        .into_iter()
        .filter(|mount| !construction.is_scanned(mount))
        .collect();
    if free.is_empty() {
        return Ok(false);
    }

    let step_salt = Salt::new(SALT_STEP)
        .u64(construction.version())
        .u64(construction.room_count() as u64);
    let mut candidates = gather_candidates(ctx, construction, &free);
    let candidate_count = candidates.len();
    let max_candidates = ctx.settings.max_candidates;
    if candidate_count > max_candidates {
        let mut rng = ctx.seed.seed_noise().rng(step_salt.u64(SALT_SUBSET).finish());
        candidates.shuffle(&mut rng);
    }

    let baseline = Baseline {
        open_mounts: construction.open_mount_count(),
        error: construction.compute_error(None),
    };
    let mut error_by_part: HashMap<PartKey, f64> = HashMap::new();
    let mut productive: HashSet<RoomMountId> = HashSet::new();
    // Hosts with candidates left untried; they have not been fully searched.
    let mut unexplored: HashSet<RoomMountId> = HashSet::new();
    let mut choice = WeightedChoice::new();
    for (index, candidate) in candidates.iter().enumerate() {
        // Past the cap, keep going only until something valid turns up.
        if index >= max_candidates && !choice.is_empty() {
            unexplored.extend(candidates[index..].iter().map(|c| c.host.clone()));
            break;
        }
        let Some(evaluation) = evaluate(ctx, construction, candidate, options, &mut error_by_part)?
        else {
            continue;
        };
        productive.insert(candidate.host.clone());
        let score = score_candidate(ctx, options, &baseline, evaluation, candidate, step_salt);
        if !score.is_nan() {
            choice.add(index, score);
        }
    }

    for mount in free {
        if !productive.contains(&mount) && !unexplored.contains(&mount) {
            construction.mark_scanned(mount, library_generation);
        }
    }

    let noise = ctx.seed.noise(step_salt.u64(SALT_CHOICE).finish());
    let Some(&chosen) = choice.choose_by_quantile(noise, ctx.settings.quantile_fifty) else {
        log::trace!("no valid candidates among {candidate_count}");
        return Ok(false);
    };
    let candidate = &candidates[chosen];
    let room = construction.generate_room(candidate.part.clone(), candidate.transform);
    let id = construction.register_room(room)?;
    log::trace!(
        "chose {} at {:?} as room {id} on {:?} ({} of {candidate_count} valid)",
        candidate.part.key(),
        candidate.transform,
        candidate.host,
        choice.len(),
    );
    Ok(true)
}

/// Every placement of every part which attaches to one of the `free` mounts, without
/// duplicates.
fn gather_candidates(
    ctx: &GenerationContext,
    construction: &Construction,
    free: &[RoomMountId],
) -> Vec<Candidate> {
    let library = &*ctx.library;
    let mut seen: HashSet<(PartKey, DiscreteTransform)> = HashSet::new();
    let mut candidates = Vec::new();
    for host_id in free {
        let Some(host) = construction.room(host_id.room) else {
            continue;
        };
        let Some(host_mount) = host.part().mount(&host_id.mount) else {
            continue;
        };
        for (part, mount_key) in library.parts_with_mount_type(host_mount.mount_type()) {
            if part.cube_size() != construction.cube_size() || !ctx.accepts(&part) {
                continue;
            }
            let Some(mount) = part.mount(&mount_key) else {
                continue;
            };
            let permitted = host_mount.adjacency().permits(
                host.part().key(),
                &host_id.mount,
                part.key(),
                &mount_key,
            ) && mount.adjacency().permits(
                part.key(),
                &mount_key,
                host.part().key(),
                &host_id.mount,
            );
            if !permitted {
                continue;
            }
            for &relative in library
                .matcher()
                .match_transforms(host.part(), host_mount, &part, mount)
                .iter()
            {
                let transform = host.transform() * relative;
                if seen.insert((part.key().clone(), transform)) {
                    candidates.push(Candidate {
                        part: part.clone(),
                        mount: mount_key.clone(),
                        transform,
                        host: host_id.clone(),
                    });
                }
            }
        }
    }
    candidates
}

struct Baseline {
    open_mounts: usize,
    error: f64,
}

#[derive(Clone, Copy)]
struct Evaluation {
    open_mounts: usize,
    error: f64,
}

/// Trial-attaches `candidate` and checks that it is valid: it collides with nothing,
/// attaches to its host, and does not make any open mount unclosable.
///
/// The construction is always restored before returning.
fn evaluate(
    ctx: &GenerationContext,
    construction: &mut Construction,
    candidate: &Candidate,
    options: StepOptions,
    error_by_part: &mut HashMap<PartKey, f64>,
) -> Result<Option<Evaluation>, GenError> {
    let cache = ctx.library.intersections();
    let room = construction.generate_room(candidate.part.clone(), candidate.transform);
    if construction.intersects_any(&room, cache, options.test_optional, None) {
        return Ok(None);
    }

    let evaluation = construction.with_trial_room(room, |trial, id| {
        check_trial(ctx, trial, id, candidate, options, error_by_part)
    })?;
    Ok(evaluation)
}

/// Checks a candidate room already registered in `trial` as `id`.
fn check_trial(
    ctx: &GenerationContext,
    trial: &Construction,
    id: RoomId,
    candidate: &Candidate,
    options: StepOptions,
    error_by_part: &mut HashMap<PartKey, f64>,
) -> Option<Evaluation> {
    let library = &*ctx.library;
    let cache = library.intersections();
    let room = trial.room(id)?;

    let attached_to_host = trial
        .attached_to(&candidate.host)
        .is_some_and(|partner| partner.room == id && partner.mount == candidate.mount);
    if !attached_to_host {
        return None;
    }

    // The new room's own open mounts must still be closable...
    for mount in trial.open_mounts_of(id) {
        if let Some(terminal) = library.smallest_terminal_attachment(room.part(), &mount.mount) {
            let closer = Room::new(terminal.part, room.transform() * terminal.transform);
            if trial.intersects_any(&closer, cache, options.test_optional, Some(id)) {
                return None;
            }
        }
    }
    // ...and so must everyone else's.
    let placed = room.placed();
    let footprint = room.footprint();
    for mount in trial.open_mounts() {
        if mount.room == id {
            continue;
        }
        let Some(host) = trial.room(mount.room) else {
            continue;
        };
        if let Some(terminal) = library.smallest_terminal_attachment(host.part(), &mount.mount) {
            let closer = Room::new(terminal.part, host.transform() * terminal.transform);
            if closer.footprint().intersects(footprint)
                && cache.intersects(&closer.placed(), &placed, options.test_optional)
            {
                return None;
            }
        }
    }

    let error = *error_by_part
        .entry(candidate.part.key().clone())
        .or_insert_with(|| trial.compute_error(None));
    Some(Evaluation {
        open_mounts: trial.open_mount_count(),
        error,
    })
}

fn score_candidate(
    ctx: &GenerationContext,
    options: StepOptions,
    baseline: &Baseline,
    evaluation: Evaluation,
    candidate: &Candidate,
    step_salt: Salt,
) -> f64 {
    let settings = &ctx.settings;
    let growth = evaluation.open_mounts as f64 - baseline.open_mounts as f64;
    let improvement = baseline.error - evaluation.error;
    let jitter = ctx.seed.noise(
        step_salt
            .u64(SALT_JITTER)
            .str(candidate.part.key())
            .transform(candidate.transform)
            .finish(),
    );
    settings.growth_weight * growth_score(options.target_growth, growth, baseline.open_mounts)
        + settings.requirement_weight * improvement
        + settings.jitter * jitter
}

/// Scores a change of `growth` open mounts against the `target`.
///
/// The penalty is quadratic in the deviation, with an extra penalty for growing when
/// shrinking is wanted. It is divided by the number of open mounts when shrinking and
/// multiplied by its square root when growing, so that it stays comparable to the
/// other terms as the construction grows.
pub fn growth_score(target: f64, growth: f64, open_mounts: usize) -> f64 {
    if target.is_nan() {
        return 0.0;
    }
    let deviation = growth - target;
    let mut score = -(deviation * deviation);
    if target < 0.0 && growth > 0.0 {
        score -= 100.0;
    }
    let open = open_mounts.max(1) as f64;
    if target < 0.0 {
        score / open
    } else {
        score * open.sqrt()
    }
}

/// Grows a construction from the part `root`, placed at the origin.
///
/// Loads every part of the library first. See the [module documentation](self) for
/// the phases.
pub fn generate(ctx: &GenerationContext, root: &str) -> Result<Generated, GenError> {
    let library = &ctx.library;
    library.load_all();
    let root_part = library
        .load(root)
        .ok_or_else(|| GenError::UnknownPart(root.into()))?;
    let mut construction = Construction::new(root_part.cube_size(), ctx.seed.clone());
    construction.register_room(construction.generate_room(root_part, DiscreteTransform::IDENTITY))?;

    let settings = &ctx.settings;
    let mut report = GenerationReport::default();

    let mut growth = settings.initial_growth;
    let mut progress = Progress::new(&construction);
    while report.growing_steps < settings.growth_budget {
        ctx.check_cancelled()?;
        let options = StepOptions {
            target_growth: growth,
            test_optional: true,
        };
        if !step_construction(ctx, &mut construction, options)? {
            break;
        }
        report.growing_steps += 1;
        growth *= settings.growth_decay;
        if progress.stalled(&construction, settings.stall_window) {
            break;
        }
    }
    log::debug!(
        "grew {} rooms in {} steps, error {}",
        construction.room_count(),
        report.growing_steps,
        construction.compute_error(None)
    );

    let mut progress = Progress::new(&construction);
    while report.stabilizing_steps < settings.stabilize_steps {
        ctx.check_cancelled()?;
        let options = StepOptions {
            target_growth: 0.0,
            test_optional: true,
        };
        if !step_construction(ctx, &mut construction, options)? {
            break;
        }
        report.stabilizing_steps += 1;
        if progress.stalled(&construction, settings.stall_window) {
            break;
        }
    }

    report.closing_steps = close(ctx, &mut construction, true)?;
    if construction.open_mount_count() > 0 {
        // Relaxed validation may admit candidates which were rejected before.
        construction.clear_scanned();
        report.relaxed_steps = close(ctx, &mut construction, false)?;
    }

    report.rooms = construction.room_count();
    report.open_mounts = construction.open_mount_count();
    report.error = construction.compute_error(None);
    if report.closed() {
        log::debug!("generation finished: {report:?}");
    } else {
        log::warn!(
            "generation from {root:?} left {} mounts open: {:?}",
            report.open_mounts,
            construction.open_mounts()
        );
    }
    Ok(Generated {
        construction,
        report,
    })
}

/// Runs closing steps until no mounts are open, no step is possible, or the step limit
/// is reached. Returns the number of steps taken.
fn close(
    ctx: &GenerationContext,
    construction: &mut Construction,
    test_optional: bool,
) -> Result<usize, GenError> {
    let limit = 2 * construction.open_mount_count() + 2;
    let options = StepOptions {
        target_growth: ctx.settings.closing_growth,
        test_optional,
    };
    let mut steps = 0;
    while steps < limit && construction.open_mount_count() > 0 {
        ctx.check_cancelled()?;
        if !step_construction(ctx, construction, options)? {
            break;
        }
        steps += 1;
    }
    log::debug!(
        "closing (optional zones {}) took {steps} of at most {limit} steps; {} open",
        if test_optional { "enforced" } else { "ignored" },
        construction.open_mount_count()
    );
    Ok(steps)
}

/// Tracks whether the requirement error is still improving.
struct Progress {
    best: f64,
    since_improvement: usize,
}

impl Progress {
    fn new(construction: &Construction) -> Self {
        Self {
            best: construction.compute_error(None),
            since_improvement: 0,
        }
    }

    /// Records the current error; returns whether it has not improved for `window`
    /// consecutive calls.
    fn stalled(&mut self, construction: &Construction, window: usize) -> bool {
        let error = construction.compute_error(None);
        if error < self.best {
            self.best = error;
            self.since_improvement = 0;
        } else {
            self.since_improvement += 1;
        }
        self.since_improvement >= window
    }
}

/// Runs [`generate()`] for each job, in parallel if the `auto-threads` feature is
/// enabled. Results are in the same order as the jobs.
pub fn generate_batch(jobs: &[(GenerationContext, PartKey)]) -> Vec<Result<Generated, GenError>> {
    #[cfg(feature = "auto-threads")]
    let results = jobs
        .par_iter()
        .map(|(ctx, root)| generate(ctx, root))
        .collect();

    #[cfg(not(feature = "auto-threads"))]
    let results = jobs
        .iter()
        .map(|(ctx, root)| generate(ctx, root))
        .collect();

    results
}
