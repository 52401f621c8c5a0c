//! The game session: owns all state and fires every timer.

use std::collections::VecDeque;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sso_core::{
    Achievements, Coord, Effects, Grid, Ship, ShipClass, ShipStatus, StatChange, UpgradeKind,
};

use crate::clock::Clock;
use crate::config::GameConfig;
use crate::error::{GameError, GameResult, Rejection};
use crate::journal::{Journal, LogKind};
use crate::narrator::{
    EventOutcome, InteractiveEvent, NarrativeResult, Narrator, Request, RequestKind, Response,
    ScanOracle, ScanResult, Ticket,
};
use crate::notify::{NotificationKind, Notifications};
use crate::persistence::{SNAPSHOT_VERSION, Snapshot, StateStore};
use crate::travel::{PendingEvent, TravelInfo, TravelPhase, travel_duration};

/// What happened to a delivered response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The response was applied.
    Applied,
    /// The response's context is gone; it was dropped.
    Stale,
}

fn reject<T>(rejection: Rejection) -> Result<T, Rejection> {
    log::debug!("action rejected: {rejection}");
    Err(rejection)
}

/// A running game.
///
/// Player actions change state immediately and return a [`Rejection`] when
/// they are not allowed. Time only moves in [`update`](Self::update). Text
/// and scan outcomes are requested through [`take_requests`](Self::take_requests)
/// and handed back with [`deliver`](Self::deliver), or both at once with
/// [`pump`](Self::pump).
#[derive(Debug)]
pub struct GameSession {
    config: GameConfig,
    clock: Box<dyn Clock>,
    store: Box<dyn StateStore>,
    rng: StdRng,
    ship: Ship,
    grid: Grid,
    achievements: Achievements,
    journal: Journal,
    notifications: Notifications,
    phase: TravelPhase,
    selected: Coord,
    generation: u64,
    next_ticket: u64,
    requests: VecDeque<Request>,
    outstanding: Vec<(Ticket, RequestKind)>,
    autosave_at: Option<u64>,
}

impl GameSession {
    /// Start a new game with a freshly generated world.
    pub fn new(
        config: GameConfig,
        clock: Box<dyn Clock>,
        store: Box<dyn StateStore>,
    ) -> GameResult<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let grid = Grid::generate(config.grid_width, config.grid_height, config.start, &mut rng)?;
        let ship = Ship::new(config.start);
        let mut session = Self::assemble(config, clock, store, rng, ship, grid);

        let now = session.now();
        let start = session.config.start;
        session.journal.push(
            LogKind::System,
            format!("A new voyage begins at {start}."),
            now,
        );
        session.mark_dirty(now);
        log::info!(
            "new game: {}x{} grid, seed {}",
            session.config.grid_width,
            session.config.grid_height,
            session.config.seed
        );
        Ok(session)
    }

    /// Resume the game saved under the configured key, or start a new one.
    ///
    /// A save that cannot be read or parsed is not fatal: a new game starts
    /// and a warning notification says why.
    pub fn load_or_new(
        config: GameConfig,
        clock: Box<dyn Clock>,
        store: Box<dyn StateStore>,
    ) -> GameResult<Self> {
        config.validate()?;
        let doc = match store.get(&config.save_key) {
            Ok(doc) => doc,
            Err(e) => return Self::fresh_after_failure(config, clock, store, e.into()),
        };
        let Some(json) = doc else {
            return Self::new(config, clock, store);
        };
        let snapshot = match Snapshot::from_json(&json) {
            Ok(snapshot) => snapshot,
            Err(e) => return Self::fresh_after_failure(config, clock, store, e.into()),
        };
        let position = Coord::new(snapshot.ship.x, snapshot.ship.y);
        if !snapshot.grid.contains(position) {
            let err = GameError::Core(sso_core::CoreError::OutOfBounds(position));
            return Self::fresh_after_failure(config, clock, store, err);
        }
        Ok(Self::restore(config, clock, store, snapshot))
    }

    fn fresh_after_failure(
        config: GameConfig,
        clock: Box<dyn Clock>,
        store: Box<dyn StateStore>,
        err: GameError,
    ) -> GameResult<Self> {
        log::warn!("could not load saved game: {err}");
        let mut session = Self::new(config, clock, store)?;
        let now = session.now();
        session.journal.push(
            LogKind::Warning,
            format!("The old log could not be read ({err})."),
            now,
        );
        session.notifications.push(
            NotificationKind::Warning,
            "Saved game could not be loaded; starting a new voyage",
            now,
        );
        Ok(session)
    }

    fn restore(
        config: GameConfig,
        clock: Box<dyn Clock>,
        store: Box<dyn StateStore>,
        snapshot: Snapshot,
    ) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        let Snapshot {
            mut ship,
            grid,
            achievements,
            log: entries,
            next_log_id,
            travel,
            ..
        } = snapshot;
        let travel = travel.filter(|t| grid.contains(t.destination));
        ship.status = if travel.is_some() {
            ShipStatus::Traveling
        } else {
            ShipStatus::Idle
        };

        let mut session = Self::assemble(config, clock, store, rng, ship, grid);
        session.achievements = achievements;
        session.journal.restore(entries, next_log_id);
        session.bump_generation();

        let now = session.now();
        if let Some(travel) = travel {
            session.phase = TravelPhase::Traveling {
                travel: travel.resumed(now),
                next_roll_at: now.saturating_add(session.config.interrupt_interval_ms),
            };
        }
        session
            .journal
            .push(LogKind::System, "Voyage resumed from the last save.", now);
        log::info!(
            "loaded saved game at {} (level {})",
            session.ship.position(),
            session.ship.level
        );
        session
    }

    fn assemble(
        config: GameConfig,
        clock: Box<dyn Clock>,
        store: Box<dyn StateStore>,
        rng: StdRng,
        ship: Ship,
        grid: Grid,
    ) -> Self {
        Self {
            journal: Journal::new(config.max_log_entries),
            notifications: Notifications::new(config.notification_ttl_ms),
            selected: ship.position(),
            config,
            clock,
            store,
            rng,
            ship,
            grid,
            achievements: Achievements::new(),
            phase: TravelPhase::Idle,
            generation: 1,
            next_ticket: 1,
            requests: VecDeque::new(),
            outstanding: Vec::new(),
            autosave_at: None,
        }
    }

    // --- Persistence ---

    /// Capture the current state. A leg in progress is stored with its
    /// remaining time; a pending event is not stored.
    pub fn snapshot(&self) -> Snapshot {
        let now = self.now();
        let travel = match &self.phase {
            TravelPhase::Idle => None,
            TravelPhase::Traveling { travel, .. } => Some(TravelInfo {
                remaining_ms: travel.remaining_at(now),
                ..travel.clone()
            }),
            TravelPhase::EventPending { travel, .. } => Some(travel.clone()),
        };
        Snapshot {
            version: SNAPSHOT_VERSION,
            saved_at: Some(Utc::now()),
            ship: self.ship.clone(),
            grid: self.grid.clone(),
            achievements: self.achievements.clone(),
            log: self.journal.last(self.config.persisted_log_entries).to_vec(),
            next_log_id: self.journal.next_id(),
            travel,
        }
    }

    /// Write a snapshot to the store now.
    ///
    /// A failure is logged and shown as a notification before it is returned.
    pub fn save(&mut self) -> GameResult<()> {
        let now = self.now();
        self.autosave_at = None;
        let result = self
            .snapshot()
            .to_json()
            .and_then(|json| self.store.set(&self.config.save_key, &json));
        match result {
            Ok(()) => {
                log::info!("game saved under '{}'", self.config.save_key);
                Ok(())
            }
            Err(e) => {
                log::warn!("save failed: {e}");
                self.notifications
                    .push(NotificationKind::Error, format!("Save failed: {e}"), now);
                Err(e.into())
            }
        }
    }

    // --- Player actions ---

    /// Head for sector `(x, y)`. Returns the leg's duration.
    ///
    /// Redirecting mid-leg discards the progress made so far and starts a
    /// new leg from the ship's sector.
    pub fn set_course(&mut self, x: i32, y: i32) -> Result<u64, Rejection> {
        let target = Coord::new(x, y);
        if !self.grid.contains(target) {
            return reject(Rejection::OutOfBounds(target));
        }
        if self.phase.is_event_pending() {
            return reject(Rejection::EventPending);
        }
        if self.phase.travel().is_some_and(|t| t.destination == target) {
            return reject(Rejection::AlreadyEnRoute(target));
        }
        let origin = self.ship.position();
        if origin == target {
            return reject(Rejection::AlreadyHere(target));
        }

        let now = self.now();
        let duration = travel_duration(
            origin,
            target,
            self.config.travel_ms_per_square,
            self.ship.upgrades.engine_multiplier(),
        );
        let redirect = !self.phase.is_idle();
        self.bump_generation();
        self.phase = TravelPhase::Traveling {
            travel: TravelInfo::new(origin, target, now, duration),
            next_roll_at: now.saturating_add(self.config.interrupt_interval_ms),
        };
        self.ship.status = ShipStatus::Traveling;
        self.selected = target;

        let verb = if redirect { "Course changed" } else { "Course set" };
        self.journal.push(
            LogKind::Travel,
            format!("{verb} for {target}. ETA {:.0} s.", duration as f64 / 1000.0),
            now,
        );
        log::info!("course {origin} -> {target}, {duration} ms");
        self.mark_dirty(now);
        Ok(duration)
    }

    /// Answer the event on screen, by choice text or 1-based number.
    /// Returns the choice as offered.
    pub fn choose(&mut self, input: &str) -> Result<String, Rejection> {
        let TravelPhase::EventPending {
            travel,
            event: PendingEvent::AwaitingChoice { event },
        } = &self.phase
        else {
            return reject(Rejection::NoEvent);
        };
        let Some(choice) = event.find_choice(input).map(str::to_string) else {
            return reject(Rejection::InvalidChoice(input.trim().to_string()));
        };
        let travel = travel.clone();
        let event = event.clone();

        let now = self.now();
        let ticket = self.issue(|ticket| Request::ResolveChoice {
            ticket,
            description: event.description.clone(),
            choice: choice.clone(),
        });
        self.journal
            .push(LogKind::Event, format!("Orders given: {choice}."), now);
        self.phase = TravelPhase::EventPending {
            travel,
            event: PendingEvent::Resolving {
                ticket,
                event,
                choice: choice.clone(),
            },
        };
        self.mark_dirty(now);
        Ok(choice)
    }

    /// Launch a probe into the current sector.
    pub fn scan(&mut self) -> Result<Ticket, Rejection> {
        if self.phase.is_event_pending() {
            return reject(Rejection::EventPending);
        }
        if !self.phase.is_idle() {
            return reject(Rejection::Traveling);
        }
        let position = self.ship.position();
        let kind = match self.grid.get(position) {
            Ok(sector) => sector.kind,
            Err(_) => return reject(Rejection::OutOfBounds(position)),
        };
        if !self.ship.use_scan() {
            return reject(Rejection::NoScans);
        }

        let now = self.now();
        let ticket = self.issue(|ticket| Request::Scan { ticket, kind });
        self.journal.push(
            LogKind::Scan,
            format!("Probe launched into the {kind} at {position}."),
            now,
        );
        self.mark_dirty(now);
        Ok(ticket)
    }

    /// Buy the next level of a ship system. Returns the new level.
    pub fn upgrade(&mut self, kind: UpgradeKind) -> Result<u8, Rejection> {
        let level_before = self.ship.level;
        let level = match self.ship.purchase_upgrade(kind) {
            Ok(level) => level,
            Err(e) => return reject(e.into()),
        };
        let now = self.now();
        self.journal.push(
            LogKind::Upgrade,
            format!("{kind} upgraded to level {level}."),
            now,
        );
        self.notifications.push(
            NotificationKind::Success,
            format!("{kind} level {level}"),
            now,
        );
        log::info!("upgraded {kind} to level {level}");
        self.after_mutation(now, level_before);
        Ok(level)
    }

    /// Change the ship's look.
    pub fn set_ship_class(&mut self, class: ShipClass) {
        let now = self.now();
        self.ship.class = class;
        self.journal.push(
            LogKind::System,
            format!("The ship now flies as a {class}."),
            now,
        );
        self.mark_dirty(now);
    }

    /// Highlight a sector in the UI.
    pub fn select_sector(&mut self, x: i32, y: i32) -> Result<(), Rejection> {
        let coord = Coord::new(x, y);
        if !self.grid.contains(coord) {
            return reject(Rejection::OutOfBounds(coord));
        }
        self.selected = coord;
        Ok(())
    }

    // --- Time ---

    /// Fire every deadline that is due: notification expiry, interrupt
    /// rolls, arrival and autosave.
    pub fn update(&mut self) {
        let now = self.now();
        self.notifications.expire(now);
        self.advance_travel(now);
        if self.autosave_at.is_some_and(|at| at <= now) {
            log::debug!("autosave due at {now}");
            if self.save().is_err() {
                log::debug!("autosave skipped until the next change");
            }
        }
    }

    /// The earliest clock time at which [`update`](Self::update) has work.
    pub fn next_deadline(&self) -> Option<u64> {
        let travel = match &self.phase {
            TravelPhase::Traveling {
                travel,
                next_roll_at,
            } => Some(travel.arrives_at().min(*next_roll_at)),
            _ => None,
        };
        [travel, self.autosave_at, self.notifications.next_expiry()]
            .into_iter()
            .flatten()
            .min()
    }

    fn advance_travel(&mut self, now: u64) {
        loop {
            let TravelPhase::Traveling {
                travel,
                next_roll_at,
            } = &self.phase
            else {
                return;
            };
            let arrives_at = travel.arrives_at();
            let roll_at = *next_roll_at;

            if arrives_at <= now && arrives_at <= roll_at {
                self.arrive(arrives_at);
                return;
            }
            if roll_at > now {
                return;
            }
            if self.rng.random_bool(self.config.interrupt_chance) {
                self.interrupt(roll_at);
                return;
            }
            log::debug!("interrupt roll at {roll_at}: all clear");
            if let TravelPhase::Traveling { next_roll_at, .. } = &mut self.phase {
                *next_roll_at = roll_at.saturating_add(self.config.interrupt_interval_ms);
            }
        }
    }

    fn interrupt(&mut self, at: u64) {
        let TravelPhase::Traveling { mut travel, .. } = std::mem::take(&mut self.phase) else {
            return;
        };
        travel.remaining_ms = travel.remaining_at(at);
        log::info!(
            "travel to {} interrupted, {} ms remaining",
            travel.destination,
            travel.remaining_ms
        );
        let ticket = self.issue(|ticket| Request::InteractiveEvent { ticket });
        self.phase = TravelPhase::EventPending {
            travel,
            event: PendingEvent::Generating { ticket },
        };
        self.journal.push(
            LogKind::Event,
            "Sensors flag a disturbance ahead. All stop.",
            at,
        );
        self.notifications
            .push(NotificationKind::Warning, "Travel interrupted", at);
        self.mark_dirty(at);
    }

    fn arrive(&mut self, at: u64) {
        let travel = match std::mem::take(&mut self.phase) {
            TravelPhase::Traveling { travel, .. } | TravelPhase::EventPending { travel, .. } => {
                travel
            }
            TravelPhase::Idle => return,
        };
        let destination = travel.destination;
        let (first, kind) = match self.grid.get_mut(destination) {
            Ok(sector) => (sector.explore(), sector.kind),
            Err(e) => {
                log::warn!("arrival outside the grid: {e}");
                self.ship.status = ShipStatus::Idle;
                return;
            }
        };

        let level_before = self.ship.level;
        self.ship.move_to(destination);
        self.ship.status = ShipStatus::Idle;
        self.selected = destination;
        self.journal
            .push(LogKind::Travel, format!("Arrived at {destination}."), at);
        if first {
            self.journal.push(
                LogKind::Discovery,
                format!("Charted a new {kind} at {destination}."),
                at,
            );
        }
        self.ship.add_xp(self.config.exploration_xp);
        log::info!("arrived at {destination} ({kind})");
        self.after_mutation(at, level_before);
        self.issue(|ticket| Request::SectorNarrative {
            ticket,
            kind,
            coord: destination,
        });
    }

    fn resume(&mut self, travel: TravelInfo, now: u64) {
        log::debug!(
            "resuming travel to {} with {} ms left",
            travel.destination,
            travel.remaining_ms
        );
        self.phase = TravelPhase::Traveling {
            travel: travel.resumed(now),
            next_roll_at: now.saturating_add(self.config.interrupt_interval_ms),
        };
        self.advance_travel(now);
    }

    // --- Collaborator requests ---

    /// Hand over every queued request. Their tickets stay outstanding
    /// until a response is delivered or the generation moves on.
    pub fn take_requests(&mut self) -> Vec<Request> {
        self.requests.drain(..).collect()
    }

    /// Number of requests issued but not yet answered.
    pub fn outstanding_requests(&self) -> usize {
        self.outstanding.len()
    }

    /// Apply a collaborator's response.
    ///
    /// Responses from an older generation, for unknown tickets, or whose
    /// kind does not match the request are dropped.
    pub fn deliver(&mut self, ticket: Ticket, response: Response) -> Delivery {
        if ticket.generation != self.generation {
            log::debug!(
                "dropping response #{} from generation {} (now {})",
                ticket.id,
                ticket.generation,
                self.generation
            );
            return Delivery::Stale;
        }
        let kind = response.kind();
        let Some(index) = self
            .outstanding
            .iter()
            .position(|(t, k)| *t == ticket && *k == kind)
        else {
            log::debug!("dropping unexpected {kind:?} response #{}", ticket.id);
            return Delivery::Stale;
        };
        self.outstanding.remove(index);

        let now = self.now();
        let delivery = match response {
            Response::SectorNarrative(result) => self.apply_narrative(result, now),
            Response::InteractiveEvent(result) => self.apply_event(ticket, result, now),
            Response::ResolveChoice(result) => self.apply_outcome(ticket, result, now),
            Response::Scan(result) => self.apply_scan(result, now),
        };
        if delivery == Delivery::Applied {
            self.mark_dirty(now);
        }
        delivery
    }

    /// Fulfil every queued request against `narrator`, including requests
    /// raised by the responses themselves. Returns how many were applied.
    pub fn pump<N>(&mut self, narrator: &mut N) -> usize
    where
        N: Narrator + ScanOracle + ?Sized,
    {
        let mut applied = 0;
        loop {
            let batch = self.take_requests();
            if batch.is_empty() {
                return applied;
            }
            for request in batch {
                let response = request.fulfil(narrator);
                if self.deliver(request.ticket(), response) == Delivery::Applied {
                    applied += 1;
                }
            }
        }
    }

    fn apply_narrative(&mut self, result: NarrativeResult<String>, now: u64) -> Delivery {
        match result {
            Ok(text) => {
                self.journal.push_typing(LogKind::Narrative, text, now);
            }
            Err(e) => {
                log::warn!("sector narrative failed: {e}");
                self.journal.push(
                    LogKind::Warning,
                    "The sensor logs come back garbled.",
                    now,
                );
            }
        }
        Delivery::Applied
    }

    fn apply_event(
        &mut self,
        ticket: Ticket,
        result: NarrativeResult<Option<InteractiveEvent>>,
        now: u64,
    ) -> Delivery {
        let TravelPhase::EventPending {
            travel,
            event: PendingEvent::Generating { ticket: expected },
        } = &self.phase
        else {
            return Delivery::Stale;
        };
        if *expected != ticket {
            return Delivery::Stale;
        }
        let travel = travel.clone();

        match result {
            Ok(Some(event)) if !event.choices.is_empty() => {
                self.journal
                    .push_typing(LogKind::Event, event.description.clone(), now);
                self.notifications.push(
                    NotificationKind::Info,
                    "An event awaits your decision",
                    now,
                );
                self.phase = TravelPhase::EventPending {
                    travel,
                    event: PendingEvent::AwaitingChoice { event },
                };
            }
            other => {
                if let Err(e) = &other {
                    log::warn!("interactive event failed: {e}");
                }
                self.journal.push(
                    LogKind::Event,
                    "The disturbance fades before it can be identified. Resuming course.",
                    now,
                );
                self.resume(travel, now);
            }
        }
        Delivery::Applied
    }

    fn apply_outcome(
        &mut self,
        ticket: Ticket,
        result: NarrativeResult<Option<EventOutcome>>,
        now: u64,
    ) -> Delivery {
        let TravelPhase::EventPending {
            travel,
            event: PendingEvent::Resolving {
                ticket: expected, ..
            },
        } = &self.phase
        else {
            return Delivery::Stale;
        };
        if *expected != ticket {
            return Delivery::Stale;
        }
        let travel = travel.clone();

        match result {
            Ok(Some(outcome)) => {
                let level_before = self.ship.level;
                let change = self.apply_scaled(outcome.effects);
                self.journal
                    .push_typing(LogKind::Event, outcome.outcome, now);
                if change != StatChange::default() {
                    self.journal.push(LogKind::Event, change.to_string(), now);
                }
                self.after_mutation(now, level_before);
            }
            other => {
                if let Err(e) = &other {
                    log::warn!("event resolution failed: {e}");
                }
                self.journal.push(
                    LogKind::Event,
                    "The moment passes without consequence. Resuming course.",
                    now,
                );
            }
        }
        self.resume(travel, now);
        Delivery::Applied
    }

    fn apply_scan(&mut self, result: NarrativeResult<Option<ScanResult>>, now: u64) -> Delivery {
        match result {
            Ok(Some(found)) => {
                let level_before = self.ship.level;
                let change = self.apply_scaled(found.effects);
                self.journal
                    .push_typing(LogKind::Scan, found.description, now);
                self.journal
                    .push(LogKind::Scan, format!("Scan complete: {change}."), now);
                self.ship.add_xp(self.config.scan_xp);
                self.after_mutation(now, level_before);
            }
            other => {
                if let Err(e) = &other {
                    log::warn!("scan failed: {e}");
                }
                self.journal.push(
                    LogKind::Scan,
                    "The probe returns nothing useful.",
                    now,
                );
            }
        }
        Delivery::Applied
    }

    fn apply_scaled(&mut self, effects: Effects) -> StatChange {
        let scaled = effects.with_extraction(self.ship.upgrades.extraction_multiplier());
        self.ship.apply_effects(&scaled)
    }

    fn issue(&mut self, make: impl FnOnce(Ticket) -> Request) -> Ticket {
        let ticket = Ticket {
            id: self.next_ticket,
            generation: self.generation,
        };
        self.next_ticket += 1;
        let request = make(ticket);
        log::debug!("issued {:?} request #{}", request.kind(), ticket.id);
        self.outstanding.push((ticket, request.kind()));
        self.requests.push_back(request);
        ticket
    }

    fn bump_generation(&mut self) {
        self.generation += 1;
        self.requests.clear();
        self.outstanding.clear();
    }

    // --- Bookkeeping ---

    fn after_mutation(&mut self, at: u64, level_before: u32) {
        for id in self.achievements.check(&mut self.ship, &self.grid) {
            self.journal.push(
                LogKind::Achievement,
                format!("Achievement unlocked: {} (+{} XP)", id.title(), id.xp_reward()),
                at,
            );
            self.notifications.push(
                NotificationKind::Achievement,
                format!("Achievement unlocked: {}", id.title()),
                at,
            );
            log::info!("achievement unlocked: {}", id.as_str());
        }
        if self.ship.level > level_before {
            let level = self.ship.level;
            self.journal.push(
                LogKind::Upgrade,
                format!("Reached level {level}. Scan charges restored."),
                at,
            );
            self.notifications
                .push(NotificationKind::LevelUp, format!("Level {level}!"), at);
            log::info!("level up: {level}");
        }
        self.mark_dirty(at);
    }

    fn mark_dirty(&mut self, at: u64) {
        self.autosave_at = Some(at.saturating_add(self.config.autosave_delay_ms));
    }

    // --- Accessors ---

    /// Current session clock time.
    pub fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    /// The session's configuration.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The ship.
    pub fn ship(&self) -> &Ship {
        &self.ship
    }

    /// The world.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Achievement progress.
    pub fn achievements(&self) -> &Achievements {
        &self.achievements
    }

    /// The captain's log.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Active notifications.
    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    /// The travel state machine.
    pub fn phase(&self) -> &TravelPhase {
        &self.phase
    }

    /// The current leg, if any.
    pub fn travel(&self) -> Option<&TravelInfo> {
        self.phase.travel()
    }

    /// The event waiting for a choice, if any.
    pub fn active_event(&self) -> Option<&InteractiveEvent> {
        match &self.phase {
            TravelPhase::EventPending {
                event: PendingEvent::AwaitingChoice { event },
                ..
            } => Some(event),
            _ => None,
        }
    }

    /// The highlighted sector.
    pub fn selected_sector(&self) -> Coord {
        self.selected
    }

    /// The current request generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Fraction of the current leg covered. Frozen while an event is pending.
    pub fn travel_progress(&self) -> Option<f64> {
        match &self.phase {
            TravelPhase::Idle => None,
            TravelPhase::Traveling { travel, .. } => Some(travel.progress(self.now())),
            TravelPhase::EventPending { travel, .. } => Some(travel.captured_progress()),
        }
    }

    /// Where to draw the ship: its sector when parked, otherwise a point on
    /// the current leg.
    pub fn interpolated_position(&self) -> (f64, f64) {
        match (self.phase.travel(), self.travel_progress()) {
            (Some(travel), Some(t)) => travel.point_at(t),
            _ => (f64::from(self.ship.x), f64::from(self.ship.y)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::narrator::NarrativeError;
    use crate::persistence::{MemoryStore, PersistError, PersistResult};
    use proptest::prelude::{
        Just, Strategy, TestCaseError, any, prop_assert, prop_assert_eq, prop_oneof, proptest,
    };
    use sso_core::{AchievementId, Owner};

    #[derive(Debug, Default)]
    struct Script {
        event: Option<InteractiveEvent>,
        fail_events: bool,
        outcome: Effects,
        scan: Option<ScanResult>,
    }

    impl Narrator for Script {
        fn sector_event(
            &mut self,
            kind: sso_core::SectorKind,
            coord: Coord,
        ) -> NarrativeResult<String> {
            Ok(format!("{kind} at {coord}"))
        }

        fn interactive_event(&mut self) -> NarrativeResult<Option<InteractiveEvent>> {
            if self.fail_events {
                return Err(NarrativeError::Unavailable("offline".to_string()));
            }
            Ok(self.event.clone())
        }

        fn resolve_choice(
            &mut self,
            _description: &str,
            choice: &str,
        ) -> NarrativeResult<Option<EventOutcome>> {
            Ok(Some(EventOutcome {
                outcome: format!("You {choice}."),
                effects: self.outcome,
            }))
        }
    }

    impl ScanOracle for Script {
        fn scan_result(&mut self, _kind: sso_core::SectorKind) -> NarrativeResult<Option<ScanResult>> {
            Ok(self.scan.clone())
        }
    }

    #[derive(Debug)]
    struct BrokenStore;

    impl StateStore for BrokenStore {
        fn get(&self, _key: &str) -> PersistResult<Option<String>> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> PersistResult<()> {
            Err(PersistError::Io(std::io::Error::other("disk full")))
        }
    }

    fn start(config: GameConfig) -> (GameSession, ManualClock, MemoryStore) {
        let clock = ManualClock::new(0);
        let store = MemoryStore::new();
        let session =
            GameSession::new(config, Box::new(clock.clone()), Box::new(store.clone())).unwrap();
        (session, clock, store)
    }

    fn calm() -> GameConfig {
        GameConfig::default().with_interrupt_chance(0.0)
    }

    fn derelict() -> InteractiveEvent {
        InteractiveEvent {
            description: "A derelict drifts past.".to_string(),
            choices: vec!["Board it".to_string(), "Ignore it".to_string()],
        }
    }

    fn count(session: &GameSession, kind: LogKind, prefix: &str) -> usize {
        session
            .journal()
            .entries()
            .iter()
            .filter(|e| e.kind == kind && e.text.starts_with(prefix))
            .count()
    }

    #[test]
    fn new_game_starts_parked_at_start() {
        let (s, _, _) = start(calm());
        assert_eq!(s.ship().position(), Coord::new(5, 5));
        assert!(s.phase().is_idle());
        assert!(s.grid().get(Coord::new(5, 5)).unwrap().explored);
        assert_eq!(s.grid().explored_count(), 1);
        assert_eq!(s.selected_sector(), Coord::new(5, 5));
    }

    #[test]
    fn one_square_arrives_after_thirty_seconds() {
        let (mut s, clock, _) = start(calm());
        assert_eq!(s.set_course(6, 5), Ok(30_000));
        assert!(s.ship().is_traveling());

        clock.advance(29_999);
        s.update();
        assert_eq!(s.ship().position(), Coord::new(5, 5));
        assert!(s.ship().is_traveling());

        clock.advance(1);
        s.update();
        assert_eq!(s.ship().position(), Coord::new(6, 5));
        assert!(!s.ship().is_traveling());
        let sector = s.grid().get(Coord::new(6, 5)).unwrap();
        assert!(sector.explored);
        assert_eq!(sector.owner, Owner::Player);
        // 10 for exploring plus 25 for explorer_1
        assert_eq!(s.ship().xp, 35);
        assert!(s.achievements().is_unlocked(AchievementId::Explorer1));
    }

    #[test]
    fn arrival_requests_narrative() {
        let (mut s, clock, _) = start(calm());
        s.set_course(6, 5).unwrap();
        clock.advance(30_000);
        s.update();
        let requests = s.take_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].kind(), RequestKind::SectorNarrative);

        let response = requests[0].fulfil(&mut Script::default());
        assert_eq!(s.deliver(requests[0].ticket(), response), Delivery::Applied);
        let last = s.journal().entries().last().unwrap();
        assert_eq!(last.kind, LogKind::Narrative);
        assert!(last.typing);
    }

    #[test]
    fn hull_upgrade_costs_and_raises_cap() {
        let (mut s, _, _) = start(calm());
        assert_eq!(s.upgrade(UpgradeKind::HullPlating), Ok(1));
        assert_eq!(s.ship().resources, 50);
        assert_eq!(s.ship().max_hull, 110);
        assert_eq!(s.ship().hull, 100);
        assert!(s.achievements().is_unlocked(AchievementId::FirstUpgrade));
    }

    #[test]
    fn upgrade_without_resources_is_rejected() {
        let (mut s, _, _) = start(calm());
        s.upgrade(UpgradeKind::HullPlating).unwrap();
        let before = s.ship().clone();
        assert!(matches!(
            s.upgrade(UpgradeKind::HullPlating),
            Err(Rejection::Upgrade(_))
        ));
        assert_eq!(s.ship(), &before);
    }

    #[test]
    fn explorer_1_awarded_once() {
        let (mut s, clock, _) = start(calm());
        s.set_course(6, 5).unwrap();
        clock.advance(30_000);
        s.update();
        s.set_course(7, 5).unwrap();
        clock.advance(30_000);
        s.update();
        assert_eq!(s.ship().position(), Coord::new(7, 5));
        assert_eq!(s.ship().xp, 45);
        assert_eq!(count(&s, LogKind::Achievement, "Achievement unlocked"), 1);
    }

    #[test]
    fn course_rejections() {
        let (mut s, _, _) = start(calm());
        assert_eq!(
            s.set_course(10, 0),
            Err(Rejection::OutOfBounds(Coord::new(10, 0)))
        );
        assert_eq!(
            s.set_course(5, 5),
            Err(Rejection::AlreadyHere(Coord::new(5, 5)))
        );
        let generation = s.generation();
        s.set_course(6, 5).unwrap();
        assert_eq!(s.generation(), generation + 1);
        assert_eq!(
            s.set_course(6, 5),
            Err(Rejection::AlreadyEnRoute(Coord::new(6, 5)))
        );
        assert_eq!(s.generation(), generation + 1);
    }

    #[test]
    fn redirect_replaces_leg_without_double_arrival() {
        let (mut s, clock, _) = start(calm());
        s.set_course(6, 5).unwrap();
        clock.advance(10_000);
        assert_eq!(s.set_course(5, 7), Ok(60_000));

        clock.set(30_000);
        s.update();
        assert_eq!(s.ship().position(), Coord::new(5, 5));
        assert!(s.ship().is_traveling());

        clock.set(70_000);
        s.update();
        assert_eq!(s.ship().position(), Coord::new(5, 7));
        assert!(!s.grid().get(Coord::new(6, 5)).unwrap().explored);
        assert_eq!(count(&s, LogKind::Travel, "Arrived"), 1);

        clock.set(200_000);
        s.update();
        assert_eq!(count(&s, LogKind::Travel, "Arrived"), 1);
    }

    #[test]
    fn arrival_beats_roll_at_same_instant() {
        let (mut s, clock, _) = start(GameConfig::default().with_interrupt_chance(1.0));
        s.set_course(6, 5).unwrap();
        clock.advance(30_000);
        s.update();
        assert!(s.phase().is_idle());
        assert_eq!(s.ship().position(), Coord::new(6, 5));
    }

    #[test]
    fn interrupt_choose_and_resume() {
        let config = GameConfig::default()
            .with_interrupt_chance(1.0)
            .with_interrupt_interval_ms(50_000);
        let (mut s, clock, _) = start(config);
        let mut narrator = Script {
            event: Some(derelict()),
            outcome: Effects {
                resources: 20,
                ..Effects::default()
            },
            ..Script::default()
        };
        assert_eq!(s.set_course(8, 5), Ok(90_000));

        clock.advance(50_000);
        s.update();
        assert!(s.phase().is_event_pending());
        assert_eq!(s.travel().unwrap().remaining_ms, 40_000);
        assert_eq!(s.set_course(1, 1), Err(Rejection::EventPending));
        assert_eq!(s.scan(), Err(Rejection::EventPending));
        assert_eq!(s.choose("1"), Err(Rejection::NoEvent));

        s.pump(&mut narrator);
        assert_eq!(s.active_event(), Some(&derelict()));
        assert!((s.travel_progress().unwrap() - 5.0 / 9.0).abs() < 1e-9);

        clock.advance(5_000);
        assert_eq!(s.choose("3"), Err(Rejection::InvalidChoice("3".to_string())));
        assert_eq!(s.choose("ignore IT"), Ok("Ignore it".to_string()));
        s.pump(&mut narrator);

        assert_eq!(s.ship().resources, 120);
        let travel = s.travel().unwrap();
        assert_eq!(travel.started_at, 55_000);
        assert_eq!(travel.arrives_at(), 95_000);

        clock.set(95_000);
        s.update();
        assert_eq!(s.ship().position(), Coord::new(8, 5));
        assert!(s.phase().is_idle());
    }

    #[test]
    fn failed_event_resumes_travel() {
        let config = GameConfig::default()
            .with_interrupt_chance(1.0)
            .with_interrupt_interval_ms(50_000);
        let (mut s, clock, _) = start(config);
        let mut narrator = Script {
            fail_events: true,
            ..Script::default()
        };
        s.set_course(8, 5).unwrap();
        clock.advance(50_000);
        s.update();
        s.pump(&mut narrator);
        assert!(matches!(s.phase(), TravelPhase::Traveling { .. }));
        assert_eq!(s.travel().unwrap().arrives_at(), 90_000);
        assert_eq!(
            count(&s, LogKind::Event, "The disturbance fades"),
            1
        );
    }

    #[test]
    fn scan_applies_effects_and_xp() {
        let (mut s, _, _) = start(calm());
        let mut narrator = Script {
            scan: Some(ScanResult {
                description: "Ore.".to_string(),
                effects: Effects {
                    resources: 40,
                    hull: -150,
                    ..Effects::default()
                },
            }),
            ..Script::default()
        };
        s.scan().unwrap();
        assert_eq!(s.ship().scans, 2);
        s.pump(&mut narrator);
        assert_eq!(s.ship().resources, 140);
        assert_eq!(s.ship().hull, 0);
        assert_eq!(s.ship().xp, 5);
    }

    #[test]
    fn empty_scan_gives_no_xp() {
        let (mut s, _, _) = start(calm());
        s.scan().unwrap();
        s.pump(&mut Script::default());
        assert_eq!(s.ship().xp, 0);
        assert_eq!(count(&s, LogKind::Scan, "The probe returns nothing"), 1);
    }

    #[test]
    fn scan_rejections() {
        let (mut s, _, _) = start(calm());
        for _ in 0..3 {
            s.scan().unwrap();
        }
        assert_eq!(s.scan(), Err(Rejection::NoScans));
        s.set_course(6, 5).unwrap();
        assert_eq!(s.scan(), Err(Rejection::Traveling));
    }

    #[test]
    fn scan_result_after_departure_is_stale() {
        let (mut s, _, _) = start(calm());
        let ticket = s.scan().unwrap();
        let request = s.take_requests().remove(0);
        s.set_course(6, 5).unwrap();
        assert_eq!(s.outstanding_requests(), 0);

        let response = Response::Scan(Ok(Some(ScanResult {
            description: "Late.".to_string(),
            effects: Effects {
                resources: 500,
                ..Effects::default()
            },
        })));
        assert_eq!(request.ticket(), ticket);
        assert_eq!(s.deliver(ticket, response), Delivery::Stale);
        assert_eq!(s.ship().resources, 100);
        assert_eq!(s.ship().scans, 2);
    }

    #[test]
    fn mismatched_response_kind_is_stale() {
        let (mut s, _, _) = start(calm());
        let ticket = s.scan().unwrap();
        let wrong = Response::SectorNarrative(Ok("?".to_string()));
        assert_eq!(s.deliver(ticket, wrong), Delivery::Stale);
        assert_eq!(s.outstanding_requests(), 1);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let (mut s, clock, store) = start(calm());
        s.set_course(6, 5).unwrap();
        clock.advance(30_000);
        s.update();
        s.upgrade(UpgradeKind::ScannerProbes).unwrap();
        s.save().unwrap();

        let loaded = GameSession::load_or_new(
            calm(),
            Box::new(ManualClock::new(0)),
            Box::new(store.clone()),
        )
        .unwrap();
        assert_eq!(loaded.ship(), s.ship());
        assert_eq!(loaded.grid(), s.grid());
        assert_eq!(loaded.achievements(), s.achievements());
        assert_eq!(loaded.selected_sector(), Coord::new(6, 5));
        assert!(loaded.generation() > 1);
        assert!(loaded.journal().len() <= 21);
    }

    #[test]
    fn travel_resumes_after_load() {
        let (mut s, clock, store) = start(calm());
        s.set_course(6, 5).unwrap();
        clock.advance(10_000);
        s.save().unwrap();

        let clock = ManualClock::new(1_000);
        let mut loaded = GameSession::load_or_new(
            calm(),
            Box::new(clock.clone()),
            Box::new(store.clone()),
        )
        .unwrap();
        assert!(loaded.ship().is_traveling());
        assert_eq!(loaded.travel().unwrap().arrives_at(), 21_000);

        clock.set(21_000);
        loaded.update();
        assert_eq!(loaded.ship().position(), Coord::new(6, 5));
    }

    #[test]
    fn leg_with_nothing_left_completes_on_load() {
        let (s, _, store) = start(calm());
        let mut snapshot = s.snapshot();
        let mut travel = TravelInfo::new(Coord::new(5, 5), Coord::new(5, 6), 0, 30_000);
        travel.remaining_ms = 0;
        snapshot.travel = Some(travel);
        snapshot.ship.status = ShipStatus::Idle;
        let mut store = store;
        store
            .set("soul-ship-odyssey", &snapshot.to_json().unwrap())
            .unwrap();

        let mut loaded =
            GameSession::load_or_new(calm(), Box::new(ManualClock::new(0)), Box::new(store))
                .unwrap();
        assert!(loaded.ship().is_traveling());
        loaded.update();
        assert_eq!(loaded.ship().position(), Coord::new(5, 6));
    }

    #[test]
    fn unreadable_save_starts_fresh_with_warning() {
        let mut store = MemoryStore::new();
        store
            .set("soul-ship-odyssey", r#"{"version": 99}"#)
            .unwrap();
        let s = GameSession::load_or_new(calm(), Box::new(ManualClock::new(0)), Box::new(store))
            .unwrap();
        assert_eq!(s.ship().position(), Coord::new(5, 5));
        assert!(
            s.notifications()
                .active()
                .iter()
                .any(|n| n.kind == NotificationKind::Warning)
        );
    }

    #[test]
    fn malformed_grid_in_save_starts_fresh() {
        let (mut s, _, mut store) = start(calm());
        s.save().unwrap();
        let json = store.get("soul-ship-odyssey").unwrap().unwrap();
        let mut doc: serde_json::Value = serde_json::from_str(&json).unwrap();
        doc["grid"]["sectors"].as_array_mut().unwrap().truncate(1);
        store
            .set("soul-ship-odyssey", &doc.to_string())
            .unwrap();

        let mut s = GameSession::load_or_new(calm(), Box::new(ManualClock::new(0)), Box::new(store))
            .unwrap();
        assert_eq!(s.grid().sectors().len(), 100);
        assert!(
            s.notifications()
                .active()
                .iter()
                .any(|n| n.kind == NotificationKind::Warning)
        );
        assert!(s.scan().is_ok());
    }

    #[test]
    fn interrupt_lines_are_autosaved() {
        let config = GameConfig::default()
            .with_interrupt_chance(1.0)
            .with_interrupt_interval_ms(90_000);
        let (mut s, clock, store) = start(config);
        s.set_course(9, 9).unwrap();
        clock.advance(60_000);
        s.update();
        assert!(store.get("soul-ship-odyssey").unwrap().is_some());
        assert_eq!(s.next_deadline(), Some(90_000));

        clock.advance(30_000);
        s.update();
        assert!(s.phase().is_event_pending());
        assert_eq!(s.pump(&mut Script::default()), 1);
        assert!(s.ship().is_traveling());

        clock.advance(59_999);
        s.update();
        let saved = store.get("soul-ship-odyssey").unwrap().unwrap();
        assert!(!saved.contains("Sensors flag a disturbance"));

        clock.advance(1);
        s.update();
        let saved = store.get("soul-ship-odyssey").unwrap().unwrap();
        assert!(saved.contains("Sensors flag a disturbance"));
        assert!(saved.contains("The disturbance fades"));
    }

    #[test]
    fn autosave_after_idle_delay() {
        let (mut s, clock, store) = start(calm());
        s.upgrade(UpgradeKind::HullPlating).unwrap();
        clock.advance(59_999);
        s.update();
        assert_eq!(store.get("soul-ship-odyssey").unwrap(), None);

        clock.advance(1);
        s.update();
        assert!(store.get("soul-ship-odyssey").unwrap().is_some());
        assert_eq!(s.next_deadline(), None);
    }

    #[test]
    fn failed_autosave_notifies() {
        let clock = ManualClock::new(0);
        let mut s =
            GameSession::new(calm(), Box::new(clock.clone()), Box::new(BrokenStore)).unwrap();
        clock.advance(60_000);
        s.update();
        assert!(
            s.notifications()
                .active()
                .iter()
                .any(|n| n.kind == NotificationKind::Error && n.message.starts_with("Save failed"))
        );
        assert!(s.save().is_err());
    }

    #[test]
    fn notifications_expire_on_update() {
        let (mut s, clock, _) = start(calm());
        s.upgrade(UpgradeKind::EngineEfficiency).unwrap();
        assert!(!s.notifications().active().is_empty());
        clock.advance(5_000);
        s.update();
        assert!(s.notifications().active().is_empty());
    }

    #[test]
    fn next_deadline_tracks_travel() {
        let (mut s, _, _) = start(calm());
        s.set_course(7, 5).unwrap();
        assert_eq!(s.next_deadline(), Some(30_000));
    }

    #[test]
    fn engine_upgrade_shortens_travel() {
        let (mut s, _, _) = start(calm());
        s.upgrade(UpgradeKind::EngineEfficiency).unwrap();
        assert_eq!(s.set_course(6, 5), Ok(25_500));
    }

    #[test]
    fn interpolated_position_moves_along_leg() {
        let (mut s, clock, _) = start(calm());
        assert_eq!(s.interpolated_position(), (5.0, 5.0));
        s.set_course(7, 5).unwrap();
        clock.advance(30_000);
        let (x, y) = s.interpolated_position();
        assert!((x - 6.0).abs() < 1e-9);
        assert!((y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn table_narrator_drives_a_voyage() {
        let (mut s, clock, _) = start(GameConfig::default().with_interrupt_chance(1.0));
        let mut narrator = crate::narrator::TableNarrator::new(3);
        s.set_course(9, 9).unwrap();
        for _ in 0..50 {
            clock.advance(30_000);
            s.update();
            s.pump(&mut narrator);
            if s.active_event().is_some() {
                s.choose("1").unwrap();
                s.pump(&mut narrator);
            }
            if s.phase().is_idle() {
                break;
            }
        }
        assert_eq!(s.ship().position(), Coord::new(9, 9));
        assert!(s.ship().hull <= s.ship().max_hull);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Course(i32, i32),
        Advance(u64),
        Choose(usize),
        Scan,
        Upgrade(usize),
        Pump,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0i32..10, 0i32..10).prop_map(|(x, y)| Op::Course(x, y)),
            (0u64..120_000).prop_map(Op::Advance),
            (1usize..4).prop_map(Op::Choose),
            Just(Op::Scan),
            (0usize..4).prop_map(Op::Upgrade),
            Just(Op::Pump),
        ]
    }

    fn check_invariants(s: &GameSession) -> Result<(), TestCaseError> {
        prop_assert_eq!(s.ship().is_traveling(), s.travel().is_some());
        prop_assert!(s.ship().hull <= s.ship().max_hull);
        prop_assert!(s.grid().contains(s.ship().position()));
        let event_requests = s
            .outstanding
            .iter()
            .filter(|(_, k)| {
                matches!(k, RequestKind::InteractiveEvent | RequestKind::ResolveChoice)
            })
            .count();
        prop_assert!(event_requests <= 1);
        if event_requests == 1 || s.active_event().is_some() {
            prop_assert!(s.phase().is_event_pending());
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn session_invariants_hold(
            seed in any::<u64>(),
            ops in proptest::collection::vec(op(), 0..40),
        ) {
            let config = GameConfig::default()
                .with_seed(seed)
                .with_interrupt_chance(0.5)
                .with_interrupt_interval_ms(10_000);
            let (mut s, clock, _) = start(config);
            let mut narrator = Script {
                event: Some(derelict()),
                outcome: Effects { hull: -40, energy: -10, resources: 30, souls: 1 },
                scan: Some(ScanResult {
                    description: "Debris.".to_string(),
                    effects: Effects { hull: -25, energy: 0, resources: 20, souls: 0 },
                }),
                ..Script::default()
            };
            for op in ops {
                match op {
                    Op::Course(x, y) => {
                        let _ = s.set_course(x, y);
                    }
                    Op::Advance(ms) => {
                        clock.advance(ms);
                        s.update();
                    }
                    Op::Choose(n) => {
                        let _ = s.choose(&n.to_string());
                    }
                    Op::Scan => {
                        let _ = s.scan();
                    }
                    Op::Upgrade(i) => {
                        let _ = s.upgrade(UpgradeKind::ALL[i]);
                    }
                    Op::Pump => {
                        s.pump(&mut narrator);
                    }
                }
                check_invariants(&s)?;
            }
        }
    }
}
