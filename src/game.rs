//! One game instance.
//!
//! `Game` wires the pieces together: the transaction log (which owns the
//! object manager), the scope bus, one decision provider per seat, the log
//! sink, presentation observers and the visibility filter. Rule execution
//! is driven by the sequencer; hosts may also execute commands directly.
//!
//! Events queued while a transaction is open are dispatched to scopes and
//! observers just before the outermost commit, so everything a scope does
//! in reaction is part of the same undo step.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::commands::{Command, CreateObjectCommand, ObjectController, TransactionLog, TransactionToken};
use crate::core::{
    EngineConfig, EngineError, EngineResult, LogSink, NullLogSink, ObjectId, PlayerId, PlayerMap,
};
use crate::flow::{DecisionProvider, FlowContext, MulliganPart, PassProvider, Sequencer, Step, TurnState};
use crate::objects::{GameEvent, ManagerSnapshot, ObjectManager};
use crate::properties::{ObjectKind, Property, PropertyRegistry, PropertyType};
use crate::scope::{EventBus, GameObjectScope, LandsPlayedCounter, ScopeContext, ScopeId, ScopeState};
use crate::visibility::{ObserverView, VisibilityFilter, ZoneVisibilityFilter};
use crate::zones::{Zone, ZonePosition};

type Observer = Box<dyn FnMut(&GameEvent)>;

/// The parts of a game the sequencer runs against.
pub(crate) struct GameCore {
    pub(crate) config: EngineConfig,
    pub(crate) log: TransactionLog,
    bus: EventBus,
    providers: PlayerMap<Box<dyn DecisionProvider>>,
    players: PlayerMap<ObjectId>,
    sink: Arc<dyn LogSink>,
    observers: Vec<Observer>,
}

impl GameCore {
    pub(crate) fn flow_context(&mut self, turn: TurnState) -> FlowContext<'_> {
        FlowContext::new(
            &mut self.log,
            &mut self.providers,
            &self.players,
            &*self.sink,
            &self.config,
            turn,
        )
    }

    /// Deliver every queued event to observers and scopes until the queue
    /// stays empty. Scopes spawned by handlers are initialised after the
    /// event that spawned them.
    pub(crate) fn dispatch_pending(&mut self) -> EngineResult<()> {
        loop {
            let events = self.log.manager_mut().drain_events();
            if events.is_empty() {
                return Ok(());
            }
            for event in &events {
                for observer in &mut self.observers {
                    observer(event);
                }
                let mut ctx = ScopeContext::new(&mut self.log, &*self.sink);
                self.bus.dispatch(event, &mut ctx)?;
                loop {
                    let spawned = ctx.take_spawned();
                    if spawned.is_empty() {
                        break;
                    }
                    for scope in spawned {
                        self.bus.init(scope, &mut ctx)?;
                    }
                }
            }
        }
    }

    /// Deliver queued events to observers only. Used after undo and redo,
    /// which replay recorded changes without running scope handlers.
    fn notify_observers(&mut self) {
        for event in self.log.manager_mut().drain_events() {
            for observer in &mut self.observers {
                observer(&event);
            }
        }
    }

    fn create(&mut self, command: CreateObjectCommand) -> EngineResult<ObjectId> {
        let controller: &mut dyn ObjectController = &mut self.log;
        controller.create(command)
    }

    fn init_scope(&mut self, scope: Box<dyn GameObjectScope>) -> EngineResult<ScopeId> {
        let mut ctx = ScopeContext::new(&mut self.log, &*self.sink);
        let id = self.bus.init(scope, &mut ctx)?;
        for spawned in ctx.take_spawned() {
            self.bus.init(spawned, &mut ctx)?;
        }
        Ok(id)
    }

    /// Run `work` in a transaction, dispatching its events before commit.
    fn transact<T>(&mut self, work: impl FnOnce(&mut Self) -> EngineResult<T>) -> EngineResult<T> {
        let outermost = !self.log.in_transaction();
        let token = self.log.begin_transaction();
        let result = work(self).and_then(|value| {
            if outermost {
                self.dispatch_pending()?;
            }
            Ok(value)
        });
        match result {
            Ok(value) => {
                self.log.end_transaction(true, token)?;
                Ok(value)
            }
            Err(err) => {
                self.log.end_transaction(false, token)?;
                Err(err)
            }
        }
    }
}

impl fmt::Debug for GameCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameCore")
            .field("config", &self.config)
            .field("log", &self.log)
            .field("bus", &self.bus)
            .field("players", &self.players)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

/// What a test or host puts into a library, hand or battlefield.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardSpec {
    pub name: String,
    pub is_land: bool,
    pub is_creature: bool,
    pub power: i64,
    pub toughness: i64,
}

impl CardSpec {
    pub fn land(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_land: true, is_creature: false, power: 0, toughness: 0 }
    }

    pub fn creature(name: impl Into<String>, power: i64, toughness: i64) -> Self {
        Self { name: name.into(), is_land: false, is_creature: true, power, toughness }
    }

    /// A card that is neither land nor creature.
    pub fn spell(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_land: false, is_creature: false, power: 0, toughness: 0 }
    }
}

/// A single game.
///
/// ```
/// use ccg_rules::core::EngineConfig;
/// use ccg_rules::game::{CardSpec, Game};
/// use ccg_rules::properties::PropertyRegistry;
///
/// let mut game = Game::new(EngineConfig::default(), PropertyRegistry::shared(), Vec::new()).unwrap();
/// let p0 = ccg_rules::core::PlayerId::new(0);
/// game.add_card_to_library(p0, &CardSpec::land("Forest")).unwrap();
/// game.run_turn().unwrap();
/// assert_eq!(game.turn().turn, 2);
/// ```
pub struct Game {
    core: GameCore,
    sequencer: Sequencer,
    filter: Box<dyn VisibilityFilter>,
}

impl Game {
    /// Set up players, zones and per-player bookkeeping.
    ///
    /// Missing decision providers default to `PassProvider`. Setup is not
    /// part of the undo history.
    pub fn new(
        config: EngineConfig,
        registry: Arc<PropertyRegistry>,
        providers: Vec<Box<dyn DecisionProvider>>,
    ) -> EngineResult<Self> {
        config.validate()?;
        if providers.len() > config.player_count {
            return Err(EngineError::InvalidConfig(format!(
                "{} decision providers for {} players",
                providers.len(),
                config.player_count
            )));
        }
        let count = config.player_count;
        let mut supplied = providers.into_iter();
        let providers = PlayerMap::new(count, |_| {
            supplied.next().unwrap_or_else(|| Box::new(PassProvider) as Box<dyn DecisionProvider>)
        });

        let mut manager = ObjectManager::new(registry, &config);
        for player in PlayerId::all(count) {
            manager.init_zone(Zone::library(player));
            manager.init_zone(Zone::hand(player));
            manager.init_zone(Zone::graveyard(player));
        }
        manager.init_zone(Zone::BATTLEFIELD);
        manager.init_zone(Zone::EXILE);
        manager.init_zone(Zone::STACK);
        let std = manager.standard();

        let mut core = GameCore {
            log: TransactionLog::new(manager),
            bus: EventBus::new(),
            providers,
            players: PlayerMap::with_value(count, ObjectId(0)),
            sink: Arc::new(NullLogSink),
            observers: Vec::new(),
            config,
        };

        for player in PlayerId::all(count) {
            let command = CreateObjectCommand::new(ObjectKind::PLAYER)
                .with_value(std.seat, Some(player))
                .with_value(std.life, core.config.starting_life)
                .with_value(std.max_hand_size, core.config.max_hand_size)
                .with_value(std.lands_per_turn, core.config.lands_per_turn);
            let object = core.create(command)?;
            core.players[player] = object;
            core.init_scope(Box::new(LandsPlayedCounter::new(player, object)))?;
        }
        core.log.manager_mut().drain_events();
        core.log.clear_history();
        info!(players = count, "game created");

        Ok(Self {
            core,
            sequencer: Sequencer::new(),
            filter: Box::new(ZoneVisibilityFilter),
        })
    }

    #[must_use]
    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.core.sink = sink;
        self
    }

    #[must_use]
    pub fn with_visibility_filter(mut self, filter: impl VisibilityFilter + 'static) -> Self {
        self.filter = Box::new(filter);
        self
    }

    /// Call `observer` for every event the game dispatches, including the
    /// changes replayed by undo and redo.
    pub fn subscribe(&mut self, observer: impl FnMut(&GameEvent) + 'static) {
        self.core.observers.push(Box::new(observer));
    }

    // === Accessors ===

    #[must_use]
    pub fn manager(&self) -> &ObjectManager {
        self.core.log.manager()
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.core.config
    }

    #[must_use]
    pub fn player_object(&self, player: PlayerId) -> ObjectId {
        self.core.players[player]
    }

    #[must_use]
    pub fn turn(&self) -> TurnState {
        self.sequencer.turn()
    }

    /// Parts executed so far, retries included.
    #[must_use]
    pub fn parts_run(&self) -> u64 {
        self.sequencer.parts_run()
    }

    pub fn get<T: PropertyType>(&self, object: ObjectId, property: Property<T>) -> EngineResult<T> {
        self.manager().get_value(object, property)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.core.log.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.core.log.can_redo()
    }

    /// Descriptions of undoable transactions, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.core.log.history().collect()
    }

    // === Cards ===

    pub fn add_card_to_library(&mut self, owner: PlayerId, card: &CardSpec) -> EngineResult<ObjectId> {
        self.add_card(owner, card, Zone::library(owner))
    }

    pub fn add_card_to_hand(&mut self, owner: PlayerId, card: &CardSpec) -> EngineResult<ObjectId> {
        self.add_card(owner, card, Zone::hand(owner))
    }

    pub fn add_card_to_battlefield(&mut self, owner: PlayerId, card: &CardSpec) -> EngineResult<ObjectId> {
        self.add_card(owner, card, Zone::BATTLEFIELD)
    }

    fn add_card(&mut self, owner: PlayerId, card: &CardSpec, zone: Zone) -> EngineResult<ObjectId> {
        let std = self.manager().standard();
        let command = CreateObjectCommand::new(ObjectKind::CARD)
            .with_value(std.name, card.name.clone())
            .with_value(std.owner, Some(owner))
            .with_value(std.controller, Some(owner))
            .with_value(std.is_land, card.is_land)
            .with_value(std.is_creature, card.is_creature)
            .with_value(std.power, card.power)
            .with_value(std.toughness, card.toughness)
            .in_zone(zone, ZonePosition::Top);
        self.core.transact(|core| core.create(command))
    }

    // === Flow ===

    /// Run opening hands and mulligans for every seat, starting with the
    /// first player.
    pub fn start(&mut self) -> EngineResult<()> {
        self.ensure_no_transaction()?;
        info!("game started");
        let first = self.sequencer.turn().active;
        for player in first.turn_order(self.core.config.player_count) {
            self.sequencer.schedule(Box::new(MulliganPart::new(player)));
        }
        self.sequencer.run_queue(&mut self.core)
    }

    /// Run the current turn to completion and pass it on.
    pub fn run_turn(&mut self) -> EngineResult<()> {
        self.ensure_no_transaction()?;
        self.sequencer.run_turn(&mut self.core)
    }

    /// Run a single step of the current turn.
    pub fn run_step(&mut self, step: Step) -> EngineResult<()> {
        self.ensure_no_transaction()?;
        self.sequencer.run_step(&mut self.core, step)
    }

    fn ensure_no_transaction(&self) -> EngineResult<()> {
        if self.core.log.in_transaction() {
            return Err(EngineError::TransactionOpen);
        }
        Ok(())
    }

    // === Commands ===

    /// Execute a command. Outside a transaction the command forms its own
    /// undo step and its events are dispatched right away; inside one they
    /// wait for the outermost commit.
    pub fn execute(&mut self, command: Box<dyn Command>) -> EngineResult<()> {
        if self.core.log.in_transaction() {
            return self.core.log.execute(command);
        }
        self.core.transact(|core| core.log.execute(command))
    }

    pub fn apply(&mut self, command: impl Command + 'static) -> EngineResult<()> {
        self.execute(Box::new(command))
    }

    pub fn begin_transaction(&mut self) -> TransactionToken {
        self.core.log.begin_transaction()
    }

    /// Commit or cancel the innermost transaction. Committing the outermost
    /// one first dispatches its events; if a scope fails, the whole
    /// transaction is cancelled and the error returned.
    pub fn end_transaction(&mut self, commit: bool, token: TransactionToken) -> EngineResult<()> {
        if commit && token.depth() == 1 {
            if let Err(err) = self.core.dispatch_pending() {
                self.core.log.end_transaction(false, token)?;
                return Err(err);
            }
        }
        self.core.log.end_transaction(commit, token)
    }

    pub fn undo(&mut self) -> EngineResult<()> {
        self.core.log.undo()?;
        self.core.notify_observers();
        Ok(())
    }

    pub fn redo(&mut self) -> EngineResult<()> {
        self.core.log.redo()?;
        self.core.notify_observers();
        Ok(())
    }

    // === Scopes ===

    /// Initialise a scope. Activating it and whatever its `on_init` changes
    /// form one undo step; undoing it leaves the scope without a state.
    pub fn add_scope(&mut self, scope: impl GameObjectScope + 'static) -> EngineResult<ScopeId> {
        let scope: Box<dyn GameObjectScope> = Box::new(scope);
        let id = self.core.transact(|core| core.init_scope(scope))?;
        debug!(scope = %id, "scope added");
        Ok(id)
    }

    /// End a scope. Undo makes it active again.
    pub fn end_scope(&mut self, id: ScopeId) -> EngineResult<()> {
        self.core.transact(|core| {
            let mut ctx = ScopeContext::new(&mut core.log, &*core.sink);
            core.bus.uninit(id, &mut ctx)
        })
    }

    #[must_use]
    pub fn scope_state(&self, id: ScopeId) -> Option<ScopeState> {
        self.manager().scope_state(id)
    }

    #[must_use]
    pub fn active_scopes(&self) -> usize {
        self.manager().active_scopes()
    }

    // === Views ===

    /// What `observer` (or a spectator, for `None`) can see.
    pub fn view_for(&self, observer: Option<PlayerId>) -> EngineResult<ObserverView> {
        ObserverView::build(self.manager(), &*self.filter, observer)
    }

    #[must_use]
    pub fn snapshot(&self) -> ManagerSnapshot {
        self.manager().snapshot()
    }

    pub fn fingerprint(&self) -> EngineResult<Vec<u8>> {
        self.manager().fingerprint()
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("core", &self.core)
            .field("sequencer", &self.sequencer)
            .finish_non_exhaustive()
    }
}
