//! Current-state holder

use super::{GameState, StateError, StateFactory};
use crate::context::EngineContext;
use crate::graphics::Surface;
use crate::scripting::Transition;
use tracing::{error, info};

/// Owns the current state and applies transitions
pub struct StateMachine {
    factory: StateFactory,
    current: Option<Box<dyn GameState>>,
}

impl StateMachine {
    pub fn new(factory: StateFactory) -> Self {
        Self {
            factory,
            current: None,
        }
    }

    pub fn factory_mut(&mut self) -> &mut StateFactory {
        &mut self.factory
    }

    /// Name of the current state
    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref().map(|state| state.name())
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    /// Stop the current state, then create and start the state `name`
    pub fn enter(&mut self, name: &str, ctx: &EngineContext) -> Result<(), StateError> {
        self.leave(ctx);
        let state = self.factory.create(name, &ctx.config)?;
        self.start(state, ctx)
    }

    /// Stop the current state, then start an already-built one
    pub fn enter_state(
        &mut self,
        state: Box<dyn GameState>,
        ctx: &EngineContext,
    ) -> Result<(), StateError> {
        self.leave(ctx);
        self.start(state, ctx)
    }

    fn start(&mut self, mut state: Box<dyn GameState>, ctx: &EngineContext) -> Result<(), StateError> {
        info!(state = state.name(), "Entering state");
        match state.init(ctx) {
            Ok(()) => {
                self.current = Some(state);
                Ok(())
            }
            Err(e) => {
                error!(state = state.name(), error = %e, "State failed to initialise");
                state.deinit(ctx);
                Err(e)
            }
        }
    }

    /// Deinitialise and drop the current state, if any
    pub fn leave(&mut self, ctx: &EngineContext) {
        if let Some(mut state) = self.current.take() {
            info!(state = state.name(), "Leaving state");
            state.deinit(ctx);
        }
    }

    /// Run one update of the current state
    pub fn update(&mut self, ctx: &EngineContext, surface: &mut Surface) -> Option<Transition> {
        self.current.as_mut()?.update(ctx, surface)
    }

    /// Apply a transition returned by `update`
    ///
    /// Switching to the current state keeps it running. A state that cannot
    /// be entered stops the engine.
    pub fn apply(&mut self, transition: Transition, ctx: &EngineContext) {
        match transition {
            Transition::Quit => ctx.frame.borrow_mut().request_quit(),
            Transition::Switch(name) => {
                if self.current_name() == Some(name.as_str()) {
                    return;
                }
                if let Err(e) = self.enter(&name, ctx) {
                    error!(state = %name, error = %e, "Unable to change state");
                    ctx.frame.borrow_mut().request_quit();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::io::MemorySource;
    use crate::windowing::HeadlessPlatform;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Native state that records lifecycle calls
    struct Probe {
        name: String,
        log: Rc<RefCell<Vec<String>>>,
        fail_init: bool,
    }

    impl GameState for Probe {
        fn name(&self) -> &str {
            &self.name
        }

        fn init(&mut self, _ctx: &EngineContext) -> Result<(), StateError> {
            self.log.borrow_mut().push(format!("init {}", self.name));
            if self.fail_init {
                return Err(StateError::UnknownState(self.name.clone()));
            }
            Ok(())
        }

        fn update(&mut self, _ctx: &EngineContext, _surface: &mut Surface) -> Option<Transition> {
            self.log.borrow_mut().push(format!("update {}", self.name));
            None
        }

        fn deinit(&mut self, _ctx: &EngineContext) {
            self.log.borrow_mut().push(format!("deinit {}", self.name));
        }
    }

    fn setup() -> (StateMachine, EngineContext, Rc<RefCell<Vec<String>>>) {
        let mut config = GameConfig::new();
        config.set("a", "type", "probe");
        config.set("b", "type", "probe");
        config.set("bad", "type", "probe");
        let ctx = EngineContext::new(
            config,
            Box::new(HeadlessPlatform::new(320, 240)),
            Box::new(MemorySource::new()),
        );

        let log = Rc::new(RefCell::new(Vec::new()));
        let mut factory = StateFactory::new();
        let shared = log.clone();
        factory.register("probe", move |name| {
            Box::new(Probe {
                name: name.to_string(),
                log: shared.clone(),
                fail_init: name == "bad",
            })
        });
        (StateMachine::new(factory), ctx, log)
    }

    #[test]
    fn test_switch_deinits_old_before_init_new() {
        let (mut machine, ctx, log) = setup();
        machine.enter("a", &ctx).unwrap();
        let mut surface = ctx.new_surface();
        machine.update(&ctx, &mut surface);
        machine.apply(Transition::Switch("b".into()), &ctx);
        machine.leave(&ctx);

        assert_eq!(
            *log.borrow(),
            vec!["init a", "update a", "deinit a", "init b", "deinit b"]
        );
        assert!(!machine.is_running());
    }

    #[test]
    fn test_switch_to_current_keeps_state() {
        let (mut machine, ctx, log) = setup();
        machine.enter("a", &ctx).unwrap();
        machine.apply(Transition::Switch("a".into()), &ctx);
        assert_eq!(*log.borrow(), vec!["init a"]);
        assert_eq!(machine.current_name(), Some("a"));
    }

    #[test]
    fn test_failed_init_is_deinited_and_quits() {
        let (mut machine, ctx, log) = setup();
        machine.enter("a", &ctx).unwrap();
        machine.apply(Transition::Switch("bad".into()), &ctx);

        assert_eq!(
            *log.borrow(),
            vec!["init a", "deinit a", "init bad", "deinit bad"]
        );
        assert!(!machine.is_running());
        assert!(ctx.quit_requested());
    }

    #[test]
    fn test_quit_transition_sets_flag() {
        let (mut machine, ctx, _log) = setup();
        machine.enter("a", &ctx).unwrap();
        machine.apply(Transition::Quit, &ctx);
        assert!(ctx.quit_requested());
        assert_eq!(machine.current_name(), Some("a"));
    }
}
