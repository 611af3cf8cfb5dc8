use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use PHASE_ZEN::{
    DescriptionError, FiniteStateMachine, FsmDescription, FsmState, StateBehavior, StateCore,
    StateStatus, StateTiming, StateType, unreachable_states, validate_description,
};

// --- 测试用的状态类型与描述 ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Mode {
    None,
    Idle,
    Moving,
    Obstacle,
    Locked,
}

impl StateType for Mode {
    const EMPTY: Self = Mode::None;
    const ALL: &'static [Self] = &[Mode::None, Mode::Idle, Mode::Moving, Mode::Obstacle, Mode::Locked];
}

type Log = Rc<RefCell<Vec<(Mode, &'static str)>>>;
type Script = Rc<dyn Fn(&mut StateCore<Mode>)>;

/// 记录每个钩子的调用
struct Recorder {
    log: Log,
    on_active: Option<Script>,
}

impl Recorder {
    fn record(&self, state: &StateCore<Mode>, hook: &'static str) {
        self.log.borrow_mut().push((state.state_type(), hook));
    }
}

impl StateBehavior<Mode> for Recorder {
    fn activate(&mut self, state: &mut StateCore<Mode>) {
        self.record(state, "activate");
    }

    fn process_enter(&mut self, state: &mut StateCore<Mode>) {
        self.record(state, "process_enter");
    }

    fn process_active(&mut self, state: &mut StateCore<Mode>) {
        self.record(state, "process_active");
        if let Some(script) = &self.on_active {
            script(state);
        }
    }

    fn process_exit(&mut self, state: &mut StateCore<Mode>) {
        self.record(state, "process_exit");
    }

    fn postprocess_enter(&mut self, state: &mut StateCore<Mode>) {
        self.record(state, "postprocess_enter");
    }

    fn preprocess_exit(&mut self, state: &mut StateCore<Mode>) {
        self.record(state, "preprocess_exit");
    }

    fn postprocess_exit(&mut self, state: &mut StateCore<Mode>) {
        self.record(state, "postprocess_exit");
    }
}

#[derive(Clone)]
struct Template {
    timing: StateTiming,
    transitions: Vec<Mode>,
    exit: Mode,
}

fn looping(transitions: &[Mode]) -> Template {
    Template {
        timing: StateTiming::looping(),
        transitions: transitions.to_vec(),
        exit: Mode::None,
    }
}

fn timed(secs: f32, exit: Mode, transitions: &[Mode]) -> Template {
    Template {
        timing: StateTiming::timed(secs),
        transitions: transitions.to_vec(),
        exit,
    }
}

struct TestDescription {
    initial: Mode,
    templates: HashMap<Mode, Template>,
    scripts: HashMap<Mode, Script>,
    mislabel: Option<(Mode, Mode)>,
    log: Log,
}

impl TestDescription {
    fn new(initial: Mode) -> Self {
        Self {
            initial,
            templates: HashMap::new(),
            scripts: HashMap::new(),
            mislabel: None,
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn state(mut self, mode: Mode, template: Template) -> Self {
        self.templates.insert(mode, template);
        self
    }

    fn script(mut self, mode: Mode, script: impl Fn(&mut StateCore<Mode>) + 'static) -> Self {
        self.scripts.insert(mode, Rc::new(script));
        self
    }
}

impl FsmDescription<Mode> for TestDescription {
    fn initial_state(&self) -> Mode {
        self.initial
    }

    fn create_state_from_type(&self, state_type: Mode) -> Option<FsmState<Mode>> {
        let template = self.templates.get(&state_type)?;
        let produced = match self.mislabel {
            Some((from, to)) if from == state_type => to,
            _ => state_type,
        };
        let behavior = Recorder {
            log: Rc::clone(&self.log),
            on_active: self.scripts.get(&state_type).cloned(),
        };
        Some(
            FsmState::new(produced, behavior)
                .with_timing(template.timing)
                .with_transitions(template.transitions.iter().copied())
                .with_exit_state(template.exit),
        )
    }
}

type Machine = FiniteStateMachine<Mode, TestDescription>;

fn idle_moving() -> TestDescription {
    TestDescription::new(Mode::Idle)
        .state(Mode::Idle, looping(&[Mode::Moving]))
        .state(Mode::Moving, timed(1.0, Mode::Idle, &[Mode::Idle, Mode::Obstacle]))
        .state(Mode::Obstacle, looping(&[Mode::Idle]))
}

fn started(description: TestDescription) -> Machine {
    let mut machine = Machine::new(description);
    machine.initialize();
    machine.activate_state();
    machine
}

// --- 测试用例 ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninitialized_machine_is_quiet() {
        let mut machine = Machine::new(idle_moving());

        assert_eq!(machine.current_state_type(), Mode::None);
        assert_eq!(machine.current_status(), StateStatus::None);
        assert!(!machine.try_change_state(Mode::Moving));
        assert!(!machine.try_set_next_state(Mode::Moving));

        machine.update(1.0);
        machine.activate_state();
        assert!(machine.current_state().is_none());
    }

    #[test]
    fn test_initialize_does_not_enter() {
        let mut machine = Machine::new(idle_moving());
        machine.initialize();

        assert_eq!(machine.current_state_type(), Mode::Idle);
        assert_eq!(machine.current_status(), StateStatus::None);

        // None 阶段的状态不随 update 推进
        machine.update(5.0);
        assert_eq!(machine.current_status(), StateStatus::None);
        assert_eq!(machine.current_state().map(|s| s.core().elapsed()), Some(0.0));
    }

    #[test]
    fn test_transition_only_to_listed_states() {
        let mut machine = started(idle_moving());

        assert!(!machine.try_change_state(Mode::Obstacle));
        assert!(!machine.try_change_state(Mode::Locked));
        machine.update(0.1);
        assert_eq!(machine.current_state_type(), Mode::Idle);
        assert_eq!(machine.current_status(), StateStatus::Active);

        assert!(machine.try_change_state(Mode::Moving));
        machine.update(0.1);
        assert_eq!(machine.current_state_type(), Mode::Moving);
    }

    #[test]
    fn test_loop_state_never_auto_exits() {
        let description = TestDescription::new(Mode::Idle).state(
            Mode::Idle,
            Template {
                timing: StateTiming::looping(),
                transitions: vec![Mode::Moving],
                exit: Mode::Moving,
            },
        );
        let mut machine = started(description);
        assert!(machine.current_state().is_some_and(|s| s.is_loop()));

        for _ in 0..1000 {
            machine.update(1.0);
        }
        assert_eq!(machine.current_state_type(), Mode::Idle);
        assert_eq!(machine.current_status(), StateStatus::Active);
    }

    #[test]
    fn test_zero_in_transition_promotes_in_same_tick() {
        let mut machine = started(idle_moving());
        assert_eq!(machine.current_status(), StateStatus::Enter);

        machine.update(0.01);
        assert_eq!(machine.current_status(), StateStatus::Active);
    }

    #[test]
    fn test_in_transition_time_gates_enter_phase() {
        let description = TestDescription::new(Mode::Idle).state(
            Mode::Idle,
            Template {
                timing: StateTiming::looping().with_in_transition(0.5),
                transitions: vec![],
                exit: Mode::None,
            },
        );
        let mut machine = started(description);

        machine.update(0.3);
        assert_eq!(machine.current_status(), StateStatus::Enter);
        machine.update(0.3);
        assert_eq!(machine.current_status(), StateStatus::Active);
    }

    #[test]
    fn test_timed_state_exits_to_exit_state() {
        let description = TestDescription::new(Mode::Moving)
            .state(Mode::Moving, timed(2.0, Mode::Idle, &[Mode::Idle]))
            .state(Mode::Idle, looping(&[Mode::Moving]));
        let mut machine = started(description);

        for _ in 0..4 {
            machine.update(0.5);
        }
        assert_eq!(machine.current_state_type(), Mode::Moving);
        assert_eq!(machine.current_status(), StateStatus::Active);

        machine.update(0.5);
        assert_eq!(machine.current_state_type(), Mode::Idle);
        assert_eq!(machine.current_status(), StateStatus::Enter);
    }

    #[test]
    fn test_idle_to_moving_and_back() {
        let mut machine = started(idle_moving());
        assert!(machine.try_change_state(Mode::Moving));

        for _ in 0..15 {
            machine.update(0.1);
        }
        assert_eq!(machine.current_state_type(), Mode::Idle);
    }

    #[test]
    fn test_hook_order_of_timed_state() {
        let description = TestDescription::new(Mode::Moving)
            .state(Mode::Moving, timed(1.0, Mode::Idle, &[Mode::Idle]))
            .state(Mode::Idle, looping(&[]));
        let log = Rc::clone(&description.log);
        let mut machine = started(description);

        machine.update(0.6);
        machine.update(0.6);

        let moving: Vec<&str> = log
            .borrow()
            .iter()
            .filter(|(mode, _)| *mode == Mode::Moving)
            .map(|(_, hook)| *hook)
            .collect();
        assert_eq!(
            moving,
            vec![
                "activate",
                "process_enter",
                "postprocess_enter",
                "process_active",
                "preprocess_exit",
                "process_exit",
                "postprocess_exit",
            ]
        );
        assert_eq!(log.borrow().last(), Some(&(Mode::Idle, "activate")));
    }

    #[test]
    fn test_out_transition_time_delays_handoff() {
        let description = TestDescription::new(Mode::Moving)
            .state(
                Mode::Moving,
                Template {
                    timing: StateTiming::timed(1.0).with_out_transition(0.5),
                    transitions: vec![Mode::Idle],
                    exit: Mode::Idle,
                },
            )
            .state(Mode::Idle, looping(&[]));
        let mut machine = started(description);

        machine.update(1.25);
        assert_eq!(machine.current_state_type(), Mode::Moving);
        assert_eq!(machine.current_status(), StateStatus::Exit);

        machine.update(0.25);
        assert_eq!(machine.current_status(), StateStatus::Exit);
        assert_eq!(machine.current_state().map(|s| s.core().elapsed_in_exit()), Some(0.25));

        machine.update(0.5);
        assert_eq!(machine.current_state_type(), Mode::Idle);
    }

    #[test]
    fn test_next_state_is_picked_up_after_exit() {
        let mut machine = started(idle_moving());
        assert!(machine.try_change_state(Mode::Moving));
        machine.update(0.1);
        assert_eq!(machine.current_state_type(), Mode::Moving);

        // 只暂存，不提前结束活动阶段
        assert!(machine.try_set_next_state(Mode::Obstacle));
        assert!(!machine.try_set_next_state(Mode::Locked));
        machine.update(0.5);
        assert_eq!(machine.current_state_type(), Mode::Moving);
        assert_eq!(
            machine.current_state().and_then(|s| s.next_state_type()),
            Some(Mode::Obstacle)
        );

        machine.update(0.6);
        assert_eq!(machine.current_state_type(), Mode::Obstacle);
    }

    #[test]
    fn test_change_before_activation_switches_immediately() {
        let mut machine = Machine::new(idle_moving());
        machine.initialize();

        assert!(machine.try_change_state(Mode::Moving));
        assert_eq!(machine.current_state_type(), Mode::Moving);
        assert_eq!(machine.current_status(), StateStatus::Enter);
    }

    #[test]
    fn test_prebuilt_instance_is_validated() {
        let mut machine = started(idle_moving());
        let locked = FsmState::new(
            Mode::Locked,
            Recorder {
                log: Rc::new(RefCell::new(Vec::new())),
                on_active: None,
            },
        );
        assert!(!machine.try_change_to(locked));

        let moving = machine.description().create_state_from_type(Mode::Moving);
        assert!(moving.is_some_and(|state| machine.try_change_to(state)));
    }

    #[test]
    fn test_reentered_state_is_a_fresh_instance() {
        let mut machine = started(idle_moving());
        machine.try_change_state(Mode::Moving);
        machine.update(0.1);
        let first_entry = machine.current_state().map(|s| s.core().enter_timestamp());

        for _ in 0..12 {
            machine.update(0.1);
        }
        assert_eq!(machine.current_state_type(), Mode::Idle);

        machine.try_change_state(Mode::Moving);
        machine.update(0.1);
        let state = machine.current_state().map(|s| (s.core().enter_timestamp(), s.core().elapsed()));
        assert_eq!(machine.current_state_type(), Mode::Moving);
        assert!(state.is_some_and(|(timestamp, elapsed)| {
            Some(timestamp) > first_entry && elapsed < 0.01
        }));
    }

    #[test]
    fn test_enter_timestamp_follows_machine_clock() {
        let mut machine = started(idle_moving());
        machine.update(0.25);
        machine.update(0.25);
        assert!(machine.try_change_state(Mode::Moving));
        machine.update(0.5);

        assert_eq!(machine.clock(), 1.0);
        assert_eq!(machine.current_state().map(|s| s.core().enter_timestamp()), Some(1.0));
    }

    #[test]
    fn test_state_can_request_its_own_successor() {
        let description = idle_moving().script(Mode::Idle, |state| {
            if state.elapsed() > 0.3 {
                state.request_change(Mode::Moving);
            }
        });
        let mut machine = started(description);

        machine.update(0.2);
        machine.update(0.2);
        assert_eq!(machine.current_state_type(), Mode::Idle);

        machine.update(0.1);
        assert_eq!(machine.current_state_type(), Mode::Moving);
    }

    #[test]
    fn test_illegal_request_from_state_is_ignored() {
        let description = idle_moving().script(Mode::Idle, |state| state.request_change(Mode::Obstacle));
        let mut machine = started(description);

        for _ in 0..5 {
            machine.update(0.1);
        }
        assert_eq!(machine.current_state_type(), Mode::Idle);
    }

    #[test]
    fn test_failed_initialize_clears_current_state() {
        let description = TestDescription::new(Mode::Locked)
            .state(Mode::Idle, looping(&[Mode::Moving]));
        let mut machine = Machine::new(description);

        machine.on_need_switch_state_type(Mode::Idle);
        assert_eq!(machine.current_state_type(), Mode::Idle);
        assert_eq!(machine.current_status(), StateStatus::Enter);

        assert!(machine.initialize().is_none());
        assert!(machine.current_state().is_none());
        assert_eq!(machine.current_state_type(), Mode::None);
    }

    #[test]
    fn test_unconstructible_exit_state_settles() {
        let description = TestDescription::new(Mode::Moving)
            .state(Mode::Moving, timed(1.0, Mode::Obstacle, &[]));
        let log = Rc::clone(&description.log);
        let mut machine = started(description);

        machine.update(1.5);
        assert_eq!(machine.current_state_type(), Mode::Moving);
        assert_eq!(machine.current_status(), StateStatus::None);

        machine.update(1.0);
        machine.update(1.0);
        let exits = log
            .borrow()
            .iter()
            .filter(|(_, hook)| *hook == "postprocess_exit")
            .count();
        assert_eq!(exits, 1);
    }

    #[test]
    fn test_negative_delta_is_clamped() {
        let mut machine = started(idle_moving());
        machine.update(0.5);
        machine.update(-1.0);

        assert_eq!(machine.clock(), 0.5);
        assert_eq!(machine.current_state().map(|s| s.core().elapsed()), Some(0.5));
    }

    #[test]
    fn test_shared_description_drives_independent_machines() {
        let description = Rc::new(idle_moving());
        let mut first = Machine::shared(Rc::clone(&description));
        let mut second = Machine::shared(description);
        for machine in [&mut first, &mut second] {
            machine.initialize();
            machine.activate_state();
        }

        first.try_change_state(Mode::Moving);
        first.update(0.1);
        second.update(0.1);

        assert_eq!(first.current_state_type(), Mode::Moving);
        assert_eq!(second.current_state_type(), Mode::Idle);
    }

    #[test]
    fn test_validation_accepts_complete_description() {
        let reachable = validate_description(&idle_moving()).unwrap();
        assert_eq!(reachable.len(), 3);
        assert!(!reachable.contains(&Mode::Locked));
        assert!(Machine::validated(idle_moving()).is_ok());
        assert_eq!(unreachable_states(&idle_moving()), vec![Mode::Locked]);
    }

    #[test]
    fn test_validation_reports_unconstructible_target() {
        let description = TestDescription::new(Mode::Idle)
            .state(Mode::Idle, looping(&[Mode::Moving]))
            .state(Mode::Moving, timed(1.0, Mode::Locked, &[]));

        assert_eq!(
            validate_description(&description).unwrap_err(),
            DescriptionError::Unconstructible(Mode::Locked)
        );
    }

    #[test]
    fn test_validation_reports_type_mismatch() {
        let mut description = idle_moving();
        description.mislabel = Some((Mode::Moving, Mode::Obstacle));

        assert_eq!(
            Machine::validated(description).err(),
            Some(DescriptionError::TypeMismatch {
                requested: Mode::Moving,
                produced: Mode::Obstacle,
            })
        );
    }

    #[test]
    fn test_validation_rejects_empty_states() {
        let empty_initial = TestDescription::new(Mode::None);
        assert_eq!(
            validate_description(&empty_initial).unwrap_err(),
            DescriptionError::EmptyInitialState
        );

        let empty_target = TestDescription::new(Mode::Idle).state(Mode::Idle, looping(&[Mode::None]));
        assert_eq!(
            validate_description(&empty_target).unwrap_err(),
            DescriptionError::TransitionToEmpty { from: Mode::Idle }
        );
    }
}
