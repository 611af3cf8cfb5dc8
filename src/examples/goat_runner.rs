//! 山羊跑酷示例
//! 演示状态机与事件总线的组合：碰撞、加速事件经总线投递，由状态机按帧消化

use std::cell::RefCell;
use std::rc::Rc;

use tracing::info;

use crate::core::{
    FiniteStateMachine, FsmDescription, FsmState, StateBehavior, StateCore, StateTiming, StateType,
};
use crate::error::DescriptionError;
use crate::events::{EventAction, EventManager, HostObject};
use crate::utils::TimeController;

/// 山羊的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoatState {
    None,
    Idle,
    Run,
    SlowDown,
    Obstacle,
}

impl StateType for GoatState {
    const EMPTY: Self = GoatState::None;
    const ALL: &'static [Self] = &[
        GoatState::None,
        GoatState::Idle,
        GoatState::Run,
        GoatState::SlowDown,
        GoatState::Obstacle,
    ];
}

/// 撞上障碍物
#[derive(Debug, Clone, Copy, Default)]
pub struct ObstacleCollided {
    pub lane: u8,
}

/// 拾取加速道具
#[derive(Debug, Clone, Copy, Default)]
pub struct BoostPicked {
    pub strength: f32,
}

pub const RUN_SPEED: f32 = 6.0;

/// 跑者的运动数据，由各状态的行为共享
#[derive(Debug, Default)]
pub struct Runner {
    pub speed: f32,
    pub distance: f32,
    pub collisions: u32,
    pub boosts: u32,
}

/// 以固定速度前进
struct Moving {
    runner: Rc<RefCell<Runner>>,
    speed: f32,
    last_elapsed: f32,
}

impl Moving {
    fn advance(&mut self, state: &StateCore<GoatState>) {
        let dt = state.elapsed() - self.last_elapsed;
        self.last_elapsed = state.elapsed();
        let mut runner = self.runner.borrow_mut();
        runner.distance += runner.speed * dt;
    }
}

impl StateBehavior<GoatState> for Moving {
    fn activate(&mut self, _state: &mut StateCore<GoatState>) {
        // 起步阶段半速
        self.runner.borrow_mut().speed = self.speed * 0.5;
    }

    fn process_enter(&mut self, state: &mut StateCore<GoatState>) {
        self.advance(state);
    }

    fn postprocess_enter(&mut self, _state: &mut StateCore<GoatState>) {
        self.runner.borrow_mut().speed = self.speed;
    }

    fn process_active(&mut self, state: &mut StateCore<GoatState>) {
        self.advance(state);
    }

    fn process_exit(&mut self, state: &mut StateCore<GoatState>) {
        self.advance(state);
    }
}

struct Standing {
    runner: Rc<RefCell<Runner>>,
    stunned: bool,
}

impl StateBehavior<GoatState> for Standing {
    fn activate(&mut self, _state: &mut StateCore<GoatState>) {
        let mut runner = self.runner.borrow_mut();
        runner.speed = 0.0;
        if self.stunned {
            runner.collisions += 1;
        }
    }

    fn process_enter(&mut self, _state: &mut StateCore<GoatState>) {}

    fn process_active(&mut self, _state: &mut StateCore<GoatState>) {}

    fn process_exit(&mut self, _state: &mut StateCore<GoatState>) {}
}

/// 山羊状态机的描述
pub struct GoatDescription {
    runner: Rc<RefCell<Runner>>,
}

impl FsmDescription<GoatState> for GoatDescription {
    fn initial_state(&self) -> GoatState {
        GoatState::Idle
    }

    fn create_state_from_type(&self, state_type: GoatState) -> Option<FsmState<GoatState>> {
        let runner = Rc::clone(&self.runner);
        let state = match state_type {
            GoatState::None => return None,
            GoatState::Idle => FsmState::new(
                state_type,
                Standing {
                    runner,
                    stunned: false,
                },
            )
            .with_transitions([GoatState::Run]),
            GoatState::Run => FsmState::new(
                state_type,
                Moving {
                    runner,
                    speed: RUN_SPEED,
                    last_elapsed: 0.0,
                },
            )
            .with_timing(StateTiming::looping().with_in_transition(0.5))
            .with_transitions([GoatState::SlowDown, GoatState::Obstacle, GoatState::Idle]),
            GoatState::SlowDown => FsmState::new(
                state_type,
                Moving {
                    runner,
                    speed: RUN_SPEED * 0.4,
                    last_elapsed: 0.0,
                },
            )
            .with_timing(StateTiming::timed(1.5))
            .with_transitions([GoatState::Run, GoatState::Obstacle])
            .with_exit_state(GoatState::Run),
            GoatState::Obstacle => FsmState::new(
                state_type,
                Standing {
                    runner,
                    stunned: true,
                },
            )
            .with_timing(StateTiming::timed(1.0).with_out_transition(0.3))
            .with_transitions([GoatState::Idle, GoatState::Run])
            .with_exit_state(GoatState::Run),
        };
        Some(state)
    }
}

/// 一只山羊：状态机 + 事件订阅
pub struct GoatRunner {
    pub machine: FiniteStateMachine<GoatState, GoatDescription>,
    pub runner: Rc<RefCell<Runner>>,
    inbox: Rc<RefCell<Vec<GoatState>>>,
    host: HostObject,
    on_collision: EventAction<ObstacleCollided>,
    on_boost: EventAction<BoostPicked>,
}

impl GoatRunner {
    pub fn spawn(name: &str, events: &EventManager) -> Result<Self, DescriptionError<GoatState>> {
        let runner = Rc::new(RefCell::new(Runner::default()));
        let mut machine: FiniteStateMachine<GoatState, GoatDescription> =
            FiniteStateMachine::validated(GoatDescription {
                runner: Rc::clone(&runner),
            })?;
        machine.initialize();
        machine.activate_state();

        let inbox = Rc::new(RefCell::new(Vec::new()));
        let on_collision = {
            let inbox = Rc::clone(&inbox);
            EventAction::new(move |_: &ObstacleCollided| inbox.borrow_mut().push(GoatState::Obstacle))
        };
        let on_boost = {
            let runner = Rc::clone(&runner);
            EventAction::new(move |boost: &BoostPicked| {
                let mut runner = runner.borrow_mut();
                runner.boosts += 1;
                runner.distance += boost.strength;
            })
        };

        let host = HostObject::new(name);
        events.subscribe(host.watcher(), &on_collision);
        events.subscribe(host.watcher(), &on_boost);

        Ok(Self {
            machine,
            runner,
            inbox,
            host,
            on_collision,
            on_boost,
        })
    }

    pub fn request(&self, state_type: GoatState) {
        self.inbox.borrow_mut().push(state_type);
    }

    /// 先消化收到的转换请求，再推进状态机
    pub fn tick(&mut self, time_delta: f32) {
        let requests = std::mem::take(&mut *self.inbox.borrow_mut());
        for state_type in requests {
            self.machine.try_change_state(state_type);
        }
        self.machine.update(time_delta);
    }

    pub fn despawn(&self, events: &EventManager) {
        events.unsubscribe(&self.on_collision);
        events.unsubscribe(&self.on_boost);
    }

    /// 宿主对象被拆除，但没有取消订阅
    pub fn destroy(&self) {
        self.host.destroy();
    }
}

/// 示例运行结果
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub final_state: GoatState,
    pub distance: f32,
    pub collisions: u32,
    pub boosts: u32,
    pub dead_watchers: usize,
}

const FRAME_TIME: f32 = 0.1;
const FRAMES: u32 = 60;

/// 运行山羊跑酷示例
pub fn run_goat_runner_example() -> Result<RunReport, DescriptionError<GoatState>> {
    info!("=== goat runner example ===");

    let events = Rc::new(EventManager::default());
    let mut clock = TimeController::with_events(Rc::clone(&events));
    let mut goat = GoatRunner::spawn("goat", &events)?;
    goat.request(GoatState::Run);

    for frame in 0..FRAMES {
        match frame {
            15 => {
                events.fire(ObstacleCollided { lane: 1 });
            }
            35 => {
                events.fire(BoostPicked { strength: 3.0 });
            }
            40 => clock.add_pause("menu"),
            45 => clock.remove_pause("menu"),
            _ => {}
        }

        let dt = clock.update(FRAME_TIME);
        let before = goat.machine.current_state_type();
        goat.tick(dt);
        let after = goat.machine.current_state_type();
        if before != after {
            info!(frame, from = ?before, to = ?after, "goat state changed");
        }
        events.update(clock.current_time());
    }

    // 切换关卡：另一只山羊被拆除却没有取消订阅
    let ghost = GoatRunner::spawn("ghost", &events)?;
    ghost.destroy();
    let dead_watchers = events.check_handlers_on_load();
    goat.despawn(&events);

    let runner = goat.runner.borrow();
    let report = RunReport {
        final_state: goat.machine.current_state_type(),
        distance: runner.distance,
        collisions: runner.collisions,
        boosts: runner.boosts,
        dead_watchers,
    };
    info!(?report, "=== goat runner example finished ===");
    Ok(report)
}
