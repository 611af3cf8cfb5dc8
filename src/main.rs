//! Phase-Zen 示例程序
//!
//! 演示状态机与事件总线的组合使用

use PHASE_ZEN::examples::goat_runner;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 运行山羊跑酷示例
    match goat_runner::run_goat_runner_example() {
        Ok(report) => println!(
            "final state: {:?}, distance: {:.1}, collisions: {}, boosts: {}, dead watchers: {}",
            report.final_state, report.distance, report.collisions, report.boosts, report.dead_watchers
        ),
        Err(err) => {
            eprintln!("goat runner description is invalid: {err}");
            std::process::exit(1);
        }
    }
}
