//! Integration tests for cx-env.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::info;

use cx_agent::{Agent, Task};
use cx_core::{Control, OBSERVER, Payload, Value};

use crate::{EnvObserver, RunReport, TaskEnd, TaskOutcome};

// ── Helpers ───────────────────────────────────────────────────────────────────

const SHORT: Duration = Duration::from_millis(10);

/// Sends `0..count` to `target`, sleeping `gaps[i]` seconds before each, then
/// reports `Nend` to the observer.
fn sender(target: &'static str, gaps: Vec<f64>) -> Agent {
    Agent::new("sender")
        .assign_task(Task::custom(move |me| async move {
            for (i, gap) in gaps.into_iter().enumerate() {
                me.sleep(Duration::from_secs_f64(gap)).await?;
                me.send_to(target, i as i64)?;
            }
            me.send_to(OBSERVER, Control::Nend)
        }))
        .assign_task(Task::SelfTerminate)
}

/// Records and logs every integer it receives until it is stopped.
fn receiver(got: Arc<Mutex<Vec<i64>>>) -> Agent {
    Agent::new("receiver")
        .assign_task(Task::custom(move |me| async move {
            while me.working() {
                let message = me.recv().await?;
                if let Payload::Value(Value::Int(v)) = message.payload {
                    info!(from = %message.origin, value = v, "received");
                    got.lock().unwrap().push(v);
                }
            }
            Ok(())
        }))
        .assign_task(Task::SelfTerminate)
}

/// Sends `Nend` to the observer after `delay`.
fn stop_after(delay: Duration) -> Agent {
    Agent::new("stopper").assign_task(Task::custom(move |me| async move {
        me.sleep(delay).await?;
        me.send_to(OBSERVER, Control::Nend)
    }))
}

/// Idles until the observer's broadcast.
fn idle(name: &str) -> Agent {
    Agent::new(name).assign_task(Task::SelfTerminate)
}

#[derive(Default)]
struct Trace {
    started: Option<(String, usize)>,
    ends:    Vec<TaskEnd>,
    report:  Option<RunReport>,
}

#[derive(Clone, Default)]
struct TraceObserver(Arc<Mutex<Trace>>);

impl EnvObserver for TraceObserver {
    fn on_run_start(&mut self, env: &str, tasks: usize) {
        self.0.lock().unwrap().started = Some((env.to_owned(), tasks));
    }

    fn on_task_end(&mut self, _env: &str, end: &TaskEnd) {
        self.0.lock().unwrap().ends.push(end.clone());
    }

    fn on_run_end(&mut self, report: &RunReport) {
        self.0.lock().unwrap().report = Some(report.clone());
    }
}

// ── EnvironmentBuilder validation ─────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use cx_agent::{Register, observer};

    use super::*;
    use crate::{EnvError, Environment, EnvironmentBuilder};

    #[test]
    fn registers_unbound_agents() {
        let a = idle("a");
        let env = Environment::new(vec![a.clone(), idle("b"), observer()]).unwrap();
        assert_eq!(env.agents().len(), 3);
        assert_eq!(env.name(), "env");
        let register = a.register().expect("bound by build");
        assert!(register.contains("b"));
        assert!(register.contains(OBSERVER));
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = Environment::new(vec![idle("a"), idle("a")]).unwrap_err();
        assert!(matches!(err, EnvError::DuplicateAgent(ref n) if n == "a"));
    }

    #[test]
    fn empty_name_rejected() {
        let err = EnvironmentBuilder::new().name("").build().unwrap_err();
        assert!(matches!(err, EnvError::Config(_)));
    }

    #[test]
    fn preregistered_agents_kept() {
        let a = idle("a");
        let b = idle("b");
        Register::new(&[a.clone(), b.clone()]).unwrap();
        // Each group holds only part of the shared register.
        EnvironmentBuilder::new().name("left").agent(a).build().unwrap();
        EnvironmentBuilder::new().name("right").agent(b).build().unwrap();
    }

    #[test]
    fn mixed_registration_rejected() {
        let a = idle("a");
        Register::new(&[a.clone()]).unwrap();
        let err = EnvironmentBuilder::new().agents([a, idle("b")]).build().unwrap_err();
        assert!(matches!(err, EnvError::Config(_)));
    }
}

// ── Single scheduler ──────────────────────────────────────────────────────────

#[cfg(test)]
mod run_tests {
    use cx_agent::{AgentError, observer};
    use cx_core::SessionRng;
    use cx_schedule::uniform_intervals;

    use super::*;
    use crate::{Environment, EnvironmentBuilder};

    #[test]
    fn empty_environment_returns_at_once() {
        let mut env = Environment::new(Vec::new()).unwrap();
        let report = env.run().unwrap();
        assert_eq!(report.tasks_spawned, 0);
        assert!(report.is_clean());
    }

    #[test]
    fn sender_receiver_session() {
        let mut rng = SessionRng::new(7);
        let gaps = uniform_intervals(0.01, 0.008, 5, true, &mut rng).unwrap();
        let got = Arc::new(Mutex::new(Vec::new()));

        let snd = sender("receiver", gaps);
        let rcv = receiver(Arc::clone(&got));
        let obs = observer();
        let mut env = Environment::new(vec![snd.clone(), rcv.clone(), obs.clone()]).unwrap();

        let report = env.run().unwrap();
        assert_eq!(report.tasks_spawned, 5);
        assert_eq!(report.tasks_completed, 5);
        assert!(report.is_clean());
        assert!(!report.interrupted);

        assert_eq!(*got.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        assert!(!snd.working());
        assert!(!rcv.working());
        assert!(!obs.working());
    }

    #[test]
    fn second_run_has_nothing_left() {
        let mut env = Environment::new(vec![stop_after(SHORT), observer()]).unwrap();
        assert_eq!(env.run().unwrap().tasks_spawned, 2);
        assert_eq!(env.run().unwrap().tasks_spawned, 0);
    }

    #[test]
    fn failure_is_contained_to_its_task() {
        let flaky = Agent::new("flaky")
            .assign_task(Task::custom(|me| async move { me.send_to("nobody", 1i64) }))
            .assign_task(Task::SelfTerminate);
        let trace = TraceObserver::default();
        let mut env = EnvironmentBuilder::new()
            .agents([flaky.clone(), stop_after(Duration::from_millis(30)), observer()])
            .observer(trace.clone())
            .build()
            .unwrap();

        let report = env.run().unwrap();
        assert_eq!(report.tasks_failed, 1);
        assert_eq!(report.tasks_completed, 3);
        assert!(!report.is_clean());
        // The sibling self-terminate task kept running until the broadcast.
        assert!(!flaky.working());

        let t = trace.0.lock().unwrap();
        let failed: Vec<_> = t.ends.iter().filter(|e| matches!(e.outcome, TaskOutcome::Failed(_))).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].agent, "flaky");
        assert_eq!(failed[0].kind, "custom");
        let expected = AgentError::UnknownAgent("nobody".into()).to_string();
        assert_eq!(failed[0].outcome, TaskOutcome::Failed(expected));
    }

    #[test]
    fn panic_is_contained_to_its_task() {
        let fragile = Agent::new("fragile")
            .assign_task(Task::custom(|_| async {
                let broken = true;
                if broken {
                    panic!("sensor exploded");
                }
                Ok(())
            }))
            .assign_task(Task::SelfTerminate);
        let trace = TraceObserver::default();
        let mut env = EnvironmentBuilder::new()
            .name("fragile-env")
            .agents([fragile, stop_after(Duration::from_millis(30)), observer()])
            .observer(trace.clone())
            .build()
            .unwrap();

        let report = env.run().unwrap();
        assert_eq!(report.tasks_panicked, 1);
        assert_eq!(report.tasks_completed, 3);

        let t = trace.0.lock().unwrap();
        let panicked = t.ends.iter().find(|e| e.agent == "fragile" && e.kind == "custom").unwrap();
        assert_eq!(panicked.outcome, TaskOutcome::Panicked("sensor exploded".into()));
    }

    #[test]
    fn observer_hooks_fire_in_order() {
        let trace = TraceObserver::default();
        let mut env = EnvironmentBuilder::new()
            .name("hooks")
            .agents([stop_after(SHORT), idle("a"), observer()])
            .observer(trace.clone())
            .build()
            .unwrap();
        let report = env.run().unwrap();

        let t = trace.0.lock().unwrap();
        assert_eq!(t.started, Some(("hooks".to_owned(), 3)));
        assert_eq!(t.ends.len(), 3);
        assert!(t.ends.iter().all(|e| e.outcome == TaskOutcome::Completed));
        assert_eq!(t.report.as_ref(), Some(&report));
        assert!(report.to_string().starts_with("hooks: 3 tasks, 3 completed"));
    }

    #[test]
    fn run_with_interrupt_without_signal() {
        let obs = observer();
        let mut env = Environment::new(vec![stop_after(SHORT), obs.clone()]).unwrap();
        let report = env.run_with_interrupt(&obs).unwrap();
        assert!(!report.interrupted);
        assert!(report.is_clean());
    }

    #[test]
    fn finished_agent_exits_immediately() {
        let lonely = idle("lonely");
        lonely.finish();
        let mut env = Environment::new(vec![lonely]).unwrap();
        let report = env.run().unwrap();
        assert_eq!(report.tasks_completed, 1);
    }
}

// ── Parallel groups ───────────────────────────────────────────────────────────

#[cfg(test)]
mod parallel_tests {
    use cx_agent::{Register, observer, recorder};
    use cx_output::MemorySink;

    use super::*;
    use crate::{EnvError, EnvironmentBuilder, escalate_abort};

    #[test]
    fn groups_exchange_messages_across_threads() {
        let sink = MemorySink::new();
        let snd = sender("recorder", vec![0.002; 5]);
        let rec = recorder(Box::new(sink.clone()));
        let obs = observer();
        Register::new(&[snd.clone(), rec.clone(), obs.clone()]).unwrap();

        let pacing = EnvironmentBuilder::new().name("pacing").agents([snd, obs]).build().unwrap();
        let logging = EnvironmentBuilder::new().name("logging").agent(rec.clone()).build().unwrap();

        let logging = logging.parallelize().unwrap();
        let pacing = pacing.parallelize().unwrap();
        assert_eq!(pacing.name(), "pacing");

        let a = pacing.join().unwrap();
        let b = logging.join().unwrap();
        assert!(a.is_clean() && b.is_clean());
        assert_eq!(b.tasks_spawned, 2);
        assert!(!rec.working());

        let values: Vec<_> = sink.events().into_iter().map(|e| e.event).collect();
        assert_eq!(values, (0..5).map(Value::Int).collect::<Vec<_>>());
        assert!(sink.is_finished());
    }

    #[test]
    fn escalated_abort_stops_every_group() {
        let obs = observer();
        let a = idle("a");
        let b = idle("b");
        Register::new(&[obs.clone(), a.clone(), b.clone()]).unwrap();

        let left = EnvironmentBuilder::new().name("left").agents([a.clone(), obs.clone()]).build().unwrap();
        let right = EnvironmentBuilder::new().name("right").agent(b.clone()).build().unwrap();
        let left = left.parallelize().unwrap();
        let right = right.parallelize().unwrap();

        std::thread::sleep(SHORT);
        assert!(escalate_abort(&obs));
        assert!(!escalate_abort(&obs));

        assert!(left.join().unwrap().is_clean());
        assert!(right.join().unwrap().is_clean());
        assert!(!a.working() && !b.working() && !obs.working());
    }

    #[test]
    fn thread_panic_maps_to_error() {
        let handle = std::thread::Builder::new()
            .spawn(|| -> crate::EnvResult<RunReport> { panic!("scheduler lost") })
            .unwrap();
        let joined = crate::ParallelHandle::from_parts("broken".into(), handle).join();
        assert!(matches!(
            joined,
            Err(EnvError::ThreadPanicked { ref name, ref message })
                if name == "broken" && message == "scheduler lost"
        ));
    }
}

// ── Full session ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod session_tests {
    use cx_agent::{Stimulator, StimulusPlan, observer, reader, recorder};
    use cx_core::SessionRng;
    use cx_device::{Level, ScriptedDevice, share};
    use cx_output::MemorySink;
    use cx_schedule::exponential_intervals;

    use super::*;
    use crate::Environment;

    #[test]
    fn reader_stimulator_recorder_session() {
        let mut rng = SessionRng::new(3);
        let gaps_ms = exponential_intervals(20.0, 3, 5.0, true, &mut rng).unwrap();
        let gaps: Vec<f64> = gaps_ms.iter().map(|ms| ms / 1000.0).collect();

        let input = ScriptedDevice::from_lines(["lever", "lick"]);
        let output = ScriptedDevice::silent();
        let writes = output.write_log();
        let sink = MemorySink::new();

        let plan = StimulusPlan::new(13, Duration::from_millis(2), gaps);
        let stim = Stimulator::new(share(output)).with_plan(plan).into_agent();
        let rdr = reader(share(input), SHORT);
        let rec = recorder(Box::new(sink.clone()));

        let mut env = Environment::new(vec![rdr.clone(), stim, rec, observer()]).unwrap();
        let report = env.run().unwrap();
        assert!(report.is_clean(), "{report}");
        assert!(!rdr.working());

        let pulses = writes.writes().iter().filter(|(_, level)| *level == Level::High).count();
        assert_eq!(pulses, 3);
        assert_eq!(writes.writes().last(), Some(&(13, Level::Low)));

        let events: Vec<_> = sink.events().into_iter().map(|e| e.event.to_string()).collect();
        assert!(events.contains(&"lever".to_owned()));
        assert!(events.contains(&"lick".to_owned()));
        assert_eq!(events.iter().filter(|e| *e == "pulse 13").count(), 3);

        let times: Vec<f64> = sink.events().iter().map(|e| e.time).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn broadcast_stops_population_within_one_poll() {
        const POLL: Duration = Duration::from_millis(50);
        const STOP: Duration = Duration::from_millis(20);

        let rdr = reader(share(ScriptedDevice::silent()), POLL);
        let sleeper = Agent::new("sleeper")
            .assign_task(Task::custom(|me| async move { me.sleep(Duration::from_secs(60)).await }))
            .assign_task(Task::SelfTerminate);

        let mut env = Environment::new(vec![rdr.clone(), sleeper, stop_after(STOP), observer()]).unwrap();
        let report = env.run().unwrap();

        assert!(report.is_clean(), "{report}");
        assert_eq!(report.tasks_completed, report.tasks_spawned);
        assert!(!rdr.working());
        // Stop request, then at most one poll for the reader; the rest is
        // scheduling slack.
        assert!(report.elapsed < STOP + POLL + Duration::from_millis(500), "{report}");
    }
}
