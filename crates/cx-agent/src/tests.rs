//! Unit tests for cx-agent.
//!
//! Async tests run on tokio's current-thread test runtime, which is the same
//! scheduler shape an `Environment` uses.

#[cfg(test)]
mod helpers {
    use std::time::Duration;

    use tokio::task::JoinSet;

    use crate::{Agent, AgentResult};

    pub const SHORT: Duration = Duration::from_millis(10);
    pub const LIMIT: Duration = Duration::from_secs(5);

    /// Spawn every queued task of every agent.
    pub fn spawn_all(agents: &[Agent]) -> JoinSet<AgentResult<()>> {
        let mut set = JoinSet::new();
        for agent in agents {
            for task in agent.take_tasks() {
                set.spawn(task.into_future(agent.clone()));
            }
        }
        set
    }

    /// Await every task, failing the test if the population hangs.
    pub async fn join_all(mut set: JoinSet<AgentResult<()>>) -> Vec<AgentResult<()>> {
        tokio::time::timeout(LIMIT, async {
            let mut out = Vec::new();
            while let Some(joined) = set.join_next().await {
                out.push(joined.expect("task panicked"));
            }
            out
        })
        .await
        .expect("agents did not stop")
    }
}

// ── Mailbox ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod mailbox {
    use cx_core::{AgentName, Message, Value};

    use crate::Mailbox;

    fn msg(from: &str, v: i64) -> Message {
        Message::new(AgentName::new(from), Value::Int(v))
    }

    #[test]
    fn take_first_matching_in_order() {
        let mb = Mailbox::new();
        mb.push(msg("a", 1));
        mb.push(msg("b", 2));
        mb.push(msg("a", 3));
        assert_eq!(mb.len(), 3);

        let first_b = mb.take_first(|m| m.origin == "b").unwrap();
        assert_eq!(first_b, msg("b", 2));
        assert_eq!(mb.take_first(|_| true).unwrap(), msg("a", 1));
        assert_eq!(mb.take_first(|_| true).unwrap(), msg("a", 3));
        assert!(mb.take_first(|_| true).is_none());
        assert!(mb.is_empty());
    }
}

// ── Register ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod register {
    use crate::{Agent, AgentError, Register, observer};

    #[test]
    fn routes_by_name() {
        let a = Agent::new("a");
        let b = Agent::new("b");
        let reg = Register::new(&[a.clone(), b.clone(), observer()]).unwrap();
        assert_eq!(reg.len(), 3);
        assert!(reg.contains("observer"));
        assert!(a.register().is_some());

        a.send_to("b", 7i64).unwrap();
        assert_eq!(b.mailbox().len(), 1);
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = Register::new(&[Agent::new("x"), Agent::new("x")]).unwrap_err();
        assert!(matches!(err, AgentError::DuplicateName(n) if n == "x"));
    }

    #[test]
    fn registering_twice_rejected() {
        let a = Agent::new("a");
        Register::new(&[a.clone()]).unwrap();
        let b = Agent::new("b");
        let err = Register::new(&[b.clone(), a]).unwrap_err();
        assert!(matches!(err, AgentError::AlreadyRegistered(n) if n == "a"));
        // The failed attempt left `b` untouched.
        assert!(b.register().is_none());
    }

    #[test]
    fn unknown_and_unregistered() {
        let lonely = Agent::new("lonely");
        assert!(matches!(lonely.send_to("x", 1i64), Err(AgentError::Unregistered(_))));

        let a = Agent::new("a");
        Register::new(&[a.clone()]).unwrap();
        assert!(matches!(a.send_to("ghost", 1i64), Err(AgentError::UnknownAgent(n)) if n == "ghost"));
    }
}

// ── Agent messaging ───────────────────────────────────────────────────────────

#[cfg(test)]
mod messaging {
    use std::time::Duration;

    use cx_core::{Control, OBSERVER, Payload, Value};

    use super::helpers::{LIMIT, SHORT};
    use crate::{Agent, AgentError, Register};

    fn pair() -> (Agent, Agent, Agent) {
        let a = Agent::new("a");
        let b = Agent::new("b");
        let obs = Agent::new(OBSERVER);
        Register::new(&[a.clone(), b.clone(), obs.clone()]).unwrap();
        (a, b, obs)
    }

    #[tokio::test]
    async fn per_sender_fifo() {
        let (a, b, _) = pair();
        for i in 0..5i64 {
            a.send_to("b", i).unwrap();
        }
        for i in 0..5i64 {
            let m = b.recv().await.unwrap();
            assert_eq!(m.origin, "a");
            assert_eq!(m.payload, Payload::Value(Value::Int(i)));
        }
    }

    #[tokio::test]
    async fn recv_skips_observer_messages() {
        let (a, b, obs) = pair();
        obs.send_to("b", Control::Nend).unwrap();
        a.send_to("b", "hello").unwrap();

        let m = b.recv().await.unwrap();
        assert_eq!(m.origin, "a");
        let m = b.recv_from(OBSERVER).await.unwrap();
        assert_eq!(m.payload.control(), Some(Control::Nend));
    }

    #[tokio::test]
    async fn recv_wakes_on_send() {
        let (a, b, _) = pair();
        let waiter = tokio::spawn(async move { b.recv().await });
        tokio::time::sleep(SHORT).await;
        a.send_to("b", 42i64).unwrap();
        let m = tokio::time::timeout(LIMIT, waiter).await.unwrap().unwrap().unwrap();
        assert_eq!(m.payload, Payload::Value(Value::Int(42)));
    }

    #[tokio::test]
    async fn finish_interrupts_recv() {
        let (_, b, _) = pair();
        let waiting = b.clone();
        let waiter = tokio::spawn(async move { waiting.recv().await });
        tokio::time::sleep(SHORT).await;
        b.finish();
        let res = tokio::time::timeout(LIMIT, waiter).await.unwrap().unwrap();
        assert!(matches!(res, Err(AgentError::NotWorking)));
    }

    #[tokio::test]
    async fn try_recv_times_out() {
        let (_, b, _) = pair();
        assert!(b.try_recv(SHORT).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sleep_completes_and_is_interruptible() {
        let (a, _, _) = pair();
        a.sleep(SHORT).await.unwrap();

        let sleeper = a.clone();
        let long = tokio::spawn(async move { sleeper.sleep(Duration::from_secs(60)).await });
        tokio::time::sleep(SHORT).await;
        a.finish();
        let res = tokio::time::timeout(LIMIT, long).await.unwrap().unwrap();
        assert!(matches!(res, Err(AgentError::NotWorking)));
    }

    #[tokio::test]
    async fn unbounded_sleep_waits_for_finish() {
        let (a, _, _) = pair();
        let sleeper = a.clone();
        let long = tokio::spawn(async move { sleeper.sleep(Duration::MAX).await });
        tokio::time::sleep(SHORT).await;
        assert!(!long.is_finished());
        a.finish();
        let res = tokio::time::timeout(LIMIT, long).await.unwrap().unwrap();
        assert!(matches!(res, Err(AgentError::NotWorking)));
    }

    #[tokio::test]
    async fn finished_agent_cannot_send() {
        let (a, b, _) = pair();
        a.finish();
        a.finish();
        assert!(!a.working());
        assert!(matches!(a.send_to("b", 1i64), Err(AgentError::NotWorking)));
        assert!(matches!(a.send_all(1i64), Err(AgentError::NotWorking)));
        // Receiving agents are unaffected.
        assert!(b.working());
    }

    #[tokio::test]
    async fn send_all_reaches_everyone_else() {
        let (a, b, obs) = pair();
        obs.send_all(Control::Abend).unwrap();
        assert_eq!(a.mailbox().len(), 1);
        assert_eq!(b.mailbox().len(), 1);
        assert!(obs.mailbox().is_empty());
    }

    #[tokio::test]
    async fn call_blocking_runs_off_thread() {
        let (a, _, _) = pair();
        let v = a.call_blocking(|| 6 * 7).await.unwrap();
        assert_eq!(v, 42);

        a.finish();
        assert!(matches!(a.call_blocking(|| ()).await, Err(AgentError::NotWorking)));
    }

    #[test]
    fn tasks_are_queued_in_order() {
        let a = Agent::new("a")
            .assign_task(crate::Task::SelfTerminate)
            .assign_task(crate::Task::custom(|_| async { Ok(()) }));
        assert_eq!(a.task_count(), 2);
        let kinds: Vec<_> = a.take_tasks().iter().map(|t| t.kind()).collect();
        assert_eq!(kinds, ["self_terminate", "custom"]);
        assert_eq!(a.task_count(), 0);
    }
}

// ── Observer protocol ─────────────────────────────────────────────────────────

#[cfg(test)]
mod observer_protocol {
    use cx_core::{Control, EventTime, OBSERVER, Payload, Value};

    use super::helpers::{join_all, spawn_all};
    use crate::{Agent, ObserverState, Register, Task, observer};

    #[test]
    fn state_machine() {
        let s = ObserverState::Listening;
        assert_eq!(s.on_payload(&Payload::from(Control::Start)), ObserverState::Listening);
        assert_eq!(s.on_payload(&Payload::from(Value::Int(1))), ObserverState::Listening);
        assert_eq!(
            s.on_payload(&Payload::from(EventTime::new(0.0, "x"))),
            ObserverState::Listening
        );

        let b = s.on_payload(&Payload::from(Control::Abend));
        assert_eq!(b, ObserverState::Broadcasting(Control::Abend));
        assert_eq!(b.pending(), Some(Control::Abend));
        // The first terminal code wins.
        assert_eq!(b.on_payload(&Payload::from(Control::Nend)), b);
        assert_eq!(b.broadcast_sent(), ObserverState::Stopped);
        assert_eq!(ObserverState::Stopped.on_payload(&Payload::from(Control::Nend)), ObserverState::Stopped);
    }

    #[tokio::test]
    async fn relays_nend_to_everyone() {
        let a = Agent::new("a").assign_task(Task::SelfTerminate);
        let b = Agent::new("b").assign_task(Task::SelfTerminate);
        let driver = Agent::new("driver").assign_task(Task::custom(|me| async move {
            me.send_to(OBSERVER, Control::Start)?;
            me.send_to(OBSERVER, 5i64)?;
            me.send_to(OBSERVER, Control::Nend)
        }));
        let obs = observer();
        let agents = vec![a.clone(), b.clone(), driver.clone(), obs.clone()];
        Register::new(&agents).unwrap();

        let results = join_all(spawn_all(&agents)).await;
        assert!(results.iter().all(Result::is_ok));
        assert!(!a.working());
        assert!(!b.working());
        assert!(!obs.working());
        // The driver never ran a self-terminate task, so the relay is still queued.
        let relayed = driver.mailbox().take_first(|m| m.origin == OBSERVER).unwrap();
        assert_eq!(relayed.payload.control(), Some(Control::Nend));
    }

    #[tokio::test]
    async fn self_terminate_ignores_non_terminal() {
        let a = Agent::new("a");
        let obs = Agent::new(OBSERVER);
        Register::new(&[a.clone(), obs.clone()]).unwrap();

        obs.send_to("a", Control::Start).unwrap();
        obs.send_to("a", Control::Abend).unwrap();
        Task::SelfTerminate.into_future(a.clone()).await.unwrap();
        assert!(!a.working());
        assert!(a.mailbox().is_empty());
    }
}

// ── Roles ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod roles {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use cx_core::{Control, OBSERVER, Value};
    use cx_device::{Level, ScriptStep, ScriptedDevice, share};
    use cx_output::MemorySink;

    use super::helpers::{LIMIT, SHORT, join_all, spawn_all};
    use crate::{Agent, AgentError, Register, Stimulator, StimulusPlan, Task, observer, reader, recorder};

    /// Sends `Nend` to the observer after `delay`.
    fn stop_after(delay: Duration) -> Agent {
        Agent::new("stopper").assign_task(Task::custom(move |me| async move {
            me.sleep(delay).await?;
            me.send_to(OBSERVER, Control::Nend)
        }))
    }

    #[tokio::test]
    async fn reader_feeds_recorder() {
        let device = ScriptedDevice::from_lines(["lever", "nose \r"]);
        let cancelled = device.cancel_flag();
        let sink = MemorySink::new();

        let agents = vec![
            reader(share(device), SHORT),
            recorder(Box::new(sink.clone())),
            observer(),
            stop_after(Duration::from_millis(100)),
        ];
        Register::new(&agents).unwrap();
        let results = join_all(spawn_all(&agents)).await;
        assert!(results.iter().all(Result::is_ok));

        let events: Vec<_> = sink.events().into_iter().map(|e| e.event).collect();
        assert_eq!(events, vec![Value::from("lever"), Value::from("nose")]);
        assert!(sink.is_finished());
        assert!(cancelled.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn device_failure_aborts_session() {
        let device = ScriptedDevice::new([ScriptStep::line("ok"), ScriptStep::Fail("unplugged".into())]);
        let sink = MemorySink::new();
        let rdr = reader(share(device), SHORT);
        let agents = vec![rdr.clone(), recorder(Box::new(sink.clone())), observer()];
        Register::new(&agents).unwrap();

        let results = join_all(spawn_all(&agents)).await;
        let failures: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0], AgentError::Device(_)));
        assert!(!rdr.working());
        // The line read before the failure was still flushed.
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn recorder_stamps_bare_values() {
        let sink = MemorySink::new();
        let rec = recorder(Box::new(sink.clone()));
        let src = Agent::new("src").assign_task(Task::custom(|me| async move {
            me.send_to("recorder", 3i64)?;
            me.send_to("recorder", "tone")?;
            me.send_to(OBSERVER, Control::Nend)
        }));
        let agents = vec![rec, src, observer()];
        Register::new(&agents).unwrap();
        join_all(spawn_all(&agents)).await;

        let events: Vec<_> = sink.events().into_iter().map(|e| e.event).collect();
        assert_eq!(events, vec![Value::Int(3), Value::from("tone")]);
    }

    #[tokio::test]
    async fn stimulator_plan_pulses_then_ends_session() {
        let device = ScriptedDevice::silent();
        let log = device.write_log();
        let sink = MemorySink::new();

        let plan = StimulusPlan::new(13, Duration::from_millis(5), vec![0.01, 0.02]);
        let stim = Stimulator::new(share(device)).with_plan(plan).into_agent();
        let agents = vec![stim.clone(), recorder(Box::new(sink.clone())), observer()];
        Register::new(&agents).unwrap();

        let results = join_all(spawn_all(&agents)).await;
        assert!(results.iter().all(Result::is_ok));
        assert!(!stim.working());
        assert_eq!(
            log.writes(),
            vec![(13, Level::High), (13, Level::Low), (13, Level::High), (13, Level::Low)]
        );
        let events: Vec<_> = sink.events().into_iter().map(|e| e.event).collect();
        assert_eq!(events, vec![Value::from("pulse 13"), Value::from("pulse 13")]);
    }

    #[tokio::test]
    async fn high_for_resets_pin_when_interrupted() {
        let device = ScriptedDevice::silent();
        let log = device.write_log();
        let stim = Stimulator::new(share(device));
        Register::new(&[stim.agent().clone()]).unwrap();

        let agent = stim.agent().clone();
        let stopper = tokio::spawn(async move {
            tokio::time::sleep(SHORT).await;
            agent.finish();
        });
        let res = stim.high_for(4, Duration::from_secs(60)).await;
        stopper.await.unwrap();

        assert!(matches!(res, Err(AgentError::NotWorking)));
        assert_eq!(log.writes(), vec![(4, Level::High), (4, Level::Low)]);
    }

    #[tokio::test]
    async fn high_for_resets_pin_when_finished_during_high_write() {
        let device = ScriptedDevice::silent().with_write_delay(Duration::from_millis(50));
        let log = device.write_log();
        let stim = Stimulator::new(share(device));
        Register::new(&[stim.agent().clone()]).unwrap();

        let agent = stim.agent().clone();
        let stopper = tokio::spawn(async move {
            tokio::time::sleep(SHORT).await;
            agent.finish();
        });
        let res = stim.high_for(4, Duration::from_secs(1)).await;
        stopper.await.unwrap();

        assert!(matches!(res, Err(AgentError::NotWorking)));
        assert_eq!(log.writes().last(), Some(&(4, Level::Low)));
        assert_eq!(log.writes(), vec![(4, Level::High), (4, Level::Low)]);
    }

    #[tokio::test]
    async fn high_for_on_finished_agent_writes_nothing() {
        let device = ScriptedDevice::silent();
        let log = device.write_log();
        let stim = Stimulator::new(share(device));
        stim.agent().finish();

        let res = stim.high_for(4, SHORT).await;
        assert!(matches!(res, Err(AgentError::NotWorking)));
        assert!(log.writes().is_empty());
    }

    #[tokio::test]
    async fn invalid_interval_fails_plan() {
        for bad in [f64::NAN, -1.0, f64::INFINITY] {
            let device = ScriptedDevice::silent();
            let log = device.write_log();
            let plan = StimulusPlan::new(13, SHORT, vec![0.01, bad]);
            let stim = Stimulator::new(share(device)).with_plan(plan).into_agent();
            let agents = vec![stim.clone(), observer()];
            Register::new(&agents).unwrap();

            let pulse = stim
                .take_tasks()
                .into_iter()
                .find(|t| matches!(t, Task::Pulse { .. }))
                .unwrap()
                .into_future(stim.clone());
            let res = tokio::time::timeout(LIMIT, pulse).await.unwrap();
            assert!(matches!(res, Err(AgentError::InvalidDuration(_))), "{bad}");
            // The first pulse was delivered in full.
            assert_eq!(log.writes(), vec![(13, Level::High), (13, Level::Low)]);
        }
    }

    #[test]
    fn plan_duration() {
        let plan = StimulusPlan::new(1, Duration::from_millis(500), vec![1.0, 2.0]);
        assert_eq!(plan.duration(), Duration::from_secs(4));
        assert!(!plan.open_ended().end_session);
    }

    #[test]
    fn plan_duration_saturates() {
        let many = StimulusPlan::new(1, Duration::from_secs(u64::MAX / 2), vec![0.0; 3]);
        assert_eq!(many.duration(), Duration::MAX);

        let skewed = StimulusPlan::new(1, Duration::ZERO, vec![-3.0, 2.0]);
        assert_eq!(skewed.duration(), Duration::from_secs(2));
    }
}
