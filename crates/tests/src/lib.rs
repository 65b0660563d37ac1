//! # Integration Tests
//!
//! End-to-end tests across crates:
//! - configuration to running sinks
//! - region batching through the registry
//! - concurrent producers over shared sinks

#[cfg(test)]
mod support {
    use std::sync::{Arc, Mutex};

    use contracts::{Batch, BatchSink, ContractError};

    /// Sink that records every batch into shared storage
    pub struct RecordingSink {
        name: String,
        pub seen: Arc<Mutex<Vec<Batch>>>,
    }

    impl RecordingSink {
        pub fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                seen: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl BatchSink for RecordingSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn write(&mut self, batch: &Batch) -> Result<(), ContractError> {
            self.seen.lock().unwrap().push(batch.clone());
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    pub fn batch(commands: &[&str]) -> Batch {
        Batch::from(commands.to_vec())
    }
}

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_default_config_is_valid() {
        let config = contracts::BulkConfig::default();
        assert!(config_loader::ConfigLoader::validate(&config).is_ok());
        assert_eq!(config.version, contracts::ConfigVersion::V1);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;

    use dispatcher::{DispatcherError, Registry, RegistryBuilder};

    use crate::support::{batch, RecordingSink};

    fn feed(registry: &Registry, session: contracts::SessionId, commands: &str) {
        for command in commands.split_whitespace() {
            registry.receive(command, session).unwrap();
        }
    }

    /// Capacity threshold, nested regions and final flush on close
    #[tokio::test]
    async fn test_region_scenario_through_registry() {
        let registry = Registry::new();
        let sink = RecordingSink::new("rec");
        let seen = Arc::clone(&sink.seen);
        registry.add_sink(sink).unwrap();

        let session = registry.open_session(3).unwrap();
        feed(
            &registry,
            session,
            "cmd1 cmd2 cmd3 { cmd4 cmd5 cmd6 cmd7 } { cmd8 { cmd9 } cmd10 } cmd11",
        );
        registry.close_session(session).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                batch(&["cmd1", "cmd2", "cmd3"]),
                batch(&["cmd4", "cmd5", "cmd6", "cmd7"]),
                batch(&["cmd8", "cmd9", "cmd10"]),
                batch(&["cmd11"]),
            ]
        );
    }

    /// A region still open when its session closes is discarded
    #[tokio::test]
    async fn test_close_inside_region_discards_region() {
        let registry = Registry::new();
        let sink = RecordingSink::new("rec");
        let seen = Arc::clone(&sink.seen);
        registry.add_sink(sink).unwrap();

        let session = registry.open_session(2).unwrap();
        feed(&registry, session, "a { b c d");
        registry.close_session(session).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![batch(&["a"])]);
    }

    /// Every registered sink receives the same sequence of batches
    #[tokio::test]
    async fn test_all_sinks_see_identical_sequences() {
        let registry = Registry::new();
        let first = RecordingSink::new("first");
        let second = RecordingSink::new("second");
        let first_seen = Arc::clone(&first.seen);
        let second_seen = Arc::clone(&second.seen);
        registry.add_sink(first).unwrap();
        registry.add_sink(second).unwrap();

        let session = registry.open_session(2).unwrap();
        feed(&registry, session, "a b c { d e f } g");
        registry.close_session(session).await.unwrap();

        let first_seen = first_seen.lock().unwrap();
        assert_eq!(first_seen.len(), 4);
        assert_eq!(*first_seen, *second_seen.lock().unwrap());
    }

    /// A sink added late is wired into every session that is already open
    #[tokio::test]
    async fn test_late_sink_joins_open_sessions() {
        let registry = Registry::new();
        let early = RecordingSink::new("early");
        let early_seen = Arc::clone(&early.seen);
        registry.add_sink(early).unwrap();

        let first = registry.open_session(1).unwrap();
        let second = registry.open_session(1).unwrap();
        registry.receive("before", first).unwrap();

        let late = RecordingSink::new("late");
        let late_seen = Arc::clone(&late.seen);
        registry.add_sink(late).unwrap();

        registry.receive("one", first).unwrap();
        registry.receive("two", second).unwrap();
        registry.close_session(first).await.unwrap();
        registry.close_session(second).await.unwrap();

        assert_eq!(
            *early_seen.lock().unwrap(),
            vec![batch(&["before"]), batch(&["one"]), batch(&["two"])]
        );
        assert_eq!(
            *late_seen.lock().unwrap(),
            vec![batch(&["one"]), batch(&["two"])]
        );
    }

    /// Sinks can be reset only once stopped, after which a fresh scenario runs
    #[tokio::test]
    async fn test_reset_between_scenarios() {
        let registry = Registry::new();
        registry.add_sink(RecordingSink::new("first_run")).unwrap();

        let session = registry.open_session(2).unwrap();
        feed(&registry, session, "a b");

        let err = registry.reset_sinks().unwrap_err();
        assert!(matches!(err, DispatcherError::SinksNotStopped { .. }));

        registry.close_session(session).await.unwrap();
        registry.reset_sinks().unwrap();
        assert_eq!(registry.sink_count(), 0);

        let sink = RecordingSink::new("second_run");
        let seen = Arc::clone(&sink.seen);
        registry.add_sink(sink).unwrap();

        let session = registry.open_session(2).unwrap();
        feed(&registry, session, "c d e");
        registry.close_session(session).await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![batch(&["c", "d"]), batch(&["e"])]
        );
    }

    /// TOML config drives the registry; file sinks hold the bulk lines
    #[tokio::test]
    async fn test_config_to_file_sinks() {
        let dir = tempfile::tempdir().unwrap();
        let toml = format!(
            r#"
block_size = 2
output_dir = "{}"

[[sinks]]
name = "file_a"
sink_type = "file"
params = {{ suffix = "_a" }}

[[sinks]]
name = "file_b"
sink_type = "file"
params = {{ suffix = "_b" }}
"#,
            dir.path().display()
        );
        let config = config_loader::ConfigLoader::load_from_str(&toml, config_loader::ConfigFormat::Toml)
            .unwrap();

        let registry = RegistryBuilder::new(&config).build().unwrap();
        let session = registry.open_session(config.block_size).unwrap();
        feed(&registry, session, "x y z");
        registry.close_session(session).await.unwrap();

        let mut contents: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| std::fs::read_to_string(entry.unwrap().path()).unwrap())
            .collect();
        contents.dedup();
        assert_eq!(contents, vec!["bulk: x, y\nbulk: z\n".to_string()]);
    }
}

#[cfg(test)]
mod stress_tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use contracts::Batch;
    use dispatcher::Registry;

    use crate::support::RecordingSink;

    const THREADS: usize = 3;
    const SESSIONS_PER_THREAD: usize = 3;
    // Not a multiple of BLOCK_SIZE, so closing sessions emits tail batches
    const COMMANDS_PER_SESSION: usize = 503;
    const BLOCK_SIZE: usize = 10;

    /// Parse `t<thread>-s<session>-<index>`
    fn parse(command: &str) -> ((usize, usize), usize) {
        let mut parts = command.split('-');
        let thread = parts.next().unwrap()[1..].parse().unwrap();
        let session = parts.next().unwrap()[1..].parse().unwrap();
        let index = parts.next().unwrap().parse().unwrap();
        ((thread, session), index)
    }

    fn check_per_stream_order(batches: &[Batch]) {
        let mut last: HashMap<(usize, usize), usize> = HashMap::new();
        let mut total = 0;
        for batch in batches {
            assert!(!batch.is_empty());
            assert!(batch.len() <= BLOCK_SIZE);
            for command in batch.iter() {
                let (stream, index) = parse(command);
                if let Some(prev) = last.insert(stream, index) {
                    assert!(index > prev, "{stream:?}: {index} after {prev}");
                }
                total += 1;
            }
        }
        assert_eq!(total, THREADS * SESSIONS_PER_THREAD * COMMANDS_PER_SESSION);
        assert_eq!(last.len(), THREADS * SESSIONS_PER_THREAD);
    }

    /// Several producer threads interleave commands over their own sessions
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_producers_keep_per_session_order() {
        let registry = Arc::new(Registry::new());
        let mut recorders = Vec::new();
        for name in ["sink_a", "sink_b", "sink_c"] {
            let sink = RecordingSink::new(name);
            recorders.push(Arc::clone(&sink.seen));
            registry.add_sink(sink).unwrap();
        }

        let mut producers = Vec::new();
        for thread in 0..THREADS {
            let registry = Arc::clone(&registry);
            producers.push(tokio::task::spawn_blocking(move || {
                let sessions: Vec<_> = (0..SESSIONS_PER_THREAD)
                    .map(|_| registry.open_session(BLOCK_SIZE).unwrap())
                    .collect();
                for index in 0..COMMANDS_PER_SESSION {
                    for (slot, session) in sessions.iter().enumerate() {
                        let command = format!("t{thread}-s{slot}-{index}");
                        registry.receive(&command, *session).unwrap();
                    }
                }
                sessions
            }));
        }

        // Register another sink while producers are still feeding commands
        while recorders[0].lock().unwrap().is_empty() {
            tokio::task::yield_now().await;
        }
        let late = RecordingSink::new("sink_late");
        let late_seen = Arc::clone(&late.seen);
        registry.add_sink(late).unwrap();

        let mut sessions = Vec::new();
        for producer in producers {
            sessions.extend(producer.await.unwrap());
        }
        assert_eq!(registry.session_count(), THREADS * SESSIONS_PER_THREAD);

        for session in sessions {
            registry.close_session(session).await.unwrap();
        }

        let reference = recorders[0].lock().unwrap().clone();
        check_per_stream_order(&reference);
        for recorder in &recorders[1..] {
            assert_eq!(*recorder.lock().unwrap(), reference);
        }

        // The late sink sees exactly the batches completed after it joined
        let late_seen = late_seen.lock().unwrap();
        assert!(!late_seen.is_empty());
        assert!(late_seen.len() < reference.len());
        assert_eq!(late_seen[..], reference[reference.len() - late_seen.len()..]);
    }
}
