//! Integration tests for TieredMemory over the in-memory collection client.

mod common;

use common::{ready_memory, test_config, Faults};
use memory_core::{CollectionClient, RecordFilter, UnitId, VectorCollection};
use memory_inmemory::DuplicatePolicy;
use tiered_memory::{
    CollectionStatus, MaintenanceOutcome, MemoryConfig, MemoryError, MemoryStats, TieredMemory,
};

fn unit(n: u64) -> UnitId {
    UnitId::from(n)
}

async fn write_units(memory: &TieredMemory, conversation_id: &str, units: std::ops::RangeInclusive<u64>) {
    for n in units {
        memory
            .add_to_memory(conversation_id, &unit(n), &format!("unit {} text", n))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_operations_fail_before_initialize() {
    let memory = TieredMemory::new(MemoryConfig::default()).unwrap();
    assert!(!memory.is_ready());

    assert!(matches!(
        memory.add_to_memory("c1", &unit(1), "text").await,
        Err(MemoryError::NotInitialized)
    ));
    assert!(matches!(
        memory.get_context("c1", "text").await,
        Err(MemoryError::NotInitialized)
    ));
    assert!(matches!(
        memory.archive("c1", &unit(1), "summary").await,
        Err(MemoryError::NotInitialized)
    ));
    assert!(matches!(
        memory.run_maintenance("c1").await,
        Err(MemoryError::NotInitialized)
    ));
    assert!(matches!(
        memory.clear_collection("c1").await,
        Err(MemoryError::NotInitialized)
    ));
    assert!(matches!(memory.stats("c1").await, Err(MemoryError::NotInitialized)));
}

#[tokio::test]
async fn test_initialize_fails_when_index_unreachable() {
    let client = common::FaultyClient::new(DuplicatePolicy::Overwrite);
    Faults::set(&client.faults.heartbeat, true);
    let memory = TieredMemory::new(MemoryConfig::default()).unwrap();

    let result = memory
        .initialize(std::sync::Arc::new(client.clone()), common::embedder())
        .await;
    assert!(matches!(result, Err(MemoryError::StoreUnavailable { .. })));
    assert!(!memory.is_ready());

    Faults::set(&client.faults.heartbeat, false);
    memory
        .initialize(std::sync::Arc::new(client), common::embedder())
        .await
        .unwrap();
    assert!(memory.is_ready());
}

#[test]
fn test_new_rejects_invalid_chunking() {
    let config = MemoryConfig {
        chunk_size: 10,
        chunk_overlap: 10,
        ..MemoryConfig::default()
    };
    assert!(matches!(
        TieredMemory::new(config),
        Err(MemoryError::InvalidConfig(_))
    ));
}

#[tokio::test]
async fn test_add_then_retrieve() {
    let (memory, _client) = ready_memory(test_config(), DuplicatePolicy::Overwrite).await;

    let ack = memory
        .add_to_memory("c1", &unit(1), "the dragon sleeps under the hill")
        .await
        .unwrap();
    assert_eq!(ack.unit_id, unit(1));
    assert_eq!(ack.chunks, 2);

    let context = memory.get_context("c1", "dragon").await.unwrap();
    assert!(context.contains("the dragon sleeps under"));
    assert!(!context.contains("Past summary"));
}

#[tokio::test]
async fn test_empty_text_writes_nothing() {
    let (memory, _client) = ready_memory(test_config(), DuplicatePolicy::Overwrite).await;

    let ack = memory.add_to_memory("c1", &unit(1), "   ").await.unwrap();
    assert_eq!(ack.chunks, 0);
    assert_eq!(memory.stats("c1").await.unwrap(), MemoryStats::default());
    assert_eq!(memory.get_context("c1", "anything").await.unwrap(), "");
}

#[tokio::test]
async fn test_rewriting_a_unit_is_idempotent() {
    let (memory, _client) = ready_memory(test_config(), DuplicatePolicy::Reject).await;
    let text = "one two three four five six";

    let first = memory.add_to_memory("c1", &unit(7), text).await.unwrap();
    let second = memory.add_to_memory("c1", &unit(7), text).await.unwrap();
    assert_eq!(first, second);

    let stats = memory.stats("c1").await.unwrap();
    assert_eq!(stats.active_units, 1);
    assert_eq!(stats.active_chunks, 2);
}

#[tokio::test]
async fn test_conversations_are_isolated() {
    let (memory, _client) = ready_memory(test_config(), DuplicatePolicy::Overwrite).await;

    memory
        .add_to_memory("c1", &unit(1), "secret of the first story")
        .await
        .unwrap();
    assert_eq!(memory.get_context("c2", "secret").await.unwrap(), "");
}

#[tokio::test]
async fn test_maintenance_requests_oldest_unit_over_ceiling() {
    let (memory, _client) = ready_memory(test_config(), DuplicatePolicy::Overwrite).await;

    assert_eq!(memory.run_maintenance("c1").await.unwrap(), MaintenanceOutcome::Idle);

    write_units(&memory, "c1", 1..=20).await;
    assert_eq!(
        memory.run_maintenance("c1").await.unwrap(),
        MaintenanceOutcome::WithinCeiling { active_units: 20 }
    );

    write_units(&memory, "c1", 21..=21).await;
    match memory.run_maintenance("c1").await.unwrap() {
        MaintenanceOutcome::SummarizationPending(requests) => {
            assert_eq!(requests.len(), 1);
            assert_eq!(requests[0].conversation_id, "c1");
            assert_eq!(requests[0].unit_id, unit(1));
            assert_eq!(requests[0].full_text, "unit 1 text");
        }
        other => panic!("expected pending summarization, got {:?}", other),
    }

    // Nothing is removed until the summary arrives.
    assert_eq!(memory.stats("c1").await.unwrap().active_units, 21);
}

#[tokio::test]
async fn test_full_text_joins_chunks_in_index_order() {
    let config = MemoryConfig {
        max_active_units: 1,
        ..test_config()
    };
    let (memory, _client) = ready_memory(config, DuplicatePolicy::Overwrite).await;

    memory
        .add_to_memory("c1", &unit(1), "a b c d e f")
        .await
        .unwrap();
    memory.add_to_memory("c1", &unit(2), "g").await.unwrap();

    match memory.run_maintenance("c1").await.unwrap() {
        MaintenanceOutcome::SummarizationPending(requests) => {
            assert_eq!(requests[0].full_text, "a b c d d e f");
        }
        other => panic!("expected pending summarization, got {:?}", other),
    }
}

#[tokio::test]
async fn test_numeric_units_age_numerically() {
    let config = MemoryConfig {
        max_active_units: 1,
        ..test_config()
    };
    let (memory, _client) = ready_memory(config, DuplicatePolicy::Overwrite).await;

    memory.add_to_memory("c1", &unit(10), "later chapter").await.unwrap();
    memory.add_to_memory("c1", &unit(9), "earlier chapter").await.unwrap();

    match memory.run_maintenance("c1").await.unwrap() {
        MaintenanceOutcome::SummarizationPending(requests) => {
            assert_eq!(requests[0].unit_id, unit(9));
        }
        other => panic!("expected pending summarization, got {:?}", other),
    }
}

#[tokio::test]
async fn test_batch_size_limits_requests() {
    let config = MemoryConfig {
        max_active_units: 2,
        archive_batch_size: 2,
        ..test_config()
    };
    let (memory, _client) = ready_memory(config, DuplicatePolicy::Overwrite).await;
    write_units(&memory, "c1", 1..=6).await;

    match memory.run_maintenance("c1").await.unwrap() {
        MaintenanceOutcome::SummarizationPending(requests) => {
            let ids: Vec<UnitId> = requests.into_iter().map(|r| r.unit_id).collect();
            assert_eq!(ids, vec![unit(1), unit(2)]);
        }
        other => panic!("expected pending summarization, got {:?}", other),
    }
}

#[tokio::test]
async fn test_archive_moves_unit_between_tiers() {
    let (memory, client) = ready_memory(test_config(), DuplicatePolicy::Overwrite).await;
    write_units(&memory, "c1", 1..=21).await;

    let ack = memory
        .archive("c1", &unit(1), "the first unit in brief")
        .await
        .unwrap();
    assert_eq!(ack.removed_chunks, 1);

    let stats = memory.stats("c1").await.unwrap();
    assert_eq!(stats.active_units, 20);
    assert_eq!(stats.archived_units, 1);

    let active = client
        .inner
        .get_or_create_collection("c1:active", common::embedder())
        .await
        .unwrap();
    let remaining = active.get(&RecordFilter::Unit(unit(1))).await.unwrap();
    assert!(remaining.is_empty());

    let context = memory.get_context("c1", "first unit brief").await.unwrap();
    assert!(context.starts_with("[Past summary: the first unit in brief]"));

    assert!(matches!(
        memory.run_maintenance("c1").await.unwrap(),
        MaintenanceOutcome::WithinCeiling { active_units: 20 }
    ));
}

#[tokio::test]
async fn test_interrupted_archive_can_be_retried() {
    let (memory, client) = ready_memory(test_config(), DuplicatePolicy::Overwrite).await;
    write_units(&memory, "c1", 1..=21).await;

    Faults::set(&client.faults.delete, true);
    let err = memory.archive("c1", &unit(1), "brief").await.unwrap_err();
    assert!(matches!(err, MemoryError::ArchiveIncomplete { .. }));
    assert_eq!(err.unit_id(), Some(&unit(1)));
    Faults::set(&client.faults.delete, false);

    // The unit sits in both tiers and is not requested again.
    let stats = memory.stats("c1").await.unwrap();
    assert_eq!(stats.active_units, 21);
    assert_eq!(stats.archived_units, 1);
    assert_eq!(
        memory.run_maintenance("c1").await.unwrap(),
        MaintenanceOutcome::WithinCeiling { active_units: 20 }
    );

    let ack = memory.archive("c1", &unit(1), "brief").await.unwrap();
    assert_eq!(ack.removed_chunks, 1);
    let stats = memory.stats("c1").await.unwrap();
    assert_eq!(stats.active_units, 20);
    assert_eq!(stats.archived_units, 1);
}

#[tokio::test]
async fn test_failed_summary_write_leaves_memory_unchanged() {
    let (memory, client) = ready_memory(test_config(), DuplicatePolicy::Overwrite).await;
    write_units(&memory, "c1", 1..=1).await;

    Faults::set(&client.faults.upsert, true);
    let err = memory.archive("c1", &unit(1), "brief").await.unwrap_err();
    assert!(matches!(err, MemoryError::WriteFailed { .. }));

    let stats = memory.stats("c1").await.unwrap();
    assert_eq!(stats.active_units, 1);
    assert_eq!(stats.archived_units, 0);
}

#[tokio::test]
async fn test_failed_write_removes_partial_batch() {
    let (memory, client) = ready_memory(test_config(), DuplicatePolicy::Overwrite).await;

    Faults::set(&client.faults.add, true);
    let err = memory
        .add_to_memory("c1", &unit(3), "one two three four five six seven eight")
        .await
        .unwrap_err();
    match &err {
        MemoryError::WriteFailed {
            conversation_id,
            unit_id,
            ..
        } => {
            assert_eq!(conversation_id, "c1");
            assert_eq!(unit_id, &unit(3));
        }
        other => panic!("expected write failure, got {:?}", other),
    }
    Faults::set(&client.faults.add, false);

    assert_eq!(memory.stats("c1").await.unwrap().active_chunks, 0);

    let ack = memory
        .add_to_memory("c1", &unit(3), "one two three four five six seven eight")
        .await
        .unwrap();
    assert_eq!(ack.chunks, 3);
}

#[tokio::test]
async fn test_writing_archived_unit_reopens_it() {
    let (memory, _client) = ready_memory(test_config(), DuplicatePolicy::Overwrite).await;
    write_units(&memory, "c1", 1..=2).await;
    memory.archive("c1", &unit(1), "brief").await.unwrap();
    assert_eq!(memory.stats("c1").await.unwrap().archived_units, 1);

    memory
        .add_to_memory("c1", &unit(1), "rewritten first unit")
        .await
        .unwrap();

    let stats = memory.stats("c1").await.unwrap();
    assert_eq!(stats.active_units, 2);
    assert_eq!(stats.archived_units, 0);
    let context = memory.get_context("c1", "rewritten").await.unwrap();
    assert!(!context.contains("Past summary"));
}

#[tokio::test]
async fn test_retrieval_failure_names_conversation() {
    let (memory, client) = ready_memory(test_config(), DuplicatePolicy::Overwrite).await;
    write_units(&memory, "c1", 1..=1).await;

    Faults::set(&client.faults.query, true);
    let err = memory.get_context("c1", "unit").await.unwrap_err();
    assert!(matches!(err, MemoryError::StoreUnavailable { .. }));
    assert_eq!(err.conversation_id(), Some("c1"));
}

#[tokio::test]
async fn test_clear_and_delete_collections() {
    let (memory, client) = ready_memory(test_config(), DuplicatePolicy::Overwrite).await;
    write_units(&memory, "c1", 1..=3).await;
    memory.archive("c1", &unit(1), "brief").await.unwrap();

    let status = memory.clear_collection("c1").await.unwrap();
    assert_eq!(status, CollectionStatus::Dropped);
    assert_eq!(memory.get_context("c1", "unit").await.unwrap(), "");
    assert_eq!(memory.stats("c1").await.unwrap(), MemoryStats::default());

    assert_eq!(
        memory.delete_collection("c1").await.unwrap(),
        CollectionStatus::Dropped
    );
    assert!(client.inner.collection_names().await.is_empty());

    assert_eq!(
        memory.delete_collection("never-seen").await.unwrap(),
        CollectionStatus::Absent
    );
}

#[tokio::test]
async fn test_create_collection_makes_both_tiers() {
    let (memory, client) = ready_memory(test_config(), DuplicatePolicy::Overwrite).await;

    memory.create_collection("c9").await.unwrap();
    assert_eq!(
        client.inner.collection_names().await,
        vec!["c9:active".to_string(), "c9:archive".to_string()]
    );
}

#[tokio::test]
async fn test_zero_archive_results_skips_summaries() {
    let config = MemoryConfig {
        archive_results: 0,
        ..test_config()
    };
    let (memory, _client) = ready_memory(config, DuplicatePolicy::Overwrite).await;
    write_units(&memory, "c1", 1..=2).await;
    memory.archive("c1", &unit(1), "brief").await.unwrap();

    let context = memory.get_context("c1", "brief").await.unwrap();
    assert_eq!(context, "unit 2 text");
}

async fn unit_texts(client: &common::FaultyClient, conversation_id: &str, unit_id: &UnitId) -> Vec<String> {
    let active = client
        .inner
        .get_or_create_collection(&format!("{}:active", conversation_id), common::embedder())
        .await
        .unwrap();
    active
        .get(&RecordFilter::Unit(unit_id.clone()))
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.text)
        .collect()
}

#[tokio::test]
async fn test_failed_rewrite_keeps_previous_chunks() {
    let (memory, client) = ready_memory(test_config(), DuplicatePolicy::Reject).await;
    memory
        .add_to_memory("c1", &unit(3), "one two three four five six seven eight")
        .await
        .unwrap();
    let stats_before = memory.stats("c1").await.unwrap();
    let texts_before = unit_texts(&client, "c1", &unit(3)).await;
    let context_before = memory.get_context("c1", "three four").await.unwrap();
    assert_eq!(stats_before.active_chunks, 3);

    Faults::set(&client.faults.add, true);
    let err = memory
        .add_to_memory("c1", &unit(3), "a replacement that never lands anywhere")
        .await
        .unwrap_err();
    assert!(matches!(err, MemoryError::WriteFailed { .. }));
    Faults::set(&client.faults.add, false);

    assert_eq!(memory.stats("c1").await.unwrap(), stats_before);
    assert_eq!(unit_texts(&client, "c1", &unit(3)).await, texts_before);
    assert_eq!(
        memory.get_context("c1", "three four").await.unwrap(),
        context_before
    );
}

#[tokio::test]
async fn test_shorter_rewrite_drops_stale_chunks() {
    let config = MemoryConfig {
        max_active_units: 1,
        ..test_config()
    };
    let (memory, client) = ready_memory(config, DuplicatePolicy::Overwrite).await;

    let ack = memory
        .add_to_memory("c1", &unit(1), "a b c d e f g h i j")
        .await
        .unwrap();
    assert_eq!(ack.chunks, 4);

    let ack = memory.add_to_memory("c1", &unit(1), "new").await.unwrap();
    assert_eq!(ack.chunks, 1);
    assert_eq!(memory.stats("c1").await.unwrap().active_chunks, 1);
    assert_eq!(unit_texts(&client, "c1", &unit(1)).await, vec!["new".to_string()]);
    assert_eq!(memory.get_context("c1", "a b c").await.unwrap(), "new");

    memory.add_to_memory("c1", &unit(2), "other").await.unwrap();
    match memory.run_maintenance("c1").await.unwrap() {
        MaintenanceOutcome::SummarizationPending(requests) => {
            assert_eq!(requests[0].full_text, "new");
        }
        other => panic!("expected pending summarization, got {:?}", other),
    }
}

#[tokio::test]
async fn test_reopen_failure_does_not_fail_write() {
    for flag in ["get", "delete"] {
        let (memory, client) = ready_memory(test_config(), DuplicatePolicy::Overwrite).await;
        write_units(&memory, "c1", 1..=2).await;
        memory.archive("c1", &unit(1), "brief").await.unwrap();

        let fault = match flag {
            "get" => &client.faults.get,
            _ => &client.faults.delete,
        };
        Faults::set(&client.faults.archive_only, true);
        Faults::set(fault, true);
        let ack = memory
            .add_to_memory("c1", &unit(1), "rewritten first unit")
            .await
            .unwrap();
        assert_eq!(ack.chunks, 1);
        Faults::set(fault, false);
        Faults::set(&client.faults.archive_only, false);

        // Written, summary still present; maintenance leaves the unit alone.
        let stats = memory.stats("c1").await.unwrap();
        assert_eq!(stats.active_units, 2, "fault on {}", flag);
        assert_eq!(stats.archived_units, 1, "fault on {}", flag);
        assert_eq!(
            memory.run_maintenance("c1").await.unwrap(),
            MaintenanceOutcome::WithinCeiling { active_units: 1 }
        );

        // The next write of the unit removes the summary.
        memory
            .add_to_memory("c1", &unit(1), "rewritten first unit")
            .await
            .unwrap();
        assert_eq!(memory.stats("c1").await.unwrap().archived_units, 0);
    }
}
