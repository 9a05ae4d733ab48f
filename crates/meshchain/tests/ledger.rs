//! End-to-end tests of the Ledger over both store backends.

use std::sync::Arc;

use meshchain::core::SealPolicy;
use meshchain::store::{MemoryStore, RecordStore, SqliteStore};
use meshchain::{
    generate_id, Ledger, LedgerConfig, LedgerError, Metadata, Record, RecordError, RecordKind,
    SubmitResult, WireRecord,
};
use meshchain_testkit::{
    pems, root_metadata, rotating_chain, signature_base64, signed_root, signed_update,
    update_metadata,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn memory_ledger() -> Ledger<MemoryStore> {
    init_tracing();
    Ledger::new(MemoryStore::new(), LedgerConfig::default())
}

#[tokio::test]
async fn root_signed_by_own_key_is_accepted() {
    let ledger = memory_ledger();
    let metadata = root_metadata("", &[0]);
    let id = metadata.id.clone();
    let sig = signature_base64(&metadata, b"random data", 0);

    let result = ledger
        .submit_root(metadata, &b"random data"[..], &sig)
        .await
        .unwrap();
    assert!(result.is_accepted());

    let head = ledger.get(&id).await.unwrap().unwrap();
    assert_eq!(head.key(), result.key());
    assert_eq!(head.kind(), RecordKind::Root);
}

#[tokio::test]
async fn root_signed_by_foreign_key_is_rejected() {
    let ledger = memory_ledger();
    let metadata = root_metadata("", &[0]);
    let id = metadata.id.clone();
    let sig = signature_base64(&metadata, b"random data", 1);

    let err = ledger
        .submit_root(metadata, &b"random data"[..], &sig)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Record(RecordError::NoMatchingKey)));
    assert!(err.is_authorization_failure());
    assert!(ledger.get(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn local_id_must_match_the_derived_id() {
    let ledger = memory_ledger();
    let keys = pems(&[0]);
    let metadata = Metadata {
        id: generate_id("", &keys),
        local_id: "my-id".into(),
        public_keys: keys,
    };
    let sig = signature_base64(&root_metadata("", &[0]), b"asdf", 0);

    let err = ledger
        .submit_root(metadata, &b"asdf"[..], &sig)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Record(RecordError::IdMismatch)));
    assert!(!err.is_authorization_failure());
}

#[tokio::test]
async fn resubmission_is_a_duplicate() {
    let ledger = memory_ledger();
    let metadata = root_metadata("dup", &[0]);
    let sig = signature_base64(&metadata, b"x", 0);

    let first = ledger
        .submit_root(metadata.clone(), &b"x"[..], &sig)
        .await
        .unwrap();
    let second = ledger.submit_root(metadata, &b"x"[..], &sig).await.unwrap();
    assert_eq!(second, SubmitResult::Duplicate(first.key()));
}

#[tokio::test]
async fn authority_rotates_with_each_update() {
    let ledger = memory_ledger();
    let root_meta = root_metadata("doc", &[0]);
    let id = root_meta.id.clone();
    let sig = signature_base64(&root_meta, b"v1", 0);
    ledger.submit_root(root_meta, &b"v1"[..], &sig).await.unwrap();

    // v2 hands authority to key 1, signed by the root's key 0.
    let head = ledger.get(&id).await.unwrap().unwrap();
    let v2 = update_metadata(&head, &[1]);
    let sig = signature_base64(&v2, b"v2", 0);
    ledger
        .submit_update(&id, v2, &b"v2"[..], &sig)
        .await
        .unwrap();

    // Key 0 no longer governs the head.
    let head = ledger.get(&id).await.unwrap().unwrap();
    let v3 = update_metadata(&head, &[2]);
    let stale = signature_base64(&v3, b"v3", 0);
    let err = ledger
        .submit_update(&id, v3.clone(), &b"v3"[..], &stale)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Record(RecordError::NoMatchingKey)));

    let sig = signature_base64(&v3, b"v3", 1);
    ledger
        .submit_update(&id, v3, &b"v3"[..], &sig)
        .await
        .unwrap();

    let head = ledger.get(&id).await.unwrap().unwrap();
    assert_eq!(&head.data()[..], b"v3");
    assert_eq!(head.depth(), 2);
    assert_eq!(head.authorizing_keys(), pems(&[1]).as_slice());
    assert_eq!(ledger.history(&id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn update_signed_by_its_own_new_key_is_rejected() {
    let ledger = memory_ledger();
    let root_meta = root_metadata("doc", &[0]);
    let id = root_meta.id.clone();
    let sig = signature_base64(&root_meta, b"v1", 0);
    ledger.submit_root(root_meta, &b"v1"[..], &sig).await.unwrap();

    let head = ledger.get(&id).await.unwrap().unwrap();
    let v2 = update_metadata(&head, &[1]);
    let sig = signature_base64(&v2, b"v2", 1);
    let err = ledger
        .submit_update(&id, v2, &b"v2"[..], &sig)
        .await
        .unwrap_err();
    assert!(err.is_authorization_failure());
    assert_eq!(ledger.history(&id).await.unwrap().len(), 1);
}

/// Key 0 hands the chain to key 1, takes it back, then hands it to key 1
/// again with the first update's exact metadata and data.
async fn check_reverted_update_is_accepted<S: RecordStore>(ledger: Ledger<S>) {
    let root_meta = root_metadata("revert", &[0]);
    let id = root_meta.id.clone();
    let sig = signature_base64(&root_meta, b"v1", 0);
    ledger.submit_root(root_meta, &b"v1"[..], &sig).await.unwrap();

    let handoffs: [(&[usize], usize, &[u8]); 3] =
        [(&[1], 0, b"a"), (&[0], 1, b"b"), (&[1], 0, b"a")];
    let mut keys = Vec::new();
    for (owners, signer, data) in handoffs {
        let head = ledger.get(&id).await.unwrap().unwrap();
        let metadata = update_metadata(&head, owners);
        let sig = signature_base64(&metadata, data, signer);
        let result = ledger
            .submit_update(&id, metadata, data, &sig)
            .await
            .unwrap();
        assert!(result.is_accepted());
        keys.push(result.key());
    }
    assert_ne!(keys[0], keys[2]);

    let head = ledger.get(&id).await.unwrap().unwrap();
    assert_eq!(&head.data()[..], b"a");
    assert_eq!(head.depth(), 3);

    // Key 1 holds authority again.
    let next = update_metadata(&head, &[2]);
    let sig = signature_base64(&next, b"c", 1);
    assert!(ledger
        .submit_update(&id, next, &b"c"[..], &sig)
        .await
        .unwrap()
        .is_accepted());
    assert_eq!(ledger.history(&id).await.unwrap().len(), 5);
}

#[tokio::test]
async fn reverted_update_is_accepted_in_memory() {
    check_reverted_update_is_accepted(memory_ledger()).await;
}

#[tokio::test]
async fn reverted_update_is_accepted_in_sqlite() {
    init_tracing();
    let ledger = Ledger::new(SqliteStore::open_memory().unwrap(), LedgerConfig::default());
    check_reverted_update_is_accepted(ledger).await;
}

#[tokio::test]
async fn update_of_unknown_chain() {
    let ledger = memory_ledger();
    let metadata = root_metadata("", &[0]);
    let sig = signature_base64(&metadata, b"", 0);

    let err = ledger
        .submit_update("no-such-id", metadata, &b""[..], &sig)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::ParentNotFound(id) if id == "no-such-id"));
}

#[tokio::test]
async fn wire_replication_between_ledgers() {
    init_tracing();
    let chain = rotating_chain("replicated", 3);
    let id = chain[0].id().to_string();

    let replica = Ledger::new(SqliteStore::open_memory().unwrap(), LedgerConfig::default());
    replica
        .ingest_root_json(&chain[0].to_json().unwrap())
        .await
        .unwrap();
    for record in &chain[1..] {
        let result = replica
            .ingest_update_json(&id, &record.to_json().unwrap())
            .await
            .unwrap();
        assert_eq!(result, SubmitResult::Accepted(record.key()));
    }

    let head = replica.get(&id).await.unwrap().unwrap();
    assert_eq!(head.hash(), chain[2].hash());
    assert_eq!(head.public_keys(), chain[2].public_keys());

    let expected: Vec<_> = chain.iter().map(|r| r.key()).collect();
    assert_eq!(replica.history(&id).await.unwrap(), expected);
}

#[tokio::test]
async fn wire_seal_hash_is_checked_unless_disabled() {
    init_tracing();
    let root: Record = signed_root("sealed", &[0], 0, b"data").into();
    let mut wire = root.to_wire().unwrap();
    wire.seal.hash = meshchain::Sha256Hash::hash(b"lies").to_base64();
    let json = wire.to_json().unwrap();

    let strict = Ledger::new(MemoryStore::new(), LedgerConfig::default());
    let err = strict.ingest_root_json(&json).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Record(RecordError::SealHashMismatch { .. })
    ));

    let lenient = Ledger::new(
        MemoryStore::new(),
        LedgerConfig {
            verify_seal_hash: false,
            ..LedgerConfig::default()
        },
    );
    let result = lenient.ingest_root_json(&json).await.unwrap();
    assert_eq!(result.key(), root.key());
}

#[tokio::test]
async fn oversized_wire_data_is_rejected() {
    init_tracing();
    let root: Record = signed_root("big", &[0], 0, &[7u8; 64]).into();
    let ledger = Ledger::new(
        MemoryStore::new(),
        LedgerConfig {
            max_data_len: 32,
            ..LedgerConfig::default()
        },
    );
    let err = ledger
        .ingest_root_json(&root.to_json().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::DataTooLarge { len: 64, max: 32 }));
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let ledger = memory_ledger();
    let err = ledger.ingest_root_json("not json").await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Record(RecordError::MalformedWire(_))
    ));
}

#[tokio::test]
async fn sqlite_ledger_survives_restart() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");

    let root: Arc<Record> = Arc::new(signed_root("restart", &[0], 0, b"v1").into());
    let update: Record = signed_update(&root, &[1], 0, b"v2").into();
    let id = root.id().to_string();

    {
        let ledger = Ledger::new(SqliteStore::open(&path).unwrap(), LedgerConfig::default());
        ledger.ingest_root_json(&root.to_json().unwrap()).await.unwrap();
        ledger
            .ingest_update_json(&id, &update.to_json().unwrap())
            .await
            .unwrap();
    }

    let ledger = Ledger::new(SqliteStore::open(&path).unwrap(), LedgerConfig::default());
    let head = ledger.get(&id).await.unwrap().unwrap();
    assert_eq!(head.as_ref(), &update);

    // The reloaded head still governs the chain: key 1 may extend it.
    let v3 = update_metadata(&head, &[2]);
    let sig = signature_base64(&v3, b"v3", 1);
    assert!(ledger
        .submit_update(&id, v3, &b"v3"[..], &sig)
        .await
        .unwrap()
        .is_accepted());
}

#[tokio::test]
async fn concurrent_submissions() {
    init_tracing();
    let ledger = Arc::new(Ledger::new(
        SqliteStore::open_memory().unwrap(),
        LedgerConfig::default(),
    ));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                let metadata = root_metadata(&format!("concurrent-{}", i), &[i]);
                let sig = signature_base64(&metadata, b"data", i);
                ledger.submit_root(metadata, &b"data"[..], &sig).await
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().unwrap().is_accepted());
    }
    let id = root_metadata("concurrent-0", &[0]).id;
    assert_eq!(ledger.store().history(&id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn parsed_wire_record_matches_sender() {
    let chain = rotating_chain("parse", 2);
    let wire = WireRecord::from_json(&chain[1].to_json().unwrap()).unwrap();
    let parsed = wire
        .into_update(Some(chain[0].clone()), SealPolicy::Verify)
        .unwrap();
    assert_eq!(parsed.hash(), chain[1].hash());
    assert_eq!(&parsed.metadata().public_keys, &chain[1].metadata().public_keys);
}
