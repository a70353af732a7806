//! End-to-end behaviour of the sync engine against the in-memory store.

use cairn_backend::RemoteBackend;
use cairn_core::{fingerprint, ConflictPolicy, CoreError, RepoContext, Repository, ScriptedPrompter};
use cairn_crypto::{IV_SIZE, MAGIC, MAGIC_SIZE};
use cairn_sync::{
    clone_repository, create_remote, FileOutcome, PullOptions, SkipReason, SyncDirection,
    SyncError, SyncState, SyncSummary,
};
use cairn_testkit::prelude::*;
use proptest::prelude::*;
use std::sync::Arc;

fn outcome_of<'a>(files: &'a [cairn_sync::FileReport], path: &str) -> &'a FileOutcome {
    &files
        .iter()
        .find(|f| f.path == path)
        .unwrap_or_else(|| panic!("no report for {path}"))
        .outcome
}

// ============================================================================
// Commit and push
// ============================================================================

#[tokio::test]
async fn commit_snapshots_the_stage() {
    let ws = TestWorkspace::new();
    let commit = ws
        .commit_files(&[("A.txt", b"hello"), ("B.txt", b"world")], "init")
        .await;

    assert!(ws.stage().is_empty());
    assert_eq!(commit.file_count, 2);
    assert!(!commit.pushed);
    let hashes: Vec<_> = commit.files.iter().map(|f| f.hash.clone().unwrap()).collect();
    assert!(hashes.contains(&fingerprint(b"hello")));
    assert!(hashes.contains(&fingerprint(b"world")));
}

#[tokio::test]
async fn first_push_creates_and_marks_pushed() {
    let h = SyncHarness::new();
    h.workspace
        .commit_files(&[("A.txt", b"hello"), ("B.txt", b"world")], "init")
        .await;

    let engine = h.engine();
    let summary = engine.push().await.unwrap();
    assert_eq!(summary.created, 2);
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.commits, 1);
    assert_eq!(engine.state(), SyncState::Synced);

    assert!(h.workspace.unpushed_commits().is_empty());
    assert!(h.workspace.commits()[0].pushed_at.is_some());
    assert_eq!(h.remote_bytes("A.txt").unwrap(), b"hello");
    assert_eq!(h.remote_bytes("B.txt").unwrap(), b"world");
}

#[tokio::test]
async fn pushing_unchanged_files_again_uploads_nothing() {
    let h = SyncHarness::new();
    h.workspace
        .commit_files(&[("A.txt", b"hello"), ("B.txt", b"world")], "init")
        .await;
    h.engine().push().await.unwrap();

    // Nothing unpushed: the pass is a no-op.
    let again = h.engine().push().await.unwrap();
    assert_eq!(again.uploaded(), 0);
    assert_eq!(again.commits, 0);

    // Same bytes committed again: every file is up to date.
    h.workspace
        .commit_files(&[("A.txt", b"hello"), ("B.txt", b"world")], "again")
        .await;
    let summary = h.engine().push().await.unwrap();
    assert_eq!(
        (summary.created, summary.updated, summary.skipped, summary.failed),
        (0, 0, 2, 0)
    );
    assert_eq!(
        outcome_of(&summary.files, "A.txt"),
        &FileOutcome::Skipped(SkipReason::UpToDate)
    );
    assert_eq!(h.backend.upload_count(), 2);
}

#[tokio::test]
async fn changed_file_is_updated() {
    let h = SyncHarness::new();
    h.workspace.commit_files(&[("A.txt", b"v1")], "one").await;
    h.engine().push().await.unwrap();
    h.workspace.commit_files(&[("A.txt", b"v2")], "two").await;

    let summary = h.engine().push().await.unwrap();
    assert_eq!(summary.updated, 1);
    assert_eq!(h.remote_bytes("A.txt").unwrap(), b"v2");
}

#[tokio::test]
async fn deleted_file_is_skipped_not_failed() {
    let h = SyncHarness::new();
    h.workspace
        .commit_files(&[("A.txt", b"a"), ("gone.txt", b"g")], "init")
        .await;
    h.workspace.remove("gone.txt");

    let summary = h.engine().push().await.unwrap();
    assert_eq!(summary.created, 1);
    assert_eq!(
        outcome_of(&summary.files, "gone.txt"),
        &FileOutcome::Skipped(SkipReason::LocalMissing)
    );
    assert_eq!(summary.commits, 1);
}

#[tokio::test]
async fn per_file_failure_does_not_stop_the_push() {
    let h = SyncHarness::new();
    h.backend.fail_key("B.txt");
    h.workspace
        .commit_files(&[("A.txt", b"a"), ("B.txt", b"b"), ("C.txt", b"c")], "init")
        .await;

    let summary = h.engine().push().await.unwrap();
    assert_eq!(summary.created, 2);
    assert_eq!(summary.failed, 1);
    assert!(matches!(outcome_of(&summary.files, "B.txt"), FileOutcome::Failed(_)));
    // Commits are marked pushed even with failures; re-running picks them up.
    assert!(h.workspace.unpushed_commits().is_empty());
}

#[tokio::test]
async fn amend_after_push_is_rejected() {
    let h = SyncHarness::new();
    h.workspace
        .commit_files(&[("A.txt", b"hello"), ("B.txt", b"world")], "init")
        .await;
    h.engine().push().await.unwrap();

    assert!(matches!(
        h.workspace.amend("new message"),
        Err(CoreError::AmendRejected { .. })
    ));
}

#[tokio::test]
async fn force_push_replays_but_skips_matching_files() {
    let h = SyncHarness::new();
    h.workspace
        .commit_files(&[("A.txt", b"hello"), ("B.txt", b"world")], "init")
        .await;
    h.engine().push().await.unwrap();

    let summary = h.confirming_engine().force_push().await.unwrap();
    assert_eq!(summary.uploaded(), 0);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.commits, 1);
    assert_eq!(h.backend.upload_count(), 2);
}

#[tokio::test]
async fn force_push_restores_a_wiped_remote() {
    let h = SyncHarness::new();
    h.workspace.commit_files(&[("A.txt", b"hello")], "init").await;
    h.engine().push().await.unwrap();
    h.backend.remove_object(TEST_TARGET, "A.txt").await.unwrap();

    let summary = h.confirming_engine().force_push().await.unwrap();
    assert_eq!(summary.created, 1);
    assert_eq!(h.remote_bytes("A.txt").unwrap(), b"hello");
}

// ============================================================================
// Encryption
// ============================================================================

#[tokio::test]
async fn encrypted_push_writes_magic_and_fresh_iv() {
    let h = SyncHarness::encrypted();
    h.workspace.commit_files(&[("D.txt", b"secret")], "enc").await;
    h.engine().push().await.unwrap();

    let first = h.remote_bytes("D.txt").unwrap();
    assert_eq!(&first[..MAGIC_SIZE], &MAGIC);
    assert_ne!(&first[MAGIC_SIZE..], b"secret");

    // The stored checksum is of ciphertext, so a replay re-uploads.
    h.confirming_engine().force_push().await.unwrap();
    let second = h.remote_bytes("D.txt").unwrap();
    assert_eq!(&second[..MAGIC_SIZE], &MAGIC);
    assert_ne!(
        &first[MAGIC_SIZE..MAGIC_SIZE + IV_SIZE],
        &second[MAGIC_SIZE..MAGIC_SIZE + IV_SIZE]
    );
}

#[tokio::test]
async fn encrypted_round_trip_through_pull() {
    let h = SyncHarness::encrypted();
    h.workspace.commit_files(&[("dir/D.txt", b"secret")], "enc").await;
    h.engine().push().await.unwrap();
    h.workspace.remove("dir/D.txt");

    let summary = h.engine().pull(PullOptions::new().force(true)).await.unwrap();
    assert_eq!(summary.downloaded, 1);
    assert_eq!(h.workspace.read("dir/D.txt"), b"secret");

    // No temporary artifacts left behind.
    let tmp = h.config.temp_dir.clone().unwrap();
    let leftovers = std::fs::read_dir(&tmp).map(|d| d.count()).unwrap_or(0);
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn plaintext_remote_object_is_copied_when_encryption_is_on() {
    let h = SyncHarness::encrypted();
    h.put_remote("plain.txt", b"not encrypted");

    let summary = h.engine().pull(PullOptions::new().force(true)).await.unwrap();
    assert_eq!(summary.downloaded, 1);
    assert_eq!(h.workspace.read("plain.txt"), b"not encrypted");
}

#[tokio::test]
async fn wrong_passphrase_fails_per_file() {
    let h = SyncHarness::encrypted();
    h.workspace.commit_files(&[("D.txt", b"secret")], "enc").await;
    h.engine().push().await.unwrap();
    h.workspace.remove("D.txt");

    let engine = cairn_sync::SyncEngine::new(
        h.workspace.repo.clone(),
        h.backend.clone(),
        TEST_TARGET,
        Arc::new(ScriptedPrompter::new()),
        h.config.clone().with_passphrase("not the passphrase"),
    );
    let summary = engine.pull(PullOptions::new().force(true)).await.unwrap();
    assert_eq!(summary.failed, 1);
    assert!(!h.workspace.exists("D.txt"));
}

// ============================================================================
// Pull
// ============================================================================

#[tokio::test]
async fn pull_downloads_remote_only_file() {
    let h = SyncHarness::new();
    h.put_remote("C.txt", b"from remote");

    let summary = h.engine().pull(PullOptions::new().force(true)).await.unwrap();
    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.bytes, 11);
    assert_eq!(h.workspace.read("C.txt"), b"from remote");
}

#[tokio::test]
async fn pull_requires_confirmation() {
    let h = SyncHarness::new();
    h.put_remote("C.txt", b"c");

    let engine = h.engine_with(ScriptedPrompter::new().then_confirm(false));
    assert!(matches!(
        engine.pull(PullOptions::new()).await,
        Err(SyncError::Cancelled)
    ));
    assert!(!h.workspace.exists("C.txt"));
    assert_eq!(engine.state(), SyncState::Error);
}

#[tokio::test]
async fn pull_never_writes_repository_state() {
    let h = SyncHarness::new();
    h.workspace.commit_files(&[("A.txt", b"a")], "init").await;
    h.put_remote(".cairn/commits.json", b"[]");
    h.put_remote(".cairn/config.json", br#"{"encryption": true}"#);
    h.put_remote("B.txt", b"b");

    let summary = h
        .engine()
        .pull(PullOptions::new().force(true).policy(ConflictPolicy::TakeRemote))
        .await
        .unwrap();
    assert_eq!(summary.downloaded, 1);
    assert_eq!(
        outcome_of(&summary.files, ".cairn/commits.json"),
        &FileOutcome::Skipped(SkipReason::Ignored)
    );
    assert_eq!(
        outcome_of(&summary.files, ".cairn/config.json"),
        &FileOutcome::Skipped(SkipReason::Ignored)
    );
    assert_eq!(h.workspace.log(None).len(), 1);
    assert!(!h.workspace.config().encryption);
}

#[tokio::test]
async fn sync_down_and_download_skip_repository_state() {
    let h = SyncHarness::new();
    h.workspace.commit_files(&[("A.txt", b"a")], "init").await;
    h.put_remote(".cairn/commits.json", b"[]");

    let SyncSummary::Pull(summary) = h.confirming_engine().sync(SyncDirection::Pull).await.unwrap()
    else {
        panic!("expected a pull summary");
    };
    assert_eq!(summary.downloaded, 0);
    assert_eq!(h.workspace.log(None).len(), 1);

    let summary = h
        .engine()
        .download_keys(&[".cairn/commits.json".to_string()], None)
        .await
        .unwrap();
    assert_eq!(
        outcome_of(&summary.files, ".cairn/commits.json"),
        &FileOutcome::Skipped(SkipReason::Ignored)
    );
    assert_eq!(h.workspace.log(None).len(), 1);
}

#[tokio::test]
async fn matching_files_are_skipped_under_every_policy() {
    for policy in [ConflictPolicy::Ask, ConflictPolicy::KeepLocal, ConflictPolicy::TakeRemote] {
        let h = SyncHarness::new();
        h.workspace.write("A.txt", b"same");
        h.put_remote("A.txt", b"same");

        let summary = h
            .engine()
            .pull(PullOptions::new().force(true).policy(policy))
            .await
            .unwrap();
        assert_eq!(summary.skipped, 1, "{policy:?}");
        assert_eq!(
            outcome_of(&summary.files, "A.txt"),
            &FileOutcome::Skipped(SkipReason::UpToDate)
        );
        assert_eq!(h.backend.download_count(), 0);
    }
}

#[tokio::test]
async fn keep_local_never_overwrites() {
    let h = SyncHarness::new();
    h.workspace.write("A.txt", b"local");
    h.put_remote("A.txt", b"remote");

    let summary = h
        .engine()
        .pull(PullOptions::new().force(true).policy(ConflictPolicy::KeepLocal))
        .await
        .unwrap();
    assert_eq!(
        outcome_of(&summary.files, "A.txt"),
        &FileOutcome::Skipped(SkipReason::KeptLocal)
    );
    assert_eq!(h.workspace.read("A.txt"), b"local");
}

#[tokio::test]
async fn take_remote_always_overwrites() {
    let h = SyncHarness::new();
    h.workspace.write("A.txt", b"local");
    h.put_remote("A.txt", b"remote");

    let summary = h
        .engine()
        .pull(PullOptions::new().force(true).policy(ConflictPolicy::TakeRemote))
        .await
        .unwrap();
    assert_eq!(summary.downloaded, 1);
    assert_eq!(h.workspace.read("A.txt"), b"remote");
}

#[tokio::test]
async fn ask_policy_prompts_per_file() {
    let h = SyncHarness::new();
    for (key, local, remote) in [("a.txt", "la", "ra"), ("b.txt", "lb", "rb")] {
        h.workspace.write(key, local.as_bytes());
        h.put_remote(key, remote.as_bytes());
    }

    let prompter = Arc::new(ScriptedPrompter::new().then_select(1).then_select(0));
    let summary = h
        .engine_sharing(prompter.clone())
        .pull(PullOptions::new().force(true))
        .await
        .unwrap();
    assert_eq!(prompter.asked().len(), 2);
    assert_eq!(summary.downloaded, 1);
    assert_eq!(h.workspace.read("a.txt"), b"ra");
    assert_eq!(h.workspace.read("b.txt"), b"lb");
}

#[tokio::test]
async fn ask_policy_for_all_stops_prompting() {
    let h = SyncHarness::new();
    for key in ["a.txt", "b.txt", "c.txt"] {
        h.workspace.write(key, b"local");
        h.put_remote(key, b"remote");
    }

    let prompter = Arc::new(ScriptedPrompter::new().then_select(3));
    let summary = h
        .engine_sharing(prompter.clone())
        .pull(PullOptions::new().force(true))
        .await
        .unwrap();
    assert_eq!(prompter.asked().len(), 1);
    assert_eq!(summary.downloaded, 3);
    assert_eq!(h.workspace.read("c.txt"), b"remote");
}

#[tokio::test]
async fn dry_run_plans_without_io() {
    let h = SyncHarness::new();
    h.put_remote("a.txt", b"a");
    h.put_remote("b.txt", b"b");

    let summary = h.engine().pull(PullOptions::new().dry_run(true)).await.unwrap();
    let keys: Vec<_> = summary.planned.iter().map(|o| o.key.as_str()).collect();
    assert_eq!(keys, ["a.txt", "b.txt"]);
    assert_eq!(summary.downloaded, 0);
    assert_eq!(h.backend.download_count(), 0);
    assert!(!h.workspace.exists("a.txt"));
}

#[tokio::test]
async fn file_filter_limits_the_pull() {
    let h = SyncHarness::new();
    h.put_remote("a.txt", b"a");
    h.put_remote("b.txt", b"b");

    let summary = h
        .engine()
        .pull(PullOptions::new().force(true).files(["b.txt"]))
        .await
        .unwrap();
    assert_eq!(summary.downloaded, 1);
    assert!(!h.workspace.exists("a.txt"));
    assert!(h.workspace.exists("b.txt"));

    assert!(matches!(
        h.engine()
            .pull(PullOptions::new().force(true).files(["nope.txt"]))
            .await,
        Err(SyncError::Validation(_))
    ));
}

#[tokio::test]
async fn downloads_run_in_windows_and_count_failures() {
    let mut h = SyncHarness::new();
    h.config = h.config.clone().with_concurrency_window(2);
    for i in 0..7 {
        h.put_remote(&format!("f{i}.txt"), format!("data {i}").as_bytes());
    }
    h.backend.fail_key("f3.txt");

    let summary = h.engine().pull(PullOptions::new().force(true)).await.unwrap();
    assert_eq!(summary.downloaded, 6);
    assert_eq!(summary.failed, 1);
    assert_eq!(h.workspace.read("f6.txt"), b"data 6");
    assert!(!h.workspace.exists("f3.txt"));
    let order: Vec<_> = summary.files.iter().map(|f| f.path.clone()).collect();
    let mut sorted = order.clone();
    sorted.sort();
    assert_eq!(order, sorted);
}

#[tokio::test]
async fn unreachable_target_aborts_pull() {
    let h = SyncHarness::new();
    let engine = cairn_sync::SyncEngine::new(
        h.workspace.repo.clone(),
        h.backend.clone(),
        "missing",
        Arc::new(ScriptedPrompter::new()),
        h.config.clone(),
    );
    assert!(matches!(
        engine.pull(PullOptions::new().force(true)).await,
        Err(SyncError::RemoteInaccessible { .. })
    ));
}

// ============================================================================
// Sync, diff and object commands
// ============================================================================

#[tokio::test]
async fn sync_push_uploads_the_whole_tree() {
    let h = SyncHarness::new();
    h.workspace.write("a.txt", b"a");
    h.workspace.write("sub/b.txt", b"b");
    h.workspace.write("debug.log", b"ignored");

    let summary = h.confirming_engine().sync(SyncDirection::Push).await.unwrap();
    let SyncSummary::Push(summary) = summary else {
        panic!("expected a push summary");
    };
    assert_eq!(summary.created, 2);
    assert_eq!(h.remote_keys(), ["a.txt", "sub/b.txt"]);
    assert!(h.workspace.commits().is_empty());

    h.workspace.write("a.txt", b"changed");
    let SyncSummary::Push(again) = h.confirming_engine().sync(SyncDirection::Push).await.unwrap()
    else {
        panic!("expected a push summary");
    };
    assert_eq!(again.updated, 1);
    assert_eq!(
        outcome_of(&again.files, "sub/b.txt"),
        &FileOutcome::Skipped(SkipReason::UpToDate)
    );
    assert_eq!(h.backend.upload_count(), 3);
}

#[tokio::test]
async fn sync_pull_overwrites_after_one_confirmation() {
    let h = SyncHarness::new();
    h.workspace.write("a.txt", b"local");
    h.put_remote("a.txt", b"remote");
    h.put_remote("b.txt", b"b");

    let prompter = Arc::new(ScriptedPrompter::new().then_confirm(true));
    let summary = h
        .engine_sharing(prompter.clone())
        .sync(SyncDirection::Pull)
        .await
        .unwrap();
    assert_eq!(summary.failed(), 0);
    assert_eq!(prompter.asked().len(), 1);
    assert_eq!(h.workspace.read("a.txt"), b"remote");
    assert_eq!(h.workspace.read("b.txt"), b"b");
}

#[tokio::test]
async fn diff_classifies_tracked_files() {
    let h = SyncHarness::new();
    h.workspace
        .commit_files(&[("same.txt", b"s"), ("mod.txt", b"v1"), ("del.txt", b"d")], "init")
        .await;
    h.engine().push().await.unwrap();
    h.workspace.write("mod.txt", b"v2");
    h.workspace.remove("del.txt");
    h.workspace.write("new.txt", b"n");
    h.workspace.add(&["new.txt"]).unwrap();
    h.put_remote("zzz.txt", b"z");
    h.put_remote("other.txt", b"o");

    let diff = h.engine().diff().await.unwrap();
    assert_eq!(diff.added, ["new.txt"]);
    assert_eq!(diff.modified, ["mod.txt"]);
    assert_eq!(diff.deleted, ["del.txt"]);
    assert_eq!(diff.remote_only, ["other.txt", "zzz.txt"]);
}

#[tokio::test]
async fn object_commands() {
    let h = SyncHarness::new();
    h.workspace.write("docs/a.txt", b"a");
    let engine = h.confirming_engine();

    let missing = h.workspace.root().join("missing.txt");
    let uploaded = engine
        .upload_paths(&[h.workspace.root().join("docs/a.txt"), missing])
        .await
        .unwrap();
    assert_eq!((uploaded.created, uploaded.failed), (1, 1));

    let listed = engine.list_remote(Some("docs/")).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].checksum.as_deref(), Some(fingerprint(b"a").as_str()));

    let out = h.workspace.scratch().join("out");
    let downloaded = engine
        .download_keys(&["docs/a.txt".to_string()], Some(out.clone()))
        .await
        .unwrap();
    assert_eq!(downloaded.downloaded, 1);
    assert_eq!(std::fs::read(out.join("a.txt")).unwrap(), b"a");

    let deleted = engine
        .delete_keys(&["docs/a.txt".to_string(), "nope".to_string()])
        .await
        .unwrap();
    assert_eq!((deleted.deleted, deleted.failed), (1, 1));
    assert!(h.remote_keys().is_empty());
}

#[tokio::test]
async fn declined_delete_removes_nothing() {
    let h = SyncHarness::new();
    h.put_remote("a.txt", b"a");
    let engine = h.engine_with(ScriptedPrompter::new().then_confirm(false));
    assert!(matches!(
        engine.delete_keys(&["a.txt".to_string()]).await,
        Err(SyncError::Cancelled)
    ));
    assert_eq!(h.remote_keys(), ["a.txt"]);
}

#[tokio::test]
async fn remote_info_reports_reachability() {
    let h = SyncHarness::new();
    let (info, reachable) = h.engine().remote_info().await.unwrap();
    assert!(info.is_none());
    assert!(reachable);
}

// ============================================================================
// Clone and remote creation
// ============================================================================

#[tokio::test]
async fn clone_populates_a_new_repository() {
    let h = SyncHarness::new();
    h.put_remote("a.txt", b"a");
    h.put_remote("nested/b.txt", b"b");
    let parent = h.workspace.scratch();

    let cloned = clone_repository(
        h.workspace.home(),
        &parent,
        TEST_TARGET,
        h.backend.clone(),
        Arc::new(ScriptedPrompter::new()),
        h.config.clone(),
    )
    .await
    .unwrap();

    assert_eq!(cloned.root, parent.join(TEST_TARGET));
    assert_eq!(cloned.summary.downloaded, 2);
    assert_eq!(std::fs::read(cloned.root.join("nested/b.txt")).unwrap(), b"b");
    assert!(cloned.remote.cloned_at.is_some());

    let repo = Repository::open(RepoContext::new(&cloned.root, h.workspace.home())).unwrap();
    assert_eq!(repo.config().s3_bucket.as_deref(), Some(TEST_TARGET));
    assert_eq!(repo.remote().unwrap().target, TEST_TARGET);

    // A second clone into the same parent refuses to overwrite.
    assert!(matches!(
        clone_repository(
            h.workspace.home(),
            &parent,
            TEST_TARGET,
            h.backend.clone(),
            Arc::new(ScriptedPrompter::new()),
            h.config.clone(),
        )
        .await,
        Err(SyncError::Validation(_))
    ));
}

#[tokio::test]
async fn create_remote_links_the_repository() {
    let h = SyncHarness::new();
    let remote = create_remote(&h.workspace.repo, h.backend.as_ref(), "fresh").await.unwrap();
    assert_eq!(remote.target, "fresh");
    assert!(remote.created_at.is_some());
    assert_eq!(h.workspace.config().s3_bucket.as_deref(), Some("fresh"));
    assert!(h.backend.check_reachable("fresh").await);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn push_then_replay_uploads_nothing(tree in file_tree_strategy(5)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let h = SyncHarness::new();
            let files: Vec<(&str, &[u8])> =
                tree.iter().map(|(p, c)| (p.as_str(), c.as_slice())).collect();
            h.workspace.commit_files(&files, "tree").await;

            let first = h.engine().push().await.unwrap();
            prop_assert_eq!(first.created, tree.len());

            let replay = h.confirming_engine().force_push().await.unwrap();
            prop_assert_eq!(replay.uploaded(), 0);
            prop_assert_eq!(replay.skipped, tree.len());
            Ok(())
        })?;
    }

    #[test]
    fn pull_reproduces_remote_bytes(tree in file_tree_strategy(5)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let h = SyncHarness::new();
            for (path, contents) in &tree {
                h.put_remote(path, contents);
            }
            let summary = h.engine().pull(PullOptions::new().force(true)).await.unwrap();
            prop_assert_eq!(summary.downloaded, tree.len());
            for (path, contents) in &tree {
                prop_assert_eq!(&h.workspace.read(path), contents);
            }
            Ok(())
        })?;
    }
}
