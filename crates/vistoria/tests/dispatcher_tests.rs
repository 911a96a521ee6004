//! End-to-end dispatch through the worker pool.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{fake_collaborators, wait_finished, SlowVision, TestHarness};
use vistoria::db::{file_repo, job_repo};
use vistoria::model::{ConditionStatus, FileKind, InspectionKind, ProcessingStatus};
use vistoria::processing::process_artifacts;
use vistoria::worker::{BatchDispatcher, JobKind, JobPayload};

#[test]
fn images_only_batch_returns_images_and_costs_handles() {
    let harness = TestHarness::new();
    let id = harness.inspection(InspectionKind::Entry);
    harness.entry(id, "bathroom", "faucet", ConditionStatus::Damaged);
    let photo = harness.write_upload("faucet.jpg", b"jpeg");
    harness.register(id, &photo);

    let dispatcher = harness.dispatcher(fake_collaborators("Worn faucet.", ""), 2);
    let handles = dispatcher.dispatch_batch(id, &[photo], &[], &[]).unwrap();

    assert_eq!(
        handles.keys().copied().collect::<Vec<_>>(),
        vec![JobKind::Images, JobKind::Costs]
    );

    let images = wait_finished(&dispatcher, &handles[&JobKind::Images]);
    assert_eq!(images.status, "success");
    let result = images.result.unwrap();
    assert_eq!(result["processed_files"], 1);
    assert_eq!(result["results"][0]["status"], "processed");

    let costs = wait_finished(&dispatcher, &handles[&JobKind::Costs]);
    assert_eq!(costs.status, "success");
    assert_eq!(costs.result.unwrap()["total_cost"], 150.0);

    dispatcher.shutdown();
}

#[test]
fn full_batch_dispatches_every_class() {
    let harness = TestHarness::new();
    let id = harness.inspection(InspectionKind::Entry);
    let photo = harness.write_upload("wall.png", b"png");
    let audio = harness.write_upload("notes.wav", b"RIFF");
    let doc = harness.write_upload("deed.txt", b"Registro do imovel");
    for path in [&photo, &audio, &doc] {
        harness.register(id, path);
    }

    let dispatcher = harness.dispatcher(fake_collaborators("Wall ok.", "Next room"), 1);
    let handles = dispatcher
        .dispatch_batch(id, &[photo], &[audio], &[doc])
        .unwrap();
    assert_eq!(handles.len(), 4);

    for handle in handles.values() {
        assert_eq!(wait_finished(&dispatcher, handle).status, "success");
    }
    let audio_view = dispatcher.job_status(&handles[&JobKind::Audios]).unwrap();
    assert_eq!(audio_view.result.unwrap()["results"][0]["status"], "transcribed");

    dispatcher.shutdown();
}

#[test]
fn comparison_of_unknown_inspection_fails() {
    let harness = TestHarness::new();
    let dispatcher = harness.dispatcher(fake_collaborators("", ""), 1);

    let handle = dispatcher.dispatch_comparison(1, 2).unwrap();
    let view = wait_finished(&dispatcher, &handle);

    assert_eq!(view.status, "failed");
    assert_eq!(view.task_id, handle);
    let row = job_repo::find_by_id(&harness.db, &handle).unwrap().unwrap();
    assert_eq!(row.last_error.as_deref(), Some("Inspection 1 not found"));

    dispatcher.shutdown();
}

#[test]
fn redispatch_requires_finished_job() {
    let harness = TestHarness::new();
    let dispatcher = harness.dispatcher(fake_collaborators("", ""), 1);

    let err = dispatcher.redispatch("no-such-job").unwrap_err();
    assert!(err.to_string().contains("no-such-job"));

    dispatcher.shutdown();
}

#[test]
fn resume_redispatches_only_pending_artifacts() {
    let harness = TestHarness::new();
    let id = harness.inspection(InspectionKind::Entry);
    let done = harness.write_upload("done.jpg", b"jpeg");
    let left = harness.write_upload("left.jpg", b"jpeg");
    let done_id = harness.register(id, &done);
    let left_id = harness.register(id, &left);

    // A previous process finished one photo and left a job running.
    let ctx = harness.context(fake_collaborators("First pass.", ""));
    let report = process_artifacts(&ctx, FileKind::Photo, id, &[done]);
    assert_eq!(report.processed_files, 1);
    job_repo::insert(
        &harness.db,
        &job_repo::JobRow {
            id: "stale-job".to_string(),
            kind: "images".to_string(),
            inspection_id: Some(id),
            payload: serde_json::to_string(&JobPayload::Artifacts {
                kind: FileKind::Photo,
                inspection_id: id,
                paths: vec![left.clone()],
            })
            .unwrap(),
            state: "running".to_string(),
            attempts: 1,
            last_error: None,
            result: None,
            created_at: "2020-01-01T00:00:00.000000Z".to_string(),
            updated_at: "2020-01-01T00:00:00.000000Z".to_string(),
            finished_at: None,
        },
    )
    .unwrap();

    let dispatcher = harness.dispatcher(fake_collaborators("Second pass.", ""), 1);
    let handles = dispatcher.resume_pending().unwrap();
    assert_eq!(handles.len(), 1);

    let view = wait_finished(&dispatcher, &handles[0]);
    assert_eq!(view.status, "success");
    let result = view.result.unwrap();
    assert_eq!(result["processed_files"], 1);
    assert_eq!(result["results"][0]["file_path"], left.as_str());

    let stale = dispatcher.job_status("stale-job").unwrap();
    assert_eq!(stale.status, "failed");
    assert_eq!(stale.result.unwrap()["error"], job_repo::INTERRUPTED);

    let done_record = file_repo::find_by_id(&harness.db, done_id).unwrap().unwrap();
    assert_eq!(done_record.attempts, 1);
    assert_eq!(done_record.ai_analysis.as_deref(), Some("First pass."));
    let left_record = file_repo::find_by_id(&harness.db, left_id).unwrap().unwrap();
    assert_eq!(left_record.processing_status, ProcessingStatus::Completed);
    assert_eq!(left_record.ai_analysis.as_deref(), Some("Second pass."));

    dispatcher.shutdown();
}

#[test]
fn resume_leaves_redispatched_old_job_alone() {
    let harness = TestHarness::new();
    let id = harness.inspection(InspectionKind::Entry);
    let busy = harness.write_upload("busy.jpg", b"jpeg");
    let old = harness.write_upload("old.jpg", b"jpeg");
    harness.register(id, &busy);
    harness.register(id, &old);
    job_repo::insert(
        &harness.db,
        &job_repo::JobRow {
            id: "old-job".to_string(),
            kind: "images".to_string(),
            inspection_id: Some(id),
            payload: serde_json::to_string(&JobPayload::Artifacts {
                kind: FileKind::Photo,
                inspection_id: id,
                paths: vec![old.clone()],
            })
            .unwrap(),
            state: "success".to_string(),
            attempts: 1,
            last_error: None,
            result: None,
            created_at: "2020-01-01T00:00:00.000000Z".to_string(),
            updated_at: "2020-01-01T00:00:00.000000Z".to_string(),
            finished_at: Some("2020-01-01T00:00:01.000000Z".to_string()),
        },
    )
    .unwrap();

    let mut collaborators = fake_collaborators("", "");
    collaborators.vision = Arc::new(SlowVision(Duration::from_millis(500)));
    let dispatcher = harness.dispatcher(collaborators, 1);

    // The only worker is busy, so the redispatched job waits in the queue.
    dispatcher.dispatch_batch(id, &[busy], &[], &[]).unwrap();
    dispatcher.redispatch("old-job").unwrap();
    dispatcher.resume_pending().unwrap();

    let queued = dispatcher.job_status("old-job").unwrap();
    assert_ne!(queued.status, "failed");
    let row = job_repo::find_by_id(&harness.db, "old-job").unwrap().unwrap();
    assert!(row.last_error.is_none());

    let finished = wait_finished(&dispatcher, "old-job");
    assert_eq!(finished.status, "success");

    dispatcher.shutdown();
}

#[test]
fn dispatcher_starts_without_workers_fails() {
    let harness = TestHarness::new();
    let runner = vistoria::JobRunner::new(std::sync::Arc::new(
        harness.context(fake_collaborators("", "")),
    ));
    assert!(BatchDispatcher::start(runner, 0, None).is_err());
}
