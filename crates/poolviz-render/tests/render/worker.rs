use std::time::Duration;

use poolviz_core::CompositingSettings;
use poolviz_editor::{EditorAction, EditorState, MaskAction, ViewportBounds};
use poolviz_render::{BlendJob, BlendTask, BlendWorker, CompositeCache, LiveView, RenderView};

use crate::support::{photo, renderer, square, square_points, CountingLoader};

fn job(tasks: &[(&str, u64)]) -> BlendJob {
    BlendJob {
        base: photo(48, 48),
        photo: photo(48, 48),
        tasks: tasks
            .iter()
            .map(|(id, signature)| BlendTask {
                mask: square(id, 4.0, 4.0, 30.0),
                pattern: None,
                signature: *signature,
            })
            .collect(),
        view: RenderView::export(100.0),
        settings: CompositingSettings::default(),
    }
}

#[tokio::test]
async fn test_stale_results_are_dropped() {
    let mut worker = BlendWorker::new();
    let cache = CompositeCache::new();

    assert!(worker.submit(job(&[("a", 7)])));
    let result = worker.recv().await.unwrap();
    assert!(cache.merge(result, Some(7)));
    assert!(cache.get("a", 7).is_some());

    assert!(worker.submit(job(&[("a", 9)])));
    let stale = worker.recv().await.unwrap();
    // the mask changed again while the job was running
    assert!(!cache.merge(stale, Some(10)));
    assert!(cache.get("a", 9).is_none());
    assert!(cache.get("a", 7).is_some());
    assert_eq!(worker.pending(), 0);
}

#[tokio::test]
async fn test_duplicate_jobs_are_not_resubmitted() {
    let mut worker = BlendWorker::new();
    assert!(worker.submit(job(&[("a", 1), ("b", 2)])));
    assert!(!worker.submit(job(&[("a", 1), ("b", 2)])));
    assert!(!worker.submit(job(&[])));
    assert_eq!(worker.pending(), 1);
}

#[tokio::test]
async fn test_drain_drops_removed_masks() {
    let mut worker = BlendWorker::new();
    let cache = CompositeCache::new();
    worker.submit(job(&[("a", 1), ("b", 2)]));

    let mut kept = 0;
    for _ in 0..200 {
        kept += worker.drain(&cache, |id| (id == "a").then_some(1));
        if worker.pending() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(kept, 1);
    assert!(cache.get("a", 1).is_some());
    assert!(cache.get("b", 2).is_none());
}

#[tokio::test]
async fn test_deferred_frame_converges_to_inline_frame() {
    let mut editor = EditorState::default();
    editor
        .dispatch(EditorAction::ResizeViewport(ViewportBounds::sized(64.0, 64.0)))
        .unwrap();
    editor
        .dispatch(EditorAction::LoadPhoto {
            width: 64,
            height: 64,
        })
        .unwrap();
    for offset in [4.0, 24.0] {
        editor
            .dispatch(EditorAction::Mask(MaskAction::Create {
                points: square_points(offset, offset, 30.0),
                name: None,
            }))
            .unwrap();
    }
    let renderer = renderer(CountingLoader::new());
    let deferred = LiveView::new(photo(64, 64));
    let mut worker = BlendWorker::new();

    deferred
        .render_frame_deferred(&editor, &renderer, &mut worker)
        .unwrap();
    assert_eq!(worker.pending(), 1);
    for _ in 0..200 {
        deferred.apply_results(&editor, &renderer, &mut worker);
        if worker.pending() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(deferred.cache().len(), 2);

    let settled = deferred
        .render_frame_deferred(&editor, &renderer, &mut worker)
        .unwrap();
    assert_eq!(worker.pending(), 0);

    let inline = LiveView::new(photo(64, 64))
        .render_frame(&editor, &renderer)
        .unwrap();
    assert_eq!(settled.data(), inline.data());
}
