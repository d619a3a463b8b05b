//! Batch production and document assembly against the in-process engine

mod common;

use common::{fake_size, page_sizes, FakeEngine};
use tweetpress::document::{DocumentBuilder, PageSizing};
use tweetpress::producer::BatchImageProducer;
use tweetpress::workdir::WorkDir;
use tweetpress::{AuthorRef, ContentItem, Error, LayoutVariant, SizingPolicy};

fn items(texts: &[&str]) -> Vec<ContentItem> {
    let author = AuthorRef::new("Alice", "alice");
    texts
        .iter()
        .map(|t| ContentItem::new(*t, author.clone()))
        .collect()
}

#[tokio::test]
async fn images_are_index_aligned_with_items() {
    let engine = FakeEngine::new();
    let producer = BatchImageProducer::new(engine.clone());

    let batch = items(&["first", "second", "third"]);
    let images = producer.produce(&batch, LayoutVariant::Compact).await.unwrap();

    assert_eq!(images.len(), 3);
    for (i, image) in images.iter().enumerate() {
        assert_eq!(image.source_index(), i);
    }
    let markups = engine.markups();
    assert!(markups[0].contains("first"));
    assert!(markups[1].contains("second"));
    assert!(markups[2].contains("third"));
}

#[tokio::test]
async fn one_session_serves_the_whole_batch() {
    let engine = FakeEngine::new();
    let producer = BatchImageProducer::new(engine.clone());

    producer
        .produce(&items(&["a", "b", "c", "d"]), LayoutVariant::Square)
        .await
        .unwrap();

    assert_eq!(engine.opened(), 1);
    assert_eq!(engine.closed(), 1);
    assert_eq!(engine.live(), 0);
}

#[tokio::test]
async fn failed_item_aborts_batch_and_releases_session() {
    let engine = FakeEngine::failing_at(1);
    let producer = BatchImageProducer::new(engine.clone());

    let err = producer
        .produce(&items(&["ok", "boom", "never"]), LayoutVariant::Compact)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RenderTimeout(_)));
    assert_eq!(engine.markups().len(), 1, "rendering stops at the failed item");
    assert_eq!(engine.closed(), 1);
    assert_eq!(engine.live(), 0);
}

#[tokio::test]
async fn unavailable_engine_surfaces_and_leaks_nothing() {
    let engine = FakeEngine::unavailable();
    let producer = BatchImageProducer::new(engine.clone());

    let err = producer
        .produce(&items(&["x"]), LayoutVariant::Square)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::EngineUnavailable(_)));
    assert_eq!(engine.live(), 0);
}

#[tokio::test]
async fn empty_batch_never_starts_the_engine() {
    let engine = FakeEngine::new();
    let producer = BatchImageProducer::new(engine.clone());

    let images = producer.produce(&[], LayoutVariant::Square).await.unwrap();
    assert!(images.is_empty());
    assert_eq!(engine.opened(), 0);
}

#[tokio::test]
async fn declared_sizes_match_the_raster() {
    let producer = BatchImageProducer::new(FakeEngine::new());
    let images = producer
        .produce(&items(&["a", "b"]), LayoutVariant::Compact)
        .await
        .unwrap();

    for image in &images {
        let size = imagesize::blob_size(image.png()).unwrap();
        assert_eq!(size.width as u32, image.width());
        assert_eq!(size.height as u32, image.height());
    }
}

#[tokio::test]
async fn document_has_one_page_per_item_in_order() {
    let producer = BatchImageProducer::new(FakeEngine::new());
    let batch = items(&["one", "two", "three", "four", "five"]);
    let images = producer.produce(&batch, LayoutVariant::Compact).await.unwrap();

    let document = DocumentBuilder::new(PageSizing::MatchImage).build(&images).unwrap();
    assert_eq!(document.page_count, batch.len());

    let sizing = LayoutVariant::Compact.sizing_policy();
    let expected: Vec<(i64, i64)> = (0..batch.len())
        .map(|i| {
            let (w, h) = fake_size(&sizing, i);
            (w as i64, h as i64)
        })
        .collect();
    assert_eq!(page_sizes(&document.bytes), expected);
}

#[tokio::test]
async fn explicit_sizing_overrides_the_variant() {
    let producer = BatchImageProducer::new(FakeEngine::new());
    let sizing = SizingPolicy::FitContent { width: 400 };
    let images = producer
        .produce_with(&items(&["a"]), LayoutVariant::Square, &sizing)
        .await
        .unwrap();
    assert_eq!(images[0].width(), 40);
}

#[tokio::test]
async fn spooled_documents_leave_the_work_dir_empty() {
    let root = std::env::temp_dir().join(format!("tweetpress-pipeline-{}", std::process::id()));
    let producer = BatchImageProducer::new(FakeEngine::new());
    let images = producer
        .produce(&items(&["a", "b"]), LayoutVariant::Square)
        .await
        .unwrap();

    let builder = DocumentBuilder::new(PageSizing::A4).spool_to(WorkDir::new(&root));
    let document = builder.build(&images).unwrap();

    assert_eq!(page_sizes(&document.bytes), vec![(595, 842), (595, 842)]);
    assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
    std::fs::remove_dir_all(&root).ok();
}
