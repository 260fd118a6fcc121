mod common;

use common::{FakeDocument, ScriptedSelector};
use std::cell::RefCell;
use std::path::PathBuf;
use std::time::Duration;
use subiekt_tools::batch::{distinct_customers, Batch, BatchReport, OutputTarget, Pacing};
use subiekt_tools::erp::catalog::CustomerNames;
use subiekt_tools::erp::{CustomerId, Destination, PrintTemplate, TemplateId};
use subiekt_tools::store::TemplateStore;
use tempfile::tempdir;

fn templates() -> Vec<PrintTemplate> {
    vec![PrintTemplate::new(5, "Standard"), PrintTemplate::new(6, "Z logo")]
}

fn printer() -> OutputTarget {
    OutputTarget::Printer {
        name: None,
        copies: 1,
    }
}

#[test]
fn test_distinct_customers_keep_first_occurrence_order() {
    let docs = vec![
        FakeDocument::new("FS 1", 20),
        FakeDocument::new("FS 2", 10),
        FakeDocument::new("FS 3", 20),
        FakeDocument::new("FS 4", 30),
    ];
    let customers: Vec<i64> = distinct_customers(&docs).into_iter().map(|c| c.0).collect();
    assert_eq!(customers, vec![20, 10, 30]);
}

#[test]
fn test_selector_called_once_per_customer_in_order() {
    let dir = tempdir().unwrap();
    let store = TemplateStore::new(dir.path().join("store.csv"));
    let templates = templates();
    let names: CustomerNames = [(CustomerId(10), "Alfa".to_string())].into_iter().collect();
    let docs = vec![
        FakeDocument::new("FS 1", 20),
        FakeDocument::new("FS 2", 10),
        FakeDocument::new("FS 3", 20),
        FakeDocument::new("FS 4", 30),
    ];
    let mut selector = ScriptedSelector::new(&[(20, Some(5), false), (10, Some(6), false), (30, Some(5), false)]);

    let batch = Batch::new(&templates, &names, &store);
    batch.resolve_templates(&docs, &mut selector);

    assert_eq!(selector.asked_customers(), vec![20, 10, 30]);
    let progress: Vec<(usize, usize)> = selector.asked.iter().map(|a| (a.2, a.3)).collect();
    assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
    assert_eq!(selector.asked[0].1, "KH 20");
    assert_eq!(selector.asked[1].1, "Alfa");
}

#[test]
fn test_document_without_template_is_skipped_untouched() {
    let dir = tempdir().unwrap();
    let store = TemplateStore::new(dir.path().join("store.csv"));
    let templates = templates();
    let names = CustomerNames::default();
    let docs = vec![FakeDocument::new("FS 1", 10), FakeDocument::new("FS 2", 20)];
    // customer 20 cancels
    let mut selector = ScriptedSelector::new(&[(10, Some(5), false)]);

    let batch = Batch::new(&templates, &names, &store);
    let report = batch.run(&docs, &mut selector, &printer(), &mut Pacing::none());

    assert_eq!(
        docs[0].printed(),
        vec![(
            TemplateId(5),
            Destination::Printer {
                name: None,
                copies: 1
            }
        )]
    );
    assert!(docs[1].printed().is_empty());
    assert_eq!(
        report,
        BatchReport {
            processed: 1,
            skipped: 1,
            failed: 0
        }
    );
}

#[test]
fn test_remembered_choice_is_persisted_and_preselected_next_time() {
    let dir = tempdir().unwrap();
    let store = TemplateStore::new(dir.path().join("store.csv"));
    let templates = templates();
    let names = CustomerNames::default();
    let docs = vec![FakeDocument::new("FS 1", 10)];

    let batch = Batch::new(&templates, &names, &store);
    let mut first = ScriptedSelector::new(&[(10, Some(6), true)]);
    batch.resolve_templates(&docs, &mut first);
    assert_eq!(first.asked[0].4, None);
    assert_eq!(store.get(CustomerId(10)), Some(TemplateId(6)));

    let mut second = ScriptedSelector::new(&[(10, Some(6), false)]);
    batch.resolve_templates(&docs, &mut second);
    assert_eq!(second.asked[0].4, Some(TemplateId(6)));
}

#[test]
fn test_not_remembered_choice_leaves_store_alone() {
    let dir = tempdir().unwrap();
    let store = TemplateStore::new(dir.path().join("store.csv"));
    let templates = templates();
    let names = CustomerNames::default();
    let docs = vec![FakeDocument::new("FS 1", 10)];

    let batch = Batch::new(&templates, &names, &store);
    let mut selector = ScriptedSelector::new(&[(10, Some(6), false)]);
    batch.resolve_templates(&docs, &mut selector);

    assert!(!store.path().exists());
}

#[test]
fn test_failed_document_does_not_stop_the_batch() {
    let dir = tempdir().unwrap();
    let store = TemplateStore::new(dir.path().join("store.csv"));
    let templates = templates();
    let names = CustomerNames::default();
    let docs = vec![
        FakeDocument::failing("FS 1", 10),
        FakeDocument::new("FS 2", 10),
    ];
    let mut selector = ScriptedSelector::new(&[(10, Some(5), false)]);

    let batch = Batch::new(&templates, &names, &store);
    let report = batch.run(&docs, &mut selector, &printer(), &mut Pacing::none());

    assert_eq!(docs[1].printed().len(), 1);
    assert_eq!(
        report,
        BatchReport {
            processed: 1,
            skipped: 0,
            failed: 1
        }
    );
}

#[test]
fn test_pause_between_jobs_but_not_after_the_last() {
    let dir = tempdir().unwrap();
    let store = TemplateStore::new(dir.path().join("store.csv"));
    let templates = templates();
    let names = CustomerNames::default();
    let docs = vec![
        FakeDocument::new("FS 1", 10),
        FakeDocument::new("FS 2", 10),
        FakeDocument::new("FS 3", 10),
    ];
    let mut selector = ScriptedSelector::new(&[(10, Some(5), false)]);
    let pauses = RefCell::new(Vec::new());

    let batch = Batch::new(&templates, &names, &store);
    let mut pacing = Pacing::with_pause(Duration::from_secs(3), |d| pauses.borrow_mut().push(d));
    batch.run(&docs, &mut selector, &printer(), &mut pacing);
    drop(pacing);

    assert_eq!(pauses.into_inner(), vec![Duration::from_secs(3); 2]);
}

#[test]
fn test_export_uses_file_per_document() {
    let dir = tempdir().unwrap();
    let store = TemplateStore::new(dir.path().join("store.csv"));
    let templates = templates();
    let names = CustomerNames::default();
    let docs = vec![FakeDocument::new("FS 7/02/2024", 10)];
    let mut selector = ScriptedSelector::new(&[(10, Some(6), false)]);
    let out = PathBuf::from("wydruki");

    let batch = Batch::new(&templates, &names, &store);
    batch.run(&docs, &mut selector, &OutputTarget::Directory(out.clone()), &mut Pacing::none());

    assert_eq!(
        docs[0].printed(),
        vec![(TemplateId(6), Destination::File(out.join("FS_7_02_2024.pdf")))]
    );
}

#[test]
fn test_skipped_document_does_not_pause() {
    let dir = tempdir().unwrap();
    let store = TemplateStore::new(dir.path().join("store.csv"));
    let templates = templates();
    let names = CustomerNames::default();
    let docs = vec![
        FakeDocument::new("FS 1", 20),
        FakeDocument::new("FS 2", 10),
        FakeDocument::new("FS 3", 10),
    ];
    // customer 20 cancels
    let mut selector = ScriptedSelector::new(&[(10, Some(5), false)]);
    let pauses = RefCell::new(0);

    let batch = Batch::new(&templates, &names, &store);
    let mut pacing = Pacing::with_pause(Duration::from_secs(1), |_| *pauses.borrow_mut() += 1);
    let report = batch.run(&docs, &mut selector, &printer(), &mut pacing);
    drop(pacing);

    assert_eq!(
        report,
        BatchReport {
            processed: 2,
            skipped: 1,
            failed: 0
        }
    );
    assert_eq!(pauses.into_inner(), 1);
}
