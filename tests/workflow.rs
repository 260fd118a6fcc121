mod common;

use chrono::NaiveDate;
use common::{FakeDocument, FakeSession, ScriptedSelector};
use std::cell::Cell;
use subiekt_tools::batch::{BatchReport, OutputTarget, Pacing};
use subiekt_tools::erp::{DocumentKind, Period, SessionGuard};
use subiekt_tools::redate::{RedatePlan, RedateReport};
use subiekt_tools::store::TemplateStore;
use subiekt_tools::workflow::{load_invoice_batch, run_date_change, run_invoice_batch};
use tempfile::tempdir;

#[test]
fn test_load_invoice_batch_reads_catalogs() {
    let session = FakeSession::new(vec![FakeDocument::new("FS 1", 10)]);

    let data = load_invoice_batch(&session).unwrap();

    let names: Vec<&str> = data.templates.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Faktura standard", "Faktura z logo"]);
    assert_eq!(data.customers.name(subiekt_tools::CustomerId(20)), "Beta, Leśna 2, Gdańsk");
    assert_eq!(data.documents.len(), 1);

    let filters = session.filters.borrow();
    assert_eq!(filters[0].kind, DocumentKind::SalesInvoice);
    assert_eq!(filters[0].period, Period::previous_month());
}

#[test]
fn test_invoice_run_prints_and_asks_for_delay_once() {
    let dir = tempdir().unwrap();
    let store = TemplateStore::new(dir.path().join("store.csv"));
    let docs = vec![FakeDocument::new("FS 1", 10), FakeDocument::new("FS 2", 20)];
    let session = FakeSession::new(docs.clone());
    let mut selector = ScriptedSelector::new(&[(10, Some(5), true), (20, Some(6), false)]);
    let asked = Cell::new(0);

    let report = run_invoice_batch(
        &session,
        &store,
        &mut selector,
        &OutputTarget::Printer {
            name: None,
            copies: 1,
        },
        || {
            asked.set(asked.get() + 1);
            Pacing::none()
        },
    )
    .unwrap();

    assert_eq!(asked.get(), 1);
    assert_eq!(report.processed, 2);
    assert_eq!(selector.asked[0].1, "Alfa, Polna 1, Kraków");
    assert_eq!(docs[1].printed()[0].0, subiekt_tools::TemplateId(6));
}

#[test]
fn test_invoice_run_without_documents_does_nothing() {
    let dir = tempdir().unwrap();
    let store = TemplateStore::new(dir.path().join("store.csv"));
    let session = FakeSession::new(Vec::new());
    let mut selector = ScriptedSelector::new(&[]);

    let report = run_invoice_batch(
        &session,
        &store,
        &mut selector,
        &OutputTarget::Directory(dir.path().to_path_buf()),
        || panic!("no delay prompt without documents"),
    )
    .unwrap();

    assert_eq!(report, BatchReport::default());
    assert!(selector.asked.is_empty());
}

#[test]
fn test_date_change_dry_run_touches_nothing() {
    let docs = vec![FakeDocument::new("MM 1/2024", 1), FakeDocument::new("MM 2/2024", 1)];
    let session = FakeSession::new(docs.clone());
    let plan = RedatePlan {
        new_date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        dry_run: true,
    };

    let report = run_date_change(&session, &plan).unwrap();

    assert_eq!(report.changed, 2);
    assert_eq!(docs[0].date(), NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
    assert_eq!(docs[0].saves(), 0);
    assert_eq!(session.filters.borrow()[0].kind, DocumentKind::WarehouseTransfer);
}

#[test]
fn test_date_change_saves_only_mm_documents() {
    let docs = vec![FakeDocument::new("MM 1/2024", 1), FakeDocument::new("PZ 5/2024", 1)];
    let session = FakeSession::new(docs.clone());
    let new_date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    let plan = RedatePlan {
        new_date,
        dry_run: false,
    };

    let report = run_date_change(&session, &plan).unwrap();

    assert_eq!(
        report,
        RedateReport {
            changed: 1,
            ignored: 1,
            failed: 0
        }
    );
    assert_eq!(docs[0].date(), new_date);
    assert_eq!(docs[0].saves(), 1);
    assert_eq!(docs[1].saves(), 0);
    assert_eq!(docs[1].date(), NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
}

#[test]
fn test_session_guard_logs_off_on_early_return() {
    let session = FakeSession::new(Vec::new());
    let logged_off = session.logged_off.clone();

    let result = (|| -> anyhow::Result<()> {
        let guard = SessionGuard::new(session);
        let _ = guard.session();
        anyhow::bail!("document window crashed")
    })();

    assert!(result.is_err());
    assert!(logged_off.get());
}
