//! In-memory stand-in for the ERP session

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use subiekt_tools::erp::{
    CustomerId, Destination, DocumentFilter, ErpDocument, ErpError, ErpSession, Row, SessionInfo, TemplateId,
};
use subiekt_tools::selector::{RememberChoice, SelectionRequest, TemplateSelector};

#[derive(Debug)]
struct DocState {
    number: String,
    customer: i64,
    net: f64,
    date: RefCell<NaiveDate>,
    printed: RefCell<Vec<(TemplateId, Destination)>>,
    saves: Cell<usize>,
    fail_print: bool,
}

#[derive(Debug, Clone)]
pub struct FakeDocument(Rc<DocState>);

impl FakeDocument {
    pub fn new(number: &str, customer: i64) -> Self {
        Self(Rc::new(DocState {
            number: number.to_string(),
            customer,
            net: 100.0,
            date: RefCell::new(NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()),
            printed: RefCell::new(Vec::new()),
            saves: Cell::new(0),
            fail_print: false,
        }))
    }

    pub fn failing(number: &str, customer: i64) -> Self {
        let doc = Self::new(number, customer);
        let state = Rc::try_unwrap(doc.0).unwrap();
        Self(Rc::new(DocState {
            fail_print: true,
            ..state
        }))
    }

    pub fn printed(&self) -> Vec<(TemplateId, Destination)> {
        self.0.printed.borrow().clone()
    }

    pub fn date(&self) -> NaiveDate {
        *self.0.date.borrow()
    }

    pub fn saves(&self) -> usize {
        self.0.saves.get()
    }
}

impl ErpDocument for FakeDocument {
    fn customer_id(&self) -> Result<CustomerId, ErpError> {
        Ok(CustomerId(self.0.customer))
    }

    fn display_number(&self) -> Result<String, ErpError> {
        Ok(self.0.number.clone())
    }

    fn net_value(&self) -> Result<f64, ErpError> {
        Ok(self.0.net)
    }

    fn issue_date(&self) -> Result<NaiveDate, ErpError> {
        Ok(*self.0.date.borrow())
    }

    fn set_issue_date(&self, date: NaiveDateTime) -> Result<(), ErpError> {
        *self.0.date.borrow_mut() = date.date();
        Ok(())
    }

    fn save(&self) -> Result<(), ErpError> {
        self.0.saves.set(self.0.saves.get() + 1);
        Ok(())
    }

    fn print(&self, template: TemplateId, destination: &Destination) -> Result<(), ErpError> {
        if self.0.fail_print {
            return Err(ErpError::Com {
                member: "DrukujWgUstawien".into(),
                hresult: 0x8002_0009_u32 as i32,
                message: "drukarka offline".into(),
            });
        }
        self.0.printed.borrow_mut().push((template, destination.clone()));
        Ok(())
    }
}

/// Session answering the two catalog queries and handing out fixed documents
pub struct FakeSession {
    pub documents: Vec<FakeDocument>,
    pub filters: RefCell<Vec<DocumentFilter>>,
    pub logged_off: Rc<Cell<bool>>,
}

impl FakeSession {
    pub fn new(documents: Vec<FakeDocument>) -> Self {
        Self {
            documents,
            filters: RefCell::new(Vec::new()),
            logged_off: Rc::new(Cell::new(false)),
        }
    }
}

fn row(value: serde_json::Value) -> Row {
    match value {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    }
}

impl ErpSession for FakeSession {
    type Document = FakeDocument;

    fn info(&self) -> Result<SessionInfo, ErpError> {
        Ok(SessionInfo {
            version: "1.0".into(),
            database: "sfera_demo".into(),
            server: "127.0.0.1".into(),
        })
    }

    fn query(&self, sql: &str) -> Result<Vec<Row>, ErpError> {
        if sql.contains("wy_Wzorzec") {
            Ok(vec![
                row(json!({"wzw_Id": 5, "wzw_Nazwa": "Faktura standard"})),
                row(json!({"wzw_Id": 6, "wzw_Nazwa": "Faktura z logo"})),
            ])
        } else if sql.contains("kh__Kontrahent") {
            Ok(vec![
                row(json!({"kh_Id": 10, "Nazwa": "Alfa", "Adres": "Polna 1", "Miejscowosc": "Kraków"})),
                row(json!({"kh_Id": 20, "Nazwa": "Beta", "Adres": "Leśna 2", "Miejscowosc": "Gdańsk"})),
            ])
        } else {
            Ok(Vec::new())
        }
    }

    fn select_documents(&self, filter: &DocumentFilter) -> Result<Vec<FakeDocument>, ErpError> {
        self.filters.borrow_mut().push(*filter);
        Ok(self.documents.clone())
    }

    fn logoff(&mut self) -> Result<(), ErpError> {
        self.logged_off.set(true);
        Ok(())
    }
}

/// Selector answering from a script, recording every request
pub struct ScriptedSelector {
    answers: Vec<(i64, Option<i64>, bool)>,
    pub asked: Vec<(CustomerId, String, usize, usize, Option<TemplateId>)>,
}

impl ScriptedSelector {
    /// `(customer, template, remember)` answers; unknown customers cancel
    pub fn new(answers: &[(i64, Option<i64>, bool)]) -> Self {
        Self {
            answers: answers.to_vec(),
            asked: Vec::new(),
        }
    }

    pub fn asked_customers(&self) -> Vec<i64> {
        self.asked.iter().map(|a| a.0 .0).collect()
    }
}

impl TemplateSelector for ScriptedSelector {
    fn select(&mut self, request: &SelectionRequest<'_>, remember: &dyn RememberChoice) -> Option<TemplateId> {
        self.asked.push((
            request.customer_id,
            request.customer_name.to_string(),
            request.position,
            request.total,
            request.preselect,
        ));
        let (_, template, keep) = self
            .answers
            .iter()
            .find(|(customer, _, _)| *customer == request.customer_id.0)
            .copied()?;
        let template = TemplateId(template?);
        if keep {
            remember.remember(template);
        }
        Some(template)
    }
}
