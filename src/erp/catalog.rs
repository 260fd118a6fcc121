//! Reference data read from the ERP database

use super::{CustomerId, DocumentKind, ErpError, ErpSession, PrintTemplate, Row, TemplateId};
use serde::Deserialize;
use std::collections::HashMap;

/// Templates of one document type, ordered by name
pub fn fetch_templates<S: ErpSession>(session: &S, kind: DocumentKind) -> Result<Vec<PrintTemplate>, ErpError> {
    let sql = format!(
        "SELECT wz.wzw_Id, wz.wzw_Nazwa \
           FROM wy_Wzorzec wz \
           JOIN wy_Typ wt ON wz.wzw_Typ = wt.wtp_Id \
          WHERE wt.wtp_Nazwa = {} \
          ORDER BY wz.wzw_Nazwa",
        sql_literal(kind.template_type_name())
    );
    session.query(&sql)?.into_iter().map(parse_template).collect()
}

/// Display names of all customers, built from their main address
pub fn fetch_customers<S: ErpSession>(session: &S) -> Result<CustomerNames, ErpError> {
    let sql = "SELECT k.kh_Id, \
                      a.adr_Nazwa       AS Nazwa, \
                      a.adr_Adres       AS Adres, \
                      a.adr_Miejscowosc AS Miejscowosc \
                 FROM kh__Kontrahent k \
                 JOIN adr__Ewid a ON k.kh_Id = a.adr_IdObiektu \
                WHERE a.adr_TypAdresu = 1";
    let rows = session.query(sql)?;
    let mut names = HashMap::with_capacity(rows.len());
    for row in rows {
        let customer: CustomerRow = serde_json::from_value(serde_json::Value::Object(row))?;
        names.insert(customer.id, customer.display_name());
    }
    Ok(CustomerNames(names))
}

fn parse_template(row: Row) -> Result<PrintTemplate, ErpError> {
    Ok(serde_json::from_value(serde_json::Value::Object(row))?)
}

/// Quote a string for inline use in T-SQL
fn sql_literal(value: &str) -> String {
    format!("N'{}'", value.replace('\'', "''"))
}

#[derive(Deserialize)]
struct CustomerRow {
    #[serde(rename = "kh_Id")]
    id: CustomerId,
    #[serde(rename = "Nazwa", default)]
    name: Option<String>,
    #[serde(rename = "Adres", default)]
    address: Option<String>,
    #[serde(rename = "Miejscowosc", default)]
    city: Option<String>,
}

impl CustomerRow {
    fn display_name(&self) -> String {
        [&self.name, &self.address, &self.city]
            .iter()
            .map(|part| part.as_deref().unwrap_or("").trim())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Customer display names keyed by id
#[derive(Debug, Clone, Default)]
pub struct CustomerNames(HashMap<CustomerId, String>);

impl CustomerNames {
    /// Name for the prompt, `KH <id>` when the customer has no main address
    pub fn name(&self, id: CustomerId) -> String {
        self.0.get(&id).cloned().unwrap_or_else(|| format!("KH {id}"))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(CustomerId, String)> for CustomerNames {
    fn from_iter<I: IntoIterator<Item = (CustomerId, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Template names keyed by id, for log lines
#[derive(Debug, Clone, Default)]
pub struct TemplateNames(HashMap<TemplateId, String>);

impl TemplateNames {
    pub fn name(&self, id: TemplateId) -> String {
        self.0.get(&id).cloned().unwrap_or_else(|| format!("wzorzec {id}"))
    }
}

impl<'a> FromIterator<&'a PrintTemplate> for TemplateNames {
    fn from_iter<I: IntoIterator<Item = &'a PrintTemplate>>(iter: I) -> Self {
        Self(iter.into_iter().map(|t| (t.id, t.name.clone())).collect())
    }
}
