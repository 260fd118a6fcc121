//! Subiekt GT through the Sfera COM server

use super::com::{ComApartment, Dispatch, Variant};
use super::{
    CustomerId, Destination, DocumentFilter, EXPORT_FORMAT_PDF, ErpConfig, ErpDocument, ErpError, ErpSession, Row,
    SessionInfo, TemplateId,
};
use chrono::{NaiveDate, NaiveDateTime};

const GTA_PRODUKT_SUBIEKT: i32 = 1;
const GTA_AUTENTYKACJA_SQL: i32 = 0;
const GTA_URUCHOM_DOPASUJ: i32 = 1;
const GTA_URUCHOM_Z_INTERFEJSEM: i32 = 1;
const GTA_FILTR_OKRES_DOWOLNY_MIESIAC: i32 = 20;

const AD_USE_CLIENT: i32 = 3;
const AD_OPEN_STATIC: i32 = 3;
const AD_LOCK_READ_ONLY: i32 = 1;
const AD_CMD_TEXT: i32 = 1;

/// Running Subiekt instance (`Uruchom`) with its COM apartment
pub struct SferaSession {
    subiekt: Dispatch,
    // released after every interface pointer above
    _apartment: ComApartment,
}

impl SferaSession {
    pub fn login(config: &ErpConfig) -> Result<Self, ErpError> {
        let apartment = ComApartment::init()?;

        let gt = Dispatch::create("InsERT.GT")?;
        gt.put("Produkt", GTA_PRODUKT_SUBIEKT)?;
        gt.put("Autentykacja", GTA_AUTENTYKACJA_SQL)?;
        gt.put("Serwer", config.server.as_str())?;
        gt.put("Uzytkownik", config.sql_login.as_str())?;
        gt.put("UzytkownikHaslo", config.sql_password.as_str())?;
        gt.put("Baza", config.database.as_str())?;
        gt.put("Operator", config.operator.as_str())?;
        gt.put("OperatorHaslo", config.operator_password.as_str())?;

        tracing::info!(
            "Logging in to {} on {} as {}",
            config.database,
            config.server,
            config.operator
        );
        let subiekt = gt
            .call(
                "Uruchom",
                vec![GTA_URUCHOM_DOPASUJ.into(), GTA_URUCHOM_Z_INTERFEJSEM.into()],
            )?
            .into_dispatch("Uruchom")?;
        drop(gt);

        Ok(Self {
            subiekt,
            _apartment: apartment,
        })
    }

    fn database(&self) -> Result<Dispatch, ErpError> {
        self.subiekt.object("Aplikacja")?.object("Baza")
    }
}

impl ErpSession for SferaSession {
    type Document = SferaDocument;

    fn info(&self) -> Result<SessionInfo, ErpError> {
        let version = self.subiekt.object("Aplikacja")?.get("Wersja")?.to_text("Wersja")?;
        let database = self.database()?;
        Ok(SessionInfo {
            version,
            database: database.get("Nazwa")?.to_text("Nazwa")?,
            server: database.get("Serwer")?.to_text("Serwer")?,
        })
    }

    fn query(&self, sql: &str) -> Result<Vec<Row>, ErpError> {
        let connection = self.database()?.object("Polaczenie")?;
        let recordset = Dispatch::create("ADODB.Recordset")?;
        recordset.put("CursorLocation", AD_USE_CLIENT)?;
        recordset.call(
            "Open",
            vec![
                sql.into(),
                Variant::from(&connection),
                AD_OPEN_STATIC.into(),
                AD_LOCK_READ_ONLY.into(),
                AD_CMD_TEXT.into(),
            ],
        )?;

        let fields = recordset
            .object("Fields")?
            .items("Fields")?
            .into_iter()
            .map(|field| field.into_dispatch("Fields"))
            .collect::<Result<Vec<_>, _>>()?;
        let names = fields
            .iter()
            .map(|field| field.get("Name")?.to_text("Name"))
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = Vec::new();
        while !recordset.get("EOF")?.to_bool("EOF")? {
            let mut row = Row::new();
            for (name, field) in names.iter().zip(&fields) {
                row.insert(name.clone(), field.get("Value")?.to_json(name)?);
            }
            rows.push(row);
            recordset.call("MoveNext", Vec::new())?;
        }
        recordset.call("Close", Vec::new())?;

        tracing::debug!("Query returned {} rows", rows.len());
        Ok(rows)
    }

    fn select_documents(&self, filter: &DocumentFilter) -> Result<Vec<SferaDocument>, ErpError> {
        let month_end = filter
            .period
            .last_instant()
            .ok_or_else(|| ErpError::conversion("FiltrOkresUstawDowolnyMiesiac", format!("{:?}", filter.period)))?;

        let window = self
            .subiekt
            .object("Dokumenty")?
            .call("Wybierz", Vec::new())?
            .into_dispatch("Wybierz")?;
        window.put("FiltrTyp", filter.kind.filter_code())?;
        window.put("FiltrOkres", GTA_FILTR_OKRES_DOWOLNY_MIESIAC)?;
        window.call("FiltrOkresUstawDowolnyMiesiac", vec![Variant::date(month_end)])?;
        window.put("MultiSelekcja", true)?;
        window.call("Wyswietl", Vec::new())?;

        window
            .call("ZaznaczoneDokumenty", Vec::new())?
            .into_dispatch("ZaznaczoneDokumenty")?
            .items("ZaznaczoneDokumenty")?
            .into_iter()
            .map(|doc| doc.into_dispatch("ZaznaczoneDokumenty").map(SferaDocument))
            .collect()
    }

    fn logoff(&mut self) -> Result<(), ErpError> {
        self.subiekt.call("Zakoncz", Vec::new()).map(drop)
    }
}

/// Document object (`SuDokument`) ticked in the selection window
pub struct SferaDocument(Dispatch);

impl ErpDocument for SferaDocument {
    fn customer_id(&self) -> Result<CustomerId, ErpError> {
        Ok(CustomerId(self.0.get("KontrahentId")?.to_i64("KontrahentId")?))
    }

    fn display_number(&self) -> Result<String, ErpError> {
        self.0.get("NumerPelny")?.to_text("NumerPelny")
    }

    fn net_value(&self) -> Result<f64, ErpError> {
        self.0.get("WartoscNetto")?.to_f64("WartoscNetto")
    }

    fn issue_date(&self) -> Result<NaiveDate, ErpError> {
        Ok(self.0.get("DataWystawienia")?.to_datetime("DataWystawienia")?.date())
    }

    fn set_issue_date(&self, date: NaiveDateTime) -> Result<(), ErpError> {
        self.0.put("DataWystawienia", Variant::date(date))
    }

    fn save(&self) -> Result<(), ErpError> {
        self.0.call("Zapisz", Vec::new()).map(drop)
    }

    fn print(&self, template: TemplateId, destination: &Destination) -> Result<(), ErpError> {
        let template_id = i32::try_from(template.0)
            .map_err(|_| ErpError::conversion("WzorzecWydruku", format!("template id {template} out of range")))?;

        match destination {
            Destination::Printer { name, copies } => {
                let settings = Dispatch::create("InsERT.UstawieniaWydruku")?;
                settings.put("WzorzecWydruku", template_id)?;
                match name {
                    Some(printer) => {
                        settings.put("DrukarkaDomyslSysOp", false)?;
                        settings.put("Drukarka", printer.as_str())?;
                    }
                    None => settings.put("DrukarkaDomyslSysOp", true)?,
                }
                let copies = i32::try_from((*copies).max(1)).unwrap_or(1);
                settings.put("IloscKopii", copies)?;
                self.0.call("DrukujWgUstawien", vec![Variant::from(&settings)])?;
            }
            Destination::File(path) => {
                let path = path.to_string_lossy();
                self.0.call(
                    "DrukujDoPlikuWgWzorca",
                    vec![template_id.into(), path.as_ref().into(), EXPORT_FORMAT_PDF.into()],
                )?;
            }
        }
        Ok(())
    }
}
