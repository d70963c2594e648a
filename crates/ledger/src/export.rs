//! CSV export of the materialized ledger.
//!
//! Pure formatting over data the projection already holds; no
//! synchronization concerns. Spreadsheet-friendly output: semicolon
//! delimiter, comma decimals, UTF-8 with BOM.

use std::io::Write;

use chrono::NaiveDate;
use chrono_tz::Tz;
use csv::WriterBuilder;

use crate::{LedgerError, ResultLedger, record::Transaction};

const HEADER: [&str; 8] = [
    "Data",
    "Hora",
    "Cliente",
    "Artista",
    "Serviço",
    "Pagamento",
    "Valor",
    "Obs",
];

/// Writes the semicolon-delimited table, one row per transaction, dates and
/// times rendered in `timezone`.
pub fn write_csv<W: Write>(
    out: W,
    transactions: &[Transaction],
    timezone: Tz,
) -> ResultLedger<()> {
    let mut writer = WriterBuilder::new().delimiter(b';').from_writer(out);
    writer.write_record(HEADER).map_err(export_error)?;

    for tx in transactions {
        let local = tx.created_at.with_timezone(&timezone);
        writer
            .write_record([
                local.format("%d/%m/%Y").to_string(),
                local.format("%H:%M:%S").to_string(),
                tx.client_name.clone(),
                tx.artist.clone(),
                tx.service.clone(),
                tx.payment_method.clone(),
                tx.value.format(),
                sanitize_obs(tx.obs.as_deref()),
            ])
            .map_err(export_error)?;
    }

    writer
        .flush()
        .map_err(|err| LedgerError::Export(err.to_string()))
}

/// The full file content: the CSV table prefixed with the UTF-8 BOM that
/// spreadsheet apps expect.
pub fn to_csv_bytes(transactions: &[Transaction], timezone: Tz) -> ResultLedger<Vec<u8>> {
    let mut data = vec![0xEF, 0xBB, 0xBF];
    write_csv(&mut data, transactions, timezone)?;
    Ok(data)
}

/// Export file name carrying the given date: `CAIXA_CASA_INK_10-03-2026.csv`.
#[must_use]
pub fn file_name(day: NaiveDate) -> String {
    format!("CAIXA_CASA_INK_{}.csv", day.format("%d-%m-%Y"))
}

fn sanitize_obs(obs: Option<&str>) -> String {
    obs.unwrap_or_default().replace(';', ",").replace('\n', " ")
}

fn export_error(err: csv::Error) -> LedgerError {
    LedgerError::Export(err.to_string())
}
