// Test-only helpers: a small bulletin laid out like the weekly SEAP sheet.

use rust_xlsxwriter::{Workbook, XlsxError};
use std::path::Path;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use super::raw_table::{Cell, RawRow, RawSheet};
use super::reader::column_index;
use crate::config::BulletinConfig;

pub fn init_test_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,seapetl=debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn row(cells: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = cells.iter().map(|s| s.to_string()).collect();
    out.resize(14, String::new());
    out
}

/// Columns A..N: id, name, locality, regime, (merged), capacity x3,
/// nominal, discharged, safeguarded, actual, excess, vacancies.
pub fn sample_rows() -> Vec<(u32, Vec<String>)> {
    vec![
        (0, row(&["SECRETARIA DE ESTADO DE ADMINISTRAÇÃO PENITENCIÁRIA"])),
        (4, row(&["Atualizado em 11/08/2020"])),
        (
            7,
            row(&[
                "Nº", "UNIDADE", "LOCALIDADE", "REGIME", "", "CAP. ORIGINAL", "INÓSPITO",
                "CAP. ATUAL", "NOMINAL", "BAIXADOS", "ACAUTELADOS", "REAL", "EXCESSO",
                "VAGAS",
            ]),
        ),
        (
            8,
            row(&[
                "1", "Presídio Ary Franco - PAF", "Água Santa", "Fechado", "", "958", "0",
                "958", "1200", "10", "5", "1485", "527", "0",
            ]),
        ),
        (9, row(&["", "", "", "Provisório", "", "", "", "", "300"])),
        (
            10,
            row(&[
                "2",
                "Instituto Penal Vicente Piragibe - IPVP",
                "Bangu",
                "Semiaberto",
                "",
                "1200",
                "100",
                "1100",
                "1300",
                "20",
                "0",
                "1280",
                "180",
                "0",
            ]),
        ),
        (11, row(&["TOTAL", "", "", "", "", "2158", "100", "2058"])),
        (12, row(&["UNIDADES FEMININAS"])),
        (
            13,
            row(&[
                "3",
                "Presídio Talavera Bruce - FEM",
                "Bangu",
                " Fechado ",
                "",
                "400",
                "0",
                "400",
                "380",
                "2",
                "1",
                "377",
                "0",
                "23",
            ]),
        ),
        (
            14,
            row(&[
                "4",
                "Presídio Nelson Hungria - MASC",
                "Bangu",
                "Med. de Seg.",
                "",
                "500",
                "0",
                "500",
                "200",
                "0",
                "0",
                "200",
                "0",
                "300",
            ]),
        ),
        (15, row(&["CASA DO ALBERGARDO"])),
        (
            16,
            row(&[
                "5",
                "Casa do Albergado Crispim Ventino",
                "Niterói",
                "Aberto",
                "",
                "100",
                "0",
                "100",
                "80",
                "0",
                "0",
                "80",
                "0",
                "20",
            ]),
        ),
        (17, row(&["UNIDADES HOSPITALARES"])),
        (
            18,
            row(&[
                "6",
                "Hospital Heitor Carrilho - HHC",
                "Centro",
                "Regime Especial",
                "",
                "150",
                "0",
                "150",
                "120",
                "0",
                "0",
                "120",
                "0",
                "30",
            ]),
        ),
    ]
}

fn to_cell(raw: &str) -> Cell {
    if raw.trim().is_empty() {
        Cell::Empty
    } else if let Ok(n) = raw.parse::<f64>() {
        Cell::Number(n)
    } else {
        Cell::Text(raw.to_string())
    }
}

/// The rows of `sample_rows` as the reader would return them under `config`.
pub fn sheet_from_rows(rows: &[(u32, Vec<String>)], config: &BulletinConfig) -> RawSheet {
    let headers = config.columns.iter().map(|m| m.field.clone()).collect();
    let columns: Vec<usize> = config
        .columns
        .iter()
        .map(|m| column_index(&m.column).unwrap() as usize)
        .collect();
    let last = rows.iter().map(|(i, _)| *i).max().unwrap_or(0);
    let rows = (0..=last)
        .map(|index| {
            let cells = match rows.iter().find(|(i, _)| *i == index) {
                Some((_, values)) => columns
                    .iter()
                    .map(|&c| values.get(c).map(|v| to_cell(v)).unwrap_or(Cell::Empty))
                    .collect(),
                None => vec![Cell::Empty; columns.len()],
            };
            RawRow::new(index, cells)
        })
        .collect();
    RawSheet { headers, rows }
}

pub fn sample_sheet() -> RawSheet {
    sheet_from_rows(&sample_rows(), &BulletinConfig::default())
}

/// Write `rows` to a one-sheet workbook. Numeric strings become number cells
/// and blank strings are left unwritten.
pub fn write_workbook(
    path: &Path,
    sheet_name: &str,
    rows: &[(u32, Vec<String>)],
) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name)?;
        for (r, values) in rows {
            for (c, value) in values.iter().enumerate() {
                if value.trim().is_empty() {
                    continue;
                }
                match value.parse::<f64>() {
                    Ok(n) => worksheet.write_number(*r, c as u16, n)?,
                    Err(_) => worksheet.write_string(*r, c as u16, value)?,
                };
            }
        }
    }
    workbook.save(path)?;
    Ok(())
}

pub fn write_sample_bulletin(path: &Path) -> Result<(), XlsxError> {
    write_workbook(path, "Efetivo Completo", &sample_rows())
}
