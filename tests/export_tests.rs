//! End-to-end workbook tests: loss run in, three-sheet report out

use calamine::{open_workbook, Data, Reader, Xlsx};
use claim_mapper::core::LITIGATION_WARNING;
use claim_mapper::excel::{
    CURRENCY_FORMAT, DATA_SHEET, INTEGER_FORMAT, MOD_HISTORY_SHEET, SUMMARY_SHEET,
    WHOLE_DOLLAR_FORMAT,
};
use claim_mapper::mapping::InternalField;
use claim_mapper::mod_form::HistoryInput;
use claim_mapper::{ClaimMapError, Session};
use pretty_assertions::assert_eq;
use regex::Regex;
use rust_xlsxwriter::{Format, Workbook};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::ZipArchive;

// ═══════════════════════════════════════════════════════════════════════════
// FIXTURES
// ═══════════════════════════════════════════════════════════════════════════

const LOSS_ROWS: [(f64, &str, &str, &str, f64); 8] = [
    (2024.0, "Open", "Hand", "Strain", 1000.0),
    (2024.0, "Closed", "Back", "Fall", 500.0),
    (2023.0, "Re-Open", "Knee", "Fall", 250.0),
    (2023.0, "Open", "Hand", "Cut", 250.0),
    (2022.0, "closed", "Eye", "Struck By", 100.0),
    (2021.0, "Closed", "Back", "Lifting", 75.0),
    (2021.0, "Pending", "Foot", "Fall", 60.0),
    (2020.0, "Closed", "Hand", "Cut", 999.0),
];

fn write_loss_run(dir: &Path) -> PathBuf {
    let path = dir.join("loss_run.xlsx");
    let mut workbook = Workbook::new();

    let cover = workbook.add_worksheet();
    cover.set_name("Cover").unwrap();
    cover.write_string(0, 0, "Acme Loss Run").unwrap();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Losses").unwrap();
    for (col, header) in ["PolYr", "ClaimStat", "Body", "Cause", "Inc"].iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    for (idx, (year, status, body, cause, inc)) in LOSS_ROWS.iter().enumerate() {
        let row = idx as u32 + 1;
        sheet.write_number(row, 0, *year).unwrap();
        sheet.write_string(row, 1, *status).unwrap();
        sheet.write_string(row, 2, *body).unwrap();
        sheet.write_string(row, 3, *cause).unwrap();
        sheet.write_number(row, 4, *inc).unwrap();
    }

    workbook.save(&path).unwrap();
    path
}

fn mapped_session(path: &Path) -> Session {
    let mut session = Session::upload(path).unwrap();
    session.select_sheet("Losses").unwrap();
    session.select(InternalField::PolicyYear, Some("PolYr")).unwrap();
    session.select(InternalField::Status, Some("ClaimStat")).unwrap();
    session.select(InternalField::BodyPartCategory, Some("Body")).unwrap();
    session.select(InternalField::InjuryCauseCategory, Some("Cause")).unwrap();
    session.select(InternalField::Incurred, Some("Inc")).unwrap();
    session
}

fn fill_mod_form(session: &mut Session) {
    session.mod_form.set_projection("2025", "95");
    let rows = [("100", "1200000"), ("98", "1100000"), ("102", "1000000"), ("105", "900000")];
    for (index, (mod_value, payroll)) in rows.iter().enumerate() {
        session
            .mod_form
            .set_history(index, HistoryInput::new(None, mod_value, payroll))
            .unwrap();
    }
}

fn read_sheet(path: &Path, sheet: &str) -> calamine::Range<Data> {
    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    workbook.worksheet_range(sheet).unwrap()
}

fn number(range: &calamine::Range<Data>, row: u32, col: u32) -> f64 {
    match range.get_value((row, col)) {
        Some(Data::Float(n)) => *n,
        Some(Data::Int(n)) => *n as f64,
        other => panic!("expected a number at ({row}, {col}), got {other:?}"),
    }
}

fn string(range: &calamine::Range<Data>, row: u32, col: u32) -> String {
    match range.get_value((row, col)) {
        Some(Data::String(s)) => s.clone(),
        other => panic!("expected a string at ({row}, {col}), got {other:?}"),
    }
}

fn read_part(path: &Path, part: &str) -> String {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut xml = String::new();
    archive.by_name(part).unwrap().read_to_string(&mut xml).unwrap();
    xml
}

/// Number format code of every cell style, indexed like the `s` attribute
fn style_formats(path: &Path) -> Vec<String> {
    let styles = read_part(path, "xl/styles.xml");

    let mut codes: HashMap<String, String> = HashMap::from([
        ("0".to_string(), "General".to_string()),
        ("1".to_string(), "0".to_string()),
    ]);
    let num_fmt = Regex::new(r#"<numFmt numFmtId="(\d+)" formatCode="([^"]*)""#).unwrap();
    for caps in num_fmt.captures_iter(&styles) {
        let code = caps[2].replace("&quot;", "\"").replace("&amp;", "&");
        codes.insert(caps[1].to_string(), code);
    }

    let start = styles.find("<cellXfs").unwrap();
    let end = styles.find("</cellXfs>").unwrap();
    let xf = Regex::new(r#"<xf\b[^>]*\bnumFmtId="(\d+)""#).unwrap();
    xf.captures_iter(&styles[start..end])
        .map(|caps| codes.get(&caps[1]).cloned().unwrap_or_default())
        .collect()
}

/// Number format applied to one cell of a worksheet part, e.g. `E2`
fn cell_format(path: &Path, sheet_part: &str, cell: &str, formats: &[String]) -> String {
    let xml = read_part(path, sheet_part);
    let pattern = Regex::new(&format!(r#"<c r="{}"[^>]*\bs="(\d+)""#, cell)).unwrap();
    let index: usize = pattern
        .captures(&xml)
        .unwrap_or_else(|| panic!("{cell} in {sheet_part} has no style"))[1]
        .parse()
        .unwrap();
    formats[index].clone()
}

// ═══════════════════════════════════════════════════════════════════════════
// FULL EXPORT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_export_writes_three_sheets() {
    let dir = TempDir::new().unwrap();
    let input = write_loss_run(dir.path());
    let mut session = mapped_session(&input);
    fill_mod_form(&mut session);

    let (_, path) = session.export(dir.path()).unwrap();
    assert_eq!(path, dir.path().join("claim_output.xlsx"));

    let workbook: Xlsx<_> = open_workbook(&path).unwrap();
    assert_eq!(
        workbook.sheet_names(),
        vec![DATA_SHEET, SUMMARY_SHEET, MOD_HISTORY_SHEET]
    );
}

#[test]
fn test_summary_sheet_values() {
    let dir = TempDir::new().unwrap();
    let input = write_loss_run(dir.path());
    let mut session = mapped_session(&input);
    fill_mod_form(&mut session);

    let (report, path) = session.export(dir.path()).unwrap();
    assert_eq!(report.summary.len(), 4);

    let summary = read_sheet(&path, SUMMARY_SHEET);
    assert_eq!(string(&summary, 0, 0), "Policy Year");
    assert_eq!(string(&summary, 0, 5), "Total Payroll");
    assert_eq!(summary.height(), 5);

    // Newest year first; 2020 is outside the historical years
    let expected = [
        (2024.0, 1.0, 1.0, 2.0, 1500.0, 1_200_000.0),
        (2023.0, 0.0, 2.0, 2.0, 500.0, 1_100_000.0),
        (2022.0, 1.0, 0.0, 1.0, 100.0, 1_000_000.0),
        (2021.0, 1.0, 0.0, 1.0, 135.0, 900_000.0),
    ];
    for (idx, row) in expected.iter().enumerate() {
        let r = idx as u32 + 1;
        assert_eq!(number(&summary, r, 0), row.0);
        assert_eq!(number(&summary, r, 1), row.1);
        assert_eq!(number(&summary, r, 2), row.2);
        assert_eq!(number(&summary, r, 3), row.3);
        assert_eq!(number(&summary, r, 4), row.4);
        assert_eq!(number(&summary, r, 5), row.5);
    }
}

#[test]
fn test_data_sheet_remapped_with_default_litigation() {
    let dir = TempDir::new().unwrap();
    let input = write_loss_run(dir.path());
    let mut session = mapped_session(&input);
    fill_mod_form(&mut session);

    let (report, path) = session.export(dir.path()).unwrap();
    assert!(report.warnings.iter().any(|w| w == LITIGATION_WARNING));

    let data = read_sheet(&path, DATA_SHEET);
    let headers: Vec<String> = (0..6).map(|c| string(&data, 0, c)).collect();
    assert_eq!(
        headers,
        vec![
            "Policy Year",
            "Claim Status",
            "Body Part Cat.",
            "Injury Cause Cat.",
            "Incurred",
            "Litigation"
        ]
    );
    // 7 claims in 2021..=2024
    assert_eq!(data.height(), 8);
    for row in 1..8 {
        assert_eq!(string(&data, row, 5), "N/A");
        assert!(number(&data, row, 0) >= 2021.0);
    }
}

#[test]
fn test_mod_history_sheet() {
    let dir = TempDir::new().unwrap();
    let input = write_loss_run(dir.path());
    let mut session = mapped_session(&input);
    fill_mod_form(&mut session);

    let (_, path) = session.export(dir.path()).unwrap();
    let history = read_sheet(&path, MOD_HISTORY_SHEET);

    assert_eq!(history.height(), 6);
    let labels: Vec<String> = (1..6).map(|r| string(&history, r, 0)).collect();
    assert_eq!(labels, vec!["Projected", "Current", "2023", "2022", "2021"]);
    let mods: Vec<f64> = (1..6).map(|r| number(&history, r, 1)).collect();
    assert_eq!(mods, vec![95.0, 100.0, 98.0, 102.0, 105.0]);
}

#[test]
fn test_summary_and_mod_formats() {
    let dir = TempDir::new().unwrap();
    let input = write_loss_run(dir.path());
    let mut session = mapped_session(&input);
    fill_mod_form(&mut session);

    let (_, path) = session.export(dir.path()).unwrap();
    let formats = style_formats(&path);
    assert!(formats.iter().any(|f| f == CURRENCY_FORMAT));
    assert!(formats.iter().any(|f| f == WHOLE_DOLLAR_FORMAT));

    // sheet2 is OpenClosedIncurred, sheet3 is Mod History
    for row in 2..=5 {
        let incurred = cell_format(&path, "xl/worksheets/sheet2.xml", &format!("E{row}"), &formats);
        assert_eq!(incurred, CURRENCY_FORMAT);
        let payroll = cell_format(&path, "xl/worksheets/sheet2.xml", &format!("F{row}"), &formats);
        assert_eq!(payroll, WHOLE_DOLLAR_FORMAT);
    }
    for row in 2..=6 {
        let mod_format =
            cell_format(&path, "xl/worksheets/sheet3.xml", &format!("B{row}"), &formats);
        assert_eq!(mod_format, INTEGER_FORMAT);
    }
}

#[test]
fn test_mapped_litigation_has_no_warning() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("with_lit.xlsx");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, header) in ["Year", "Status", "Body", "Cause", "Incurred", "Lit"].iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    sheet.write_number(1, 0, 2024.0).unwrap();
    sheet.write_string(1, 1, "Open").unwrap();
    sheet.write_string(1, 2, "Hand").unwrap();
    sheet.write_string(1, 3, "Cut").unwrap();
    sheet.write_number(1, 4, 10.0).unwrap();
    sheet.write_string(1, 5, "Litigated").unwrap();
    workbook.save(&path).unwrap();

    let mut session = Session::upload(&path).unwrap();
    for (field, column) in [
        (InternalField::PolicyYear, "Year"),
        (InternalField::Status, "Status"),
        (InternalField::BodyPartCategory, "Body"),
        (InternalField::InjuryCauseCategory, "Cause"),
        (InternalField::Incurred, "Incurred"),
        (InternalField::LitigationStatus, "Lit"),
    ] {
        session.select(field, Some(column)).unwrap();
    }
    session.mod_form.set_projection("2025", "90");
    session
        .mod_form
        .set_history(0, HistoryInput::new(None, "100", "500000"))
        .unwrap();

    let report = session.report().unwrap();
    assert!(!report.warnings.iter().any(|w| w == LITIGATION_WARNING));
    assert_eq!(report.summary.len(), 1);
    assert_eq!(report.summary[0].policy_year, 2024);
    assert_eq!(report.summary[0].total_payroll, Some(500_000.0));
}

// ═══════════════════════════════════════════════════════════════════════════
// IMPORT EDGE CASES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_date_policy_years_reduce_to_year() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dates.xlsx");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let date = Format::new().set_num_format("yyyy-mm-dd");
    for (col, header) in ["Eff Date", "Status", "Body", "Cause", "Inc"].iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    // 2024-07-01 and 2023-07-01 as Excel serials
    for (idx, serial) in [45474.0, 45108.0].iter().enumerate() {
        let row = idx as u32 + 1;
        sheet.write_number_with_format(row, 0, *serial, &date).unwrap();
        sheet.write_string(row, 1, "Closed").unwrap();
        sheet.write_string(row, 2, "Back").unwrap();
        sheet.write_string(row, 3, "Fall").unwrap();
        sheet.write_string(row, 4, "$1,250.00").unwrap();
    }
    workbook.save(&path).unwrap();

    let mut session = Session::upload(&path).unwrap();
    session.select(InternalField::PolicyYear, Some("Eff Date")).unwrap();
    session.select(InternalField::Status, Some("Status")).unwrap();
    session.select(InternalField::BodyPartCategory, Some("Body")).unwrap();
    session.select(InternalField::InjuryCauseCategory, Some("Cause")).unwrap();
    session.select(InternalField::Incurred, Some("Inc")).unwrap();
    session.mod_form.set_projection("2025", "100");
    session
        .mod_form
        .set_history(0, HistoryInput::new(None, "100", "1000"))
        .unwrap();
    session
        .mod_form
        .set_history(1, HistoryInput::new(None, "100", "1000"))
        .unwrap();

    let report = session.report().unwrap();
    let years: Vec<i64> = report.summary.iter().map(|r| r.policy_year).collect();
    assert_eq!(years, vec![2024, 2023]);
    assert_eq!(report.summary[0].closed, 1);
    assert_eq!(report.summary[0].total_incurred, 1250.0);
}

#[test]
fn test_sheet_change_resets_stale_selections() {
    let dir = TempDir::new().unwrap();
    let input = write_loss_run(dir.path());
    let mut session = mapped_session(&input);

    let reset = session.select_sheet("Cover").unwrap();
    assert_eq!(reset.len(), 5);
    assert_eq!(session.missing_required().len(), 5);
}

#[test]
fn test_unknown_sheet_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write_loss_run(dir.path());
    let mut session = Session::upload(&input).unwrap();

    let err = session.select_sheet("Summary").unwrap_err();
    assert!(matches!(err, ClaimMapError::Import(_)));
    assert_eq!(session.sheet(), "Cover");
}

// ═══════════════════════════════════════════════════════════════════════════
// BLOCKED EXPORTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_export_blocked_by_bad_mod_value() {
    let dir = TempDir::new().unwrap();
    let input = write_loss_run(dir.path());
    let mut session = mapped_session(&input);
    fill_mod_form(&mut session);
    session
        .mod_form
        .set_history(2, HistoryInput::new(None, "abc", "1000000"))
        .unwrap();

    let err = session.export(dir.path()).unwrap_err();
    assert!(matches!(err, ClaimMapError::Coercion { .. }));
    assert!(!dir.path().join("claim_output.xlsx").exists());
}

#[test]
fn test_export_blocked_without_mod_rows() {
    let dir = TempDir::new().unwrap();
    let input = write_loss_run(dir.path());
    let session = mapped_session(&input);

    let err = session.export(dir.path()).unwrap_err();
    assert!(matches!(err, ClaimMapError::Validation(_)));
}

#[test]
fn test_custom_output_name() {
    let dir = TempDir::new().unwrap();
    let input = write_loss_run(dir.path());
    let mut session = mapped_session(&input);
    fill_mod_form(&mut session);
    session.set_output_name("acme_2025");

    let (_, path) = session.export(dir.path()).unwrap();
    assert_eq!(path.file_name().unwrap(), "acme_2025.xlsx");
    assert!(path.exists());
}
