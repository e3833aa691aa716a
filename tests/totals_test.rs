mod common;

use anyhow::Result;
use common::{
    corrupt_sheet, example_ledger, num, read_part, text, WorkbookFixture,
};
use omzet::application::{AggregateOptions, AppError, ReportService};
use omzet::cli::{run_totals, TotalsFormat};
use omzet::domain::CellValue;
use omzet::io::{DecodeError, Workbook, TOTALS_FILENAME, TOTALS_SHEET, XLSX_CONTENT_TYPE};
use tempfile::TempDir;

fn totals_matrix(bytes: &[u8]) -> Result<Vec<Vec<CellValue>>> {
    let workbook = Workbook::decode(bytes)?;
    assert_eq!(workbook.sheet_names(), vec![TOTALS_SHEET]);
    let sheet = workbook.sheet(TOTALS_SHEET).expect("totals sheet");
    Ok(sheet.matrix())
}

#[test]
fn test_totals_workbook_for_example_ledger() -> Result<()> {
    let service = ReportService::default();
    let download = service.totals(&example_ledger().to_bytes()?)?;

    assert_eq!(download.filename, TOTALS_FILENAME);
    assert_eq!(download.content_type, XLSX_CONTENT_TYPE);
    assert_eq!(
        totals_matrix(&download.bytes)?,
        vec![
            vec![text("Naam"), text("Omzet")],
            vec![text("Alice"), num(10.5)],
            vec![text("Bob"), num(5.0)],
        ]
    );

    // c@x.com has no mapping entry and is left out
    assert_eq!(download.stats.unmapped_rows, 1);
    assert!(download.stats.unmapped_portfolios.contains("c@x.com"));
    Ok(())
}

#[test]
fn test_totals_sorted_by_name_with_accents() -> Result<()> {
    let upload = WorkbookFixture::new()
        .mapping(&[
            ("zoe@x.com", "Zoe"),
            ("emile@x.com", "Émile"),
            ("anna@x.com", "Anna"),
        ])
        .ledger(vec![
            (text("zoe@x.com"), num(1.0)),
            (text("emile@x.com"), num(2.0)),
            (text("anna@x.com"), num(3.0)),
        ])
        .to_bytes()?;

    let (rows, _) = ReportService::default().totals_rows(&upload)?;
    let names: Vec<&str> = rows.iter().map(|row| row.naam.as_str()).collect();
    assert_eq!(names, vec!["Anna", "Émile", "Zoe"]);
    Ok(())
}

#[test]
fn test_totals_merge_emails_and_parse_balances() -> Result<()> {
    let upload = WorkbookFixture::new()
        .mapping(&[
            ("a@x.com", "Alice"),
            ("alice@home.nl", "Alice"),
            ("b@x.com", "Bob"),
        ])
        .ledger(vec![
            (text("a@x.com"), text("1.234,56")),
            (text("ALICE@home.nl"), text("0,44")),
            (text("b@x.com"), text("n/a")),
            (CellValue::Empty, num(100.0)),
        ])
        .to_bytes()?;

    let (rows, stats) = ReportService::default().totals_rows(&upload)?;

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].naam, "Alice");
    assert!((rows[0].omzet - 1235.0).abs() < 1e-9);
    assert_eq!(rows[1].naam, "Bob");
    assert_eq!(rows[1].omzet, 0.0);
    assert_eq!(stats.rows_without_portfolio, 1);
    Ok(())
}

#[test]
fn test_totals_header_only_when_nothing_matches() -> Result<()> {
    let upload = WorkbookFixture::new()
        .mapping(&[("a@x.com", "Alice")])
        .ledger(vec![(text("z@x.com"), num(4.0))])
        .to_bytes()?;

    let download = ReportService::default().totals(&upload)?;
    assert!(download.rows.is_empty());
    assert_eq!(
        totals_matrix(&download.bytes)?,
        vec![vec![text("Naam"), text("Omzet")]]
    );
    Ok(())
}

#[test]
fn test_totals_missing_sheets() -> Result<()> {
    let service = ReportService::default();

    let without_mapping = WorkbookFixture::new()
        .ledger(vec![(text("a@x.com"), num(1.0))])
        .to_bytes()?;
    let err = service.totals(&without_mapping).unwrap_err();
    assert_eq!(err.to_string(), "'Mapping' sheet not found");

    let without_ledger = WorkbookFixture::new()
        .mapping(&[("a@x.com", "Alice")])
        .to_bytes()?;
    let err = service.totals(&without_ledger).unwrap_err();
    assert_eq!(
        err.to_string(),
        "'45+ facturen Incasso Debtt Mana' sheet not found"
    );
    assert!(err.is_client_error());
    Ok(())
}

#[test]
fn test_totals_strict_mapping() -> Result<()> {
    let service = ReportService::new(AggregateOptions {
        strict_mapping: true,
    });
    let err = service.totals(&example_ledger().to_bytes()?).unwrap_err();
    assert!(matches!(err, AppError::UnmappedPortfolios(ref emails) if emails == &["c@x.com"]));
    Ok(())
}

#[test]
fn test_totals_rejects_non_workbook() {
    let err = ReportService::default()
        .totals(b"Email,Name\na@x.com,Alice\n")
        .unwrap_err();
    assert!(matches!(err, AppError::Decode(DecodeError::Open(_))));
}

#[test]
fn test_totals_corrupt_mapping_sheet_is_not_missing() -> Result<()> {
    // Mapping is the first sheet written by the fixture
    let upload = corrupt_sheet(&example_ledger().to_bytes()?, "xl/worksheets/sheet1.xml")?;

    let err = ReportService::default().totals(&upload).unwrap_err();
    assert!(matches!(
        err,
        AppError::Decode(DecodeError::Sheet { ref sheet, .. }) if sheet == "Mapping"
    ));
    assert!(err.to_string().starts_with("Could not read sheet 'Mapping': "));
    assert!(err.is_client_error());
    Ok(())
}

#[test]
fn test_totals_amounts_carry_euro_format() -> Result<()> {
    let download = ReportService::default().totals(&example_ledger().to_bytes()?)?;

    let styles = read_part(&download.bytes, "xl/styles.xml")?;
    assert!(styles.contains(r#"formatCode="&quot;€ &quot;#,##0.00_-""#));
    assert!(styles.contains(r#"numFmtId="164""#));

    let sheet = read_part(&download.bytes, "xl/worksheets/sheet1.xml")?;
    let style_of = |cell: &str| -> Option<String> {
        let start = sheet.find(&format!(r#"<c r="{cell}""#))?;
        let tag = &sheet[start..start + sheet[start..].find('>')?];
        let attr = tag.find(r#" s=""#)? + 4;
        Some(tag[attr..].split('"').next()?.to_string())
    };

    assert_eq!(style_of("B1"), None);
    let amount_style = style_of("B2").expect("B2 is styled");
    assert_eq!(style_of("B3"), Some(amount_style.clone()));
    assert_ne!(amount_style, "0");
    assert_eq!(style_of("A2"), None);
    Ok(())
}

#[test]
fn test_cli_writes_totals_workbook() -> Result<()> {
    let temp = TempDir::new()?;
    let input = temp.path().join("ledger.xlsx");
    let output = temp.path().join("totals.xlsx");
    std::fs::write(&input, example_ledger().to_bytes()?)?;

    run_totals(
        &ReportService::default(),
        &input,
        Some(&output),
        TotalsFormat::Xlsx,
    )?;

    let matrix = totals_matrix(&std::fs::read(&output)?)?;
    assert_eq!(matrix.len(), 3);
    assert_eq!(matrix[1], vec![text("Alice"), num(10.5)]);
    Ok(())
}

#[test]
fn test_cli_writes_totals_csv() -> Result<()> {
    let temp = TempDir::new()?;
    let input = temp.path().join("ledger.xlsx");
    let output = temp.path().join("totals.csv");
    std::fs::write(&input, example_ledger().to_bytes()?)?;

    run_totals(
        &ReportService::default(),
        &input,
        Some(&output),
        TotalsFormat::Csv,
    )?;

    let csv = std::fs::read_to_string(&output)?;
    assert_eq!(csv, "Naam,Omzet\nAlice,10.5\nBob,5.0\n");
    Ok(())
}

#[test]
fn test_cli_missing_input_file() {
    let temp = TempDir::new().unwrap();
    let result = run_totals(
        &ReportService::default(),
        &temp.path().join("missing.xlsx"),
        None,
        TotalsFormat::Json,
    );
    assert!(result.is_err());
}
