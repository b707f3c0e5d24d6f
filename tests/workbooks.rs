use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

use evidences::config::Config;
use evidences::extraction::Extractor;
use evidences::folders::{FolderCreator, FolderOptions};
use evidences::records;
use evidences::report;
use evidences::time::Month;

fn write_date(worksheet: &mut rust_xlsxwriter::Worksheet, row: u32, column: u16, date: (u16, u8, u8)) {
    let format = Format::new().set_num_format("dd/mm/yyyy");
    let date = ExcelDateTime::from_ymd(date.0, date.1, date.2).unwrap();
    worksheet.write_datetime_with_format(row, column, &date, &format).unwrap();
}

fn write_records(path: &Path) {
    let mut workbook = Workbook::new();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Lista").unwrap();
    worksheet.write_string(0, 0, "LISTA DE DOCUMENTOS").unwrap();
    worksheet.merge_range(12, 1, 12, 2, "VERSÃO ATUAL", &Format::new()).unwrap();
    worksheet.write_string(13, 0, "CÓDIGO AGENCIA").unwrap();
    worksheet.write_string(13, 1, "DATA").unwrap();
    worksheet.write_string(13, 2, "REVISÃO").unwrap();

    worksheet.write_string(14, 0, "MSV-163MS-007-009-TOP-EXE-ID-Z9-001-R07").unwrap();
    write_date(worksheet, 14, 1, (2024, 3, 4));
    worksheet.write_string(14, 2, "R07").unwrap();

    worksheet.write_string(15, 0, "MSV-163MS-007-009-GEO-EXE-ID-Z9-002-R01").unwrap();
    worksheet.write_string(15, 1, "15/03/2024").unwrap();
    worksheet.write_string(15, 2, "R01").unwrap();

    worksheet.write_string(17, 0, "MSV-163MS-007-009-PAV-EXE-ID-Z9-003-R00").unwrap();
    write_date(worksheet, 17, 1, (2024, 4, 1));

    let short = workbook.add_worksheet();
    short.set_name("Capa").unwrap();
    short.write_string(3, 0, "Capa").unwrap();

    workbook.save(path).unwrap();
}

fn write_measurements(path: &Path) {
    let mut workbook = Workbook::new();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("PERCUSSÃO").unwrap();
    worksheet.write_string(5, 0, "KM").unwrap();
    for (column, name) in ["SONDAGEM A PERCUSSÃO", "PROFUNDIDADE EXECUTADA (m)", "OBSERVAÇÃO", "MEDIÇÃO"].iter().enumerate() {
        worksheet.write_string(6, column as u16 + 1, *name).unwrap();
    }

    worksheet.write_string(7, 0, "10+200").unwrap();
    worksheet.write_string(7, 1, "SP-01").unwrap();
    worksheet.write_number(7, 2, 12.5).unwrap();
    worksheet.write_string(7, 3, "ok").unwrap();
    write_date(worksheet, 7, 4, (2024, 3, 4));

    worksheet.write_string(8, 0, "10+400").unwrap();
    worksheet.write_string(8, 1, "SP-02").unwrap();
    worksheet.write_number(8, 2, 8.0).unwrap();
    write_date(worksheet, 8, 4, (2024, 4, 2));

    worksheet.write_string(9, 0, "TOTAL").unwrap();
    worksheet.write_string(10, 1, "SP-03").unwrap();
    write_date(worksheet, 10, 4, (2024, 3, 20));

    let ignored = workbook.add_worksheet();
    ignored.set_name("RESUMO").unwrap();
    ignored.write_string(6, 0, "MEDIÇÃO").unwrap();
    write_date(ignored, 7, 0, (2024, 3, 4));

    workbook.save(path).unwrap();
}

#[test]
fn records_to_folders() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Lista de documentos.xlsx");
    write_records(&path);

    let sheets = records::read_records(&path);
    assert_eq!(sheets.len(), 1);
    assert_eq!(sheets[0].name, "Lista");

    let data = records::concat(&sheets);
    assert_eq!(data.column_names(), vec!["CÓDIGO AGENCIA", "VERSÃO ATUAL - DATA", "REVISÃO"]);
    assert_eq!(data.len(), 3);

    let config = Config::builtin().unwrap();
    let month = Month::new(2024, 3).unwrap();
    let march = records::filter_by_month(&data, &config.records_date_column, month).unwrap();
    assert_eq!(march.len(), 2);

    let creator = FolderCreator::new(&config, "artesp").unwrap();
    let tree = creator.create(&march, &path, FolderOptions {drilling: true, special_tests: true, copy_pdfs: false}).unwrap();

    assert_eq!(tree.root, dir.path().join("Lista de documentos_Evidencias"));
    assert_eq!(tree.disciplines, vec!["Topografia".to_owned(), "Geotecnia".to_owned()]);

    for name in ["Sondagens", "Ensaios Especiais", "Topografia", "Geotecnia"] {
        assert!(tree.root.join(name).is_dir(), "{name} folder is missing");
    }
    assert!(!tree.root.join("Pavimentação").exists());
}

#[test]
fn measurement_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Sondagens").join("medição.xlsx");
    fs::create_dir(path.parent().unwrap()).unwrap();
    write_measurements(&path);

    let evidence = report::find_evidence(path.parent().unwrap());
    assert_eq!(evidence.workbooks, vec![path.clone()]);
    assert!(evidence.images.is_empty());

    let config = Config::builtin().unwrap();
    let extractor = Extractor::new(&config.extraction);

    let tables = extractor.extract(&path, Month::new(2024, 3).unwrap(), "Sondagens");
    assert_eq!(tables.len(), 1);

    let table = &tables[0];
    assert_eq!(table.name, "PERCUSSÃO");
    assert_eq!(table.data.column_names(), vec!["KM", "Sondagem", "Profundidade (m)", "MEDIÇÃO"]);

    let rows: Vec<Vec<String>> = table.data.rows().iter()
        .map(|row| row.iter().map(ToString::to_string).collect())
        .collect();
    assert_eq!(rows, vec![vec!["10+200", "SP-01", "12.5", "04/03/2024"]]);

    assert!(extractor.extract(&path, Month::new(2024, 5).unwrap(), "Sondagens").is_empty());
    assert!(extractor.extract(&path, Month::new(2024, 3).unwrap(), "Ensaios Especiais").is_empty());
}
