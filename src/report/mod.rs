//! Progress report assembling.
//!
//! The report is written through a narrow [`DocumentSession`] interface, so the assembling logic
//! doesn't depend on the document format.

pub mod docx;
mod pdf;
mod session;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::config::Config;
use crate::core::{EmptyResult, GenericResult};
use crate::dataset::{Dataset, SheetData};
use crate::extraction::Extractor;
use crate::time::Month;

pub use self::pdf::{PdfiumRasterizer, Rasterizer};
pub use self::session::{DocumentBackend, DocumentSession};

pub const PROJECT_SECTION: &str = "Projeto";
const INTRODUCTION_SECTION: &str = "INTRODUÇÃO";
const PROGRESS_SECTION: &str = "AVANÇO FÍSICO DO PROJETO";
const NO_EVIDENCE_TEXT: &str = "Nenhuma evidência encontrada para esta disciplina.";

const HEADING_INDENT: u32 = 36;

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "pdf"];
const WORKBOOK_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

pub struct ReportAssembler<'a> {
    config: &'a Config,
    backend: &'a dyn DocumentBackend,
    rasterizer: &'a dyn Rasterizer,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(config: &'a Config, backend: &'a dyn DocumentBackend, rasterizer: &'a dyn Rasterizer) -> ReportAssembler<'a> {
        ReportAssembler {config, backend, rasterizer}
    }

    /// Appends the month's measurement section with evidence of the specified disciplines to the
    /// document.
    pub fn append_measurement(
        &self, document: &Path, disciplines: &[String], texts: &HashMap<String, String>,
        evidence_root: &Path, month: Month,
    ) -> EmptyResult {
        let folders = &self.config.folders;
        let disciplines = order_disciplines(disciplines, &folders.drilling, &folders.special_tests);

        let mut session = self.backend.open(document)?;
        let result = self.write_measurement(session.as_mut(), &disciplines, texts, evidence_root, month)
            .and_then(|_| session.save());
        session.close();
        result?;

        info!("{month} measurement has been added to {document:?}.");

        if let Err(err) = self.post_process(document) {
            warn!("Failed to format {document:?}: {err}.");
        }

        Ok(())
    }

    fn write_measurement(
        &self, session: &mut dyn DocumentSession, disciplines: &[String],
        texts: &HashMap<String, String>, evidence_root: &Path, month: Month,
    ) -> EmptyResult {
        session.configure_heading_numbering().map_err(|e| format!(
            "Unable to configure heading numbering: {e}"))?;

        session.append_heading(2, &format!("MEDIÇÃO ({month})"))?;
        session.append_heading(3, PROJECT_SECTION)?;
        append_text(session, texts.get(PROJECT_SECTION))?;

        for discipline in disciplines {
            debug!("Adding {discipline:?} discipline...");

            session.append_heading(3, discipline)?;
            append_text(session, texts.get(discipline))?;
            self.append_evidence(session, discipline, &evidence_root.join(discipline), month)?;
        }

        Ok(())
    }

    fn append_evidence(&self, session: &mut dyn DocumentSession, discipline: &str, path: &Path, month: Month) -> EmptyResult {
        let evidence = find_evidence(path);

        if evidence.images.is_empty() && evidence.workbooks.is_empty() {
            session.append_text(NO_EVIDENCE_TEXT)?;
        }

        for path in &evidence.images {
            let image = if has_extension(path, &["pdf"]) {
                match pdf::get_pdf_image(self.rasterizer, path) {
                    Ok(image) => image,
                    Err(err) => {
                        warn!("Skipping {path:?}: {err}.");
                        continue;
                    },
                }
            } else {
                path.clone()
            };

            if let Err(err) = session.append_image(&image) {
                warn!("Skipping {image:?}: {err}.");
            }
        }

        let extractor = Extractor::new(&self.config.extraction);

        for path in &evidence.workbooks {
            for table in extractor.extract(path, month, discipline) {
                self.append_sheet(session, table)?;
            }
        }

        Ok(())
    }

    fn append_sheet(&self, session: &mut dyn DocumentSession, table: SheetData) -> EmptyResult {
        let SheetData {name, mut data} = table;

        data.drop_empty_columns();
        data.drop_empty_rows();
        if data.is_empty() || data.columns().is_empty() {
            debug!("{name:?} table is empty. Skipping it.");
            return Ok(());
        }

        session.append_caption(&format!("Tabela: {name}"))?;

        let extraction = &self.config.extraction;
        if extraction.is_wide_sheet(&name) {
            for chunk in split_wide_table(&data, &extraction.key_columns, extraction.max_data_columns) {
                session.append_table(&chunk)?;
            }
        } else {
            session.append_table(&data)?;
        }

        Ok(())
    }

    fn post_process(&self, document: &Path) -> EmptyResult {
        let mut session = self.backend.open(document)?;

        let result = (|| -> EmptyResult {
            session.indent_headings(HEADING_INDENT, HEADING_INDENT)?;
            let centered = session.center_images()?;
            debug!("{centered} image paragraphs have been centered.");
            session.save()
        })();

        session.close();
        result
    }
}

/// Creates a new report document from the template: fills the template's content controls and
/// appends the introduction sections on a new page.
pub fn create_document(
    backend: &dyn DocumentBackend, template: &Path, output: &Path, fields: &[(String, String)],
    introduction: &str, progress: &str,
) -> EmptyResult {
    if output.exists() {
        return Err!("{:?} already exists", output);
    }

    fs::copy(template, output).map_err(|e| format!(
        "Unable to copy {template:?} to {output:?}: {e}"))?;

    let mut session = backend.open(output)?;

    let result = (|| -> EmptyResult {
        for (title, value) in fields {
            if !session.fill_field(title, value)? {
                warn!("The template has no {title:?} field.");
            }
        }

        session.configure_heading_numbering()?;
        session.append_page_break()?;

        for (title, text) in [(INTRODUCTION_SECTION, introduction), (PROGRESS_SECTION, progress)] {
            if !text.trim().is_empty() {
                session.append_heading(1, title)?;
                session.append_text(text.trim())?;
            }
        }

        session.save()
    })();

    session.close();
    result?;

    info!("{output:?} has been created.");
    Ok(())
}

/// Moves the drilling discipline right before special tests if it follows them.
pub fn order_disciplines(disciplines: &[String], drilling: &str, special_tests: &str) -> Vec<String> {
    let mut disciplines = disciplines.to_vec();

    let drilling_index = disciplines.iter().position(|name| name == drilling);
    let special_tests_index = disciplines.iter().position(|name| name == special_tests);

    if let (Some(drilling_index), Some(special_tests_index)) = (drilling_index, special_tests_index) {
        if drilling_index > special_tests_index {
            let drilling = disciplines.remove(drilling_index);
            disciplines.insert(special_tests_index, drilling);
        }
    }

    disciplines
}

/// Splits a table into chunks with at most `max_columns` data columns each prefixed with the key
/// columns.
pub fn split_wide_table<S: AsRef<str>>(data: &Dataset, key_columns: &[S], max_columns: usize) -> Vec<Dataset> {
    let keys: Vec<&str> = key_columns.iter()
        .map(AsRef::as_ref)
        .filter(|&name| data.has_column(name))
        .collect();

    let columns: Vec<&str> = data.column_names().into_iter()
        .filter(|name| !keys.contains(name))
        .collect();

    if columns.is_empty() {
        return vec![data.clone()];
    }

    columns.chunks(max_columns.max(1)).map(|chunk| {
        let names: Vec<&str> = keys.iter().chain(chunk).copied().collect();
        data.select(&names)
    }).collect()
}

#[derive(Debug, Default, PartialEq)]
pub struct Evidence {
    pub images: Vec<PathBuf>,
    pub workbooks: Vec<PathBuf>,
}

/// Lists supported evidence files of the discipline folder in name order. Images rendered from
/// PDF files are omitted since the PDF itself is listed.
pub fn find_evidence(path: &Path) -> Evidence {
    let mut evidence = Evidence::default();

    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(err) => {
            debug!("Unable to list {path:?}: {err}.");
            return evidence;
        },
    };

    let mut files: Vec<PathBuf> = entries.flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| !path.file_name().is_some_and(|name| name.to_string_lossy().starts_with("~$")))
        .collect();
    files.sort();

    for file in &files {
        if has_extension(file, &IMAGE_EXTENSIONS) {
            let rendered = has_extension(file, &["png"]) && files.iter().any(|other| {
                has_extension(other, &["pdf"]) && pdf::rendered_image_path(other) == *file
            });

            if rendered {
                debug!("{file:?} is a rendered PDF. Skipping it.");
            } else {
                evidence.images.push(file.clone());
            }
        } else if has_extension(file, &WORKBOOK_EXTENSIONS) {
            evidence.workbooks.push(file.clone());
        }
    }

    evidence
}

/// Lists discipline folders of the evidence root in name order.
pub fn list_disciplines(evidence_root: &Path) -> GenericResult<Vec<String>> {
    let mut disciplines = Vec::new();

    for entry in fs::read_dir(evidence_root).map_err(|e| format!("Unable to list {evidence_root:?}: {e}"))? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            disciplines.push(entry.file_name().to_string_lossy().to_string());
        }
    }

    disciplines.sort();
    Ok(disciplines)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension().is_some_and(|extension| {
        let extension = extension.to_string_lossy().to_lowercase();
        extensions.contains(&extension.as_str())
    })
}

fn append_text(session: &mut dyn DocumentSession, text: Option<&String>) -> EmptyResult {
    match text.map(|text| text.trim()) {
        Some(text) if !text.is_empty() => session.append_text(text),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet};

    use crate::dataset::Value;

    use super::*;

    type Log = Rc<RefCell<Vec<String>>>;

    struct RecordingSession {
        log: Log,
        fail_numbering: bool,
    }

    impl DocumentSession for RecordingSession {
        fn fill_field(&mut self, title: &str, value: &str) -> GenericResult<bool> {
            self.record(format!("field: {title}={value}"))?;
            Ok(title != "Trecho")
        }

        fn configure_heading_numbering(&mut self) -> EmptyResult {
            if self.fail_numbering {
                return Err!("Numbering is not supported");
            }
            self.record("numbering".to_owned())
        }

        fn append_heading(&mut self, level: usize, text: &str) -> EmptyResult {
            self.record(format!("heading {level}: {text}"))
        }

        fn append_text(&mut self, text: &str) -> EmptyResult {
            self.record(format!("text: {text}"))
        }

        fn append_caption(&mut self, text: &str) -> EmptyResult {
            self.record(format!("caption: {text}"))
        }

        fn append_image(&mut self, path: &Path) -> EmptyResult {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            self.record(format!("image: {name}"))
        }

        fn append_table(&mut self, data: &Dataset) -> EmptyResult {
            self.record(format!("table: {}", data.column_names().join("|")))
        }

        fn append_page_break(&mut self) -> EmptyResult {
            self.record("page break".to_owned())
        }

        fn indent_headings(&mut self, left: u32, right: u32) -> EmptyResult {
            self.record(format!("indent: {left}/{right}"))
        }

        fn center_images(&mut self) -> GenericResult<usize> {
            self.record("center".to_owned())?;
            Ok(0)
        }

        fn save(&mut self) -> EmptyResult {
            self.record("save".to_owned())
        }

        fn close(&mut self) {
            self.log.borrow_mut().push("close".to_owned());
        }
    }

    impl RecordingSession {
        fn record(&mut self, event: String) -> EmptyResult {
            self.log.borrow_mut().push(event);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingBackend {
        log: Log,
        fail_numbering: bool,
    }

    impl DocumentBackend for RecordingBackend {
        fn open(&self, path: &Path) -> GenericResult<Box<dyn DocumentSession>> {
            self.log.borrow_mut().push(format!("open: {}", path.file_name().unwrap().to_string_lossy()));
            Ok(Box::new(RecordingSession {
                log: self.log.clone(),
                fail_numbering: self.fail_numbering,
            }))
        }
    }

    struct FakeRasterizer;

    impl Rasterizer for FakeRasterizer {
        fn render_first_page(&self, pdf: &Path, png: &Path) -> EmptyResult {
            if pdf.file_name().unwrap().to_string_lossy().contains("broken") {
                return Err!("Invalid PDF");
            }
            fs::write(png, "png")?;
            Ok(())
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[rstest(disciplines, expected,
        case(&["Ensaios Especiais", "Topografia", "Sondagens"], &["Sondagens", "Ensaios Especiais", "Topografia"]),
        case(&["Sondagens", "Ensaios Especiais"], &["Sondagens", "Ensaios Especiais"]),
        case(&["Topografia", "Sondagens"], &["Topografia", "Sondagens"]),
        case(&["Ensaios Especiais", "Sondagens"], &["Sondagens", "Ensaios Especiais"]),
    )]
    fn ordering(disciplines: &[&str], expected: &[&str]) {
        assert_eq!(
            order_disciplines(&strings(disciplines), "Sondagens", "Ensaios Especiais"),
            strings(expected));
    }

    #[test]
    fn wide_table_splitting() {
        let names: Vec<String> = ["KM", "Sondagem"].iter().map(ToString::to_string)
            .chain((1..=20).map(|index| format!("C{index}")))
            .collect();
        let data = Dataset::new(names, vec![vec![Value::text("x"); 22]]);

        let chunks = split_wide_table(&data, &["Sondagem", "Missing"], 9);
        let columns: Vec<usize> = chunks.iter().map(|chunk| chunk.columns().len()).collect();
        assert_eq!(columns, vec![10, 10, 4]);

        for chunk in &chunks {
            assert_eq!(chunk.column_names()[0], "Sondagem");
        }
        assert_eq!(chunks[0].column_names()[1], "KM");
        assert_eq!(chunks[2].column_names(), vec!["Sondagem", "C18", "C19", "C20"]);

        let keys_only = Dataset::new(vec!["Sondagem"], vec![vec![Value::text("SP-01")]]);
        assert_eq!(split_wide_table(&keys_only, &["Sondagem"], 9), vec![keys_only]);
    }

    #[test]
    fn evidence_discovery() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "b.png", "a.JPG", "c.png", "table.xlsx", "~$table.xlsx", "notes.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("nested.png")).unwrap();

        assert_eq!(find_evidence(dir.path()), Evidence {
            images: vec![dir.path().join("a.JPG"), dir.path().join("b.pdf"), dir.path().join("c.png")],
            workbooks: vec![dir.path().join("table.xlsx")],
        });

        assert_eq!(find_evidence(&dir.path().join("missing")), Evidence::default());
    }

    #[test]
    fn measurement() {
        let dir = tempfile::tempdir().unwrap();
        let document = dir.path().join("report.docx");
        let root = dir.path().join("evidence");

        let special_tests = root.join("Ensaios Especiais");
        fs::create_dir_all(&special_tests).unwrap();
        fs::write(special_tests.join("photo.jpg"), "").unwrap();
        fs::write(special_tests.join("scan.pdf"), "").unwrap();
        fs::write(special_tests.join("broken.pdf"), "").unwrap();
        fs::create_dir_all(root.join("Sondagens")).unwrap();

        let config = Config::builtin().unwrap();
        let backend = RecordingBackend::default();
        let assembler = ReportAssembler::new(&config, &backend, &FakeRasterizer);

        let texts = HashMap::from([
            (s!("Projeto"), s!("Project text")),
            (s!("Sondagens"), s!(" ")),
        ]);

        let month = Month::new(2024, 3).unwrap();
        assembler.append_measurement(
            &document, &strings(&["Ensaios Especiais", "Sondagens"]), &texts, &root, month).unwrap();

        assert_eq!(*backend.log.borrow(), strings(&[
            "open: report.docx",
            "numbering",
            "heading 2: MEDIÇÃO (03/2024)",
            "heading 3: Projeto",
            "text: Project text",
            "heading 3: Sondagens",
            "text: Nenhuma evidência encontrada para esta disciplina.",
            "heading 3: Ensaios Especiais",
            "image: photo.jpg",
            "image: scan.png",
            "save",
            "close",
            "open: report.docx",
            "indent: 36/36",
            "center",
            "save",
            "close",
        ]));

        assert!(special_tests.join("scan.png").exists());
        assert!(!special_tests.join("broken.png").exists());
    }

    fn write_date(worksheet: &mut Worksheet, row: u32, column: u16, date: (u16, u8, u8)) {
        let format = Format::new().set_num_format("dd/mm/yyyy");
        let date = ExcelDateTime::from_ymd(date.0, date.1, date.2).unwrap();
        worksheet.write_datetime_with_format(row, column, &date, &format).unwrap();
    }

    fn write_drilling_workbook(path: &Path) {
        const COLUMNS: [&str; 16] = [
            "KM", "SONDAGEM A TRADO", "NORTE", "LESTE", "PROFUNDIDADE EXECUTADA (m)", "MEDIÇÃO",
            "UMIDADE NATURAL", "MEDIÇÃO", "DENSIDADE IN SITU", "MEDIÇÃO", "LL-LP", "MEDIÇÃO",
            "ANÁLISE GRANULOMÉTRICA COM PENEIRAMENTO E SEDIMENTAÇÃO", "MEDIÇÃO",
            "COMPACTAÇÃO E CBR (5 PONTOS) ENERGIA PROCTOR NORMAL", "MEDIÇÃO",
        ];

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("TRADO").unwrap();

        for (column, name) in COLUMNS.iter().enumerate() {
            worksheet.write_string(6, column as u16, *name).unwrap();
        }

        // Density has no measurement date and LL-LP isn't filled at all
        worksheet.write_string(7, 0, "10+200").unwrap();
        worksheet.write_string(7, 1, "ST-01").unwrap();
        worksheet.write_number(7, 2, 7_000_100.0).unwrap();
        worksheet.write_number(7, 3, 500_200.0).unwrap();
        worksheet.write_number(7, 4, 3.0).unwrap();
        write_date(worksheet, 7, 5, (2024, 3, 4));
        worksheet.write_number(7, 6, 12.5).unwrap();
        write_date(worksheet, 7, 7, (2024, 3, 5));
        worksheet.write_number(7, 8, 1.8).unwrap();
        worksheet.write_string(7, 12, "Executado").unwrap();
        write_date(worksheet, 7, 13, (2024, 3, 6));
        worksheet.write_number(7, 14, 10.0).unwrap();
        write_date(worksheet, 7, 15, (2024, 3, 7));

        worksheet.write_string(8, 0, "10+400").unwrap();
        worksheet.write_string(8, 1, "ST-02").unwrap();
        write_date(worksheet, 8, 5, (2024, 4, 2));
        worksheet.write_number(8, 6, 13.0).unwrap();
        write_date(worksheet, 8, 7, (2024, 4, 3));

        worksheet.write_string(9, 0, "TOTAL").unwrap();

        workbook.save(path).unwrap();
    }

    #[test]
    fn measurement_with_wide_table() {
        let dir = tempfile::tempdir().unwrap();
        let document = dir.path().join("report.docx");
        let root = dir.path().join("evidence");

        let drilling = root.join("Sondagens");
        fs::create_dir_all(&drilling).unwrap();
        write_drilling_workbook(&drilling.join("Controle.xlsx"));

        let config = Config::builtin().unwrap();
        let backend = RecordingBackend::default();
        let assembler = ReportAssembler::new(&config, &backend, &FakeRasterizer);

        let month = Month::new(2024, 3).unwrap();
        assembler.append_measurement(&document, &strings(&["Sondagens"]), &HashMap::new(), &root, month).unwrap();

        assert_eq!(*backend.log.borrow(), strings(&[
            "open: report.docx",
            "numbering",
            "heading 2: MEDIÇÃO (03/2024)",
            "heading 3: Projeto",
            "heading 3: Sondagens",
            "caption: Tabela: TRADO",
            "table: Sondagem|KM|Norte|Leste|Profundidade (m)|MEDIÇÃO|Umidade|MEDIÇÃO_2|Granulometria|MEDIÇÃO_5",
            "table: Sondagem|CBR Normal|MEDIÇÃO_6",
            "save",
            "close",
            "open: report.docx",
            "indent: 36/36",
            "center",
            "save",
            "close",
        ]));
    }

    #[test]
    fn measurement_without_numbering() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::builtin().unwrap();
        let backend = RecordingBackend {fail_numbering: true, ..Default::default()};
        let assembler = ReportAssembler::new(&config, &backend, &FakeRasterizer);

        let result = assembler.append_measurement(
            &dir.path().join("report.docx"), &strings(&["Sondagens"]), &HashMap::new(), dir.path(),
            Month::new(2024, 3).unwrap());

        assert!(result.unwrap_err().to_string().starts_with("Unable to configure heading numbering"));
        assert_eq!(*backend.log.borrow(), strings(&["open: report.docx", "close"]));
    }

    #[test]
    fn new_document() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.docx");
        let output = dir.path().join("output.docx");
        fs::write(&template, "template").unwrap();

        let fields = vec![
            (s!("Rodovia"), s!("MS-163")),
            (s!("Trecho"), s!("Km 0 - Km 10")),
            (s!("Revisão 0"), s!("R00")),
        ];

        let backend = RecordingBackend::default();
        create_document(&backend, &template, &output, &fields, "Intro", "").unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap(), "template");
        assert_eq!(*backend.log.borrow(), strings(&[
            "open: output.docx",
            "field: Rodovia=MS-163",
            "field: Trecho=Km 0 - Km 10",
            "field: Revisão 0=R00",
            "numbering",
            "page break",
            "heading 1: INTRODUÇÃO",
            "text: Intro",
            "save",
            "close",
        ]));

        assert!(create_document(&backend, &template, &output, &[], "Intro", "Progress").is_err());
    }

    #[test]
    fn discipline_listing() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("Topografia")).unwrap();
        fs::create_dir(dir.path().join("Geotecnia")).unwrap();
        fs::write(dir.path().join("file.txt"), "").unwrap();

        assert_eq!(list_disciplines(dir.path()).unwrap(), strings(&["Geotecnia", "Topografia"]));
    }
}
