mod action;
mod parser;

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use log::{error, info, warn};

use evidences::config::Config;
use evidences::core::{EmptyResult, GenericResult};
use evidences::dataset::Dataset;
use evidences::extraction::Extractor;
use evidences::folders::{FolderCreator, FolderOptions};
use evidences::formatting::table;
use evidences::records;
use evidences::report::{self, ReportAssembler, PdfiumRasterizer, docx::DocxBackend};
use evidences::time::Month;

use self::action::Action;
use self::parser::{Parser, GlobalOptions};

fn main() -> ExitCode {
    let mut parser = Parser::new();

    let global = match parser.parse_global() {
        Ok(global) => global,
        Err(err) => {
            let _ = writeln!(io::stderr(), "{err}.");
            return ExitCode::FAILURE;
        },
    };

    if let Err(err) = easy_logging::init(module_path!(), global.log_level) {
        let _ = writeln!(io::stderr(), "Failed to initialize the logging: {err}.");
        return ExitCode::FAILURE;
    }

    if let Err(err) = run(global, parser) {
        let message = err.to_string();

        if message.contains('\n') {
            error!("{err}");
        } else {
            error!("{err}.");
        }

        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(global: GlobalOptions, parser: Parser) -> EmptyResult {
    let config = Config::new(&global.config_dir)?;

    match parser.parse()? {
        Action::Show {path, month, page} => show(&config, &path, month, page)?,
        Action::Folders {path, project, month, options} => create_folders(&config, &path, &project, month, options)?,
        Action::Extract {path, discipline, month} => extract(&config, &path, &discipline, month),

        Action::New {template, output, fields, introduction, progress} =>
            report::create_document(&DocxBackend, &template, &output, &fields, &introduction, &progress)?,

        Action::Report {document, evidence_root, month, texts_path, disciplines} => {
            let disciplines = if disciplines.is_empty() {
                report::list_disciplines(&evidence_root)?
            } else {
                disciplines
            };

            let texts = load_texts(&config, texts_path.as_deref())?;
            let assembler = ReportAssembler::new(&config, &DocxBackend, &PdfiumRasterizer);
            assembler.append_measurement(&document, &disciplines, &texts, &evidence_root, month)?;
        },
    };

    Ok(())
}

fn load_records(config: &Config, path: &Path, month: Option<Month>) -> GenericResult<Option<Dataset>> {
    let sheets = records::read_records(path);
    if sheets.is_empty() {
        warn!("No data found in {path:?}.");
        return Ok(None);
    }

    let data = records::concat(&sheets);

    Ok(Some(match month {
        Some(month) => records::filter_by_month(&data, &config.records_date_column, month)?,
        None => data,
    }))
}

fn show(config: &Config, path: &Path, month: Option<Month>, page: usize) -> EmptyResult {
    let Some(data) = load_records(config, path, month)? else {
        return Ok(());
    };

    let page = records::get_page(&data, page, records::ROWS_PER_PAGE)?;
    let titles = data.column_names();

    table::print_table(
        &format!("Records (page {} of {}, {} total)", page.number, page.count, data.len()),
        &titles, table::build_table(page.rows, &data));

    Ok(())
}

fn create_folders(config: &Config, path: &Path, project: &str, month: Option<Month>, options: FolderOptions) -> EmptyResult {
    let creator = FolderCreator::new(config, project)?;

    let Some(data) = load_records(config, path, month)? else {
        return Ok(());
    };

    let tree = creator.create(&data, path, options)?;

    if options.copy_pdfs {
        info!("{} PDF files have been copied.", tree.copied_files);
    }
    if tree.failed_copies != 0 {
        warn!("Failed to copy {} PDF files.", tree.failed_copies);
    }

    Ok(())
}

fn extract(config: &Config, path: &Path, discipline: &str, month: Month) {
    let tables = Extractor::new(&config.extraction).extract(path, month, discipline);
    if tables.is_empty() {
        info!("There are no {discipline:?} measurements for {month} in {path:?}.");
    }

    for sheet in tables {
        let titles = sheet.data.column_names();
        table::print_table(
            &format!("Tabela: {}", sheet.name), &titles,
            table::build_table(sheet.data.rows(), &sheet.data));
    }
}

fn load_texts(config: &Config, path: Option<&Path>) -> GenericResult<HashMap<String, String>> {
    let mut texts = config.texts.clone();

    if let Some(path) = path {
        let data = fs::read_to_string(path).map_err(|e| format!("Unable to read {path:?}: {e}"))?;
        let overrides: HashMap<String, String> = serde_yaml::from_str(&data).map_err(|e| format!(
            "Error while reading {path:?}: {e}"))?;
        texts.extend(overrides);
    }

    Ok(texts)
}
