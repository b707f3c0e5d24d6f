//! Evidence folder tree builder.
//!
//! Creates `<records file name>_Evidencias` next to the records workbook with the fixed
//! subfolders and one subfolder per discipline found in the records.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;

use crate::config::{Config, DisciplineConfig};
use crate::core::GenericResult;
use crate::dataset::Dataset;

const ROOT_SUFFIX: &str = "_Evidencias";
const AGENCY_CODE_LENGTH: usize = 39;

#[derive(Debug, Clone, Copy, Default)]
pub struct FolderOptions {
    pub drilling: bool,
    pub special_tests: bool,
    pub copy_pdfs: bool,
}

#[derive(Debug)]
pub struct FolderTree {
    pub root: PathBuf,
    pub disciplines: Vec<String>,
    pub copied_files: usize,
    pub failed_copies: usize,
    pub message: String,
}

pub struct FolderCreator<'a> {
    config: &'a Config,
    disciplines: &'a [DisciplineConfig],
}

impl<'a> FolderCreator<'a> {
    pub fn new(config: &'a Config, project: &str) -> GenericResult<FolderCreator<'a>> {
        Ok(FolderCreator {
            config,
            disciplines: config.get_project(project)?,
        })
    }

    pub fn create(&self, data: &Dataset, source: &Path, options: FolderOptions) -> GenericResult<FolderTree> {
        let base_dir = source.parent().unwrap_or(Path::new("."));
        let file_name = source.file_stem().map(|name| name.to_string_lossy()).unwrap_or_default();

        let root = free_root_path(base_dir, &format!("{}{}", sanitize_filename(&file_name), ROOT_SUFFIX));
        let root_name = root.file_name().map(|name| name.to_string_lossy().to_string()).unwrap_or_default();

        create_dir(&root)?;
        if options.drilling {
            create_dir(&root.join(&self.config.folders.drilling))?;
        }
        if options.special_tests {
            create_dir(&root.join(&self.config.folders.special_tests))?;
        }

        let mut tree = FolderTree {
            root: root.clone(),
            disciplines: Vec::new(),
            copied_files: 0,
            failed_copies: 0,
            message: String::new(),
        };

        let Some(code_column) = data.column_index(&self.config.agency_code_column) else {
            tree.message = format!(
                "The main structure has been created in {root_name:?}, but {:?} column is not found",
                self.config.agency_code_column);
            warn!("{}.", tree.message);
            return Ok(tree);
        };

        if data.is_empty() {
            tree.message = format!(
                "The main structure has been created in {root_name:?}. There are no records to create discipline folders for");
            warn!("{}.", tree.message);
            return Ok(tree);
        }

        let pdf_sources: Vec<PathBuf> = self.config.folders.pdf_sources.iter()
            .map(|path| base_dir.join(shellexpand::tilde(path).into_owned()))
            .collect();

        let mut created = BTreeSet::new();
        let mut copied_codes = HashSet::new();

        for row in data.rows() {
            let code = row[code_column].to_string();
            let Some(discipline) = find_discipline(self.disciplines, &code) else {
                debug!("{code:?} doesn't match any discipline.");
                continue;
            };

            let path = root.join(discipline);
            if created.insert(discipline) {
                create_dir(&path)?;
            }

            if options.copy_pdfs && copied_codes.insert(code.clone()) {
                for pdf in find_pdfs(&pdf_sources, &code) {
                    match copy_file(&pdf, &path) {
                        Ok(()) => tree.copied_files += 1,
                        Err(err) => {
                            warn!("{err}.");
                            tree.failed_copies += 1;
                        },
                    }
                }
            }
        }

        tree.disciplines = self.disciplines.iter()
            .map(|discipline| discipline.name.as_str())
            .filter(|name| created.contains(name))
            .map(ToOwned::to_owned)
            .collect();

        tree.message = format!("The folder structure has been successfully created in {root_name:?}");
        info!("{}.", tree.message);

        Ok(tree)
    }
}

/// Classifies an agency code: the first discipline (in configuration order) which has a code
/// contained in the agency code wins.
pub fn find_discipline<'a>(disciplines: &'a [DisciplineConfig], agency_code: &str) -> Option<&'a str> {
    let agency_code = agency_code.trim().to_uppercase();
    if agency_code.is_empty() {
        return None;
    }

    disciplines.iter().find(|discipline| {
        discipline.codes.iter().any(|code| agency_code.contains(&code.to_uppercase()))
    }).map(|discipline| discipline.name.as_str())
}

pub fn sanitize_filename(name: &str) -> String {
    lazy_static! {
        static ref INVALID_CHARS_REGEX: Regex = Regex::new(r#"[\\/*?:"<>|]"#).unwrap();
    }
    INVALID_CHARS_REGEX.replace_all(name, "").to_string()
}

fn free_root_path(base_dir: &Path, name: &str) -> PathBuf {
    let mut path = base_dir.join(name);
    let mut counter = 1;

    while path.exists() {
        path = base_dir.join(format!("{name} ({counter})"));
        counter += 1;
    }

    path
}

fn create_dir(path: &Path) -> GenericResult<()> {
    fs::create_dir_all(path).map_err(|e| format!("Unable to create {path:?}: {e}"))?;
    Ok(())
}

fn code_prefix(name: &str) -> String {
    name.chars().take(AGENCY_CODE_LENGTH).collect()
}

fn find_pdfs(sources: &[PathBuf], agency_code: &str) -> Vec<PathBuf> {
    let code = agency_code.trim();
    let mut pdfs = Vec::new();

    for source in sources {
        let entries = match fs::read_dir(source) {
            Ok(entries) => entries,
            Err(err) => {
                debug!("Skipping {source:?}: {err}.");
                continue;
            },
        };

        for entry in entries.flatten() {
            let path = entry.path();

            let is_pdf = path.extension().is_some_and(|extension| extension.eq_ignore_ascii_case("pdf"));
            let matches = path.file_name()
                .map(|name| code_prefix(&name.to_string_lossy()) == code)
                .unwrap_or_default();

            if is_pdf && matches && path.is_file() {
                pdfs.push(path);
            }
        }
    }

    pdfs.sort();
    pdfs
}

fn copy_file(path: &Path, dir: &Path) -> GenericResult<()> {
    let name = path.file_name().ok_or_else(|| format!("Invalid file path: {path:?}"))?;
    fs::copy(path, dir.join(name)).map_err(|e| format!("Failed to copy {path:?} to {dir:?}: {e}"))?;
    Ok(())
}
