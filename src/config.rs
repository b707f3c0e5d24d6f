use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use itertools::Itertools;
use log::debug;
use serde::Deserialize;

use crate::core::GenericResult;

const BUILTIN_CONFIG: &str = include_str!("config.yaml");

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub agency_code_column: String,
    pub records_date_column: String,

    pub folders: FoldersConfig,
    pub projects: HashMap<String, Vec<DisciplineConfig>>,
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub texts: HashMap<String, String>,
}

impl Config {
    /// Loads `config.yaml` from the configuration directory falling back to the built-in
    /// configuration when the file doesn't exist.
    pub fn new(config_dir: &str) -> GenericResult<Config> {
        let path = Path::new(config_dir).join("config.yaml");

        match fs::read_to_string(&path) {
            Ok(data) => {
                debug!("Loading configuration from {path:?}...");
                Config::parse(&data).map_err(|e| format!(
                    "Error while reading {path:?} configuration file: {e}").into())
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("{path:?} doesn't exist. Using the built-in configuration.");
                Config::builtin()
            },
            Err(err) => Err!("Unable to read {:?}: {}", path, err),
        }
    }

    pub fn builtin() -> GenericResult<Config> {
        Config::parse(BUILTIN_CONFIG)
    }

    pub fn parse(data: &str) -> GenericResult<Config> {
        let config: Config = serde_yaml::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn get_project(&self, name: &str) -> GenericResult<&[DisciplineConfig]> {
        let name = name.to_lowercase();

        Ok(self.projects.get(&name).map(Vec::as_slice).ok_or_else(|| format!(
            "Unknown project type: {:?}. Available types: {}", name, self.projects.keys().sorted().join(", ")))?)
    }

    fn validate(&self) -> GenericResult<()> {
        if self.projects.is_empty() {
            return Err!("At least one project type must be configured");
        }

        for (project, disciplines) in &self.projects {
            if project.to_lowercase() != *project {
                return Err!("Invalid project type name: {:?}. It must be in lower case", project);
            }

            let mut names = HashSet::new();

            for discipline in disciplines {
                if !names.insert(&discipline.name) {
                    return Err!("Duplicate {:?} discipline in {:?} project", discipline.name, project);
                }

                if discipline.codes.is_empty() || discipline.codes.iter().any(|code| code.trim().is_empty()) {
                    return Err!("Invalid codes for {:?} discipline in {:?} project", discipline.name, project);
                }
            }
        }

        self.extraction.validate()
    }
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct FoldersConfig {
    pub drilling: String,
    pub special_tests: String,

    /// Directories scanned for PDF evidence (relative paths are resolved against the records
    /// workbook directory).
    #[serde(default)]
    pub pdf_sources: Vec<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct DisciplineConfig {
    pub name: String,
    pub codes: Vec<String>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct ExtractionConfig {
    pub disciplines: HashMap<String, Vec<String>>,
    pub sheets: HashMap<String, Vec<String>>,

    #[serde(default)]
    pub repeated_sheets: Vec<String>,
    #[serde(default)]
    pub protected_columns: Vec<String>,

    #[serde(default)]
    pub wide_sheets: Vec<String>,
    #[serde(default)]
    pub key_columns: Vec<String>,
    #[serde(default = "default_max_data_columns")]
    pub max_data_columns: usize,

    #[serde(default)]
    pub renames: HashMap<String, String>,
    #[serde(default)]
    pub derived_columns: Vec<DerivedColumnConfig>,
}

impl ExtractionConfig {
    pub fn sheet_columns(&self, sheet: &str) -> Option<&[String]> {
        self.sheets.get(&sheet.to_uppercase()).map(Vec::as_slice)
    }

    pub fn is_repeated_sheet(&self, sheet: &str) -> bool {
        contains_upper(&self.repeated_sheets, sheet)
    }

    pub fn is_protected_column(&self, column: &str) -> bool {
        contains_upper(&self.protected_columns, column)
    }

    pub fn is_wide_sheet(&self, sheet: &str) -> bool {
        contains_upper(&self.wide_sheets, sheet)
    }

    pub fn derived_columns(&self, sheet: &str) -> impl Iterator<Item = &DerivedColumnConfig> {
        self.derived_columns.iter().filter(move |derived| contains_upper(&derived.sheets, sheet))
    }

    fn validate(&self) -> GenericResult<()> {
        if self.max_data_columns == 0 {
            return Err!("Invalid max_data_columns value: it must be positive");
        }

        for (sheet, columns) in &self.sheets {
            if sheet.to_uppercase() != *sheet {
                return Err!("Invalid sheet name: {:?}. Sheet names must be in upper case", sheet);
            } else if columns.is_empty() {
                return Err!("Empty column list for {:?} sheet", sheet);
            }
        }

        let references = self.disciplines.values().flatten()
            .chain(&self.repeated_sheets)
            .chain(&self.wide_sheets)
            .chain(self.derived_columns.iter().flat_map(|derived| &derived.sheets));

        for sheet in references {
            if !self.sheets.contains_key(&sheet.to_uppercase()) {
                return Err!("Unknown sheet is referenced in extraction configuration: {:?}", sheet);
            }
        }

        Ok(())
    }
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct DerivedColumnConfig {
    pub sheets: Vec<String>,
    pub source: String,
    pub name: String,
}

fn default_max_data_columns() -> usize {
    9
}

fn contains_upper(list: &[String], name: &str) -> bool {
    let name = name.to_uppercase();
    list.iter().any(|item| item.to_uppercase() == name)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn builtin() {
        let config = Config::builtin().unwrap();

        let artesp = config.get_project("ARTESP").unwrap();
        assert_eq!(artesp[0].name, "Topografia");
        assert!(config.get_project("antt").is_ok());
        assert!(config.get_project("dnit").is_err());

        let extraction = &config.extraction;
        assert!(extraction.sheet_columns("Percussão").is_some());
        assert!(extraction.is_repeated_sheet("trado"));
        assert!(!extraction.is_repeated_sheet("PERCUSSÃO"));
        assert!(extraction.is_protected_column("Amostragem Shelby"));
        assert_eq!(extraction.derived_columns("Shelby").count(), 1);
        assert_eq!(extraction.derived_columns("TRADO").count(), 0);
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(config.agency_code_column, "CÓDIGO AGENCIA");
    }

    #[test]
    fn custom_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.yaml"), indoc!("
            agency_code_column: CODE
            records_date_column: DATE
            folders:
              drilling: Drilling
              special_tests: Special tests
            projects:
              artesp:
                - name: Survey
                  codes: [-TOP-]
            extraction:
              disciplines:
                Drilling: [PERCUSSÃO]
              sheets:
                PERCUSSÃO: [KM, MEDIÇÃO]
        ")).unwrap();

        let config = Config::new(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(config.agency_code_column, "CODE");
        assert_eq!(config.extraction.max_data_columns, 9);
        assert!(config.texts.is_empty());
    }

    #[test]
    fn invalid() {
        let duplicate = indoc!("
            agency_code_column: CODE
            records_date_column: DATE
            folders: {drilling: Drilling, special_tests: Special}
            projects:
              artesp:
                - {name: Survey, codes: [-TOP-]}
                - {name: Survey, codes: [-GEO-]}
            extraction: {disciplines: {}, sheets: {}}
        ");
        assert_eq!(
            Config::parse(duplicate).unwrap_err().to_string(),
            r#"Duplicate "Survey" discipline in "artesp" project"#);

        let unknown_sheet = indoc!("
            agency_code_column: CODE
            records_date_column: DATE
            folders: {drilling: Drilling, special_tests: Special}
            projects:
              artesp: [{name: Survey, codes: [-TOP-]}]
            extraction:
              disciplines: {Drilling: [MISTA]}
              sheets: {PERCUSSÃO: [KM]}
        ");
        assert_eq!(
            Config::parse(unknown_sheet).unwrap_err().to_string(),
            r#"Unknown sheet is referenced in extraction configuration: "MISTA""#);

        let unknown_field = indoc!("
            agency_code_column: CODE
            records_date_column: DATE
            unknown: value
        ");
        assert!(Config::parse(unknown_field).is_err());
    }
}
