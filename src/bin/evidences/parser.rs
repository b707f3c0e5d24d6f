use std::path::PathBuf;

use clap::{ArgAction, ArgMatches};

use evidences::Err;
use evidences::cli;
use evidences::core::GenericResult;
use evidences::folders::FolderOptions;
use evidences::time::Month;

use super::action::Action;

pub struct Parser {
    matches: Option<ArgMatches>,
}

pub struct GlobalOptions {
    pub log_level: log::Level,
    pub config_dir: String,
}

impl Parser {
    pub fn new() -> Parser {
        Parser {matches: None}
    }

    pub fn parse_global(&mut self) -> GenericResult<GlobalOptions> {
        const DEFAULT_CONFIG_DIR_PATH: &str = "~/.evidences";

        let app = cli::new_app("evidences", "Builds evidence folders and monthly progress reports")
            .version(env!("CARGO_PKG_VERSION"))
            .subcommand_required(true)
            .arg_required_else_help(true)
            .args([
                cli::new_arg("config", "Configuration directory path [default: ~/.evidences]")
                    .short('c').long("config")
                    .value_name("PATH"),

                cli::new_arg("verbose", "Set verbosity level")
                    .short('v').long("verbose")
                    .action(ArgAction::Count)
                    .global(true),
            ])

            .subcommand(cli::new_subcommand(
                "show", "Show records of the document list workbook")
                .args([
                    month::arg(false),

                    cli::new_arg("page", "Page number to show")
                        .short('p').long("page")
                        .value_name("PAGE")
                        .default_value("1"),

                    workbook::arg(),
                ]))

            .subcommand(cli::new_subcommand(
                "folders", "Create evidence folder structure")
                .long_about("\
                    Creates <workbook name>_Evidencias folder next to the document list workbook \
                    with a subfolder for every discipline the listed documents belong to.")
                .args([
                    cli::new_arg("project", "Project type")
                        .short('t').long("project")
                        .value_name("PROJECT")
                        .required(true),

                    month::arg(false),

                    cli::new_arg("no_drilling", "Don't create drilling folder")
                        .long("no-drilling")
                        .action(ArgAction::SetTrue),

                    cli::new_arg("no_special_tests", "Don't create special tests folder")
                        .long("no-special-tests")
                        .action(ArgAction::SetTrue),

                    cli::new_arg("copy_pdfs", "Copy PDF documents to the discipline folders")
                        .long("copy-pdfs")
                        .action(ArgAction::SetTrue),

                    workbook::arg(),
                ]))

            .subcommand(cli::new_subcommand(
                "extract", "Show measurement tables extracted from the workbook")
                .args([
                    workbook::arg(),
                    cli::new_arg("DISCIPLINE", "Discipline name").required(true),
                    month::arg(true),
                ]))

            .subcommand(cli::new_subcommand(
                "new", "Create a new report document from the template")
                .args([
                    cli::new_arg("intro", "Introduction text")
                        .long("intro")
                        .value_name("TEXT"),

                    cli::new_arg("progress", "Physical progress text")
                        .long("progress")
                        .value_name("TEXT"),

                    cli::new_arg("field", "Fill the template's content control with the specified title")
                        .short('f').long("field")
                        .value_name("TITLE=VALUE")
                        .action(ArgAction::Append),

                    cli::new_arg("revision", "Initial revision code")
                        .long("revision")
                        .value_name("CODE"),

                    cli::new_arg("revision_date", "Initial revision date")
                        .long("revision-date")
                        .value_name("DATE"),

                    cli::new_arg("revision_description", "Initial revision description")
                        .long("revision-description")
                        .value_name("TEXT"),

                    cli::new_arg("TEMPLATE", "Template document path").required(true),
                    cli::new_arg("OUTPUT", "Path to save the document to").required(true),
                ]))

            .subcommand(cli::new_subcommand(
                "report", "Add monthly measurement section to the report document")
                .long_about("\
                    Appends the month's measurement section to the document with evidence \
                    images and tables found in the discipline folders of the evidence directory.")
                .args([
                    cli::new_arg("texts", "YAML file with discipline texts")
                        .short('t').long("texts")
                        .value_name("PATH"),

                    cli::new_arg("discipline", "Discipline to add (all evidence subfolders by default)")
                        .short('d').long("discipline")
                        .value_name("DISCIPLINE")
                        .action(ArgAction::Append),

                    cli::new_arg("DOCUMENT", "Report document path").required(true),
                    cli::new_arg("EVIDENCE_DIR", "Evidence folder path").required(true),
                    month::arg(true),
                ]));

        let matches = app.get_matches();

        let log_level = match matches.get_count("verbose") {
            0 => log::Level::Info,
            1 => log::Level::Debug,
            2 => log::Level::Trace,
            _ => return Err!("Invalid verbosity level"),
        };

        let config_dir = matches.get_one::<String>("config").cloned().unwrap_or_else(||
            shellexpand::tilde(DEFAULT_CONFIG_DIR_PATH).to_string());

        self.matches = Some(matches);

        Ok(GlobalOptions {log_level, config_dir})
    }

    pub fn parse(mut self) -> GenericResult<Action> {
        let matches = self.matches.take().ok_or("Command line arguments are not parsed")?;
        let (command, matches) = matches.subcommand().ok_or("Command is not specified")?;
        parse_command(command, matches)
    }
}

fn parse_command(command: &str, matches: &ArgMatches) -> GenericResult<Action> {
    Ok(match command {
        "show" => {
            let page = get_string(matches, "page");
            let page = page.parse().map_err(|_| format!("Invalid page number: {page:?}"))?;

            Action::Show {
                path: workbook::get(matches),
                month: month::get(matches)?,
                page,
            }
        },

        "folders" => Action::Folders {
            path: workbook::get(matches),
            project: get_string(matches, "project"),
            month: month::get(matches)?,
            options: FolderOptions {
                drilling: !matches.get_flag("no_drilling"),
                special_tests: !matches.get_flag("no_special_tests"),
                copy_pdfs: matches.get_flag("copy_pdfs"),
            },
        },

        "extract" => Action::Extract {
            path: workbook::get(matches),
            discipline: get_string(matches, "DISCIPLINE"),
            month: month::get_required(matches)?,
        },

        "new" => Action::New {
            template: get_path(matches, "TEMPLATE"),
            output: get_path(matches, "OUTPUT"),
            fields: fields::get(matches)?,
            introduction: get_string(matches, "intro"),
            progress: get_string(matches, "progress"),
        },

        "report" => Action::Report {
            document: get_path(matches, "DOCUMENT"),
            evidence_root: get_path(matches, "EVIDENCE_DIR"),
            month: month::get_required(matches)?,
            texts_path: matches.get_one::<String>("texts").map(PathBuf::from),
            disciplines: matches.get_many::<String>("discipline")
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
        },

        _ => return Err!("Unknown command: {command:?}"),
    })
}

fn get_string(matches: &ArgMatches, name: &str) -> String {
    matches.get_one::<String>(name).cloned().unwrap_or_default()
}

fn get_path(matches: &ArgMatches, name: &str) -> PathBuf {
    PathBuf::from(get_string(matches, name))
}

mod workbook {
    use super::*;

    pub fn arg() -> clap::Arg {
        cli::new_arg("WORKBOOK", "Workbook path").required(true)
    }

    pub fn get(matches: &ArgMatches) -> PathBuf {
        get_path(matches, "WORKBOOK")
    }
}

mod month {
    use super::*;

    pub fn arg(required: bool) -> clap::Arg {
        if required {
            cli::new_arg("MONTH", "Measurement month (in MM.YYYY format)").required(true)
        } else {
            cli::new_arg("MONTH", "Month to filter the records by (in MM.YYYY format)")
                .short('m').long("month")
                .value_name("MONTH")
        }
    }

    pub fn get(matches: &ArgMatches) -> GenericResult<Option<Month>> {
        matches.get_one::<String>("MONTH").map(|month| Month::parse(month)).transpose()
    }

    pub fn get_required(matches: &ArgMatches) -> GenericResult<Month> {
        get(matches)?.ok_or_else(|| "Month is not specified".into())
    }
}

mod fields {
    use super::*;

    const REVISION_FIELDS: [(&str, &str); 3] = [
        ("revision", "Revisão 0"),
        ("revision_date", "Data Revisão 0"),
        ("revision_description", "Descrição 0"),
    ];

    pub fn get(matches: &ArgMatches) -> GenericResult<Vec<(String, String)>> {
        let mut fields = Vec::new();

        for (name, title) in REVISION_FIELDS {
            if let Some(value) = matches.get_one::<String>(name) {
                fields.push((title.to_owned(), value.clone()));
            }
        }

        for field in matches.get_many::<String>("field").into_iter().flatten() {
            fields.push(parse(field)?);
        }

        Ok(fields)
    }

    pub fn parse(field: &str) -> GenericResult<(String, String)> {
        match field.split_once('=') {
            Some((title, value)) if !title.trim().is_empty() => Ok((title.trim().to_owned(), value.to_owned())),
            _ => Err!("Invalid field specification: {field:?}. Expected TITLE=VALUE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest(field, expected,
        case("Rodovia=MS-163", Some(("Rodovia", "MS-163"))),
        case(" Trecho =Km 0 = Km 10", Some(("Trecho", "Km 0 = Km 10"))),
        case("Descrição 0=", Some(("Descrição 0", ""))),
        case("Rodovia", None),
        case("=MS-163", None),
    )]
    fn field_parsing(field: &str, expected: Option<(&str, &str)>) {
        let expected = expected.map(|(title, value)| (title.to_owned(), value.to_owned()));
        assert_eq!(fields::parse(field).ok(), expected);
    }
}
