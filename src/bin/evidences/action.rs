use std::path::PathBuf;

use evidences::folders::FolderOptions;
use evidences::time::Month;

pub enum Action {
    Show {
        path: PathBuf,
        month: Option<Month>,
        page: usize,
    },
    Folders {
        path: PathBuf,
        project: String,
        month: Option<Month>,
        options: FolderOptions,
    },
    Extract {
        path: PathBuf,
        discipline: String,
        month: Month,
    },
    New {
        template: PathBuf,
        output: PathBuf,
        fields: Vec<(String, String)>,
        introduction: String,
        progress: String,
    },
    Report {
        document: PathBuf,
        evidence_root: PathBuf,
        month: Month,
        texts_path: Option<PathBuf>,
        disciplines: Vec<String>,
    },
}
