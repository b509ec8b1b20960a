//! Names stamped into generated IFC files, and CLI defaults.

/// Default location of the session snapshot, relative to the working directory.
pub const DEFAULT_STATE_FILE: &str = ".elca-session.json";

/// Base URL of Ökobaudat dataset pages; the process uuid is appended.
pub const OEKOBAUDAT_DATASET_URL: &str = "https://oekobaudat.de/OEKOBAU.DAT/datasetdetail/";

/// Identity of the generated material library and of the writing application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySettings {
    pub library_name: String,
    pub library_version: String,
    /// Organization publishing the library; also the application developer.
    pub publisher: String,
    pub application_identifier: String,
    pub project_name: String,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            library_name: "eLCA_Material_Library".to_string(),
            library_version: "1.0".to_string(),
            publisher: "eLCA Material Library Creator".to_string(),
            application_identifier: "eLCA_Creator".to_string(),
            project_name: "eLCA Material Library".to_string(),
        }
    }
}

impl LibrarySettings {
    #[must_use]
    pub fn with_library_name(mut self, name: Option<String>) -> Self {
        if let Some(name) = name {
            self.library_name = name;
        }
        self
    }

    #[must_use]
    pub fn with_publisher(mut self, publisher: Option<String>) -> Self {
        if let Some(publisher) = publisher {
            self.publisher = publisher;
        }
        self
    }
}
