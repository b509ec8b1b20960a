use crate::config::LibrarySettings;
use crate::parser::step::{StepEntity, StepValue};
use uuid::Uuid;

const GUID_ALPHABET: &[u8; 64] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_$";

/// New IFC GlobalId: a random UUID in the 22-character compressed form.
#[must_use]
pub fn ifc_guid() -> String {
    compress_guid(Uuid::new_v4().as_u128())
}

/// IFC base64 compression of a 128-bit id (2 bits, then 21 × 6 bits).
#[must_use]
pub fn compress_guid(value: u128) -> String {
    let mut out = String::with_capacity(22);
    out.push(GUID_ALPHABET[((value >> 126) & 0x3) as usize] as char);
    for i in (0..21).rev() {
        out.push(GUID_ALPHABET[((value >> (6 * i)) & 0x3F) as usize] as char);
    }
    out
}

pub fn text(s: impl Into<String>) -> StepValue {
    StepValue::String(s.into())
}

pub fn enumeration(s: &str) -> StepValue {
    StepValue::Enum(s.to_string())
}

pub fn refs(ids: &[u64]) -> StepValue {
    StepValue::List(ids.iter().map(|id| StepValue::Reference(*id)).collect())
}

/// Accumulates entity instances with sequential ids.
#[derive(Debug)]
pub struct StepWriter {
    next_id: u64,
    entities: Vec<StepEntity>,
}

impl Default for StepWriter {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl StepWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer whose first entity gets `next_id`, for appending to a file.
    #[must_use]
    pub fn starting_at(next_id: u64) -> Self {
        Self {
            next_id: next_id.max(1),
            entities: Vec::new(),
        }
    }

    pub fn add(&mut self, entity_type: &str, values: Vec<StepValue>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entities.push(StepEntity {
            id,
            entity_type: entity_type.to_string(),
            values,
        });
        id
    }

    #[must_use]
    pub fn entities(&self) -> &[StepEntity] {
        &self.entities
    }

    #[must_use]
    pub fn count_of(&self, entity_type: &str) -> usize {
        self.entities
            .iter()
            .filter(|e| e.entity_type == entity_type)
            .count()
    }

    /// DATA section body: one entity per line.
    #[must_use]
    pub fn data_lines(&self) -> String {
        let mut out = String::new();
        for entity in &self.entities {
            out.push_str(&entity.to_string());
            out.push('\n');
        }
        out
    }

    /// Complete IFC4 exchange file.
    #[must_use]
    pub fn to_file_string(&self, file_name: &str, timestamp: &str, settings: &LibrarySettings) -> String {
        format!(
            "ISO-10303-21;\nHEADER;\n\
             FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');\n\
             FILE_NAME({},{},({}),({}),{},{},'');\n\
             FILE_SCHEMA(('IFC4'));\nENDSEC;\nDATA;\n{}ENDSEC;\nEND-ISO-10303-21;\n",
            text(file_name),
            text(timestamp),
            text("User"),
            text(settings.publisher.as_str()),
            text(format!("elca-bridge {}", env!("CARGO_PKG_VERSION"))),
            text(settings.application_identifier.as_str()),
            self.data_lines(),
        )
    }
}

/// Ids of the owner-history block shared by every rooted entity.
#[derive(Debug, Clone, Copy)]
pub struct OwnerHistory {
    pub organization: u64,
    pub owner_history: u64,
}

/// Writes person, organization, application and owner history.
pub fn write_owner_history(
    writer: &mut StepWriter,
    settings: &LibrarySettings,
    creation_date: i64,
) -> OwnerHistory {
    let person = writer.add(
        "IFCPERSON",
        vec![
            StepValue::Null,
            text("User"),
            text("Default"),
            StepValue::Null,
            StepValue::Null,
            StepValue::Null,
            StepValue::Null,
            StepValue::Null,
        ],
    );
    let organization = writer.add(
        "IFCORGANIZATION",
        vec![
            StepValue::Null,
            text(settings.publisher.as_str()),
            StepValue::Null,
            StepValue::Null,
            StepValue::Null,
        ],
    );
    let person_and_org = writer.add(
        "IFCPERSONANDORGANIZATION",
        vec![
            StepValue::Reference(person),
            StepValue::Reference(organization),
            StepValue::Null,
        ],
    );
    let application = writer.add(
        "IFCAPPLICATION",
        vec![
            StepValue::Reference(organization),
            text(settings.library_version.as_str()),
            text(settings.publisher.as_str()),
            text(settings.application_identifier.as_str()),
        ],
    );
    let owner_history = writer.add(
        "IFCOWNERHISTORY",
        vec![
            StepValue::Reference(person_and_org),
            StepValue::Reference(application),
            StepValue::Null,
            enumeration("ADDED"),
            StepValue::Null,
            StepValue::Null,
            StepValue::Null,
            StepValue::Integer(creation_date),
        ],
    );

    OwnerHistory {
        organization,
        owner_history,
    }
}
