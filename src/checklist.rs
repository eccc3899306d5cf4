//! Company-formation checklist cell mapping.
//!
//! The checklist workbook has one column per director: column C for the
//! first director, column D for the second. Normalised PAN and Aadhaar fields
//! and the operator-entered director profile land in fixed rows of that
//! column; company and professional details go to column C below the
//! director block. This module only computes *what goes where*; the plan is
//! serialised as JSON so any spreadsheet tool can apply it.
//!
//! | Row | Field |
//! |-----|-------|
//! | 4   | name (PAN) |
//! | 5   | father's name (PAN) |
//! | 6   | date of birth (PAN) |
//! | 7   | place of birth |
//! | 8   | nationality, default `Indian` |
//! | 9   | resident of India, default `Yes` |
//! | 10  | occupation |
//! | 11  | education |
//! | 12  | shares subscribed |
//! | 13  | duration at address |
//! | 14  | email |
//! | 15  | mobile |
//! | 16  | PAN number |
//! | 17  | `AADHAR - <number>` |
//! | 18  | address (Aadhaar) |
//! | 19  | DIN |
//! | 20  | `Uploaded` when a photo document is attached |
//! | 21  | `Uploaded` when a signature document is attached |
//! | 24–33 | company details (column C) |
//! | 35–37 | professional details (column C) |

use crate::error::ExtractError;
use crate::output::{AadhaarRecord, PanRecord};
use crate::pipeline::normalize::value_text;
use crate::pipeline::recover::RawFieldMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

const ROW_NAME: u32 = 4;
const ROW_FATHERS_NAME: u32 = 5;
const ROW_DOB: u32 = 6;
const ROW_PLACE_OF_BIRTH: u32 = 7;
const ROW_NATIONALITY: u32 = 8;
const ROW_RESIDENT: u32 = 9;
const ROW_OCCUPATION: u32 = 10;
const ROW_EDUCATION: u32 = 11;
const ROW_SHARES: u32 = 12;
const ROW_DURATION_AT_ADDRESS: u32 = 13;
const ROW_EMAIL: u32 = 14;
const ROW_MOBILE: u32 = 15;
const ROW_PAN: u32 = 16;
const ROW_AADHAAR: u32 = 17;
const ROW_ADDRESS: u32 = 18;
const ROW_DIN: u32 = 19;
const ROW_PHOTO: u32 = 20;
const ROW_SIGNATURE: u32 = 21;

const ROW_ELECTRICITY_BILL: u32 = 24;
const ROW_LATITUDE: u32 = 25;
const ROW_LONGITUDE: u32 = 26;
const ROW_NOC: u32 = 27;
const ROW_OFFICE_EMAIL: u32 = 28;
const ROW_OFFICE_MOBILE: u32 = 29;
const ROW_AUTHORIZED_CAPITAL: u32 = 30;
const ROW_PAID_UP_CAPITAL: u32 = 31;
const ROW_OBJECTIVES: u32 = 32;
const ROW_OTHER_OBJECTIVES: u32 = 33;

const ROW_PROFESSIONAL_NAME: u32 = 35;
const ROW_MEMBERSHIP_NO: u32 = 36;
const ROW_PROFESSIONAL_ADDRESS: u32 = 37;

const DEFAULT_NATIONALITY: &str = "Indian";
const DEFAULT_RESIDENT: &str = "Yes";
const UPLOADED: &str = "Uploaded";

/// Company rows always live in the first director's column.
const COMPANY_COLUMN: (u32, char) = (3, 'C');

static RE_UNSAFE_FILE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid regex"));

/// Which director column of the checklist to fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DirectorSlot {
    First,
    Second,
}

impl DirectorSlot {
    /// 1-based spreadsheet column index.
    pub fn column(self) -> u32 {
        match self {
            DirectorSlot::First => 3,
            DirectorSlot::Second => 4,
        }
    }

    pub fn column_letter(self) -> char {
        match self {
            DirectorSlot::First => 'C',
            DirectorSlot::Second => 'D',
        }
    }
}

impl TryFrom<u8> for DirectorSlot {
    type Error = ExtractError;

    fn try_from(slot: u8) -> Result<Self, Self::Error> {
        match slot {
            1 => Ok(DirectorSlot::First),
            2 => Ok(DirectorSlot::Second),
            _ => Err(ExtractError::InvalidDirectorSlot { slot }),
        }
    }
}

/// One value to write into one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellWrite {
    /// A1-style reference, e.g. `C16`.
    pub cell: String,
    pub row: u32,
    pub column: u32,
    pub value: String,
}

/// The PAN and Aadhaar cards carry different names for the same director.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameMismatch {
    pub pan_name: String,
    pub aadhaar_name: String,
}

// ── Case data ────────────────────────────────────────────────────────────────
//
// Field names follow the camelCase JSON the checklist front end sends. Scalar
// fields accept strings, numbers, booleans or null.

/// A supporting document attached to a director.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadedDocument {
    /// `photo`, `signature`, …
    #[serde(rename = "type", deserialize_with = "lenient_string")]
    pub doc_type: String,
    #[serde(deserialize_with = "lenient_string")]
    pub file_name: String,
}

/// Director details entered by the operator rather than read from a card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DirectorProfile {
    #[serde(deserialize_with = "lenient_string")]
    pub place_of_birth: String,
    /// Empty means `Indian`.
    #[serde(deserialize_with = "lenient_string")]
    pub nationality: String,
    /// Empty means `Yes`.
    #[serde(deserialize_with = "lenient_string")]
    pub resident_of_india: String,
    #[serde(deserialize_with = "lenient_string")]
    pub occupation: String,
    #[serde(deserialize_with = "lenient_string")]
    pub education: String,
    #[serde(deserialize_with = "lenient_string")]
    pub shares_subscribed: String,
    #[serde(deserialize_with = "lenient_string")]
    pub duration_at_address: String,
    #[serde(deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(deserialize_with = "lenient_string")]
    pub mobile: String,
    #[serde(deserialize_with = "lenient_string")]
    pub din_number: String,
    pub documents: Vec<UploadedDocument>,
}

impl DirectorProfile {
    /// `Uploaded` when a document of `doc_type` with a file name is attached.
    fn uploaded(&self, doc_type: &str) -> &'static str {
        let found = self
            .documents
            .iter()
            .any(|d| d.doc_type == doc_type && !d.file_name.is_empty());
        if found {
            UPLOADED
        } else {
            ""
        }
    }
}

/// One director of a case: profile plus the card data already extracted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DirectorCase {
    #[serde(flatten)]
    pub profile: DirectorProfile,
    #[serde(deserialize_with = "pan_fields")]
    pub pan_data: Option<PanRecord>,
    #[serde(deserialize_with = "aadhaar_fields")]
    pub aadhaar_data: Option<AadhaarRecord>,
}

/// Registered-office and capital details of the company being formed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyDetails {
    #[serde(deserialize_with = "lenient_flag")]
    pub electricity_bill_uploaded: bool,
    #[serde(deserialize_with = "lenient_string")]
    pub latitude: String,
    #[serde(deserialize_with = "lenient_string")]
    pub longitude: String,
    #[serde(deserialize_with = "lenient_flag")]
    pub noc_uploaded: bool,
    #[serde(deserialize_with = "lenient_string")]
    pub office_email: String,
    #[serde(deserialize_with = "lenient_string")]
    pub office_mobile: String,
    #[serde(deserialize_with = "lenient_string")]
    pub authorized_share_capital: String,
    #[serde(deserialize_with = "lenient_string")]
    pub paid_up_share_capital: String,
    #[serde(deserialize_with = "lenient_string")]
    pub objectives: String,
    #[serde(deserialize_with = "lenient_string")]
    pub other_objectives: String,
}

/// The professional certifying the incorporation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfessionalDetails {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub membership_no: String,
    #[serde(deserialize_with = "lenient_string")]
    pub address: String,
}

/// Everything the checklist needs for one case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaseData {
    /// Only the first two directors have a column.
    pub directors: Vec<DirectorCase>,
    pub company_info: CompanyDetails,
    pub professional_info: ProfessionalDetails,
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(value_text(Some(&value)))
}

/// JSON truthiness: `false`, `null`, `0`, `""`, `[]` and `{}` are false.
fn lenient_flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    })
}

fn card_map<'de, D: Deserializer<'de>>(d: D) -> Result<Option<RawFieldMap>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Object(map) => Some(map),
        _ => None,
    })
}

fn pan_fields<'de, D: Deserializer<'de>>(d: D) -> Result<Option<PanRecord>, D::Error> {
    Ok(card_map(d)?.map(|m| PanRecord {
        name: value_text(m.get("name")),
        fathers_name: value_text(m.get("fathers_name")),
        date_of_birth: value_text(m.get("date_of_birth")),
        pan_number: value_text(m.get("pan_number")),
    }))
}

fn aadhaar_fields<'de, D: Deserializer<'de>>(d: D) -> Result<Option<AadhaarRecord>, D::Error> {
    Ok(card_map(d)?.map(|m| AadhaarRecord {
        name: value_text(m.get("name")),
        aadhaar_number: value_text(m.get("aadhaar_number")),
        date_of_birth: value_text(m.get("date_of_birth")),
        gender: value_text(m.get("gender")),
        address: value_text(m.get("address")),
    }))
}

// ── Planning ─────────────────────────────────────────────────────────────────

/// Trim every value and drop the empty ones, so a partially read card never
/// blanks out a cell that already holds data.
fn to_cells((column, letter): (u32, char), rows: Vec<(u32, String)>) -> Vec<CellWrite> {
    rows.into_iter()
        .filter_map(|(row, value)| {
            let value = value.trim();
            (!value.is_empty()).then(|| CellWrite {
                cell: format!("{letter}{row}"),
                row,
                column,
                value: value.to_string(),
            })
        })
        .collect()
}

fn or_default(value: &str, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// Compute the cell writes for one director.
///
/// The PAN record owns rows 4–6; the Aadhaar name and birth date are never
/// written. Nationality and residency fall back to `Indian` / `Yes`, so every
/// plan carries rows 8 and 9.
pub fn plan_director_cells(
    pan: Option<&PanRecord>,
    aadhaar: Option<&AadhaarRecord>,
    profile: &DirectorProfile,
    slot: DirectorSlot,
) -> Vec<CellWrite> {
    let empty_pan = PanRecord::default();
    let pan = pan.unwrap_or(&empty_pan);
    let aadhaar_number = aadhaar.map(|a| a.aadhaar_number.trim()).unwrap_or_default();
    let aadhaar_cell = if aadhaar_number.is_empty() {
        String::new()
    } else {
        format!("AADHAR - {aadhaar_number}")
    };

    let rows = vec![
        (ROW_NAME, pan.name.clone()),
        (ROW_FATHERS_NAME, pan.fathers_name.clone()),
        (ROW_DOB, pan.date_of_birth.clone()),
        (ROW_PLACE_OF_BIRTH, profile.place_of_birth.clone()),
        (ROW_NATIONALITY, or_default(&profile.nationality, DEFAULT_NATIONALITY)),
        (ROW_RESIDENT, or_default(&profile.resident_of_india, DEFAULT_RESIDENT)),
        (ROW_OCCUPATION, profile.occupation.clone()),
        (ROW_EDUCATION, profile.education.clone()),
        (ROW_SHARES, profile.shares_subscribed.clone()),
        (ROW_DURATION_AT_ADDRESS, profile.duration_at_address.clone()),
        (ROW_EMAIL, profile.email.clone()),
        (ROW_MOBILE, profile.mobile.clone()),
        (ROW_PAN, pan.pan_number.clone()),
        (ROW_AADHAAR, aadhaar_cell),
        (ROW_ADDRESS, aadhaar.map(|a| a.address.clone()).unwrap_or_default()),
        (ROW_DIN, profile.din_number.clone()),
        (ROW_PHOTO, profile.uploaded("photo").to_string()),
        (ROW_SIGNATURE, profile.uploaded("signature").to_string()),
    ];

    to_cells((slot.column(), slot.column_letter()), rows)
}

/// Compute the company rows (24–33, column C).
pub fn plan_company_cells(company: &CompanyDetails) -> Vec<CellWrite> {
    let flag = |set: bool| if set { UPLOADED.to_string() } else { String::new() };
    let rows = vec![
        (ROW_ELECTRICITY_BILL, flag(company.electricity_bill_uploaded)),
        (ROW_LATITUDE, company.latitude.clone()),
        (ROW_LONGITUDE, company.longitude.clone()),
        (ROW_NOC, flag(company.noc_uploaded)),
        (ROW_OFFICE_EMAIL, company.office_email.clone()),
        (ROW_OFFICE_MOBILE, company.office_mobile.clone()),
        (ROW_AUTHORIZED_CAPITAL, company.authorized_share_capital.clone()),
        (ROW_PAID_UP_CAPITAL, company.paid_up_share_capital.clone()),
        (ROW_OBJECTIVES, company.objectives.clone()),
        (ROW_OTHER_OBJECTIVES, company.other_objectives.clone()),
    ];
    to_cells(COMPANY_COLUMN, rows)
}

/// Compute the professional rows (35–37, column C).
pub fn plan_professional_cells(professional: &ProfessionalDetails) -> Vec<CellWrite> {
    let rows = vec![
        (ROW_PROFESSIONAL_NAME, professional.name.clone()),
        (ROW_MEMBERSHIP_NO, professional.membership_no.clone()),
        (ROW_PROFESSIONAL_ADDRESS, professional.address.clone()),
    ];
    to_cells(COMPANY_COLUMN, rows)
}

/// Compute the full plan for a case.
///
/// With at least one director, both director columns are planned; a missing
/// second director still receives the nationality and residency defaults.
/// Company and professional rows follow.
pub fn plan_case(case: &CaseData) -> Vec<CellWrite> {
    let mut plan = Vec::new();

    if !case.directors.is_empty() {
        let absent = DirectorCase::default();
        for (index, slot) in [DirectorSlot::First, DirectorSlot::Second].into_iter().enumerate() {
            let director = case.directors.get(index).unwrap_or(&absent);
            plan.extend(plan_director_cells(
                director.pan_data.as_ref(),
                director.aadhaar_data.as_ref(),
                &director.profile,
                slot,
            ));
        }
        if case.directors.len() > 2 {
            warn!(
                "Checklist has two director columns; ignoring {} extra director(s)",
                case.directors.len() - 2
            );
        }
    }

    plan.extend(plan_company_cells(&case.company_info));
    plan.extend(plan_professional_cells(&case.professional_info));
    plan
}

/// File name for a case's filled checklist plan.
///
/// Runs of characters outside `A-Z a-z 0-9 . _ -` become `_`, leading and
/// trailing `_` are dropped, and an empty result falls back to `case`.
pub fn safe_file_name(case_name: &str) -> String {
    let normalized = RE_UNSAFE_FILE_CHARS.replace_all(case_name, "_");
    let normalized = normalized.trim_matches('_');
    let stem = if normalized.is_empty() { "case" } else { normalized };
    format!("{stem}_Checklist_filled.json")
}

/// Compare the names on both cards, case-insensitively.
///
/// Returns `None` when either name is missing or they agree.
pub fn name_mismatch(pan: &PanRecord, aadhaar: &AadhaarRecord) -> Option<NameMismatch> {
    let pan_name = pan.name.trim();
    let aadhaar_name = aadhaar.name.trim();
    if pan_name.is_empty() || aadhaar_name.is_empty() {
        return None;
    }
    if pan_name.to_uppercase() == aadhaar_name.to_uppercase() {
        return None;
    }

    warn!(
        "Name mismatch between PAN ({}) and Aadhaar ({})",
        pan_name, aadhaar_name
    );
    Some(NameMismatch {
        pan_name: pan_name.to_string(),
        aadhaar_name: aadhaar_name.to_string(),
    })
}

/// Write a cell plan as pretty JSON, atomically (temp file + rename).
pub async fn write_cell_plan(path: &Path, plan: &[CellWrite]) -> Result<(), ExtractError> {
    let json = serde_json::to_string_pretty(plan)
        .map_err(|e| ExtractError::Internal(format!("cell plan serialisation failed: {e}")))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ExtractError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json.as_bytes())
        .await
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    debug!("Wrote {} cell writes to {}", plan.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pan() -> PanRecord {
        PanRecord {
            name: "RAVI KUMAR".into(),
            fathers_name: "SURESH KUMAR".into(),
            date_of_birth: "01/02/1985".into(),
            pan_number: "BQJPK6347Q".into(),
        }
    }

    fn aadhaar() -> AadhaarRecord {
        AadhaarRecord {
            name: "Ravi Kumar".into(),
            aadhaar_number: "1234 5678 9012".into(),
            date_of_birth: "01/02/1985".into(),
            gender: "MALE".into(),
            address: "12 Gandhi Road, Madurai 625001".into(),
        }
    }

    fn cells(plan: &[CellWrite]) -> Vec<(&str, &str)> {
        plan.iter()
            .map(|w| (w.cell.as_str(), w.value.as_str()))
            .collect()
    }

    #[test]
    fn slot_from_u8() {
        assert_eq!(DirectorSlot::try_from(1).unwrap(), DirectorSlot::First);
        assert_eq!(DirectorSlot::try_from(2).unwrap().column_letter(), 'D');
        let err = DirectorSlot::try_from(3).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidDirectorSlot { slot: 3 }));
    }

    #[test]
    fn card_plan_for_first_director() {
        let plan = plan_director_cells(
            Some(&pan()),
            Some(&aadhaar()),
            &DirectorProfile::default(),
            DirectorSlot::First,
        );
        assert_eq!(
            cells(&plan),
            vec![
                ("C4", "RAVI KUMAR"),
                ("C5", "SURESH KUMAR"),
                ("C6", "01/02/1985"),
                ("C8", "Indian"),
                ("C9", "Yes"),
                ("C16", "BQJPK6347Q"),
                ("C17", "AADHAR - 1234 5678 9012"),
                ("C18", "12 Gandhi Road, Madurai 625001"),
            ]
        );
        assert!(plan.iter().all(|w| w.column == 3));
    }

    #[test]
    fn profile_rows_and_uploaded_flags() {
        let profile = DirectorProfile {
            place_of_birth: "Madurai".into(),
            nationality: "British".into(),
            resident_of_india: "No".into(),
            occupation: "Engineer".into(),
            education: "B.Tech".into(),
            shares_subscribed: "5000".into(),
            duration_at_address: "4 years".into(),
            email: "ravi@example.com".into(),
            mobile: "9876543210".into(),
            din_number: "01234567".into(),
            documents: vec![
                UploadedDocument {
                    doc_type: "photo".into(),
                    file_name: "ravi.jpg".into(),
                },
                UploadedDocument {
                    doc_type: "signature".into(),
                    file_name: String::new(),
                },
            ],
        };

        let plan = plan_director_cells(None, None, &profile, DirectorSlot::Second);
        assert_eq!(
            cells(&plan),
            vec![
                ("D7", "Madurai"),
                ("D8", "British"),
                ("D9", "No"),
                ("D10", "Engineer"),
                ("D11", "B.Tech"),
                ("D12", "5000"),
                ("D13", "4 years"),
                ("D14", "ravi@example.com"),
                ("D15", "9876543210"),
                ("D19", "01234567"),
                ("D20", "Uploaded"),
            ]
        );
    }

    #[test]
    fn empty_fields_are_skipped() {
        let mut partial = pan();
        partial.fathers_name = "   ".into();
        let mut no_number = aadhaar();
        no_number.aadhaar_number.clear();

        let plan = plan_director_cells(
            Some(&partial),
            Some(&no_number),
            &DirectorProfile::default(),
            DirectorSlot::Second,
        );
        let rows: Vec<u32> = plan.iter().map(|w| w.row).collect();
        assert_eq!(rows, vec![4, 6, 8, 9, 16, 18]);
        assert_eq!(plan[0].cell, "D4");
    }

    #[test]
    fn blank_nationality_gets_default() {
        let profile = DirectorProfile {
            nationality: "  ".into(),
            ..Default::default()
        };
        let plan = plan_director_cells(None, None, &profile, DirectorSlot::First);
        assert_eq!(cells(&plan), vec![("C8", "Indian"), ("C9", "Yes")]);
    }

    #[test]
    fn aadhaar_only_plan() {
        let plan = plan_director_cells(
            None,
            Some(&aadhaar()),
            &DirectorProfile::default(),
            DirectorSlot::First,
        );
        let rows: Vec<u32> = plan.iter().map(|w| w.row).collect();
        assert_eq!(rows, vec![8, 9, 17, 18]);
    }

    #[test]
    fn company_and_professional_rows() {
        let company = CompanyDetails {
            electricity_bill_uploaded: true,
            latitude: "9.9252".into(),
            longitude: "78.1198".into(),
            noc_uploaded: false,
            office_email: "office@example.com".into(),
            office_mobile: "04522345678".into(),
            authorized_share_capital: "1000000".into(),
            paid_up_share_capital: "100000".into(),
            objectives: "Software services".into(),
            other_objectives: String::new(),
        };
        let plan = plan_company_cells(&company);
        let rows: Vec<u32> = plan.iter().map(|w| w.row).collect();
        assert_eq!(rows, vec![24, 25, 26, 28, 29, 30, 31, 32]);
        assert_eq!(plan[0].value, "Uploaded");
        assert!(plan.iter().all(|w| w.cell.starts_with('C')));

        let professional = ProfessionalDetails {
            name: "A. Sharma".into(),
            membership_no: "FCS 1234".into(),
            address: "Chennai".into(),
        };
        assert_eq!(
            cells(&plan_professional_cells(&professional)),
            vec![("C35", "A. Sharma"), ("C36", "FCS 1234"), ("C37", "Chennai")]
        );
    }

    #[test]
    fn case_json_with_one_director() {
        let case: CaseData = serde_json::from_value(json!({
            "directors": [{
                "panData": {"name": "RAVI KUMAR", "pan_number": "BQJPK6347Q"},
                "aadhaarData": {"aadhaar_number": "1234 5678 9012", "address": null},
                "sharesSubscribed": 5000,
                "documents": [{"type": "signature", "fileName": "sig.png"}]
            }],
            "companyInfo": {"nocUploaded": 1, "paidUpShareCapital": 100000},
            "professionalInfo": {"membershipNo": "FCS 1234"}
        }))
        .unwrap();

        let plan = plan_case(&case);
        assert_eq!(
            cells(&plan),
            vec![
                ("C4", "RAVI KUMAR"),
                ("C8", "Indian"),
                ("C9", "Yes"),
                ("C12", "5000"),
                ("C16", "BQJPK6347Q"),
                ("C17", "AADHAR - 1234 5678 9012"),
                ("C21", "Uploaded"),
                // The absent second director still gets the defaults.
                ("D8", "Indian"),
                ("D9", "Yes"),
                ("C27", "Uploaded"),
                ("C31", "100000"),
                ("C36", "FCS 1234"),
            ]
        );
    }

    #[test]
    fn case_without_directors_skips_director_columns() {
        let case: CaseData = serde_json::from_value(json!({
            "companyInfo": {"electricityBillUploaded": false, "latitude": 9.9}
        }))
        .unwrap();
        assert_eq!(cells(&plan_case(&case)), vec![("C25", "9.9")]);
        assert!(plan_case(&CaseData::default()).is_empty());
    }

    #[test]
    fn safe_file_names() {
        assert_eq!(safe_file_name("Acme Pvt Ltd"), "Acme_Pvt_Ltd_Checklist_filled.json");
        assert_eq!(safe_file_name("  ../etc/passwd "), ".._etc_passwd_Checklist_filled.json");
        assert_eq!(safe_file_name("ಕಂಪನಿ"), "case_Checklist_filled.json");
        assert_eq!(safe_file_name("Case-7.b"), "Case-7.b_Checklist_filled.json");
    }

    #[test]
    fn names_compared_case_insensitively() {
        assert_eq!(name_mismatch(&pan(), &aadhaar()), None);

        let mut other = aadhaar();
        other.name = "R KUMAR".into();
        let mismatch = name_mismatch(&pan(), &other).unwrap();
        assert_eq!(mismatch.pan_name, "RAVI KUMAR");
        assert_eq!(mismatch.aadhaar_name, "R KUMAR");
    }

    #[test]
    fn missing_name_is_not_a_mismatch() {
        let mut blank = aadhaar();
        blank.name.clear();
        assert_eq!(name_mismatch(&pan(), &blank), None);
    }

    #[tokio::test]
    async fn write_plan_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("director1.json");
        let plan = plan_director_cells(
            Some(&pan()),
            None,
            &DirectorProfile::default(),
            DirectorSlot::First,
        );

        write_cell_plan(&path, &plan).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[5]["cell"], "C16");
        assert!(!path.with_extension("json.tmp").exists());
    }
}
