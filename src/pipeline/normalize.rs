//! Text normalisation: per-column cleanup of spreadsheet strings.
//!
//! Spreadsheet authors use `*` as an ad-hoc bullet marker, `.` as a list
//! separator in long descriptions and paste in stray zero-width
//! non-joiners (U+200C). Each column role gets its own rule set that turns
//! those conventions into HTML the template can print directly.
//!
//! Every normaliser is a pure `&str → String` function. Deciding whether a
//! cell is text at all happens in [`ColumnMap::normalize_record`], not here.

use crate::config::ColumnRoles;
use crate::error::Sheet2PdfError;
use crate::record::{CellValue, Record};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Signature shared by every normaliser.
pub type Normalizer = fn(&str) -> String;

const ZWNJ: char = '\u{200C}';

/// Private-use code point protecting the final period in long text.
const PERIOD_SENTINEL: char = '\u{E000}';

/// How a column is cleaned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldRole {
    /// Names the document; `*` markers become an HTML dash list.
    Identity,
    /// `/`-separated values; slashes become spaces.
    SlashDelimited,
    /// Period-separated descriptions; sentences become an HTML dash list.
    LongText,
    /// Everything else.
    Default,
}

impl FieldRole {
    pub fn normalizer(self) -> Normalizer {
        match self {
            FieldRole::Identity => clean_identity,
            FieldRole::SlashDelimited => clean_slash_delimited,
            FieldRole::LongText => clean_long_text,
            FieldRole::Default => clean_default,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldRole::Identity => "identity",
            FieldRole::SlashDelimited => "slash-delimited",
            FieldRole::LongText => "long-text",
            FieldRole::Default => "default",
        }
    }
}

// ── Rules ────────────────────────────────────────────────────────────────

/// Default cleaning: first `*` dropped, later ones become `", "`, slashes
/// become spaces.
pub fn clean_default(text: &str) -> String {
    text.replace(ZWNJ, " ")
        .replace('\n', " ")
        .replacen('*', "", 1)
        .replace('*', ", ")
        .replace('/', " ")
}

/// Identity cleaning: `"X*Y*Z"` → `"X- Y<br> - Z"`.
pub fn clean_identity(text: &str) -> String {
    text.replace(ZWNJ, " ")
        .replace('\n', " ")
        .replacen('*', "- ", 1)
        .replace('*', "<br> - ")
}

/// Long-text cleaning: `"A.B.C."` → `"A<br> - B<br> - C."`.
///
/// The last period is swapped for a sentinel first so it survives the
/// period → line-break pass; hyphens and commas are stripped.
pub fn clean_long_text(text: &str) -> String {
    let protected = match text.rfind('.') {
        Some(pos) => {
            let mut s = String::with_capacity(text.len() + 2);
            s.push_str(&text[..pos]);
            s.push(PERIOD_SENTINEL);
            s.push_str(&text[pos + 1..]);
            s
        }
        None => text.to_string(),
    };

    protected
        .replace(ZWNJ, " ")
        .replacen('*', "", 1)
        .replace('-', "")
        .replace('.', "<br> - ")
        .replace(',', "")
        .replace(PERIOD_SENTINEL, ".")
}

/// Slash-delimited cleaning: slashes become spaces, nothing else changes.
pub fn clean_slash_delimited(text: &str) -> String {
    text.replace('/', " ")
}

// ── Column dispatch ──────────────────────────────────────────────────────

/// Explicit column → role table for one dataset.
///
/// Built once from the header row so a misnamed identity column fails the
/// batch up front instead of silently falling back to default cleaning.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    roles: IndexMap<String, FieldRole>,
    identity: String,
    long_text: String,
}

impl ColumnMap {
    /// Assign a role to every column.
    ///
    /// # Errors
    /// [`Sheet2PdfError::MissingColumn`] when the identity column is absent;
    /// a missing slash-delimited or long-text column only logs a warning.
    pub fn resolve(columns: &[String], roles: &ColumnRoles) -> Result<Self, Sheet2PdfError> {
        if !columns.iter().any(|c| c == &roles.identity) {
            return Err(Sheet2PdfError::MissingColumn {
                column: roles.identity.clone(),
                role: FieldRole::Identity.as_str(),
                available: columns.to_vec(),
            });
        }
        for (name, role) in [
            (&roles.slash_delimited, FieldRole::SlashDelimited),
            (&roles.long_text, FieldRole::LongText),
        ] {
            if !columns.iter().any(|c| c == name) {
                warn!("No {} column '{}' in input; skipping that rule", role.as_str(), name);
            }
        }

        let map: IndexMap<String, FieldRole> = columns
            .iter()
            .map(|c| (c.clone(), roles.role_for(c)))
            .collect();
        debug!("Resolved roles for {} columns", map.len());

        Ok(Self {
            roles: map,
            identity: roles.identity.clone(),
            long_text: roles.long_text.clone(),
        })
    }

    /// Role of `column`; unknown columns get [`FieldRole::Default`].
    pub fn role_of(&self, column: &str) -> FieldRole {
        self.roles.get(column).copied().unwrap_or(FieldRole::Default)
    }

    pub fn identity_column(&self) -> &str {
        &self.identity
    }

    pub fn long_text_column(&self) -> &str {
        &self.long_text
    }

    /// Clean every text field of `record`; other values are copied as-is.
    pub fn normalize_record(&self, record: &Record) -> Record {
        let fields = record
            .fields
            .iter()
            .map(|(column, value)| {
                let cleaned = match value {
                    CellValue::Text(s) => CellValue::Text(self.role_of(column).normalizer()(s)),
                    other => other.clone(),
                };
                (column.clone(), cleaned)
            })
            .collect();
        Record {
            index: record.index,
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ROLES: [FieldRole; 4] = [
        FieldRole::Identity,
        FieldRole::SlashDelimited,
        FieldRole::LongText,
        FieldRole::Default,
    ];

    // ── Rules ────────────────────────────────────────────────────────────

    #[test]
    fn plain_text_is_untouched_by_every_rule() {
        let s = "Plain words and numbers 42";
        for role in ALL_ROLES {
            assert_eq!(role.normalizer()(s), s, "role {role:?}");
        }
    }

    #[test]
    fn slashes_become_spaces_where_documented() {
        let s = "red/green/blue";
        assert_eq!(clean_default(s), "red green blue");
        assert_eq!(clean_slash_delimited(s), "red green blue");
        assert_eq!(clean_identity(s), s);
        assert_eq!(clean_long_text(s), s);
    }

    #[test]
    fn empty_string_round_trips() {
        for role in ALL_ROLES {
            assert_eq!(role.normalizer()(""), "", "role {role:?}");
        }
    }

    #[test]
    fn default_drops_first_star_and_lists_the_rest() {
        assert_eq!(clean_default("*a*b*c"), "a, b, c");
        assert_eq!(clean_default("x\u{200C}y\nz"), "x y z");
    }

    #[test]
    fn identity_turns_stars_into_dash_list() {
        assert_eq!(clean_identity("X*Y*Z"), "X- Y<br> - Z");
        assert_eq!(clean_identity("*Head*Office"), "- Head<br> - Office");
        assert_eq!(clean_identity("line\nbreak"), "line break");
    }

    #[test]
    fn long_text_keeps_only_the_final_period() {
        assert_eq!(clean_long_text("A.B.C."), "A<br> - B<br> - C.");
    }

    #[test]
    fn long_text_without_trailing_period_protects_the_last_one() {
        assert_eq!(clean_long_text("A.B.C"), "A<br> - B.C");
    }

    #[test]
    fn long_text_strips_hyphens_commas_and_first_star() {
        assert_eq!(
            clean_long_text("*Wall-mounted, steel.Blue."),
            "Wallmounted steel<br> - Blue."
        );
    }

    #[test]
    fn long_text_ellipsis_only_keeps_last_dot() {
        assert_eq!(clean_long_text("Wait..."), "Wait<br> - <br> - .");
    }

    #[test]
    fn long_text_does_not_touch_newlines() {
        assert_eq!(clean_long_text("a\nb"), "a\nb");
    }

    // ── Column dispatch ──────────────────────────────────────────────────

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolve_fails_fast_without_identity_column() {
        let err = ColumnMap::resolve(&columns(&["Column2", "Column3"]), &ColumnRoles::default())
            .unwrap_err();
        assert!(matches!(err, Sheet2PdfError::MissingColumn { role: "identity", .. }));
    }

    #[test]
    fn resolve_tolerates_missing_optional_columns() {
        let map = ColumnMap::resolve(&columns(&["Column1", "Notes"]), &ColumnRoles::default())
            .expect("identity present");
        assert_eq!(map.role_of("Column1"), FieldRole::Identity);
        assert_eq!(map.role_of("Notes"), FieldRole::Default);
        assert_eq!(map.role_of("Column3"), FieldRole::Default);
    }

    #[test]
    fn normalize_record_only_touches_text_cells() {
        let map = ColumnMap::resolve(
            &columns(&["Column1", "Column2", "Column3", "Price", "Blank"]),
            &ColumnRoles::default(),
        )
        .unwrap();
        let record = Record::new(7)
            .with("Column1", "X*Y*Z")
            .with("Column2", "a/b")
            .with("Column3", "A.B.C.")
            .with("Price", 9.5)
            .with("Blank", CellValue::Empty);

        let cleaned = map.normalize_record(&record);

        assert_eq!(cleaned.index, 7);
        assert_eq!(cleaned.get("Column1"), Some(&CellValue::from("X- Y<br> - Z")));
        assert_eq!(cleaned.get("Column2"), Some(&CellValue::from("a b")));
        assert_eq!(cleaned.get("Column3"), Some(&CellValue::from("A<br> - B<br> - C.")));
        assert_eq!(cleaned.get("Price"), Some(&CellValue::Number(9.5)));
        assert_eq!(cleaned.get("Blank"), Some(&CellValue::Empty));
    }
}
